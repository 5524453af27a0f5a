//! Analytics Configuration Module
//!
//! Every engine threshold is loaded from TOML and handed to the engines by
//! value. There is no global config; each engine owns its section.
//!
//! ## Loading Order
//!
//! 1. `NCR_ANALYTICS_CONFIG` environment variable (path to TOML file)
//! 2. `analytics_config.toml` in the current working directory
//! 3. Built-in defaults

mod analytics_config;
pub mod defaults;
pub mod validation;

pub use analytics_config::*;
