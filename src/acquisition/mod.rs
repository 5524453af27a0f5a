//! Data acquisition
//!
//! Turns raw exports into a typed [`Dataset`](crate::types::Dataset).
//! Only this module parses raw formats.

pub mod csv_loader;

pub use csv_loader::{load_csv, CsvLoader, LoadError};
