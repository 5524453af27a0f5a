//! NCR Analytics - manufacturing quality analytics from the command line
//!
//! Loads a CSV export, runs one operation and prints the JSON response
//! envelope on stdout. Logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! ncr-analytics --data ncr_records.csv overview
//! ncr-analytics --data ncr_records.csv correlations --threshold 0.7
//! ncr-analytics --data ncr_records.csv root-cause --issue-type Dimensional --filter production_line=Line-A
//! ncr-analytics --config analytics_config.toml config
//! ```
//!
//! # Environment Variables
//!
//! - `NCR_ANALYTICS_DATA`: CSV export used when `--data` is absent
//! - `NCR_ANALYTICS_CONFIG`: Config file used when `--config` is absent
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

use ncr_analytics::{dispatch, load_csv, AnalyticsConfig, AnalyticsEngine, DatasetStore, Operation, RequestParams};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "ncr-analytics")]
#[command(about = "Manufacturing quality analytics over NCR and production exports")]
#[command(version)]
struct CliArgs {
    /// CSV export to analyse
    #[arg(long, env = "NCR_ANALYTICS_DATA", value_name = "CSV")]
    data: Option<PathBuf>,

    /// Analytics config file (default: $NCR_ANALYTICS_CONFIG, then ./analytics_config.toml)
    #[arg(long, value_name = "TOML")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Pretty-print the response envelope
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: SubCommand,
}

/// Record restriction shared by root-cause, insight and action commands.
#[derive(clap::Args, Debug, Default)]
struct FilterArgs {
    /// Only records of this issue type
    #[arg(long)]
    issue_type: Option<String>,

    /// Inclusive lower bound on the timestamp (date, date-time or RFC 3339)
    #[arg(long)]
    start_date: Option<String>,

    /// Inclusive upper bound on the timestamp
    #[arg(long)]
    end_date: Option<String>,

    /// Column match, repeatable
    #[arg(long = "filter", value_name = "COLUMN=VALUE", value_parser = parse_key_value)]
    filters: Vec<(String, String)>,
}

impl FilterArgs {
    fn into_params(self) -> RequestParams {
        RequestParams {
            issue_type: self.issue_type,
            start_date: self.start_date,
            end_date: self.end_date,
            filters: self.filters.into_iter().collect(),
            ..Default::default()
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Record count, column classification, date range, numeric summaries
    Overview,
    /// Per-column metadata
    Columns,
    /// Headline statistics
    Dashboard,
    /// First rows of the dataset
    Sample {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Time-bucketed aggregates of one numeric column
    TimeSeries {
        /// Numeric column (default: the configured defect column)
        #[arg(long)]
        column: Option<String>,
        #[arg(long)]
        start_date: Option<String>,
        #[arg(long)]
        end_date: Option<String>,
        /// hour, day or week
        #[arg(long, default_value = "hour")]
        group_by: String,
    },
    /// Pairwise correlations above a threshold
    Correlations {
        /// Minimum |r| in [0, 1]
        #[arg(long)]
        threshold: Option<f64>,
    },
    /// Most anomalous records by isolation forest
    Anomalies {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Per-feature deviations of one record
    AnomalyFeatures {
        /// Row index
        #[arg(long)]
        index: usize,
    },
    /// Ranked root-cause hypotheses
    RootCause {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Ranked insights
    Insights {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Corrective actions for the top root cause
    Actions {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print the effective configuration as TOML
    Config,
}

impl SubCommand {
    /// Operation and parameters, or `None` for commands that need no dataset.
    fn into_request(self) -> Option<(Operation, RequestParams)> {
        let request = match self {
            Self::Overview => (Operation::Overview, RequestParams::default()),
            Self::Columns => (Operation::Columns, RequestParams::default()),
            Self::Dashboard => (Operation::Dashboard, RequestParams::default()),
            Self::Sample { limit } => (
                Operation::Sample,
                RequestParams {
                    limit,
                    ..Default::default()
                },
            ),
            Self::TimeSeries {
                column,
                start_date,
                end_date,
                group_by,
            } => (
                Operation::TimeSeries,
                RequestParams {
                    column,
                    start_date,
                    end_date,
                    group_by: Some(group_by),
                    ..Default::default()
                },
            ),
            Self::Correlations { threshold } => (
                Operation::Correlations,
                RequestParams {
                    threshold,
                    ..Default::default()
                },
            ),
            Self::Anomalies { limit } => (
                Operation::Anomalies,
                RequestParams {
                    limit,
                    ..Default::default()
                },
            ),
            Self::AnomalyFeatures { index } => (
                Operation::AnomalyFeatures,
                RequestParams {
                    index: Some(index),
                    ..Default::default()
                },
            ),
            Self::RootCause { filter } => (Operation::RootCause, filter.into_params()),
            Self::Insights { filter } => (Operation::Insights, filter.into_params()),
            Self::Actions { filter } => (Operation::Actions, filter.into_params()),
            Self::Config => return None,
        };
        Some(request)
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.to_string())),
        _ => Err(format!("expected COLUMN=VALUE, got '{raw}'")),
    }
}

// ============================================================================
// Setup
// ============================================================================

fn init_logging(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AnalyticsConfig> {
    match path {
        Some(path) => AnalyticsConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(AnalyticsConfig::load()),
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = CliArgs::parse();
    init_logging(args.log_json);

    let config = load_config(args.config.as_ref())?;

    let Some((operation, params)) = args.command.into_request() else {
        print!("{}", config.to_toml().context("Failed to render config")?);
        return Ok(ExitCode::SUCCESS);
    };

    let Some(data_path) = args.data else {
        bail!("--data <CSV> (or NCR_ANALYTICS_DATA) is required for '{operation}'");
    };

    let store = DatasetStore::new();
    let dataset = load_csv(&data_path)
        .with_context(|| format!("Failed to load dataset from {}", data_path.display()))?;
    store.load(dataset);

    let engine = AnalyticsEngine::new(config);
    info!(operation = %operation, "Running operation");
    let response = dispatch(&engine, &store, operation, &params).await;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    }
    .context("Failed to render response")?;
    println!("{rendered}");

    if response["status"] == "success" {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
