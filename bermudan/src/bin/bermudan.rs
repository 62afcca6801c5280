//! `bermudan` - price one Bermudan swaption from the command line.
//!
//! The request comes either from a JSON file (`--request`) or from flags.
//! The response is printed to stdout as JSON; logs go to stderr.
//!
//! Exit codes: `0` priced, `2` invalid input, `3` numerical failure,
//! `1` anything else.

use anyhow::{bail, Context};
use bermudan::models::ModelKind;
use bermudan::{EngineKind, PricingConfig, PricingRequest, Valuation};
use bermudan::core::ErrorCategory;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Bermudan swaption pricer
#[derive(Parser, Debug)]
#[command(name = "bermudan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON request file; replaces the request flags
    #[arg(long, conflicts_with_all = ["date", "flat_rate"])]
    request: Option<PathBuf>,

    /// Valuation date (YYYY-MM-DD)
    #[arg(long, env = "BERMUDAN_DATE", required_unless_present = "request")]
    date: Option<NaiveDate>,

    /// Continuously compounded flat rate
    #[arg(long, env = "BERMUDAN_FLAT_RATE", required_unless_present = "request")]
    flat_rate: Option<f64>,

    /// Model: g2, hw or bk
    #[arg(long, env = "BERMUDAN_MODEL", default_value = "hw")]
    model: ModelKind,

    /// Engine: tree or fdm
    #[arg(long, env = "BERMUDAN_ENGINE", default_value = "tree")]
    engine: EngineKind,

    /// Strike as a multiple of the ATM rate
    #[arg(long, env = "BERMUDAN_STRIKE_MULTIPLIER", default_value_t = 1.0)]
    strike_multiplier: f64,

    /// TOML configuration file
    #[arg(short, long, env = "BERMUDAN_CONFIG")]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset; overrides the configuration
    #[arg(long)]
    log_level: Option<String>,

    /// Print the full result instead of `{"npv": …}`
    #[arg(long)]
    full: bool,
}

impl Cli {
    fn pricing_request(&self) -> anyhow::Result<PricingRequest> {
        if let Some(path) = &self.request {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("cannot read request {}", path.display()))?;
            return serde_json::from_str(&content)
                .with_context(|| format!("malformed request {}", path.display()));
        }
        let (Some(date), Some(flat_rate)) = (self.date, self.flat_rate) else {
            bail!("--date and --flat-rate are required without --request");
        };
        Ok(PricingRequest {
            date,
            flat_rate,
            model: self.model,
            engine: self.engine,
            strike_multiplier: self.strike_multiplier,
        })
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PricingConfig::load(path),
        None => Ok(PricingConfig::default()),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    init_tracing(cli.log_level.as_deref().unwrap_or(&config.logging.level));

    let request = match cli.pricing_request() {
        Ok(request) => request,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::from(2);
        }
    };

    match Valuation::new(config).price(&request) {
        Ok(result) => {
            let printed = if cli.full {
                serde_json::to_string_pretty(&result)
            } else {
                serde_json::to_string(&result.response())
            };
            match printed {
                Ok(json) => {
                    println!("{json}");
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("error: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Err(e) => {
            eprintln!("error: {e}");
            match e.category() {
                ErrorCategory::InvalidInput => ExitCode::from(2),
                ErrorCategory::NumericalMethod => ExitCode::from(3),
                ErrorCategory::Internal => ExitCode::FAILURE,
            }
        }
    }
}
