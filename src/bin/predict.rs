//! One-shot prediction from the command line.
//!
//! Runs a single pipeline with the configured services and prints its JSON
//! payload to stdout.

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use farcry::application::pipelines::{RegressionPipeline, TimeSeriesPipeline};
use farcry::config::Config;
use farcry::infrastructure::ServiceFactory;
use farcry::infrastructure::observability::Metrics;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PipelineKind {
    Regression,
    TimeSeries,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Run one Farcry prediction pipeline", long_about = None)]
struct Args {
    /// Pipeline to run
    #[arg(value_enum)]
    pipeline: PipelineKind,

    /// Evaluate as of this date (YYYY-MM-DD) instead of today
    #[arg(long)]
    as_of: Option<NaiveDate>,

    /// Pretty-print the JSON payload
    #[arg(long, default_value_t = false)]
    pretty: bool,
}

fn to_json<T: serde::Serialize>(value: &T, pretty: bool) -> Result<String> {
    Ok(if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays valid JSON
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let ctx = ServiceFactory::build_context(&config, Metrics::new()?).await?;
    let today = args
        .as_of
        .unwrap_or_else(|| chrono::Utc::now().date_naive());
    info!("Running {:?} pipeline as of {}", args.pipeline, today);

    let payload = match args.pipeline {
        PipelineKind::Regression => {
            let outcome = RegressionPipeline::new(ctx).run_at(today).await;
            to_json(&outcome, args.pretty)?
        }
        PipelineKind::TimeSeries => {
            let prediction = TimeSeriesPipeline::new(ctx).run_at(today).await?;
            to_json(&prediction, args.pretty)?
        }
    };
    println!("{}", payload);
    Ok(())
}
