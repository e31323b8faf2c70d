mod engine;
mod errors;
mod feeds;
mod report;
mod types;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use engine::{BacktestConfig, BacktestEngine};
use errors::{parse_date, validate_range};
use feeds::{load_actuals_csv, load_predictions_dir, seed_actuals_csv, seed_prediction_example};
use report::{print_summary, FileReportSink, ReportSink};

#[derive(Parser)]
#[command(name = "forecast-backtest")]
#[command(version = "0.1.0")]
#[command(about = "Evaluate directional market predictions against realized price action", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score stored predictions against actual bars and emit
    /// calibration statistics
    Backtest {
        /// Start date (YYYY-MM-DD); defaults to `months` before the end
        #[arg(short, long)]
        start: Option<String>,
        /// End date (YYYY-MM-DD); defaults to the latest prediction
        #[arg(short, long)]
        end: Option<String>,
        /// Fallback window size in months when no start date is given
        #[arg(short, long, default_value = "3")]
        months: u32,
        /// Directory of per-date prediction JSON files
        #[arg(long, default_value = "predictions")]
        predictions: PathBuf,
        /// CSV of daily OHLCV bars
        #[arg(long, default_value = "spy_data.csv")]
        actuals: PathBuf,
        /// Output directory for summary and trade log
        #[arg(short, long, default_value = "backtest_results")]
        output: PathBuf,
    },
    /// Generate synthetic bars and an example prediction for an
    /// offline dry run
    Seed {
        /// Directory for the example prediction JSON
        #[arg(long, default_value = "predictions")]
        predictions: PathBuf,
        /// Path for the synthetic OHLCV CSV
        #[arg(long, default_value = "spy_data.csv")]
        actuals: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Backtest {
            start,
            end,
            months,
            predictions,
            actuals,
            output,
        } => {
            let start = start.as_deref().map(parse_date).transpose()?;
            let end = end.as_deref().map(parse_date).transpose()?;
            validate_range(start, end)?;

            let prediction_feed = load_predictions_dir(&predictions)?;
            let actuals_feed = load_actuals_csv(&actuals)?;

            let config = BacktestConfig { start, end, months };
            let engine = BacktestEngine::new(config, prediction_feed, actuals_feed);
            let report = engine.run()?;

            print_summary(&report);
            let mut sink = FileReportSink::new(output);
            sink.write(&report.summary, &report.records)?;
        }
        Commands::Seed {
            predictions,
            actuals,
        } => {
            seed_actuals_csv(&actuals)?;
            seed_prediction_example(&predictions)?;
            info!("Seed data ready; run the backtest subcommand next");
        }
    }

    Ok(())
}
