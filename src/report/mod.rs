use anyhow::{Context, Result};
use rust_decimal_macros::dec;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::engine::{BacktestReport, CalibrationSummary, FitRecord};
use crate::types::Timeframe;

/// Consumer of a finished run. Concrete persistence format is the
/// sink's business, not the core's.
pub trait ReportSink {
    fn write(&mut self, summary: &CalibrationSummary, records: &[FitRecord]) -> Result<()>;
}

/// Writes the summary JSON, the full trade log CSV, and a per-regime
/// CSV into an output directory.
pub struct FileReportSink {
    dir: PathBuf,
}

impl FileReportSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ReportSink for FileReportSink {
    fn write(&mut self, summary: &CalibrationSummary, records: &[FitRecord]) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("cannot create output directory {}", self.dir.display()))?;

        let summary_path = self.dir.join("backtest_summary.json");
        fs::write(&summary_path, serde_json::to_string_pretty(summary)?)
            .with_context(|| format!("cannot write {}", summary_path.display()))?;

        let log_path = self.dir.join("trade_log.csv");
        let mut log = csv::Writer::from_path(&log_path)
            .with_context(|| format!("cannot write {}", log_path.display()))?;
        for record in records {
            log.serialize(record)?;
        }
        log.flush()?;

        let regime_path = self.dir.join("by_regime_summary.csv");
        let mut regimes = csv::Writer::from_path(&regime_path)
            .with_context(|| format!("cannot write {}", regime_path.display()))?;
        regimes.write_record(["Regime", "Trades", "Wins", "Win Rate", "Avg R-Multiple"])?;
        let mut keys: Vec<_> = summary.by_regime.keys().collect();
        keys.sort();
        for regime in keys {
            let stats = &summary.by_regime[regime];
            regimes.write_record([
                regime.as_str(),
                &stats.trades.to_string(),
                &stats.wins.to_string(),
                &format!("{:.2}%", stats.win_rate * dec!(100)),
                &format!("{:.3}", stats.avg_r),
            ])?;
        }
        regimes.flush()?;

        info!("Results saved to {}", self.dir.display());
        Ok(())
    }
}

/// Pretty print a finished run to the console.
pub fn print_summary(report: &BacktestReport) {
    let summary = &report.summary;

    println!("\n{}", "=".repeat(60));
    println!("                 CALIBRATION BACKTEST RESULTS");
    println!("{}", "=".repeat(60));
    match (report.start, report.end) {
        (Some(start), Some(end)) => println!("Period:             {} to {}", start, end),
        _ => println!("Period:             (no data)"),
    }
    if let Some(note) = &report.window_note {
        println!("Window note:        {}", note);
    }
    println!("{}", "-".repeat(60));
    println!("TRADES");
    println!("  Total Trades:       {}", summary.total_trades);
    println!(
        "  Winning Trades:     {} ({:.1}%)",
        summary.winning_trades,
        summary.win_rate * dec!(100)
    );
    println!("  Losing Trades:      {}", summary.losing_trades);
    println!("  Avg R-Multiple:     {:.3}", summary.avg_r_multiple);
    println!(
        "  Confidence OK:      {:.1}%",
        summary.confidence_calibration.justified_rate * dec!(100)
    );
    println!("{}", "-".repeat(60));
    println!("BY TIMEFRAME");
    for tf in Timeframe::all() {
        if let Some(stats) = summary.by_timeframe.get(&tf) {
            println!(
                "  {:>3} | win rate {:>5.1}% | avg R {:>6.3} | cone {:>5.1}% | n={}",
                tf.as_str(),
                stats.win_rate * dec!(100),
                stats.avg_r,
                stats.cone_accuracy * dec!(100),
                stats.trades
            );
        }
    }
    println!("{}", "-".repeat(60));
    println!("BY REGIME");
    let mut regimes: Vec<_> = summary.by_regime.keys().collect();
    regimes.sort();
    for regime in regimes {
        let stats = &summary.by_regime[regime];
        println!(
            "  {:<10} | win rate {:>5.1}% | avg R {:>6.3} | n={}",
            regime,
            stats.win_rate * dec!(100),
            stats.avg_r,
            stats.trades
        );
    }
    println!("{}", "-".repeat(60));
    println!("CONE CALIBRATION (cumulative buckets)");
    let hist = &summary.cone_calibration;
    println!(
        "  within 10%: {:>5.1}%   within 25%: {:>5.1}%   within 50%: {:>5.1}%   outside: {:>5.1}%",
        hist.within_10pct_rate * dec!(100),
        hist.within_25pct_rate * dec!(100),
        hist.within_50pct_rate * dec!(100),
        hist.outside_50pct_rate * dec!(100)
    );
    println!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CalibrationSummary;
    use crate::types::Direction;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn record() -> FitRecord {
        FitRecord {
            date: NaiveDate::from_ymd_opt(2024, 12, 16).unwrap(),
            timeframe: Timeframe::H1,
            regime: "TREND".to_string(),
            direction_predicted: "BULLISH".to_string(),
            direction: Direction::Bullish,
            direction_correct: true,
            entry_price: dec!(580.50),
            target: dec!(582.00),
            stop_loss: dec!(580.25),
            actual_price: dec!(581.00),
            r_multiple: dec!(2.0),
            within_cone: true,
            cone_percentile: dec!(0.5),
            confidence: dec!(0.7),
        }
    }

    #[test]
    fn test_file_sink_writes_all_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let mut summary = CalibrationSummary::new();
        let rec = record();
        summary.fold(&rec);
        summary.finalize();

        let mut sink = FileReportSink::new(dir.path());
        sink.write(&summary, &[rec]).unwrap();

        let json = fs::read_to_string(dir.path().join("backtest_summary.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["total_trades"], 1);

        let log = fs::read_to_string(dir.path().join("trade_log.csv")).unwrap();
        assert!(log.contains("2024-12-16"));
        assert!(log.contains("BULLISH"));

        let regimes = fs::read_to_string(dir.path().join("by_regime_summary.csv")).unwrap();
        assert!(regimes.contains("TREND"));
        assert!(regimes.contains("100.00%"));
    }

    #[test]
    fn test_file_sink_empty_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut summary = CalibrationSummary::new();
        summary.finalize();

        let mut sink = FileReportSink::new(dir.path());
        sink.write(&summary, &[]).unwrap();

        let json = fs::read_to_string(dir.path().join("backtest_summary.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["total_trades"], 0);
        assert_eq!(parsed["win_rate"], serde_json::json!(Decimal::ZERO));
    }
}
