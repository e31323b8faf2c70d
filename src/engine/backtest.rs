use anyhow::Result;
use chrono::NaiveDate;
use tracing::{debug, info};

use crate::feeds::{ActualsFeed, PredictionFeed};
use crate::types::Timeframe;

use super::calibration::CalibrationSummary;
use super::fit::{FitEvaluator, FitRecord};
use super::window::{filter_by_window, WindowedPredictions};

/// Configuration for one backtest run.
#[derive(Debug, Clone)]
pub struct BacktestConfig {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    /// Fallback window size when no start date is given, in 30-day
    /// months.
    pub months: u32,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            months: 3,
        }
    }
}

/// Output of one run: the finalized summary, the ordered evaluation
/// log, and the effective window that was evaluated.
#[derive(Debug, Clone)]
pub struct BacktestReport {
    pub summary: CalibrationSummary,
    pub records: Vec<FitRecord>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub window_note: Option<String>,
}

/// Drives one end-to-end evaluation: window-filter the predictions,
/// resolve actuals, score every (date, timeframe) pair, fold into the
/// calibration summary, finalize once.
///
/// Evaluation is synchronous and strictly ordered (ascending date,
/// catalog timeframe order); two runs over the same inputs produce an
/// identical evaluation log.
pub struct BacktestEngine<P, A> {
    config: BacktestConfig,
    predictions: P,
    actuals: A,
    evaluator: FitEvaluator,
}

impl<P: PredictionFeed, A: ActualsFeed> BacktestEngine<P, A> {
    pub fn new(config: BacktestConfig, predictions: P, actuals: A) -> Self {
        Self {
            config,
            predictions,
            actuals,
            evaluator: FitEvaluator::default(),
        }
    }

    pub fn with_evaluator(mut self, evaluator: FitEvaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn run(&self) -> Result<BacktestReport> {
        let dates = self.predictions.dates();
        info!("Running backtest over {} loaded prediction(s)", dates.len());

        let windowed = self.window_predictions(dates);
        if let Some(note) = &windowed.note {
            info!("Date window clamped: {}", note);
        }

        let mut summary = CalibrationSummary::new();
        let mut records = Vec::new();

        for date in windowed.dates {
            let Some(prediction) = self.predictions.get(date) else {
                continue;
            };
            // No bar for the date: expected in sparse history, skip the
            // whole day silently.
            let Some(bar) = self.actuals.get(date) else {
                debug!("No actual bar for {}, skipping", date);
                continue;
            };

            for timeframe in Timeframe::all() {
                if let Some(record) = self.evaluator.evaluate(date, prediction, bar, timeframe) {
                    summary.fold(&record);
                    records.push(record);
                }
            }
        }

        summary.finalize();
        info!(
            "Backtest complete: {} trade(s), win rate {:.2}, avg R {:.3}",
            summary.total_trades, summary.win_rate, summary.avg_r_multiple
        );

        Ok(BacktestReport {
            summary,
            records,
            start: windowed.start,
            end: windowed.end,
            window_note: windowed.note,
        })
    }

    fn window_predictions(&self, dates: Vec<NaiveDate>) -> WindowedDates {
        // The filter operates on the date->prediction map; rebuild the
        // key set through it so clamping semantics stay in one place.
        let map = dates
            .iter()
            .filter_map(|d| self.predictions.get(*d).map(|p| (*d, p.clone())))
            .collect();
        let WindowedPredictions {
            predictions,
            start,
            end,
            note,
        } = filter_by_window(map, self.config.start, self.config.end, self.config.months);
        WindowedDates {
            dates: predictions.into_keys().collect(),
            start,
            end,
            note,
        }
    }
}

struct WindowedDates {
    dates: Vec<NaiveDate>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    note: Option<String>,
}
