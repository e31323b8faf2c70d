#![allow(dead_code)]
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::types::Timeframe;

use super::fit::FitRecord;

/// Per-timeframe running sub-totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimeframeStats {
    pub trades: u64,
    pub wins: u64,
    pub total_r: Decimal,
    pub within_cone: u64,
    // Derived at finalize
    pub win_rate: Decimal,
    pub avg_r: Decimal,
    pub cone_accuracy: Decimal,
}

/// Per-regime running sub-totals. Regime keys are an open string set;
/// a fresh zeroed table is created on first encounter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegimeStats {
    pub trades: u64,
    pub wins: u64,
    pub total_r: Decimal,
    // Derived at finalize
    pub win_rate: Decimal,
    pub avg_r: Decimal,
}

/// Four-bucket cone-calibration histogram.
///
/// The inner buckets are cumulative supersets, not exclusive bands: a
/// percentile of 0.5 increments within_10pct AND within_25pct AND
/// within_50pct. Only values outside [0, 1] land in outside_50pct, and
/// exclusively so. Downstream consumers read "within_Npct" as "at least
/// as tight as N%", so the overlap is load-bearing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConeHistogram {
    pub within_10pct: u64,
    pub within_25pct: u64,
    pub within_50pct: u64,
    pub outside_50pct: u64,
    // Derived at finalize: each bucket over the sum of all four counts
    pub within_10pct_rate: Decimal,
    pub within_25pct_rate: Decimal,
    pub within_50pct_rate: Decimal,
    pub outside_50pct_rate: Decimal,
}

impl ConeHistogram {
    fn classify(&mut self, percentile: Decimal) {
        if percentile >= dec!(0.4) && percentile <= dec!(0.6) {
            self.within_10pct += 1;
        }
        if percentile >= dec!(0.25) && percentile <= dec!(0.75) {
            self.within_25pct += 1;
        }
        if percentile >= Decimal::ZERO && percentile <= Decimal::ONE {
            self.within_50pct += 1;
        } else {
            self.outside_50pct += 1;
        }
    }

    fn total_checks(&self) -> u64 {
        self.within_10pct + self.within_25pct + self.within_50pct + self.outside_50pct
    }
}

/// Confidence-calibration tally: confidence above 0.5 on a correct call,
/// or below 0.5 on a wrong one, counts as justified.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfidenceCalibration {
    pub justified: u64,
    pub unjustified: u64,
    // Derived at finalize
    pub justified_rate: Decimal,
}

/// Cumulative calibration statistics for one backtest run.
///
/// Counters accumulate via `fold`; every derived rate is computed only
/// in `finalize` by dividing sub-totals, never incrementally, so float
/// drift cannot accumulate across updates. `finalize` recomputes from
/// the raw counters each time and is therefore idempotent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalibrationSummary {
    pub total_trades: u64,
    pub winning_trades: u64,
    pub losing_trades: u64,
    pub total_r_multiple: Decimal,
    pub by_timeframe: HashMap<Timeframe, TimeframeStats>,
    pub by_regime: HashMap<String, RegimeStats>,
    pub cone_calibration: ConeHistogram,
    pub confidence_calibration: ConfidenceCalibration,
    // Derived at finalize
    pub win_rate: Decimal,
    pub avg_r_multiple: Decimal,
}

impl CalibrationSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one fit record into the running totals.
    pub fn fold(&mut self, record: &FitRecord) {
        self.total_trades += 1;
        if record.direction_correct {
            self.winning_trades += 1;
        } else {
            self.losing_trades += 1;
        }
        self.total_r_multiple += record.r_multiple;

        let tf = self.by_timeframe.entry(record.timeframe).or_default();
        tf.trades += 1;
        if record.direction_correct {
            tf.wins += 1;
        }
        tf.total_r += record.r_multiple;
        if record.within_cone {
            tf.within_cone += 1;
        }

        let regime = self.by_regime.entry(record.regime.clone()).or_default();
        regime.trades += 1;
        if record.direction_correct {
            regime.wins += 1;
        }
        regime.total_r += record.r_multiple;

        self.cone_calibration.classify(record.cone_percentile);

        let justified = if record.direction_correct {
            record.confidence > dec!(0.5)
        } else {
            record.confidence < dec!(0.5)
        };
        if justified {
            self.confidence_calibration.justified += 1;
        } else {
            self.confidence_calibration.unjustified += 1;
        }
    }

    /// Merge a partial summary produced by a parallel shard. Field-wise
    /// addition of raw counters only; call `finalize` once on the merged
    /// result, never per-shard.
    pub fn merge(&mut self, other: &CalibrationSummary) {
        self.total_trades += other.total_trades;
        self.winning_trades += other.winning_trades;
        self.losing_trades += other.losing_trades;
        self.total_r_multiple += other.total_r_multiple;

        for (tf, stats) in &other.by_timeframe {
            let entry = self.by_timeframe.entry(*tf).or_default();
            entry.trades += stats.trades;
            entry.wins += stats.wins;
            entry.total_r += stats.total_r;
            entry.within_cone += stats.within_cone;
        }
        for (regime, stats) in &other.by_regime {
            let entry = self.by_regime.entry(regime.clone()).or_default();
            entry.trades += stats.trades;
            entry.wins += stats.wins;
            entry.total_r += stats.total_r;
        }

        self.cone_calibration.within_10pct += other.cone_calibration.within_10pct;
        self.cone_calibration.within_25pct += other.cone_calibration.within_25pct;
        self.cone_calibration.within_50pct += other.cone_calibration.within_50pct;
        self.cone_calibration.outside_50pct += other.cone_calibration.outside_50pct;

        self.confidence_calibration.justified += other.confidence_calibration.justified;
        self.confidence_calibration.unjustified += other.confidence_calibration.unjustified;
    }

    /// Compute all derived rates from the raw counters. Safe to call
    /// repeatedly; an empty summary finalizes to all-zero rates.
    pub fn finalize(&mut self) {
        self.win_rate = ratio(self.winning_trades, self.total_trades);
        self.avg_r_multiple = if self.total_trades > 0 {
            self.total_r_multiple / Decimal::from(self.total_trades)
        } else {
            Decimal::ZERO
        };

        for stats in self.by_timeframe.values_mut() {
            stats.win_rate = ratio(stats.wins, stats.trades);
            stats.cone_accuracy = ratio(stats.within_cone, stats.trades);
            stats.avg_r = if stats.trades > 0 {
                stats.total_r / Decimal::from(stats.trades)
            } else {
                Decimal::ZERO
            };
        }
        for stats in self.by_regime.values_mut() {
            stats.win_rate = ratio(stats.wins, stats.trades);
            stats.avg_r = if stats.trades > 0 {
                stats.total_r / Decimal::from(stats.trades)
            } else {
                Decimal::ZERO
            };
        }

        // Normalize over total cone checks, not total trades: absent
        // predictions contribute no cone check.
        let hist = &mut self.cone_calibration;
        let checks = hist.total_checks();
        hist.within_10pct_rate = ratio(hist.within_10pct, checks);
        hist.within_25pct_rate = ratio(hist.within_25pct, checks);
        hist.within_50pct_rate = ratio(hist.within_50pct, checks);
        hist.outside_50pct_rate = ratio(hist.outside_50pct, checks);

        let conf = &mut self.confidence_calibration;
        conf.justified_rate = ratio(conf.justified, conf.justified + conf.unjustified);
    }
}

fn ratio(numerator: u64, denominator: u64) -> Decimal {
    if denominator > 0 {
        Decimal::from(numerator) / Decimal::from(denominator)
    } else {
        Decimal::ZERO
    }
}
