use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::{normalize_regime, ActualBar, Direction, Prediction, Timeframe};

use super::resolver::{FavorableExcursionResolver, OutcomeResolver};

/// Outcome of scoring one prediction x timeframe against realized price
/// action. Append-only; the orchestrator owns these for the duration of
/// a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitRecord {
    pub date: NaiveDate,
    pub timeframe: Timeframe,
    pub regime: String,
    pub direction_predicted: String,
    pub direction: Direction,
    pub direction_correct: bool,
    pub entry_price: Decimal,
    pub target: Decimal,
    pub stop_loss: Decimal,
    pub actual_price: Decimal,
    pub r_multiple: Decimal,
    pub within_cone: bool,
    /// Position of the realized price inside the forecast interval,
    /// 0 = lower bound, 1 = upper bound. Deliberately unclamped so the
    /// histogram can see outside-the-cone outcomes.
    pub cone_percentile: Decimal,
    pub confidence: Decimal,
}

/// Scores (prediction, actual bar) pairs into fit records.
///
/// Pure: no side effects, never fails. Missing data yields `None`;
/// malformed forecasts degrade per-field to defined neutral values.
pub struct FitEvaluator {
    resolver: Box<dyn OutcomeResolver + Send + Sync>,
}

impl Default for FitEvaluator {
    fn default() -> Self {
        Self::new(Box::new(FavorableExcursionResolver))
    }
}

impl FitEvaluator {
    pub fn new(resolver: Box<dyn OutcomeResolver + Send + Sync>) -> Self {
        Self { resolver }
    }

    /// Evaluate one timeframe of a prediction. `None` means no forecast
    /// exists for the timeframe: an expected skip, not an error. Callers
    /// handle the missing-bar case by never invoking this without one.
    pub fn evaluate(
        &self,
        date: NaiveDate,
        prediction: &Prediction,
        bar: &ActualBar,
        timeframe: Timeframe,
    ) -> Option<FitRecord> {
        let forecast = prediction.forecast(timeframe)?;

        let entry_price = prediction.current_price;
        let direction = forecast.direction;

        let actual_price = self.resolver.resolve(bar, timeframe, direction);
        let actual_move = actual_price - entry_price;

        let direction_correct = (actual_move > Decimal::ZERO && direction.sign() > 0)
            || (actual_move < Decimal::ZERO && direction.sign() < 0);

        // R-multiple: reward over initial risk, stop-capped at -1R when
        // the call was wrong (execution would have stopped out).
        let r_multiple = if direction.sign() != 0 {
            let risk = (entry_price - forecast.stop_loss).abs();
            let r = if risk > Decimal::ZERO {
                actual_move.abs() / risk
            } else {
                Decimal::ZERO
            };
            if direction_correct {
                r
            } else {
                -r.min(Decimal::ONE)
            }
        } else {
            Decimal::ZERO
        };

        let within_cone =
            forecast.cone_lower <= actual_price && actual_price <= forecast.cone_upper;
        let cone_width = forecast.cone_upper - forecast.cone_lower;
        // Degenerate interval (zero or negative width) maps to the
        // neutral percentile instead of dividing by zero.
        let cone_percentile = if cone_width > Decimal::ZERO {
            (actual_price - forecast.cone_lower) / cone_width
        } else {
            dec!(0.5)
        };

        Some(FitRecord {
            date,
            timeframe,
            regime: normalize_regime(&prediction.regime),
            direction_predicted: forecast.direction_raw.clone(),
            direction,
            direction_correct,
            entry_price,
            target: forecast.target,
            stop_loss: forecast.stop_loss,
            actual_price,
            r_multiple,
            within_cone,
            cone_percentile,
            confidence: forecast.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TimeframeForecast;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 16).unwrap()
    }

    fn bar_closing_at(close: Decimal) -> ActualBar {
        ActualBar {
            open: dec!(580.00),
            high: close.max(dec!(580.00)) + dec!(0.25),
            low: close.min(dec!(580.00)) - dec!(0.25),
            close,
            volume: 1_000_000,
        }
    }

    fn prediction_with(forecast: TimeframeForecast, timeframe: Timeframe) -> Prediction {
        let mut forecasts = HashMap::new();
        forecasts.insert(timeframe, forecast);
        Prediction {
            timestamp: Utc.with_ymd_and_hms(2024, 12, 16, 9, 30, 0).unwrap(),
            current_price: dec!(580.50),
            regime: "TREND".to_string(),
            forecasts,
        }
    }

    #[test]
    fn test_missing_forecast_is_silent_skip() {
        let evaluator = FitEvaluator::default();
        let pred = prediction_with(
            TimeframeForecast::new("BULLISH", dec!(581), dec!(580.25), dec!(579.5), dec!(581.5), None),
            Timeframe::H1,
        );
        assert!(evaluator
            .evaluate(date(), &pred, &bar_closing_at(dec!(581.00)), Timeframe::D1)
            .is_none());
    }

    // Scenario A: bullish, entry 580.50, stop 580.25, close 581.00.
    #[test]
    fn test_correct_direction_r_multiple() {
        let evaluator = FitEvaluator::default();
        let pred = prediction_with(
            TimeframeForecast::new("BULLISH", dec!(582), dec!(580.25), dec!(579.5), dec!(581.5), Some(dec!(0.7))),
            Timeframe::H1,
        );
        let fit = evaluator
            .evaluate(date(), &pred, &bar_closing_at(dec!(581.00)), Timeframe::H1)
            .unwrap();
        assert!(fit.direction_correct);
        assert_eq!(fit.actual_price, dec!(581.00));
        assert_eq!(fit.r_multiple, dec!(2.0));
    }

    // Scenario B: same prediction, close 579.00. Raw r would be 6.0;
    // wrong call is negated and capped at -1R.
    #[test]
    fn test_wrong_direction_capped_at_minus_one_r() {
        let evaluator = FitEvaluator::default();
        let pred = prediction_with(
            TimeframeForecast::new("BULLISH", dec!(582), dec!(580.25), dec!(579.5), dec!(581.5), None),
            Timeframe::H1,
        );
        let fit = evaluator
            .evaluate(date(), &pred, &bar_closing_at(dec!(579.00)), Timeframe::H1)
            .unwrap();
        assert!(!fit.direction_correct);
        assert_eq!(fit.r_multiple, dec!(-1.0));
    }

    #[test]
    fn test_wrong_direction_small_move_stays_above_minus_one() {
        let evaluator = FitEvaluator::default();
        let pred = prediction_with(
            TimeframeForecast::new("BULLISH", dec!(582), dec!(579.50), dec!(579.5), dec!(581.5), None),
            Timeframe::H1,
        );
        // Move of -0.25 against a 1.00 risk: r = -0.25.
        let fit = evaluator
            .evaluate(date(), &pred, &bar_closing_at(dec!(580.25)), Timeframe::H1)
            .unwrap();
        assert_eq!(fit.r_multiple, dec!(-0.25));
        assert!(fit.r_multiple >= dec!(-1) && fit.r_multiple <= Decimal::ZERO);
    }

    #[test]
    fn test_zero_risk_yields_zero_r() {
        let evaluator = FitEvaluator::default();
        // entry == stop
        let pred = prediction_with(
            TimeframeForecast::new("BULLISH", dec!(582), dec!(580.50), dec!(579.5), dec!(581.5), None),
            Timeframe::H1,
        );
        let fit = evaluator
            .evaluate(date(), &pred, &bar_closing_at(dec!(585.00)), Timeframe::H1)
            .unwrap();
        assert_eq!(fit.r_multiple, Decimal::ZERO);
    }

    #[test]
    fn test_neutral_prediction_not_rewarded() {
        let evaluator = FitEvaluator::default();
        let pred = prediction_with(
            TimeframeForecast::new("NEUTRAL", dec!(580.5), dec!(579.5), dec!(579), dec!(582), None),
            Timeframe::H1,
        );
        let fit = evaluator
            .evaluate(date(), &pred, &bar_closing_at(dec!(581.00)), Timeframe::H1)
            .unwrap();
        assert!(!fit.direction_correct);
        assert_eq!(fit.r_multiple, Decimal::ZERO);
    }

    // Scenario C: interval [579.50, 581.50], actual 580.50.
    #[test]
    fn test_cone_percentile_midpoint() {
        let evaluator = FitEvaluator::default();
        let pred = prediction_with(
            TimeframeForecast::new("BULLISH", dec!(582), dec!(580.25), dec!(579.50), dec!(581.50), None),
            Timeframe::H1,
        );
        let fit = evaluator
            .evaluate(date(), &pred, &bar_closing_at(dec!(580.50)), Timeframe::H1)
            .unwrap();
        assert!(fit.within_cone);
        assert_eq!(fit.cone_percentile, dec!(0.5));
    }

    #[test]
    fn test_degenerate_cone_degrades_to_neutral_percentile() {
        let evaluator = FitEvaluator::default();
        // upper < lower: invalid interval, must not panic
        let pred = prediction_with(
            TimeframeForecast::new("BULLISH", dec!(582), dec!(580.25), dec!(581.50), dec!(579.50), None),
            Timeframe::H1,
        );
        let fit = evaluator
            .evaluate(date(), &pred, &bar_closing_at(dec!(581.00)), Timeframe::H1)
            .unwrap();
        assert_eq!(fit.cone_percentile, dec!(0.5));
        assert!(!fit.within_cone);
    }

    #[test]
    fn test_percentile_unclamped_outside_cone() {
        let evaluator = FitEvaluator::default();
        let pred = prediction_with(
            TimeframeForecast::new("BULLISH", dec!(582), dec!(580.25), dec!(579.50), dec!(580.50), None),
            Timeframe::H1,
        );
        // actual 581.50 is a full width above the upper bound
        let fit = evaluator
            .evaluate(date(), &pred, &bar_closing_at(dec!(581.50)), Timeframe::H1)
            .unwrap();
        assert!(!fit.within_cone);
        assert_eq!(fit.cone_percentile, dec!(2.0));
    }

    #[test]
    fn test_regime_normalized_on_record() {
        let evaluator = FitEvaluator::default();
        let mut pred = prediction_with(
            TimeframeForecast::new("BULLISH", dec!(582), dec!(580.25), dec!(579.5), dec!(581.5), None),
            Timeframe::H1,
        );
        pred.regime = " chop ".to_string();
        let fit = evaluator
            .evaluate(date(), &pred, &bar_closing_at(dec!(581.00)), Timeframe::H1)
            .unwrap();
        assert_eq!(fit.regime, "CHOP");
    }
}
