use rust_decimal::Decimal;

use crate::types::{ActualBar, Direction, Timeframe};

/// Derives the single realized reference price used to judge one
/// timeframe's forecast against a daily bar.
///
/// Implementations must be pure. The default resolver approximates
/// intraday outcomes from the daily bar; callers with real intrabar data
/// can swap in a path-aware implementation without touching the
/// evaluator.
pub trait OutcomeResolver {
    fn resolve(&self, bar: &ActualBar, timeframe: Timeframe, direction: Direction) -> Decimal;
}

/// Default resolver working from daily bars only.
///
/// Intraday horizons are judged on favorable excursion: the bar's high
/// for a bullish call, the low otherwise, answering "did price reach
/// favorably" since no intrabar path is available. Longer horizons are
/// judged on the settlement (close) price. This is a documented
/// approximation, not a bug.
#[derive(Debug, Clone, Copy, Default)]
pub struct FavorableExcursionResolver;

impl OutcomeResolver for FavorableExcursionResolver {
    fn resolve(&self, bar: &ActualBar, timeframe: Timeframe, direction: Direction) -> Decimal {
        if timeframe.is_intraday() {
            if direction == Direction::Bullish {
                bar.high
            } else {
                bar.low
            }
        } else {
            bar.close
        }
    }
}
