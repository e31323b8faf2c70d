#![allow(dead_code)]
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar. Source of truth for realized price action;
/// immutable once recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActualBar {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

impl ActualBar {
    pub fn range(&self) -> Decimal {
        self.high - self.low
    }

    pub fn change(&self) -> Decimal {
        self.close - self.open
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bar_accessors() {
        let bar = ActualBar {
            open: dec!(580.00),
            high: dec!(582.50),
            low: dec!(579.00),
            close: dec!(581.00),
            volume: 50_000_000,
        };
        assert_eq!(bar.range(), dec!(3.50));
        assert_eq!(bar.change(), dec!(1.00));
        assert!(bar.is_bullish());
    }
}
