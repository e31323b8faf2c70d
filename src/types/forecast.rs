use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Forecasting horizon. The catalog order defined by `all()` is the
/// aggregation and iteration order used throughout the backtest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1m")]
    M1,
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    /// Full catalog in evaluation order, intraday first.
    pub fn all() -> [Timeframe; 6] {
        [
            Timeframe::M1,
            Timeframe::M5,
            Timeframe::M15,
            Timeframe::H1,
            Timeframe::H4,
            Timeframe::D1,
        ]
    }

    /// Horizons shorter than a session, judged on favorable excursion
    /// rather than settlement price.
    pub fn is_intraday(&self) -> bool {
        matches!(self, Timeframe::M1 | Timeframe::M5 | Timeframe::M15)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "1m" => Some(Timeframe::M1),
            "5m" => Some(Timeframe::M5),
            "15m" => Some(Timeframe::M15),
            "1h" => Some(Timeframe::H1),
            "4h" => Some(Timeframe::H4),
            "1d" => Some(Timeframe::D1),
            _ => None,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Normalized forecast direction. Upstream systems emit richer labels
/// (STRONG_BUY, SELL, ...); those collapse to one of these three before
/// reaching the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Bullish,
    Bearish,
    Neutral,
}

impl Direction {
    /// Collapse an upstream direction label. Unrecognized labels are
    /// treated as neutral rather than rejected.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "BULLISH" | "BUY" | "STRONG_BUY" => Direction::Bullish,
            "BEARISH" | "SELL" | "STRONG_SELL" => Direction::Bearish,
            _ => Direction::Neutral,
        }
    }

    /// Signed direction: +1 bullish, -1 bearish, 0 neutral.
    pub fn sign(&self) -> i8 {
        match self {
            Direction::Bullish => 1,
            Direction::Bearish => -1,
            Direction::Neutral => 0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Bullish => "BULLISH",
            Direction::Bearish => "BEARISH",
            Direction::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One timeframe's forecast within a daily prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeframeForecast {
    /// Label as emitted upstream, kept for reporting.
    pub direction_raw: String,
    pub direction: Direction,
    pub target: Decimal,
    pub stop_loss: Decimal,
    /// Forecast-interval bounds. Not guaranteed well ordered; the
    /// evaluator degrades to a neutral percentile when upper <= lower.
    pub cone_lower: Decimal,
    pub cone_upper: Decimal,
    pub confidence: Decimal,
}

impl TimeframeForecast {
    pub fn new(
        direction_raw: impl Into<String>,
        target: Decimal,
        stop_loss: Decimal,
        cone_lower: Decimal,
        cone_upper: Decimal,
        confidence: Option<Decimal>,
    ) -> Self {
        let direction_raw = direction_raw.into();
        let direction = Direction::from_label(&direction_raw);
        Self {
            direction_raw,
            direction,
            target,
            stop_loss,
            cone_lower,
            cone_upper,
            confidence: confidence.unwrap_or(dec!(0.5)),
        }
    }
}

/// One instrument/date prediction: entry context plus a forecast per
/// timeframe. Timeframe keys outside the catalog never make it into the
/// map; the adapters drop them silently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub timestamp: DateTime<Utc>,
    pub current_price: Decimal,
    pub regime: String,
    pub forecasts: HashMap<Timeframe, TimeframeForecast>,
}

impl Prediction {
    pub fn forecast(&self, timeframe: Timeframe) -> Option<&TimeframeForecast> {
        self.forecasts.get(&timeframe)
    }
}

/// Canonicalize a free-form regime label so one logical regime does not
/// fragment into several aggregation keys ("trend", " TREND " ...).
pub fn normalize_regime(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "UNKNOWN".to_string()
    } else {
        trimmed.to_uppercase()
    }
}
