use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::types::{ActualBar, Prediction, Timeframe, TimeframeForecast};

use super::{MemoryActualsFeed, MemoryPredictionFeed};

/// Upstream prediction payload, one JSON file per date. This is the
/// adapter boundary: field aliases (snake_case and camelCase) and rich
/// direction labels are resolved here so the core only ever sees
/// normalized types.
#[derive(Debug, Deserialize)]
struct RawPrediction {
    timestamp: Option<DateTime<Utc>>,
    #[serde(alias = "currentPrice")]
    current_price: Decimal,
    #[serde(default)]
    regime: RawRegime,
    #[serde(default, alias = "forecasts")]
    predictions: HashMap<String, RawForecast>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRegime {
    Label(String),
    Nested(RawRegimeState),
}

#[derive(Debug, Deserialize)]
struct RawRegimeState {
    #[serde(alias = "current")]
    state: Option<String>,
}

impl Default for RawRegime {
    fn default() -> Self {
        RawRegime::Label("UNKNOWN".to_string())
    }
}

impl RawRegime {
    fn into_label(self) -> String {
        match self {
            RawRegime::Label(label) => label,
            RawRegime::Nested(nested) => nested.state.unwrap_or_else(|| "UNKNOWN".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawForecast {
    direction: Option<String>,
    #[serde(default)]
    target: Decimal,
    #[serde(default, alias = "stopLoss")]
    stop_loss: Decimal,
    #[serde(default, alias = "upperBound", alias = "coneUpper")]
    cone_upper: Decimal,
    #[serde(default, alias = "lowerBound", alias = "coneLower")]
    cone_lower: Decimal,
    confidence: Option<Decimal>,
}

/// Load a directory of `YYYY-MM-DD.json` prediction files. Files whose
/// stem is not a date or whose payload does not parse are skipped with
/// a warning; sparse history is expected.
pub fn load_predictions_dir(dir: &Path) -> Result<MemoryPredictionFeed> {
    let mut feed = MemoryPredictionFeed::default();
    let entries = fs::read_dir(dir)
        .with_context(|| format!("cannot read predictions directory {}", dir.display()))?;

    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let stem = match path.file_stem().and_then(|s| s.to_str()) {
            Some(s) => s,
            None => continue,
        };
        let date = match NaiveDate::parse_from_str(stem, "%Y-%m-%d") {
            Ok(d) => d,
            Err(_) => {
                debug!("Skipping non-date prediction file {}", path.display());
                continue;
            }
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let raw: RawPrediction = match serde_json::from_str(&contents) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Skipping malformed prediction {}: {}", path.display(), e);
                continue;
            }
        };

        feed.insert(date, normalize_prediction(date, raw));
    }

    info!("Loaded {} prediction(s) from {}", feed.len(), dir.display());
    Ok(feed)
}

fn normalize_prediction(date: NaiveDate, raw: RawPrediction) -> Prediction {
    let mut forecasts = HashMap::new();
    for (key, forecast) in raw.predictions {
        // Unknown timeframe keys are ignored, not errors.
        let Some(timeframe) = Timeframe::from_str(&key) else {
            debug!("Ignoring unknown timeframe key '{}'", key);
            continue;
        };
        forecasts.insert(
            timeframe,
            TimeframeForecast::new(
                forecast.direction.unwrap_or_else(|| "NEUTRAL".to_string()),
                forecast.target,
                forecast.stop_loss,
                forecast.cone_lower,
                forecast.cone_upper,
                forecast.confidence,
            ),
        );
    }

    Prediction {
        timestamp: raw
            .timestamp
            .unwrap_or_else(|| date.and_hms_opt(9, 30, 0).unwrap().and_utc()),
        current_price: raw.current_price,
        regime: raw.regime.into_label(),
        forecasts,
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CsvBar {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Open")]
    open: Decimal,
    #[serde(rename = "High")]
    high: Decimal,
    #[serde(rename = "Low")]
    low: Decimal,
    #[serde(rename = "Close")]
    close: Decimal,
    #[serde(rename = "Volume")]
    volume: f64,
}

/// Load daily OHLCV bars from a `Date,Open,High,Low,Close,Volume` CSV.
pub fn load_actuals_csv(path: &Path) -> Result<MemoryActualsFeed> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("cannot open actuals file {}", path.display()))?;

    let mut feed = MemoryActualsFeed::default();
    for row in reader.deserialize() {
        let row: CsvBar = row.with_context(|| format!("bad row in {}", path.display()))?;
        feed.insert(
            row.date,
            ActualBar {
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume as u64,
            },
        );
    }

    info!("Loaded {} actual bar(s) from {}", feed.len(), path.display());
    Ok(feed)
}

/// Write a 30-day synthetic OHLCV CSV so an offline run works without
/// real market data.
pub fn seed_actuals_csv(path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("cannot create {}", path.display()))?;

    let mut base_price = dec!(580.0);
    let mut date = Utc::now().date_naive() - Duration::days(30);

    for i in 0u32..30 {
        let open = base_price + Decimal::from(i % 5) - dec!(2);
        let close = open + (Decimal::from(i % 3) - Decimal::ONE) * dec!(0.5);
        let high = open.max(close) + dec!(0.5);
        let low = open.min(close) - dec!(0.5);
        let volume = 50_000_000u64 + u64::from(i % 10) * 1_000_000;

        writer.serialize(CsvBar {
            date,
            open,
            high,
            low,
            close,
            volume: volume as f64,
        })?;

        date += Duration::days(1);
        base_price += (Decimal::from(i % 7) - dec!(3)) * dec!(0.25);
    }

    writer.flush()?;
    info!("Seeded synthetic actuals at {}", path.display());
    Ok(())
}

/// Write one example prediction JSON (for yesterday) into `dir`.
pub fn seed_prediction_example(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("cannot create predictions directory {}", dir.display()))?;

    let date = Utc::now().date_naive() - Duration::days(1);
    let path = dir.join(format!("{}.json", date.format("%Y-%m-%d")));

    let example = serde_json::json!({
        "timestamp": format!("{}T09:30:00Z", date.format("%Y-%m-%d")),
        "current_price": 580.50,
        "regime": "TREND",
        "predictions": {
            "1m":  { "direction": "BULLISH", "target": 580.75, "stop_loss": 580.25,
                     "cone_upper": 580.85, "cone_lower": 580.15, "confidence": 0.80 },
            "5m":  { "direction": "BULLISH", "target": 581.00, "stop_loss": 580.00,
                     "cone_upper": 581.50, "cone_lower": 579.50, "confidence": 0.72 },
            "15m": { "direction": "NEUTRAL", "target": 580.50, "stop_loss": 579.50,
                     "cone_upper": 582.00, "cone_lower": 579.00, "confidence": 0.68 },
            "1h":  { "direction": "BULLISH", "target": 582.00, "stop_loss": 579.00,
                     "cone_upper": 583.50, "cone_lower": 578.50, "confidence": 0.70 },
            "4h":  { "direction": "BEARISH", "target": 578.00, "stop_loss": 582.00,
                     "cone_upper": 583.00, "cone_lower": 577.00, "confidence": 0.65 },
            "1d":  { "direction": "BEARISH", "target": 575.00, "stop_loss": 583.00,
                     "cone_upper": 585.00, "cone_lower": 573.00, "confidence": 0.62 }
        }
    });

    fs::write(&path, serde_json::to_string_pretty(&example)?)?;
    info!("Seeded example prediction at {}", path.display());
    Ok(())
}
