use chrono::{Duration, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

use crate::types::Prediction;

/// Result of restricting a prediction set to a date window. The bounds
/// are the effective (clamped) ones actually applied; `note` describes
/// any trimming against the available range in human-readable form.
#[derive(Debug, Clone)]
pub struct WindowedPredictions {
    pub predictions: BTreeMap<NaiveDate, Prediction>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub note: Option<String>,
}

/// Restrict `predictions` to `[start, end]`, clamped to the available
/// date range.
///
/// Unspecified bounds default to the latest available date and to
/// `end - months * 30 days` respectively; the 30-day month is a
/// documented calendar approximation, not exact month arithmetic.
/// An empty input is a no-op (nothing to clamp against), and a window
/// that clamps to emptiness is a normal, reportable outcome.
pub fn filter_by_window(
    predictions: BTreeMap<NaiveDate, Prediction>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    months: u32,
) -> WindowedPredictions {
    if predictions.is_empty() {
        return WindowedPredictions {
            predictions,
            start,
            end,
            note: None,
        };
    }

    // BTreeMap keys are ordered, so the bounds are the first/last keys.
    let earliest = *predictions.keys().next().unwrap();
    let latest = *predictions.keys().next_back().unwrap();

    let months = months.max(1);
    let requested_end = end.unwrap_or(latest);
    let requested_start =
        start.unwrap_or_else(|| requested_end - Duration::days(i64::from(months) * 30));

    let clamped_start = requested_start.max(earliest);
    let clamped_end = requested_end.min(latest);

    let mut notes = Vec::new();
    let missing_front = (clamped_start - requested_start).num_days();
    if missing_front > 0 {
        notes.push(format!(
            "{} requested day(s) before available data ({})",
            missing_front, earliest
        ));
    }
    let missing_back = (requested_end - clamped_end).num_days();
    if missing_back > 0 {
        notes.push(format!(
            "{} requested day(s) after available data ({})",
            missing_back, latest
        ));
    }
    let note = if notes.is_empty() {
        None
    } else {
        Some(notes.join("; "))
    };

    if clamped_start > clamped_end {
        debug!(
            "Window [{} .. {}] clamps to empty against available [{} .. {}]",
            requested_start, requested_end, earliest, latest
        );
        return WindowedPredictions {
            predictions: BTreeMap::new(),
            start: Some(clamped_start),
            end: Some(clamped_end),
            note,
        };
    }

    let filtered: BTreeMap<NaiveDate, Prediction> = predictions
        .into_iter()
        .filter(|(date, _)| *date >= clamped_start && *date <= clamped_end)
        .collect();

    debug!(
        "Window [{} .. {}]: {} prediction(s) selected",
        clamped_start,
        clamped_end,
        filtered.len()
    );

    WindowedPredictions {
        predictions: filtered,
        start: Some(clamped_start),
        end: Some(clamped_end),
        note,
    }
}
