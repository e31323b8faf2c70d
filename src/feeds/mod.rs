#![allow(dead_code)]
pub mod files;

pub use files::*;

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::types::{ActualBar, Prediction};

/// Source of per-date predictions. Constructor-injected into the
/// backtest engine; lifecycle is scoped to one run, no process-wide
/// state.
pub trait PredictionFeed {
    fn get(&self, date: NaiveDate) -> Option<&Prediction>;
    /// Available dates in ascending order.
    fn dates(&self) -> Vec<NaiveDate>;
}

/// Source of realized OHLCV bars, one per trading date.
pub trait ActualsFeed {
    fn get(&self, date: NaiveDate) -> Option<&ActualBar>;
}

/// In-memory prediction feed, used by tests and as the landing type for
/// the file loaders.
#[derive(Debug, Clone, Default)]
pub struct MemoryPredictionFeed {
    predictions: BTreeMap<NaiveDate, Prediction>,
}

impl MemoryPredictionFeed {
    pub fn new(predictions: BTreeMap<NaiveDate, Prediction>) -> Self {
        Self { predictions }
    }

    pub fn insert(&mut self, date: NaiveDate, prediction: Prediction) {
        self.predictions.insert(date, prediction);
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

impl PredictionFeed for MemoryPredictionFeed {
    fn get(&self, date: NaiveDate) -> Option<&Prediction> {
        self.predictions.get(&date)
    }

    fn dates(&self) -> Vec<NaiveDate> {
        self.predictions.keys().copied().collect()
    }
}

/// In-memory actuals feed.
#[derive(Debug, Clone, Default)]
pub struct MemoryActualsFeed {
    bars: BTreeMap<NaiveDate, ActualBar>,
}

impl MemoryActualsFeed {
    pub fn new(bars: BTreeMap<NaiveDate, ActualBar>) -> Self {
        Self { bars }
    }

    pub fn insert(&mut self, date: NaiveDate, bar: ActualBar) {
        self.bars.insert(date, bar);
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

impl ActualsFeed for MemoryActualsFeed {
    fn get(&self, date: NaiveDate) -> Option<&ActualBar> {
        self.bars.get(&date)
    }
}
