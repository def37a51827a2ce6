//! # Market Data
//!
//! $$
//! \mathcal{S}_1 \to \mathcal{S}_2 \to \cdots \to \mathcal{S}_n
//! $$
//!
//! Price bars and the boundary to whatever supplies them. Retrieval itself lives
//! outside this crate; [`PriceSource`] is the contract, [`FallbackPriceSource`] chains
//! several sources and takes the first success.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::error::AnalyticsError;
use crate::error::Result;

/// One daily OHLCV bar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBar {
  /// Trading day.
  pub date: NaiveDate,
  pub open: f64,
  pub high: f64,
  pub low: f64,
  /// Close used for every return computation.
  pub close: f64,
  pub volume: f64,
}

impl PriceBar {
  /// Bar with every price field set to `close` and zero volume.
  pub fn from_close(date: NaiveDate, close: f64) -> Self {
    Self {
      date,
      open: close,
      high: close,
      low: close,
      close,
      volume: 0.0,
    }
  }
}

/// Supplier of chronologically ordered price history.
pub trait PriceSource: Send + Sync {
  /// Identifier used in logs.
  fn name(&self) -> &str;

  /// Full available history for `symbol`, oldest first.
  fn price_history(&self, symbol: &str) -> Result<Vec<PriceBar>>;
}

/// Price source backed by a map, for pre-loaded data and tests.
#[derive(Clone, Debug, Default)]
pub struct InMemoryPriceSource {
  name: String,
  series: HashMap<String, Vec<PriceBar>>,
}

impl InMemoryPriceSource {
  /// Empty source.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      series: HashMap::new(),
    }
  }

  /// Store `bars` under `symbol`, replacing previous data.
  pub fn insert(&mut self, symbol: impl Into<String>, bars: Vec<PriceBar>) {
    self.series.insert(symbol.into(), bars);
  }

  /// Store daily bars built from `closes`, one calendar day apart starting at `start`.
  pub fn insert_closes(&mut self, symbol: impl Into<String>, start: NaiveDate, closes: &[f64]) {
    let bars = start
      .iter_days()
      .zip(closes.iter())
      .map(|(date, &close)| PriceBar::from_close(date, close))
      .collect();
    self.insert(symbol, bars);
  }

  /// Symbols held by this source, sorted.
  pub fn symbols(&self) -> Vec<String> {
    let mut symbols: Vec<String> = self.series.keys().cloned().collect();
    symbols.sort();
    symbols
  }
}

impl PriceSource for InMemoryPriceSource {
  fn name(&self) -> &str {
    &self.name
  }

  fn price_history(&self, symbol: &str) -> Result<Vec<PriceBar>> {
    self
      .series
      .get(symbol)
      .cloned()
      .ok_or_else(|| AnalyticsError::price_data(symbol, format!("not found in {}", self.name)))
  }
}

/// Ordered chain of sources; the first `Ok` wins.
#[derive(Default)]
pub struct FallbackPriceSource {
  sources: Vec<Box<dyn PriceSource>>,
}

impl FallbackPriceSource {
  /// Empty chain.
  pub fn new() -> Self {
    Self::default()
  }

  /// Append a source to the end of the chain.
  pub fn with_source(mut self, source: impl PriceSource + 'static) -> Self {
    self.sources.push(Box::new(source));
    self
  }

  /// Number of chained sources.
  pub fn len(&self) -> usize {
    self.sources.len()
  }

  /// Whether the chain is empty.
  pub fn is_empty(&self) -> bool {
    self.sources.is_empty()
  }
}

impl PriceSource for FallbackPriceSource {
  fn name(&self) -> &str {
    "fallback"
  }

  fn price_history(&self, symbol: &str) -> Result<Vec<PriceBar>> {
    let mut failures = Vec::with_capacity(self.len());

    for source in &self.sources {
      match source.price_history(symbol) {
        Ok(bars) if !bars.is_empty() => return Ok(bars),
        Ok(_) => {
          debug!(symbol, source = source.name(), "source returned no bars");
          failures.push(format!("{}: empty", source.name()));
        }
        Err(err) => {
          debug!(symbol, source = source.name(), error = %err, "source failed");
          failures.push(format!("{}: {err}", source.name()));
        }
      }
    }

    let reason = if self.is_empty() {
      "no sources configured".to_string()
    } else {
      failures.join("; ")
    };
    Err(AnalyticsError::price_data(symbol, reason))
  }
}
