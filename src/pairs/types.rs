//! # Pairs Types
//!
//! $$
//! \bar\rho=\frac1{|\mathcal P|}\sum_{p\in\mathcal P}|\rho_p|
//! $$
//!
//! Records produced by the pairs engine, ready for serialization.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::index::IndexKey;

/// A correlated pair with its long/short legs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationPair {
  /// Earlier symbol in universe order.
  pub asset1: String,
  /// Later symbol in universe order.
  pub asset2: String,
  /// Absolute Pearson correlation, in `[0, 1)`.
  pub correlation: f64,
  /// Leg with the higher prospectivity.
  pub long_asset: String,
  /// The other leg.
  pub short_asset: String,
  /// Mean return over volatility of the long leg.
  pub long_prospectivity: f64,
  /// Mean return over volatility of the short leg.
  pub short_prospectivity: f64,
  /// Return standard deviation of `asset1`.
  pub volatility1: f64,
  /// Return standard deviation of `asset2`.
  pub volatility2: f64,
  /// Mean return of `asset1`.
  pub avg_return1: f64,
  /// Mean return of `asset2`.
  pub avg_return2: f64,
  /// `LONG {long} / SHORT {short}`.
  pub strategy: String,
  /// Display name of the index the pair was found in.
  pub index_name: String,
}

impl CorrelationPair {
  /// Strategy label for a long/short combination.
  pub fn strategy_label(long_asset: &str, short_asset: &str) -> String {
    format!("LONG {long_asset} / SHORT {short_asset}")
  }
}

/// Mean, max and min of a set of correlations; all zero when the set is empty.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationSummary {
  /// Values summarized.
  pub count: usize,
  /// Arithmetic mean.
  pub average: f64,
  /// Largest value.
  pub max: f64,
  /// Smallest value.
  pub min: f64,
}

impl CorrelationSummary {
  /// Summarize arbitrary correlation values.
  pub fn from_values<I>(values: I) -> Self
  where
    I: IntoIterator<Item = f64>,
  {
    let mut count = 0usize;
    let mut sum = 0.0;
    let mut max = f64::NEG_INFINITY;
    let mut min = f64::INFINITY;

    for v in values {
      count += 1;
      sum += v;
      max = max.max(v);
      min = min.min(v);
    }

    if count == 0 {
      return Self::default();
    }

    Self {
      count,
      average: sum / count as f64,
      max,
      min,
    }
  }

  /// Summarize the correlations of `pairs`.
  pub fn from_pairs(pairs: &[CorrelationPair]) -> Self {
    Self::from_values(pairs.iter().map(|p| p.correlation))
  }
}

/// Result for a single index group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPairsAnalysis {
  /// Index the pairs were drawn from.
  pub index_key: IndexKey,
  /// Display name of the index.
  pub index_name: String,
  /// Qualifying pairs before thresholding.
  pub total_pairs: usize,
  /// Mean correlation of the qualifying pairs.
  pub average_correlation: f64,
  /// Strongest qualifying correlation.
  pub max_correlation: f64,
  /// Weakest qualifying correlation.
  pub min_correlation: f64,
  /// Minimum correlation for a top pair.
  pub correlation_threshold: f64,
  /// At most K pairs at or above the threshold, strongest first.
  pub top_pairs: Vec<CorrelationPair>,
  /// When the index was analyzed.
  pub analysis_date: DateTime<Utc>,
}

impl IndexPairsAnalysis {
  /// Unique symbols of the top pairs, in first-seen order.
  pub fn top_symbols(&self) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for pair in &self.top_pairs {
      for symbol in [&pair.asset1, &pair.asset2] {
        if !symbols.contains(symbol) {
          symbols.push(symbol.clone());
        }
      }
    }
    symbols
  }
}

/// Pair count of one index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPairCount {
  /// Index counted.
  pub index_key: IndexKey,
  /// Display name of the index.
  pub index_name: String,
  /// Qualifying pairs before thresholding.
  pub pairs: usize,
  /// Pairs kept after thresholding.
  pub top_pairs: usize,
}

/// Aggregate across every analyzed index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairsAnalysis {
  /// Sum of per-index pair counts before thresholding.
  pub total_pairs: usize,
  /// Sum of per-index top pair counts.
  pub total_top_pairs: usize,
  /// Counts of each index, in index order.
  pub pairs_per_index: Vec<IndexPairCount>,
  /// Over every qualifying pair, before thresholding.
  pub average_correlation: f64,
  /// Strongest qualifying correlation of any index.
  pub max_correlation: f64,
  /// Weakest qualifying correlation of any index.
  pub min_correlation: f64,
  /// Top pairs of each index, concatenated in index order.
  pub top_pairs: Vec<CorrelationPair>,
  /// Per-index results, in index order.
  pub indexes: Vec<IndexPairsAnalysis>,
  /// When the analysis finished.
  pub analysis_date: DateTime<Utc>,
}

impl PairsAnalysis {
  /// Analysis of `key`, if it was run.
  pub fn index(&self, key: IndexKey) -> Option<&IndexPairsAnalysis> {
    self.indexes.iter().find(|a| a.index_key == key)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_summary_is_zero() {
    let summary = CorrelationSummary::from_values(Vec::new());
    assert_eq!(summary, CorrelationSummary::default());
  }

  #[test]
  fn summary_tracks_extremes() {
    let summary = CorrelationSummary::from_values([0.2, 0.9, 0.4]);
    assert_eq!(summary.count, 3);
    assert!((summary.average - 0.5).abs() < 1e-12);
    assert_eq!(summary.max, 0.9);
    assert_eq!(summary.min, 0.2);
  }

  #[test]
  fn pair_serializes_camel_case_fields() {
    let pair = CorrelationPair {
      asset1: "AAA".into(),
      asset2: "BBB".into(),
      correlation: 0.9,
      long_asset: "BBB".into(),
      short_asset: "AAA".into(),
      long_prospectivity: 0.5,
      short_prospectivity: 0.1,
      volatility1: 0.02,
      volatility2: 0.03,
      avg_return1: 0.001,
      avg_return2: 0.004,
      strategy: CorrelationPair::strategy_label("BBB", "AAA"),
      index_name: "Test".into(),
    };

    let value = serde_json::to_value(&pair).unwrap();
    for field in [
      "asset1",
      "asset2",
      "shortAsset",
      "longProspectivity",
      "shortProspectivity",
      "volatility1",
      "volatility2",
      "avgReturn1",
      "avgReturn2",
    ] {
      assert!(value.get(field).is_some(), "missing {field}");
    }
    assert_eq!(value["avgReturn2"], 0.004);
  }

  #[test]
  fn strategy_label_format() {
    assert_eq!(
      CorrelationPair::strategy_label("MSFT", "AAPL"),
      "LONG MSFT / SHORT AAPL"
    );
  }
}
