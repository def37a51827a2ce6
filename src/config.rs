//! # Configuration
//!
//! $$
//! \tau_g\in(0,1],\qquad K\ge 1
//! $$
//!
//! Explicit configuration objects passed into the partitioner and the engines.
//! [`IndexesConfig`] reads a camelCase JSON document keyed by index; unknown keys
//! (display names, colors, emoji) are ignored.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;
use tracing::warn;

use crate::error::AnalyticsError;
use crate::error::Result;
use crate::index::IndexKey;

fn default_correlation_threshold() -> f64 {
  0.7
}

fn default_top_pairs_count() -> usize {
  3
}

/// Scale applied to simple returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnScale {
  /// `(p_t - p_{t-1}) / p_{t-1}`.
  #[default]
  Fraction,
  /// Fractional return multiplied by 100.
  Percent,
}

impl ReturnScale {
  /// Multiplier applied to a fractional return.
  pub fn factor(self) -> f64 {
    match self {
      Self::Fraction => 1.0,
      Self::Percent => 100.0,
    }
  }
}

/// Policy for a single index group.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexConfig {
  /// Human readable index name, e.g. `S&P500`.
  pub name: String,
  /// Free-form description.
  #[serde(default)]
  pub description: String,
  /// Disabled groups are skipped entirely.
  pub enabled: bool,
  /// Minimum absolute correlation for a pair to be reported as a top pair.
  pub correlation_threshold: f64,
  /// Symbols that belong to this group.
  #[serde(default)]
  pub members: Vec<String>,
}

impl IndexConfig {
  /// Group policy without members.
  pub fn new(
    name: impl Into<String>,
    description: impl Into<String>,
    enabled: bool,
    correlation_threshold: f64,
  ) -> Self {
    Self {
      name: name.into(),
      description: description.into(),
      enabled,
      correlation_threshold,
      members: Vec::new(),
    }
  }

  /// Replace the member list.
  pub fn with_members<I, S>(mut self, members: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.members = members.into_iter().map(Into::into).collect();
    self
  }
}

/// Per-index policies plus global defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexesConfig {
  /// Policies keyed by index.
  pub indexes: BTreeMap<IndexKey, IndexConfig>,
  /// Threshold used for indexes missing from `indexes`.
  #[serde(default = "default_correlation_threshold")]
  pub default_correlation_threshold: f64,
  /// Number of top pairs reported per index.
  #[serde(default = "default_top_pairs_count")]
  pub default_top_pairs_count: usize,
}

impl Default for IndexesConfig {
  fn default() -> Self {
    let mut indexes = BTreeMap::new();
    indexes.insert(
      IndexKey::Sp500,
      IndexConfig::new("S&P500", "US large-cap equities", true, 0.7),
    );
    indexes.insert(
      IndexKey::Nasdaq,
      IndexConfig::new("NASDAQ", "Technology equities", true, 0.7),
    );
    indexes.insert(
      IndexKey::Imoex,
      IndexConfig::new("IMOEX", "Russian equities", true, 0.6),
    );
    indexes.insert(
      IndexKey::Rucbitr,
      IndexConfig::new("RUCBITR", "Russian corporate bonds", false, 0.6),
    );
    indexes.insert(
      IndexKey::Rgbi,
      IndexConfig::new("RGBI", "Russian government bonds", false, 0.6),
    );

    Self {
      indexes,
      default_correlation_threshold: default_correlation_threshold(),
      default_top_pairs_count: default_top_pairs_count(),
    }
  }
}

impl IndexesConfig {
  /// Parse and validate a JSON document.
  pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
    let config: Self = serde_json::from_str(json).context("failed to parse indexes configuration")?;
    config.validate()?;
    Ok(config)
  }

  /// Read, parse and validate a JSON configuration file.
  pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
      .with_context(|| format!("failed to read indexes configuration {}", path.display()))?;
    let config = Self::from_json_str(&raw)
      .with_context(|| format!("invalid indexes configuration {}", path.display()))?;
    info!(path = %path.display(), enabled = config.enabled_indexes().len(), "indexes configuration loaded");
    Ok(config)
  }

  /// Like [`IndexesConfig::from_path`], falling back to the built-in defaults on any failure.
  pub fn load_or_default(path: impl AsRef<Path>) -> Self {
    match Self::from_path(path.as_ref()) {
      Ok(config) => config,
      Err(err) => {
        warn!(
          path = %path.as_ref().display(),
          error = %format!("{err:#}"),
          "indexes configuration unavailable, using defaults"
        );
        Self::default()
      }
    }
  }

  /// Check thresholds lie in `(0, 1]` and the top pair count is positive.
  pub fn validate(&self) -> Result<()> {
    if !valid_threshold(self.default_correlation_threshold) {
      return Err(AnalyticsError::invalid_config(format!(
        "default correlation threshold must be in (0, 1], got {}",
        self.default_correlation_threshold
      )));
    }

    if self.default_top_pairs_count == 0 {
      return Err(AnalyticsError::invalid_config(
        "default top pairs count must be positive",
      ));
    }

    for (key, index) in &self.indexes {
      if !valid_threshold(index.correlation_threshold) {
        return Err(AnalyticsError::invalid_config(format!(
          "correlation threshold for {key} must be in (0, 1], got {}",
          index.correlation_threshold
        )));
      }
    }

    Ok(())
  }

  /// Policy for `key`, if configured.
  pub fn index(&self, key: IndexKey) -> Option<&IndexConfig> {
    self.indexes.get(&key)
  }

  /// Whether `key` is configured and enabled.
  pub fn is_enabled(&self, key: IndexKey) -> bool {
    self.index(key).is_some_and(|index| index.enabled)
  }

  /// Threshold for `key`, or the global default.
  pub fn correlation_threshold(&self, key: IndexKey) -> f64 {
    self
      .index(key)
      .map(|index| index.correlation_threshold)
      .unwrap_or(self.default_correlation_threshold)
  }

  /// Display name for `key`.
  pub fn index_name(&self, key: IndexKey) -> String {
    self
      .index(key)
      .map(|index| index.name.clone())
      .unwrap_or_else(|| key.default_name().to_string())
  }

  /// Enabled indexes in configuration order.
  pub fn enabled_indexes(&self) -> Vec<IndexKey> {
    self
      .indexes
      .iter()
      .filter(|(_, index)| index.enabled)
      .map(|(key, _)| *key)
      .collect()
  }

  /// Toggle an index. Returns `false` if the index is not configured.
  pub fn set_enabled(&mut self, key: IndexKey, enabled: bool) -> bool {
    match self.indexes.get_mut(&key) {
      Some(index) => {
        index.enabled = enabled;
        true
      }
      None => false,
    }
  }

  /// Replace the member list of a configured index. Returns `false` if the index is not configured.
  pub fn set_members<I, S>(&mut self, key: IndexKey, members: I) -> bool
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    match self.indexes.get_mut(&key) {
      Some(index) => {
        index.members = members.into_iter().map(Into::into).collect();
        true
      }
      None => false,
    }
  }
}

fn valid_threshold(threshold: f64) -> bool {
  threshold > 0.0 && threshold <= 1.0
}

/// Runtime options for [`crate::pairs::PairsEngine`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PairsConfig {
  /// Number of most recent price bars kept per instrument.
  pub horizon_days: usize,
  /// Scale of the returns fed into the pairwise statistics.
  pub return_scale: ReturnScale,
  /// Analyze index groups on the rayon pool.
  pub parallel: bool,
}

impl Default for PairsConfig {
  fn default() -> Self {
    Self {
      horizon_days: 63,
      return_scale: ReturnScale::Percent,
      parallel: true,
    }
  }
}

impl PairsConfig {
  /// Reject a zero horizon.
  pub fn validate(&self) -> Result<()> {
    if self.horizon_days == 0 {
      return Err(AnalyticsError::invalid_config(
        "analysis horizon must be at least one day",
      ));
    }
    Ok(())
  }
}

/// Tunables of the minimum-risk gradient optimizer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OptimizerConfig {
  /// Hard cap on gradient iterations.
  pub max_iterations: usize,
  /// Fixed step taken against the risk gradient.
  pub step_size: f64,
  /// Convergence threshold on the change in portfolio risk.
  pub tolerance: f64,
}

impl Default for OptimizerConfig {
  fn default() -> Self {
    Self {
      max_iterations: 200,
      step_size: 0.001,
      tolerance: 1e-8,
    }
  }
}

impl OptimizerConfig {
  /// Step size must be positive and finite, tolerance non-negative.
  pub fn validate(&self) -> Result<()> {
    if !(self.step_size.is_finite() && self.step_size > 0.0) {
      return Err(AnalyticsError::invalid_config(format!(
        "optimizer step size must be positive, got {}",
        self.step_size
      )));
    }
    if !(self.tolerance.is_finite() && self.tolerance >= 0.0) {
      return Err(AnalyticsError::invalid_config(format!(
        "optimizer tolerance must be non-negative, got {}",
        self.tolerance
      )));
    }
    Ok(())
  }
}

/// Tunables of the efficient frontier sweep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrontierConfig {
  /// Number of target returns swept.
  pub points: usize,
  /// Nudging iterations per point.
  pub max_iterations: usize,
  /// Fraction of the return gap added to the top asset's weight per iteration.
  pub adjustment_rate: f64,
  /// Accepted distance between achieved and target return.
  pub tolerance: f64,
}

impl Default for FrontierConfig {
  fn default() -> Self {
    Self {
      points: 20,
      max_iterations: 50,
      adjustment_rate: 0.1,
      tolerance: 1e-4,
    }
  }
}

impl FrontierConfig {
  /// Adjustment rate must be positive and finite.
  pub fn validate(&self) -> Result<()> {
    if !(self.adjustment_rate.is_finite() && self.adjustment_rate > 0.0) {
      return Err(AnalyticsError::invalid_config(format!(
        "frontier adjustment rate must be positive, got {}",
        self.adjustment_rate
      )));
    }
    Ok(())
  }
}

/// Runtime options for [`crate::portfolio::PortfolioEngine`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PortfolioConfig {
  /// Minimum number of price bars an asset needs to enter the portfolio.
  pub min_observations: usize,
  /// Optimizer tunables.
  pub optimizer: OptimizerConfig,
  /// Frontier tunables.
  pub frontier: FrontierConfig,
}

impl Default for PortfolioConfig {
  fn default() -> Self {
    Self {
      min_observations: 30,
      optimizer: OptimizerConfig::default(),
      frontier: FrontierConfig::default(),
    }
  }
}

impl PortfolioConfig {
  /// Validate nested tunables; at least two bars are needed for a return.
  pub fn validate(&self) -> Result<()> {
    if self.min_observations < 2 {
      return Err(AnalyticsError::invalid_config(format!(
        "minimum observations must be at least 2, got {}",
        self.min_observations
      )));
    }
    self.optimizer.validate()?;
    self.frontier.validate()
  }
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use tracing_test::traced_test;

  use super::*;

  #[test]
  fn default_config_enables_equity_indexes_only() {
    let config = IndexesConfig::default();

    assert_eq!(
      config.enabled_indexes(),
      vec![IndexKey::Sp500, IndexKey::Nasdaq, IndexKey::Imoex]
    );
    assert_eq!(config.default_top_pairs_count, 3);
    assert!((config.correlation_threshold(IndexKey::Imoex) - 0.6).abs() < 1e-12);
    assert!(config.validate().is_ok());
  }

  #[test]
  fn parses_json_with_presentation_keys() {
    let json = r##"{
      "indexes": {
        "sp500": {
          "name": "S&P500",
          "displayName": "S&P500",
          "description": "US equities",
          "enabled": true,
          "correlationThreshold": 0.8,
          "color": "#3498db",
          "members": ["MSFT", "AAPL"]
        },
        "rgbi": {
          "name": "RGBI",
          "enabled": true,
          "correlationThreshold": 0.65
        }
      },
      "defaultCorrelationThreshold": 0.7,
      "defaultTopPairsCount": 5
    }"##;

    let config = IndexesConfig::from_json_str(json).unwrap();
    assert_eq!(config.default_top_pairs_count, 5);
    assert_eq!(config.enabled_indexes(), vec![IndexKey::Sp500, IndexKey::Rgbi]);
    assert_eq!(config.index(IndexKey::Sp500).unwrap().members, vec!["MSFT", "AAPL"]);
    // missing indexes fall back to the global threshold
    assert!((config.correlation_threshold(IndexKey::Nasdaq) - 0.7).abs() < 1e-12);
    assert_eq!(config.index_name(IndexKey::Nasdaq), "NASDAQ");
  }

  #[test]
  fn rejects_out_of_range_threshold() {
    let mut config = IndexesConfig::default();
    config.indexes.get_mut(&IndexKey::Nasdaq).unwrap().correlation_threshold = 1.5;

    let err = config.validate().unwrap_err();
    assert!(matches!(err, AnalyticsError::InvalidConfig { .. }));
  }

  #[test]
  fn rejects_zero_top_pairs() {
    let config = IndexesConfig {
      default_top_pairs_count: 0,
      ..IndexesConfig::default()
    };
    assert!(config.validate().is_err());
  }

  #[test]
  fn loads_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let json = serde_json::to_string(&IndexesConfig::default()).unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let config = IndexesConfig::from_path(file.path()).unwrap();
    assert_eq!(config, IndexesConfig::default());
  }

  #[test]
  #[traced_test]
  fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexesConfig::load_or_default(dir.path().join("missing.json"));

    assert_eq!(config, IndexesConfig::default());
    assert!(logs_contain("using defaults"));
  }

  #[test]
  fn toggles_and_replaces_members() {
    let mut config = IndexesConfig::default();
    assert!(config.set_enabled(IndexKey::Rgbi, true));
    assert!(config.is_enabled(IndexKey::Rgbi));
    assert!(config.set_members(IndexKey::Rgbi, ["SU26238RMFS4"]));
    assert_eq!(config.index(IndexKey::Rgbi).unwrap().members.len(), 1);

    config.indexes.insert(
      IndexKey::Imoex,
      IndexConfig::new("IMOEX", "", false, 0.5).with_members(["SBER", "GAZP"]),
    );
    assert!(!config.is_enabled(IndexKey::Imoex));
    assert_eq!(config.index(IndexKey::Imoex).unwrap().members, vec!["SBER", "GAZP"]);
  }

  #[test]
  fn pairs_config_rejects_zero_horizon() {
    let config = PairsConfig {
      horizon_days: 0,
      ..PairsConfig::default()
    };
    assert!(config.validate().is_err());
  }

  #[test]
  fn optimizer_config_rejects_bad_step() {
    let config = OptimizerConfig {
      step_size: 0.0,
      ..OptimizerConfig::default()
    };
    assert!(config.validate().is_err());
    assert!(OptimizerConfig::default().validate().is_ok());
  }
}
