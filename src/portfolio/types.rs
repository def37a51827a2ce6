//! # Portfolio Types
//!
//! $$
//! S=\frac{\mathbf w^\top\mu}{\sqrt{\mathbf w^\top\Sigma\mathbf w}}
//! $$
//!
//! Result records of the optimizer, the frontier sweep and the per-index run.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use crate::index::IndexKey;

/// Output of a single optimization.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
  /// Non-negative weights summing to one.
  pub weights: Vec<f64>,
  /// `Σ w_i μ_i`.
  pub expected_return: f64,
  /// Portfolio standard deviation.
  pub risk: f64,
  /// `expected_return / risk`.
  pub sharpe_ratio: f64,
}

/// One point of the efficient frontier sweep.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EfficientFrontierPoint {
  /// Return the sweep aimed for at this point.
  pub target_return: f64,
  /// `Σ w_i μ_i` of `weights`.
  pub achieved_return: f64,
  /// Standard deviation of `weights`; non-decreasing along the sweep.
  pub achieved_risk: f64,
  /// `achieved_return / achieved_risk`.
  pub sharpe_ratio: f64,
  /// Non-negative weights summing to one.
  pub weights: Vec<f64>,
}

/// Optimized portfolio over a set of symbols, with its frontier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
  /// Assets that entered the optimization.
  pub total_assets: usize,
  /// Symbols in weight order.
  pub symbols: Vec<String>,
  /// Mean fractional return per symbol.
  pub expected_returns: Vec<f64>,
  /// Minimum-risk portfolio.
  pub portfolio: Portfolio,
  /// Frontier sweep over the same covariance matrix.
  pub efficient_frontier: Vec<EfficientFrontierPoint>,
  /// When the portfolio was built.
  pub analysis_date: DateTime<Utc>,
}

impl PortfolioSummary {
  /// Weight of `symbol`, if it is part of the portfolio.
  pub fn weight_of(&self, symbol: &str) -> Option<f64> {
    self
      .symbols
      .iter()
      .position(|s| s == symbol)
      .and_then(|i| self.portfolio.weights.get(i).copied())
  }
}

/// Portfolio built from the top pairs of one index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexPortfolioAnalysis {
  /// Index the top pairs came from.
  pub index_key: IndexKey,
  /// Display name of the index.
  pub index_name: String,
  /// Portfolio over the assets of the index's top pairs.
  pub summary: PortfolioSummary,
}
