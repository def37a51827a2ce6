use serde::Serialize;
use statrs::statistics::Statistics;

use super::returns::scaled_returns;
use super::returns::valid_closes;
use crate::config::ReturnScale;
use crate::market::PriceBar;

/// Prices, returns and moments of one instrument for a single analysis run.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentStats {
  /// Instrument identifier.
  pub symbol: String,
  /// Valid close prices used for the returns.
  pub prices: Vec<f64>,
  /// Simple returns at the configured scale.
  pub returns: Vec<f64>,
  /// Mean of `returns`.
  pub mean_return: f64,
  /// Population standard deviation of `returns`.
  pub std_dev: f64,
  /// Population variance of `returns`.
  pub variance: f64,
}

impl InstrumentStats {
  /// Derive returns and moments from already-filtered close prices.
  pub fn from_prices(symbol: impl Into<String>, prices: Vec<f64>, scale: ReturnScale) -> Self {
    let returns = scaled_returns(&prices, scale);
    let mean_return = returns.iter().mean();
    let variance = returns.iter().population_variance();

    Self {
      symbol: symbol.into(),
      prices,
      returns,
      mean_return,
      std_dev: variance.sqrt(),
      variance,
    }
  }

  /// Derive stats from raw bars, dropping non-positive or non-finite closes first.
  pub fn from_bars(symbol: impl Into<String>, bars: &[PriceBar], scale: ReturnScale) -> Self {
    Self::from_prices(symbol, valid_closes(bars), scale)
  }

  /// Whether at least one return could be computed.
  pub fn has_returns(&self) -> bool {
    !self.returns.is_empty()
  }
}
