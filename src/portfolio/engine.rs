//! # Portfolio Engine
//!
//! $$
//! \{r_i\}_{i\in U}\ \to\ \Sigma\ \to\ \mathbf w^\*\ \to\ \{(\mu^\*_p,\sigma_p)\}_{p}
//! $$
//!
//! Orchestration from symbols to an optimized portfolio and its frontier. Per index,
//! the universe is the set of assets appearing in that index's top pairs.

use chrono::Utc;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::covariance::covariance_matrix;
use super::frontier::efficient_frontier;
use super::optimizer::MinRiskOptimizer;
use super::types::IndexPortfolioAnalysis;
use super::types::PortfolioSummary;
use crate::config::PortfolioConfig;
use crate::config::ReturnScale;
use crate::error::AnalyticsError;
use crate::error::Result;
use crate::market::PriceSource;
use crate::pairs::IndexPairsAnalysis;
use crate::pairs::PairsAnalysis;
use crate::series::InstrumentStats;

/// Fewest assets a portfolio can be built from.
pub const MIN_ASSETS: usize = 2;

/// Entry point for portfolio construction.
#[derive(Clone, Debug)]
pub struct PortfolioEngine {
  config: PortfolioConfig,
  optimizer: MinRiskOptimizer,
}

impl Default for PortfolioEngine {
  fn default() -> Self {
    Self {
      config: PortfolioConfig::default(),
      optimizer: MinRiskOptimizer::default(),
    }
  }
}

impl PortfolioEngine {
  /// Construct a new engine with explicit configuration.
  pub fn new(config: PortfolioConfig) -> Result<Self> {
    config.validate()?;
    let optimizer = MinRiskOptimizer::new(config.optimizer)?;
    Ok(Self { config, optimizer })
  }

  /// Borrow engine configuration.
  pub fn config(&self) -> &PortfolioConfig {
    &self.config
  }

  /// Fractional-return stats for every symbol with enough usable history.
  pub fn load_instruments<S>(&self, symbols: &[String], source: &S) -> Vec<InstrumentStats>
  where
    S: PriceSource + ?Sized,
  {
    let mut instruments = Vec::with_capacity(symbols.len());

    for symbol in symbols {
      let bars = match source.price_history(symbol) {
        Ok(bars) => bars,
        Err(err) => {
          warn!(symbol = %symbol, source = source.name(), error = %err, "price history unavailable, asset skipped");
          continue;
        }
      };

      if bars.len() < self.config.min_observations {
        warn!(
          symbol = %symbol,
          bars = bars.len(),
          required = self.config.min_observations,
          "insufficient history, asset skipped"
        );
        continue;
      }

      let stats = InstrumentStats::from_bars(symbol.as_str(), &bars, ReturnScale::Fraction);
      if !stats.has_returns() {
        warn!(symbol = %symbol, "no valid closes, asset skipped");
        continue;
      }

      debug!(symbol = %symbol, returns = stats.returns.len(), mean = stats.mean_return, "asset loaded");
      instruments.push(stats);
    }

    instruments
  }

  /// Minimum-risk portfolio and frontier over `symbols`.
  ///
  /// # Errors
  /// [`AnalyticsError::InsufficientAssets`] when fewer than two symbols have usable
  /// history, plus any structural error from the covariance matrix or optimizer.
  pub fn build_portfolio<S>(&self, symbols: &[String], source: &S) -> Result<PortfolioSummary>
  where
    S: PriceSource + ?Sized,
  {
    let instruments = self.load_instruments(symbols, source);
    if instruments.len() < MIN_ASSETS {
      return Err(AnalyticsError::InsufficientAssets {
        required: MIN_ASSETS,
        available: instruments.len(),
      });
    }

    let returns: Vec<Vec<f64>> = instruments.iter().map(|s| s.returns.clone()).collect();
    let expected_returns: Vec<f64> = instruments.iter().map(|s| s.mean_return).collect();

    let cov = covariance_matrix(&returns)?;
    let report = self.optimizer.optimize_with_report(&cov, &expected_returns)?;
    let efficient_frontier = efficient_frontier(&cov, &expected_returns, &self.config.frontier)?;

    info!(
      assets = instruments.len(),
      risk = report.portfolio.risk,
      expected_return = report.portfolio.expected_return,
      termination = ?report.termination,
      "portfolio optimized"
    );

    Ok(PortfolioSummary {
      total_assets: instruments.len(),
      symbols: instruments.into_iter().map(|s| s.symbol).collect(),
      expected_returns,
      portfolio: report.portfolio,
      efficient_frontier,
      analysis_date: Utc::now(),
    })
  }

  /// Portfolio over the assets of one index's top pairs.
  ///
  /// Returns `Ok(None)` when fewer than two assets are available.
  pub fn analyze_index<S>(
    &self,
    analysis: &IndexPairsAnalysis,
    source: &S,
  ) -> Result<Option<IndexPortfolioAnalysis>>
  where
    S: PriceSource + ?Sized,
  {
    let symbols = analysis.top_symbols();
    if symbols.len() < MIN_ASSETS {
      warn!(index = %analysis.index_key, symbols = symbols.len(), "not enough tickers for a portfolio");
      return Ok(None);
    }

    match self.build_portfolio(&symbols, source) {
      Ok(summary) => Ok(Some(IndexPortfolioAnalysis {
        index_key: analysis.index_key,
        index_name: analysis.index_name.clone(),
        summary,
      })),
      Err(AnalyticsError::InsufficientAssets { available, .. }) => {
        warn!(index = %analysis.index_key, available, "not enough usable assets for a portfolio");
        Ok(None)
      }
      Err(err) => Err(err),
    }
  }

  /// Portfolio per analyzed index, skipping indexes with too few assets.
  pub fn analyze_indexes<S>(
    &self,
    analysis: &PairsAnalysis,
    source: &S,
  ) -> Result<Vec<IndexPortfolioAnalysis>>
  where
    S: PriceSource + ?Sized,
  {
    let mut portfolios = Vec::new();
    for index in &analysis.indexes {
      if let Some(portfolio) = self.analyze_index(index, source)? {
        portfolios.push(portfolio);
      }
    }
    Ok(portfolios)
  }
}
