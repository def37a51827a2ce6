//! # Minimum-Risk Optimizer
//!
//! $$
//! \sigma(\mathbf w)=\sqrt{\mathbf w^\top\Sigma\mathbf w},\qquad
//! \frac{\partial\sigma}{\partial w_i}=\frac{(\Sigma\mathbf w)_i}{\sigma},\qquad
//! \mathbf w\leftarrow\frac{\mathbf w-\eta\nabla\sigma}{\mathbf 1^\top(\mathbf w-\eta\nabla\sigma)}
//! $$
//!
//! Fixed-step projected gradient descent from equal weights. Any numerical trouble
//! during the descent abandons it for the equal-weight portfolio, so the result is
//! always finite, long-only and fully invested.

use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use super::types::Portfolio;
use crate::config::OptimizerConfig;
use crate::error::AnalyticsError;
use crate::error::Result;

/// `sqrt(wᵀ Σ w)`.
pub fn portfolio_risk(weights: &[f64], cov: &Array2<f64>) -> f64 {
  let w = ArrayView1::from(weights);
  w.dot(&cov.dot(&w)).sqrt()
}

/// `Σ w_i μ_i`.
pub fn portfolio_return(weights: &[f64], expected_returns: &[f64]) -> f64 {
  weights
    .iter()
    .zip(expected_returns.iter())
    .map(|(w, mu)| w * mu)
    .sum()
}

/// How the descent stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Termination {
  /// Risk changed by less than the tolerance.
  Converged,
  /// The iteration cap was reached.
  IterationCap,
  /// The descent was abandoned for equal weights.
  Fallback,
}

/// Optimized portfolio plus how it was reached.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport {
  pub portfolio: Portfolio,
  pub termination: Termination,
  /// Gradient steps evaluated.
  pub iterations: usize,
}

/// Long-only minimum-variance optimizer.
#[derive(Clone, Copy, Debug, Default)]
pub struct MinRiskOptimizer {
  config: OptimizerConfig,
}

impl MinRiskOptimizer {
  /// Construct with explicit tunables.
  pub fn new(config: OptimizerConfig) -> Result<Self> {
    config.validate()?;
    Ok(Self { config })
  }

  /// Borrow the tunables.
  pub fn config(&self) -> &OptimizerConfig {
    &self.config
  }

  /// Minimum-risk portfolio for `cov` and `expected_returns`.
  pub fn optimize(&self, cov: &Array2<f64>, expected_returns: &[f64]) -> Result<Portfolio> {
    self
      .optimize_with_report(cov, expected_returns)
      .map(|report| report.portfolio)
  }

  /// Like [`MinRiskOptimizer::optimize`], also reporting how the descent ended.
  ///
  /// # Errors
  /// - [`AnalyticsError::EmptyInput`] for a `0 × 0` matrix
  /// - [`AnalyticsError::DimensionMismatch`] when `cov` is not square or disagrees with `expected_returns`
  /// - [`AnalyticsError::NonPositiveVariance`] for a diagonal entry `<= 0`
  /// - [`AnalyticsError::DegeneratePortfolio`] when even equal weights have no finite positive risk
  pub fn optimize_with_report(
    &self,
    cov: &Array2<f64>,
    expected_returns: &[f64],
  ) -> Result<OptimizationReport> {
    let k = validate_inputs(cov, expected_returns)?;
    let equal = vec![1.0 / k as f64; k];

    let mut weights = Array1::from_vec(equal.clone());
    let mut termination = Termination::IterationCap;
    let mut iterations = 0;

    for iteration in 0..self.config.max_iterations {
      iterations = iteration + 1;

      let sigma_w = cov.dot(&weights);
      let risk = weights.dot(&sigma_w).sqrt();
      if !risk.is_finite() || risk <= 0.0 {
        warn!(iteration, risk, "invalid portfolio risk, falling back to equal weights");
        termination = Termination::Fallback;
        break;
      }

      let gradient = sigma_w / risk;
      if gradient.iter().any(|g| !g.is_finite()) {
        warn!(iteration, "non-finite risk gradient, falling back to equal weights");
        termination = Termination::Fallback;
        break;
      }

      let mut next = &weights - &(gradient * self.config.step_size);
      let sum = next.sum();
      if !sum.is_finite() || sum <= 0.0 {
        warn!(iteration, sum, "invalid weight sum, falling back to equal weights");
        termination = Termination::Fallback;
        break;
      }
      next /= sum;

      if next.iter().any(|w| !w.is_finite() || *w < 0.0) {
        warn!(iteration, "invalid weights, falling back to equal weights");
        termination = Termination::Fallback;
        break;
      }

      let next_risk = next.dot(&cov.dot(&next)).sqrt();
      if (risk - next_risk).abs() < self.config.tolerance {
        termination = Termination::Converged;
        break;
      }

      weights = next;
    }

    let mut weights = weights.to_vec();
    if termination == Termination::Fallback {
      weights = equal.clone();
    }

    let mut portfolio = build_portfolio(weights, cov, expected_returns);
    if !is_valid(&portfolio) {
      warn!(
        risk = portfolio.risk,
        expected_return = portfolio.expected_return,
        "optimized portfolio invalid, using equal weights"
      );
      termination = Termination::Fallback;
      portfolio = build_portfolio(equal, cov, expected_returns);
      if !is_valid(&portfolio) {
        return Err(AnalyticsError::DegeneratePortfolio {
          reason: format!(
            "equal-weight risk {} and return {}",
            portfolio.risk, portfolio.expected_return
          ),
        });
      }
    }

    debug!(?termination, iterations, risk = portfolio.risk, "optimization finished");

    Ok(OptimizationReport {
      portfolio,
      termination,
      iterations,
    })
  }
}

/// [`MinRiskOptimizer`] with default tunables.
pub fn optimize_min_risk(cov: &Array2<f64>, expected_returns: &[f64]) -> Result<Portfolio> {
  MinRiskOptimizer::default().optimize(cov, expected_returns)
}

fn validate_inputs(cov: &Array2<f64>, expected_returns: &[f64]) -> Result<usize> {
  let (rows, cols) = cov.dim();
  if rows != cols {
    return Err(AnalyticsError::DimensionMismatch {
      context: "covariance columns",
      expected: rows,
      actual: cols,
    });
  }
  if rows == 0 {
    return Err(AnalyticsError::EmptyInput {
      context: "portfolio optimization",
    });
  }
  if expected_returns.len() != rows {
    return Err(AnalyticsError::DimensionMismatch {
      context: "expected returns",
      expected: rows,
      actual: expected_returns.len(),
    });
  }

  for (index, &value) in cov.diag().iter().enumerate() {
    if !(value > 0.0) {
      return Err(AnalyticsError::NonPositiveVariance { index, value });
    }
  }

  Ok(rows)
}

fn build_portfolio(weights: Vec<f64>, cov: &Array2<f64>, expected_returns: &[f64]) -> Portfolio {
  let risk = portfolio_risk(&weights, cov);
  let expected_return = portfolio_return(&weights, expected_returns);
  Portfolio {
    weights,
    expected_return,
    risk,
    sharpe_ratio: expected_return / risk,
  }
}

fn is_valid(portfolio: &Portfolio) -> bool {
  portfolio.risk.is_finite() && portfolio.risk > 0.0 && portfolio.expected_return.is_finite()
}
