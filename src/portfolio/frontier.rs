//! # Efficient Frontier
//!
//! $$
//! \mu^\*_p=\mu_{\min}+(\mu_{\max}-\mu_{\min})\frac{p}{P-1},\qquad p=0,\dots,P-1
//! $$
//!
//! Coarse illustrative sweep: for every target, start from equal weights and push
//! weight onto the highest-return asset until the portfolio return is close to the
//! target. A point whose weights would be less risky than the previous point's carries
//! the previous weights, return and risk forward, so the curve never bends backwards
//! and every point stays consistent with its own weights.

use ndarray::Array2;
use ordered_float::OrderedFloat;
use tracing::debug;

use super::optimizer::portfolio_return;
use super::optimizer::portfolio_risk;
use super::types::EfficientFrontierPoint;
use crate::config::FrontierConfig;
use crate::error::AnalyticsError;
use crate::error::Result;

/// Target returns evenly spaced between the smallest and largest entry of
/// `expected_returns`. A single point sits at the minimum.
pub fn target_returns(expected_returns: &[f64], points: usize) -> Vec<f64> {
  if expected_returns.is_empty() || points == 0 {
    return Vec::new();
  }

  let min = expected_returns.iter().copied().fold(f64::INFINITY, f64::min);
  let max = expected_returns
    .iter()
    .copied()
    .fold(f64::NEG_INFINITY, f64::max);

  if points == 1 {
    return vec![min];
  }

  (0..points)
    .map(|p| min + (max - min) * p as f64 / (points - 1) as f64)
    .collect()
}

fn nudge_towards(
  target: f64,
  expected_returns: &[f64],
  top: usize,
  config: &FrontierConfig,
) -> Vec<f64> {
  let k = expected_returns.len();
  let mut weights = vec![1.0 / k as f64; k];

  for _ in 0..config.max_iterations {
    let diff = target - portfolio_return(&weights, expected_returns);
    weights[top] = (weights[top] + diff * config.adjustment_rate).max(0.0);

    let sum: f64 = weights.iter().sum();
    if !sum.is_finite() || sum <= 0.0 {
      break;
    }
    weights.iter_mut().for_each(|w| *w /= sum);

    if diff.abs() < config.tolerance {
      break;
    }
  }

  weights
}

/// Sweep `config.points` target returns across the range of `expected_returns`.
///
/// # Errors
/// [`AnalyticsError::DimensionMismatch`] when `cov` does not match `expected_returns`.
pub fn efficient_frontier(
  cov: &Array2<f64>,
  expected_returns: &[f64],
  config: &FrontierConfig,
) -> Result<Vec<EfficientFrontierPoint>> {
  let k = expected_returns.len();
  if cov.dim() != (k, k) {
    return Err(AnalyticsError::DimensionMismatch {
      context: "efficient frontier",
      expected: k,
      actual: cov.nrows(),
    });
  }

  let Some(top) = (0..k).rev().max_by_key(|&i| OrderedFloat(expected_returns[i])) else {
    return Ok(Vec::new());
  };

  let mut frontier: Vec<EfficientFrontierPoint> = Vec::with_capacity(config.points);

  for target in target_returns(expected_returns, config.points) {
    let weights = nudge_towards(target, expected_returns, top, config);
    let risk = portfolio_risk(&weights, cov);

    let point = match frontier.last() {
      Some(prev) if risk < prev.achieved_risk => EfficientFrontierPoint {
        target_return: target,
        ..prev.clone()
      },
      _ => {
        let achieved_return = portfolio_return(&weights, expected_returns);
        EfficientFrontierPoint {
          target_return: target,
          achieved_return,
          achieved_risk: risk,
          sharpe_ratio: achieved_return / risk,
          weights,
        }
      }
    };
    frontier.push(point);
  }

  debug!(points = frontier.len(), assets = k, "efficient frontier generated");
  Ok(frontier)
}
