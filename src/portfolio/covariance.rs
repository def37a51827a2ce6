//! # Covariance Matrix
//!
//! $$
//! \Sigma_{ij}=\frac{1}{n_{ij}-1}\sum_{t\in T_{ij}}(r_{i,t}-\bar r_i)(r_{j,t}-\bar r_j)
//! $$
//!
//! Series are right-aligned to the shortest length, so the most recent observations
//! line up. $T_{ij}$ is the set of positions where both series are finite.

use ndarray::Array2;
use tracing::warn;

use crate::error::AnalyticsError;
use crate::error::Result;

/// Replacement for non-positive variances on the diagonal.
pub const VARIANCE_FLOOR: f64 = 1e-6;

/// Keep the most recent `min_len` observations of every series.
pub fn align_tail(series: &[Vec<f64>]) -> Vec<&[f64]> {
  let min_len = series.iter().map(Vec::len).min().unwrap_or(0);
  series
    .iter()
    .map(|r| &r[r.len() - min_len..])
    .collect()
}

fn finite_mean(xs: &[f64]) -> Option<f64> {
  let (sum, count) = xs
    .iter()
    .filter(|x| x.is_finite())
    .fold((0.0, 0usize), |(s, c), x| (s + x, c + 1));
  (count > 0).then(|| sum / count as f64)
}

/// Sample covariance matrix of `series`.
///
/// # Errors
/// - [`AnalyticsError::EmptyInput`] for no series or an empty series
/// - [`AnalyticsError::NoValidObservations`] when an aligned series has no finite value
/// - [`AnalyticsError::NoJointObservations`] when two series never overlap
/// - [`AnalyticsError::NonFiniteCovariance`] for a NaN or infinite entry
pub fn covariance_matrix(series: &[Vec<f64>]) -> Result<Array2<f64>> {
  if series.is_empty() || series.iter().any(Vec::is_empty) {
    return Err(AnalyticsError::EmptyInput {
      context: "covariance matrix",
    });
  }

  let aligned = align_tail(series);
  let k = aligned.len();

  let means = aligned
    .iter()
    .enumerate()
    .map(|(index, r)| {
      finite_mean(r).ok_or(AnalyticsError::NoValidObservations {
        context: "covariance mean",
        index,
      })
    })
    .collect::<Result<Vec<f64>>>()?;

  let mut cov = Array2::<f64>::zeros((k, k));

  for i in 0..k {
    for j in i..k {
      let mut sum = 0.0;
      let mut count = 0usize;
      for (x, y) in aligned[i].iter().zip(aligned[j].iter()) {
        if x.is_finite() && y.is_finite() {
          sum += (x - means[i]) * (y - means[j]);
          count += 1;
        }
      }

      if count == 0 {
        return Err(AnalyticsError::NoJointObservations { i, j });
      }

      // A single joint observation divides by zero and trips the finiteness check.
      let value = sum / (count as f64 - 1.0);
      if !value.is_finite() {
        return Err(AnalyticsError::NonFiniteCovariance { i, j, value });
      }

      cov[[i, j]] = value;
      cov[[j, i]] = value;
    }
  }

  for i in 0..k {
    let variance = cov[[i, i]];
    if variance <= 0.0 {
      warn!(asset = i, variance, floor = VARIANCE_FLOOR, "non-positive variance clamped");
      cov[[i, i]] = VARIANCE_FLOOR;
    }
  }

  Ok(cov)
}
