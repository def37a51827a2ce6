//! # Pairwise Statistics
//!
//! $$
//! \rho_{ab}=\frac{\sum_t (a_t-\bar a)(b_t-\bar b)}{\sqrt{\sum_t (a_t-\bar a)^2\sum_t (b_t-\bar b)^2}},
//! \qquad \text{prospectivity}=\frac{\bar r}{\sigma_r}
//! $$
//!
//! Correlation truncates both series to the shorter length by position, not by date.
//! Histories with gaps on different days are therefore compared slightly out of step.

use statrs::statistics::Statistics;

/// Pearson correlation over the first `min(a.len(), b.len())` observations.
///
/// Returns `0.0` when either side has zero variance (including empty input).
pub fn correlation(a: &[f64], b: &[f64]) -> f64 {
  let n = a.len().min(b.len());
  if n == 0 {
    return 0.0;
  }

  let a = &a[..n];
  let b = &b[..n];
  let ma = a.iter().mean();
  let mb = b.iter().mean();

  let mut cov = 0.0;
  let mut sa = 0.0;
  let mut sb = 0.0;

  for (x, y) in a.iter().zip(b.iter()) {
    let dx = x - ma;
    let dy = y - mb;
    cov += dx * dy;
    sa += dx * dx;
    sb += dy * dy;
  }

  if sa == 0.0 || sb == 0.0 {
    return 0.0;
  }

  (cov / (sa * sb).sqrt()).clamp(-1.0, 1.0)
}

/// Population standard deviation; `NaN` for an empty series.
pub fn volatility(returns: &[f64]) -> f64 {
  returns.iter().population_std_dev()
}

/// Arithmetic mean; `NaN` for an empty series.
pub fn average_return(returns: &[f64]) -> f64 {
  returns.iter().mean()
}

/// Mean return per unit of volatility, `0.0` for a flat series.
pub fn prospectivity(returns: &[f64], volatility: f64) -> f64 {
  if volatility == 0.0 {
    return 0.0;
  }
  average_return(returns) / volatility
}
