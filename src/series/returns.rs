//! # Return Series
//!
//! $$
//! r_i=\frac{p_i-p_{i-1}}{p_{i-1}},\qquad i=1,\dots,n-1
//! $$
//!

use crate::config::ReturnScale;
use crate::market::PriceBar;

fn is_valid_price(price: f64) -> bool {
  price.is_finite() && price > 0.0
}

/// Close prices of `bars` that are finite and strictly positive.
pub fn valid_closes(bars: &[PriceBar]) -> Vec<f64> {
  bars
    .iter()
    .map(|bar| bar.close)
    .filter(|&close| is_valid_price(close))
    .collect()
}

/// The last `horizon` elements of `xs` (all of them if shorter).
pub fn recent<T>(xs: &[T], horizon: usize) -> &[T] {
  &xs[xs.len().saturating_sub(horizon)..]
}

/// Simple returns of a price sequence.
///
/// Returns an empty vector when fewer than two prices are finite and positive.
/// Filtering bad prices out of the sequence is the caller's job.
pub fn simple_returns(prices: &[f64]) -> Vec<f64> {
  let valid = prices.iter().filter(|&&p| is_valid_price(p)).count();
  if valid < 2 {
    return Vec::new();
  }

  prices
    .windows(2)
    .map(|w| (w[1] - w[0]) / w[0])
    .collect()
}

/// Simple returns multiplied by the factor of `scale`.
pub fn scaled_returns(prices: &[f64], scale: ReturnScale) -> Vec<f64> {
  let factor = scale.factor();
  let mut returns = simple_returns(prices);
  if factor != 1.0 {
    returns.iter_mut().for_each(|r| *r *= factor);
  }
  returns
}
