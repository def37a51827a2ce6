//! # Errors
//!
//! Structural failures surfaced to the caller. Per-symbol and per-pair problems are
//! absorbed where they occur and never show up here.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Fatal errors raised by matrix construction, optimization and configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
  /// No input where at least one element is required.
  #[error("empty input for {context}")]
  EmptyInput { context: &'static str },

  /// A return series has no finite observations.
  #[error("series {index} has no valid observations for {context}")]
  NoValidObservations { context: &'static str, index: usize },

  /// Two series share no jointly finite observation.
  #[error("no jointly valid observations between series {i} and {j}")]
  NoJointObservations { i: usize, j: usize },

  /// A computed covariance entry is NaN or infinite.
  #[error("non-finite covariance between series {i} and {j}: {value}")]
  NonFiniteCovariance { i: usize, j: usize, value: f64 },

  /// Inputs whose sizes must agree do not.
  #[error("dimension mismatch in {context}: expected {expected}, got {actual}")]
  DimensionMismatch {
    context: &'static str,
    expected: usize,
    actual: usize,
  },

  /// A diagonal covariance entry is zero or negative.
  #[error("non-positive variance for asset {index}: {value}")]
  NonPositiveVariance { index: usize, value: f64 },

  /// Not enough usable assets to build a portfolio.
  #[error("insufficient assets: need at least {required}, got {available}")]
  InsufficientAssets { required: usize, available: usize },

  /// Even the equal-weight fallback portfolio is not valid.
  #[error("degenerate portfolio: {reason}")]
  DegeneratePortfolio { reason: String },

  /// Configuration values outside their allowed range.
  #[error("invalid configuration: {message}")]
  InvalidConfig { message: String },

  /// A price source could not supply history for a symbol.
  #[error("price data unavailable for {symbol}: {reason}")]
  PriceData { symbol: String, reason: String },
}

impl AnalyticsError {
  /// Create an invalid configuration error.
  pub fn invalid_config(message: impl Into<String>) -> Self {
    Self::InvalidConfig {
      message: message.into(),
    }
  }

  /// Create a price data error.
  pub fn price_data(symbol: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::PriceData {
      symbol: symbol.into(),
      reason: reason.into(),
    }
  }
}
