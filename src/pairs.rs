//! # Pairs Analysis
//!
//! $$
//! \mathcal P_g=\{(i,j): i<j,\ i,j\in S_g,\ 0<|\rho_{ij}|<1\}
//! $$
//!
//! All-pairs correlation analysis inside each index group, thresholding and top-K
//! ranking, and the cross-index summary.

pub mod engine;
pub mod types;

pub use engine::PairsEngine;
pub use types::CorrelationPair;
pub use types::CorrelationSummary;
pub use types::IndexPairCount;
pub use types::IndexPairsAnalysis;
pub use types::PairsAnalysis;
