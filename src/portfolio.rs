//! # Portfolio
//!
//! $$
//! \min_{\mathbf w}\ \sqrt{\mathbf w^\top\Sigma\mathbf w}\quad\text{s.t.}\quad \mathbf 1^\top\mathbf w=1,\ \mathbf w\ge0
//! $$
//!
//! Covariance construction, the minimum-risk gradient optimizer, the efficient
//! frontier sweep and the per-index orchestration on top of them.

pub mod covariance;
pub mod engine;
pub mod frontier;
pub mod optimizer;
pub mod types;

pub use covariance::align_tail;
pub use covariance::covariance_matrix;
pub use engine::PortfolioEngine;
pub use frontier::efficient_frontier;
pub use optimizer::MinRiskOptimizer;
pub use optimizer::OptimizationReport;
pub use optimizer::Termination;
pub use optimizer::optimize_min_risk;
pub use optimizer::portfolio_return;
pub use optimizer::portfolio_risk;
pub use types::EfficientFrontierPoint;
pub use types::IndexPortfolioAnalysis;
pub use types::Portfolio;
pub use types::PortfolioSummary;
