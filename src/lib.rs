//! # pairfolio
//!
//! $$
//! \rho_{ij}=\frac{\operatorname{Cov}(r_i,r_j)}{\sigma_i\sigma_j},\qquad
//! \sigma_p=\sqrt{\mathbf w^\top\Sigma\mathbf w}
//! $$
//!
//! Correlation and portfolio analytics over an index-partitioned instrument universe.
//!
//! The crate takes daily price histories (supplied through [`market::PriceSource`]),
//! splits the universe into index groups ([`index::IndexPartitioner`]), ranks highly
//! correlated pairs per group for pairs trading ([`pairs::PairsEngine`]) and builds a
//! minimum-risk portfolio with an efficient frontier per index
//! ([`portfolio::PortfolioEngine`]).
//!
//! All outputs are plain `serde` records; persistence and rendering are left to the caller.

pub mod config;
pub mod error;
pub mod index;
pub mod market;
pub mod pairs;
pub mod portfolio;
pub mod series;

pub use config::FrontierConfig;
pub use config::IndexConfig;
pub use config::IndexesConfig;
pub use config::OptimizerConfig;
pub use config::PairsConfig;
pub use config::PortfolioConfig;
pub use config::ReturnScale;
pub use error::AnalyticsError;
pub use error::Result;
pub use index::IndexGroup;
pub use index::IndexKey;
pub use index::IndexPartitioner;
pub use market::PriceBar;
pub use market::PriceSource;
pub use pairs::CorrelationPair;
pub use pairs::PairsAnalysis;
pub use pairs::PairsEngine;
pub use portfolio::EfficientFrontierPoint;
pub use portfolio::Portfolio;
pub use portfolio::PortfolioEngine;
