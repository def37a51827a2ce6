//! # Series Statistics
//!
//! $$
//! r_t=\frac{p_t-p_{t-1}}{p_{t-1}}
//! $$
//!
//! Return construction and the per-series and pairwise statistics built on it.

pub mod instrument;
pub mod pairwise;
pub mod returns;

pub use instrument::InstrumentStats;
pub use pairwise::average_return;
pub use pairwise::correlation;
pub use pairwise::prospectivity;
pub use pairwise::volatility;
pub use returns::recent;
pub use returns::scaled_returns;
pub use returns::simple_returns;
pub use returns::valid_closes;
