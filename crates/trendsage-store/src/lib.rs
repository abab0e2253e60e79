//! TrendSage Store: topic taxonomy with similarity resolution, daily stats,
//! per-date review files.

pub mod reviews;
pub mod stats;
pub mod taxonomy;
pub mod types;

pub use stats::DailyStats;
pub use taxonomy::TaxonomyStore;
pub use types::*;
