//! Runtime: the daily batch processor.
//!
//! Drives one date (or a run of dates) through extraction, taxonomy
//! resolution, stats persistence and visualization, strictly in sequence.

pub mod processor;
pub mod types;

pub use processor::DailyBatchProcessor;
pub use types::*;
