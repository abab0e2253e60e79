//! TrendSage Report: cross-day aggregation of daily stats into a trend
//! table (CSV + Markdown) and PNG charts.

pub mod colors;
pub mod matrix;
pub mod trend;
pub mod visualize;

pub use matrix::TopicMatrix;
pub use trend::{TrendReport, TrendReporter, TrendRow, TrendTable};
pub use visualize::{RenderOutcome, Visualizer};
