//! TrendSage Core: errors, configuration, data paths, shared record types.

pub mod config;
pub mod error;
pub mod files;
pub mod types;

pub use config::{DataPaths, EmbedderBackendKind, EmbedderConfig, PipelineSettings};
pub use error::{Error, Result};
pub use types::{RawExtraction, Review};
