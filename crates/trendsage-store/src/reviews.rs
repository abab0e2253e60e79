//! Per-date review input files (`data/<date>.json`).

use std::path::Path;

use chrono::NaiveDate;
use tracing::debug;

use trendsage_core::files::reviews_file;
use trendsage_core::{Result, Review};

/// Load the reviews collected for `date`.
///
/// Returns `Ok(None)` when no file exists for the date; a present but
/// malformed file is an error.
pub fn load_reviews(data_dir: &Path, date: NaiveDate) -> Result<Option<Vec<Review>>> {
    let path = reviews_file(data_dir, date);
    if !path.exists() {
        debug!("No review file at {}", path.display());
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path)?;
    let reviews: Vec<Review> = serde_json::from_str(&raw)?;
    Ok(Some(reviews))
}

/// Write a review list for `date`, e.g. to seed fixtures or hand-collected data.
pub fn write_reviews(data_dir: &Path, date: NaiveDate, reviews: &[Review]) -> Result<()> {
    std::fs::create_dir_all(data_dir)?;
    std::fs::write(reviews_file(data_dir, date), serde_json::to_string_pretty(reviews)?)?;
    Ok(())
}
