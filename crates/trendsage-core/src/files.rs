//! Date parsing and the on-disk naming scheme for per-date artifacts.
//!
//! - reviews: `<data_dir>/<YYYY-MM-DD>.json`
//! - stats:   `<output_dir>/stats_<YYYY-MM-DD>.json`
//! - charts:  `<output_dir>/top_topics_<YYYY-MM-DD>.png`

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{Error, Result};

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const STATS_PREFIX: &str = "stats_";
pub const HEATMAP_FILE: &str = "topics_heatmap.png";
pub const TREND_CSV_FILE: &str = "trend_report.csv";
pub const TREND_MD_FILE: &str = "trend_report.md";

/// Parse a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| Error::InvalidDate(s.to_string()))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn reviews_file(data_dir: &Path, date: NaiveDate) -> PathBuf {
    data_dir.join(format!("{}.json", format_date(date)))
}

pub fn stats_file(output_dir: &Path, date: NaiveDate) -> PathBuf {
    output_dir.join(format!("{}{}.json", STATS_PREFIX, format_date(date)))
}

pub fn bar_chart_file(output_dir: &Path, date: NaiveDate) -> PathBuf {
    output_dir.join(format!("top_topics_{}.png", format_date(date)))
}

/// Extract the date from a `stats_<date>.json` file name.
pub fn stats_file_date(file_name: &str) -> Option<NaiveDate> {
    let stem = file_name.strip_prefix(STATS_PREFIX)?.strip_suffix(".json")?;
    NaiveDate::parse_from_str(stem, DATE_FORMAT).ok()
}

/// Sibling backup path: `taxonomy.json` → `taxonomy.json.bak`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".bak");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        let d = parse_date("2025-12-24").unwrap();
        assert_eq!(format_date(d), "2025-12-24");
        assert!(matches!(parse_date("24/12/2025"), Err(Error::InvalidDate(_))));
    }

    #[test]
    fn test_stats_file_roundtrip() {
        let d = parse_date("2025-01-02").unwrap();
        let path = stats_file(Path::new("output"), d);
        assert_eq!(path, PathBuf::from("output/stats_2025-01-02.json"));
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(stats_file_date(name), Some(d));
    }

    #[test]
    fn test_stats_file_date_rejects_others() {
        assert_eq!(stats_file_date("trend_report.csv"), None);
        assert_eq!(stats_file_date("stats_latest.json"), None);
        assert_eq!(stats_file_date("stats_2025-01-02.json.bak"), None);
    }

    #[test]
    fn test_backup_path() {
        assert_eq!(
            backup_path(Path::new("data/taxonomy.json")),
            PathBuf::from("data/taxonomy.json.bak")
        );
    }
}
