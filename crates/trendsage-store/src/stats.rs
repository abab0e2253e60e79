//! Per-date topic counts (`output/stats_<date>.json`).

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{info, warn};

use trendsage_core::files::{stats_file, stats_file_date};
use trendsage_core::Result;

/// Canonical topic name → occurrence count for one calendar date.
///
/// Entries keep first-seen order so the written file reads in the order
/// topics turned up during the batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailyStats {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl DailyStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one occurrence of `topic`.
    pub fn increment(&mut self, topic: &str) {
        self.add(topic, 1);
    }

    pub fn add(&mut self, topic: &str, count: u64) {
        match self.index.get(topic) {
            Some(&idx) => self.entries[idx].1 += count,
            None => {
                self.index.insert(topic.to_string(), self.entries.len());
                self.entries.push((topic.to_string(), count));
            }
        }
    }

    pub fn get(&self, topic: &str) -> u64 {
        self.index.get(topic).map(|&idx| self.entries[idx].1).unwrap_or(0)
    }

    /// Number of distinct topics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(t, c)| (t.as_str(), *c))
    }

    /// Write as a complete snapshot, replacing any previous file for `date`.
    pub fn write(&self, output_dir: &Path, date: NaiveDate) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;
        let path = stats_file(output_dir, date);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)?;
        Ok(path)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn read_for_date(output_dir: &Path, date: NaiveDate) -> Result<Self> {
        Self::read(&stats_file(output_dir, date))
    }
}

impl Serialize for DailyStats {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(t, c)| (t, c)))
    }
}

impl<'de> Deserialize<'de> for DailyStats {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct StatsVisitor;

        impl<'de> Visitor<'de> for StatsVisitor {
            type Value = DailyStats;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of topic name to count")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut map: A,
            ) -> std::result::Result<Self::Value, A::Error> {
                let mut stats = DailyStats::new();
                while let Some((topic, count)) = map.next_entry::<String, u64>()? {
                    stats.add(&topic, count);
                }
                Ok(stats)
            }
        }

        deserializer.deserialize_map(StatsVisitor)
    }
}

/// Every `stats_<date>.json` in `output_dir`, sorted by date.
///
/// Files whose name does not carry a valid date are ignored. A missing
/// directory yields an empty list.
pub fn list_stats_files(output_dir: &Path) -> Result<Vec<(NaiveDate, PathBuf)>> {
    if !output_dir.is_dir() {
        warn!("Output directory {} not found", output_dir.display());
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in std::fs::read_dir(output_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        if let Some(date) = name.to_str().and_then(stats_file_date) {
            files.push((date, entry.path()));
        }
    }
    files.sort_by_key(|(date, _)| *date);
    Ok(files)
}

/// Load every stats file in `output_dir`, sorted by date.
pub fn load_all(output_dir: &Path) -> Result<Vec<(NaiveDate, DailyStats)>> {
    let files = list_stats_files(output_dir)?;
    let mut all = Vec::with_capacity(files.len());
    for (date, path) in files {
        all.push((date, DailyStats::read(&path)?));
    }
    info!("Loaded {} daily stats files from {}", all.len(), output_dir.display());
    Ok(all)
}
