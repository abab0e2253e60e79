//! Topic × date count matrix built from daily stats files.

use std::collections::HashMap;
use std::path::Path;

use chrono::NaiveDate;

use trendsage_core::Result;
use trendsage_store::stats::load_all;
use trendsage_store::DailyStats;

/// Counts per topic (rows) and date (columns), zero-filled.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicMatrix {
    dates: Vec<NaiveDate>,
    topics: Vec<String>,
    counts: Vec<Vec<u64>>,
}

impl TopicMatrix {
    /// Pivot daily stats. Columns are sorted by date; rows keep first-seen order.
    pub fn from_stats(days: &[(NaiveDate, DailyStats)]) -> Self {
        let mut ordered: Vec<&(NaiveDate, DailyStats)> = days.iter().collect();
        ordered.sort_by_key(|(date, _)| *date);

        let dates: Vec<NaiveDate> = ordered.iter().map(|(d, _)| *d).collect();
        let mut topics: Vec<String> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut counts: Vec<Vec<u64>> = Vec::new();

        for (col, (_, stats)) in ordered.iter().enumerate() {
            for (topic, count) in stats.iter() {
                let row = *index.entry(topic.to_string()).or_insert_with(|| {
                    topics.push(topic.to_string());
                    counts.push(vec![0; dates.len()]);
                    topics.len() - 1
                });
                counts[row][col] += count;
            }
        }

        Self {
            dates,
            topics,
            counts,
        }
    }

    /// Read every `stats_<date>.json` under `output_dir`.
    pub fn load(output_dir: &Path) -> Result<Self> {
        Ok(Self::from_stats(&load_all(output_dir)?))
    }

    /// True when there is no topic row at all.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn row(&self, topic_idx: usize) -> &[u64] {
        &self.counts[topic_idx]
    }

    pub fn count(&self, topic_idx: usize, date_idx: usize) -> u64 {
        self.counts[topic_idx][date_idx]
    }

    pub fn total(&self, topic_idx: usize) -> u64 {
        self.counts[topic_idx].iter().sum()
    }

    pub fn date_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.iter().position(|d| *d == date)
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    /// Row indices by total descending, ties by topic name.
    pub fn ranked(&self) -> Vec<usize> {
        let mut rows: Vec<usize> = (0..self.topics.len()).collect();
        rows.sort_by(|&a, &b| {
            self.total(b)
                .cmp(&self.total(a))
                .then_with(|| self.topics[a].cmp(&self.topics[b]))
        });
        rows
    }

    /// Row indices with a non-zero count on `date_idx`, highest first.
    pub fn ranked_for_date(&self, date_idx: usize) -> Vec<usize> {
        let mut rows: Vec<usize> = (0..self.topics.len())
            .filter(|&r| self.counts[r][date_idx] > 0)
            .collect();
        rows.sort_by(|&a, &b| {
            self.counts[b][date_idx]
                .cmp(&self.counts[a][date_idx])
                .then_with(|| self.topics[a].cmp(&self.topics[b]))
        });
        rows
    }
}
