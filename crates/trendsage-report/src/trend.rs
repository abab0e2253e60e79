//! Trend reporter: pivots all daily stats into a ranked topic × date table
//! and exports it as CSV and Markdown.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use comfy_table::presets::ASCII_MARKDOWN;
use comfy_table::{CellAlignment, Table};
use tracing::info;

use trendsage_core::files::{format_date, TREND_CSV_FILE, TREND_MD_FILE};
use trendsage_core::Result;

use crate::matrix::TopicMatrix;

/// Topics logged after a report is built.
const LOG_TOP_N: usize = 10;

/// One topic's counts across all dates.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendRow {
    pub topic: String,
    pub counts: Vec<u64>,
    /// Used only for ranking.
    pub total: u64,
}

/// Ranked, zero-filled time series of topic counts.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendTable {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<TrendRow>,
}

impl TrendTable {
    pub fn from_matrix(matrix: &TopicMatrix) -> Self {
        let rows = matrix
            .ranked()
            .into_iter()
            .map(|r| TrendRow {
                topic: matrix.topics()[r].clone(),
                counts: matrix.row(r).to_vec(),
                total: matrix.total(r),
            })
            .collect();
        Self {
            dates: matrix.dates().to_vec(),
            rows,
        }
    }

    pub fn row(&self, topic: &str) -> Option<&TrendRow> {
        self.rows.iter().find(|r| r.topic == topic)
    }

    pub fn top(&self, n: usize) -> &[TrendRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    fn header(&self) -> Vec<String> {
        let mut header = Vec::with_capacity(self.dates.len() + 2);
        header.push("Topic".to_string());
        header.extend(self.dates.iter().map(|d| format_date(*d)));
        header.push("Total".to_string());
        header
    }

    fn cells(row: &TrendRow) -> Vec<String> {
        let mut cells = Vec::with_capacity(row.counts.len() + 2);
        cells.push(row.topic.clone());
        cells.extend(row.counts.iter().map(|c| c.to_string()));
        cells.push(row.total.to_string());
        cells
    }

    /// Comma-separated table with a header row.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        push_csv_line(&mut out, &self.header());
        for row in &self.rows {
            push_csv_line(&mut out, &Self::cells(row));
        }
        out
    }

    /// Markdown document with a title line and a pipe table.
    pub fn to_markdown(&self, generated_at: &str) -> String {
        let mut table = Table::new();
        table.load_preset(ASCII_MARKDOWN).set_header(self.header());
        for row in &self.rows {
            table.add_row(Self::cells(row).iter().map(|c| escape_md(c)));
        }
        for col in 1..self.dates.len() + 2 {
            if let Some(column) = table.column_mut(col) {
                column.set_cell_alignment(CellAlignment::Right);
            }
        }

        format!(
            "# Trend Analysis Report (Generated: {})\n\n{}\n",
            generated_at,
            table.trim_fmt()
        )
    }
}

fn push_csv_line(out: &mut String, fields: &[String]) {
    let escaped: Vec<String> = fields.iter().map(|f| escape_csv(f)).collect();
    out.push_str(&escaped.join(","));
    out.push('\n');
}

fn escape_csv(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn escape_md(cell: &str) -> String {
    cell.replace('|', "\\|").replace('\n', " ")
}

/// Files written by one report run.
#[derive(Debug, Clone)]
pub struct TrendReport {
    pub table: TrendTable,
    pub csv_path: PathBuf,
    pub markdown_path: PathBuf,
}

/// Builds the trend report from every stats file in an output directory.
pub struct TrendReporter;

impl TrendReporter {
    /// Generate `trend_report.csv` and `trend_report.md` in `output_dir`.
    ///
    /// Returns `Ok(None)` when there are no stats to aggregate.
    pub fn generate(output_dir: &Path) -> Result<Option<TrendReport>> {
        info!("Generating trend report from {}", output_dir.display());

        let matrix = TopicMatrix::load(output_dir)?;
        if matrix.is_empty() {
            info!("No stats data found to analyze.");
            return Ok(None);
        }

        let table = TrendTable::from_matrix(&matrix);
        for (rank, row) in table.top(LOG_TOP_N).iter().enumerate() {
            info!("#{:<2} {:<40} total={}", rank + 1, row.topic, row.total);
        }

        let csv_path = output_dir.join(TREND_CSV_FILE);
        std::fs::write(&csv_path, table.to_csv())?;
        info!("Saved CSV report: {}", csv_path.display());

        let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M").to_string();
        let markdown_path = output_dir.join(TREND_MD_FILE);
        std::fs::write(&markdown_path, table.to_markdown(&generated_at))?;
        info!("Saved Markdown report: {}", markdown_path.display());

        Ok(Some(TrendReport {
            table,
            csv_path,
            markdown_path,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trendsage_core::files::parse_date;
    use trendsage_store::DailyStats;

    fn write_day(dir: &Path, date: &str, entries: &[(&str, u64)]) {
        let mut stats = DailyStats::new();
        for (topic, count) in entries {
            stats.add(topic, *count);
        }
        stats.write(dir, parse_date(date).unwrap()).unwrap();
    }

    fn three_days(dir: &Path) {
        write_day(dir, "2025-01-01", &[("slow delivery", 2), ("app crash", 1)]);
        write_day(dir, "2025-01-02", &[("app crash", 1), ("refund delay", 1)]);
        write_day(dir, "2025-01-03", &[("slow delivery", 5), ("refund delay", 2)]);
    }

    #[test]
    fn test_absent_topic_filled_with_zero() {
        let dir = tempfile::tempdir().unwrap();
        three_days(dir.path());

        let report = TrendReporter::generate(dir.path()).unwrap().unwrap();
        let row = report.table.row("slow delivery").unwrap();
        assert_eq!(row.counts, vec![2, 0, 5]);
        assert_eq!(row.total, 7);
    }

    #[test]
    fn test_rows_ranked_by_total() {
        let dir = tempfile::tempdir().unwrap();
        three_days(dir.path());

        let report = TrendReporter::generate(dir.path()).unwrap().unwrap();
        let order: Vec<&str> = report.table.rows.iter().map(|r| r.topic.as_str()).collect();
        assert_eq!(order, vec!["slow delivery", "refund delay", "app crash"]);
    }

    #[test]
    fn test_csv_export() {
        let dir = tempfile::tempdir().unwrap();
        three_days(dir.path());

        let report = TrendReporter::generate(dir.path()).unwrap().unwrap();
        let csv = std::fs::read_to_string(&report.csv_path).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Topic,2025-01-01,2025-01-02,2025-01-03,Total");
        assert_eq!(lines[1], "slow delivery,2,0,5,7");
        assert_eq!(lines.len(), 4);
    }

    /// Trimmed cells of a Markdown table line.
    fn md_cells(line: &str) -> Vec<String> {
        let inner = line.trim().trim_start_matches('|').trim_end_matches('|');
        inner.split(" | ").map(|c| c.trim().to_string()).collect()
    }

    #[test]
    fn test_markdown_export() {
        let dir = tempfile::tempdir().unwrap();
        three_days(dir.path());

        let report = TrendReporter::generate(dir.path()).unwrap().unwrap();
        let md = std::fs::read_to_string(&report.markdown_path).unwrap();
        let lines: Vec<&str> = md.lines().collect();
        assert!(lines[0].starts_with("# Trend Analysis Report (Generated: "));
        assert_eq!(lines[1], "");
        assert_eq!(
            md_cells(lines[2]),
            vec!["Topic", "2025-01-01", "2025-01-02", "2025-01-03", "Total"]
        );
        assert!(lines[3].starts_with("|-") && !lines[3].contains(' '));
        assert_eq!(md_cells(lines[4]), vec!["slow delivery", "2", "0", "5", "7"]);
        assert_eq!(lines.len(), 7);
    }

    #[test]
    fn test_no_stats_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TrendReporter::generate(dir.path()).unwrap().is_none());
        assert!(!dir.path().join(TREND_CSV_FILE).exists());
    }

    #[test]
    fn test_csv_escaping() {
        assert_eq!(escape_csv("plain"), "plain");
        assert_eq!(escape_csv("crash, then freeze"), "\"crash, then freeze\"");
        assert_eq!(escape_csv("the \"pro\" plan"), "\"the \"\"pro\"\" plan\"");
    }

    #[test]
    fn test_markdown_escapes_pipes() {
        let table = TrendTable {
            dates: vec![parse_date("2025-01-01").unwrap()],
            rows: vec![TrendRow {
                topic: "a|b".into(),
                counts: vec![1],
                total: 1,
            }],
        };
        let md = table.to_markdown("now");
        let row = md.lines().find(|l| l.contains("a\\|b")).unwrap();
        assert_eq!(md_cells(row), vec!["a\\|b", "1", "1"]);
    }
}
