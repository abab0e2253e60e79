//! PNG charts over the daily stats: an annotated topic × date heatmap and a
//! per-date horizontal bar chart, both drawn with plotters.
//!
//! Rendering is best-effort. Callers get a [`RenderOutcome`] and never an
//! error, so a broken chart cannot undo persisted stats.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use tracing::{error, info};

use trendsage_core::files::{bar_chart_file, format_date, HEATMAP_FILE};
use trendsage_core::{Error, PipelineSettings, Result};

use crate::colors::{sample, VIRIDIS, YL_GN_BU};
use crate::matrix::TopicMatrix;

type DrawResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const FONT: &str = "sans-serif";
/// Room for topic names left of the plot.
const LABEL_AREA: u32 = 300;
const CELL_W: u32 = 90;
const ROW_H: u32 = 28;
const BAR_ROW_H: u32 = 34;
const CHROME_H: u32 = 140;

/// Result of a visualization run.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// Images written, in order.
    Rendered(Vec<PathBuf>),
    /// No stats were available to draw.
    NoData,
    /// Rendering failed; the reason was logged.
    Failed(String),
}

/// Renders heatmap and bar-chart images from stats files.
#[derive(Debug, Clone)]
pub struct Visualizer {
    heatmap_top_n: usize,
    bar_top_n: usize,
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new(&PipelineSettings::default())
    }
}

impl Visualizer {
    pub fn new(settings: &PipelineSettings) -> Self {
        Self {
            heatmap_top_n: settings.heatmap_top_n,
            bar_top_n: settings.bar_top_n,
        }
    }

    /// Draw the heatmap and the bar chart for `date` (latest date if `None`).
    pub fn generate(&self, output_dir: &Path, date: Option<NaiveDate>) -> RenderOutcome {
        match self.try_generate(output_dir, date) {
            Ok(outcome) => outcome,
            Err(e) => {
                error!("Error generating plots: {}", e);
                RenderOutcome::Failed(e.to_string())
            }
        }
    }

    fn try_generate(&self, output_dir: &Path, date: Option<NaiveDate>) -> Result<RenderOutcome> {
        let matrix = TopicMatrix::load(output_dir)?;
        if matrix.is_empty() {
            info!("No data found to visualize.");
            return Ok(RenderOutcome::NoData);
        }

        info!(
            "Generating plots for {} days and {} topics...",
            matrix.dates().len(),
            matrix.topics().len()
        );

        let mut written = Vec::new();

        let heatmap_path = output_dir.join(HEATMAP_FILE);
        self.draw_heatmap(&matrix, &heatmap_path)?;
        written.push(heatmap_path);

        let Some(date) = date.or_else(|| matrix.latest_date()) else {
            return Ok(RenderOutcome::Rendered(written));
        };
        let day = format_date(date);
        match matrix.date_index(date) {
            Some(col) if !self.bar_rows(&matrix, col).is_empty() => {
                let bar_path = bar_chart_file(output_dir, date);
                self.draw_bar_chart(&matrix, col, &bar_path)?;
                written.push(bar_path);
            }
            Some(_) => info!("No topics counted on {}; skipping bar chart", day),
            None => info!("No stats for {}; skipping bar chart", day),
        }

        info!("Plots saved to {}", output_dir.display());
        Ok(RenderOutcome::Rendered(written))
    }

    /// Heatmap rows, top to bottom: highest totals first.
    pub fn heatmap_rows(&self, matrix: &TopicMatrix) -> Vec<usize> {
        matrix.ranked().into_iter().take(self.heatmap_top_n).collect()
    }

    /// Bar chart rows for one date, top to bottom: non-zero counts, highest first.
    pub fn bar_rows(&self, matrix: &TopicMatrix, date_idx: usize) -> Vec<usize> {
        matrix
            .ranked_for_date(date_idx)
            .into_iter()
            .take(self.bar_top_n)
            .collect()
    }

    pub fn heatmap_title(&self) -> String {
        format!("Topic Frequency Heatmap (Top {})", self.heatmap_top_n)
    }

    pub fn bar_title(&self, date: NaiveDate) -> String {
        format!("Top {} Topics for {}", self.bar_top_n, format_date(date))
    }

    /// Render the heatmap to `path`.
    pub fn draw_heatmap(&self, matrix: &TopicMatrix, path: &Path) -> Result<()> {
        let rows = self.heatmap_rows(matrix);
        plot_heatmap(matrix, &rows, &self.heatmap_title(), path).map_err(|e| render_err(path, e))
    }

    /// Render the bar chart for column `date_idx` to `path`.
    pub fn draw_bar_chart(&self, matrix: &TopicMatrix, date_idx: usize, path: &Path) -> Result<()> {
        let rows = self.bar_rows(matrix, date_idx);
        let title = self.bar_title(matrix.dates()[date_idx]);
        plot_bars(matrix, &rows, date_idx, &title, path).map_err(|e| render_err(path, e))
    }
}

fn render_err(path: &Path, e: Box<dyn std::error::Error>) -> Error {
    Error::Render(format!("{}: {}", path.display(), e))
}

/// Label of a segment on an axis whose entries are listed top to bottom.
fn label_at(labels: &[String], value: &SegmentValue<i32>, flipped: bool) -> String {
    let idx = match value {
        SegmentValue::Exact(v) | SegmentValue::CenterOf(v) => *v,
        SegmentValue::Last => return String::new(),
    };
    let idx = if flipped { labels.len() as i32 - 1 - idx } else { idx };
    usize::try_from(idx)
        .ok()
        .and_then(|i| labels.get(i))
        .cloned()
        .unwrap_or_default()
}

fn plot_heatmap(matrix: &TopicMatrix, rows: &[usize], title: &str, path: &Path) -> DrawResult<()> {
    let n_rows = rows.len() as i32;
    let n_cols = matrix.dates().len() as i32;
    let max = rows
        .iter()
        .flat_map(|&r| matrix.row(r).iter().copied())
        .max()
        .unwrap_or(0);
    let topics: Vec<String> = rows.iter().map(|&r| matrix.topics()[r].clone()).collect();
    let dates: Vec<String> = matrix.dates().iter().map(|d| format_date(*d)).collect();

    let width = LABEL_AREA + CELL_W * n_cols.max(1) as u32 + 40;
    let height = CHROME_H + ROW_H * n_rows.max(1) as u32;
    let root = BitMapBackend::new(path, (width.max(640), height.max(320))).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(LABEL_AREA)
        .build_cartesian_2d((0..n_cols).into_segmented(), (0..n_rows).into_segmented())?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(dates.len())
        .y_labels(topics.len())
        .x_label_formatter(&|v| label_at(&dates, v, false))
        .y_label_formatter(&|v| label_at(&topics, v, true))
        .label_style((FONT, 13))
        .draw()?;

    // Row 0 is drawn at the top.
    let cells: Vec<(i32, i32, u64)> = rows
        .iter()
        .enumerate()
        .flat_map(|(i, &r)| {
            let y = n_rows - 1 - i as i32;
            (0..n_cols).map(move |c| (c, y, matrix.count(r, c as usize)))
        })
        .collect();
    let shade = |value: u64| if max == 0 { 0.0 } else { value as f32 / max as f32 };

    chart.draw_series(cells.iter().map(|&(c, y, value)| {
        Rectangle::new(
            [
                (SegmentValue::Exact(c), SegmentValue::Exact(y)),
                (SegmentValue::Exact(c + 1), SegmentValue::Exact(y + 1)),
            ],
            sample(YL_GN_BU, shade(value)).filled(),
        )
    }))?;

    chart.draw_series(cells.iter().map(|&(c, y, value)| {
        let ink = if shade(value) > 0.6 { &WHITE } else { &BLACK };
        let style = (FONT, 13)
            .into_font()
            .color(ink)
            .pos(Pos::new(HPos::Center, VPos::Center));
        Text::new(
            value.to_string(),
            (SegmentValue::CenterOf(c), SegmentValue::CenterOf(y)),
            style,
        )
    }))?;

    root.present()?;
    Ok(())
}

fn plot_bars(
    matrix: &TopicMatrix,
    rows: &[usize],
    date_idx: usize,
    title: &str,
    path: &Path,
) -> DrawResult<()> {
    let n = rows.len() as i32;
    let max = rows.first().map(|&r| matrix.count(r, date_idx)).unwrap_or(0);
    let topics: Vec<String> = rows.iter().map(|&r| matrix.topics()[r].clone()).collect();

    let height = CHROME_H + BAR_ROW_H * n.max(1) as u32;
    let root = BitMapBackend::new(path, (1000, height.max(320))).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, (FONT, 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(LABEL_AREA)
        .build_cartesian_2d(0u64..max + 1, (0..n).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .x_desc("Count")
        .y_labels(topics.len())
        .y_label_formatter(&|v| label_at(&topics, v, true))
        .label_style((FONT, 13))
        .draw()?;

    let last = (n - 1).max(1) as f32;
    chart.draw_series(rows.iter().enumerate().map(|(i, &r)| {
        let y = n - 1 - i as i32;
        let mut bar = Rectangle::new(
            [
                (0, SegmentValue::Exact(y)),
                (matrix.count(r, date_idx), SegmentValue::Exact(y + 1)),
            ],
            sample(VIRIDIS, i as f32 / last).filled(),
        );
        bar.set_margin(4, 4, 0, 0);
        bar
    }))?;

    root.present()?;
    Ok(())
}
