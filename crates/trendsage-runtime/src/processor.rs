//! Daily batch processor: one date's reviews in, one stats snapshot out.
//!
//! `NoData` → stop. Otherwise `Processing`: chunks go through the extractor
//! one after another, every non-empty topic is resolved against the
//! taxonomy and counted. `Done`: stats written, taxonomy saved once,
//! visualizer invoked.

use std::path::PathBuf;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use trendsage_core::files::format_date;
use trendsage_core::{DataPaths, Error, PipelineSettings, Result};
use trendsage_extract::TopicExtractor;
use trendsage_report::Visualizer;
use trendsage_store::reviews::load_reviews;
use trendsage_store::{DailyStats, TaxonomyStore};

use crate::types::{BatchReport, BatchState};

/// Runs daily batches against a taxonomy it borrows exclusively.
pub struct DailyBatchProcessor<'a, X: TopicExtractor + ?Sized> {
    taxonomy: &'a mut TaxonomyStore,
    extractor: &'a X,
    data_dir: PathBuf,
    output_dir: PathBuf,
    settings: PipelineSettings,
    visualizer: Visualizer,
}

impl<'a, X: TopicExtractor + ?Sized> DailyBatchProcessor<'a, X> {
    pub fn new(taxonomy: &'a mut TaxonomyStore, extractor: &'a X, paths: &DataPaths) -> Self {
        let settings = PipelineSettings::default();
        Self {
            taxonomy,
            extractor,
            data_dir: paths.data_dir.clone(),
            output_dir: paths.output_dir.clone(),
            visualizer: Visualizer::new(&settings),
            settings,
        }
    }

    pub fn with_settings(mut self, settings: PipelineSettings) -> Self {
        self.visualizer = Visualizer::new(&settings);
        self.settings = settings;
        self
    }

    pub fn taxonomy(&self) -> &TaxonomyStore {
        &*self.taxonomy
    }

    /// Process the reviews collected for `date`.
    ///
    /// Extraction and visualization failures are recorded in the report.
    /// Taxonomy, embedding and file errors abort the run; in that case
    /// neither the stats nor the taxonomy are written.
    pub fn run(&mut self, date: NaiveDate) -> Result<BatchReport> {
        let mut report = BatchReport::new(date);
        let day = format_date(date);

        let Some(reviews) = load_reviews(&self.data_dir, date)? else {
            info!("No data for {}; skipping", day);
            return Ok(report);
        };

        report.state = BatchState::Processing;
        report.reviews = reviews.len();
        info!("Processing {} reviews for {}", reviews.len(), day);

        let chunk_size = self.settings.chunk_size.max(1);
        report.chunks = reviews.len().div_ceil(chunk_size);

        let mut stats = DailyStats::new();
        for (i, chunk) in reviews.chunks(chunk_size).enumerate() {
            let outcome = self.extractor.extract(chunk);
            if outcome.is_failed() {
                report.chunks_failed += 1;
            }

            for extraction in outcome.into_extractions() {
                if !extraction.has_topic() {
                    continue;
                }
                let raw = extraction.topic.trim();
                let canonical = self.taxonomy.resolve(raw)?;
                if self.taxonomy.contains(&canonical) {
                    if self.taxonomy.record_example(&canonical, raw) {
                        debug!("'{}' recorded under '{}'", raw, canonical);
                    }
                } else {
                    info!("New topic: {}", canonical);
                    self.taxonomy.add_topic(&canonical)?;
                    report.new_topics += 1;
                }
                stats.increment(&canonical);
                report.extractions += 1;
            }

            info!("{}: chunk {}/{}", day, i + 1, report.chunks);
        }

        if report.chunks_failed > 0 {
            warn!(
                "{}: {}/{} chunks failed extraction and contributed no topics",
                day, report.chunks_failed, report.chunks
            );
        }

        let stats_path = stats.write(&self.output_dir, date)?;
        info!("Saved stats for {} ({} topics) to {}", day, stats.len(), stats_path.display());
        self.taxonomy.save()?;
        info!("Taxonomy saved ({} topics)", self.taxonomy.len());

        report.stats = stats;
        report.stats_path = Some(stats_path);
        report.visualization = Some(self.visualizer.generate(&self.output_dir, Some(date)));
        report.state = BatchState::Done;
        Ok(report)
    }

    /// Process every calendar date from `from` to `to` inclusive, in order.
    ///
    /// Dates without a review file are reported as `NoData` and skipped.
    pub fn process_range(&mut self, from: NaiveDate, to: NaiveDate) -> Result<Vec<BatchReport>> {
        if from > to {
            return Err(Error::InvalidDate(format!(
                "range start {} is after end {}",
                format_date(from),
                format_date(to)
            )));
        }

        let mut reports = Vec::new();
        for date in from.iter_days().take_while(|d| *d <= to) {
            reports.push(self.run(date)?);
        }

        let done = reports.iter().filter(|r| r.is_done()).count();
        info!(
            "Processed {} of {} dates from {} to {}",
            done,
            reports.len(),
            format_date(from),
            format_date(to)
        );
        Ok(reports)
    }
}
