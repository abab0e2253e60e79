//! Daily batch processor runs against a scripted extractor and fixed vectors.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use ndarray::Array1;
use tempfile::TempDir;

use trendsage_core::files::{backup_path, parse_date, stats_file};
use trendsage_core::{DataPaths, Error, RawExtraction, Result, Review};
use trendsage_extract::{ExtractionOutcome, TopicExtractor};
use trendsage_infer::EmbedderBackend;
use trendsage_report::RenderOutcome;
use trendsage_runtime::{BatchState, DailyBatchProcessor};
use trendsage_store::reviews::write_reviews;
use trendsage_store::{DailyStats, TaxonomyStore};

struct FixedEmbedder {
    vectors: HashMap<String, Vec<f32>>,
}

impl FixedEmbedder {
    fn new(pairs: &[(&str, [f32; 3])]) -> Arc<Self> {
        Arc::new(Self {
            vectors: pairs.iter().map(|(k, v)| (k.to_string(), v.to_vec())).collect(),
        })
    }
}

impl EmbedderBackend for FixedEmbedder {
    fn embed(&self, text: &str) -> Result<Array1<f32>> {
        self.vectors
            .get(text)
            .map(|v| Array1::from_vec(v.clone()))
            .ok_or_else(|| Error::Embedding(format!("no vector for {:?}", text)))
    }

    fn dimension(&self) -> usize {
        3
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Replays queued outcomes, one per call; an empty queue answers with nothing.
#[derive(Default)]
struct ScriptedExtractor {
    outcomes: RefCell<VecDeque<ExtractionOutcome>>,
    batch_sizes: RefCell<Vec<usize>>,
    calls: Cell<usize>,
}

impl ScriptedExtractor {
    fn new(outcomes: Vec<ExtractionOutcome>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into()),
            ..Default::default()
        }
    }
}

impl TopicExtractor for ScriptedExtractor {
    fn extract(&self, batch: &[Review]) -> ExtractionOutcome {
        self.calls.set(self.calls.get() + 1);
        self.batch_sizes.borrow_mut().push(batch.len());
        self.outcomes
            .borrow_mut()
            .pop_front()
            .unwrap_or(ExtractionOutcome::Extracted(Vec::new()))
    }
}

fn extracted(pairs: &[(&str, &str)]) -> ExtractionOutcome {
    ExtractionOutcome::Extracted(
        pairs
            .iter()
            .map(|(id, topic)| RawExtraction::new(*id, *topic))
            .collect(),
    )
}

fn phrases() -> Arc<FixedEmbedder> {
    FixedEmbedder::new(&[
        ("app crashes on login", [1.0, 0.0, 0.0]),
        ("login crash issue", [0.95, 0.1, 0.0]),
        ("great delivery speed", [0.0, 0.0, 1.0]),
        ("refund not processed", [0.0, 1.0, 0.0]),
    ])
}

struct Workspace {
    _dir: TempDir,
    paths: DataPaths,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let paths = DataPaths::new(
            dir.path().join("data"),
            dir.path().join("output"),
            dir.path().join("taxonomy.json"),
            dir.path().join("models"),
        );
        Self { _dir: dir, paths }
    }

    fn seed(&self, date: &str, count: usize) {
        let reviews: Vec<Review> = (0..count)
            .map(|i| Review::new(format!("r{}", i + 1), format!("review text number {}", i + 1)))
            .collect();
        write_reviews(&self.paths.data_dir, parse_date(date).unwrap(), &reviews).unwrap();
    }

    fn taxonomy(&self) -> TaxonomyStore {
        TaxonomyStore::open(&self.paths.taxonomy_file, phrases()).unwrap()
    }
}

#[test]
fn test_extractor_called_once_per_chunk() {
    let ws = Workspace::new();
    ws.seed("2025-01-01", 45);
    let mut taxonomy = ws.taxonomy();
    let extractor = ScriptedExtractor::default();

    let report = DailyBatchProcessor::new(&mut taxonomy, &extractor, &ws.paths)
        .run(parse_date("2025-01-01").unwrap())
        .unwrap();

    assert_eq!(extractor.calls.get(), 3);
    assert_eq!(*extractor.batch_sizes.borrow(), vec![20, 20, 5]);
    assert_eq!(report.chunks, 3);
    assert_eq!(report.reviews, 45);
    assert_eq!(report.state, BatchState::Done);
    assert!(report.stats.is_empty());
}

#[test]
fn test_similar_phrases_share_one_count() {
    let ws = Workspace::new();
    ws.seed("2025-01-01", 3);
    let mut taxonomy = ws.taxonomy();
    let extractor = ScriptedExtractor::new(vec![extracted(&[
        ("r1", "app crashes on login"),
        ("r2", "login crash issue"),
        ("r3", "great delivery speed"),
    ])]);

    let report = DailyBatchProcessor::new(&mut taxonomy, &extractor, &ws.paths)
        .run(parse_date("2025-01-01").unwrap())
        .unwrap();

    assert_eq!(report.stats.get("app crashes on login"), 2);
    assert_eq!(report.stats.get("great delivery speed"), 1);
    assert_eq!(report.stats.total(), 3);
    assert_eq!(report.stats.len(), 2);
    assert_eq!(report.new_topics, 2);

    assert_eq!(taxonomy.len(), 2);
    let merged = taxonomy.get("app crashes on login").unwrap();
    assert_eq!(merged.examples, vec!["app crashes on login", "login crash issue"]);
}

#[test]
fn test_stats_total_counts_non_empty_topics() {
    let ws = Workspace::new();
    ws.seed("2025-01-01", 25);
    let mut taxonomy = ws.taxonomy();
    let extractor = ScriptedExtractor::new(vec![
        extracted(&[
            ("r1", "refund not processed"),
            ("r2", ""),
            ("r3", "   "),
            ("r4", "great delivery speed"),
        ]),
        extracted(&[("r21", "refund not processed")]),
    ]);

    let report = DailyBatchProcessor::new(&mut taxonomy, &extractor, &ws.paths)
        .run(parse_date("2025-01-01").unwrap())
        .unwrap();

    assert_eq!(report.extractions, 3);
    assert_eq!(report.stats.total(), 3);
    assert_eq!(report.stats.get("refund not processed"), 2);

    let on_disk =
        DailyStats::read_for_date(&ws.paths.output_dir, parse_date("2025-01-01").unwrap()).unwrap();
    assert_eq!(on_disk, report.stats);
}

#[test]
fn test_failed_chunk_contributes_nothing() {
    let ws = Workspace::new();
    ws.seed("2025-01-01", 30);
    let mut taxonomy = ws.taxonomy();
    let extractor = ScriptedExtractor::new(vec![
        ExtractionOutcome::Failed("rate limited".into()),
        extracted(&[("r21", "great delivery speed")]),
    ]);

    let report = DailyBatchProcessor::new(&mut taxonomy, &extractor, &ws.paths)
        .run(parse_date("2025-01-01").unwrap())
        .unwrap();

    assert_eq!(extractor.calls.get(), 2);
    assert_eq!(report.chunks_failed, 1);
    assert_eq!(report.state, BatchState::Done);
    assert_eq!(report.stats.total(), 1);
}

#[test]
fn test_missing_input_is_no_data() {
    let ws = Workspace::new();
    let mut taxonomy = ws.taxonomy();
    let extractor = ScriptedExtractor::default();

    let report = DailyBatchProcessor::new(&mut taxonomy, &extractor, &ws.paths)
        .run(parse_date("2025-01-01").unwrap())
        .unwrap();

    assert_eq!(report.state, BatchState::NoData);
    assert_eq!(extractor.calls.get(), 0);
    assert!(report.stats_path.is_none());
    assert!(report.visualization.is_none());
    assert!(!ws.paths.taxonomy_file.exists());
    assert!(!stats_file(&ws.paths.output_dir, parse_date("2025-01-01").unwrap()).exists());
}

#[test]
fn test_taxonomy_saved_once_per_batch() {
    let ws = Workspace::new();
    ws.seed("2025-01-01", 3);
    ws.seed("2025-01-02", 3);
    let mut taxonomy = ws.taxonomy();
    let extractor = ScriptedExtractor::new(vec![
        extracted(&[("r1", "app crashes on login"), ("r2", "great delivery speed")]),
        extracted(&[("r1", "refund not processed")]),
    ]);

    let mut processor = DailyBatchProcessor::new(&mut taxonomy, &extractor, &ws.paths);
    processor.run(parse_date("2025-01-01").unwrap()).unwrap();
    let after_first = std::fs::read_to_string(&ws.paths.taxonomy_file).unwrap();
    // Two topics were added in one batch, still only one generation on disk.
    assert!(!backup_path(&ws.paths.taxonomy_file).exists());

    processor.run(parse_date("2025-01-02").unwrap()).unwrap();
    let backup = std::fs::read_to_string(backup_path(&ws.paths.taxonomy_file)).unwrap();
    assert_eq!(backup, after_first);
    assert_eq!(processor.taxonomy().len(), 3);
}

#[test]
fn test_rerun_overwrites_stats() {
    let ws = Workspace::new();
    ws.seed("2025-01-01", 2);
    let date = parse_date("2025-01-01").unwrap();
    let mut taxonomy = ws.taxonomy();
    let extractor = ScriptedExtractor::new(vec![
        extracted(&[("r1", "app crashes on login"), ("r2", "app crashes on login")]),
        extracted(&[("r1", "great delivery speed")]),
    ]);

    let mut processor = DailyBatchProcessor::new(&mut taxonomy, &extractor, &ws.paths);
    processor.run(date).unwrap();
    processor.run(date).unwrap();

    let stats = DailyStats::read_for_date(&ws.paths.output_dir, date).unwrap();
    assert_eq!(stats.get("app crashes on login"), 0);
    assert_eq!(stats.get("great delivery speed"), 1);
    assert_eq!(stats.len(), 1);
}

#[test]
fn test_embedding_failure_aborts_before_persisting() {
    let ws = Workspace::new();
    ws.seed("2025-01-01", 2);
    let date = parse_date("2025-01-01").unwrap();
    let mut taxonomy = ws.taxonomy();
    let extractor = ScriptedExtractor::new(vec![extracted(&[
        ("r1", "app crashes on login"),
        ("r2", "phrase the embedder has never seen"),
    ])]);

    let result = DailyBatchProcessor::new(&mut taxonomy, &extractor, &ws.paths).run(date);

    assert!(matches!(result, Err(Error::Embedding(_))));
    assert!(!stats_file(&ws.paths.output_dir, date).exists());
    assert!(!ws.paths.taxonomy_file.exists());
}

#[test]
fn test_visualization_runs_after_persist() {
    let ws = Workspace::new();
    ws.seed("2025-01-01", 1);
    let mut taxonomy = ws.taxonomy();
    let extractor = ScriptedExtractor::new(vec![extracted(&[("r1", "great delivery speed")])]);

    let report = DailyBatchProcessor::new(&mut taxonomy, &extractor, &ws.paths)
        .run(parse_date("2025-01-01").unwrap())
        .unwrap();

    match report.visualization {
        Some(RenderOutcome::Rendered(paths)) => {
            assert_eq!(paths.len(), 2);
            assert!(paths.iter().all(|p| p.exists()));
        }
        other => panic!("unexpected visualization outcome: {:?}", other),
    }
}

#[test]
fn test_process_range_skips_missing_dates() {
    let ws = Workspace::new();
    ws.seed("2025-01-01", 1);
    ws.seed("2025-01-03", 1);
    let mut taxonomy = ws.taxonomy();
    let extractor = ScriptedExtractor::new(vec![
        extracted(&[("r1", "refund not processed")]),
        extracted(&[("r1", "refund not processed")]),
    ]);

    let reports = DailyBatchProcessor::new(&mut taxonomy, &extractor, &ws.paths)
        .process_range(parse_date("2025-01-01").unwrap(), parse_date("2025-01-03").unwrap())
        .unwrap();

    let states: Vec<BatchState> = reports.iter().map(|r| r.state).collect();
    assert_eq!(states, vec![BatchState::Done, BatchState::NoData, BatchState::Done]);
    assert_eq!(extractor.calls.get(), 2);
    // The second day resolves onto the topic created by the first.
    assert_eq!(reports[2].new_topics, 0);
}

#[test]
fn test_process_range_rejects_reversed_bounds() {
    let ws = Workspace::new();
    let mut taxonomy = ws.taxonomy();
    let extractor = ScriptedExtractor::default();

    let result = DailyBatchProcessor::new(&mut taxonomy, &extractor, &ws.paths)
        .process_range(parse_date("2025-01-03").unwrap(), parse_date("2025-01-01").unwrap());
    assert!(matches!(result, Err(Error::InvalidDate(_))));
}
