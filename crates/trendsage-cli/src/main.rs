//! TrendSage: daily app-review topic mining and trend reporting.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use trendsage_core::files::{format_date, parse_date};
use trendsage_core::{DataPaths, EmbedderConfig, PipelineSettings};
use trendsage_extract::{LLMConfig, LlmExtractor};
use trendsage_report::{RenderOutcome, TrendReporter, Visualizer};
use trendsage_runtime::{BatchReport, BatchState, DailyBatchProcessor};
use trendsage_store::taxonomy::read_topics;
use trendsage_store::TaxonomyStore;

#[derive(Parser, Debug)]
#[command(
    name = "trendsage",
    version,
    about = "Extract topics from daily app reviews, group them into a taxonomy and report trends"
)]
struct Cli {
    /// Directory holding `<date>.json` review files [env: TRENDSAGE_DATA_DIR]
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory for stats, reports and charts [env: TRENDSAGE_OUTPUT_DIR]
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// Taxonomy file [env: TRENDSAGE_TAXONOMY_FILE]
    #[arg(long, global = true)]
    taxonomy: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process the reviews of one or more dates, in the order given
    Process {
        #[arg(required = true, value_parser = date_arg)]
        dates: Vec<NaiveDate>,
    },
    /// Process every date from FROM to TO inclusive
    Range {
        #[arg(value_parser = date_arg)]
        from: NaiveDate,
        #[arg(value_parser = date_arg)]
        to: NaiveDate,
    },
    /// Write trend_report.csv and trend_report.md from all stats files
    Report,
    /// Render the heatmap and the bar chart for one date (latest by default)
    Visualize {
        #[arg(long, value_parser = date_arg)]
        date: Option<NaiveDate>,
    },
    /// List the topics in the taxonomy
    Taxonomy,
}

fn date_arg(s: &str) -> std::result::Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let paths = resolve_paths(&cli);
    info!(
        "Data: {}, output: {}, taxonomy: {}",
        paths.data_dir.display(),
        paths.output_dir.display(),
        paths.taxonomy_file.display()
    );

    match cli.command {
        Command::Process { dates } => run_batches(&paths, Batches::Dates(dates)),
        Command::Range { from, to } => run_batches(&paths, Batches::Range(from, to)),
        Command::Report => report(&paths),
        Command::Visualize { date } => visualize(&paths, date),
        Command::Taxonomy => list_taxonomy(&paths),
    }
}

fn resolve_paths(cli: &Cli) -> DataPaths {
    let env = DataPaths::from_env();
    DataPaths::new(
        cli.data_dir.clone().unwrap_or(env.data_dir),
        cli.output_dir.clone().unwrap_or(env.output_dir),
        cli.taxonomy.clone().unwrap_or(env.taxonomy_file),
        env.model_dir,
    )
}

enum Batches {
    Dates(Vec<NaiveDate>),
    Range(NaiveDate, NaiveDate),
}

fn run_batches(paths: &DataPaths, batches: Batches) -> Result<()> {
    let settings = PipelineSettings::default();

    let llm_config = LLMConfig::load(&paths.llm_config_file);
    let extractor = match LlmExtractor::from_config(&llm_config) {
        Ok(extractor) => extractor.with_min_review_chars(settings.min_review_chars),
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    info!("Extracting with {} ({})", extractor.provider(), extractor.model());

    let embedder_config = EmbedderConfig::from_env()?;
    let embedder = trendsage_infer::create_embedder(&embedder_config, &paths.model_dir)
        .context("failed to initialize embedder")?;

    let mut taxonomy = TaxonomyStore::open(&paths.taxonomy_file, embedder)?
        .with_threshold(settings.similarity_threshold);

    let mut processor =
        DailyBatchProcessor::new(&mut taxonomy, &extractor, paths).with_settings(settings);

    let reports = match batches {
        Batches::Dates(dates) => {
            let mut reports = Vec::with_capacity(dates.len());
            for date in dates {
                reports.push(processor.run(date)?);
            }
            reports
        }
        Batches::Range(from, to) => processor.process_range(from, to)?,
    };

    for report in &reports {
        print_batch(report);
    }
    Ok(())
}

fn print_batch(report: &BatchReport) {
    let day = format_date(report.date);
    match report.state {
        BatchState::NoData => println!("{}: no data", day),
        BatchState::Processing | BatchState::Done => {
            println!(
                "{}: {} reviews, {} chunks ({} failed), {} topics counted, {} new",
                day,
                report.reviews,
                report.chunks,
                report.chunks_failed,
                report.extractions,
                report.new_topics
            );
            if let Some(RenderOutcome::Failed(reason)) = &report.visualization {
                println!("{}: charts not rendered: {}", day, reason);
            }
        }
    }
}

fn report(paths: &DataPaths) -> Result<()> {
    match TrendReporter::generate(&paths.output_dir)? {
        Some(report) => {
            println!(
                "{} topics over {} dates",
                report.table.rows.len(),
                report.table.dates.len()
            );
            println!("  {}", report.csv_path.display());
            println!("  {}", report.markdown_path.display());
        }
        None => println!("No stats files in {}", paths.output_dir.display()),
    }
    Ok(())
}

fn visualize(paths: &DataPaths, date: Option<NaiveDate>) -> Result<()> {
    let visualizer = Visualizer::new(&PipelineSettings::default());
    match visualizer.generate(&paths.output_dir, date) {
        RenderOutcome::Rendered(files) => {
            for file in files {
                println!("  {}", file.display());
            }
        }
        RenderOutcome::NoData => println!("No stats files in {}", paths.output_dir.display()),
        RenderOutcome::Failed(reason) => anyhow::bail!("rendering failed: {}", reason),
    }
    Ok(())
}

fn list_taxonomy(paths: &DataPaths) -> Result<()> {
    if !paths.taxonomy_file.exists() {
        println!("No taxonomy at {}", paths.taxonomy_file.display());
        return Ok(());
    }
    let topics = read_topics(&paths.taxonomy_file)?;
    for topic in &topics {
        println!(
            "{:<48} {:>4} examples  created {}",
            topic.name,
            topic.examples.len(),
            topic.created_at
        );
    }
    println!("{} topics", topics.len());
    Ok(())
}
