use anyhow::Result;
use clap::Parser;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use cadence::analyzer::{AnalysisOptions, TextAnalyzer};
use cadence::discovery;
use cadence::reader::{DocumentReader, ReaderConfig};
use cadence::report::{self, FileStats, RunStats};

#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(about = "Text-statistics and document-structure analyzer for document trees")]
#[command(version)]
struct Args {
    /// Root directory to scan for .txt, .md and .html documents
    root_dir: PathBuf,

    /// Overwrite even complete analysis reports
    #[arg(long)]
    overwrite_all: bool,

    /// Abort on first error
    #[arg(long)]
    fail_fast: bool,

    /// Use memory-mapped I/O instead of async buffered
    #[arg(long)]
    use_mmap: bool,

    /// Suppress console progress bars
    #[arg(long)]
    no_progress: bool,

    /// Stats output file path
    #[arg(long, default_value = "run_stats.json")]
    stats_out: PathBuf,

    /// Fail validation for documents above this word count
    #[arg(long)]
    max_words: Option<usize>,

    /// Skip metric calculation (reports carry zeroed metrics)
    #[arg(long)]
    skip_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .json()
        .init();

    let args = Args::parse();

    info!("Starting cadence");
    info!(?args, "Parsed CLI arguments");

    if !args.root_dir.exists() {
        anyhow::bail!("Root directory does not exist: {}", args.root_dir.display());
    }
    if !args.root_dir.is_dir() {
        anyhow::bail!("Root path is not a directory: {}", args.root_dir.display());
    }

    let discovery_config = discovery::DiscoveryConfig {
        fail_fast: args.fail_fast,
    };

    info!("Starting document discovery in: {}", args.root_dir.display());
    let discovered =
        discovery::collect_discovered_documents_parallel(&args.root_dir, discovery_config).await?;

    let valid_files: Vec<_> = discovered.iter().filter(|f| f.error.is_none()).collect();
    let invalid_files: Vec<_> = discovered.iter().filter(|f| f.error.is_some()).collect();

    info!(
        "Discovery completed: {} documents found, {} valid",
        discovered.len(),
        valid_files.len()
    );

    println!(
        "cadence v{} - found {} documents ({} valid, {} with issues)",
        env!("CARGO_PKG_VERSION"),
        discovered.len(),
        valid_files.len(),
        invalid_files.len()
    );

    let mut run_stats = RunStats {
        files_discovered: discovered.len() as u64,
        ..Default::default()
    };

    for file in &invalid_files {
        let error = file.error.clone().unwrap_or_else(|| "unknown error".to_string());
        run_stats.record(FileStats::failed(&file.path, error));
    }

    let progress = if args.no_progress {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(valid_files.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    };

    let analyzer = Arc::new(TextAnalyzer::with_options(AnalysisOptions {
        max_word_count: args.max_words,
        skip_metrics: args.skip_metrics,
    }));
    let reader = Arc::new(DocumentReader::new(ReaderConfig {
        fail_fast: args.fail_fast,
        ..Default::default()
    }));

    let run_start = std::time::Instant::now();

    // Analysis is CPU-bound; bound concurrency to available cores
    let concurrency = num_cpus::get().max(1);
    let mut tasks = stream::iter(valid_files.iter().map(|file| {
        let analyzer = Arc::clone(&analyzer);
        let reader = Arc::clone(&reader);
        let path = file.path.clone();
        let overwrite_all = args.overwrite_all;
        let use_mmap = args.use_mmap;

        async move { process_document(&path, &analyzer, &reader, overwrite_all, use_mmap).await }
    }))
    .buffer_unordered(concurrency);

    while let Some(result) = tasks.next().await {
        progress.inc(1);
        match result {
            Ok(stats) => run_stats.record(stats),
            Err(e) => {
                if args.fail_fast {
                    progress.abandon();
                    return Err(e);
                }
                run_stats.record(FileStats::failed(&PathBuf::from("unknown"), e.to_string()));
            }
        }
    }
    drop(tasks);

    progress.finish_and_clear();
    run_stats.total_time_ms = run_start.elapsed().as_millis() as u64;

    report::write_run_stats(&args.stats_out, &run_stats).await?;

    println!("Analysis complete:");
    println!("  Analyzed: {} documents", run_stats.files_processed);
    if run_stats.files_skipped > 0 {
        println!("  Skipped (report exists): {}", run_stats.files_skipped);
    }
    if run_stats.files_failed > 0 {
        println!("  Failed: {}", run_stats.files_failed);
    }
    println!("  Total words: {}", run_stats.total_words);
    println!("  Total sentences: {}", run_stats.total_sentences);
    println!("  Stats written to: {}", args.stats_out.display());

    info!(
        processed = run_stats.files_processed,
        skipped = run_stats.files_skipped,
        failed = run_stats.files_failed,
        "Batch analysis completed"
    );

    Ok(())
}

/// Analyze one document and write its aux report
async fn process_document(
    path: &Path,
    analyzer: &TextAnalyzer,
    reader: &DocumentReader,
    overwrite_all: bool,
    use_mmap: bool,
) -> Result<FileStats> {
    if !overwrite_all && report::report_exists(path) {
        info!("Skipping {} (report exists)", path.display());
        return Ok(FileStats::skipped(path));
    }

    let start = std::time::Instant::now();

    let (content, read_stats) = if use_mmap {
        reader.read_document_mmap(path)?
    } else {
        reader.read_document(path).await?
    };

    if let Some(error) = read_stats.read_error {
        return Ok(FileStats::failed(path, error));
    }

    let result = analyzer.analyze(&content);
    report::write_analysis_report(path, &result).await?;

    let stats = FileStats::success(
        path,
        content.chars().count() as u64,
        &result,
        start.elapsed().as_millis() as u64,
    );

    info!(
        path = %path.display(),
        words = stats.words_counted,
        language = %stats.language,
        valid = stats.is_valid,
        "Analyzed document"
    );

    Ok(stats)
}
