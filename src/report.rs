// WHY: Aux report management for incremental batch runs - a complete
// report next to the source document marks work already done

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::debug;

use crate::analyzer::AnalysisResult;

/// Generate the aux report path for a source document
///
/// `book.txt` maps to `book_analysis.json` in the same directory.
pub fn generate_report_path(source_path: &Path) -> PathBuf {
    let mut report_path = source_path.to_path_buf();
    let file_stem = report_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    report_path.set_file_name(format!("{file_stem}_analysis.json"));
    report_path
}

/// Check whether an aux report exists for the given source document
pub fn report_exists<P: AsRef<Path>>(source_path: P) -> bool {
    generate_report_path(source_path.as_ref()).exists()
}

/// Read the aux report content for the given source document
pub fn read_report<P: AsRef<Path>>(source_path: P) -> Result<String, io::Error> {
    let report_path = generate_report_path(source_path.as_ref());
    std::fs::read_to_string(report_path)
}

/// Read the aux report content for the given source document (async version)
pub async fn read_report_async<P: AsRef<Path>>(source_path: P) -> Result<String, io::Error> {
    let report_path = generate_report_path(source_path.as_ref());
    tokio::fs::read_to_string(report_path).await
}

/// Write an analysis result as a pretty-printed JSON aux report
///
/// The report always ends with a trailing newline.
pub async fn write_analysis_report(
    source_path: &Path,
    result: &AnalysisResult,
) -> Result<PathBuf> {
    let report_path = generate_report_path(source_path);
    let json = serde_json::to_string_pretty(result)?;

    let file = tokio::fs::File::create(&report_path).await?;
    let mut writer = BufWriter::new(file);
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;

    debug!("Wrote analysis report: {}", report_path.display());
    Ok(report_path)
}

/// Per-document processing statistics for one batch run
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct FileStats {
    /// Source document path
    pub path: String,
    /// Number of characters analyzed
    pub chars_processed: u64,
    /// Words counted by the document parser
    pub words_counted: u64,
    /// Sentences counted by the document parser
    pub sentences_detected: u64,
    /// Detected language code, or "unknown"
    pub language: String,
    /// Classified content type
    pub content_type: String,
    /// Whether the analysis passed validation
    pub is_valid: bool,
    /// Wall-clock processing time in milliseconds
    pub processing_time_ms: u64,
    /// Processing status (success, skipped, failed)
    pub status: String,
    /// Error message if processing failed
    pub error: Option<String>,
}

impl FileStats {
    /// Stats entry for a document skipped because its report already exists
    pub fn skipped(path: &Path) -> Self {
        Self {
            path: path.display().to_string(),
            chars_processed: 0,
            words_counted: 0,
            sentences_detected: 0,
            language: "unknown".to_string(),
            content_type: "general".to_string(),
            is_valid: false,
            processing_time_ms: 0,
            status: "skipped".to_string(),
            error: None,
        }
    }

    /// Stats entry for a document that could not be processed
    pub fn failed(path: &Path, error: String) -> Self {
        Self {
            path: path.display().to_string(),
            chars_processed: 0,
            words_counted: 0,
            sentences_detected: 0,
            language: "unknown".to_string(),
            content_type: "general".to_string(),
            is_valid: false,
            processing_time_ms: 0,
            status: "failed".to_string(),
            error: Some(error),
        }
    }

    /// Stats entry for a successfully analyzed document
    pub fn success(
        path: &Path,
        chars_processed: u64,
        result: &AnalysisResult,
        processing_time_ms: u64,
    ) -> Self {
        let content_type = serde_json::to_value(result.content_type)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "general".to_string());

        Self {
            path: path.display().to_string(),
            chars_processed,
            words_counted: result.structure.word_count as u64,
            sentences_detected: result.structure.sentence_count as u64,
            language: result.language.language.clone(),
            content_type,
            is_valid: result.is_valid,
            processing_time_ms,
            status: "success".to_string(),
            error: None,
        }
    }
}

/// Aggregate statistics for a whole batch run
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct RunStats {
    pub files_discovered: u64,
    pub files_processed: u64,
    pub files_skipped: u64,
    pub files_failed: u64,
    pub total_chars: u64,
    pub total_words: u64,
    pub total_sentences: u64,
    pub total_time_ms: u64,
    pub files: Vec<FileStats>,
}

impl RunStats {
    /// Fold one file's stats into the run totals
    pub fn record(&mut self, stats: FileStats) {
        match stats.status.as_str() {
            "success" => {
                self.files_processed += 1;
                self.total_chars += stats.chars_processed;
                self.total_words += stats.words_counted;
                self.total_sentences += stats.sentences_detected;
            }
            "skipped" => self.files_skipped += 1,
            _ => self.files_failed += 1,
        }
        self.files.push(stats);
    }
}

/// Write run statistics as pretty-printed JSON
pub async fn write_run_stats(stats_path: &Path, stats: &RunStats) -> Result<()> {
    let json = serde_json::to_string_pretty(stats)?;

    if let Some(parent) = stats_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let file = tokio::fs::File::create(stats_path).await?;
    let mut writer = BufWriter::new(file);
    writer.write_all(json.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;

    debug!("Wrote run stats: {}", stats_path.display());
    Ok(())
}
