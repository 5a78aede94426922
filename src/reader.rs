use anyhow::Result;
use memmap2::Mmap;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

/// Configuration for document reading behavior
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Whether to fail fast on first error or continue processing
    pub fail_fast: bool,
    /// Buffer size for async reading (default: 8KB)
    pub buffer_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            fail_fast: false,
            buffer_size: 8192,
        }
    }
}

/// Statistics for a single document read
#[derive(Debug, Clone)]
pub struct ReadStats {
    pub file_path: String,
    pub lines_read: u64,
    pub bytes_read: u64,
    pub duration_ms: u64,
    pub read_error: Option<String>,
}

impl ReadStats {
    fn failed(path: &Path, error: String, started: std::time::Instant) -> Self {
        Self {
            file_path: path.display().to_string(),
            lines_read: 0,
            bytes_read: 0,
            duration_ms: started.elapsed().as_millis() as u64,
            read_error: Some(error),
        }
    }
}

/// Async document reader producing full text plus read statistics
pub struct DocumentReader {
    config: ReaderConfig,
}

impl DocumentReader {
    pub fn new(config: ReaderConfig) -> Self {
        Self { config }
    }

    /// Read a document's full text with async buffered I/O
    ///
    /// Line endings are normalized to `\n`. A read or UTF-8 error is
    /// returned as data in `ReadStats` unless `fail_fast` is set.
    pub async fn read_document<P: AsRef<Path>>(
        &self,
        file_path: P,
    ) -> Result<(String, ReadStats)> {
        let path = file_path.as_ref();
        let start_time = std::time::Instant::now();

        debug!("Starting async read of document: {}", path.display());

        let file = match File::open(path).await {
            Ok(file) => file,
            Err(e) => {
                let error_msg = format!("Failed to open document {}: {}", path.display(), e);
                warn!("{}", error_msg);

                if self.config.fail_fast {
                    return Err(anyhow::anyhow!(error_msg));
                }
                return Ok((String::new(), ReadStats::failed(path, error_msg, start_time)));
            }
        };

        let reader = BufReader::with_capacity(self.config.buffer_size, file);
        let mut lines = reader.lines();
        let mut content = String::new();
        let mut line_count = 0u64;
        let mut byte_count = 0u64;

        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    byte_count += line.len() as u64 + 1;
                    line_count += 1;
                    if !content.is_empty() {
                        content.push('\n');
                    }
                    content.push_str(&line);
                }
                Ok(None) => break,
                Err(e) => {
                    let error_msg = format!(
                        "UTF-8 decoding error in {} at line {}: {}",
                        path.display(),
                        line_count + 1,
                        e
                    );
                    warn!("{}", error_msg);

                    if self.config.fail_fast {
                        return Err(anyhow::anyhow!(error_msg));
                    }
                    // Return the partial text alongside the error
                    let stats = ReadStats {
                        file_path: path.display().to_string(),
                        lines_read: line_count,
                        bytes_read: byte_count,
                        duration_ms: start_time.elapsed().as_millis() as u64,
                        read_error: Some(error_msg),
                    };
                    return Ok((content, stats));
                }
            }
        }

        let stats = ReadStats {
            file_path: path.display().to_string(),
            lines_read: line_count,
            bytes_read: byte_count,
            duration_ms: start_time.elapsed().as_millis() as u64,
            read_error: None,
        };

        info!(
            "Read {}: {} lines, {} bytes in {}ms",
            path.display(),
            line_count,
            byte_count,
            stats.duration_ms
        );

        Ok((content, stats))
    }

    /// Read a document via memory mapping
    ///
    /// Avoids the line-by-line copy for large files; content is validated
    /// as UTF-8 and copied out once.
    pub fn read_document_mmap<P: AsRef<Path>>(&self, file_path: P) -> Result<(String, ReadStats)> {
        let path = file_path.as_ref();
        let start_time = std::time::Instant::now();

        debug!("Starting mmap read of document: {}", path.display());

        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) => {
                let error_msg = format!("Failed to open document {}: {}", path.display(), e);
                warn!("{}", error_msg);

                if self.config.fail_fast {
                    return Err(anyhow::anyhow!(error_msg));
                }
                return Ok((String::new(), ReadStats::failed(path, error_msg, start_time)));
            }
        };

        // SAFETY: the mapping is read-only and dropped before return;
        // concurrent truncation of input files is outside our contract
        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(e) => {
                let error_msg = format!("Failed to mmap document {}: {}", path.display(), e);
                warn!("{}", error_msg);

                if self.config.fail_fast {
                    return Err(anyhow::anyhow!(error_msg));
                }
                return Ok((String::new(), ReadStats::failed(path, error_msg, start_time)));
            }
        };

        let content = match std::str::from_utf8(&mmap) {
            Ok(text) => text.to_string(),
            Err(e) => {
                let error_msg = format!("Invalid UTF-8 in {}: {}", path.display(), e);
                warn!("{}", error_msg);

                if self.config.fail_fast {
                    return Err(anyhow::anyhow!(error_msg));
                }
                return Ok((String::new(), ReadStats::failed(path, error_msg, start_time)));
            }
        };

        let stats = ReadStats {
            file_path: path.display().to_string(),
            lines_read: content.lines().count() as u64,
            bytes_read: mmap.len() as u64,
            duration_ms: start_time.elapsed().as_millis() as u64,
            read_error: None,
        };

        Ok((content, stats))
    }

    /// Read multiple documents, collecting per-file stats
    pub async fn read_documents_batch<P: AsRef<Path>>(
        &self,
        file_paths: &[P],
    ) -> Result<Vec<(String, ReadStats)>> {
        info!("Starting batch read of {} documents", file_paths.len());

        let mut results = Vec::new();

        // Sequential reads keep memory bounded for large document sets
        for file_path in file_paths {
            match self.read_document(file_path).await {
                Ok(result) => results.push(result),
                Err(e) => {
                    if self.config.fail_fast {
                        return Err(e);
                    }
                    warn!("Failed to read {}: {}", file_path.as_ref().display(), e);
                    results.push((
                        String::new(),
                        ReadStats::failed(
                            file_path.as_ref(),
                            e.to_string(),
                            std::time::Instant::now(),
                        ),
                    ));
                }
            }
        }

        info!("Completed batch read of {} documents", results.len());
        Ok(results)
    }
}

/// Read a single document with default configuration
pub async fn read_document_async<P: AsRef<Path>>(file_path: P) -> Result<String> {
    let reader = DocumentReader::new(ReaderConfig::default());
    let (content, _stats) = reader.read_document(file_path).await?;
    Ok(content)
}
