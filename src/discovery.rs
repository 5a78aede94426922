use anyhow::Result;
use futures::stream::{Stream, StreamExt};
use glob::glob;
use ignore::{WalkBuilder, WalkState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

/// File extensions the analyzer accepts
const ANALYZABLE_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "html", "htm"];

/// Configuration for document discovery behavior
#[derive(Debug, Clone, Default)]
pub struct DiscoveryConfig {
    /// Whether to fail fast on first error or continue processing
    pub fail_fast: bool,
}

/// Result of document discovery validation
#[derive(Debug, Clone)]
pub struct FileValidation {
    pub path: PathBuf,
    pub error: Option<String>,
}

/// Check whether a path carries an analyzable document extension
pub fn is_analyzable_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let lowered = ext.to_ascii_lowercase();
            ANALYZABLE_EXTENSIONS.contains(&lowered.as_str())
        })
}

/// Discover analyzable documents (`.txt`, `.md`, `.html`, ...) recursively
/// under the given root directory, as an async stream of validated paths.
pub fn discover_documents(
    root_dir: impl AsRef<Path>,
    config: DiscoveryConfig,
) -> impl Stream<Item = Result<FileValidation>> {
    let root_path = root_dir.as_ref().to_path_buf();

    futures::stream::unfold(
        DiscoveryState::new(root_path, config),
        |mut state| async move { state.next_document().await.map(|result| (result, state)) },
    )
}

/// Parallel directory traversal for large document trees
///
/// Uses the ignore crate's parallel walker; matching paths stream to the
/// consumer as they are found rather than after the walk completes.
pub fn discover_documents_parallel(
    root_dir: impl AsRef<Path>,
    config: DiscoveryConfig,
) -> impl Stream<Item = Result<FileValidation>> {
    let root_path = root_dir.as_ref().to_path_buf();
    let config = Arc::new(config);

    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        info!("Starting parallel document discovery in: {}", root_path.display());
        let traversal_start = std::time::Instant::now();

        let walker = WalkBuilder::new(&root_path)
            .threads((num_cpus::get() / 2).max(1))
            .follow_links(false)
            .hidden(false)
            .ignore(false)
            .git_ignore(false)
            .build_parallel();

        let (result_tx, result_rx) = std::sync::mpsc::channel();

        // The walker is synchronous; run it off the async runtime
        std::thread::spawn(move || {
            walker.run(|| {
                let result_tx = result_tx.clone();
                Box::new(move |entry| {
                    if let Ok(entry) = entry {
                        if entry.file_type().is_some_and(|ft| ft.is_file())
                            && is_analyzable_path(entry.path())
                        {
                            debug!("Found document: {}", entry.path().display());
                            let _ = result_tx.send(entry.path().to_path_buf());
                        }
                    }
                    WalkState::Continue
                })
            });
            drop(result_tx);
        });

        let mut file_count = 0;
        while let Ok(path) = result_rx.recv() {
            file_count += 1;

            match validate_document(&path, &config).await {
                Ok(validation) => {
                    if tx.send(Ok(validation)).is_err() {
                        debug!("Receiver dropped, stopping discovery");
                        break;
                    }
                }
                Err(e) => {
                    if config.fail_fast {
                        let _ = tx.send(Err(e));
                        break;
                    }
                    warn!("Document validation error (continuing): {}", e);
                }
            }
        }

        info!(
            "Discovery streamed {} documents in {:.2}ms",
            file_count,
            traversal_start.elapsed().as_millis()
        );
    });

    UnboundedReceiverStream::new(rx)
}

/// Validate that a discovered path is an accessible regular file
async fn validate_document(path: &Path, config: &DiscoveryConfig) -> Result<FileValidation> {
    match fs::metadata(path).await {
        Ok(metadata) => {
            if !metadata.is_file() {
                let error = format!("Path is not a file: {}", path.display());
                warn!("{}", error);
                return Ok(FileValidation {
                    path: path.to_path_buf(),
                    error: Some(error),
                });
            }
        }
        Err(e) => {
            let error = format!("Cannot access document {}: {}", path.display(), e);
            warn!("{}", error);

            if config.fail_fast {
                return Err(anyhow::anyhow!(error));
            }
            return Ok(FileValidation {
                path: path.to_path_buf(),
                error: Some(error),
            });
        }
    }

    // UTF-8 validation happens at read time, not here
    Ok(FileValidation {
        path: path.to_path_buf(),
        error: None,
    })
}

/// Internal state for serial document discovery iteration
struct DiscoveryState {
    root_dir: PathBuf,
    config: DiscoveryConfig,
    glob_iter: Option<glob::Paths>,
}

impl DiscoveryState {
    fn new(root_dir: PathBuf, config: DiscoveryConfig) -> Self {
        Self {
            root_dir,
            config,
            glob_iter: None,
        }
    }

    async fn next_document(&mut self) -> Option<Result<FileValidation>> {
        if self.glob_iter.is_none() {
            let pattern = format!("{}/**/*.*", self.root_dir.display());
            debug!("Starting document discovery with pattern: {}", pattern);

            match glob(&pattern) {
                Ok(paths) => {
                    self.glob_iter = Some(paths);
                    info!("Document discovery initialized for root: {}", self.root_dir.display());
                }
                Err(e) => {
                    return Some(Err(anyhow::anyhow!("Failed to create glob pattern: {}", e)));
                }
            }
        }

        let glob_iter = self.glob_iter.as_mut()?;
        loop {
            match glob_iter.next()? {
                Ok(path) => {
                    // The glob matches every dotted file; filter by extension here
                    if !is_analyzable_path(&path) {
                        continue;
                    }
                    debug!("Found document: {}", path.display());
                    return Some(validate_document(&path, &self.config).await);
                }
                Err(e) => {
                    let error_msg = format!("Glob iteration error: {e}");
                    warn!("{}", error_msg);

                    if self.config.fail_fast {
                        return Some(Err(anyhow::anyhow!(error_msg)));
                    }
                    // Non-fatal; continue to the next candidate
                }
            }
        }
    }
}

/// Collect all discovered documents into a Vec for easier processing
pub async fn collect_discovered_documents(
    root_dir: impl AsRef<Path>,
    config: DiscoveryConfig,
) -> Result<Vec<FileValidation>> {
    let mut files = Vec::new();
    let mut stream = Box::pin(discover_documents(root_dir, config));

    while let Some(result) = stream.next().await {
        files.push(result?);
    }

    summarize(&files, "serial");
    Ok(files)
}

/// Collect all discovered documents using the parallel walker
pub async fn collect_discovered_documents_parallel(
    root_dir: impl AsRef<Path>,
    config: DiscoveryConfig,
) -> Result<Vec<FileValidation>> {
    let mut files = Vec::new();
    let mut stream = Box::pin(discover_documents_parallel(root_dir, config));

    while let Some(result) = stream.next().await {
        files.push(result?);
    }

    summarize(&files, "parallel");
    Ok(files)
}

fn summarize(files: &[FileValidation], mode: &str) {
    let valid_count = files.iter().filter(|f| f.error.is_none()).count();
    let invalid_count = files.len() - valid_count;

    if invalid_count > 0 {
        warn!("Found {} documents with validation issues", invalid_count);
    }
    info!(
        "Document discovery ({mode}): {} valid, {} invalid",
        valid_count, invalid_count
    );
}

/// Convenience function returning only valid document paths
pub async fn find_documents<P: AsRef<Path>>(root_dir: P) -> Result<Vec<PathBuf>> {
    let validations = collect_discovered_documents(root_dir, DiscoveryConfig::default()).await?;

    Ok(validations
        .into_iter()
        .filter(|v| v.error.is_none())
        .map(|v| v.path)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn create_test_file(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
        let file_path = dir.join(name);
        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&file_path, content).await?;
        Ok(file_path)
    }

    #[test]
    fn test_analyzable_extensions() {
        assert!(is_analyzable_path(Path::new("book.txt")));
        assert!(is_analyzable_path(Path::new("notes.md")));
        assert!(is_analyzable_path(Path::new("page.HTML")));
        assert!(!is_analyzable_path(Path::new("data.json")));
        assert!(!is_analyzable_path(Path::new("binary.png")));
        assert!(!is_analyzable_path(Path::new("no_extension")));
    }

    #[tokio::test]
    async fn test_discover_empty_directory() {
        let temp_dir = TempDir::new().unwrap();
        let files = collect_discovered_documents(temp_dir.path(), DiscoveryConfig::default())
            .await
            .unwrap();
        assert_eq!(files.len(), 0);
    }

    #[tokio::test]
    async fn test_discover_matching_documents() {
        let temp_dir = TempDir::new().unwrap();

        create_test_file(temp_dir.path(), "essay.txt", "Essay content.").await.unwrap();
        create_test_file(temp_dir.path(), "nested/notes.md", "# Notes").await.unwrap();
        create_test_file(temp_dir.path(), "page.html", "<p>Page</p>").await.unwrap();
        create_test_file(temp_dir.path(), "skip.json", "{}").await.unwrap();
        create_test_file(temp_dir.path(), "skip.csv", "a,b").await.unwrap();

        let files = collect_discovered_documents(temp_dir.path(), DiscoveryConfig::default())
            .await
            .unwrap();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.error.is_none()));

        let names: Vec<String> = files
            .iter()
            .map(|f| f.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert!(names.contains(&"essay.txt".to_string()));
        assert!(names.contains(&"notes.md".to_string()));
        assert!(names.contains(&"page.html".to_string()));
    }

    #[tokio::test]
    async fn test_parallel_matches_serial() {
        let temp_dir = TempDir::new().unwrap();

        for i in 0..5 {
            create_test_file(temp_dir.path(), &format!("doc{i}.txt"), "Content.")
                .await
                .unwrap();
        }
        create_test_file(temp_dir.path(), "deep/dir/extra.md", "More.").await.unwrap();

        let config = DiscoveryConfig::default();
        let serial = collect_discovered_documents(temp_dir.path(), config.clone())
            .await
            .unwrap();
        let parallel = collect_discovered_documents_parallel(temp_dir.path(), config)
            .await
            .unwrap();

        assert_eq!(serial.len(), 6);
        assert_eq!(serial.len(), parallel.len());

        let mut serial_paths: Vec<_> = serial.iter().map(|f| &f.path).collect();
        let mut parallel_paths: Vec<_> = parallel.iter().map(|f| &f.path).collect();
        serial_paths.sort();
        parallel_paths.sort();
        assert_eq!(serial_paths, parallel_paths);
    }

    #[tokio::test]
    async fn test_find_documents_returns_only_paths() {
        let temp_dir = TempDir::new().unwrap();
        create_test_file(temp_dir.path(), "a.txt", "A.").await.unwrap();
        create_test_file(temp_dir.path(), "b.md", "B.").await.unwrap();

        let paths = find_documents(temp_dir.path()).await.unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.is_file()));
    }
}
