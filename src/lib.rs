pub mod analyzer;
pub mod discovery;
pub mod document;
pub mod language;
pub mod metrics;
pub mod protected;
pub mod reader;
pub mod report;

// Re-export the analysis entry points for convenient access
pub use analyzer::{analyze_text, AnalysisOptions, AnalysisResult, ContentType, TextAnalyzer};
pub use document::{count_words, extract_sentences, parse_document, DocumentStructure};
pub use language::{detect_language, is_language_supported, supported_languages, DetectionResult};
pub use metrics::{calculate_metrics, validate_metrics, TextMetrics};
pub use protected::{
    extract_with_placeholders, parse_protected_segments, restore_protected_segments,
    validate_protected_segments, PlaceholderMap, ProtectedSegment,
};

// Re-export batch pipeline utilities used by the CLI and integration tests
pub use report::{generate_report_path, report_exists, FileStats, RunStats};
