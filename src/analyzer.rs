// WHY: Orchestrator composing detector, parsers, and metrics into one
// result record. Validation collects every applicable error but only total
// emptiness short-circuits analysis - downstream consumers still want
// diagnostics for oversized or malformed input.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::{count_words, parse_document, DocumentStructure};
use crate::language::{detect_language, DetectionResult};
use crate::metrics::{calculate_metrics, TextMetrics};
use crate::protected::{
    parse_protected_segments, validate_protected_segments, ProtectedSegment,
};

/// Heuristic content category of a text sample
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Academic,
    Technical,
    Casual,
    #[default]
    General,
}

/// Keyword tables for content-type classification
///
/// A value rather than scattered literals so tests can substitute fixtures.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub academic_markers: Vec<&'static str>,
    pub technical_markers: Vec<&'static str>,
    pub casual_markers: Vec<&'static str>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            academic_markers: vec![
                "et al", "hypothesis", "methodology", "empirical", "furthermore", "moreover",
                "therefore", "abstract", "literature", "findings", "thus", "whereby",
                "in conclusion", "dissertation", "citation",
            ],
            technical_markers: vec![
                "api", "endpoint", "function", "database", "server", "implementation",
                "algorithm", "config", "deploy", "runtime", "compile", "backend", "frontend",
                "query", "json", "```", "()", "=>",
            ],
            casual_markers: vec![
                "don't", "can't", "won't", "didn't", "i'm", "you're", "it's", "gonna",
                "wanna", "kinda", "yeah", "hey", "lol", "!!", "?!", "...",
            ],
        }
    }
}

/// Options carried by [`TextAnalyzer`]; immutable after construction
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// When set, texts with more words fail validation (analysis still runs)
    pub max_word_count: Option<usize>,
    /// When set, the metrics field is present but zeroed
    pub skip_metrics: bool,
}

/// Aggregate result of one `analyze` call; never mutated after return
#[derive(Serialize, Debug, Clone, Default)]
pub struct AnalysisResult {
    pub is_valid: bool,
    pub validation_errors: Vec<String>,
    pub language: DetectionResult,
    pub structure: DocumentStructure,
    pub metrics: TextMetrics,
    pub protected_segments: Vec<ProtectedSegment>,
    pub content_type: ContentType,
}

/// Stateless analysis front-end
///
/// Carries only construction-time options, so concurrent calls with
/// different inputs never interfere.
#[derive(Debug, Clone, Default)]
pub struct TextAnalyzer {
    options: AnalysisOptions,
}

impl TextAnalyzer {
    /// Analyzer with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer with explicit options
    pub fn with_options(options: AnalysisOptions) -> Self {
        Self { options }
    }

    /// Run the full analysis pipeline over a text sample
    ///
    /// Empty or whitespace-only input short-circuits with zeroed fields.
    /// Any other validation failure (word-count limit, unmatched protected
    /// delimiters) is recorded while analysis proceeds.
    pub fn analyze(&self, text: &str) -> AnalysisResult {
        if text.trim().is_empty() {
            debug!("Empty input, short-circuiting analysis");
            return AnalysisResult {
                is_valid: false,
                validation_errors: vec![
                    "Input text cannot be empty or whitespace-only".to_string(),
                ],
                ..Default::default()
            };
        }

        let mut validation_errors = Vec::new();

        if let Some(max_word_count) = self.options.max_word_count {
            let word_count = count_words(text);
            if word_count > max_word_count {
                validation_errors.push(format!(
                    "Text exceeds maximum word count: {word_count} > {max_word_count}"
                ));
            }
        }

        let segment_validation = validate_protected_segments(text);
        validation_errors.extend(segment_validation.errors);

        let language = detect_language(text);
        let structure = parse_document(text);
        let protected_segments = parse_protected_segments(text);
        let metrics = if self.options.skip_metrics {
            TextMetrics::default()
        } else {
            calculate_metrics(text)
        };
        let content_type = classify_content(text);

        debug!(
            valid = validation_errors.is_empty(),
            language = %language.language,
            content_type = ?content_type,
            segments = protected_segments.len(),
            "Analysis complete"
        );

        AnalysisResult {
            is_valid: validation_errors.is_empty(),
            validation_errors,
            language,
            structure,
            metrics,
            protected_segments,
            content_type,
        }
    }
}

/// Analyze with default options; convenience wrapper over [`TextAnalyzer`]
pub fn analyze_text(text: &str) -> AnalysisResult {
    TextAnalyzer::new().analyze(text)
}

/// Classify content type with the default keyword tables
pub fn classify_content(text: &str) -> ContentType {
    classify_content_with(text, &ClassifierConfig::default())
}

/// Classify content type against caller-supplied keyword tables
///
/// The category with strictly the highest signal wins; ties and zero signal
/// fall back to general.
pub fn classify_content_with(text: &str, config: &ClassifierConfig) -> ContentType {
    let lowered = text.to_lowercase();
    let tokens: Vec<String> = lowered
        .split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_string()
        })
        .filter(|word| !word.is_empty())
        .collect();

    let academic = signal_strength(&lowered, &tokens, &config.academic_markers);
    let technical = signal_strength(&lowered, &tokens, &config.technical_markers);
    let casual = signal_strength(&lowered, &tokens, &config.casual_markers);

    let scored = [
        (ContentType::Academic, academic),
        (ContentType::Technical, technical),
        (ContentType::Casual, casual),
    ];

    for (content_type, score) in scored {
        let strictly_highest = score > 0
            && scored
                .iter()
                .all(|&(other, other_score)| other == content_type || score > other_score);
        if strictly_highest {
            return content_type;
        }
    }

    ContentType::General
}

/// Count marker hits: whole-token matches for plain words, substring
/// occurrences for phrases and punctuation patterns
fn signal_strength(lowered: &str, tokens: &[String], markers: &[&str]) -> usize {
    markers
        .iter()
        .map(|marker| {
            if marker.chars().all(|c| c.is_ascii_alphabetic()) {
                tokens.iter().filter(|token| token == marker).count()
            } else {
                lowered.match_indices(marker).count()
            }
        })
        .sum()
}
