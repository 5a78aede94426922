// WHY: Numeric text metrics with fixed formulas - downstream quality gates
// compare against thresholds calibrated to exactly these computations

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::extract_sentences;

/// Punctuation symbols counted for the perplexity diversity adjustment.
/// The fraction of this set present in the text scales the adjustment.
const PUNCTUATION_VARIETY: [char; 12] = [
    '.', ',', '!', '?', ';', ':', '\'', '"', '-', '(', ')', '\u{2014}',
];

/// Base value the perplexity heuristic adjusts up or down from
const PERPLEXITY_BASE: f64 = 60.0;

/// Final perplexity is clamped into this range for non-empty input.
/// Empty input reports 0 as a sentinel, never a clamped value.
const PERPLEXITY_MIN: f64 = 20.0;
const PERPLEXITY_MAX: f64 = 150.0;

/// Computed metrics for a text sample
///
/// All values are 0 when the input is empty or whitespace-only.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TextMetrics {
    /// Heuristic perplexity in [20,150], or 0 for empty input
    pub perplexity: f64,
    /// Sentence-length variation in [0,1]; higher means more bursty
    pub burstiness: f64,
    /// Type-token ratio over alphabetic words, in [0,1]
    pub lexical_diversity: f64,
    /// Mean words per sentence
    pub average_sentence_length: f64,
    /// Population standard deviation of sentence lengths
    pub sentence_length_std_dev: f64,
    /// Word count of each detected sentence, in document order
    pub sentence_lengths: Vec<usize>,
}

/// Thresholds applied by [`validate_metrics`]
///
/// An external quality gate, not part of the metric computation itself.
#[derive(Debug, Clone)]
pub struct MetricsThresholds {
    /// Minimum acceptable burstiness
    pub min_burstiness: f64,
    /// Minimum acceptable sentence-length standard deviation
    pub min_sentence_std_dev: f64,
    /// Acceptable perplexity band (inclusive)
    pub perplexity_range: (f64, f64),
}

impl Default for MetricsThresholds {
    fn default() -> Self {
        Self {
            min_burstiness: 0.6,
            min_sentence_std_dev: 8.0,
            perplexity_range: (40.0, 120.0),
        }
    }
}

/// Outcome of checking metrics against thresholds
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MetricsReview {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

/// Arithmetic mean; empty input yields 0
pub fn calculate_average(values: &[usize]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<usize>() as f64 / values.len() as f64
}

/// Population standard deviation (divide by N); fewer than 2 values yields 0
pub fn calculate_std_dev(values: &[usize]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = calculate_average(values);
    let variance = values
        .iter()
        .map(|&v| {
            let diff = v as f64 - mean;
            diff * diff
        })
        .sum::<f64>()
        / values.len() as f64;
    variance.sqrt()
}

/// Sentence-length burstiness normalized to [0,1]
///
/// Raw score is `(std - mean) / (std + mean)`, shifted from [-1,1] into
/// [0,1]. Uniform sentence lengths score low; varied lengths score high.
pub fn calculate_burstiness(sentence_lengths: &[usize]) -> f64 {
    if sentence_lengths.len() < 2 {
        return 0.0;
    }
    let mean = calculate_average(sentence_lengths);
    if mean == 0.0 {
        return 0.0;
    }
    let std_dev = calculate_std_dev(sentence_lengths);
    let raw = (std_dev - mean) / (std_dev + mean);
    (raw + 1.0) / 2.0
}

/// Type-token ratio over purely alphabetic lowercase words
///
/// Tokens carrying digits or attached punctuation are excluded before
/// counting, so "word." and "word" never inflate the unique count apart.
pub fn calculate_lexical_diversity(text: &str) -> f64 {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split_whitespace()
        .filter(|w| !w.is_empty() && w.chars().all(|c| c.is_ascii_lowercase()))
        .collect();

    if words.is_empty() {
        return 0.0;
    }

    let unique: std::collections::HashSet<&str> = words.iter().copied().collect();
    unique.len() as f64 / words.len() as f64
}

/// Heuristic perplexity estimate in [20,150]
///
/// Combines lexical diversity, sentence-length variation, word-length
/// variation, and punctuation variety around a base of 60. Empty text
/// short-circuits to the 0 sentinel before any adjustment.
pub fn calculate_perplexity(text: &str, sentence_lengths: &[usize]) -> f64 {
    if text.trim().is_empty() {
        return 0.0;
    }

    let lexical_diversity = calculate_lexical_diversity(text);
    let sentence_std_dev = calculate_std_dev(sentence_lengths);
    let word_length_std_dev = word_length_std_dev(text);
    let punctuation_diversity = punctuation_diversity(text);

    let mut perplexity = PERPLEXITY_BASE;
    perplexity += (lexical_diversity - 0.5) * 40.0;
    perplexity += sentence_std_dev.min(10.0) * 2.0;
    perplexity += word_length_std_dev * 5.0;
    perplexity += punctuation_diversity * 10.0;

    perplexity.clamp(PERPLEXITY_MIN, PERPLEXITY_MAX)
}

/// Population standard deviation of per-word character lengths
fn word_length_std_dev(text: &str) -> f64 {
    let lengths: Vec<usize> = text
        .split_whitespace()
        .map(|w| w.chars().count())
        .collect();
    calculate_std_dev(&lengths)
}

/// Fraction of the fixed punctuation set present in the text, in [0,1]
fn punctuation_diversity(text: &str) -> f64 {
    let present = PUNCTUATION_VARIETY
        .iter()
        .filter(|&&p| text.contains(p))
        .count();
    present as f64 / PUNCTUATION_VARIETY.len() as f64
}

/// Compute the full metric set for a text sample
///
/// Sentence lengths come from the same splitting heuristic the document
/// parser uses, so burstiness and the std-dev figures stay calibrated to
/// that heuristic's output distribution.
pub fn calculate_metrics(text: &str) -> TextMetrics {
    if text.trim().is_empty() {
        debug!("Empty input, returning zeroed metrics");
        return TextMetrics::default();
    }

    let sentences = extract_sentences(text);
    let sentence_lengths: Vec<usize> = sentences
        .iter()
        .map(|s| s.split_whitespace().count())
        .collect();

    let average_sentence_length = calculate_average(&sentence_lengths);
    let sentence_length_std_dev = calculate_std_dev(&sentence_lengths);
    let burstiness = calculate_burstiness(&sentence_lengths);
    let lexical_diversity = calculate_lexical_diversity(text);
    let perplexity = calculate_perplexity(text, &sentence_lengths);

    debug!(
        sentences = sentence_lengths.len(),
        burstiness = burstiness,
        lexical_diversity = lexical_diversity,
        perplexity = perplexity,
        "Computed text metrics"
    );

    TextMetrics {
        perplexity,
        burstiness,
        lexical_diversity,
        average_sentence_length,
        sentence_length_std_dev,
        sentence_lengths,
    }
}

/// Check metrics against quality thresholds, reporting each violation
pub fn validate_metrics(metrics: &TextMetrics) -> MetricsReview {
    validate_metrics_with(metrics, &MetricsThresholds::default())
}

/// Threshold check against a caller-supplied table
pub fn validate_metrics_with(metrics: &TextMetrics, thresholds: &MetricsThresholds) -> MetricsReview {
    let mut issues = Vec::new();

    if metrics.burstiness < thresholds.min_burstiness {
        issues.push(format!(
            "Burstiness {:.2} is below the minimum of {:.2}",
            metrics.burstiness, thresholds.min_burstiness
        ));
    }

    if metrics.sentence_length_std_dev < thresholds.min_sentence_std_dev {
        issues.push(format!(
            "Sentence length variation {:.2} is below the minimum of {:.2}",
            metrics.sentence_length_std_dev, thresholds.min_sentence_std_dev
        ));
    }

    let (lo, hi) = thresholds.perplexity_range;
    if metrics.perplexity < lo || metrics.perplexity > hi {
        issues.push(format!(
            "Perplexity {:.2} is outside the acceptable range {:.0}-{:.0}",
            metrics.perplexity, lo, hi
        ));
    }

    MetricsReview {
        is_valid: issues.is_empty(),
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_empty_and_simple() {
        assert_eq!(calculate_average(&[]), 0.0);
        assert_eq!(calculate_average(&[10]), 10.0);
        assert_eq!(calculate_average(&[2, 4, 6]), 4.0);
    }

    #[test]
    fn test_std_dev_requires_two_values() {
        assert_eq!(calculate_std_dev(&[]), 0.0);
        assert_eq!(calculate_std_dev(&[42]), 0.0);
    }

    #[test]
    fn test_std_dev_is_population() {
        // Population std dev of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 2
        let values = [2, 4, 4, 4, 5, 5, 7, 9];
        let std = calculate_std_dev(&values);
        assert!((std - 2.0).abs() < 1e-10, "expected 2.0, got {std}");
    }

    #[test]
    fn test_burstiness_degenerate_inputs() {
        assert_eq!(calculate_burstiness(&[]), 0.0);
        assert_eq!(calculate_burstiness(&[5]), 0.0);
        assert_eq!(calculate_burstiness(&[0, 0, 0]), 0.0);
    }

    #[test]
    fn test_burstiness_bounds_and_ordering() {
        let uniform = [10, 10, 10, 10];
        let varied = [5, 15, 3, 20, 8, 25, 4, 18];

        let uniform_score = calculate_burstiness(&uniform);
        let varied_score = calculate_burstiness(&varied);

        assert!((0.0..=1.0).contains(&uniform_score));
        assert!((0.0..=1.0).contains(&varied_score));
        assert!(
            varied_score > uniform_score,
            "varied lengths must score higher: {varied_score} vs {uniform_score}"
        );
    }

    #[test]
    fn test_lexical_diversity_repetition() {
        let repeated = calculate_lexical_diversity("the the the the");
        let varied = calculate_lexical_diversity("the quick brown fox");

        assert!((repeated - 0.25).abs() < 1e-10);
        assert!((varied - 1.0).abs() < 1e-10);
        assert!(repeated < varied);
    }

    #[test]
    fn test_lexical_diversity_filters_non_alphabetic() {
        // "2nd" and "fox!" carry non-letters and are excluded entirely
        let diversity = calculate_lexical_diversity("the 2nd quick fox!");
        assert!((diversity - 1.0).abs() < 1e-10, "got {diversity}");

        assert_eq!(calculate_lexical_diversity(""), 0.0);
        assert_eq!(calculate_lexical_diversity("123 456 !!!"), 0.0);
    }

    #[test]
    fn test_perplexity_empty_sentinel() {
        assert_eq!(calculate_perplexity("", &[]), 0.0);
        assert_eq!(calculate_perplexity("   \n\t  ", &[]), 0.0);
    }

    #[test]
    fn test_perplexity_clamped_range() {
        let texts = [
            "a a a a a a a a.",
            "The quick brown fox jumps over the lazy dog. What a sight! Remarkable, isn't it?",
            "word",
        ];
        for text in &texts {
            let lengths: Vec<usize> = extract_sentences(text)
                .iter()
                .map(|s| s.split_whitespace().count())
                .collect();
            let p = calculate_perplexity(text, &lengths);
            assert!(
                (PERPLEXITY_MIN..=PERPLEXITY_MAX).contains(&p),
                "perplexity {p} out of range for {text:?}"
            );
        }
    }

    #[test]
    fn test_calculate_metrics_empty() {
        let metrics = calculate_metrics("");
        assert_eq!(metrics, TextMetrics::default());

        let metrics = calculate_metrics("   \t\n  ");
        assert_eq!(metrics.perplexity, 0.0);
        assert_eq!(metrics.burstiness, 0.0);
        assert!(metrics.sentence_lengths.is_empty());
    }

    #[test]
    fn test_calculate_metrics_populated() {
        let text = "Short one. This sentence is quite a bit longer than the first. Tiny. \
                    Here is another sentence of moderate length for variation.";
        let metrics = calculate_metrics(text);

        assert_eq!(metrics.sentence_lengths.len(), 4);
        assert!(metrics.perplexity > 0.0);
        assert!(metrics.average_sentence_length > 0.0);
        assert!((0.0..=1.0).contains(&metrics.burstiness));
        assert!((0.0..=1.0).contains(&metrics.lexical_diversity));
    }

    #[test]
    fn test_validate_metrics_reports_violations() {
        let flat = TextMetrics {
            perplexity: 30.0,
            burstiness: 0.2,
            lexical_diversity: 0.5,
            average_sentence_length: 10.0,
            sentence_length_std_dev: 1.0,
            sentence_lengths: vec![10, 10, 10],
        };
        let review = validate_metrics(&flat);
        assert!(!review.is_valid);
        assert_eq!(review.issues.len(), 3);

        let healthy = TextMetrics {
            perplexity: 80.0,
            burstiness: 0.7,
            lexical_diversity: 0.8,
            average_sentence_length: 14.0,
            sentence_length_std_dev: 9.5,
            sentence_lengths: vec![4, 22, 9, 30],
        };
        let review = validate_metrics(&healthy);
        assert!(review.is_valid);
        assert!(review.issues.is_empty());
    }

    #[test]
    fn test_validate_metrics_custom_thresholds() {
        let metrics = TextMetrics {
            perplexity: 50.0,
            burstiness: 0.4,
            sentence_length_std_dev: 3.0,
            ..Default::default()
        };
        let lenient = MetricsThresholds {
            min_burstiness: 0.1,
            min_sentence_std_dev: 1.0,
            perplexity_range: (20.0, 150.0),
        };
        let review = validate_metrics_with(&metrics, &lenient);
        assert!(review.is_valid);
    }
}
