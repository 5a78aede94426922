// WHY: Heuristic single-pass language classifier over fixed function-word
// tables. Two stages: a Unicode script screen rules out non-Latin text, then
// stop-word frequency scores the five supported Latin-script languages.

use serde::Serialize;
use tracing::debug;

const ENGLISH_STOP_WORDS: &[&str] = &[
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on",
    "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we",
    "say", "her", "she", "or", "an", "will", "my", "all", "would", "there", "their", "what",
    "is", "are", "was", "were", "been", "has", "had", "should", "could", "can",
];

const SPANISH_STOP_WORDS: &[&str] = &[
    "el", "la", "de", "que", "y", "en", "un", "ser", "se", "no", "haber", "por", "con", "su",
    "para", "como", "estar", "tener", "le", "lo", "todo", "pero", "más", "hacer", "o", "poder",
    "decir", "este", "ir", "otro", "ese", "si", "me", "ya", "porque", "cuando", "él", "muy",
    "sin", "sobre", "también", "hasta", "hay", "donde", "quien", "desde", "nos", "durante",
];

const FRENCH_STOP_WORDS: &[&str] = &[
    "le", "la", "de", "et", "les", "des", "en", "un", "du", "une", "que", "est", "pour", "qui",
    "dans", "par", "plus", "pas", "au", "sur", "ne", "se", "ce", "il", "sont", "avec", "son",
    "mais", "comme", "ou", "si", "leur", "dont", "nous", "vous", "je", "tu", "elle", "aux",
    "cette", "ses", "être", "avoir", "fait", "tout", "aussi", "bien", "où",
];

const GERMAN_STOP_WORDS: &[&str] = &[
    "der", "die", "und", "in", "den", "von", "zu", "das", "mit", "sich", "des", "auf", "für",
    "ist", "im", "dem", "nicht", "ein", "eine", "als", "auch", "es", "an", "werden", "aus",
    "er", "hat", "dass", "sie", "nach", "wird", "bei", "einer", "um", "am", "sind", "noch",
    "wie", "einem", "über", "einen", "so", "zum", "war", "haben", "nur", "oder", "aber",
];

const PORTUGUESE_STOP_WORDS: &[&str] = &[
    "o", "a", "de", "que", "e", "do", "da", "em", "um", "para", "é", "com", "não", "uma",
    "os", "no", "se", "na", "por", "mais", "as", "dos", "como", "mas", "foi", "ao", "ele",
    "das", "tem", "à", "seu", "sua", "ou", "ser", "quando", "muito", "há", "nos", "já",
    "está", "eu", "também", "só", "pelo", "pela", "até", "isso", "ela", "entre",
];

/// Identifying metadata for a supported language
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageInfo {
    pub code: &'static str,
    pub name: &'static str,
}

/// A supported language plus its function-word table
#[derive(Debug, Clone, Copy)]
pub struct LanguageProfile {
    pub info: LanguageInfo,
    pub stop_words: &'static [&'static str],
}

/// The fixed table of supported languages
///
/// Table order is the tie-break priority: when two languages score exactly
/// equal, the earlier entry wins.
pub const SUPPORTED_LANGUAGES: [LanguageProfile; 5] = [
    LanguageProfile {
        info: LanguageInfo { code: "en", name: "English" },
        stop_words: ENGLISH_STOP_WORDS,
    },
    LanguageProfile {
        info: LanguageInfo { code: "es", name: "Spanish" },
        stop_words: SPANISH_STOP_WORDS,
    },
    LanguageProfile {
        info: LanguageInfo { code: "fr", name: "French" },
        stop_words: FRENCH_STOP_WORDS,
    },
    LanguageProfile {
        info: LanguageInfo { code: "de", name: "German" },
        stop_words: GERMAN_STOP_WORDS,
    },
    LanguageProfile {
        info: LanguageInfo { code: "pt", name: "Portuguese" },
        stop_words: PORTUGUESE_STOP_WORDS,
    },
];

/// Tunable detection thresholds and the language table itself
///
/// Modeled as a value so tests can substitute fixture tables instead of
/// patching globals.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub profiles: Vec<LanguageProfile>,
    /// Minimum count of real (alphabetic) words before scoring is attempted
    pub min_word_count: usize,
    /// Winning scores below this floor are reported as unsupported
    pub min_confidence: f64,
    /// Minimum fraction of alphabetic characters that must be Latin script
    pub min_latin_ratio: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            profiles: SUPPORTED_LANGUAGES.to_vec(),
            min_word_count: 3,
            min_confidence: 0.10,
            min_latin_ratio: 0.5,
        }
    }
}

/// Result of language detection, produced fresh per call
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DetectionResult {
    /// ISO 639-1 code of the detected language, or "unknown"
    pub language: String,
    /// Normalized score in [0,1]
    pub confidence: f64,
    pub is_supported: bool,
    /// Populated when the text falls outside the supported set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_languages: Option<Vec<LanguageInfo>>,
}

impl Default for DetectionResult {
    fn default() -> Self {
        Self {
            language: "unknown".to_string(),
            confidence: 0.0,
            is_supported: false,
            supported_languages: None,
        }
    }
}

/// Detect the language of a text sample with the default configuration
pub fn detect_language(text: &str) -> DetectionResult {
    detect_language_with(text, &DetectorConfig::default())
}

/// Detect the language of a text sample against a caller-supplied table
pub fn detect_language_with(text: &str, config: &DetectorConfig) -> DetectionResult {
    let tokens = tokenize(text);

    // Too little signal to score anything
    if tokens.len() < config.min_word_count {
        debug!(tokens = tokens.len(), "Input below minimum word count");
        return DetectionResult::default();
    }

    // Script screen: mostly non-Latin text cannot match any supported table
    if latin_ratio(text) < config.min_latin_ratio {
        debug!("Non-Latin script dominates, reporting unsupported");
        return DetectionResult {
            supported_languages: Some(supported_language_infos(config)),
            ..Default::default()
        };
    }

    let mut best: Option<(&LanguageProfile, f64)> = None;
    for profile in &config.profiles {
        let matches = tokens
            .iter()
            .filter(|token| profile.stop_words.contains(&token.as_str()))
            .count();
        let score = matches as f64 / tokens.len() as f64;

        // Strict comparison keeps the earlier profile on exact ties
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((profile, score));
        }
    }

    let Some((winner, score)) = best else {
        return DetectionResult {
            supported_languages: Some(supported_language_infos(config)),
            ..Default::default()
        };
    };

    let confidence = score.min(1.0);

    if confidence < config.min_confidence {
        // Report the best Latin-script guess, but flag it unsupported
        let language = if confidence > 0.0 {
            winner.info.code.to_string()
        } else {
            "unknown".to_string()
        };
        debug!(%language, confidence, "Winning score below confidence floor");
        return DetectionResult {
            language,
            confidence,
            is_supported: false,
            supported_languages: Some(supported_language_infos(config)),
        };
    }

    debug!(language = winner.info.code, confidence, "Detected language");
    DetectionResult {
        language: winner.info.code.to_string(),
        confidence,
        is_supported: true,
        supported_languages: None,
    }
}

/// Pure lookup against the fixed language table
pub fn is_language_supported(code: &str) -> bool {
    SUPPORTED_LANGUAGES
        .iter()
        .any(|profile| profile.info.code == code)
}

/// The fixed list of supported languages
pub fn supported_languages() -> Vec<LanguageInfo> {
    SUPPORTED_LANGUAGES.iter().map(|p| p.info).collect()
}

fn supported_language_infos(config: &DetectorConfig) -> Vec<LanguageInfo> {
    config.profiles.iter().map(|p| p.info).collect()
}

/// Lowercase alphabetic tokens with edge punctuation stripped
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty() && word.chars().any(|c| c.is_alphabetic()))
        .collect()
}

/// Fraction of alphabetic characters drawn from Latin blocks
fn latin_ratio(text: &str) -> f64 {
    let mut latin = 0usize;
    let mut total_alpha = 0usize;

    for c in text.chars() {
        if !c.is_alphabetic() {
            continue;
        }
        total_alpha += 1;
        // Basic Latin through Latin Extended-B, plus Latin Extended Additional
        if matches!(c, '\u{0041}'..='\u{024F}' | '\u{1E00}'..='\u{1EFF}') {
            latin += 1;
        }
    }

    if total_alpha == 0 {
        // No letters at all; let the word-count gate handle it
        return 1.0;
    }
    latin as f64 / total_alpha as f64
}
