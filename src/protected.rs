// WHY: Protected segments mark spans that must survive any downstream text
// transformation byte-for-byte. The parser only discovers, substitutes, and
// restores - it never transforms.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Recognized delimiter pairs, in scan priority order for equal positions
const DELIMITER_PAIRS: [(&str, &str); 2] = [("[[", "]]"), ("{{", "}}")];

/// A delimited span discovered in the original text
///
/// `start_position..end_position` is the full delimited span (delimiters
/// included) in byte offsets; `content` is the delimiter-stripped interior.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProtectedSegment {
    pub content: String,
    pub start_position: usize,
    pub end_position: usize,
    pub open_delimiter: String,
    pub close_delimiter: String,
}

/// One placeholder-to-segment binding
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderBinding {
    pub placeholder: String,
    pub segment: ProtectedSegment,
}

/// Ordered placeholder map; insertion order is discovery order (left to right)
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    entries: Vec<PlaceholderBinding>,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, placeholder: String, segment: ProtectedSegment) {
        self.entries.push(PlaceholderBinding { placeholder, segment });
    }

    /// Look up the segment bound to a placeholder token
    pub fn get(&self, placeholder: &str) -> Option<&ProtectedSegment> {
        self.entries
            .iter()
            .find(|binding| binding.placeholder == placeholder)
            .map(|binding| &binding.segment)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlaceholderBinding> {
        self.entries.iter()
    }
}

/// Text with segments swapped for placeholders, plus the map to undo it
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    pub processed_text: String,
    pub placeholder_map: PlaceholderMap,
}

/// Outcome of delimiter well-formedness validation
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Find the earliest opening delimiter at or after `cursor`
fn next_opener(text: &str, cursor: usize) -> Option<(usize, &'static str, &'static str)> {
    DELIMITER_PAIRS
        .iter()
        .filter_map(|&(open, close)| {
            text[cursor..]
                .find(open)
                .map(|offset| (cursor + offset, open, close))
        })
        .min_by_key(|&(position, _, _)| position)
}

/// Discover all protected segments in left-to-right order
///
/// For each opening delimiter the nearest closing delimiter of the same kind
/// terminates the segment; same-kind nesting is not supported. An opener
/// with no close is skipped here and reported by
/// [`validate_protected_segments`].
pub fn parse_protected_segments(text: &str) -> Vec<ProtectedSegment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    while let Some((open_pos, open, close)) = next_opener(text, cursor) {
        let content_start = open_pos + open.len();
        match text[content_start..].find(close) {
            Some(offset) => {
                let close_pos = content_start + offset;
                let end_position = close_pos + close.len();
                segments.push(ProtectedSegment {
                    content: text[content_start..close_pos].to_string(),
                    start_position: open_pos,
                    end_position,
                    open_delimiter: open.to_string(),
                    close_delimiter: close.to_string(),
                });
                cursor = end_position;
            }
            None => {
                // Unmatched opener: step past it and keep scanning
                cursor = content_start;
            }
        }
    }

    debug!(count = segments.len(), "Discovered protected segments");
    segments
}

/// Replace each segment's full delimited span with a sequential placeholder
///
/// Placeholders are `__PROTECTED_0__`, `__PROTECTED_1__`, ... in discovery
/// order. The processed text contains no original delimiter pairs, and the
/// map holds exactly one entry per segment.
pub fn extract_with_placeholders(text: &str, segments: &[ProtectedSegment]) -> ExtractionResult {
    let mut processed_text = String::with_capacity(text.len());
    let mut placeholder_map = PlaceholderMap::new();
    let mut cursor = 0;

    for segment in segments {
        // Segments out of scan order or out of bounds cannot be substituted
        if segment.start_position < cursor || segment.end_position > text.len() {
            continue;
        }
        processed_text.push_str(&text[cursor..segment.start_position]);
        let placeholder = format!("__PROTECTED_{}__", placeholder_map.len());
        processed_text.push_str(&placeholder);
        placeholder_map.insert(placeholder, segment.clone());
        cursor = segment.end_position;
    }

    processed_text.push_str(&text[cursor..]);

    ExtractionResult {
        processed_text,
        placeholder_map,
    }
}

/// Swap each placeholder back for its segment's bare content
///
/// Delimiters are stripped on restoration; surrounding text is carried
/// through untouched, so transformations applied between extraction and
/// restoration survive everywhere except inside protected spans.
pub fn restore_protected_segments(processed_text: &str, placeholder_map: &PlaceholderMap) -> String {
    let mut restored = processed_text.to_string();
    for binding in placeholder_map.iter() {
        restored = restored.replace(&binding.placeholder, &binding.segment.content);
    }
    restored
}

/// Report every opening delimiter left unclosed before end of text
///
/// Well-formed text with zero segments is valid.
pub fn validate_protected_segments(text: &str) -> ValidationResult {
    let mut errors = Vec::new();
    let mut cursor = 0;

    while let Some((open_pos, open, close)) = next_opener(text, cursor) {
        let content_start = open_pos + open.len();
        match text[content_start..].find(close) {
            Some(offset) => {
                cursor = content_start + offset + close.len();
            }
            None => {
                errors.push(format!(
                    "Unclosed protected segment: '{open}' at position {open_pos} has no matching '{close}'"
                ));
                cursor = content_start;
            }
        }
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_segments() {
        assert!(parse_protected_segments("").is_empty());
        assert!(parse_protected_segments("Plain text without delimiters.").is_empty());
    }

    #[test]
    fn test_parse_single_segment() {
        let text = "Keep [[this phrase]] intact.";
        let segments = parse_protected_segments(text);

        assert_eq!(segments.len(), 1);
        let segment = &segments[0];
        assert_eq!(segment.content, "this phrase");
        assert_eq!(segment.open_delimiter, "[[");
        assert_eq!(segment.close_delimiter, "]]");
        assert_eq!(&text[segment.start_position..segment.end_position], "[[this phrase]]");
    }

    #[test]
    fn test_parse_mixed_delimiters_in_order() {
        let text = "First {{alpha}} then [[beta]] then {{gamma}}.";
        let segments = parse_protected_segments(text);

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].content, "alpha");
        assert_eq!(segments[0].open_delimiter, "{{");
        assert_eq!(segments[1].content, "beta");
        assert_eq!(segments[1].open_delimiter, "[[");
        assert_eq!(segments[2].content, "gamma");

        // Discovery order is left to right
        assert!(segments[0].start_position < segments[1].start_position);
        assert!(segments[1].start_position < segments[2].start_position);
    }

    #[test]
    fn test_parse_first_close_wins() {
        // Same-kind nesting is unsupported; first close terminates
        let text = "[[outer [[inner]] trailing]]";
        let segments = parse_protected_segments(text);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].content, "outer [[inner");
    }

    #[test]
    fn test_parse_skips_unmatched_opener() {
        let text = "Broken [[opener and a {{good}} one.";
        let segments = parse_protected_segments(text);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].content, "good");
    }

    #[test]
    fn test_extract_with_placeholders() {
        let text = "Keep [[one]] and {{two}} safe.";
        let segments = parse_protected_segments(text);
        let extraction = extract_with_placeholders(text, &segments);

        assert_eq!(extraction.processed_text, "Keep __PROTECTED_0__ and __PROTECTED_1__ safe.");
        assert_eq!(extraction.placeholder_map.len(), 2);
        assert!(!extraction.processed_text.contains("[["));
        assert!(!extraction.processed_text.contains("{{"));

        let bound = extraction.placeholder_map.get("__PROTECTED_0__").expect("entry 0 exists");
        assert_eq!(bound.content, "one");
        assert!(extraction.placeholder_map.get("__PROTECTED_9__").is_none());
    }

    #[test]
    fn test_restore_round_trip() {
        let text = "Transform around [[keep me]] and {{me too}} please.";
        let segments = parse_protected_segments(text);
        let extraction = extract_with_placeholders(text, &segments);

        let restored =
            restore_protected_segments(&extraction.processed_text, &extraction.placeholder_map);

        assert!(restored.contains("keep me"));
        assert!(restored.contains("me too"));
        assert_eq!(restored, "Transform around keep me and me too please.");
    }

    #[test]
    fn test_restore_after_surrounding_transformation() {
        let text = "the original [[protected phrase]] stays";
        let segments = parse_protected_segments(text);
        let extraction = extract_with_placeholders(text, &segments);

        // Simulate a transformation that rewrites everything around the placeholder
        let transformed = extraction.processed_text.replace("the original", "a rewritten");
        let restored = restore_protected_segments(&transformed, &extraction.placeholder_map);

        assert_eq!(restored, "a rewritten protected phrase stays");
    }

    #[test]
    fn test_validate_well_formed() {
        assert!(validate_protected_segments("").is_valid);
        assert!(validate_protected_segments("No delimiters at all.").is_valid);
        assert!(validate_protected_segments("Two [[good]] and {{fine}} segments.").is_valid);
    }

    #[test]
    fn test_validate_unclosed_opener() {
        let result = validate_protected_segments("Text [[unclosed segment here.");
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("[["));
        assert!(result.errors[0].contains("position 5"));
    }

    #[test]
    fn test_validate_multiple_unclosed_openers() {
        let result = validate_protected_segments("One [[ and two {{ both broken");
        assert!(!result.is_valid);
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn test_extract_empty_segments() {
        let extraction = extract_with_placeholders("untouched", &[]);
        assert_eq!(extraction.processed_text, "untouched");
        assert!(extraction.placeholder_map.is_empty());
    }
}
