// WHY: Structure extraction over raw text - format sniffing, sentences,
// paragraphs, chapters, headings. Sentence splitting is heuristic and
// deliberately simple; metric calibration depends on this exact behavior.

use regex_automata::meta::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

/// Title abbreviations that precede proper nouns and must not split sentences
const TITLE_ABBREVIATIONS: &[&str] = &["Dr.", "Mr.", "Mrs.", "Ms.", "Prof.", "Sr.", "Jr."];

/// Detected source format of a document
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    #[default]
    Plain,
    Markdown,
    Html,
}

/// A chapter region located by a "Chapter N" heading line
///
/// Offsets are byte positions into the original text. Chapters are ordered
/// by `start_offset` ascending and never overlap; the final chapter runs to
/// the end of the text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Chapter {
    pub index: usize,
    pub title: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub word_count: usize,
}

/// A heading found in markdown (`#` lines) or HTML (`<h1>`-`<h6>` tags)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Heading {
    pub level: usize,
    pub text: String,
    pub offset: usize,
}

/// Structural summary of a document
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct DocumentStructure {
    pub format: DocumentFormat,
    pub paragraph_count: usize,
    pub sentence_count: usize,
    pub word_count: usize,
    pub chapter_count: usize,
    pub chapters: Vec<Chapter>,
    pub headings: Vec<Heading>,
}

/// Compiled patterns shared by all parsing calls
///
/// Compiled once on first use; the set is immutable afterwards so concurrent
/// callers never interfere.
struct DocumentPatterns {
    html_block_tag: Regex,
    markdown_heading: Regex,
    chapter_line: Regex,
    html_heading: Regex,
}

fn patterns() -> &'static DocumentPatterns {
    static PATTERNS: OnceLock<DocumentPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| DocumentPatterns {
        html_block_tag: Regex::new(
            r"(?i)</?(h[1-6]|p|div|br|ul|ol|li|table|body|html|blockquote)[\s>/]",
        )
        .expect("html block tag pattern compiles"),
        markdown_heading: Regex::new(r"(?m)^(#{1,6})[ \t]+([^\n]*)")
            .expect("markdown heading pattern compiles"),
        chapter_line: Regex::new(r"(?im)^[ \t]*chapter[ \t]+(\d+)[ \t]*:?[ \t]*([^\n]*)")
            .expect("chapter line pattern compiles"),
        html_heading: Regex::new(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]>")
            .expect("html heading pattern compiles"),
    })
}

/// Count whitespace-separated words; empty and whitespace-only input yields 0
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split text into sentences on `.` `!` `?` followed by whitespace
///
/// Runs of end punctuation ("?!", "...") terminate a single sentence. A
/// period after a title abbreviation ("Dr.", "Mrs.") does not split. This is
/// a best-effort heuristic, not grammatically guaranteed segmentation.
pub fn extract_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if !matches!(bytes[i], b'.' | b'!' | b'?') {
            i += 1;
            continue;
        }

        // Absorb the full punctuation run so "?!" stays with one sentence
        let run_start = i;
        let mut end = i + 1;
        while end < bytes.len() && matches!(bytes[end], b'.' | b'!' | b'?') {
            end += 1;
        }

        let followed_by_whitespace = end < bytes.len() && bytes[end].is_ascii_whitespace();
        let single_period = bytes[run_start] == b'.' && end - run_start == 1;

        if followed_by_whitespace
            && !(single_period && ends_with_title_abbreviation(&text[start..end]))
        {
            let sentence = text[start..end].trim();
            if !sentence.is_empty() {
                sentences.push(sentence.to_string());
            }
            start = end;
        }

        i = end;
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

/// Check whether the last word of the fragment is a known title abbreviation
fn ends_with_title_abbreviation(fragment: &str) -> bool {
    fragment
        .split_whitespace()
        .last()
        .is_some_and(|word| TITLE_ABBREVIATIONS.contains(&word))
}

/// Sniff the document format
///
/// Precedence: HTML block tags win over markdown markers; markdown heading
/// lines or `**` emphasis win over plain.
pub fn detect_format(text: &str) -> DocumentFormat {
    let p = patterns();
    if p.html_block_tag.is_match(text) {
        DocumentFormat::Html
    } else if p.markdown_heading.is_match(text) || text.contains("**") {
        DocumentFormat::Markdown
    } else {
        DocumentFormat::Plain
    }
}

/// Count maximal blocks of consecutive non-blank lines
fn count_paragraphs(text: &str) -> usize {
    let mut count = 0;
    let mut in_paragraph = false;
    for line in text.lines() {
        if line.trim().is_empty() {
            in_paragraph = false;
        } else if !in_paragraph {
            count += 1;
            in_paragraph = true;
        }
    }
    count
}

/// Locate chapter regions from "Chapter N[: title]" lines
fn extract_chapters(text: &str) -> Vec<Chapter> {
    let re = &patterns().chapter_line;
    let mut chapters: Vec<Chapter> = Vec::new();

    for caps in re.captures_iter(text) {
        let Some(m) = caps.get_match() else { continue };

        let title = match caps.get_group(2) {
            Some(span) if span.start < span.end => text[span.start..span.end].trim().to_string(),
            _ => text[m.start()..m.end()].trim().to_string(),
        };

        // Close out the previous chapter at this match's start
        if let Some(prev) = chapters.last_mut() {
            prev.end_offset = m.start();
        }

        chapters.push(Chapter {
            index: chapters.len(),
            title,
            start_offset: m.start(),
            end_offset: text.len(),
            word_count: 0,
        });
    }

    for chapter in &mut chapters {
        chapter.word_count = count_words(&text[chapter.start_offset..chapter.end_offset]);
    }

    chapters
}

/// Collect headings appropriate to the detected format
fn extract_headings(text: &str, format: DocumentFormat) -> Vec<Heading> {
    let p = patterns();
    let mut headings = Vec::new();

    match format {
        DocumentFormat::Markdown => {
            for caps in p.markdown_heading.captures_iter(text) {
                let Some(m) = caps.get_match() else { continue };
                let level = caps
                    .get_group(1)
                    .map(|span| span.end - span.start)
                    .unwrap_or(1);
                let heading_text = caps
                    .get_group(2)
                    .map(|span| text[span.start..span.end].trim().to_string())
                    .unwrap_or_default();
                headings.push(Heading {
                    level,
                    text: heading_text,
                    offset: m.start(),
                });
            }
        }
        DocumentFormat::Html => {
            for caps in p.html_heading.captures_iter(text) {
                let Some(m) = caps.get_match() else { continue };
                let level = caps
                    .get_group(1)
                    .and_then(|span| text[span.start..span.end].parse::<usize>().ok())
                    .unwrap_or(1);
                let heading_text = caps
                    .get_group(2)
                    .map(|span| text[span.start..span.end].trim().to_string())
                    .unwrap_or_default();
                headings.push(Heading {
                    level,
                    text: heading_text,
                    offset: m.start(),
                });
            }
        }
        DocumentFormat::Plain => {}
    }

    headings
}

/// Parse the structural summary of a document
pub fn parse_document(text: &str) -> DocumentStructure {
    if text.trim().is_empty() {
        return DocumentStructure::default();
    }

    let format = detect_format(text);
    let sentences = extract_sentences(text);
    let chapters = extract_chapters(text);
    let headings = extract_headings(text, format);

    let structure = DocumentStructure {
        format,
        paragraph_count: count_paragraphs(text),
        sentence_count: sentences.len(),
        word_count: count_words(text),
        chapter_count: chapters.len(),
        chapters,
        headings,
    };

    debug!(
        format = ?structure.format,
        paragraphs = structure.paragraph_count,
        sentences = structure.sentence_count,
        words = structure.word_count,
        chapters = structure.chapter_count,
        "Parsed document structure"
    );

    structure
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_words() {
        assert_eq!(count_words(""), 0);
        assert_eq!(count_words("   "), 0);
        assert_eq!(count_words("one"), 1);
        assert_eq!(count_words("  spaced   out   words  "), 3);
        assert_eq!(count_words("line\nbreaks\tand tabs"), 4);
    }

    #[test]
    fn test_extract_sentences_basic() {
        let sentences = extract_sentences("Hello world. This is a test. How are you?");
        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[0], "Hello world.");
        assert_eq!(sentences[1], "This is a test.");
        assert_eq!(sentences[2], "How are you?");
    }

    #[test]
    fn test_extract_sentences_punctuation_runs() {
        let sentences = extract_sentences("Really?! I had no idea... Tell me more.");
        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[0], "Really?!");
        assert_eq!(sentences[1], "I had no idea...");
    }

    #[test]
    fn test_extract_sentences_title_abbreviations() {
        let sentences = extract_sentences("Dr. Smith arrived late. Mrs. Jones was waiting.");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0], "Dr. Smith arrived late.");
        assert_eq!(sentences[1], "Mrs. Jones was waiting.");
    }

    #[test]
    fn test_extract_sentences_degenerate() {
        assert!(extract_sentences("").is_empty());
        assert!(extract_sentences("   \n  ").is_empty());
        assert_eq!(extract_sentences("No terminal punctuation"), vec!["No terminal punctuation"]);
    }

    #[test]
    fn test_format_detection_precedence() {
        assert_eq!(detect_format("Just some plain text."), DocumentFormat::Plain);
        assert_eq!(detect_format("# A Heading\n\nBody text."), DocumentFormat::Markdown);
        assert_eq!(detect_format("Some **bold** emphasis."), DocumentFormat::Markdown);
        assert_eq!(detect_format("<p>A paragraph</p>"), DocumentFormat::Html);
        // HTML wins even when markdown markers are present
        assert_eq!(
            detect_format("# Heading\n<div>**mixed**</div>"),
            DocumentFormat::Html
        );
    }

    #[test]
    fn test_paragraph_count() {
        let text = "First paragraph line one.\nLine two.\n\nSecond paragraph.\n\n\n\nThird.";
        let structure = parse_document(text);
        assert_eq!(structure.paragraph_count, 3);
    }

    #[test]
    fn test_chapter_detection() {
        let text = "Chapter 1: The Beginning\n\nIt was a dark night.\n\n\
                    Chapter 2: The Middle\n\nThings happened here.";
        let structure = parse_document(text);

        assert_eq!(structure.chapter_count, 2);
        assert_eq!(structure.chapters[0].title, "The Beginning");
        assert_eq!(structure.chapters[1].title, "The Middle");

        // Chapters are ordered, non-overlapping, and cover through end of text
        let (first, second) = (&structure.chapters[0], &structure.chapters[1]);
        assert_eq!(first.index, 0);
        assert_eq!(second.index, 1);
        assert!(first.start_offset < first.end_offset);
        assert_eq!(first.end_offset, second.start_offset);
        assert_eq!(second.end_offset, text.len());
        assert!(first.word_count > 0);
        assert!(second.word_count > 0);
    }

    #[test]
    fn test_chapter_detection_case_insensitive_untitled() {
        let text = "CHAPTER 1\n\nContent here.\n\nchapter 2\n\nMore content.";
        let structure = parse_document(text);
        assert_eq!(structure.chapter_count, 2);
        assert_eq!(structure.chapters[0].title, "CHAPTER 1");
    }

    #[test]
    fn test_markdown_headings() {
        let text = "# Title\n\nSome text.\n\n## Section One\n\nMore text.\n\n### Deep\n";
        let structure = parse_document(text);

        assert_eq!(structure.format, DocumentFormat::Markdown);
        assert_eq!(structure.headings.len(), 3);
        assert_eq!(structure.headings[0].level, 1);
        assert_eq!(structure.headings[0].text, "Title");
        assert_eq!(structure.headings[1].level, 2);
        assert_eq!(structure.headings[2].level, 3);
        assert_eq!(structure.headings[0].offset, 0);
    }

    #[test]
    fn test_html_headings() {
        let text = "<html><body><h1>Main</h1><p>Text.</p><h2 class=\"sub\">Sub</h2></body></html>";
        let structure = parse_document(text);

        assert_eq!(structure.format, DocumentFormat::Html);
        assert_eq!(structure.headings.len(), 2);
        assert_eq!(structure.headings[0].level, 1);
        assert_eq!(structure.headings[0].text, "Main");
        assert_eq!(structure.headings[1].level, 2);
        assert_eq!(structure.headings[1].text, "Sub");
    }

    #[test]
    fn test_parse_document_empty() {
        let structure = parse_document("");
        assert_eq!(structure, DocumentStructure::default());
        assert_eq!(structure.word_count, 0);
        assert_eq!(structure.chapter_count, 0);
    }

    #[test]
    fn test_parse_document_counts() {
        let text = "One sentence here. Another one follows! A third?\n\nNew paragraph.";
        let structure = parse_document(text);
        assert_eq!(structure.sentence_count, 4);
        assert_eq!(structure.paragraph_count, 2);
        assert_eq!(structure.word_count, 10);
    }
}
