//! Method-section location by heading-pattern matching.
//!
//! Papers put their technical meat under a heading named Method,
//! Methodology, Approach, Framework, or Architecture — numbered, Roman-
//! numeral (IEEE), or bare. The locator finds the first such heading, then
//! bounds the section at the first following heading that reads like the
//! start of experiments/results/related work. Purely lexical; no layout
//! model involved.

use crate::extract::render;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use tracing::warn;

/// Cap applied when no end heading is found after the start.
const NO_END_WINDOW: usize = 8000;
/// Hard cap on the returned text.
const MAX_SECTION_CHARS: usize = 6000;
/// Anything shorter is a heading false-positive, not a real section.
const MIN_SECTION_CHARS: usize = 200;

// Priority-ordered: the first matching pattern wins.
static START_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\n\s*(?:\d+\.?\s*)?(?:methods?|methodology|approach|proposed method|our method|framework|model|architecture)\s*\n",
        r"(?i)\n\s*(?:\d+\.?\s*)?(?:the proposed|our approach|technical approach)\s*\n",
        r"(?i)\n\s*III\.?\s*(?:methods?|methodology|approach)\s*\n",
        r"(?i)\n\s*3\.?\s*(?:methods?|methodology|approach)\s*\n",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static END_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\n\s*(?:\d+\.?\s*)?(?:experiments?|evaluations?|results?|implementation|conclusions?|discussions?|related work)\s*\n",
        r"(?i)\n\s*(?:IV|V|4|5)\.?\s*(?:experiments?|evaluations?|results?)\s*\n",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Carve the Method section out of a paper's full text.
///
/// Returns `None` when no method-like heading matches, or when the carved
/// span is too short to be a genuine section. The returned text is
/// whitespace-normalised and truncated to [`MAX_SECTION_CHARS`].
pub fn locate_method_section(full_text: &str) -> Option<String> {
    let start = START_PATTERNS
        .iter()
        .find_map(|p| p.find(full_text))
        .map(|m| m.end())?;

    let tail = &full_text[start..];
    let end = END_PATTERNS
        .iter()
        .find_map(|p| p.find(tail))
        .map(|m| m.start())
        .unwrap_or_else(|| {
            let cap = NO_END_WINDOW.min(tail.len());
            (0..=cap)
                .rev()
                .find(|&i| tail.is_char_boundary(i))
                .unwrap_or(0)
        });

    let mut section: String = tail[..end].split_whitespace().collect::<Vec<_>>().join(" ");
    if section.len() > MAX_SECTION_CHARS {
        // Truncate on a char boundary; the tail of a 6 000-char span is
        // prompt filler either way.
        let cut = (0..=MAX_SECTION_CHARS)
            .rev()
            .find(|&i| section.is_char_boundary(i))
            .unwrap_or(0);
        section.truncate(cut);
    }

    if section.len() < MIN_SECTION_CHARS {
        return None;
    }
    Some(section)
}

/// Extract the Method section straight from a PDF on disk.
///
/// A locator miss is not an error: the architecture narrative falls back to
/// the abstract alone.
pub fn extract_method_section(pdf_path: &Path) -> Option<String> {
    let full_text = match render::extract_full_text(pdf_path) {
        Ok(t) => t,
        Err(e) => {
            warn!("Method extraction failed: {e}");
            return None;
        }
    };
    let section = locate_method_section(&full_text);
    if section.is_none() {
        warn!("No Method-like section heading found; narrative will use the abstract only");
    }
    section
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(chars: usize) -> String {
        // Deterministic filler with word breaks so whitespace normalisation
        // has something to normalise.
        let word = "method ";
        word.repeat(chars / word.len() + 1)[..chars].to_string()
    }

    #[test]
    fn carves_numbered_section_between_headings() {
        let section_body = body(500);
        let text = format!(
            "1. Introduction\nblah blah\n3. Methodology\n{section_body}\n4. Experiments\nmore text"
        );
        let result = locate_method_section(&text).expect("section found");
        assert_eq!(result, section_body.split_whitespace().collect::<Vec<_>>().join(" "));
    }

    #[test]
    fn returns_none_without_method_heading() {
        let text = format!(
            "1. Introduction\n{}\n4. Experiments\nmore",
            body(1000)
        );
        assert!(locate_method_section(&text).is_none());
    }

    #[test]
    fn returns_none_for_too_short_section() {
        let text = "intro\n3. Method\nshort body\n4. Results\nrest";
        assert!(locate_method_section(text).is_none());
    }

    #[test]
    fn caps_section_without_end_heading() {
        let text = format!("intro\n2. Approach\n{}", body(20_000));
        let result = locate_method_section(&text).expect("section found");
        assert!(result.len() <= MAX_SECTION_CHARS);
        assert!(result.len() >= MIN_SECTION_CHARS);
    }

    #[test]
    fn matches_ieee_roman_numeral_heading() {
        let section_body = body(400);
        let text = format!("abstract\nIII. METHOD\n{section_body}\nIV. EXPERIMENTS\ntail");
        assert!(locate_method_section(&text).is_some());
    }

    #[test]
    fn normalises_internal_whitespace() {
        let filler = "token ".repeat(80);
        let text = format!(
            "intro\n3. Method\nline one\n\n\nline   two {filler}\n4. Results\ntail"
        );
        let result = locate_method_section(&text).expect("section found");
        assert!(!result.contains('\n'));
        assert!(!result.contains("  "));
        assert!(result.starts_with("line one line two"));
    }
}
