//! Structured-text parsing of model responses into HTML fragments.
//!
//! Generative models decorate answers with conversational preambles and a
//! loose Markdown dialect. Rather than scattering ad-hoc substitutions
//! through the assembler, every text transform lives here with a documented
//! grammar and its own tests:
//!
//! * [`clean_response`] — preamble stripping + Markdown subset → HTML
//! * [`format_list`] — numbered/bulleted free text → `<ul>` with bold
//!   lead-ins split at the first colon
//! * [`format_ten_questions`] — `Q<n>. <question>? <answer>` blocks →
//!   question/answer cards, with a literal-passthrough fallback
//! * [`format_reviewer`] — emoji-headed critique subsections
//! * [`format_improvements`] — numbered one-liners
//!
//! Rule order inside [`clean_response`] matters: headings are converted
//! longest-marker-first so `#####` is not half-eaten by the `##` rule, and
//! paragraph wrapping runs last so it can recognise the block-level tags
//! the earlier rules emitted.

use once_cell::sync::Lazy;
use regex::Regex;

// ── Response cleaning ─────────────────────────────────────────────────────

// Conversational openers in both prompt languages. Anchored at the start;
// applied once each, in order.
static PREAMBLE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^好的[，,。.]*\s*",
        r"^以下是.*?[：:]\s*",
        r"^根据.*?[，,]\s*",
        r"^这是.*?[：:]\s*",
        r"^当然[，,。.]*\s*",
        r"^没问题[，,。.]*\s*",
        r"(?i)^OK[，,。.]*\s*",
        r"(?i)^Sure[，,。.]*\s*",
        r"(?i)^Here's.*?[：:]\s*",
        r"(?i)^Here are.*?[：:]\s*",
        r"(?i)Here is the original image[：:.]?\s*",
        r"(?i)Based on the (?:image|diagram|figure).*?[：:,]\s*",
        r"(?i)Looking at the (?:image|diagram|figure).*?[：:,]\s*",
        r"(?i)From the (?:image|diagram|figure).*?[：:,]\s*",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

static RE_H6: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{5,}\s*(.+)$").unwrap());
static RE_H5: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^####\s*(.+)$").unwrap());
static RE_H4: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^###\s*(.+)$").unwrap());
static RE_H3: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^##\s*(.+)$").unwrap());
static RE_BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static RE_ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*]+)\*").unwrap());
static RE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());
static RE_EMPTY_P: Lazy<Regex> = Lazy::new(|| Regex::new(r"<p>\s*</p>").unwrap());
static RE_PARA_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\n+").unwrap());
static RE_BLOCK_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<(h[1-6]|ul|ol|div|section|blockquote)").unwrap());

/// Drop conversational openers without any other transformation.
///
/// Used on its own for text that feeds another prompt (illustration scene
/// descriptions) rather than the HTML page.
pub fn strip_preambles(text: &str) -> String {
    let mut s = text.trim().to_string();
    for pattern in PREAMBLE_PATTERNS.iter() {
        s = pattern.replace(&s, "").into_owned();
    }
    s
}

/// Clean one raw model response into an HTML fragment.
///
/// Strips conversational preambles, converts the restricted Markdown subset
/// (headings 2–6, bold, italic, inline code, unordered lists), then wraps
/// bare paragraphs in `<p>` unless they already start with a block tag.
pub fn clean_response(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut s = strip_preambles(text);

    // Headings, longest marker first.
    s = RE_H6.replace_all(&s, r#"<h6 class="step-title">$1</h6>"#).into_owned();
    s = RE_H5.replace_all(&s, r#"<h5 class="step-title">$1</h5>"#).into_owned();
    s = RE_H4.replace_all(&s, r#"<h4 class="arch-subtitle">$1</h4>"#).into_owned();
    s = RE_H3.replace_all(&s, "<h3>$1</h3>").into_owned();

    // Inline emphasis. Bold must run before italic so `**x**` is not read
    // as two italics.
    s = RE_BOLD.replace_all(&s, "<strong>$1</strong>").into_owned();
    s = RE_ITALIC.replace_all(&s, "<em>$1</em>").into_owned();
    s = RE_CODE.replace_all(&s, "<code>$1</code>").into_owned();

    s = convert_bullet_lists(&s);
    s = wrap_paragraphs(&s);
    s = RE_EMPTY_P.replace_all(&s, "").into_owned();

    s.trim().to_string()
}

/// `- item` lines become `<ul class="detail-list">` runs.
fn convert_bullet_lists(text: &str) -> String {
    let mut out = Vec::new();
    let mut in_list = false;
    for line in text.lines() {
        let stripped = line.trim();
        if let Some(item) = stripped.strip_prefix("- ") {
            if !in_list {
                out.push(r#"<ul class="detail-list">"#.to_string());
                in_list = true;
            }
            out.push(format!("<li>{item}</li>"));
        } else {
            if in_list {
                out.push("</ul>".to_string());
                in_list = false;
            }
            out.push(line.to_string());
        }
    }
    if in_list {
        out.push("</ul>".to_string());
    }
    out.join("\n")
}

/// Wrap blank-line-separated chunks in `<p>`, leaving block elements alone.
fn wrap_paragraphs(text: &str) -> String {
    RE_PARA_SPLIT
        .split(text)
        .filter_map(|para| {
            let para = para.trim();
            if para.is_empty() {
                None
            } else if RE_BLOCK_START.is_match(para) {
                Some(para.to_string())
            } else {
                Some(format!("<p>{para}</p>"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── List-like sections (innovations, applications) ────────────────────────

/// Reformat free text that reads like a list into `<ul>` items.
///
/// Grammar: a new item starts at a line whose first character is a digit,
/// `-`, or `•`; continuation lines are appended to the current item. Inside
/// an item, the first colon (fullwidth or ASCII) splits a bold lead-in from
/// the description. Input with no recognisable markers is passed through as
/// a single paragraph.
pub fn format_list(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut items: Vec<String> = Vec::new();
    let mut current = String::new();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let starts_item = line
            .chars()
            .next()
            .map(|c| c.is_ascii_digit() || c == '-' || c == '•')
            .unwrap_or(false);
        if starts_item {
            if !current.is_empty() {
                items.push(current);
            }
            current = line
                .trim_start_matches(|c: char| {
                    c.is_ascii_digit() || matches!(c, '.' | '-' | '•' | ')' | ' ')
                })
                .trim()
                .to_string();
        } else if current.is_empty() {
            current = line.to_string();
        } else {
            current.push(' ');
            current.push_str(line);
        }
    }
    if !current.is_empty() {
        items.push(current);
    }

    if items.is_empty() {
        return format!("<p>{text}</p>");
    }

    let html_items: String = items
        .iter()
        .map(|item| {
            if let Some((title, desc)) = item.split_once('：') {
                format!("<li><strong>{title}</strong>：{desc}</li>")
            } else if let Some((title, desc)) = item.split_once(':') {
                format!("<li><strong>{title}</strong>: {}</li>", desc.trim_start())
            } else {
                format!("<li>{item}</li>")
            }
        })
        .collect();

    format!(r#"<ul class="innovations-list">{html_items}</ul>"#)
}

// ── Ten-question block ────────────────────────────────────────────────────

static RE_Q_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"Q(\d+)[.。]?\s*").unwrap());
static RE_LEADING_COLON: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[：:]\s*").unwrap());

struct QuestionBlock {
    num: String,
    title: String,
    answer: String,
}

/// Reformat a `Q1. … Q10. …` block into question/answer cards.
///
/// Grammar: each `Q<n>` marker opens a block running to the next marker.
/// Within a block the question is everything up to the first question mark
/// (fullwidth or ASCII), else the first line; the remainder is the answer.
/// Text without any marker is rendered as a single card — never empty for
/// non-empty input, never an error.
pub fn format_ten_questions(text: &str) -> String {
    if text.trim().is_empty() {
        return "<p>—</p>".to_string();
    }
    // `**` emphasis markers only get in the way of question parsing.
    let text = text.replace("**", "");

    let markers: Vec<(usize, usize, String)> = RE_Q_MARKER
        .captures_iter(&text)
        .map(|c| {
            let m = c.get(0).expect("full match");
            (m.start(), m.end(), c[1].to_string())
        })
        .collect();

    if markers.is_empty() {
        return format!(r#"<div class="qa-item"><p>{}</p></div>"#, text.trim());
    }

    let mut questions = Vec::new();
    for (i, (_, body_start, num)) in markers.iter().enumerate() {
        let body_end = markers.get(i + 1).map(|m| m.0).unwrap_or(text.len());
        let body = text[*body_start..body_end].trim();
        questions.push(split_question_answer(num, body));
    }

    questions
        .iter()
        .map(|q| {
            let answer = RE_LEADING_COLON.replace(q.answer.trim(), "");
            let answer = answer.replace("\n\n", "</p><p>").replace('\n', "<br>");
            format!(
                "<div class=\"qa-item\">\n\
                 <div class=\"qa-question\"><span class=\"qa-num\">Q{}</span><span class=\"qa-title\">{}</span></div>\n\
                 <div class=\"qa-answer\"><p>{}</p></div>\n\
                 </div>",
                q.num, q.title, answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn split_question_answer(num: &str, body: &str) -> QuestionBlock {
    if let Some(pos) = body.find(['？', '?']) {
        let mark_len = body[pos..].chars().next().map(char::len_utf8).unwrap_or(1);
        QuestionBlock {
            num: num.to_string(),
            title: body[..pos].trim().to_string(),
            answer: body[pos + mark_len..].trim().to_string(),
        }
    } else if let Some((first, rest)) = body.split_once('\n') {
        QuestionBlock {
            num: num.to_string(),
            title: first.trim().trim_end_matches(['：', ':']).to_string(),
            answer: rest.trim().to_string(),
        }
    } else {
        QuestionBlock {
            num: num.to_string(),
            title: format!("问题 {num}"),
            answer: body.to_string(),
        }
    }
}

// ── Reviewer critique ─────────────────────────────────────────────────────

static RE_EMOJI_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(🔴|🟡|🟢)\s*(.+)$").unwrap());
static RE_REVIEW_BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[-•]\s*(.+)$").unwrap());

/// Reformat the reviewer critique: the three emoji-prefixed subheadings
/// become bold paragraph leads, bullets become bulleted paragraphs, the
/// rest is paragraph-wrapped with `<br>` for single newlines.
pub fn format_reviewer(text: &str) -> String {
    if text.trim().is_empty() {
        return "<p>—</p>".to_string();
    }
    let mut s = RE_BOLD.replace_all(text, "<strong>$1</strong>").into_owned();
    s = RE_ITALIC.replace_all(&s, "<em>$1</em>").into_owned();
    s = RE_EMOJI_HEADING
        .replace_all(&s, "<p><strong>$1 $2</strong></p>")
        .into_owned();
    s = RE_REVIEW_BULLET.replace_all(&s, "<p>• $1</p>").into_owned();

    s.trim()
        .split("\n\n")
        .filter_map(|p| {
            let p = p.trim();
            if p.is_empty() {
                None
            } else if p.starts_with("<p>") {
                Some(p.replace('\n', "<br>"))
            } else {
                Some(format!("<p>{}</p>", p.replace('\n', "<br>")))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Improvement directions ────────────────────────────────────────────────

static RE_NUMBERED_LEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(\d+)[.。]\s*").unwrap());

/// Reformat the numbered improvement directions: the leading `1.`/`2.`
/// markers become bold, every line becomes a paragraph.
pub fn format_improvements(text: &str) -> String {
    if text.trim().is_empty() {
        return "<p>—</p>".to_string();
    }
    let mut s = RE_BOLD.replace_all(text, "<strong>$1</strong>").into_owned();
    s = RE_ITALIC.replace_all(&s, "<em>$1</em>").into_owned();
    s = RE_NUMBERED_LEAD
        .replace_all(&s, "<strong>$1.</strong> ")
        .into_owned();

    s.trim()
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|l| {
            if l.starts_with("<p>") {
                l.to_string()
            } else {
                format!("<p>{l}</p>")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── clean_response ────────────────────────────────────────────────

    #[test]
    fn strips_chinese_preamble() {
        assert_eq!(clean_response("好的，这是正文"), "<p>这是正文</p>");
    }

    #[test]
    fn strips_english_preamble() {
        let out = clean_response("Sure, the actual content");
        assert_eq!(out, "<p>the actual content</p>");
    }

    #[test]
    fn converts_heading_levels() {
        let out = clean_response("### Section\n\nbody\n\n#### Step\n\nmore");
        assert!(out.contains(r#"<h4 class="arch-subtitle">Section</h4>"#));
        assert!(out.contains(r#"<h5 class="step-title">Step</h5>"#));
    }

    #[test]
    fn five_hash_heading_beats_four_hash_rule() {
        let out = clean_response("##### Deep step");
        assert!(out.contains("<h6"), "got: {out}");
        assert!(!out.contains("#"));
    }

    #[test]
    fn converts_inline_emphasis() {
        let out = clean_response("**bold** and *slanted* and `code`");
        assert!(out.contains("<strong>bold</strong>"));
        assert!(out.contains("<em>slanted</em>"));
        assert!(out.contains("<code>code</code>"));
    }

    #[test]
    fn converts_bullet_runs_to_lists() {
        let out = clean_response("intro\n- one\n- two\nafter");
        assert!(out.contains(r#"<ul class="detail-list">"#));
        assert!(out.contains("<li>one</li>"));
        assert!(out.contains("<li>two</li>"));
        assert_eq!(out.matches("</ul>").count(), 1);
    }

    #[test]
    fn headings_are_not_wrapped_in_paragraphs() {
        let out = clean_response("### Title\n\nplain body");
        assert!(!out.contains("<p><h4"));
        assert!(out.contains("<p>plain body</p>"));
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(clean_response(""), "");
    }

    // ── format_list ───────────────────────────────────────────────────

    #[test]
    fn list_items_split_at_first_colon() {
        let out = format_list("1. 标题：描述文字\n2. Second: the rest");
        assert!(out.contains("<li><strong>标题</strong>：描述文字</li>"));
        assert!(out.contains("<li><strong>Second</strong>: the rest</li>"));
    }

    #[test]
    fn list_continuation_lines_join_their_item() {
        let out = format_list("1. Alpha: start\nand continuation\n2. Beta: done");
        assert!(out.contains("start and continuation"));
    }

    #[test]
    fn markerless_text_passes_through_as_paragraph() {
        let out = format_list("no markers anywhere");
        assert_eq!(out, "<p>no markers anywhere</p>");
    }

    // ── format_ten_questions ──────────────────────────────────────────

    #[test]
    fn parses_question_blocks() {
        let text = "Q1. 论文解决什么问题？解决了泛化问题。\nQ2. 是新问题吗？不是。";
        let out = format_ten_questions(text);
        assert_eq!(out.matches("qa-item").count(), 2);
        assert!(out.contains("Q1"));
        assert!(out.contains("论文解决什么问题"));
        assert!(out.contains("解决了泛化问题"));
    }

    #[test]
    fn bold_markers_are_removed_before_parsing() {
        let out = format_ten_questions("**Q1. What problem?** It scales.\n**Q2. New?** Yes.");
        assert!(!out.contains("**"));
        assert_eq!(out.matches("qa-num").count(), 2);
    }

    #[test]
    fn markerless_text_falls_back_to_single_card() {
        let out = format_ten_questions("just some commentary without markers");
        assert!(!out.is_empty());
        assert!(out.contains("qa-item"));
        assert!(out.contains("just some commentary"));
    }

    #[test]
    fn empty_ten_questions_never_empty_output() {
        assert!(!format_ten_questions("").is_empty());
    }

    // ── format_reviewer ───────────────────────────────────────────────

    #[test]
    fn reviewer_emoji_headings_become_bold() {
        let text = "🔴 潜在的 Weakness\n- 数据集太小\n\n🟢 作者可能的回应\n- 补充实验";
        let out = format_reviewer(text);
        assert!(out.contains("<strong>🔴 潜在的 Weakness</strong>"));
        assert!(out.contains("<p>• 数据集太小</p>"));
        assert!(out.contains("<strong>🟢 作者可能的回应</strong>"));
    }

    // ── format_improvements ───────────────────────────────────────────

    #[test]
    fn improvements_number_leads_become_bold() {
        let out = format_improvements("1. 扩展到视频\n2. 减少算力需求");
        assert!(out.contains("<p><strong>1.</strong> 扩展到视频</p>"));
        assert!(out.contains("<p><strong>2.</strong> 减少算力需求</p>"));
    }
}
