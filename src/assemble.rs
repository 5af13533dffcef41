//! Document assembly: metadata + narrative + figures + illustrations → one
//! self-contained HTML string.
//!
//! Every image is inlined as base64 so the output file needs no sibling
//! assets — it can be mailed, archived, or opened from anywhere. Section
//! headings come from a per-language label table; the freeform sections go
//! through the structured-text formatters in [`crate::richtext`].

use crate::arxiv::{sanitize_filename, PaperMetadata};
use crate::config::Language;
use crate::illustrate::IllustrationSet;
use crate::narrative::NarrativeBundle;
use crate::richtext::{format_improvements, format_list, format_reviewer, format_ten_questions};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::path::Path;
use tracing::warn;

/// Per-language section headings and boilerplate.
struct Labels {
    intro: &'static str,
    problem: &'static str,
    solution: &'static str,
    architecture: &'static str,
    innovations: &'static str,
    applications: &'static str,
    ten_questions: &'static str,
    ten_questions_desc: &'static str,
    reviewer: &'static str,
    reviewer_desc: &'static str,
    improvements: &'static str,
    improvements_desc: &'static str,
    readmore: &'static str,
    readmore_desc: &'static str,
    footer: &'static str,
    min_read: &'static str,
}

const LABELS_ZH: Labels = Labels {
    intro: "导读",
    problem: "问题背景",
    solution: "解决方案",
    architecture: "网络架构详解",
    innovations: "核心创新",
    applications: "应用场景",
    ten_questions: "论文十问",
    ten_questions_desc: "快速理解论文主旨的框架",
    reviewer: "如果我是审稿人",
    reviewer_desc: "以批判性视角审视这篇论文",
    improvements: "潜在改进方向",
    improvements_desc: "未来研究的可能路径",
    readmore: "阅读原文",
    readmore_desc: "想深入了解？点击阅读完整论文",
    footer: "由 Paper Storyteller 生成",
    min_read: "分钟阅读",
};

const LABELS_EN: Labels = Labels {
    intro: "Introduction",
    problem: "Problem Background",
    solution: "Solution Overview",
    architecture: "Architecture Deep Dive",
    innovations: "Key Innovations",
    applications: "Applications",
    ten_questions: "10 Questions",
    ten_questions_desc: "A framework for quickly understanding papers",
    reviewer: "If I Were a Reviewer",
    reviewer_desc: "Critical perspective on this paper",
    improvements: "Future Directions",
    improvements_desc: "Potential paths for future research",
    readmore: "Read More",
    readmore_desc: "Want to learn more? Read the full paper",
    footer: "Generated by Paper Storyteller",
    min_read: "min read",
};

fn labels(lang: Language) -> &'static Labels {
    match lang {
        Language::Zh => &LABELS_ZH,
        Language::En => &LABELS_EN,
    }
}

/// Format an author list for display: `A`, `A and B`, `A, B, and C`, or
/// `A et al. (N authors)` past five names.
pub fn format_authors(authors: &[String]) -> String {
    match authors {
        [] => "Unknown".to_string(),
        [one] => one.clone(),
        [a, b] => format!("{a} and {b}"),
        all if all.len() <= 5 => {
            let (last, rest) = all.split_last().expect("non-empty");
            format!("{}, and {last}", rest.join(", "))
        }
        all => format!("{} et al. ({} authors)", all[0], all.len()),
    }
}

/// Rough reading time at 200 words per minute, never below one minute.
pub fn estimate_reading_time(text: &str) -> usize {
    (text.split_whitespace().count() / 200).max(1)
}

/// Output file name: `{id}_{lang}_{timestamp}.html`.
pub fn output_filename(arxiv_id: &str, lang: Language, now: chrono::DateTime<chrono::Local>) -> String {
    format!(
        "{}_{}_{}.html",
        sanitize_filename(arxiv_id),
        lang.code(),
        now.format("%Y%m%d_%H%M%S")
    )
}

/// Escape paper metadata destined for HTML text content.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Inline an image file as a base64 data URI; a missing or unreadable file
/// degrades to an empty slot.
fn inline_image(path: Option<&Path>) -> Option<String> {
    let path = path?;
    match std::fs::read(path) {
        Ok(bytes) => Some(format!("data:image/png;base64,{}", BASE64.encode(bytes))),
        Err(e) => {
            warn!("Could not inline {}: {e}", path.display());
            None
        }
    }
}

fn img_tag(data_uri: Option<String>, alt: &str, class: &str) -> String {
    match data_uri {
        Some(uri) => format!(r#"<img src="{uri}" alt="{alt}" class="{class}">"#),
        None => String::new(),
    }
}

/// A standard section card; skipped entirely when the body is empty.
fn section(heading: &str, desc: &str, body: &str) -> String {
    if body.trim().is_empty() {
        return String::new();
    }
    let desc_html = if desc.is_empty() {
        String::new()
    } else {
        format!("\n<p class=\"section-desc\">{desc}</p>")
    };
    format!(
        "<section class=\"card\">\n<h2>{heading}</h2>{desc_html}\n{body}\n</section>\n"
    )
}

/// Assemble the final page. Pure function of its inputs: no network, no
/// clock, no filesystem writes (images are read for inlining only).
pub fn build_document(
    metadata: &PaperMetadata,
    bundle: &NarrativeBundle,
    main_figure: Option<&Path>,
    illustrations: &IllustrationSet,
    language: Language,
) -> String {
    let l = labels(language);

    let page_title = if bundle.viral_title.is_empty() {
        escape_html(&metadata.title)
    } else {
        // The viral title came through the response cleaner; strip the
        // paragraph wrapper for use in text positions.
        bundle
            .viral_title
            .replace("<p>", "")
            .replace("</p>", "")
            .trim()
            .to_string()
    };

    let hero_img = img_tag(
        inline_image(illustrations.hero.as_deref()),
        "Hero",
        "hero-image",
    );
    let intro_img = img_tag(
        inline_image(illustrations.intro.as_deref()),
        "Introduction",
        "section-image",
    );
    let problem_img = img_tag(
        inline_image(illustrations.problem.as_deref()),
        "Problem",
        "section-image",
    );
    let arch_figure = match inline_image(main_figure) {
        Some(uri) => format!(
            "<div class=\"arch-figure\"><img src=\"{uri}\" alt=\"Network Architecture\"></div>\n"
        ),
        None => String::new(),
    };

    let authors = escape_html(&format_authors(&metadata.authors));
    let published = metadata
        .published
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    let reading_time = estimate_reading_time(&metadata.abstract_text);
    let category = escape_html(&metadata.primary_category);

    let mut body_sections = String::new();
    body_sections.push_str(&section(
        l.intro,
        "",
        &format!("{intro_img}\n{}", bundle.hook_intro),
    ));
    body_sections.push_str(&section(
        l.problem,
        "",
        &format!("{problem_img}\n{}", bundle.problem_statement),
    ));
    body_sections.push_str(&section(l.solution, "", &bundle.solution_overview));
    body_sections.push_str(&section(
        l.architecture,
        "",
        &format!("{arch_figure}{}", bundle.architecture_description),
    ));
    body_sections.push_str(&section(
        l.innovations,
        "",
        &format_list(&bundle.key_innovations),
    ));
    body_sections.push_str(&section(
        l.applications,
        "",
        &format_list(&bundle.applications),
    ));
    // The formatters below always return something renderable; gate on the
    // source text so a failed call skips its section instead of rendering a
    // placeholder card.
    let formatted = |src: &str, f: fn(&str) -> String| -> String {
        if src.trim().is_empty() {
            String::new()
        } else {
            f(src)
        }
    };
    body_sections.push_str(&section(
        l.ten_questions,
        l.ten_questions_desc,
        &formatted(&bundle.ten_questions, format_ten_questions),
    ));
    body_sections.push_str(&section(
        l.reviewer,
        l.reviewer_desc,
        &formatted(&bundle.reviewer_perspective, format_reviewer),
    ));
    body_sections.push_str(&section(
        l.improvements,
        l.improvements_desc,
        &formatted(&bundle.improvements, format_improvements),
    ));
    body_sections.push_str(&section(
        l.readmore,
        l.readmore_desc,
        &format!(
            "<p><a class=\"paper-link\" href=\"{}\">arXiv:{} →</a></p>",
            metadata.abs_url(),
            escape_html(&metadata.arxiv_id)
        ),
    ));

    let html_lang = match language {
        Language::Zh => "zh-CN",
        Language::En => "en",
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="{html_lang}">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{page_title}</title>
<style>
:root {{
    --bg: #F6F3EE;
    --bg-card: #FFFFFF;
    --border: #E7E1D8;
    --text-heading: #121417;
    --text: #2B2F36;
    --text-muted: #6B7280;
    --primary: #0F766E;
    --gradient-hero: linear-gradient(135deg, #0F766E 0%, #115E59 50%, #134E4A 100%);
}}
* {{ margin: 0; padding: 0; box-sizing: border-box; }}
body {{
    font-family: -apple-system, BlinkMacSystemFont, 'Noto Sans SC', 'PingFang SC', 'Microsoft YaHei', sans-serif;
    background: var(--bg);
    color: var(--text);
    line-height: 1.9;
    font-size: 16px;
}}
.container {{ max-width: 750px; margin: 0 auto; padding: 24px 20px; }}
p {{ margin-bottom: 1em; text-align: justify; word-break: break-word; }}
.hero {{
    position: relative;
    background: var(--gradient-hero);
    border-radius: 16px;
    padding: 50px 45px;
    margin-bottom: 32px;
    overflow: hidden;
    box-shadow: 0 8px 30px rgba(15, 118, 110, 0.15);
}}
.hero-image {{
    position: absolute; inset: 0;
    width: 100%; height: 100%;
    object-fit: cover; opacity: 0.15; mix-blend-mode: overlay;
}}
.hero-content {{ position: relative; z-index: 1; }}
.hero h1 {{ font-size: 2.2em; color: #fff; line-height: 1.25; margin-bottom: 22px; }}
.hero .meta {{ display: flex; flex-wrap: wrap; gap: 18px; color: rgba(255,255,255,0.9); font-size: 0.92em; }}
.hero .paper-title {{ color: rgba(255,255,255,0.85); font-size: 0.95em; margin-top: 14px; }}
.card {{
    background: var(--bg-card);
    border: 1px solid var(--border);
    border-radius: 14px;
    padding: 34px 38px;
    margin-bottom: 26px;
}}
.card h2 {{ color: var(--text-heading); font-size: 1.45em; margin-bottom: 14px; }}
.section-desc {{ color: var(--text-muted); margin-top: -8px; margin-bottom: 16px; font-size: 0.92em; }}
.section-image {{ width: 100%; border-radius: 10px; margin-bottom: 18px; }}
.arch-figure {{ text-align: center; margin-bottom: 20px; }}
.arch-figure img {{ max-width: 100%; border-radius: 8px; border: 1px solid var(--border); }}
.arch-subtitle {{ color: var(--primary); margin: 20px 0 10px; }}
.step-title {{ color: var(--text-heading); margin: 14px 0 8px; }}
.innovations-list, .detail-list {{ padding-left: 1.3em; }}
.innovations-list li, .detail-list li {{ margin-bottom: 0.7em; }}
.qa-item {{ border-left: 3px solid var(--primary); padding: 10px 16px; margin-bottom: 16px; background: #FAFAFA; border-radius: 0 8px 8px 0; }}
.qa-question {{ font-weight: 600; color: var(--text-heading); margin-bottom: 6px; }}
.qa-num {{ color: var(--primary); margin-right: 8px; }}
.paper-link {{ color: var(--primary); font-weight: 600; text-decoration: none; }}
.paper-link:hover {{ text-decoration: underline; }}
footer {{ text-align: center; color: var(--text-muted); font-size: 0.85em; padding: 20px 0 10px; }}
@media (max-width: 768px) {{
    body {{ font-size: 15px; }}
    .hero {{ padding: 36px 26px; }}
    .card {{ padding: 24px 20px; }}
}}
</style>
</head>
<body>
<div class="container">
<header class="hero">
{hero_img}
<div class="hero-content">
<h1>{page_title}</h1>
<div class="meta">
<span>{authors}</span>
<span>{published}</span>
<span>{category}</span>
<span>{reading_time} {min_read}</span>
</div>
<p class="paper-title">{original_title}</p>
</div>
</header>
{body_sections}<footer>{footer}</footer>
</div>
</body>
</html>
"#,
        min_read = l.min_read,
        original_title = escape_html(&metadata.title),
        footer = l.footer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn meta() -> PaperMetadata {
        PaperMetadata {
            arxiv_id: "1512.03385".into(),
            title: "Deep Residual Learning".into(),
            authors: vec!["Kaiming He".into(), "Xiangyu Zhang".into()],
            abstract_text: "Deeper networks are harder to train. ".repeat(40),
            pdf_url: "https://arxiv.org/pdf/1512.03385.pdf".into(),
            published: None,
            updated: None,
            categories: vec!["cs.CV".into()],
            primary_category: "cs.CV".into(),
            comment: String::new(),
            journal_ref: String::new(),
            doi: String::new(),
        }
    }

    #[test]
    fn author_formatting_tiers() {
        let names = |n: usize| -> Vec<String> { (0..n).map(|i| format!("A{i}")).collect() };
        assert_eq!(format_authors(&[]), "Unknown");
        assert_eq!(format_authors(&names(1)), "A0");
        assert_eq!(format_authors(&names(2)), "A0 and A1");
        assert_eq!(format_authors(&names(3)), "A0, A1, and A2");
        assert_eq!(format_authors(&names(8)), "A0 et al. (8 authors)");
    }

    #[test]
    fn reading_time_has_floor_of_one() {
        assert_eq!(estimate_reading_time("three short words"), 1);
        let long = "word ".repeat(1000);
        assert_eq!(estimate_reading_time(&long), 5);
    }

    #[test]
    fn output_filename_embeds_id_language_timestamp() {
        let now = chrono::Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let name = output_filename("1512.03385", Language::En, now);
        assert_eq!(name, "1512.03385_en_20260102_030405.html");
    }

    #[test]
    fn document_contains_sections_with_content() {
        let bundle = NarrativeBundle {
            viral_title: "<p>A catchy headline</p>".into(),
            hook_intro: "<p>hook</p>".into(),
            problem_statement: "<p>problem</p>".into(),
            solution_overview: "<p>solution</p>".into(),
            architecture_description: "<p>arch</p>".into(),
            key_innovations: "1. Idea: detail".into(),
            applications: "1. Use: detail".into(),
            ten_questions: "Q1. What? Answer.".into(),
            reviewer_perspective: "🔴 weakness".into(),
            improvements: "1. more data".into(),
        };
        let html = build_document(
            &meta(),
            &bundle,
            None,
            &IllustrationSet::default(),
            Language::En,
        );
        assert!(html.contains("<title>A catchy headline</title>"));
        assert!(html.contains("Architecture Deep Dive"));
        assert!(html.contains("qa-item"));
        assert!(html.contains("https://arxiv.org/abs/1512.03385"));
        assert!(html.contains("Kaiming He and Xiangyu Zhang"));
        // No broken img tags for absent illustrations.
        assert!(!html.contains(r#"src=""#));
    }

    #[test]
    fn empty_sections_are_skipped() {
        let bundle = NarrativeBundle::default();
        let html = build_document(
            &meta(),
            &bundle,
            None,
            &IllustrationSet::default(),
            Language::En,
        );
        // Headline falls back to the paper title.
        assert!(html.contains("<title>Deep Residual Learning</title>"));
        assert!(!html.contains("Solution Overview"));
        // The read-more card is always present.
        assert!(html.contains("Read More"));
    }

    #[test]
    fn metadata_is_html_escaped() {
        let mut m = meta();
        m.title = "Attention <is> all & more".into();
        let html = build_document(
            &m,
            &NarrativeBundle::default(),
            None,
            &IllustrationSet::default(),
            Language::En,
        );
        assert!(html.contains("Attention &lt;is&gt; all &amp; more"));
    }
}
