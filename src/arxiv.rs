//! arXiv access: identifier extraction, metadata fetch, PDF download.
//!
//! Metadata comes from the arXiv export Atom API
//! (`https://export.arxiv.org/api/query`). The feed is parsed with
//! quick-xml events rather than a full feed crate — the subset of Atom
//! that arXiv emits is small and stable.
//!
//! Downloads are persisted under a caller-chosen directory keyed by the
//! arXiv ID; re-running the same paper reuses the file on disk instead of
//! hitting the export mirror again.

use crate::error::StorytellerError;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

const EXPORT_API: &str = "https://export.arxiv.org/api/query";

/// Everything the export API reports about one paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub arxiv_id: String,
    pub title: String,
    pub authors: Vec<String>,
    pub abstract_text: String,
    pub pdf_url: String,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub categories: Vec<String>,
    pub primary_category: String,
    pub comment: String,
    pub journal_ref: String,
    pub doi: String,
}

impl PaperMetadata {
    /// Link to the human-readable abstract page.
    pub fn abs_url(&self) -> String {
        format!("https://arxiv.org/abs/{}", self.arxiv_id)
    }
}

static RE_BARE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}\.\d{4,5}(v\d+)?$").expect("valid regex"));

// Ordered: URL forms first so the bare fallback cannot grab a digit run
// from an unrelated part of the string.
static RE_ID_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"arxiv\.org/abs/(\d{4}\.\d{4,5}(?:v\d+)?)",
        r"arxiv\.org/pdf/(\d{4}\.\d{4,5}(?:v\d+)?)",
        r"(\d{4}\.\d{4,5}(?:v\d+)?)",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid regex"))
    .collect()
});

/// Extract an arXiv ID from a URL or return the ID if already bare.
///
/// ```
/// use paper_storyteller::arxiv::extract_arxiv_id;
///
/// assert_eq!(extract_arxiv_id("1512.03385").unwrap(), "1512.03385");
/// assert_eq!(
///     extract_arxiv_id("https://arxiv.org/abs/1512.03385").unwrap(),
///     "1512.03385"
/// );
/// ```
pub fn extract_arxiv_id(url_or_id: &str) -> Result<String, StorytellerError> {
    if RE_BARE_ID.is_match(url_or_id) {
        return Ok(url_or_id.to_string());
    }
    for pattern in RE_ID_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(url_or_id) {
            return Ok(caps[1].to_string());
        }
    }
    Err(StorytellerError::InvalidArxivId {
        input: url_or_id.to_string(),
    })
}

/// Strip characters that are unsafe in file names; spaces become underscores.
pub fn sanitize_filename(name: &str) -> String {
    let mut out: String = name
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();
    out.truncate(200);
    out
}

/// Client for the arXiv export API.
pub struct ArxivClient {
    client: reqwest::Client,
    temp_dir: PathBuf,
}

impl ArxivClient {
    /// Build a client that stores downloaded PDFs under `temp_dir`.
    pub fn new(temp_dir: impl Into<PathBuf>, timeout_secs: u64) -> Result<Self, StorytellerError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("paper-storyteller/0.3 (academic tooling)")
            .build()
            .map_err(|e| StorytellerError::Internal(format!("http client: {e}")))?;

        Ok(Self {
            client,
            temp_dir: temp_dir.into(),
        })
    }

    /// Fetch metadata for a single paper by URL or ID.
    ///
    /// Fatal [`StorytellerError::PaperNotFound`] when the feed contains no
    /// entry for the ID.
    pub async fn fetch_paper(&self, url_or_id: &str) -> Result<PaperMetadata, StorytellerError> {
        let arxiv_id = extract_arxiv_id(url_or_id)?;
        info!("Fetching metadata for arXiv ID: {arxiv_id}");

        let url = format!("{EXPORT_API}?id_list={arxiv_id}&max_results=1");
        let xml = self.get_text(&url).await?;

        let mut entries = parse_atom_feed(&xml)?;
        let mut meta = entries
            .pop()
            .ok_or(StorytellerError::PaperNotFound {
                arxiv_id: arxiv_id.clone(),
            })?;
        // An id_list query on an unknown ID yields an entry with empty title.
        if meta.title.is_empty() {
            return Err(StorytellerError::PaperNotFound { arxiv_id });
        }
        meta.arxiv_id = arxiv_id;

        info!(
            "Fetched: {} ({} authors)",
            truncate(&meta.title, 60),
            meta.authors.len()
        );
        Ok(meta)
    }

    /// Relevance-sorted free-text search over the export API.
    pub async fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> Result<Vec<PaperMetadata>, StorytellerError> {
        let q = query.replace(' ', "+");
        let url = format!(
            "{EXPORT_API}?search_query=all:{q}&start=0&max_results={max_results}&sortBy=relevance"
        );
        debug!("Searching arXiv: {url}");
        let xml = self.get_text(&url).await?;
        parse_atom_feed(&xml)
    }

    /// Download the paper's PDF to `{temp_dir}/{id}.pdf`.
    ///
    /// Short-circuits when a file of that name already exists. Validates the
    /// `%PDF` magic before returning so downstream pdfium calls fail here,
    /// with a useful message, instead of deep inside the renderer.
    pub async fn download_pdf(
        &self,
        pdf_url: &str,
        arxiv_id: &str,
    ) -> Result<PathBuf, StorytellerError> {
        let pdf_path = self.temp_dir.join(format!("{}.pdf", sanitize_filename(arxiv_id)));

        if pdf_path.exists() {
            info!("PDF already exists: {}", pdf_path.display());
            return Ok(pdf_path);
        }

        std::fs::create_dir_all(&self.temp_dir).map_err(|e| {
            StorytellerError::OutputWriteFailed {
                path: self.temp_dir.clone(),
                source: e,
            }
        })?;

        info!("Downloading PDF from {pdf_url}");
        let response = self
            .client
            .get(pdf_url)
            .send()
            .await
            .map_err(|e| StorytellerError::DownloadFailed {
                url: pdf_url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(StorytellerError::DownloadFailed {
                url: pdf_url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorytellerError::DownloadFailed {
                url: pdf_url.to_string(),
                reason: e.to_string(),
            })?;

        if bytes.len() >= 4 && &bytes[..4] != b"%PDF" {
            let mut magic = [0u8; 4];
            magic.copy_from_slice(&bytes[..4]);
            return Err(StorytellerError::NotAPdf {
                path: pdf_path,
                magic,
            });
        }

        tokio::fs::write(&pdf_path, &bytes)
            .await
            .map_err(|e| StorytellerError::OutputWriteFailed {
                path: pdf_path.clone(),
                source: e,
            })?;

        info!(
            "Downloaded PDF: {} ({:.2} MB)",
            pdf_path.display(),
            bytes.len() as f64 / (1024.0 * 1024.0)
        );
        Ok(pdf_path)
    }

    /// Fetch metadata and download the PDF in one step.
    pub async fn fetch_and_download(
        &self,
        url_or_id: &str,
    ) -> Result<(PaperMetadata, PathBuf), StorytellerError> {
        let meta = self.fetch_paper(url_or_id).await?;
        let pdf_path = self.download_pdf(&meta.pdf_url, &meta.arxiv_id).await?;
        Ok((meta, pdf_path))
    }

    async fn get_text(&self, url: &str) -> Result<String, StorytellerError> {
        let response =
            self.client
                .get(url)
                .send()
                .await
                .map_err(|e| StorytellerError::DownloadFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| StorytellerError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        if !status.is_success() {
            return Err(StorytellerError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            });
        }
        Ok(text)
    }
}

/// Parse every `<entry>` of an arXiv Atom feed.
fn parse_atom_feed(xml: &str) -> Result<Vec<PaperMetadata>, StorytellerError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut papers = Vec::new();
    let mut entry: Option<EntryBuilder> = None;
    let mut in_author = false;
    // Name of the element whose text we are currently inside.
    let mut current: Vec<u8> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                match name.as_slice() {
                    b"entry" => entry = Some(EntryBuilder::default()),
                    b"author" => in_author = true,
                    _ => {}
                }
                current = name;
            }
            Ok(Event::Empty(e)) => {
                if let Some(ref mut entry) = entry {
                    match e.name().as_ref() {
                        b"category" => {
                            if let Some(term) = attribute(&e, "term") {
                                entry.categories.push(term);
                            }
                        }
                        b"arxiv:primary_category" => {
                            if let Some(term) = attribute(&e, "term") {
                                entry.primary_category = term;
                            }
                        }
                        b"link" => {
                            let is_pdf = attribute(&e, "title").as_deref() == Some("pdf")
                                || attribute(&e, "type").as_deref() == Some("application/pdf");
                            if is_pdf {
                                if let Some(href) = attribute(&e, "href") {
                                    entry.pdf_url = href;
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let Some(ref mut entry) = entry {
                    let text = t
                        .unescape()
                        .map_err(|e| StorytellerError::Internal(format!("atom feed: {e}")))?
                        .into_owned();
                    if in_author && current.as_slice() == b"name" {
                        entry.authors.push(text.trim().to_string());
                    } else {
                        entry.set_field(&current, &text);
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"entry" => {
                    if let Some(builder) = entry.take() {
                        papers.push(builder.finish());
                    }
                }
                b"author" => in_author = false,
                _ => current.clear(),
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(StorytellerError::Internal(format!(
                    "atom feed parse error: {e}"
                )))
            }
            _ => {}
        }
    }

    Ok(papers)
}

fn attribute(e: &quick_xml::events::BytesStart<'_>, name: &str) -> Option<String> {
    e.try_get_attribute(name)
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

#[derive(Default)]
struct EntryBuilder {
    id: String,
    title: String,
    summary: String,
    published: String,
    updated: String,
    authors: Vec<String>,
    categories: Vec<String>,
    primary_category: String,
    pdf_url: String,
    comment: String,
    journal_ref: String,
    doi: String,
}

impl EntryBuilder {
    fn set_field(&mut self, element: &[u8], text: &str) {
        let slot = match element {
            b"id" => &mut self.id,
            b"title" => &mut self.title,
            b"summary" => &mut self.summary,
            b"published" => &mut self.published,
            b"updated" => &mut self.updated,
            b"arxiv:comment" => &mut self.comment,
            b"arxiv:journal_ref" => &mut self.journal_ref,
            b"arxiv:doi" => &mut self.doi,
            _ => return,
        };
        if !slot.is_empty() {
            slot.push(' ');
        }
        slot.push_str(text.trim());
    }

    fn finish(self) -> PaperMetadata {
        // The feed id carries the version (".../abs/1512.03385v1"); strip
        // the URL prefix to recover a usable ID when the caller searched.
        let arxiv_id = self
            .id
            .rsplit("/abs/")
            .next()
            .unwrap_or(&self.id)
            .to_string();

        let pdf_url = if self.pdf_url.is_empty() {
            format!("https://arxiv.org/pdf/{arxiv_id}.pdf")
        } else {
            self.pdf_url
        };

        PaperMetadata {
            arxiv_id,
            title: collapse_whitespace(&self.title),
            authors: self.authors,
            abstract_text: collapse_whitespace(&self.summary),
            pdf_url,
            published: parse_timestamp(&self.published),
            updated: parse_timestamp(&self.updated),
            categories: self.categories,
            primary_category: self.primary_category,
            comment: self.comment,
            journal_ref: self.journal_ref,
            doi: self.doi,
        }
    }
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    match DateTime::parse_from_rfc3339(s) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            warn!("Unparseable feed timestamp '{s}': {e}");
            None
        }
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect::<String>() + "…"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_extraction_is_idempotent_across_forms() {
        for input in [
            "1512.03385",
            "https://arxiv.org/abs/1512.03385",
            "https://arxiv.org/pdf/1512.03385.pdf",
        ] {
            assert_eq!(extract_arxiv_id(input).unwrap(), "1512.03385", "{input}");
        }
    }

    #[test]
    fn id_extraction_keeps_version_suffix() {
        assert_eq!(extract_arxiv_id("1512.03385v2").unwrap(), "1512.03385v2");
        assert_eq!(
            extract_arxiv_id("https://arxiv.org/abs/2103.00020v1").unwrap(),
            "2103.00020v1"
        );
    }

    #[test]
    fn id_extraction_rejects_garbage() {
        assert!(extract_arxiv_id("not-a-paper").is_err());
        assert!(extract_arxiv_id("").is_err());
    }

    #[test]
    fn sanitize_strips_unsafe_characters() {
        assert_eq!(sanitize_filename("a/b:c*d"), "abcd");
        assert_eq!(sanitize_filename("hello world"), "hello_world");
    }

    const SAMPLE_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/1512.03385v1</id>
    <updated>2015-12-10T18:29:55Z</updated>
    <published>2015-12-10T18:29:55Z</published>
    <title>Deep Residual Learning for Image
 Recognition</title>
    <summary>Deeper neural networks are more difficult to train.</summary>
    <author><name>Kaiming He</name></author>
    <author><name>Xiangyu Zhang</name></author>
    <arxiv:comment xmlns:arxiv="http://arxiv.org/schemas/atom">Tech report</arxiv:comment>
    <link title="pdf" href="http://arxiv.org/pdf/1512.03385v1" rel="related" type="application/pdf"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cs.CV"/>
    <category term="cs.CV" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    #[test]
    fn parses_atom_entry() {
        let papers = parse_atom_feed(SAMPLE_FEED).unwrap();
        assert_eq!(papers.len(), 1);
        let p = &papers[0];
        assert_eq!(p.arxiv_id, "1512.03385v1");
        assert_eq!(p.title, "Deep Residual Learning for Image Recognition");
        assert_eq!(p.authors, vec!["Kaiming He", "Xiangyu Zhang"]);
        assert_eq!(p.pdf_url, "http://arxiv.org/pdf/1512.03385v1");
        assert_eq!(p.primary_category, "cs.CV");
        assert_eq!(p.comment, "Tech report");
        assert!(p.published.is_some());
    }

    #[test]
    fn empty_feed_yields_no_papers() {
        let papers = parse_atom_feed(
            r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom"></feed>"#,
        )
        .unwrap();
        assert!(papers.is_empty());
    }
}
