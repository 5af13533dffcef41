//! Top-level orchestration: one paper in, one HTML file out.
//!
//! The run is strictly sequential — each stage consumes the previous
//! stage's output (the figure and Method text feed the architecture
//! narrative, the narrative feeds the illustration scenes). CPU-bound
//! pdfium/ONNX work runs under `spawn_blocking`; everything network-bound
//! is awaited one call at a time.

use crate::arxiv::{ArxivClient, PaperMetadata};
use crate::assemble::{build_document, output_filename};
use crate::config::StorytellerConfig;
use crate::error::StorytellerError;
use crate::extract::{ExtractionResult, FigureExtractor};
use crate::gemini::GeminiClient;
use crate::illustrate::IllustrationGenerator;
use crate::method;
use crate::narrative::generate_narrative;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// Result of a completed run.
#[derive(Debug)]
pub struct StoryOutput {
    /// The generated, self-contained HTML page.
    pub html_path: PathBuf,
    /// Paper metadata as fetched.
    pub metadata: PaperMetadata,
    /// How many figure candidates the extractor persisted.
    pub figures_extracted: usize,
    /// How many of the three illustration slots were filled.
    pub illustrations_generated: usize,
    /// Wall-clock duration of the whole run.
    pub duration_ms: u64,
}

/// Turn an arXiv identifier or URL into a narrated web page.
///
/// # Errors
/// Fatal conditions only: unknown paper, missing credential, missing
/// detector model, download or document I/O failure. Individual narrative
/// or illustration failures degrade their section and do not surface here.
pub async fn tell_story(
    input: &str,
    config: &StorytellerConfig,
) -> Result<StoryOutput, StorytellerError> {
    let start = Instant::now();

    // Fail on a missing credential before any network or model work.
    let gemini = GeminiClient::new(config)?;

    // ── Step 1: Fetch paper ──────────────────────────────────────────────
    info!("Step 1/6: fetching paper {input}");
    let arxiv = ArxivClient::new(&config.temp_dir, config.download_timeout_secs)?;
    let (metadata, pdf_path) = arxiv.fetch_and_download(input).await?;

    // ── Step 2: Extract figures ──────────────────────────────────────────
    info!("Step 2/6: extracting figures");
    let extraction = {
        let config = config.clone();
        let pdf_path = pdf_path.clone();
        tokio::task::spawn_blocking(move || -> Result<ExtractionResult, StorytellerError> {
            let mut extractor = FigureExtractor::new(&config)?;
            extractor.extract(&pdf_path)
        })
        .await
        .map_err(|e| StorytellerError::Internal(format!("extraction task panicked: {e}")))??
    };

    // ── Step 3: Locate the Method section ────────────────────────────────
    info!("Step 3/6: locating the Method section");
    let method_text = {
        let pdf_path = pdf_path.clone();
        tokio::task::spawn_blocking(move || method::extract_method_section(&pdf_path))
            .await
            .map_err(|e| StorytellerError::Internal(format!("method task panicked: {e}")))?
    };
    match &method_text {
        Some(t) => info!("Method section located ({} chars)", t.len()),
        None => info!("No Method section; the narrative will lean on the abstract"),
    }

    // ── Step 4: Generate narrative ───────────────────────────────────────
    info!("Step 4/6: generating narrative ({})", config.language.code());
    let bundle = generate_narrative(
        &gemini,
        config.language,
        &metadata.title,
        &metadata.abstract_text,
        method_text.as_deref(),
        extraction.main_figure.as_deref(),
    )
    .await;

    // ── Step 5: Generate illustrations ───────────────────────────────────
    info!("Step 5/6: generating illustrations");
    let illustrator = IllustrationGenerator::new(&gemini, config);
    let illustrations = illustrator
        .generate_all(&metadata.arxiv_id, &metadata.title, &bundle)
        .await;

    // ── Step 6: Assemble the page ────────────────────────────────────────
    info!("Step 6/6: assembling the page");
    let html = build_document(
        &metadata,
        &bundle,
        extraction.main_figure.as_deref(),
        &illustrations,
        config.language,
    );

    std::fs::create_dir_all(&config.output_dir).map_err(|e| {
        StorytellerError::OutputWriteFailed {
            path: config.output_dir.clone(),
            source: e,
        }
    })?;
    let html_path = config
        .output_dir
        .join(output_filename(&metadata.arxiv_id, config.language, chrono::Local::now()));
    std::fs::write(&html_path, &html).map_err(|e| StorytellerError::OutputWriteFailed {
        path: html_path.clone(),
        source: e,
    })?;

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        "Done: {} ({} figures, {} illustrations, {duration_ms}ms)",
        html_path.display(),
        extraction.total,
        illustrations.count()
    );

    Ok(StoryOutput {
        html_path,
        metadata,
        figures_extracted: extraction.total,
        illustrations_generated: illustrations.count(),
        duration_ms,
    })
}
