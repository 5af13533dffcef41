//! # paper-storyteller
//!
//! Turn an arXiv paper into a narrated, self-contained web page.
//!
//! ## Why this crate?
//!
//! Reading a paper cold is slow. This crate builds a guided story around
//! one: it pulls the paper's own architecture diagram out of the PDF with a
//! layout-detection model, asks a generative model to narrate the problem,
//! the method, and the critique, paints a few illustrations, and folds
//! everything into a single HTML file with every image inlined.
//!
//! ## Pipeline Overview
//!
//! ```text
//! arXiv ID
//!  │
//!  ├─ 1. Fetch      metadata + PDF from the export API
//!  ├─ 2. Figures    rasterise pages, detect image regions, score & crop
//!  ├─ 3. Method     carve the Method section out of the text layer
//!  ├─ 4. Narrative  ~10 text-generation calls (one multimodal)
//!  ├─ 5. Art        hero / intro / problem illustrations with fallback
//!  └─ 6. Assemble   one self-contained HTML page
//! ```
//!
//! The interesting part is step 2: given every image-like region detected
//! across the first pages, a positional/geometric heuristic picks the one
//! most likely to be the paper's main architecture diagram (see
//! [`extract::score_figure`]).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paper_storyteller::{tell_story, Language, StorytellerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = StorytellerConfig::builder()
//!         .language(Language::En)
//!         .api_key(std::env::var("GEMINI_API_KEY")?)
//!         .build()?;
//!     let output = tell_story("https://arxiv.org/abs/1512.03385", &config).await?;
//!     println!("{}", output.html_path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `storyteller` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! paper-storyteller = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod arxiv;
pub mod assemble;
pub mod config;
pub mod error;
pub mod extract;
pub mod gemini;
pub mod illustrate;
pub mod method;
pub mod narrative;
pub mod prompts;
pub mod richtext;
pub mod story;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use arxiv::{extract_arxiv_id, ArxivClient, PaperMetadata};
pub use config::{Language, StorytellerConfig, StorytellerConfigBuilder};
pub use error::StorytellerError;
pub use extract::{ExtractionResult, FigureCandidate, FigureExtractor, LayoutDetector};
pub use illustrate::IllustrationSet;
pub use narrative::NarrativeBundle;
pub use story::{tell_story, StoryOutput};
