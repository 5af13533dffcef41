//! Figure extraction pipeline.
//!
//! Each submodule implements exactly one stage; keeping stages separate
//! makes each independently testable and lets the rendering or detection
//! backend change without touching the others.
//!
//! ```text
//! render ──▶ detect ──▶ crop/persist ──▶ score ──▶ rank
//! (pdfium)   (ONNX)     (pad + clamp)    (heuristic)
//! ```
//!
//! 1. [`render`]   — rasterise one page at high DPI; crops are taken from
//!    this raster directly, so the resolution chosen here is the resolution
//!    of the final figure
//! 2. [`detect`]   — ONNX layout detection, normalised to labelled boxes
//! 3. [`pipeline`] — the page loop: crop every image region, persist all of
//!    them, score, and select the main/secondary figures
//! 4. [`score`]    — the pure desirability heuristic

pub mod detect;
pub mod pipeline;
pub mod render;
pub mod score;

pub use detect::{DetectedRegion, LayoutDetector, PageRegions, REQUIRED_MODEL_FILES};
pub use pipeline::{rank_candidates, ExtractionResult, FigureCandidate, FigureExtractor};
pub use score::score_figure;
