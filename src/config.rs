//! Configuration for a storytelling run.
//!
//! All behaviour is controlled through [`StorytellerConfig`], built via its
//! [`StorytellerConfigBuilder`]. Keeping every knob in one struct makes it
//! trivial to log a run's configuration and to diff two runs when their
//! outputs differ.

use crate::error::StorytellerError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output language for the generated narrative and page labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    /// Simplified Chinese (default).
    #[default]
    Zh,
    /// English.
    En,
}

impl Language {
    /// Short code used in prompts, the `<html lang>` attribute, and file names.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
        }
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zh" | "zh-cn" | "chinese" => Ok(Language::Zh),
            "en" | "english" => Ok(Language::En),
            other => Err(format!("unknown language '{other}' (expected zh or en)")),
        }
    }
}

/// Configuration for one paper → web page run.
///
/// Built via [`StorytellerConfig::builder()`] or [`StorytellerConfig::default()`].
///
/// # Example
/// ```rust
/// use paper_storyteller::{Language, StorytellerConfig};
///
/// let config = StorytellerConfig::builder()
///     .language(Language::En)
///     .max_pages(8)
///     .api_key("AIza...")
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct StorytellerConfig {
    /// Output language. Default: [`Language::Zh`].
    pub language: Language,

    /// Root output directory. Figures land in `figures/`, generated art in
    /// `images/`, the HTML page at the top level. Default: `output`.
    pub output_dir: PathBuf,

    /// Directory where downloaded PDFs are kept. Re-running the same paper
    /// reuses the file instead of re-downloading. Default: `temp`.
    pub temp_dir: PathBuf,

    /// Directory containing the layout-detection model artifacts.
    /// Default: `models/doclayout`.
    pub model_dir: PathBuf,

    /// Hard page cutoff for figure extraction. Pages beyond this are never
    /// rendered or scanned — a cost bound for very long documents, not a
    /// best-effort limit. Range: 1–50. Default: 10.
    pub max_pages: usize,

    /// Rendering DPI for page rasters. Crops are taken directly from this
    /// raster without re-rendering, so it needs to be high enough that the
    /// selected figure is print quality. Range: 72–600. Default: 300.
    pub dpi: u32,

    /// Pixel padding added on every side of a detected figure box before
    /// the crop is clipped back to the raster bounds. Default: 5.
    pub crop_padding: u32,

    /// Minimum detector confidence for a region to be considered at all.
    /// Default: 0.3.
    pub confidence_threshold: f32,

    /// Gemini API key. Resolved by the CLI from `--api-key` or the
    /// `GEMINI_API_KEY`/`GOOGLE_API_KEY` environment variables.
    pub api_key: String,

    /// Text-generation model identifier. Default: `gemini-2.0-flash-exp`.
    pub text_model: String,

    /// Primary image-generation model (Gemini image modality).
    /// Default: `gemini-2.5-flash-image`.
    pub image_model: String,

    /// Fallback image-generation model (Imagen predict API).
    /// Default: `imagen-4.0-generate-001`.
    pub image_fallback_model: String,

    /// PDF download timeout in seconds. Default: 60.
    pub download_timeout_secs: u64,

    /// Per-generation-call timeout in seconds. Default: 120.
    pub api_timeout_secs: u64,

    /// Reuse a previously generated illustration when an identical prompt
    /// has already produced one on disk. Default: true.
    pub use_image_cache: bool,
}

impl Default for StorytellerConfig {
    fn default() -> Self {
        Self {
            language: Language::default(),
            output_dir: PathBuf::from("output"),
            temp_dir: PathBuf::from("temp"),
            model_dir: PathBuf::from("models/doclayout"),
            max_pages: 10,
            dpi: 300,
            crop_padding: 5,
            confidence_threshold: 0.3,
            api_key: String::new(),
            text_model: "gemini-2.0-flash-exp".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            image_fallback_model: "imagen-4.0-generate-001".to_string(),
            download_timeout_secs: 60,
            api_timeout_secs: 120,
            use_image_cache: true,
        }
    }
}

impl StorytellerConfig {
    /// Create a new builder.
    pub fn builder() -> StorytellerConfigBuilder {
        StorytellerConfigBuilder {
            config: Self::default(),
        }
    }

    /// Directory for cropped figure artifacts.
    pub fn figures_dir(&self) -> PathBuf {
        self.output_dir.join("figures")
    }

    /// Directory for generated illustration artifacts.
    pub fn images_dir(&self) -> PathBuf {
        self.output_dir.join("images")
    }
}

/// Builder for [`StorytellerConfig`].
#[derive(Debug)]
pub struct StorytellerConfigBuilder {
    config: StorytellerConfig,
}

impl StorytellerConfigBuilder {
    pub fn language(mut self, lang: Language) -> Self {
        self.config.language = lang;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = dir.into();
        self
    }

    pub fn model_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.model_dir = dir.into();
        self
    }

    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n.clamp(1, 50);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 600);
        self
    }

    pub fn crop_padding(mut self, px: u32) -> Self {
        self.config.crop_padding = px;
        self
    }

    pub fn confidence_threshold(mut self, t: f32) -> Self {
        self.config.confidence_threshold = t.clamp(0.0, 1.0);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn text_model(mut self, model: impl Into<String>) -> Self {
        self.config.text_model = model.into();
        self
    }

    pub fn image_model(mut self, model: impl Into<String>) -> Self {
        self.config.image_model = model.into();
        self
    }

    pub fn image_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.config.image_fallback_model = model.into();
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn use_image_cache(mut self, v: bool) -> Self {
        self.config.use_image_cache = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<StorytellerConfig, StorytellerError> {
        let c = &self.config;
        if c.max_pages == 0 {
            return Err(StorytellerError::InvalidConfig(
                "max_pages must be ≥ 1".into(),
            ));
        }
        if c.dpi < 72 || c.dpi > 600 {
            return Err(StorytellerError::InvalidConfig(format!(
                "DPI must be 72–600, got {}",
                c.dpi
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let c = StorytellerConfig::builder().build().unwrap();
        assert_eq!(c.language, Language::Zh);
        assert_eq!(c.max_pages, 10);
        assert_eq!(c.dpi, 300);
    }

    #[test]
    fn builder_clamps_ranges() {
        let c = StorytellerConfig::builder()
            .max_pages(500)
            .dpi(10_000)
            .confidence_threshold(3.0)
            .build()
            .unwrap();
        assert_eq!(c.max_pages, 50);
        assert_eq!(c.dpi, 600);
        assert_eq!(c.confidence_threshold, 1.0);
    }

    #[test]
    fn language_parses_common_forms() {
        assert_eq!("zh".parse::<Language>().unwrap(), Language::Zh);
        assert_eq!("EN".parse::<Language>().unwrap(), Language::En);
        assert!("fr".parse::<Language>().is_err());
    }
}
