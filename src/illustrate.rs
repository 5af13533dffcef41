//! Illustration generation with a primary/fallback model policy.
//!
//! Three art slots per paper: a wide hero banner plus square intro and
//! problem illustrations. The intro and problem prompts are produced in two
//! stages — a text-model call first compresses the narrative into one
//! concrete visual scene, then the scene drives the image model — because
//! image models draw concrete scenes far better than abstract prose.
//!
//! Each slot tries the image-capable Gemini model once, then Imagen once,
//! then gives up with `None`; an empty slot just leaves a gap in the page.

use crate::config::StorytellerConfig;
use crate::error::StorytellerError;
use crate::gemini::GeminiClient;
use crate::narrative::NarrativeBundle;
use crate::prompts;
use crate::richtext::strip_preambles;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Generated art, one optional path per document slot.
#[derive(Debug, Default)]
pub struct IllustrationSet {
    pub hero: Option<PathBuf>,
    pub intro: Option<PathBuf>,
    pub problem: Option<PathBuf>,
}

impl IllustrationSet {
    pub fn count(&self) -> usize {
        [&self.hero, &self.intro, &self.problem]
            .iter()
            .filter(|p| p.is_some())
            .count()
    }
}

/// Illustration generator for one run.
pub struct IllustrationGenerator<'a> {
    gemini: &'a GeminiClient,
    images_dir: PathBuf,
    use_cache: bool,
}

impl<'a> IllustrationGenerator<'a> {
    pub fn new(gemini: &'a GeminiClient, config: &StorytellerConfig) -> Self {
        Self {
            gemini,
            images_dir: config.images_dir(),
            use_cache: config.use_image_cache,
        }
    }

    /// Generate all three slots for a paper.
    pub async fn generate_all(
        &self,
        arxiv_id: &str,
        paper_title: &str,
        bundle: &NarrativeBundle,
    ) -> IllustrationSet {
        let mut set = IllustrationSet::default();

        if let Err(e) = std::fs::create_dir_all(&self.images_dir) {
            warn!(
                "Cannot create {}: {e}; skipping illustrations",
                self.images_dir.display()
            );
            return set;
        }

        info!("  [1/3] Generating hero banner…");
        set.hero = self
            .generate(
                &prompts::hero_illustration(paper_title),
                &format!("hero_{arxiv_id}.png"),
                "16:9",
            )
            .await;

        info!("  [2/3] Generating intro illustration…");
        let intro_scene = self
            .design_scene(
                &prompts::intro_scene(&bundle.hook_intro),
                prompts::DEFAULT_INTRO_SCENE,
            )
            .await;
        set.intro = self
            .generate(
                &prompts::intro_illustration(&intro_scene),
                &format!("intro_{arxiv_id}.png"),
                "1:1",
            )
            .await;

        info!("  [3/3] Generating problem illustration…");
        let problem_scene = self
            .design_scene(
                &prompts::problem_scene(&bundle.problem_statement),
                prompts::DEFAULT_PROBLEM_SCENE,
            )
            .await;
        set.problem = self
            .generate(
                &prompts::problem_illustration(&problem_scene),
                &format!("problem_{arxiv_id}.png"),
                "1:1",
            )
            .await;

        info!("Generated {} illustration(s)", set.count());
        set
    }

    /// Compress narrative text into a one-line visual scene; fixed fallback
    /// scene when the call fails.
    async fn design_scene(&self, scene_prompt: &str, fallback: &str) -> String {
        match self.gemini.generate_text(scene_prompt).await {
            Ok(text) => {
                let scene = clip_chars(&strip_preambles(&text), 150);
                debug!("Scene: {scene}");
                scene
            }
            Err(e) => {
                warn!("Scene design failed, using stock scene: {e}");
                fallback.to_string()
            }
        }
    }

    /// One slot: cache check, primary attempt, fallback attempt, give up.
    pub async fn generate(
        &self,
        prompt: &str,
        filename: &str,
        aspect_ratio: &str,
    ) -> Option<PathBuf> {
        if self.use_cache {
            let cached = self.cache_path(prompt);
            if cached.exists() {
                info!("Using cached illustration: {}", cached.display());
                return Some(cached);
            }
        }

        let bytes = match self.gemini.generate_image(prompt, aspect_ratio).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Primary image model failed ({filename}): {e}");
                match self.gemini.generate_image_fallback(prompt).await {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!("Fallback image model also failed ({filename}): {e}");
                        return None;
                    }
                }
            }
        };

        let path = self.images_dir.join(filename);
        if let Err(e) = write_image(&path, &bytes) {
            warn!("Could not persist illustration: {e}");
            return None;
        }
        if self.use_cache {
            // Best-effort cache copy keyed by prompt hash.
            let _ = std::fs::copy(&path, self.cache_path(prompt));
        }
        Some(path)
    }

    fn cache_path(&self, prompt: &str) -> PathBuf {
        let digest = format!("{:x}", md5::compute(prompt.as_bytes()));
        self.images_dir.join(format!("img_{}.png", &digest[..12]))
    }
}

fn write_image(path: &Path, bytes: &[u8]) -> Result<(), StorytellerError> {
    std::fs::write(path, bytes).map_err(|e| StorytellerError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

fn clip_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_set_counts_zero() {
        assert_eq!(IllustrationSet::default().count(), 0);
    }

    #[test]
    fn set_counts_present_slots() {
        let set = IllustrationSet {
            hero: Some(PathBuf::from("h.png")),
            intro: None,
            problem: Some(PathBuf::from("p.png")),
        };
        assert_eq!(set.count(), 2);
    }

    #[test]
    fn clip_chars_respects_boundaries() {
        assert_eq!(clip_chars("abcdef", 3), "abc");
        assert_eq!(clip_chars("深度学习模型", 2), "深度");
    }
}
