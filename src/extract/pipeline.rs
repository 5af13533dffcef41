//! Figure extraction: scan a paper's pages, crop every detected image
//! region, score each one, and pick the figure most likely to be the main
//! architecture/pipeline diagram.
//!
//! Every crop is persisted, not just the winner — when the heuristic picks
//! the wrong figure, the full candidate set on disk is what makes the
//! decision auditable.

use crate::config::StorytellerConfig;
use crate::error::StorytellerError;
use crate::extract::detect::LayoutDetector;
use crate::extract::render;
use crate::extract::score::score_figure;
use image::DynamicImage;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// One cropped, scored figure candidate.
#[derive(Debug, Clone)]
pub struct FigureCandidate {
    /// Path of the persisted crop.
    pub path: PathBuf,
    /// 1-based source page.
    pub page: usize,
    /// Detector box in raster pixels (pre-padding).
    pub bbox: [f32; 4],
    /// Crop width in pixels (post-padding, post-clamp).
    pub width: u32,
    /// Crop height in pixels.
    pub height: u32,
    /// Crop area in pixels.
    pub area: u32,
    /// Detector confidence.
    pub confidence: f32,
    /// Total desirability score.
    pub score: f64,
}

/// Result of scanning one document.
#[derive(Debug, Default)]
pub struct ExtractionResult {
    /// All candidates, ordered by score descending (stable on ties).
    pub figures: Vec<FigureCandidate>,
    /// Top-scoring crop — presumed architecture diagram.
    pub main_figure: Option<PathBuf>,
    /// Runner-up crop.
    pub secondary_figure: Option<PathBuf>,
    /// Total candidate count.
    pub total: usize,
}

/// Figure-extraction pipeline: owns the detector session for the run.
pub struct FigureExtractor {
    detector: LayoutDetector,
    figures_dir: PathBuf,
    max_pages: usize,
    dpi: u32,
    padding: u32,
}

impl FigureExtractor {
    /// Build the extractor, loading the layout model eagerly so a missing
    /// model fails the run before any network or render work happens.
    pub fn new(config: &StorytellerConfig) -> Result<Self, StorytellerError> {
        let detector = LayoutDetector::new(&config.model_dir, config.confidence_threshold)?;
        Ok(Self {
            detector,
            figures_dir: config.figures_dir(),
            max_pages: config.max_pages,
            dpi: config.dpi,
            padding: config.crop_padding,
        })
    }

    /// Scan the document and return the ranked candidate set.
    ///
    /// Pages beyond `max_pages` are never rendered — a hard cost bound.
    /// A page that fails to rasterise is skipped with a warning; detector
    /// errors abort the run since the session is shared by every page.
    pub fn extract(&mut self, pdf_path: &Path) -> Result<ExtractionResult, StorytellerError> {
        std::fs::create_dir_all(&self.figures_dir).map_err(|e| {
            StorytellerError::OutputWriteFailed {
                path: self.figures_dir.clone(),
                source: e,
            }
        })?;

        let pdf_stem = pdf_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let total_pages = render::page_count(pdf_path)?;
        let scan_pages = total_pages.min(self.max_pages);
        info!(
            "Extracting figures from {} ({} of {} pages)",
            pdf_path.display(),
            scan_pages,
            total_pages
        );

        let mut candidates = Vec::new();

        for page_idx in 0..scan_pages {
            let page_image = match render::render_page(pdf_path, page_idx, self.dpi) {
                Ok(img) => img,
                Err(e) => {
                    warn!("Skipping page {}: {e}", page_idx + 1);
                    continue;
                }
            };

            let regions = self.detector.detect(&page_image)?;
            debug!(
                "Page {}: {} image region(s)",
                page_idx + 1,
                regions.figures.len()
            );

            for (img_idx, region) in regions.figures.iter().enumerate() {
                let Some(crop) = crop_region(&page_image, region.bbox, self.padding) else {
                    continue;
                };
                let (width, height) = (crop.width(), crop.height());
                let area = width * height;

                // Score from the cropped pixels, not the detector box: the
                // padding and edge clamping are part of what gets ranked.
                let score = score_figure(page_idx + 1, area, width, height, region.confidence);

                let filename = format!("{pdf_stem}_p{}_img{}.png", page_idx + 1, img_idx + 1);
                let path = self.figures_dir.join(filename);
                save_png(&crop, &path)?;

                debug!(
                    "Saved {} ({}x{}, score {:.1})",
                    path.display(),
                    width,
                    height,
                    score
                );

                candidates.push(FigureCandidate {
                    path,
                    page: page_idx + 1,
                    bbox: region.bbox,
                    width,
                    height,
                    area,
                    confidence: region.confidence,
                    score,
                });
            }
        }

        let result = rank_candidates(candidates);
        info!("Extracted {} figure(s)", result.total);
        if let (Some(main), Some(best)) = (&result.main_figure, result.figures.first()) {
            info!(
                "Main figure: {} (p{}, {}x{}, score {:.1})",
                main.display(),
                best.page,
                best.width,
                best.height,
                best.score
            );
        }
        Ok(result)
    }
}

/// Sort candidates by score descending (stable, so detection order breaks
/// ties) and select the main/secondary figures.
pub fn rank_candidates(mut figures: Vec<FigureCandidate>) -> ExtractionResult {
    figures.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let main_figure = figures.first().map(|f| f.path.clone());
    let secondary_figure = figures.get(1).map(|f| f.path.clone());
    let total = figures.len();

    ExtractionResult {
        figures,
        main_figure,
        secondary_figure,
        total,
    }
}

/// Crop a detected box out of the page raster.
///
/// The box is first expanded by `padding` on all sides, then clipped back to
/// the raster bounds. Returns `None` when the clipped box has zero area.
fn crop_region(image: &DynamicImage, bbox: [f32; 4], padding: u32) -> Option<DynamicImage> {
    let (w, h) = (image.width() as i64, image.height() as i64);
    let pad = i64::from(padding);

    let x0 = ((bbox[0] as i64) - pad).max(0);
    let y0 = ((bbox[1] as i64) - pad).max(0);
    let x1 = ((bbox[2] as i64) + pad).min(w);
    let y1 = ((bbox[3] as i64) + pad).min(h);

    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    Some(image.crop_imm(x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32))
}

fn save_png(image: &DynamicImage, path: &Path) -> Result<(), StorytellerError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| StorytellerError::Internal(format!("PNG encode: {e}")))?;
    std::fs::write(path, &buf).map_err(|e| StorytellerError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn candidate(page: usize, area: u32, confidence: f32, name: &str) -> FigureCandidate {
        // Square crop with the given area; aspect ratio 1.0 throughout.
        let side = (f64::from(area)).sqrt() as u32;
        FigureCandidate {
            path: PathBuf::from(format!("{name}.png")),
            page,
            bbox: [0.0, 0.0, side as f32, side as f32],
            width: side,
            height: side,
            area,
            confidence,
            score: score_figure(page, area, side, side, confidence),
        }
    }

    #[test]
    fn empty_candidate_list_selects_nothing() {
        let result = rank_candidates(Vec::new());
        assert!(result.main_figure.is_none());
        assert!(result.secondary_figure.is_none());
        assert_eq!(result.total, 0);
    }

    #[test]
    fn single_candidate_has_no_secondary() {
        let result = rank_candidates(vec![candidate(2, 60_000, 0.9, "only")]);
        assert_eq!(result.main_figure, Some(PathBuf::from("only.png")));
        assert!(result.secondary_figure.is_none());
    }

    #[test]
    fn main_figure_is_argmax_by_score() {
        let result = rank_candidates(vec![
            candidate(1, 40_000, 0.9, "p1"),
            candidate(2, 80_000, 0.9, "p2"),
            candidate(6, 80_000, 0.9, "p6"),
        ]);
        assert_eq!(result.main_figure, Some(PathBuf::from("p2.png")));
        assert!(result.figures.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn ties_keep_detection_order() {
        let a = candidate(2, 60_000, 0.9, "first");
        let b = candidate(2, 60_000, 0.9, "second");
        assert_eq!(a.score, b.score);
        let result = rank_candidates(vec![a, b]);
        assert_eq!(result.main_figure, Some(PathBuf::from("first.png")));
        assert_eq!(result.secondary_figure, Some(PathBuf::from("second.png")));
    }

    #[test]
    fn crop_padding_expands_then_clamps() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(100, 80));
        // Interior box: padding expands on all sides.
        let crop = crop_region(&img, [20.0, 20.0, 40.0, 40.0], 5).unwrap();
        assert_eq!((crop.width(), crop.height()), (30, 30));
        // Box at the origin: clamped at 0, expanded on the far sides only.
        let crop = crop_region(&img, [0.0, 0.0, 10.0, 10.0], 5).unwrap();
        assert_eq!((crop.width(), crop.height()), (15, 15));
        // Box covering the full image: clamp wins everywhere.
        let crop = crop_region(&img, [0.0, 0.0, 100.0, 80.0], 5).unwrap();
        assert_eq!((crop.width(), crop.height()), (100, 80));
    }

    #[test]
    fn zero_area_crop_is_discarded() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(100, 80));
        // Degenerate box past the right edge, zero padding.
        assert!(crop_region(&img, [100.0, 0.0, 100.0, 40.0], 0).is_none());
    }

    #[test]
    fn crop_never_exceeds_image_bounds() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(64, 64));
        for bbox in [
            [-10.0f32, -10.0, 20.0, 20.0],
            [50.0, 50.0, 200.0, 200.0],
            [0.0, 0.0, 64.0, 64.0],
        ] {
            if let Some(crop) = crop_region(&img, bbox, 8) {
                assert!(crop.width() <= 64);
                assert!(crop.height() <= 64);
            }
        }
    }

    /// Six pages, one region each, uniform confidence and aspect ratio;
    /// rank must be decided by position + area + penalty alone.
    #[test]
    fn six_page_ranking_scenario() {
        let areas = [10_000u32, 60_000, 55_000, 20_000, 15_000, 12_000];
        let candidates: Vec<FigureCandidate> = areas
            .iter()
            .enumerate()
            .map(|(i, &area)| candidate(i + 1, area, 0.9, &format!("p{}", i + 1)))
            .collect();

        let result = rank_candidates(candidates);
        let winner = &result.figures[0];
        assert!(
            winner.page == 2 || winner.page == 3,
            "expected a page-2/3 win, got page {}",
            winner.page
        );

        // Page 1 (area 10 000, below the penalty threshold) must fall behind
        // both above-threshold regions despite its position bonus.
        let page1_rank = result
            .figures
            .iter()
            .position(|f| f.page == 1)
            .expect("page 1 candidate present");
        assert!(
            page1_rank >= 2,
            "page 1 ranked {page1_rank} of {}",
            result.figures.len()
        );

        // Small + late-page is the worst combination.
        assert_eq!(result.figures.last().unwrap().page, 6);
    }
}
