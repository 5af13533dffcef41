//! Layout detection: wrap a DocLayout-YOLO ONNX model behind a small
//! adapter that yields normalised, labelled regions in raster coordinates.
//!
//! The model is an object detector over document pages. Its raw output is a
//! `[1, N, 6]` tensor of `[x1, y1, x2, y2, confidence, class_id]` rows in
//! letterboxed model-input space; this module converts rows back to source
//! pixels and partitions them by label so the pipeline only ever sees two
//! kinds of region: figure candidates and caption/title boxes.
//!
//! Model artifacts are checked by name *before* the ONNX session is built,
//! so a missing download surfaces as an actionable error instead of a
//! runtime crash mid-document.

use crate::error::StorytellerError;
use image::DynamicImage;
use ndarray::Array4;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::Session;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File names that must exist in the model directory before first use.
pub const REQUIRED_MODEL_FILES: &[&str] = &["doclayout_yolo_doclaynet.onnx"];

/// DocLayNet class labels, indexed by the model's class ids.
const DOCLAYNET_CLASSES: &[&str] = &[
    "Caption",
    "Footnote",
    "Formula",
    "List-item",
    "Page-footer",
    "Page-header",
    "Picture",
    "Section-header",
    "Table",
    "Text",
    "Title",
];

/// Model input resolution (DocLayNet export).
const INPUT_SIZE: u32 = 1120;

/// One normalised detection in source-raster pixel coordinates.
#[derive(Debug, Clone)]
pub struct DetectedRegion {
    /// Raw detector label, e.g. `Picture` or `Caption`.
    pub label: String,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f32,
    /// `[x0, y0, x1, y1]` in source pixels, clamped to the image bounds.
    pub bbox: [f32; 4],
}

/// Detections for one page, partitioned by what the pipeline needs.
///
/// Captions and titles are tracked separately so a later caption-pairing
/// step has its inputs; they are never treated as figure candidates.
/// Every other label is dropped.
#[derive(Debug, Default)]
pub struct PageRegions {
    pub figures: Vec<DetectedRegion>,
    pub captions: Vec<DetectedRegion>,
}

/// Layout-detection handle: one ONNX session, reused across all pages of a
/// run. Construct once per pipeline and pass in explicitly.
pub struct LayoutDetector {
    session: Session,
    confidence_threshold: f32,
}

impl std::fmt::Debug for LayoutDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayoutDetector")
            .field("session", &"<Session>")
            .field("confidence_threshold", &self.confidence_threshold)
            .finish()
    }
}

impl LayoutDetector {
    /// Check model artifacts, then build the ONNX session.
    pub fn new(model_dir: &Path, confidence_threshold: f32) -> Result<Self, StorytellerError> {
        let missing: Vec<String> = REQUIRED_MODEL_FILES
            .iter()
            .filter(|f| !model_dir.join(f).exists())
            .map(|f| (*f).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(StorytellerError::ModelUnavailable {
                model_dir: model_dir.to_path_buf(),
                missing,
            });
        }

        let model_path: PathBuf = model_dir.join(REQUIRED_MODEL_FILES[0]);
        info!("Loading layout model: {}", model_path.display());

        let session = Session::builder()
            .and_then(|b| b.with_execution_providers([CPUExecutionProvider::default().build()]))
            .and_then(|b| b.commit_from_file(&model_path))
            .map_err(|e| StorytellerError::Detector(format!("session init: {e}")))?;

        Ok(Self {
            session,
            confidence_threshold,
        })
    }

    /// Detect layout regions on one page raster.
    pub fn detect(&mut self, image: &DynamicImage) -> Result<PageRegions, StorytellerError> {
        let rgb = image.to_rgb8();
        let (orig_w, orig_h) = (rgb.width() as f32, rgb.height() as f32);

        let input = preprocess(&rgb);
        let shape = input.shape().to_vec();
        let (data, _offset) = input.into_raw_vec_and_offset();
        let input_value = ort::value::Value::from_array((shape.as_slice(), data))
            .map_err(|e| StorytellerError::Detector(format!("input tensor: {e}")))?;

        let outputs = self
            .session
            .run(ort::inputs!["images" => input_value])
            .map_err(|e| StorytellerError::Detector(format!("inference: {e}")))?;

        let output_name = outputs
            .keys()
            .next()
            .ok_or_else(|| StorytellerError::Detector("model produced no output".into()))?;
        let (output_shape, output_data) = outputs[output_name]
            .try_extract_tensor::<f32>()
            .map_err(|e| StorytellerError::Detector(format!("output tensor: {e}")))?;
        let shape: Vec<usize> = output_shape.iter().map(|&d| d as usize).collect();
        let data = output_data.to_vec();
        drop(outputs);

        let regions = postprocess(&shape, &data, orig_w, orig_h, self.confidence_threshold);
        debug!(
            "Detected {} figure region(s), {} caption/title region(s)",
            regions.figures.len(),
            regions.captions.len()
        );
        Ok(regions)
    }
}

/// Letterbox-resize to `INPUT_SIZE`² and normalise to `[0, 1]` NCHW.
///
/// The gray (0.5) background matches the model's training-time padding.
fn preprocess(rgb: &image::RgbImage) -> Array4<f32> {
    let (orig_w, orig_h) = (rgb.width() as usize, rgb.height() as usize);
    let target = INPUT_SIZE as usize;

    let scale = (target as f32 / orig_h as f32).min(target as f32 / orig_w as f32);
    let new_w = ((orig_w as f32 * scale).round() as usize).max(1);
    let new_h = ((orig_h as f32 * scale).round() as usize).max(1);
    let pad_x = (target - new_w.min(target)) / 2;
    let pad_y = (target - new_h.min(target)) / 2;

    let mut output = Array4::<f32>::from_elem((1, 3, target, target), 0.5);
    let channel_size = target * target;
    let out = output.as_slice_mut().expect("freshly allocated array is contiguous");

    let scale_w = orig_w as f32 / new_w as f32;
    let scale_h = orig_h as f32 / new_h as f32;

    for dst_y in 0..new_h.min(target) {
        let src_y = (((dst_y as f32 + 0.5) * scale_h) as usize).min(orig_h - 1);
        for dst_x in 0..new_w.min(target) {
            let src_x = (((dst_x as f32 + 0.5) * scale_w) as usize).min(orig_w - 1);
            let px = rgb.get_pixel(src_x as u32, src_y as u32);
            let dst = (pad_y + dst_y) * target + pad_x + dst_x;
            out[dst] = f32::from(px[0]) / 255.0;
            out[channel_size + dst] = f32::from(px[1]) / 255.0;
            out[2 * channel_size + dst] = f32::from(px[2]) / 255.0;
        }
    }

    output
}

/// Convert raw `[1, N, 6]` detections back to source coordinates and
/// partition by label.
fn postprocess(
    output_shape: &[usize],
    output_data: &[f32],
    orig_w: f32,
    orig_h: f32,
    confidence_threshold: f32,
) -> PageRegions {
    let mut regions = PageRegions::default();
    if output_shape.len() != 3 || output_shape[2] < 6 {
        return regions;
    }
    let num_detections = output_shape[1];
    let stride = output_shape[2];

    // Invert the letterbox transform applied in preprocess().
    let input_size = INPUT_SIZE as f32;
    let scale = (input_size / orig_h).min(input_size / orig_w);
    let pad_x = (input_size - (orig_w * scale).round()) / 2.0;
    let pad_y = (input_size - (orig_h * scale).round()) / 2.0;

    for i in 0..num_detections {
        let row = &output_data[i * stride..(i + 1) * stride];
        let confidence = row[4];
        if confidence < confidence_threshold {
            continue;
        }

        let x0 = ((row[0] - pad_x) / scale).clamp(0.0, orig_w);
        let y0 = ((row[1] - pad_y) / scale).clamp(0.0, orig_h);
        let x1 = ((row[2] - pad_x) / scale).clamp(0.0, orig_w);
        let y1 = ((row[3] - pad_y) / scale).clamp(0.0, orig_h);

        let class_id = row[5] as usize;
        let label = match DOCLAYNET_CLASSES.get(class_id) {
            Some(l) => (*l).to_string(),
            None => continue,
        };

        let region = DetectedRegion {
            confidence,
            bbox: [x0, y0, x1, y1],
            label,
        };

        match region.label.as_str() {
            "Picture" => regions.figures.push(region),
            "Caption" | "Title" => regions.captions.push(region),
            _ => {}
        }
    }

    regions
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build one raw detection row in model-input space.
    fn row(bbox: [f32; 4], conf: f32, class: f32) -> [f32; 6] {
        [bbox[0], bbox[1], bbox[2], bbox[3], conf, class]
    }

    fn run_postprocess(rows: &[[f32; 6]], w: f32, h: f32) -> PageRegions {
        let data: Vec<f32> = rows.iter().flatten().copied().collect();
        postprocess(&[1, rows.len(), 6], &data, w, h, 0.3)
    }

    #[test]
    fn partitions_by_label() {
        // 1120×1120 source: letterbox is identity (scale 1, no padding).
        let regions = run_postprocess(
            &[
                row([10.0, 10.0, 200.0, 100.0], 0.9, 6.0), // Picture
                row([10.0, 120.0, 200.0, 140.0], 0.8, 0.0), // Caption
                row([10.0, 150.0, 200.0, 170.0], 0.8, 9.0), // Text → dropped
            ],
            1120.0,
            1120.0,
        );
        assert_eq!(regions.figures.len(), 1);
        assert_eq!(regions.captions.len(), 1);
        assert_eq!(regions.figures[0].label, "Picture");
    }

    #[test]
    fn low_confidence_rows_are_dropped() {
        let regions = run_postprocess(&[row([0.0, 0.0, 50.0, 50.0], 0.1, 6.0)], 1120.0, 1120.0);
        assert!(regions.figures.is_empty());
    }

    #[test]
    fn unknown_class_ids_are_dropped() {
        let regions = run_postprocess(&[row([0.0, 0.0, 50.0, 50.0], 0.9, 42.0)], 1120.0, 1120.0);
        assert!(regions.figures.is_empty());
        assert!(regions.captions.is_empty());
    }

    #[test]
    fn coordinates_are_unletterboxed_and_clamped() {
        // 2240×1120 source: scale 0.5, vertical padding 280 px.
        let regions = run_postprocess(
            &[row([0.0, 280.0, 1120.0, 840.0], 0.9, 6.0)],
            2240.0,
            1120.0,
        );
        let b = regions.figures[0].bbox;
        assert_eq!(b, [0.0, 0.0, 2240.0, 1120.0]);
    }

    #[test]
    fn preprocess_shape_and_range() {
        let img = image::RgbImage::from_pixel(640, 480, image::Rgb([255, 0, 0]));
        let tensor = preprocess(&img);
        assert_eq!(tensor.shape(), &[1, 3, 1120, 1120]);
        for &v in tensor.iter() {
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn missing_model_files_surface_before_session_build() {
        let dir = tempfile::tempdir().unwrap();
        let err = LayoutDetector::new(dir.path(), 0.3).unwrap_err();
        match err {
            StorytellerError::ModelUnavailable { missing, .. } => {
                assert_eq!(missing, vec!["doclayout_yolo_doclaynet.onnx".to_string()]);
            }
            other => panic!("expected ModelUnavailable, got {other:?}"),
        }
    }
}
