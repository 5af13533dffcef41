//! PDF rasterisation and text extraction via pdfium.
//!
//! Every function here is blocking — pdfium wraps a C++ library with
//! thread-local state that must not run on async worker threads. Callers in
//! async context wrap these in `tokio::task::spawn_blocking`.
//!
//! There is deliberately no render cache: crops are taken straight from the
//! returned raster, and re-rendering a page is cheap next to the layout
//! model's inference time.

use crate::error::StorytellerError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::debug;

fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
) -> Result<PdfDocument<'a>, StorytellerError> {
    pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(|e| StorytellerError::DocumentIo {
            path: pdf_path.to_path_buf(),
            detail: format!("{e:?}"),
        })
}

/// Number of pages in the document.
pub fn page_count(pdf_path: &Path) -> Result<usize, StorytellerError> {
    let pdfium = Pdfium::default();
    let document = open_document(&pdfium, pdf_path)?;
    Ok(document.pages().len() as usize)
}

/// Render exactly one page (0-based index) to an in-memory raster at `dpi`.
///
/// An out-of-range index is an error, never a silently empty image.
pub fn render_page(
    pdf_path: &Path,
    page_index: usize,
    dpi: u32,
) -> Result<DynamicImage, StorytellerError> {
    let pdfium = Pdfium::default();
    let document = open_document(&pdfium, pdf_path)?;
    let pages = document.pages();
    let total = pages.len() as usize;

    if page_index >= total {
        return Err(StorytellerError::PageOutOfRange {
            page: page_index + 1,
            total,
        });
    }

    let page = pages
        .get(page_index as u16)
        .map_err(|e| StorytellerError::RasterisationFailed {
            page: page_index + 1,
            detail: format!("{e:?}"),
        })?;

    // Page geometry is in points (1/72 inch); scale to the requested DPI.
    let scale = dpi as f32 / 72.0;
    let target_width = (page.width().value * scale).round().max(1.0) as i32;
    let target_height = (page.height().value * scale).round().max(1.0) as i32;

    let render_config = PdfRenderConfig::new()
        .set_target_width(target_width)
        .set_maximum_height(target_height + 1);

    let bitmap =
        page.render_with_config(&render_config)
            .map_err(|e| StorytellerError::RasterisationFailed {
                page: page_index + 1,
                detail: format!("{e:?}"),
            })?;

    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px @ {} DPI",
        page_index + 1,
        image.width(),
        image.height(),
        dpi
    );

    Ok(image)
}

/// Concatenated text of every page, in page order.
///
/// Input for the Method-section locator; pages whose text layer cannot be
/// read contribute nothing rather than failing the whole extraction.
pub fn extract_full_text(pdf_path: &Path) -> Result<String, StorytellerError> {
    let pdfium = Pdfium::default();
    let document = open_document(&pdfium, pdf_path)?;

    let mut full_text = String::new();
    for page in document.pages().iter() {
        if let Ok(text) = page.text() {
            full_text.push_str(&text.all());
            full_text.push('\n');
        }
    }
    Ok(full_text)
}
