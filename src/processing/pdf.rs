use crate::utils::RollScanError;
use image::RgbImage;
use log::debug;
use pdfium_render::prelude::*;
use std::path::Path;

pub const DEFAULT_ZOOM: f32 = 3.0;

/// Rasterizes electoral-roll PDF pages into images the segmenter can work on.
/// Pages are rendered at a zoom factor because the printed card grids are
/// small; at 1x the field text is too coarse for OCR.
pub struct PdfRasterizer {
    pdfium: Pdfium,
    zoom: f32,
}

impl PdfRasterizer {
    pub fn new(zoom: f32) -> Result<Self, RollScanError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|e| RollScanError::Pdf(format!("failed to bind pdfium: {}", e)))?;
        Ok(PdfRasterizer {
            pdfium: Pdfium::new(bindings),
            zoom,
        })
    }

    pub fn open<'a>(&'a self, path: &Path) -> Result<PdfDocument<'a>, RollScanError> {
        let document = self
            .pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| RollScanError::Pdf(format!("failed to open {}: {}", path.display(), e)))?;
        debug!(
            "loaded {} with {} pages",
            path.display(),
            document.pages().len()
        );
        Ok(document)
    }

    pub fn page_count(&self, document: &PdfDocument) -> u16 {
        document.pages().len()
    }

    /// Renders a single page (0-indexed) to an RGB image at the configured zoom.
    pub fn render_page(
        &self,
        document: &PdfDocument,
        page_index: u16,
    ) -> Result<RgbImage, RollScanError> {
        let page = document
            .pages()
            .get(page_index)
            .map_err(|e| RollScanError::Pdf(format!("no page {}: {}", page_index + 1, e)))?;

        let config = PdfRenderConfig::new().scale_page_by_factor(self.zoom);
        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| RollScanError::Pdf(format!("failed to render page {}: {}", page_index + 1, e)))?;

        Ok(bitmap.as_image().to_rgb8())
    }
}
