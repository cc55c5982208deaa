use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::close;
use log::debug;

/// One cropped voter card plus where it came from on the page.
#[derive(Debug, Clone)]
pub struct CardImage {
    /// 1-based index of the card within its page, in grid order.
    pub index: u32,
    pub image: RgbImage,
}

/// Slices a rasterized roll page into per-voter card images along the printed
/// grid. Electoral rolls lay cards out in a table of dark ruled lines; the
/// segmenter locates those lines and cuts the cells between them.
pub struct CardSegmenter {
    /// Binarization cut-off; pixels darker than this count as ink.
    ink_threshold: u8,
    /// Two detected line positions closer than this merge into one line.
    merge_distance: u32,
    /// A run of ink must span at least this fraction of the page dimension
    /// to count as a grid line.
    min_line_fraction: f32,
    /// Cells with a side shorter than this are grid noise, not cards.
    min_cell_px: u32,
    /// Cells wider/taller than this fraction of the page are the outer frame.
    max_cell_fraction: f32,
    /// Inner padding cropped away so the rule lines do not bleed into OCR.
    cell_padding: u32,
    /// Crops under this size after padding are discarded.
    min_crop_px: u32,
}

impl Default for CardSegmenter {
    fn default() -> Self {
        CardSegmenter {
            ink_threshold: 127,
            merge_distance: 20,
            min_line_fraction: 1.0 / 3.0,
            min_cell_px: 100,
            max_cell_fraction: 0.9,
            cell_padding: 5,
            min_crop_px: 50,
        }
    }
}

impl CardSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extracts every card on a page, in row-major grid order. A page without
    /// a detectable grid yields an empty list; the caller logs and moves on.
    pub fn segment_page(&self, page: &RgbImage) -> Vec<CardImage> {
        let binary = self.binarize(page);
        // Bridge small scan dropouts so a rule line reads as one long run.
        let binary = close(&binary, Norm::LInf, 1);

        let v_lines = self.find_line_positions(&binary, true);
        let h_lines = self.find_line_positions(&binary, false);
        debug!(
            "grid detection: {} vertical, {} horizontal lines",
            v_lines.len(),
            h_lines.len()
        );

        if v_lines.len() < 2 || h_lines.len() < 2 {
            return Vec::new();
        }

        let boxes = self.cells_from_grid(page.width(), page.height(), &v_lines, &h_lines);
        self.crop_cards(page, &boxes)
    }

    /// Inverted binary image: ink (dark) becomes white so runs are countable.
    fn binarize(&self, page: &RgbImage) -> GrayImage {
        let gray = image::imageops::grayscale(page);
        GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            if gray.get_pixel(x, y)[0] < self.ink_threshold {
                Luma([255u8])
            } else {
                Luma([0u8])
            }
        })
    }

    /// Finds grid-line positions along one axis. A column (or row) belongs to
    /// a grid line when its longest uninterrupted ink run covers a large part
    /// of the page; body text never does. Nearby positions are merged so a
    /// thick rule line registers once.
    fn find_line_positions(&self, binary: &GrayImage, vertical: bool) -> Vec<u32> {
        let (outer, inner) = if vertical {
            (binary.width(), binary.height())
        } else {
            (binary.height(), binary.width())
        };
        let min_run = (inner as f32 * self.min_line_fraction) as u32;

        let mut positions = Vec::new();
        for i in 0..outer {
            let mut longest = 0u32;
            let mut current = 0u32;
            for j in 0..inner {
                let on = if vertical {
                    binary.get_pixel(i, j)[0] > 0
                } else {
                    binary.get_pixel(j, i)[0] > 0
                };
                if on {
                    current += 1;
                    longest = longest.max(current);
                } else {
                    current = 0;
                }
            }
            if longest >= min_run {
                match positions.last() {
                    Some(&last) if i - last <= self.merge_distance => {}
                    _ => positions.push(i),
                }
            }
        }
        positions
    }

    /// Forms candidate cells from consecutive line pairs and filters out the
    /// outer frame and sub-card fragments.
    fn cells_from_grid(
        &self,
        page_width: u32,
        page_height: u32,
        v_lines: &[u32],
        h_lines: &[u32],
    ) -> Vec<(u32, u32, u32, u32)> {
        let max_width = (page_width as f32 * self.max_cell_fraction) as u32;
        let max_height = (page_height as f32 * self.max_cell_fraction) as u32;

        let mut boxes = Vec::new();
        for rows in h_lines.windows(2) {
            for cols in v_lines.windows(2) {
                let (x, y) = (cols[0], rows[0]);
                let (w, h) = (cols[1] - cols[0], rows[1] - rows[0]);
                if w > self.min_cell_px && h > self.min_cell_px && w < max_width && h < max_height {
                    boxes.push((x, y, w, h));
                }
            }
        }
        boxes
    }

    fn crop_cards(&self, page: &RgbImage, boxes: &[(u32, u32, u32, u32)]) -> Vec<CardImage> {
        let mut cards = Vec::new();
        for &(x, y, w, h) in boxes {
            let pad = self.cell_padding;
            let x1 = x + pad;
            let y1 = y + pad;
            let x2 = (x + w).saturating_sub(pad).min(page.width());
            let y2 = (y + h).saturating_sub(pad).min(page.height());
            if x2 <= x1 || y2 <= y1 {
                continue;
            }
            let (crop_w, crop_h) = (x2 - x1, y2 - y1);
            if crop_w < self.min_crop_px || crop_h < self.min_crop_px {
                continue;
            }
            cards.push(CardImage {
                index: cards.len() as u32 + 1,
                image: image::imageops::crop_imm(page, x1, y1, crop_w, crop_h).to_image(),
            });
        }
        cards
    }
}
