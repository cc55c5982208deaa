use crate::models::{FaceEmbedding, FACE_EMBEDDING_LEN};
use crate::utils::RollScanError;
use image::{GrayImage, RgbImage};
use imageproc::contrast::equalize_histogram;

/// What the face capability produced for one card: the photo crop (kept for
/// the human review package), a fixed-length descriptor for the face rule,
/// and a perceptual hash for the duplicate-photo rule.
#[derive(Debug, Clone)]
pub struct FaceObservation {
    pub crop: RgbImage,
    pub embedding: FaceEmbedding,
    pub photo_hash: u64,
}

/// Narrow face-encoding capability. `Ok(None)` means no usable photo on the
/// card; that is a normal outcome, not an error. A real face-recognition
/// model substitutes here, as do test doubles.
pub trait FaceEncoder {
    fn encode(&self, card: &RgbImage) -> Result<Option<FaceObservation>, RollScanError>;
}

/// Default encoder working off the card's printed photo panel. Voter cards in
/// these rolls carry the photo in a fixed panel on the right side, so the
/// encoder crops that panel, rejects panels with no printable content, and
/// derives a coarse normalized intensity descriptor. It is deliberately
/// model-free; swap in a real embedding model at the `FaceEncoder` seam for
/// higher discrimination.
pub struct PhotoRegionEncoder {
    /// Fraction of the card width occupied by the photo panel (right side).
    panel_fraction: f32,
    /// Margin trimmed from each panel edge before encoding.
    margin_fraction: f32,
    /// Minimum grayscale standard deviation for the panel to count as a photo.
    min_std_dev: f32,
}

impl Default for PhotoRegionEncoder {
    fn default() -> Self {
        PhotoRegionEncoder {
            panel_fraction: 0.4,
            margin_fraction: 0.1,
            min_std_dev: 12.0,
        }
    }
}

impl PhotoRegionEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    fn photo_panel(&self, card: &RgbImage) -> Option<RgbImage> {
        let (width, height) = card.dimensions();
        let panel_width = (width as f32 * self.panel_fraction) as u32;
        if panel_width == 0 || height == 0 {
            return None;
        }
        let panel_x = width - panel_width;
        let margin_x = (panel_width as f32 * self.margin_fraction) as u32;
        let margin_y = (height as f32 * self.margin_fraction) as u32;
        let inner_w = panel_width.saturating_sub(2 * margin_x);
        let inner_h = height.saturating_sub(2 * margin_y);
        if inner_w < 8 || inner_h < 16 {
            return None;
        }
        Some(image::imageops::crop_imm(card, panel_x + margin_x, margin_y, inner_w, inner_h).to_image())
    }

    fn std_dev(gray: &GrayImage) -> f32 {
        let count = (gray.width() * gray.height()) as f32;
        if count == 0.0 {
            return 0.0;
        }
        let mean = gray.pixels().map(|p| p[0] as f32).sum::<f32>() / count;
        let variance = gray
            .pixels()
            .map(|p| {
                let d = p[0] as f32 - mean;
                d * d
            })
            .sum::<f32>()
            / count;
        variance.sqrt()
    }

    /// 16x8 normalized intensity descriptor (128 values, unit L2 norm) so the
    /// Euclidean-distance similarity convention applies.
    fn descriptor(gray: &GrayImage) -> Option<FaceEmbedding> {
        let small = image::imageops::resize(gray, 8, 16, image::imageops::FilterType::Triangle);
        let mut values: Vec<f32> = small.pixels().map(|p| p[0] as f32 / 255.0).collect();
        debug_assert_eq!(values.len(), FACE_EMBEDDING_LEN);

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm == 0.0 {
            return None;
        }
        for value in values.iter_mut() {
            *value /= norm;
        }
        Some(FaceEmbedding(values))
    }
}

impl FaceEncoder for PhotoRegionEncoder {
    fn encode(&self, card: &RgbImage) -> Result<Option<FaceObservation>, RollScanError> {
        let panel = match self.photo_panel(card) {
            Some(panel) => panel,
            None => return Ok(None),
        };

        let gray = image::imageops::grayscale(&panel);
        if Self::std_dev(&gray) < self.min_std_dev {
            // Blank panel: the card carries no printed photo.
            return Ok(None);
        }

        let equalized = equalize_histogram(&gray);
        let embedding = match Self::descriptor(&equalized) {
            Some(embedding) => embedding,
            None => return Ok(None),
        };
        let photo_hash = average_hash(&gray);

        Ok(Some(FaceObservation {
            crop: panel,
            embedding,
            photo_hash,
        }))
    }
}

/// 64-bit average hash: downscale to 8x8, threshold each pixel against the
/// mean. Robust to brightness shifts and slight crops, which is exactly the
/// jitter two prints of the same photo show after rescanning.
pub fn average_hash(gray: &GrayImage) -> u64 {
    let small = image::imageops::resize(gray, 8, 8, image::imageops::FilterType::Triangle);
    let pixels: Vec<u64> = small.pixels().map(|p| p[0] as u64).collect();
    let mean = pixels.iter().sum::<u64>() / pixels.len() as u64;

    let mut hash = 0u64;
    for (bit, &value) in pixels.iter().enumerate() {
        if value >= mean {
            hash |= 1 << bit;
        }
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb};

    /// Card with a textured "photo" in the right panel.
    fn card_with_photo() -> RgbImage {
        RgbImage::from_fn(300, 200, |x, y| {
            if x >= 180 {
                // Checker texture stands in for a printed photo.
                let v = if (x / 8 + y / 8) % 2 == 0 { 30 } else { 220 };
                Rgb([v, v, v])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn textured_panel_produces_a_full_observation() {
        let encoder = PhotoRegionEncoder::new();
        let observation = encoder.encode(&card_with_photo()).unwrap().unwrap();
        assert_eq!(observation.embedding.len(), FACE_EMBEDDING_LEN);
        // Unit norm within floating-point tolerance.
        let norm: f32 = observation.embedding.0.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
        assert!(observation.crop.width() > 0);
    }

    #[test]
    fn encoding_is_deterministic() {
        let encoder = PhotoRegionEncoder::new();
        let card = card_with_photo();
        let first = encoder.encode(&card).unwrap().unwrap();
        let second = encoder.encode(&card).unwrap().unwrap();
        assert_eq!(first.embedding, second.embedding);
        assert_eq!(first.photo_hash, second.photo_hash);
        assert_eq!(first.embedding.similarity_percent(&second.embedding), 100.0);
    }

    #[test]
    fn blank_panel_yields_no_observation() {
        let encoder = PhotoRegionEncoder::new();
        let card = RgbImage::from_pixel(300, 200, Rgb([250, 250, 250]));
        assert!(encoder.encode(&card).unwrap().is_none());
    }

    #[test]
    fn tiny_cards_yield_no_observation() {
        let encoder = PhotoRegionEncoder::new();
        let card = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        assert!(encoder.encode(&card).unwrap().is_none());
    }

    #[test]
    fn average_hash_survives_uniform_brightness_shift() {
        let base = GrayImage::from_fn(64, 64, |x, y| {
            Luma([if (x / 8 + y / 8) % 2 == 0 { 40 } else { 200 }])
        });
        let brighter = GrayImage::from_fn(64, 64, |x, y| {
            Luma([if (x / 8 + y / 8) % 2 == 0 { 70 } else { 230 }])
        });
        assert_eq!(average_hash(&base), average_hash(&brighter));
    }

    #[test]
    fn average_hash_separates_unrelated_textures() {
        let checker = GrayImage::from_fn(64, 64, |x, y| {
            Luma([if (x / 8 + y / 8) % 2 == 0 { 0 } else { 255 }])
        });
        let gradient = GrayImage::from_fn(64, 64, |x, _| Luma([(x * 4) as u8]));
        let distance = (average_hash(&checker) ^ average_hash(&gradient)).count_ones();
        assert!(distance > 10);
    }
}
