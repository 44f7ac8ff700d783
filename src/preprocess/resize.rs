//! Center crop and fixed-height rescale
//!
//! Product photographs usually have the subject centered, so trimming the
//! borders drops background before any masking. Background detection relies
//! on the corners though: an aggressive crop can cut into the subject and
//! make the corners unrepresentative.

use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::trace;

use crate::config::ResizeConfig;
use crate::error::{ExtractionError, Result};
use crate::stage::{Configure, Stage};

/// Crops the image center and rescales it to a fixed height
#[derive(Debug, Clone)]
pub struct Resizer {
    crop: f64,
    rows: u32,
}

impl Default for Resizer {
    fn default() -> Self {
        Self {
            crop: crate::constants::resize::DEFAULT_CROP,
            rows: crate::constants::resize::DEFAULT_ROWS,
        }
    }
}

impl Configure for Resizer {
    type Config = ResizeConfig;

    fn configure(config: ResizeConfig) -> Result<Self> {
        if !(config.crop > 0.0 && config.crop <= 1.0) {
            return Err(ExtractionError::config(
                "resize.crop",
                format!("must be in (0, 1], got {}", config.crop),
            ));
        }
        if config.rows == 0 {
            return Err(ExtractionError::config("resize.rows", "must be at least 1"));
        }
        Ok(Self {
            crop: config.crop,
            rows: config.rows,
        })
    }
}

impl Resizer {
    /// Crop then rescale `image` to the configured height
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::InvalidImage` for an image without pixels
    pub fn resize(&self, image: &RgbImage) -> Result<RgbImage> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ExtractionError::InvalidImage { width, height });
        }

        let cropped = self.crop(image);
        let (crop_w, crop_h) = cropped.dimensions();
        let dst_h = self.rows;
        let dst_w = ((dst_h as f64 * crop_w as f64 / crop_h as f64).round() as u32).max(1);
        trace!(crop_w, crop_h, dst_w, dst_h, "resizing");

        // thumbnail averages source areas; it only applies when shrinking
        let resized = if dst_w <= crop_w && dst_h <= crop_h {
            imageops::thumbnail(&cropped, dst_w, dst_h)
        } else {
            imageops::resize(&cropped, dst_w, dst_h, FilterType::Triangle)
        };
        Ok(resized)
    }

    fn crop(&self, image: &RgbImage) -> RgbImage {
        if self.crop >= 1.0 {
            return image.clone();
        }
        let (src_w, src_h) = image.dimensions();
        let dst_w = ((src_w as f64 * self.crop) as u32).max(1);
        let dst_h = ((src_h as f64 * self.crop) as u32).max(1);
        let x = (src_w - dst_w) / 2;
        let y = (src_h - dst_h) / 2;
        imageops::crop_imm(image, x, y, dst_w, dst_h).to_image()
    }
}

impl Stage<RgbImage> for Resizer {
    type Output = RgbImage;

    fn name(&self) -> &'static str {
        "resize"
    }

    fn process(&self, input: &RgbImage) -> Result<RgbImage> {
        self.resize(input)
    }
}
