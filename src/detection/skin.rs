//! Skin detection by HSV range
//!
//! Fashion photographs often show models; exposed skin would otherwise end
//! up as a dominant "color" of the garment. Pixels inside an empirical HSV
//! range are masked, then the mask is opened and blurred to drop speckle
//! and soften its boundary.

use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::morphology::open;

use crate::color::conversion::rgb_to_hsv;
use crate::config::{SkinConfig, SkinType};
use crate::constants::skin::{SMOOTHING_SIGMA, SMOOTHING_SIZE};
use crate::detection::filter::{blur, gaussian_kernel};
use crate::error::{ExtractionError, Result};
use crate::mask::Mask;
use crate::stage::{Configure, Stage};

/// Skin masker implementing an HSV range test with morphological smoothing
#[derive(Debug, Clone)]
pub struct SkinMasker {
    skin_type: SkinType,
    lower: [f32; 3],
    upper: [f32; 3],
}

impl Default for SkinMasker {
    fn default() -> Self {
        let config = SkinConfig::default();
        Self {
            skin_type: config.skin_type,
            lower: config.lower,
            upper: config.upper,
        }
    }
}

impl Configure for SkinMasker {
    type Config = SkinConfig;

    fn configure(config: SkinConfig) -> Result<Self> {
        for channel in 0..3 {
            if !(config.lower[channel] <= config.upper[channel]) {
                return Err(ExtractionError::config(
                    "skin.lower",
                    format!(
                        "channel {} lower bound {} exceeds upper bound {}",
                        channel, config.lower[channel], config.upper[channel]
                    ),
                ));
            }
        }
        Ok(Self {
            skin_type: config.skin_type,
            lower: config.lower,
            upper: config.upper,
        })
    }
}

impl SkinMasker {
    /// Skin mask of `image`, `true` = skin
    pub fn get_mask(&self, image: &RgbImage) -> Mask {
        let (width, height) = image.dimensions();
        match self.skin_type {
            SkinType::None => Mask::empty(width, height),
            SkinType::General => self.range_mask(image),
        }
    }

    fn range_mask(&self, image: &RgbImage) -> Mask {
        let in_range = GrayImage::from_fn(image.width(), image.height(), |x, y| {
            let hsv = rgb_to_hsv(image.get_pixel(x, y));
            let inside = (0..3).all(|c| hsv[c] >= self.lower[c] && hsv[c] <= self.upper[c]);
            Luma([if inside { 255 } else { 0 }])
        });

        // 3x3 cross opening, then a 3x3 blur; any nonzero response is skin
        let opened = open(&in_range, Norm::L1, 1);
        let smoothed = blur(&opened, &gaussian_kernel(SMOOTHING_SIZE, SMOOTHING_SIGMA));
        Mask::from_gray(&smoothed)
    }
}

impl Stage<RgbImage> for SkinMasker {
    type Output = Mask;

    fn name(&self) -> &'static str {
        "skin"
    }

    fn process(&self, input: &RgbImage) -> Result<Mask> {
        Ok(self.get_mask(input))
    }
}
