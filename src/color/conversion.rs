//! Color space conversion utilities
//!
//! Pipeline colors are `[f32; 3]` RGB vectors on the 0-255 scale. Stages that
//! reason in other spaces convert per pixel through `palette`:
//! - RGB to CIE Lab (D65) for perceptual background distances
//! - RGB to HSV for skin ranges
//! - RGB to luma and gray-axis distance for the monochrome override

use image::Rgb;
use palette::{FromColor, Hsv, Lab, Srgb};

use crate::color::Color;
use crate::constants::naming::LUMA_COEFFICIENTS;

/// Convert an 8-bit pixel to a pipeline color vector
pub fn pixel_to_color(pixel: &Rgb<u8>) -> Color {
    [pixel[0] as f32, pixel[1] as f32, pixel[2] as f32]
}

/// Convert a color vector back to an 8-bit pixel, rounding and clamping
pub fn color_to_pixel(color: Color) -> Rgb<u8> {
    let channel = |v: f32| v.round().clamp(0.0, 255.0) as u8;
    Rgb([channel(color[0]), channel(color[1]), channel(color[2])])
}

/// Convert RGB (0-255) to Lab color space
///
/// # Arguments
///
/// * `pixel` - RGB values in range [0, 255]
///
/// # Returns
///
/// `[L, a, b]` under the D65 illuminant, L in [0, 100]
pub fn rgb_to_lab(pixel: &Rgb<u8>) -> [f32; 3] {
    let srgb = Srgb::new(
        pixel[0] as f32 / 255.0,
        pixel[1] as f32 / 255.0,
        pixel[2] as f32 / 255.0,
    );
    let lab = Lab::from_color(srgb);
    [lab.l, lab.a, lab.b]
}

/// Convert RGB (0-255) to HSV
///
/// # Returns
///
/// `[hue, saturation, value]` with hue in degrees [0, 360) and saturation and
/// value rescaled to [0, 255]
pub fn rgb_to_hsv(pixel: &Rgb<u8>) -> [f32; 3] {
    let srgb = Srgb::new(
        pixel[0] as f32 / 255.0,
        pixel[1] as f32 / 255.0,
        pixel[2] as f32 / 255.0,
    );
    let hsv = Hsv::from_color(srgb);
    [
        hsv.hue.into_positive_degrees(),
        hsv.saturation * 255.0,
        hsv.value * 255.0,
    ]
}

/// Perceptual luma of an RGB color (0-255 scale)
pub fn luminance(color: Color) -> f32 {
    color
        .iter()
        .zip(LUMA_COEFFICIENTS.iter())
        .map(|(c, k)| c * k)
        .sum()
}

/// Distance from a color to its projection on the achromatic axis
///
/// The gray axis is the unit vector `(1, 1, 1) / sqrt(3)`. A small distance
/// means low chroma regardless of lightness.
pub fn gray_axis_distance(color: Color) -> f32 {
    let mean = (color[0] + color[1] + color[2]) / 3.0;
    color
        .iter()
        .map(|c| (c - mean) * (c - mean))
        .sum::<f32>()
        .sqrt()
}

/// Squared Euclidean distance between two color vectors
pub fn squared_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let d0 = a[0] - b[0];
    let d1 = a[1] - b[1];
    let d2 = a[2] - b[2];
    d0 * d0 + d1 * d1 + d2 * d2
}

/// Euclidean distance between two color vectors (ΔE76 when both are Lab)
pub fn euclidean_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    squared_distance(a, b).sqrt()
}
