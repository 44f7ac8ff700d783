//! Fixed-size Gaussian smoothing for masks and edge detection

use image::GrayImage;
use imageproc::filter::separable_filter_equal;

/// Normalized 1-D Gaussian kernel with exactly `size` taps
///
/// `size` is odd. Tap `i` weighs `exp(-(i - (size - 1) / 2)^2 / (2 sigma^2))`.
pub fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let center = (size as f32 - 1.0) * 0.5;
    let weights: Vec<f32> = (0..size)
        .map(|i| {
            let x = i as f32 - center;
            (-(x * x) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let total: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / total).collect()
}

/// Separable blur of `image` with the same kernel along both axes
pub fn blur(image: &GrayImage, kernel: &[f32]) -> GrayImage {
    separable_filter_equal(image, kernel)
}
