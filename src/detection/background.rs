//! Background detection for product photographs
//!
//! Two estimators run independently and are merged:
//! - Corner similarity: pixels whose color is close to one of the four
//!   corner colors, assuming the background shows at every corner
//! - Edge flood fill: Sobel edges are thinned to one pixel and a flood fill
//!   from the corners through non-edge pixels marks the background region
//!
//! When the union swallows nearly the whole image (a subject whose color
//! matches the background), the less aggressive estimator is used instead,
//! or no background at all if both are degenerate.

use std::cmp::Ordering;

use image::imageops;
use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::gradients::{horizontal_sobel, vertical_sobel};
use imageproc::morphology::erode;
use imageproc::region_labelling::{connected_components, Connectivity};
use tracing::{debug, warn};

use crate::color::conversion::{euclidean_distance, pixel_to_color, rgb_to_lab};
use crate::config::BackgroundConfig;
use crate::detection::filter::{blur, gaussian_kernel};
use crate::error::{ExtractionError, Result};
use crate::mask::Mask;
use crate::stage::{Configure, Stage};

/// What happens to the thinned edge pixels themselves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgePolicy {
    /// Edges stay foreground
    Foreground,
    /// Every edge pixel is background
    Background,
    /// Edges eroded with a square of this size; survivors are background
    Eroded(u8),
}

impl EdgePolicy {
    /// Map the numeric `edge_thinning` option onto a policy
    pub fn from_thinning(edge_thinning: i32) -> Self {
        match edge_thinning {
            i32::MIN..=0 => EdgePolicy::Foreground,
            1 => EdgePolicy::Background,
            k => EdgePolicy::Eroded(k.min(u8::MAX as i32) as u8),
        }
    }
}

/// Background masker combining corner similarity and edge flood fill
#[derive(Debug, Clone)]
pub struct BackgroundMasker {
    max_distance: f32,
    use_lab: bool,
    edge_policy: EdgePolicy,
    /// Pre-Sobel blur taps, `None` when blurring is off
    blur_kernel: Option<Vec<f32>>,
    edge_threshold: u8,
    max_coverage: f64,
}

impl Default for BackgroundMasker {
    fn default() -> Self {
        Self::from_valid(&BackgroundConfig::default())
    }
}

impl Configure for BackgroundMasker {
    type Config = BackgroundConfig;

    fn configure(config: BackgroundConfig) -> Result<Self> {
        if !(config.max_distance.is_finite() && config.max_distance >= 0.0) {
            return Err(ExtractionError::config(
                "background.max_distance",
                format!("must be a non-negative number, got {}", config.max_distance),
            ));
        }
        if config.blur_radius != 0 && config.blur_radius % 2 == 0 {
            return Err(ExtractionError::config(
                "background.blur_radius",
                format!("must be 0 or an odd kernel size, got {}", config.blur_radius),
            ));
        }
        if !(config.max_coverage > 0.0 && config.max_coverage <= 1.0) {
            return Err(ExtractionError::config(
                "background.max_coverage",
                format!("must be in (0, 1], got {}", config.max_coverage),
            ));
        }
        Ok(Self::from_valid(&config))
    }
}

impl BackgroundMasker {
    fn from_valid(config: &BackgroundConfig) -> Self {
        Self {
            max_distance: config.max_distance,
            use_lab: config.use_lab,
            edge_policy: EdgePolicy::from_thinning(config.edge_thinning),
            blur_kernel: (config.blur_radius > 0)
                .then(|| gaussian_kernel(config.blur_radius, kernel_sigma(config.blur_radius))),
            edge_threshold: config.edge_threshold,
            max_coverage: config.max_coverage,
        }
    }

    /// Background mask of `image`, `true` = background
    pub fn get_mask(&self, image: &RgbImage) -> Mask {
        let corner = self.corner_mask(image);
        let edge = self.edge_mask(image);
        debug!(
            corner_coverage = corner.coverage(),
            edge_coverage = edge.coverage(),
            "background estimators"
        );
        resolve_fallback(corner, edge, self.max_coverage)
    }

    /// Pixels within `max_distance` of any corner color
    pub fn corner_mask(&self, image: &RgbImage) -> Mask {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Mask::empty(width, height);
        }

        let colors: Vec<[f32; 3]> = image
            .pixels()
            .map(|p| if self.use_lab { rgb_to_lab(p) } else { pixel_to_color(p) })
            .collect();
        let references: Vec<[f32; 3]> = corner_points(width, height)
            .iter()
            .map(|&(x, y)| colors[(y * width + x) as usize])
            .collect();

        Mask::from_fn(width, height, |x, y| {
            let color = &colors[(y * width + x) as usize];
            references
                .iter()
                .any(|reference| euclidean_distance(color, reference) < self.max_distance)
        })
    }

    /// Region reached from the corners without crossing a thinned edge
    pub fn edge_mask(&self, image: &RgbImage) -> Mask {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Mask::empty(width, height);
        }

        let strength = edge_strength(image, self.blur_kernel.as_deref());
        let edges = Mask::from_fn(width, height, |x, y| {
            strength.get_pixel(x, y)[0] > self.edge_threshold
        });
        let thinned = skeletonize(&edges);
        let flooded = flood_from_corners(&thinned);

        match self.edge_policy {
            EdgePolicy::Foreground => flooded,
            EdgePolicy::Background => flooded.union(&thinned),
            EdgePolicy::Eroded(size) => {
                let eroded = erode(&thinned.to_gray(), Norm::LInf, size / 2);
                flooded.union(&Mask::from_gray(&eroded))
            }
        }
    }
}

impl Stage<RgbImage> for BackgroundMasker {
    type Output = Mask;

    fn name(&self) -> &'static str {
        "background"
    }

    fn process(&self, input: &RgbImage) -> Result<Mask> {
        Ok(self.get_mask(input))
    }
}

/// Merge the two estimators, falling back when the union is degenerate
///
/// A mask is degenerate when its coverage reaches `max_coverage`. In that
/// case the sub-mask with the smaller coverage is returned, provided it is
/// itself below the threshold and below the union; otherwise the result is
/// the empty mask. Ties go to the corner mask.
pub fn resolve_fallback(corner: Mask, edge: Mask, max_coverage: f64) -> Mask {
    let (width, height) = corner.dimensions();
    let combined = corner.union(&edge);
    let coverage = combined.coverage();
    if coverage < max_coverage {
        return combined;
    }

    let fallback = [("corner", corner), ("edge", edge)]
        .into_iter()
        .map(|(name, mask)| (name, mask.coverage(), mask))
        .filter(|(_, c, _)| *c < max_coverage && *c < coverage)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

    match fallback {
        Some((name, sub_coverage, mask)) => {
            warn!(
                coverage,
                sub_coverage,
                estimator = name,
                "background mask over-segmented, keeping the less aggressive estimator"
            );
            mask
        }
        None => {
            warn!(coverage, "both background estimators degenerate, masking nothing");
            Mask::empty(width, height)
        }
    }
}

/// Corner coordinates as (x, y)
fn corner_points(width: u32, height: u32) -> [(u32, u32); 4] {
    [
        (0, 0),
        (0, height - 1),
        (width - 1, 0),
        (width - 1, height - 1),
    ]
}

/// Default sigma for a Gaussian kernel of odd size `ksize`
fn kernel_sigma(ksize: u32) -> f32 {
    0.3 * ((ksize as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Mean of absolute Sobel responses in x and y, each saturated to 255
fn edge_strength(image: &RgbImage, blur_kernel: Option<&[f32]>) -> GrayImage {
    let mut gray = imageops::grayscale(image);
    if let Some(kernel) = blur_kernel {
        gray = blur(&gray, kernel);
    }
    let gx = horizontal_sobel(&gray);
    let gy = vertical_sobel(&gray);

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let sx = gx.get_pixel(x, y)[0].unsigned_abs().min(255) as f32;
        let sy = gy.get_pixel(x, y)[0].unsigned_abs().min(255) as f32;
        Luma([(0.5 * sx + 0.5 * sy) as u8])
    })
}

/// Zhang-Suen thinning down to one-pixel-wide, 8-connected lines
pub fn skeletonize(mask: &Mask) -> Mask {
    let (width, height) = mask.dimensions();
    let (w, h) = (width as i64, height as i64);
    let mut pixels = mask.as_slice().to_vec();

    let at = |pixels: &[bool], x: i64, y: i64| -> bool {
        x >= 0 && y >= 0 && x < w && y < h && pixels[(y * w + x) as usize]
    };

    loop {
        let mut changed = false;
        for pass in 0..2 {
            let mut cleared = Vec::new();
            for y in 0..h {
                for x in 0..w {
                    if !pixels[(y * w + x) as usize] {
                        continue;
                    }
                    // P2..P9 clockwise from north
                    let n = [
                        at(&pixels, x, y - 1),
                        at(&pixels, x + 1, y - 1),
                        at(&pixels, x + 1, y),
                        at(&pixels, x + 1, y + 1),
                        at(&pixels, x, y + 1),
                        at(&pixels, x - 1, y + 1),
                        at(&pixels, x - 1, y),
                        at(&pixels, x - 1, y - 1),
                    ];
                    let neighbors = n.iter().filter(|&&v| v).count();
                    if !(2..=6).contains(&neighbors) {
                        continue;
                    }
                    let transitions = (0..8).filter(|&i| !n[i] && n[(i + 1) % 8]).count();
                    if transitions != 1 {
                        continue;
                    }
                    let (p2, p4, p6, p8) = (n[0], n[2], n[4], n[6]);
                    let removable = if pass == 0 {
                        !(p2 && p4 && p6) && !(p4 && p6 && p8)
                    } else {
                        !(p2 && p4 && p8) && !(p2 && p6 && p8)
                    };
                    if removable {
                        cleared.push((y * w + x) as usize);
                    }
                }
            }
            if !cleared.is_empty() {
                changed = true;
                for idx in cleared {
                    pixels[idx] = false;
                }
            }
        }
        if !changed {
            break;
        }
    }

    Mask::from_fn(width, height, |x, y| pixels[(y * width + x) as usize])
}

/// 4-connected flood fill from every non-edge corner
///
/// A corner pixel lying on an edge seeds nothing; the flood then starts only
/// from the remaining corners, and from none if all four are edges.
fn flood_from_corners(edges: &Mask) -> Mask {
    let (width, height) = edges.dimensions();
    let open = GrayImage::from_fn(width, height, |x, y| {
        Luma([if edges.get(x, y) { 0 } else { 255 }])
    });
    let labels = connected_components(&open, Connectivity::Four, Luma([0u8]));

    let seeds: Vec<u32> = corner_points(width, height)
        .iter()
        .map(|&(x, y)| labels.get_pixel(x, y)[0])
        .filter(|&label| label != 0)
        .collect();

    Mask::from_fn(width, height, |x, y| {
        let label = labels.get_pixel(x, y)[0];
        label != 0 && seeds.contains(&label)
    })
}
