//! # Color Tagger
//!
//! A Rust crate for naming the dominant colors of a product photograph.
//!
//! The extraction pipeline:
//! - Crops the image center and resizes it to a working height
//! - Masks the background (corner color similarity and edge flood fill)
//!   and skin-colored regions
//! - Clusters the remaining pixels with k-means, choosing k automatically
//! - Selects representative cluster centers
//! - Names each center, with a luminance rule for near-gray colors and a
//!   nearest-neighbor classifier trained on named samples otherwise
//!
//! ## Example
//!
//! ```rust,no_run
//! use color_tagger::{ColorExtractor, PipelineConfig};
//!
//! let samples = [[200.0, 30.0, 40.0], [20.0, 40.0, 160.0], [240.0, 220.0, 60.0]];
//! let labels = ["red", "blue", "yellow"];
//! let extractor = ColorExtractor::new(&samples, &labels, PipelineConfig::default())?;
//!
//! let image = image::RgbImage::new(400, 600);
//! let names = extractor.extract(&image)?;
//! println!("colors: {:?}", names);
//! # Ok::<(), color_tagger::ExtractionError>(())
//! ```

use image::RgbImage;

pub mod color;
pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod mask;
pub mod pipeline;
pub mod preprocess;
pub mod stage;

pub use color::{
    ClusterResult, ClusterSelector, Color, ColorClassifier, ColorClusterer, ColorNamer,
    KnnClassifier, Selection,
};
pub use config::{
    BackgroundConfig, ClusterAlgorithm, ClusterConfig, DistanceMetric, NamingAlgorithm,
    NamingConfig, PipelineConfig, ResizeConfig, SelectionStrategy, SelectorConfig, SkinConfig,
    SkinType, Weighting,
};
pub use detection::{BackgroundMasker, EdgePolicy, SkinMasker};
pub use error::{ExtractionError, Result};
pub use mask::Mask;
pub use pipeline::{ColorExtractor, ColorNameSet, DebugArtifacts};
pub use preprocess::Resizer;
pub use stage::{Configure, Stage};

/// Name the colors of one image with the default configuration
///
/// Trains a namer on `samples`/`labels` for this call only. Build a
/// [`ColorExtractor`] once instead when tagging many images.
///
/// # Errors
///
/// Returns `ExtractionError` if the sample table is invalid or extraction
/// fails, see [`ColorExtractor::extract`]
pub fn extract_colors<S: AsRef<str>>(
    image: &RgbImage,
    samples: &[Color],
    labels: &[S],
) -> Result<ColorNameSet> {
    ColorExtractor::new(samples, labels, PipelineConfig::default())?.extract(image)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_colors_reports_bad_sample_table() {
        let image = RgbImage::new(10, 10);
        let err = extract_colors(&image, &[[1.0, 2.0, 3.0]], &["red", "blue"]).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_default_config_builds_every_stage() {
        let samples = [[200.0, 30.0, 40.0]];
        assert!(ColorExtractor::new(&samples, &["red"], PipelineConfig::default()).is_ok());
    }
}
