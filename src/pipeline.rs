//! Image-to-color-names pipeline
//!
//! [`ColorExtractor`] owns one configured instance of every stage and runs
//! them in a fixed order for each image:
//!
//! resize → background mask + skin mask → clustering of the remaining
//! pixels → cluster selection → naming of each selected center.
//!
//! The extractor is built once and is read-only afterwards, so a single
//! instance can serve many threads. [`ColorExtractor::extract_batch`] uses
//! this to process images in parallel.

use std::collections::BTreeSet;
use std::time::Instant;

use image::RgbImage;
use rayon::prelude::*;
use tracing::debug;

use crate::color::conversion::{color_to_pixel, pixel_to_color};
use crate::color::{ClusterResult, ClusterSelector, Color, ColorClassifier, ColorClusterer, ColorNamer};
use crate::config::PipelineConfig;
use crate::detection::{BackgroundMasker, SkinMasker};
use crate::error::Result;
use crate::mask::Mask;
use crate::preprocess::Resizer;
use crate::stage::{Configure, Stage};

/// Distinct color names found in one image
pub type ColorNameSet = BTreeSet<String>;

/// Intermediate images of one extraction, for visual inspection
#[derive(Debug, Clone, PartialEq)]
pub struct DebugArtifacts {
    /// Cropped and resized input
    pub resized: RgbImage,
    pub background_mask: Mask,
    pub skin_mask: Mask,
    /// Resized image with every clustered pixel replaced by its cluster
    /// center; excluded pixels are black
    pub clusters: RgbImage,
}

/// Everything one pass over an image produces
struct Extraction {
    names: ColorNameSet,
    resized: RgbImage,
    background_mask: Mask,
    skin_mask: Mask,
    excluded: Mask,
    clusters: ClusterResult,
}

/// Configured extraction pipeline with a trained color namer
#[derive(Debug)]
pub struct ColorExtractor {
    resizer: Resizer,
    background: BackgroundMasker,
    skin: SkinMasker,
    clusterer: ColorClusterer,
    selector: ClusterSelector,
    namer: ColorNamer,
}

impl ColorExtractor {
    /// Configure every stage and train the built-in classifier on the sample
    /// table
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::InvalidConfiguration` if any section of
    /// `config` or the sample table is invalid
    pub fn new<S: AsRef<str>>(samples: &[Color], labels: &[S], config: PipelineConfig) -> Result<Self> {
        let namer = ColorNamer::new(samples, labels, config.naming.clone())?;
        Self::assemble(config, namer)
    }

    /// Same as [`ColorExtractor::new`] with a caller supplied classifier
    ///
    /// `config.naming.algorithm` must be `custom`.
    pub fn with_classifier<S: AsRef<str>>(
        samples: &[Color],
        labels: &[S],
        config: PipelineConfig,
        classifier: Box<dyn ColorClassifier>,
    ) -> Result<Self> {
        let namer = ColorNamer::with_classifier(samples, labels, config.naming.clone(), classifier)?;
        Self::assemble(config, namer)
    }

    fn assemble(config: PipelineConfig, namer: ColorNamer) -> Result<Self> {
        Ok(Self {
            resizer: Resizer::configure(config.resize)?,
            background: BackgroundMasker::configure(config.background)?,
            skin: SkinMasker::configure(config.skin)?,
            clusterer: ColorClusterer::configure(config.cluster)?,
            selector: ClusterSelector::configure(config.selector)?,
            namer,
        })
    }

    pub fn namer(&self) -> &ColorNamer {
        &self.namer
    }

    /// Color names describing the product in `image`
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::ClusteringFailure` when too few distinct
    /// colors survive masking, and `ExtractionError::InvalidImage` for an
    /// empty image. An empty name set is never returned in place of an error.
    pub fn extract(&self, image: &RgbImage) -> Result<ColorNameSet> {
        self.run(image).map(|extraction| extraction.names)
    }

    /// Color names plus the intermediate images of the extraction
    pub fn extract_with_debug(&self, image: &RgbImage) -> Result<(ColorNameSet, DebugArtifacts)> {
        let extraction = self.run(image)?;
        let clusters = render_clusters(&extraction.resized, &extraction.excluded, &extraction.clusters);
        let artifacts = DebugArtifacts {
            resized: extraction.resized,
            background_mask: extraction.background_mask,
            skin_mask: extraction.skin_mask,
            clusters,
        };
        Ok((extraction.names, artifacts))
    }

    /// Extract every image in parallel, one result per image in input order
    ///
    /// A failure on one image does not affect the others.
    pub fn extract_batch(&self, images: &[RgbImage]) -> Vec<Result<ColorNameSet>> {
        images.par_iter().map(|image| self.extract(image)).collect()
    }

    fn run(&self, image: &RgbImage) -> Result<Extraction> {
        let started = Instant::now();

        let resized = run_stage(&self.resizer, image)?;
        let background_mask = run_stage(&self.background, &resized)?;
        let skin_mask = run_stage(&self.skin, &resized)?;
        let excluded = background_mask.union(&skin_mask);

        let pixels: Vec<Color> = resized
            .pixels()
            .zip(excluded.as_slice())
            .filter(|(_, &masked)| !masked)
            .map(|(pixel, _)| pixel_to_color(pixel))
            .collect();
        debug!(
            total = excluded.as_slice().len(),
            foreground = pixels.len(),
            "collected foreground pixels"
        );

        let clusters = run_stage(&self.clusterer, pixels.as_slice())?;
        let centers = run_stage(&self.selector, &clusters)?;

        let mut names = ColorNameSet::new();
        for center in &centers {
            names.extend(run_stage(&self.namer, center)?);
        }

        debug!(
            ?names,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "extraction complete"
        );

        Ok(Extraction {
            names,
            resized,
            background_mask,
            skin_mask,
            excluded,
            clusters,
        })
    }
}

/// Run one stage, logging its name and duration
fn run_stage<S, In>(stage: &S, input: &In) -> Result<S::Output>
where
    S: Stage<In>,
    In: ?Sized,
{
    let started = Instant::now();
    match stage.process(input) {
        Ok(output) => {
            debug!(
                stage = stage.name(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "stage complete"
            );
            Ok(output)
        }
        Err(err) => {
            debug!(stage = stage.name(), error = %err, "stage failed");
            Err(err)
        }
    }
}

/// Paint each clustered pixel with its center, leave excluded pixels black
fn render_clusters(resized: &RgbImage, excluded: &Mask, clusters: &ClusterResult) -> RgbImage {
    let mut rendered = RgbImage::new(resized.width(), resized.height());
    let mut labels = clusters.labels.iter();
    for (x, y, pixel) in rendered.enumerate_pixels_mut() {
        if excluded.get(x, y) {
            continue;
        }
        if let Some(&label) = labels.next() {
            *pixel = color_to_pixel(clusters.centers[label]);
        }
    }
    rendered
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;
    use crate::config::ResizeConfig;
    use crate::error::ExtractionError;

    const SAMPLES: [Color; 3] = [[230.0, 20.0, 20.0], [20.0, 30.0, 230.0], [30.0, 200.0, 40.0]];
    const LABELS: [&str; 3] = ["red", "blue", "green"];

    #[test]
    fn test_extractor_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ColorExtractor>();
    }

    #[test]
    fn test_invalid_section_rejected() {
        let config = PipelineConfig {
            resize: ResizeConfig {
                crop: 1.5,
                ..ResizeConfig::default()
            },
            ..PipelineConfig::default()
        };
        let err = ColorExtractor::new(&SAMPLES, &LABELS, config).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_render_clusters_follows_mask() {
        let resized = RgbImage::from_pixel(3, 1, Rgb([9, 9, 9]));
        let excluded = Mask::from_fn(3, 1, |x, _| x == 1);
        let clusters = ClusterResult {
            k: 2,
            labels: vec![1, 0],
            centers: vec![[10.0, 20.0, 30.0], [200.4, 100.6, 0.0]],
        };
        let rendered = render_clusters(&resized, &excluded, &clusters);
        assert_eq!(rendered.get_pixel(0, 0), &Rgb([200, 101, 0]));
        assert_eq!(rendered.get_pixel(1, 0), &Rgb([0, 0, 0]));
        assert_eq!(rendered.get_pixel(2, 0), &Rgb([10, 20, 30]));
    }

    #[test]
    fn test_zero_sized_image_rejected() {
        let extractor = ColorExtractor::new(&SAMPLES, &LABELS, PipelineConfig::default()).unwrap();
        let err = extractor.extract(&RgbImage::new(0, 0)).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidImage { .. }));
    }
}
