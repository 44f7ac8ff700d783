//! Configuration structures for the color extraction pipeline.
//!
//! Each pipeline component owns one configuration struct. Every struct has a
//! complete set of defaults (see [`crate::constants`]) and any subset of
//! options supplied by a caller is merged over them.
//!
//! # Configuration Loading
//!
//! ```no_run
//! use color_tagger::PipelineConfig;
//! use std::path::Path;
//!
//! // Load overrides from a file
//! let config = PipelineConfig::from_json_file(Path::new("config.json"))?;
//!
//! // Or override a single option inline
//! let config = PipelineConfig::from_json_str(r#"{ "selector": { "strategy": "ratio" } }"#)?;
//! # Ok::<(), color_tagger::ExtractionError>(())
//! ```
//!
//! Option names that no component knows are rejected rather than ignored,
//! so a typo never silently falls back to a default.
//!
//! # Configuration Sections
//!
//! - [`ResizeConfig`]: center crop ratio and target height
//! - [`BackgroundConfig`]: corner similarity and edge flood-fill masks
//! - [`SkinConfig`]: HSV skin range
//! - [`ClusterConfig`]: candidate k range and k-means criteria
//! - [`SelectorConfig`]: representative cluster strategy
//! - [`NamingConfig`]: monochrome override and classifier settings

use std::path::Path;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::constants::{background, cluster, naming, resize, selector, skin};
use crate::error::{ExtractionError, Result};

/// Complete pipeline configuration, one section per component.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub resize: ResizeConfig,
    pub background: BackgroundConfig,
    pub skin: SkinConfig,
    pub cluster: ClusterConfig,
    pub selector: SelectorConfig,
    pub naming: NamingConfig,
}

/// Center crop and rescale parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResizeConfig {
    /// Fraction of height and width kept, in (0, 1]. `1.0` disables cropping.
    pub crop: f64,

    /// Height of the resized image; width follows the aspect ratio
    pub rows: u32,
}

/// Background mask parameters.
///
/// Two estimators are combined: pixels close to any corner color, and pixels
/// reached by a flood fill from the corners that stops at image edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackgroundConfig {
    /// Maximum distance to a corner color for a pixel to be background.
    /// Higher values remove background more aggressively.
    pub max_distance: f32,

    /// Measure corner distances in CIE Lab instead of RGB
    pub use_lab: bool,

    /// Edge policy: `<= 0` keeps edges as foreground, `1` marks them as
    /// background, larger values erode them with a square of that size first
    pub edge_thinning: i32,

    /// Odd kernel size of the Gaussian blur before edge detection, 0 disables it
    pub blur_radius: u32,

    /// Sobel magnitude above which a pixel is an edge
    pub edge_threshold: u8,

    /// Coverage at or above which a mask is considered over-segmented
    pub max_coverage: f64,
}

/// Kind of skin expected in the photographs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkinType {
    /// Generic HSV skin range
    General,
    /// No skin expected; the skin mask is always empty
    None,
}

/// Skin mask parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkinConfig {
    pub skin_type: SkinType,

    /// Lower HSV bound (hue degrees, saturation 0-255, value 0-255)
    pub lower: [f32; 3],

    /// Upper HSV bound (hue degrees, saturation 0-255, value 0-255)
    pub upper: [f32; 3],
}

/// Clustering algorithm used to group foreground pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClusterAlgorithm {
    #[serde(rename = "kmeans")]
    KMeans,
}

/// Adaptive clustering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterConfig {
    pub algorithm: ClusterAlgorithm,

    /// Smallest candidate cluster count (inclusive)
    pub min_k: usize,

    /// Largest candidate cluster count (exclusive)
    pub max_k: usize,

    /// Random restarts per candidate k
    pub attempts: usize,

    /// Lloyd iterations per restart
    pub max_iterations: usize,

    /// A restart stops once no center moves farther than this
    pub epsilon: f32,

    /// Fixed seed for reproducible runs; random when absent
    pub seed: Option<u64>,
}

/// How representative colors are picked among the clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStrategy {
    /// Center of the most populated cluster
    Largest,
    /// Most populated clusters until `ratio_threshold` of the pixels is covered
    Ratio,
    /// Every center
    All,
}

/// Cluster selection parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SelectorConfig {
    pub strategy: SelectionStrategy,

    /// Share of pixels the `ratio` strategy must reach, in (0, 1]
    pub ratio_threshold: f64,
}

/// Classifier backing the color namer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NamingAlgorithm {
    /// Built-in k-nearest-neighbor classifier
    Knn,
    /// Caller supplied [`crate::color::ColorClassifier`]
    Custom,
}

/// Neighbor vote weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weighting {
    Uniform,
    /// Votes weighted by inverse distance
    Distance,
}

/// Distance between two color vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Euclidean,
    Manhattan,
}

/// Color naming parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    pub algorithm: NamingAlgorithm,

    /// Name near-gray colors by luminance instead of the classifier
    pub hard_monochrome: bool,

    pub black_name: String,
    pub gray_name: String,
    pub white_name: String,

    /// Maximum distance to the gray axis for the monochrome override
    pub max_gray_distance: f32,

    /// Luminance at or below which a monochrome color is black
    pub black_max_luminance: f32,

    /// Luminance at or above which a monochrome color is white
    pub white_min_luminance: f32,

    /// Standardize samples and queries before classification
    pub scale: bool,

    /// Neighbors consulted by the kNN classifier
    pub neighbors: usize,

    pub weighting: Weighting,

    pub metric: DistanceMetric,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            crop: resize::DEFAULT_CROP,
            rows: resize::DEFAULT_ROWS,
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            max_distance: background::DEFAULT_MAX_DISTANCE,
            use_lab: background::DEFAULT_USE_LAB,
            edge_thinning: background::DEFAULT_EDGE_THINNING,
            blur_radius: background::DEFAULT_BLUR_RADIUS,
            edge_threshold: background::DEFAULT_EDGE_THRESHOLD,
            max_coverage: background::DEFAULT_MAX_COVERAGE,
        }
    }
}

impl Default for SkinConfig {
    fn default() -> Self {
        Self {
            skin_type: SkinType::General,
            lower: skin::GENERAL_LOWER,
            upper: skin::GENERAL_UPPER,
        }
    }
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            algorithm: ClusterAlgorithm::KMeans,
            min_k: cluster::DEFAULT_MIN_K,
            max_k: cluster::DEFAULT_MAX_K,
            attempts: cluster::DEFAULT_ATTEMPTS,
            max_iterations: cluster::DEFAULT_MAX_ITERATIONS,
            epsilon: cluster::DEFAULT_EPSILON,
            seed: None,
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            strategy: SelectionStrategy::Largest,
            ratio_threshold: selector::DEFAULT_RATIO_THRESHOLD,
        }
    }
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            algorithm: NamingAlgorithm::Knn,
            hard_monochrome: true,
            black_name: naming::DEFAULT_BLACK_NAME.to_string(),
            gray_name: naming::DEFAULT_GRAY_NAME.to_string(),
            white_name: naming::DEFAULT_WHITE_NAME.to_string(),
            max_gray_distance: naming::DEFAULT_MAX_GRAY_DISTANCE,
            black_max_luminance: naming::DEFAULT_BLACK_MAX_LUMINANCE,
            white_min_luminance: naming::DEFAULT_WHITE_MIN_LUMINANCE,
            scale: false,
            neighbors: naming::DEFAULT_NEIGHBORS,
            weighting: Weighting::Distance,
            metric: DistanceMetric::Euclidean,
        }
    }
}

impl PipelineConfig {
    /// Parse a JSON document of overrides; missing options keep their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ExtractionError::parse(format!("invalid pipeline configuration: {}", e), e))
    }

    /// Load configuration overrides from a JSON file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ExtractionError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    /// Serialize the complete configuration, defaults included
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ExtractionError::parse("configuration could not be serialized", e))
    }
}

/// Resolve a lowercase option value through its serde name.
fn parse_named<T: DeserializeOwned>(parameter: &str, name: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .map_err(|_| ExtractionError::config(parameter, format!("has unknown value '{}'", name)))
}

impl FromStr for SkinType {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self> {
        parse_named("skin_type", s)
    }
}

impl FromStr for ClusterAlgorithm {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self> {
        parse_named("algorithm", s)
    }
}

impl FromStr for SelectionStrategy {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self> {
        parse_named("strategy", s)
    }
}

impl FromStr for NamingAlgorithm {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self> {
        parse_named("algorithm", s)
    }
}

impl FromStr for Weighting {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self> {
        parse_named("weighting", s)
    }
}

impl FromStr for DistanceMetric {
    type Err = ExtractionError;

    fn from_str(s: &str) -> Result<Self> {
        parse_named("metric", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_yields_defaults() {
        let config = PipelineConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.resize.crop, 0.90);
        assert_eq!(config.cluster.max_k, 7);
        assert_eq!(config.selector.strategy, SelectionStrategy::Largest);
    }

    #[test]
    fn test_partial_override_keeps_sibling_defaults() {
        let config = PipelineConfig::from_json_str(
            r#"{ "background": { "max_distance": 8.0 }, "selector": { "strategy": "ratio" } }"#,
        )
        .unwrap();

        assert_eq!(config.background.max_distance, 8.0);
        assert!(config.background.use_lab);
        assert_eq!(config.background.edge_thinning, 3);
        assert_eq!(config.selector.strategy, SelectionStrategy::Ratio);
        assert_eq!(config.selector.ratio_threshold, 0.75);
    }

    #[test]
    fn test_unknown_option_is_rejected() {
        let result = PipelineConfig::from_json_str(r#"{ "resize": { "cropp": 0.5 } }"#);
        assert!(matches!(result, Err(ExtractionError::ConfigParse { .. })));

        let result = PipelineConfig::from_json_str(r#"{ "blur": {} }"#);
        assert!(matches!(result, Err(ExtractionError::ConfigParse { .. })));
    }

    #[test]
    fn test_unknown_strategy_is_rejected() {
        let result = PipelineConfig::from_json_str(r#"{ "selector": { "strategy": "median" } }"#);
        assert!(result.is_err());

        let err = "median".parse::<SelectionStrategy>().unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidConfiguration { .. }));
    }

    #[test]
    fn test_named_enums_from_str() {
        assert_eq!("all".parse::<SelectionStrategy>().unwrap(), SelectionStrategy::All);
        assert_eq!("kmeans".parse::<ClusterAlgorithm>().unwrap(), ClusterAlgorithm::KMeans);
        assert_eq!("none".parse::<SkinType>().unwrap(), SkinType::None);
        assert_eq!("custom".parse::<NamingAlgorithm>().unwrap(), NamingAlgorithm::Custom);
        assert_eq!("uniform".parse::<Weighting>().unwrap(), Weighting::Uniform);
        assert_eq!("manhattan".parse::<DistanceMetric>().unwrap(), DistanceMetric::Manhattan);
        assert!("svm".parse::<NamingAlgorithm>().is_err());
    }

    #[test]
    fn test_json_round_trip_preserves_overrides() {
        let mut config = PipelineConfig::default();
        config.cluster.seed = Some(7);
        config.naming.gray_name = "grey".to_string();

        let json = config.to_json_string().unwrap();
        let parsed = PipelineConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = PipelineConfig::from_json_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, ExtractionError::ConfigIo { .. }));
        assert!(err.to_string().contains("exist.json"));
    }
}
