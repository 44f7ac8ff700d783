//! Color clustering, selection and naming
//!
//! This module groups foreground pixels into color clusters, reduces the
//! clusters to representative colors and names them.

pub mod classifier;
pub mod cluster;
pub mod conversion;
pub mod naming;
pub mod selector;

pub use classifier::{ColorClassifier, KnnClassifier, StandardScaler};
pub use cluster::{ClusterResult, ColorClusterer};
pub use naming::ColorNamer;
pub use selector::{ClusterSelector, Selection};

/// RGB color vector on the 0-255 scale
///
/// Cluster centers are means of pixels, so channels are fractional.
pub type Color = [f32; 3];
