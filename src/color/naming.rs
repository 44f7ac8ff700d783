//! Color naming
//!
//! A [`ColorNamer`] turns a color vector into human-readable names. Colors
//! close to the gray axis are named by luminance alone (black, gray or
//! white); every other color goes through a classifier trained on a table
//! of named reference samples.
//!
//! ```
//! use color_tagger::{ColorNamer, NamingConfig};
//!
//! let samples = [[220.0, 30.0, 40.0], [30.0, 60.0, 200.0]];
//! let namer = ColorNamer::new(&samples, &["red", "blue"], NamingConfig::default())?;
//!
//! assert_eq!(namer.name([210.0, 40.0, 35.0])?, vec!["red".to_string()]);
//! assert_eq!(namer.name([250.0, 250.0, 250.0])?, vec!["white".to_string()]);
//! # Ok::<(), color_tagger::ExtractionError>(())
//! ```

use std::collections::BTreeSet;
use std::fmt;

use tracing::{debug, trace};

use crate::color::classifier::{ColorClassifier, KnnClassifier, StandardScaler};
use crate::color::conversion::{gray_axis_distance, luminance};
use crate::color::Color;
use crate::config::{NamingAlgorithm, NamingConfig};
use crate::error::{ExtractionError, Result};
use crate::stage::Stage;

/// Luminance naming for near-gray colors
#[derive(Debug, Clone, PartialEq)]
struct Monochrome {
    black: String,
    gray: String,
    white: String,
    max_gray_distance: f32,
    black_max_luminance: f32,
    white_min_luminance: f32,
}

impl Monochrome {
    fn name(&self, color: Color) -> Option<&str> {
        if gray_axis_distance(color) > self.max_gray_distance {
            return None;
        }
        let lum = luminance(color);
        let name = if lum <= self.black_max_luminance {
            &self.black
        } else if lum >= self.white_min_luminance {
            &self.white
        } else {
            &self.gray
        };
        Some(name)
    }
}

/// Trained color namer, read-only once constructed
pub struct ColorNamer {
    names: Vec<String>,
    scaler: Option<StandardScaler>,
    classifier: Box<dyn ColorClassifier>,
    monochrome: Option<Monochrome>,
}

impl fmt::Debug for ColorNamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColorNamer")
            .field("names", &self.names)
            .field("scaler", &self.scaler)
            .field("monochrome", &self.monochrome)
            .finish_non_exhaustive()
    }
}

impl ColorNamer {
    /// Train the built-in kNN classifier on a named sample table
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::InvalidConfiguration` for an invalid sample
    /// table or naming config, including `algorithm = custom`, which needs
    /// [`ColorNamer::with_classifier`]
    pub fn new<S: AsRef<str>>(samples: &[Color], labels: &[S], config: NamingConfig) -> Result<Self> {
        if config.algorithm == NamingAlgorithm::Custom {
            return Err(ExtractionError::config(
                "naming.algorithm",
                "custom requires a classifier, use ColorNamer::with_classifier",
            ));
        }
        let classifier = Box::new(KnnClassifier::from_config(&config));
        Self::train(samples, labels, config, classifier)
    }

    /// Train a caller supplied classifier on a named sample table
    ///
    /// The classifier sees the same (optionally scaled) samples and name
    /// indices the built-in kNN would.
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::InvalidConfiguration` unless
    /// `config.algorithm` is `custom`
    pub fn with_classifier<S: AsRef<str>>(
        samples: &[Color],
        labels: &[S],
        config: NamingConfig,
        classifier: Box<dyn ColorClassifier>,
    ) -> Result<Self> {
        if config.algorithm != NamingAlgorithm::Custom {
            return Err(ExtractionError::config(
                "naming.algorithm",
                format!("must be custom to use a supplied classifier, got {:?}", config.algorithm),
            ));
        }
        Self::train(samples, labels, config, classifier)
    }

    fn train<S: AsRef<str>>(
        samples: &[Color],
        labels: &[S],
        config: NamingConfig,
        mut classifier: Box<dyn ColorClassifier>,
    ) -> Result<Self> {
        validate(samples, labels, &config)?;

        let names: Vec<String> = labels
            .iter()
            .map(|l| l.as_ref())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        let indices: Vec<usize> = labels
            .iter()
            .map(|l| names.binary_search_by(|n| n.as_str().cmp(l.as_ref())).unwrap_or(0))
            .collect();

        let scaler = config.scale.then(|| StandardScaler::fit(samples));
        let training: Vec<Color> = match &scaler {
            Some(scaler) => samples.iter().map(|s| scaler.transform(s)).collect(),
            None => samples.to_vec(),
        };
        classifier.fit(&training, &indices)?;

        let monochrome = config.hard_monochrome.then(|| Monochrome {
            black: config.black_name,
            gray: config.gray_name,
            white: config.white_name,
            max_gray_distance: config.max_gray_distance,
            black_max_luminance: config.black_max_luminance,
            white_min_luminance: config.white_min_luminance,
        });

        debug!(
            samples = samples.len(),
            names = names.len(),
            scaled = scaler.is_some(),
            "trained color namer"
        );

        Ok(Self {
            names,
            scaler,
            classifier,
            monochrome,
        })
    }

    /// Sorted, deduplicated names the classifier can produce
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Names for one color vector
    pub fn name(&self, color: Color) -> Result<Vec<String>> {
        if let Some(name) = self.monochrome.as_ref().and_then(|m| m.name(color)) {
            trace!(?color, name, "monochrome override");
            return Ok(vec![name.to_string()]);
        }

        let query = match &self.scaler {
            Some(scaler) => scaler.transform(&color),
            None => color,
        };
        let index = self.classifier.predict(&query)?;
        let name = self.names.get(index).ok_or_else(|| {
            ExtractionError::config(
                "naming.classifier",
                format!("predicted index {} outside {} names", index, self.names.len()),
            )
        })?;
        trace!(?color, name = name.as_str(), "classified");
        Ok(vec![name.clone()])
    }
}

fn validate<S: AsRef<str>>(samples: &[Color], labels: &[S], config: &NamingConfig) -> Result<()> {
    if samples.is_empty() {
        return Err(ExtractionError::config("samples", "sample table is empty"));
    }
    if samples.len() != labels.len() {
        return Err(ExtractionError::config(
            "samples",
            format!("{} samples but {} labels", samples.len(), labels.len()),
        ));
    }
    if let Some(i) = samples.iter().position(|s| s.iter().any(|v| !v.is_finite())) {
        return Err(ExtractionError::config(
            "samples",
            format!("sample {} has a non-finite channel", i),
        ));
    }
    if config.neighbors == 0 {
        return Err(ExtractionError::config("naming.neighbors", "must be at least 1"));
    }
    if !(config.max_gray_distance >= 0.0) {
        return Err(ExtractionError::config(
            "naming.max_gray_distance",
            "must be non-negative",
        ));
    }
    if !(config.black_max_luminance < config.white_min_luminance) {
        return Err(ExtractionError::config(
            "naming.black_max_luminance",
            format!(
                "must be below white_min_luminance ({} >= {})",
                config.black_max_luminance, config.white_min_luminance
            ),
        ));
    }
    Ok(())
}

impl Stage<Color> for ColorNamer {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "name"
    }

    fn process(&self, input: &Color) -> Result<Vec<String>> {
        ColorNamer::name(self, *input)
    }
}
