//! Supervised classifiers mapping a color to a name index

use std::cmp::Ordering;

use crate::color::Color;
use crate::config::{DistanceMetric, NamingConfig, Weighting};
use crate::error::{ExtractionError, Result};

/// Trainable color classifier
///
/// Labels are indices into the namer's name table. A classifier is fitted
/// once at construction and only queried afterwards, possibly from several
/// threads at once.
pub trait ColorClassifier: Send + Sync {
    fn fit(&mut self, samples: &[Color], labels: &[usize]) -> Result<()>;

    fn predict(&self, sample: &Color) -> Result<usize>;
}

/// Per-channel z-score standardization
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandardScaler {
    mean: [f32; 3],
    std: [f32; 3],
}

impl StandardScaler {
    /// Fit mean and population standard deviation over `samples`
    ///
    /// A channel without spread keeps a standard deviation of 1.
    pub fn fit(samples: &[Color]) -> Self {
        let n = samples.len().max(1) as f64;
        let mut mean = [0.0f64; 3];
        for sample in samples {
            for c in 0..3 {
                mean[c] += sample[c] as f64;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut variance = [0.0f64; 3];
        for sample in samples {
            for c in 0..3 {
                let d = sample[c] as f64 - mean[c];
                variance[c] += d * d;
            }
        }

        let std = variance.map(|v| {
            let s = (v / n).sqrt();
            if s > 0.0 {
                s as f32
            } else {
                1.0
            }
        });
        Self {
            mean: mean.map(|m| m as f32),
            std,
        }
    }

    pub fn transform(&self, color: &Color) -> Color {
        [
            (color[0] - self.mean[0]) / self.std[0],
            (color[1] - self.mean[1]) / self.std[1],
            (color[2] - self.mean[2]) / self.std[2],
        ]
    }
}

/// k-nearest-neighbor vote over the training samples
#[derive(Debug, Clone)]
pub struct KnnClassifier {
    neighbors: usize,
    weighting: Weighting,
    metric: DistanceMetric,
    samples: Vec<Color>,
    labels: Vec<usize>,
}

impl KnnClassifier {
    pub fn new(neighbors: usize, weighting: Weighting, metric: DistanceMetric) -> Self {
        Self {
            neighbors,
            weighting,
            metric,
            samples: Vec::new(),
            labels: Vec::new(),
        }
    }

    pub fn from_config(config: &NamingConfig) -> Self {
        Self::new(config.neighbors, config.weighting, config.metric)
    }

    fn distance(&self, a: &Color, b: &Color) -> f32 {
        match self.metric {
            DistanceMetric::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
            DistanceMetric::Manhattan => a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum(),
        }
    }
}

impl ColorClassifier for KnnClassifier {
    fn fit(&mut self, samples: &[Color], labels: &[usize]) -> Result<()> {
        if self.neighbors == 0 {
            return Err(ExtractionError::config("naming.neighbors", "must be at least 1"));
        }
        if samples.is_empty() || samples.len() != labels.len() {
            return Err(ExtractionError::config(
                "samples",
                format!(
                    "expected matching non-empty samples and labels, got {} and {}",
                    samples.len(),
                    labels.len()
                ),
            ));
        }
        self.samples = samples.to_vec();
        self.labels = labels.to_vec();
        Ok(())
    }

    fn predict(&self, sample: &Color) -> Result<usize> {
        if self.samples.is_empty() {
            return Err(ExtractionError::config("naming", "classifier queried before fit"));
        }

        let mut nearest: Vec<(f32, usize)> = self
            .samples
            .iter()
            .zip(&self.labels)
            .map(|(s, &label)| (self.distance(sample, s), label))
            .collect();
        // stable, so equidistant samples keep training order
        nearest.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
        nearest.truncate(self.neighbors.min(self.samples.len()));

        let classes = self.labels.iter().max().map_or(0, |&m| m + 1);
        let mut votes = vec![0.0f64; classes];
        let exact = nearest.iter().any(|&(d, _)| d == 0.0);
        for &(distance, label) in &nearest {
            let weight = match self.weighting {
                Weighting::Uniform => 1.0,
                Weighting::Distance if exact => {
                    if distance == 0.0 {
                        1.0
                    } else {
                        0.0
                    }
                }
                Weighting::Distance => 1.0 / distance as f64,
            };
            votes[label] += weight;
        }

        let mut best = 0;
        for (label, &vote) in votes.iter().enumerate() {
            if vote > votes[best] {
                best = label;
            }
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted(neighbors: usize, weighting: Weighting) -> KnnClassifier {
        let mut knn = KnnClassifier::new(neighbors, weighting, DistanceMetric::Euclidean);
        let samples = [
            [250.0, 10.0, 10.0],
            [230.0, 30.0, 20.0],
            [10.0, 10.0, 250.0],
            [20.0, 40.0, 220.0],
            [30.0, 20.0, 240.0],
        ];
        knn.fit(&samples, &[0, 0, 1, 1, 1]).unwrap();
        knn
    }

    #[test]
    fn test_training_sample_round_trips() {
        let knn = fitted(50, Weighting::Distance);
        assert_eq!(knn.predict(&[250.0, 10.0, 10.0]).unwrap(), 0);
        assert_eq!(knn.predict(&[20.0, 40.0, 220.0]).unwrap(), 1);
    }

    #[test]
    fn test_distance_weighting_favors_close_samples() {
        // two red samples are close, three blue far away
        let knn = fitted(5, Weighting::Distance);
        assert_eq!(knn.predict(&[240.0, 20.0, 15.0]).unwrap(), 0);

        // plain majority of all five samples is blue
        let knn = fitted(5, Weighting::Uniform);
        assert_eq!(knn.predict(&[240.0, 20.0, 15.0]).unwrap(), 1);
    }

    #[test]
    fn test_vote_tie_goes_to_lowest_index() {
        let mut knn = KnnClassifier::new(2, Weighting::Uniform, DistanceMetric::Manhattan);
        knn.fit(&[[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]], &[1, 0]).unwrap();
        assert_eq!(knn.predict(&[5.0, 0.0, 0.0]).unwrap(), 0);
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let knn = KnnClassifier::new(3, Weighting::Distance, DistanceMetric::Euclidean);
        assert!(knn.predict(&[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_scaler_standardizes_channels() {
        let scaler = StandardScaler::fit(&[[0.0, 5.0, 10.0], [10.0, 5.0, 30.0]]);
        assert_eq!(scaler.transform(&[5.0, 5.0, 20.0]), [0.0, 0.0, 0.0]);
        assert_eq!(scaler.transform(&[10.0, 6.0, 30.0]), [1.0, 1.0, 1.0]);
    }
}
