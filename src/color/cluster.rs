//! Adaptive color clustering
//!
//! Foreground pixels are grouped with k-means for every candidate k in the
//! configured range. The cluster count is chosen with a distortion jump
//! statistic: for each k the transformed distortion
//! `(compactness / n) ^ -1.5` is compared with the previous candidate, and
//! the run with the largest jump over the whole range is kept.
//!
//! Candidates larger than the number of distinct input colors are skipped,
//! so flat-colored subjects still cluster with `min_k` clusters.

use std::cmp::Ordering;
use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

use crate::color::conversion::squared_distance;
use crate::color::Color;
use crate::config::{ClusterAlgorithm, ClusterConfig};
use crate::constants::cluster::DISTORTION_POWER;
use crate::error::{ExtractionError, Result};
use crate::stage::{Configure, Stage};

/// Chosen cluster count with per-pixel labels and cluster centers
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterResult {
    pub k: usize,
    /// One label in `[0, k)` per input pixel
    pub labels: Vec<usize>,
    /// `k` centers; `centers[labels[i]]` is the center of pixel `i`
    pub centers: Vec<Color>,
}

impl ClusterResult {
    /// Number of pixels assigned to each cluster, by cluster index
    pub fn counts(&self) -> Vec<usize> {
        let mut counts = vec![0; self.k];
        for &label in &self.labels {
            counts[label] += 1;
        }
        counts
    }
}

/// Best k-means run for one candidate k
#[derive(Debug, Clone)]
struct KMeansRun {
    compactness: f64,
    labels: Vec<usize>,
    centers: Vec<Color>,
}

/// Color clusterer with automatic selection of the cluster count
#[derive(Debug, Clone)]
pub struct ColorClusterer {
    algorithm: ClusterAlgorithm,
    min_k: usize,
    max_k: usize,
    attempts: usize,
    max_iterations: usize,
    epsilon: f32,
    seed: Option<u64>,
}

impl Default for ColorClusterer {
    fn default() -> Self {
        Self::from_valid(ClusterConfig::default())
    }
}

impl Configure for ColorClusterer {
    type Config = ClusterConfig;

    fn configure(config: ClusterConfig) -> Result<Self> {
        if config.min_k == 0 {
            return Err(ExtractionError::config("cluster.min_k", "must be at least 1"));
        }
        if config.max_k <= config.min_k {
            return Err(ExtractionError::config(
                "cluster.max_k",
                format!(
                    "must exceed min_k, the range [{}, {}) is empty",
                    config.min_k, config.max_k
                ),
            ));
        }
        if config.attempts == 0 {
            return Err(ExtractionError::config("cluster.attempts", "must be at least 1"));
        }
        if config.max_iterations == 0 {
            return Err(ExtractionError::config("cluster.max_iterations", "must be at least 1"));
        }
        if !(config.epsilon.is_finite() && config.epsilon >= 0.0) {
            return Err(ExtractionError::config(
                "cluster.epsilon",
                format!("must be a non-negative number, got {}", config.epsilon),
            ));
        }
        Ok(Self::from_valid(config))
    }
}

impl ColorClusterer {
    fn from_valid(config: ClusterConfig) -> Self {
        Self {
            algorithm: config.algorithm,
            min_k: config.min_k,
            max_k: config.max_k,
            attempts: config.attempts,
            max_iterations: config.max_iterations,
            epsilon: config.epsilon,
            seed: config.seed,
        }
    }

    /// Cluster `pixels`, choosing k automatically
    ///
    /// # Errors
    ///
    /// Returns `ExtractionError::ClusteringFailure` if `pixels` has fewer
    /// distinct colors than `min_k`, which includes an empty input from a
    /// fully masked image
    pub fn cluster(&self, pixels: &[Color]) -> Result<ClusterResult> {
        match self.algorithm {
            ClusterAlgorithm::KMeans => self.jump(pixels),
        }
    }

    fn jump(&self, pixels: &[Color]) -> Result<ClusterResult> {
        let distinct = count_distinct(pixels, self.max_k);
        if distinct < self.min_k {
            return Err(ExtractionError::clustering(
                self.min_k,
                format!(
                    "only {} distinct colors among {} pixels",
                    distinct,
                    pixels.len()
                ),
            ));
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        // more clusters than distinct colors would only duplicate centers
        let max_k = self.max_k.min(distinct + 1);
        if max_k < self.max_k {
            debug!(distinct, max_k, "fewer distinct colors than candidates");
        }

        let npixels = pixels.len() as f64;
        let mut runs = Vec::with_capacity(max_k - self.min_k);
        let mut distortions = Vec::with_capacity(max_k - self.min_k);
        for k in self.min_k..max_k {
            let run = self.kmeans(pixels, k, &mut rng);
            let distortion = transformed_distortion(run.compactness, npixels);
            trace!(k, compactness = run.compactness, distortion, "k-means candidate");
            distortions.push(distortion);
            runs.push(run);
        }

        let best = best_jump_index(&distortions)
            .ok_or_else(|| ExtractionError::clustering(self.min_k, "no candidate produced a finite jump"))?;
        let run = runs.swap_remove(best);
        let k = self.min_k + best;
        debug!(k, npixels = pixels.len(), "selected cluster count");

        Ok(ClusterResult {
            k,
            labels: run.labels,
            centers: run.centers,
        })
    }

    /// Random-center k-means, best compactness over all attempts
    fn kmeans(&self, pixels: &[Color], k: usize, rng: &mut StdRng) -> KMeansRun {
        let (lower, upper) = bounding_box(pixels);
        let mut best: Option<KMeansRun> = None;

        for attempt in 0..self.attempts {
            let mut centers: Vec<Color> = (0..k).map(|_| random_center(&lower, &upper, rng)).collect();
            let mut labels = vec![0; pixels.len()];

            for iteration in 0..self.max_iterations {
                assign(pixels, &centers, &mut labels);
                let updated = update_centers(pixels, &mut labels, &centers);
                let shift = centers
                    .iter()
                    .zip(&updated)
                    .map(|(a, b)| squared_distance(a, b))
                    .fold(0.0f32, f32::max)
                    .sqrt();
                centers = updated;
                if shift <= self.epsilon {
                    trace!(k, attempt, iteration, "k-means converged");
                    break;
                }
            }

            let compactness = assign(pixels, &centers, &mut labels);
            if best.as_ref().map_or(true, |b| compactness < b.compactness) {
                best = Some(KMeansRun {
                    compactness,
                    labels,
                    centers,
                });
            }
        }

        // attempts >= 1 is checked in configure
        best.unwrap_or_else(|| KMeansRun {
            compactness: f64::INFINITY,
            labels: vec![0; pixels.len()],
            centers: vec![lower; k],
        })
    }
}

impl Stage<[Color]> for ColorClusterer {
    type Output = ClusterResult;

    fn name(&self) -> &'static str {
        "cluster"
    }

    fn process(&self, input: &[Color]) -> Result<ClusterResult> {
        self.cluster(input)
    }
}

/// `(compactness / n) ^ -1.5`, floored so exact fits stay finite
fn transformed_distortion(compactness: f64, npixels: f64) -> f64 {
    (compactness / npixels).max(f64::EPSILON).powf(-DISTORTION_POWER)
}

/// Index of the largest `distortion[i - 1] - distortion[i]`
///
/// The distortion before the first candidate counts as 0. This is a global
/// best-so-far scan: later candidates replace earlier ones only with a
/// strictly larger jump, and the scan never stops at a local peak.
pub fn best_jump_index(distortions: &[f64]) -> Option<usize> {
    let mut previous = 0.0;
    let mut largest = f64::NEG_INFINITY;
    let mut best = None;
    for (i, &distortion) in distortions.iter().enumerate() {
        let jump = previous - distortion;
        previous = distortion;
        if jump > largest {
            largest = jump;
            best = Some(i);
        }
    }
    best
}

/// Distinct colors in `pixels`, counting stops at `limit`
fn count_distinct(pixels: &[Color], limit: usize) -> usize {
    let mut seen = HashSet::new();
    for pixel in pixels {
        seen.insert(pixel.map(f32::to_bits));
        if seen.len() >= limit {
            break;
        }
    }
    seen.len()
}

fn bounding_box(pixels: &[Color]) -> (Color, Color) {
    let mut lower = [f32::INFINITY; 3];
    let mut upper = [f32::NEG_INFINITY; 3];
    for pixel in pixels {
        for c in 0..3 {
            lower[c] = lower[c].min(pixel[c]);
            upper[c] = upper[c].max(pixel[c]);
        }
    }
    (lower, upper)
}

fn random_center(lower: &Color, upper: &Color, rng: &mut StdRng) -> Color {
    let mut center = *lower;
    for c in 0..3 {
        if upper[c] > lower[c] {
            center[c] = rng.random_range(lower[c]..=upper[c]);
        }
    }
    center
}

/// Label every pixel with its nearest center, returning the compactness
fn assign(pixels: &[Color], centers: &[Color], labels: &mut [usize]) -> f64 {
    let mut compactness = 0.0f64;
    for (pixel, label) in pixels.iter().zip(labels.iter_mut()) {
        let (nearest, distance) = centers
            .iter()
            .map(|center| squared_distance(pixel, center))
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
            .unwrap_or((0, 0.0));
        *label = nearest;
        compactness += distance as f64;
    }
    compactness
}

/// Mean of each cluster; an empty cluster takes over the worst-fitting pixel
fn update_centers(pixels: &[Color], labels: &mut [usize], centers: &[Color]) -> Vec<Color> {
    let k = centers.len();
    let mut counts = vec![0usize; k];
    for &label in labels.iter() {
        counts[label] += 1;
    }

    for empty in 0..k {
        if counts[empty] != 0 {
            continue;
        }
        let worst = (0..pixels.len())
            .filter(|&i| counts[labels[i]] > 1)
            .map(|i| (i, squared_distance(&pixels[i], &centers[labels[i]])))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
        if let Some((i, _)) = worst {
            counts[labels[i]] -= 1;
            labels[i] = empty;
            counts[empty] = 1;
        }
    }

    let mut sums = vec![[0.0f64; 3]; k];
    for (pixel, &label) in pixels.iter().zip(labels.iter()) {
        for c in 0..3 {
            sums[label][c] += pixel[c] as f64;
        }
    }

    sums.iter()
        .zip(&counts)
        .zip(centers)
        .map(|((sum, &count), previous)| {
            if count == 0 {
                *previous
            } else {
                let n = count as f64;
                [(sum[0] / n) as f32, (sum[1] / n) as f32, (sum[2] / n) as f32]
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(min_k: usize, max_k: usize) -> ColorClusterer {
        ColorClusterer::configure(ClusterConfig {
            min_k,
            max_k,
            seed: Some(42),
            ..ClusterConfig::default()
        })
        .unwrap()
    }

    /// Jittered samples around a few base colors
    fn blobs(bases: &[Color], per_blob: usize) -> Vec<Color> {
        let mut rng = StdRng::seed_from_u64(7);
        let mut pixels = Vec::new();
        for base in bases {
            for _ in 0..per_blob {
                pixels.push([
                    base[0] + rng.random_range(-6.0f32..6.0),
                    base[1] + rng.random_range(-6.0f32..6.0),
                    base[2] + rng.random_range(-6.0f32..6.0),
                ]);
            }
        }
        pixels
    }

    #[test]
    fn test_labels_and_centers_shape() {
        let pixels = blobs(&[[200.0, 20.0, 20.0], [20.0, 200.0, 20.0], [20.0, 20.0, 200.0]], 80);
        let result = seeded(2, 7).cluster(&pixels).unwrap();

        assert!((2..7).contains(&result.k));
        assert_eq!(result.centers.len(), result.k);
        assert_eq!(result.labels.len(), pixels.len());
        assert!(result.labels.iter().all(|&l| l < result.k));
        assert_eq!(result.counts().iter().sum::<usize>(), pixels.len());
    }

    #[test]
    fn test_labels_point_to_nearest_center() {
        let pixels = blobs(&[[240.0, 240.0, 30.0], [30.0, 30.0, 120.0]], 50);
        let result = seeded(2, 5).cluster(&pixels).unwrap();

        for (pixel, &label) in pixels.iter().zip(&result.labels) {
            let own = squared_distance(pixel, &result.centers[label]);
            for center in &result.centers {
                assert!(own <= squared_distance(pixel, center) + 1e-3);
            }
        }
    }

    #[test]
    fn test_single_candidate_separates_two_colors() {
        let mut pixels = vec![[255.0, 0.0, 0.0]; 70];
        pixels.extend(vec![[0.0, 0.0, 255.0]; 30]);
        let result = seeded(2, 3).cluster(&pixels).unwrap();

        assert_eq!(result.k, 2);
        let mut counts = result.counts();
        counts.sort_unstable();
        assert_eq!(counts, vec![30, 70]);
        assert!(result.centers.contains(&[255.0, 0.0, 0.0]));
        assert!(result.centers.contains(&[0.0, 0.0, 255.0]));
    }

    #[test]
    fn test_empty_input_fails() {
        let err = ColorClusterer::default().cluster(&[]).unwrap_err();
        assert!(matches!(err, ExtractionError::ClusteringFailure { k: 2, .. }));
    }

    #[test]
    fn test_too_few_distinct_colors_fails() {
        let pixels = vec![[255.0, 255.0, 255.0]; 500];
        let err = ColorClusterer::default().cluster(&pixels).unwrap_err();
        assert!(matches!(err, ExtractionError::ClusteringFailure { k: 2, .. }));

        let err = seeded(3, 6).cluster(&[[1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]).unwrap_err();
        assert!(matches!(err, ExtractionError::ClusteringFailure { k: 3, .. }));
    }

    #[test]
    fn test_candidates_limited_to_distinct_colors() {
        // a flat subject with one blended shade: only k = 2 can run
        let mut pixels = vec![[30.0, 40.0, 220.0]; 3000];
        pixels.extend(vec![[140.0, 150.0, 240.0]; 120]);
        let result = ColorClusterer::default().cluster(&pixels).unwrap();
        assert_eq!(result.k, 2);
        assert_eq!(result.counts().iter().max(), Some(&3000));

        // three colors allow k = 2 and 3 but nothing above
        let pixels = vec![[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [3.0, 0.0, 0.0]];
        let result = seeded(2, 6).cluster(&pixels).unwrap();
        assert!((2..=3).contains(&result.k));
        assert_eq!(result.centers.len(), result.k);
    }

    #[test]
    fn test_seed_makes_runs_reproducible() {
        let pixels = blobs(&[[90.0, 60.0, 30.0], [10.0, 140.0, 160.0], [230.0, 200.0, 190.0]], 40);
        let first = seeded(2, 6).cluster(&pixels).unwrap();
        let second = seeded(2, 6).cluster(&pixels).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_best_jump_is_global_not_first_peak() {
        // Jumps: -10, -2, -18, -1, -29; the first local peak is at index 1
        let distortions = [10.0, 12.0, 30.0, 31.0, 60.0];
        assert_eq!(best_jump_index(&distortions), Some(3));
        assert_eq!(best_jump_index(&[]), None);
        assert_eq!(best_jump_index(&[5.0]), Some(0));
    }

    #[test]
    fn test_exact_fit_keeps_distortion_finite() {
        assert!(transformed_distortion(0.0, 100.0).is_finite());
        let loose = transformed_distortion(1000.0, 10.0);
        let tight = transformed_distortion(10.0, 10.0);
        assert!(tight > loose);
    }

    #[test]
    fn test_empty_cluster_reseeded() {
        let pixels = vec![[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [100.0, 0.0, 0.0]];
        let mut labels = vec![0, 0, 0];
        let centers = vec![[10.0, 0.0, 0.0], [500.0, 500.0, 500.0]];
        let updated = update_centers(&pixels, &mut labels, &centers);
        assert_eq!(labels, vec![0, 0, 1]);
        assert_eq!(updated[1], [100.0, 0.0, 0.0]);
        assert_eq!(updated[0], [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_invalid_ranges_rejected() {
        let empty_range = ClusterConfig {
            min_k: 4,
            max_k: 4,
            ..ClusterConfig::default()
        };
        assert!(ColorClusterer::configure(empty_range).is_err());

        let zero_k = ClusterConfig {
            min_k: 0,
            ..ClusterConfig::default()
        };
        assert!(ColorClusterer::configure(zero_k).is_err());

        let no_attempts = ClusterConfig {
            attempts: 0,
            ..ClusterConfig::default()
        };
        assert!(ColorClusterer::configure(no_attempts).is_err());
    }
}
