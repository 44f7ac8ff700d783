//! Representative cluster selection

use tracing::debug;

use crate::color::cluster::ClusterResult;
use crate::color::Color;
use crate::config::{SelectionStrategy, SelectorConfig};
use crate::error::{ExtractionError, Result};
use crate::stage::{Configure, Stage};

/// How cluster centers are reduced to the representative colors
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    /// Center of the most populated cluster, lowest index on ties
    Largest,
    /// Centers of the most populated clusters until the given share of
    /// pixels is covered
    Ratio(f64),
    /// Every center, unchanged
    All,
}

/// Picks the cluster centers that stand for the garment
#[derive(Debug, Clone)]
pub struct ClusterSelector {
    selection: Selection,
}

impl Default for ClusterSelector {
    fn default() -> Self {
        Self {
            selection: Selection::Largest,
        }
    }
}

impl Configure for ClusterSelector {
    type Config = SelectorConfig;

    fn configure(config: SelectorConfig) -> Result<Self> {
        let selection = match config.strategy {
            SelectionStrategy::Largest => Selection::Largest,
            SelectionStrategy::All => Selection::All,
            SelectionStrategy::Ratio => {
                let threshold = config.ratio_threshold;
                if !(threshold > 0.0 && threshold <= 1.0) {
                    return Err(ExtractionError::config(
                        "selector.ratio_threshold",
                        format!("must be in (0, 1], got {}", threshold),
                    ));
                }
                Selection::Ratio(threshold)
            }
        };
        Ok(Self { selection })
    }
}

impl ClusterSelector {
    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Representative colors of a clustering, never empty when `k >= 1`
    pub fn select(&self, clusters: &ClusterResult) -> Vec<Color> {
        let counts = clusters.counts();
        let selected = match self.selection {
            Selection::All => clusters.centers.clone(),
            Selection::Largest => {
                let mut best = 0;
                for (i, &count) in counts.iter().enumerate() {
                    if count > counts[best] {
                        best = i;
                    }
                }
                clusters.centers.get(best).copied().into_iter().collect()
            }
            Selection::Ratio(threshold) => {
                let mut order: Vec<usize> = (0..counts.len()).collect();
                // stable, so equal counts keep ascending index order
                order.sort_by(|&a, &b| counts[b].cmp(&counts[a]));

                let total: usize = counts.iter().sum();
                let target = threshold * total as f64;
                let mut covered = 0;
                let mut selected = Vec::new();
                for i in order {
                    selected.push(clusters.centers[i]);
                    covered += counts[i];
                    if covered as f64 >= target {
                        break;
                    }
                }
                selected
            }
        };

        debug!(
            k = clusters.k,
            selected = selected.len(),
            strategy = ?self.selection,
            "selected representative colors"
        );
        selected
    }
}

impl Stage<ClusterResult> for ClusterSelector {
    type Output = Vec<Color>;

    fn name(&self) -> &'static str {
        "select"
    }

    fn process(&self, input: &ClusterResult) -> Result<Vec<Color>> {
        Ok(self.select(input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Color = [200.0, 30.0, 30.0];
    const BLUE: Color = [30.0, 30.0, 200.0];
    const GREEN: Color = [30.0, 200.0, 30.0];

    fn clusters(centers: Vec<Color>, counts: &[usize]) -> ClusterResult {
        let labels = counts
            .iter()
            .enumerate()
            .flat_map(|(label, &count)| std::iter::repeat(label).take(count))
            .collect();
        ClusterResult {
            k: centers.len(),
            labels,
            centers,
        }
    }

    fn selector(strategy: SelectionStrategy, ratio_threshold: f64) -> ClusterSelector {
        ClusterSelector::configure(SelectorConfig {
            strategy,
            ratio_threshold,
        })
        .unwrap()
    }

    #[test]
    fn test_largest_picks_most_populated() {
        let result = clusters(vec![BLUE, RED], &[30, 70]);
        assert_eq!(ClusterSelector::default().select(&result), vec![RED]);
    }

    #[test]
    fn test_largest_tie_goes_to_lowest_index() {
        let result = clusters(vec![GREEN, RED, BLUE], &[10, 40, 40]);
        assert_eq!(ClusterSelector::default().select(&result), vec![RED]);
    }

    #[test]
    fn test_ratio_stops_once_threshold_reached() {
        let result = clusters(vec![RED, BLUE], &[70, 30]);
        assert_eq!(
            selector(SelectionStrategy::Ratio, 0.75).select(&result),
            vec![RED, BLUE]
        );
        assert_eq!(
            selector(SelectionStrategy::Ratio, 0.5).select(&result),
            vec![RED]
        );
        // reaching the threshold exactly is enough
        assert_eq!(
            selector(SelectionStrategy::Ratio, 0.7).select(&result),
            vec![RED]
        );
    }

    #[test]
    fn test_ratio_orders_by_count_then_index() {
        let result = clusters(vec![GREEN, RED, BLUE], &[25, 50, 25]);
        assert_eq!(
            selector(SelectionStrategy::Ratio, 0.75).select(&result),
            vec![RED, GREEN]
        );
    }

    #[test]
    fn test_all_returns_centers_unchanged() {
        let result = clusters(vec![GREEN, RED, BLUE], &[5, 90, 5]);
        assert_eq!(
            selector(SelectionStrategy::All, 0.75).select(&result),
            vec![GREEN, RED, BLUE]
        );
    }

    #[test]
    fn test_single_center_selected_by_every_strategy() {
        let result = clusters(vec![BLUE], &[12]);
        for strategy in [
            SelectionStrategy::Largest,
            SelectionStrategy::Ratio,
            SelectionStrategy::All,
        ] {
            assert_eq!(selector(strategy, 0.75).select(&result), vec![BLUE]);
        }
    }

    #[test]
    fn test_ratio_threshold_validated() {
        for threshold in [0.0, -0.2, 1.5, f64::NAN] {
            let config = SelectorConfig {
                strategy: SelectionStrategy::Ratio,
                ratio_threshold: threshold,
            };
            assert!(ClusterSelector::configure(config).is_err());
        }
        assert_eq!(
            selector(SelectionStrategy::Ratio, 1.0).selection(),
            Selection::Ratio(1.0)
        );
    }
}
