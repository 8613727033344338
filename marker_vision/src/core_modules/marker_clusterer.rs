// THEORY:
// The Marker Clusterer turns scattered marker pixels (e.g. the red border of a
// swatch) into rectangular clusters. It is a two-level greedy gap clustering over
// the x axis, with y bounds derived per group:
//
// 1.  **Marker Scan**: One row-major pass over the grid collects every marker
//     pixel, folded per column into a `ColumnExtent` (the column's y range).
// 2.  **Coarse Grouping**: The distinct marker columns, sorted ascending, are split
//     wherever consecutive columns are more than `gap_threshold` apart. Groups with
//     fewer than `min_group_size` columns are noise and are dropped.
// 3.  **Wide-Group Refinement**: A group spanning more than `wide_threshold` pixels
//     may be several adjacent rectangles merged by the coarse pass. Its columns are
//     re-split using `internal_gap_threshold` and every subgroup becomes its own
//     cluster. This happens exactly one level deep.
// 4.  **Bounds & Center**: Each emitted cluster carries the inclusive bounds of its
//     columns and the floor of each axis midpoint as its center.
//
// The clusterer is a stateless utility. The output is ordered by ascending
// `x_min` and is fully determined by the grid, the predicate, and the config.

use crate::core_modules::cluster::Cluster;
use crate::core_modules::gap_groups::{group_by_gaps, significant_gaps};
use crate::core_modules::marker::MarkerPredicate;
use crate::core_modules::sample_grid::SampleSource;
use crate::error::{Result, VisionError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const DEFAULT_GAP_THRESHOLD: u32 = 5;
pub const DEFAULT_INTERNAL_GAP_THRESHOLD: u32 = 10;
pub const DEFAULT_WIDE_THRESHOLD: u32 = 100;
pub const DEFAULT_MIN_GROUP_SIZE: usize = 2;

/// Tunables for `find_clusters`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Largest spacing between consecutive marker columns of the same group.
    pub gap_threshold: u32,
    /// Spacing used to re-split a wide group.
    pub internal_gap_threshold: u32,
    /// A group whose `x_max - x_min` exceeds this is refined.
    pub wide_threshold: u32,
    /// Minimum number of distinct marker columns a group needs to be kept.
    pub min_group_size: usize,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            gap_threshold: DEFAULT_GAP_THRESHOLD,
            internal_gap_threshold: DEFAULT_INTERNAL_GAP_THRESHOLD,
            wide_threshold: DEFAULT_WIDE_THRESHOLD,
            min_group_size: DEFAULT_MIN_GROUP_SIZE,
        }
    }
}

impl ClusterConfig {
    /// Rejects settings that could emit single-column clusters or split every
    /// column apart.
    pub fn validate(&self) -> Result<()> {
        if self.min_group_size < 2 {
            return Err(VisionError::InvalidConfig {
                field: "min_group_size",
                reason: format!("must be at least 2, got {}", self.min_group_size),
            });
        }
        if self.gap_threshold == 0 {
            return Err(VisionError::InvalidConfig {
                field: "gap_threshold",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.internal_gap_threshold == 0 {
            return Err(VisionError::InvalidConfig {
                field: "internal_gap_threshold",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// The y range covered by marker pixels in a single column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnExtent {
    pub x: u32,
    pub y_min: u32,
    pub y_max: u32,
    /// Number of marker pixels in the column.
    pub count: usize,
}

/// Every marker pixel of a grid, folded per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkerScan {
    columns: BTreeMap<u32, ColumnExtent>,
    total: usize,
}

impl MarkerScan {
    /// Total number of marker pixels found.
    pub fn marker_count(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// Distinct marker columns in ascending order.
    pub fn columns(&self) -> Vec<u32> {
        self.columns.keys().copied().collect()
    }

    pub fn column(&self, x: u32) -> Option<&ColumnExtent> {
        self.columns.get(&x)
    }

    /// y bounds of all marker pixels whose x lies in `[x_min, x_max]`.
    pub fn y_bounds(&self, x_min: u32, x_max: u32) -> Option<(u32, u32)> {
        self.columns
            .range(x_min..=x_max)
            .map(|(_, extent)| (extent.y_min, extent.y_max))
            .reduce(|(lo, hi), (y_min, y_max)| (lo.min(y_min), hi.max(y_max)))
    }

    fn record(&mut self, x: u32, y: u32) {
        self.total += 1;
        self.columns
            .entry(x)
            .and_modify(|extent| {
                extent.y_min = extent.y_min.min(y);
                extent.y_max = extent.y_max.max(y);
                extent.count += 1;
            })
            .or_insert(ColumnExtent {
                x,
                y_min: y,
                y_max: y,
                count: 1,
            });
    }
}

/// Collects every marker pixel of `grid` in a single row-major pass.
pub fn scan_markers<G, P>(grid: &G, predicate: &P) -> MarkerScan
where
    G: SampleSource + ?Sized,
    P: MarkerPredicate + ?Sized,
{
    let mut scan = MarkerScan::default();
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if predicate.is_marker(&grid.sample(x, y)) {
                scan.record(x, y);
            }
        }
    }
    scan
}

/// Finds the rectangular clusters of marker pixels in `grid`.
///
/// Never fails: an empty grid or a grid without markers yields no clusters, and a
/// predicate matching everything yields one cluster spanning the grid. The config
/// is used as given; see [`ClusterConfig::validate`].
pub fn find_clusters<G, P>(grid: &G, predicate: &P, config: &ClusterConfig) -> Vec<Cluster>
where
    G: SampleSource + ?Sized,
    P: MarkerPredicate + ?Sized,
{
    let scan = scan_markers(grid, predicate);
    clusters_from_scan(&scan, config)
}

/// Runs the grouping stages over an existing scan.
pub fn clusters_from_scan(scan: &MarkerScan, config: &ClusterConfig) -> Vec<Cluster> {
    // --- 1. Marker Scan ---
    debug!(marker_pixels = scan.marker_count(), "scanned grid for markers");
    if scan.is_empty() {
        return Vec::new();
    }

    let columns = scan.columns();
    if let (Some(first), Some(last)) = (columns.first(), columns.last()) {
        debug!(
            x_range = ?(first, last),
            distinct_columns = columns.len(),
            "marker column distribution"
        );
    }

    // --- 2. Coarse Grouping ---
    for gap in significant_gaps(&columns, config.gap_threshold) {
        debug!(from = gap.start, to = gap.end, size = gap.size(), "significant gap");
    }
    let groups = group_by_gaps(&columns, config.gap_threshold, config.min_group_size);
    debug!(groups = groups.len(), "coarse grouping complete");

    let mut clusters = Vec::with_capacity(groups.len());
    for group in &groups {
        let Some((x_min, x_max)) = span(group) else {
            continue;
        };
        let Some((y_min, y_max)) = scan.y_bounds(x_min, x_max) else {
            continue;
        };

        // --- 3. Wide-Group Refinement ---
        if x_max - x_min > config.wide_threshold {
            debug!(x_min, x_max, "wide group detected, looking for internal structure");
            for gap in significant_gaps(group, config.internal_gap_threshold) {
                debug!(from = gap.start, to = gap.end, size = gap.size(), "internal gap");
            }

            let subgroups =
                group_by_gaps(group, config.internal_gap_threshold, config.min_group_size);
            debug!(subgroups = subgroups.len(), "wide group split");

            for subgroup in &subgroups {
                let Some((sub_x_min, sub_x_max)) = span(subgroup) else {
                    continue;
                };
                // Subgroups are built from marker columns, so this only guards
                // against an inconsistent scan.
                let Some((sub_y_min, sub_y_max)) = scan.y_bounds(sub_x_min, sub_x_max) else {
                    continue;
                };
                let cluster = Cluster::from_bounds(sub_x_min, sub_x_max, sub_y_min, sub_y_max);
                debug!(?cluster, "subgroup cluster");
                clusters.push(cluster);
            }
            continue;
        }

        // --- 4. Bounds & Center ---
        let cluster = Cluster::from_bounds(x_min, x_max, y_min, y_max);
        debug!(?cluster, "single cluster");
        clusters.push(cluster);
    }

    clusters
}

/// First and last value of a sorted group, `None` when empty.
fn span(group: &[u32]) -> Option<(u32, u32)> {
    Some((*group.first()?, *group.last()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::marker::RedThreshold;
    use crate::core_modules::pixel::ColorSample;
    use crate::core_modules::sample_grid::PixelGrid;

    const RED: ColorSample = ColorSample::new(255, 0, 0);
    const WHITE: ColorSample = ColorSample::new(255, 255, 255);

    fn grid_with_markers(width: u32, height: u32, is_marker: impl Fn(u32, u32) -> bool) -> PixelGrid {
        PixelGrid::from_fn(width, height, |x, y| if is_marker(x, y) { RED } else { WHITE })
    }

    #[test]
    fn scan_folds_markers_per_column() {
        let grid = grid_with_markers(6, 6, |x, y| (x == 1 && (2..=4).contains(&y)) || (x == 4 && y == 0));
        let scan = scan_markers(&grid, &RedThreshold::LOOSE);

        assert_eq!(scan.marker_count(), 4);
        assert_eq!(scan.columns(), vec![1, 4]);
        assert_eq!(
            scan.column(1),
            Some(&ColumnExtent {
                x: 1,
                y_min: 2,
                y_max: 4,
                count: 3
            })
        );
        assert_eq!(scan.y_bounds(0, 5), Some((0, 4)));
        assert_eq!(scan.y_bounds(2, 3), None);
    }

    #[test]
    fn empty_grid_yields_nothing() {
        let grid = PixelGrid::filled(0, 0, WHITE);
        assert!(find_clusters(&grid, &RedThreshold::LOOSE, &ClusterConfig::default()).is_empty());
    }

    #[test]
    fn hollow_rectangle_becomes_one_cluster() {
        // Border of a 12x8 rectangle at (3, 2), one pixel thick.
        let grid = grid_with_markers(20, 12, |x, y| {
            let inside = (3..=14).contains(&x) && (2..=9).contains(&y);
            inside && (x == 3 || x == 14 || y == 2 || y == 9)
        });
        let clusters = find_clusters(&grid, &RedThreshold::LOOSE, &ClusterConfig::default());

        assert_eq!(clusters, vec![Cluster::from_bounds(3, 14, 2, 9)]);
        assert_eq!(clusters[0].center(), crate::core_modules::cluster::Point::new(8, 5));
    }

    #[test]
    fn y_bounds_come_from_the_whole_group() {
        // Two columns with disjoint y ranges still form one cluster.
        let grid = grid_with_markers(10, 10, |x, y| (x == 2 && y <= 1) || (x == 4 && y >= 8));
        let clusters = find_clusters(&grid, &RedThreshold::LOOSE, &ClusterConfig::default());
        assert_eq!(clusters, vec![Cluster::from_bounds(2, 4, 0, 9)]);
    }

    #[test]
    fn refinement_uses_internal_threshold() {
        // Columns every 4 pixels over a 120 pixel span, with one 8 pixel jump.
        let columns: Vec<u32> = (0..=56).step_by(4).chain((64..=120).step_by(4)).collect();
        let grid = grid_with_markers(130, 5, |x, y| y == 2 && columns.contains(&x));

        let coarse_only = ClusterConfig {
            gap_threshold: 8,
            internal_gap_threshold: 8,
            ..ClusterConfig::default()
        };
        assert_eq!(
            find_clusters(&grid, &RedThreshold::LOOSE, &coarse_only),
            vec![Cluster::from_bounds(0, 120, 2, 2)]
        );

        let refined = ClusterConfig {
            internal_gap_threshold: 4,
            ..coarse_only
        };
        assert_eq!(
            find_clusters(&grid, &RedThreshold::LOOSE, &refined),
            vec![Cluster::from_bounds(0, 56, 2, 2), Cluster::from_bounds(64, 120, 2, 2)]
        );
    }

    #[test]
    fn refinement_drops_narrow_subgroups() {
        // A single stray column separated by 6 pixels from a wide run.
        let grid = grid_with_markers(130, 3, |x, y| y == 1 && (x == 0 || (6..=120).contains(&x)));
        let config = ClusterConfig {
            gap_threshold: 6,
            internal_gap_threshold: 3,
            ..ClusterConfig::default()
        };
        assert_eq!(
            find_clusters(&grid, &RedThreshold::LOOSE, &config),
            vec![Cluster::from_bounds(6, 120, 1, 1)]
        );
    }

    #[test]
    fn closure_predicates_work() {
        let blue = ColorSample::new(0, 0, 255);
        let grid = PixelGrid::from_fn(10, 4, |x, _| if x == 5 || x == 6 { blue } else { WHITE });
        let is_blue = |s: &ColorSample| *s == blue;
        let clusters = find_clusters(&grid, &is_blue, &ClusterConfig::default());
        assert_eq!(clusters, vec![Cluster::from_bounds(5, 6, 0, 3)]);
    }

    #[test]
    fn validate_rejects_degenerate_settings() {
        assert!(ClusterConfig::default().validate().is_ok());

        let single = ClusterConfig {
            min_group_size: 1,
            ..ClusterConfig::default()
        };
        assert!(matches!(
            single.validate(),
            Err(VisionError::InvalidConfig {
                field: "min_group_size",
                ..
            })
        ));

        let zero_gap = ClusterConfig {
            gap_threshold: 0,
            ..ClusterConfig::default()
        };
        assert!(zero_gap.validate().is_err());
    }

    #[test]
    fn span_of_empty_group_is_none() {
        assert_eq!(span(&[]), None);
        assert_eq!(span(&[4]), Some((4, 4)));
        assert_eq!(span(&[2, 3, 9]), Some((2, 9)));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: ClusterConfig = serde_json::from_str(r#"{ "wide_threshold": 40 }"#).unwrap();
        assert_eq!(config.wide_threshold, 40);
        assert_eq!(config.gap_threshold, DEFAULT_GAP_THRESHOLD);
        assert_eq!(config.min_group_size, DEFAULT_MIN_GROUP_SIZE);
    }
}
