// THEORY:
// The `pipeline` module is the top-level API for single-image analysis. It wires
// the marker scan, the clusterer, and the center sampler into one call and packages
// the result as a `Report` that drivers can print or serialize.

use crate::core_modules::marker::RedThreshold;
use crate::core_modules::marker_clusterer::{ClusterConfig, clusters_from_scan, scan_markers};
use crate::core_modules::sample_grid::SampleSource;
use crate::core_modules::sampler::sample_center;
use crate::error::{Result, VisionError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::cluster::{Cluster, Point};
pub use crate::core_modules::pixel::ColorSample;
pub use crate::core_modules::sampler::CenterSample;

const DEFAULT_NEIGHBORHOOD_RADIUS: u32 = 1;
const MAX_NEIGHBORHOOD_RADIUS: u32 = 16;

/// Configuration for the MarkerPipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub clustering: ClusterConfig,
    pub marker: RedThreshold,
    /// Radius of the window sampled around each center. 1 gives the 3x3 window.
    pub neighborhood_radius: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            clustering: ClusterConfig::default(),
            marker: RedThreshold::default(),
            neighborhood_radius: DEFAULT_NEIGHBORHOOD_RADIUS,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.clustering.validate()?;
        if self.neighborhood_radius > MAX_NEIGHBORHOOD_RADIUS {
            return Err(VisionError::InvalidConfig {
                field: "neighborhood_radius",
                reason: format!(
                    "{} exceeds the maximum of {MAX_NEIGHBORHOOD_RADIUS}",
                    self.neighborhood_radius
                ),
            });
        }
        Ok(())
    }
}

/// One detected rectangle and the color read at its center.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RectangleReport {
    /// Position in left-to-right order, starting at 0.
    pub index: usize,
    pub cluster: Cluster,
    pub sample: CenterSample,
}

/// The output of the pipeline for a single image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub width: u32,
    pub height: u32,
    pub marker_pixels: usize,
    pub rectangles: Vec<RectangleReport>,
}

impl Report {
    /// Center colors in left-to-right order. Centers outside the grid are skipped.
    pub fn palette(&self) -> Vec<[u8; 3]> {
        self.rectangles
            .iter()
            .filter_map(|rectangle| rectangle.sample.color)
            .map(ColorSample::to_array)
            .collect()
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Cluster> {
        self.rectangles.iter().map(|rectangle| &rectangle.cluster)
    }
}

/// The main, top-level struct for analyzing one image at a time.
#[derive(Debug, Clone)]
pub struct MarkerPipeline {
    config: PipelineConfig,
}

impl MarkerPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn analyze<G>(&self, grid: &G) -> Report
    where
        G: SampleSource + ?Sized,
    {
        // Stage 1: Marker Scan
        let scan = scan_markers(grid, &self.config.marker);

        // Stage 2: Clustering
        let clusters = clusters_from_scan(&scan, &self.config.clustering);
        if scan.marker_count() > 0 && clusters.is_empty() {
            warn!(
                marker_pixels = scan.marker_count(),
                "marker pixels found but no cluster survived grouping"
            );
        }

        // Stage 3: Center Sampling
        let rectangles: Vec<RectangleReport> = clusters
            .into_iter()
            .enumerate()
            .map(|(index, cluster)| RectangleReport {
                index,
                sample: sample_center(grid, &cluster, self.config.neighborhood_radius),
                cluster,
            })
            .collect();

        info!(
            width = grid.width(),
            height = grid.height(),
            marker_pixels = scan.marker_count(),
            rectangles = rectangles.len(),
            "analysis complete"
        );

        Report {
            width: grid.width(),
            height: grid.height(),
            marker_pixels: scan.marker_count(),
            rectangles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::sample_grid::PixelGrid;

    const RED: ColorSample = ColorSample::new(255, 0, 0);
    const WHITE: ColorSample = ColorSample::new(255, 255, 255);

    /// Two red-bordered swatches filled with distinct colors.
    fn two_swatches() -> PixelGrid {
        let swatches = [
            (2u32, 12u32, ColorSample::new(0, 128, 128)),
            (30u32, 40u32, ColorSample::new(250, 200, 0)),
        ];
        PixelGrid::from_fn(50, 12, |x, y| {
            for (x_min, x_max, fill) in swatches {
                if (x_min..=x_max).contains(&x) && (1..=10).contains(&y) {
                    let border = x == x_min || x == x_max || y == 1 || y == 10;
                    return if border { RED } else { fill };
                }
            }
            WHITE
        })
    }

    #[test]
    fn reports_center_colors_left_to_right() {
        let pipeline = MarkerPipeline::new(PipelineConfig::default()).unwrap();
        let report = pipeline.analyze(&two_swatches());

        assert_eq!((report.width, report.height), (50, 12));
        assert_eq!(report.rectangles.len(), 2);
        assert_eq!(report.rectangles[0].cluster, Cluster::from_bounds(2, 12, 1, 10));
        assert_eq!(report.rectangles[1].index, 1);
        assert_eq!(report.palette(), vec![[0, 128, 128], [250, 200, 0]]);
        assert!(report.rectangles.iter().all(|r| r.sample.is_uniform(0)));
    }

    #[test]
    fn counts_every_marker_pixel() {
        let pipeline = MarkerPipeline::new(PipelineConfig::default()).unwrap();
        let report = pipeline.analyze(&two_swatches());
        // Each 11x10 border has 2 * 11 + 2 * 8 pixels.
        assert_eq!(report.marker_pixels, 2 * 38);
    }

    #[test]
    fn blank_image_reports_nothing() {
        let pipeline = MarkerPipeline::new(PipelineConfig::default()).unwrap();
        let report = pipeline.analyze(&PixelGrid::filled(20, 20, WHITE));
        assert_eq!(report.marker_pixels, 0);
        assert!(report.rectangles.is_empty());
        assert!(report.palette().is_empty());
    }

    #[test]
    fn rejects_invalid_config() {
        let config = PipelineConfig {
            neighborhood_radius: 100,
            ..PipelineConfig::default()
        };
        assert!(MarkerPipeline::new(config).is_err());

        let config = PipelineConfig {
            clustering: ClusterConfig {
                min_group_size: 0,
                ..ClusterConfig::default()
            },
            ..PipelineConfig::default()
        };
        assert!(MarkerPipeline::new(config).is_err());
    }

    #[test]
    fn report_serializes_to_json() {
        let pipeline = MarkerPipeline::new(PipelineConfig::default()).unwrap();
        let report = pipeline.analyze(&two_swatches());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["rectangles"][0]["cluster"]["center_x"], 7);
        assert_eq!(json["rectangles"][1]["sample"]["color"]["red"], 250);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{ "marker": { "red_min": 250, "other_max": 20 } }"#).unwrap();
        assert_eq!(config.marker, RedThreshold::STRICT);
        assert_eq!(config.clustering, ClusterConfig::default());
        assert_eq!(config.neighborhood_radius, 1);
    }
}
