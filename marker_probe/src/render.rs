//! Human-readable and JSON renderings of analysis results.

use marker_vision::core_modules::row_regions::RowRegion;
use marker_vision::pipeline::{ColorSample, Point, Report};
use serde::Serialize;
use serde_json::json;
use std::fmt;
use std::path::Path;

/// Text rendering of one image's analysis.
pub struct ReportText<'a> {
    pub path: &'a Path,
    pub report: &'a Report,
}

impl fmt::Display for ReportText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(f, "{} ({}x{})", self.path.display(), report.width, report.height)?;
        writeln!(
            f,
            "  {} marker pixels, {} rectangles",
            report.marker_pixels,
            report.rectangles.len()
        )?;

        for rectangle in &report.rectangles {
            let cluster = &rectangle.cluster;
            let sample = &rectangle.sample;
            let color = sample
                .color
                .map_or_else(|| "out of bounds".to_string(), |color| color.to_string());
            writeln!(
                f,
                "  Rectangle {} center ({}, {}): {}",
                rectangle.index + 1,
                cluster.center_x,
                cluster.center_y,
                color
            )?;
            writeln!(
                f,
                "    Bounds: X({}-{}), Y({}-{}), Size: {}x{}",
                cluster.x_min,
                cluster.x_max,
                cluster.y_min,
                cluster.y_max,
                cluster.width(),
                cluster.height()
            )?;
            writeln!(
                f,
                "    Neighborhood: {} samples, max deviation {}",
                sample.neighborhood.len(),
                sample.max_deviation()
            )?;
        }

        writeln!(f, "  Palette: {:?}", report.palette())
    }
}

#[derive(Serialize)]
struct PathReport<'a> {
    path: String,
    #[serde(flatten)]
    report: &'a Report,
    palette: Vec<[u8; 3]>,
}

pub fn reports_json(reports: &[(&Path, Report)]) -> serde_json::Result<String> {
    let entries: Vec<PathReport<'_>> = reports
        .iter()
        .map(|(path, report)| PathReport {
            path: path.display().to_string(),
            report,
            palette: report.palette(),
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}

pub struct RegionsText<'a> {
    pub path: &'a Path,
    pub y: u32,
    pub regions: &'a [RowRegion],
}

impl fmt::Display for RegionsText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} row {}: {} regions", self.path.display(), self.y, self.regions.len())?;
        for (i, region) in self.regions.iter().enumerate() {
            writeln!(
                f,
                "  Region {}: X({}-{}), center {}, {}",
                i + 1,
                region.start_x,
                region.end_x,
                region.center_x,
                region.color
            )?;
        }
        Ok(())
    }
}

pub struct UniformText<'a> {
    pub path: &'a Path,
    pub samples: &'a [(Point, ColorSample)],
}

impl fmt::Display for UniformText<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {} cells", self.path.display(), self.samples.len())?;
        for (i, (point, color)) in self.samples.iter().enumerate() {
            writeln!(f, "  Cell {i:2}: x={:4}, y={}, {color}", point.x, point.y)?;
        }
        let palette: Vec<[u8; 3]> = self.samples.iter().map(|(_, color)| color.to_array()).collect();
        writeln!(f, "  Palette: {palette:?}")
    }
}

pub fn uniform_json(samples: &[(Point, ColorSample)]) -> serde_json::Value {
    let cells: Vec<_> = samples
        .iter()
        .map(|(point, color)| json!({ "point": point, "color": color }))
        .collect();
    json!({ "cells": cells })
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_vision::PixelGrid;
    use marker_vision::pipeline::{MarkerPipeline, PipelineConfig};

    fn swatch_report() -> Report {
        let grid = PixelGrid::from_fn(12, 8, |x, y| {
            let border = ((x == 1 || x == 8) && y < 6) || ((1..=8).contains(&x) && (y == 0 || y == 5));
            if border {
                ColorSample::new(255, 0, 0)
            } else {
                ColorSample::new(10, 20, 30)
            }
        });
        MarkerPipeline::new(PipelineConfig::default())
            .unwrap()
            .analyze(&grid)
    }

    #[test]
    fn text_report_lists_rectangles() {
        let report = swatch_report();
        let text = ReportText { path: Path::new("swatch.png"), report: &report }.to_string();
        assert!(text.starts_with("swatch.png (12x8)\n"));
        assert!(text.contains("Rectangle 1 center (4, 2): RGB(10, 20, 30)"));
        assert!(text.contains("Bounds: X(1-8), Y(0-5), Size: 8x6"));
        assert!(text.contains("Palette: [[10, 20, 30]]"));
    }

    #[test]
    fn json_report_carries_path_and_palette() {
        let report = swatch_report();
        let rendered = reports_json(&[(Path::new("swatch.png"), report)]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value[0]["path"], "swatch.png");
        assert_eq!(value[0]["marker_pixels"], 24);
        assert_eq!(value[0]["palette"][0], json!([10, 20, 30]));
    }

    #[test]
    fn uniform_text_prints_palette() {
        let samples = [(Point::new(29, 26), ColorSample::new(1, 2, 3))];
        let text = UniformText { path: Path::new("strip.png"), samples: &samples }.to_string();
        assert!(text.contains("Cell  0: x=  29, y=26, RGB(1, 2, 3)"));
        assert!(text.contains("Palette: [[1, 2, 3]]"));
    }

    #[test]
    fn region_text_numbers_regions_from_one() {
        let grid = PixelGrid::from_fn(12, 1, |x, _| {
            if x < 6 {
                ColorSample::new(0, 0, 200)
            } else {
                ColorSample::new(0, 200, 0)
            }
        });
        let regions = marker_vision::core_modules::row_regions::row_regions(
            &grid,
            0,
            &marker_vision::RedThreshold::default(),
            50,
        )
        .unwrap();
        let text = RegionsText { path: Path::new("row.png"), y: 0, regions: &regions }.to_string();
        assert!(text.starts_with("row.png row 0: 2 regions\n"));
        assert!(text.contains("  Region 1: X(0-5)"));
        assert!(text.contains("  Region 2: X(6-11)"));
    }
}
