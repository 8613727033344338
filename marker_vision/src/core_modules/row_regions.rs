// THEORY:
// A scanline view of the image: walk a single row left to right, ignore marker
// pixels, and cut the row wherever the color jumps. It is a cheap cross-check for
// the clusterer on strips of swatches laid out side by side. Every swatch should
// show up as one region whose color matches the cluster's center sample.
//
// Each region keeps the color of its first pixel as the reference. The next cut
// happens at the first non-marker pixel that differs from that reference by more
// than the tolerance, so slow gradients do not drift the reference along.

use crate::core_modules::marker::MarkerPredicate;
use crate::core_modules::pixel::{ColorDelta, ColorSample};
use crate::core_modules::sample_grid::SampleSource;
use crate::error::{Result, VisionError};
use serde::Serialize;

pub const DEFAULT_ROW_TOLERANCE: ColorDelta = 50;

/// A run of similar color along one row. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RowRegion {
    pub start_x: u32,
    pub end_x: u32,
    /// The color of the region's first non-marker pixel.
    pub color: ColorSample,
    pub center_x: u32,
}

impl RowRegion {
    fn new(start_x: u32, end_x: u32, color: ColorSample) -> Self {
        Self {
            start_x,
            end_x,
            color,
            center_x: start_x + (end_x - start_x) / 2,
        }
    }

    pub fn width(&self) -> u32 {
        self.end_x - self.start_x + 1
    }
}

/// Splits row `y` into regions of similar color, skipping marker pixels.
pub fn row_regions<G, P>(grid: &G, y: u32, predicate: &P, tolerance: ColorDelta) -> Result<Vec<RowRegion>>
where
    G: SampleSource + ?Sized,
    P: MarkerPredicate + ?Sized,
{
    if y >= grid.height() {
        return Err(VisionError::RowOutOfBounds {
            y,
            height: grid.height(),
        });
    }

    let mut regions = Vec::new();
    let mut open: Option<(u32, ColorSample)> = None;

    for x in 0..grid.width() {
        let sample = grid.sample(x, y);
        if predicate.is_marker(&sample) {
            continue;
        }

        match open {
            None => open = Some((x, sample)),
            Some((start_x, reference)) if reference.color_difference(&sample) > tolerance => {
                regions.push(RowRegion::new(start_x, x - 1, reference));
                open = Some((x, sample));
            }
            Some(_) => {}
        }
    }

    if let Some((start_x, reference)) = open {
        regions.push(RowRegion::new(start_x, grid.width() - 1, reference));
    }

    Ok(regions)
}
