//! Fixed-cell sampling for strips of equally sized swatches.
//!
//! When the layout is known up front there is nothing to detect: the strip is
//! divided into `count` cells of `width / count` pixels and each cell is read at
//! its midpoint on the middle row.

use crate::core_modules::cluster::Point;
use crate::core_modules::pixel::ColorSample;
use crate::core_modules::sample_grid::SampleSource;
use crate::error::{Result, VisionError};

/// Sampling points for `count` equal cells laid out along the x axis.
pub fn uniform_centers(width: u32, height: u32, count: u32) -> Result<Vec<Point>> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let cell_width = width / count;
    if cell_width == 0 {
        return Err(VisionError::InvalidConfig {
            field: "count",
            reason: format!("{count} cells do not fit in a width of {width}"),
        });
    }

    let y = height / 2;
    // floor((i + 0.5) * cell_width) in integer arithmetic.
    Ok((0..count)
        .map(|i| Point::new(((2 * u64::from(i) + 1) * u64::from(cell_width) / 2) as u32, y))
        .collect())
}

/// Reads the color at every uniform cell center.
pub fn sample_uniform<G>(grid: &G, count: u32) -> Result<Vec<(Point, ColorSample)>>
where
    G: SampleSource + ?Sized,
{
    let centers = uniform_centers(grid.width(), grid.height(), count)?;
    Ok(centers
        .into_iter()
        .filter_map(|point| grid.get(point.x, point.y).map(|color| (point, color)))
        .collect())
}
