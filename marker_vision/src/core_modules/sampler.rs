// THEORY:
// Once a cluster is found, the color we care about is the one at its center. A
// single pixel can be misleading (a stray border pixel, compression noise), so the
// sampler also collects the square neighborhood around the center. Comparing the
// neighbors against the center tells the caller whether the reading is stable.

use crate::core_modules::cluster::{Cluster, Point};
use crate::core_modules::pixel::{ColorDelta, ColorSample};
use crate::core_modules::sample_grid::SampleSource;
use serde::Serialize;

/// The color at a cluster center and around it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CenterSample {
    pub center: Point,
    /// `None` when the center lies outside the grid.
    pub color: Option<ColorSample>,
    /// In-bounds neighbors within the sampling radius, row-major, center excluded.
    pub neighborhood: Vec<(Point, ColorSample)>,
}

impl CenterSample {
    /// Largest color difference between the center and any neighbor.
    pub fn max_deviation(&self) -> ColorDelta {
        let Some(center) = self.color else {
            return 0;
        };
        self.neighborhood
            .iter()
            .map(|(_, color)| center.color_difference(color))
            .max()
            .unwrap_or(0)
    }

    pub fn is_uniform(&self, tolerance: ColorDelta) -> bool {
        self.max_deviation() <= tolerance
    }
}

/// Samples `cluster`'s center and its `(2 * radius + 1)²` window.
pub fn sample_center<G>(grid: &G, cluster: &Cluster, radius: u32) -> CenterSample
where
    G: SampleSource + ?Sized,
{
    sample_point(grid, cluster.center(), radius)
}

/// Samples `point` and its in-bounds neighbors within `radius`.
pub fn sample_point<G>(grid: &G, point: Point, radius: u32) -> CenterSample
where
    G: SampleSource + ?Sized,
{
    let color = grid.get(point.x, point.y);

    let mut neighborhood = Vec::new();
    let radius = i64::from(radius);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx == 0 && dy == 0 {
                continue;
            }
            let (Ok(x), Ok(y)) = (
                u32::try_from(i64::from(point.x) + dx),
                u32::try_from(i64::from(point.y) + dy),
            ) else {
                continue;
            };
            if let Some(sample) = grid.get(x, y) {
                neighborhood.push((Point::new(x, y), sample));
            }
        }
    }

    CenterSample {
        center: point,
        color,
        neighborhood,
    }
}
