// THEORY:
// A `Cluster` is the output of the Marker Clusterer: the inclusive bounding box of
// one group of marker pixels plus its integer center. Like the pixel types it is a
// plain data container, produced fresh on each call and carrying no identity
// beyond its bounds.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};

/// A 2D pixel coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Bounding region of one group of marker pixels. All bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub struct Cluster {
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
    pub center_x: u32,
    pub center_y: u32,
}

impl Cluster {
    /// Builds a cluster from inclusive bounds. Bounds are reordered if given
    /// backwards. The center is the floor of each axis midpoint.
    pub fn from_bounds(x_min: u32, x_max: u32, y_min: u32, y_max: u32) -> Self {
        let (x_min, x_max) = (x_min.min(x_max), x_min.max(x_max));
        let (y_min, y_max) = (y_min.min(y_max), y_min.max(y_max));
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
            center_x: floor_midpoint(x_min, x_max),
            center_y: floor_midpoint(y_min, y_max),
        }
    }

    pub fn width(&self) -> u32 {
        self.x_max - self.x_min + 1
    }

    pub fn height(&self) -> u32 {
        self.y_max - self.y_min + 1
    }

    pub fn center(&self) -> Point {
        Point::new(self.center_x, self.center_y)
    }

    pub fn contains(&self, point: Point) -> bool {
        (self.x_min..=self.x_max).contains(&point.x) && (self.y_min..=self.y_max).contains(&point.y)
    }
}

/// Serialized with the derived `width` and `height` alongside the bounds.
impl Serialize for Cluster {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Cluster", 8)?;
        state.serialize_field("x_min", &self.x_min)?;
        state.serialize_field("x_max", &self.x_max)?;
        state.serialize_field("y_min", &self.y_min)?;
        state.serialize_field("y_max", &self.y_max)?;
        state.serialize_field("center_x", &self.center_x)?;
        state.serialize_field("center_y", &self.center_y)?;
        state.serialize_field("width", &self.width())?;
        state.serialize_field("height", &self.height())?;
        state.end()
    }
}

/// `floor((low + high) / 2)` for `low <= high`, without overflowing `u32`.
fn floor_midpoint(low: u32, high: u32) -> u32 {
    low + (high - low) / 2
}
