// THEORY:
// This file is the main entry point for the `marker_vision` library crate.
// It exposes the Marker Clusterer (the `core_modules` layer) together with the
// high-level `MarkerPipeline` that turns a raw grid of color samples into a
// report of rectangles and the colors found at their centers.
//
// The intended consumer hands us an already decoded image (a `PixelGrid`, an
// `image::RgbImage`, or anything implementing `SampleSource`) and a marker
// predicate. Decoding files, printing reports, and talking to the outside world
// are left to drivers such as `marker_probe`.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::cluster::{Cluster, Point};
pub use core_modules::marker::{MarkerPredicate, RedThreshold};
pub use core_modules::marker_clusterer::{ClusterConfig, find_clusters};
pub use core_modules::pixel::ColorSample;
pub use core_modules::sample_grid::{PixelGrid, SampleSource};
pub use error::{Result, VisionError};
