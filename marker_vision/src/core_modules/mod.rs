pub mod cluster;
pub mod gap_groups;
pub mod marker;
pub mod marker_clusterer;
pub mod palette;
pub mod pixel;
pub mod row_regions;
pub mod sample_grid;
pub mod sampler;
pub mod uniform_grid;
