//! Core traits for cloudfeat

use crate::point::Point3d;

/// Hierarchical spatial structure answering spherical range queries
pub trait SpatialIndex {
    /// Finest subdivision level worth traversing for a neighborhood of the given radius.
    /// Larger radii never yield a finer level.
    fn best_level_for(&self, radius: f64) -> u8;

    /// Indices of all points within `radius` (inclusive, Euclidean) of `query`,
    /// traversing the structure at `level`
    fn spherical_range_query(&self, query: &Point3d, level: u8, radius: f64) -> Vec<usize>;
}

/// Progress reporting with cooperative cancellation
pub trait ProgressCallback {
    /// Describe the current task
    fn set_info(&mut self, info: &str);

    /// Called once per processed item. Returns `false` to request cancellation.
    fn step(&mut self) -> bool;
}

/// Render hook attached to a displayed cloud
pub trait DisplayHandle {
    fn redraw(&self);
}

/// Progress sink that never cancels
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_info(&mut self, _info: &str) {}

    fn step(&mut self) -> bool {
        true
    }
}
