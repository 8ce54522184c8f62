//! # cloudfeat
//!
//! Per-point features for point cloud classification.
//!
//! This is the umbrella crate that provides convenient access to all cloudfeat functionality.
//! You can use this crate to get everything in one place, or use individual crates for
//! more granular control over dependencies.
//!
//! ## Features
//!
//! - **Core**: Point clouds with scalar fields, core points, octree, progress hooks
//! - **Algorithms**: Attribute sources, neighborhood statistics, field arithmetic
//! - **Features**: Feature descriptors and their preparation on core points
//!
//! ## Quick Start
//!
//! ```rust
//! use cloudfeat::prelude::*;
//!
//! let mut store = CloudStore::new();
//! let points = (0..5).map(|i| Point3d::new(i as f64, 0.0, 0.0)).collect();
//! let pc1 = store.insert(PointCloud::from_points(points));
//! let core = CorePoints::whole(pc1);
//!
//! // Mean height over neighborhoods of diameter 2
//! let mut feature = FeatureDescriptor::point(PointAttribute::Z, pc1, "PC1").with_stat(2.0, Stat::Mean);
//! feature.prepare(&mut store, &core, &FieldNames::default(), None)?;
//! assert_eq!(feature.output_name(), Some("PC1.Z_MEAN@2"));
//! # Ok::<(), cloudfeat::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables core, algorithms and features
//! - `core`: Core data structures (always enabled)
//! - `algorithms`: Sources, statistics and field algebra
//! - `features`: Feature descriptors (implies `algorithms`)
//! - `all`: Enables all features

// Re-export core functionality
pub use cloudfeat_core::*;

// Re-export sub-crates
#[cfg(feature = "algorithms")]
pub use cloudfeat_algorithms as algorithms;

#[cfg(feature = "features")]
pub use cloudfeat_features as features;

/// Convenient imports for common use cases
pub mod prelude {
    pub use cloudfeat_core::*;

    #[cfg(feature = "algorithms")]
    pub use cloudfeat_algorithms::*;

    #[cfg(feature = "features")]
    pub use cloudfeat_features::{FeatureDescriptor, FeatureSet, FeatureType, Source};
}
