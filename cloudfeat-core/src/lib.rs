//! Core data structures and traits for cloudfeat
//!
//! This crate provides the fundamental types for per-point feature computation:
//! points, point clouds carrying scalar fields, core point subsets, the octree
//! spatial index and the progress/cancellation hooks.

pub mod point;
pub mod point_cloud;
pub mod scalar_field;
pub mod cloud_store;
pub mod core_points;
pub mod octree;
pub mod traits;
pub mod error;

pub use point::*;
pub use point_cloud::*;
pub use scalar_field::*;
pub use cloud_store::*;
pub use core_points::*;
pub use octree::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};
