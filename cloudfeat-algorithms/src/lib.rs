//! # cloudfeat algorithms
//!
//! Building blocks of per-point feature computation: uniform access to point
//! attributes, statistics over spherical neighborhoods and elementwise
//! arithmetic between scalar fields.

pub mod config;
pub mod scalar_source;
pub mod statistics;
pub mod field_algebra;

// Re-export commonly used items
pub use config::*;
pub use scalar_source::*;
pub use statistics::*;
pub use field_algebra::*;
