//! # cloudfeat features
//!
//! Feature descriptors and their preparation on a set of core points.
//!
//! A [`FeatureDescriptor`] names an attribute, the clouds it is read on, an
//! optional scale with its statistical measure, and an optional math operation
//! against a second cloud. [`FeatureDescriptor::prepare`] computes the feature
//! into a scalar field of the core cloud.

pub mod descriptor;
pub mod preparation;

pub use descriptor::*;

// Re-export the vocabulary needed to build descriptors
pub use cloudfeat_algorithms::{FieldNames, Operation, PointAttribute, Stat};

/// Ordered list of features
pub type FeatureSet = Vec<FeatureDescriptor>;
