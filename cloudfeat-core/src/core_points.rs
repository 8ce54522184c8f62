//! Core points: the subset of a cloud on which features are evaluated

use crate::cloud_store::{CloudId, CloudStore};
use crate::error::{Error, Result};

/// A reference cloud of core points, each mapped to a point of an origin cloud.
///
/// When `origin_indices` is `None` the core cloud is the origin cloud itself
/// (or an exact copy) and the mapping is the identity.
///
/// The referenced clouds stay mutable through the store, so the mapping is
/// checked again with [`check`](Self::check) before it is used.
#[derive(Debug, Clone, PartialEq)]
pub struct CorePoints {
    cloud: CloudId,
    origin: CloudId,
    origin_indices: Option<Vec<usize>>,
}

impl CorePoints {
    /// Every point of `cloud` is a core point
    pub fn whole(cloud: CloudId) -> Self {
        Self {
            cloud,
            origin: cloud,
            origin_indices: None,
        }
    }

    /// `cloud` holds a subsample of `origin`; `origin_indices[i]` is the origin
    /// index of core point `i`
    pub fn subsampled(
        store: &CloudStore,
        cloud: CloudId,
        origin: CloudId,
        origin_indices: Vec<usize>,
    ) -> Result<Self> {
        let core_points = Self {
            cloud,
            origin,
            origin_indices: Some(origin_indices),
        };
        core_points.check(store)?;
        Ok(core_points)
    }

    /// The cloud holding the core points
    pub fn cloud(&self) -> CloudId {
        self.cloud
    }

    /// The cloud the core points were taken from
    pub fn origin(&self) -> CloudId {
        self.origin
    }

    /// Verify that the mapping still matches the current content of both clouds
    pub fn check(&self, store: &CloudStore) -> Result<()> {
        let core_count = store.get(self.cloud)?.len();
        let origin_count = store.get(self.origin)?.len();
        let Some(indices) = &self.origin_indices else {
            return Ok(());
        };
        if indices.len() != core_count {
            return Err(Error::InconsistentData(format!(
                "{} origin indices given for {} core points",
                indices.len(),
                core_count
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= origin_count) {
            return Err(Error::InconsistentData(format!(
                "origin index {bad} out of range (origin cloud has {origin_count} points)"
            )));
        }
        Ok(())
    }

    /// Number of core points
    pub fn size(&self, store: &CloudStore) -> Result<usize> {
        Ok(match &self.origin_indices {
            Some(indices) => indices.len(),
            None => store.get(self.cloud)?.len(),
        })
    }

    /// Index in the origin cloud of core point `i`
    pub fn origin_index(&self, i: usize) -> usize {
        match &self.origin_indices {
            Some(indices) => indices[i],
            None => i,
        }
    }
}
