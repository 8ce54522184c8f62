//! Owning collection of clouds addressed by handle

use crate::error::{Error, Result};
use crate::point_cloud::PointCloud;
use serde::{Deserialize, Serialize};

/// Handle to a cloud held by a [`CloudStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CloudId(usize);

impl CloudId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Owns every cloud involved in a feature computation. Features refer to clouds
/// by [`CloudId`] so that one cloud may be read while another gets new fields.
#[derive(Debug, Default)]
pub struct CloudStore {
    clouds: Vec<PointCloud>,
}

impl CloudStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cloud: PointCloud) -> CloudId {
        self.clouds.push(cloud);
        CloudId(self.clouds.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.clouds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clouds.is_empty()
    }

    pub fn get(&self, id: CloudId) -> Result<&PointCloud> {
        self.clouds
            .get(id.0)
            .ok_or_else(|| Error::InvalidInput(format!("unknown cloud #{}", id.0)))
    }

    pub fn get_mut(&mut self, id: CloudId) -> Result<&mut PointCloud> {
        self.clouds
            .get_mut(id.0)
            .ok_or_else(|| Error::InvalidInput(format!("unknown cloud #{}", id.0)))
    }
}
