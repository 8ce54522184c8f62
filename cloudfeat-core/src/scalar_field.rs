//! Named per-point scalar fields

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Reserved value marking "no result computed" for a point
pub const NAN_VALUE: f64 = f64::NAN;

/// A named, resizable array of per-point values with a cached value range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalarField {
    name: String,
    values: Vec<f64>,
    min: f64,
    max: f64,
}

impl ScalarField {
    /// Create an empty field
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            min: NAN_VALUE,
            max: NAN_VALUE,
        }
    }

    /// Create a field from existing values, computing its range
    pub fn from_values(name: impl Into<String>, values: Vec<f64>) -> Self {
        let mut field = Self {
            name: name.into(),
            values,
            min: NAN_VALUE,
            max: NAN_VALUE,
        };
        field.compute_min_and_max();
        field
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resize the field, reporting allocation failure instead of aborting.
    /// New slots hold the sentinel value.
    pub fn resize_safe(&mut self, len: usize) -> Result<()> {
        if len > self.values.len() {
            self.values
                .try_reserve_exact(len - self.values.len())
                .map_err(|_| Error::NotEnoughMemory)?;
        }
        self.values.resize(len, NAN_VALUE);
        Ok(())
    }

    /// Grow to `len` values with the sentinel; never shrinks
    pub(crate) fn pad_to(&mut self, len: usize) {
        if len > self.values.len() {
            self.values.resize(len, NAN_VALUE);
        }
    }

    pub fn fill(&mut self, value: f64) {
        self.values.iter_mut().for_each(|v| *v = value);
    }

    pub fn value(&self, index: usize) -> f64 {
        self.values[index]
    }

    pub fn set_value(&mut self, index: usize, value: f64) {
        self.values[index] = value;
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Refresh the cached range, ignoring sentinel values
    pub fn compute_min_and_max(&mut self) {
        let mut range: Option<(f64, f64)> = None;
        for &v in self.values.iter().filter(|v| !v.is_nan()) {
            range = Some(match range {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
        let (min, max) = range.unwrap_or((NAN_VALUE, NAN_VALUE));
        self.min = min;
        self.max = max;
    }

    /// Cached minimum (NaN if the field holds no valid value)
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Cached maximum (NaN if the field holds no valid value)
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_fills_with_sentinel() {
        let mut sf = ScalarField::new("a");
        sf.resize_safe(3).unwrap();
        assert_eq!(sf.len(), 3);
        assert!(sf.values().iter().all(|v| v.is_nan()));

        sf.fill(2.0);
        sf.set_value(1, -1.0);
        sf.compute_min_and_max();
        assert_eq!(sf.min(), -1.0);
        assert_eq!(sf.max(), 2.0);
    }

    #[test]
    fn test_min_max_skips_sentinel() {
        let sf = ScalarField::from_values("b", vec![NAN_VALUE, 4.0, NAN_VALUE, 1.0]);
        assert_eq!(sf.min(), 1.0);
        assert_eq!(sf.max(), 4.0);

        let empty = ScalarField::from_values("c", vec![NAN_VALUE]);
        assert!(empty.min().is_nan());
        assert!(empty.max().is_nan());
    }

    #[test]
    fn test_absurd_resize_reports_memory_error() {
        let mut sf = ScalarField::new("huge");
        let err = sf.resize_safe(usize::MAX / 4).unwrap_err();
        assert!(matches!(err, Error::NotEnoughMemory));
    }
}
