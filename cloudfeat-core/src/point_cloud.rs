//! Point cloud container with per-point attributes

use crate::error::{Error, Result};
use crate::octree::{Octree, OctreeConfig};
use crate::point::*;
use crate::scalar_field::ScalarField;
use crate::traits::DisplayHandle;
use std::cell::OnceCell;
use std::fmt;
use std::ops::Index;
use std::rc::Rc;

/// A point cloud with optional normals, colors and any number of named scalar fields.
///
/// Scalar fields always hold one value per point: adding points pads them
/// with [`NAN_VALUE`](crate::NAN_VALUE). Normals and colors are left as they are and must be set
/// again to be usable. The octree is built on first use and dropped whenever
/// the point set changes.
#[derive(Clone, Default)]
pub struct PointCloud {
    points: Vec<Point3d>,
    normals: Option<Vec<Vector3d>>,
    colors: Option<Vec<Rgb>>,
    scalar_fields: Vec<ScalarField>,
    displayed_field: Option<usize>,
    display: Option<Rc<dyn DisplayHandle>>,
    octree_config: OctreeConfig,
    octree: OnceCell<Octree>,
}

impl PointCloud {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<Point3d>) -> Self {
        Self {
            points,
            ..Self::default()
        }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point to the cloud
    pub fn push(&mut self, point: Point3d) {
        self.points.push(point);
        self.points_changed();
    }

    /// Read-only view of the points
    pub fn points(&self) -> &[Point3d] {
        &self.points
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, Point3d> {
        self.points.iter()
    }

    /// Clear all points and attributes from the cloud
    pub fn clear(&mut self) {
        self.points.clear();
        self.normals = None;
        self.colors = None;
        self.scalar_fields.clear();
        self.displayed_field = None;
        self.octree.take();
    }

    /// Reserve capacity for additional points
    pub fn reserve(&mut self, additional: usize) {
        self.points.reserve(additional);
    }

    pub fn point(&self, index: usize) -> &Point3d {
        &self.points[index]
    }

    // ----- normals & colors -------------------------------------------------

    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    pub fn normals(&self) -> Option<&[Vector3d]> {
        self.normals.as_deref()
    }

    /// Attach one normal per point
    pub fn set_normals(&mut self, normals: Vec<Vector3d>) -> Result<()> {
        if normals.len() != self.len() {
            return Err(Error::InconsistentData(format!(
                "{} normals given for {} points",
                normals.len(),
                self.len()
            )));
        }
        self.normals = Some(normals);
        Ok(())
    }

    pub fn has_colors(&self) -> bool {
        self.colors.is_some()
    }

    pub fn colors(&self) -> Option<&[Rgb]> {
        self.colors.as_deref()
    }

    /// Attach one color per point
    pub fn set_colors(&mut self, colors: Vec<Rgb>) -> Result<()> {
        if colors.len() != self.len() {
            return Err(Error::InconsistentData(format!(
                "{} colors given for {} points",
                colors.len(),
                self.len()
            )));
        }
        self.colors = Some(colors);
        Ok(())
    }

    // ----- scalar fields ----------------------------------------------------

    pub fn scalar_field_count(&self) -> usize {
        self.scalar_fields.len()
    }

    pub fn scalar_field(&self, index: usize) -> Option<&ScalarField> {
        self.scalar_fields.get(index)
    }

    pub fn scalar_field_mut(&mut self, index: usize) -> Option<&mut ScalarField> {
        self.scalar_fields.get_mut(index)
    }

    pub fn scalar_fields(&self) -> &[ScalarField] {
        &self.scalar_fields
    }

    /// Index of the first field with exactly this name
    pub fn scalar_field_index_by_name(&self, name: &str) -> Option<usize> {
        self.scalar_fields.iter().position(|sf| sf.name() == name)
    }

    /// Field lookup by name, optionally ignoring ASCII case
    pub fn find_scalar_field(&self, name: &str, case_insensitive: bool) -> Option<&ScalarField> {
        if case_insensitive {
            self.scalar_fields
                .iter()
                .find(|sf| sf.name().eq_ignore_ascii_case(name))
        } else {
            self.scalar_fields.iter().find(|sf| sf.name() == name)
        }
    }

    /// Attach a field holding one value per point; returns its index
    pub fn add_scalar_field(&mut self, field: ScalarField) -> Result<usize> {
        self.check_field_length(&field)?;
        self.scalar_fields.push(field);
        Ok(self.scalar_fields.len() - 1)
    }

    /// Attach `field`, replacing the values of an existing field with the same name.
    ///
    /// Returns the field index and whether an existing slot was reused.
    pub fn attach_or_replace_field(&mut self, field: ScalarField) -> Result<(usize, bool)> {
        self.check_field_length(&field)?;
        Ok(match self.scalar_field_index_by_name(field.name()) {
            Some(index) => {
                self.scalar_fields[index] = field;
                (index, true)
            }
            None => {
                self.scalar_fields.push(field);
                (self.scalar_fields.len() - 1, false)
            }
        })
    }

    fn check_field_length(&self, field: &ScalarField) -> Result<()> {
        if field.len() != self.len() {
            return Err(Error::InconsistentData(format!(
                "Scalar field '{}' has {} values for {} points",
                field.name(),
                field.len(),
                self.len()
            )));
        }
        Ok(())
    }

    /// Detach and return the field at `index`
    pub fn remove_scalar_field(&mut self, index: usize) -> Option<ScalarField> {
        if index >= self.scalar_fields.len() {
            return None;
        }
        self.displayed_field = match self.displayed_field {
            Some(d) if d == index => None,
            Some(d) if d > index => Some(d - 1),
            other => other,
        };
        Some(self.scalar_fields.remove(index))
    }

    // ----- display ----------------------------------------------------------

    pub fn set_display(&mut self, display: Option<Rc<dyn DisplayHandle>>) {
        self.display = display;
    }

    pub fn is_displayed(&self) -> bool {
        self.display.is_some()
    }

    pub fn displayed_field(&self) -> Option<usize> {
        self.displayed_field
    }

    /// Make `index` the displayed field and refresh the display, if any
    pub fn show_scalar_field(&mut self, index: usize) {
        if let Some(display) = &self.display {
            self.displayed_field = Some(index);
            display.redraw();
        }
    }

    // ----- spatial index ----------------------------------------------------

    pub fn set_octree_config(&mut self, config: OctreeConfig) {
        self.octree_config = config;
        self.octree.take();
    }

    /// The cloud's octree, built on first request
    pub fn octree(&self) -> &Octree {
        self.octree.get_or_init(|| {
            log::debug!("Computing octree for {} points", self.points.len());
            Octree::with_config(&self.points, self.octree_config)
        })
    }

    pub fn has_octree(&self) -> bool {
        self.octree.get().is_some()
    }

    fn points_changed(&mut self) {
        let len = self.points.len();
        for sf in &mut self.scalar_fields {
            sf.pad_to(len);
        }
        self.octree.take();
    }
}

impl fmt::Debug for PointCloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PointCloud")
            .field("points", &self.points.len())
            .field("normals", &self.has_normals())
            .field("colors", &self.has_colors())
            .field(
                "scalar_fields",
                &self.scalar_fields.iter().map(ScalarField::name).collect::<Vec<_>>(),
            )
            .field("displayed_field", &self.displayed_field)
            .finish()
    }
}

impl Index<usize> for PointCloud {
    type Output = Point3d;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<'a> IntoIterator for &'a PointCloud {
    type Item = &'a Point3d;
    type IntoIter = std::slice::Iter<'a, Point3d>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl Extend<Point3d> for PointCloud {
    fn extend<I: IntoIterator<Item = Point3d>>(&mut self, iter: I) {
        self.points.extend(iter);
        self.points_changed();
    }
}

impl FromIterator<Point3d> for PointCloud {
    fn from_iter<I: IntoIterator<Item = Point3d>>(iter: I) -> Self {
        Self::from_points(Vec::from_iter(iter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::SpatialIndex;
    use std::cell::Cell;

    struct CountingDisplay(Cell<usize>);

    impl DisplayHandle for CountingDisplay {
        fn redraw(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn line_cloud(n: usize) -> PointCloud {
        (0..n).map(|i| Point3d::new(i as f64, 0.0, 0.0)).collect()
    }

    #[test]
    fn test_attach_or_replace_reuses_by_name() {
        let mut cloud = line_cloud(3);
        let (i0, reused) = cloud.attach_or_replace_field(ScalarField::from_values("a", vec![1.0; 3])).unwrap();
        assert!(!reused);
        let (i1, reused) = cloud.attach_or_replace_field(ScalarField::from_values("a", vec![2.0; 3])).unwrap();
        assert!(reused);
        assert_eq!(i0, i1);
        assert_eq!(cloud.scalar_field_count(), 1);
        assert_eq!(cloud.scalar_field(i0).unwrap().value(2), 2.0);
    }

    #[test]
    fn test_field_length_must_match_cloud() {
        let mut cloud = line_cloud(3);
        let err = cloud.add_scalar_field(ScalarField::from_values("a", vec![0.0; 2])).unwrap_err();
        assert!(matches!(err, Error::InconsistentData(_)));
        assert!(cloud
            .attach_or_replace_field(ScalarField::from_values("a", vec![0.0; 4]))
            .is_err());
        assert_eq!(cloud.scalar_field_count(), 0);
    }

    #[test]
    fn test_added_points_pad_fields() {
        let mut cloud = line_cloud(2);
        cloud.add_scalar_field(ScalarField::from_values("a", vec![1.0, 2.0])).unwrap();
        cloud.push(Point3d::new(5.0, 0.0, 0.0));
        cloud.extend(vec![Point3d::new(6.0, 0.0, 0.0)]);

        let sf = cloud.scalar_field(0).unwrap();
        assert_eq!(sf.len(), 4);
        assert!(sf.value(2).is_nan() && sf.value(3).is_nan());
        assert_eq!(sf.max(), 2.0);
        assert_eq!(cloud.points().len(), 4);
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut cloud = line_cloud(2);
        cloud.add_scalar_field(ScalarField::from_values("M3C2 Distance", vec![0.0; 2])).unwrap();
        assert!(cloud.find_scalar_field("m3c2 distance", false).is_none());
        assert!(cloud.find_scalar_field("m3c2 distance", true).is_some());
    }

    #[test]
    fn test_attribute_lengths_are_checked() {
        let mut cloud = line_cloud(3);
        assert!(cloud.set_normals(vec![Vector3d::z(); 2]).is_err());
        assert!(cloud.set_normals(vec![Vector3d::z(); 3]).is_ok());
        assert!(cloud.has_normals());
        assert!(cloud.set_colors(vec![[0, 0, 0]; 4]).is_err());
        assert!(!cloud.has_colors());
    }

    #[test]
    fn test_octree_is_cached_and_invalidated() {
        let mut cloud = line_cloud(10);
        assert!(!cloud.has_octree());
        let level = cloud.octree().best_level_for(2.0);
        assert!(cloud.has_octree());
        assert_eq!(cloud.octree().spherical_range_query(&cloud[0], level, 2.0).len(), 3);

        cloud.push(Point3d::new(0.5, 0.0, 0.0));
        assert!(!cloud.has_octree());
        assert_eq!(cloud.octree().len(), 11);

        // points are only reachable read-only, every growth goes through push/extend
        cloud.extend([Point3d::new(20.0, 0.0, 0.0)]);
        assert!(!cloud.has_octree());
        assert_eq!(cloud.points().len(), 12);
        assert_eq!(cloud.octree().len(), 12);
    }

    #[test]
    fn test_show_field_redraws_displayed_cloud() {
        let mut cloud = line_cloud(2);
        let index = cloud.add_scalar_field(ScalarField::from_values("a", vec![0.0; 2])).unwrap();
        cloud.show_scalar_field(index);
        assert_eq!(cloud.displayed_field(), None);

        let display = Rc::new(CountingDisplay(Cell::new(0)));
        cloud.set_display(Some(display.clone()));
        cloud.show_scalar_field(index);
        assert_eq!(cloud.displayed_field(), Some(index));
        assert_eq!(display.0.get(), 1);

        cloud.remove_scalar_field(index);
        assert_eq!(cloud.displayed_field(), None);
    }
}
