//! Feature preparation
//!
//! Preparing a feature computes its values for every core point and stores them
//! in a scalar field of the core cloud. Fields are keyed by name: a field that
//! already exists under the computed name is reused.

use crate::descriptor::{FeatureDescriptor, FeatureType};
use cloudfeat_algorithms::{
    extract_stat, perform_math_op, resolve_source, FieldNames, Operation, PointAttribute, Stat,
};
use cloudfeat_core::{
    CloudId, CloudStore, CorePoints, Error, NullProgress, ProgressCallback, Result, ScalarField,
};
use log::{debug, warn};

impl FeatureDescriptor {
    /// Compute the feature on `core_points` and record the name of the resulting field.
    ///
    /// On failure, fields committed by earlier steps of the same call stay attached
    /// to the core cloud.
    pub fn prepare(
        &mut self,
        store: &mut CloudStore,
        core_points: &CorePoints,
        names: &FieldNames,
        progress: Option<&mut dyn ProgressCallback>,
    ) -> Result<()> {
        self.check_validity()?;

        let attribute = match &self.feature_type {
            FeatureType::Point(attribute) => attribute.clone(),
            FeatureType::Neighborhood => {
                return Err(Error::Unimplemented("neighborhood features".to_string()))
            }
            FeatureType::ContextBased => {
                return Err(Error::Unimplemented("context-based features".to_string()))
            }
            FeatureType::DualCloud => return Err(Error::Unimplemented("dual-cloud features".to_string())),
        };

        core_points.check(store)?;

        let mut null = NullProgress;
        let progress: &mut dyn ProgressCallback = match progress {
            Some(progress) => progress,
            None => &mut null,
        };

        let output_name = if self.scaled() {
            self.prepare_scaled(&attribute, store, core_points, names, progress)?
        } else {
            self.prepare_scale_less(&attribute, store, core_points, names)?
        };

        debug!("Feature {self} prepared as '{output_name}'");
        self.output_name = Some(output_name);
        Ok(())
    }

    fn prepare_scaled(
        &self,
        attribute: &PointAttribute,
        store: &mut CloudStore,
        core_points: &CorePoints,
        names: &FieldNames,
        progress: &mut dyn ProgressCallback,
    ) -> Result<String> {
        if self.stat == Stat::NoStat {
            debug_assert!(false, "scaled feature without STAT measure");
            return Err(Error::InvalidDescriptor(
                "Scaled features (SCx) must have an associated STAT measure".to_string(),
            ));
        }
        let cloud1 = self.first_cloud()?;

        // resolve both sources before computing anything
        let field1 = source_name(store, cloud1, attribute, names)?;
        let second = match self.cloud2 {
            Some(cloud2) if self.op != Operation::NoOperation => {
                Some((cloud2, source_name(store, cloud2, attribute, names)?))
            }
            Some(_) => {
                warn!("Feature has a second cloud associated but no MATH operation is defined");
                None
            }
            None => None,
        };

        let result_name = self.scaled_field_name(&field1, second.as_ref().map(|(_, field2)| field2.as_str()));

        let stat1 = self.stat_field(store, core_points, cloud1, attribute, names, &field1, &result_name, progress)?;
        let stat1_index = commit_field(store, core_points.cloud(), stat1)?;

        if let Some((cloud2, field2)) = second {
            let name2 = self.second_field_name(&field2);
            let stat2 = self.stat_field(store, core_points, cloud2, attribute, names, &field2, &name2, progress)?;

            let core_cloud = store.get_mut(core_points.cloud())?;
            let sf1 = core_cloud
                .scalar_field_mut(stat1_index)
                .ok_or_else(|| Error::InvalidInput(format!("field '{result_name}' vanished")))?;
            perform_math_op(sf1, &stat2, self.op).map_err(|e| Error::MathOperation(Box::new(e)))?;

            // a pre-existing field of that name is refreshed; otherwise the statistic was only transient
            if core_cloud.scalar_field_index_by_name(&name2).is_some() {
                core_cloud.attach_or_replace_field(stat2)?;
            } else {
                debug!("Released transient field '{name2}'");
            }
        }

        Ok(result_name)
    }

    #[allow(clippy::too_many_arguments)]
    fn stat_field(
        &self,
        store: &CloudStore,
        core_points: &CorePoints,
        cloud: CloudId,
        attribute: &PointAttribute,
        names: &FieldNames,
        field_name: &str,
        result_name: &str,
        progress: &mut dyn ProgressCallback,
    ) -> Result<ScalarField> {
        let wrap = |e: Error| Error::StatExtraction {
            field: field_name.to_string(),
            scale: self.scale,
            source: Box::new(e),
        };

        let source = resolve_source(store.get(cloud)?, attribute, names)?;
        extract_stat(store, core_points, cloud, &source, self.scale, self.stat, result_name, progress).map_err(wrap)
    }

    fn prepare_scale_less(
        &self,
        attribute: &PointAttribute,
        store: &mut CloudStore,
        core_points: &CorePoints,
        names: &FieldNames,
    ) -> Result<String> {
        let cloud1 = self.first_cloud()?;
        if cloud1 != core_points.cloud() && cloud1 != core_points.origin() {
            return Err(Error::InvalidDescriptor(
                "Scale-less features (SC0) can only be defined on the core points (origin) cloud".to_string(),
            ));
        }

        if self.cloud2.is_some() {
            if self.op != Operation::NoOperation {
                warn!("MATH operations cannot be performed on scale-less features (SC0): ignored");
            } else {
                warn!("Feature has a second cloud associated but no MATH operation is defined");
            }
        }

        let result = {
            let source = resolve_source(store.get(cloud1)?, attribute, names)?;
            let result_name = source.name().to_string();

            let core_cloud = store.get(core_points.cloud())?;
            if core_cloud.scalar_field_index_by_name(&result_name).is_some() {
                debug!("Reusing existing field '{result_name}'");
                return Ok(result_name);
            }

            let mut result = ScalarField::new(result_name);
            if let Err(e) = result.resize_safe(core_cloud.len()) {
                warn!("Not enough memory");
                return Err(e);
            }

            // values are read on cloud1, which is either the core cloud or its origin
            let read_on_core = cloud1 == core_points.cloud();
            for (i, value) in result.values_mut().iter_mut().enumerate() {
                let index = if read_on_core { i } else { core_points.origin_index(i) };
                *value = source.value_at(index);
            }
            result.compute_min_and_max();
            result
        };

        let name = result.name().to_string();
        commit_field(store, core_points.cloud(), result)?;
        Ok(name)
    }

    fn first_cloud(&self) -> Result<CloudId> {
        self.cloud1.ok_or_else(|| {
            debug_assert!(false, "feature without cloud");
            Error::InvalidInput("feature has no associated cloud".to_string())
        })
    }
}

fn source_name(store: &CloudStore, cloud: CloudId, attribute: &PointAttribute, names: &FieldNames) -> Result<String> {
    Ok(resolve_source(store.get(cloud)?, attribute, names)?.name().to_string())
}

/// Attach `field` to `cloud` (replacing a field of the same name) and show it
fn commit_field(store: &mut CloudStore, cloud: CloudId, field: ScalarField) -> Result<usize> {
    let cloud = store.get_mut(cloud)?;
    let name = field.name().to_string();
    let (index, reused) = cloud.attach_or_replace_field(field)?;
    debug!(
        "{} field '{name}'",
        if reused { "Refreshed existing" } else { "Created" }
    );
    cloud.show_scalar_field(index);
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use cloudfeat_core::{Point3d, PointCloud, NAN_VALUE};

    fn grid_cloud(intensity_offset: f64) -> PointCloud {
        let mut cloud = PointCloud::new();
        let mut intensity = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                cloud.push(Point3d::new(i as f64, j as f64, 0.0));
                intensity.push(intensity_offset + (i * 5 + j) as f64);
            }
        }
        cloud.add_scalar_field(ScalarField::from_values("Intensity", intensity)).unwrap();
        cloud
    }

    #[test]
    fn test_unimplemented_types_fail() {
        let mut store = CloudStore::new();
        let a = store.insert(grid_cloud(0.0));
        let b = store.insert(grid_cloud(0.0));
        let core = CorePoints::whole(a);

        for feature_type in [FeatureType::Neighborhood, FeatureType::ContextBased, FeatureType::DualCloud] {
            let mut feature = FeatureDescriptor::new(feature_type)
                .with_cloud1(a, "PC1")
                .with_cloud2(b, "PC2");
            let err = feature.prepare(&mut store, &core, &FieldNames::default(), None).unwrap_err();
            assert!(matches!(err, Error::Unimplemented(_)));
            assert!(feature.output_name().is_none());
        }
    }

    #[test]
    fn test_scaled_mean() {
        let mut store = CloudStore::new();
        let a = store.insert(grid_cloud(0.0));
        let core = CorePoints::whole(a);

        let mut feature = FeatureDescriptor::point(PointAttribute::Intensity, a, "PC1").with_stat(2.2, Stat::Mean);
        feature.prepare(&mut store, &core, &FieldNames::default(), None).unwrap();
        assert_eq!(feature.output_name(), Some("PC1.Intensity_MEAN@2.2"));

        let cloud = store.get(a).unwrap();
        let sf = cloud.find_scalar_field("PC1.Intensity_MEAN@2.2", false).unwrap();
        // corner (0,0): itself, (0,1) and (1,0)
        assert_relative_eq!(sf.value(0), (0.0 + 1.0 + 5.0) / 3.0);
        // center (2,2): itself and its 4 direct neighbors
        assert_relative_eq!(sf.value(12), 12.0);
        assert!(cloud.has_octree());
    }

    #[test]
    fn test_scaled_operation_releases_transient_field() {
        let mut store = CloudStore::new();
        let a = store.insert(grid_cloud(10.0));
        let b = store.insert(grid_cloud(4.0));
        let core = CorePoints::whole(a);

        let mut feature = FeatureDescriptor::point(PointAttribute::Intensity, a, "PC1")
            .with_stat(1.0, Stat::Mean)
            .with_operation(Operation::Minus, b, "PC2");
        feature.prepare(&mut store, &core, &FieldNames::default(), None).unwrap();

        let name = "PC1.Intensity_MEAN_MINUS_PC2.Intensity_MEAN@1";
        assert_eq!(feature.output_name(), Some(name));

        let cloud = store.get(a).unwrap();
        let sf = cloud.find_scalar_field(name, false).unwrap();
        assert!(sf.values().iter().all(|&v| (v - 6.0).abs() < 1e-9));
        assert_eq!(sf.min(), 6.0);
        assert!(cloud.find_scalar_field("PC2.Intensity_MEAN@1", false).is_none());
        assert_eq!(cloud.scalar_field_count(), 2);
    }

    #[test]
    fn test_scaled_operation_keeps_pre_existing_second_field() {
        let mut store = CloudStore::new();
        let a = store.insert(grid_cloud(10.0));
        let b = store.insert(grid_cloud(4.0));
        store
            .get_mut(a)
            .unwrap()
            .add_scalar_field(ScalarField::from_values("PC2.Intensity_MEAN@1", vec![NAN_VALUE; 25]))
            .unwrap();
        let core = CorePoints::whole(a);

        let mut feature = FeatureDescriptor::point(PointAttribute::Intensity, a, "PC1")
            .with_stat(1.0, Stat::Mean)
            .with_operation(Operation::Plus, b, "PC2");
        feature.prepare(&mut store, &core, &FieldNames::default(), None).unwrap();

        let cloud = store.get(a).unwrap();
        let kept = cloud.find_scalar_field("PC2.Intensity_MEAN@1", false).unwrap();
        assert_eq!(kept.value(7), 11.0);
    }

    #[test]
    fn test_second_cloud_without_operation_is_tolerated() {
        let mut store = CloudStore::new();
        let a = store.insert(grid_cloud(0.0));
        let b = store.insert(PointCloud::new());
        let core = CorePoints::whole(a);

        let mut feature = FeatureDescriptor::point(PointAttribute::Z, a, "PC1")
            .with_cloud2(b, "PC2")
            .with_stat(1.0, Stat::Range);
        feature.prepare(&mut store, &core, &FieldNames::default(), None).unwrap();
        assert_eq!(feature.output_name(), Some("PC1.Z_RANGE@1"));
    }

    #[test]
    fn test_missing_source_is_reported() {
        let mut store = CloudStore::new();
        let a = store.insert(grid_cloud(0.0));
        let b = store.insert(PointCloud::from_points(vec![Point3d::origin()]));
        let core = CorePoints::whole(a);

        let mut feature = FeatureDescriptor::point(PointAttribute::Intensity, a, "PC1")
            .with_stat(1.0, Stat::Mean)
            .with_operation(Operation::Divide, b, "PC2");
        let err = feature.prepare(&mut store, &core, &FieldNames::default(), None).unwrap_err();
        assert_eq!(err.to_string(), "Cloud has no 'intensity' scalar field");
        // nothing was computed since sources are resolved first
        assert_eq!(store.get(a).unwrap().scalar_field_count(), 1);
    }

    #[test]
    fn test_scale_less_copies_origin_values() {
        let mut store = CloudStore::new();
        let origin = store.insert(grid_cloud(100.0));
        let core_cloud = store.insert(PointCloud::from_points(vec![
            Point3d::new(0.0, 3.0, 0.0),
            Point3d::new(4.0, 4.0, 0.0),
        ]));
        let core = CorePoints::subsampled(&store, core_cloud, origin, vec![3, 24]).unwrap();

        let mut feature = FeatureDescriptor::point(PointAttribute::Intensity, origin, "PC1");
        feature.prepare(&mut store, &core, &FieldNames::default(), None).unwrap();
        assert_eq!(feature.output_name(), Some("Intensity"));

        let sf = store.get(core_cloud).unwrap().find_scalar_field("Intensity", false).unwrap();
        assert_eq!(sf.values(), &[103.0, 124.0]);
    }

    #[test]
    fn test_scale_less_rejects_foreign_cloud() {
        let mut store = CloudStore::new();
        let a = store.insert(grid_cloud(0.0));
        let other = store.insert(grid_cloud(0.0));
        let core = CorePoints::whole(a);

        let mut feature = FeatureDescriptor::point(PointAttribute::Intensity, other, "PC2");
        let err = feature.prepare(&mut store, &core, &FieldNames::default(), None).unwrap_err();
        assert!(err.to_string().contains("can only be defined on the core points"));
    }

    #[test]
    fn test_scale_less_on_subsampled_core_cloud_reads_core_values() {
        let mut store = CloudStore::new();
        let origin = store.insert(grid_cloud(100.0));
        let mut sub = PointCloud::from_points(vec![Point3d::new(0.0, 7.0, 0.0), Point3d::new(4.0, 9.0, 0.0)]);
        sub.add_scalar_field(ScalarField::from_values("Intensity", vec![-1.0, -2.0]))
            .unwrap();
        let core_cloud = store.insert(sub);
        let core = CorePoints::subsampled(&store, core_cloud, origin, vec![3, 24]).unwrap();

        // the core cloud is read at its own indices; the origin mapping would give [3, 4]
        let mut feature = FeatureDescriptor::point(PointAttribute::Y, core_cloud, "CORE");
        feature.prepare(&mut store, &core, &FieldNames::default(), None).unwrap();
        let sf = store.get(core_cloud).unwrap().find_scalar_field("Y", false).unwrap();
        assert_eq!(sf.values(), &[7.0, 9.0]);

        // an existing field of the same name is reused as is
        let mut feature = FeatureDescriptor::point(PointAttribute::Intensity, core_cloud, "CORE");
        feature.prepare(&mut store, &core, &FieldNames::default(), None).unwrap();
        let sf = store.get(core_cloud).unwrap().find_scalar_field("Intensity", false).unwrap();
        assert_eq!(sf.values(), &[-1.0, -2.0]);
    }

    #[test]
    fn test_validity_is_checked_before_feature_type() {
        let mut store = CloudStore::new();
        let a = store.insert(grid_cloud(0.0));
        let core = CorePoints::whole(a);

        // a dual-cloud feature with a single cloud is invalid before being unimplemented
        let mut feature = FeatureDescriptor::new(FeatureType::DualCloud).with_cloud1(a, "PC1");
        let err = feature.prepare(&mut store, &core, &FieldNames::default(), None).unwrap_err();
        assert!(matches!(err, Error::InvalidDescriptor(_)));
    }

    #[test]
    fn test_stale_core_points_are_rejected() {
        let mut store = CloudStore::new();
        let origin = store.insert(grid_cloud(0.0));
        let core_cloud = store.insert(PointCloud::from_points(vec![Point3d::new(0.0, 1.0, 0.0), Point3d::new(4.0, 4.0, 0.0)]));
        let core = CorePoints::subsampled(&store, core_cloud, origin, vec![1, 24]).unwrap();
        store.get_mut(core_cloud).unwrap().push(Point3d::new(2.0, 2.0, 0.0));

        let mut feature = FeatureDescriptor::point(PointAttribute::X, origin, "PC1");
        let err = feature.prepare(&mut store, &core, &FieldNames::default(), None).unwrap_err();
        assert!(matches!(err, Error::InconsistentData(_)));
        assert!(feature.output_name().is_none());
        assert_eq!(store.get(core_cloud).unwrap().scalar_field_count(), 0);
    }
}
