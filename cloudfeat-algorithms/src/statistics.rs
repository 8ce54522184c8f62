//! Neighborhood statistics
//!
//! For every query point, the values of a [`ScalarSource`] over the spherical
//! neighborhood of the point (extracted from a [`SpatialIndex`]) are reduced
//! to a single number.

use crate::scalar_source::ScalarSource;
use cloudfeat_core::{
    CloudId, CloudStore, CorePoints, Error, Point3d, ProgressCallback, Result, ScalarField, SpatialIndex, NAN_VALUE,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Statistical measure computed over a neighborhood
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Stat {
    #[default]
    NoStat,
    Mean,
    /// Most frequent value
    Mode,
    Std,
    Range,
    /// (mean - mode) / std
    Skew,
}

impl Stat {
    /// Upper-case token, empty for [`Stat::NoStat`]
    pub fn as_str(self) -> &'static str {
        match self {
            Stat::NoStat => "",
            Stat::Mean => "MEAN",
            Stat::Mode => "MODE",
            Stat::Std => "STD",
            Stat::Range => "RANGE",
            Stat::Skew => "SKEW",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "" => Ok(Stat::NoStat),
            "MEAN" => Ok(Stat::Mean),
            "MODE" => Ok(Stat::Mode),
            "STD" => Ok(Stat::Std),
            "RANGE" => Ok(Stat::Range),
            "SKEW" => Ok(Stat::Skew),
            other => Err(Error::InvalidInput(format!("unknown STAT measure '{other}'"))),
        }
    }
}

/// Threshold under which a standard deviation is considered null
const STD_EPSILON: f64 = f32::EPSILON as f64;

/// Reduce the values of one neighborhood.
///
/// An empty neighborhood yields [`NAN_VALUE`] whatever the statistic.
pub fn reduce_neighborhood(values: &[f64], stat: Stat) -> Result<f64> {
    let k = values.len();
    if k == 0 {
        return Ok(NAN_VALUE);
    }

    match stat {
        Stat::NoStat => {
            debug_assert!(false, "no STAT measure to compute");
            Err(Error::InvalidInput("Unhandled STAT measure".to_string()))
        }
        Stat::Range => {
            let mut min_value = values[0];
            let mut max_value = values[0];
            for &v in &values[1..] {
                if v < min_value {
                    min_value = v;
                } else if v > max_value {
                    max_value = v;
                }
            }
            Ok(max_value - min_value)
        }
        Stat::Mean => {
            let (sum, _) = sums(values);
            Ok(sum / k as f64)
        }
        Stat::Std => {
            let (sum, sum2) = sums(values);
            let k = k as f64;
            Ok((sum2 * k - sum * sum).abs().sqrt() / k)
        }
        Stat::Mode => Ok(mode(values)),
        Stat::Skew => {
            let (sum, sum2) = sums(values);
            let k = k as f64;
            let mean = sum / k;
            let std = (sum2 / k - mean * mean).abs().sqrt();
            if std > STD_EPSILON {
                Ok((mean - mode(values)) / std)
            } else {
                Ok(NAN_VALUE)
            }
        }
    }
}

/// Sum and sum of squares
fn sums(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((0.0, 0.0), |(sum, sum2), &v| (sum + v, sum2 + v * v))
}

/// Most frequent value after reduction to single precision.
///
/// Buckets are scanned by ascending value and only a strictly higher count
/// replaces the current best, so ties go to the lowest value.
fn mode(values: &[f64]) -> f64 {
    let mut buckets: Vec<f32> = values.iter().map(|&v| v as f32).collect();
    buckets.sort_unstable_by(f32::total_cmp);

    let mut best = NAN_VALUE;
    let mut best_count = 0usize;
    let mut i = 0;
    while i < buckets.len() {
        let value = buckets[i];
        let run = buckets[i..].iter().take_while(|&&b| b == value).count().max(1);
        if run > best_count {
            best_count = run;
            best = f64::from(value);
        }
        i += run;
    }
    best
}

/// Computes one statistic over spherical neighborhoods of a source cloud
pub struct NeighborhoodStatistics<'a> {
    index: &'a dyn SpatialIndex,
    source: &'a ScalarSource<'a>,
    stat: Stat,
    radius: f64,
    level: u8,
}

impl<'a> NeighborhoodStatistics<'a> {
    /// `scale` is the neighborhood diameter
    pub fn new(index: &'a dyn SpatialIndex, source: &'a ScalarSource<'a>, scale: f64, stat: Stat) -> Result<Self> {
        if !(scale > 0.0) || !scale.is_finite() {
            debug_assert!(false, "invalid scale {scale}");
            return Err(Error::InvalidInput(format!("invalid scale ({scale})")));
        }
        if stat == Stat::NoStat {
            debug_assert!(false, "no STAT measure to compute");
            return Err(Error::InvalidInput("no STAT measure to compute".to_string()));
        }

        let radius = scale / 2.0;
        let level = index.best_level_for(radius);
        log::debug!("{} of '{}' with radius {radius}: octree level {level}", stat, source.name());

        Ok(Self {
            index,
            source,
            stat,
            radius,
            level,
        })
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Statistic of the neighborhood of `query`. `scratch` is reused between calls.
    pub fn value_at(&self, query: &Point3d, scratch: &mut Vec<f64>) -> Result<f64> {
        scratch.clear();
        scratch.extend(
            self.index
                .spherical_range_query(query, self.level, self.radius)
                .into_iter()
                .map(|idx| self.source.value_at(idx)),
        );
        reduce_neighborhood(scratch, self.stat)
    }

    /// Write the statistic of each query point into `output`.
    ///
    /// `output` is reset to the sentinel value first. The progress hook is
    /// polled after every point; on cancellation the values already written
    /// are kept and [`Error::Cancelled`] is returned.
    pub fn compute_into(
        &self,
        queries: &[Point3d],
        output: &mut [f64],
        progress: &mut dyn ProgressCallback,
    ) -> Result<()> {
        if queries.len() != output.len() {
            return Err(Error::InvalidInput(format!(
                "{} query points for an output of {} values",
                queries.len(),
                output.len()
            )));
        }

        output.iter_mut().for_each(|v| *v = NAN_VALUE);
        let mut scratch = Vec::new();
        for (query, out) in queries.iter().zip(output.iter_mut()) {
            *out = self.value_at(query, &mut scratch)?;

            if !progress.step() {
                log::warn!("Process cancelled");
                return Err(Error::Cancelled);
            }
        }
        Ok(())
    }
}

/// Compute `stat` of `source` (read on `source_cloud`) around every core point.
///
/// The octree of the source cloud is built if needed. The returned field is
/// named `result_name` and is not attached to any cloud.
#[allow(clippy::too_many_arguments)]
pub fn extract_stat(
    store: &CloudStore,
    core_points: &CorePoints,
    source_cloud: CloudId,
    source: &ScalarSource<'_>,
    scale: f64,
    stat: Stat,
    result_name: &str,
    progress: &mut dyn ProgressCallback,
) -> Result<ScalarField> {
    let core_cloud = store.get(core_points.cloud())?;
    let octree = store.get(source_cloud)?.octree();
    let stats = NeighborhoodStatistics::new(octree, source, scale, stat)?;

    let mut result = ScalarField::new(result_name);
    if let Err(e) = result.resize_safe(core_cloud.len()) {
        log::warn!("Not enough memory");
        return Err(e);
    }

    progress.set_info(&format!(
        "Computing field: {result_name}\n(core points: {})",
        core_cloud.len()
    ));
    stats.compute_into(core_cloud.points(), result.values_mut(), progress)?;
    result.compute_min_and_max();

    Ok(result)
}
