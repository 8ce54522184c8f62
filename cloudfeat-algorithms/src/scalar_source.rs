//! Uniform read access to heterogeneous per-point attributes
//!
//! A [`ScalarSource`] exposes stored fields, coordinates, color channels, field
//! ratios and normal-derived angles as one `index -> f64` function. Sources are
//! resolved from a [`PointAttribute`] request once; missing prerequisites are
//! reported at resolution time, never while reading values.

use crate::config::FieldNames;
use cloudfeat_core::{
    ColorChannel, Dimension, Error, Point3d, PointCloud, Result, Rgb, ScalarField, Vector3d, NAN_VALUE,
};
use serde::{Deserialize, Serialize};

/// Attribute a point feature is computed from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointAttribute {
    Intensity,
    X,
    Y,
    Z,
    NumberOfReturns,
    ReturnNumber,
    /// Return number divided by number of returns
    EchoRatio,
    Red,
    Green,
    Blue,
    NearInfrared,
    DipAngle,
    DipDirection,
    M3c2Distance,
    PcvIlluminance,
    /// Any stored field, by position
    FieldIndex(usize),
    /// Any stored field, by exact name
    FieldName(String),
}

impl PointAttribute {
    /// Short tag used in feature descriptions
    pub fn tag(&self) -> String {
        match self {
            PointAttribute::Intensity => "INT".to_string(),
            PointAttribute::X => "X".to_string(),
            PointAttribute::Y => "Y".to_string(),
            PointAttribute::Z => "Z".to_string(),
            PointAttribute::NumberOfReturns => "NBRET".to_string(),
            PointAttribute::ReturnNumber => "RETNB".to_string(),
            PointAttribute::EchoRatio => "ECHORAT".to_string(),
            PointAttribute::Red => "R".to_string(),
            PointAttribute::Green => "G".to_string(),
            PointAttribute::Blue => "B".to_string(),
            PointAttribute::NearInfrared => "NIR".to_string(),
            PointAttribute::DipAngle => "DIP".to_string(),
            PointAttribute::DipDirection => "DIPDIR".to_string(),
            PointAttribute::M3c2Distance => "M3C2".to_string(),
            PointAttribute::PcvIlluminance => "PCV".to_string(),
            PointAttribute::FieldIndex(index) => format!("SF{index}"),
            PointAttribute::FieldName(name) => name.clone(),
        }
    }
}

/// Which angle to derive from a normal vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalAngle {
    Dip,
    DipDirection,
}

/// Read-only, index-addressable view over one per-point value of a cloud
#[derive(Debug, Clone)]
pub enum ScalarSource<'a> {
    Direct(&'a ScalarField),
    Dimension {
        points: &'a [Point3d],
        dim: Dimension,
    },
    /// Reads the sentinel value when the cloud carries no colors
    Color {
        colors: Option<&'a [Rgb]>,
        channel: ColorChannel,
    },
    Ratio {
        numerator: &'a ScalarField,
        denominator: &'a ScalarField,
        name: String,
    },
    DerivedAngle {
        normals: &'a [Vector3d],
        angle: NormalAngle,
        name: String,
    },
}

impl ScalarSource<'_> {
    pub fn name(&self) -> &str {
        match self {
            ScalarSource::Direct(sf) => sf.name(),
            ScalarSource::Dimension { dim, .. } => dim.name(),
            ScalarSource::Color { channel, .. } => channel.name(),
            ScalarSource::Ratio { name, .. } | ScalarSource::DerivedAngle { name, .. } => name,
        }
    }

    /// Value of point `index`
    pub fn value_at(&self, index: usize) -> f64 {
        match self {
            ScalarSource::Direct(sf) => sf.value(index),
            ScalarSource::Dimension { points, dim } => dim.of(&points[index]),
            ScalarSource::Color { colors, channel } => colors.map_or(NAN_VALUE, |c| channel.of(&c[index])),
            ScalarSource::Ratio {
                numerator,
                denominator,
                ..
            } => {
                let d = denominator.value(index);
                if d.abs() > f64::from(f32::EPSILON) {
                    numerator.value(index) / d
                } else {
                    NAN_VALUE
                }
            }
            ScalarSource::DerivedAngle { normals, angle, .. } => {
                let (dip, dip_direction) = dip_and_dip_direction(&normals[index]);
                match angle {
                    NormalAngle::Dip => dip,
                    NormalAngle::DipDirection => dip_direction,
                }
            }
        }
    }
}

/// Dip and dip direction (degrees) of the plane with normal `n`.
///
/// Dip is in [0, 90], dip direction in [0, 360) clockwise from +Y. Downward
/// normals are flipped first so parallel facets get the same angles.
pub fn dip_and_dip_direction(n: &Vector3d) -> (f64, f64) {
    if (n.x * n.x + n.y * n.y).sqrt() < f64::from(f32::EPSILON) {
        return (0.0, 0.0);
    }

    let sign = if n.z < 0.0 { -1.0 } else { 1.0 };
    let mut dip_direction = (sign * n.x).atan2(sign * n.y);
    if dip_direction < 0.0 {
        dip_direction += 2.0 * std::f64::consts::PI;
    }
    let dip = n.z.abs().min(1.0).acos();

    (dip.to_degrees(), dip_direction.to_degrees())
}

/// Per-point data of `cloud` must hold exactly one value per point
fn check_length(what: &str, len: usize, cloud: &PointCloud) -> Result<()> {
    if len != cloud.len() {
        return Err(Error::InconsistentData(format!(
            "{what} has {len} values for {} points",
            cloud.len()
        )));
    }
    Ok(())
}

fn direct(cloud: &PointCloud, sf: &ScalarField) -> Result<()> {
    check_length(&format!("Scalar field '{}'", sf.name()), sf.len(), cloud)
}

/// Resolve `attribute` on `cloud`.
///
/// Every piece of per-point data the source reads is checked against the
/// cloud size here, so reading any index below `cloud.len()` never fails.
pub fn resolve_source<'a>(
    cloud: &'a PointCloud,
    attribute: &PointAttribute,
    names: &FieldNames,
) -> Result<ScalarSource<'a>> {
    let stored = |name: &str, case_insensitive: bool, label: &str| -> Result<ScalarSource<'a>> {
        let sf = cloud
            .find_scalar_field(name, case_insensitive)
            .ok_or_else(|| Error::MissingPrerequisite(format!("Cloud has no '{label}' scalar field")))?;
        direct(cloud, sf)?;
        Ok(ScalarSource::Direct(sf))
    };

    match attribute {
        PointAttribute::Intensity => stored(&names.intensity, false, "intensity"),
        PointAttribute::NumberOfReturns => stored(&names.number_of_returns, false, "number of returns"),
        PointAttribute::ReturnNumber => stored(&names.return_number, false, "return number"),
        PointAttribute::NearInfrared => stored(&names.near_infrared, false, "NIR"),
        PointAttribute::M3c2Distance => stored(&names.m3c2_distance, true, "m3c2 distance"),
        PointAttribute::PcvIlluminance => stored(&names.pcv_illuminance, true, "PCV/Illuminance"),
        PointAttribute::FieldName(name) => stored(name.as_str(), false, name.as_str()),
        PointAttribute::FieldIndex(index) => {
            let sf = cloud.scalar_field(*index).ok_or_else(|| {
                Error::MissingPrerequisite(format!(
                    "Can't retrieve the specified SF: invalid index ({index})"
                ))
            })?;
            direct(cloud, sf)?;
            Ok(ScalarSource::Direct(sf))
        }
        PointAttribute::X | PointAttribute::Y | PointAttribute::Z => Ok(ScalarSource::Dimension {
            points: cloud.points(),
            dim: match attribute {
                PointAttribute::X => Dimension::X,
                PointAttribute::Y => Dimension::Y,
                _ => Dimension::Z,
            },
        }),
        PointAttribute::Red | PointAttribute::Green | PointAttribute::Blue => {
            let colors = cloud.colors();
            if let Some(colors) = colors {
                check_length("Colors", colors.len(), cloud)?;
            }
            Ok(ScalarSource::Color {
                colors,
                channel: match attribute {
                    PointAttribute::Red => ColorChannel::Red,
                    PointAttribute::Green => ColorChannel::Green,
                    _ => ColorChannel::Blue,
                },
            })
        }
        PointAttribute::EchoRatio => {
            let number_of_returns = cloud.find_scalar_field(&names.number_of_returns, false).ok_or_else(|| {
                Error::MissingPrerequisite(
                    "Can't compute the 'echo ratio' field: no 'Number of Return' SF available".to_string(),
                )
            })?;
            let return_number = cloud.find_scalar_field(&names.return_number, false).ok_or_else(|| {
                Error::MissingPrerequisite(
                    "Can't compute the 'echo ratio' field: no 'Return number' SF available".to_string(),
                )
            })?;
            if return_number.len() != number_of_returns.len() || return_number.len() != cloud.len() {
                return Err(Error::InconsistentData(
                    "Internal error (inconsistent scalar fields)".to_string(),
                ));
            }
            Ok(ScalarSource::Ratio {
                numerator: return_number,
                denominator: number_of_returns,
                name: names.echo_ratio.clone(),
            })
        }
        PointAttribute::DipAngle | PointAttribute::DipDirection => {
            let normals = cloud.normals().ok_or_else(|| {
                Error::MissingPrerequisite(
                    "Cloud has no normals: can't compute dip or dip dir. angles".to_string(),
                )
            })?;
            check_length("Normals", normals.len(), cloud)?;
            let (angle, name) = if *attribute == PointAttribute::DipAngle {
                (NormalAngle::Dip, names.normal_dip.clone())
            } else {
                (NormalAngle::DipDirection, names.normal_dip_direction.clone())
            };
            Ok(ScalarSource::DerivedAngle { normals, angle, name })
        }
    }
}
