//! Feature descriptors

use cloudfeat_algorithms::{Operation, PointAttribute, Stat};
use cloudfeat_core::{CloudId, Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of feature, with the attribute for point features
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    /// Scalar field, coordinate, color... optionally aggregated at a scale
    Point(PointAttribute),
    /// Neighborhood based features for a given scale
    Neighborhood,
    /// Contextual features
    ContextBased,
    /// Features requiring two point clouds
    DualCloud,
}

impl FeatureType {
    pub fn is_point(&self) -> bool {
        matches!(self, FeatureType::Point(_))
    }

    fn tag(&self) -> String {
        match self {
            FeatureType::Point(attribute) => attribute.tag(),
            FeatureType::Neighborhood => "NEIGHBORHOOD".to_string(),
            FeatureType::ContextBased => "CONTEXT".to_string(),
            FeatureType::DualCloud => "DUALCLOUD".to_string(),
        }
    }
}

/// Where the values of a feature come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Source {
    #[default]
    ScalarField,
    DimX,
    DimY,
    DimZ,
    Red,
    Green,
    Blue,
}

impl From<&PointAttribute> for Source {
    fn from(attribute: &PointAttribute) -> Self {
        match attribute {
            PointAttribute::X => Source::DimX,
            PointAttribute::Y => Source::DimY,
            PointAttribute::Z => Source::DimZ,
            PointAttribute::Red => Source::Red,
            PointAttribute::Green => Source::Green,
            PointAttribute::Blue => Source::Blue,
            _ => Source::ScalarField,
        }
    }
}

/// Declarative description of one requested feature.
///
/// A descriptor is built, checked with [`check_validity`](Self::check_validity),
/// then prepared against a set of core points. Preparation records the name of
/// the scalar field holding the feature values on the core cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureDescriptor {
    pub feature_type: FeatureType,
    /// Neighborhood diameter, NaN for scale-less features
    pub scale: f64,
    pub cloud1: Option<CloudId>,
    pub cloud2: Option<CloudId>,
    pub cloud1_label: String,
    pub cloud2_label: String,
    pub source: Source,
    /// Informative name of the source values
    pub source_name: String,
    /// Only considered if a scale is defined
    pub stat: Stat,
    /// Only considered if two clouds are defined
    pub op: Operation,
    pub(crate) output_name: Option<String>,
}

impl FeatureDescriptor {
    /// Scale-less descriptor of the given type
    pub fn new(feature_type: FeatureType) -> Self {
        let (source, source_name) = match &feature_type {
            FeatureType::Point(attribute) => (Source::from(attribute), attribute.tag()),
            _ => (Source::default(), String::new()),
        };
        Self {
            feature_type,
            scale: f64::NAN,
            cloud1: None,
            cloud2: None,
            cloud1_label: String::new(),
            cloud2_label: String::new(),
            source,
            source_name,
            stat: Stat::NoStat,
            op: Operation::NoOperation,
            output_name: None,
        }
    }

    /// Point feature read on `cloud`
    pub fn point(attribute: PointAttribute, cloud: CloudId, label: impl Into<String>) -> Self {
        Self::new(FeatureType::Point(attribute)).with_cloud1(cloud, label)
    }

    pub fn with_cloud1(mut self, cloud: CloudId, label: impl Into<String>) -> Self {
        self.cloud1 = Some(cloud);
        self.cloud1_label = label.into();
        self
    }

    pub fn with_cloud2(mut self, cloud: CloudId, label: impl Into<String>) -> Self {
        self.cloud2 = Some(cloud);
        self.cloud2_label = label.into();
        self
    }

    /// Aggregate with `stat` over neighborhoods of diameter `scale`
    pub fn with_stat(mut self, scale: f64, stat: Stat) -> Self {
        self.scale = scale;
        self.stat = stat;
        self
    }

    /// Combine with the same statistic computed on `cloud`
    pub fn with_operation(self, op: Operation, cloud: CloudId, label: impl Into<String>) -> Self {
        let mut feature = self.with_cloud2(cloud, label);
        feature.op = op;
        feature
    }

    /// Whether the feature has an associated scale
    pub fn scaled(&self) -> bool {
        self.scale.is_finite()
    }

    fn cloud_count(&self) -> usize {
        match (self.cloud1, self.cloud2) {
            (None, _) => 0,
            (Some(_), None) => 1,
            (Some(_), Some(_)) => 2,
        }
    }

    /// Check the feature definition
    pub fn check_validity(&self) -> Result<()> {
        let invalid = |msg: &str| Err(Error::InvalidDescriptor(msg.to_string()));
        let cloud_count = self.cloud_count();

        if cloud_count == 0 {
            return invalid("feature has no associated cloud");
        }

        if self.scaled() && self.stat == Stat::NoStat {
            return invalid("scaled features need a STAT measure to be defined");
        }

        if self.stat != Stat::NoStat {
            if !self.feature_type.is_point() {
                return invalid("STAT measures can only be defined on Point features");
            }
            if !self.scaled() {
                return invalid("STAT measures need at least one scale to be defined");
            }
        }

        if self.op != Operation::NoOperation {
            if !self.scaled() {
                return invalid("math operations can't be defined on scale-less features (SC0)");
            }
            if self.feature_type == FeatureType::DualCloud {
                return invalid("math operations can't be defined on dual-cloud features");
            }
            if cloud_count < 2 {
                return invalid("at least two clouds are required to apply math operations");
            }
        }

        if matches!(self.feature_type, FeatureType::DualCloud | FeatureType::ContextBased) && cloud_count < 2 {
            return invalid("at least two clouds are required to compute dual-cloud or context-based features");
        }

        Ok(())
    }

    /// Name of the scalar field holding the feature on the core cloud, once prepared
    pub fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref()
    }

    /// `<label1>.<field1>_<STAT>[_<OP>_<label2>.<field2>_<STAT>]@<scale>`
    pub fn scaled_field_name(&self, field1: &str, field2: Option<&str>) -> String {
        let mut name = format!("{}.{}_{}", self.cloud1_label, field1, self.stat);
        if let Some(field2) = field2 {
            name.push_str(&format!("_{}_{}.{}_{}", self.op, self.cloud2_label, field2, self.stat));
        }
        name.push_str(&format!("@{}", format_scale(self.scale)));
        name
    }

    /// `<label2>.<field2>_<STAT>@<scale>`, the transient per-cloud statistic of the second cloud
    pub fn second_field_name(&self, field2: &str) -> String {
        format!("{}.{}_{}@{}", self.cloud2_label, field2, self.stat, format_scale(self.scale))
    }
}

/// Scale as it appears in field names: 6 significant digits, trailing zeros
/// removed, scientific notation below 1e-4 and from 1e6 on (`%g`)
fn format_scale(scale: f64) -> String {
    if scale == 0.0 || !scale.is_finite() {
        return scale.to_string();
    }

    let scientific = format!("{scale:.5e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if (-4..6).contains(&exponent) {
        let decimals = (5 - exponent) as usize;
        trim_fraction(&format!("{scale:.decimals$}"))
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_fraction(mantissa), exponent.abs())
    }
}

fn trim_fraction(digits: &str) -> String {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        digits.to_string()
    }
}

impl fmt::Display for FeatureDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.feature_type.tag())?;
        if !self.cloud1_label.is_empty() {
            write!(f, "_{}", self.cloud1_label)?;
        }
        if self.stat != Stat::NoStat {
            write!(f, "_{}", self.stat)?;
        }
        if self.op != Operation::NoOperation {
            write!(f, "_{}_{}", self.op, self.cloud2_label)?;
        }
        if self.scaled() {
            write!(f, "@{}", format_scale(self.scale))?;
        } else {
            write!(f, "@SC0")?;
        }
        Ok(())
    }
}
