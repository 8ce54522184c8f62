//! Names of well-known scalar fields
//!
//! Different loaders name the same LiDAR attributes differently, so the names
//! used to look attributes up (and to label derived sources) are configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub intensity: String,
    pub number_of_returns: String,
    pub return_number: String,
    pub near_infrared: String,
    /// Looked up ignoring case
    pub m3c2_distance: String,
    /// Looked up ignoring case
    pub pcv_illuminance: String,
    /// Name given to the return number / number of returns ratio
    pub echo_ratio: String,
    /// Name given to the dip angle derived from normals
    pub normal_dip: String,
    /// Name given to the dip direction derived from normals
    pub normal_dip_direction: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            intensity: "Intensity".to_string(),
            number_of_returns: "Number Of Returns".to_string(),
            return_number: "Return Number".to_string(),
            near_infrared: "NIR".to_string(),
            m3c2_distance: "M3C2 distance".to_string(),
            pcv_illuminance: "Illuminance (PCV)".to_string(),
            echo_ratio: "EchoRat".to_string(),
            normal_dip: "Norm dip".to_string(),
            normal_dip_direction: "Norm dip dir.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let names: FieldNames = serde_json::from_str(r#"{ "intensity": "intensity_raw" }"#).unwrap();
        assert_eq!(names.intensity, "intensity_raw");
        assert_eq!(names.near_infrared, "NIR");
        assert_eq!(names.echo_ratio, "EchoRat");
    }
}
