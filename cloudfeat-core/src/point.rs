//! Point types and related functionality

use nalgebra::{Point3, Vector3};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// An 8-bit RGB color
pub type Rgb = [u8; 3];

/// Coordinate axis of a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Dimension {
    X,
    Y,
    Z,
}

impl Dimension {
    /// Reads this coordinate of `point`
    pub fn of(self, point: &Point3d) -> f64 {
        match self {
            Dimension::X => point.x,
            Dimension::Y => point.y,
            Dimension::Z => point.z,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Dimension::X => "X",
            Dimension::Y => "Y",
            Dimension::Z => "Z",
        }
    }
}

/// Channel of an RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ColorChannel {
    Red,
    Green,
    Blue,
}

impl ColorChannel {
    /// Reads this channel of `color`, normalized to [0, 1]
    pub fn of(self, color: &Rgb) -> f64 {
        let raw = match self {
            ColorChannel::Red => color[0],
            ColorChannel::Green => color[1],
            ColorChannel::Blue => color[2],
        };
        f64::from(raw) / 255.0
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorChannel::Red => "R",
            ColorChannel::Green => "G",
            ColorChannel::Blue => "B",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dimension_and_channel_access() {
        let p = Point3d::new(1.0, -2.0, 3.5);
        assert_eq!(Dimension::X.of(&p), 1.0);
        assert_eq!(Dimension::Y.of(&p), -2.0);
        assert_eq!(Dimension::Z.of(&p), 3.5);

        let c: Rgb = [255, 0, 51];
        assert_relative_eq!(ColorChannel::Red.of(&c), 1.0);
        assert_relative_eq!(ColorChannel::Green.of(&c), 0.0);
        assert_relative_eq!(ColorChannel::Blue.of(&c), 0.2);
    }
}
