//! Elementwise arithmetic between two scalar fields

use cloudfeat_core::{Error, Result, ScalarField, NAN_VALUE};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Math operation combining two fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Operation {
    #[default]
    NoOperation,
    Minus,
    Plus,
    Divide,
    Multiply,
}

impl Operation {
    /// Upper-case token, empty for [`Operation::NoOperation`]
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::NoOperation => "",
            Operation::Minus => "MINUS",
            Operation::Plus => "PLUS",
            Operation::Divide => "DIVIDE",
            Operation::Multiply => "MULTIPLY",
        }
    }

    /// Apply to one pair of values
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Operation::Minus => a - b,
            Operation::Plus => a + b,
            Operation::Multiply => a * b,
            Operation::Divide => {
                if b.abs() > DIVISOR_EPSILON {
                    a / b
                } else {
                    NAN_VALUE
                }
            }
            Operation::NoOperation => {
                debug_assert!(false, "no operation to apply");
                NAN_VALUE
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "" => Ok(Operation::NoOperation),
            "MINUS" => Ok(Operation::Minus),
            "PLUS" => Ok(Operation::Plus),
            "DIVIDE" => Ok(Operation::Divide),
            "MULTIPLY" => Ok(Operation::Multiply),
            other => Err(Error::InvalidInput(format!("unknown MATH operation '{other}'"))),
        }
    }
}

/// Divisors at or below this magnitude produce the sentinel value
const DIVISOR_EPSILON: f64 = f32::EPSILON as f64;

/// Combine `sf2` into `sf1` in place (`sf1 = sf1 <op> sf2`) and refresh the range of `sf1`
pub fn perform_math_op(sf1: &mut ScalarField, sf2: &ScalarField, op: Operation) -> Result<()> {
    if op == Operation::NoOperation {
        debug_assert!(false, "no operation to apply");
        return Err(Error::InvalidInput("no MATH operation defined".to_string()));
    }
    if sf1.len() != sf2.len() {
        debug_assert!(false, "field sizes differ");
        return Err(Error::InvalidInput(format!(
            "fields '{}' ({}) and '{}' ({}) have different sizes",
            sf1.name(),
            sf1.len(),
            sf2.name(),
            sf2.len()
        )));
    }

    for (a, &b) in sf1.values_mut().iter_mut().zip(sf2.values()) {
        *a = op.apply(*a, b);
    }
    sf1.compute_min_and_max();

    Ok(())
}
