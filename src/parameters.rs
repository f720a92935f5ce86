use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ConfigError, Result};

/// A scenario number that is either given outright or drawn once when the model is built.
///
/// Deserializes from a bare number (`0.5`) or from `{ "min": 0.1, "max": 0.9 }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DoubleParameter {
    Fixed(f64),
    Uniform { min: f64, max: f64 },
}

impl DoubleParameter {
    pub fn validate(&self, name: &str) -> Result<()> {
        match *self {
            DoubleParameter::Fixed(value) if !value.is_finite() => Err(ConfigError::InvalidParameter {
                name: name.to_string(),
                reason: format!("{} is not a finite number", value),
            }
            .into()),
            DoubleParameter::Uniform { min, max } if !(min.is_finite() && max.is_finite()) || min > max => {
                Err(ConfigError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("uniform range [{}, {}] is empty", min, max),
                }
                .into())
            }
            _ => Ok(()),
        }
    }

    pub fn apply<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            DoubleParameter::Fixed(value) => value,
            DoubleParameter::Uniform { min, max } if min >= max => min,
            DoubleParameter::Uniform { min, max } => rng.random_range(min..max),
        }
    }
}

impl From<f64> for DoubleParameter {
    fn from(value: f64) -> Self {
        DoubleParameter::Fixed(value)
    }
}

impl fmt::Display for DoubleParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DoubleParameter::Fixed(value) => write!(f, "{}", value),
            DoubleParameter::Uniform { min, max } => write!(f, "U[{}, {})", min, max),
        }
    }
}
