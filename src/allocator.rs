//! Spatial weights used to spread a species-wide quantity (recruits, initial stock) over cells.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ConfigError, Result};
use crate::spatial::{CellId, DoubleGrid, GridMap};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Allocator {
    /// Same weight everywhere.
    #[default]
    Uniform,
    /// Weight read from a grid shaped like the map.
    Grid { grid: DoubleGrid },
    /// Decays from the west edge: `max(((width - x) / width) ^ exponent, min_ratio)`.
    LeftToRight { exponent: f64, min_ratio: f64 },
}

impl Allocator {
    pub fn validate(&self, map: &GridMap) -> Result<()> {
        match self {
            Allocator::Uniform => Ok(()),
            Allocator::Grid { grid } => {
                grid.check_shape(map)?;
                for (cell, value) in grid.cells() {
                    if !value.is_finite() || value < 0.0 {
                        return Err(ConfigError::InvalidGridWeight {
                            key: "allocator".to_string(),
                            cell,
                            value,
                        }
                        .into());
                    }
                }
                Ok(())
            }
            Allocator::LeftToRight { exponent, min_ratio } => {
                if !(0.0..=1.0).contains(min_ratio) {
                    return Err(ConfigError::InvalidParameter {
                        name: "min_ratio".to_string(),
                        reason: format!("{} is outside [0, 1]", min_ratio),
                    }
                    .into());
                }
                if !exponent.is_finite() {
                    return Err(ConfigError::InvalidParameter {
                        name: "exponent".to_string(),
                        reason: "must be finite".to_string(),
                    }
                    .into());
                }
                Ok(())
            }
        }
    }

    /// Raw, unnormalised weight of `cell`.
    pub fn weight(&self, cell: CellId, map: &GridMap) -> f64 {
        match self {
            Allocator::Uniform => 1.0,
            Allocator::Grid { grid } => grid.get(cell),
            Allocator::LeftToRight { exponent, min_ratio } => {
                let width = map.width() as f64;
                let ratio = ((width - cell.x as f64) / width).powf(*exponent);
                ratio.max(*min_ratio)
            }
        }
    }

    /// Weights of `cells` normalised to sum to one.
    pub fn shares(&self, cells: &[CellId], map: &GridMap) -> Result<BTreeMap<CellId, f64>> {
        let weights: BTreeMap<CellId, f64> = cells
            .iter()
            .map(|&cell| (cell, self.weight(cell, map)))
            .collect();
        let total: f64 = weights.values().sum();
        if total <= 0.0 || !total.is_finite() {
            return Err(ConfigError::EmptyGrid {
                key: "allocator".to_string(),
            }
            .into());
        }
        Ok(weights
            .into_iter()
            .map(|(cell, weight)| (cell, weight / total))
            .collect())
    }
}
