//! Spatial movement of fish between neighbouring cells.
//!
//! Every flow of one step is computed from a snapshot of the counts at the start of the step
//! and applied in one pass at the end, so the result does not depend on the order cells or
//! neighbours are visited in.

use std::collections::BTreeMap;
use std::fmt;

use crate::abundance::StructuredAbundance;
use crate::error::{ConfigError, Result};
use crate::local_biology::CellMap;
use crate::scenario::DiffusionConfig;
use crate::spatial::{CellId, Neighborhood};
use crate::species::Species;

pub trait Diffuser: Send + Sync + fmt::Debug {
    /// Moves fish of `species` between the abundance cells of `cells`.
    fn diffuse(&self, species: &Species, cells: &mut CellMap, map: &dyn Neighborhood);

    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoDiffusion;

impl Diffuser for NoDiffusion {
    fn diffuse(&self, _species: &Species, _cells: &mut CellMap, _map: &dyn Neighborhood) {}

    fn name(&self) -> &str {
        "None"
    }
}

/// Each step, every cell sends `rate` of its fish in bins `[min_bin, max_bin]` to each of its
/// neighbours. When a cell has so many neighbours that `rate * n` exceeds one, each neighbour
/// gets `1 / n` instead and the cell empties those bins.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantRateDiffuser {
    rate: f64,
    min_bin: usize,
    max_bin: usize,
    radius: usize,
}

impl ConstantRateDiffuser {
    pub fn new(rate: f64, min_bin: usize, max_bin: usize) -> Result<Self> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::DiffusionRateOutOfRange(rate).into());
        }
        if min_bin > max_bin {
            return Err(ConfigError::InvalidAgeRange {
                min: min_bin,
                max: max_bin,
            }
            .into());
        }
        Ok(Self {
            rate,
            min_bin,
            max_bin,
            radius: 1,
        })
    }

    /// Moore neighbourhood radius, 1 unless set.
    pub fn with_radius(mut self, radius: usize) -> Self {
        self.radius = radius.max(1);
        self
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Diffuser for ConstantRateDiffuser {
    fn diffuse(&self, species: &Species, cells: &mut CellMap, map: &dyn Neighborhood) {
        let start: BTreeMap<CellId, StructuredAbundance> = cells
            .iter()
            .filter_map(|(cell, local)| {
                local
                    .as_abundance()
                    .and_then(|local| local.abundance(species))
                    .map(|abundance| (*cell, abundance.clone()))
            })
            .collect();
        if start.len() < 2 || self.rate == 0.0 {
            return;
        }

        let mut leaving: BTreeMap<CellId, StructuredAbundance> = BTreeMap::new();
        let mut arriving: BTreeMap<CellId, StructuredAbundance> = BTreeMap::new();
        for (source, counts) in &start {
            let mut neighbors: Vec<CellId> = map
                .neighbors(*source, self.radius)
                .into_iter()
                .filter(|cell| cell != source && start.contains_key(cell))
                .collect();
            neighbors.sort();
            neighbors.dedup();
            if neighbors.is_empty() {
                continue;
            }

            let n = neighbors.len() as f64;
            let share = if self.rate * n > 1.0 { 1.0 / n } else { self.rate };
            let last_bin = self.max_bin.min(counts.bins().saturating_sub(1));
            if self.min_bin > last_bin {
                continue;
            }

            for subdivision in 0..counts.subdivisions() {
                for bin in self.min_bin..=last_bin {
                    let present = counts.get(subdivision, bin);
                    let moved = share * present;
                    if moved <= 0.0 {
                        continue;
                    }
                    let outflow = delta_for(&mut leaving, *source, counts);
                    outflow.set(subdivision, bin, (moved * n).min(present));
                    for destination in &neighbors {
                        let inflow = delta_for(&mut arriving, *destination, counts);
                        inflow.set(subdivision, bin, inflow.get(subdivision, bin) + moved);
                    }
                }
            }
        }

        for (cell, snapshot) in &start {
            let Some(abundance) = cells
                .get_mut(cell)
                .and_then(|local| local.as_abundance_mut())
                .and_then(|local| local.abundance_mut(species))
            else {
                continue;
            };
            let empty = StructuredAbundance::empty(snapshot.subdivisions(), snapshot.bins());
            let out = leaving.get(cell).unwrap_or(&empty);
            let inn = arriving.get(cell).unwrap_or(&empty);
            for (subdivision, row) in abundance.rows_mut().enumerate() {
                for (bin, count) in row.iter_mut().enumerate() {
                    let left = out.get(subdivision, bin);
                    debug_assert!(left <= *count, "diffusion moved {} of {} fish", left, count);
                    *count = (*count - left) + inn.get(subdivision, bin);
                }
            }
        }
    }

    fn name(&self) -> &str {
        "Constant rate"
    }
}

fn delta_for<'a>(
    deltas: &'a mut BTreeMap<CellId, StructuredAbundance>,
    cell: CellId,
    shape: &StructuredAbundance,
) -> &'a mut StructuredAbundance {
    deltas
        .entry(cell)
        .or_insert_with(|| StructuredAbundance::empty(shape.subdivisions(), shape.bins()))
}

pub fn create_diffuser(config: &DiffusionConfig) -> Result<Box<dyn Diffuser>> {
    Ok(match config {
        DiffusionConfig::None => Box::new(NoDiffusion),
        DiffusionConfig::ConstantRate {
            rate,
            min_bin,
            max_bin,
            radius,
        } => Box::new(ConstantRateDiffuser::new(*rate, *min_bin, *max_bin)?.with_radius(*radius)),
    })
}
