//! What lives in one map cell.
//!
//! [`AbundanceLocalBiology`] holds a cohort matrix per real species with a lazily computed
//! biomass per species. Reads never invalidate the cache; every path that hands out mutable
//! access does, so a caller can only change counts through [`AbundanceLocalBiology::abundance_mut`]
//! or the removal methods. Imaginary species have no matrix at all.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::BTreeMap;

use crate::abundance::{StructuredAbundance, weigh};
use crate::catch::Catch;
use crate::error::{ConfigError, InvariantViolation, Result};
use crate::spatial::CellId;
use crate::species::{GlobalBiology, Species};

/// Every cell of the map with its biology, iterated in cell order.
pub type CellMap = BTreeMap<CellId, LocalBiology>;

#[derive(Debug, Clone)]
pub struct AbundanceLocalBiology {
    abundance: Vec<Option<StructuredAbundance>>,
    biomass_cache: Vec<Cell<Option<f64>>>,
}

impl AbundanceLocalBiology {
    /// Empty matrices for every real species.
    pub fn new(biology: &GlobalBiology) -> Self {
        let abundance: Vec<_> = biology
            .species()
            .iter()
            .map(|s| (!s.is_imaginary()).then(|| StructuredAbundance::empty_for(s.meristics())))
            .collect();
        Self {
            biomass_cache: vec![Cell::new(None); abundance.len()],
            abundance,
        }
    }

    /// Replaces the matrix of `species`, checking it has the species' shape.
    pub fn with_abundance(mut self, species: &Species, matrix: StructuredAbundance) -> Result<Self> {
        self.set_abundance(species, matrix)?;
        Ok(self)
    }

    pub fn set_abundance(&mut self, species: &Species, matrix: StructuredAbundance) -> Result<()> {
        if matrix.subdivisions() != species.number_of_subdivisions() {
            return Err(ConfigError::MismatchedSubdivisions {
                expected: species.number_of_subdivisions(),
                actual: matrix.subdivisions(),
            }
            .into());
        }
        if matrix.bins() != species.number_of_bins() {
            return Err(ConfigError::MismatchedBins {
                expected: species.number_of_bins(),
                actual: matrix.bins(),
            }
            .into());
        }
        if let Some(slot) = self.abundance_mut(species) {
            *slot = matrix;
        }
        Ok(())
    }

    /// Read-only view of the counts of `species`; `None` for imaginary species.
    pub fn abundance(&self, species: &Species) -> Option<&StructuredAbundance> {
        self.abundance.get(species.index()).and_then(Option::as_ref)
    }

    /// Exclusive access to the counts of `species`. Marks its biomass stale.
    pub fn abundance_mut(&mut self, species: &Species) -> Option<&mut StructuredAbundance> {
        self.invalidate(species);
        self.abundance.get_mut(species.index()).and_then(Option::as_mut)
    }

    pub fn invalidate(&self, species: &Species) {
        if let Some(cache) = self.biomass_cache.get(species.index()) {
            cache.set(None);
        }
    }

    /// Total weight of `species` in this cell, recomputed only after a mutation.
    pub fn biomass(&self, species: &Species) -> f64 {
        let Some(cache) = self.biomass_cache.get(species.index()) else {
            return 0.0;
        };
        if let Some(biomass) = cache.get() {
            return biomass;
        }
        let biomass = self
            .abundance(species)
            .map(|matrix| weigh(matrix, species.meristics()))
            .unwrap_or(0.0);
        cache.set(Some(biomass));
        biomass
    }

    pub fn total_abundance(&self, species: &Species) -> f64 {
        self.abundance(species).map(StructuredAbundance::total).unwrap_or(0.0)
    }

    pub fn is_cached(&self, species: &Species) -> bool {
        self.biomass_cache
            .get(species.index())
            .is_some_and(|cache| cache.get().is_some())
    }

    /// Subtracts the caught counts of every real species.
    ///
    /// The whole catch is checked before anything is subtracted, so on error the cell is left
    /// exactly as it was. `kept` is what stayed aboard and does not change the sea.
    pub fn react_to_fishing(
        &mut self,
        caught: &Catch,
        _kept: &Catch,
        biology: &GlobalBiology,
    ) -> Result<()> {
        if !caught.has_abundance_information() {
            return Err(InvariantViolation::MissingAbundanceInformation.into());
        }
        if caught.number_of_species() != biology.len() {
            return Err(InvariantViolation::SpeciesCountMismatch {
                expected: biology.len(),
                actual: caught.number_of_species(),
            }
            .into());
        }

        for species in biology.real_species() {
            let (Some(current), Some(removed)) =
                (self.abundance(species), caught.abundance(species.index()))
            else {
                continue;
            };
            check_removal(species, current, removed)?;
        }

        for species in biology.real_species() {
            let Some(removed) = caught.abundance(species.index()) else {
                continue;
            };
            if let Some(current) = self.abundance_mut(species) {
                for (row, removed_row) in current.rows_mut().zip(removed.rows()) {
                    for (count, taken) in row.iter_mut().zip(removed_row) {
                        *count -= taken;
                    }
                }
            }
        }
        Ok(())
    }
}

fn check_removal(
    species: &Species,
    current: &StructuredAbundance,
    removed: &StructuredAbundance,
) -> Result<()> {
    if removed.subdivisions() != current.subdivisions() {
        return Err(InvariantViolation::SubdivisionMismatch {
            species: species.name().to_string(),
            expected: current.subdivisions(),
            actual: removed.subdivisions(),
        }
        .into());
    }
    if removed.bins() != current.bins() {
        return Err(InvariantViolation::BinMismatch {
            species: species.name().to_string(),
            expected: current.bins(),
            actual: removed.bins(),
        }
        .into());
    }
    for subdivision in 0..current.subdivisions() {
        for bin in 0..current.bins() {
            let remaining = current.get(subdivision, bin) - removed.get(subdivision, bin);
            if remaining < 0.0 {
                return Err(InvariantViolation::NegativeAbundance {
                    species: species.name().to_string(),
                    subdivision,
                    bin,
                    remaining,
                }
                .into());
            }
        }
    }
    Ok(())
}

/// Biomass-only cell: one number per species, no cohort structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomassLocalBiology {
    biomass: Vec<f64>,
}

impl BiomassLocalBiology {
    pub fn new(biomass: Vec<f64>) -> Self {
        Self { biomass }
    }

    pub fn empty(biology: &GlobalBiology) -> Self {
        Self::new(vec![0.0; biology.len()])
    }

    pub fn biomass(&self, species: &Species) -> f64 {
        self.biomass.get(species.index()).copied().unwrap_or(0.0)
    }

    pub fn set_biomass(&mut self, species: &Species, biomass: f64) {
        if let Some(slot) = self.biomass.get_mut(species.index()) {
            *slot = biomass;
        }
    }

    pub fn react_to_fishing(&mut self, caught: &Catch, biology: &GlobalBiology) -> Result<()> {
        for species in biology.real_species() {
            let remaining = self.biomass(species) - caught.biomass(species.index());
            if remaining < 0.0 {
                return Err(InvariantViolation::NegativeBiomass {
                    species: species.name().to_string(),
                    remaining,
                }
                .into());
            }
        }
        for species in biology.real_species() {
            let remaining = self.biomass(species) - caught.biomass(species.index());
            self.set_biomass(species, remaining);
        }
        Ok(())
    }
}

/// Biology attached to a cell.
#[derive(Debug, Clone)]
pub enum LocalBiology {
    Abundance(AbundanceLocalBiology),
    Biomass(BiomassLocalBiology),
    /// Land, or sea that never holds fish.
    Empty,
}

impl LocalBiology {
    pub fn biomass(&self, species: &Species) -> f64 {
        match self {
            LocalBiology::Abundance(local) => local.biomass(species),
            LocalBiology::Biomass(local) => local.biomass(species),
            LocalBiology::Empty => 0.0,
        }
    }

    pub fn as_abundance(&self) -> Option<&AbundanceLocalBiology> {
        match self {
            LocalBiology::Abundance(local) => Some(local),
            _ => None,
        }
    }

    pub fn as_abundance_mut(&mut self) -> Option<&mut AbundanceLocalBiology> {
        match self {
            LocalBiology::Abundance(local) => Some(local),
            _ => None,
        }
    }

    pub fn as_biomass_mut(&mut self) -> Option<&mut BiomassLocalBiology> {
        match self {
            LocalBiology::Biomass(local) => Some(local),
            _ => None,
        }
    }

    /// Structured cells need a structured catch; biomass cells accept either kind.
    pub fn react_to_fishing(
        &mut self,
        caught: &Catch,
        kept: &Catch,
        biology: &GlobalBiology,
    ) -> Result<()> {
        match self {
            LocalBiology::Abundance(local) => local.react_to_fishing(caught, kept, biology),
            LocalBiology::Biomass(local) => local.react_to_fishing(caught, biology),
            LocalBiology::Empty => match biology
                .real_species()
                .find(|s| caught.biomass(s.index()) > 0.0)
            {
                Some(species) => Err(InvariantViolation::NegativeBiomass {
                    species: species.name().to_string(),
                    remaining: -caught.biomass(species.index()),
                }
                .into()),
                None => Ok(()),
            },
        }
    }
}
