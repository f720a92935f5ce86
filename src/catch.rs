use serde::{Deserialize, Serialize};

use crate::abundance::{StructuredAbundance, weigh};
use crate::error::{InvariantViolation, Result};
use crate::species::GlobalBiology;

/// What one fishing action took out of the sea, or kept aboard.
///
/// Always carries biomass per species; carries per-bin counts only when the gear that produced
/// it was age structured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catch {
    biomass: Vec<f64>,
    abundance: Option<Vec<StructuredAbundance>>,
}

impl Catch {
    /// A catch with no fish of any species.
    pub fn empty(biology: &GlobalBiology) -> Self {
        let abundance = biology
            .species()
            .iter()
            .map(|s| StructuredAbundance::empty_for(s.meristics()))
            .collect();
        Self {
            biomass: vec![0.0; biology.len()],
            abundance: Some(abundance),
        }
    }

    pub fn from_biomass(biomass: Vec<f64>) -> Self {
        Self {
            biomass,
            abundance: None,
        }
    }

    /// One matrix per species, in species-index order. Biomass is derived from the matrices.
    pub fn from_abundance(
        abundance: Vec<StructuredAbundance>,
        biology: &GlobalBiology,
    ) -> Result<Self> {
        if abundance.len() != biology.len() {
            return Err(InvariantViolation::SpeciesCountMismatch {
                expected: biology.len(),
                actual: abundance.len(),
            }
            .into());
        }
        let biomass = biology
            .species()
            .iter()
            .zip(&abundance)
            .map(|(species, matrix)| weigh(matrix, species.meristics()))
            .collect();
        Ok(Self {
            biomass,
            abundance: Some(abundance),
        })
    }

    pub fn number_of_species(&self) -> usize {
        self.biomass.len()
    }

    pub fn has_abundance_information(&self) -> bool {
        self.abundance.is_some()
    }

    pub fn biomass(&self, species_index: usize) -> f64 {
        self.biomass.get(species_index).copied().unwrap_or(0.0)
    }

    pub fn abundance(&self, species_index: usize) -> Option<&StructuredAbundance> {
        self.abundance.as_ref().and_then(|all| all.get(species_index))
    }

    pub fn total_weight(&self) -> f64 {
        self.biomass.iter().sum()
    }
}
