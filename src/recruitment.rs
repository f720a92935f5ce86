//! Yearly recruitment: how many age-0 fish a stock produces, and how they enter the matrices.
//!
//! Recruits are computed from the species-wide stock, then split between subdivisions with a
//! female ratio and written into bin 0 cell by cell.

use std::fmt;

use crate::abundance::StructuredAbundance;
use crate::error::{ConfigError, Result};
use crate::scenario::RecruitmentConfig;
use crate::species::{FEMALE, Species};

pub trait RecruitmentProcess: Send + Sync + fmt::Debug {
    /// Age-0 fish produced this year by `stock`, the species summed over every cell.
    fn recruit(&self, species: &Species, stock: &StructuredAbundance) -> f64;

    /// Spawning biomass this process reads from `stock`, if it uses one.
    fn spawning_biomass(&self, _species: &Species, _stock: &StructuredAbundance) -> Option<f64> {
        None
    }

    /// Yearly recruits that exactly replace themselves, given the stock one recruit a year
    /// builds up with no fishing.
    fn equilibrium_recruits(&self, species: &Species, per_recruit: &StructuredAbundance) -> f64;

    fn name(&self) -> &str;
}

/// Which females count as spawners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaturityRule {
    /// The meristics' logistic maturity-at-age curve.
    Logistic,
    /// Mature iff female length is at least `length_at_maturity`.
    JackKnife { length_at_maturity: f64 },
}

impl MaturityRule {
    pub fn maturity(&self, species: &Species, bin: usize) -> f64 {
        match self {
            MaturityRule::Logistic => species.meristics().maturity(bin),
            MaturityRule::JackKnife { length_at_maturity } => {
                if species.length(FEMALE, bin) >= *length_at_maturity {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Female spawning output: `sum(female * maturity * weight)`, or relative fecundity in place of
/// weight when `use_fecundity` is set. A stock with one subdivision spawns from all of it.
pub fn spawning_biomass(
    species: &Species,
    stock: &StructuredAbundance,
    maturity: MaturityRule,
    use_fecundity: bool,
) -> f64 {
    let spawners = match stock.subdivisions() {
        0 => return 0.0,
        1 => 0,
        _ => FEMALE,
    };
    let meristics = species.meristics();
    let females = stock.subdivision(spawners);
    females
        .iter()
        .enumerate()
        .map(|(bin, &count)| {
            let output = if use_fecundity {
                meristics.relative_fecundity(bin)
            } else {
                meristics.weight(spawners, bin)
            };
            count * maturity.maturity(species, bin) * output
        })
        .sum()
}

/// Beverton-Holt recruitment parameterised by virgin recruits, steepness and cumulative phi.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawningBiomassRecruitment {
    virgin_recruits: f64,
    steepness: f64,
    cumulative_phi: f64,
    add_relative_fecundity: bool,
    maturity: MaturityRule,
}

impl SpawningBiomassRecruitment {
    pub fn new(
        virgin_recruits: f64,
        steepness: f64,
        cumulative_phi: f64,
        add_relative_fecundity: bool,
    ) -> Result<Self> {
        if !virgin_recruits.is_finite() || virgin_recruits < 0.0 {
            return Err(ConfigError::InvalidRecruits(virgin_recruits).into());
        }
        if !(steepness > 0.0 && steepness <= 1.0) {
            return Err(ConfigError::InvalidSteepness(steepness).into());
        }
        if !cumulative_phi.is_finite() || cumulative_phi <= 0.0 {
            return Err(ConfigError::InvalidCumulativePhi(cumulative_phi).into());
        }
        Ok(Self {
            virgin_recruits,
            steepness,
            cumulative_phi,
            add_relative_fecundity,
            maturity: MaturityRule::Logistic,
        })
    }

    /// Reads the stock-recruitment reference point out of the species' meristics.
    pub fn from_species(species: &Species) -> Result<Self> {
        let sr = species
            .meristics()
            .stock_recruitment()
            .ok_or_else(|| ConfigError::MissingStockRecruitment(species.name().to_string()))?;
        Self::new(
            sr.virgin_recruits,
            sr.steepness,
            sr.cumulative_phi,
            sr.add_relative_fecundity_to_spawning_biomass,
        )
    }

    pub fn with_maturity(mut self, maturity: MaturityRule) -> Self {
        self.maturity = maturity;
        self
    }

    /// Spawning biomass of the unfished stock, `R0 * phi`.
    pub fn virgin_spawning_biomass(&self) -> f64 {
        self.virgin_recruits * self.cumulative_phi
    }

    pub fn recruits_from_spawning_biomass(&self, ssb: f64) -> f64 {
        if ssb <= 0.0 {
            return 0.0;
        }
        let h = self.steepness;
        let r0 = self.virgin_recruits;
        (4.0 * h * r0 * ssb) / (self.virgin_spawning_biomass() * (1.0 - h) + ssb * (5.0 * h - 1.0))
    }

    pub fn spawning_biomass_of(&self, species: &Species, stock: &StructuredAbundance) -> f64 {
        spawning_biomass(species, stock, self.maturity, self.add_relative_fecundity)
    }

    /// Fixed point of `R = f(R * spr)` for spawning biomass per recruit `spr`. Zero when the
    /// stock cannot replace itself.
    pub fn equilibrium_recruits_for(&self, spawning_per_recruit: f64) -> f64 {
        if spawning_per_recruit <= 0.0 {
            return 0.0;
        }
        let h = self.steepness;
        let r0 = self.virgin_recruits;
        let slope = spawning_per_recruit * (5.0 * h - 1.0);
        if slope.abs() < f64::EPSILON {
            return r0;
        }
        ((4.0 * h * r0 * spawning_per_recruit - self.virgin_spawning_biomass() * (1.0 - h)) / slope)
            .max(0.0)
    }
}

impl RecruitmentProcess for SpawningBiomassRecruitment {
    fn recruit(&self, species: &Species, stock: &StructuredAbundance) -> f64 {
        self.recruits_from_spawning_biomass(self.spawning_biomass_of(species, stock))
    }

    fn spawning_biomass(&self, species: &Species, stock: &StructuredAbundance) -> Option<f64> {
        Some(self.spawning_biomass_of(species, stock))
    }

    fn equilibrium_recruits(&self, species: &Species, per_recruit: &StructuredAbundance) -> f64 {
        self.equilibrium_recruits_for(self.spawning_biomass_of(species, per_recruit))
    }

    fn name(&self) -> &str {
        "Spawning biomass"
    }
}

/// The same number of recruits every year, whatever the stock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedRecruitment {
    recruits: f64,
}

impl FixedRecruitment {
    pub fn new(recruits: f64) -> Result<Self> {
        if !recruits.is_finite() || recruits < 0.0 {
            return Err(ConfigError::InvalidRecruits(recruits).into());
        }
        Ok(Self { recruits })
    }
}

impl RecruitmentProcess for FixedRecruitment {
    fn recruit(&self, _species: &Species, _stock: &StructuredAbundance) -> f64 {
        self.recruits
    }

    fn equilibrium_recruits(&self, _species: &Species, _per_recruit: &StructuredAbundance) -> f64 {
        self.recruits
    }

    fn name(&self) -> &str {
        "Fixed"
    }
}

/// Splits `recruits` over `subdivisions`: a lone subdivision takes everything, otherwise the
/// female subdivision takes `female_ratio` and the rest share what is left evenly.
pub fn split_by_sex(recruits: f64, female_ratio: f64, subdivisions: usize) -> Vec<f64> {
    match subdivisions {
        0 => Vec::new(),
        1 => vec![recruits],
        n => {
            let others = recruits * (1.0 - female_ratio) / (n - 1) as f64;
            (0..n)
                .map(|subdivision| {
                    if subdivision == FEMALE {
                        recruits * female_ratio
                    } else {
                        others
                    }
                })
                .collect()
        }
    }
}

/// Adds `recruits` into bin 0 of `abundance`.
pub fn inject_recruits(abundance: &mut StructuredAbundance, recruits: f64, female_ratio: f64) {
    let split = split_by_sex(recruits, female_ratio, abundance.subdivisions());
    for (row, added) in abundance.rows_mut().zip(split) {
        if let Some(first) = row.first_mut() {
            *first += added;
        }
    }
}

pub fn validate_female_ratio(female_ratio: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&female_ratio) {
        return Err(ConfigError::InvalidSexRatio(female_ratio).into());
    }
    Ok(())
}

pub fn create_recruitment_process(
    config: &RecruitmentConfig,
    species: &Species,
) -> Result<Box<dyn RecruitmentProcess>> {
    match config {
        RecruitmentConfig::Fixed { recruits } => Ok(Box::new(FixedRecruitment::new(*recruits)?)),
        RecruitmentConfig::SpawningBiomass { length_at_maturity } => {
            let mut process = SpawningBiomassRecruitment::from_species(species)?;
            if let Some(length_at_maturity) = length_at_maturity {
                process = process.with_maturity(MaturityRule::JackKnife {
                    length_at_maturity: *length_at_maturity,
                });
            }
            Ok(Box::new(process))
        }
    }
}
