use std::fmt;

use crate::abundance::StructuredAbundance;
use crate::error::{ConfigError, Result};
use crate::local_biology::AbundanceLocalBiology;
use crate::scenario::MortalityConfig;
use crate::species::Species;

/// Natural deaths over one mortality interval (normally a year).
pub trait MortalityProcess: Send + Sync + fmt::Debug {
    /// Fraction of fish in `bin` of `subdivision` surviving the interval.
    fn survival(&self, subdivision: usize, bin: usize) -> f64;

    /// Rounds survivors to whole fish.
    fn rounds(&self) -> bool {
        false
    }

    fn name(&self) -> &str;

    fn apply(&self, abundance: &mut StructuredAbundance) {
        let rounding = self.rounds();
        for (subdivision, row) in abundance.rows_mut().enumerate() {
            for (bin, count) in row.iter_mut().enumerate() {
                let survivors = *count * self.survival(subdivision, bin);
                *count = if rounding { survivors.round() } else { survivors };
            }
        }
    }

    fn apply_locally(&self, local: &mut AbundanceLocalBiology, species: &Species) {
        if let Some(abundance) = local.abundance_mut(species) {
            self.apply(abundance);
        }
    }
}

/// `exp(-M)` survival with one instantaneous yearly rate per subdivision.
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialMortality {
    yearly_rates: Vec<f64>,
    survival: Vec<f64>,
    rounding: bool,
}

impl ExponentialMortality {
    pub fn new(species: &Species, yearly_rates: Vec<f64>, rounding: bool) -> Result<Self> {
        if yearly_rates.len() != species.number_of_subdivisions() {
            return Err(ConfigError::MismatchedSubdivisions {
                expected: species.number_of_subdivisions(),
                actual: yearly_rates.len(),
            }
            .into());
        }
        if let Some(&rate) = yearly_rates.iter().find(|r| !r.is_finite() || **r < 0.0) {
            return Err(ConfigError::NegativeMortality {
                species: species.name().to_string(),
                rate,
            }
            .into());
        }
        let survival = yearly_rates.iter().map(|m| (-m).exp()).collect();
        Ok(Self {
            yearly_rates,
            survival,
            rounding,
        })
    }

    /// Uses the natural mortality each subdivision has in the species' meristics.
    pub fn from_meristics(species: &Species, rounding: bool) -> Result<Self> {
        let rates = (0..species.number_of_subdivisions())
            .map(|subdivision| {
                species
                    .meristics()
                    .natural_mortality(subdivision)
                    .ok_or_else(|| ConfigError::MissingMortality(species.name().to_string()))
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Self::new(species, rates, rounding)
    }

    pub fn yearly_rates(&self) -> &[f64] {
        &self.yearly_rates
    }
}

impl MortalityProcess for ExponentialMortality {
    fn survival(&self, subdivision: usize, _bin: usize) -> f64 {
        self.survival[subdivision]
    }

    fn rounds(&self) -> bool {
        self.rounding
    }

    fn name(&self) -> &str {
        "Exponential"
    }
}

pub fn create_mortality_process(
    config: &MortalityConfig,
    species: &Species,
) -> Result<Box<dyn MortalityProcess>> {
    let process = match config {
        MortalityConfig::Exponential {
            yearly_rates,
            rounding,
        } => ExponentialMortality::new(species, yearly_rates.clone(), *rounding)?,
        MortalityConfig::Meristics { rounding } => {
            ExponentialMortality::from_meristics(species, *rounding)?
        }
    };
    Ok(Box::new(process))
}
