use std::fmt;

use crate::abundance::StructuredAbundance;
use crate::error::{ConfigError, Result};
use crate::local_biology::AbundanceLocalBiology;
use crate::meristics::VonBertalanffy;
use crate::scenario::AgingConfig;
use crate::species::Species;

/// Moves fish towards older or longer bins once a year.
pub trait AgingProcess: Send + Sync + fmt::Debug {
    /// Ages one matrix in place without changing its total.
    fn age(&self, abundance: &mut StructuredAbundance);

    fn name(&self) -> &str;

    fn age_locally(&self, local: &mut AbundanceLocalBiology, species: &Species) {
        if let Some(abundance) = local.abundance_mut(species) {
            self.age(abundance);
        }
    }
}

/// Shifts bins right by one, leaving bin 0 empty for recruitment to fill. The oldest cohort either dies off or, with `preserve_last_age`,
/// stays in the last bin as a plus-group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardAgingProcess {
    preserve_last_age: bool,
}

impl StandardAgingProcess {
    pub fn new(preserve_last_age: bool) -> Self {
        Self { preserve_last_age }
    }

    pub fn preserves_last_age(&self) -> bool {
        self.preserve_last_age
    }
}

impl AgingProcess for StandardAgingProcess {
    fn age(&self, abundance: &mut StructuredAbundance) {
        for row in abundance.rows_mut() {
            let bins = row.len();
            if bins == 0 {
                continue;
            }
            let oldest = row[bins - 1];
            row.copy_within(0..bins - 1, 1);
            row[0] = 0.0;
            if self.preserve_last_age {
                row[bins - 1] += oldest;
            }
        }
    }

    fn name(&self) -> &str {
        if self.preserve_last_age {
            "Standard (plus-group)"
        } else {
            "Standard"
        }
    }
}

/// Size-structured graduation: each year a share of every length bin moves up one bin.
///
/// The share is the von Bertalanffy growth of a fish at the bin's length over the bin width,
/// capped at one. The last bin keeps its fish.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedBoxcarAging {
    graduating: Vec<f64>,
}

impl FixedBoxcarAging {
    pub fn new(growth: VonBertalanffy, lengths: &[f64]) -> Result<Self> {
        let mut graduating = Vec::with_capacity(lengths.len());
        for pair in lengths.windows(2) {
            let width = pair[1] - pair[0];
            if !(width.is_finite() && width > 0.0) {
                return Err(ConfigError::InvalidParameter {
                    name: "lengths".to_string(),
                    reason: "boxcar bins must grow in length".to_string(),
                }
                .into());
            }
            let growth_cm = growth.grow_one_year(pair[0]) - pair[0];
            graduating.push((growth_cm / width).clamp(0.0, 1.0));
        }
        if !lengths.is_empty() {
            graduating.push(0.0);
        }
        Ok(Self { graduating })
    }

    pub fn for_species(species: &Species) -> Result<Self> {
        let growth = species.meristics().growth().ok_or_else(|| ConfigError::InvalidParameter {
            name: "aging".to_string(),
            reason: format!("species {} has no growth curve for boxcar aging", species.name()),
        })?;
        let lengths: Vec<f64> = (0..species.number_of_bins())
            .map(|bin| species.length(0, bin))
            .collect();
        Self::new(growth, &lengths)
    }

    /// Share of each bin that moves up one bin in a year.
    pub fn graduating(&self) -> &[f64] {
        &self.graduating
    }
}

impl AgingProcess for FixedBoxcarAging {
    fn age(&self, abundance: &mut StructuredAbundance) {
        for row in abundance.rows_mut() {
            // oldest first so each fish moves at most once
            for bin in (0..row.len().saturating_sub(1)).rev() {
                let share = self.graduating.get(bin).copied().unwrap_or(0.0);
                let moving = row[bin] * share;
                row[bin] -= moving;
                row[bin + 1] += moving;
            }
        }
    }

    fn name(&self) -> &str {
        "Fixed boxcar"
    }
}

pub fn create_aging_process(config: &AgingConfig, species: &Species) -> Result<Box<dyn AgingProcess>> {
    Ok(match config {
        AgingConfig::Standard { preserve_last_age } => {
            Box::new(StandardAgingProcess::new(*preserve_last_age))
        }
        AgingConfig::Boxcar => Box::new(FixedBoxcarAging::for_species(species)?),
    })
}
