//! Gear selectivity: the probability that a fish of a given subdivision and bin is retained
//! by a gear it encounters.
//!
//! Selectivity depends only on species meristics, so each [`Filter`] computes it once per
//! species and hands out the same shared matrix afterwards.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use crate::abundance::StructuredAbundance;
use crate::catch::Catch;
use crate::error::{ConfigError, Result};
use crate::local_biology::AbundanceLocalBiology;
use crate::scenario::{FilterConfig, GearConfig};
use crate::species::{FEMALE, GlobalBiology, Species};

/// `values[subdivision][bin]`, each within [0, 1].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectivityMatrix {
    values: Vec<Vec<f64>>,
}

impl SelectivityMatrix {
    pub fn new(values: Vec<Vec<f64>>) -> Self {
        Self { values }
    }

    pub fn get(&self, subdivision: usize, bin: usize) -> f64 {
        self.values
            .get(subdivision)
            .and_then(|row| row.get(bin))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.values
    }
}

/// A selectivity curve computed from species meristics.
pub trait SelectivityFormula: Send + Sync + fmt::Debug {
    fn compute_selectivity(&self, species: &Species) -> Vec<Vec<f64>>;

    fn name(&self) -> &str;
}

/// A formula plus its per-species memo.
#[derive(Debug)]
pub struct Filter {
    formula: Box<dyn SelectivityFormula>,
    memoize: bool,
    memo: Mutex<HashMap<String, Arc<SelectivityMatrix>>>,
}

impl Filter {
    pub fn new(formula: Box<dyn SelectivityFormula>) -> Self {
        Self {
            formula,
            memoize: true,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn without_memoization(formula: Box<dyn SelectivityFormula>) -> Self {
        Self {
            memoize: false,
            ..Self::new(formula)
        }
    }

    pub fn name(&self) -> &str {
        self.formula.name()
    }

    pub fn selectivity(&self, species: &Species) -> Arc<SelectivityMatrix> {
        if !self.memoize {
            return Arc::new(self.compute(species));
        }
        let mut memo = self.memo.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        memo.entry(species.name().to_string())
            .or_insert_with(|| Arc::new(self.compute(species)))
            .clone()
    }

    fn compute(&self, species: &Species) -> SelectivityMatrix {
        let values = self
            .formula
            .compute_selectivity(species)
            .into_iter()
            .map(|row| row.into_iter().map(|p| p.clamp(0.0, 1.0)).collect())
            .collect();
        SelectivityMatrix::new(values)
    }

    /// Fish of `abundance` that this filter keeps.
    pub fn filter(&self, species: &Species, abundance: &StructuredAbundance) -> StructuredAbundance {
        let selectivity = self.selectivity(species);
        let mut filtered = abundance.clone();
        for (subdivision, row) in filtered.rows_mut().enumerate() {
            for (bin, count) in row.iter_mut().enumerate() {
                *count *= selectivity.get(subdivision, bin);
            }
        }
        filtered
    }
}

// === FORMULAS ===

fn lengths(species: &Species) -> Vec<Vec<f64>> {
    (0..species.number_of_subdivisions())
        .map(|subdivision| {
            (0..species.number_of_bins())
                .map(|bin| species.length(subdivision, bin))
                .collect()
        })
        .collect()
}

/// `1 / (1 + exp(-ln(19) * (L - a) / b))`: 50% retention at length `a`, 95% at `a + b`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogisticFilter {
    pub a: f64,
    pub b: f64,
}

impl SelectivityFormula for LogisticFilter {
    fn compute_selectivity(&self, species: &Species) -> Vec<Vec<f64>> {
        let ln19 = 19f64.ln();
        lengths(species)
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|length| 1.0 / (1.0 + (-ln19 * (length - self.a) / self.b).exp()))
                    .collect()
            })
            .collect()
    }

    fn name(&self) -> &str {
        "Logistic"
    }
}

/// Probability a caught fish is kept rather than discarded:
/// `asymptote / (1 + exp(-(L - inflection) / slope))`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetentionFilter {
    pub inflection: f64,
    pub slope: f64,
    pub asymptote: f64,
}

impl SelectivityFormula for RetentionFilter {
    fn compute_selectivity(&self, species: &Species) -> Vec<Vec<f64>> {
        lengths(species)
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|length| {
                        self.asymptote / (1.0 + (-(length - self.inflection) / self.slope).exp())
                    })
                    .collect()
            })
            .collect()
    }

    fn name(&self) -> &str {
        "Retention"
    }
}

/// Explicit matrix, the same for every species.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedFilter {
    pub values: Vec<Vec<f64>>,
}

impl SelectivityFormula for FixedFilter {
    fn compute_selectivity(&self, species: &Species) -> Vec<Vec<f64>> {
        (0..species.number_of_subdivisions())
            .map(|subdivision| {
                (0..species.number_of_bins())
                    .map(|bin| {
                        self.values
                            .get(subdivision)
                            .and_then(|row| row.get(bin))
                            .copied()
                            .unwrap_or(0.0)
                    })
                    .collect()
            })
            .collect()
    }

    fn name(&self) -> &str {
        "Fixed"
    }
}

/// Stock-synthesis double-normal selectivity: an ascending and a descending normal limb joined
/// around a plateau between `peak` and the top of the plateau.
///
/// `initial_scaling` and `final_scaling` rescale the two limbs; when absent the limbs are used
/// as they are. A finite `initial_scaling` also gates each fish by length: males longer than
/// `-1000 - initial_scaling` are selected, females only when shorter than it.
#[derive(Debug, Clone, PartialEq)]
pub struct DoubleNormalFilter {
    pub peak: f64,
    pub top: f64,
    pub asc_width: f64,
    pub dsc_width: f64,
    pub initial_scaling: Option<f64>,
    pub final_scaling: Option<f64>,
    pub bin_min: f64,
    pub bin_max: f64,
    pub bin_width: f64,
}

impl DoubleNormalFilter {
    fn join(bin: f64, center: f64) -> f64 {
        1.0 / (1.0 + (-(20.0 * (bin - center) / (1.0 + (bin - center).abs()))).exp())
    }
}

impl SelectivityFormula for DoubleNormalFilter {
    fn compute_selectivity(&self, species: &Species) -> Vec<Vec<f64>> {
        let exp_width = self.asc_width.exp();
        let exp_dsc = self.dsc_width.exp();
        let exp_top = self.peak
            + self.bin_width
            + (0.99 * (self.bin_max + self.bin_width / 2.0) - self.peak - self.bin_width)
                / (1.0 + (-self.top).exp());

        let lengths = lengths(species);
        let ages = species.number_of_bins();
        // the limb rescaling skips the oldest age
        let scaled_ages = ages.saturating_sub(1);

        let mut selex = Vec::with_capacity(lengths.len());
        for (subdivision, row) in lengths.iter().enumerate() {
            let mut asc = Vec::with_capacity(ages);
            let mut desc = Vec::with_capacity(ages);
            let mut join1 = Vec::with_capacity(ages);
            let mut join2 = Vec::with_capacity(ages);
            for &length in row {
                let bin = self.bin_width / 2.0 + (length - self.bin_min) / self.bin_width;
                asc.push((-((bin - self.peak).powi(2) / exp_width)).exp());
                desc.push((-((bin - exp_top).powi(2) / exp_dsc)).exp());
                join1.push(Self::join(bin, self.peak));
                join2.push(Self::join(bin, exp_top));
            }

            if let Some(initial) = self.initial_scaling.filter(|s| s.is_finite()) {
                let scaling = 1.0 / (1.0 + (-initial).exp());
                let min_scaling =
                    (-((self.bin_min + self.bin_width / 2.0 - self.peak).powi(2) / exp_width)).exp();
                for value in asc.iter_mut().take(scaled_ages) {
                    *value = scaling + (1.0 - scaling) * (*value - min_scaling) / (1.0 - min_scaling);
                }
            }
            if let Some(last) = self.final_scaling.filter(|s| s.is_finite()) {
                let scaling = 1.0 / (1.0 + (-last).exp());
                let max_scaling =
                    (-((self.bin_max + self.bin_width / 2.0 - exp_top).powi(2) / exp_dsc)).exp();
                for value in desc.iter_mut().take(scaled_ages) {
                    *value = 1.0 + (scaling - 1.0) * (*value - 1.0) / (max_scaling - 1.0);
                }
            }

            let selected = row
                .iter()
                .enumerate()
                .map(|(age, &length)| {
                    // females are gated the other way round
                    let in_range = match self.initial_scaling {
                        None => true,
                        Some(initial) if initial.is_nan() => true,
                        Some(initial) if subdivision == FEMALE => -1000.0 - initial > length,
                        Some(initial) => length > -1000.0 - initial,
                    };
                    if in_range {
                        asc[age] * (1.0 - join1[age])
                            + join1[age] * ((1.0 - join2[age]) + desc[age] * join2[age])
                    } else {
                        0.0
                    }
                })
                .collect();
            selex.push(selected);
        }
        selex
    }

    fn name(&self) -> &str {
        "Double normal"
    }
}

// === GEAR ===

/// Catches the fish of a cell that pass every filter, times an encounter rate.
#[derive(Debug)]
pub struct SelectivityGear {
    filters: Vec<Filter>,
    encounter_rate: f64,
    retention: Option<Filter>,
}

impl SelectivityGear {
    pub fn new(filters: Vec<Filter>, encounter_rate: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&encounter_rate) {
            return Err(ConfigError::InvalidParameter {
                name: "encounter_rate".to_string(),
                reason: format!("{} is outside [0, 1]", encounter_rate),
            }
            .into());
        }
        Ok(Self {
            filters,
            encounter_rate,
            retention: None,
        })
    }

    /// Fish caught but not retained are discarded: removed from the sea, not kept aboard.
    pub fn with_retention(mut self, retention: Filter) -> Self {
        self.retention = Some(retention);
        self
    }

    /// What this gear would take from `abundance`, never more than is there.
    pub fn expected_catch(&self, species: &Species, abundance: &StructuredAbundance) -> StructuredAbundance {
        let mut caught = abundance.clone();
        for filter in &self.filters {
            caught = filter.filter(species, &caught);
        }
        let mut caught = caught.scaled(self.encounter_rate);
        for (row, available) in caught.rows_mut().zip(abundance.rows()) {
            for (count, present) in row.iter_mut().zip(available) {
                *count = count.min(*present).max(0.0);
            }
        }
        caught
    }

    /// Fishes one cell: returns `(caught, kept)`. Neither is removed from the cell here.
    pub fn fish(&self, local: &AbundanceLocalBiology, biology: &GlobalBiology) -> Result<(Catch, Catch)> {
        let mut caught = Vec::with_capacity(biology.len());
        let mut kept = Vec::with_capacity(biology.len());
        for species in biology.species() {
            let taken = match local.abundance(species) {
                Some(abundance) => self.expected_catch(species, abundance),
                None => StructuredAbundance::empty_for(species.meristics()),
            };
            let retained = match &self.retention {
                Some(retention) => retention.filter(species, &taken),
                None => taken.clone(),
            };
            caught.push(taken);
            kept.push(retained);
        }
        Ok((
            Catch::from_abundance(caught, biology)?,
            Catch::from_abundance(kept, biology)?,
        ))
    }
}

pub fn create_filter(config: &FilterConfig) -> Filter {
    let formula: Box<dyn SelectivityFormula> = match config {
        FilterConfig::Logistic { a, b } => Box::new(LogisticFilter { a: *a, b: *b }),
        FilterConfig::Retention {
            inflection,
            slope,
            asymptote,
        } => Box::new(RetentionFilter {
            inflection: *inflection,
            slope: *slope,
            asymptote: *asymptote,
        }),
        FilterConfig::Fixed { values } => Box::new(FixedFilter {
            values: values.clone(),
        }),
        FilterConfig::DoubleNormal {
            peak,
            top,
            asc_width,
            dsc_width,
            initial_scaling,
            final_scaling,
            bin_min,
            bin_max,
            bin_width,
        } => Box::new(DoubleNormalFilter {
            peak: *peak,
            top: *top,
            asc_width: *asc_width,
            dsc_width: *dsc_width,
            initial_scaling: *initial_scaling,
            final_scaling: *final_scaling,
            bin_min: *bin_min,
            bin_max: *bin_max,
            bin_width: *bin_width,
        }),
    };
    Filter::new(formula)
}

pub fn create_gear(config: &GearConfig) -> Result<SelectivityGear> {
    let filters = config.filters.iter().map(create_filter).collect();
    let gear = SelectivityGear::new(filters, config.encounter_rate)?;
    Ok(match &config.retention {
        Some(retention) => gear.with_retention(create_filter(retention)),
        None => gear,
    })
}
