//! Cohort matrices: fish counts per subdivision (sex) per bin.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::meristics::Meristics;

/// `counts[subdivision][bin]`, always rectangular.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredAbundance {
    counts: Vec<Vec<f64>>,
}

impl StructuredAbundance {
    pub fn empty(subdivisions: usize, bins: usize) -> Self {
        Self {
            counts: vec![vec![0.0; bins]; subdivisions],
        }
    }

    /// Shaped like the matrices of a species with these meristics.
    pub fn empty_for(meristics: &dyn Meristics) -> Self {
        Self::empty(meristics.number_of_subdivisions(), meristics.number_of_bins())
    }

    /// Fails if the matrix is ragged, empty, or holds a negative or non-finite count.
    pub fn from_matrix(counts: Vec<Vec<f64>>) -> Result<Self> {
        let bins = counts.first().map(|row| row.len()).unwrap_or(0);
        if bins == 0 || counts.iter().any(|row| row.len() != bins) {
            return Err(ConfigError::RaggedMatrix.into());
        }
        for (subdivision, row) in counts.iter().enumerate() {
            for (bin, &value) in row.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::InvalidAbundance {
                        subdivision,
                        bin,
                        value,
                    }
                    .into());
                }
            }
        }
        Ok(Self { counts })
    }

    pub fn from_sexes(male: Vec<f64>, female: Vec<f64>) -> Result<Self> {
        Self::from_matrix(vec![male, female])
    }

    pub fn subdivisions(&self) -> usize {
        self.counts.len()
    }

    pub fn bins(&self) -> usize {
        self.counts.first().map(|row| row.len()).unwrap_or(0)
    }

    pub fn get(&self, subdivision: usize, bin: usize) -> f64 {
        self.counts[subdivision][bin]
    }

    pub fn set(&mut self, subdivision: usize, bin: usize, value: f64) {
        self.counts[subdivision][bin] = value;
    }

    pub fn subdivision(&self, subdivision: usize) -> &[f64] {
        &self.counts[subdivision]
    }

    pub fn subdivision_mut(&mut self, subdivision: usize) -> &mut [f64] {
        &mut self.counts[subdivision]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.counts
    }

    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [f64]> {
        self.counts.iter_mut().map(|row| row.as_mut_slice())
    }

    pub fn total(&self) -> f64 {
        self.counts.iter().flatten().sum()
    }

    /// Fish in `bin` summed over subdivisions.
    pub fn total_in_bin(&self, bin: usize) -> f64 {
        self.counts.iter().map(|row| row[bin]).sum()
    }

    pub fn same_shape(&self, other: &StructuredAbundance) -> bool {
        self.subdivisions() == other.subdivisions() && self.bins() == other.bins()
    }

    /// Adds `other` bin by bin. Shapes must match.
    pub fn add(&mut self, other: &StructuredAbundance) {
        debug_assert!(self.same_shape(other));
        for (row, other_row) in self.counts.iter_mut().zip(&other.counts) {
            for (count, added) in row.iter_mut().zip(other_row) {
                *count += added;
            }
        }
    }

    pub fn scaled(&self, factor: f64) -> StructuredAbundance {
        StructuredAbundance {
            counts: self
                .counts
                .iter()
                .map(|row| row.iter().map(|count| count * factor).collect())
                .collect(),
        }
    }

    pub fn is_non_negative(&self) -> bool {
        self.counts.iter().flatten().all(|&count| count >= 0.0)
    }
}

/// Total weight of `abundance` in kg.
pub fn weigh(abundance: &StructuredAbundance, meristics: &dyn Meristics) -> f64 {
    let mut biomass = 0.0;
    for (subdivision, row) in abundance.rows().iter().enumerate() {
        for (bin, count) in row.iter().enumerate() {
            biomass += count * meristics.weight(subdivision, bin);
        }
    }
    biomass
}

/// Weight of the fish in one bin, summed over subdivisions.
pub fn weigh_bin(abundance: &StructuredAbundance, meristics: &dyn Meristics, bin: usize) -> f64 {
    (0..abundance.subdivisions())
        .map(|subdivision| abundance.get(subdivision, bin) * meristics.weight(subdivision, bin))
        .sum()
}
