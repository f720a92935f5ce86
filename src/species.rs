use std::fmt;
use std::sync::Arc;

use crate::error::{ConfigError, Result};
use crate::meristics::Meristics;

pub const MALE: usize = 0;
pub const FEMALE: usize = 1;

/// A fish species. Built once per scenario and shared by every cell.
#[derive(Debug, Clone)]
pub struct Species {
    name: String,
    index: usize,
    meristics: Arc<dyn Meristics>,
    imaginary: bool,
}

impl Species {
    pub fn new(name: impl Into<String>, meristics: Arc<dyn Meristics>) -> Self {
        Self {
            name: name.into(),
            index: 0,
            meristics,
            imaginary: false,
        }
    }

    /// Placeholder species: present in the species list but never holds fish.
    pub fn imaginary(name: impl Into<String>, meristics: Arc<dyn Meristics>) -> Self {
        Self {
            imaginary: true,
            ..Self::new(name, meristics)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn meristics(&self) -> &dyn Meristics {
        self.meristics.as_ref()
    }

    pub fn is_imaginary(&self) -> bool {
        self.imaginary
    }

    pub fn number_of_subdivisions(&self) -> usize {
        self.meristics.number_of_subdivisions()
    }

    pub fn number_of_bins(&self) -> usize {
        self.meristics.number_of_bins()
    }

    pub fn max_age(&self) -> usize {
        self.meristics.max_age()
    }

    pub fn length(&self, subdivision: usize, bin: usize) -> f64 {
        self.meristics.length(subdivision, bin)
    }

    pub fn weight(&self, subdivision: usize, bin: usize) -> f64 {
        self.meristics.weight(subdivision, bin)
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// The ordered species list of one simulation. Holds metadata only, never fish.
#[derive(Debug, Clone)]
pub struct GlobalBiology {
    species: Vec<Arc<Species>>,
}

impl GlobalBiology {
    /// Assigns each species its position in `species` as index.
    pub fn new(species: Vec<Species>) -> Result<Self> {
        let mut registered: Vec<Arc<Species>> = Vec::with_capacity(species.len());
        for (index, mut s) in species.into_iter().enumerate() {
            if registered.iter().any(|other| other.name == s.name) {
                return Err(ConfigError::DuplicateSpecies(s.name).into());
            }
            s.index = index;
            registered.push(Arc::new(s));
        }
        Ok(Self { species: registered })
    }

    pub fn len(&self) -> usize {
        self.species.len()
    }

    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    pub fn species(&self) -> &[Arc<Species>] {
        &self.species
    }

    pub fn get(&self, index: usize) -> Option<&Arc<Species>> {
        self.species.get(index)
    }

    pub fn by_name(&self, name: &str) -> Result<&Arc<Species>> {
        self.species
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| ConfigError::UnknownSpecies(name.to_string()).into())
    }

    /// Species that can actually hold fish.
    pub fn real_species(&self) -> impl Iterator<Item = &Arc<Species>> {
        self.species.iter().filter(|s| !s.imaginary)
    }
}
