//! Error taxonomy for the biology core.
//!
//! Configuration problems are caught while a scenario is being built and stop the run before it
//! starts. Invariant violations are raised while stepping and point at an upstream bug (a gear
//! catching more fish than exist, arrays of the wrong shape). The two families never share a
//! variant.

use thiserror::Error;

use crate::spatial::CellId;

pub type Result<T> = std::result::Result<T, BiologyError>;

/// Invalid input detected while building species, processes or schedules.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("max age {max_age} is below the age considered old ({age_old})")]
    MaxAgeBelowAgeOld { max_age: usize, age_old: usize },
    #[error("max age {max_age} is below the young age {young_age} of subdivision {subdivision}")]
    MaxAgeBelowYoungAge {
        subdivision: usize,
        max_age: usize,
        young_age: f64,
    },
    #[error("mortality rate {rate} for species {species} must be finite and non-negative")]
    NegativeMortality { species: String, rate: f64 },
    #[error("species {0} has no natural mortality in its meristics")]
    MissingMortality(String),
    #[error("species {0} has no stock-recruitment parameters in its meristics")]
    MissingStockRecruitment(String),
    #[error("diffusion rate {0} must be within [0, 1]")]
    DiffusionRateOutOfRange(f64),
    #[error("age range [{min}, {max}] is empty")]
    InvalidAgeRange { min: usize, max: usize },
    #[error("steepness {0} must be within (0, 1]")]
    InvalidSteepness(f64),
    #[error("cumulative phi {0} must be positive")]
    InvalidCumulativePhi(f64),
    #[error("recruits {0} must be finite and non-negative")]
    InvalidRecruits(f64),
    #[error("female ratio {0} must be within [0, 1]")]
    InvalidSexRatio(f64),
    #[error("expected {expected} subdivisions, found {actual}")]
    MismatchedSubdivisions { expected: usize, actual: usize },
    #[error("expected {expected} bins, found {actual}")]
    MismatchedBins { expected: usize, actual: usize },
    #[error("abundance matrix must be rectangular and non-empty")]
    RaggedMatrix,
    #[error("abundance {value} at subdivision {subdivision}, bin {bin} must be finite and non-negative")]
    InvalidAbundance {
        subdivision: usize,
        bin: usize,
        value: f64,
    },
    #[error("unknown species {0}")]
    UnknownSpecies(String),
    #[error("duplicate species {0}")]
    DuplicateSpecies(String),
    #[error("duplicate species code {0}")]
    DuplicateSpeciesCode(String),
    #[error("allocation grid for {key} has no positive weight")]
    EmptyGrid { key: String },
    #[error("allocation grid for {key} has invalid weight {value} at {cell}")]
    InvalidGridWeight { key: String, cell: CellId, value: f64 },
    #[error("grid is {actual_width}x{actual_height} but the map is {width}x{height}")]
    GridShape {
        width: usize,
        height: usize,
        actual_width: usize,
        actual_height: usize,
    },
    #[error("reallocation period must be positive")]
    ZeroPeriod,
    #[error("reallocation schedule is empty")]
    EmptySchedule,
    #[error("species {0} is reallocated by age group but has no first mature bin")]
    MissingFirstMatureBin(String),
    #[error("parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("scenario: {0}")]
    InvalidScenario(String),
}

/// Runtime state that should be impossible if every collaborator behaves.
#[derive(Debug, Error, PartialEq)]
pub enum InvariantViolation {
    #[error("removal leaves {remaining} fish of {species} in subdivision {subdivision}, bin {bin}")]
    NegativeAbundance {
        species: String,
        subdivision: usize,
        bin: usize,
        remaining: f64,
    },
    #[error("removal leaves {remaining} kg of {species}")]
    NegativeBiomass { species: String, remaining: f64 },
    #[error("this biology needs a catch with per-bin abundance, got biomass only")]
    MissingAbundanceInformation,
    #[error("catch covers {actual} species but the biology tracks {expected}")]
    SpeciesCountMismatch { expected: usize, actual: usize },
    #[error("catch of {species} has {actual} subdivisions, expected {expected}")]
    SubdivisionMismatch {
        species: String,
        expected: usize,
        actual: usize,
    },
    #[error("catch of {species} has {actual} bins, expected {expected}")]
    BinMismatch {
        species: String,
        expected: usize,
        actual: usize,
    },
    #[error("no local biology at {0}")]
    UnknownCell(CellId),
    #[error("cell {0} cannot react to this kind of catch")]
    IncompatibleBiology(CellId),
}

#[derive(Debug, Error)]
pub enum BiologyError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
    #[error("no allocation grid scheduled at or before step {step} (period {period})")]
    MissingSchedule { step: u64, period: u64 },
    #[error("at {cell}, day {day}: {source}")]
    InCell {
        cell: CellId,
        day: u64,
        #[source]
        source: Box<BiologyError>,
    },
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },
}

impl BiologyError {
    pub fn in_cell(self, cell: CellId, day: u64) -> Self {
        BiologyError::InCell {
            cell,
            day,
            source: Box::new(self),
        }
    }

    /// True for bad input: anything that should have stopped the scenario from starting.
    pub fn is_configuration(&self) -> bool {
        match self {
            BiologyError::Config(_)
            | BiologyError::MissingSchedule { .. }
            | BiologyError::Io { .. }
            | BiologyError::Parse { .. } => true,
            BiologyError::Invariant(_) => false,
            BiologyError::InCell { source, .. } => source.is_configuration(),
        }
    }

    /// True for bad runtime state.
    pub fn is_invariant(&self) -> bool {
        match self {
            BiologyError::Invariant(_) => true,
            BiologyError::InCell { source, .. } => source.is_invariant(),
            _ => false,
        }
    }

    /// The innermost error, with any cell context peeled off.
    pub fn root(&self) -> &BiologyError {
        match self {
            BiologyError::InCell { source, .. } => source.root(),
            other => other,
        }
    }
}
