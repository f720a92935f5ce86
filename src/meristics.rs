//! Growth, weight, maturity and survival curves for a species.
//!
//! Meristics are computed once when a species is built and never change afterwards.
//! [`StockAssessmentMeristics`] derives age-structured curves from von Bertalanffy, allometric
//! and logistic parameters. [`EquallySpacedBertalanffyMeristics`] has bins of equal length for
//! size-structured (boxcar) stocks. [`FromListMeristics`] takes lengths and weights per bin as
//! given.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ConfigError, Result};
use crate::species::{FEMALE, MALE};

/// Stock-recruitment reference point carried by a species' meristics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockRecruitment {
    pub virgin_recruits: f64,
    pub steepness: f64,
    pub cumulative_phi: f64,
    #[serde(default)]
    pub add_relative_fecundity_to_spawning_biomass: bool,
}

/// Von Bertalanffy growth: yearly rate `k` towards the asymptotic `length_infinity` (cm).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VonBertalanffy {
    pub k: f64,
    pub length_infinity: f64,
}

impl VonBertalanffy {
    /// Length reached after one year by a fish now `length` cm long.
    pub fn grow_one_year(&self, length: f64) -> f64 {
        if length >= self.length_infinity {
            return length;
        }
        self.length_infinity - (self.length_infinity - length) * (-self.k).exp()
    }
}

/// Per-bin biological curves of a species.
pub trait Meristics: Send + Sync + fmt::Debug {
    fn number_of_subdivisions(&self) -> usize;

    fn number_of_bins(&self) -> usize;

    /// Oldest age tracked; bins run `0..=max_age` for age-structured meristics.
    fn max_age(&self) -> usize {
        self.number_of_bins().saturating_sub(1)
    }

    /// Length in cm of a fish in `bin` of `subdivision`.
    fn length(&self, subdivision: usize, bin: usize) -> f64;

    /// Weight in kg of a fish in `bin` of `subdivision`.
    fn weight(&self, subdivision: usize, bin: usize) -> f64;

    /// Fraction of females in `bin` that are mature.
    fn maturity(&self, _bin: usize) -> f64 {
        0.0
    }

    fn relative_fecundity(&self, _bin: usize) -> f64 {
        0.0
    }

    /// Instantaneous yearly natural mortality of `subdivision`, if known.
    fn natural_mortality(&self, _subdivision: usize) -> Option<f64> {
        None
    }

    fn stock_recruitment(&self) -> Option<StockRecruitment> {
        None
    }

    /// Growth curve of size-structured meristics, whose bins are lengths rather than ages.
    fn growth(&self) -> Option<VonBertalanffy> {
        None
    }
}

/// Raw parameters of a stock-assessment style species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeristicsInput {
    pub max_age: usize,
    pub age_old: usize,
    pub young_age_male: f64,
    pub young_length_male: f64,
    pub max_length_male: f64,
    pub k_parameter_male: f64,
    pub weight_parameter_a_male: f64,
    pub weight_parameter_b_male: f64,
    pub mortality_parameter_m_male: f64,
    pub young_age_female: f64,
    pub young_length_female: f64,
    pub max_length_female: f64,
    pub k_parameter_female: f64,
    pub weight_parameter_a_female: f64,
    pub weight_parameter_b_female: f64,
    pub mortality_parameter_m_female: f64,
    pub maturity_inflection: f64,
    pub maturity_slope: f64,
    pub fecundity_intercept: f64,
    pub fecundity_slope: f64,
    pub virgin_recruits: f64,
    pub steepness: f64,
    #[serde(default)]
    pub add_relative_fecundity_to_spawning_biomass: bool,
}

impl MeristicsInput {
    /// Sablefish as parameterised by the 2015 west coast stock assessment.
    pub fn sablefish() -> Self {
        Self {
            max_age: 59,
            age_old: 30,
            young_age_male: 0.5,
            young_length_male: 25.8,
            max_length_male: 56.2,
            k_parameter_male: 0.419,
            weight_parameter_a_male: 3.6724e-06,
            weight_parameter_b_male: 3.250,
            mortality_parameter_m_male: 0.065,
            young_age_female: 0.5,
            young_length_female: 25.8,
            max_length_female: 64.0,
            k_parameter_female: 0.335,
            weight_parameter_a_female: 3.4487e-06,
            weight_parameter_b_female: 3.260,
            mortality_parameter_m_female: 0.08,
            maturity_inflection: 58.0,
            maturity_slope: -0.13,
            fecundity_intercept: 1.0,
            fecundity_slope: 0.0,
            virgin_recruits: 416_331.0,
            steepness: 0.6,
            add_relative_fecundity_to_spawning_biomass: false,
        }
    }
}

/// Curves derived from [`MeristicsInput`].
#[derive(Debug, Clone, PartialEq)]
pub struct StockAssessmentMeristics {
    input: MeristicsInput,
    length_infinity: [f64; 2],
    length: [Vec<f64>; 2],
    weight: [Vec<f64>; 2],
    maturity: Vec<f64>,
    relative_fecundity: Vec<f64>,
    cumulative_survival: [Vec<f64>; 2],
    phi: Vec<f64>,
    cumulative_phi: f64,
}

impl StockAssessmentMeristics {
    pub fn new(input: MeristicsInput) -> Result<Self> {
        if input.max_age < input.age_old {
            return Err(ConfigError::MaxAgeBelowAgeOld {
                max_age: input.max_age,
                age_old: input.age_old,
            }
            .into());
        }
        for (subdivision, young_age) in [(MALE, input.young_age_male), (FEMALE, input.young_age_female)] {
            if (input.max_age as f64) < young_age {
                return Err(ConfigError::MaxAgeBelowYoungAge {
                    subdivision,
                    max_age: input.max_age,
                    young_age,
                }
                .into());
            }
        }

        let male = GrowthCurve {
            young_age: input.young_age_male,
            young_length: input.young_length_male,
            max_length: input.max_length_male,
            k: input.k_parameter_male,
            weight_a: input.weight_parameter_a_male,
            weight_b: input.weight_parameter_b_male,
        };
        let female = GrowthCurve {
            young_age: input.young_age_female,
            young_length: input.young_length_female,
            max_length: input.max_length_female,
            k: input.k_parameter_female,
            weight_a: input.weight_parameter_a_female,
            weight_b: input.weight_parameter_b_female,
        };
        let ages = input.max_age + 1;
        let length_infinity = [
            male.length_infinity(input.age_old),
            female.length_infinity(input.age_old),
        ];
        let length: [Vec<f64>; 2] = [
            (0..ages).map(|age| male.length_at(age, length_infinity[MALE])).collect(),
            (0..ages).map(|age| female.length_at(age, length_infinity[FEMALE])).collect(),
        ];
        let weight: [Vec<f64>; 2] = [
            length[MALE].iter().map(|&l| male.weight_at(l)).collect(),
            length[FEMALE].iter().map(|&l| female.weight_at(l)).collect(),
        ];

        let mut maturity = Vec::with_capacity(ages);
        let mut relative_fecundity = Vec::with_capacity(ages);
        let mut cumulative_survival: [Vec<f64>; 2] =
            [Vec::with_capacity(ages), Vec::with_capacity(ages)];
        let mut phi = Vec::with_capacity(ages);
        let mut cumulative_phi = 0.0;
        let survival = [
            (-input.mortality_parameter_m_male).exp(),
            (-input.mortality_parameter_m_female).exp(),
        ];
        for age in 0..ages {
            let female_length = length[FEMALE][age];
            let female_weight = weight[FEMALE][age];
            let mature =
                1.0 / (1.0 + (input.maturity_slope * (female_length - input.maturity_inflection)).exp());
            let fecundity =
                female_weight * (input.fecundity_intercept + input.fecundity_slope * female_weight);
            for subdivision in [MALE, FEMALE] {
                let survived = if age == 0 {
                    1.0
                } else {
                    survival[subdivision] * cumulative_survival[subdivision][age - 1]
                };
                cumulative_survival[subdivision].push(survived);
            }
            let this_phi = mature * fecundity * cumulative_survival[FEMALE][age];
            maturity.push(mature);
            relative_fecundity.push(fecundity);
            phi.push(this_phi);
            cumulative_phi += this_phi;
        }
        debug_assert!(cumulative_phi >= 0.0);

        Ok(Self {
            input,
            length_infinity,
            length,
            weight,
            maturity,
            relative_fecundity,
            cumulative_survival,
            phi,
            cumulative_phi,
        })
    }

    pub fn input(&self) -> &MeristicsInput {
        &self.input
    }

    /// Asymptotic length used by the growth curve of `subdivision`.
    pub fn length_infinity(&self, subdivision: usize) -> f64 {
        self.length_infinity[subdivision]
    }

    pub fn lengths(&self, subdivision: usize) -> &[f64] {
        &self.length[subdivision]
    }

    pub fn weights(&self, subdivision: usize) -> &[f64] {
        &self.weight[subdivision]
    }

    pub fn maturity_curve(&self) -> &[f64] {
        &self.maturity
    }

    pub fn relative_fecundity_curve(&self) -> &[f64] {
        &self.relative_fecundity
    }

    pub fn cumulative_survival(&self, subdivision: usize) -> &[f64] {
        &self.cumulative_survival[subdivision]
    }

    pub fn phi(&self) -> &[f64] {
        &self.phi
    }

    pub fn cumulative_phi(&self) -> f64 {
        self.cumulative_phi
    }

    /// Overrides the reproductive potential, for calibration tools that fit it to data.
    pub fn set_cumulative_phi(&mut self, cumulative_phi: f64) {
        self.cumulative_phi = cumulative_phi;
    }
}

struct GrowthCurve {
    young_age: f64,
    young_length: f64,
    max_length: f64,
    k: f64,
    weight_a: f64,
    weight_b: f64,
}

impl GrowthCurve {
    // the young length is compared with the old age, not with the max length
    fn length_infinity(&self, age_old: usize) -> f64 {
        if self.young_length < age_old as f64 {
            self.young_length
                + (self.max_length - self.young_length)
                    / (1.0 - (-self.k * (age_old as f64 - self.young_age)).exp())
        } else {
            self.max_length
        }
    }

    fn length_at(&self, age: usize, length_infinity: f64) -> f64 {
        let length = length_infinity
            + (self.young_length - length_infinity) * (-self.k * (age as f64 - self.young_age)).exp();
        // very young fish come out negative
        length.max(0.0)
    }

    fn weight_at(&self, length: f64) -> f64 {
        self.weight_a * length.powf(self.weight_b)
    }
}

impl Meristics for StockAssessmentMeristics {
    fn number_of_subdivisions(&self) -> usize {
        2
    }

    fn number_of_bins(&self) -> usize {
        self.input.max_age + 1
    }

    fn max_age(&self) -> usize {
        self.input.max_age
    }

    fn length(&self, subdivision: usize, bin: usize) -> f64 {
        self.length[subdivision][bin]
    }

    fn weight(&self, subdivision: usize, bin: usize) -> f64 {
        self.weight[subdivision][bin]
    }

    fn maturity(&self, bin: usize) -> f64 {
        self.maturity[bin]
    }

    fn relative_fecundity(&self, bin: usize) -> f64 {
        self.relative_fecundity[bin]
    }

    fn natural_mortality(&self, subdivision: usize) -> Option<f64> {
        match subdivision {
            MALE => Some(self.input.mortality_parameter_m_male),
            FEMALE => Some(self.input.mortality_parameter_m_female),
            _ => None,
        }
    }

    fn stock_recruitment(&self) -> Option<StockRecruitment> {
        Some(StockRecruitment {
            virgin_recruits: self.input.virgin_recruits,
            steepness: self.input.steepness,
            cumulative_phi: self.cumulative_phi,
            add_relative_fecundity_to_spawning_biomass: self
                .input
                .add_relative_fecundity_to_spawning_biomass,
        })
    }
}

/// Lengths and weights given bin by bin, identical for every subdivision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FromListMeristics {
    weights: Vec<f64>,
    lengths: Vec<f64>,
    subdivisions: usize,
    natural_mortality: Option<f64>,
}

impl FromListMeristics {
    pub fn new(weights: Vec<f64>, lengths: Vec<f64>, subdivisions: usize) -> Result<Self> {
        if weights.len() != lengths.len() {
            return Err(ConfigError::MismatchedBins {
                expected: weights.len(),
                actual: lengths.len(),
            }
            .into());
        }
        if weights.is_empty() || subdivisions == 0 {
            return Err(ConfigError::RaggedMatrix.into());
        }
        Ok(Self {
            weights,
            lengths,
            subdivisions,
            natural_mortality: None,
        })
    }

    pub fn with_natural_mortality(mut self, yearly_rate: f64) -> Self {
        self.natural_mortality = Some(yearly_rate);
        self
    }
}

impl Meristics for FromListMeristics {
    fn number_of_subdivisions(&self) -> usize {
        self.subdivisions
    }

    fn number_of_bins(&self) -> usize {
        self.weights.len()
    }

    fn length(&self, _subdivision: usize, bin: usize) -> f64 {
        self.lengths[bin]
    }

    fn weight(&self, _subdivision: usize, bin: usize) -> f64 {
        self.weights[bin]
    }

    fn natural_mortality(&self, _subdivision: usize) -> Option<f64> {
        self.natural_mortality
    }
}

/// Parameters of [`EquallySpacedBertalanffyMeristics`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BertalanffyInput {
    pub number_of_bins: usize,
    pub cm_per_bin: f64,
    #[serde(default)]
    pub recruit_length: f64,
    /// Grams per cm^beta.
    pub allometric_alpha: f64,
    pub allometric_beta: f64,
    pub k: f64,
    pub length_infinity: f64,
    #[serde(default)]
    pub natural_mortality: Option<f64>,
    #[serde(default)]
    pub stock_recruitment: Option<StockRecruitment>,
}

impl BertalanffyInput {
    /// The red fish boxcar: 25 bins of 5 cm growing towards 113 cm.
    pub fn red_fish() -> Self {
        Self {
            number_of_bins: 25,
            cm_per_bin: 5.0,
            recruit_length: 0.0,
            allometric_alpha: 0.015,
            allometric_beta: 2.961,
            k: 0.364,
            length_infinity: 113.0,
            natural_mortality: Some(0.1),
            stock_recruitment: Some(StockRecruitment {
                virgin_recruits: 40_741_397.0,
                steepness: 0.6,
                cumulative_phi: 14.244_406_677_172_4,
                add_relative_fecundity_to_spawning_biomass: false,
            }),
        }
    }
}

/// One subdivision of length bins `recruit_length + bin * cm_per_bin`, weighed allometrically.
#[derive(Debug, Clone, PartialEq)]
pub struct EquallySpacedBertalanffyMeristics {
    input: BertalanffyInput,
    lengths: Vec<f64>,
    weights: Vec<f64>,
}

impl EquallySpacedBertalanffyMeristics {
    pub fn new(input: BertalanffyInput) -> Result<Self> {
        if input.number_of_bins == 0 {
            return Err(ConfigError::RaggedMatrix.into());
        }
        let positive = [
            ("cm_per_bin", input.cm_per_bin),
            ("k", input.k),
            ("length_infinity", input.length_infinity),
        ];
        if let Some((name, value)) = positive.into_iter().find(|(_, v)| !(v.is_finite() && *v > 0.0)) {
            return Err(ConfigError::InvalidParameter {
                name: name.to_string(),
                reason: format!("{} must be positive", value),
            }
            .into());
        }
        if !input.recruit_length.is_finite() || input.recruit_length < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "recruit_length".to_string(),
                reason: format!("{} must be non-negative", input.recruit_length),
            }
            .into());
        }

        let lengths: Vec<f64> = (0..input.number_of_bins)
            .map(|bin| input.recruit_length + bin as f64 * input.cm_per_bin)
            .collect();
        let weights = lengths
            .iter()
            .map(|l| input.allometric_alpha * l.powf(input.allometric_beta) / 1000.0)
            .collect();
        Ok(Self {
            input,
            lengths,
            weights,
        })
    }

    pub fn input(&self) -> &BertalanffyInput {
        &self.input
    }

    pub fn lengths(&self) -> &[f64] {
        &self.lengths
    }
}

impl Meristics for EquallySpacedBertalanffyMeristics {
    fn number_of_subdivisions(&self) -> usize {
        1
    }

    fn number_of_bins(&self) -> usize {
        self.lengths.len()
    }

    fn length(&self, _subdivision: usize, bin: usize) -> f64 {
        self.lengths[bin]
    }

    fn weight(&self, _subdivision: usize, bin: usize) -> f64 {
        self.weights[bin]
    }

    fn natural_mortality(&self, _subdivision: usize) -> Option<f64> {
        self.input.natural_mortality
    }

    fn stock_recruitment(&self) -> Option<StockRecruitment> {
        self.input.stock_recruitment
    }

    fn growth(&self) -> Option<VonBertalanffy> {
        Some(VonBertalanffy {
            k: self.input.k,
            length_infinity: self.input.length_infinity,
        })
    }
}
