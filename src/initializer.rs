//! Building the starting population: unfished (virgin) equilibria, initial abundance and how it
//! is spread over cells, plus the reference points derived from the virgin state.

use log::debug;
use std::collections::BTreeMap;

use crate::abundance::{StructuredAbundance, weigh_bin};
use crate::aging::AgingProcess;
use crate::error::{ConfigError, Result};
use crate::mortality::MortalityProcess;
use crate::recruitment::{RecruitmentProcess, inject_recruits, validate_female_ratio};
use crate::spatial::CellId;
use crate::species::Species;

/// Years of unfished dynamics used to build a virgin stock.
pub const VIRGIN_SPIN_UP_YEARS: usize = 100;

/// Runs mortality, aging and recruitment on one aggregated stock with no fishing.
#[derive(Debug)]
pub struct VirginStateSimulator<'a> {
    aging: &'a dyn AgingProcess,
    mortality: &'a dyn MortalityProcess,
    female_ratio: f64,
}

impl<'a> VirginStateSimulator<'a> {
    pub fn new(
        aging: &'a dyn AgingProcess,
        mortality: &'a dyn MortalityProcess,
        female_ratio: f64,
    ) -> Result<Self> {
        validate_female_ratio(female_ratio)?;
        Ok(Self {
            aging,
            mortality,
            female_ratio,
        })
    }

    /// Equilibrium reached by `years` of constant `virgin_recruits` starting from an empty sea.
    pub fn virgin_condition(&self, species: &Species, virgin_recruits: f64, years: usize) -> StructuredAbundance {
        let mut stock = StructuredAbundance::empty_for(species.meristics());
        for _ in 0..years {
            self.year(&mut stock, virgin_recruits);
        }
        debug!(
            "virgin condition for {} after {} years: {:.0} fish",
            species.name(),
            years,
            stock.total()
        );
        stock
    }

    /// The unfished stock that `recruitment` sustains: the stock built by one recruit a year,
    /// scaled by the recruits that replace themselves.
    pub fn equilibrium(
        &self,
        species: &Species,
        recruitment: &dyn RecruitmentProcess,
        years: usize,
    ) -> StructuredAbundance {
        let per_recruit = self.virgin_condition(species, 1.0, years);
        let recruits = recruitment.equilibrium_recruits(species, &per_recruit);
        debug!("{} equilibrium recruits: {:.0}", species.name(), recruits);
        per_recruit.scaled(recruits)
    }

    fn year(&self, stock: &mut StructuredAbundance, recruits: f64) {
        self.mortality.apply(stock);
        self.aging.age(stock);
        inject_recruits(stock, recruits, self.female_ratio);
    }
}

/// The same number of fish in each bin of every subdivision.
pub fn initial_abundance_from_list(species: &Species, fish_per_bin: &[f64]) -> Result<StructuredAbundance> {
    if fish_per_bin.len() != species.number_of_bins() {
        return Err(ConfigError::MismatchedBins {
            expected: species.number_of_bins(),
            actual: fish_per_bin.len(),
        }
        .into());
    }
    StructuredAbundance::from_matrix(vec![fish_per_bin.to_vec(); species.number_of_subdivisions()])
}

/// Splits `total` over cells by `shares` (which should sum to one).
pub fn allocate_abundance(
    total: &StructuredAbundance,
    shares: &BTreeMap<CellId, f64>,
) -> BTreeMap<CellId, StructuredAbundance> {
    shares
        .iter()
        .map(|(cell, share)| (*cell, total.scaled(*share)))
        .collect()
}

/// Spawning potential ratio: spawning biomass now over spawning biomass of the virgin stock.
///
/// Fish count as spawners when longer than `maturity_length`; length and weight are read from
/// the first subdivision and every subdivision's fish are counted.
#[derive(Debug, Clone, PartialEq)]
pub struct SprOracle {
    maturity_length: f64,
    virgin_spawning_biomass: f64,
}

impl SprOracle {
    pub fn new(maturity_length: f64, virgin_spawning_biomass: f64) -> Result<Self> {
        if !virgin_spawning_biomass.is_finite() || virgin_spawning_biomass <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "virgin_spawning_biomass".to_string(),
                reason: format!("{} must be positive", virgin_spawning_biomass),
            }
            .into());
        }
        Ok(Self {
            maturity_length,
            virgin_spawning_biomass,
        })
    }

    pub fn from_virgin_stock(species: &Species, maturity_length: f64, virgin: &StructuredAbundance) -> Result<Self> {
        Self::new(
            maturity_length,
            Self::spawning_biomass_for(maturity_length, species, virgin),
        )
    }

    pub fn spawning_biomass(&self, species: &Species, stock: &StructuredAbundance) -> f64 {
        Self::spawning_biomass_for(self.maturity_length, species, stock)
    }

    pub fn virgin_spawning_biomass(&self) -> f64 {
        self.virgin_spawning_biomass
    }

    pub fn spr(&self, species: &Species, stock: &StructuredAbundance) -> f64 {
        self.spawning_biomass(species, stock) / self.virgin_spawning_biomass
    }

    fn spawning_biomass_for(maturity_length: f64, species: &Species, stock: &StructuredAbundance) -> f64 {
        (0..stock.bins())
            .filter(|&bin| species.length(0, bin) > maturity_length)
            .map(|bin| stock.total_in_bin(bin) * species.weight(0, bin))
            .sum()
    }
}

/// Weight of the fish in each bin, summed over subdivisions. Handy for reporting.
pub fn biomass_per_bin(species: &Species, stock: &StructuredAbundance) -> Vec<f64> {
    (0..stock.bins())
        .map(|bin| weigh_bin(stock, species.meristics(), bin))
        .collect()
}

/// Two-way table between the short species codes used by data files and species names.
///
/// Each scenario builds and owns its own table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpeciesCodes {
    name_by_code: BTreeMap<String, String>,
    code_by_name: BTreeMap<String, String>,
}

impl SpeciesCodes {
    pub fn new<I, C, N>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (C, N)>,
        C: Into<String>,
        N: Into<String>,
    {
        let mut codes = Self::default();
        for (code, name) in pairs {
            let (code, name) = (code.into(), name.into());
            if codes.name_by_code.contains_key(&code) {
                return Err(ConfigError::DuplicateSpeciesCode(code).into());
            }
            if codes.code_by_name.contains_key(&name) {
                return Err(ConfigError::DuplicateSpecies(name).into());
            }
            codes.code_by_name.insert(name.clone(), code.clone());
            codes.name_by_code.insert(code, name);
        }
        Ok(codes)
    }

    pub fn species_name(&self, code: &str) -> Result<&str> {
        self.name_by_code
            .get(code)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::UnknownSpecies(code.to_string()).into())
    }

    pub fn species_code(&self, name: &str) -> Result<&str> {
        self.code_by_name
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::UnknownSpecies(name.to_string()).into())
    }

    pub fn len(&self) -> usize {
        self.name_by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_by_code.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aging::StandardAgingProcess;
    use crate::meristics::{FromListMeristics, Meristics};
    use crate::mortality::ExponentialMortality;
    use crate::recruitment::{FixedRecruitment, MaturityRule, SpawningBiomassRecruitment};
    use crate::species::{FEMALE, MALE};
    use std::sync::Arc;

    fn species() -> Species {
        let meristics: Arc<dyn Meristics> = Arc::new(
            FromListMeristics::new(vec![1.0, 2.0, 4.0, 8.0], vec![10.0, 20.0, 30.0, 40.0], 2)
                .unwrap(),
        );
        Species::new("boxcar", meristics)
    }

    #[test]
    fn test_virgin_condition_matches_survival_curve() {
        let species = species();
        let aging = StandardAgingProcess::new(false);
        let mortality = ExponentialMortality::new(&species, vec![0.1, 0.2], false).unwrap();
        let simulator = VirginStateSimulator::new(&aging, &mortality, 0.5).unwrap();

        let virgin = simulator.virgin_condition(&species, 1000.0, 100);
        for age in 0..4 {
            let male = 500.0 * (-0.1 * age as f64).exp();
            let female = 500.0 * (-0.2 * age as f64).exp();
            assert!((virgin.get(MALE, age) - male).abs() < 1e-9);
            assert!((virgin.get(FEMALE, age) - female).abs() < 1e-9);
        }
    }

    #[test]
    fn test_plus_group_accumulates_geometric_tail() {
        let species = species();
        let aging = StandardAgingProcess::new(true);
        let mortality = ExponentialMortality::new(&species, vec![0.5, 0.5], false).unwrap();
        let simulator = VirginStateSimulator::new(&aging, &mortality, 0.5).unwrap();

        let virgin = simulator.virgin_condition(&species, 2.0, 200);
        let s = (-0.5f64).exp();
        // last bin holds s^3 + s^4 + ... = s^3 / (1 - s)
        let expected = s.powi(3) / (1.0 - s);
        assert!((virgin.get(MALE, 3) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_equilibrium_with_fixed_recruitment_equals_virgin_condition() {
        let species = species();
        let aging = StandardAgingProcess::new(false);
        let mortality = ExponentialMortality::new(&species, vec![0.1, 0.1], false).unwrap();
        let simulator = VirginStateSimulator::new(&aging, &mortality, 0.5).unwrap();
        let recruitment = FixedRecruitment::new(1000.0).unwrap();

        let equilibrium = simulator.equilibrium(&species, &recruitment, 10);
        let virgin = simulator.virgin_condition(&species, 1000.0, 10);
        for bin in 0..4 {
            assert!((equilibrium.get(MALE, bin) - virgin.get(MALE, bin)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_beverton_holt_equilibrium_is_stationary() {
        let meristics: Arc<dyn Meristics> = Arc::new(
            FromListMeristics::new(vec![0.0, 1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0, 40.0], 2)
                .unwrap(),
        );
        let species = Species::new("jack knife", meristics);
        let aging = StandardAgingProcess::new(false);
        let mortality = ExponentialMortality::new(&species, vec![0.3, 0.3], false).unwrap();
        let simulator = VirginStateSimulator::new(&aging, &mortality, 0.5).unwrap();
        let recruitment = SpawningBiomassRecruitment::new(1000.0, 0.7, 2.0, false)
            .unwrap()
            .with_maturity(MaturityRule::JackKnife {
                length_at_maturity: 20.0,
            });

        let mut stock = simulator.equilibrium(&species, &recruitment, 10);
        let before = stock.clone();
        let recruits = recruitment.recruit(&species, &stock);
        assert!((recruits - before.total_in_bin(0)).abs() < 1e-6);

        mortality.apply(&mut stock);
        aging.age(&mut stock);
        inject_recruits(&mut stock, recruits, 0.5);
        for subdivision in [MALE, FEMALE] {
            for bin in 0..4 {
                assert!((stock.get(subdivision, bin) - before.get(subdivision, bin)).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_initial_abundance_from_list() {
        let species = species();
        let abundance = initial_abundance_from_list(&species, &[10.0, 5.0, 1.0, 0.0]).unwrap();
        assert_eq!(abundance.subdivision(MALE), abundance.subdivision(FEMALE));
        assert_eq!(abundance.total(), 32.0);
        assert!(initial_abundance_from_list(&species, &[1.0]).is_err());

        let shares = BTreeMap::from([(CellId::new(0, 0), 0.25), (CellId::new(1, 0), 0.75)]);
        let allocated = allocate_abundance(&abundance, &shares);
        assert_eq!(allocated[&CellId::new(0, 0)].get(MALE, 0), 2.5);
        assert_eq!(allocated[&CellId::new(1, 0)].get(FEMALE, 1), 3.75);
    }

    #[test]
    fn test_spr_is_one_at_virgin_and_falls_with_depletion() {
        let species = species();
        let virgin = StructuredAbundance::from_sexes(vec![10.0, 8.0, 6.0, 4.0], vec![10.0, 8.0, 6.0, 4.0])
            .unwrap();
        let oracle = SprOracle::from_virgin_stock(&species, 25.0, &virgin).unwrap();
        assert_eq!(oracle.spr(&species, &virgin), 1.0);
        // bins 2 and 3 spawn: 12 * 4 + 8 * 8
        assert_eq!(oracle.spawning_biomass(&species, &virgin), 112.0);

        let fished = virgin.scaled(0.5);
        assert_eq!(oracle.spr(&species, &fished), 0.5);

        assert!(SprOracle::new(25.0, 0.0).is_err());
    }

    #[test]
    fn test_species_codes_lookup_both_ways() {
        let codes = SpeciesCodes::new([("SKJ", "Skipjack tuna"), ("YFT", "Yellowfin tuna")]).unwrap();
        assert_eq!(codes.species_name("SKJ").unwrap(), "Skipjack tuna");
        assert_eq!(codes.species_code("Yellowfin tuna").unwrap(), "YFT");
        assert!(codes.species_name("BET").is_err());

        assert!(SpeciesCodes::new([("SKJ", "a"), ("SKJ", "b")]).is_err());
    }
}
