#[cfg(test)]
mod tests {
    use super::super::abundance::StructuredAbundance;
    use super::super::meristics::{FromListMeristics, Meristics, MeristicsInput, StockAssessmentMeristics};
    use super::super::recruitment::*;
    use super::super::species::{FEMALE, MALE, Species};
    use std::sync::Arc;

    fn sablefish() -> Species {
        let meristics: Arc<dyn Meristics> =
            Arc::new(StockAssessmentMeristics::new(MeristicsInput::sablefish()).unwrap());
        Species::new("sablefish", meristics)
    }

    #[test]
    fn test_virgin_spawning_biomass_gives_virgin_recruits() {
        for steepness in [0.2, 0.35, 0.6, 0.8, 1.0] {
            let process = SpawningBiomassRecruitment::new(1000.0, steepness, 2.5, false).unwrap();
            let recruits = process.recruits_from_spawning_biomass(process.virgin_spawning_biomass());
            assert!((recruits - 1000.0).abs() < 1e-9, "steepness {}", steepness);
        }
    }

    #[test]
    fn test_recruitment_is_monotone_and_saturating() {
        let process = SpawningBiomassRecruitment::new(1000.0, 0.6, 2.5, false).unwrap();
        let ssb0 = process.virgin_spawning_biomass();

        assert_eq!(process.recruits_from_spawning_biomass(0.0), 0.0);
        let low = process.recruits_from_spawning_biomass(0.2 * ssb0);
        let high = process.recruits_from_spawning_biomass(2.0 * ssb0);
        assert!(low < 1000.0);
        assert!(high > 1000.0);
        // steepness is the fraction of R0 produced at 20% of virgin biomass
        assert!((low - 600.0).abs() < 1e-9);
        // never above 4h R0 / (5h - 1)
        assert!(high < 4.0 * 0.6 * 1000.0 / 2.0);
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(SpawningBiomassRecruitment::new(1000.0, 0.0, 2.5, false).is_err());
        assert!(SpawningBiomassRecruitment::new(1000.0, 1.2, 2.5, false).is_err());
        assert!(SpawningBiomassRecruitment::new(1000.0, 0.5, 0.0, false).is_err());
        assert!(SpawningBiomassRecruitment::new(-1.0, 0.5, 2.0, false).is_err());
        assert!(FixedRecruitment::new(f64::NAN).is_err());
    }

    #[test]
    fn test_spawning_biomass_counts_mature_females_only() {
        let species = sablefish();
        let meristics = species.meristics();
        let mut stock = StructuredAbundance::empty_for(meristics);
        stock.set(MALE, 40, 1000.0);
        assert_eq!(spawning_biomass(&species, &stock, MaturityRule::Logistic, false), 0.0);

        stock.set(FEMALE, 40, 10.0);
        let expected = 10.0 * meristics.maturity(40) * meristics.weight(FEMALE, 40);
        let ssb = spawning_biomass(&species, &stock, MaturityRule::Logistic, false);
        assert!((ssb - expected).abs() < 1e-12);
    }

    #[test]
    fn test_jack_knife_maturity() {
        let meristics: Arc<dyn Meristics> = Arc::new(
            FromListMeristics::new(vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0], 2).unwrap(),
        );
        let species = Species::new("boxcar", meristics);
        let stock =
            StructuredAbundance::from_sexes(vec![5.0, 5.0, 5.0], vec![1.0, 1.0, 1.0]).unwrap();
        let rule = MaturityRule::JackKnife {
            length_at_maturity: 20.0,
        };
        assert_eq!(spawning_biomass(&species, &stock, rule, false), 2.0 + 3.0);
    }

    #[test]
    fn test_sablefish_stock_at_equilibrium_recruits_r0() {
        let species = sablefish();
        let process = SpawningBiomassRecruitment::from_species(&species).unwrap();
        let sr = species.meristics().stock_recruitment().unwrap();

        // unfished numbers-at-age: R0 recruits surviving to each age, all counted as spawners
        let mut stock = StructuredAbundance::empty_for(species.meristics());
        let survival = (-0.08f64).exp();
        let mut alive = sr.virgin_recruits;
        for age in 0..species.number_of_bins() {
            stock.set(FEMALE, age, alive);
            alive *= survival;
        }
        let recruits = process.recruit(&species, &stock);
        assert!((recruits - sr.virgin_recruits).abs() / sr.virgin_recruits < 1e-6);
    }

    #[test]
    fn test_fixed_recruitment_ignores_stock() {
        let species = sablefish();
        let stock = StructuredAbundance::empty_for(species.meristics());
        let process = FixedRecruitment::new(250.0).unwrap();
        assert_eq!(process.recruit(&species, &stock), 250.0);
    }

    #[test]
    fn test_recruits_enter_bin_zero_by_sex_ratio() {
        let mut abundance =
            StructuredAbundance::from_sexes(vec![1.0, 2.0], vec![3.0, 4.0]).unwrap();
        inject_recruits(&mut abundance, 100.0, 0.4);
        assert_eq!(abundance.subdivision(MALE), &[61.0, 2.0]);
        assert_eq!(abundance.subdivision(FEMALE), &[43.0, 4.0]);

        let mut single = StructuredAbundance::empty(1, 3);
        inject_recruits(&mut single, 100.0, 0.4);
        assert_eq!(single.subdivision(0), &[100.0, 0.0, 0.0]);

        assert!(validate_female_ratio(1.5).is_err());
    }

    #[test]
    fn test_equilibrium_recruits_replace_themselves() {
        let process = SpawningBiomassRecruitment::new(1000.0, 0.6, 2.5, false).unwrap();
        // a full phi per recruit gives R0 back
        assert!((process.equilibrium_recruits_for(2.5) - 1000.0).abs() < 1e-9);

        // only half the recruits spawn: 2 (3h - 1) / (5h - 1) R0
        let half = process.equilibrium_recruits_for(1.25);
        assert!((half - 800.0).abs() < 1e-9);
        let ssb = half * 1.25;
        assert!((process.recruits_from_spawning_biomass(ssb) - half).abs() < 1e-9);

        // too little spawning per recruit: the stock collapses
        assert_eq!(process.equilibrium_recruits_for(0.3), 0.0);
        assert_eq!(process.equilibrium_recruits_for(0.0), 0.0);

        let species = sablefish();
        let stock = StructuredAbundance::empty_for(species.meristics());
        assert_eq!(FixedRecruitment::new(250.0).unwrap().equilibrium_recruits(&species, &stock), 250.0);
    }

    #[test]
    fn test_single_subdivision_stock_spawns_from_its_only_row() {
        let meristics: Arc<dyn Meristics> =
            Arc::new(FromListMeristics::new(vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0], 1).unwrap());
        let species = Species::new("boxcar", meristics);
        let stock = StructuredAbundance::from_matrix(vec![vec![4.0, 2.0, 1.0]]).unwrap();
        let rule = MaturityRule::JackKnife {
            length_at_maturity: 20.0,
        };
        assert_eq!(spawning_biomass(&species, &stock, rule, false), 2.0 * 2.0 + 3.0);
    }
}
