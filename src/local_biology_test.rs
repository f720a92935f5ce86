#[cfg(test)]
mod tests {
    use super::super::abundance::StructuredAbundance;
    use super::super::catch::Catch;
    use super::super::error::{BiologyError, InvariantViolation};
    use super::super::local_biology::*;
    use super::super::meristics::{FromListMeristics, Meristics};
    use super::super::species::{FEMALE, GlobalBiology, MALE, Species};
    use std::sync::Arc;

    fn two_species() -> GlobalBiology {
        let meristics: Arc<dyn Meristics> =
            Arc::new(FromListMeristics::new(vec![1.0, 2.0, 3.0], vec![10.0, 20.0, 30.0], 2).unwrap());
        GlobalBiology::new(vec![
            Species::new("sablefish", meristics.clone()),
            Species::imaginary("other", meristics),
        ])
        .unwrap()
    }

    fn stocked(biology: &GlobalBiology) -> AbundanceLocalBiology {
        let species = biology.get(0).unwrap();
        AbundanceLocalBiology::new(biology)
            .with_abundance(
                species,
                StructuredAbundance::from_sexes(vec![100.0, 10.0, 0.0], vec![50.0, 0.0, 1.0])
                    .unwrap(),
            )
            .unwrap()
    }

    fn catch_of(biology: &GlobalBiology, male_age_zero: f64) -> Catch {
        let mut caught = StructuredAbundance::empty(2, 3);
        caught.set(MALE, 0, male_age_zero);
        Catch::from_abundance(vec![caught, StructuredAbundance::empty(2, 3)], biology).unwrap()
    }

    #[test]
    fn test_removal_subtracts_caught_fish() {
        let biology = two_species();
        let species = biology.get(0).unwrap();
        let mut local = stocked(&biology);

        let caught = catch_of(&biology, 40.0);
        local.react_to_fishing(&caught, &caught, &biology).unwrap();

        assert_eq!(local.abundance(species).unwrap().get(MALE, 0), 60.0);
        assert_eq!(local.abundance(species).unwrap().get(FEMALE, 0), 50.0);
    }

    #[test]
    fn test_overfishing_is_an_error_and_leaves_cell_untouched() {
        let biology = two_species();
        let species = biology.get(0).unwrap();
        let mut local = stocked(&biology);
        let before = local.abundance(species).unwrap().clone();

        let caught = catch_of(&biology, 150.0);
        let err = local.react_to_fishing(&caught, &caught, &biology).unwrap_err();

        match err {
            BiologyError::Invariant(InvariantViolation::NegativeAbundance {
                subdivision,
                bin,
                remaining,
                ..
            }) => {
                assert_eq!((subdivision, bin), (MALE, 0));
                assert_eq!(remaining, -50.0);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(local.abundance(species).unwrap(), &before);
    }

    #[test]
    fn test_biomass_only_catch_is_rejected() {
        let biology = two_species();
        let mut local = stocked(&biology);
        let caught = Catch::from_biomass(vec![1.0, 0.0]);
        let err = local.react_to_fishing(&caught, &caught, &biology).unwrap_err();
        assert!(err.is_invariant());
    }

    #[test]
    fn test_imaginary_species_has_no_matrix() {
        let biology = two_species();
        let local = stocked(&biology);
        let imaginary = biology.get(1).unwrap();
        assert!(local.abundance(imaginary).is_none());
        assert_eq!(local.biomass(imaginary), 0.0);
    }

    #[test]
    fn test_biomass_cache_tracks_mutation() {
        let biology = two_species();
        let species = biology.get(0).unwrap();
        let mut local = stocked(&biology);

        assert!(!local.is_cached(species));
        // 100*1 + 10*2 + 50*1 + 1*3
        assert_eq!(local.biomass(species), 173.0);
        assert!(local.is_cached(species));

        // reads keep the cache
        let _ = local.abundance(species);
        assert!(local.is_cached(species));

        if let Some(matrix) = local.abundance_mut(species) {
            matrix.set(FEMALE, 2, 0.0);
        }
        assert!(!local.is_cached(species));
        assert_eq!(local.biomass(species), 170.0);
    }

    #[test]
    fn test_wrong_shape_rejected() {
        let biology = two_species();
        let species = biology.get(0).unwrap();
        let result = AbundanceLocalBiology::new(&biology)
            .with_abundance(species, StructuredAbundance::empty(2, 4));
        assert!(result.unwrap_err().is_configuration());
    }

    #[test]
    fn test_biomass_cell_removal() {
        let biology = two_species();
        let species = biology.get(0).unwrap();
        let mut local = LocalBiology::Biomass(BiomassLocalBiology::new(vec![100.0, 0.0]));

        let caught = Catch::from_biomass(vec![30.0, 0.0]);
        local.react_to_fishing(&caught, &caught, &biology).unwrap();
        assert_eq!(local.biomass(species), 70.0);

        let too_much = Catch::from_biomass(vec![80.0, 0.0]);
        assert!(local.react_to_fishing(&too_much, &too_much, &biology).is_err());
        assert_eq!(local.biomass(species), 70.0);
    }
}
