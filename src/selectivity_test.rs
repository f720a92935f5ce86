#[cfg(test)]
mod tests {
    use super::super::abundance::StructuredAbundance;
    use super::super::local_biology::AbundanceLocalBiology;
    use super::super::meristics::{FromListMeristics, Meristics};
    use super::super::selectivity::*;
    use super::super::species::{FEMALE, GlobalBiology, MALE, Species};
    use std::sync::Arc;

    /// Eleven bins, 0 to 100 cm in steps of 10.
    fn species() -> Species {
        let lengths: Vec<f64> = (0..11).map(|i| i as f64 * 10.0).collect();
        let weights = vec![1.0; 11];
        let meristics: Arc<dyn Meristics> =
            Arc::new(FromListMeristics::new(weights, lengths, 2).unwrap());
        Species::new("sablefish", meristics)
    }

    fn double_normal(initial_scaling: Option<f64>) -> DoubleNormalFilter {
        DoubleNormalFilter {
            peak: 40.5,
            top: -5.0,
            asc_width: 50f64.ln(),
            dsc_width: 50f64.ln(),
            initial_scaling,
            final_scaling: None,
            bin_min: 0.0,
            bin_max: 100.0,
            bin_width: 1.0,
        }
    }

    #[test]
    fn test_logistic_midpoint_and_95_percent() {
        let species = species();
        let filter = Filter::new(Box::new(LogisticFilter { a: 40.0, b: 20.0 }));
        let selectivity = filter.selectivity(&species);

        assert!((selectivity.get(MALE, 4) - 0.5).abs() < 1e-12);
        assert!((selectivity.get(FEMALE, 6) - 0.95).abs() < 1e-12);
        assert!(selectivity.get(MALE, 0) < selectivity.get(MALE, 10));
    }

    #[test]
    fn test_memoized_selectivity_is_identical() {
        let species = species();
        let filter = Filter::new(Box::new(double_normal(None)));

        let first = filter.selectivity(&species);
        let second = filter.selectivity(&species);
        assert!(Arc::ptr_eq(&first, &second));
        for (a, b) in first.rows().iter().flatten().zip(second.rows().iter().flatten()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }

        let unmemoized = Filter::without_memoization(Box::new(double_normal(None)));
        let recomputed = unmemoized.selectivity(&species);
        assert_eq!(recomputed.as_ref(), first.as_ref());
    }

    #[test]
    fn test_double_normal_shape() {
        let species = species();
        let selectivity = Filter::new(Box::new(double_normal(None))).selectivity(&species);

        // 40 cm falls on the peak bin
        assert!(selectivity.get(MALE, 4) > 0.999);
        assert!(selectivity.get(FEMALE, 4) > 0.999);
        assert!(selectivity.get(MALE, 0) < 1e-6);
        assert!(selectivity.get(MALE, 10) < 1e-6);
        assert!(selectivity.rows().iter().flatten().all(|p| (0.0..=1.0).contains(p)));
    }

    #[test]
    fn test_double_normal_initial_scaling_lifts_smallest_fish() {
        let species = species();
        let selectivity = Filter::new(Box::new(double_normal(Some(0.0)))).selectivity(&species);
        assert!((selectivity.get(MALE, 0) - 0.5).abs() < 1e-6);
        assert!(selectivity.get(MALE, 4) > 0.999);
    }

    #[test]
    fn test_double_normal_initial_scaling_gates_females_by_short_length() {
        let species = species();
        // a finite scaling of 0 selects females below -1000 cm: none of them
        let gated = Filter::new(Box::new(double_normal(Some(0.0)))).selectivity(&species);
        assert!(gated.rows()[FEMALE].iter().all(|&p| p == 0.0));
        assert!(gated.rows()[MALE].iter().all(|&p| p > 0.0));

        // a very negative scaling moves the gate above every length
        let open = Filter::new(Box::new(double_normal(Some(-2000.0)))).selectivity(&species);
        assert!(open.get(FEMALE, 4) > 0.999);
        assert!(open.rows()[MALE].iter().all(|&p| p == 0.0));

        let nan = Filter::new(Box::new(double_normal(Some(f64::NAN)))).selectivity(&species);
        let unscaled = Filter::new(Box::new(double_normal(None))).selectivity(&species);
        assert_eq!(nan.as_ref(), unscaled.as_ref());
    }

    #[test]
    fn test_retention_asymptote() {
        let species = species();
        let filter = Filter::new(Box::new(RetentionFilter {
            inflection: 50.0,
            slope: 2.0,
            asymptote: 0.8,
        }));
        let selectivity = filter.selectivity(&species);
        assert!((selectivity.get(MALE, 5) - 0.4).abs() < 1e-12);
        assert!((selectivity.get(MALE, 10) - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_gear_catch_and_discards() {
        let species = species();
        let biology = GlobalBiology::new(vec![species]).unwrap();
        let species = biology.get(0).unwrap();

        let mut male = vec![0.0; 11];
        male[0] = 100.0;
        male[5] = 40.0;
        let local = AbundanceLocalBiology::new(&biology)
            .with_abundance(
                species,
                StructuredAbundance::from_sexes(male, vec![0.0; 11]).unwrap(),
            )
            .unwrap();

        let half = Filter::new(Box::new(FixedFilter {
            values: vec![vec![0.5; 11], vec![0.5; 11]],
        }));
        let mut keep_big = vec![1.0; 11];
        keep_big[0] = 0.0;
        let retention = Filter::new(Box::new(FixedFilter {
            values: vec![keep_big.clone(), keep_big],
        }));
        let gear = SelectivityGear::new(vec![half], 0.5)
            .unwrap()
            .with_retention(retention);

        let (caught, kept) = gear.fish(&local, &biology).unwrap();
        let caught = caught.abundance(0).unwrap();
        let kept = kept.abundance(0).unwrap();
        assert_eq!(caught.get(MALE, 0), 25.0);
        assert_eq!(caught.get(MALE, 5), 10.0);
        assert_eq!(kept.get(MALE, 0), 0.0);
        assert_eq!(kept.get(MALE, 5), 10.0);

        assert!(SelectivityGear::new(vec![], 1.5).is_err());
    }

    #[test]
    fn test_catch_never_exceeds_availability() {
        let species = species();
        let everything = Filter::new(Box::new(FixedFilter {
            values: vec![vec![1.0; 11], vec![1.0; 11]],
        }));
        let gear = SelectivityGear::new(vec![everything], 1.0).unwrap();
        let abundance = StructuredAbundance::from_sexes(vec![3.0; 11], vec![7.0; 11]).unwrap();
        let caught = gear.expected_catch(&species, &abundance);
        assert_eq!(caught, abundance);
    }
}
