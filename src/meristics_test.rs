#[cfg(test)]
mod tests {
    use super::super::error::{BiologyError, ConfigError};
    use super::super::meristics::*;
    use super::super::species::{FEMALE, MALE};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9 * b.abs().max(1.0)
    }

    #[test]
    fn test_curves_have_one_entry_per_age() {
        let meristics = StockAssessmentMeristics::new(MeristicsInput::sablefish()).unwrap();
        let ages = 60;
        assert_eq!(meristics.number_of_bins(), ages);
        assert_eq!(meristics.max_age(), 59);
        for subdivision in [MALE, FEMALE] {
            assert_eq!(meristics.lengths(subdivision).len(), ages);
            assert_eq!(meristics.weights(subdivision).len(), ages);
            assert_eq!(meristics.cumulative_survival(subdivision).len(), ages);
        }
        assert_eq!(meristics.maturity_curve().len(), ages);
        assert_eq!(meristics.relative_fecundity_curve().len(), ages);
        assert_eq!(meristics.phi().len(), ages);
    }

    #[test]
    fn test_growth_curve_passes_through_young_and_old_lengths() {
        let input = MeristicsInput {
            young_age_male: 1.0,
            young_age_female: 1.0,
            ..MeristicsInput::sablefish()
        };
        let meristics = StockAssessmentMeristics::new(input.clone()).unwrap();

        assert!(close(meristics.length(MALE, 1), input.young_length_male));
        assert!(close(meristics.length(FEMALE, 1), input.young_length_female));
        assert!(close(meristics.length(MALE, input.age_old), input.max_length_male));
        assert!(close(meristics.length(FEMALE, input.age_old), input.max_length_female));
        assert!(meristics.length_infinity(MALE) > input.max_length_male);
    }

    #[test]
    fn test_linf_falls_back_to_max_length() {
        let input = MeristicsInput {
            young_length_male: 70.0,
            ..MeristicsInput::sablefish()
        };
        let meristics = StockAssessmentMeristics::new(input).unwrap();
        assert_eq!(meristics.length_infinity(MALE), 56.2);
    }

    #[test]
    fn test_linf_branch_compares_young_length_with_age_old() {
        // 30 < 35 < 56.2: longer than the old age, shorter than the max length
        let input = MeristicsInput {
            young_length_male: 35.0,
            ..MeristicsInput::sablefish()
        };
        assert_eq!(input.age_old, 30);
        let meristics = StockAssessmentMeristics::new(input).unwrap();
        assert_eq!(meristics.length_infinity(MALE), 56.2);
        // the female curve keeps 25.8 < 30 and stretches past its max length
        assert!(meristics.length_infinity(FEMALE) > 64.0);
    }

    #[test]
    fn test_negative_lengths_are_floored() {
        let input = MeristicsInput {
            young_age_male: 3.0,
            young_length_male: 5.0,
            k_parameter_male: 2.0,
            ..MeristicsInput::sablefish()
        };
        let meristics = StockAssessmentMeristics::new(input).unwrap();
        assert_eq!(meristics.length(MALE, 0), 0.0);
        assert_eq!(meristics.weight(MALE, 0), 0.0);
        assert!(meristics.lengths(MALE).iter().all(|&l| l >= 0.0));
    }

    #[test]
    fn test_weight_is_allometric() {
        let input = MeristicsInput::sablefish();
        let meristics = StockAssessmentMeristics::new(input.clone()).unwrap();
        for age in [0, 5, 30, 59] {
            let expected = input.weight_parameter_a_female
                * meristics.length(FEMALE, age).powf(input.weight_parameter_b_female);
            assert!(close(meristics.weight(FEMALE, age), expected));
        }
    }

    #[test]
    fn test_cumulative_survival_and_phi() {
        let input = MeristicsInput::sablefish();
        let meristics = StockAssessmentMeristics::new(input.clone()).unwrap();

        assert_eq!(meristics.cumulative_survival(MALE)[0], 1.0);
        assert_eq!(meristics.cumulative_survival(FEMALE)[0], 1.0);
        let expected = (-input.mortality_parameter_m_female * 10.0).exp();
        assert!(close(meristics.cumulative_survival(FEMALE)[10], expected));

        let summed: f64 = meristics.phi().iter().sum();
        assert!(close(meristics.cumulative_phi(), summed));
        assert!(meristics.cumulative_phi() > 0.0);

        let age = 12;
        let phi = meristics.maturity(age)
            * meristics.relative_fecundity(age)
            * meristics.cumulative_survival(FEMALE)[age];
        assert!(close(meristics.phi()[age], phi));
    }

    #[test]
    fn test_maturity_is_logistic_in_female_length() {
        let input = MeristicsInput::sablefish();
        let meristics = StockAssessmentMeristics::new(input.clone()).unwrap();
        let age = 20;
        let expected = 1.0
            / (1.0
                + (input.maturity_slope * (meristics.length(FEMALE, age) - input.maturity_inflection))
                    .exp());
        assert!(close(meristics.maturity(age), expected));
        // negative slope: maturity grows with length
        assert!(meristics.maturity(40) > meristics.maturity(2));
    }

    #[test]
    fn test_max_age_preconditions() {
        let too_young = MeristicsInput {
            max_age: 20,
            ..MeristicsInput::sablefish()
        };
        match StockAssessmentMeristics::new(too_young) {
            Err(BiologyError::Config(ConfigError::MaxAgeBelowAgeOld { max_age, age_old })) => {
                assert_eq!((max_age, age_old), (20, 30));
            }
            other => panic!("unexpected {:?}", other),
        }

        let young_age_too_old = MeristicsInput {
            max_age: 30,
            young_age_female: 31.0,
            ..MeristicsInput::sablefish()
        };
        let err = StockAssessmentMeristics::new(young_age_too_old).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_stock_recruitment_reports_calibrated_phi() {
        let mut meristics = StockAssessmentMeristics::new(MeristicsInput::sablefish()).unwrap();
        meristics.set_cumulative_phi(12.5);
        let sr = meristics.stock_recruitment().unwrap();
        assert_eq!(sr.cumulative_phi, 12.5);
        assert_eq!(sr.steepness, 0.6);
        assert_eq!(sr.virgin_recruits, 416_331.0);
    }

    #[test]
    fn test_from_list_meristics() {
        let meristics = FromListMeristics::new(vec![0.5, 1.5, 3.0], vec![10.0, 20.0, 30.0], 2)
            .unwrap()
            .with_natural_mortality(0.2);
        assert_eq!(meristics.number_of_bins(), 3);
        assert_eq!(meristics.max_age(), 2);
        assert_eq!(meristics.weight(FEMALE, 2), 3.0);
        assert_eq!(meristics.length(MALE, 1), 20.0);
        assert_eq!(meristics.natural_mortality(MALE), Some(0.2));
        assert!(meristics.stock_recruitment().is_none());

        assert!(FromListMeristics::new(vec![1.0], vec![1.0, 2.0], 2).is_err());
    }

    #[test]
    fn test_equally_spaced_bins() {
        let meristics = EquallySpacedBertalanffyMeristics::new(BertalanffyInput::red_fish()).unwrap();
        assert_eq!(meristics.number_of_subdivisions(), 1);
        assert_eq!(meristics.number_of_bins(), 25);
        assert_eq!(meristics.length(0, 0), 0.0);
        assert_eq!(meristics.length(0, 10), 50.0);
        assert_eq!(meristics.weight(0, 0), 0.0);
        // grams to kg
        assert!(close(meristics.weight(0, 10), 0.015 * 50f64.powf(2.961) / 1000.0));
        assert_eq!(meristics.natural_mortality(0), Some(0.1));
        assert_eq!(meristics.stock_recruitment().unwrap().steepness, 0.6);

        let growth = meristics.growth().unwrap();
        assert_eq!(growth.length_infinity, 113.0);
        assert!(StockAssessmentMeristics::new(MeristicsInput::sablefish()).unwrap().growth().is_none());
    }

    #[test]
    fn test_von_bertalanffy_growth_stops_at_linf() {
        let growth = VonBertalanffy {
            k: 0.5,
            length_infinity: 100.0,
        };
        assert!(close(growth.grow_one_year(0.0), 100.0 * (1.0 - (-0.5f64).exp())));
        assert_eq!(growth.grow_one_year(100.0), 100.0);
        assert_eq!(growth.grow_one_year(120.0), 120.0);
    }

    #[test]
    fn test_equally_spaced_rejects_bad_parameters() {
        for input in [
            BertalanffyInput {
                cm_per_bin: 0.0,
                ..BertalanffyInput::red_fish()
            },
            BertalanffyInput {
                k: -1.0,
                ..BertalanffyInput::red_fish()
            },
            BertalanffyInput {
                number_of_bins: 0,
                ..BertalanffyInput::red_fish()
            },
            BertalanffyInput {
                recruit_length: f64::NAN,
                ..BertalanffyInput::red_fish()
            },
        ] {
            assert!(EquallySpacedBertalanffyMeristics::new(input).unwrap_err().is_configuration());
        }
    }
}
