use afcalc::genomics::{synthetic_site, PriorTable};
use afcalc::{AfCalcFactory, Calculation};
use test_case::test_case;

#[test_case(&[0], 100)]
#[test_case(&[1], 100)]
#[test_case(&[2], 1000)]
#[test_case(&[0, 1], 100)]
#[test_case(&[1, 1], 1000)]
#[test_case(&[3, 0], 100)]
#[test_case(&[1, 0, 2], 100)]
fn polymorphism_calls_match_synthetic_counts(alt_counts: &[usize], non_type_pl: u32) {
    let factory = AfCalcFactory::default();
    for num_non_informative in [0, 3] {
        let site = synthetic_site(alt_counts, 8, num_non_informative, non_type_pl, 2).unwrap();
        let priors = PriorTable::human(2, site.num_samples(), 0.001).unwrap();

        for calculation in [Calculation::ExactIndependent, Calculation::ExactGeneralPloidy] {
            let calc = factory
                .get(calculation, site.num_samples(), 2, alt_counts.len())
                .unwrap();
            let result = calc.compute(&site, &priors).unwrap();

            for (allele, &count) in site.alternate_alleles().iter().zip(alt_counts) {
                assert_eq!(
                    result.is_polymorphic(allele, -1.0),
                    count > 0,
                    "{calculation} {allele} count {count}"
                );
                if count > 0 {
                    assert_eq!(
                        result.allele_count_at_mle(allele),
                        Some(count as u32),
                        "{calculation} {allele}"
                    );
                }
            }
        }
    }
}
