use std::sync::Arc;
use std::thread;

use afcalc::{AfCalcConfig, AfCalcError, AfCalcFactory, Calculation};
use test_case::test_case;

#[test_case(Calculation::ExactReference, 1, true)]
#[test_case(Calculation::ExactReference, 2, false)]
#[test_case(Calculation::ExactIndependent, 6, true)]
#[test_case(Calculation::ExactGeneralPloidy, 6, true)]
fn max_alt_support(calculation: Calculation, max_alt: usize, ok: bool) {
    let factory = AfCalcFactory::default();
    let built = factory.get(calculation, 10, 2, max_alt);
    assert_eq!(built.is_ok(), ok);
    if let Err(err) = built {
        assert_eq!(
            err,
            AfCalcError::UnsupportedMaxAltAlleles {
                calculation: calculation.name(),
                requested: max_alt,
                supported: 1,
            }
        );
    }
}

#[test]
fn invalid_shapes_are_rejected() {
    let factory = AfCalcFactory::default();
    assert!(matches!(
        factory.get(Calculation::ExactIndependent, 0, 2, 1),
        Err(AfCalcError::InvalidParameter(_))
    ));
    assert!(matches!(
        factory.get(Calculation::ExactGeneralPloidy, 3, 0, 1),
        Err(AfCalcError::InvalidParameter(_))
    ));
    let bad = AfCalcFactory::new(4, AfCalcConfig::default().with_pruning_margin(-1.0));
    assert!(bad.get(Calculation::ExactIndependent, 3, 2, 1).is_err());
}

#[test]
fn concurrent_gets_share_one_instance() {
    let factory = AfCalcFactory::default();
    let handles: Vec<_> = thread::scope(|scope| {
        let workers: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| factory.get(Calculation::ExactGeneralPloidy, 5, 3, 2)))
            .collect();
        workers
            .into_iter()
            .map(|w| w.join().expect("worker panicked").expect("model builds"))
            .collect()
    });
    for handle in &handles[1..] {
        assert!(Arc::ptr_eq(&handles[0], handle));
    }
    assert_eq!(factory.len(), 1);
}

#[test]
fn distinct_shapes_get_distinct_instances() {
    let factory = AfCalcFactory::new(8, AfCalcConfig::default());
    let a = factory.get(Calculation::ExactIndependent, 5, 2, 2).unwrap();
    let b = factory.get(Calculation::ExactIndependent, 5, 2, 3).unwrap();
    let c = factory.get(Calculation::ExactGeneralPloidy, 5, 2, 2).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(factory.len(), 3);
    assert_eq!(b.max_alt_alleles(), 3);
}
