mod common;

use std::collections::HashSet;

use afcalc::genomics::{synthetic_site, PriorTable};
use afcalc::{AfCalcFactory, Calculation};
use blake3::hash;
use common::render;

#[test]
fn repeated_runs_render_identically() {
    let site = synthetic_site(&[2, 1], 6, 2, 60, 2).expect("synthetic site");
    let priors = PriorTable::human(2, site.num_samples(), 0.001).expect("prior");

    for calculation in [Calculation::ExactIndependent, Calculation::ExactGeneralPloidy] {
        let mut fingerprints = HashSet::new();
        for _ in 0..5 {
            let factory = AfCalcFactory::default();
            let calc = factory
                .get(calculation, site.num_samples(), 2, 2)
                .expect("model builds");
            let result = calc.compute(&site, &priors).expect("compute succeeds");
            fingerprints.insert(hash(render(&result).as_bytes()));
        }
        assert_eq!(fingerprints.len(), 1, "{calculation} outputs diverged across runs");
    }
}
