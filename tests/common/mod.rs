#![allow(dead_code)]

use std::sync::Arc;

use afcalc::genomics::{Allele, GenotypeLikelihoods, VariantSite};
use afcalc::{AfCalc, AfCalcConfig, AfCalcResult, Calculation};

pub const BASES: [&str; 4] = ["A", "C", "G", "T"];

/// Site over the first `num_alleles` of `BASES` with one PL vector per sample.
pub fn pl_site(num_alleles: usize, ploidy: usize, samples: &[&[u32]]) -> VariantSite {
    let alleles = (0..num_alleles)
        .map(|i| Allele::new(BASES[i], i == 0))
        .collect();
    let samples = samples
        .iter()
        .map(|pls| GenotypeLikelihoods::from_pls(pls))
        .collect();
    VariantSite::new(alleles, ploidy, samples).expect("valid test site")
}

pub fn model(calculation: Calculation, n_samples: usize, ploidy: usize, max_alt: usize) -> Arc<AfCalc> {
    Arc::new(
        AfCalc::new(calculation, n_samples, ploidy, max_alt, AfCalcConfig::default())
            .expect("valid model shape"),
    )
}

/// Models able to handle `max_alt` alternate alleles.
pub fn models_for(max_alt: usize) -> Vec<Calculation> {
    Calculation::ALL
        .into_iter()
        .filter(|c| c.usable_for(2, max_alt))
        .collect()
}

pub fn p_non_ref(result: &AfCalcResult) -> f64 {
    10f64.powf(result.log10_posterior_of_af_gt0())
}

/// Stable textual form of every observable field.
pub fn render(result: &AfCalcResult) -> String {
    let alleles: Vec<String> = result
        .alleles_used_in_genotyping()
        .iter()
        .map(|a| a.to_string())
        .collect();
    let mut out = format!(
        "{}\t{:?}\t{:e}\t{:e}\t{:e}\t{:e}\t{:e}\t{:e}\n",
        alleles.join(","),
        result.allele_counts_of_mle(),
        result.log10_likelihood_of_af_eq0(),
        result.log10_likelihood_of_af_gt0(),
        result.log10_prior_of_af_eq0(),
        result.log10_prior_of_af_gt0(),
        result.log10_posterior_of_af_eq0(),
        result.log10_posterior_of_af_gt0(),
    );
    for allele in &result.alleles_used_in_genotyping()[1..] {
        out.push_str(&format!(
            "{}\t{:e}\t{:e}\n",
            allele,
            result
                .log10_posterior_of_af_eq0_for_allele(allele)
                .unwrap_or(f64::NAN),
            result
                .log10_posterior_of_af_gt0_for_allele(allele)
                .unwrap_or(f64::NAN),
        ));
    }
    out
}
