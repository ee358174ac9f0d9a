//! Independent-allele model: every alternate allele is solved as its own
//! biallelic problem and the alleles are combined as independent events.

use crate::afcalc::biallelic::{solve_allele, BiallelicSummary};
use crate::afcalc::pruning::PreparedSite;
use crate::afcalc::{assemble, AfCalcConfig};
use crate::algebra::{log10_one_minus_pow10, Log10Factorials};
use crate::{AfCalcError, AfCalcResult};

pub(crate) fn compute_independent(
    site: &PreparedSite,
    log10_priors: &[f64],
    config: &AfCalcConfig,
    factorials: &Log10Factorials,
) -> Result<AfCalcResult, AfCalcError> {
    let summaries: Vec<BiallelicSummary> = (1..=site.num_alt_alleles())
        .map(|allele| solve_allele(site, allele, log10_priors, config, factorials))
        .collect();

    let (log10_likelihoods, log10_priors) = match summaries.as_slice() {
        [only] => (only.log10_likelihoods, only.log10_priors),
        _ => combine(&summaries),
    };

    assemble(
        site,
        summaries.iter().map(|s| s.mle).collect(),
        log10_likelihoods,
        log10_priors,
        summaries.iter().map(|s| s.log10_posteriors).collect(),
    )
}

/// `P(AF = 0) = prod_i P_i(AF_i = 0)` for both prior and posterior; the
/// likelihood pair is whatever reproduces that posterior under that prior.
fn combine(summaries: &[BiallelicSummary]) -> ([f64; 2], [f64; 2]) {
    let posterior_eq0: f64 = summaries.iter().map(|s| s.log10_posteriors[0]).sum();
    let prior_eq0: f64 = summaries.iter().map(|s| s.log10_priors[0]).sum();
    let posterior_gt0 = log10_one_minus_pow10(posterior_eq0);
    let prior_gt0 = log10_one_minus_pow10(prior_eq0);

    let likelihood_gt0 = if prior_gt0 == f64::NEG_INFINITY {
        f64::NEG_INFINITY
    } else {
        posterior_gt0 - prior_gt0
    };
    (
        [posterior_eq0 - prior_eq0, likelihood_gt0],
        [prior_eq0, prior_gt0],
    )
}
