//! Exact single-alternate machinery shared by the reference and
//! independent models.

use crate::afcalc::pruning::PreparedSite;
use crate::afcalc::{assemble, AfCalcConfig};
use crate::algebra::{
    first_max_index, log10_sum_exp, log10_sum_exp2, normalize_pair, Log10Factorials,
};
use crate::{AfCalcError, AfCalcResult};

/// Summary of one biallelic run over `0..=ploidy * samples` alternate copies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BiallelicSummary {
    pub log10_likelihoods: [f64; 2],
    pub log10_priors: [f64; 2],
    /// Normalized `[AF = 0, AF > 0]`.
    pub log10_posteriors: [f64; 2],
    pub mle: u32,
}

/// `log10 L(k)` for every total alternate count `k`.
///
/// `samples[j][c]` is the log10 likelihood that sample `j` carries `c`
/// alternate copies. Runs the recurrence
/// `S_j(k) = lse_c S_{j-1}(k - c) + L_j(c) + log10 C(p, c)` and divides
/// by `C(p * n, k)` at the end.
pub(crate) fn allele_count_likelihoods(
    samples: &[Vec<f64>],
    ploidy: usize,
    factorials: &Log10Factorials,
) -> Vec<f64> {
    let copy_weights: Vec<f64> = (0..=ploidy)
        .map(|c| factorials.log10_binomial(ploidy, c))
        .collect();

    let mut sums = vec![0.0];
    for gl in samples {
        let mut next = vec![f64::NEG_INFINITY; sums.len() + ploidy];
        for (k, &prev) in sums.iter().enumerate() {
            if prev == f64::NEG_INFINITY {
                continue;
            }
            for (c, (&lik, &weight)) in gl.iter().zip(&copy_weights).enumerate() {
                next[k + c] = log10_sum_exp2(next[k + c], prev + lik + weight);
            }
        }
        sums = next;
    }

    let chromosomes = sums.len() - 1;
    sums.into_iter()
        .enumerate()
        .map(|(k, v)| v - factorials.log10_binomial(chromosomes, k))
        .collect()
}

/// Combine per-count likelihoods with priors over the same range.
pub(crate) fn summarize(
    log10_likelihoods: &[f64],
    log10_priors: &[f64],
    tie_tolerance: f64,
) -> BiallelicSummary {
    let posteriors: Vec<f64> = log10_likelihoods
        .iter()
        .zip(log10_priors)
        .map(|(l, p)| l + p)
        .collect();

    let prior_gt0 = log10_sum_exp(&log10_priors[1..]);
    let likelihood_gt0 = if prior_gt0 == f64::NEG_INFINITY {
        f64::NEG_INFINITY
    } else {
        log10_sum_exp(&posteriors[1..]) - prior_gt0
    };

    let log10_likelihoods = [log10_likelihoods[0], likelihood_gt0];
    let log10_priors = [log10_priors[0], prior_gt0];
    BiallelicSummary {
        log10_likelihoods,
        log10_priors,
        log10_posteriors: normalize_pair([
            log10_likelihoods[0] + log10_priors[0],
            log10_likelihoods[1] + log10_priors[1],
        ]),
        mle: first_max_index(&posteriors, tie_tolerance).unwrap_or(0) as u32,
    }
}

/// Run the biallelic kernel for alternate allele `allele` of `site`,
/// treating every other allele as reference.
pub(crate) fn solve_allele(
    site: &PreparedSite,
    allele: usize,
    log10_priors: &[f64],
    config: &AfCalcConfig,
    factorials: &Log10Factorials,
) -> BiallelicSummary {
    let samples = site.collapse_to_biallelic(allele);
    let likelihoods = allele_count_likelihoods(&samples, site.ploidy, factorials);
    summarize(&likelihoods, log10_priors, config.mle_tie_tolerance)
}

/// Exact model for sites with a single alternate allele.
pub(crate) fn compute_reference(
    site: &PreparedSite,
    log10_priors: &[f64],
    config: &AfCalcConfig,
    factorials: &Log10Factorials,
) -> Result<AfCalcResult, AfCalcError> {
    if site.num_alt_alleles() != 1 {
        return Err(AfCalcError::UnsupportedMaxAltAlleles {
            calculation: "exact_reference",
            requested: site.num_alt_alleles(),
            supported: 1,
        });
    }
    // With two alleles the canonical order is already by alternate copies.
    let likelihoods = allele_count_likelihoods(&site.samples, site.ploidy, factorials);
    let summary = summarize(&likelihoods, log10_priors, config.mle_tie_tolerance);
    assemble(
        site,
        vec![summary.mle],
        summary.log10_likelihoods,
        summary.log10_priors,
        vec![summary.log10_posteriors],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::normalize_from_log10;

    fn flat(len: usize) -> Vec<f64> {
        normalize_from_log10(&vec![0.0; len])
    }

    #[test]
    fn single_het_sample() {
        let factorials = Log10Factorials::new(8);
        let lik = allele_count_likelihoods(&[vec![-2.0, 0.0, -2.0]], 2, &factorials);
        assert_eq!(lik.len(), 3);
        // L(1) = (2 * 10^0) / C(2,1)
        assert!((lik[0] + 2.0).abs() < 1e-12);
        assert!(lik[1].abs() < 1e-12);
        assert!((lik[2] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn two_sample_convolution() {
        let factorials = Log10Factorials::new(8);
        let samples = vec![vec![0.0, -1.0, -2.0], vec![-1.0, 0.0, -1.0]];
        let lik = allele_count_likelihoods(&samples, 2, &factorials);
        let g = |s: &[f64], c: usize| 10f64.powf(s[c]);
        let w = [1.0, 2.0, 1.0];
        let mut expected = [0.0; 5];
        for a in 0..3 {
            for b in 0..3 {
                expected[a + b] += g(&samples[0], a) * w[a] * g(&samples[1], b) * w[b];
            }
        }
        let totals = [1.0, 4.0, 6.0, 4.0, 1.0];
        for k in 0..5 {
            assert!((lik[k] - (expected[k] / totals[k]).log10()).abs() < 1e-12);
        }
    }

    #[test]
    fn summary_splits_mass() {
        let summary = summarize(&[-2.0, 0.0, -2.0], &flat(3), 1e-10);
        assert_eq!(summary.mle, 1);
        let total = log10_sum_exp2(summary.log10_posteriors[0], summary.log10_posteriors[1]);
        assert!(total.abs() < 1e-12);
        assert_eq!(summary.log10_likelihoods[0], -2.0);
    }

    #[test]
    fn ties_resolve_to_lowest_count() {
        let summary = summarize(&[0.0, 0.0, 0.0], &flat(3), 1e-10);
        assert_eq!(summary.mle, 0);
    }

    #[test]
    fn empty_prior_tail_has_no_gt0_likelihood() {
        let summary = summarize(&[0.0], &[0.0], 1e-10);
        assert_eq!(summary.log10_priors, [0.0, f64::NEG_INFINITY]);
        assert_eq!(summary.log10_likelihoods[1], f64::NEG_INFINITY);
        assert_eq!(summary.mle, 0);
    }
}
