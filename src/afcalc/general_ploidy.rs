//! Joint model over every retained alternate allele at any ploidy.
//!
//! The state of the dynamic program is the vector of alternate allele
//! counts accumulated so far. Each sample convolves every genotype it
//! could carry, weighted by the genotype's number of orderings, into every
//! reachable state. States live in a `BTreeMap` so that accumulation and
//! iteration order are fixed and results are reproducible bit for bit.

use std::collections::BTreeMap;

use tracing::trace;

use crate::afcalc::pruning::PreparedSite;
use crate::afcalc::{assemble, AfCalcConfig};
use crate::algebra::{log10_sum_exp, log10_sum_exp2, Log10Factorials};
use crate::{AfCalcError, AfCalcResult};

/// One terminal state of the dynamic program.
#[derive(Debug)]
struct CountState {
    alt_counts: Vec<u32>,
    total: usize,
    log10_likelihood: f64,
    log10_posterior: f64,
}

pub(crate) fn compute_general_ploidy(
    site: &PreparedSite,
    log10_priors: &[f64],
    config: &AfCalcConfig,
    factorials: &Log10Factorials,
) -> Result<AfCalcResult, AfCalcError> {
    let num_alt = site.num_alt_alleles();
    let states = terminal_states(site, log10_priors, factorials);
    trace!(num_alt, states = states.len(), "joint allele-count states");

    let prior_eq0 = log10_priors[0];
    let prior_gt0 = log10_sum_exp(&log10_priors[1..]);

    let mut likelihood_eq0 = f64::NEG_INFINITY;
    let mut joint_gt0 = f64::NEG_INFINITY;
    let mut allele_posteriors = vec![[f64::NEG_INFINITY; 2]; num_alt];
    for state in &states {
        if state.total == 0 {
            likelihood_eq0 = state.log10_likelihood;
        } else {
            joint_gt0 = log10_sum_exp2(joint_gt0, state.log10_posterior);
        }
        for (pair, &count) in allele_posteriors.iter_mut().zip(&state.alt_counts) {
            let side = usize::from(count > 0);
            pair[side] = log10_sum_exp2(pair[side], state.log10_posterior);
        }
    }
    let likelihood_gt0 = if prior_gt0 == f64::NEG_INFINITY {
        f64::NEG_INFINITY
    } else {
        joint_gt0 - prior_gt0
    };

    let mle = most_likely_counts(&states, config.mle_tie_tolerance)
        .unwrap_or_else(|| vec![0; num_alt]);

    assemble(
        site,
        mle,
        [likelihood_eq0, likelihood_gt0],
        [prior_eq0, prior_gt0],
        allele_posteriors,
    )
}

/// Run the dynamic program and attach likelihood and prior to every state.
fn terminal_states(
    site: &PreparedSite,
    log10_priors: &[f64],
    factorials: &Log10Factorials,
) -> Vec<CountState> {
    let num_alt = site.num_alt_alleles();
    let moves: Vec<(&[u32], f64)> = site
        .layout
        .iter()
        .map(|(idx, counts)| (&counts[1..], site.layout.log10_combination_count(idx)))
        .collect();

    let mut sums: BTreeMap<Vec<u32>, f64> = BTreeMap::new();
    sums.insert(vec![0; num_alt], 0.0);
    for gl in &site.samples {
        let mut next: BTreeMap<Vec<u32>, f64> = BTreeMap::new();
        for (state, &prev) in &sums {
            for (&lik, &(alt_copies, weight)) in gl.iter().zip(&moves) {
                if lik == f64::NEG_INFINITY {
                    continue;
                }
                let key: Vec<u32> = state.iter().zip(alt_copies).map(|(a, b)| a + b).collect();
                let slot = next.entry(key).or_insert(f64::NEG_INFINITY);
                *slot = log10_sum_exp2(*slot, prev + lik + weight);
            }
        }
        sums = next;
    }

    let chromosomes = site.num_chromosomes();
    let mut all_counts = vec![0u32; num_alt + 1];
    sums.into_iter()
        .map(|(alt_counts, sum)| {
            let total: usize = alt_counts.iter().map(|&c| c as usize).sum();
            all_counts[0] = (chromosomes - total) as u32;
            all_counts[1..].copy_from_slice(&alt_counts);
            let log10_likelihood = sum - factorials.log10_multinomial(&all_counts);
            // P(total) spread evenly over the count vectors sharing that total.
            let log10_prior = log10_priors[total]
                - factorials.log10_binomial(total + num_alt - 1, num_alt - 1);
            CountState {
                alt_counts,
                total,
                log10_likelihood,
                log10_posterior: log10_likelihood + log10_prior,
            }
        })
        .collect()
}

/// Highest-posterior counts; near-ties go to the lowest total, then to the
/// lexicographically smallest vector.
fn most_likely_counts(states: &[CountState], tie_tolerance: f64) -> Option<Vec<u32>> {
    let best = states
        .iter()
        .map(|s| s.log10_posterior)
        .fold(f64::NEG_INFINITY, f64::max);
    states
        .iter()
        .filter(|s| s.log10_posterior >= best - tie_tolerance)
        .min_by(|a, b| (a.total, &a.alt_counts).cmp(&(b.total, &b.alt_counts)))
        .map(|s| s.alt_counts.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::afcalc::biallelic::allele_count_likelihoods;
    use crate::genomics::{Allele, GenotypeLikelihoods, VariantSite};

    fn prepared(num_alleles: usize, ploidy: usize, samples: &[&[u32]]) -> PreparedSite {
        let bases = [b"A", b"C", b"G", b"T"];
        let alleles: Vec<Allele> = (0..num_alleles)
            .map(|i| Allele::new(bases[i], i == 0))
            .collect();
        let site = VariantSite::new(
            alleles,
            ploidy,
            samples.iter().map(|pls| GenotypeLikelihoods::from_pls(pls)).collect(),
        )
        .unwrap();
        PreparedSite::prepare(&site, num_alleles - 1, &AfCalcConfig::default()).unwrap()
    }

    #[test]
    fn biallelic_states_match_kernel() {
        let site = prepared(2, 3, &[&[0, 10, 20, 30], &[30, 0, 10, 40]]);
        let factorials = Log10Factorials::new(16);
        let priors = vec![-(7f64.log10()); 7];
        let states = terminal_states(&site, &priors, &factorials);
        let kernel = allele_count_likelihoods(&site.samples, 3, &factorials);
        assert_eq!(states.len(), kernel.len());
        for state in &states {
            let k = state.alt_counts[0] as usize;
            assert!((state.log10_likelihood - kernel[k]).abs() < 1e-10);
        }
    }

    #[test]
    fn states_cover_every_reachable_vector() {
        let site = prepared(3, 2, &[&[10, 0, 10, 10, 10, 10], &[10, 10, 10, 0, 10, 10]]);
        let factorials = Log10Factorials::new(8);
        let priors = vec![-(5f64.log10()); 5];
        let states = terminal_states(&site, &priors, &factorials);
        // alt vectors with total <= 4 over two alternates
        assert_eq!(states.len(), 15);
        assert_eq!(states[0].alt_counts, vec![0, 0]);
    }

    #[test]
    fn ties_prefer_lowest_total_then_lexicographic() {
        let state = |alt_counts: Vec<u32>, post: f64| CountState {
            total: alt_counts.iter().map(|&c| c as usize).sum(),
            alt_counts,
            log10_likelihood: post,
            log10_posterior: post,
        };
        let states = vec![
            state(vec![0, 2], -1.0),
            state(vec![1, 1], -1.0),
            state(vec![2, 0], -1.0),
            state(vec![0, 1], -3.0),
        ];
        assert_eq!(most_likely_counts(&states, 1e-10), Some(vec![0, 2]));
        assert_eq!(most_likely_counts(&states, 5.0), Some(vec![0, 1]));
    }
}
