//! Immutable outcome of one allele-frequency calculation.

use std::sync::Arc;

use crate::algebra::{log10_sum_exp2, normalize_pair};
use crate::genomics::{Allele, PRIOR_NORMALIZATION_TOLERANCE};
use crate::AfCalcError;

const EQ0: usize = 0;
const GT0: usize = 1;

/// Posterior split between "no alternate allele segregates" (AF = 0) and
/// "some alternate allele segregates" (AF > 0), plus per-allele detail.
///
/// Likelihood and prior components are kept separately; the posterior is
/// always the normalization of their sum, so the two posterior values
/// combine to probability one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AfCalcResult {
    allele_counts_of_mle: Vec<u32>,
    alleles_used: Arc<[Allele]>,
    log10_likelihoods: [f64; 2],
    log10_priors: [f64; 2],
    log10_posteriors: [f64; 2],
    /// Normalized `[eq0, gt0]` posterior per alternate allele.
    log10_allele_posteriors: Vec<[f64; 2]>,
}

impl AfCalcResult {
    /// Assemble a result.
    ///
    /// * `allele_counts_of_mle` - one count per alternate in `alleles_used`
    /// * `alleles_used` - alleles that took part in the calculation, reference first
    /// * `log10_likelihoods` / `log10_priors` - `[AF = 0, AF > 0]`
    /// * `log10_allele_posteriors` - per-alternate `[AF_i = 0, AF_i > 0]`, normalized here
    pub fn new(
        allele_counts_of_mle: Vec<u32>,
        alleles_used: Vec<Allele>,
        log10_likelihoods: [f64; 2],
        log10_priors: [f64; 2],
        log10_allele_posteriors: Vec<[f64; 2]>,
    ) -> Result<Self, AfCalcError> {
        match alleles_used.first() {
            None => return Err(AfCalcError::EmptyAlleles),
            Some(first) if !first.is_reference() => {
                return Err(AfCalcError::InvalidReference(format!(
                    "first allele used {first} is not the reference"
                )))
            }
            _ => {}
        }
        let num_alt = alleles_used.len() - 1;
        if allele_counts_of_mle.len() != num_alt || log10_allele_posteriors.len() != num_alt {
            return Err(AfCalcError::invalid_parameter(format!(
                "{num_alt} alternate alleles but {} MLE counts and {} allele posteriors",
                allele_counts_of_mle.len(),
                log10_allele_posteriors.len()
            )));
        }
        if log10_likelihoods
            .iter()
            .chain(log10_priors.iter())
            .any(|v| v.is_nan() || *v == f64::INFINITY)
        {
            return Err(AfCalcError::invalid_parameter(
                "likelihood and prior components must be log10 probabilities",
            ));
        }
        let prior_mass = 10f64.powf(log10_sum_exp2(log10_priors[EQ0], log10_priors[GT0]));
        if (prior_mass - 1.0).abs() > PRIOR_NORMALIZATION_TOLERANCE {
            return Err(AfCalcError::PriorNotNormalized {
                log10_total: prior_mass.log10(),
            });
        }

        let joint = [
            log10_likelihoods[EQ0] + log10_priors[EQ0],
            log10_likelihoods[GT0] + log10_priors[GT0],
        ];
        if joint.iter().all(|&v| v == f64::NEG_INFINITY) {
            return Err(AfCalcError::invalid_parameter(
                "no posterior mass on either AF hypothesis",
            ));
        }

        Ok(Self {
            allele_counts_of_mle,
            alleles_used: alleles_used.into(),
            log10_likelihoods,
            log10_priors,
            log10_posteriors: normalize_pair(joint),
            log10_allele_posteriors: log10_allele_posteriors
                .into_iter()
                .map(normalize_pair)
                .collect(),
        })
    }

    /// Maximum a-posteriori allele count per alternate allele, in the order
    /// of [`alleles_used_in_genotyping`](Self::alleles_used_in_genotyping).
    pub fn allele_counts_of_mle(&self) -> &[u32] {
        &self.allele_counts_of_mle
    }

    /// Alleles retained after pruning, reference first.
    pub fn alleles_used_in_genotyping(&self) -> &[Allele] {
        &self.alleles_used
    }

    /// MLE allele count for one alternate allele.
    pub fn allele_count_at_mle(&self, allele: &Allele) -> Option<u32> {
        self.alt_index(allele).map(|i| self.allele_counts_of_mle[i])
    }

    /// `log10 P(data | AF = 0)`.
    pub fn log10_likelihood_of_af_eq0(&self) -> f64 {
        self.log10_likelihoods[EQ0]
    }

    /// `log10 P(data | AF > 0)`, prior-weighted over the non-zero counts.
    pub fn log10_likelihood_of_af_gt0(&self) -> f64 {
        self.log10_likelihoods[GT0]
    }

    /// `log10 P(AF = 0)`.
    pub fn log10_prior_of_af_eq0(&self) -> f64 {
        self.log10_priors[EQ0]
    }

    /// `log10 P(AF > 0)`.
    pub fn log10_prior_of_af_gt0(&self) -> f64 {
        self.log10_priors[GT0]
    }

    /// `log10 P(AF = 0 | data)`.
    pub fn log10_posterior_of_af_eq0(&self) -> f64 {
        self.log10_posteriors[EQ0]
    }

    /// `log10 P(AF > 0 | data)`.
    pub fn log10_posterior_of_af_gt0(&self) -> f64 {
        self.log10_posteriors[GT0]
    }

    /// `log10 P(AF_allele = 0 | data)`; `None` for the reference or an
    /// allele that was not used.
    pub fn log10_posterior_of_af_eq0_for_allele(&self, allele: &Allele) -> Option<f64> {
        self.alt_index(allele)
            .map(|i| self.log10_allele_posteriors[i][EQ0])
    }

    /// `log10 P(AF_allele > 0 | data)`; `None` for the reference or an
    /// allele that was not used.
    pub fn log10_posterior_of_af_gt0_for_allele(&self, allele: &Allele) -> Option<f64> {
        self.alt_index(allele)
            .map(|i| self.log10_allele_posteriors[i][GT0])
    }

    /// Whether the log10 posterior odds of `AF_allele > 0` over
    /// `AF_allele = 0` exceed `log10_odds_threshold`.
    ///
    /// Negative thresholds are lenient, positive ones strict. Always false
    /// for the reference allele and for alleles that were pruned.
    pub fn is_polymorphic(&self, allele: &Allele, log10_odds_threshold: f64) -> bool {
        self.alt_index(allele)
            .map(|i| {
                let [eq0, gt0] = self.log10_allele_posteriors[i];
                gt0 - eq0 > log10_odds_threshold
            })
            .unwrap_or(false)
    }

    /// Whether any used alternate allele is polymorphic at the threshold.
    pub fn any_polymorphic(&self, log10_odds_threshold: f64) -> bool {
        self.alleles_used[1..]
            .iter()
            .any(|allele| self.is_polymorphic(allele, log10_odds_threshold))
    }

    /// Phred-scaled confidence that the site is variant,
    /// `-10 * log10 P(AF = 0 | data)`; infinite when AF = 0 has no mass.
    pub fn phred_scaled_qual(&self) -> f64 {
        let eq0 = self.log10_posteriors[EQ0];
        if eq0 == 0.0 {
            0.0
        } else {
            -10.0 * eq0
        }
    }

    fn alt_index(&self, allele: &Allele) -> Option<usize> {
        if allele.is_reference() {
            return None;
        }
        self.alleles_used[1..].iter().position(|a| a == allele)
    }
}
