use std::sync::Arc;

use crate::algebra::{log10_sum_exp, normalize_from_log10};
use crate::AfCalcError;

/// Allowed deviation of the prior's total mass from one, in probability
/// space.
pub const PRIOR_NORMALIZATION_TOLERANCE: f64 = 1e-6;

/// Log10 prior over the total alternate allele count `0..=ploidy * samples`.
///
/// Supplied by the caller and never mutated. Every entry must be finite so
/// that each allele count keeps some prior mass.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PriorTable {
    log10_priors: Arc<[f64]>,
    ploidy: usize,
    num_samples: usize,
}

impl PriorTable {
    /// Validate a caller-supplied log10 prior.
    pub fn new(
        log10_priors: Vec<f64>,
        ploidy: usize,
        num_samples: usize,
    ) -> Result<Self, AfCalcError> {
        if ploidy == 0 {
            return Err(AfCalcError::invalid_parameter("ploidy must be > 0"));
        }
        let expected = ploidy * num_samples + 1;
        if log10_priors.len() != expected {
            return Err(AfCalcError::PriorLength {
                expected,
                actual: log10_priors.len(),
            });
        }
        if let Some((ac, value)) = log10_priors
            .iter()
            .enumerate()
            .find(|(_, v)| !v.is_finite())
        {
            return Err(AfCalcError::invalid_parameter(format!(
                "prior for allele count {ac} is {value}, expected a finite log10 value"
            )));
        }
        let log10_total = log10_sum_exp(&log10_priors);
        if (10f64.powf(log10_total) - 1.0).abs() > PRIOR_NORMALIZATION_TOLERANCE {
            return Err(AfCalcError::PriorNotNormalized { log10_total });
        }
        Ok(Self {
            log10_priors: log10_priors.into(),
            ploidy,
            num_samples,
        })
    }

    /// Build from linear-scale probabilities.
    pub fn from_probabilities(
        probabilities: &[f64],
        ploidy: usize,
        num_samples: usize,
    ) -> Result<Self, AfCalcError> {
        let log10 = probabilities.iter().map(|p| p.log10()).collect();
        Self::new(log10, ploidy, num_samples)
    }

    /// Uniform prior over every allele count.
    pub fn flat(ploidy: usize, num_samples: usize) -> Result<Self, AfCalcError> {
        if ploidy == 0 {
            return Err(AfCalcError::invalid_parameter("ploidy must be > 0"));
        }
        let len = ploidy * num_samples + 1;
        let value = -(len as f64).log10();
        Ok(Self {
            log10_priors: vec![value; len].into(),
            ploidy,
            num_samples,
        })
    }

    /// Neutral population-genetics prior: `P(AC = k) = theta / k` for
    /// `k >= 1`, with the remainder on `AC = 0`.
    pub fn human(
        ploidy: usize,
        num_samples: usize,
        heterozygosity: f64,
    ) -> Result<Self, AfCalcError> {
        if !(heterozygosity > 0.0 && heterozygosity < 1.0) {
            return Err(AfCalcError::invalid_parameter(format!(
                "heterozygosity must lie in (0, 1), got {heterozygosity}"
            )));
        }
        let num_chromosomes = ploidy * num_samples;
        let mut priors = Vec::with_capacity(num_chromosomes + 1);
        priors.push(0.0);
        let mut non_ref_mass = 0.0;
        for k in 1..=num_chromosomes {
            let p = heterozygosity / k as f64;
            non_ref_mass += p;
            priors.push(p.log10());
        }
        if non_ref_mass >= 1.0 {
            return Err(AfCalcError::invalid_parameter(format!(
                "heterozygosity {heterozygosity} leaves no prior mass for AC = 0 over {num_chromosomes} chromosomes"
            )));
        }
        priors[0] = (1.0 - non_ref_mass).log10();
        Self::new(priors, ploidy, num_samples)
    }

    /// Log10 prior of allele count `ac`.
    pub fn get(&self, ac: usize) -> Option<f64> {
        self.log10_priors.get(ac).copied()
    }

    /// All log10 values, indexed by allele count.
    pub fn as_log10(&self) -> &[f64] {
        &self.log10_priors
    }

    /// Number of entries (`ploidy * samples + 1`).
    pub fn len(&self) -> usize {
        self.log10_priors.len()
    }

    /// Always false; a table covers at least `AC = 0`.
    pub fn is_empty(&self) -> bool {
        self.log10_priors.is_empty()
    }

    /// Largest representable allele count.
    pub fn max_allele_count(&self) -> usize {
        self.log10_priors.len() - 1
    }

    /// Ploidy the table was built for.
    pub fn ploidy(&self) -> usize {
        self.ploidy
    }

    /// Sample count the table was built for.
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    /// Prior mass on `AC = 0`.
    pub fn log10_prior_of_af_eq0(&self) -> f64 {
        self.log10_priors[0]
    }

    /// Prior mass on `AC > 0`.
    pub fn log10_prior_of_af_gt0(&self) -> f64 {
        log10_sum_exp(&self.log10_priors[1..])
    }

    /// Priors for allele counts `0..=max_allele_count`, renormalized to sum
    /// to one.
    pub(crate) fn renormalized_prefix(&self, max_allele_count: usize) -> Vec<f64> {
        let end = (max_allele_count + 1).min(self.log10_priors.len());
        normalize_from_log10(&self.log10_priors[..end])
    }
}
