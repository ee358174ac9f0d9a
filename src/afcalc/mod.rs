//! Allele-frequency models.
//!
//! Every model consumes a validated [`VariantSite`] and a [`PriorTable`]
//! and produces an [`AfCalcResult`]. The shared pipeline is:
//!
//! 1. check the site against the instance shape (ploidy, sample count,
//!    prior length);
//! 2. drop non-informative samples and prune weak alternate alleles;
//! 3. run the selected dynamic program over the informative samples;
//! 4. fold the non-informative samples back in as a constant.
//!
//! Models are selected with [`Calculation`]; [`AfCalcFactory`] caches
//! configured instances.

mod biallelic;
mod config;
mod factory;
mod general_ploidy;
mod independent;
mod pruning;
mod result;

pub use config::{
    AfCalcConfig, DEFAULT_MLE_TIE_TOLERANCE, DEFAULT_NON_INFORMATIVE_TOLERANCE,
    DEFAULT_PRUNING_MARGIN,
};
pub use factory::{AfCalcFactory, DEFAULT_CACHE_CAPACITY};
pub use result::AfCalcResult;

use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::algebra::Log10Factorials;
use crate::genomics::{PriorTable, VariantSite};
use crate::AfCalcError;
use pruning::PreparedSite;

/// Signature shared by every model: prepared site, renormalized log10
/// priors over `0..=ploidy * informative samples`, tunables, factorials.
type ModelFn = fn(
    &PreparedSite,
    &[f64],
    &AfCalcConfig,
    &Log10Factorials,
) -> Result<AfCalcResult, AfCalcError>;

/// Selector for the calculation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum Calculation {
    /// Exact biallelic dynamic program; one alternate allele only.
    ExactReference,
    /// Each alternate allele solved separately, combined as independent
    /// events. Linear in samples and alleles.
    ExactIndependent,
    /// Exact joint dynamic program over all alternate alleles at any
    /// ploidy.
    ExactGeneralPloidy,
}

impl Calculation {
    /// Every selector, in preference order.
    pub const ALL: [Calculation; 3] = [
        Calculation::ExactIndependent,
        Calculation::ExactGeneralPloidy,
        Calculation::ExactReference,
    ];

    /// Stable name used by `Display` and `FromStr`.
    pub fn name(self) -> &'static str {
        match self {
            Calculation::ExactReference => "exact_reference",
            Calculation::ExactIndependent => "exact_independent",
            Calculation::ExactGeneralPloidy => "exact_general_ploidy",
        }
    }

    /// Largest `max_alt_alleles` the model accepts.
    pub fn max_supported_alt_alleles(self) -> usize {
        match self {
            Calculation::ExactReference => 1,
            Calculation::ExactIndependent | Calculation::ExactGeneralPloidy => usize::MAX,
        }
    }

    /// Whether the model can handle the requested shape.
    pub fn usable_for(self, ploidy: usize, max_alt_alleles: usize) -> bool {
        ploidy > 0 && max_alt_alleles >= 1 && max_alt_alleles <= self.max_supported_alt_alleles()
    }

    /// Model to use when the caller has no preference.
    pub fn default_for(ploidy: usize) -> Self {
        if ploidy == 2 {
            Calculation::ExactIndependent
        } else {
            Calculation::ExactGeneralPloidy
        }
    }

    fn model(self) -> ModelFn {
        match self {
            Calculation::ExactReference => biallelic::compute_reference,
            Calculation::ExactIndependent => independent::compute_independent,
            Calculation::ExactGeneralPloidy => general_ploidy::compute_general_ploidy,
        }
    }
}

impl fmt::Display for Calculation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Calculation {
    type Err = AfCalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "exact_reference" | "reference" => Ok(Calculation::ExactReference),
            "exact_independent" | "independent" => Ok(Calculation::ExactIndependent),
            "exact_general_ploidy" | "general_ploidy" | "general" => {
                Ok(Calculation::ExactGeneralPloidy)
            }
            other => Err(AfCalcError::invalid_parameter(format!(
                "unknown calculation '{other}'"
            ))),
        }
    }
}

/// A configured model instance for one site shape.
///
/// Instances are immutable and can be shared across threads; see
/// [`AfCalcFactory`] for cached construction.
#[derive(Debug)]
pub struct AfCalc {
    calculation: Calculation,
    n_samples: usize,
    ploidy: usize,
    max_alt_alleles: usize,
    config: AfCalcConfig,
    factorials: Log10Factorials,
}

impl AfCalc {
    /// Build a model instance for up to `n_samples` samples of `ploidy`,
    /// keeping at most `max_alt_alleles` alternate alleles per site.
    pub fn new(
        calculation: Calculation,
        n_samples: usize,
        ploidy: usize,
        max_alt_alleles: usize,
        config: AfCalcConfig,
    ) -> Result<Self, AfCalcError> {
        if n_samples == 0 {
            return Err(AfCalcError::invalid_parameter("n_samples must be > 0"));
        }
        if ploidy == 0 {
            return Err(AfCalcError::invalid_parameter("ploidy must be > 0"));
        }
        if !calculation.usable_for(ploidy, max_alt_alleles) {
            return Err(AfCalcError::UnsupportedMaxAltAlleles {
                calculation: calculation.name(),
                requested: max_alt_alleles,
                supported: calculation.max_supported_alt_alleles(),
            });
        }
        config.validate()?;

        Ok(Self {
            calculation,
            n_samples,
            ploidy,
            max_alt_alleles,
            config,
            factorials: Log10Factorials::new(ploidy * n_samples),
        })
    }

    /// The model this instance runs.
    pub fn calculation(&self) -> Calculation {
        self.calculation
    }

    /// Maximum number of samples per site.
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Ploidy every site must have.
    pub fn ploidy(&self) -> usize {
        self.ploidy
    }

    /// Cap on retained alternate alleles.
    pub fn max_alt_alleles(&self) -> usize {
        self.max_alt_alleles
    }

    /// Tunables in effect.
    pub fn config(&self) -> &AfCalcConfig {
        &self.config
    }

    /// Compute the allele-frequency posterior for one site.
    ///
    /// `priors` must cover `0..=ploidy * site.num_samples()`.
    pub fn compute(
        &self,
        site: &VariantSite,
        priors: &PriorTable,
    ) -> Result<AfCalcResult, AfCalcError> {
        if site.ploidy() != self.ploidy {
            return Err(AfCalcError::PloidyMismatch {
                site: site.ploidy(),
                model: self.ploidy,
            });
        }
        if site.num_samples() > self.n_samples {
            return Err(AfCalcError::TooManySamples {
                site: site.num_samples(),
                model: self.n_samples,
            });
        }
        let expected = site.num_chromosomes() + 1;
        if priors.len() != expected {
            return Err(AfCalcError::PriorLength {
                expected,
                actual: priors.len(),
            });
        }

        let prepared = PreparedSite::prepare(site, self.max_alt_alleles, &self.config)?;
        debug!(
            calculation = %self.calculation,
            samples = site.num_samples(),
            informative = prepared.samples.len(),
            alt_alleles = prepared.num_alt_alleles(),
            "computing allele-frequency posterior"
        );

        let num_alt = prepared.num_alt_alleles();
        let non_informative = prepared.log10_non_informative();
        if num_alt == 0 {
            return AfCalcResult::new(
                Vec::new(),
                prepared.alleles,
                [non_informative, f64::NEG_INFINITY],
                [0.0, f64::NEG_INFINITY],
                Vec::new(),
            );
        }
        if prepared.samples.is_empty() {
            let prior_split = [priors.log10_prior_of_af_eq0(), priors.log10_prior_of_af_gt0()];
            return assemble(
                &prepared,
                vec![0; num_alt],
                [0.0, 0.0],
                prior_split,
                vec![prior_split; num_alt],
            );
        }

        let log10_priors = priors.renormalized_prefix(prepared.num_chromosomes());
        (self.calculation.model())(&prepared, &log10_priors, &self.config, &self.factorials)
    }
}

/// Build the result for `site`, adding the non-informative samples' constant
/// to both likelihood components.
pub(crate) fn assemble(
    site: &PreparedSite,
    allele_counts_of_mle: Vec<u32>,
    log10_likelihoods: [f64; 2],
    log10_priors: [f64; 2],
    log10_allele_posteriors: Vec<[f64; 2]>,
) -> Result<AfCalcResult, AfCalcError> {
    let constant = site.log10_non_informative();
    AfCalcResult::new(
        allele_counts_of_mle,
        site.alleles.clone(),
        [log10_likelihoods[0] + constant, log10_likelihoods[1] + constant],
        log10_priors,
        log10_allele_posteriors,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{Allele, GenotypeLikelihoods};

    fn biallelic_site(samples: &[&[u32]]) -> VariantSite {
        VariantSite::new(
            vec![Allele::reference(b"A"), Allele::alternate(b"C")],
            2,
            samples.iter().map(|pls| GenotypeLikelihoods::from_pls(pls)).collect(),
        )
        .unwrap()
    }

    #[test]
    fn calculation_names_round_trip() {
        for calculation in Calculation::ALL {
            let parsed: Calculation = calculation.to_string().parse().unwrap();
            assert_eq!(parsed, calculation);
        }
        assert_eq!(
            "General-Ploidy".parse::<Calculation>().unwrap(),
            Calculation::ExactGeneralPloidy
        );
        assert!("fast".parse::<Calculation>().is_err());
    }

    #[test]
    fn reference_model_is_biallelic_only() {
        assert!(Calculation::ExactReference.usable_for(2, 1));
        assert!(!Calculation::ExactReference.usable_for(2, 2));
        assert!(Calculation::ExactGeneralPloidy.usable_for(3, 4));
        assert!(!Calculation::ExactIndependent.usable_for(2, 0));
        let err = AfCalc::new(Calculation::ExactReference, 3, 2, 2, AfCalcConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            AfCalcError::UnsupportedMaxAltAlleles {
                calculation: "exact_reference",
                requested: 2,
                supported: 1
            }
        );
    }

    #[test]
    fn default_model_depends_on_ploidy() {
        assert_eq!(Calculation::default_for(2), Calculation::ExactIndependent);
        assert_eq!(Calculation::default_for(1), Calculation::ExactGeneralPloidy);
        assert_eq!(Calculation::default_for(4), Calculation::ExactGeneralPloidy);
    }

    #[test]
    fn compute_rejects_shape_mismatches() {
        let calc = AfCalc::new(Calculation::ExactIndependent, 1, 2, 1, AfCalcConfig::default())
            .unwrap();
        let one = biallelic_site(&[&[0, 20, 20]]);
        let two = biallelic_site(&[&[0, 20, 20], &[0, 20, 20]]);

        let err = calc.compute(&two, &PriorTable::flat(2, 2).unwrap()).unwrap_err();
        assert!(matches!(err, AfCalcError::TooManySamples { site: 2, model: 1 }));

        let err = calc.compute(&one, &PriorTable::flat(2, 2).unwrap()).unwrap_err();
        assert_eq!(err, AfCalcError::PriorLength { expected: 3, actual: 5 });

        let haploid = AfCalc::new(Calculation::ExactIndependent, 1, 1, 1, AfCalcConfig::default())
            .unwrap();
        let err = haploid.compute(&one, &PriorTable::flat(2, 1).unwrap()).unwrap_err();
        assert!(matches!(err, AfCalcError::PloidyMismatch { site: 2, model: 1 }));
    }

    #[test]
    fn all_non_informative_reproduces_prior() {
        let site = biallelic_site(&[&[0, 0, 0], &[5, 5, 5]]);
        let priors = PriorTable::human(2, 2, 0.001).unwrap();
        for calculation in Calculation::ALL {
            let calc = AfCalc::new(calculation, 2, 2, 1, AfCalcConfig::default()).unwrap();
            let result = calc.compute(&site, &priors).unwrap();
            assert_eq!(result.allele_counts_of_mle(), &[0]);
            let eq0 = priors.log10_prior_of_af_eq0();
            assert!((result.log10_posterior_of_af_eq0() - eq0).abs() < 1e-9);
        }
    }

    #[test]
    fn reference_only_site_is_monomorphic() {
        let site = VariantSite::new(
            vec![Allele::reference(b"A")],
            2,
            vec![GenotypeLikelihoods::from_pls(&[0])],
        )
        .unwrap();
        let calc = AfCalc::new(Calculation::ExactGeneralPloidy, 1, 2, 2, AfCalcConfig::default())
            .unwrap();
        let result = calc.compute(&site, &PriorTable::flat(2, 1).unwrap()).unwrap();
        assert!(result.allele_counts_of_mle().is_empty());
        assert_eq!(result.log10_posterior_of_af_eq0(), 0.0);
        assert_eq!(result.log10_posterior_of_af_gt0(), f64::NEG_INFINITY);
    }
}
