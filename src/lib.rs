//! # Exact allele-frequency posterior calculation
//!
//! Given per-sample genotype likelihoods at one site and a prior over the
//! total alternate allele count, compute the posterior probability that
//! any alternate allele segregates (AF > 0) versus none (AF = 0), together
//! with the maximum a-posteriori allele count of every alternate allele.
//!
//! ## Models
//!
//! 1. **Exact reference**: one alternate allele, exact dynamic program
//! 2. **Exact independent**: every alternate allele solved as its own
//!    biallelic problem (others folded into the reference), then combined
//! 3. **Exact general ploidy**: joint dynamic program over all alternate
//!    alleles and any ploidy
//!
//! All three share one result type and one dispatch table, see
//! [`afcalc::Calculation`].
//!
//! ## Usage Example
//!
//! ```
//! use afcalc::{AfCalcFactory, Calculation};
//! use afcalc::genomics::{Allele, GenotypeLikelihoods, PriorTable, VariantSite};
//!
//! let site = VariantSite::new(
//!     vec![Allele::reference(b"A"), Allele::alternate(b"C")],
//!     2,
//!     vec![
//!         GenotypeLikelihoods::from_pls(&[0, 20, 20]),
//!         GenotypeLikelihoods::from_pls(&[20, 0, 20]),
//!     ],
//! )?;
//! let priors = PriorTable::flat(2, site.num_samples())?;
//!
//! let factory = AfCalcFactory::default();
//! let calc = factory.get(Calculation::ExactIndependent, site.num_samples(), 2, 1)?;
//! let result = calc.compute(&site, &priors)?;
//! assert_eq!(result.allele_counts_of_mle(), &[1]);
//! # Ok::<(), afcalc::AfCalcError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod algebra;    // Log10-space arithmetic and combinatorics
pub mod genomics;   // Alleles, genotype likelihoods, priors
pub mod afcalc;     // Allele-frequency models, results, factory
/// Python bindings for exposing the calculator to external runtimes.
#[cfg(feature = "python-bindings")]
pub mod python_bindings;

// Re-exports for convenience
pub use afcalc::{AfCalc, AfCalcConfig, AfCalcFactory, AfCalcResult, Calculation};

use thiserror::Error;

/// Errors reported by the calculator.
///
/// Every variant is a configuration error: the call site supplied data of
/// the wrong shape. Numerical degeneracies are handled internally and never
/// surface here.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AfCalcError {
    /// A site was constructed without any alleles.
    #[error("site has no alleles")]
    EmptyAlleles,

    /// The first allele must be the single reference allele.
    #[error("invalid reference allele layout: {0}")]
    InvalidReference(String),

    /// The same allele appears twice at one site.
    #[error("allele {0} listed more than once")]
    DuplicateAllele(String),

    /// Likelihood vector length does not match `(alleles, ploidy)`.
    #[error(
        "sample {sample}: expected {expected} genotype likelihoods for {num_alleles} alleles at ploidy {ploidy}, got {actual}"
    )]
    LikelihoodLength {
        /// Zero-based sample index.
        sample: usize,
        /// Number of alleles at the site.
        num_alleles: usize,
        /// Site ploidy.
        ploidy: usize,
        /// Required number of likelihoods.
        expected: usize,
        /// Number supplied.
        actual: usize,
    },

    /// A likelihood was NaN or `+inf`, or a sample had no finite value.
    #[error("invalid genotype likelihoods: {0}")]
    InvalidLikelihood(String),

    /// Prior vector length does not match `ploidy * samples + 1`.
    #[error("prior table has {actual} entries, expected {expected}")]
    PriorLength {
        /// Required number of entries.
        expected: usize,
        /// Number supplied.
        actual: usize,
    },

    /// Prior vector does not sum to one in probability space.
    #[error("prior table sums to 10^{log10_total} instead of 1")]
    PriorNotNormalized {
        /// `log10` of the total probability mass.
        log10_total: f64,
    },

    /// Model was requested for more alternate alleles than it supports.
    #[error("{calculation} supports at most {supported} alternate alleles, requested {requested}")]
    UnsupportedMaxAltAlleles {
        /// Name of the selected model.
        calculation: &'static str,
        /// Requested maximum.
        requested: usize,
        /// Supported maximum.
        supported: usize,
    },

    /// Site ploidy differs from the model's ploidy.
    #[error("site ploidy {site} does not match model ploidy {model}")]
    PloidyMismatch {
        /// Ploidy of the site.
        site: usize,
        /// Ploidy the model was built for.
        model: usize,
    },

    /// Site carries more samples than the model was sized for.
    #[error("site has {site} samples but model was built for {model}")]
    TooManySamples {
        /// Samples at the site.
        site: usize,
        /// Samples the model supports.
        model: usize,
    },

    /// Any other out-of-range parameter.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl AfCalcError {
    /// Helper for constructing parameter errors.
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        AfCalcError::InvalidParameter(msg.into())
    }
}
