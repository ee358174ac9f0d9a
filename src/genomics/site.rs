use std::collections::HashSet;
use std::sync::Arc;

use crate::genomics::genotypes::checked_genotype_count;
use crate::genomics::{Allele, GenotypeLayout, GenotypeLikelihoods};
use crate::AfCalcError;

/// Alleles and per-sample genotype likelihoods observed at one site.
///
/// Fully validated at construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantSite {
    alleles: Arc<[Allele]>,
    ploidy: usize,
    samples: Arc<[GenotypeLikelihoods]>,
}

impl VariantSite {
    /// Validate and assemble a site.
    ///
    /// `alleles` must start with the single reference allele, followed by
    /// distinct alternates in evidence order. Every sample must carry
    /// exactly `C(alleles + ploidy - 1, ploidy)` likelihoods.
    pub fn new(
        alleles: Vec<Allele>,
        ploidy: usize,
        samples: Vec<GenotypeLikelihoods>,
    ) -> Result<Self, AfCalcError> {
        let reference = alleles.first().ok_or(AfCalcError::EmptyAlleles)?;
        if !reference.is_reference() {
            return Err(AfCalcError::InvalidReference(format!(
                "first allele {reference} is not the reference"
            )));
        }
        if let Some(extra) = alleles[1..].iter().find(|a| a.is_reference()) {
            return Err(AfCalcError::InvalidReference(format!(
                "second reference allele {extra}"
            )));
        }
        let mut seen = HashSet::with_capacity(alleles.len());
        for allele in &alleles {
            if !seen.insert(allele.bases()) {
                return Err(AfCalcError::DuplicateAllele(allele.to_string()));
            }
        }
        if ploidy == 0 {
            return Err(AfCalcError::invalid_parameter("ploidy must be > 0"));
        }

        let expected = checked_genotype_count(alleles.len(), ploidy)?;
        for (sample, likelihoods) in samples.iter().enumerate() {
            if likelihoods.len() != expected {
                return Err(AfCalcError::LikelihoodLength {
                    sample,
                    num_alleles: alleles.len(),
                    ploidy,
                    expected,
                    actual: likelihoods.len(),
                });
            }
        }

        Ok(Self {
            alleles: alleles.into(),
            ploidy,
            samples: samples.into(),
        })
    }

    /// All alleles, reference first.
    pub fn alleles(&self) -> &[Allele] {
        &self.alleles
    }

    /// The reference allele.
    pub fn reference(&self) -> &Allele {
        &self.alleles[0]
    }

    /// Alternate alleles in input order.
    pub fn alternate_alleles(&self) -> &[Allele] {
        &self.alleles[1..]
    }

    /// Number of alleles including the reference.
    pub fn num_alleles(&self) -> usize {
        self.alleles.len()
    }

    /// Number of alternate alleles.
    pub fn num_alt_alleles(&self) -> usize {
        self.alleles.len() - 1
    }

    /// Copies per sample genotype.
    pub fn ploidy(&self) -> usize {
        self.ploidy
    }

    /// Per-sample likelihoods.
    pub fn samples(&self) -> &[GenotypeLikelihoods] {
        &self.samples
    }

    /// Number of samples.
    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Total chromosomes across samples (`ploidy * samples`).
    pub fn num_chromosomes(&self) -> usize {
        self.ploidy * self.samples.len()
    }

    /// Genotype enumeration shared by every sample.
    pub fn genotype_layout(&self) -> Result<GenotypeLayout, AfCalcError> {
        GenotypeLayout::new(self.num_alleles(), self.ploidy)
    }
}
