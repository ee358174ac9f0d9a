//! Site-level genomic value types consumed by the allele-frequency models.
//!
//! Everything here is built by pure constructors that validate their input
//! and is immutable afterwards.

mod genotypes;
mod priors;
mod site;
mod synthetic;

pub use genotypes::{GenotypeLayout, GenotypeLikelihoods};
pub use priors::{PriorTable, PRIOR_NORMALIZATION_TOLERANCE};
pub use site::VariantSite;
pub use synthetic::synthetic_site;

use std::fmt;
use std::sync::Arc;

/// One allele at a site: a base sequence (or symbolic name such as
/// `<DEL>`) plus whether it is the reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Allele {
    bases: Arc<[u8]>,
    is_reference: bool,
}

impl Allele {
    /// Construct an allele; bases are stored uppercase.
    pub fn new(bases: impl AsRef<[u8]>, is_reference: bool) -> Self {
        Self {
            bases: bases.as_ref().to_ascii_uppercase().into(),
            is_reference,
        }
    }

    /// Reference allele with the given bases.
    pub fn reference(bases: impl AsRef<[u8]>) -> Self {
        Self::new(bases, true)
    }

    /// Alternate allele with the given bases.
    pub fn alternate(bases: impl AsRef<[u8]>) -> Self {
        Self::new(bases, false)
    }

    /// Allele bases (or symbolic name).
    pub fn bases(&self) -> &[u8] {
        &self.bases
    }

    /// Whether this is the reference allele.
    pub fn is_reference(&self) -> bool {
        self.is_reference
    }

    /// Whether the allele is symbolic (`<...>`) rather than literal bases.
    pub fn is_symbolic(&self) -> bool {
        self.bases.first() == Some(&b'<') && self.bases.last() == Some(&b'>')
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bases))?;
        if self.is_reference {
            write!(f, "*")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_and_alternate_differ() {
        let r = Allele::reference(b"A");
        let a = Allele::alternate(b"a");
        assert_ne!(r, a);
        assert_eq!(a.bases(), b"A");
        assert_eq!(r.to_string(), "A*");
        assert_eq!(a.to_string(), "A");
    }

    #[test]
    fn symbolic_alleles() {
        assert!(Allele::alternate(b"<DEL>").is_symbolic());
        assert!(!Allele::alternate(b"ACGT").is_symbolic());
    }
}
