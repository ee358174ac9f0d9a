//! Scope reduction applied before any model runs.
//!
//! Drops non-informative samples, prunes weakly supported alternate
//! alleles, and re-indexes the surviving likelihoods onto the genotype
//! layout of the retained alleles.

use std::cmp::Ordering;

use bitvec::prelude::*;
use tracing::debug;

use crate::afcalc::AfCalcConfig;
use crate::algebra::log10_sum_exp2;
use crate::genomics::{Allele, GenotypeLayout, VariantSite};
use crate::AfCalcError;

/// A site reduced to the alleles and samples the dynamic programs use.
#[derive(Debug, Clone)]
pub(crate) struct PreparedSite {
    /// Retained alleles, reference first, input order preserved.
    pub alleles: Vec<Allele>,
    /// Genotype layout over the retained alleles.
    pub layout: GenotypeLayout,
    /// Informative samples, max-normalized, indexed by `layout`.
    pub samples: Vec<Vec<f64>>,
    /// Number of samples dropped as non-informative.
    pub num_non_informative: usize,
    pub ploidy: usize,
}

impl PreparedSite {
    pub fn prepare(
        site: &VariantSite,
        max_alt_alleles: usize,
        config: &AfCalcConfig,
    ) -> Result<Self, AfCalcError> {
        let original = site.genotype_layout()?;
        let tolerance = config.non_informative_tolerance;

        let informative: Vec<Vec<f64>> = site
            .samples()
            .iter()
            .filter(|gl| !gl.is_non_informative(tolerance))
            .map(|gl| gl.normalized())
            .collect();

        let retained = select_alleles(&original, &informative, max_alt_alleles, config);
        let alleles: Vec<Allele> = retained
            .iter()
            .map(|&idx| site.alleles()[idx].clone())
            .collect();
        let layout = GenotypeLayout::new(retained.len(), site.ploidy())?;

        let mut samples = Vec::with_capacity(informative.len());
        if retained.len() == site.num_alleles() {
            samples.extend(informative);
        } else {
            let to_original = original_indices(&layout, &original, &retained);
            for gl in &informative {
                let subset: Vec<f64> = to_original.iter().map(|&idx| gl[idx]).collect();
                let max = subset.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                samples.push(subset.into_iter().map(|v| v - max).collect());
            }
        }
        // Subsetting can flatten a sample that only discriminated pruned alleles.
        samples.retain(|gl: &Vec<f64>| {
            let min = gl.iter().copied().fold(f64::INFINITY, f64::min);
            let max = gl.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            max.is_finite() && max - min > tolerance
        });

        let num_non_informative = site.num_samples() - samples.len();
        debug!(
            alleles = site.num_alleles(),
            retained = alleles.len(),
            informative = samples.len(),
            non_informative = num_non_informative,
            "prepared site"
        );

        Ok(Self {
            alleles,
            layout,
            samples,
            num_non_informative,
            ploidy: site.ploidy(),
        })
    }

    /// Number of retained alternate alleles.
    pub fn num_alt_alleles(&self) -> usize {
        self.alleles.len() - 1
    }

    /// Chromosomes spanned by the informative samples.
    pub fn num_chromosomes(&self) -> usize {
        self.ploidy * self.samples.len()
    }

    /// Constant log10 contribution of the non-informative samples: each
    /// contributes `log10(1 / genotypes)`.
    pub fn log10_non_informative(&self) -> f64 {
        -(self.num_non_informative as f64) * (self.layout.len() as f64).log10()
    }

    /// Fold every allele except `allele` into the reference: per sample,
    /// the log10 likelihood of carrying `0..=ploidy` copies of `allele`,
    /// max-normalized.
    pub fn collapse_to_biallelic(&self, allele: usize) -> Vec<Vec<f64>> {
        self.samples
            .iter()
            .map(|gl| {
                let mut by_copies = vec![f64::NEG_INFINITY; self.ploidy + 1];
                for (idx, counts) in self.layout.iter() {
                    let copies = counts[allele] as usize;
                    by_copies[copies] = log10_sum_exp2(by_copies[copies], gl[idx]);
                }
                let max = by_copies.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                by_copies.into_iter().map(|v| v - max).collect()
            })
            .collect()
    }
}

/// Rank alternate alleles by their strongest per-sample evidence and keep
/// those within the pruning margin of the best, at most `max_alt_alleles`.
/// Returns original allele indices, reference first, in input order.
fn select_alleles(
    layout: &GenotypeLayout,
    samples: &[Vec<f64>],
    max_alt_alleles: usize,
    config: &AfCalcConfig,
) -> Vec<usize> {
    let num_alleles = layout.num_alleles();
    let mut scores = vec![f64::NEG_INFINITY; num_alleles];
    for gl in samples {
        for (idx, counts) in layout.iter() {
            for (allele, &copies) in counts.iter().enumerate().skip(1) {
                if copies > 0 && gl[idx] > scores[allele] {
                    scores[allele] = gl[idx];
                }
            }
        }
    }

    let best = scores[1..].iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let floor = best - config.pruning_margin;
    let mut ranked: Vec<usize> = (1..num_alleles)
        .filter(|&allele| scores[allele] >= floor || scores[allele] == best)
        .collect();
    ranked.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));
    ranked.truncate(max_alt_alleles);

    let mut keep = bitvec![0; num_alleles];
    keep.set(0, true);
    for allele in ranked {
        keep.set(allele, true);
    }
    let pruned: Vec<usize> = (1..num_alleles).filter(|&a| !keep[a]).collect();
    if !pruned.is_empty() {
        debug!(?pruned, best, margin = config.pruning_margin, "pruned alternate alleles");
    }
    keep.iter_ones().collect()
}

/// For every genotype of `reduced`, the index of the same genotype in the
/// `original` layout.
fn original_indices(
    reduced: &GenotypeLayout,
    original: &GenotypeLayout,
    retained: &[usize],
) -> Vec<usize> {
    let mut counts = vec![0u32; original.num_alleles()];
    reduced
        .iter()
        .map(|(_, reduced_counts)| {
            counts.iter_mut().for_each(|c| *c = 0);
            for (pos, &allele) in retained.iter().enumerate() {
                counts[allele] = reduced_counts[pos];
            }
            original
                .index_of(&counts)
                .unwrap_or_else(|| unreachable!("reduced genotype always exists in the original layout"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::GenotypeLikelihoods;

    fn triallelic(samples: &[&[u32]]) -> VariantSite {
        VariantSite::new(
            vec![
                Allele::reference(b"A"),
                Allele::alternate(b"C"),
                Allele::alternate(b"G"),
            ],
            2,
            samples
                .iter()
                .map(|pls| GenotypeLikelihoods::from_pls(pls))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn keeps_supported_alleles() {
        let site = triallelic(&[&[20, 0, 20, 20, 20, 20], &[20, 20, 20, 0, 20, 20]]);
        let prepared = PreparedSite::prepare(&site, 2, &AfCalcConfig::default()).unwrap();
        assert_eq!(prepared.alleles.len(), 3);
        assert_eq!(prepared.samples.len(), 2);
        assert_eq!(prepared.num_non_informative, 0);
    }

    #[test]
    fn prunes_alleles_beyond_margin() {
        // G is 1000 PL worse than C in every sample.
        let site = triallelic(&[&[20, 0, 20, 1000, 1000, 1000]]);
        let prepared = PreparedSite::prepare(&site, 2, &AfCalcConfig::default()).unwrap();
        assert_eq!(
            prepared.alleles,
            vec![Allele::reference(b"A"), Allele::alternate(b"C")]
        );
        assert_eq!(prepared.samples, vec![vec![-2.0, 0.0, -2.0]]);
    }

    #[test]
    fn caps_to_max_alt_alleles_by_score() {
        let site = triallelic(&[&[20, 10, 20, 0, 20, 20]]);
        // C scores -1.0 (best carrier A/C), G scores 0.0 (A/G): G wins the single slot.
        let prepared = PreparedSite::prepare(&site, 1, &AfCalcConfig::default()).unwrap();
        assert_eq!(
            prepared.alleles,
            vec![Allele::reference(b"A"), Allele::alternate(b"G")]
        );
        // A/A, A/G, G/G from the original vector
        assert_eq!(prepared.samples, vec![vec![-2.0, 0.0, -2.0]]);
    }

    #[test]
    fn non_informative_samples_are_dropped() {
        let site = triallelic(&[&[20, 0, 20, 20, 20, 20], &[0, 0, 0, 0, 0, 0]]);
        let prepared = PreparedSite::prepare(&site, 2, &AfCalcConfig::default()).unwrap();
        assert_eq!(prepared.samples.len(), 1);
        assert_eq!(prepared.num_non_informative, 1);
        assert!((prepared.log10_non_informative() + 6f64.log10()).abs() < 1e-12);
    }

    #[test]
    fn collapse_groups_by_copy_number() {
        let site = triallelic(&[&[10, 10, 10, 10, 0, 10]]);
        let prepared = PreparedSite::prepare(&site, 2, &AfCalcConfig::default()).unwrap();
        let collapsed = prepared.collapse_to_biallelic(1);
        // copies of C: 0 -> {A/A, A/G, G/G}, 1 -> {A/C, C/G}, 2 -> {C/C}
        let zero = (3.0 * 0.1f64).log10();
        let one = (0.1f64 + 1.0).log10();
        let two = -1.0;
        let expected = [zero - one, 0.0, two - one];
        for (got, want) in collapsed[0].iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }
}
