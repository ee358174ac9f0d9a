use std::sync::Arc;

use crate::algebra::{binomial, genotype_count, pl_to_log10};
use crate::AfCalcError;

/// Canonical enumeration of the unordered genotypes of a given ploidy over
/// `num_alleles` alleles.
///
/// Genotypes follow the VCF order: a genotype whose sorted allele indices
/// are `a1 <= a2 <= ... <= ap` sits at index `sum_m C(a_m + m - 1, m)`
/// (1-based `m`). For ploidy 3 over three alleles:
///
/// | index | genotype | index | genotype |
/// |-------|----------|-------|----------|
/// | 0     | 0/0/0    | 5     | 0/1/2    |
/// | 1     | 0/0/1    | 6     | 1/1/2    |
/// | 2     | 0/1/1    | 7     | 0/2/2    |
/// | 3     | 1/1/1    | 8     | 1/2/2    |
/// | 4     | 0/0/2    | 9     | 2/2/2    |
///
/// Each genotype is stored as a per-allele copy-count vector.
#[derive(Debug, Clone, PartialEq)]
pub struct GenotypeLayout {
    num_alleles: usize,
    ploidy: usize,
    /// Flattened copy counts, `num_alleles` entries per genotype.
    counts: Vec<u32>,
    /// `log10(ploidy! / prod(count!))` per genotype.
    log10_combinations: Vec<f64>,
}

impl GenotypeLayout {
    /// Build the layout for `num_alleles` alleles at `ploidy`.
    ///
    /// Fails when the genotype count does not fit in memory indices.
    pub fn new(num_alleles: usize, ploidy: usize) -> Result<Self, AfCalcError> {
        let len = checked_genotype_count(num_alleles, ploidy)?;
        let copies = u32::try_from(ploidy).map_err(|_| shape_overflow(num_alleles, ploidy))?;
        let flat_len = len
            .checked_mul(num_alleles)
            .ok_or_else(|| shape_overflow(num_alleles, ploidy))?;
        let mut counts = vec![0u32; flat_len];
        let mut log10_combinations = vec![0.0; len];

        let mut current = vec![0u32; num_alleles];
        let mut emit = |genotype: &[u32]| -> Result<(), AfCalcError> {
            let idx = colex_index(genotype)
                .filter(|&idx| idx < len)
                .ok_or_else(|| shape_overflow(num_alleles, ploidy))?;
            counts[idx * num_alleles..(idx + 1) * num_alleles].copy_from_slice(genotype);
            log10_combinations[idx] = log10_combination_count(genotype);
            Ok(())
        };
        if num_alleles > 0 {
            enumerate_compositions(&mut current, 0, copies, &mut emit)?;
        }

        Ok(Self {
            num_alleles,
            ploidy,
            counts,
            log10_combinations,
        })
    }

    /// Number of genotypes.
    pub fn len(&self) -> usize {
        self.log10_combinations.len()
    }

    /// Whether the layout has no genotypes (zero alleles).
    pub fn is_empty(&self) -> bool {
        self.log10_combinations.is_empty()
    }

    /// Number of alleles the layout spans.
    pub fn num_alleles(&self) -> usize {
        self.num_alleles
    }

    /// Copies per genotype.
    pub fn ploidy(&self) -> usize {
        self.ploidy
    }

    /// Per-allele copy counts of the genotype at `index`.
    pub fn allele_counts(&self, index: usize) -> &[u32] {
        &self.counts[index * self.num_alleles..(index + 1) * self.num_alleles]
    }

    /// Number of distinct orderings of the genotype's copies, in log10.
    ///
    /// A diploid heterozygote has two (`log10 2`), a homozygote one.
    pub fn log10_combination_count(&self, index: usize) -> f64 {
        self.log10_combinations[index]
    }

    /// Index of the genotype with the given per-allele copy counts.
    pub fn index_of(&self, counts: &[u32]) -> Option<usize> {
        if counts.len() != self.num_alleles
            || counts.iter().map(|&c| c as usize).sum::<usize>() != self.ploidy
        {
            return None;
        }
        colex_index(counts)
    }

    /// Iterate `(index, copy counts)` in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[u32])> + '_ {
        (0..self.len()).map(move |idx| (idx, self.allele_counts(idx)))
    }
}

/// Genotype count for a site shape, as a configuration error when it
/// overflows.
pub(crate) fn checked_genotype_count(
    num_alleles: usize,
    ploidy: usize,
) -> Result<usize, AfCalcError> {
    genotype_count(num_alleles, ploidy).ok_or_else(|| shape_overflow(num_alleles, ploidy))
}

fn shape_overflow(num_alleles: usize, ploidy: usize) -> AfCalcError {
    AfCalcError::invalid_parameter(format!(
        "{num_alleles} alleles at ploidy {ploidy}: genotype count C({num_alleles} + {ploidy} - 1, {ploidy}) overflows"
    ))
}

fn enumerate_compositions<F>(
    current: &mut Vec<u32>,
    allele: usize,
    remaining: u32,
    emit: &mut F,
) -> Result<(), AfCalcError>
where
    F: FnMut(&[u32]) -> Result<(), AfCalcError>,
{
    if allele + 1 == current.len() {
        current[allele] = remaining;
        emit(current)?;
        current[allele] = 0;
        return Ok(());
    }
    for copies in 0..=remaining {
        current[allele] = copies;
        enumerate_compositions(current, allele + 1, remaining - copies, emit)?;
    }
    current[allele] = 0;
    Ok(())
}

fn colex_index(counts: &[u32]) -> Option<usize> {
    let mut index: usize = 0;
    let mut m = 1;
    for (allele, &copies) in counts.iter().enumerate() {
        for _ in 0..copies {
            index = index.checked_add(binomial(allele + m - 1, m)?)?;
            m += 1;
        }
    }
    Some(index)
}

fn log10_combination_count(counts: &[u32]) -> f64 {
    let log10_factorial = |n: u32| (1..=n).map(|i| (i as f64).log10()).sum::<f64>();
    let ploidy: u32 = counts.iter().sum();
    counts
        .iter()
        .fold(log10_factorial(ploidy), |acc, &c| acc - log10_factorial(c))
}

/// One sample's genotype likelihoods in log10 scale, indexed by
/// [`GenotypeLayout`] order.
///
/// Values are relative; they need not sum to one. `-inf` marks an
/// impossible genotype.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenotypeLikelihoods {
    log10: Arc<[f64]>,
}

impl GenotypeLikelihoods {
    /// Wrap log10 likelihoods, rejecting NaN, `+inf`, and all-impossible
    /// vectors.
    pub fn from_log10(values: Vec<f64>) -> Result<Self, AfCalcError> {
        if let Some(bad) = values.iter().find(|v| v.is_nan() || **v == f64::INFINITY) {
            return Err(AfCalcError::InvalidLikelihood(format!(
                "value {bad} is not a log10 probability"
            )));
        }
        if !values.iter().any(|v| v.is_finite()) {
            return Err(AfCalcError::InvalidLikelihood(
                "no genotype has a finite likelihood".to_string(),
            ));
        }
        Ok(Self {
            log10: values.into(),
        })
    }

    /// Build from Phred-scaled likelihoods (`log10 = -PL / 10`).
    pub fn from_pls(pls: &[u32]) -> Self {
        Self {
            log10: pls.iter().map(|&pl| pl_to_log10(pl)).collect(),
        }
    }

    /// Raw log10 values.
    pub fn as_log10(&self) -> &[f64] {
        &self.log10
    }

    /// Number of genotypes covered.
    pub fn len(&self) -> usize {
        self.log10.len()
    }

    /// Whether no likelihoods are present.
    pub fn is_empty(&self) -> bool {
        self.log10.is_empty()
    }

    /// Largest log10 likelihood.
    pub fn max(&self) -> f64 {
        self.log10.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Values shifted so that the most likely genotype is at 0.
    pub fn normalized(&self) -> Vec<f64> {
        let max = self.max();
        self.log10.iter().map(|&v| v - max).collect()
    }

    /// Whether every genotype is equally likely (within `tolerance`).
    pub fn is_non_informative(&self, tolerance: f64) -> bool {
        let min = self.log10.iter().copied().fold(f64::INFINITY, f64::min);
        self.max() - min <= tolerance
    }

    /// Convert back to Phred-scaled values relative to the best genotype.
    pub fn to_pls(&self) -> Vec<u32> {
        self.normalized()
            .into_iter()
            .map(|v| {
                if v == f64::NEG_INFINITY {
                    u32::MAX
                } else {
                    (-10.0 * v).round().min(u32::MAX as f64) as u32
                }
            })
            .collect()
    }
}
