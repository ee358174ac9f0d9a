use crate::genomics::{Allele, GenotypeLayout, GenotypeLikelihoods, VariantSite};
use crate::AfCalcError;

const ALT_BASES: [&[u8]; 3] = [b"C", b"G", b"T"];

/// Build a site with known allele counts.
///
/// Alternate allele `i` is carried by `alt_counts[i]` samples, each with
/// exactly one copy (the rest reference); the remaining samples are
/// homozygous reference. Every sample's true genotype has PL 0 and all
/// others `non_type_pl`. `num_non_informative` all-zero-PL samples are
/// appended after the called ones.
pub fn synthetic_site(
    alt_counts: &[usize],
    num_samples: usize,
    num_non_informative: usize,
    non_type_pl: u32,
    ploidy: usize,
) -> Result<VariantSite, AfCalcError> {
    if ploidy == 0 {
        return Err(AfCalcError::invalid_parameter("ploidy must be > 0"));
    }
    let carriers: usize = alt_counts.iter().sum();
    if carriers > num_samples {
        return Err(AfCalcError::invalid_parameter(format!(
            "{carriers} carrier samples requested but only {num_samples} samples"
        )));
    }

    let alleles: Vec<Allele> = std::iter::once(Allele::reference(b"A"))
        .chain((0..alt_counts.len()).map(synthetic_alt))
        .collect();
    let layout = GenotypeLayout::new(alleles.len(), ploidy)?;

    let called = |alt: Option<usize>| {
        let mut counts = vec![0u32; alleles.len()];
        counts[0] = ploidy as u32;
        if let Some(alt) = alt {
            counts[0] -= 1;
            counts[alt + 1] += 1;
        }
        let truth = layout.index_of(&counts);
        let pls: Vec<u32> = (0..layout.len())
            .map(|idx| if Some(idx) == truth { 0 } else { non_type_pl })
            .collect();
        GenotypeLikelihoods::from_pls(&pls)
    };

    let mut samples = Vec::with_capacity(num_samples + num_non_informative);
    for (alt, &count) in alt_counts.iter().enumerate() {
        samples.extend(std::iter::repeat_with(|| called(Some(alt))).take(count));
    }
    samples.extend(std::iter::repeat_with(|| called(None)).take(num_samples - carriers));
    samples.extend(
        std::iter::repeat_with(|| GenotypeLikelihoods::from_pls(&vec![0; layout.len()]))
            .take(num_non_informative),
    );

    VariantSite::new(alleles, ploidy, samples)
}

fn synthetic_alt(idx: usize) -> Allele {
    match ALT_BASES.get(idx) {
        Some(bases) => Allele::alternate(bases),
        None => Allele::alternate(format!("<ALT{}>", idx + 1).as_bytes()),
    }
}
