//! Python bindings that expose the allele-frequency calculator via PyO3.

use pyo3::{exceptions::PyValueError, prelude::*, types::PyModule};

use crate::genomics::{Allele, GenotypeLikelihoods, PriorTable, VariantSite};
use crate::{AfCalcConfig, AfCalcError, AfCalcFactory, Calculation};

fn to_py_err(err: AfCalcError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Python-facing entry point holding a shared model cache.
#[pyclass]
#[derive(Debug)]
pub struct PyAfCalcEngine {
    factory: AfCalcFactory,
}

#[pymethods]
impl PyAfCalcEngine {
    #[new]
    #[pyo3(signature = (cache_capacity = 16, pruning_margin = 10.0))]
    /// Create an engine with its own model cache.
    pub fn new(cache_capacity: usize, pruning_margin: f64) -> PyResult<Self> {
        let config = AfCalcConfig::default().with_pruning_margin(pruning_margin);
        config.validate().map_err(to_py_err)?;
        Ok(Self {
            factory: AfCalcFactory::new(cache_capacity, config),
        })
    }

    /// Names accepted by the `model` argument.
    pub fn list_models(&self) -> Vec<String> {
        Calculation::ALL.iter().map(|c| c.name().to_string()).collect()
    }

    /// Compute the AF posterior for one site.
    ///
    /// Args:
    ///     alleles: Allele bases, reference first.
    ///     pls: One list of Phred-scaled likelihoods per sample.
    ///     ploidy: Sample ploidy.
    ///     model: Calculation name; defaults to the best model for the ploidy.
    ///     heterozygosity: Human prior heterozygosity; `None` for a flat prior.
    ///     threshold: log10 odds threshold for polymorphism calls.
    ///
    /// Returns:
    ///     `(log10_posterior_af_eq0, log10_posterior_af_gt0, mle_counts, polymorphic)`,
    ///     the last two with one entry per input alternate allele.
    #[pyo3(signature = (alleles, pls, ploidy = 2, model = None, heterozygosity = Some(0.001), threshold = 0.0))]
    pub fn compute_pls(
        &self,
        alleles: Vec<String>,
        pls: Vec<Vec<u32>>,
        ploidy: usize,
        model: Option<&str>,
        heterozygosity: Option<f64>,
        threshold: f64,
    ) -> PyResult<(f64, f64, Vec<u32>, Vec<bool>)> {
        let alleles: Vec<Allele> = alleles
            .iter()
            .enumerate()
            .map(|(idx, bases)| Allele::new(bases, idx == 0))
            .collect();
        let samples = pls
            .iter()
            .map(|sample| GenotypeLikelihoods::from_pls(sample))
            .collect();
        let site = VariantSite::new(alleles, ploidy, samples).map_err(to_py_err)?;

        let calculation = match model {
            Some(name) => name.parse().map_err(to_py_err)?,
            None => Calculation::default_for(ploidy),
        };
        let priors = match heterozygosity {
            Some(theta) => {
                PriorTable::human(ploidy, site.num_samples(), theta).map_err(to_py_err)?
            }
            None => PriorTable::flat(ploidy, site.num_samples()).map_err(to_py_err)?,
        };

        let calc = self
            .factory
            .get(
                calculation,
                site.num_samples(),
                ploidy,
                site.num_alt_alleles().max(1),
            )
            .map_err(to_py_err)?;
        let result = calc.compute(&site, &priors).map_err(to_py_err)?;

        // Pruned alleles report count 0 and are never polymorphic.
        let alternates = site.alternate_alleles();
        let mle_counts = alternates
            .iter()
            .map(|allele| result.allele_count_at_mle(allele).unwrap_or(0))
            .collect();
        let polymorphic = alternates
            .iter()
            .map(|allele| result.is_polymorphic(allele, threshold))
            .collect();
        Ok((
            result.log10_posterior_of_af_eq0(),
            result.log10_posterior_of_af_gt0(),
            mle_counts,
            polymorphic,
        ))
    }
}

/// Create Python module.
#[pymodule]
pub fn afcalc_py(_py: Python<'_>, m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyAfCalcEngine>()?;
    Ok(())
}
