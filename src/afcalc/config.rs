//! Tunable parameters shared by every model.

use crate::AfCalcError;

/// Default pruning margin in log10 units (PL 100).
pub const DEFAULT_PRUNING_MARGIN: f64 = 10.0;
/// Default distance below the best posterior still treated as a tie.
pub const DEFAULT_MLE_TIE_TOLERANCE: f64 = 1e-10;
/// Default spread under which a sample's likelihoods count as flat.
pub const DEFAULT_NON_INFORMATIVE_TOLERANCE: f64 = 1e-10;

/// Configuration for allele-frequency calculation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AfCalcConfig {
    /// Alternate alleles whose best per-sample evidence falls more than
    /// this many log10 units below the strongest alternate are dropped
    /// before modeling.
    pub pruning_margin: f64,

    /// Posterior values within this many log10 units of the best are ties;
    /// ties resolve to the lowest allele count.
    pub mle_tie_tolerance: f64,

    /// A sample whose log10 likelihoods span no more than this is
    /// non-informative.
    pub non_informative_tolerance: f64,
}

impl Default for AfCalcConfig {
    fn default() -> Self {
        Self {
            pruning_margin: DEFAULT_PRUNING_MARGIN,
            mle_tie_tolerance: DEFAULT_MLE_TIE_TOLERANCE,
            non_informative_tolerance: DEFAULT_NON_INFORMATIVE_TOLERANCE,
        }
    }
}

impl AfCalcConfig {
    /// Set the pruning margin (`f64::INFINITY` disables margin pruning).
    pub fn with_pruning_margin(mut self, margin: f64) -> Self {
        self.pruning_margin = margin;
        self
    }

    /// Set the MLE tie tolerance.
    pub fn with_mle_tie_tolerance(mut self, tolerance: f64) -> Self {
        self.mle_tie_tolerance = tolerance;
        self
    }

    /// Set the non-informative tolerance.
    pub fn with_non_informative_tolerance(mut self, tolerance: f64) -> Self {
        self.non_informative_tolerance = tolerance;
        self
    }

    /// Reject negative or NaN tunables.
    pub fn validate(&self) -> Result<(), AfCalcError> {
        let fields = [
            ("pruning_margin", self.pruning_margin),
            ("mle_tie_tolerance", self.mle_tie_tolerance),
            ("non_informative_tolerance", self.non_informative_tolerance),
        ];
        for (name, value) in fields {
            if value.is_nan() || value < 0.0 {
                return Err(AfCalcError::invalid_parameter(format!(
                    "{name} must be >= 0, got {value}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(AfCalcConfig::default().validate().is_ok());
    }

    #[test]
    fn negative_values_rejected() {
        let config = AfCalcConfig::default().with_pruning_margin(-1.0);
        assert!(config.validate().is_err());
        let config = AfCalcConfig::default().with_mle_tie_tolerance(f64::NAN);
        assert!(config.validate().is_err());
    }

    #[test]
    fn infinite_margin_is_allowed() {
        let config = AfCalcConfig::default().with_pruning_margin(f64::INFINITY);
        assert!(config.validate().is_ok());
    }
}
