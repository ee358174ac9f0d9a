use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::afcalc::{AfCalc, AfCalcConfig, Calculation};
use crate::AfCalcError;

/// Number of instances [`AfCalcFactory::default`] keeps.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

type CacheKey = (Calculation, usize, usize, usize);

#[derive(Debug, Default)]
struct InstanceCache {
    entries: HashMap<CacheKey, Arc<AfCalc>>,
    /// Least recently used at the front.
    order: VecDeque<CacheKey>,
}

impl InstanceCache {
    fn touch(&mut self, key: &CacheKey) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(*key);
    }
}

/// Builds and caches [`AfCalc`] instances keyed by
/// `(calculation, n_samples, ploidy, max_alt_alleles)`.
///
/// Safe to share across threads; cached instances are handed out as
/// `Arc`s and evicted least-recently-used once `capacity` is exceeded.
/// A capacity of zero disables caching.
#[derive(Debug)]
pub struct AfCalcFactory {
    capacity: usize,
    config: AfCalcConfig,
    cache: Mutex<InstanceCache>,
}

impl Default for AfCalcFactory {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, AfCalcConfig::default())
    }
}

impl AfCalcFactory {
    /// Create a factory whose instances all use `config`.
    pub fn new(capacity: usize, config: AfCalcConfig) -> Self {
        Self {
            capacity,
            config,
            cache: Mutex::new(InstanceCache::default()),
        }
    }

    /// Tunables passed to every instance.
    pub fn config(&self) -> &AfCalcConfig {
        &self.config
    }

    /// Maximum number of cached instances.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Build a fresh, uncached instance.
    pub fn create(
        &self,
        calculation: Calculation,
        n_samples: usize,
        ploidy: usize,
        max_alt_alleles: usize,
    ) -> Result<AfCalc, AfCalcError> {
        AfCalc::new(
            calculation,
            n_samples,
            ploidy,
            max_alt_alleles,
            self.config.clone(),
        )
    }

    /// Return the cached instance for this shape, building it on a miss.
    pub fn get(
        &self,
        calculation: Calculation,
        n_samples: usize,
        ploidy: usize,
        max_alt_alleles: usize,
    ) -> Result<Arc<AfCalc>, AfCalcError> {
        if self.capacity == 0 {
            return self
                .create(calculation, n_samples, ploidy, max_alt_alleles)
                .map(Arc::new);
        }

        let key = (calculation, n_samples, ploidy, max_alt_alleles);
        let mut cache = self.cache.lock();
        if let Some(calc) = cache.entries.get(&key).cloned() {
            cache.touch(&key);
            debug!(%calculation, n_samples, ploidy, max_alt_alleles, "afcalc cache hit");
            return Ok(calc);
        }

        let calc = Arc::new(self.create(calculation, n_samples, ploidy, max_alt_alleles)?);
        debug!(%calculation, n_samples, ploidy, max_alt_alleles, "afcalc cache miss");
        cache.entries.insert(key, Arc::clone(&calc));
        cache.touch(&key);
        while cache.entries.len() > self.capacity {
            match cache.order.pop_front() {
                Some(evicted) => {
                    cache.entries.remove(&evicted);
                    debug!(calculation = %evicted.0, n_samples = evicted.1, "afcalc cache evict");
                }
                None => break,
            }
        }
        Ok(calc)
    }

    /// Return an instance of the first calculation in `preferences` that
    /// supports the requested shape.
    pub fn create_first_usable(
        &self,
        preferences: &[Calculation],
        n_samples: usize,
        ploidy: usize,
        max_alt_alleles: usize,
    ) -> Result<Arc<AfCalc>, AfCalcError> {
        let calculation = preferences
            .iter()
            .copied()
            .find(|c| c.usable_for(ploidy, max_alt_alleles))
            .ok_or_else(|| {
                AfCalcError::invalid_parameter(format!(
                    "no calculation in {preferences:?} supports ploidy {ploidy} with {max_alt_alleles} alternate alleles"
                ))
            })?;
        self.get(calculation, n_samples, ploidy, max_alt_alleles)
    }

    /// Number of cached instances.
    pub fn len(&self) -> usize {
        self.cache.lock().entries.len()
    }

    /// Whether the cache holds no instances.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached instance.
    pub fn clear(&self) {
        let mut cache = self.cache.lock();
        cache.entries.clear();
        cache.order.clear();
    }
}
