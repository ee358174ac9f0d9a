//! Counting helpers for genotype enumeration and allele-count weights.

/// Binomial coefficient `C(n, k)` in exact integer arithmetic.
///
/// Returns `Some(0)` when `k > n` and `None` when the value does not fit in
/// a `usize`. Intermediate products stay exact because each partial product
/// `C(n, i)` is itself an integer.
pub fn binomial(n: usize, k: usize) -> Option<usize> {
    if k > n {
        return Some(0);
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc.checked_mul((n - i) as u128)? / (i as u128 + 1);
    }
    usize::try_from(acc).ok()
}

/// Number of unordered genotypes of `ploidy` copies drawn from
/// `num_alleles` alleles: `C(num_alleles + ploidy - 1, ploidy)`.
///
/// `None` when the count overflows a `usize`.
pub fn genotype_count(num_alleles: usize, ploidy: usize) -> Option<usize> {
    if num_alleles == 0 {
        return Some(0);
    }
    binomial(num_alleles.checked_add(ploidy)? - 1, ploidy)
}

/// Table of `log10(n!)` for `0..=max`.
#[derive(Debug, Clone)]
pub struct Log10Factorials {
    table: Vec<f64>,
}

impl Log10Factorials {
    /// Precompute factorials up to and including `max`.
    pub fn new(max: usize) -> Self {
        let mut table = Vec::with_capacity(max + 1);
        table.push(0.0);
        let mut acc = 0.0;
        for n in 1..=max {
            acc += (n as f64).log10();
            table.push(acc);
        }
        Self { table }
    }

    /// Largest `n` covered by the table.
    pub fn max(&self) -> usize {
        self.table.len() - 1
    }

    /// `log10(n!)`; values past the table are computed on the fly.
    pub fn log10_factorial(&self, n: usize) -> f64 {
        match self.table.get(n) {
            Some(&v) => v,
            None => {
                let start = self.max();
                self.table[start]
                    + ((start + 1)..=n).map(|i| (i as f64).log10()).sum::<f64>()
            }
        }
    }

    /// `log10 C(n, k)`; `-inf` when `k > n`.
    pub fn log10_binomial(&self, n: usize, k: usize) -> f64 {
        if k > n {
            return f64::NEG_INFINITY;
        }
        self.log10_factorial(n) - self.log10_factorial(k) - self.log10_factorial(n - k)
    }

    /// `log10(total! / prod(counts_i!))` where `total = sum(counts)`.
    pub fn log10_multinomial(&self, counts: &[u32]) -> f64 {
        let total: usize = counts.iter().map(|&c| c as usize).sum();
        counts.iter().fold(self.log10_factorial(total), |acc, &c| {
            acc - self.log10_factorial(c as usize)
        })
    }
}
