//! Arithmetic on probabilities stored as log10 values.
//!
//! All routines treat `-inf` as probability zero. Summing any number of
//! zero terms yields `-inf`, never NaN.

/// `log10(10^a + 10^b)` without leaving log space.
#[inline]
pub fn log10_sum_exp2(a: f64, b: f64) -> f64 {
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    if hi == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if lo == f64::NEG_INFINITY {
        return hi;
    }
    hi + (1.0 + 10f64.powf(lo - hi)).log10()
}

/// `log10(sum(10^v))` over a slice.
pub fn log10_sum_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    let sum: f64 = values.iter().map(|&v| 10f64.powf(v - max)).sum();
    max + sum.log10()
}

/// `log10(1 - 10^x)` for `x <= 0`.
///
/// Uses `ln_1p` when `10^x` is small and `exp_m1` when it is close to one so
/// that neither tail loses precision.
pub fn log10_one_minus_pow10(x: f64) -> f64 {
    if x >= 0.0 {
        return f64::NEG_INFINITY;
    }
    if x == f64::NEG_INFINITY {
        return 0.0;
    }
    let ln = x * std::f64::consts::LN_10;
    if ln > -std::f64::consts::LN_2 {
        (-ln.exp_m1()).log10()
    } else {
        (-ln.exp()).ln_1p() / std::f64::consts::LN_10
    }
}

/// Shift log10 values so that they sum to one in probability space.
///
/// A vector whose entries are all `-inf` is returned unchanged.
pub fn normalize_from_log10(values: &[f64]) -> Vec<f64> {
    let total = log10_sum_exp(values);
    if total == f64::NEG_INFINITY {
        return values.to_vec();
    }
    values.iter().map(|&v| v - total).collect()
}

/// Normalize a two-hypothesis pair (`[eq0, gt0]`) in log10 space.
pub fn normalize_pair(pair: [f64; 2]) -> [f64; 2] {
    let total = log10_sum_exp2(pair[0], pair[1]);
    if total == f64::NEG_INFINITY {
        return pair;
    }
    [pair[0] - total, pair[1] - total]
}

/// Convert a Phred-scaled likelihood to log10 scale.
#[inline]
pub fn pl_to_log10(pl: u32) -> f64 {
    -(pl as f64) / 10.0
}

/// Index of the largest value; among values within `tolerance` of the
/// maximum the lowest index wins.
pub fn first_max_index(values: &[f64], tolerance: f64) -> Option<usize> {
    let max = values
        .iter()
        .copied()
        .filter(|v| !v.is_nan())
        .fold(f64::NEG_INFINITY, f64::max);
    if values.is_empty() {
        return None;
    }
    values.iter().position(|&v| v >= max - tolerance)
}
