//! Numeric primitives shared by every allele-frequency model.
//!
//! - Log10-space sums, complements and normalization
//! - Exact binomials and log10 factorial tables for genotype weights

mod combinatorics;
mod log_space;

pub use combinatorics::{binomial, genotype_count, Log10Factorials};
pub use log_space::{
    first_max_index, log10_one_minus_pow10, log10_sum_exp, log10_sum_exp2,
    normalize_from_log10, normalize_pair, pl_to_log10,
};
