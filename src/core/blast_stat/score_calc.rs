//! Raw score to E-value conversion.
//!
//! Reference: blast_stat.c BLAST_KarlinStoE_simple

use super::karlin_params::KarlinParams;

/// Calculate E-value from raw score and search space (NCBI BLAST_KarlinStoE_simple compatible)
///
/// Formula: E = searchsp * exp(-(lambda * S - ln K))
pub fn evalue_from_raw_score(raw_score: i32, params: &KarlinParams, search_space: f64) -> f64 {
    if params.lambda < 0.0 || params.k < 0.0 {
        return -1.0;
    }
    search_space * ((-params.lambda * (raw_score as f64)) + params.log_k()).exp()
}
