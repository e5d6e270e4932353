//! BLAST Statistical Functions
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_stat.c
//!
//! Karlin-Altschul statistics used while linking HSPs:
//! - `karlin_params` - Karlin blocks per query context (KarlinParams, ScoreBlock)
//! - `score_calc` - raw score to E-value conversion
//! - `sum_statistics` - sum statistics for multi-HSP E-values

pub mod karlin_params;
pub mod score_calc;
pub mod sum_statistics;

pub use karlin_params::{KarlinParams, ScoreBlock};
pub use score_calc::evalue_from_raw_score;
pub use sum_statistics::{
    e_to_p, gap_decay_divisor, large_gap_sum_e, p_to_e, small_gap_sum_e, uneven_gap_sum_e,
    MAX_EVALUE,
};
