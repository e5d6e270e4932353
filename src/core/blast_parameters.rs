//! HSP linking parameters and cutoff scores.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_parameters.c
//!
//! `LinkHspParameters` is the configuration for one search. Cutoffs depend
//! on the subject length, so `calculate_link_hsp_cutoffs` refreshes them
//! per subject before linking.

use log::debug;

use crate::core::blast_query_info::QueryInfo;
use crate::core::blast_stat::{KarlinParams, ScoreBlock};
use crate::core::blast_util::{BlastProgram, CODON_LENGTH};
use crate::core::ncbi_math::nint;
use crate::error::{LinkError, Result};

/// NCBI BLAST_GAP_PROB (ungapped search default)
pub const BLAST_GAP_PROB: f64 = 0.5;
/// NCBI BLAST_GAP_PROB_GAPPED
pub const BLAST_GAP_PROB_GAPPED: f64 = 1.0;
/// NCBI BLAST_GAP_DECAY_RATE (ungapped search default)
pub const BLAST_GAP_DECAY_RATE: f64 = 0.5;
/// NCBI BLAST_GAP_DECAY_RATE_GAPPED
pub const BLAST_GAP_DECAY_RATE_GAPPED: f64 = 0.1;
/// NCBI BLAST_GAP_SIZE: largest query gap between linked HSPs
pub const BLAST_GAP_SIZE: i32 = 40;
/// NCBI BLAST_OVERLAP_SIZE: largest overlap between linked HSPs
pub const BLAST_OVERLAP_SIZE: i32 = 9;

/// How the even-gap linker refreshes its chain sums between extractions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecomputePolicy {
    /// Reuse sums and predecessors that removals could not have changed.
    #[default]
    Incremental,
    /// Rebuild every chain sum from scratch after each extraction.
    Full,
}

/// Parameters for linking HSPs with sum statistics
/// (NCBI `BlastLinkHSPParameters`).
#[derive(Debug, Clone, PartialEq)]
pub struct LinkHspParameters {
    /// Prior probability that linked HSPs are separated by small gaps.
    pub gap_prob: f64,
    /// Decay rate for the multiple-testing penalty per additional HSP.
    pub gap_decay_rate: f64,
    /// Largest gap allowed between HSPs on the query.
    pub gap_size: i32,
    /// Largest overlap allowed between HSPs.
    pub overlap_size: i32,
    /// Largest subject gap (intron) in the uneven-gap linker; 0 selects the
    /// even-gap linker.
    pub longest_intron: i32,
    /// Score cutoff for small-gap chains; 0 disables small-gap linking.
    pub cutoff_small_gap: i32,
    /// Score cutoff for large-gap chains.
    pub cutoff_big_gap: i32,
    /// Even-gap recompute strategy.
    pub recompute: RecomputePolicy,
}

impl Default for LinkHspParameters {
    fn default() -> Self {
        Self {
            gap_prob: BLAST_GAP_PROB,
            gap_decay_rate: BLAST_GAP_DECAY_RATE,
            gap_size: BLAST_GAP_SIZE,
            overlap_size: BLAST_OVERLAP_SIZE,
            longest_intron: 0,
            cutoff_small_gap: 0,
            cutoff_big_gap: 0,
            recompute: RecomputePolicy::Incremental,
        }
    }
}

impl LinkHspParameters {
    /// NCBI defaults for a program.
    ///
    /// Gapped searches use a gap probability of 1 and the gapped decay rate.
    pub fn for_program(_program: BlastProgram, gapped: bool) -> Self {
        if gapped {
            Self {
                gap_prob: BLAST_GAP_PROB_GAPPED,
                gap_decay_rate: BLAST_GAP_DECAY_RATE_GAPPED,
                ..Self::default()
            }
        } else {
            Self::default()
        }
    }

    pub fn with_gap_prob(mut self, gap_prob: f64) -> Self {
        self.gap_prob = gap_prob;
        self
    }

    pub fn with_gap_decay_rate(mut self, rate: f64) -> Self {
        self.gap_decay_rate = rate;
        self
    }

    pub fn with_gap_size(mut self, gap_size: i32) -> Self {
        self.gap_size = gap_size;
        self
    }

    pub fn with_overlap_size(mut self, overlap_size: i32) -> Self {
        self.overlap_size = overlap_size;
        self
    }

    pub fn with_longest_intron(mut self, longest_intron: i32) -> Self {
        self.longest_intron = longest_intron;
        self
    }

    pub fn with_cutoffs(mut self, small_gap: i32, big_gap: i32) -> Self {
        self.cutoff_small_gap = small_gap;
        self.cutoff_big_gap = big_gap;
        self
    }

    pub fn with_recompute(mut self, policy: RecomputePolicy) -> Self {
        self.recompute = policy;
        self
    }

    /// Query window for even gaps: `gap_size + overlap_size + 1`.
    pub fn window_size(&self) -> i32 {
        self.gap_size + self.overlap_size + 1
    }

    /// Maximum trim applied to each end of an HSP before adjacency tests.
    pub fn trim_size(&self) -> i32 {
        (self.overlap_size + 1) / 2
    }

    /// True when the uneven-gap linker should be used.
    pub fn uses_introns(&self) -> bool {
        self.longest_intron > 0
    }

    /// Reject values the linkers cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.gap_prob) {
            return Err(LinkError::InvalidParameter(format!(
                "gap_prob {} is not in [0, 1]",
                self.gap_prob
            )));
        }
        if !(self.gap_decay_rate > 0.0 && self.gap_decay_rate < 1.0) {
            return Err(LinkError::InvalidParameter(format!(
                "gap_decay_rate {} is not in (0, 1)",
                self.gap_decay_rate
            )));
        }
        if self.gap_size < 0 || self.overlap_size < 0 {
            return Err(LinkError::InvalidParameter(format!(
                "gap_size {} and overlap_size {} must be non-negative",
                self.gap_size, self.overlap_size
            )));
        }
        if self.cutoff_small_gap < 0 || self.cutoff_big_gap < 0 {
            return Err(LinkError::InvalidParameter(format!(
                "cutoffs ({}, {}) must be non-negative",
                self.cutoff_small_gap, self.cutoff_big_gap
            )));
        }
        Ok(())
    }
}

/// Usable Karlin block with the smallest Lambda (NCBI s_BlastFindSmallestLambda).
pub fn find_smallest_lambda(blocks: &[Option<KarlinParams>]) -> Option<KarlinParams> {
    blocks
        .iter()
        .flatten()
        .filter(|p| p.is_valid())
        .min_by(|a, b| a.lambda.total_cmp(&b.lambda))
        .copied()
}

/// Subject-dependent inputs to [`calculate_link_hsp_cutoffs`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutoffInputs {
    /// Subject length in letters (nucleotides for translated subjects).
    pub subject_length: i32,
    /// Database length; 0 or less than the subject length for a
    /// single-subject search.
    pub db_length: i64,
    /// Smallest ungapped cutoff score across contexts.
    pub cutoff_score_min: i32,
}

/// Compute `cutoff_small_gap`, `cutoff_big_gap` and `gap_prob`
/// (NCBI CalculateLinkHSPCutoffs).
///
/// Cutoffs always come from the ungapped blocks, also for gapped searches.
/// Small search spaces cannot host small-gap chains, so the small-gap rule is
/// switched off by zeroing its cutoff and `gap_prob`.
pub fn calculate_link_hsp_cutoffs(
    program: BlastProgram,
    query_info: &QueryInfo,
    sbp: &ScoreBlock,
    inputs: CutoffInputs,
    params: &mut LinkHspParameters,
) -> Result<()> {
    const K_EPSILON: f64 = 1.0e-9;

    let kbp = find_smallest_lambda(&sbp.kbp)
        .ok_or(LinkError::MissingKarlinBlock { context: 0 })?;

    let window_size = params.window_size() as i64;
    let gap_prob = BLAST_GAP_PROB;
    params.gap_prob = gap_prob;
    let gap_decay_rate = params.gap_decay_rate;

    let mut query_length = query_info.avg_query_length() as i64;
    let mut subject_length = inputs.subject_length as i64;
    let mut db_length = inputs.db_length;
    if program.subject_is_translated() {
        subject_length /= CODON_LENGTH as i64;
        db_length /= CODON_LENGTH as i64;
    }

    // Subtract off the expected HSP length.
    let expected_length =
        nint((kbp.k * query_length as f64 * subject_length as f64).ln() / kbp.h);
    query_length = (query_length - expected_length).max(1);
    subject_length = (subject_length - expected_length).max(1);

    let y_variable = if db_length > subject_length {
        (db_length as f64 / subject_length as f64).ln() * kbp.k / gap_decay_rate
    } else {
        ((subject_length + expected_length) as f64 / subject_length as f64).ln() * kbp.k
            / gap_decay_rate
    };

    let search_sp = query_length * subject_length;
    let x_variable = 0.25 * y_variable * search_sp as f64;
    let window_sq = window_size * window_size;

    let (cutoff_small, cutoff_big) = if search_sp > 8 * window_sq {
        let big = ((x_variable / (1.0 - gap_prob + K_EPSILON)).ln() / kbp.lambda).floor() as i32 + 1;
        let x_small = y_variable * window_sq as f64 / (gap_prob + K_EPSILON);
        let small = inputs
            .cutoff_score_min
            .max((x_small.ln() / kbp.lambda).floor() as i32 + 1);
        (small, big)
    } else {
        let big = (x_variable.ln() / kbp.lambda).floor() as i32 + 1;
        params.gap_prob = 0.0;
        (0, big)
    };

    let scale = sbp.scale_factor.max(1.0) as i32;
    params.cutoff_small_gap = cutoff_small * scale;
    params.cutoff_big_gap = cutoff_big * scale;

    debug!(
        "link cutoffs: q_len={} s_len={} expected_len={} search_sp={} small={} big={} gap_prob={}",
        query_length,
        subject_length,
        expected_length,
        search_sp,
        params.cutoff_small_gap,
        params.cutoff_big_gap,
        params.gap_prob
    );
    Ok(())
}
