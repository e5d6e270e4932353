//! Karlin-Altschul statistical parameters.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_stat.c

use crate::error::{LinkError, Result};

/// Karlin-Altschul statistical parameters (NCBI `Blast_KarlinBlk`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KarlinParams {
    /// Lambda parameter for bit score calculation
    pub lambda: f64,
    /// K parameter for E-value calculation
    pub k: f64,
    /// H parameter (relative entropy), used for expected HSP length
    pub h: f64,
}

impl KarlinParams {
    pub fn new(lambda: f64, k: f64, h: f64) -> Self {
        Self { lambda, k, h }
    }

    /// Natural log of K.
    #[inline]
    pub fn log_k(&self) -> f64 {
        self.k.ln()
    }

    /// A block is usable when Lambda, K and H are all positive.
    pub fn is_valid(&self) -> bool {
        self.lambda > 0.0 && self.k > 0.0 && self.h > 0.0
    }
}

impl Default for KarlinParams {
    /// BLOSUM62 ungapped values.
    fn default() -> Self {
        Self {
            lambda: 0.3176,
            k: 0.134,
            h: 0.4012,
        }
    }
}

/// Per-context Karlin blocks (the subset of NCBI `BlastScoreBlk` that
/// linking reads).
///
/// A `None` entry marks a context with no valid statistics, e.g. a frame
/// too short to translate.
#[derive(Debug, Clone, Default)]
pub struct ScoreBlock {
    /// Ungapped Karlin blocks, one per query context.
    pub kbp: Vec<Option<KarlinParams>>,
    /// Gapped Karlin blocks, present only for gapped searches.
    pub kbp_gap: Option<Vec<Option<KarlinParams>>>,
    /// Score scale factor; raw scores are multiplied by this.
    pub scale_factor: f64,
}

impl ScoreBlock {
    /// Ungapped-only score block with the same parameters for every context.
    pub fn uniform(params: KarlinParams, num_contexts: usize) -> Self {
        Self {
            kbp: vec![Some(params); num_contexts],
            kbp_gap: None,
            scale_factor: 1.0,
        }
    }

    /// Attach gapped parameters for every context.
    pub fn with_gapped(mut self, params: KarlinParams) -> Self {
        self.kbp_gap = Some(vec![Some(params); self.kbp.len()]);
        self
    }

    /// Karlin block for `context`, gapped or ungapped as requested.
    ///
    /// Asking for gapped parameters when none exist is an error.
    pub fn karlin_block(&self, context: usize, gapped: bool) -> Result<&KarlinParams> {
        let blocks = if gapped {
            self.kbp_gap
                .as_ref()
                .ok_or(LinkError::MissingKarlinBlock { context })?
        } else {
            &self.kbp
        };
        blocks
            .get(context)
            .and_then(Option::as_ref)
            .ok_or(LinkError::MissingKarlinBlock { context })
    }

    /// Karlin block used for sum statistics: gapped when gapped blocks are
    /// present, otherwise ungapped.
    pub fn sum_stats_block(&self, context: usize) -> Result<&KarlinParams> {
        self.karlin_block(context, self.kbp_gap.is_some())
    }
}
