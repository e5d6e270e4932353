//! Sum e-value of joining an HSP to a chain (NCBI `SumHSPEvalue`).

use crate::core::blast_diagnostics::{LinkDiagnostics, LINK_DIAGNOSTICS};
use crate::core::blast_hits::Hsp;
use crate::core::blast_parameters::LinkHspParameters;
use crate::core::blast_query_info::QueryInfo;
use crate::core::blast_stat::{gap_decay_divisor, uneven_gap_sum_e, ScoreBlock};
use crate::core::blast_util::{BlastProgram, CODON_LENGTH};
use crate::error::Result;

/// Read-only inputs shared by every evaluation against one subject.
#[derive(Clone, Copy)]
pub struct SumEvaluator<'a> {
    pub program: BlastProgram,
    pub sbp: &'a ScoreBlock,
    pub query_info: &'a QueryInfo,
    pub subject_length: i32,
    pub params: &'a LinkHspParameters,
}

impl<'a> SumEvaluator<'a> {
    /// E-value and combined raw score of `head`'s chain joined with `new`'s.
    ///
    /// Statistics come from `context`: its length adjustment, query length,
    /// effective search space and Karlin block (gapped when present).
    pub fn evaluate(&self, context: usize, head: &Hsp, new: &Hsp) -> Result<(f64, i32)> {
        LinkDiagnostics::record(&LINK_DIAGNOSTICS.sum_evalue_calls, 1);

        let ctx = self.query_info.context(context)?;
        let num = head.num + new.num;
        let length_adjustment = ctx.length_adjustment;

        let mut subject_eff_length = (self.subject_length - length_adjustment).max(1);
        if self.program == BlastProgram::Tblastn {
            subject_eff_length /= CODON_LENGTH;
        }
        let subject_eff_length = subject_eff_length.max(1);
        let query_eff_length = (ctx.query_length - length_adjustment).max(1);

        let sumscore = new.score.max(new.sumscore) + head.score.max(head.sumscore);

        let kbp = self.sbp.sum_stats_block(context)?;
        let score_prime = sumscore as f64 * kbp.lambda;

        let query_window_size = self.params.overlap_size + self.params.gap_size + 1;
        let subject_window_size = self.params.overlap_size + self.params.longest_intron + 1;

        let sum_evalue = uneven_gap_sum_e(
            kbp,
            query_window_size,
            subject_window_size,
            num,
            score_prime,
            query_eff_length,
            subject_eff_length,
            gap_decay_divisor(self.params.gap_decay_rate, num.max(0) as usize),
        );

        let eff_searchsp = subject_eff_length as f64 * query_eff_length as f64;
        Ok((sum_evalue * (ctx.eff_searchsp as f64 / eff_searchsp), sumscore))
    }
}

/// E-value and combined raw score of joining `new` to the chain headed by
/// `head`, using `head.context` for statistics.
#[allow(clippy::too_many_arguments)]
pub fn sum_hsp_evalue(
    program: BlastProgram,
    sbp: &ScoreBlock,
    query_info: &QueryInfo,
    subject_length: i32,
    params: &LinkHspParameters,
    head: &Hsp,
    new: &Hsp,
) -> Result<(f64, i32)> {
    SumEvaluator {
        program,
        sbp,
        query_info,
        subject_length,
        params,
    }
    .evaluate(head.context, head, new)
}
