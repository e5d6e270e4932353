//! Sum-statistics linking of HSPs into chains.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/link_hsps.c (BLAST_LinkHsps)
//!
//! `link_hsps` links the HSPs found between the query set and one subject.
//! With `longest_intron <= 0` HSPs are chained by the even-gap DP; otherwise
//! each HSP first gets its individual e-value and the greedy uneven-gap
//! linker chains them allowing introns on the nucleotide sequence.
//!
//! On return every HSP carries its chain's `num`, `evalue` and `sumscore`,
//! and the slice is reordered so each chain is contiguous, head first.

mod arena;
pub mod compare;
mod connect;
mod even_gap;
pub mod sum_evalue;
mod uneven_gap;

use anyhow::Context;
use log::debug;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::blast_diagnostics::{LinkDiagnostics, LINK_DIAGNOSTICS};
use crate::core::blast_hits::{chains, hsp_list_get_evalues, Hsp, HspList};
use crate::core::blast_parameters::LinkHspParameters;
use crate::core::blast_query_info::QueryInfo;
use crate::core::blast_stat::ScoreBlock;
use crate::core::blast_util::BlastProgram;
use crate::error::Result;

pub use compare::{
    end_compare_hsps, fwd_compare_hsps, fwd_compare_hsps_transl, hsp_binary_search,
    rev_compare_hsps, rev_compare_hsps_tbn, rev_compare_hsps_tbx, rev_compare_hsps_transl,
    sumscore_compare_hsps,
};
pub use sum_evalue::{sum_hsp_evalue, SumEvaluator};

/// What one linking call produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkSummary {
    /// HSPs processed.
    pub hsps: usize,
    /// Chains, singletons included.
    pub chains: usize,
    /// HSPs in chains of two or more.
    pub linked_hsps: usize,
}

impl LinkSummary {
    fn of(hsps: &[Hsp]) -> Self {
        let mut summary = LinkSummary {
            hsps: hsps.len(),
            ..Default::default()
        };
        for chain in chains(hsps) {
            summary.chains += 1;
            if chain.len() > 1 {
                summary.linked_hsps += chain.len();
            }
        }
        summary
    }
}

/// Link the HSPs of one query/subject pair in place.
///
/// `subject_length` is in letters of the subject sequence (nucleotides for
/// tblastn and tblastx). `gapped` selects gapped Karlin blocks for
/// individual scores; sum e-values always prefer gapped blocks when present.
///
/// An empty slice is left alone. On error the slice may hold reset `num`
/// values but is never reordered.
#[allow(clippy::too_many_arguments)]
pub fn link_hsps(
    program: BlastProgram,
    hsps: &mut [Hsp],
    query_info: &QueryInfo,
    subject_length: i32,
    sbp: &ScoreBlock,
    params: &LinkHspParameters,
    gapped: bool,
) -> Result<LinkSummary> {
    params.validate()?;
    if hsps.is_empty() {
        return Ok(LinkSummary::default());
    }

    for hsp in hsps.iter_mut() {
        hsp.num = 0;
    }

    LinkDiagnostics::record(&LINK_DIAGNOSTICS.lists_linked, 1);
    LinkDiagnostics::record(&LINK_DIAGNOSTICS.hsps_seen, hsps.len());

    if params.uses_introns() {
        hsp_list_get_evalues(query_info, hsps, gapped, sbp, params.gap_decay_rate)?;
        uneven_gap::uneven_gap_link_hsps(program, hsps, query_info, subject_length, sbp, params)?;
    } else {
        even_gap::even_gap_link_hsps(program, hsps, query_info, subject_length, sbp, params, gapped)?;
    }

    let summary = LinkSummary::of(hsps);
    debug!(
        "{:?}: linked {} HSPs into {} chains ({} in linked sets)",
        program, summary.hsps, summary.chains, summary.linked_hsps
    );
    Ok(summary)
}

/// Link every list of a search, one subject per list.
///
/// Lists are independent; with the `parallel` feature they are linked on
/// the rayon thread pool. The first failure is returned with the subject
/// ordinal attached.
pub fn link_hsp_lists(
    program: BlastProgram,
    lists: &mut [HspList],
    query_info: &QueryInfo,
    sbp: &ScoreBlock,
    params: &LinkHspParameters,
    gapped: bool,
) -> anyhow::Result<Vec<LinkSummary>> {
    let link_one = |list: &mut HspList| -> anyhow::Result<LinkSummary> {
        let (oid, subject_length) = (list.oid, list.subject_length);
        link_hsps(
            program,
            &mut list.hsps,
            query_info,
            subject_length,
            sbp,
            params,
            gapped,
        )
        .with_context(|| format!("linking HSPs against subject {}", oid))
    };

    #[cfg(feature = "parallel")]
    let summaries = lists.par_iter_mut().map(link_one).collect();

    #[cfg(not(feature = "parallel"))]
    let summaries = lists.iter_mut().map(link_one).collect();

    LINK_DIAGNOSTICS.log_summary();
    summaries
}
