//! Greedy uneven-gap linking for searches with introns.
//!
//! Reference: link_hsps.c (Blast_UnevenGapLinkHSPs, AddHSPToLinkedSet)
//!
//! Starting from the best-scoring HSP not yet in a set, repeatedly attach
//! the neighbour that gives the lowest sum e-value, to the right of the
//! set's tail or to the left of its head. Neighbours may be up to
//! `gap_size` apart on the protein axis and `longest_intron` apart on the
//! nucleotide axis. When nothing improves the set, move on to the next
//! unlinked HSP.
//!
//! For blastx the query is the nucleotide sequence, so the linker works on
//! copies with query and subject swapped and contexts folded to their
//! query. The caller's HSPs keep their coordinates.

use std::ops::Range;

use log::{debug, trace};

use super::arena::LinkArena;
use super::compare::{end_compare_hsps, fwd_compare_hsps, hsp_binary_search, sumscore_compare_hsps};
use super::connect::connect_link_hsp_structs;
use super::sum_evalue::SumEvaluator;
use crate::core::blast_diagnostics::{LinkDiagnostics, LINK_DIAGNOSTICS};
use crate::core::blast_hits::Hsp;
use crate::core::blast_parameters::LinkHspParameters;
use crate::core::blast_query_info::QueryInfo;
use crate::core::blast_stat::ScoreBlock;
use crate::core::blast_util::{query_index_from_context, BlastProgram};
use crate::error::Result;

/// Best attachment found for the current set.
#[derive(Debug, Clone, Copy)]
struct Join {
    hsp: usize,
    sumscore: i32,
    evalue: f64,
    /// The new HSP goes before the set's head.
    reverse: bool,
}

/// Link `hsps` allowing introns, reordering them into chains.
///
/// Every HSP must carry its individual e-value.
pub(crate) fn uneven_gap_link_hsps(
    program: BlastProgram,
    hsps: &mut [Hsp],
    query_info: &QueryInfo,
    subject_length: i32,
    sbp: &ScoreBlock,
    params: &LinkHspParameters,
) -> Result<()> {
    let n = hsps.len();
    let mut arena = LinkArena::from_hsps(hsps, |h| {
        let mut view = h.clone();
        if program == BlastProgram::Blastx {
            std::mem::swap(&mut view.query, &mut view.subject);
            view.context = query_index_from_context(h.context, program);
        }
        view.num = 1;
        view.sumscore = 0;
        view
    })?;

    let evaluator = SumEvaluator {
        program,
        sbp,
        query_info,
        subject_length,
        params,
    };

    let mut score_order: Vec<usize> = (0..n).collect();
    let mut offsets = score_order.clone();
    let mut ends = score_order.clone();
    offsets.sort_by(|&a, &b| fwd_compare_hsps(&arena[a].hsp, &arena[b].hsp));
    ends.sort_by(|&a, &b| end_compare_hsps(&arena[a].hsp, &arena[b].hsp));
    score_order.sort_by(|&a, &b| sumscore_compare_hsps(&arena[a].hsp, &arena[b].hsp));

    let mut head: Option<usize> = None;
    let mut index = 0;
    while index < n {
        let h = match head {
            Some(h) => h,
            None => {
                while index < n && arena[score_order[index]].linked_set {
                    index += 1;
                }
                if index == n {
                    break;
                }
                score_order[index]
            }
        };

        let best = best_join(&arena, &evaluator, &offsets, &ends, h, params)?;
        match best {
            Some(join) => {
                head = Some(add_hsp_to_linked_set(&mut arena, h, join)?);
            }
            None => {
                head = None;
                index += 1;
            }
        }
    }

    let order = connect_link_hsp_structs(&mut arena)?;
    arena.write_back(&order, hsps)
}

/// Positions of `view` holding HSPs from `context`. Views are sorted by
/// context first.
fn context_range(arena: &LinkArena, view: &[usize], context: usize) -> Range<usize> {
    let start = view.partition_point(|&i| arena[i].hsp.context < context);
    let end = view.partition_point(|&i| arena[i].hsp.context <= context);
    start..end
}

/// The attachment to the set headed by `h` with the lowest sum e-value, if
/// any beats both the set and the candidate on their own.
fn best_join(
    arena: &LinkArena,
    evaluator: &SumEvaluator<'_>,
    offsets: &[usize],
    ends: &[usize],
    h: usize,
    params: &LinkHspParameters,
) -> Result<Option<Join>> {
    let gap_size = params.gap_size;
    let overlap_size = params.overlap_size;
    let longest_intron = params.longest_intron;

    let head = &arena[h];
    let mut best_evalue = head.hsp.evalue;
    let mut best: Option<Join> = None;

    let tail = if head.linked_set {
        arena.walk_next(h, (head.hsp.num - 1).max(0) as usize)?
    } else {
        h
    };
    let var = &arena[tail].hsp;

    // Right: HSPs starting within the window around the set's end.
    let candidates = &offsets[context_range(arena, offsets, head.hsp.context)];
    let mut i = hsp_binary_search(candidates, var.query.end - overlap_size, |&j| {
        arena[j].hsp.query.offset
    });
    while i < candidates.len() && arena[candidates[i]].hsp.query.offset <= var.query.end + gap_size
    {
        let l = candidates[i];
        i += 1;
        let lhsp = &arena[l];
        if l == tail || l == h || !lhsp.is_chain_head() {
            continue;
        }
        if lhsp.hsp.subject.strand() != var.subject.strand()
            || lhsp.hsp.subject.offset < var.subject.end - overlap_size
            || lhsp.hsp.subject.offset > var.subject.end + longest_intron
        {
            continue;
        }
        let (evalue, sumscore) = evaluator.evaluate(head.stat_context, &head.hsp, &lhsp.hsp)?;
        trace!("right candidate {} for set {}: evalue {:.3e}", l, h, evalue);
        if evalue < best_evalue.min(lhsp.hsp.evalue) {
            best = Some(Join {
                hsp: l,
                sumscore,
                evalue,
                reverse: false,
            });
            best_evalue = evalue;
        }
    }

    // Left: HSPs ending within the window around the set's start.
    let candidates = &ends[context_range(arena, ends, head.hsp.context)];
    let mut i = hsp_binary_search(candidates, head.hsp.query.offset - gap_size, |&j| {
        arena[j].hsp.query.end
    });
    while i < candidates.len()
        && arena[candidates[i]].hsp.query.end <= head.hsp.query.offset + overlap_size
    {
        let l = candidates[i];
        i += 1;
        let lhsp = &arena[l];
        if l == h
            || lhsp.hsp.subject.strand() != head.hsp.subject.strand()
            || lhsp.hsp.subject.end > head.hsp.subject.offset + overlap_size
            || lhsp.hsp.subject.end < head.hsp.subject.offset - longest_intron
        {
            continue;
        }
        // Only the tail of another set may precede this one.
        let left_head = if lhsp.linked_set {
            let (start, depth) = arena.walk_to_chain_start(l)?;
            if (depth as i32) < arena[start].hsp.num || start == h {
                continue;
            }
            start
        } else {
            l
        };
        let left = &arena[left_head];
        let (evalue, sumscore) = evaluator.evaluate(left.stat_context, &left.hsp, &head.hsp)?;
        trace!("left candidate {} for set {}: evalue {:.3e}", l, h, evalue);
        if evalue < left.hsp.evalue.min(best_evalue) {
            best = Some(Join {
                hsp: l,
                sumscore,
                evalue,
                reverse: true,
            });
            best_evalue = evalue;
        }
    }

    Ok(best)
}

/// Attach `join.hsp` to the set headed by `h` and return the set's head.
///
/// A forward join appends the new HSP (and any set it heads) after the
/// tail. A reverse join puts the set after the new HSP, whose own set head
/// becomes the head of the whole.
fn add_hsp_to_linked_set(arena: &mut LinkArena, h: usize, join: Join) -> Result<usize> {
    let new = join.hsp;
    let head = if !join.reverse {
        let tail = if arena[h].linked_set {
            arena.walk_next(h, (arena[h].hsp.num - 1).max(0) as usize)?
        } else {
            h
        };
        let head_node = &mut arena[h];
        head_node.start_of_chain = true;
        head_node.hsp.sumscore = join.sumscore;
        head_node.hsp.evalue = join.evalue;
        arena[new].start_of_chain = false;
        arena[tail].next = Some(new);
        arena[new].prev = Some(tail);
        arena[h].hsp.num += arena[new].hsp.num;
        LinkDiagnostics::record(&LINK_DIAGNOSTICS.joins_right, 1);
        h
    } else {
        arena[new].next = Some(h);
        arena[h].prev = Some(new);
        let start = if arena[new].linked_set {
            arena.walk_to_chain_start(new)?.0
        } else {
            new
        };
        let added = arena[h].hsp.num;
        let start_node = &mut arena[start];
        start_node.start_of_chain = true;
        start_node.hsp.sumscore = join.sumscore;
        start_node.hsp.evalue = join.evalue;
        start_node.hsp.num += added;
        arena[h].start_of_chain = false;
        LinkDiagnostics::record(&LINK_DIAGNOSTICS.joins_left, 1);
        start
    };
    arena[h].linked_set = true;
    arena[new].linked_set = true;

    debug!(
        "joined HSP {} {} set of {} HSPs (sumscore {}, evalue {:.3e})",
        new,
        if join.reverse { "before" } else { "after" },
        arena[head].hsp.num,
        join.sumscore,
        join.evalue
    );
    Ok(head)
}
