//! Even-gap sum-statistics linking.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/link_hsps.c
//! (Blast_EvenGapLinkHSPs)
//!
//! HSPs are split into frame groups: one query strand (all three frames of
//! it for translated queries) against one subject strand. Within a group, a
//! DP over the reverse-sorted active list finds the best chain for small
//! gaps and for large gaps. The chain with the smaller sum e-value is
//! committed and unlinked from the list, and the DP repeats on what is left.
//!
//! Removing a chain can only lower the sums of the HSPs that remain, so
//! `RecomputePolicy::Incremental` reuses predecessors and best chains that
//! no removal touched. `RecomputePolicy::Full` rebuilds every pass.

use std::ops::Range;

use log::{debug, trace};

use super::arena::{LinkArena, LINKED_TO_REMOVED};
use super::compare::{
    fwd_compare_hsps, fwd_compare_hsps_transl, rev_compare_hsps, rev_compare_hsps_tbn,
    rev_compare_hsps_tbx, rev_compare_hsps_transl,
};
use super::connect::hook_up_even_gap_chains;
use crate::core::blast_diagnostics::{LinkDiagnostics, LINK_DIAGNOSTICS};
use crate::core::blast_hits::{Hsp, LinkOrderingMethod};
use crate::core::blast_parameters::{LinkHspParameters, RecomputePolicy};
use crate::core::blast_query_info::QueryInfo;
use crate::core::blast_stat::{
    gap_decay_divisor, large_gap_sum_e, small_gap_sum_e, KarlinParams, ScoreBlock, MAX_EVALUE,
};
use crate::core::blast_util::{BlastProgram, CODON_LENGTH};
use crate::error::{LinkError, Result};

const SMALL_GAPS: usize = 0;
const LARGE_GAPS: usize = 1;

/// lh_helper entry: the hot fields of one active HSP, in list order.
///
/// Entries 0 and 1 are zero-sum sentinels; entry `i >= 2` mirrors the
/// `(i - 2)`th active HSP.
#[derive(Debug, Clone, Copy, Default)]
struct LhHelper {
    ptr: Option<usize>,
    q_off_trim: i32,
    s_off_trim: i32,
    sum: [i32; 2],
    /// Closest earlier entry with a larger large-gap sum.
    next_larger: usize,
}

/// Lengths and statistics of one frame group, taken from its first HSP.
struct GroupStats<'a> {
    query_context: usize,
    query_length: i32,
    subject_length: i32,
    eff_searchsp: f64,
    kbp: &'a KarlinParams,
}

/// Link `hsps` with even gaps and reorder them into chains.
#[allow(clippy::too_many_arguments)]
pub(crate) fn even_gap_link_hsps(
    program: BlastProgram,
    hsps: &mut [Hsp],
    query_info: &QueryInfo,
    subject_length: i32,
    sbp: &ScoreBlock,
    params: &LinkHspParameters,
    gapped: bool,
) -> Result<()> {
    let n = hsps.len();
    let mut arena = LinkArena::from_hsps(hsps, Hsp::clone)?;
    let translated_query = program.is_translated_query();

    // Lambda-scaled score of each HSP, from its own context.
    let mut xscore = Vec::with_capacity(n);
    for node in arena.iter() {
        let kbp = sbp.karlin_block(node.hsp.context, gapped)?;
        xscore.push(node.hsp.score as f64 * kbp.lambda);
    }

    let mut order: Vec<usize> = (0..n).collect();
    if translated_query {
        order.sort_by(|&a, &b| rev_compare_hsps_tbx(&arena[a].hsp, &arena[b].hsp));
    } else {
        order.sort_by(|&a, &b| rev_compare_hsps_tbn(&arena[a].hsp, &arena[b].hsp));
    }

    trim_hsps(&mut arena, params.trim_size());

    let groups = frame_groups(&arena, &order, program.strand_factor());
    LinkDiagnostics::record(&LINK_DIAGNOSTICS.frame_groups, groups.len());

    let mut helpers: Vec<LhHelper> = Vec::new();
    helpers
        .try_reserve_exact(n + 2)
        .map_err(|_| LinkError::Allocation { requested: n + 2 })?;

    for range in groups {
        let members = &order[range];
        let stats = group_stats(program, &arena, members, query_info, subject_length, sbp, gapped)?;
        let mut linker = GroupLinker::new(&mut arena, &mut helpers, &xscore, params, stats);
        linker.link(members)?;
    }

    let mut sorted: Vec<usize> = (0..n).collect();
    if translated_query {
        sorted.sort_by(|&a, &b| rev_compare_hsps_transl(&arena[a].hsp, &arena[b].hsp));
        sorted.sort_by(|&a, &b| fwd_compare_hsps_transl(&arena[a].hsp, &arena[b].hsp));
    } else {
        sorted.sort_by(|&a, &b| rev_compare_hsps(&arena[a].hsp, &arena[b].hsp));
        sorted.sort_by(|&a, &b| fwd_compare_hsps(&arena[a].hsp, &arena[b].hsp));
    }

    let final_order = hook_up_even_gap_chains(&mut arena, &sorted)?;
    arena.write_back(&final_order, hsps)
}

/// Trimmed coordinates tolerate overlaps of up to `trim_size` per end.
fn trim_hsps(arena: &mut LinkArena, trim_size: i32) {
    for node in arena.iter_mut() {
        let q_trim = (node.hsp.query.length() / 4).min(trim_size);
        let s_trim = (node.hsp.subject.length() / 4).min(trim_size);
        node.q_offset_trim = node.hsp.query.offset + q_trim;
        node.q_end_trim = node.hsp.query.end - q_trim;
        node.s_offset_trim = node.hsp.subject.offset + s_trim;
        node.s_end_trim = node.hsp.subject.end - s_trim;
    }
}

/// Split reverse-sorted `order` wherever the query strand group or the
/// subject strand changes.
fn frame_groups(arena: &LinkArena, order: &[usize], strand_factor: usize) -> Vec<Range<usize>> {
    let mut groups = Vec::new();
    let mut start = 0;
    for pos in 1..order.len() {
        let prev = &arena[order[pos - 1]].hsp;
        let cur = &arena[order[pos]].hsp;
        if cur.context / strand_factor != prev.context / strand_factor
            || cur.subject.strand() != prev.subject.strand()
        {
            groups.push(start..pos);
            start = pos;
        }
    }
    if start < order.len() {
        groups.push(start..order.len());
    }
    groups
}

#[allow(clippy::too_many_arguments)]
fn group_stats<'a>(
    program: BlastProgram,
    arena: &LinkArena,
    members: &[usize],
    query_info: &QueryInfo,
    subject_length: i32,
    sbp: &'a ScoreBlock,
    gapped: bool,
) -> Result<GroupStats<'a>> {
    let query_context = arena[members[0]].hsp.context;
    let ctx = query_info.context(query_context)?;
    let mut length_adjustment = ctx.length_adjustment;
    let query_length = (ctx.query_length - length_adjustment).max(1);

    // Subject lengths are in nucleotides for translated subjects.
    let mut subject_length = subject_length;
    if program.subject_is_translated() {
        length_adjustment /= CODON_LENGTH;
        subject_length /= CODON_LENGTH;
    }
    let subject_length = (subject_length - length_adjustment).max(1);

    Ok(GroupStats {
        query_context,
        query_length,
        subject_length,
        eff_searchsp: ctx.eff_searchsp as f64,
        kbp: sbp.karlin_block(query_context, gapped)?,
    })
}

/// DP state for one frame group.
struct GroupLinker<'a> {
    arena: &'a mut LinkArena,
    helpers: &'a mut Vec<LhHelper>,
    xscore: &'a [f64],
    params: &'a LinkHspParameters,
    stats: GroupStats<'a>,
    cutoff: [i32; 2],
    ignore_small_gaps: bool,
    window_size: i32,
    trim_size: i32,
    active_head: Option<usize>,
    remaining: usize,
    first_pass: bool,
    /// A removed HSP was a predecessor of a surviving one.
    path_changed: bool,
}

impl<'a> GroupLinker<'a> {
    fn new(
        arena: &'a mut LinkArena,
        helpers: &'a mut Vec<LhHelper>,
        xscore: &'a [f64],
        params: &'a LinkHspParameters,
        stats: GroupStats<'a>,
    ) -> Self {
        Self {
            arena,
            helpers,
            xscore,
            params,
            stats,
            cutoff: [params.cutoff_small_gap, params.cutoff_big_gap],
            ignore_small_gaps: params.cutoff_small_gap == 0,
            window_size: params.window_size(),
            trim_size: params.trim_size(),
            active_head: None,
            remaining: 0,
            first_pass: true,
            path_changed: true,
        }
    }

    /// A pass that may not rely on anything computed earlier.
    #[inline]
    fn fresh(&self) -> bool {
        self.first_pass || self.params.recompute == RecomputePolicy::Full
    }

    fn link(&mut self, members: &[usize]) -> Result<()> {
        for (pos, &idx) in members.iter().enumerate() {
            let node = &mut self.arena[idx];
            node.prev = pos.checked_sub(1).map(|p| members[p]);
            node.next = members.get(pos + 1).copied();
            node.start_of_chain = false;
            node.hsp_link = Default::default();
            node.hsp_link.changed = true;
        }
        self.active_head = members.first().copied();
        self.remaining = members.len();

        while self.remaining > 0 {
            let best = self.find_best_chains()?;
            let (method, evalue) = self.select_ordering(&best)?;
            let head = best[method.index()].ok_or(LinkError::NoChainHead {
                remaining: self.remaining,
            })?;
            self.commit_chain(head, method, evalue)?;
        }
        Ok(())
    }

    /// Best chain head per ordering method, from cached sums when no
    /// removal could have changed them, otherwise from a DP pass.
    fn find_best_chains(&mut self) -> Result<[Option<usize>; 2]> {
        if !self.fresh() {
            let best = self.current_maxima();
            let use_current_max = !self.path_changed
                || ((self.ignore_small_gaps || !self.chain_has_removed(best[SMALL_GAPS], SMALL_GAPS)?)
                    && !self.chain_has_removed(best[LARGE_GAPS], LARGE_GAPS)?);
            if use_current_max {
                LinkDiagnostics::record(&LINK_DIAGNOSTICS.cached_selections, 1);
                return Ok(best);
            }
        }

        let len = self.rebuild_helpers();
        let mut best = [None, None];
        if !self.ignore_small_gaps {
            self.small_gap_pass(len, &mut best);
        }
        self.large_gap_pass(len, &mut best);
        self.path_changed = false;
        self.first_pass = false;
        LinkDiagnostics::record(&LINK_DIAGNOSTICS.full_passes, 1);
        Ok(best)
    }

    /// Last active HSP holding the maximum stored sum, per method.
    fn current_maxima(&self) -> [Option<usize>; 2] {
        let mut best = [None, None];
        let mut max = [i32::MIN; 2];
        let mut cur = self.active_head;
        while let Some(h) = cur {
            let link = &self.arena[h].hsp_link;
            for method in [SMALL_GAPS, LARGE_GAPS] {
                if method == SMALL_GAPS && self.ignore_small_gaps {
                    continue;
                }
                if link.sum[method] >= max[method] {
                    max[method] = link.sum[method];
                    best[method] = Some(h);
                }
            }
            cur = self.arena[h].next;
        }
        best
    }

    fn chain_has_removed(&self, start: Option<usize>, method: usize) -> Result<bool> {
        let mut cur = start;
        let mut steps = 0;
        while let Some(h) = cur {
            if self.arena[h].is_removed() {
                return Ok(true);
            }
            steps += 1;
            if steps > self.arena.len() {
                return Err(LinkError::CorruptChain {
                    node: h,
                    detail: "link chain loops",
                });
            }
            cur = self.arena[h].hsp_link.link[method];
        }
        Ok(false)
    }

    /// Copy the active list into `helpers` and reset `linked_to`.
    /// Returns the number of helper entries in use.
    fn rebuild_helpers(&mut self) -> usize {
        self.helpers.clear();
        self.helpers.push(LhHelper::default());
        self.helpers.push(LhHelper::default());
        let mut cur = self.active_head;
        while let Some(h) = cur {
            let node = &mut self.arena[h];
            node.linked_to = 0;
            cur = node.next;
            let entry = LhHelper {
                ptr: Some(h),
                q_off_trim: node.q_offset_trim,
                s_off_trim: node.s_offset_trim,
                sum: node.hsp_link.sum,
                next_larger: 0,
            };
            let index = self.helpers.len();
            self.helpers.push(entry);
            self.helpers[index].next_larger = self.next_larger_for(index);
        }
        self.helpers.len()
    }

    /// Closest earlier entry whose large-gap sum exceeds entry `index`'s.
    fn next_larger_for(&self, index: usize) -> usize {
        let cur_sum = self.helpers[index].sum[LARGE_GAPS];
        let mut prev = index - 1;
        let mut prev_sum = self.helpers[prev].sum[LARGE_GAPS];
        while cur_sum >= prev_sum && prev > 0 {
            prev = self.helpers[prev].next_larger;
            prev_sum = self.helpers[prev].sum[LARGE_GAPS];
        }
        prev
    }

    /// Small gaps: predecessors must start within `window_size` of the end
    /// of H on both sequences.
    fn small_gap_pass(&mut self, len: usize, best: &mut [Option<usize>; 2]) {
        let cutoff = self.cutoff[SMALL_GAPS];
        let mut maxscore = i32::MIN;
        for h_index in 2..len {
            let Some(h) = self.helpers[h_index].ptr else {
                continue;
            };
            let mut chosen = Predecessor::default();
            if self.arena[h].hsp.score > cutoff {
                let qe = self.arena[h].q_end_trim;
                let se = self.arena[h].s_end_trim;
                let qe_gap = qe + self.window_size;
                let se_gap = se + self.window_size;
                for h2_index in (2..h_index).rev() {
                    let helper = self.helpers[h2_index];
                    let q_off_t = helper.q_off_trim;
                    let s_off_t = helper.s_off_trim;
                    // Offsets only grow further back; trimming moves them by
                    // at most trim_size.
                    if q_off_t > qe_gap + self.trim_size {
                        break;
                    }
                    if q_off_t <= qe || s_off_t <= se || q_off_t > qe_gap || s_off_t > se_gap {
                        continue;
                    }
                    if helper.sum[SMALL_GAPS] > chosen.sum {
                        if let Some(h2) = helper.ptr {
                            chosen = Predecessor::of(self.arena, h2, SMALL_GAPS);
                        }
                    }
                }
            }
            self.update_node(h, h_index, SMALL_GAPS, chosen, &mut maxscore, best);
        }
    }

    /// Large gaps: any predecessor that starts after H ends.
    fn large_gap_pass(&mut self, len: usize, best: &mut [Option<usize>; 2]) {
        let cutoff = self.cutoff[LARGE_GAPS];
        let fresh = self.fresh();
        let mut maxscore = i32::MIN;
        for h_index in 2..len {
            let Some(h) = self.helpers[h_index].ptr else {
                continue;
            };
            let mut chosen = Predecessor::default();
            self.arena[h].hsp_link.changed = true;
            let previous = self.arena[h].hsp_link.link[LARGE_GAPS];

            let unchanged = !fresh
                && previous.map_or(true, |h2| !self.arena[h2].hsp_link.changed);
            if unchanged {
                // The last choice kept its sum and every rival could only
                // have lost, so it is still the best.
                if let Some(h2) = previous {
                    chosen = Predecessor::of(self.arena, h2, LARGE_GAPS);
                }
                self.arena[h].hsp_link.changed = false;
                LinkDiagnostics::record(&LINK_DIAGNOSTICS.shortcut_links, 1);
            } else if self.arena[h].hsp.score > cutoff {
                let qe = self.arena[h].q_end_trim;
                let se = self.arena[h].s_end_trim;

                // Start just below the previous choice's sum so only HSPs
                // that can match or beat it are examined.
                if !fresh {
                    if let Some(h2) = previous {
                        if self.arena[h2].linked_to >= 0 {
                            chosen.sum = self.arena[h2].hsp_link.sum[LARGE_GAPS] - 1;
                        }
                    }
                }

                let mut h2_index = h_index - 1;
                while h2_index > 1 {
                    let helper = self.helpers[h2_index];
                    let b0 = helper.sum[LARGE_GAPS] <= chosen.sum;
                    h2_index -= 1;
                    if b0 {
                        h2_index = helper.next_larger;
                    }
                    let b1 = helper.q_off_trim <= qe;
                    let b2 = helper.s_off_trim <= se;
                    if !(b0 || b1 || b2) {
                        if let Some(h2) = helper.ptr {
                            chosen = Predecessor::of(self.arena, h2, LARGE_GAPS);
                        }
                    }
                }
            }
            self.update_node(h, h_index, LARGE_GAPS, chosen, &mut maxscore, best);
        }
    }

    fn update_node(
        &mut self,
        h: usize,
        h_index: usize,
        method: usize,
        chosen: Predecessor,
        maxscore: &mut i32,
        best: &mut [Option<usize>; 2],
    ) {
        let new_sum = chosen.sum + (self.arena[h].hsp.score - self.cutoff[method]);
        let link = &mut self.arena[h].hsp_link;
        link.sum[method] = new_sum;
        link.num[method] = chosen.num + 1;
        link.link[method] = chosen.link;
        link.xsum[method] = chosen.xsum + self.xscore[h];
        self.helpers[h_index].sum[method] = new_sum;
        if method == LARGE_GAPS {
            self.helpers[h_index].next_larger = self.next_larger_for(h_index);
        }
        if new_sum >= *maxscore {
            *maxscore = new_sum;
            best[method] = Some(h);
        }
        if let Some(h2) = chosen.link {
            self.arena[h2].linked_to += 1;
        }
    }

    /// Pick the ordering method with the smaller sum e-value and return the
    /// e-value projected onto the context's search space.
    fn select_ordering(&self, best: &[Option<usize>; 2]) -> Result<(LinkOrderingMethod, f64)> {
        let gap_prob = self.params.gap_prob;
        let large = best[LARGE_GAPS].ok_or(LinkError::NoChainHead {
            remaining: self.remaining,
        })?;
        let mut prob_large = self.chain_sum_e(large, LARGE_GAPS);

        let (method, prob) = if self.ignore_small_gaps {
            (LinkOrderingMethod::LargeGaps, prob_large)
        } else {
            let small = best[SMALL_GAPS].ok_or(LinkError::NoChainHead {
                remaining: self.remaining,
            })?;
            let mut prob_small = self.chain_sum_e(small, SMALL_GAPS);
            // Each method pays for the prior probability of its gap regime.
            if self.arena[small].hsp_link.num[SMALL_GAPS] > 1 {
                prob_small = divide_clamped(prob_small, gap_prob);
            }
            if self.arena[large].hsp_link.num[LARGE_GAPS] > 1 {
                prob_large = divide_clamped(prob_large, 1.0 - gap_prob);
            }
            if prob_small <= prob_large {
                (LinkOrderingMethod::SmallGaps, prob_small)
            } else {
                (LinkOrderingMethod::LargeGaps, prob_large)
            }
        };

        let pair_space = self.stats.subject_length as f64 * self.stats.query_length as f64;
        Ok((method, prob * (self.stats.eff_searchsp / pair_space)))
    }

    fn chain_sum_e(&self, head: usize, method: usize) -> f64 {
        let link = &self.arena[head].hsp_link;
        let num = link.num[method];
        let divisor = gap_decay_divisor(self.params.gap_decay_rate, num.max(0) as usize);
        if method == SMALL_GAPS {
            small_gap_sum_e(
                self.stats.kbp,
                self.window_size,
                num,
                link.xsum[method],
                self.stats.query_length,
                self.stats.subject_length,
                divisor,
            )
        } else {
            large_gap_sum_e(
                self.stats.kbp,
                num,
                link.xsum[method],
                self.stats.query_length,
                self.stats.subject_length,
                divisor,
            )
        }
    }

    /// Tag the chain from `head` along `method`'s links, give every member
    /// the chain's e-value, length and raw score, and unlink it.
    fn commit_chain(&mut self, head: usize, method: LinkOrderingMethod, evalue: f64) -> Result<()> {
        let m = method.index();
        let num = self.arena[head].hsp_link.num[m];
        let sumscore = self.arena[head].hsp_link.sum[m] + num * self.cutoff[m];
        let linked_set = self.arena[head].hsp_link.link[m].is_some();

        self.arena[head].start_of_chain = true;
        if self.arena[head].linked_to > 0 {
            self.path_changed = true;
        }

        let mut count = 0;
        let mut cur = Some(head);
        while let Some(h) = cur {
            if self.remaining == 0 || self.arena[h].is_removed() {
                return Err(LinkError::CorruptChain {
                    node: h,
                    detail: "chain reaches an HSP that is no longer active",
                });
            }
            if self.arena[h].linked_to > 1 {
                self.path_changed = true;
            }
            let node = &mut self.arena[h];
            node.linked_to = LINKED_TO_REMOVED;
            node.hsp_link.changed = true;
            node.linked_set = linked_set;
            node.ordering_method = Some(method);
            node.hsp.evalue = evalue;
            node.hsp.num = num;
            node.hsp.sumscore = sumscore;
            let (prev, next) = (node.prev.take(), node.next.take());
            cur = node.hsp_link.link[m];

            match prev {
                Some(p) => self.arena[p].next = next,
                None => self.active_head = next,
            }
            if let Some(nx) = next {
                self.arena[nx].prev = prev;
            }
            self.remaining -= 1;
            count += 1;
            trace!("chain member {} (score {})", h, self.arena[h].hsp.score);
        }

        if count != num {
            return Err(LinkError::CorruptChain {
                node: head,
                detail: "chain length differs from its recorded HSP count",
            });
        }

        LinkDiagnostics::record(&LINK_DIAGNOSTICS.chains_formed, 1);
        if linked_set {
            LinkDiagnostics::record(&LINK_DIAGNOSTICS.linked_hsps, count as usize);
        }
        if evalue >= MAX_EVALUE {
            LinkDiagnostics::record(&LINK_DIAGNOSTICS.clamped_evalues, 1);
        }
        debug!(
            "context {}: committed {:?} chain of {} HSPs from {} (sumscore {}, evalue {:.3e})",
            self.stats.query_context, method, num, head, sumscore, evalue
        );
        Ok(())
    }
}

/// Best predecessor found so far while scanning for H.
#[derive(Debug, Clone, Copy, Default)]
struct Predecessor {
    num: i32,
    sum: i32,
    xsum: f64,
    link: Option<usize>,
}

impl Predecessor {
    fn of(arena: &LinkArena, h2: usize, method: usize) -> Self {
        let link = &arena[h2].hsp_link;
        Self {
            num: link.num[method],
            sum: link.sum[method],
            xsum: link.xsum[method],
            link: Some(h2),
        }
    }
}

/// `value / prob`, clamped to `MAX_EVALUE` when `prob` is zero or the
/// quotient overflows it.
fn divide_clamped(value: f64, prob: f64) -> f64 {
    if prob == 0.0 {
        return MAX_EVALUE;
    }
    let quotient = value / prob;
    if quotient > MAX_EVALUE {
        MAX_EVALUE
    } else {
        quotient
    }
}
