//! Chain materialization: the final HSP order, each chain contiguous and
//! head first.
//!
//! Reference: link_hsps.c (hook-up loop of Blast_EvenGapLinkHSPs,
//! ConnectLinkHSPStructs)

use super::arena::LinkArena;
use super::compare::sumscore_compare_hsps;
use crate::error::{LinkError, Result};

/// Order for even-gap chains.
///
/// `sorted` is the arena in output order of heads. Each head (a singleton
/// or a chain start) is followed by the members reached through its
/// ordering method's links; members met on their own are skipped.
pub(crate) fn hook_up_even_gap_chains(
    arena: &mut LinkArena,
    sorted: &[usize],
) -> Result<Vec<usize>> {
    let n = arena.len();
    let mut order = Vec::new();
    order
        .try_reserve_exact(n)
        .map_err(|_| LinkError::Allocation { requested: n })?;
    let mut placed = vec![false; n];

    for &idx in sorted {
        if !arena[idx].is_chain_head() {
            continue;
        }
        let method = arena[idx].ordering_method.map(|m| m.index());
        let mut cur = Some(idx);
        while let Some(h) = cur {
            place(&mut placed, &mut order, h)?;
            cur = match method {
                Some(m) if arena[h].linked_set => arena[h].hsp_link.link[m],
                _ => None,
            };
        }
    }

    check_complete(&order, n)?;
    thread_order(arena, &order);
    Ok(order)
}

/// Order for uneven-gap chains (ConnectLinkHSPStructs).
///
/// Heads are sorted by best known score. Each linked head is followed by
/// its `num - 1` successors along `next`, which take on the head's
/// e-value, `num` and sum score. Singletons report their own score.
pub(crate) fn connect_link_hsp_structs(arena: &mut LinkArena) -> Result<Vec<usize>> {
    let n = arena.len();
    let mut by_score: Vec<usize> = (0..n).collect();
    by_score.sort_by(|&a, &b| sumscore_compare_hsps(&arena[a].hsp, &arena[b].hsp));

    let mut order = Vec::new();
    order
        .try_reserve_exact(n)
        .map_err(|_| LinkError::Allocation { requested: n })?;
    let mut placed = vec![false; n];

    for &idx in &by_score {
        if !arena[idx].is_chain_head() {
            continue;
        }
        place(&mut placed, &mut order, idx)?;

        let head = &mut arena[idx];
        if !head.linked_set {
            head.hsp.sumscore = head.hsp.score;
            continue;
        }
        let (evalue, num, sumscore) = (head.hsp.evalue, head.hsp.num, head.hsp.sumscore);
        let mut cur = idx;
        for _ in 1..num.max(1) {
            let next = arena[cur].next.ok_or(LinkError::CorruptChain {
                node: cur,
                detail: "chain ends before its recorded length",
            })?;
            let member = &mut arena[next].hsp;
            member.evalue = evalue;
            member.num = num;
            member.sumscore = sumscore;
            place(&mut placed, &mut order, next)?;
            cur = next;
        }
    }

    check_complete(&order, n)?;
    thread_order(arena, &order);
    Ok(order)
}

fn place(placed: &mut [bool], order: &mut Vec<usize>, idx: usize) -> Result<()> {
    if placed[idx] {
        return Err(LinkError::CorruptChain {
            node: idx,
            detail: "HSP reached from more than one chain head",
        });
    }
    placed[idx] = true;
    order.push(idx);
    Ok(())
}

/// Point `prev`/`next` along the final order.
fn thread_order(arena: &mut LinkArena, order: &[usize]) {
    for (pos, &idx) in order.iter().enumerate() {
        arena[idx].prev = pos.checked_sub(1).map(|p| order[p]);
        arena[idx].next = order.get(pos + 1).copied();
    }
}

fn check_complete(order: &[usize], n: usize) -> Result<()> {
    if order.len() != n {
        return Err(LinkError::NoChainHead {
            remaining: n - order.len(),
        });
    }
    Ok(())
}
