//! Per-call wrapper arena (NCBI `LinkHSPStruct` / `BlastHSPLink`).
//!
//! Wrappers are addressed by their position in the caller's HSP slice.
//! `prev`/`next` thread the active list during even-gap linking and chain
//! order afterwards. The arena owns working copies of the HSPs and is
//! dropped when the linking call returns.

use std::ops::{Index, IndexMut};

use crate::core::blast_hits::{Hsp, LinkOrderingMethod};
use crate::error::{LinkError, Result};

/// Marks a wrapper that has been committed to a chain.
pub(crate) const LINKED_TO_REMOVED: i32 = -1000;

/// Per-ordering-method DP state.
#[derive(Debug, Clone, Default)]
pub(crate) struct HspLink {
    /// Best downstream HSP to link with.
    pub link: [Option<usize>; 2],
    /// Number of HSPs in the ordering.
    pub num: [i32; 2],
    /// Cutoff-reduced sum score.
    pub sum: [i32; 2],
    /// Sum score multiplied by Lambda.
    pub xsum: [f64; 2],
    /// Link recomputed since the previous pass.
    pub changed: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct LinkHspStruct {
    /// Working copy; `num`, `evalue` and `sumscore` are updated in place.
    pub hsp: Hsp,
    /// Context used for statistics, unaffected by the blastx role swap.
    pub stat_context: usize,
    pub prev: Option<usize>,
    pub next: Option<usize>,
    pub hsp_link: HspLink,
    pub linked_set: bool,
    pub start_of_chain: bool,
    /// Number of HSPs choosing this one as their link; `LINKED_TO_REMOVED`
    /// once committed.
    pub linked_to: i32,
    /// Set by the even-gap linker on commit.
    pub ordering_method: Option<LinkOrderingMethod>,
    pub q_offset_trim: i32,
    pub q_end_trim: i32,
    pub s_offset_trim: i32,
    pub s_end_trim: i32,
}

impl LinkHspStruct {
    fn new(hsp: Hsp, stat_context: usize) -> Self {
        Self {
            hsp,
            stat_context,
            prev: None,
            next: None,
            hsp_link: HspLink::default(),
            linked_set: false,
            start_of_chain: false,
            linked_to: 0,
            ordering_method: None,
            q_offset_trim: 0,
            q_end_trim: 0,
            s_offset_trim: 0,
            s_end_trim: 0,
        }
    }

    #[inline]
    pub fn is_removed(&self) -> bool {
        self.linked_to == LINKED_TO_REMOVED
    }

    /// A singleton or the first HSP of a chain.
    #[inline]
    pub fn is_chain_head(&self) -> bool {
        !self.linked_set || self.start_of_chain
    }
}

pub(crate) struct LinkArena {
    nodes: Vec<LinkHspStruct>,
}

impl LinkArena {
    /// Wrap a working copy of every HSP, transformed by `view`.
    pub fn from_hsps(hsps: &[Hsp], view: impl Fn(&Hsp) -> Hsp) -> Result<Self> {
        let mut nodes: Vec<LinkHspStruct> = Vec::new();
        nodes
            .try_reserve_exact(hsps.len())
            .map_err(|_| LinkError::Allocation {
                requested: hsps.len(),
            })?;
        nodes.extend(hsps.iter().map(|h| LinkHspStruct::new(view(h), h.context)));
        Ok(Self { nodes })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LinkHspStruct> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LinkHspStruct> {
        self.nodes.iter_mut()
    }

    /// Follow `next` from `start` for `steps` hops.
    pub fn walk_next(&self, start: usize, steps: usize) -> Result<usize> {
        let mut cur = start;
        for _ in 0..steps {
            cur = self.nodes[cur].next.ok_or(LinkError::CorruptChain {
                node: cur,
                detail: "chain ends before its recorded length",
            })?;
        }
        Ok(cur)
    }

    /// Follow `prev` from `start` to the wrapper flagged `start_of_chain`,
    /// returning it and the number of wrappers visited (`start` included).
    pub fn walk_to_chain_start(&self, start: usize) -> Result<(usize, usize)> {
        let mut cur = start;
        let mut depth = 1;
        while !self.nodes[cur].start_of_chain {
            if depth > self.nodes.len() {
                return Err(LinkError::CorruptChain {
                    node: start,
                    detail: "no chain start before the list loops",
                });
            }
            cur = self.nodes[cur].prev.ok_or(LinkError::CorruptChain {
                node: cur,
                detail: "linked HSP has no chain start",
            })?;
            depth += 1;
        }
        Ok((cur, depth))
    }

    /// Copy the chain annotations of every wrapper onto the caller's HSPs
    /// and reorder them to `order` (a permutation of wrapper indices).
    pub fn write_back(&self, order: &[usize], hsps: &mut [Hsp]) -> Result<()> {
        if order.len() != hsps.len() {
            return Err(LinkError::NoChainHead {
                remaining: hsps.len().saturating_sub(order.len()),
            });
        }
        let mut out: Vec<Hsp> = Vec::new();
        out.try_reserve_exact(order.len())
            .map_err(|_| LinkError::Allocation {
                requested: order.len(),
            })?;
        for &idx in order {
            let node = &self.nodes[idx];
            let mut hsp = hsps[idx].clone();
            hsp.num = node.hsp.num;
            hsp.evalue = node.hsp.evalue;
            hsp.sumscore = node.hsp.sumscore;
            hsp.linked_set = node.linked_set;
            hsp.start_of_chain = node.start_of_chain;
            hsp.ordering_method = node.ordering_method;
            out.push(hsp);
        }
        for (dst, src) in hsps.iter_mut().zip(out) {
            *dst = src;
        }
        Ok(())
    }
}

impl Index<usize> for LinkArena {
    type Output = LinkHspStruct;

    #[inline]
    fn index(&self, idx: usize) -> &LinkHspStruct {
        &self.nodes[idx]
    }
}

impl IndexMut<usize> for LinkArena {
    #[inline]
    fn index_mut(&mut self, idx: usize) -> &mut LinkHspStruct {
        &mut self.nodes[idx]
    }
}
