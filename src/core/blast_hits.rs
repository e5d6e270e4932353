//! HSP records and per-subject HSP lists.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_hits.c
//!
//! Linking reads coordinates and scores from these records and writes back
//! the chain annotations (`num`, `evalue`, `sumscore`, `linked_set`,
//! `start_of_chain`, `ordering_method`). After linking, the members of a
//! chain are stored contiguously, head first.

use crate::core::blast_query_info::QueryInfo;
use crate::core::blast_stat::{evalue_from_raw_score, gap_decay_divisor, ScoreBlock};
use crate::error::Result;

/// Gap regime that produced an even-gap chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkOrderingMethod {
    /// Neighbours within `gap_size + overlap_size` on both sequences.
    SmallGaps,
    /// Neighbours at any distance.
    LargeGaps,
}

impl LinkOrderingMethod {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            LinkOrderingMethod::SmallGaps => 0,
            LinkOrderingMethod::LargeGaps => 1,
        }
    }
}

/// One side of an alignment (NCBI `BlastSeg`).
///
/// `end` is exclusive. `frame` is signed: its sign is the strand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Seg {
    pub frame: i16,
    pub offset: i32,
    pub end: i32,
}

impl Seg {
    pub fn new(frame: i16, offset: i32, end: i32) -> Self {
        Self { frame, offset, end }
    }

    #[inline]
    pub fn length(&self) -> i32 {
        self.end - self.offset
    }

    /// Strand of the segment: -1, 0 or 1.
    #[inline]
    pub fn strand(&self) -> i16 {
        self.frame.signum()
    }
}

/// A high-scoring segment pair and its chain annotations.
#[derive(Debug, Clone, PartialEq)]
pub struct Hsp {
    /// Raw alignment score.
    pub score: i32,
    /// Query context the HSP was found in.
    pub context: usize,
    pub query: Seg,
    pub subject: Seg,
    /// Individual e-value on input to the uneven-gap linker; chain e-value
    /// on output.
    pub evalue: f64,
    /// Number of HSPs in this HSP's chain.
    pub num: i32,
    /// Combined raw score of this HSP's chain.
    pub sumscore: i32,
    /// Member of a chain with more than one HSP.
    pub linked_set: bool,
    /// Head of its chain.
    pub start_of_chain: bool,
    /// Gap regime of the even-gap chain holding this HSP.
    pub ordering_method: Option<LinkOrderingMethod>,
}

impl Hsp {
    pub fn new(score: i32, context: usize, query: Seg, subject: Seg) -> Self {
        Self {
            score,
            context,
            query,
            subject,
            evalue: 0.0,
            num: 1,
            sumscore: 0,
            linked_set: false,
            start_of_chain: false,
            ordering_method: None,
        }
    }

    /// Chain length as stored in the array: `num` for linked HSPs, else 1.
    #[inline]
    pub fn chain_len(&self) -> usize {
        if self.linked_set {
            self.num.max(1) as usize
        } else {
            1
        }
    }

    /// True when this HSP begins a chain in materialized order.
    #[inline]
    pub fn is_chain_head(&self) -> bool {
        !self.linked_set || self.start_of_chain
    }
}

/// All HSPs between the query set and one subject (NCBI `BlastHSPList`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HspList {
    /// Ordinal of the subject sequence.
    pub oid: usize,
    /// Subject length in letters (nucleotides for translated subjects).
    pub subject_length: i32,
    pub hsps: Vec<Hsp>,
}

impl HspList {
    pub fn new(oid: usize, subject_length: i32, hsps: Vec<Hsp>) -> Self {
        Self {
            oid,
            subject_length,
            hsps,
        }
    }

    pub fn len(&self) -> usize {
        self.hsps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hsps.is_empty()
    }

    /// Materialized chains, head first.
    pub fn chains(&self) -> Chains<'_> {
        chains(&self.hsps)
    }
}

/// Iterator over contiguous chains of a linked HSP array.
pub struct Chains<'a> {
    rest: &'a [Hsp],
}

/// Split a linked HSP array into its chains.
///
/// Each chain starts at a head and spans `num` entries for linked sets, one
/// entry otherwise. A truncated trailing chain yields what remains.
pub fn chains(hsps: &[Hsp]) -> Chains<'_> {
    Chains { rest: hsps }
}

impl<'a> Iterator for Chains<'a> {
    type Item = &'a [Hsp];

    fn next(&mut self) -> Option<Self::Item> {
        let head = self.rest.first()?;
        let len = head.chain_len().min(self.rest.len());
        let (chain, rest) = self.rest.split_at(len);
        self.rest = rest;
        Some(chain)
    }
}

/// Individual HSP e-values (NCBI Blast_HSPListGetEvalues).
///
/// Uses the context's effective search space; a non-zero `gap_decay_rate`
/// divides by the one-HSP decay weight so that individual and sum e-values
/// are on the same multiple-testing footing.
pub fn hsp_list_get_evalues(
    query_info: &QueryInfo,
    hsps: &mut [Hsp],
    gapped: bool,
    sbp: &ScoreBlock,
    gap_decay_rate: f64,
) -> Result<()> {
    for hsp in hsps.iter_mut() {
        let kbp = sbp.karlin_block(hsp.context, gapped)?;
        let searchsp = query_info.context(hsp.context)?.eff_searchsp as f64;
        hsp.evalue = evalue_from_raw_score(hsp.score, kbp, searchsp);
        if gap_decay_rate != 0.0 {
            hsp.evalue /= gap_decay_divisor(gap_decay_rate, 1);
        }
    }
    Ok(())
}
