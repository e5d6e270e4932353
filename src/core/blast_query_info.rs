//! Per-context query lengths and effective search spaces.
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/blast_query_info.c
//!
//! Queries are concatenated and, for translated searches, split into six
//! frames. Each (query, strand, frame) is a context with its own length,
//! length adjustment and effective search space.

use crate::core::blast_util::{context_to_frame, BlastProgram};
use crate::error::{LinkError, Result};

/// One query context (NCBI `BlastContextInfo`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContextInfo {
    /// Offset of this context in the concatenated query.
    pub query_offset: i32,
    /// Length of this context, in residues for translated frames.
    pub query_length: i32,
    /// Expected HSP length subtracted from both sequences.
    pub length_adjustment: i32,
    /// Effective search space for this context.
    pub eff_searchsp: i64,
    /// Query frame of this context (0 for protein queries).
    pub frame: i16,
}

impl ContextInfo {
    pub fn new(query_length: i32, length_adjustment: i32, eff_searchsp: i64) -> Self {
        Self {
            query_offset: 0,
            query_length,
            length_adjustment,
            eff_searchsp,
            frame: 0,
        }
    }
}

/// Query layout shared read-only by every linking call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryInfo {
    pub num_queries: usize,
    pub contexts: Vec<ContextInfo>,
}

impl QueryInfo {
    /// Lay out `contexts` back to back and assign frames for `program`.
    ///
    /// Offsets follow the concatenation rule where each non-empty context is
    /// followed by a one-residue sentinel.
    pub fn new(program: BlastProgram, num_queries: usize, mut contexts: Vec<ContextInfo>) -> Self {
        let mut prev_offset = 0;
        let mut prev_len = 0;
        for (index, ctx) in contexts.iter_mut().enumerate() {
            let shift = if prev_len > 0 { prev_len + 1 } else { 0 };
            ctx.query_offset = prev_offset + shift;
            ctx.frame = context_to_frame(index, program);
            prev_offset = ctx.query_offset;
            prev_len = ctx.query_length;
        }
        Self {
            num_queries,
            contexts,
        }
    }

    /// Single-query layout with one context per entry of `lengths`, each
    /// context sharing the same length adjustment and search space.
    pub fn uniform(
        program: BlastProgram,
        lengths: &[i32],
        length_adjustment: i32,
        eff_searchsp: i64,
    ) -> Self {
        let contexts = lengths
            .iter()
            .map(|&len| ContextInfo::new(len, length_adjustment, eff_searchsp))
            .collect();
        Self::new(program, 1, contexts)
    }

    /// Context `index`, or an error naming how many contexts exist.
    pub fn context(&self, index: usize) -> Result<&ContextInfo> {
        self.contexts.get(index).ok_or(LinkError::ContextOutOfRange {
            context: index,
            num_contexts: self.contexts.len(),
        })
    }

    pub fn num_contexts(&self) -> usize {
        self.contexts.len()
    }

    /// Average context length, `(last.offset + last.length - 1) / num_contexts`.
    pub fn avg_query_length(&self) -> i32 {
        match self.contexts.last() {
            Some(last) => {
                let total = last.query_offset + last.query_length - 1;
                (total / self.contexts.len() as i32).max(1)
            }
            None => 1,
        }
    }
}
