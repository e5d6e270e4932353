//! Sum-statistics linking of BLAST HSPs.
//!
//! Chains the HSPs found between a query and one subject, gives each chain a
//! combined e-value and reorders the HSPs so chains are contiguous. See
//! [`link_hsps`] for a single subject and [`link_hsp_lists`] for a search.

pub mod core;
pub mod error;

pub use crate::core::blast_hits::{
    chains, hsp_list_get_evalues, Hsp, HspList, LinkOrderingMethod, Seg,
};
pub use crate::core::blast_parameters::{
    calculate_link_hsp_cutoffs, CutoffInputs, LinkHspParameters, RecomputePolicy,
};
pub use crate::core::blast_query_info::{ContextInfo, QueryInfo};
pub use crate::core::blast_stat::{KarlinParams, ScoreBlock};
pub use crate::core::blast_util::BlastProgram;
pub use crate::core::link_hsps::{link_hsp_lists, link_hsps, LinkSummary};
pub use crate::error::{LinkError, Result};
