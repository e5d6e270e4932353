//! BLAST core pieces behind HSP linking
//!
//! Reference: ncbi-blast/c++/src/algo/blast/core/
//!
//! The module mirrors the files of NCBI BLAST's core/ directory that
//! sum-statistics linking depends on:
//!
//! - **Statistics** (`blast_stat`, `ncbi_math`, `blast_parameters`)
//!   - Karlin-Altschul parameters, raw score to E-value
//!   - Small-gap, large-gap and uneven-gap sum e-values
//!   - Link parameters and cutoff calculation
//!
//! - **Query layout** (`blast_query_info`, `blast_util`)
//!   - Per-context lengths, length adjustments and search spaces
//!   - Program kinds, frames and contexts
//!
//! - **HSP Management** (`blast_hits`, `link_hsps`)
//!   - HSP records and per-subject lists
//!   - Even-gap and uneven-gap linking
//!
//! - **Diagnostics** (`blast_diagnostics`)

// Statistics
pub mod blast_stat;
pub mod ncbi_math;

// Utilities
pub mod blast_query_info;
pub mod blast_util;

// HSP Management
pub mod blast_hits;
pub mod link_hsps;

// Parameters
pub mod blast_parameters;

// Diagnostics
pub mod blast_diagnostics;
