//! Error types for HSP linking.

use thiserror::Error;

/// Failures surfaced by the linking entry points.
///
/// An empty HSP list is not an error; it links to nothing and returns
/// successfully.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LinkError {
    /// The per-call wrapper arena could not be allocated.
    #[error("failed to allocate link workspace for {requested} HSPs")]
    Allocation { requested: usize },

    /// An HSP refers to a context that `QueryInfo` does not describe.
    #[error("HSP context {context} is outside the {num_contexts} query contexts")]
    ContextOutOfRange { context: usize, num_contexts: usize },

    /// No Karlin-Altschul block is available for the context.
    #[error("no Karlin-Altschul parameters for context {context}")]
    MissingKarlinBlock { context: usize },

    /// A linking parameter is outside its valid range.
    #[error("invalid link parameter: {0}")]
    InvalidParameter(String),

    /// A chain walk ran off the end of a chain or looped.
    #[error("corrupt chain at HSP {node}: {detail}")]
    CorruptChain { node: usize, detail: &'static str },

    /// Materialization found HSPs that belong to no chain head.
    #[error("{remaining} HSPs are not reachable from any chain head")]
    NoChainHead { remaining: usize },
}

pub type Result<T> = std::result::Result<T, LinkError>;
