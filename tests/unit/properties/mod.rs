//! Randomized invariants of the linkers

pub mod compare;
pub mod even_gap;
