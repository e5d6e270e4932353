//! Unit test infrastructure for sumlink
//!
//! Tests are organized by area:
//! - `linking/` - even-gap and uneven-gap scenarios, batch linking
//! - `properties/` - randomized invariants of the linkers
//! - `stats/` - cutoffs and e-values through the public API

pub mod helpers;
pub mod linking;
pub mod properties;
pub mod stats;
