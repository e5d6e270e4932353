//! Statistics used by the linkers

pub mod sum_evalue;
