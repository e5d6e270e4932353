//! Linking scenarios through the public entry points

pub mod batch;
pub mod even_gap;
