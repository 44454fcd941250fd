//! The filter-pipeline front-end (C1): descriptor encode/decode, plus the
//! individual filter transforms applied before/after block compression.

pub mod bitshuffle;
pub mod delta;
pub mod descriptor;
pub mod shuffle;

pub use descriptor::{decode, encode};
