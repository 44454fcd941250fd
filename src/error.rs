//! Error types for the super-chunk engine (spec.md §7).

use thiserror::Error;

use crate::constants::{ERR_BUFFER_TOO_SMALL, ERR_OUT_OF_RANGE};

/// Everything that can go wrong while building, appending to, reading from,
/// packing or unpacking a super-chunk.
#[derive(Debug, Error)]
pub enum SchunkError {
    #[error("chunk index {index} is out of range (nchunks = {nchunks})")]
    OutOfRange { index: i64, nchunks: i64 },

    #[error("destination buffer has {have} bytes, but {needed} are needed")]
    BufferTooSmall { needed: i32, have: usize },

    #[error("set_delta_ref called but filter slot 0 is not DELTA")]
    DeltaNotConfigured,

    #[error("DELTA filter is active but no reference chunk is present")]
    DeltaReferenceMissing,

    #[error("codec produced {got} bytes, expected {expected}")]
    ShortDecompress { expected: i32, got: i32 },

    #[error("codec failure: {0}")]
    Codec(String),

    #[error("malformed chunk or packed image: {0}")]
    InvalidImage(String),

    #[error("typesize {typesize} does not fit in the chunk prefix's 1-byte field (must be 1..=255)")]
    InvalidTypesize { typesize: usize },
}

impl SchunkError {
    /// The well-known negative error code from spec.md §6/§7, for callers
    /// that need to bridge back to the original C API's integer-return
    /// convention. Variants with no original C counterpart (`Codec`,
    /// `InvalidImage`) have no fixed code and return `None`.
    pub fn legacy_code(&self) -> Option<i32> {
        match self {
            SchunkError::OutOfRange { .. } => Some(ERR_OUT_OF_RANGE),
            SchunkError::BufferTooSmall { .. } => Some(ERR_BUFFER_TOO_SMALL),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SchunkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_codes_match_spec_6() {
        assert_eq!(
            SchunkError::OutOfRange { index: 0, nchunks: 0 }.legacy_code(),
            Some(-10)
        );
        assert_eq!(
            SchunkError::BufferTooSmall { needed: 1, have: 0 }.legacy_code(),
            Some(-11)
        );
        assert_eq!(SchunkError::DeltaNotConfigured.legacy_code(), None);
    }
}
