//! Error types for paging configuration

use thiserror::Error;

/// Paging errors
///
/// Only construction and configuration loading can fail. Requests against a
/// live engine never produce errors; out-of-range coordinates are ignored.
#[derive(Error, Debug)]
pub enum PagingError {
    #[error("{axis} must be a power of two, got {value}")]
    NotPowerOfTwo { axis: &'static str, value: u32 },

    #[error("Tile capacity must be at least 1")]
    ZeroCapacity,

    #[error("Tile capacity {capacity} exceeds the platform maximum of {max}")]
    CapacityExceeded { capacity: u32, max: u32 },

    #[error("Invalid tile size {width}x{height}: both sides must be powers of two")]
    InvalidTileSize { width: u32, height: u32 },

    #[error("Invalid virtual texture name {0:?}: only ASCII letters are allowed")]
    InvalidName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for paging operations
pub type PagingResult<T> = Result<T, PagingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PagingError::NotPowerOfTwo { axis: "page_count_x", value: 3 };
        assert_eq!(err.to_string(), "page_count_x must be a power of two, got 3");

        let err = PagingError::CapacityExceeded { capacity: 4096, max: 2048 };
        assert!(err.to_string().contains("4096"));
    }
}
