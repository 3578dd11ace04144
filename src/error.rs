/// Typed errors for the fallible seams: persistence and maze generation.
/// Neither is fatal; callers log and fall back locally.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("storage i/o on key {key}: {source}")]
    Io {
        key: u32,
        #[source]
        source: io::Error,
    },

    #[error("record {key}: expected {expected} bytes, got {actual}")]
    SizeMismatch { key: u32, expected: usize, actual: usize },

    #[error("record {key}: bad magic")]
    BadMagic { key: u32 },

    #[error("record {key}: unsupported version {version}")]
    UnsupportedVersion { key: u32, version: u16 },

    #[error("record {key}: invalid {field}")]
    InvalidField { key: u32, field: &'static str },

    #[error("record {key} not found")]
    Missing { key: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("carver did not reach the exit within {limit} steps")]
    CarveLimit { limit: usize },
}
