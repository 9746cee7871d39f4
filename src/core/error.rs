//! Error types for the occsvo crate

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("header error: {0}")]
    Header(String),

    #[error("build error: {0}")]
    Build(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("corrupt octree file: {0}")]
    Corrupt(String),
}

/// Standard Result type for the crate
pub type Result<T> = std::result::Result<T, Error>;
