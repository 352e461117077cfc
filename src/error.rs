//! Error types for atcar

use thiserror::Error;

/// Result type alias for atcar operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while decoding a container or resolving a handle
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected end of input at offset {offset}: requested {requested} bytes, {remaining} remaining")]
    UnexpectedEof {
        offset: usize,
        requested: usize,
        remaining: usize,
    },

    #[error("malformed varint")]
    MalformedVarint,

    #[error("malformed encoding: {0}")]
    Malformed(String),

    #[error("indefinite-length items are not supported")]
    IndefiniteLength,

    #[error("map keys must be strings")]
    NonStringMapKey,

    #[error("unsupported tag: {0}")]
    UnsupportedTag(u64),

    #[error("unrecognized CID prefix: {0}")]
    UnknownCidPrefix(String),

    #[error("invalid UTF-8 in text string: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("nesting depth limit exceeded")]
    DepthLimit,

    #[error("length mismatch in {context}: declared {declared}, consumed {actual}")]
    Framing {
        context: &'static str,
        declared: u64,
        actual: u64,
    },

    #[error("content hash mismatch for block {cid}")]
    IntegrityMismatch { cid: String },

    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u64, found: u64 },

    #[error("invalid structure: {0}")]
    Structure(String),

    #[error("resolution failed: {0}")]
    Resolution(String),

    #[error("HTTP error: {0}")]
    Http(String),
}
