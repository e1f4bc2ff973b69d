//! Error types for corekv
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for corekv operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Validation Errors
    //
    // Rejected synchronously before any state is mutated; retrying with
    // the same input will fail again.
    // -------------------------------------------------------------------------
    #[error("key required")]
    KeyRequired,

    #[error("key too large: {0} bytes")]
    KeyTooLarge(usize),

    #[error("value required")]
    ValueRequired,

    #[error("value too large: {0} bytes")]
    ValueTooLarge(usize),

    // -------------------------------------------------------------------------
    // Startup Errors
    // -------------------------------------------------------------------------
    #[error("directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A disk-table generation referenced by the manifest is missing one
    /// or more of its files. Fatal at open: refusing to start beats
    /// silently serving partial data.
    #[error("consistency error: {0}")]
    Consistency(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("serialization error: {0}")]
    Serialization(String),
}
