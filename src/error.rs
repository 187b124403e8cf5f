//! Error types for profile scanning and secret decryption
//!
//! Per-field errors are recoverable, module errors are not.

use std::path::PathBuf;

/// Failures of a single `decrypt` call against the security module
#[derive(Debug, thiserror::Error)]
pub enum DecryptError {
    #[error("Dynamically linking to NSS failed: {0}")]
    Linking(String),

    #[error("NSS initialization failed for profile path {0:?}")]
    Initialization(PathBuf),

    #[error("Base64 decoding failed")]
    Base64Decoding,

    #[error("Password decryption failed (status {status})")]
    Decryption { status: i32 },
}

impl DecryptError {
    /// Linking and initialization failures leave nothing to retry per row.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DecryptError::Linking(_) | DecryptError::Initialization(_))
    }
}

/// Reasons a profile is skipped entirely
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Database file {0:?} not found")]
    DatabaseNotFound(PathBuf),

    #[error("{source} (file {path:?})")]
    BadDatabase {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database integrity check failed: {details} (file {path:?})")]
    Corrupt { path: PathBuf, details: String },
}

/// Errors that abort the whole scan
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("{source} (while scanning profile {profile:?})")]
    Fatal {
        profile: PathBuf,
        #[source]
        source: DecryptError,
    },
}
