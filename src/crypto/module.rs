//! Logical contract of the native security module
//!
//! The decryption engine only talks to NSS through these traits, so the real
//! library and the in-memory test double are interchangeable.

use crate::error::DecryptError;
use std::path::Path;

/// Status code returned by module calls (`SECStatus` in NSS terms)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecStatus {
    Success,
    Failure(i32),
}

impl SecStatus {
    pub fn from_raw(raw: i32) -> Self {
        if raw == 0 {
            SecStatus::Success
        } else {
            SecStatus::Failure(raw)
        }
    }

    pub fn is_success(self) -> bool {
        self == SecStatus::Success
    }

    pub fn code(self) -> i32 {
        match self {
            SecStatus::Success => 0,
            SecStatus::Failure(code) => code,
        }
    }
}

/// Raw capabilities of a loaded security module.
///
/// Buffers handed out by `base64_decode` and `decrypt` belong to the module
/// and must be returned through `free`. Callers go through
/// [`SecretSession`](super::session::SecretSession) rather than using this directly.
pub trait SecurityModule {
    /// Module-allocated buffer
    type Buffer;

    /// Bind module state to the key material in `profile_path`.
    fn initialize(&self, profile_path: &Path) -> SecStatus;

    /// Tear down whatever `initialize` set up.
    fn shutdown(&self) -> SecStatus;

    /// Decode base64 text with the module's own decoder. `None` means the
    /// decoder rejected the input.
    fn base64_decode(&self, encoded: &[u8]) -> Option<Self::Buffer>;

    /// Run secret decryption over a decoded buffer, producing a detached result.
    fn decrypt(&self, decoded: &Self::Buffer) -> Result<Self::Buffer, SecStatus>;

    /// View the `len` bytes a buffer currently holds.
    fn bytes<'b>(&self, buffer: &'b Self::Buffer) -> &'b [u8];

    /// Release a buffer's contents; the buffer is empty afterwards.
    fn free(&self, buffer: &mut Self::Buffer);
}

/// Locates and binds a security module.
pub trait ModuleLoader {
    type Module: SecurityModule;

    /// Fails with [`DecryptError::Linking`] when the module is unavailable.
    fn load(&self) -> Result<Self::Module, DecryptError>;
}
