//! Secret decryption against a profile-scoped module session
//!
//! Lifecycle per call:
//! - `NSS_Init(profile)` when the session is opened
//! - base64 decode, then `PK11SDR_Decrypt`, then copy out the plaintext
//! - buffers freed and `NSS_Shutdown` run on every exit path
//!
//! Nothing survives between calls, so a corrupt row cannot leave the module
//! in a bad state for the next one.

use super::module::{ModuleLoader, SecurityModule};
use crate::error::DecryptError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A module buffer that is handed back to the module when dropped
struct ModuleBuffer<'m, M: SecurityModule> {
    module: &'m M,
    buffer: M::Buffer,
}

impl<'m, M: SecurityModule> ModuleBuffer<'m, M> {
    fn new(module: &'m M, buffer: M::Buffer) -> Self {
        Self { module, buffer }
    }

    fn get(&self) -> &M::Buffer {
        &self.buffer
    }

    fn bytes(&self) -> &[u8] {
        self.module.bytes(&self.buffer)
    }
}

impl<M: SecurityModule> Drop for ModuleBuffer<'_, M> {
    fn drop(&mut self) {
        self.module.free(&mut self.buffer);
    }
}

/// One initialize/shutdown bracket around a loaded module.
///
/// Opening the session initializes the module for a profile; dropping it
/// shuts the module down again, exactly once.
pub struct SecretSession<'m, M: SecurityModule> {
    module: &'m M,
    profile_path: PathBuf,
}

impl<'m, M: SecurityModule> SecretSession<'m, M> {
    pub fn open(module: &'m M, profile_path: &Path) -> Result<Self, DecryptError> {
        let status = module.initialize(profile_path);
        if !status.is_success() {
            debug!(
                "Module initialization for {:?} returned status {}",
                profile_path,
                status.code()
            );
            return Err(DecryptError::Initialization(profile_path.to_path_buf()));
        }

        Ok(Self {
            module,
            profile_path: profile_path.to_path_buf(),
        })
    }

    /// Decode and decrypt one base64 ciphertext.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, DecryptError> {
        let decoded = self
            .module
            .base64_decode(ciphertext)
            .map(|buffer| ModuleBuffer::new(self.module, buffer))
            .ok_or(DecryptError::Base64Decoding)?;

        if decoded.bytes().is_empty() {
            return Err(DecryptError::Base64Decoding);
        }

        let result = self
            .module
            .decrypt(decoded.get())
            .map(|buffer| ModuleBuffer::new(self.module, buffer))
            .map_err(|status| DecryptError::Decryption {
                status: status.code(),
            })?;

        let plaintext = result.bytes().to_vec();
        drop(result);
        drop(decoded);

        Ok(plaintext)
    }
}

impl<M: SecurityModule> Drop for SecretSession<'_, M> {
    fn drop(&mut self) {
        let status = self.module.shutdown();
        if !status.is_success() {
            warn!(
                "NSS shutdown for {:?} returned status {}",
                self.profile_path,
                status.code()
            );
        }
    }
}

/// Decrypt a single ciphertext in its own session for `profile_path`.
pub fn decrypt_single<M: SecurityModule>(
    module: &M,
    profile_path: &Path,
    ciphertext: &[u8],
) -> Result<Vec<u8>, DecryptError> {
    let session = SecretSession::open(module, profile_path)?;
    session.decrypt(ciphertext)
}

/// Lazily bound module shared by every decrypt call of a run.
///
/// The library is located on first use; a linking failure is reported then
/// and on every later attempt.
pub struct Decryptor<L: ModuleLoader> {
    loader: L,
    module: Option<L::Module>,
}

impl<L: ModuleLoader> Decryptor<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            module: None,
        }
    }

    pub fn decrypt(
        &mut self,
        profile_path: &Path,
        ciphertext: &[u8],
    ) -> Result<Vec<u8>, DecryptError> {
        let module = match self.module.take() {
            Some(module) => module,
            None => {
                let module = self.loader.load()?;
                debug!("Security module loaded");
                module
            }
        };
        let module = self.module.insert(module);
        decrypt_single(module, profile_path, ciphertext)
    }

    #[cfg(test)]
    pub fn module(&self) -> Option<&L::Module> {
        self.module.as_ref()
    }
}
