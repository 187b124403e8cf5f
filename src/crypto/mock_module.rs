//! In-memory security module for tests
//!
//! Mimics the NSS contract closely enough to exercise the session lifecycle:
//! per-profile keys, a base64 decoder that rejects bad input, and a cipher
//! that fails when the session was opened with the wrong key. Every call is
//! counted and logged in order so tests can check init/shutdown pairing and
//! the order in which buffers are released.

use super::module::{ModuleLoader, SecStatus, SecurityModule};
use crate::error::DecryptError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Call counters recorded by [`FakeModule`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FakeStats {
    pub initialized: usize,
    pub shutdowns: usize,
    pub decrypt_calls: usize,
    pub live_buffers: usize,
    pub max_depth: usize,
}

/// Which module call produced a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Decoded,
    Plaintext,
}

/// One call into [`FakeModule`], in the order it happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleEvent {
    Init,
    Decode,
    Decrypt,
    Free(BufferKind),
    Shutdown,
}

pub struct FakeBuffer {
    kind: BufferKind,
    data: Vec<u8>,
}

#[derive(Default)]
pub struct FakeModule {
    keys: HashMap<PathBuf, u8>,
    active_key: Cell<Option<u8>>,
    depth: Cell<usize>,
    stats: Cell<FakeStats>,
    events: RefCell<Vec<ModuleEvent>>,
}

impl FakeModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `profile_path` during initialization and bind it to `key`.
    pub fn with_profile(mut self, profile_path: impl Into<PathBuf>, key: u8) -> Self {
        self.keys.insert(profile_path.into(), key);
        self
    }

    pub fn stats(&self) -> FakeStats {
        self.stats.get()
    }

    pub fn events(&self) -> Vec<ModuleEvent> {
        self.events.borrow().clone()
    }

    /// Ciphertext the module will decrypt when initialized for `profile_path`.
    pub fn encrypt(&self, profile_path: &Path, plaintext: &[u8]) -> String {
        let key = self.keys[profile_path];
        Self::encrypt_with_key(key, plaintext)
    }

    pub fn encrypt_with_key(key: u8, plaintext: &[u8]) -> String {
        let mut raw = vec![key];
        raw.extend(plaintext.iter().map(|b| b ^ key));
        STANDARD.encode(raw)
    }

    fn record(&self, event: ModuleEvent) {
        self.events.borrow_mut().push(event);
    }

    fn update(&self, f: impl FnOnce(&mut FakeStats)) {
        let mut stats = self.stats.get();
        f(&mut stats);
        self.stats.set(stats);
    }
}

impl SecurityModule for FakeModule {
    type Buffer = FakeBuffer;

    fn initialize(&self, profile_path: &Path) -> SecStatus {
        let Some(&key) = self.keys.get(profile_path) else {
            return SecStatus::Failure(-1);
        };

        self.record(ModuleEvent::Init);
        self.active_key.set(Some(key));
        self.depth.set(self.depth.get() + 1);
        let depth = self.depth.get();
        self.update(|s| {
            s.initialized += 1;
            s.max_depth = s.max_depth.max(depth);
        });
        SecStatus::Success
    }

    fn shutdown(&self) -> SecStatus {
        self.record(ModuleEvent::Shutdown);
        self.active_key.set(None);
        self.depth.set(self.depth.get().saturating_sub(1));
        self.update(|s| s.shutdowns += 1);
        SecStatus::Success
    }

    fn base64_decode(&self, encoded: &[u8]) -> Option<FakeBuffer> {
        self.record(ModuleEvent::Decode);
        let data = STANDARD.decode(encoded).ok()?;
        self.update(|s| s.live_buffers += 1);
        Some(FakeBuffer {
            kind: BufferKind::Decoded,
            data,
        })
    }

    fn decrypt(&self, decoded: &FakeBuffer) -> Result<FakeBuffer, SecStatus> {
        self.record(ModuleEvent::Decrypt);
        self.update(|s| s.decrypt_calls += 1);

        match (self.active_key.get(), decoded.data.split_first()) {
            (Some(key), Some((&tag, body))) if tag == key => {
                self.update(|s| s.live_buffers += 1);
                Ok(FakeBuffer {
                    kind: BufferKind::Plaintext,
                    data: body.iter().map(|b| b ^ key).collect(),
                })
            }
            _ => Err(SecStatus::Failure(-1)),
        }
    }

    fn bytes<'b>(&self, buffer: &'b FakeBuffer) -> &'b [u8] {
        &buffer.data
    }

    fn free(&self, buffer: &mut FakeBuffer) {
        self.record(ModuleEvent::Free(buffer.kind));
        buffer.data.clear();
        self.update(|s| s.live_buffers -= 1);
    }
}

/// Loader handing out one prepared [`FakeModule`], or failing like a missing library
pub struct FakeLoader {
    module: RefCell<Option<FakeModule>>,
    loads: Rc<Cell<usize>>,
}

impl FakeLoader {
    pub fn with(module: FakeModule) -> Self {
        Self {
            module: RefCell::new(Some(module)),
            loads: Rc::default(),
        }
    }

    pub fn missing() -> Self {
        Self {
            module: RefCell::new(None),
            loads: Rc::default(),
        }
    }

    /// Shared counter of `load` calls
    pub fn loads(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.loads)
    }
}

impl ModuleLoader for FakeLoader {
    type Module = FakeModule;

    fn load(&self) -> Result<FakeModule, DecryptError> {
        self.loads.set(self.loads.get() + 1);
        self.module
            .borrow_mut()
            .take()
            .ok_or_else(|| DecryptError::Linking("libnss3.so: cannot open shared object file".into()))
    }
}
