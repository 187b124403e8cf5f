//! Crypto module for Mozilla login decryption
//!
//! Decryption goes through the profile's NSS key database; nothing here
//! implements a cipher itself.

pub mod module;
pub mod nss;
pub mod session;

#[cfg(test)]
pub mod mock_module;

pub use module::ModuleLoader;
pub use nss::NssLoader;
pub use session::Decryptor;
