//! Data types module for Mozilla login extraction

pub mod password;

pub use password::{read_login_entries, EncryptedField, LoginEntry};
