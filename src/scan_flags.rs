use crate::data_types::EncryptedField;
use anyhow::{anyhow, Result};
use clap::ValueEnum;
use std::path::PathBuf;
use tracing::warn;

/// Which encrypted columns of each login get decrypted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum DecryptFields {
    /// Username and password
    #[default]
    Both,
    /// Password only; usernames are left empty
    Password,
}

impl DecryptFields {
    pub fn fields(&self) -> &'static [EncryptedField] {
        match self {
            DecryptFields::Both => &[EncryptedField::Username, EncryptedField::Password],
            DecryptFields::Password => &[EncryptedField::Password],
        }
    }
}

/// Scan configuration
/// Built from the command line
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Profiles to scan; empty means auto detection
    pub profiles: Vec<PathBuf>,

    /// Encrypted columns to decrypt
    pub fields: DecryptFields,

    /// Explicit libnss3 to load instead of the platform default
    pub nss_library: Option<PathBuf>,

    /// Debug logging and run summary
    pub verbose: bool,
}

impl ScanConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(library) = &self.nss_library {
            if !library.is_file() {
                return Err(anyhow!("NSS library {:?} does not exist or is not a file", library));
            }
        }

        for profile in &self.profiles {
            if profile.exists() && !profile.is_dir() {
                return Err(anyhow!("Profile path {:?} is not a directory", profile));
            }
        }

        if self.fields == DecryptFields::Password {
            warn!("Only passwords will be decrypted; decryptedUsername stays empty");
        }

        Ok(())
    }

    pub fn description(&self) -> String {
        let source = if self.profiles.is_empty() {
            "auto-detected profiles".to_string()
        } else {
            format!("{} profile(s)", self.profiles.len())
        };

        let fields = self
            .fields
            .fields()
            .iter()
            .map(|f| f.name())
            .collect::<Vec<_>>()
            .join(", ");

        format!("{} [{}]", source, fields)
    }
}
