//! Multi-profile login scan
//!
//! Drives the decryptor over every encrypted field of every login in every
//! profile. Per-field failures are recorded and skipped; module linking and
//! initialization failures abort the scan.

use crate::crypto::{Decryptor, ModuleLoader};
use crate::data_types::{read_login_entries, LoginEntry};
use crate::db_safety::{close_login_database, open_login_database};
use crate::error::{ProfileError, ScanError};
use crate::profiles::signons_path;
use crate::report::ScanReport;
use crate::scan_flags::DecryptFields;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Version tag of the output document
pub const SCHEMA_VERSION: u32 = 3;

/// Logins of one profile keyed by row id
pub type ProfileResult = BTreeMap<i64, LoginEntry>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub version: u32,
    pub profiles: BTreeMap<String, ProfileResult>,
}

impl ScanResult {
    pub fn new() -> Self {
        Self {
            version: SCHEMA_VERSION,
            profiles: BTreeMap::new(),
        }
    }
}

impl Default for ScanResult {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ScanOutcome {
    pub result: ScanResult,
    pub report: ScanReport,
}

pub struct Scanner<L: ModuleLoader> {
    decryptor: Decryptor<L>,
    fields: DecryptFields,
}

impl<L: ModuleLoader> Scanner<L> {
    pub fn new(loader: L, fields: DecryptFields) -> Self {
        Self {
            decryptor: Decryptor::new(loader),
            fields,
        }
    }

    /// Scan `profiles` in order.
    pub fn scan(&mut self, profiles: &[PathBuf]) -> Result<ScanOutcome, ScanError> {
        let mut result = ScanResult::new();
        let mut report = ScanReport::new();

        for profile_path in profiles {
            info!("🔍 Scanning profile {:?}", profile_path);

            if let Some(details) = self.scan_profile(profile_path, &mut report)? {
                report.add_profile_scanned(profile_path, details.len());
                result
                    .profiles
                    .insert(profile_path.to_string_lossy().into_owned(), details);
            }
        }

        Ok(ScanOutcome { result, report })
    }

    /// `Ok(None)` means the profile was skipped.
    fn scan_profile(
        &mut self,
        profile_path: &Path,
        report: &mut ScanReport,
    ) -> Result<Option<ProfileResult>, ScanError> {
        let db_path = signons_path(profile_path);

        let conn = match open_login_database(&db_path) {
            Ok(conn) => conn,
            Err(e) => {
                warn!("{}", e);
                report.add_profile_skipped(&e);
                return Ok(None);
            }
        };

        let entries = match read_login_entries(&conn) {
            Ok(entries) => entries,
            Err(source) => {
                let e = ProfileError::BadDatabase {
                    path: db_path.clone(),
                    source,
                };
                warn!("{}", e);
                report.add_profile_skipped(&e);
                close_login_database(conn, &db_path);
                return Ok(None);
            }
        };
        debug!("Read {} logins from {:?}", entries.len(), db_path);

        let mut details = ProfileResult::new();
        for mut entry in entries {
            self.decrypt_entry(profile_path, &db_path, &mut entry, report)?;
            details.insert(entry.id, entry);
        }

        close_login_database(conn, &db_path);
        Ok(Some(details))
    }

    fn decrypt_entry(
        &mut self,
        profile_path: &Path,
        db_path: &Path,
        entry: &mut LoginEntry,
        report: &mut ScanReport,
    ) -> Result<(), ScanError> {
        for &field in self.fields.fields() {
            let ciphertext = field.ciphertext(entry).as_bytes();

            match self.decryptor.decrypt(profile_path, ciphertext) {
                Ok(plaintext) if plaintext.is_empty() => {
                    debug!("Empty {} (database {:?}, id {})", field.name(), db_path, entry.id);
                    report.add_field_empty();
                }
                Ok(plaintext) => {
                    debug!(
                        "Filled {} (database {:?}, id {})",
                        field.decrypted_name(),
                        db_path,
                        entry.id
                    );
                    field.store(entry, String::from_utf8_lossy(&plaintext).into_owned());
                    report.add_field_decrypted();
                }
                Err(e) if e.is_fatal() => {
                    return Err(ScanError::Fatal {
                        profile: profile_path.to_path_buf(),
                        source: e,
                    });
                }
                Err(e) => {
                    warn!(
                        "{} (database {:?}, id {}, field {})",
                        e,
                        db_path,
                        entry.id,
                        field.name()
                    );
                    report.add_field_failure(db_path, entry.id, field, &e);
                }
            }
        }

        Ok(())
    }

    #[cfg(test)]
    fn decryptor(&self) -> &Decryptor<L> {
        &self.decryptor
    }
}
