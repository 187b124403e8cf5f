use crate::data_types::EncryptedField;
use crate::error::{DecryptError, ProfileError};
use std::path::{Path, PathBuf};

/// A field that could not be decrypted
#[derive(Debug, Clone)]
pub struct FieldFailure {
    pub database: PathBuf,
    pub id: i64,
    pub field: EncryptedField,
    pub reason: String,
}

/// Outcome counters for one scan
#[derive(Debug, Default)]
pub struct ScanReport {
    profiles_scanned: Vec<(PathBuf, usize)>,
    databases_missing: Vec<PathBuf>,
    databases_unreadable: Vec<(PathBuf, String)>,
    fields_decrypted: usize,
    fields_empty: usize,
    field_failures: Vec<FieldFailure>,
}

impl ScanReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_profile_scanned(&mut self, profile: &Path, entries: usize) {
        self.profiles_scanned.push((profile.to_path_buf(), entries));
    }

    pub fn add_profile_skipped(&mut self, error: &ProfileError) {
        match error {
            ProfileError::DatabaseNotFound(path) => self.databases_missing.push(path.clone()),
            ProfileError::BadDatabase { path, .. } | ProfileError::Corrupt { path, .. } => {
                self.databases_unreadable.push((path.clone(), error.to_string()))
            }
        }
    }

    pub fn add_field_decrypted(&mut self) {
        self.fields_decrypted += 1;
    }

    pub fn add_field_empty(&mut self) {
        self.fields_empty += 1;
    }

    pub fn add_field_failure(&mut self, database: &Path, id: i64, field: EncryptedField, error: &DecryptError) {
        self.field_failures.push(FieldFailure {
            database: database.to_path_buf(),
            id,
            field,
            reason: error.to_string(),
        });
    }

    pub fn field_failures(&self) -> &[FieldFailure] {
        &self.field_failures
    }

    /// Missing or unreadable databases do not count against success.
    pub fn success(&self) -> bool {
        self.field_failures.is_empty()
    }

    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }

    pub fn format(&self, detailed: bool) -> String {
        let mut output = String::new();

        output.push_str("\n🔍 Login Decryption Report\n");
        output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

        output.push_str("✅ Profiles Scanned:\n");
        for (profile, entries) in &self.profiles_scanned {
            output.push_str(&format!("  • {}: {} logins\n", profile.display(), entries));
        }
        output.push('\n');

        if !self.databases_missing.is_empty() {
            output.push_str("❌ Database Not Found:\n");
            for path in &self.databases_missing {
                output.push_str(&format!("  • {}\n", path.display()));
            }
            output.push('\n');
        }

        if !self.databases_unreadable.is_empty() {
            output.push_str("⚠️  Unreadable Databases:\n");
            for (path, error) in &self.databases_unreadable {
                output.push_str(&format!("  • {}\n", path.display()));
                if detailed {
                    output.push_str(&format!("    Error: {}\n", error));
                }
            }
            output.push('\n');
        }

        if !self.field_failures.is_empty() {
            output.push_str("🔐 Decryption Failures:\n");
            for failure in &self.field_failures {
                output.push_str(&format!(
                    "  • {} id {} ({})\n",
                    failure.database.display(),
                    failure.id,
                    failure.field.name()
                ));
                if detailed {
                    output.push_str(&format!("    Reason: {}\n", failure.reason));
                }
            }
            output.push('\n');
        }

        output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

        let attempted = self.fields_decrypted + self.fields_empty + self.field_failures.len();
        output.push_str(&format!(
            "\n📊 Summary: {}/{} fields decrypted, {} empty, {} failed\n\n",
            self.fields_decrypted,
            attempted,
            self.fields_empty,
            self.field_failures.len()
        ));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_profiles_do_not_fail_the_run() {
        let mut report = ScanReport::new();
        report.add_profile_skipped(&ProfileError::DatabaseNotFound(PathBuf::from("/p/signons.sqlite")));
        report.add_profile_skipped(&ProfileError::Corrupt {
            path: PathBuf::from("/q/signons.sqlite"),
            details: "malformed".into(),
        });

        assert!(report.success());
        assert_eq!(report.exit_code(), 0);
    }

    #[test]
    fn test_field_failure_degrades_the_run() {
        let mut report = ScanReport::new();
        report.add_field_decrypted();
        report.add_field_failure(
            Path::new("/p/signons.sqlite"),
            4,
            EncryptedField::Password,
            &DecryptError::Base64Decoding,
        );

        assert!(!report.success());
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.field_failures()[0].id, 4);
    }

    #[test]
    fn test_format_lists_failures() {
        let mut report = ScanReport::new();
        report.add_profile_scanned(Path::new("/p"), 2);
        report.add_field_decrypted();
        report.add_field_empty();
        report.add_field_failure(
            Path::new("/p/signons.sqlite"),
            9,
            EncryptedField::Username,
            &DecryptError::Decryption { status: -1 },
        );

        let text = report.format(true);

        assert!(text.contains("/p: 2 logins"));
        assert!(text.contains("/p/signons.sqlite id 9 (encryptedUsername)"));
        assert!(text.contains("Password decryption failed"));
        assert!(text.contains("1/3 fields decrypted, 1 empty, 1 failed"));
    }
}
