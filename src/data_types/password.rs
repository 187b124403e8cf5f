//! Login entry data type and extraction
//!
//! Rows come from the `moz_logins` table of `signons.sqlite`.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

/// Columns read from `moz_logins`, in `LoginEntry` field order
const LOGIN_COLUMNS: &str = "id, hostname, httpRealm, formSubmitURL, usernameField, passwordField, \
     encryptedUsername, encryptedPassword, guid, encType, \
     timeCreated, timeLastUsed, timePasswordChanged, timesUsed";

/// Saved login from a Mozilla profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginEntry {
    pub id: i64,
    pub hostname: String,
    pub http_realm: Option<String>,
    #[serde(rename = "formSubmitURL")]
    pub form_submit_url: Option<String>,
    pub username_field: String,
    pub password_field: String,
    pub encrypted_username: String,
    pub encrypted_password: String,
    pub guid: Option<String>,
    pub enc_type: Option<i64>,
    pub time_created: Option<i64>,
    pub time_last_used: Option<i64>,
    pub time_password_changed: Option<i64>,
    pub times_used: Option<i64>,

    // Not stored in the database; filled in after decryption
    pub decrypted_username: String,
    pub decrypted_password: String,
}

impl LoginEntry {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            hostname: row.get(1)?,
            http_realm: row.get(2)?,
            form_submit_url: row.get(3)?,
            username_field: row.get(4)?,
            password_field: row.get(5)?,
            encrypted_username: row.get(6)?,
            encrypted_password: row.get(7)?,
            guid: row.get(8)?,
            enc_type: row.get(9)?,
            time_created: row.get(10)?,
            time_last_used: row.get(11)?,
            time_password_changed: row.get(12)?,
            times_used: row.get(13)?,
            decrypted_username: String::new(),
            decrypted_password: String::new(),
        })
    }
}

/// Encrypted columns of a login and the derived column each one fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptedField {
    Username,
    Password,
}

impl EncryptedField {
    pub fn name(&self) -> &'static str {
        match self {
            EncryptedField::Username => "encryptedUsername",
            EncryptedField::Password => "encryptedPassword",
        }
    }

    pub fn decrypted_name(&self) -> &'static str {
        match self {
            EncryptedField::Username => "decryptedUsername",
            EncryptedField::Password => "decryptedPassword",
        }
    }

    pub fn ciphertext<'a>(&self, entry: &'a LoginEntry) -> &'a str {
        match self {
            EncryptedField::Username => &entry.encrypted_username,
            EncryptedField::Password => &entry.encrypted_password,
        }
    }

    pub fn store(&self, entry: &mut LoginEntry, plaintext: String) {
        match self {
            EncryptedField::Username => entry.decrypted_username = plaintext,
            EncryptedField::Password => entry.decrypted_password = plaintext,
        }
    }
}

/// Read every row of `moz_logins` with the decrypted fields left empty.
pub fn read_login_entries(conn: &Connection) -> rusqlite::Result<Vec<LoginEntry>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM moz_logins", LOGIN_COLUMNS))?;

    let entries = stmt
        .query_map([], LoginEntry::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(entries)
}
