//! Read-only access to profile login databases
//!
//! Databases are never written: they are opened with `SQLITE_OPEN_READ_ONLY`
//! and checked with `PRAGMA quick_check` before any row is read, so a
//! corrupt or foreign file is reported as a bad database up front.

use crate::error::ProfileError;
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use tracing::{debug, warn};

/// Open a login database read-only and verify it can be queried.
pub fn open_login_database(db_path: &Path) -> Result<Connection, ProfileError> {
    if !db_path.exists() {
        return Err(ProfileError::DatabaseNotFound(db_path.to_path_buf()));
    }

    let bad = |source: rusqlite::Error| ProfileError::BadDatabase {
        path: db_path.to_path_buf(),
        source,
    };

    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(bad)?;

    // signons.sqlite keeps its schema revision in user_version
    let schema_version: i32 = conn
        .query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(bad)?;
    debug!("Database {:?} schema version: {}", db_path, schema_version);

    let integrity: String = conn
        .query_row("PRAGMA quick_check", [], |row| row.get(0))
        .map_err(bad)?;

    if integrity != "ok" {
        return Err(ProfileError::Corrupt {
            path: db_path.to_path_buf(),
            details: integrity,
        });
    }

    Ok(conn)
}

/// Close a connection, logging instead of failing if SQLite refuses.
pub fn close_login_database(conn: Connection, db_path: &Path) {
    if let Err((_conn, e)) = conn.close() {
        warn!("Failed to close database {:?}: {}", db_path, e);
    }
}
