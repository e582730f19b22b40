//! Error taxonomy shared by the expander, the loader and the store.

use rusqlite::ErrorCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

// Extended result codes for constraint failures (sqlite3.h).
const SQLITE_CONSTRAINT_FOREIGNKEY: i32 = 787;
const SQLITE_CONSTRAINT_PRIMARYKEY: i32 = 1555;
const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

#[derive(Debug, Error)]
pub enum Error {
    /// An identifier or numeric key field could not be interpreted
    #[error("malformed {field} {value:?} in file {file_num:?}")]
    MalformedIdentifier {
        file_num: String,
        field: &'static str,
        value: String,
    },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("key already exists: {0}")]
    KeyConflict(String),

    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("write authorization required")]
    Unauthorized,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Sqlite(rusqlite::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn malformed(file_num: &str, field: &'static str, value: &str) -> Self {
        Error::MalformedIdentifier {
            file_num: file_num.to_string(),
            field,
            value: value.to_string(),
        }
    }
}

/// Constraint failures are mapped onto the typed variants so callers can match
/// on them without inspecting SQLite result codes.
impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, msg) = &err {
            if code.code == ErrorCode::ConstraintViolation {
                let detail = msg.clone().unwrap_or_else(|| code.to_string());
                match code.extended_code {
                    SQLITE_CONSTRAINT_FOREIGNKEY => return Error::ForeignKeyViolation(detail),
                    SQLITE_CONSTRAINT_PRIMARYKEY | SQLITE_CONSTRAINT_UNIQUE => {
                        return Error::KeyConflict(detail)
                    }
                    _ => {}
                }
            }
        }
        Error::Sqlite(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_primary_key_failure_maps_to_key_conflict() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY); INSERT INTO t VALUES (1);")
            .unwrap();
        let err: Error = conn.execute("INSERT INTO t VALUES (1)", []).unwrap_err().into();
        assert!(matches!(err, Error::KeyConflict(_)), "got {err:?}");
    }

    #[test]
    fn test_foreign_key_failure_maps_to_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             CREATE TABLE p (id TEXT PRIMARY KEY);
             CREATE TABLE c (pid TEXT, FOREIGN KEY (pid) REFERENCES p(id));",
        )
        .unwrap();
        let err: Error = conn
            .execute("INSERT INTO c VALUES ('missing')", [])
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::ForeignKeyViolation(_)), "got {err:?}");
    }

    #[test]
    fn test_malformed_message_names_file() {
        let err = Error::malformed("7A", "API", "Disposal");
        assert_eq!(err.to_string(), "malformed API \"Disposal\" in file \"7A\"");
    }
}
