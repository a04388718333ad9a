use std::path::{Path, PathBuf};

use rusqlite::Connection;
use thiserror::Error;

use crate::version::VersionNumber;

/// Crate-wide error type.
///
/// The variants mirror the failure classes the sync engine and its callers
/// need to tell apart: fatal configuration problems, conditions that are
/// really no-ops, and plain storage failures.
#[derive(Debug, Error)]
pub enum Error {
    /// A read hit a table that was never created.
    #[error("table {0} is not initialized")]
    NotInitialized(String),

    /// The registry has no revision old enough for the running version.
    #[error("no {table} implementation registered at or below version {version}")]
    NoImplementationFound {
        table: &'static str,
        version: VersionNumber,
    },

    /// The join layer was asked for a filter combination it does not support.
    #[error("unsupported query shape: {0}")]
    UnsupportedQuery(&'static str),

    #[error("malformed version number: {0}")]
    MalformedVersion(String),

    /// Creating the database file's parent directory failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Maps "no such table" onto the dedicated not-initialized condition so
    /// that init code can treat it as the defined no-op outcome.
    fn classify(err: rusqlite::Error, table: &str) -> Self {
        if let rusqlite::Error::SqliteFailure(_, Some(msg)) = &err
            && msg.contains("no such table")
        {
            return Error::NotInitialized(table.to_string());
        }
        Error::Sqlite(err)
    }
}

/// Handle on the sqlite file backing all entity tables.
///
/// Cheap to clone; every operation opens its own scoped connection and drops
/// it on return, so no connection is ever held across calls.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let store = Self {
            path: path.to_path_buf(),
        };
        // Fail now rather than on the first table operation.
        store.connect()?;
        Ok(store)
    }

    pub fn connect(&self) -> Result<Connection> {
        Ok(Connection::open(&self.path)?)
    }

    /// Runs one statement or query against a fresh connection, mapping
    /// missing-table failures to [`Error::NotInitialized`] for `table`.
    pub fn with_conn<T>(
        &self,
        table: &str,
        op: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T> {
        let conn = self.connect()?;
        op(&conn).map_err(|err| Error::classify(err, table))
    }

    /// Creates a table, treating "already exists" as success. Any other
    /// failure is fatal to initialization and propagates.
    pub fn create_table(&self, table: &str, ddl: &str) -> Result<()> {
        let conn = self.connect()?;
        match conn.execute_batch(ddl) {
            Ok(()) => Ok(()),
            Err(err) => {
                if let rusqlite::Error::SqliteFailure(_, Some(msg)) = &err
                    && msg.contains("already exists")
                {
                    return Ok(());
                }
                Err(Error::classify(err, table))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Error, Store};

    fn temp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().expect("tmpdir");
        let store = Store::open(&dir.path().join("test.db")).expect("open store");
        (dir, store)
    }

    #[test]
    fn create_table_twice_is_ok() {
        let (_dir, store) = temp_store();
        let ddl = "CREATE TABLE widgets(name TEXT NOT NULL)";
        store.create_table("widgets", ddl).expect("first create");
        store.create_table("widgets", ddl).expect("second create");
    }

    #[test]
    fn missing_table_reads_as_not_initialized() {
        let (_dir, store) = temp_store();
        let err = store
            .with_conn("widgets", |conn| {
                conn.query_row("SELECT COUNT(*) FROM widgets", [], |row| {
                    row.get::<_, i64>(0)
                })
            })
            .expect_err("table does not exist");
        assert!(matches!(err, Error::NotInitialized(name) if name == "widgets"));
    }

    #[test]
    fn unusable_parent_directory_fails_open() {
        let dir = tempfile::tempdir().expect("tmpdir");
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"x").expect("write blocker");
        // The parent is a regular file, so the directory cannot be created.
        let err = Store::open(&blocker.join("test.db")).expect_err("parent is a file");
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn malformed_ddl_is_fatal() {
        let (_dir, store) = temp_store();
        assert!(store.create_table("widgets", "CREATE TABL widgets()").is_err());
    }
}
