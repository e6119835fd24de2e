//! Explicit handle on the library database.
//!
//! A [`Store`] owns one SQLite connection and the case-folding rule used for
//! substring matches. It is opened by the caller and lent to the executor;
//! nothing in the crate holds a connection of its own.

pub mod schema;
pub mod stats;

pub use stats::LibraryStats;

use crate::error::Result;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// How text is folded before substring comparison.
///
/// The same rule is applied to the operand in Rust and to the column in SQL,
/// so both sides always agree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseFolding {
    /// Full Unicode lower-casing through the `casefold()` SQL function
    #[default]
    Unicode,
    /// ASCII-only lower-casing through SQLite's built-in `lower()`
    Ascii,
}

impl CaseFolding {
    /// SQL function applied to columns.
    pub fn sql_function(&self) -> &'static str {
        match self {
            CaseFolding::Unicode => "casefold",
            CaseFolding::Ascii => "lower",
        }
    }

    /// Fold an operand the way `sql_function` folds a column.
    pub fn fold(&self, text: &str) -> String {
        match self {
            CaseFolding::Unicode => text.to_lowercase(),
            CaseFolding::Ascii => text.to_ascii_lowercase(),
        }
    }
}

/// Library database handle
pub struct Store {
    conn: Connection,
    folding: CaseFolding,
}

impl Store {
    /// Open (or create) a database file for reading and writing.
    pub fn open(path: impl AsRef<Path>, folding: CaseFolding) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening store");
        Self::with_connection(Connection::open(path)?, folding)
    }

    /// Open an existing database without write access.
    pub fn open_read_only(path: impl AsRef<Path>, folding: CaseFolding) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "opening store read-only");
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::with_connection(conn, folding)
    }

    /// Private in-memory database, empty until `create_schema` runs.
    pub fn open_in_memory(folding: CaseFolding) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, folding)
    }

    fn with_connection(conn: Connection, folding: CaseFolding) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        register_casefold(&conn)?;
        Ok(Self { conn, folding })
    }

    /// Install the reference schema. Safe to run on a populated database.
    pub fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(schema::SCHEMA)?;
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn folding(&self) -> CaseFolding {
        self.folding
    }

    /// Summary counts over the whole library.
    pub fn library_stats(&self) -> Result<LibraryStats> {
        LibraryStats::collect(&self.conn)
    }
}

/// Register `casefold(text)`: Unicode lower-casing, NULL in, NULL out.
fn register_casefold(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "casefold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let folded = match ctx.get_raw(0) {
                ValueRef::Null | ValueRef::Blob(_) => None,
                ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).to_lowercase()),
                ValueRef::Integer(i) => Some(i.to_string()),
                ValueRef::Real(f) => Some(f.to_string()),
            };
            Ok(folded)
        },
    )
}
