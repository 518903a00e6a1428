use std::path::Path;

use rusqlite::{Connection, OpenFlags};
use thiserror::Error;

pub mod metrics;
pub mod records;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("error querying result database")]
    Query(#[from] rusqlite::Error),
    #[error("unknown metric type {0:?}")]
    UnknownKind(String),
    #[error("metric cursor already consumed")]
    Consumed,
}

// Result databases are only ever read. The instrumentation tool may still
// hold the file open, so no locks beyond a plain reader are taken.
pub fn open(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    Ok(conn)
}
