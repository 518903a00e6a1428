// Typed rows for the non-metric tables of a result database.
// Columns are mapped by position. Nullable text reads as an empty string;
// blob columns are never loaded, only their size in bytes.

use rusqlite::{params, Connection, Row};

use super::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    pub timestamp: f64,
    pub argv: String,
    pub pwd: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub timestamp: f64,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestorePoint {
    pub timestamp: f64,
    pub kind: String,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultEntry {
    pub timestamp: f64,
    pub kind: String,
    pub size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub created: f64,
    pub levelname: String,
    pub msg: String,
    pub filename: String,
    pub lineno: Option<i64>,
    pub func_name: String,
    pub module: String,
    pub name: String,
    pub pathname: String,
    pub process: Option<i64>,
    pub process_name: String,
    pub thread: Option<i64>,
    pub thread_name: String,
}

fn text(row: &Row, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

fn size(row: &Row, idx: usize) -> rusqlite::Result<Option<u64>> {
    Ok(row.get::<_, Option<i64>>(idx)?.map(|len| len.max(0) as u64))
}

fn query_all<T, F>(conn: &Connection, sql: &str, map: F) -> Result<Vec<T>, StoreError>
where
    F: FnMut(&Row) -> rusqlite::Result<T>,
{
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], map)?;
    Ok(rows.collect::<rusqlite::Result<Vec<T>>>()?)
}

pub fn read_metadata(conn: &Connection) -> Result<Vec<Metadata>, StoreError> {
    query_all(
        conn,
        "SELECT timestamp, argv, pwd FROM Metadata ORDER BY timestamp",
        |row| {
            Ok(Metadata {
                timestamp: row.get(0)?,
                argv: text(row, 1)?,
                pwd: text(row, 2)?,
            })
        },
    )
}

pub fn read_env_vars(conn: &Connection) -> Result<Vec<EnvVar>, StoreError> {
    query_all(
        conn,
        "SELECT key, value FROM MetadataEnvVars ORDER BY key",
        |row| {
            Ok(EnvVar {
                key: text(row, 0)?,
                value: text(row, 1)?,
            })
        },
    )
}

pub fn read_status_history(conn: &Connection) -> Result<Vec<StatusChange>, StoreError> {
    query_all(
        conn,
        "SELECT timestamp, status FROM StatusHistory ORDER BY timestamp, rowid",
        |row| {
            Ok(StatusChange {
                timestamp: row.get(0)?,
                status: text(row, 1)?,
            })
        },
    )
}

pub fn read_restore_points(conn: &Connection) -> Result<Vec<RestorePoint>, StoreError> {
    query_all(
        conn,
        "SELECT timestamp, type, LENGTH(CAST(restore_data AS BLOB)) FROM RestorePoint
            ORDER BY timestamp, rowid",
        |row| {
            Ok(RestorePoint {
                timestamp: row.get(0)?,
                kind: text(row, 1)?,
                size: size(row, 2)?,
            })
        },
    )
}

pub fn read_results(conn: &Connection) -> Result<Vec<ResultEntry>, StoreError> {
    query_all(
        conn,
        "SELECT timestamp, type, LENGTH(CAST(result AS BLOB)) FROM Result
            ORDER BY timestamp, rowid",
        |row| {
            Ok(ResultEntry {
                timestamp: row.get(0)?,
                kind: text(row, 1)?,
                size: size(row, 2)?,
            })
        },
    )
}

pub fn count_logs(conn: &Connection) -> Result<usize, StoreError> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM Logs", [], |row| row.get(0))?;
    Ok(count.max(0) as usize)
}

// Reads the oldest `limit` log records, or all of them when `limit` is None.
pub fn read_logs(conn: &Connection, limit: Option<usize>) -> Result<Vec<LogRecord>, StoreError> {
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
    let mut stmt = conn.prepare(
        "SELECT created, levelname, msg, filename, lineno, funcName, module, name,
            pathname, process, processName, thread, threadName
        FROM Logs ORDER BY created, rowid LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok(LogRecord {
            created: row.get(0)?,
            levelname: text(row, 1)?,
            msg: text(row, 2)?,
            filename: text(row, 3)?,
            lineno: row.get(4)?,
            func_name: text(row, 5)?,
            module: text(row, 6)?,
            name: text(row, 7)?,
            pathname: text(row, 8)?,
            process: row.get(9)?,
            process_name: text(row, 10)?,
            thread: row.get(11)?,
            thread_name: text(row, 12)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
