//! Connection setup for the inventory database.
//!
//! Every connection handed out here has `foreign_keys=ON` (container delete
//! guards and tag-link cascades depend on it) and a fully migrated schema.

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{debug, error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a connection points; decides which pragmas apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StoreKind {
    File,
    Memory,
}

impl StoreKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Memory => "memory",
        }
    }
}

/// Opens (creating if needed) the inventory database at `path`.
///
/// Missing parent directories are created, so a default per-user location
/// works on first run.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DbError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    connect(StoreKind::File, || Connection::open(path))
}

/// Opens a private in-memory inventory; used by tests and dry runs.
pub fn open_db_in_memory() -> DbResult<Connection> {
    connect(StoreKind::Memory, Connection::open_in_memory)
}

fn connect(
    kind: StoreKind,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    let result = open()
        .map_err(DbError::from)
        .and_then(|mut conn| configure(&mut conn, kind).map(|()| conn));

    let duration_ms = started_at.elapsed().as_millis();
    match &result {
        Ok(_) => info!(
            "event=db_open module=db status=ok mode={} duration_ms={duration_ms}",
            kind.as_str()
        ),
        Err(err) => error!(
            "event=db_open module=db status=error mode={} duration_ms={duration_ms} error={err}",
            kind.as_str()
        ),
    }
    result
}

fn configure(conn: &mut Connection, kind: StoreKind) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    if kind == StoreKind::File {
        // WAL lets a second process read while the CLI writes.
        let mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
        debug!("event=db_open module=db status=configured journal_mode={mode}");
    }
    apply_migrations(conn)
}
