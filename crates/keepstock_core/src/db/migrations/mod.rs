//! Ordered schema steps for the inventory database.
//!
//! Steps are append-only: a shipped step is never edited, new schema goes
//! into a new numbered file.

use crate::db::{DbError, DbResult};
use log::{debug, info};
use rusqlite::Connection;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "containers_items",
        sql: include_str!("0001_init.sql"),
    },
    Migration {
        version: 2,
        name: "tags",
        sql: include_str!("0002_tags.sql"),
    },
    Migration {
        version: 3,
        name: "items_fts",
        sql: include_str!("0003_items_fts.sql"),
    },
];

/// How a database's recorded version relates to this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaStatus {
    Current,
    Behind { db_version: u32 },
    Ahead { db_version: u32 },
}

/// Highest schema version this build can write.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Reads the schema version recorded in `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?)
}

pub fn schema_status(conn: &Connection) -> DbResult<SchemaStatus> {
    let db_version = current_user_version(conn)?;
    let latest = latest_version();
    Ok(if db_version == latest {
        SchemaStatus::Current
    } else if db_version < latest {
        SchemaStatus::Behind { db_version }
    } else {
        SchemaStatus::Ahead { db_version }
    })
}

/// Brings the schema to [`latest_version`] inside one transaction.
///
/// A database newer than this build is refused untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let from_version = match schema_status(conn)? {
        SchemaStatus::Current => return Ok(()),
        SchemaStatus::Ahead { db_version } => {
            return Err(DbError::UnsupportedSchemaVersion {
                db_version,
                latest_supported: latest_version(),
            })
        }
        SchemaStatus::Behind { db_version } => db_version,
    };

    let tx = conn.transaction()?;
    for step in MIGRATIONS.iter().filter(|step| step.version > from_version) {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
        debug!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            step.version, step.name
        );
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={} to_version={}",
        from_version,
        latest_version()
    );
    Ok(())
}
