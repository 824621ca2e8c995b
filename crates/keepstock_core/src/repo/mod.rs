//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for items, containers
//!   and tags.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes validate model invariants before persistence.
//! - Repository APIs return semantic errors (`ItemNotFound`, ...) in addition
//!   to DB transport errors.
//! - Repositories refuse connections that are not fully migrated.

use crate::db::migrations::{latest_version, schema_status, SchemaStatus};
use crate::db::DbError;
use crate::model::container::{ContainerId, ContainerValidationError};
use crate::model::item::{ItemId, ItemValidationError};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod container_repo;
pub mod item_repo;
pub mod tag_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by item, container and tag persistence.
#[derive(Debug)]
pub enum RepoError {
    ItemValidation(ItemValidationError),
    ContainerValidation(ContainerValidationError),
    Db(DbError),
    ItemNotFound(ItemId),
    ContainerNotFound(ContainerId),
    TagNotFound(String),
    /// Another tag already uses the requested name.
    TagNameTaken(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ItemValidation(err) => write!(f, "{err}"),
            Self::ContainerValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::ContainerNotFound(id) => write!(f, "container not found: {id}"),
            Self::TagNotFound(name) => write!(f, "tag not found: `{name}`"),
            Self::TagNameTaken(name) => write!(f, "tag name already in use: `{name}`"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "inventory repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "inventory repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "inventory repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted inventory data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ItemValidation(err) => Some(err),
            Self::ContainerValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ItemValidationError> for RepoError {
    fn from(value: ItemValidationError) -> Self {
        Self::ItemValidation(value)
    }
}

impl From<ContainerValidationError> for RepoError {
    fn from(value: ContainerValidationError) -> Self {
        Self::ContainerValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Table shape a repository depends on.
pub(crate) struct RequiredTable {
    pub name: &'static str,
    pub columns: &'static [&'static str],
}

/// Checks that `conn` is fully migrated and carries every listed column.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    tables: &[RequiredTable],
) -> RepoResult<()> {
    match schema_status(conn)? {
        SchemaStatus::Current => {}
        SchemaStatus::Behind { db_version } | SchemaStatus::Ahead { db_version } => {
            return Err(RepoError::UninitializedConnection {
                expected_version: latest_version(),
                actual_version: db_version,
            });
        }
    }

    for table in tables {
        let present = table_columns(conn, table.name)?;
        if present.is_empty() {
            return Err(RepoError::MissingRequiredTable(table.name));
        }
        if let Some(column) = table
            .columns
            .iter()
            .copied()
            .find(|column| !present.iter().any(|name| name == column))
        {
            return Err(RepoError::MissingRequiredColumn {
                table: table.name,
                column,
            });
        }
    }
    Ok(())
}

/// Column names of `table`; empty when the table does not exist.
fn table_columns(conn: &Connection, table: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1);")?;
    let names = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

pub(crate) fn count_to_u32(value: i64, column: &'static str) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid count `{value}` for {column}")))
}

/// Escapes `%`, `_` and `\` so `text` matches literally under `LIKE ... ESCAPE '\'`.
pub(crate) fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// `LIKE` pattern matching `text` anywhere in the value.
pub(crate) fn contains_pattern(text: &str) -> String {
    format!("%{}%", escape_like(text))
}

#[cfg(test)]
mod tests {
    use super::{contains_pattern, escape_like};

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(contains_pattern("box"), "%box%");
    }
}
