//! Container repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide persistence APIs for the container forest.
//! - Keep child ordering and path resolution inside the repository boundary.
//!
//! # Invariants
//! - Child listing is deterministic: `name COLLATE NOCASE ASC, uuid ASC`.
//! - Deleting a container with children or items fails at the storage layer
//!   (`ON DELETE RESTRICT`); services check first to report counts.

use crate::model::container::{Container, ContainerId};
use crate::repo::{
    contains_pattern, count_to_u32, ensure_connection_ready, parse_uuid, RepoError, RepoResult,
    RequiredTable,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const CONTAINER_COLUMNS: &str = "uuid, name, description, image_path, parent_uuid, created_at";

/// Upper bound on ancestor walks; stops runaway recursion on corrupt data.
const MAX_PATH_DEPTH: i64 = 256;

const REQUIRED_TABLES: &[RequiredTable] = &[
    RequiredTable {
        name: "containers",
        columns: &[
            "uuid",
            "name",
            "description",
            "image_path",
            "parent_uuid",
            "created_at",
            "updated_at",
        ],
    },
    RequiredTable {
        name: "items",
        columns: &["uuid", "container_uuid"],
    },
];

/// Repository interface for container operations.
pub trait ContainerRepository {
    fn create_container(&self, container: &Container) -> RepoResult<ContainerId>;
    /// Replaces name, description, image and parent.
    fn update_container(&self, container: &Container) -> RepoResult<()>;
    fn get_container(&self, id: ContainerId) -> RepoResult<Option<Container>>;
    /// Lists direct children. `None` lists root containers.
    fn list_children(&self, parent_id: Option<ContainerId>) -> RepoResult<Vec<Container>>;
    /// Direct children of `parent_id` (roots for `None`) whose name contains
    /// `text`, case-insensitively.
    fn search_children(
        &self,
        parent_id: Option<ContainerId>,
        text: &str,
    ) -> RepoResult<Vec<Container>>;
    fn count_children(&self, id: ContainerId) -> RepoResult<u32>;
    fn count_items(&self, id: ContainerId) -> RepoResult<u32>;
    /// Returns the root-to-self chain. Empty when `id` does not exist.
    fn ancestors(&self, id: ContainerId) -> RepoResult<Vec<Container>>;
    fn delete_container(&self, id: ContainerId) -> RepoResult<()>;
}

/// SQLite-backed container repository.
pub struct SqliteContainerRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContainerRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl ContainerRepository for SqliteContainerRepository<'_> {
    fn create_container(&self, container: &Container) -> RepoResult<ContainerId> {
        container.validate()?;

        self.conn.execute(
            "INSERT INTO containers (
                uuid,
                name,
                description,
                image_path,
                parent_uuid,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                container.id.to_string(),
                container.name.as_str(),
                container.description.as_deref(),
                container.image_path.as_deref(),
                container.parent_id.map(|id| id.to_string()),
                container.created_at,
            ],
        )?;
        Ok(container.id)
    }

    fn update_container(&self, container: &Container) -> RepoResult<()> {
        container.validate()?;

        let changed = self.conn.execute(
            "UPDATE containers
             SET
                name = ?2,
                description = ?3,
                image_path = ?4,
                parent_uuid = ?5,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                container.id.to_string(),
                container.name.as_str(),
                container.description.as_deref(),
                container.image_path.as_deref(),
                container.parent_id.map(|id| id.to_string()),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::ContainerNotFound(container.id));
        }
        Ok(())
    }

    fn get_container(&self, id: ContainerId) -> RepoResult<Option<Container>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CONTAINER_COLUMNS} FROM containers WHERE uuid = ?1;"
        ))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_container_row(row)?));
        }
        Ok(None)
    }

    fn list_children(&self, parent_id: Option<ContainerId>) -> RepoResult<Vec<Container>> {
        self.query_children(parent_id, None)
    }

    fn search_children(
        &self,
        parent_id: Option<ContainerId>,
        text: &str,
    ) -> RepoResult<Vec<Container>> {
        self.query_children(parent_id, Some(text))
    }

    fn count_children(&self, id: ContainerId) -> RepoResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM containers WHERE parent_uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        count_to_u32(count, "containers.parent_uuid")
    }

    fn count_items(&self, id: ContainerId) -> RepoResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM items WHERE container_uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )?;
        count_to_u32(count, "items.container_uuid")
    }

    fn ancestors(&self, id: ContainerId) -> RepoResult<Vec<Container>> {
        let mut stmt = self.conn.prepare(
            "WITH RECURSIVE chain(uuid, depth) AS (
                SELECT uuid, 0
                FROM containers
                WHERE uuid = ?1
                UNION ALL
                SELECT c.parent_uuid, chain.depth + 1
                FROM containers c
                INNER JOIN chain ON c.uuid = chain.uuid
                WHERE c.parent_uuid IS NOT NULL
                  AND chain.depth < ?2
            )
            SELECT
                c.uuid AS uuid,
                c.name AS name,
                c.description AS description,
                c.image_path AS image_path,
                c.parent_uuid AS parent_uuid,
                c.created_at AS created_at
            FROM chain
            INNER JOIN containers c ON c.uuid = chain.uuid
            ORDER BY chain.depth DESC;",
        )?;
        let mut rows = stmt.query(params![id.to_string(), MAX_PATH_DEPTH])?;
        let mut path = Vec::new();
        while let Some(row) = rows.next()? {
            path.push(parse_container_row(row)?);
        }
        Ok(path)
    }

    fn delete_container(&self, id: ContainerId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM containers WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::ContainerNotFound(id));
        }
        Ok(())
    }
}

impl SqliteContainerRepository<'_> {
    fn query_children(
        &self,
        parent_id: Option<ContainerId>,
        name_contains: Option<&str>,
    ) -> RepoResult<Vec<Container>> {
        let mut sql = format!("SELECT {CONTAINER_COLUMNS} FROM containers WHERE ");
        let mut bind_values: Vec<Value> = Vec::new();
        match parent_id {
            Some(parent_id) => {
                sql.push_str("parent_uuid = ?");
                bind_values.push(Value::Text(parent_id.to_string()));
            }
            None => sql.push_str("parent_uuid IS NULL"),
        }
        if let Some(text) = name_contains {
            sql.push_str(" AND name LIKE ? ESCAPE '\\'");
            bind_values.push(Value::Text(contains_pattern(text)));
        }
        sql.push_str(" ORDER BY name COLLATE NOCASE ASC, uuid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut containers = Vec::new();
        while let Some(row) = rows.next()? {
            containers.push(parse_container_row(row)?);
        }
        Ok(containers)
    }
}

fn parse_container_row(row: &Row<'_>) -> RepoResult<Container> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "containers.uuid")?;
    let parent_id = row
        .get::<_, Option<String>>("parent_uuid")?
        .map(|value| parse_uuid(&value, "containers.parent_uuid"))
        .transpose()?;

    let container = Container {
        id,
        name: row.get("name")?,
        description: row.get("description")?,
        image_path: row.get("image_path")?,
        parent_id,
        created_at: row.get("created_at")?,
    };
    container.validate()?;
    Ok(container)
}
