//! Item repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD APIs over `items` plus the item/tag association.
//! - Own tag-link replacement with atomic semantics.
//!
//! # Invariants
//! - Write paths call `Item::validate()` before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Item listing is deterministic: `name COLLATE NOCASE ASC, uuid ASC`.

use crate::model::container::ContainerId;
use crate::model::item::{Item, ItemId, ItemStatus};
use crate::model::tag::normalize_tags;
use crate::repo::{
    contains_pattern, ensure_connection_ready, parse_uuid, RepoError, RepoResult, RequiredTable,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};

const ITEM_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    description,
    image_path,
    container_uuid,
    status,
    created_at,
    checked_out_at
FROM items";

const ITEMS_DEFAULT_LIMIT: u32 = 50;
const ITEMS_LIMIT_MAX: u32 = 200;

const REQUIRED_TABLES: &[RequiredTable] = &[
    RequiredTable {
        name: "items",
        columns: &[
            "uuid",
            "name",
            "description",
            "image_path",
            "container_uuid",
            "status",
            "created_at",
            "checked_out_at",
            "updated_at",
        ],
    },
    RequiredTable {
        name: "tags",
        columns: &["id", "name"],
    },
    RequiredTable {
        name: "item_tags",
        columns: &["item_uuid", "tag_id"],
    },
    RequiredTable {
        name: "containers",
        columns: &["uuid"],
    },
];

/// Which containers an item listing covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContainerScope {
    /// Every item regardless of placement.
    #[default]
    Any,
    /// Items with no container.
    Unsorted,
    /// Items placed directly inside one container.
    In(ContainerId),
}

/// Query options for listing items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemListQuery {
    pub scope: ContainerScope,
    pub status: Option<ItemStatus>,
    /// Optional single-tag exact match filter (case-insensitive).
    pub tag: Option<String>,
    /// Optional substring that must appear in the item name or one of its
    /// tag names (case-insensitive).
    pub text: Option<String>,
    /// Maximum rows to return. Defaults to 50 and clamps to 200.
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for item operations.
pub trait ItemRepository {
    /// Inserts the item row and its tag links in one transaction.
    fn create_item(&self, item: &Item) -> RepoResult<ItemId>;
    /// Replaces every persisted field, including the tag set.
    fn update_item(&self, item: &Item) -> RepoResult<()>;
    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>>;
    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<Item>>;
    /// Replaces all tags for the given item in one transaction.
    fn set_item_tags(&self, id: ItemId, tags: &[String]) -> RepoResult<()>;
    fn delete_item(&self, id: ItemId) -> RepoResult<()>;
    fn container_exists(&self, id: ContainerId) -> RepoResult<bool>;
}

/// SQLite-backed item repository.
pub struct SqliteItemRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteItemRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl ItemRepository for SqliteItemRepository<'_> {
    fn create_item(&self, item: &Item) -> RepoResult<ItemId> {
        item.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let item_uuid = item.id.to_string();
        tx.execute(
            "INSERT INTO items (
                uuid,
                name,
                description,
                image_path,
                container_uuid,
                status,
                created_at,
                checked_out_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                item_uuid.as_str(),
                item.name.as_str(),
                item.description.as_deref(),
                item.image_path.as_deref(),
                item.container_id.map(|id| id.to_string()),
                item_status_to_db(item.status),
                item.created_at,
                item.checked_out_at,
            ],
        )?;
        replace_item_tags(&tx, item_uuid.as_str(), &item.tags)?;
        tx.commit()?;

        Ok(item.id)
    }

    fn update_item(&self, item: &Item) -> RepoResult<()> {
        item.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let item_uuid = item.id.to_string();
        let changed = tx.execute(
            "UPDATE items
             SET
                name = ?2,
                description = ?3,
                image_path = ?4,
                container_uuid = ?5,
                status = ?6,
                checked_out_at = ?7,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            params![
                item_uuid.as_str(),
                item.name.as_str(),
                item.description.as_deref(),
                item.image_path.as_deref(),
                item.container_id.map(|id| id.to_string()),
                item_status_to_db(item.status),
                item.checked_out_at,
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::ItemNotFound(item.id));
        }

        replace_item_tags(&tx, item_uuid.as_str(), &item.tags)?;
        tx.commit()?;
        Ok(())
    }

    fn get_item(&self, id: ItemId) -> RepoResult<Option<Item>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ITEM_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_item_row(self.conn, row)?));
        }
        Ok(None)
    }

    fn list_items(&self, query: &ItemListQuery) -> RepoResult<Vec<Item>> {
        let mut sql = format!("{ITEM_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        match query.scope {
            ContainerScope::Any => {}
            ContainerScope::Unsorted => sql.push_str(" AND container_uuid IS NULL"),
            ContainerScope::In(container_id) => {
                sql.push_str(" AND container_uuid = ?");
                bind_values.push(Value::Text(container_id.to_string()));
            }
        }

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(item_status_to_db(status).to_string()));
        }

        if let Some(tag) = query.tag.as_ref() {
            sql.push_str(
                " AND EXISTS (
                    SELECT 1
                    FROM item_tags it
                    INNER JOIN tags t ON t.id = it.tag_id
                    WHERE it.item_uuid = items.uuid
                      AND t.name = ? COLLATE NOCASE
                )",
            );
            bind_values.push(Value::Text(tag.trim().to_string()));
        }

        if let Some(text) = query.text.as_ref() {
            let pattern = contains_pattern(text.trim());
            sql.push_str(
                " AND (
                    name LIKE ? ESCAPE '\\'
                    OR EXISTS (
                        SELECT 1
                        FROM item_tags it
                        INNER JOIN tags t ON t.id = it.tag_id
                        WHERE it.item_uuid = items.uuid
                          AND t.name LIKE ? ESCAPE '\\'
                    )
                )",
            );
            bind_values.push(Value::Text(pattern.clone()));
            bind_values.push(Value::Text(pattern));
        }

        sql.push_str(" ORDER BY name COLLATE NOCASE ASC, uuid ASC LIMIT ?");
        bind_values.push(Value::Integer(i64::from(normalize_item_limit(query.limit))));
        if query.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_item_row(self.conn, row)?);
        }
        Ok(items)
    }

    fn set_item_tags(&self, id: ItemId, tags: &[String]) -> RepoResult<()> {
        let item_uuid = id.to_string();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let changed = tx.execute(
            "UPDATE items
             SET updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [item_uuid.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::ItemNotFound(id));
        }

        replace_item_tags(&tx, item_uuid.as_str(), tags)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_item(&self, id: ItemId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM items WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::ItemNotFound(id));
        }
        Ok(())
    }

    fn container_exists(&self, id: ContainerId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM containers WHERE uuid = ?1);",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

/// Normalizes list limit according to the item listing contract.
pub fn normalize_item_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) | None => ITEMS_DEFAULT_LIMIT,
        Some(value) if value > ITEMS_LIMIT_MAX => ITEMS_LIMIT_MAX,
        Some(value) => value,
    }
}

fn replace_item_tags(conn: &Connection, item_uuid: &str, tags: &[String]) -> RepoResult<()> {
    conn.execute("DELETE FROM item_tags WHERE item_uuid = ?1;", [item_uuid])?;

    for tag in normalize_tags(tags) {
        conn.execute(
            "INSERT OR IGNORE INTO tags (name) VALUES (?1);",
            [tag.as_str()],
        )?;
        conn.execute(
            "INSERT OR IGNORE INTO item_tags (item_uuid, tag_id)
             SELECT ?1, id
             FROM tags
             WHERE name = ?2 COLLATE NOCASE;",
            params![item_uuid, tag.as_str()],
        )?;
    }
    Ok(())
}

pub(crate) fn load_tags_for_item(conn: &Connection, item_uuid: &str) -> RepoResult<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT t.name
         FROM item_tags it
         INNER JOIN tags t ON t.id = it.tag_id
         WHERE it.item_uuid = ?1
         ORDER BY t.name COLLATE NOCASE ASC;",
    )?;
    let mut rows = stmt.query([item_uuid])?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        tags.push(value.to_lowercase());
    }
    Ok(tags)
}

pub(crate) fn parse_item_row(conn: &Connection, row: &Row<'_>) -> RepoResult<Item> {
    let uuid_text: String = row.get("uuid")?;
    let id = parse_uuid(&uuid_text, "items.uuid")?;

    let container_id = row
        .get::<_, Option<String>>("container_uuid")?
        .map(|value| parse_uuid(&value, "items.container_uuid"))
        .transpose()?;

    let status_text: String = row.get("status")?;
    let status = parse_item_status(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid item status `{status_text}` in items.status"))
    })?;

    let item = Item {
        id,
        name: row.get("name")?,
        description: row.get("description")?,
        image_path: row.get("image_path")?,
        container_id,
        status,
        created_at: row.get("created_at")?,
        checked_out_at: row.get("checked_out_at")?,
        tags: load_tags_for_item(conn, &uuid_text)?,
    };
    item.validate()?;
    Ok(item)
}

pub(crate) fn item_status_to_db(status: ItemStatus) -> &'static str {
    match status {
        ItemStatus::Stored => "stored",
        ItemStatus::TakenOut => "taken_out",
    }
}

pub(crate) fn parse_item_status(value: &str) -> Option<ItemStatus> {
    match value {
        "stored" => Some(ItemStatus::Stored),
        "taken_out" => Some(ItemStatus::TakenOut),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_item_limit;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(normalize_item_limit(None), 50);
        assert_eq!(normalize_item_limit(Some(0)), 50);
        assert_eq!(normalize_item_limit(Some(7)), 7);
        assert_eq!(normalize_item_limit(Some(5_000)), 200);
    }
}
