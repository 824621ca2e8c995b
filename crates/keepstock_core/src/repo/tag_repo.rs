//! Tag repository contracts and SQLite implementation.
//!
//! # Invariants
//! - Tag lookups are case-insensitive (`COLLATE NOCASE`).
//! - Deleting a tag removes its item links via `ON DELETE CASCADE`.

use crate::model::tag::{Tag, TagUsage};
use crate::repo::{
    contains_pattern, count_to_u32, ensure_connection_ready, RepoError, RepoResult, RequiredTable,
};
use rusqlite::{
    params, params_from_iter, Connection, OptionalExtension, Transaction, TransactionBehavior,
};

const REQUIRED_TABLES: &[RequiredTable] = &[
    RequiredTable {
        name: "tags",
        columns: &["id", "name"],
    },
    RequiredTable {
        name: "item_tags",
        columns: &["item_uuid", "tag_id"],
    },
];

/// Repository interface for tag maintenance.
pub trait TagRepository {
    /// Lists every tag with its item count, sorted by name.
    fn list_tags(&self) -> RepoResult<Vec<TagUsage>>;
    /// Tags whose name contains `text`, with item counts, sorted by name.
    fn search_tags(&self, text: &str) -> RepoResult<Vec<TagUsage>>;
    fn get_tag_by_name(&self, name: &str) -> RepoResult<Option<Tag>>;
    /// Renames one tag; the new name must be normalized by the caller.
    fn rename_tag(&self, from: &str, to: &str) -> RepoResult<Tag>;
    fn delete_tag(&self, name: &str) -> RepoResult<()>;
    /// Deletes tags no item carries. Returns the number removed.
    fn prune_unused_tags(&self) -> RepoResult<u32>;
}

/// SQLite-backed tag repository.
pub struct SqliteTagRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTagRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl TagRepository for SqliteTagRepository<'_> {
    fn list_tags(&self) -> RepoResult<Vec<TagUsage>> {
        query_tag_usage(self.conn, None)
    }

    fn search_tags(&self, text: &str) -> RepoResult<Vec<TagUsage>> {
        query_tag_usage(self.conn, Some(text))
    }

    fn get_tag_by_name(&self, name: &str) -> RepoResult<Option<Tag>> {
        find_tag(self.conn, name)
    }

    fn rename_tag(&self, from: &str, to: &str) -> RepoResult<Tag> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let existing =
            find_tag(&tx, from)?.ok_or_else(|| RepoError::TagNotFound(from.to_string()))?;
        if let Some(conflict) = find_tag(&tx, to)? {
            if conflict.id != existing.id {
                return Err(RepoError::TagNameTaken(to.to_string()));
            }
        }

        tx.execute(
            "UPDATE tags SET name = ?2 WHERE id = ?1;",
            params![existing.id, to],
        )?;
        tx.commit()?;

        Ok(Tag {
            id: existing.id,
            name: to.to_string(),
        })
    }

    fn delete_tag(&self, name: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM tags WHERE name = ?1 COLLATE NOCASE;", [name])?;
        if changed == 0 {
            return Err(RepoError::TagNotFound(name.to_string()));
        }
        Ok(())
    }

    fn prune_unused_tags(&self) -> RepoResult<u32> {
        let removed = self.conn.execute(
            "DELETE FROM tags
             WHERE NOT EXISTS (
                SELECT 1 FROM item_tags it WHERE it.tag_id = tags.id
             );",
            [],
        )?;
        count_to_u32(removed as i64, "tags.id")
    }
}

fn query_tag_usage(conn: &Connection, name_contains: Option<&str>) -> RepoResult<Vec<TagUsage>> {
    let filter = if name_contains.is_some() {
        "WHERE t.name LIKE ?1 ESCAPE '\\'"
    } else {
        ""
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT t.id, t.name, COUNT(it.item_uuid)
         FROM tags t
         LEFT JOIN item_tags it ON it.tag_id = t.id
         {filter}
         GROUP BY t.id, t.name
         ORDER BY t.name COLLATE NOCASE ASC;"
    ))?;
    let bind_values: Vec<String> = name_contains.map(contains_pattern).into_iter().collect();
    let mut rows = stmt.query(params_from_iter(bind_values))?;
    let mut tags = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        tags.push(TagUsage {
            tag: Tag {
                id: row.get(0)?,
                name: name.to_lowercase(),
            },
            item_count: count_to_u32(row.get(2)?, "item_tags.item_uuid")?,
        });
    }
    Ok(tags)
}

fn find_tag(conn: &Connection, name: &str) -> RepoResult<Option<Tag>> {
    let tag = conn
        .query_row(
            "SELECT id, name FROM tags WHERE name = ?1 COLLATE NOCASE;",
            [name.trim()],
            |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get::<_, String>(1)?.to_lowercase(),
                })
            },
        )
        .optional()?;
    Ok(tag)
}
