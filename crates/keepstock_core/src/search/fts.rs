//! SQLite FTS5-based item search.
//!
//! # Responsibility
//! - Provide prefix keyword search over item name, description and tag names.
//! - Apply required-tag and status filters on top of text matches.
//!
//! # Invariants
//! - User text never reaches FTS5 unquoted; control characters are dropped.
//! - Result ordering is deterministic: rank, then `name`, then `uuid`.

use crate::db::DbError;
use crate::model::item::{ItemId, ItemStatus};
use crate::model::tag::normalize_tags;
use crate::repo::escape_like;
use crate::repo::item_repo::{item_status_to_db, parse_item_status};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const DEFAULT_SEARCH_LIMIT: u32 = 20;
const MAX_SEARCH_LIMIT: u32 = 100;

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug)]
pub enum SearchError {
    Db(DbError),
    /// A matched row could not be decoded into a hit.
    InvalidData(String),
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "item search failed: {err}"),
            Self::InvalidData(message) => write!(f, "invalid item search row: {message}"),
        }
    }
}

impl Error for SearchError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for SearchError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Item search options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSearchQuery {
    /// Free text; every whitespace-separated term must prefix-match the
    /// name, description or a tag.
    pub text: String,
    /// Tags the item must all carry.
    pub tags: Vec<String>,
    pub status: Option<ItemStatus>,
    /// Zero means the default of 20; clamped to 100.
    pub limit: u32,
}

impl ItemSearchQuery {
    /// Creates a text query with default limit and no filters.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tags: Vec::new(),
            status: None,
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_status(mut self, status: Option<ItemStatus>) -> Self {
        self.status = status;
        self
    }
}

/// Single search hit returned by [`search_items`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSearchHit {
    pub item_id: ItemId,
    pub name: String,
    pub status: ItemStatus,
    /// Matched fragment with `[`/`]` highlight markers, or the description
    /// (falling back to the name) for tag-only searches.
    pub snippet: String,
}

/// Searches items and returns ranked hits.
///
/// Every text term must prefix-match the item's name or description, or
/// prefix one of its tag names. Items matching all terms in their text rank
/// first by relevance; tag-only matches follow by name. Blank text with tags
/// lists tagged items; blank text without tags returns an empty list.
pub fn search_items(
    conn: &Connection,
    query: &ItemSearchQuery,
) -> SearchResult<Vec<ItemSearchHit>> {
    let limit = normalize_search_limit(query.limit);
    let terms = search_terms(&query.text);
    let tags = normalize_tags(&query.tags);
    if terms.is_empty() && tags.is_empty() {
        return Ok(Vec::new());
    }

    let match_expr = build_match_expression(&terms);
    let mut binds: Vec<Value> = Vec::new();
    let mut sql = String::from("SELECT items.uuid, items.name, items.status, ");
    match &match_expr {
        Some(expr) => {
            sql.push_str(
                "COALESCE(ranked.snippet, items.description, items.name)
                 FROM items
                 LEFT JOIN (
                    SELECT rowid,
                           bm25(items_fts) AS score,
                           snippet(items_fts, -1, '[', ']', ' ... ', 10) AS snippet
                    FROM items_fts
                    WHERE items_fts MATCH ?
                 ) ranked ON ranked.rowid = items.rowid",
            );
            binds.push(Value::Text(expr.clone()));
        }
        None => sql.push_str("COALESCE(items.description, items.name) FROM items"),
    }
    sql.push_str(" WHERE 1 = 1");

    for term in &terms {
        sql.push_str(
            " AND (
                items.rowid IN (SELECT rowid FROM items_fts WHERE items_fts MATCH ?)
                OR EXISTS (
                    SELECT 1 FROM item_tags it
                    JOIN tags t ON t.id = it.tag_id
                    WHERE it.item_uuid = items.uuid AND t.name LIKE ? ESCAPE '\\'
                )
            )",
        );
        binds.push(Value::Text(quote_term(term)));
        binds.push(Value::Text(format!("{}%", escape_like(&term.to_lowercase()))));
    }
    for tag in tags {
        sql.push_str(
            " AND EXISTS (
                SELECT 1 FROM item_tags it
                JOIN tags t ON t.id = it.tag_id
                WHERE it.item_uuid = items.uuid AND t.name = ? COLLATE NOCASE
            )",
        );
        binds.push(Value::Text(tag));
    }
    if let Some(status) = query.status {
        sql.push_str(" AND items.status = ?");
        binds.push(Value::Text(item_status_to_db(status).to_string()));
    }

    let rank = if match_expr.is_some() {
        "ranked.score IS NULL, ranked.score, "
    } else {
        ""
    };
    sql.push_str(&format!(
        " ORDER BY {rank}items.name COLLATE NOCASE ASC, items.uuid ASC LIMIT ?"
    ));
    binds.push(Value::Integer(i64::from(limit)));

    let mut stmt = conn.prepare(&sql)?;
    let hits = stmt
        .query_and_then(params_from_iter(binds), hit_from_row)?
        .collect::<SearchResult<Vec<_>>>()?;
    Ok(hits)
}

fn hit_from_row(row: &Row<'_>) -> SearchResult<ItemSearchHit> {
    let uuid_text: String = row.get(0)?;
    let item_id = Uuid::parse_str(&uuid_text)
        .map_err(|_| SearchError::InvalidData(format!("item uuid `{uuid_text}`")))?;
    let status_text: String = row.get(2)?;
    let status = parse_item_status(&status_text)
        .ok_or_else(|| SearchError::InvalidData(format!("item status `{status_text}`")))?;

    Ok(ItemSearchHit {
        item_id,
        name: row.get(1)?,
        status,
        snippet: row.get(3)?,
    })
}

/// Zero means "use the default"; anything above the cap is clamped.
fn normalize_search_limit(limit: u32) -> u32 {
    match limit {
        0 => DEFAULT_SEARCH_LIMIT,
        value => value.min(MAX_SEARCH_LIMIT),
    }
}

/// Splits free text into terms, dropping control characters FTS5 cannot
/// carry inside a quoted string.
fn search_terms(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|term| term.chars().filter(|ch| !ch.is_control()).collect::<String>())
        .filter(|term| !term.is_empty())
        .collect()
}

fn quote_term(term: &str) -> String {
    format!("\"{}\"*", term.replace('"', "\"\""))
}

/// ANDs every quoted prefix term together.
fn build_match_expression(terms: &[String]) -> Option<String> {
    (!terms.is_empty()).then(|| {
        terms
            .iter()
            .map(|term| quote_term(term))
            .collect::<Vec<_>>()
            .join(" AND ")
    })
}
