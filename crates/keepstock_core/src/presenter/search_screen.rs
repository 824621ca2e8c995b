//! Search screen state.

use super::{LoadError, UiState};
use crate::search::fts::{search_items, ItemSearchHit, ItemSearchQuery};
use rusqlite::Connection;
use serde::Serialize;

pub const SEARCH_FAILED_MESSAGE: &str = "Failed to search items.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSearchView {
    /// Text as the user typed it.
    pub text: String,
    pub hits: Vec<ItemSearchHit>,
}

impl ItemSearchView {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

pub fn load_item_search(conn: &Connection, query: &ItemSearchQuery) -> UiState<ItemSearchView> {
    UiState::from_load(
        build_item_search(conn, query),
        "item_search",
        SEARCH_FAILED_MESSAGE,
    )
}

fn build_item_search(
    conn: &Connection,
    query: &ItemSearchQuery,
) -> Result<ItemSearchView, LoadError> {
    let hits = search_items(conn, query)?;
    Ok(ItemSearchView {
        text: query.text.clone(),
        hits,
    })
}
