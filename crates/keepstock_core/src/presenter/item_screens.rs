//! Item browser and item detail screen states.

use super::{
    list_all_items, ContainerSummary, ItemSummary, LoadError, UiState,
    CONTAINER_NOT_FOUND_MESSAGE, ITEM_NOT_FOUND_MESSAGE,
};
use crate::model::item::{Item, ItemId};
use crate::model::tag::normalize_tag;
use crate::repo::container_repo::SqliteContainerRepository;
use crate::repo::item_repo::{ContainerScope, ItemListQuery, SqliteItemRepository};
use crate::repo::tag_repo::SqliteTagRepository;
use crate::service::container_service::ContainerService;
use crate::service::item_service::ItemService;
use crate::service::tag_service::TagService;
use rusqlite::Connection;
use serde::Serialize;

/// What the item browser is narrowed to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemBrowserFilter {
    /// Substring of an item name or one of its tag names.
    pub text: Option<String>,
    pub scope: ContainerScope,
    pub tag: Option<String>,
}

impl ItemBrowserFilter {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn tag(tag: impl Into<String>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    pub fn within(mut self, scope: ContainerScope) -> Self {
        self.scope = scope;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemBrowserView {
    pub items: Vec<ItemSummary>,
    /// Every known tag, for filter chips.
    pub available_tags: Vec<String>,
    pub active_tag: Option<String>,
    /// Trimmed search text, `None` when blank.
    pub active_text: Option<String>,
    /// Container the listing is limited to, if any.
    pub active_container: Option<ContainerSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemDetailView {
    pub item: Item,
    pub status_label: String,
    /// Root-to-owner chain; empty for unsorted items.
    pub container_path: Vec<ContainerSummary>,
}

impl ItemDetailView {
    /// Name of the owning container, if any.
    pub fn container_name(&self) -> Option<&str> {
        self.container_path.last().map(|c| c.name.as_str())
    }
}

/// Loads every item matching `filter`, with no row cap.
pub fn load_item_browser(
    conn: &Connection,
    filter: &ItemBrowserFilter,
) -> UiState<ItemBrowserView> {
    UiState::from_load(
        build_item_browser(conn, filter),
        "item_browser",
        "Failed to load items.",
    )
}

/// Loads one item with its container path.
pub fn load_item_detail(conn: &Connection, id: ItemId) -> UiState<ItemDetailView> {
    UiState::from_load(
        build_item_detail(conn, id),
        "item_detail",
        "Failed to load item.",
    )
}

fn build_item_browser(
    conn: &Connection,
    filter: &ItemBrowserFilter,
) -> Result<ItemBrowserView, LoadError> {
    let items = ItemService::new(SqliteItemRepository::try_new(conn)?);
    let tags = TagService::new(SqliteTagRepository::try_new(conn)?);

    let active_container = match filter.scope {
        ContainerScope::In(container_id) => {
            let containers = ContainerService::new(SqliteContainerRepository::try_new(conn)?);
            let container = containers
                .get_container(container_id)?
                .ok_or(LoadError::Missing(CONTAINER_NOT_FOUND_MESSAGE))?;
            Some(ContainerSummary::from(&container))
        }
        ContainerScope::Any | ContainerScope::Unsorted => None,
    };
    let active_text = filter
        .text
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string);
    let active_tag = filter.tag.as_deref().and_then(normalize_tag);

    let listed = list_all_items(
        &items,
        ItemListQuery {
            scope: filter.scope,
            tag: active_tag.clone(),
            text: active_text.clone(),
            ..ItemListQuery::default()
        },
    )?;
    let available_tags = tags
        .list_tags()?
        .into_iter()
        .map(|usage| usage.tag.name)
        .collect();

    Ok(ItemBrowserView {
        items: listed.iter().map(ItemSummary::from).collect(),
        available_tags,
        active_tag,
        active_text,
        active_container,
    })
}

fn build_item_detail(conn: &Connection, id: ItemId) -> Result<ItemDetailView, LoadError> {
    let items = ItemService::new(SqliteItemRepository::try_new(conn)?);
    let item = items
        .get_item(id)?
        .ok_or(LoadError::Missing(ITEM_NOT_FOUND_MESSAGE))?;

    let container_path = match item.container_id {
        Some(container_id) => {
            let containers = ContainerService::new(SqliteContainerRepository::try_new(conn)?);
            containers
                .container_path(container_id)?
                .iter()
                .map(ContainerSummary::from)
                .collect()
        }
        None => Vec::new(),
    };

    Ok(ItemDetailView {
        status_label: item.status.label().to_string(),
        item,
        container_path,
    })
}
