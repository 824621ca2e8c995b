//! Container browser and container detail screen states.

use super::{
    list_all_items, ContainerSummary, ItemSummary, LoadError, UiState,
    CONTAINER_NOT_FOUND_MESSAGE,
};
use crate::model::container::ContainerId;
use crate::qr::container_qr_payload;
use crate::repo::container_repo::SqliteContainerRepository;
use crate::repo::item_repo::{ContainerScope, ItemListQuery, SqliteItemRepository};
use crate::service::container_service::ContainerService;
use crate::service::item_service::ItemService;
use rusqlite::Connection;
use serde::Serialize;

/// One level of the container tree.
///
/// At the top level `current` is `None`, `containers` are the roots and
/// `items` are the unsorted items. Both lists are complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerBrowserView {
    pub current: Option<ContainerSummary>,
    /// Root-to-current chain; empty at the top level.
    pub path: Vec<ContainerSummary>,
    pub containers: Vec<ContainerSummary>,
    pub items: Vec<ItemSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerDetailView {
    pub container_id: ContainerId,
    pub container_name: String,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub parent_container_id: Option<ContainerId>,
    /// Names from the root down to this container.
    pub path: Vec<String>,
    pub subcontainer_count: u32,
    pub item_count: u32,
    pub can_delete: bool,
    pub delete_blocked_reason: Option<String>,
    pub qr_payload: String,
}

pub fn load_container_browser(
    conn: &Connection,
    container_id: Option<ContainerId>,
) -> UiState<ContainerBrowserView> {
    UiState::from_load(
        build_container_browser(conn, container_id),
        "container_browser",
        "Failed to load containers.",
    )
}

pub fn load_container_detail(
    conn: &Connection,
    container_id: ContainerId,
) -> UiState<ContainerDetailView> {
    UiState::from_load(
        build_container_detail(conn, container_id),
        "container_detail",
        "Failed to load container.",
    )
}

fn build_container_browser(
    conn: &Connection,
    container_id: Option<ContainerId>,
) -> Result<ContainerBrowserView, LoadError> {
    let containers = ContainerService::new(SqliteContainerRepository::try_new(conn)?);
    let items = ItemService::new(SqliteItemRepository::try_new(conn)?);

    let path: Vec<ContainerSummary> = match container_id {
        Some(id) => containers
            .container_path(id)?
            .iter()
            .map(ContainerSummary::from)
            .collect(),
        None => Vec::new(),
    };
    let scope = match container_id {
        Some(id) => ContainerScope::In(id),
        None => ContainerScope::Unsorted,
    };

    let children = containers.list_children(container_id)?;
    let listed = list_all_items(
        &items,
        ItemListQuery {
            scope,
            ..ItemListQuery::default()
        },
    )?;

    Ok(ContainerBrowserView {
        current: path.last().cloned(),
        path,
        containers: children.iter().map(ContainerSummary::from).collect(),
        items: listed.iter().map(ItemSummary::from).collect(),
    })
}

fn build_container_detail(
    conn: &Connection,
    container_id: ContainerId,
) -> Result<ContainerDetailView, LoadError> {
    let containers = ContainerService::new(SqliteContainerRepository::try_new(conn)?);
    let container = containers
        .get_container(container_id)?
        .ok_or(LoadError::Missing(CONTAINER_NOT_FOUND_MESSAGE))?;
    let path = containers
        .container_path(container_id)?
        .into_iter()
        .map(|c| c.name)
        .collect();
    let check = containers.delete_check(container_id)?;

    Ok(ContainerDetailView {
        container_id: container.id,
        container_name: container.name,
        description: container.description,
        image_path: container.image_path,
        parent_container_id: container.parent_id,
        path,
        subcontainer_count: check.subcontainer_count,
        item_count: check.item_count,
        can_delete: check.can_delete,
        delete_blocked_reason: check.blocked_reason,
        qr_payload: container_qr_payload(container.id),
    })
}
