//! Screen-level presentation states.
//!
//! # Responsibility
//! - Turn service results into `Loading / Success / Error` states.
//! - Map domain records into display summaries.
//!
//! # Invariants
//! - Loaders never panic; every failure becomes `UiState::Error`.
//! - Missing records surface a fixed user-facing message; storage failures
//!   are logged with detail and surface the caller's generic message.

use crate::model::container::{Container, ContainerId};
use crate::model::item::{Item, ItemId, ItemStatus};
use crate::repo::item_repo::{ItemListQuery, ItemRepository};
use crate::repo::RepoError;
use crate::search::fts::SearchError;
use crate::service::container_service::ContainerServiceError;
use crate::service::item_service::{ItemService, ItemServiceError};
use crate::service::tag_service::TagServiceError;
use log::warn;
use serde::Serialize;

pub mod container_screens;
pub mod item_screens;
pub mod qr_scan;
pub mod search_screen;

/// Rows fetched per round trip when a screen needs a full listing.
const LIST_PAGE_SIZE: u32 = 200;

pub const ITEM_NOT_FOUND_MESSAGE: &str = "Item not found.";
pub const CONTAINER_NOT_FOUND_MESSAGE: &str = "Container not found.";

/// Three-state screen model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "snake_case")]
pub enum UiState<T> {
    Loading,
    Success(T),
    Error { message: String },
}

impl<T> Default for UiState<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T> UiState<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn success(&self) -> Option<&T> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message.as_str()),
            _ => None,
        }
    }

    pub(crate) fn from_load(
        result: Result<T, LoadError>,
        screen: &'static str,
        failure_message: &str,
    ) -> Self {
        match result {
            Ok(value) => Self::Success(value),
            Err(LoadError::Missing(message)) => Self::error(message),
            Err(LoadError::Failed(detail)) => {
                warn!("event=screen_load module=presenter status=error screen={screen} error={detail}");
                Self::error(failure_message)
            }
        }
    }
}

/// Loader failure before it is collapsed into a [`UiState`].
#[derive(Debug)]
pub(crate) enum LoadError {
    /// Record is absent; carries the user-facing message.
    Missing(&'static str),
    /// Storage or consistency failure; carries diagnostic detail for logs.
    Failed(String),
}

impl From<RepoError> for LoadError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ItemNotFound(_) => Self::Missing(ITEM_NOT_FOUND_MESSAGE),
            RepoError::ContainerNotFound(_) => Self::Missing(CONTAINER_NOT_FOUND_MESSAGE),
            other => Self::Failed(other.to_string()),
        }
    }
}

impl From<ItemServiceError> for LoadError {
    fn from(value: ItemServiceError) -> Self {
        match value {
            ItemServiceError::ItemNotFound(_) => Self::Missing(ITEM_NOT_FOUND_MESSAGE),
            ItemServiceError::ContainerNotFound(_) => Self::Missing(CONTAINER_NOT_FOUND_MESSAGE),
            other => Self::Failed(other.to_string()),
        }
    }
}

impl From<ContainerServiceError> for LoadError {
    fn from(value: ContainerServiceError) -> Self {
        match value {
            ContainerServiceError::ContainerNotFound(_) | ContainerServiceError::ParentNotFound(_) => {
                Self::Missing(CONTAINER_NOT_FOUND_MESSAGE)
            }
            other => Self::Failed(other.to_string()),
        }
    }
}

impl From<TagServiceError> for LoadError {
    fn from(value: TagServiceError) -> Self {
        Self::Failed(value.to_string())
    }
}

impl From<SearchError> for LoadError {
    fn from(value: SearchError) -> Self {
        Self::Failed(value.to_string())
    }
}

/// Collects every item matching `query`, one page at a time.
pub(crate) fn list_all_items<R: ItemRepository>(
    service: &ItemService<R>,
    query: ItemListQuery,
) -> Result<Vec<Item>, LoadError> {
    let mut items = Vec::new();
    let mut offset = 0;
    loop {
        let page = service.list_items(ItemListQuery {
            limit: Some(LIST_PAGE_SIZE),
            offset,
            ..query.clone()
        })?;
        let fetched = page.items.len();
        items.extend(page.items);
        if fetched < page.applied_limit as usize {
            return Ok(items);
        }
        offset += page.applied_limit;
    }
}

/// Display summary of an item for list rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemSummary {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub status: ItemStatus,
    pub tag_names: Vec<String>,
}

impl From<&Item> for ItemSummary {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            description: item.description.clone(),
            image_path: item.image_path.clone(),
            status: item.status,
            tag_names: item.tags.clone(),
        }
    }
}

/// Display summary of a container for list rows and breadcrumbs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerSummary {
    pub id: ContainerId,
    pub name: String,
    pub description: Option<String>,
    pub image_path: Option<String>,
}

impl From<&Container> for ContainerSummary {
    fn from(container: &Container) -> Self {
        Self {
            id: container.id,
            name: container.name.clone(),
            description: container.description.clone(),
            image_path: container.image_path.clone(),
        }
    }
}
