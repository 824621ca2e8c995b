//! Item use-case service.
//!
//! # Responsibility
//! - Create, edit, move, tag and delete items.
//! - Own the checkout/return lifecycle.
//!
//! # Invariants
//! - New items start `Stored`.
//! - Only `Stored` items can be checked out; only `TakenOut` items returned.
//! - Target containers must exist before an item is placed in them.
//! - Tag names are normalized to lowercase and deduplicated.

use crate::model::container::ContainerId;
use crate::model::item::{Item, ItemId, ItemValidationError};
use crate::model::now_epoch_ms;
use crate::model::tag::{normalize_tag, normalize_tags};
use crate::repo::item_repo::{normalize_item_limit, ItemListQuery, ItemRepository};
use crate::repo::RepoError;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for item use-cases.
#[derive(Debug)]
pub enum ItemServiceError {
    Validation(ItemValidationError),
    /// Tag input contains a blank value.
    InvalidTag(String),
    ItemNotFound(ItemId),
    ContainerNotFound(ContainerId),
    AlreadyTakenOut(ItemId),
    NotTakenOut(ItemId),
    Repo(RepoError),
    /// Write succeeded but read-back did not find the row.
    InconsistentState(&'static str),
}

impl Display for ItemServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidTag(value) => write!(f, "invalid tag: `{value}`"),
            Self::ItemNotFound(id) => write!(f, "item not found: {id}"),
            Self::ContainerNotFound(id) => write!(f, "container not found: {id}"),
            Self::AlreadyTakenOut(id) => write!(f, "item is already taken out: {id}"),
            Self::NotTakenOut(id) => write!(f, "item is not taken out: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent item state: {details}"),
        }
    }
}

impl Error for ItemServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ItemServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ItemNotFound(id) => Self::ItemNotFound(id),
            RepoError::ContainerNotFound(id) => Self::ContainerNotFound(id),
            RepoError::ItemValidation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ItemValidationError> for ItemServiceError {
    fn from(value: ItemValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Input for [`ItemService::create_item`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub container_id: Option<ContainerId>,
    pub tags: Vec<String>,
}

impl NewItem {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial edit for [`ItemService::update_item`]. `None` keeps the field;
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub image_path: Option<Option<String>>,
}

/// List result envelope used by service callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemsListResult {
    /// Items sorted by `name`, then `id`.
    pub items: Vec<Item>,
    /// Effective normalized limit used by the query.
    pub applied_limit: u32,
}

/// Item service facade over repository implementations.
pub struct ItemService<R: ItemRepository> {
    repo: R,
}

impl<R: ItemRepository> ItemService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one stored item and returns the persisted record.
    pub fn create_item(&self, input: NewItem) -> Result<Item, ItemServiceError> {
        let tags = validate_tags(input.tags)?;
        if let Some(container_id) = input.container_id {
            self.ensure_container_exists(container_id)?;
        }

        let mut item = Item::new(input.name)?
            .with_description(input.description)
            .with_image_path(input.image_path)
            .in_container(input.container_id);
        item.tags = tags;

        let id = self.repo.create_item(&item)?;
        info!("event=item_create module=item status=ok item_id={id}");
        self.read_back(id, "created item not found in read-back")
    }

    /// Applies a partial edit to name, description or image.
    pub fn update_item(&self, id: ItemId, changes: ItemChanges) -> Result<Item, ItemServiceError> {
        let mut item = self.require_item(id)?;
        if let Some(name) = changes.name {
            item.name = name.trim().to_string();
        }
        if let Some(description) = changes.description {
            item = item.with_description(description);
        }
        if let Some(image_path) = changes.image_path {
            item = item.with_image_path(image_path);
        }
        item.validate()?;

        self.repo.update_item(&item)?;
        self.read_back(id, "updated item not found in read-back")
    }

    pub fn get_item(&self, id: ItemId) -> Result<Option<Item>, ItemServiceError> {
        self.repo.get_item(id).map_err(Into::into)
    }

    /// Lists items using container scope, status, tag and text filters and
    /// pagination. Blank text is ignored.
    pub fn list_items(&self, query: ItemListQuery) -> Result<ItemsListResult, ItemServiceError> {
        let applied_limit = normalize_item_limit(query.limit);
        let query = ItemListQuery {
            tag: query.tag.and_then(|tag| normalize_tag(&tag)),
            text: query
                .text
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            limit: Some(applied_limit),
            ..query
        };
        let items = self.repo.list_items(&query)?;
        Ok(ItemsListResult {
            items,
            applied_limit,
        })
    }

    /// Moves an item into a container, or to unsorted with `None`.
    pub fn move_item(
        &self,
        id: ItemId,
        container_id: Option<ContainerId>,
    ) -> Result<Item, ItemServiceError> {
        let mut item = self.require_item(id)?;
        if let Some(container_id) = container_id {
            self.ensure_container_exists(container_id)?;
        }
        item.container_id = container_id;

        self.repo.update_item(&item)?;
        self.read_back(id, "moved item not found in read-back")
    }

    /// Marks a stored item as taken out, stamping the checkout time.
    pub fn check_out(&self, id: ItemId) -> Result<Item, ItemServiceError> {
        let mut item = self.require_item(id)?;
        if item.is_taken_out() {
            return Err(ItemServiceError::AlreadyTakenOut(id));
        }
        item.check_out(now_epoch_ms());

        self.repo.update_item(&item)?;
        info!("event=item_checkout module=item status=ok item_id={id}");
        self.read_back(id, "checked-out item not found in read-back")
    }

    /// Marks a taken-out item as stored again.
    ///
    /// With `Some(container)` the item is re-homed; with `None` it goes back
    /// to the container it was taken from.
    pub fn return_item(
        &self,
        id: ItemId,
        container_id: Option<ContainerId>,
    ) -> Result<Item, ItemServiceError> {
        let mut item = self.require_item(id)?;
        if !item.is_taken_out() {
            return Err(ItemServiceError::NotTakenOut(id));
        }
        if let Some(container_id) = container_id {
            self.ensure_container_exists(container_id)?;
            item.container_id = Some(container_id);
        }
        item.mark_returned();

        self.repo.update_item(&item)?;
        info!("event=item_return module=item status=ok item_id={id}");
        self.read_back(id, "returned item not found in read-back")
    }

    /// Atomically replaces the full tag set for one item.
    pub fn set_item_tags(&self, id: ItemId, tags: Vec<String>) -> Result<Item, ItemServiceError> {
        let normalized = validate_tags(tags)?;
        self.repo.set_item_tags(id, &normalized)?;
        self.read_back(id, "item missing after tag replacement")
    }

    pub fn delete_item(&self, id: ItemId) -> Result<(), ItemServiceError> {
        self.repo.delete_item(id)?;
        info!("event=item_delete module=item status=ok item_id={id}");
        Ok(())
    }

    fn require_item(&self, id: ItemId) -> Result<Item, ItemServiceError> {
        self.repo
            .get_item(id)?
            .ok_or(ItemServiceError::ItemNotFound(id))
    }

    fn ensure_container_exists(&self, id: ContainerId) -> Result<(), ItemServiceError> {
        if self.repo.container_exists(id)? {
            Ok(())
        } else {
            Err(ItemServiceError::ContainerNotFound(id))
        }
    }

    fn read_back(&self, id: ItemId, context: &'static str) -> Result<Item, ItemServiceError> {
        self.repo
            .get_item(id)?
            .ok_or(ItemServiceError::InconsistentState(context))
    }
}

fn validate_tags(tags: Vec<String>) -> Result<Vec<String>, ItemServiceError> {
    if let Some(blank) = tags.iter().find(|tag| tag.trim().is_empty()) {
        return Err(ItemServiceError::InvalidTag(blank.clone()));
    }
    Ok(normalize_tags(&tags))
}
