//! Container use-case service.
//!
//! # Responsibility
//! - Validate container hierarchy invariants above the repository layer.
//! - Provide create, edit, move, list, path and guarded delete operations.
//!
//! # Invariants
//! - A parent container must exist when provided.
//! - Moves must not create parent-child cycles.
//! - A container with children or items cannot be deleted.

use crate::model::container::{Container, ContainerId, ContainerValidationError};
use crate::repo::container_repo::ContainerRepository;
use crate::repo::RepoError;
use log::{info, warn};
use serde::Serialize;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Reason reported while a container still holds something.
pub const DELETE_BLOCKED_REASON: &str = "Container must be empty to delete.";

/// Errors from container service operations.
#[derive(Debug)]
pub enum ContainerServiceError {
    Validation(ContainerValidationError),
    ContainerNotFound(ContainerId),
    ParentNotFound(ContainerId),
    /// Move would place a container under itself or one of its descendants.
    CycleDetected {
        container_id: ContainerId,
        parent_id: ContainerId,
    },
    /// Delete refused while the container still holds children or items.
    ContainerNotEmpty {
        container_id: ContainerId,
        subcontainer_count: u32,
        item_count: u32,
    },
    Repo(RepoError),
}

impl Display for ContainerServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ContainerNotFound(id) => write!(f, "container not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent container not found: {id}"),
            Self::CycleDetected {
                container_id,
                parent_id,
            } => write!(
                f,
                "move would create cycle: container {container_id} under parent {parent_id}"
            ),
            Self::ContainerNotEmpty {
                container_id,
                subcontainer_count,
                item_count,
            } => write!(
                f,
                "container {container_id} is not empty: {subcontainer_count} subcontainer(s), {item_count} item(s)"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContainerServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ContainerServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ContainerNotFound(id) => Self::ContainerNotFound(id),
            RepoError::ContainerValidation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ContainerValidationError> for ContainerServiceError {
    fn from(value: ContainerValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Input for [`ContainerService::create_container`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewContainer {
    pub name: String,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub parent_id: Option<ContainerId>,
}

impl NewContainer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn under(mut self, parent_id: ContainerId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }
}

/// Partial edit for [`ContainerService::update_container`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub image_path: Option<Option<String>>,
}

/// Whether a container may be deleted, and why not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteCheck {
    pub subcontainer_count: u32,
    pub item_count: u32,
    pub can_delete: bool,
    pub blocked_reason: Option<String>,
}

/// Container service facade.
pub struct ContainerService<R: ContainerRepository> {
    repo: R,
}

impl<R: ContainerRepository> ContainerService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates one container under an optional parent.
    pub fn create_container(
        &self,
        input: NewContainer,
    ) -> Result<Container, ContainerServiceError> {
        if let Some(parent_id) = input.parent_id {
            self.ensure_parent_exists(parent_id)?;
        }

        let container = Container::new(input.name)?
            .with_description(input.description)
            .with_image_path(input.image_path)
            .with_parent(input.parent_id);
        let id = self.repo.create_container(&container)?;
        info!("event=container_create module=container status=ok container_id={id}");
        self.require_container(id)
    }

    /// Applies a partial edit to name, description or image.
    pub fn update_container(
        &self,
        id: ContainerId,
        changes: ContainerChanges,
    ) -> Result<Container, ContainerServiceError> {
        let mut container = self.require_container(id)?;
        if let Some(name) = changes.name {
            container.name = name.trim().to_string();
        }
        if let Some(description) = changes.description {
            container = container.with_description(description);
        }
        if let Some(image_path) = changes.image_path {
            container = container.with_image_path(image_path);
        }
        container.validate()?;

        self.repo.update_container(&container)?;
        self.require_container(id)
    }

    pub fn get_container(
        &self,
        id: ContainerId,
    ) -> Result<Option<Container>, ContainerServiceError> {
        self.repo.get_container(id).map_err(Into::into)
    }

    pub fn list_roots(&self) -> Result<Vec<Container>, ContainerServiceError> {
        self.repo.list_children(None).map_err(Into::into)
    }

    /// Lists direct children of `parent_id`, or roots for `None`.
    pub fn list_children(
        &self,
        parent_id: Option<ContainerId>,
    ) -> Result<Vec<Container>, ContainerServiceError> {
        if let Some(parent_id) = parent_id {
            self.ensure_parent_exists(parent_id)?;
        }
        self.repo.list_children(parent_id).map_err(Into::into)
    }

    /// Finds direct children of `parent_id` (roots for `None`) by name
    /// substring. Blank text lists every child.
    pub fn search_children(
        &self,
        parent_id: Option<ContainerId>,
        text: &str,
    ) -> Result<Vec<Container>, ContainerServiceError> {
        if let Some(parent_id) = parent_id {
            self.ensure_parent_exists(parent_id)?;
        }
        let text = text.trim();
        if text.is_empty() {
            return self.repo.list_children(parent_id).map_err(Into::into);
        }
        self.repo.search_children(parent_id, text).map_err(Into::into)
    }

    /// Re-parents a container. `None` makes it a root.
    pub fn move_container(
        &self,
        id: ContainerId,
        new_parent_id: Option<ContainerId>,
    ) -> Result<Container, ContainerServiceError> {
        let mut container = self.require_container(id)?;

        if let Some(parent_id) = new_parent_id {
            if parent_id == id {
                return Err(ContainerServiceError::CycleDetected {
                    container_id: id,
                    parent_id,
                });
            }
            self.ensure_parent_exists(parent_id)?;
            if self.would_create_cycle(id, parent_id)? {
                return Err(ContainerServiceError::CycleDetected {
                    container_id: id,
                    parent_id,
                });
            }
        }

        container.parent_id = new_parent_id;
        self.repo.update_container(&container)?;
        self.require_container(id)
    }

    /// Reports whether the container can be deleted right now.
    pub fn delete_check(&self, id: ContainerId) -> Result<DeleteCheck, ContainerServiceError> {
        self.require_container(id)?;
        let subcontainer_count = self.repo.count_children(id)?;
        let item_count = self.repo.count_items(id)?;
        let can_delete = subcontainer_count == 0 && item_count == 0;

        Ok(DeleteCheck {
            subcontainer_count,
            item_count,
            can_delete,
            blocked_reason: (!can_delete).then(|| DELETE_BLOCKED_REASON.to_string()),
        })
    }

    /// Deletes an empty container.
    pub fn delete_container(&self, id: ContainerId) -> Result<(), ContainerServiceError> {
        let check = self.delete_check(id)?;
        if !check.can_delete {
            warn!(
                "event=container_delete module=container status=blocked container_id={} subcontainers={} items={}",
                id, check.subcontainer_count, check.item_count
            );
            return Err(ContainerServiceError::ContainerNotEmpty {
                container_id: id,
                subcontainer_count: check.subcontainer_count,
                item_count: check.item_count,
            });
        }

        self.repo.delete_container(id)?;
        info!("event=container_delete module=container status=ok container_id={id}");
        Ok(())
    }

    /// Returns the root-to-self chain for breadcrumb display.
    pub fn container_path(
        &self,
        id: ContainerId,
    ) -> Result<Vec<Container>, ContainerServiceError> {
        let path = self.repo.ancestors(id)?;
        if path.is_empty() {
            return Err(ContainerServiceError::ContainerNotFound(id));
        }
        Ok(path)
    }

    fn require_container(&self, id: ContainerId) -> Result<Container, ContainerServiceError> {
        self.repo
            .get_container(id)?
            .ok_or(ContainerServiceError::ContainerNotFound(id))
    }

    fn ensure_parent_exists(&self, parent_id: ContainerId) -> Result<(), ContainerServiceError> {
        self.repo
            .get_container(parent_id)?
            .map(|_| ())
            .ok_or(ContainerServiceError::ParentNotFound(parent_id))
    }

    fn would_create_cycle(
        &self,
        container_id: ContainerId,
        candidate_parent_id: ContainerId,
    ) -> Result<bool, ContainerServiceError> {
        let mut visited = HashSet::new();
        let mut cursor = Some(candidate_parent_id);
        while let Some(current) = cursor {
            if current == container_id {
                return Ok(true);
            }
            if !visited.insert(current) {
                return Ok(true);
            }

            let node = self
                .repo
                .get_container(current)?
                .ok_or(ContainerServiceError::ParentNotFound(current))?;
            cursor = node.parent_id;
        }
        Ok(false)
    }
}
