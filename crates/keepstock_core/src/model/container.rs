//! Container domain model.
//!
//! # Invariants
//! - `parent_id == None` marks a root container.
//! - A container is never its own parent; deeper cycles are rejected by
//!   `ContainerService::move_container`.

use super::{normalize_optional_text, now_epoch_ms};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for a container.
pub type ContainerId = Uuid;

/// Physical storage location that can nest other containers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub id: ContainerId,
    pub name: String,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub parent_id: Option<ContainerId>,
    /// Epoch ms.
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerValidationError {
    BlankName,
    SelfParent,
}

impl Display for ContainerValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "container name must not be blank"),
            Self::SelfParent => write!(f, "container cannot be its own parent"),
        }
    }
}

impl Error for ContainerValidationError {}

impl Container {
    /// Creates a root container with a generated id.
    pub fn new(name: impl Into<String>) -> Result<Self, ContainerValidationError> {
        Self::with_id(Uuid::new_v4(), name)
    }

    pub fn with_id(
        id: ContainerId,
        name: impl Into<String>,
    ) -> Result<Self, ContainerValidationError> {
        let container = Self {
            id,
            name: name.into().trim().to_string(),
            description: None,
            image_path: None,
            parent_id: None,
            created_at: now_epoch_ms(),
        };
        container.validate()?;
        Ok(container)
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = normalize_optional_text(description);
        self
    }

    pub fn with_image_path(mut self, image_path: Option<String>) -> Self {
        self.image_path = normalize_optional_text(image_path);
        self
    }

    pub fn with_parent(mut self, parent_id: Option<ContainerId>) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn validate(&self) -> Result<(), ContainerValidationError> {
        if self.name.trim().is_empty() {
            return Err(ContainerValidationError::BlankName);
        }
        if self.parent_id == Some(self.id) {
            return Err(ContainerValidationError::SelfParent);
        }
        Ok(())
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::{Container, ContainerValidationError};

    #[test]
    fn self_parent_is_rejected() {
        let mut container = Container::new("Shelf").unwrap();
        container.parent_id = Some(container.id);
        assert_eq!(
            container.validate(),
            Err(ContainerValidationError::SelfParent)
        );
    }

    #[test]
    fn new_container_is_root() {
        let container = Container::new("Garage").unwrap();
        assert!(container.is_root());
        assert_eq!(
            Container::new(" ").unwrap_err(),
            ContainerValidationError::BlankName
        );
    }
}
