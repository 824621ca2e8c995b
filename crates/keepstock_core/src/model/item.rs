//! Item domain model.
//!
//! # Responsibility
//! - Define the canonical record for one trackable physical object.
//! - Provide checkout/return lifecycle helpers.
//!
//! # Invariants
//! - `id` is stable and never reused for another item.
//! - `checked_out_at` is `Some` if and only if `status == TakenOut`.
//! - `name` is never blank.

use super::container::ContainerId;
use super::{normalize_optional_text, now_epoch_ms};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for an item.
pub type ItemId = Uuid;

/// Storage state of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    /// Sitting in its container (or unsorted).
    Stored,
    /// Removed from storage by a checkout.
    TakenOut,
}

impl ItemStatus {
    /// Human-readable label used by presenters and the CLI.
    pub fn label(self) -> &'static str {
        match self {
            Self::Stored => "Stored",
            Self::TakenOut => "Taken out",
        }
    }
}

/// Canonical item record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub description: Option<String>,
    /// Opaque local image reference (file path or content URI).
    pub image_path: Option<String>,
    /// Owning container. `None` means the item is unsorted.
    pub container_id: Option<ContainerId>,
    pub status: ItemStatus,
    /// Epoch ms.
    pub created_at: i64,
    /// Epoch ms. Set only while `status == TakenOut`.
    pub checked_out_at: Option<i64>,
    /// Normalized tag names, sorted and unique.
    pub tags: Vec<String>,
}

/// Item invariant violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemValidationError {
    /// Name is empty after trimming.
    BlankName,
    /// `TakenOut` item without a checkout timestamp.
    MissingCheckoutTimestamp,
    /// `Stored` item still carrying a checkout timestamp.
    UnexpectedCheckoutTimestamp,
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankName => write!(f, "item name must not be blank"),
            Self::MissingCheckoutTimestamp => {
                write!(f, "taken-out item must carry a checkout timestamp")
            }
            Self::UnexpectedCheckoutTimestamp => {
                write!(f, "stored item must not carry a checkout timestamp")
            }
        }
    }
}

impl Error for ItemValidationError {}

impl Item {
    /// Creates a stored, unsorted item with a generated id.
    pub fn new(name: impl Into<String>) -> Result<Self, ItemValidationError> {
        Self::with_id(Uuid::new_v4(), name)
    }

    /// Creates a stored, unsorted item with a caller-provided id.
    ///
    /// Used by import paths where identity already exists externally.
    pub fn with_id(id: ItemId, name: impl Into<String>) -> Result<Self, ItemValidationError> {
        let item = Self {
            id,
            name: name.into().trim().to_string(),
            description: None,
            image_path: None,
            container_id: None,
            status: ItemStatus::Stored,
            created_at: now_epoch_ms(),
            checked_out_at: None,
            tags: Vec::new(),
        };
        item.validate()?;
        Ok(item)
    }

    /// Builder-style description setter; blank text clears the field.
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = normalize_optional_text(description);
        self
    }

    /// Builder-style image setter; blank text clears the field.
    pub fn with_image_path(mut self, image_path: Option<String>) -> Self {
        self.image_path = normalize_optional_text(image_path);
        self
    }

    /// Builder-style container setter.
    pub fn in_container(mut self, container_id: Option<ContainerId>) -> Self {
        self.container_id = container_id;
        self
    }

    /// Checks record invariants.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.name.trim().is_empty() {
            return Err(ItemValidationError::BlankName);
        }
        match (self.status, self.checked_out_at) {
            (ItemStatus::TakenOut, None) => Err(ItemValidationError::MissingCheckoutTimestamp),
            (ItemStatus::Stored, Some(_)) => Err(ItemValidationError::UnexpectedCheckoutTimestamp),
            _ => Ok(()),
        }
    }

    /// Whether the item is currently out of storage.
    pub fn is_taken_out(&self) -> bool {
        self.status == ItemStatus::TakenOut
    }

    /// Marks the item as taken out at `at_epoch_ms`.
    pub fn check_out(&mut self, at_epoch_ms: i64) {
        self.status = ItemStatus::TakenOut;
        self.checked_out_at = Some(at_epoch_ms);
    }

    /// Marks the item as stored again and clears the checkout timestamp.
    pub fn mark_returned(&mut self) {
        self.status = ItemStatus::Stored;
        self.checked_out_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::{Item, ItemStatus, ItemValidationError};

    #[test]
    fn new_item_starts_stored_and_unsorted() {
        let item = Item::new("  Hammer ").unwrap();
        assert_eq!(item.name, "Hammer");
        assert_eq!(item.status, ItemStatus::Stored);
        assert!(item.container_id.is_none());
        assert!(item.checked_out_at.is_none());
    }

    #[test]
    fn blank_name_is_rejected() {
        assert_eq!(Item::new("   ").unwrap_err(), ItemValidationError::BlankName);
    }

    #[test]
    fn checkout_timestamp_follows_status() {
        let mut item = Item::new("Drill").unwrap();
        item.check_out(1_000);
        assert!(item.is_taken_out());
        assert_eq!(item.validate(), Ok(()));

        item.checked_out_at = None;
        assert_eq!(
            item.validate(),
            Err(ItemValidationError::MissingCheckoutTimestamp)
        );

        item.mark_returned();
        item.checked_out_at = Some(5);
        assert_eq!(
            item.validate(),
            Err(ItemValidationError::UnexpectedCheckoutTimestamp)
        );
    }

    #[test]
    fn builders_drop_blank_optional_text() {
        let item = Item::new("Tape")
            .unwrap()
            .with_description(Some("   ".to_string()))
            .with_image_path(Some(" photos/tape.jpg ".to_string()));
        assert!(item.description.is_none());
        assert_eq!(item.image_path.as_deref(), Some("photos/tape.jpg"));
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_string(&ItemStatus::TakenOut).unwrap();
        assert_eq!(json, "\"taken_out\"");
    }
}
