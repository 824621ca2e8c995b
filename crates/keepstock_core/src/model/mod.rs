//! Inventory domain model.
//!
//! # Responsibility
//! - Define the records shared by repositories, services and presenters.
//! - Keep invariant checks next to the data they guard.
//!
//! # Invariants
//! - Items and containers are identified by stable UUIDs; tags by row id.
//! - Timestamps are Unix epoch milliseconds.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod container;
pub mod item;
pub mod tag;

/// Current wall-clock time in epoch milliseconds.
///
/// Clocks set before 1970 collapse to `0` rather than failing.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

pub(crate) fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
