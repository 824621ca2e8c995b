//! Search module.
//!
//! # Responsibility
//! - Provide keyword lookup over item names and descriptions.
//! - Combine text matches with tag and status filters.

pub mod fts;
