//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep CLI and presenter layers decoupled from storage details.

pub mod container_service;
pub mod item_service;
pub mod tag_service;
