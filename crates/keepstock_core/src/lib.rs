//! Core inventory logic for Keeping Stock.
//! Items, nested containers, tags and QR lookup live here; front ends only
//! render what the presenter returns.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod presenter;
pub mod qr;
pub mod repo;
pub mod search;
pub mod service;

pub use config::{ConfigError, StoreConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::container::{Container, ContainerId, ContainerValidationError};
pub use model::item::{Item, ItemId, ItemStatus, ItemValidationError};
pub use model::tag::{Tag, TagId, TagUsage};
pub use presenter::UiState;
pub use qr::{container_qr_payload, parse_container_qr, QrPayloadError};
pub use repo::container_repo::{ContainerRepository, SqliteContainerRepository};
pub use repo::item_repo::{ContainerScope, ItemListQuery, ItemRepository, SqliteItemRepository};
pub use repo::tag_repo::{SqliteTagRepository, TagRepository};
pub use repo::{RepoError, RepoResult};
pub use search::fts::{search_items, ItemSearchHit, ItemSearchQuery, SearchError, SearchResult};
pub use service::container_service::{
    ContainerChanges, ContainerService, ContainerServiceError, DeleteCheck, NewContainer,
};
pub use service::item_service::{
    ItemChanges, ItemService, ItemServiceError, ItemsListResult, NewItem,
};
pub use service::tag_service::{TagService, TagServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
