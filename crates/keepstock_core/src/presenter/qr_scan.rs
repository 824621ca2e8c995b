//! QR scan screen state: scanned label text to container.

use super::{LoadError, UiState};
use crate::model::container::ContainerId;
use crate::qr::parse_container_qr;
use crate::repo::container_repo::SqliteContainerRepository;
use crate::service::container_service::ContainerService;
use log::info;
use rusqlite::Connection;
use serde::Serialize;

pub const SCAN_FAILED_MESSAGE: &str = "Failed to scan QR container.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QrScanResult {
    pub container_id: ContainerId,
    pub container_name: String,
}

/// Resolves scanned label text to an existing container.
///
/// Unreadable payloads and storage failures report a generic scan failure;
/// a well-formed label for a missing container names the scanned id.
pub fn scan_container(conn: &Connection, payload: &str) -> UiState<QrScanResult> {
    let container_id = match parse_container_qr(payload) {
        Ok(id) => id,
        Err(err) => {
            info!(
                "event=qr_scan module=presenter status=rejected reason={}",
                err.kind()
            );
            return UiState::error(SCAN_FAILED_MESSAGE);
        }
    };

    match lookup(conn, container_id) {
        Ok(Some(result)) => UiState::Success(result),
        Ok(None) => UiState::error(format!(
            "Scanned container {container_id} was not found."
        )),
        Err(err) => UiState::from_load(Err(err), "qr_scan", SCAN_FAILED_MESSAGE),
    }
}

fn lookup(conn: &Connection, container_id: ContainerId) -> Result<Option<QrScanResult>, LoadError> {
    let containers = ContainerService::new(SqliteContainerRepository::try_new(conn)?);
    Ok(containers
        .get_container(container_id)?
        .map(|container| QrScanResult {
            container_id: container.id,
            container_name: container.name,
        }))
}
