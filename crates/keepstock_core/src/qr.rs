//! QR payload codec for container labels.
//!
//! # Responsibility
//! - Produce the text encoded into a container's printed QR label.
//! - Parse scanned label text back into a container id.
//!
//! # Invariants
//! - Payload format is `keepingstock://container/<uuid>`.
//! - Parsing ignores surrounding whitespace and scheme/host letter case.

use crate::model::container::ContainerId;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Prefix shared by every container label.
pub const CONTAINER_QR_PREFIX: &str = "keepingstock://container/";

static CONTAINER_QR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i:keepingstock://container)/([^/?#\s]+)/?$").expect("valid container qr regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrPayloadError {
    /// Payload is not a Keeping Stock container label.
    UnknownScheme(String),
    /// Payload has the right shape but the id is not a UUID.
    InvalidContainerId(String),
}

impl Display for QrPayloadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownScheme(payload) => {
                write!(f, "not a container label: `{payload}`")
            }
            Self::InvalidContainerId(value) => {
                write!(f, "container label has invalid id `{value}`")
            }
        }
    }
}

impl QrPayloadError {
    /// Stable name of the failure, safe to log without the payload.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownScheme(_) => "unknown_scheme",
            Self::InvalidContainerId(_) => "invalid_container_id",
        }
    }
}

impl Error for QrPayloadError {}

/// Builds the label payload for one container.
pub fn container_qr_payload(id: ContainerId) -> String {
    format!("{CONTAINER_QR_PREFIX}{id}")
}

/// Parses a scanned label payload into a container id.
pub fn parse_container_qr(payload: &str) -> Result<ContainerId, QrPayloadError> {
    let trimmed = payload.trim();
    let captures = CONTAINER_QR_RE
        .captures(trimmed)
        .ok_or_else(|| QrPayloadError::UnknownScheme(trimmed.to_string()))?;
    let raw_id = captures.get(1).map_or("", |m| m.as_str());
    Uuid::parse_str(raw_id).map_err(|_| QrPayloadError::InvalidContainerId(raw_id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{container_qr_payload, parse_container_qr, QrPayloadError};
    use uuid::Uuid;

    #[test]
    fn payload_parses_back_to_same_id() {
        let id = Uuid::new_v4();
        let payload = container_qr_payload(id);
        assert!(payload.starts_with("keepingstock://container/"));
        assert_eq!(parse_container_qr(&payload), Ok(id));
    }

    #[test]
    fn parse_tolerates_whitespace_case_and_trailing_slash() {
        let id = Uuid::parse_str("6f1c2a9e-3b1d-4c55-9a0e-2d7b8f0c1e42").unwrap();
        let scanned = "  KeepingStock://CONTAINER/6f1c2a9e-3b1d-4c55-9a0e-2d7b8f0c1e42/\n";
        assert_eq!(parse_container_qr(scanned), Ok(id));
    }

    #[test]
    fn parse_rejects_foreign_and_malformed_payloads() {
        assert!(matches!(
            parse_container_qr("https://example.com/container/1"),
            Err(QrPayloadError::UnknownScheme(_))
        ));
        assert_eq!(
            parse_container_qr("keepingstock://container/42"),
            Err(QrPayloadError::InvalidContainerId("42".to_string()))
        );
    }

    #[test]
    fn error_kind_never_echoes_the_payload() {
        let err = parse_container_qr("line one\nsecret line two").unwrap_err();
        assert_eq!(err.kind(), "unknown_scheme");
        assert!(!err.kind().contains('\n'));

        let err = parse_container_qr("keepingstock://container/not-a-uuid").unwrap_err();
        assert_eq!(err.kind(), "invalid_container_id");
    }
}
