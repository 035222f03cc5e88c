use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CATALOG_FAILURE_MESSAGE: &str = "Fetching Pokédex Failed";
pub const CATALOG_FAILURE_REASON: &str =
    "The upstream Pokémon API is currently unreachable or returned an invalid response.";
/// Status reported when the upstream never produced an HTTP response.
pub const BAD_GATEWAY: u16 = 502;

/// Failures talking to PokeAPI.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    /// Upstream HTTP status, when the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Request { source, .. } => source.status().map(|status| status.as_u16()),
            ApiError::Decode { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogErrorData {
    pub reason: String,
    pub original_error: String,
}

/// User-facing catalog failure. Travels inside an action, so it is plain data.
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
#[error("{message} (HTTP {status}): {}", .data.reason)]
pub struct CatalogError {
    pub status: u16,
    pub message: String,
    pub data: CatalogErrorData,
}

impl From<ApiError> for CatalogError {
    fn from(err: ApiError) -> Self {
        Self {
            status: err.status().unwrap_or(BAD_GATEWAY),
            message: CATALOG_FAILURE_MESSAGE.to_string(),
            data: CatalogErrorData {
                reason: CATALOG_FAILURE_REASON.to_string(),
                original_error: err.to_string(),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session file {} is corrupted: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
