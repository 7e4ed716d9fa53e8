use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

/// Failure while processing a single listing URL.
///
/// None of these stop a batch; the orchestrator logs them and keeps the URL pending.
#[derive(Debug, Error)]
pub enum NftError {
    #[error("unrecognized listing URL: {0}")]
    UnrecognizedUrl(String),

    #[error("invalid {provider} URL or user not found in URL: {url}")]
    InvalidListingUrl { provider: &'static str, url: String },

    #[error("metadata.json link not found on listing page: {0}")]
    MetadataLinkNotFound(String),

    #[error("request to {url} failed with status {status}")]
    HttpStatus { url: String, status: StatusCode },

    #[error("field `{field}` missing from metadata of {url}")]
    MissingField { field: &'static str, url: String },

    #[error("creator not found in metadata of {0}")]
    CreatorNotFound(String),

    #[error("base output directory does not exist: {0}")]
    BaseDirMissing(PathBuf),

    #[error("failed to download media from {0}")]
    DownloadFailed(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, NftError>;
