//! Marketplace providers.
//!
//! Each [`Provider`] knows which listing URLs it owns and how to turn one into an
//! [`NftRecord`]. The [`Registry`] tries providers in a fixed order; adding a
//! marketplace means adding a variant here.

pub mod foundation;
pub mod opensea;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::{NftError, Result};
use crate::record::NftRecord;

pub use foundation::FoundationApp;
pub use opensea::OpenseaIo;

#[derive(Debug, Clone)]
pub enum Provider {
    Foundation(FoundationApp),
    Opensea(OpenseaIo),
}

impl Provider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Foundation(_) => "foundation.app",
            Self::Opensea(_) => "opensea.io",
        }
    }

    pub fn domain(&self) -> &str {
        match self {
            Self::Foundation(p) => p.domain.as_str(),
            Self::Opensea(p) => p.domain.as_str(),
        }
    }

    pub fn matches(&self, listing_url: &str) -> bool {
        listing_url.contains(self.domain())
    }

    /// Directory name used for this provider in the output tree.
    pub fn output_label(&self) -> String {
        self.domain().replace('.', "_")
    }

    pub async fn resolve(&self, client: &Client, listing_url: &str) -> Result<NftRecord> {
        match self {
            Self::Foundation(p) => p.resolve(client, listing_url).await,
            Self::Opensea(p) => p.resolve(client, listing_url).await,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Registry {
    providers: Vec<Provider>,
}

impl Registry {
    pub fn new(providers: Vec<Provider>) -> Self {
        Self { providers }
    }

    /// Registry with the public marketplace endpoints.
    pub fn standard() -> std::result::Result<Self, regex::Error> {
        Ok(Self::new(vec![
            Provider::Foundation(FoundationApp::new(
                foundation::DOMAIN,
                foundation::IPFS_GATEWAY,
            )?),
            Provider::Opensea(OpenseaIo::new(
                opensea::DOMAIN,
                opensea::API_BASE,
                opensea::GATEWAY_MARKER,
            )),
        ]))
    }

    pub fn classify(&self, listing_url: &str) -> Result<&Provider> {
        self.providers
            .iter()
            .find(|p| p.matches(listing_url))
            .ok_or_else(|| NftError::UnrecognizedUrl(listing_url.to_owned()))
    }
}

/// GET a JSON document, treating any non-success status as fatal for the listing.
pub(crate) async fn fetch_json(client: &Client, url: &str) -> Result<Value> {
    debug!(url, "fetching JSON document");
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(NftError::HttpStatus {
            url: url.to_owned(),
            status,
        });
    }
    Ok(response.json().await?)
}
