//! Gallery-style marketplace: the listing page embeds a link to an IPFS
//! `metadata.json`, which in turn points at the media.

use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::fetch_json;
use crate::error::{NftError, Result};
use crate::record::{sanitize_name, LinkKind, Links, NftRecord, NO_DESCRIPTION, UNKNOWN_FORMAT};

pub const DOMAIN: &str = "foundation.app";
pub const IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";
const IPFS_SCHEME: &str = "ipfs://";

#[derive(Debug, Clone)]
pub struct FoundationApp {
    pub domain: String,
    pub gateway: String,
    metadata_link: Regex,
}

impl FoundationApp {
    pub fn new(domain: &str, gateway: &str) -> std::result::Result<Self, regex::Error> {
        let metadata_link = Regex::new(&format!(
            r#"{}[^"'\s<>]*?/metadata\.json"#,
            regex::escape(gateway)
        ))?;
        Ok(Self {
            domain: domain.to_owned(),
            gateway: gateway.to_owned(),
            metadata_link,
        })
    }

    /// The `@handle` in the first path segment of the listing URL.
    pub fn creator_from_url(&self, listing_url: &str) -> Result<String> {
        let invalid = || NftError::InvalidListingUrl {
            provider: DOMAIN,
            url: listing_url.to_owned(),
        };
        let url = Url::parse(listing_url).map_err(|_| invalid())?;
        url.path_segments()
            .and_then(|mut segments| segments.next())
            .filter(|segment| segment.contains('@'))
            .map(str::to_owned)
            .ok_or_else(invalid)
    }

    pub fn find_metadata_link<'a>(&self, html: &'a str) -> Option<&'a str> {
        self.metadata_link.find(html).map(|m| m.as_str())
    }

    /// Rewrites an `ipfs://` URI onto the HTTPS gateway.
    pub fn gateway_url(&self, uri: &str) -> String {
        match uri.strip_prefix(IPFS_SCHEME) {
            Some(rest) => format!("{}{}", self.gateway, rest),
            None => uri.to_owned(),
        }
    }

    pub fn normalize(&self, listing_url: &str, creator: String, metadata: Value) -> Result<NftRecord> {
        let missing = |field| NftError::MissingField {
            field,
            url: listing_url.to_owned(),
        };

        let name = metadata
            .get("name")
            .and_then(Value::as_str)
            .map(sanitize_name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| missing("name"))?;
        let description = metadata
            .get("description")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())
            .unwrap_or(NO_DESCRIPTION)
            .to_owned();
        let image = metadata
            .get("image")
            .and_then(Value::as_str)
            .filter(|i| !i.is_empty())
            .ok_or_else(|| missing("image"))?;

        let media_url = self.gateway_url(image);
        let format = extension_of(&media_url).unwrap_or(UNKNOWN_FORMAT).to_owned();
        let links = Links::new(listing_url, &media_url).with(LinkKind::Ipfs, image);

        Ok(NftRecord {
            listing_url: listing_url.to_owned(),
            creator,
            name,
            description,
            links,
            format,
            raw_metadata: metadata,
        })
    }

    pub async fn resolve(&self, client: &Client, listing_url: &str) -> Result<NftRecord> {
        let creator = self.creator_from_url(listing_url)?;

        let html = client.get(listing_url).send().await?.text().await?;
        let metadata_url = self
            .find_metadata_link(&html)
            .ok_or_else(|| NftError::MetadataLinkNotFound(listing_url.to_owned()))?;
        debug!(metadata_url, "found metadata link");

        let metadata = fetch_json(client, metadata_url).await?;
        self.normalize(listing_url, creator, metadata)
    }
}

/// File extension of the last path segment, ignoring query and fragment.
fn extension_of(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    file.rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}
