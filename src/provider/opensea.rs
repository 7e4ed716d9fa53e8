//! Auction-style marketplace backed by a JSON asset API.

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::fetch_json;
use crate::error::{NftError, Result};
use crate::record::{sanitize_name, Links, NftRecord, NO_DESCRIPTION, UNKNOWN_FORMAT};

pub const DOMAIN: &str = "opensea.io";
pub const API_BASE: &str = "https://api.opensea.io/api/v1";
pub const GATEWAY_MARKER: &str = "ipfs.io/ipfs";
/// Asks the image CDN for the unscaled original.
const ORIGINAL_SIZE_SUFFIX: &str = "=s0";

#[derive(Debug, Default, Deserialize)]
struct Asset {
    name: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    image_original_url: Option<String>,
    creator: Option<Account>,
}

#[derive(Debug, Default, Deserialize)]
struct Account {
    user: Option<User>,
}

#[derive(Debug, Default, Deserialize)]
struct User {
    username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OpenseaIo {
    pub domain: String,
    pub api_base: String,
    /// Substring identifying an `image_original_url` that can be fetched as is.
    pub gateway_marker: String,
}

impl OpenseaIo {
    pub fn new(domain: &str, api_base: &str, gateway_marker: &str) -> Self {
        Self {
            domain: domain.to_owned(),
            api_base: api_base.trim_end_matches('/').to_owned(),
            gateway_marker: gateway_marker.to_owned(),
        }
    }

    /// Everything after `/assets/`, usually `{contract}/{token_id}`.
    pub fn asset_id_from_url(&self, listing_url: &str) -> Result<String> {
        listing_url
            .trim()
            .split_once("/assets/")
            .map(|(_, id)| id.split(['?', '#']).next().unwrap_or(id))
            .map(|id| id.trim_end_matches('/'))
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| NftError::InvalidListingUrl {
                provider: DOMAIN,
                url: listing_url.to_owned(),
            })
    }

    fn media_url(&self, asset: &Asset, listing_url: &str) -> Result<String> {
        if let Some(original) = asset
            .image_original_url
            .as_deref()
            .filter(|u| u.contains(self.gateway_marker.as_str()))
        {
            return Ok(original.to_owned());
        }
        asset
            .image_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|u| format!("{u}{ORIGINAL_SIZE_SUFFIX}"))
            .ok_or_else(|| NftError::MissingField {
                field: "image_url",
                url: listing_url.to_owned(),
            })
    }

    pub async fn resolve(&self, client: &Client, listing_url: &str) -> Result<NftRecord> {
        let asset_id = self.asset_id_from_url(listing_url)?;
        let api_url = format!("{}/asset/{}", self.api_base, asset_id);
        let metadata = fetch_json(client, &api_url).await?;
        let asset: Asset = serde_json::from_value(metadata.clone())?;

        let creator = asset
            .creator
            .as_ref()
            .and_then(|c| c.user.as_ref())
            .and_then(|u| u.username.as_deref())
            .map(sanitize_name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| NftError::CreatorNotFound(listing_url.to_owned()))?;

        let name = asset
            .name
            .as_deref()
            .map(sanitize_name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| sanitize_name(&asset_id));
        let description = asset
            .description
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| NO_DESCRIPTION.to_owned());

        let media_url = self.media_url(&asset, listing_url)?;
        let response = client.head(&media_url).send().await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        debug!(%media_url, ?content_type, "media headers");
        let format = format_from_content_type(content_type);

        Ok(NftRecord {
            listing_url: listing_url.to_owned(),
            creator,
            name,
            description,
            links: Links::new(listing_url, &media_url),
            format,
            raw_metadata: metadata,
        })
    }
}

/// Subtype of a MIME type, e.g. `png` for `image/png; charset=binary`.
fn format_from_content_type(content_type: Option<&str>) -> String {
    content_type
        .and_then(|ct| ct.split(';').next())
        .and_then(|mime| mime.trim().split_once('/'))
        .map(|(_, subtype)| subtype.trim())
        .filter(|subtype| !subtype.is_empty())
        .unwrap_or(UNKNOWN_FORMAT)
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::LinkKind;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider() -> OpenseaIo {
        OpenseaIo::new(DOMAIN, API_BASE, GATEWAY_MARKER)
    }

    #[test]
    fn asset_id_is_path_suffix() {
        let p = provider();
        assert_eq!(
            p.asset_id_from_url("https://opensea.io/assets/0xabc/42").unwrap(),
            "0xabc/42"
        );
        assert_eq!(
            p.asset_id_from_url("https://opensea.io/assets/xyz\n").unwrap(),
            "xyz"
        );
        assert!(p.asset_id_from_url("https://opensea.io/collection/x").is_err());
        assert!(p.asset_id_from_url("https://opensea.io/assets/").is_err());
    }

    #[test]
    fn content_type_subtype() {
        assert_eq!(format_from_content_type(Some("image/png")), "png");
        assert_eq!(format_from_content_type(Some("video/mp4; codecs=avc1")), "mp4");
        assert_eq!(format_from_content_type(Some("garbage")), UNKNOWN_FORMAT);
        assert_eq!(format_from_content_type(None), UNKNOWN_FORMAT);
    }

    #[test]
    fn media_url_prefers_gateway_original() {
        let p = provider();
        let asset = Asset {
            image_url: Some("https://cdn.example/img".into()),
            image_original_url: Some("https://ipfs.io/ipfs/Qx/art.gif".into()),
            ..Default::default()
        };
        assert_eq!(p.media_url(&asset, "u").unwrap(), "https://ipfs.io/ipfs/Qx/art.gif");

        let asset = Asset {
            image_url: Some("https://cdn.example/img".into()),
            image_original_url: Some("https://other.host/art.gif".into()),
            ..Default::default()
        };
        assert_eq!(p.media_url(&asset, "u").unwrap(), "https://cdn.example/img=s0");

        assert!(p.media_url(&Asset::default(), "u").is_err());
    }

    async fn mount_asset(server: &MockServer, body: Value) {
        Mock::given(method("GET"))
            .and(path("/api/v1/asset/0xabc/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn mock_provider(server: &MockServer) -> OpenseaIo {
        OpenseaIo::new(DOMAIN, &format!("{}/api/v1", server.uri()), GATEWAY_MARKER)
    }

    #[tokio::test]
    async fn resolve_against_mock_api() {
        let server = MockServer::start().await;
        let metadata = json!({
            "name": "Sun/Rise ",
            "description": "",
            "image_url": format!("{}/cdn/img", server.uri()),
            "image_original_url": null,
            "creator": { "user": { "username": "carol" } }
        });
        mount_asset(&server, metadata.clone()).await;
        Mock::given(method("HEAD"))
            .and(path("/cdn/img=s0"))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "image/jpeg"))
            .mount(&server)
            .await;

        let record = mock_provider(&server)
            .resolve(&Client::new(), "https://opensea.io/assets/0xabc/7")
            .await
            .unwrap();

        assert_eq!(record.creator, "carol");
        assert_eq!(record.name, "Sun-Rise");
        assert_eq!(record.description, NO_DESCRIPTION);
        assert_eq!(record.media_url(), format!("{}/cdn/img=s0", server.uri()));
        assert_eq!(record.links.get(LinkKind::Ipfs), None);
        assert_eq!(record.format, "jpeg");
        assert_eq!(record.raw_metadata, metadata);
    }

    #[tokio::test]
    async fn resolve_falls_back_to_asset_id_and_unknown_format() {
        let server = MockServer::start().await;
        mount_asset(
            &server,
            json!({
                "name": null,
                "image_url": format!("{}/cdn/raw", server.uri()),
                "creator": { "user": { "username": "dave" } }
            }),
        )
        .await;
        Mock::given(method("HEAD"))
            .and(path("/cdn/raw=s0"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let record = mock_provider(&server)
            .resolve(&Client::new(), "https://opensea.io/assets/0xabc/7")
            .await
            .unwrap();

        assert_eq!(record.name, "0xabc-7");
        assert_eq!(record.format, UNKNOWN_FORMAT);
    }

    #[tokio::test]
    async fn resolve_requires_creator() {
        let server = MockServer::start().await;
        mount_asset(
            &server,
            json!({ "name": "x", "creator": { "user": { "username": "" } } }),
        )
        .await;

        let err = mock_provider(&server)
            .resolve(&Client::new(), "https://opensea.io/assets/0xabc/7")
            .await
            .unwrap_err();
        assert!(matches!(err, NftError::CreatorNotFound(_)));
    }

    #[tokio::test]
    async fn resolve_keeps_creator_and_name_single_components() {
        let server = MockServer::start().await;
        mount_asset(
            &server,
            json!({
                "name": "..",
                "image_url": format!("{}/cdn/dots", server.uri()),
                "creator": { "user": { "username": "evil/../x" } }
            }),
        )
        .await;
        Mock::given(method("HEAD"))
            .and(path("/cdn/dots=s0"))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Type", "image/png"))
            .mount(&server)
            .await;

        let record = mock_provider(&server)
            .resolve(&Client::new(), "https://opensea.io/assets/0xabc/7")
            .await
            .unwrap();

        assert_eq!(record.creator, "evil-..-x");
        assert_eq!(record.name, "--");
    }

    #[tokio::test]
    async fn resolve_fails_on_api_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = mock_provider(&server)
            .resolve(&Client::new(), "https://opensea.io/assets/0xabc/7")
            .await
            .unwrap_err();
        assert!(matches!(err, NftError::HttpStatus { .. }));
    }
}
