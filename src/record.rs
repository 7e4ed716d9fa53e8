use serde_json::Value;
use tracing::info;

/// Used when a provider has no description for the asset.
pub const NO_DESCRIPTION: &str = "No description provided";

/// Format reported when the media type cannot be determined.
pub const UNKNOWN_FORMAT: &str = "unknown";

/// Label of a link stored on a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    ListingUrl,
    Url,
    Ipfs,
}

impl LinkKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::ListingUrl => "listing_url",
            Self::Url => "url",
            Self::Ipfs => "ipfs",
        }
    }
}

/// Links of a record in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links(Vec<(LinkKind, String)>);

impl Links {
    pub fn new(listing_url: &str, media_url: &str) -> Self {
        Self(vec![
            (LinkKind::ListingUrl, listing_url.to_owned()),
            (LinkKind::Url, media_url.to_owned()),
        ])
    }

    pub fn with(mut self, kind: LinkKind, link: impl Into<String>) -> Self {
        let link = link.into();
        match self.0.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = link,
            None => self.0.push((kind, link)),
        }
        self
    }

    pub fn get(&self, kind: LinkKind) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, link)| link.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, link)| (k.label(), link.as_str()))
    }
}

/// Normalized asset produced by a provider, read-only once built.
#[derive(Debug, Clone)]
pub struct NftRecord {
    pub listing_url: String,
    pub creator: String,
    pub name: String,
    pub description: String,
    pub links: Links,
    pub format: String,
    pub raw_metadata: Value,
}

impl NftRecord {
    /// Directly fetchable media location.
    pub fn media_url(&self) -> &str {
        self.links.get(LinkKind::Url).unwrap_or_default()
    }

    pub fn log_summary(&self, provider: &str) {
        info!(
            provider,
            listing_url = %self.listing_url,
            creator = %self.creator,
            name = %self.name,
            format = %self.format,
            "metadata summary"
        );
        info!(description = %self.description);
        for (label, link) in self.links.iter() {
            info!(label, link, "link");
        }
    }
}

/// Makes `raw` usable as a single path component.
pub fn sanitize_name(raw: &str) -> String {
    let name = raw.replace(['/', '\\'], "-");
    match name.trim_end() {
        dots @ ("." | "..") => dots.replace('.', "-"),
        name => name.to_owned(),
    }
}
