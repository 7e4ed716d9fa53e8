//! Output layout for a resolved record:
//! `{base}/{provider}/{creator}/{name}/` holding `{name}.{format}`,
//! `metadata.json` and `README.md`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::error::{NftError, Result};
use crate::record::NftRecord;

const METADATA_FILE: &str = "metadata.json";
const README_FILE: &str = "README.md";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    pub dir: PathBuf,
    pub media: PathBuf,
    pub metadata: PathBuf,
    pub readme: PathBuf,
}

impl OutputLayout {
    pub fn new(base: &Path, provider_label: &str, record: &NftRecord) -> Self {
        let dir = base
            .join(provider_label)
            .join(&record.creator)
            .join(&record.name);
        Self {
            media: dir.join(format!("{}.{}", record.name, record.format)),
            metadata: dir.join(METADATA_FILE),
            readme: dir.join(README_FILE),
            dir,
        }
    }

    /// Creates the record directory; the base directory itself must already exist.
    pub async fn prepare(&self, base: &Path) -> Result<()> {
        if !tokio::fs::try_exists(base).await? {
            return Err(NftError::BaseDirMissing(base.to_path_buf()));
        }
        info!(dir = %self.dir.display(), "creating directory");
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(())
    }

    pub async fn write_metadata(&self, metadata: &Value) -> Result<()> {
        info!(path = %self.metadata.display(), "writing metadata");
        tokio::fs::write(&self.metadata, to_pretty_json(metadata)?).await?;
        Ok(())
    }

    pub async fn write_readme(&self, record: &NftRecord) -> Result<()> {
        info!(path = %self.readme.display(), "writing README");
        tokio::fs::write(&self.readme, render_readme(record)).await?;
        Ok(())
    }
}

/// Four-space indented JSON.
fn to_pretty_json(value: &Value) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;
    buf.push(b'\n');
    Ok(buf)
}

pub fn render_readme(record: &NftRecord) -> String {
    let mut md = format!("# {}\n\n{}\n\n## NFT Links\n\n", record.name, record.description);
    for (label, link) in record.links.iter() {
        let _ = writeln!(md, "- {label}: {link}");
    }
    md
}
