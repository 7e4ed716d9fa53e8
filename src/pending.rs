use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

/// Snapshot of the pending-URL file taken at startup.
///
/// The file is rewritten once, after the batch, as the snapshot minus every line
/// equal to a URL that was downloaded.
#[derive(Debug, Clone)]
pub struct PendingList {
    path: PathBuf,
    lines: Vec<String>,
}

impl PendingList {
    pub async fn load(path: &Path) -> io::Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        Ok(Self {
            path: path.to_path_buf(),
            lines: content.lines().map(|l| l.trim().to_owned()).collect(),
        })
    }

    /// Non-blank entries in file order.
    pub fn urls(&self) -> Vec<String> {
        self.lines
            .iter()
            .filter(|l| !l.is_empty())
            .cloned()
            .collect()
    }

    /// Drops every line matching a succeeded URL and rewrites the file.
    pub async fn rewrite_without(&self, succeeded: &[String]) -> io::Result<()> {
        let done: HashSet<&str> = succeeded.iter().map(String::as_str).collect();
        let mut content = String::new();
        for line in self.lines.iter().filter(|l| !done.contains(l.as_str())) {
            content.push_str(line);
            content.push('\n');
        }
        info!(path = %self.path.display(), removed = done.len(), "updating pending list");
        tokio::fs::write(&self.path, content).await
    }
}
