use std::path::PathBuf;

use reqwest::Client;
use tracing::{error, info};

use crate::download::Downloader;
use crate::error::{NftError, Result};
use crate::output::OutputLayout;
use crate::provider::Registry;

/// Outcome of a batch: URLs in input order, split by result.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub remaining: Vec<String>,
}

/// Drives listing URLs one at a time through resolve, layout, download and persist.
#[derive(Debug, Clone)]
pub struct Orchestrator {
    client: Client,
    registry: Registry,
    downloader: Downloader,
    base_dir: PathBuf,
}

impl Orchestrator {
    pub fn new(
        client: Client,
        registry: Registry,
        downloader: Downloader,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            registry,
            downloader,
            base_dir: base_dir.into(),
        }
    }

    /// Processes one listing URL, returning whether every artifact was written.
    pub async fn process_one(&self, listing_url: &str) -> bool {
        print_hard_line();
        info!(listing_url, "new listing URL detected");
        let result = self.try_process(listing_url).await;
        match &result {
            Ok(()) => info!(listing_url, "NFT downloaded successfully"),
            Err(e) => error!(listing_url, error = %e, "failed to download NFT"),
        }
        print_hard_line();
        result.is_ok()
    }

    async fn try_process(&self, listing_url: &str) -> Result<()> {
        let provider = self.registry.classify(listing_url)?;
        let record = provider.resolve(&self.client, listing_url).await?;
        record.log_summary(provider.name());

        let layout = OutputLayout::new(&self.base_dir, &provider.output_label(), &record);
        layout.prepare(&self.base_dir).await?;

        let media_url = record.media_url();
        if !self.downloader.download(media_url, &layout.media).await {
            return Err(NftError::DownloadFailed(media_url.to_owned()));
        }

        layout.write_metadata(&record.raw_metadata).await?;
        layout.write_readme(&record).await?;
        Ok(())
    }

    /// Processes `urls` sequentially; a failure never stops the batch.
    pub async fn run_batch(&self, urls: &[String]) -> BatchReport {
        let mut report = BatchReport::default();
        for url in urls {
            if self.process_one(url).await {
                report.succeeded.push(url.clone());
            } else {
                report.remaining.push(url.clone());
            }
        }
        report
    }
}

// Used only for output readability purposes
fn print_hard_line() {
    println!("\n{}\n", "#".repeat(79));
}
