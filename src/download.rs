use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use tokio::time::Instant;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::error::Result;

const CHUNK_SIZE: usize = 4096;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Average transfer rate in MiB/s; zero when no time was measured.
fn throughput_mibps(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs == 0.0 {
        return 0.0;
    }
    bytes as f64 / (1024.0 * 1024.0) / secs
}

/// Streams media to disk, retrying with a fixed delay until the file on disk
/// matches the declared length.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    max_attempts: u32,
    retry_delay: Duration,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    pub fn with_retries(mut self, max_attempts: u32, retry_delay: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.retry_delay = retry_delay;
        self
    }

    /// Returns `false` once every attempt has failed; `path` is then left absent
    /// rather than holding a partial body.
    pub async fn download(&self, url: &str, path: &Path) -> bool {
        self.download_with(url, path, |declared| declared).await
    }

    /// `declared` maps the response's content length to the size the file must have.
    async fn download_with(
        &self,
        url: &str,
        path: &Path,
        declared: impl Fn(Option<u64>) -> Option<u64>,
    ) -> bool {
        let part = part_path(path);
        for retry in 0..self.max_attempts {
            info!(retry, url, "downloading media");
            match self.attempt(url, &part).await {
                Ok(content_length) => {
                    let expected = declared(content_length);
                    if !verify_download(&part, expected).await {
                        warn!(?expected, "downloaded size does not match content length");
                    } else if let Err(e) = tokio::fs::rename(&part, path).await {
                        warn!(error = %e, path = %path.display(), "failed to move download into place");
                    } else {
                        return true;
                    }
                }
                Err(e) => warn!(error = %e, "download attempt failed"),
            }
            let _ = tokio::fs::remove_file(&part).await;
            if retry + 1 < self.max_attempts {
                warn!(
                    "will try to download it again in {} seconds",
                    self.retry_delay.as_secs()
                );
                tokio::time::sleep(self.retry_delay).await;
            }
        }
        error!(url, attempts = self.max_attempts, "failed to download media");
        false
    }

    /// One GET into `path`, returning the declared content length if any.
    async fn attempt(&self, url: &str, path: &Path) -> Result<Option<u64>> {
        let start = Instant::now();
        let response = self.client.get(url).send().await?.error_for_status()?;
        let total_size = response.content_length();

        let mut file = File::create(path).await?;
        let written = match total_size {
            Some(total) => {
                let pb = ProgressBar::new(total);
                if let Ok(style) = ProgressStyle::default_bar().template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:50.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                ) {
                    pb.set_style(style.progress_chars("#>-"));
                }

                // stream downloading
                let mut stream = response.bytes_stream();
                let mut downloaded: u64 = 0;
                while let Some(chunk) = stream.next().await {
                    let chunk = chunk?;
                    for piece in chunk.chunks(CHUNK_SIZE) {
                        file.write_all(piece).await?;
                        downloaded += piece.len() as u64;
                        pb.set_position(downloaded);
                    }
                }
                pb.finish_and_clear();
                downloaded
            }
            None => {
                let body = response.bytes().await?;
                file.write_all(&body).await?;
                body.len() as u64
            }
        };
        file.sync_all().await?;

        debug!(
            bytes = written,
            "transfer finished at {:.2} MiB/s",
            throughput_mibps(written, start.elapsed())
        );
        Ok(total_size)
    }
}

/// The file must exist and, when a length was declared, have exactly that size.
async fn verify_download(path: &Path, expected: Option<u64>) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => expected.map_or(true, |len| meta.len() == len),
        Err(_) => false,
    }
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
