use std::path::{Path, PathBuf};

use clap::Parser;

use crate::download::{DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY};

/// Download NFTs from foundation.app or opensea.io
#[derive(Debug, Parser)]
#[command(name = "nft-dl", version, about)]
pub struct Cli {
    /// URL to download
    #[arg(short, long, env = "NFT_DL_URL")]
    pub url: Option<String>,

    /// Output directory
    #[arg(short, long, env = "NFT_DL_OUTPUT", default_value_os_t = default_output_dir())]
    pub output: PathBuf,

    /// List file path of NFT URLs
    #[arg(short, long, env = "NFT_DL_LIST_FILE", default_value_os_t = default_list_file())]
    pub list_file: PathBuf,

    /// Download attempts per media file
    #[arg(long, default_value_t = DEFAULT_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_attempts: u32,

    /// Seconds to wait between download attempts
    #[arg(long, default_value_t = DEFAULT_RETRY_DELAY.as_secs())]
    pub retry_delay: u64,

    /// Route all requests through this proxy
    #[arg(long, env = "NFT_DL_PROXY")]
    pub proxy: Option<String>,

    /// Per-request timeout in seconds (none by default)
    #[arg(long)]
    pub timeout: Option<u64>,
}

fn running_in_docker() -> bool {
    Path::new("/.dockerenv").exists()
        || std::fs::read_to_string("/proc/self/cgroup")
            .map(|cgroup| cgroup.contains("docker"))
            .unwrap_or(false)
}

fn default_output_dir() -> PathBuf {
    if running_in_docker() {
        PathBuf::from("/downloads")
    } else {
        PathBuf::from(".")
    }
}

fn default_list_file() -> PathBuf {
    if running_in_docker() {
        PathBuf::from("/nft_list.txt")
    } else {
        PathBuf::from("nft_list.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let cli = Cli::try_parse_from([
            "nft-dl",
            "-u",
            "https://opensea.io/assets/0xabc/1",
            "-o",
            "/tmp/out",
            "-l",
            "list.txt",
        ])
        .unwrap();
        assert_eq!(cli.url.as_deref(), Some("https://opensea.io/assets/0xabc/1"));
        assert_eq!(cli.output, PathBuf::from("/tmp/out"));
        assert_eq!(cli.list_file, PathBuf::from("list.txt"));
        assert_eq!(cli.max_attempts, 5);
        assert_eq!(cli.retry_delay, 5);
    }

    #[test]
    fn rejects_zero_attempts() {
        assert!(Cli::try_parse_from(["nft-dl", "--max-attempts", "0"]).is_err());
    }
}
