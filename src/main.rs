use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use reqwest::{Client, Proxy};
use tracing::error;
use tracing_subscriber::EnvFilter;

mod cli;
mod download;
mod error;
mod orchestrator;
mod output;
mod pending;
mod provider;
mod record;

use cli::Cli;
use download::Downloader;
use orchestrator::Orchestrator;
use pending::PendingList;
use provider::Registry;

fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("nft_dl=info"));

    if json_format {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_client(cli: &Cli) -> Result<Client> {
    let mut builder = Client::builder();
    if let Some(proxy) = &cli.proxy {
        builder = builder.proxy(Proxy::all(proxy).context("Invalid proxy URL")?);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().context("Failed to build HTTP client")
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let client = build_client(&cli)?;
    let registry = Registry::standard().context("Failed to build provider registry")?;
    let downloader = Downloader::new(client.clone())
        .with_retries(cli.max_attempts, Duration::from_secs(cli.retry_delay));
    let orchestrator = Orchestrator::new(client, registry, downloader, &cli.output);

    let report = match &cli.url {
        Some(url) => orchestrator.run_batch(&[url.trim().to_owned()]).await,
        None => {
            if !cli.list_file.exists() {
                error!(
                    path = %cli.list_file.display(),
                    "URL not specified and list file does not exist"
                );
                return Ok(ExitCode::FAILURE);
            }
            let pending = PendingList::load(&cli.list_file)
                .await
                .with_context(|| format!("Failed to read {}", cli.list_file.display()))?;
            let report = orchestrator.run_batch(&pending.urls()).await;
            pending
                .rewrite_without(&report.succeeded)
                .await
                .with_context(|| format!("Failed to update {}", cli.list_file.display()))?;
            report
        }
    };

    if !report.remaining.is_empty() {
        println!("\n\nSome of the NFTs could not be downloaded. Please check the following URLs:");
        for url in &report.remaining {
            println!("{url}");
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
