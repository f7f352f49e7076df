use super::url_builder::TrustedUrl;
use crate::fs::TrustedFile;
use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Downloads a single URL to a local file.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher {
    /// Writes the body at `url` to `dest`. Any failure, including a non-success status,
    /// is an error; a partially written `dest` may be left behind.
    async fn fetch(&self, url: &TrustedUrl, dest: &TrustedFile) -> Result<()>;
}

pub struct HttpFetcher {
    client: Client,
    show_progress: bool,
}

impl HttpFetcher {
    /// `timeout` of `None` keeps reqwest's defaults.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build().context("failed to build HTTP client")?,
            show_progress: true,
        })
    }

    pub fn without_progress(mut self) -> Self {
        self.show_progress = false;
        self
    }

    fn progress_bar(&self, total: u64) -> Result<ProgressBar> {
        if !self.show_progress {
            return Ok(ProgressBar::hidden());
        }
        let pb = ProgressBar::new(total);
        pb.set_style(ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
        )?);
        Ok(pb)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &TrustedUrl, dest: &TrustedFile) -> Result<()> {
        debug!(%url, %dest, "downloading");

        // SAFETY: we only request URLs built from the configured repository
        let response = self
            .client
            .get(url.as_url().clone())
            .send()
            .await
            .context("Failed to initiate download")?
            .error_for_status()
            .context("Download request failed, file not found")?;

        let total = response.content_length().unwrap_or(0);
        let pb = self.progress_bar(total)?;

        let mut file = dest.create_async().await?;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Download interrupted")?;
            file.write_all(&chunk).await?;
            pb.inc(chunk.len() as u64);
        }
        file.flush().await?;

        pb.finish_and_clear();
        Ok(())
    }
}
