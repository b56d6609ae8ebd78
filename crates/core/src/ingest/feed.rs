use crate::config::Settings;
use crate::ingest::types::RawFeed;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use std::path::PathBuf;
use std::time::Duration;

/// Backoff doubles per attempt up to `1 << MAX_BACKOFF_EXPONENT` seconds.
const MAX_BACKOFF_EXPONENT: u32 = 6;

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn fetch(&self) -> Result<RawFeed>;
}

#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    http: reqwest::Client,
    url: String,
    retries: u32,
}

impl HttpFeedSource {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.feed_timeout_secs))
            .build()
            .context("failed to build feed http client")?;

        Ok(Self {
            http,
            url: settings.feed_url.clone(),
            retries: settings.feed_retries.max(1),
        })
    }

    async fn fetch_once(&self) -> Result<FetchOutcome> {
        let res = match self.http.get(&self.url).send().await {
            Ok(res) => res,
            Err(err) => {
                let err = anyhow::Error::new(err).context("feed request failed");
                return Ok(FetchOutcome::Retryable(err));
            }
        };

        let status = res.status();
        let bytes = match res.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                let err = anyhow::Error::new(err).context("failed to read feed response");
                return Ok(FetchOutcome::Retryable(err));
            }
        };

        if !status.is_success() {
            let err = anyhow::anyhow!("feed HTTP {status} for {}", self.url);
            return Ok(if is_retryable(status) {
                FetchOutcome::Retryable(err)
            } else {
                FetchOutcome::Fatal(err)
            });
        }

        let text = String::from_utf8(bytes.to_vec()).context("feed body is not valid UTF-8")?;
        Ok(FetchOutcome::Body(text))
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn backoff(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
    Duration::from_secs(1 << exponent)
}

enum FetchOutcome {
    Body(String),
    Retryable(anyhow::Error),
    Fatal(anyhow::Error),
}

#[async_trait::async_trait]
impl FeedSource for HttpFeedSource {
    fn source_name(&self) -> &'static str {
        "http_csv"
    }

    async fn fetch(&self) -> Result<RawFeed> {
        let mut attempt: u32 = 0;
        let text = loop {
            attempt += 1;
            match self.fetch_once().await? {
                FetchOutcome::Body(text) => break text,
                FetchOutcome::Fatal(err) => return Err(err),
                FetchOutcome::Retryable(err) => {
                    if attempt >= self.retries {
                        return Err(err);
                    }
                    let delay = backoff(attempt);
                    tracing::warn!(attempt, ?delay, error = %err, "feed fetch failed; retrying");
                    tokio::time::sleep(delay).await;
                }
            }
        };

        tracing::info!(url = %self.url, bytes = text.len(), "feed downloaded");
        RawFeed::from_csv(&text)
    }
}

/// Reads a previously downloaded feed from disk.
#[derive(Debug, Clone)]
pub struct FileFeedSource {
    path: PathBuf,
}

impl FileFeedSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl FeedSource for FileFeedSource {
    fn source_name(&self) -> &'static str {
        "file_csv"
    }

    async fn fetch(&self) -> Result<RawFeed> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("failed to read feed file {}", self.path.display()))?;
        RawFeed::from_csv(&text)
    }
}
