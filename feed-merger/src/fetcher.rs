use crate::parser::FeedParser;
use crate::types::{AggregatorError, FetchConfig, Result, SourceOutcome};
use futures::future::join_all;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
    parser: FeedParser,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self {
            client,
            config,
            parser: FeedParser::new(),
        })
    }

    /// Download one feed body. Any non-success status is an error; there are
    /// no retries.
    pub async fn fetch_feed(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Fetching feed: {}", url);

        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AggregatorError::HttpStatus { status: status.as_u16() });
        }

        let limit = self.config.max_feed_size_mb * 1024 * 1024;
        if let Some(content_length) = response.content_length() {
            if content_length as usize > limit {
                return Err(AggregatorError::FeedTooLarge {
                    size_mb: content_length as usize / (1024 * 1024),
                });
            }
        }

        // Without a Content-Length (chunked or decoded bodies) the cap is
        // enforced while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() + chunk.len() > limit {
                return Err(AggregatorError::FeedTooLarge {
                    size_mb: (body.len() + chunk.len()) / (1024 * 1024),
                });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    /// Fetch and parse one source. Failures are logged and reported as a
    /// tagged outcome, never propagated.
    pub async fn fetch_source(&self, url: &str) -> SourceOutcome {
        let start_time = Instant::now();
        let result = match self.fetch_feed(url).await {
            Ok(content) => self.parser.parse_feed(url, &content),
            Err(e) => Err(e),
        };
        let response_time_ms = start_time.elapsed().as_millis() as u64;

        match result {
            Ok(entries) => {
                info!("Fetched {} entries from {} in {}ms", entries.len(), url, response_time_ms);
                SourceOutcome::Fetched {
                    source: url.to_string(),
                    entries,
                }
            }
            Err(e) => {
                error!("Fetching {}: {}", url, e);
                SourceOutcome::Failed {
                    source: url.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Fetch every source concurrently and wait for all of them. Outcomes are
    /// returned in the order of `urls`.
    pub async fn fetch_all(&self, urls: &[String]) -> Vec<SourceOutcome> {
        info!("Fetching {} feeds", urls.len());
        let outcomes = join_all(urls.iter().map(|url| self.fetch_source(url.trim()))).await;

        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        info!("Fetched {}/{} feeds", outcomes.len() - failed, outcomes.len());
        outcomes
    }
}
