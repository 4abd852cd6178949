//! RangeFetcher (C1): an HTTP byte-range client with a bounded concurrency,
//! retry-with-backoff, and a small LRU chunk cache so re-entrant access patterns
//! (xref, object streams, metadata) never re-download a byte twice per call.
//!
//! Grounded on `core::async_http_chunked_stream`'s reqwest-based range-request
//! plumbing, generalised from "one open stream" into a shared fetcher any number
//! of workers can pull chunks from concurrently.

use std::error::Error as StdError;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lru::LruCache;
use reqwest::{Client, StatusCode};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, warn};

use crate::config::Thresholds;
use crate::pipeline_error::{ConvertError, ConvertResultT};

/// Result of [`RangeFetcher::probe`].
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub total_size: u64,
    pub prefix: Vec<u8>,
    /// `true` when the probe request already returned the entire file (small
    /// file, or a server that ignored the Range header and sent 200).
    pub fully_buffered: bool,
}

/// Aligned-offset chunk cache key.
type ChunkKey = u64;

struct FetcherInner {
    cache: LruCache<ChunkKey, Arc<[u8]>>,
}

/// Observability counters, not control-plane (§4.1 "Stats").
#[derive(Debug, Default)]
pub struct FetchStats {
    pub successful_requests: AtomicU64,
    pub bytes_transferred: AtomicU64,
    pub retried_requests: AtomicU64,
}

/// HTTP byte-range client shared by every worker within one `convert` call.
pub struct RangeFetcher {
    url: String,
    client: Client,
    semaphore: Arc<Semaphore>,
    inner: Mutex<FetcherInner>,
    chunk_size: u64,
    thresholds: Thresholds,
    pub stats: Arc<FetchStats>,
}

const MAX_CACHED_CHUNKS: usize = 64;

impl RangeFetcher {
    pub fn new(url: impl Into<String>, thresholds: Thresholds) -> ConvertResultT<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(thresholds.range_request_timeout_secs))
            .build()
            .map_err(|e| ConvertError::ConfigError(format!("failed to build HTTP client: {e}")))?;

        Ok(RangeFetcher {
            url: url.into(),
            client,
            semaphore: Arc::new(Semaphore::new(thresholds.range_max_concurrency)),
            inner: Mutex::new(FetcherInner {
                cache: LruCache::new(
                    NonZeroUsize::new(MAX_CACHED_CHUNKS).expect("MAX_CACHED_CHUNKS is nonzero"),
                ),
            }),
            chunk_size: thresholds.range_chunk_size as u64,
            stats: Arc::new(FetchStats::default()),
            thresholds,
        })
    }

    /// Issues a single `0..PROBE_SIZE-1` range request to recover the total file
    /// size and an initial prefix, per §4.1.
    pub async fn probe(&self) -> ConvertResultT<ProbeResult> {
        let probe_size = self.thresholds.probe_size as u64;
        let response = self
            .client
            .get(&self.url)
            .header("Range", format!("bytes=0-{}", probe_size.saturating_sub(1)))
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        let content_range = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let content_length = response
            .headers()
            .get("content-length")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        if status != StatusCode::PARTIAL_CONTENT && status != StatusCode::OK {
            return Err(ConvertError::ServerRangeUnsupported(format!(
                "probe request returned status {status}"
            )));
        }

        let total_size = content_range
            .as_deref()
            .and_then(parse_content_range_total)
            .or(content_length)
            .ok_or_else(|| {
                ConvertError::ServerRangeUnsupported(
                    "neither Content-Range nor Content-Length yielded a size".into(),
                )
            })?;

        let prefix = response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(&e))?
            .to_vec();

        self.stats.successful_requests.fetch_add(1, Ordering::Relaxed);
        self.stats.bytes_transferred.fetch_add(prefix.len() as u64, Ordering::Relaxed);

        let fully_buffered = total_size <= prefix.len() as u64;
        Ok(ProbeResult { total_size, prefix, fully_buffered })
    }

    /// Fetches `[start, end_inclusive]`, splitting into fixed-size chunks issued
    /// concurrently under the semaphore and concatenated in order. Chunks already
    /// present in the cache are reused instead of re-fetched (§3 byte-range economy
    /// invariant, §8 property 3).
    pub async fn fetch(&self, start: u64, end_inclusive: u64) -> ConvertResultT<Vec<u8>> {
        if end_inclusive < start {
            return Ok(Vec::new());
        }
        let first_chunk = start / self.chunk_size;
        let last_chunk = end_inclusive / self.chunk_size;

        let mut chunk_futures = Vec::new();
        for chunk_num in first_chunk..=last_chunk {
            chunk_futures.push(self.fetch_chunk(chunk_num));
        }
        let chunks = futures::future::try_join_all(chunk_futures).await?;

        let mut out = Vec::with_capacity((end_inclusive - start + 1) as usize);
        for (i, chunk_num) in (first_chunk..=last_chunk).enumerate() {
            let chunk_start = chunk_num * self.chunk_size;
            let chunk = &chunks[i];
            let lo = start.saturating_sub(chunk_start) as usize;
            let hi = ((end_inclusive + 1).saturating_sub(chunk_start) as usize).min(chunk.len());
            if lo < hi {
                out.extend_from_slice(&chunk[lo..hi]);
            }
        }
        Ok(out)
    }

    async fn fetch_chunk(&self, chunk_num: ChunkKey) -> ConvertResultT<Arc<[u8]>> {
        {
            let mut inner = self.inner.lock().await;
            if let Some(data) = inner.cache.get(&chunk_num) {
                return Ok(data.clone());
            }
        }

        let _permit = self
            .semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ConvertError::Cancelled)?;

        let chunk_start = chunk_num * self.chunk_size;
        let chunk_end = chunk_start + self.chunk_size - 1;
        let bytes = self.fetch_with_retry(chunk_start, chunk_end).await?;
        let data: Arc<[u8]> = Arc::from(bytes.into_boxed_slice());

        let mut inner = self.inner.lock().await;
        inner.cache.put(chunk_num, data.clone());
        Ok(data)
    }

    async fn fetch_with_retry(&self, start: u64, end_inclusive: u64) -> ConvertResultT<Vec<u8>> {
        let max_retries = self.thresholds.max_retries;
        let base_delay = Duration::from_millis(self.thresholds.retry_delay_ms);
        let mut attempt = 0u32;

        loop {
            match self.fetch_range_raw(start, end_inclusive).await {
                Ok(bytes) => {
                    self.stats.successful_requests.fetch_add(1, Ordering::Relaxed);
                    self.stats.bytes_transferred.fetch_add(bytes.len() as u64, Ordering::Relaxed);
                    return Ok(bytes);
                }
                Err(err) if attempt < max_retries && is_retryable(&err) => {
                    attempt += 1;
                    self.stats.retried_requests.fetch_add(1, Ordering::Relaxed);
                    let delay = base_delay * attempt;
                    warn!(start, end_inclusive, attempt, ?delay, "retrying range request");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch_range_raw(&self, start: u64, end_inclusive: u64) -> ConvertResultT<Vec<u8>> {
        let response = self
            .client
            .get(&self.url)
            .header("Range", format!("bytes={start}-{end_inclusive}"))
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            return Err(ConvertError::FetchTransient(format!("status {status}")));
        }
        if !status.is_success() {
            return Err(ConvertError::InvalidInput(format!(
                "range request failed with status {status}"
            )));
        }

        debug!(start, end_inclusive, %status, "range request completed");
        Ok(response
            .bytes()
            .await
            .map_err(|e| classify_reqwest_error(&e))?
            .to_vec())
    }
}

fn parse_content_range_total(header: &str) -> Option<u64> {
    // Format: "bytes a-b/total" or "bytes a-b/*"
    let slash = header.rfind('/')?;
    let total_str = &header[slash + 1..];
    total_str.trim().parse().ok()
}

fn is_retryable(err: &ConvertError) -> bool {
    matches!(err, ConvertError::FetchTransient(_))
}

/// Classifies a transport-level failure into an aborting or retryable kind.
///
/// Request-construction failures (malformed URL) and DNS resolution failures
/// are permanent for a given `url` and must not burn the retry budget; timeouts
/// and other connect failures (refused, reset) are treated as transient per §4.1.
fn classify_reqwest_error(err: &reqwest::Error) -> ConvertError {
    if err.is_builder() {
        return ConvertError::InvalidInput(format!("malformed request: {err}"));
    }
    if err.is_connect() && is_dns_failure(err) {
        return ConvertError::SourceNotFound(format!("DNS resolution failed: {err}"));
    }
    ConvertError::FetchTransient(err.to_string())
}

fn is_dns_failure(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(err) = source {
        let msg = err.to_string().to_lowercase();
        if msg.contains("dns")
            || msg.contains("failed to lookup address")
            || msg.contains("name or service not known")
            || msg.contains("nodename nor servname")
        {
            return true;
        }
        source = err.source();
    }
    false
}
