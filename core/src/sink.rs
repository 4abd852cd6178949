//! OutputSink (C8): delivers an [`crate::workers::EncodedPage`] to its final
//! destination — file, in-memory buffer, or object-store upload — with
//! bounded per-mode concurrency and, for object-store uploads, per-item retry
//! (§4.8).
//!
//! Grounded on `core::retry`'s backoff policy (generalised from "retry a
//! range fetch" to "retry an object-store PUT") and on `core::file_chunked_stream`'s
//! file-handling conventions for the write-then-rename path.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::warn;

use crate::config::{ObjectStoreConfig, OutputMode, Thresholds};
use crate::pipeline_error::ConvertError;
use crate::workers::EncodedPage;

/// Where a delivered page ended up (§3 `DeliveryResult.sink_ref`).
#[derive(Debug, Clone)]
pub enum SinkRef {
    Path(PathBuf),
    ObjectKey(String),
    Buffer(Vec<u8>),
}

/// Per-page delivery outcome. A failure here never aborts sibling deliveries
/// (§4.8) — it's carried in this page's own record.
pub struct DeliveryResult {
    pub page_index: u32,
    pub width_px: u32,
    pub height_px: u32,
    pub success: bool,
    pub sink_ref: Option<SinkRef>,
    pub error: Option<ConvertError>,
}

/// Bounded-concurrency delivery target for one `convert` call. Constructed
/// once by the Orchestrator and shared (via `Arc`) across every page's
/// delivery task.
pub struct OutputSink {
    mode: OutputMode,
    semaphore: Arc<Semaphore>,
    retry_base_delay: Duration,
    max_retries: u32,
    extension: &'static str,
    content_type: &'static str,
    object_store: Option<Arc<dyn object_store::ObjectStore>>,
}

impl OutputSink {
    pub fn new(
        mode: OutputMode,
        thresholds: &Thresholds,
        extension: &'static str,
        content_type: &'static str,
    ) -> Result<Self, ConvertError> {
        let concurrency = match &mode {
            OutputMode::File { .. } => thresholds.sink_file_concurrency,
            // Buffer mode has no external resource to bound; reuse the file
            // concurrency knob scaled up since it's pure memory copying.
            OutputMode::Buffer => thresholds.sink_file_concurrency.max(1) * 4,
            OutputMode::ObjectStore { .. } => thresholds.sink_object_store_concurrency,
        };

        let object_store = match &mode {
            OutputMode::ObjectStore { store_config, .. } => Some(build_object_store(store_config)?),
            _ => None,
        };

        Ok(OutputSink {
            mode,
            semaphore: Arc::new(Semaphore::new(concurrency.max(1))),
            retry_base_delay: Duration::from_millis(thresholds.sink_retry_base_delay_ms),
            max_retries: thresholds.sink_max_retries,
            extension,
            content_type,
            object_store,
        })
    }

    /// Delivers one page under the sink's concurrency cap. Never returns
    /// `Err` — any failure is folded into the returned `DeliveryResult` per
    /// §7's per-page propagation policy.
    pub async fn deliver(&self, page: EncodedPage) -> DeliveryResult {
        if !page.success {
            return DeliveryResult {
                page_index: page.page_index,
                width_px: page.width_px,
                height_px: page.height_px,
                success: false,
                sink_ref: None,
                error: page.error,
            };
        }

        let _permit = self.semaphore.acquire().await.expect("semaphore never closed");

        let result = match &self.mode {
            OutputMode::Buffer => Ok(SinkRef::Buffer(page.encoded_bytes.clone())),
            OutputMode::File { output_dir, prefix } => {
                self.deliver_file(output_dir, prefix, page.page_index, &page.encoded_bytes).await
            }
            OutputMode::ObjectStore { key_prefix, .. } => {
                self.deliver_object_store(key_prefix, page.page_index, &page.encoded_bytes).await
            }
        };

        match result {
            Ok(sink_ref) => DeliveryResult {
                page_index: page.page_index,
                width_px: page.width_px,
                height_px: page.height_px,
                success: true,
                sink_ref: Some(sink_ref),
                error: None,
            },
            Err(err) => DeliveryResult {
                page_index: page.page_index,
                width_px: page.width_px,
                height_px: page.height_px,
                success: false,
                sink_ref: None,
                error: Some(err),
            },
        }
    }

    async fn deliver_file(
        &self,
        output_dir: &std::path::Path,
        prefix: &str,
        page_index: u32,
        bytes: &[u8],
    ) -> Result<SinkRef, ConvertError> {
        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| ConvertError::OutputFailed { page: page_index, detail: e.to_string() })?;

        let final_path = output_dir.join(format!("{prefix}_{page_index}.{}", self.extension));
        let tmp_path = output_dir.join(format!("{prefix}_{page_index}.{}.tmp", self.extension));

        tokio::fs::write(&tmp_path, bytes)
            .await
            .map_err(|e| ConvertError::OutputFailed { page: page_index, detail: e.to_string() })?;
        tokio::fs::rename(&tmp_path, &final_path).await.map_err(|e| {
            ConvertError::OutputFailed { page: page_index, detail: e.to_string() }
        })?;

        Ok(SinkRef::Path(final_path))
    }

    async fn deliver_object_store(
        &self,
        key_prefix: &str,
        page_index: u32,
        bytes: &[u8],
    ) -> Result<SinkRef, ConvertError> {
        let store = self
            .object_store
            .as_ref()
            .expect("object_store client built in OutputSink::new for ObjectStore mode");
        let key = format!("{key_prefix}/page_{page_index}.{}", self.extension);
        let path = object_store::path::Path::from(key.as_str());

        let mut attempt = 0u32;
        loop {
            let put_result = store
                .put_opts(
                    &path,
                    bytes.to_vec().into(),
                    object_store::PutOptions::default(),
                )
                .await;

            match put_result {
                Ok(_) => return Ok(SinkRef::ObjectKey(key)),
                Err(err) if attempt < self.max_retries && is_retryable_store_error(&err) => {
                    attempt += 1;
                    let delay = self.retry_base_delay * 2u32.pow(attempt - 1);
                    warn!(page_index, attempt, ?delay, %err, "retrying object-store upload");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    return Err(ConvertError::OutputFailed { page: page_index, detail: err.to_string() });
                }
            }
        }
    }

    pub fn content_type(&self) -> &'static str {
        self.content_type
    }
}

/// Retry classification mirrors §4.1's: timeout, connection reset/refused,
/// broken pipe, or a 5xx response. `object_store`'s error enum is
/// non-exhaustive and backend-specific, so the check goes by message content
/// rather than matching individual variants.
fn is_retryable_store_error(err: &object_store::Error) -> bool {
    let msg = err.to_string().to_ascii_lowercase();
    msg.contains("timed out")
        || msg.contains("timeout")
        || msg.contains("connection reset")
        || msg.contains("connection refused")
        || msg.contains("broken pipe")
        || msg.contains("500")
        || msg.contains("502")
        || msg.contains("503")
        || msg.contains("504")
}

/// Builds an S3-compatible client from the caller-supplied [`ObjectStoreConfig`]
/// (§9 "the only process-wide mutable state is the ObjectStore client
/// connection pool"; this builds one per `convert` call rather than caching it
/// globally, since bucket/region/credentials vary per call — see DESIGN.md for
/// the Open Question this resolves).
fn build_object_store(config: &ObjectStoreConfig) -> Result<Arc<dyn object_store::ObjectStore>, ConvertError> {
    use object_store::aws::AmazonS3Builder;

    if config.bucket.is_empty() {
        return Err(ConvertError::InvalidInput("object_store_config.bucket is required".into()));
    }

    let mut builder = AmazonS3Builder::new().with_bucket_name(&config.bucket);
    if let Some(region) = &config.region {
        builder = builder.with_region(region);
    }
    if let Some(endpoint) = &config.endpoint {
        builder = builder.with_endpoint(endpoint);
    }
    if let Some(key) = &config.access_key_id {
        builder = builder.with_access_key_id(key);
    }
    if let Some(secret) = &config.secret_access_key {
        builder = builder.with_secret_access_key(secret);
    }

    let store = builder
        .build()
        .map_err(|e| ConvertError::ConfigError(format!("failed to build object store client: {e}")))?;
    Ok(Arc::new(store))
}
