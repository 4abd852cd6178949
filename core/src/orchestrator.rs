//! Orchestrator (C7): the top-level `convert` entry point. Drives the
//! Acquirer, Planner, WorkerPool, and OutputSink in the sequence laid out in
//! §4.7, and is the only module that holds all of those pieces at once — no
//! other module imports more than one of `{planner, workers, sink}`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tracing::info;

use crate::config::{Config, OutputFormat, OutputMode, RendererChoice, RenderOptions};
use crate::decoder::native::NativeDecoder;
use crate::decoder::portable::PortableDecoder;
use crate::decoder::{DecodeSource, PageDecoder};
use crate::fetch::FetchStats;
use crate::input::{self, AcquiredInput, Source};
use crate::pipeline_error::{ConvertError, ConvertResultT};
use crate::planner::StrategyPlanner;
pub use crate::sink::DeliveryResult;
use crate::sink::OutputSink;
use crate::workers::{EncodedPage, PageTask, WorkerPool};

/// Cooperative cancellation signal for one `convert` call (§5). Cloning
/// shares the same underlying flag; calling [`CancellationToken::cancel`]
/// from any clone is observed by every other.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        CancellationToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Which pages the caller wants (§6 `pages` option). The "first six" default
/// resolves the open question in §9: the source disagreed with itself between
/// three and six; six is what §6's own option documentation states, so that's
/// authoritative here (see DESIGN.md).
#[derive(Clone, Debug)]
pub enum PageSelection {
    All,
    Explicit(Vec<u32>),
    DefaultFirstSix,
}

/// Everything a `convert` call needs beyond the input itself.
#[derive(Clone)]
pub struct ConvertOptions {
    pub pages: PageSelection,
    pub output_mode: OutputMode,
    pub render_opts: RenderOptions,
    pub cancellation: Option<CancellationToken>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            pages: PageSelection::DefaultFirstSix,
            output_mode: OutputMode::Buffer,
            render_opts: RenderOptions::default(),
            cancellation: None,
        }
    }
}

/// Render/encode timing aggregated across every page (§6 `timing`).
#[derive(Debug, Clone, Default)]
pub struct Timing {
    pub total_ms: u64,
    pub render_ms: u64,
    pub encode_ms: u64,
}

/// RangeFetcher observability counters surfaced on the result when the
/// strategy streamed from a remote source (§6 `stream_stats`).
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub successful_requests: u64,
    pub bytes_transferred: u64,
    pub retried_requests: u64,
}

/// Top-level result of a `convert` call (§6).
pub struct ConvertResult {
    pub success: bool,
    pub num_pages: u32,
    pub rendered_pages: u32,
    pub format: OutputFormat,
    pub renderer_used: &'static str,
    pub pages: Vec<DeliveryResult>,
    pub timing: Timing,
    pub stream_stats: Option<StreamStats>,
}

/// Converts `source` into per-page images per `options` (§4.7).
pub async fn convert(source: Source, options: ConvertOptions) -> ConvertResultT<ConvertResult> {
    let total_start = Instant::now();
    options.render_opts.validate()?;
    let cancel = options.cancellation.clone().unwrap_or_default();
    let config = Config::global();
    let runtime = tokio::runtime::Handle::current();

    // Step 2: acquire.
    let acquired = input::acquire(&source, &config.thresholds, false).await?;
    let size = acquired.size();
    let already_buffered = matches!(acquired, AcquiredInput::Buffered { .. });

    if cancel.is_cancelled() {
        return Err(ConvertError::Cancelled);
    }

    // Step 3: best-effort cheap page-count probe (portable decoder).
    let page_count_hint = probe_page_count(&acquired, runtime.clone()).await;

    // Step 4: plan.
    let strategy = StrategyPlanner::plan(
        already_buffered,
        size,
        page_count_hint,
        &config.capabilities,
        &config.thresholds,
    );
    info!(reason = strategy.reason(), uses_native = strategy.uses_native(), "rendering strategy chosen");

    // Step 5: force a full download if the strategy demands it.
    let acquired = if strategy.requires_buffered() {
        force_buffer(acquired).await?
    } else {
        acquired
    };

    if cancel.is_cancelled() {
        return Err(ConvertError::Cancelled);
    }

    let stream_stats_source = fetcher_stats(&acquired);
    let decode_source = to_decode_source(&acquired);

    let use_native = match options.render_opts.renderer {
        RendererChoice::Native => true,
        RendererChoice::Portable => false,
        RendererChoice::Auto => strategy.uses_native(),
    };
    let renderer_used = if use_native { "native" } else { "portable" };

    let format = options.render_opts.format;
    let sink = Arc::new(OutputSink::new(
        options.output_mode.clone(),
        &config.thresholds,
        format.extension(),
        format.content_type(),
    )?);

    let (num_pages, mut pages, render_ms, encode_ms) = if use_native {
        run_pipeline(
            NativeDecoder { runtime: runtime.clone() },
            decode_source,
            &options.pages,
            &options.render_opts,
            &config.thresholds,
            sink,
            cancel.clone(),
        )
        .await?
    } else {
        run_pipeline(
            PortableDecoder::new(runtime.clone()),
            decode_source,
            &options.pages,
            &options.render_opts,
            &config.thresholds,
            sink,
            cancel.clone(),
        )
        .await?
    };

    pages.sort_by_key(|p| p.page_index);
    let rendered_pages = pages.iter().filter(|p| p.success).count() as u32;

    Ok(ConvertResult {
        success: true,
        num_pages,
        rendered_pages,
        format,
        renderer_used,
        pages,
        timing: Timing {
            total_ms: total_start.elapsed().as_millis() as u64,
            render_ms,
            encode_ms,
        },
        stream_stats: stream_stats_source.as_deref().map(stats_snapshot),
    })
}

/// Drives the worker pool and output sink for one concrete decoder backend
/// (native or portable — the two are otherwise identical code paths, per §9
/// "Renderer polymorphism").
async fn run_pipeline<D>(
    decoder: D,
    source: DecodeSource,
    pages_request: &PageSelection,
    render_opts: &RenderOptions,
    thresholds: &crate::config::Thresholds,
    sink: Arc<OutputSink>,
    cancel: CancellationToken,
) -> ConvertResultT<(u32, Vec<DeliveryResult>, u64, u64)>
where
    D: PageDecoder + Clone + Send + Sync + 'static,
{
    // Step 6: one decoder handle, opened and closed purely to discover the
    // true page count (workers below open their own, separate handles).
    let discovery_source = source.clone();
    let discovery_decoder = decoder.clone();
    let real_count = tokio::task::spawn_blocking(move || {
        let mut handle = discovery_decoder.open(discovery_source)?;
        let count = discovery_decoder.page_count(&mut handle);
        discovery_decoder.close(handle);
        count
    })
    .await
    .map_err(|_| ConvertError::Cancelled)??;

    let targets = resolve_pages(pages_request, real_count);
    if targets.is_empty() {
        return Ok((real_count, Vec::new(), 0, 0));
    }

    let pool = WorkerPool::new(decoder, source, thresholds.worker_count, thresholds.worker_queue_size);

    // Step 7: dispatch one task per target page.
    let mut submitted = 0usize;
    for &page_index in &targets {
        if cancel.is_cancelled() {
            pool.cancel();
            pool.shutdown();
            return Err(ConvertError::Cancelled);
        }
        pool.submit(PageTask { page_index, render_opts: render_opts.clone() })?;
        submitted += 1;
    }

    // Bridge the pool's sync result channel into async space so delivery
    // (step 8, streaming) can overlap with rendering of later pages.
    let results_rx = pool.results().clone();
    let (bridge_tx, mut bridge_rx) = tokio::sync::mpsc::unbounded_channel::<EncodedPage>();
    let bridge = tokio::task::spawn_blocking(move || {
        for _ in 0..submitted {
            match results_rx.recv() {
                Ok(page) => {
                    if bridge_tx.send(page).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let mut deliveries = tokio::task::JoinSet::new();
    let mut render_ms_total = 0u64;
    let mut encode_ms_total = 0u64;
    let mut received = 0usize;
    while received < submitted {
        match bridge_rx.recv().await {
            Some(page) => {
                render_ms_total += page.render_time_ms;
                encode_ms_total += page.encode_time_ms;
                let sink = sink.clone();
                deliveries.spawn(async move { sink.deliver(page).await });
                received += 1;
            }
            None => break,
        }
    }
    let _ = bridge.await;

    let mut results = Vec::with_capacity(deliveries.len());
    while let Some(joined) = deliveries.join_next().await {
        if let Ok(delivery) = joined {
            results.push(delivery);
        }
    }

    // Step 9: release the decoder handles and temp state for this call.
    pool.shutdown();

    Ok((real_count, results, render_ms_total, encode_ms_total))
}

fn resolve_pages(selection: &PageSelection, real_count: u32) -> Vec<u32> {
    match selection {
        PageSelection::All => (1..=real_count).collect(),
        PageSelection::DefaultFirstSix => (1..=real_count.min(6)).collect(),
        PageSelection::Explicit(requested) => {
            let mut pages: Vec<u32> =
                requested.iter().copied().filter(|&p| p >= 1 && p <= real_count).collect();
            pages.sort_unstable();
            pages.dedup();
            pages
        }
    }
}

fn to_decode_source(input: &AcquiredInput) -> DecodeSource {
    match input {
        AcquiredInput::Buffered { bytes } => DecodeSource::Buffered(bytes.clone()),
        AcquiredInput::Streamed { size, prefix_bytes, fetcher } => DecodeSource::Streamed {
            size: *size,
            prefix: prefix_bytes.clone(),
            fetcher: fetcher.clone(),
        },
    }
}

fn fetcher_stats(input: &AcquiredInput) -> Option<Arc<FetchStats>> {
    match input {
        AcquiredInput::Streamed { fetcher, .. } => Some(fetcher.stats.clone()),
        AcquiredInput::Buffered { .. } => None,
    }
}

fn stats_snapshot(stats: &FetchStats) -> StreamStats {
    StreamStats {
        successful_requests: stats.successful_requests.load(Ordering::Relaxed),
        bytes_transferred: stats.bytes_transferred.load(Ordering::Relaxed),
        retried_requests: stats.retried_requests.load(Ordering::Relaxed),
    }
}

/// Best-effort page count from whatever bytes are already on hand (§4.7 step
/// 3). Used only so the Planner's page-count-dependent rules (1 and 3) can
/// fire before a decoder has been chosen; failures here just leave the
/// planner treating the count as unknown.
async fn probe_page_count(input: &AcquiredInput, runtime: tokio::runtime::Handle) -> u32 {
    let decode_source = to_decode_source(input);
    let decoder = PortableDecoder::new(runtime);
    let outcome = tokio::task::spawn_blocking(move || {
        let mut handle = decoder.open(decode_source)?;
        let count = decoder.page_count(&mut handle);
        decoder.close(handle);
        count
    })
    .await;

    match outcome {
        Ok(Ok(count)) => count,
        _ => 0,
    }
}

async fn force_buffer(input: AcquiredInput) -> ConvertResultT<AcquiredInput> {
    match input {
        AcquiredInput::Buffered { .. } => Ok(input),
        AcquiredInput::Streamed { size, fetcher, .. } => {
            let bytes = fetcher.fetch(0, size.saturating_sub(1)).await?;
            Ok(AcquiredInput::Buffered { bytes })
        }
    }
}
