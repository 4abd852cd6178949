//! WorkerPool (C6): a fixed-size pool of OS threads, each owning one
//! long-lived [`PageDecoder`] handle for the duration of a `convert` call.
//! Tasks are coarse (one page, decode-then-encode) and dispatched over a
//! bounded `crossbeam-channel`, matching the "parallel, preemptive at the OS
//! level, cooperative at the task level" scheduling model of §5.
//!
//! Grounded on `core::chunk_manager`'s bounded-queue-plus-worker-thread shape,
//! generalised from "one queue of byte ranges" to "one queue of page tasks",
//! and on the crate's existing `crossbeam-channel`/`num_cpus` dependencies
//! (already in `Cargo.toml` for reasons unrelated to this module — now put to
//! their intended use).

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::{error, warn};

use crate::config::RenderOptions;
use crate::decoder::{DecodeSource, PageDecoder};
use crate::pipeline_error::ConvertError;

/// One page's worth of work, created by the Orchestrator and consumed by
/// exactly one worker (§3).
#[derive(Clone)]
pub struct PageTask {
    pub page_index: u32,
    pub render_opts: RenderOptions,
}

/// A worker's result for one page. `success = false` carries the error that
/// would otherwise have aborted the call — per §7 it is attached to this
/// page's `DeliveryResult` instead (§3).
pub struct EncodedPage {
    pub page_index: u32,
    pub width_px: u32,
    pub height_px: u32,
    pub encoded_bytes: Vec<u8>,
    pub render_time_ms: u64,
    pub encode_time_ms: u64,
    pub success: bool,
    pub error: Option<ConvertError>,
}

impl EncodedPage {
    fn failure(page_index: u32, error: ConvertError) -> Self {
        EncodedPage {
            page_index,
            width_px: 0,
            height_px: 0,
            encoded_bytes: Vec::new(),
            render_time_ms: 0,
            encode_time_ms: 0,
            success: false,
            error: Some(error),
        }
    }
}

enum Job {
    Render(PageTask),
    Shutdown,
}

/// Fixed-size worker pool bound to one `convert` call. Each worker opens its
/// own decoder handle from a fresh clone of `source` on first use and keeps it
/// for the pool's entire lifetime (§4.6); workers never share a handle.
pub struct WorkerPool {
    task_tx: Sender<Job>,
    result_rx: Receiver<EncodedPage>,
    handles: Vec<std::thread::JoinHandle<()>>,
    cancel: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Spawns `worker_count` threads, each waiting to open a decoder handle
    /// from `source.clone()` the moment its first task arrives — not eagerly
    /// at pool construction, since a call that requests fewer pages than
    /// `worker_count` shouldn't pay for decoder handles it never needs.
    pub fn new<D>(decoder: D, source: DecodeSource, worker_count: usize, queue_size: usize) -> Self
    where
        D: PageDecoder + Clone + 'static,
    {
        let (task_tx, task_rx) = bounded::<Job>(queue_size.max(1));
        let (result_tx, result_rx) = bounded::<EncodedPage>(queue_size.max(1));
        let cancel = Arc::new(AtomicBool::new(false));

        let mut handles = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count.max(1) {
            let task_rx = task_rx.clone();
            let result_tx = result_tx.clone();
            let decoder = decoder.clone();
            let source = source.clone();
            let cancel = cancel.clone();
            handles.push(
                std::thread::Builder::new()
                    .name(format!("pdf-x-worker-{worker_id}"))
                    .spawn(move || worker_loop(worker_id, decoder, source, task_rx, result_tx, cancel))
                    .expect("failed to spawn worker thread"),
            );
        }

        WorkerPool { task_tx, result_rx, handles, cancel }
    }

    /// Enqueues `task`. Blocks the caller once `queue_size` tasks are already
    /// pending, per §4.6's `submit` contract.
    pub fn submit(&self, task: PageTask) -> Result<(), ConvertError> {
        self.task_tx.send(Job::Render(task)).map_err(|_| ConvertError::Cancelled)
    }

    /// Results arrive in completion order, not `page_index` order (§4.6
    /// "Ordering"); the caller (Orchestrator) sorts after collection.
    pub fn results(&self) -> &Receiver<EncodedPage> {
        &self.result_rx
    }

    /// Signals every worker to abandon work between pages (§5 Cancellation).
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Closes the task channel and joins every worker, which in turn closes
    /// its decoder handle. Called once by the Orchestrator after all results
    /// for the call have been collected (§4.7 step 9).
    pub fn shutdown(mut self) {
        for _ in 0..self.handles.len() {
            let _ = self.task_tx.send(Job::Shutdown);
        }
        for handle in self.handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop<D: PageDecoder>(
    worker_id: usize,
    decoder: D,
    source: DecodeSource,
    task_rx: Receiver<Job>,
    result_tx: Sender<EncodedPage>,
    cancel: Arc<AtomicBool>,
) {
    let mut handle = match decoder.open(source) {
        Ok(h) => Some(h),
        Err(err) => {
            // Every subsequent task this worker would have run instead fails
            // with the same open error; the pool as a whole keeps making
            // progress on whatever other workers were assigned.
            error!(worker_id, %err, "worker failed to open decoder handle");
            drain_as_failures(&task_rx, &result_tx, ConvertError::DecodeOpenFailed(err.to_string()));
            return;
        }
    };

    loop {
        let task = match task_rx.recv_timeout(Duration::from_secs(30)) {
            Ok(Job::Render(task)) => task,
            Ok(Job::Shutdown) => break,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        if cancel.load(Ordering::SeqCst) {
            // Discard this page rather than starting it (§5 Cancellation). A
            // result is still produced — the caller submitted this task and
            // is waiting on exactly that many results back.
            let _ = result_tx.send(EncodedPage::failure(task.page_index, ConvertError::Cancelled));
            continue;
        }

        let page_index = task.page_index;
        let h = handle.as_mut().expect("decoder handle opened above");
        let outcome = catch_unwind(AssertUnwindSafe(|| render_and_encode(&decoder, h, &task)));

        let encoded = match outcome {
            Ok(Ok(page)) => page,
            Ok(Err(err)) => EncodedPage::failure(page_index, err),
            Err(_) => {
                // A panic inside decode/encode is treated the same as the
                // process-isolation "worker crashed" path in §4.6/§7: the
                // task that was running is the only casualty, never the pool.
                warn!(worker_id, page_index, "worker panicked while processing page");
                EncodedPage::failure(page_index, ConvertError::WorkerCrashed { page: page_index })
            }
        };

        if result_tx.send(encoded).is_err() {
            break;
        }
    }

    if let Some(h) = handle.take() {
        decoder.close(h);
    }
}

fn render_and_encode<D: PageDecoder>(
    decoder: &D,
    handle: &mut D::Handle,
    task: &PageTask,
) -> Result<EncodedPage, ConvertError> {
    let render_start = Instant::now();
    let bitmap = decoder.render(handle, task.page_index, &task.render_opts).map_err(|e| match e {
        ConvertError::DecodeRenderFailed { .. } => e,
        other => ConvertError::DecodeRenderFailed { page: task.page_index, detail: other.to_string() },
    })?;
    let render_time_ms = render_start.elapsed().as_millis() as u64;

    let encode_start = Instant::now();
    let encoded_bytes = crate::encode::encode(&bitmap, &task.render_opts).map_err(|e| match e {
        ConvertError::EncodeFailed { .. } => e,
        other => ConvertError::EncodeFailed { page: task.page_index, detail: other.to_string() },
    })?;
    let encode_time_ms = encode_start.elapsed().as_millis() as u64;

    Ok(EncodedPage {
        page_index: task.page_index,
        width_px: bitmap.width_px,
        height_px: bitmap.height_px,
        encoded_bytes,
        render_time_ms,
        encode_time_ms,
        success: true,
        error: None,
    })
}

/// Used when a worker's decoder fails to open at all: every task already
/// queued for it still gets a result (so the Orchestrator's page count never
/// silently shrinks), each reported as that same open failure.
fn drain_as_failures(task_rx: &Receiver<Job>, result_tx: &Sender<EncodedPage>, err: ConvertError) {
    while let Ok(job) = task_rx.recv_timeout(Duration::from_millis(50)) {
        match job {
            Job::Shutdown => break,
            Job::Render(task) => {
                let detail = err.to_string();
                let _ = result_tx.send(EncodedPage::failure(
                    task.page_index,
                    ConvertError::DecodeOpenFailed(detail),
                ));
            }
        }
    }
}
