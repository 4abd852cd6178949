//! PageDecoder capability (C3): `open → page_count → render → close`, with two
//! concrete backends — [`native`] (PDFium via FFI) and [`portable`] (the
//! in-language parser + tiny-skia renderer already resident in [`crate::core`]
//! and [`crate::rendering`]). Both are hot-swapped purely through the
//! [`crate::planner::Strategy`] tag; neither the orchestrator nor the worker
//! pool branches on which one is active beyond that.

pub mod native;
pub mod portable;

use crate::config::RenderOptions;
use crate::pipeline_error::ConvertResultT;

/// Source handed to [`PageDecoder::open`]: either the whole document, or a
/// streamed handle the decoder pulls byte ranges from on demand. `Clone` so
/// [`crate::workers::WorkerPool`] can hand every worker its own independent
/// source to open a private decoder handle from (§4.6: one handle per worker,
/// never shared).
#[derive(Clone)]
pub enum DecodeSource {
    Buffered(Vec<u8>),
    Streamed {
        size: u64,
        prefix: Vec<u8>,
        fetcher: std::sync::Arc<crate::fetch::RangeFetcher>,
    },
}

/// RGBA, 8 bits per channel, row stride `4 * width_px`. Lives only inside a
/// worker between decode and encode — it is never sent across a thread
/// boundary as an owned value (§9 "Cross-thread pixel buffers").
pub struct RawBitmap {
    pub width_px: u32,
    pub height_px: u32,
    pub channels: u8,
    pub pixel_bytes: Vec<u8>,
}

/// Abstract decoder contract (§4.3). Implementations must be `Send` so a
/// worker can own one for the lifetime of a `convert` call, but need not be
/// `Sync` — exactly one worker thread touches a given handle.
pub trait PageDecoder: Send {
    type Handle: Send;

    fn open(&self, source: DecodeSource) -> ConvertResultT<Self::Handle>;
    fn page_count(&self, handle: &mut Self::Handle) -> ConvertResultT<u32>;
    fn render(
        &self,
        handle: &mut Self::Handle,
        page_index: u32,
        render_opts: &RenderOptions,
    ) -> ConvertResultT<RawBitmap>;
    fn close(&self, handle: Self::Handle);
}

/// Computes the render scale for a page given its natural size, the active
/// render options, and whether it was classified "scan-like" (§4.3 "Scale
/// computation"). Shared by both decoder backends so the codec-ceiling
/// clamping logic lives in exactly one place.
pub fn compute_scale(
    natural_width_px: f64,
    natural_height_px: f64,
    render_opts: &RenderOptions,
    scan_like: bool,
) -> (f64, u32, u32) {
    let target_width = if scan_like {
        render_opts.image_heavy_target_width_px
    } else {
        render_opts.target_width_px
    } as f64;

    let mut scale = if natural_width_px > 0.0 {
        target_width / natural_width_px
    } else {
        1.0
    };
    scale = scale.min(render_opts.max_scale).max(f64::MIN_POSITIVE);

    let mut width = (natural_width_px * scale).round() as u32;
    let mut height = (natural_height_px * scale).round() as u32;

    // Codec dimension ceiling: shrink scale by the minimal factor that brings
    // both axes (and the pixel product) back into range.
    let max_dim = crate::config::CODEC_MAX_DIM;
    let max_pixels = crate::config::CODEC_MAX_PIXELS;

    let mut shrink = 1.0f64;
    if width > max_dim {
        shrink = shrink.min(max_dim as f64 / width as f64);
    }
    if height > max_dim {
        shrink = shrink.min(max_dim as f64 / height as f64);
    }
    if (width as u64) * (height as u64) > max_pixels {
        let pixel_shrink = (max_pixels as f64 / (width as u64 * height as u64) as f64).sqrt();
        shrink = shrink.min(pixel_shrink);
    }

    if shrink < 1.0 {
        tracing::warn!(
            natural_width_px,
            natural_height_px,
            original_width = width,
            original_height = height,
            shrink,
            "clamping page render to codec dimension ceiling"
        );
        scale *= shrink;
        width = (natural_width_px * scale).round().max(1.0) as u32;
        height = (natural_height_px * scale).round().max(1.0) as u32;
    }

    (scale, width.max(1), height.max(1))
}
