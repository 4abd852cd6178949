//! Immutable, process-wide configuration and the startup capability probe (C9).
//!
//! [`Config`] is read once at startup from environment variables (upper-snake-cased
//! thresholds, matching §6) layered under hard-coded defaults, then never mutated.
//! A `convert` call may locally override specific codec knobs via [`RenderOptions`]
//! without touching the shared record.

use std::env;
use std::sync::Arc;

use crate::pipeline_error::{ConvertError, ConvertResultT};

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Webp,
    Png,
    Jpeg,
}

impl OutputFormat {
    pub fn parse(s: &str) -> ConvertResultT<Self> {
        match s.to_ascii_lowercase().as_str() {
            "webp" => Ok(OutputFormat::Webp),
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            other => Err(ConvertError::InvalidInput(format!("unsupported format: {other}"))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            OutputFormat::Webp => "image/webp",
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Explicit renderer override (§6 `renderer` option).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RendererChoice {
    #[default]
    Auto,
    Native,
    Portable,
}

/// Destination mode for encoded pages (§4.8).
#[derive(Debug, Clone)]
pub enum OutputMode {
    File { output_dir: std::path::PathBuf, prefix: String },
    Buffer,
    ObjectStore { key_prefix: String, store_config: ObjectStoreConfig },
}

/// Opaque description of the blob-store target; the actual client SDK is an
/// external collaborator (§1 Out of scope) — this only carries what's needed to
/// construct one.
#[derive(Debug, Clone, Default)]
pub struct ObjectStoreConfig {
    pub bucket: String,
    pub region: Option<String>,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

/// Per-call render knobs (§3 RenderOptions), read-only for the duration of a call.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub target_width_px: u32,
    pub image_heavy_target_width_px: u32,
    pub max_scale: f64,
    pub detect_scan: bool,
    pub format: OutputFormat,
    pub webp_quality: u8,
    pub webp_effort: u8,
    pub jpeg_quality: u8,
    pub png_compression: u8,
    pub renderer: RendererChoice,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            target_width_px: 1280,
            image_heavy_target_width_px: 1024,
            max_scale: 4.0,
            detect_scan: true,
            format: OutputFormat::Webp,
            webp_quality: 80,
            webp_effort: 4,
            jpeg_quality: 85,
            png_compression: 6,
            renderer: RendererChoice::Auto,
        }
    }
}

impl RenderOptions {
    pub fn validate(&self) -> ConvertResultT<()> {
        if self.webp_quality > 100 || self.jpeg_quality > 100 {
            return Err(ConvertError::InvalidInput("quality must be 0-100".into()));
        }
        if self.webp_effort > 6 {
            return Err(ConvertError::InvalidInput("webp_effort must be 0-6".into()));
        }
        if self.png_compression > 9 {
            return Err(ConvertError::InvalidInput("png_compression must be 0-9".into()));
        }
        if self.target_width_px == 0 || self.image_heavy_target_width_px == 0 {
            return Err(ConvertError::InvalidInput("target width must be > 0".into()));
        }
        if self.max_scale <= 0.0 {
            return Err(ConvertError::InvalidInput("max_scale must be > 0".into()));
        }
        Ok(())
    }
}

/// Codec dimension ceiling (WebP's is the tightest of the three and is applied
/// uniformly so the decoder never has to special-case the chosen format, per
/// the Encoder's "never resizes" invariant in §4.4).
pub const CODEC_MAX_DIM: u32 = 16383;
pub const CODEC_MAX_PIXELS: u64 = 16383 * 16383;

/// Immutable thresholds read once at startup (§4.5, §4.1, §4.6).
#[derive(Debug, Clone)]
pub struct Thresholds {
    pub native_full_threshold: u64,
    pub native_stream_threshold: u64,
    pub native_size_cap: u64,
    pub complex_page_bpp: u64,

    pub probe_size: usize,
    pub range_chunk_size: usize,
    pub range_max_concurrency: usize,
    pub range_request_timeout_secs: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,

    pub worker_count: usize,
    pub worker_queue_size: usize,
    pub worker_heap_cap_bytes: u64,
    pub worker_idle_timeout_secs: u64,

    pub sink_file_concurrency: usize,
    pub sink_object_store_concurrency: usize,
    pub sink_retry_base_delay_ms: u64,
    pub sink_max_retries: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds {
            // §9 open question: the source's two adjacent thresholds are unified into
            // one (see DESIGN.md) but both env var names are still honored for
            // compatibility, with `native_full_threshold` as the authoritative value.
            native_full_threshold: 8 * 1024 * 1024,
            native_stream_threshold: 8 * 1024 * 1024,
            native_size_cap: 8 * 1024 * 1024,
            complex_page_bpp: 500 * 1024,

            probe_size: 20 * 1024,
            range_chunk_size: 2 * 1024 * 1024,
            range_max_concurrency: 4,
            range_request_timeout_secs: 25,
            max_retries: 3,
            retry_delay_ms: 500,

            worker_count: num_cpus::get(),
            worker_queue_size: 100,
            worker_heap_cap_bytes: 700 * 1024 * 1024,
            worker_idle_timeout_secs: 30,

            sink_file_concurrency: 10,
            sink_object_store_concurrency: 6,
            sink_retry_base_delay_ms: 1000,
            sink_max_retries: 3,
        }
    }
}

impl Thresholds {
    /// Overlays environment variables (upper-snake-cased threshold names) on top
    /// of the defaults, per §6 "Environment variables".
    pub fn from_env() -> Self {
        let mut t = Thresholds::default();
        macro_rules! env_u64 {
            ($field:ident, $name:literal) => {
                if let Ok(v) = env::var($name) {
                    if let Ok(parsed) = v.parse() {
                        t.$field = parsed;
                    }
                }
            };
        }
        macro_rules! env_usize {
            ($field:ident, $name:literal) => {
                if let Ok(v) = env::var($name) {
                    if let Ok(parsed) = v.parse() {
                        t.$field = parsed;
                    }
                }
            };
        }
        env_u64!(native_full_threshold, "NATIVE_FULL_THRESHOLD");
        env_u64!(native_stream_threshold, "NATIVE_STREAM_THRESHOLD");
        env_u64!(native_size_cap, "NATIVE_SIZE_CAP");
        env_u64!(complex_page_bpp, "COMPLEX_PAGE_BPP");
        env_usize!(probe_size, "PROBE_SIZE");
        env_usize!(range_chunk_size, "RANGE_CHUNK_SIZE");
        env_usize!(range_max_concurrency, "RANGE_MAX_CONCURRENCY");
        env_u64!(range_request_timeout_secs, "RANGE_REQUEST_TIMEOUT");
        env_u64!(retry_delay_ms, "RETRY_DELAY_MS");
        env_usize!(worker_queue_size, "WORKER_QUEUE_SIZE");
        env_u64!(worker_heap_cap_bytes, "WORKER_HEAP_CAP_BYTES");
        env_u64!(worker_idle_timeout_secs, "WORKER_IDLE_TIMEOUT");
        if let Ok(v) = env::var("WORKER_COUNT") {
            if let Ok(parsed) = v.parse::<usize>() {
                t.worker_count = parsed;
            }
        }
        t
    }
}

/// Availability of optional decoder/encoder backends, probed once at startup and
/// never re-probed per call (§4.9).
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    pub native_decoder_available: bool,
    pub native_decoder_version: Option<String>,
    pub native_stream_available: bool,
    pub native_encoder_available: bool,
}

impl Capabilities {
    /// Probes for the native (PDFium) decoder. Never panics: absence of the
    /// `native-decoder` feature, or a library load failure, both degrade to
    /// `native_decoder_available = false` rather than aborting startup.
    pub fn probe() -> Self {
        let native_decoder_available = crate::decoder::native::is_available();
        Capabilities {
            native_decoder_available,
            native_decoder_version: if native_decoder_available {
                crate::decoder::native::version()
            } else {
                None
            },
            native_stream_available: native_decoder_available,
            // The "native encoder" in this port is mozjpeg/webp/oxipng, linked in at
            // compile time rather than probed; availability tracks feature flags.
            native_encoder_available: crate::encode::native_codecs_available(),
        }
    }
}

/// Top-level, immutable configuration shared by every worker within a process.
#[derive(Debug, Clone)]
pub struct Config {
    pub thresholds: Thresholds,
    pub capabilities: Arc<Capabilities>,
}

impl Config {
    pub fn load() -> Self {
        Config {
            thresholds: Thresholds::from_env(),
            capabilities: Arc::new(Capabilities::probe()),
        }
    }

    /// Process-wide config, probed and loaded exactly once (§4.9). Every
    /// `convert` call reads this; none of them mutate it.
    pub fn global() -> &'static Config {
        static CONFIG: std::sync::OnceLock<Config> = std::sync::OnceLock::new();
        CONFIG.get_or_init(Config::load)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_options_defaults_match_spec() {
        let opts = RenderOptions::default();
        assert_eq!(opts.target_width_px, 1280);
        assert_eq!(opts.image_heavy_target_width_px, 1024);
        assert_eq!(opts.max_scale, 4.0);
        assert_eq!(opts.webp_quality, 80);
        assert_eq!(opts.webp_effort, 4);
        assert_eq!(opts.jpeg_quality, 85);
        assert_eq!(opts.png_compression, 6);
        opts.validate().unwrap();
    }

    #[test]
    fn rejects_out_of_range_quality() {
        let mut opts = RenderOptions::default();
        opts.webp_quality = 101;
        assert!(opts.validate().is_err());
    }

    #[test]
    fn format_parse_accepts_aliases() {
        assert_eq!(OutputFormat::parse("jpg").unwrap(), OutputFormat::Jpeg);
        assert_eq!(OutputFormat::parse("JPEG").unwrap(), OutputFormat::Jpeg);
        assert!(OutputFormat::parse("bmp").is_err());
    }

    #[test]
    fn thresholds_default_unifies_native_windows() {
        let t = Thresholds::default();
        assert_eq!(t.native_full_threshold, t.native_stream_threshold);
    }
}
