//! StrategyPlanner (C5): a pure decision table mapping document size, page
//! count, and capability availability to an acquisition/decoder [`Strategy`].
//! No I/O, no side effects — easy to exhaustively unit test (§4.5).

use crate::config::{Capabilities, Thresholds};

/// Acquisition mode + decoder chosen for a `convert` call (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    NativeFull { reason: &'static str },
    NativeStreamed { reason: &'static str },
    PortableStreamed { reason: &'static str },
    PortableFull { reason: &'static str },
}

impl Strategy {
    pub fn reason(&self) -> &'static str {
        match self {
            Strategy::NativeFull { reason }
            | Strategy::NativeStreamed { reason }
            | Strategy::PortableStreamed { reason }
            | Strategy::PortableFull { reason } => reason,
        }
    }

    pub fn uses_native(&self) -> bool {
        matches!(self, Strategy::NativeFull { .. } | Strategy::NativeStreamed { .. })
    }

    pub fn requires_buffered(&self) -> bool {
        matches!(self, Strategy::NativeFull { .. } | Strategy::PortableFull { .. })
    }
}

pub struct StrategyPlanner;

impl StrategyPlanner {
    /// Evaluates the decision table top to bottom; first match wins (§4.5).
    ///
    /// `page_count_if_known` is `0` when the page count could not be probed
    /// cheaply from the prefix (§4.7 step 3) — rules that depend on it are
    /// skipped in that case, same as the source treating "unknown" as "don't
    /// apply this rule".
    pub fn plan(
        already_buffered: bool,
        size_bytes: u64,
        page_count_if_known: u32,
        capabilities: &Capabilities,
        thresholds: &Thresholds,
    ) -> Strategy {
        // Rule 0: no native decoder at all.
        if !capabilities.native_decoder_available {
            return if already_buffered {
                Strategy::PortableFull { reason: "native decoder unavailable" }
            } else {
                Strategy::PortableStreamed { reason: "native decoder unavailable" }
            };
        }

        // Rule 1: single-page fast path.
        if page_count_if_known == 1 && size_bytes <= thresholds.native_size_cap {
            return Strategy::NativeFull { reason: "single-page file" };
        }

        // Rule 2: small enough to just buffer and decode natively.
        if size_bytes <= thresholds.native_full_threshold {
            return Strategy::NativeFull { reason: "within native full threshold" };
        }

        // Rule 3: complex/scan-heavy document still within the native window.
        if page_count_if_known > 0 && size_bytes <= thresholds.native_stream_threshold {
            let bytes_per_page = size_bytes / page_count_if_known as u64;
            if bytes_per_page > thresholds.complex_page_bpp {
                return Strategy::NativeFull { reason: "complex/scan-heavy document" };
            }
        }

        // Rule 4: large document, native streaming available.
        if size_bytes > thresholds.native_stream_threshold && capabilities.native_stream_available {
            return Strategy::NativeStreamed { reason: "large document, native streaming" };
        }

        // Rule 5: fallback.
        Strategy::PortableStreamed { reason: "default streaming path" }
    }
}
