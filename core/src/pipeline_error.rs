//! Top-level error type for the conversion pipeline.
//!
//! This sits above [`crate::core::PDFError`] (the parser/decode layer's error type)
//! and classifies failures the way the orchestrator needs to: some kinds abort the
//! whole `convert` call, others attach to a single page's `DeliveryResult` and let
//! the call otherwise succeed. See [`ConvertError::aborts_call`].

use thiserror::Error;

/// Error kinds surfaced by [`crate::orchestrator::convert`].
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("source not found: {0}")]
    SourceNotFound(String),

    #[error("remote source does not support byte-range requests: {0}")]
    ServerRangeUnsupported(String),

    #[error("transient fetch error after retries exhausted: {0}")]
    FetchTransient(String),

    #[error("failed to open PDF for decoding: {0}")]
    DecodeOpenFailed(String),

    #[error("failed to render page {page}: {detail}")]
    DecodeRenderFailed { page: u32, detail: String },

    #[error("failed to encode page {page}: {detail}")]
    EncodeFailed { page: u32, detail: String },

    #[error("failed to deliver page {page}: {detail}")]
    OutputFailed { page: u32, detail: String },

    #[error("worker crashed while rendering page {page}")]
    WorkerCrashed { page: u32 },

    #[error("conversion cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    ConfigError(String),
}

impl ConvertError {
    /// Errors naming a single page never abort the call; they are attached to that
    /// page's `DeliveryResult` instead (§7 propagation policy).
    pub fn aborts_call(&self) -> bool {
        !matches!(
            self,
            ConvertError::DecodeRenderFailed { .. }
                | ConvertError::EncodeFailed { .. }
                | ConvertError::OutputFailed { .. }
                | ConvertError::WorkerCrashed { .. }
        )
    }

    /// Maps this error to the CLI exit code it corresponds to (§6).
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::InvalidInput(_) => 2,
            ConvertError::SourceNotFound(_) => 3,
            ConvertError::ServerRangeUnsupported(_) | ConvertError::FetchTransient(_) => 4,
            ConvertError::DecodeOpenFailed(_)
            | ConvertError::DecodeRenderFailed { .. }
            | ConvertError::WorkerCrashed { .. } => 5,
            ConvertError::EncodeFailed { .. } | ConvertError::OutputFailed { .. } => 6,
            ConvertError::Cancelled => 130,
            ConvertError::ConfigError(_) => 2,
        }
    }
}

impl From<crate::core::PDFError> for ConvertError {
    fn from(err: crate::core::PDFError) -> Self {
        ConvertError::DecodeOpenFailed(err.to_string())
    }
}

/// Result alias used throughout the pipeline modules.
pub type ConvertResultT<T> = Result<T, ConvertError>;

/// Extension trait for attaching page context to a lower-layer error.
pub trait ConvertResultExt<T> {
    fn render_failed(self, page: u32) -> ConvertResultT<T>;
    fn encode_failed(self, page: u32) -> ConvertResultT<T>;
    fn output_failed(self, page: u32) -> ConvertResultT<T>;
}

impl<T, E: std::fmt::Display> ConvertResultExt<T> for Result<T, E> {
    fn render_failed(self, page: u32) -> ConvertResultT<T> {
        self.map_err(|e| ConvertError::DecodeRenderFailed {
            page,
            detail: e.to_string(),
        })
    }

    fn encode_failed(self, page: u32) -> ConvertResultT<T> {
        self.map_err(|e| ConvertError::EncodeFailed {
            page,
            detail: e.to_string(),
        })
    }

    fn output_failed(self, page: u32) -> ConvertResultT<T> {
        self.map_err(|e| ConvertError::OutputFailed {
            page,
            detail: e.to_string(),
        })
    }
}
