//! InputAcquirer (C2): normalises any [`Source`] into an [`AcquiredInput`] the
//! rest of the pipeline can reason about uniformly.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Thresholds;
use crate::fetch::RangeFetcher;
use crate::pipeline_error::{ConvertError, ConvertResultT};

/// Caller-supplied input, tagged by origin (§3).
#[derive(Debug, Clone)]
pub enum Source {
    LocalPath(PathBuf),
    InMemory(Vec<u8>),
    Remote(String),
}

/// Normalised input: either the whole document in memory, or a remote handle
/// plus the prefix bytes the probe already returned. Immutable once constructed;
/// lifetime is exactly one `convert` call (§3).
pub enum AcquiredInput {
    Buffered { bytes: Vec<u8> },
    Streamed {
        size: u64,
        prefix_bytes: Vec<u8>,
        fetcher: Arc<RangeFetcher>,
    },
}

impl AcquiredInput {
    pub fn size(&self) -> u64 {
        match self {
            AcquiredInput::Buffered { bytes } => bytes.len() as u64,
            AcquiredInput::Streamed { size, .. } => *size,
        }
    }
}

/// Acquires `source`, performing a remote probe when needed. `force_buffered`
/// requests a full download even for a source that would otherwise stream (used
/// by the orchestrator once the Planner has chosen a `*Full` strategy, §4.7 step 5).
pub async fn acquire(
    source: &Source,
    thresholds: &Thresholds,
    force_buffered: bool,
) -> ConvertResultT<AcquiredInput> {
    match source {
        Source::LocalPath(path) => {
            let bytes = tokio::fs::read(path).await.map_err(|e| {
                ConvertError::SourceNotFound(format!("{}: {e}", path.display()))
            })?;
            Ok(AcquiredInput::Buffered { bytes })
        }
        Source::InMemory(bytes) => Ok(AcquiredInput::Buffered { bytes: bytes.clone() }),
        Source::Remote(url) => {
            let fetcher = Arc::new(RangeFetcher::new(url.clone(), thresholds.clone())?);
            let probe = fetcher.probe().await?;

            if probe.fully_buffered {
                return Ok(AcquiredInput::Buffered { bytes: probe.prefix });
            }

            if force_buffered {
                let full = fetcher.fetch(0, probe.total_size - 1).await?;
                return Ok(AcquiredInput::Buffered { bytes: full });
            }

            Ok(AcquiredInput::Streamed {
                size: probe.total_size,
                prefix_bytes: probe.prefix,
                fetcher,
            })
        }
    }
}

/// Cheap, non-network size/readability check used by the CLI's `--info` and by
/// the orchestrator before doing any real work.
pub async fn probe_local_size(path: &std::path::Path) -> ConvertResultT<u64> {
    let meta = tokio::fs::metadata(path)
        .await
        .map_err(|e| ConvertError::SourceNotFound(format!("{}: {e}", path.display())))?;
    Ok(meta.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_acquires_trivially() {
        let source = Source::InMemory(vec![1, 2, 3, 4]);
        let thresholds = Thresholds::default();
        let acquired = acquire(&source, &thresholds, false).await.unwrap();
        assert_eq!(acquired.size(), 4);
        match acquired {
            AcquiredInput::Buffered { bytes } => assert_eq!(bytes, vec![1, 2, 3, 4]),
            _ => panic!("expected Buffered"),
        }
    }

    #[tokio::test]
    async fn missing_local_path_reports_source_not_found() {
        let source = Source::LocalPath(PathBuf::from("/nonexistent/path/does-not-exist.pdf"));
        let thresholds = Thresholds::default();
        let err = acquire(&source, &thresholds, false).await.unwrap_err();
        assert!(matches!(err, ConvertError::SourceNotFound(_)));
    }
}
