//! Where chunk data comes from.

use std::path::PathBuf;

use async_trait::async_trait;
use reportgen_proto::Step;
use tracing::debug;

use super::error::FetchError;
use crate::layout::ExportLayout;
use crate::reader;

/// Fetches the steps stored under a chunk reference.
///
/// Implementations do not time out on their own; the loader bounds every
/// fetch.
#[async_trait]
pub trait ChunkSource: Send + Sync {
    async fn fetch(&self, chunk_ref: &str) -> Result<Vec<Step>, FetchError>;
}

/// Reads chunk files of an export from disk.
#[derive(Debug, Clone)]
pub struct FsChunkSource {
    base_dir: PathBuf,
}

impl FsChunkSource {
    /// Resolves chunk references relative to `base_dir`, the directory of the html file.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn for_layout(layout: &ExportLayout) -> Self {
        Self::new(layout.base_dir())
    }
}

#[async_trait]
impl ChunkSource for FsChunkSource {
    async fn fetch(&self, chunk_ref: &str) -> Result<Vec<Step>, FetchError> {
        let path = self.base_dir.join(chunk_ref);
        debug!("Reading chunk {}", path.display());

        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| FetchError::transport(chunk_ref, e))?;
        let records = reader::parse_chunk(&text).map_err(|e| FetchError::transport(chunk_ref, e))?;
        Ok(records.into_iter().map(Step::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporter::render_chunk;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_chunk_relative_to_base_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("r_js")).unwrap();
        let steps = vec![Step {
            ident: "CAN".to_string(),
            result: "ng".to_string(),
            ..Step::default()
        }];
        std::fs::write(
            dir.path().join("r_js/steps_2.js"),
            render_chunk(2, &steps).unwrap(),
        )
        .unwrap();

        let source = FsChunkSource::new(dir.path());
        assert_eq!(source.fetch("r_js/steps_2.js").await.unwrap(), steps);
    }

    #[tokio::test]
    async fn test_missing_chunk_is_transport_error() {
        let dir = TempDir::new().unwrap();
        let source = FsChunkSource::new(dir.path());

        let err = source.fetch("r_js/steps_9.js").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { chunk_ref, .. } if chunk_ref == "r_js/steps_9.js"));
    }
}
