//! Runtime error types.

use std::time::Duration;

use thiserror::Error;

/// A chunk fetch that did not produce steps.
///
/// Fetch failures are per item and never terminal: a later request for the
/// same item fetches again. `Clone` so every caller sharing one in-flight
/// fetch receives the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("timed out after {after:?} fetching {chunk_ref}")]
    Timeout { chunk_ref: String, after: Duration },

    #[error("failed to fetch {chunk_ref}: {message}")]
    Transport { chunk_ref: String, message: String },
}

impl FetchError {
    pub fn transport(chunk_ref: &str, err: impl std::fmt::Display) -> Self {
        FetchError::Transport {
            chunk_ref: chunk_ref.to_string(),
            message: err.to_string(),
        }
    }
}

/// A request the caller should correct and repeat.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("page {page} is out of range ({page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    #[error("item {index} does not exist ({count} items)")]
    UnknownItem { index: usize, count: usize },

    #[error("unknown filter '{0}'")]
    UnknownFilter(String),
}

/// Errors returned by [`StepLoader::load_steps`](super::StepLoader::load_steps).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
