//! Lazy-load runtime.
//!
//! Loads an item's steps from its chunk only when asked, keeps a small
//! bounded cache of loaded sequences, shares in-flight fetches between
//! concurrent callers and answers filtered, paginated queries over a loaded
//! sequence.
//!
//! The same protocol runs in the browser viewer embedded in every export;
//! this module is the in-process implementation used by the CLI.

pub mod cache;
pub mod context;
pub mod error;
pub mod filter;
pub mod items;
pub mod loader;
pub mod page;
pub mod source;

pub use cache::StepCache;
pub use context::{StepContext, step_context};
pub use error::{FetchError, LoadError, ValidationError};
pub use filter::{StepFilter, StepQuery};
pub use items::ItemFilter;
pub use loader::{LoadState, StepLoader};
pub use page::{StepPage, page_count, query_page};
pub use source::{ChunkSource, FsChunkSource};
