//! # reportgen-core
//!
//! Conversion of XML test reports into lazily loaded html reports.
//!
//! This crate provides:
//! - A parser that flattens the report's group tree into an ordered item list
//! - A chunked exporter writing a small manifest plus one step chunk per item
//! - A reader for exported manifests and chunks
//! - The lazy-load runtime: bounded cache, shared fetches, filtering and paging
//! - Configuration loading for viewer settings

pub mod config;
pub mod exporter;
pub mod layout;
pub mod parser;
pub mod reader;
pub mod runtime;
mod shell;
pub mod summary;
mod xml;

pub use config::{ConfigError, ReportConfig, ViewerConfig};
pub use exporter::{ExportError, Exporter, export};
pub use layout::ExportLayout;
pub use parser::{ParseError, parse, parse_str};
pub use reader::{ReadError, read_chunk, read_manifest};
pub use runtime::{
    ChunkSource, FetchError, FsChunkSource, ItemFilter, LoadError, LoadState, StepCache,
    StepContext, StepFilter, StepLoader, StepPage, StepQuery, ValidationError, query_page,
    step_context,
};
pub use shell::escape_html;
pub use summary::{summarize, summarize_items};
