//! # reportgen-proto
//!
//! Shared types for the reportgen workspace.
//!
//! This crate provides the foundational data structures used across all
//! reportgen crates, including:
//! - The in-memory document model built by the parser
//! - The manifest and compact step records written by the exporter
//! - Verdict classification shared by summaries and filters

pub mod model;
pub mod wire;

pub use model::{
    Device, DeviceProperty, HardwareCategory, ItemKind, ReportDocument, SkippedTest, Step,
    TabularInfo, TestCase, TestItem, Verdict,
};
pub use wire::{
    CompactStep, CompactTable, ExportManifest, ManifestItem, ReportMeta, ReportSummary, SystemInfo,
};
