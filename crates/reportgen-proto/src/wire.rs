//! Export wire types.
//!
//! These are the JSON shapes written by the exporter and read back by the
//! lazy-load runtime. Field names are part of the file contract with the
//! viewer: manifest items use snake_case keys, step records in chunk files
//! use the compact keys `t`, `i`, `r`, `c` and `tab: {d, h, r}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{
    HardwareCategory, ItemKind, ReportDocument, SkippedTest, Step, TabularInfo, TestCase,
};

/// A step record in compact field encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompactStep {
    #[serde(rename = "t")]
    pub timestamp: String,
    #[serde(rename = "i")]
    pub ident: String,
    #[serde(rename = "r")]
    pub result: String,
    #[serde(rename = "c")]
    pub content: String,
    #[serde(rename = "tab", default, skip_serializing_if = "Option::is_none")]
    pub table: Option<CompactTable>,
}

/// Tabular data in compact field encoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompactTable {
    #[serde(rename = "d", default)]
    pub description: String,
    #[serde(rename = "h", default)]
    pub headings: Vec<String>,
    #[serde(rename = "r", default)]
    pub rows: Vec<Vec<String>>,
}

impl From<&Step> for CompactStep {
    /// A table is only carried when it has at least one heading or row.
    fn from(step: &Step) -> Self {
        let table = step
            .tabular_info
            .as_ref()
            .filter(|table| !table.is_empty())
            .map(|table| CompactTable {
                description: table.description.clone(),
                headings: table.headings.clone(),
                rows: table.rows.clone(),
            });

        Self {
            timestamp: step.timestamp.clone(),
            ident: step.ident.clone(),
            result: step.result.clone(),
            content: step.content.clone(),
            table,
        }
    }
}

impl From<CompactStep> for Step {
    fn from(compact: CompactStep) -> Self {
        Self {
            timestamp: compact.timestamp,
            ident: compact.ident,
            result: compact.result,
            content: compact.content,
            tabular_info: compact.table.map(|table| TabularInfo {
                description: table.description,
                headings: table.headings,
                rows: table.rows,
            }),
        }
    }
}

/// Lightweight descriptor of one report item, as listed in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum ManifestItem {
    Skipped {
        index: usize,
        title: String,
        start_time: String,
    },
    Testcase {
        index: usize,
        title: String,
        start_time: String,
        end_time: String,
        verdict: String,
        description: String,
        steps_count: usize,
        has_steps: bool,
        /// Chunk reference, present only when `has_steps` is true.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        steps_file: Option<String>,
    },
}

impl ManifestItem {
    pub fn skipped(index: usize, skipped: &SkippedTest) -> Self {
        ManifestItem::Skipped {
            index,
            title: skipped.title.clone(),
            start_time: skipped.start_time.clone(),
        }
    }

    /// Builds a test case descriptor. `steps_file` is dropped when the case
    /// has no steps so that `has_steps` and the chunk reference never disagree.
    pub fn testcase(index: usize, case: &TestCase, steps_file: Option<String>) -> Self {
        let steps_count = case.step_count();
        let has_steps = steps_count > 0;
        ManifestItem::Testcase {
            index,
            title: case.title.clone(),
            start_time: case.start_time.clone(),
            end_time: case.end_time.clone(),
            verdict: case.verdict.clone(),
            description: case.description.clone(),
            steps_count,
            has_steps,
            steps_file: if has_steps { steps_file } else { None },
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ManifestItem::Skipped { index, .. } | ManifestItem::Testcase { index, .. } => *index,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self {
            ManifestItem::Skipped { .. } => ItemKind::Skipped,
            ManifestItem::Testcase { .. } => ItemKind::Testcase,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            ManifestItem::Skipped { title, .. } | ManifestItem::Testcase { title, .. } => title,
        }
    }

    pub fn start_time(&self) -> &str {
        match self {
            ManifestItem::Skipped { start_time, .. }
            | ManifestItem::Testcase { start_time, .. } => start_time,
        }
    }

    /// End time of a test case; empty for skipped items.
    pub fn end_time(&self) -> &str {
        match self {
            ManifestItem::Skipped { .. } => "",
            ManifestItem::Testcase { end_time, .. } => end_time,
        }
    }

    /// Verdict of a test case; empty for skipped items.
    pub fn verdict(&self) -> &str {
        match self {
            ManifestItem::Skipped { .. } => "",
            ManifestItem::Testcase { verdict, .. } => verdict,
        }
    }

    pub fn steps_count(&self) -> usize {
        match self {
            ManifestItem::Skipped { .. } => 0,
            ManifestItem::Testcase { steps_count, .. } => *steps_count,
        }
    }

    pub fn has_steps(&self) -> bool {
        self.steps_count() > 0
    }

    /// Chunk reference, relative to the report html.
    pub fn steps_file(&self) -> Option<&str> {
        match self {
            ManifestItem::Skipped { .. } => None,
            ManifestItem::Testcase { steps_file, .. } => steps_file.as_deref(),
        }
    }
}

/// System-wide metadata, exported once and loaded eagerly by the viewer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub engineer: BTreeMap<String, String>,
    #[serde(default)]
    pub testsetup: BTreeMap<String, String>,
    #[serde(default)]
    pub hardware: BTreeMap<String, HardwareCategory>,
}

impl From<&ReportDocument> for SystemInfo {
    fn from(doc: &ReportDocument) -> Self {
        Self {
            engineer: doc.engineer_info.clone(),
            testsetup: doc.test_setup_info.clone(),
            hardware: doc.hardware_info.clone(),
        }
    }
}

impl SystemInfo {
    pub fn is_empty(&self) -> bool {
        self.engineer.is_empty() && self.testsetup.is_empty() && self.hardware.is_empty()
    }
}

/// Verdict statistics over the executed items of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Executed test cases.
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub warned: usize,
    pub skipped: usize,
    /// Percentage of executed cases that passed, 0 when nothing was executed.
    pub pass_rate: f64,
}

/// Document-level header data shown by the viewer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub timestamp: String,
    pub verdicts: String,
    /// RFC 3339 time at which the export was produced.
    pub generated_at: String,
    pub summary: ReportSummary,
}

/// Everything the exporter writes to the manifest file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub report: ReportMeta,
    pub items: Vec<ManifestItem>,
    pub system_info: SystemInfo,
}

impl ExportManifest {
    /// Number of chunk files the export references.
    pub fn chunk_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.steps_file().is_some())
            .count()
    }
}
