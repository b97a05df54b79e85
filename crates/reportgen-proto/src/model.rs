//! In-memory model of a parsed test report.
//!
//! The model is a plain data container. It is built once by the parser,
//! never mutated afterwards, and handed to the exporter. Timestamps are kept
//! as the verbatim strings found in the source document because the source
//! format does not use one consistent time format.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root of a parsed report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub title: String,
    pub start_time: String,
    /// Resolved end time. Empty only when no candidate exists anywhere in the source.
    pub end_time: String,
    pub timestamp: String,
    pub verdict_summary: String,

    /// Leaf items in document order. Grouping structure is not retained.
    pub items: Vec<TestItem>,

    pub engineer_info: BTreeMap<String, String>,
    pub test_setup_info: BTreeMap<String, String>,

    /// Keyed by `"{name}_{category}"`, or `name` alone when the category is empty.
    pub hardware_info: BTreeMap<String, HardwareCategory>,
}

impl ReportDocument {
    /// Number of executed test cases.
    pub fn executed_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, TestItem::Executed(_)))
            .count()
    }

    /// Number of skipped (never executed) items.
    pub fn skipped_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item, TestItem::Skipped(_)))
            .count()
    }

    /// Total number of steps across all executed items.
    pub fn step_count(&self) -> usize {
        self.items.iter().map(|item| item.steps().len()).sum()
    }
}

/// Discriminant of a [`TestItem`], as written to the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Skipped,
    Testcase,
}

/// A leaf item of the report: either never executed, or executed with steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TestItem {
    Skipped(SkippedTest),
    Executed(TestCase),
}

impl TestItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            TestItem::Skipped(_) => ItemKind::Skipped,
            TestItem::Executed(_) => ItemKind::Testcase,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            TestItem::Skipped(skipped) => &skipped.title,
            TestItem::Executed(case) => &case.title,
        }
    }

    pub fn start_time(&self) -> &str {
        match self {
            TestItem::Skipped(skipped) => &skipped.start_time,
            TestItem::Executed(case) => &case.start_time,
        }
    }

    /// Steps of an executed item; always empty for skipped items.
    pub fn steps(&self) -> &[Step] {
        match self {
            TestItem::Skipped(_) => &[],
            TestItem::Executed(case) => &case.steps,
        }
    }
}

/// A test that was never executed (NT).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkippedTest {
    pub title: String,
    pub start_time: String,
}

/// An executed test case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub end_timestamp: String,
    /// Raw verdict string (`pass`, `fail`, `warn`, `na`, or anything else).
    pub verdict: String,
    pub description: String,
    pub steps: Vec<Step>,
}

impl TestCase {
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

/// A single step recorded inside a test case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub timestamp: String,
    pub ident: String,
    pub result: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tabular_info: Option<TabularInfo>,
}

/// Tabular data attached to a step.
///
/// Rows are not required to have as many cells as there are headings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularInfo {
    pub description: String,
    pub headings: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabularInfo {
    /// True when the table has neither headings nor rows.
    pub fn is_empty(&self) -> bool {
        self.headings.is_empty() && self.rows.is_empty()
    }
}

/// A hardware section of the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareCategory {
    pub name: String,
    pub category: String,
    pub devices: Vec<Device>,
}

/// A device listed under a hardware section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Declared device type, `"general"` when the source has none.
    #[serde(rename = "type")]
    pub device_type: String,
    pub properties: BTreeMap<String, DeviceProperty>,
}

impl Device {
    pub const GENERAL: &'static str = "general";

    pub fn general() -> Self {
        Self {
            device_type: Self::GENERAL.to_string(),
            properties: BTreeMap::new(),
        }
    }
}

/// A single named property of a device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProperty {
    pub name: String,
    pub description: String,
}

/// Classified verdict or step result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    /// `fail`, or the `ng` ("no good") spelling.
    Fail,
    Warn,
    Na,
    Other(String),
}

impl Verdict {
    /// Classifies a raw verdict or result string, ignoring case.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "pass" => Verdict::Pass,
            "fail" | "ng" => Verdict::Fail,
            "warn" => Verdict::Warn,
            "na" | "" => Verdict::Na,
            other => Verdict::Other(other.to_string()),
        }
    }
}
