//! Report source parser.
//!
//! Reads a test-execution log once and builds a [`ReportDocument`]. Leaf items
//! (`skipped` and `testcase`) are collected by an order-preserving recursive
//! descent that looks through any depth of `testgroup` nesting, so the item
//! list always reflects true document order.
//!
//! Parsing is all-or-nothing: any failure yields a single [`ParseError`] and no
//! partial document.

use std::path::Path;

use reportgen_proto::{
    Device, DeviceProperty, HardwareCategory, ReportDocument, SkippedTest, Step, TabularInfo,
    TestCase, TestItem,
};
use thiserror::Error;
use tracing::{debug, info};

use crate::xml::{self, Element};

const UNKNOWN_HARDWARE: &str = "Unknown Hardware";

/// Errors that can occur while parsing a report source.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The document is not well-formed.
    #[error("malformed report document at byte {position}: {message}")]
    Syntax { message: String, position: u64 },

    /// The document could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    pub(crate) fn syntax(message: impl Into<String>, position: u64) -> Self {
        ParseError::Syntax {
            message: message.into(),
            position,
        }
    }
}

/// Parses the report source at `path`.
pub fn parse(path: impl AsRef<Path>) -> Result<ReportDocument, ParseError> {
    let path = path.as_ref();
    info!("Parsing report source {}", path.display());
    let bytes = std::fs::read(path)?;
    parse_bytes(&bytes)
}

/// Parses a report source held in memory.
pub fn parse_str(source: &str) -> Result<ReportDocument, ParseError> {
    parse_bytes(source.as_bytes())
}

fn parse_bytes(bytes: &[u8]) -> Result<ReportDocument, ParseError> {
    let root = xml::parse_document(bytes)?;

    let mut doc = ReportDocument {
        title: root.child_text("title"),
        start_time: root.attr_or_empty("starttime"),
        end_time: resolve_end_time(&root),
        timestamp: root.attr_or_empty("timestamp"),
        verdict_summary: root.attr_or_empty("verdicts"),
        ..ReportDocument::default()
    };

    collect_items(&root, &mut doc.items);

    if let Some(section) = root.child("engineer") {
        collect_info(section, &mut doc.engineer_info);
    }
    if let Some(section) = root.child("testsetup") {
        collect_info(section, &mut doc.test_setup_info);
    }
    for section in root.children_named("hardware") {
        let (key, category) = parse_hardware(section);
        doc.hardware_info.insert(key, category);
    }

    if doc.end_time.is_empty() {
        doc.end_time = last_item_time(&doc.items);
    }

    info!(
        "Parsed {} items ({} executed, {} skipped, {} steps)",
        doc.items.len(),
        doc.executed_count(),
        doc.skipped_count(),
        doc.step_count()
    );
    Ok(doc)
}

/// Root `endtime`, then `completion/compend@endtime`, then the root verdict's
/// `endtime` or `time`. The item-based fallback runs after items are collected.
fn resolve_end_time(root: &Element) -> String {
    let candidates = [
        root.attr("endtime"),
        root.child("completion")
            .and_then(|completion| completion.child("compend"))
            .and_then(|compend| compend.attr("endtime")),
        root.child("verdict").and_then(|verdict| {
            verdict
                .attr("endtime")
                .filter(|value| !value.is_empty())
                .or_else(|| verdict.attr("time"))
        }),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// Scans from the last item backwards and takes the first executed item with
/// an end time, or failing that its start time.
///
/// Skipped items never supply the end time, even when one trails the report
/// with a start time. A never-executed item says nothing about when the run
/// finished.
fn last_item_time(items: &[TestItem]) -> String {
    for item in items.iter().rev() {
        match item {
            TestItem::Executed(case) if !case.end_time.is_empty() => {
                return case.end_time.clone();
            }
            TestItem::Executed(case) if !case.start_time.is_empty() => {
                return case.start_time.clone();
            }
            _ => {}
        }
    }
    String::new()
}

fn collect_items(parent: &Element, items: &mut Vec<TestItem>) {
    for child in parent.children() {
        match child.name() {
            "skipped" => items.push(TestItem::Skipped(parse_skipped(child))),
            "testcase" => items.push(TestItem::Executed(parse_testcase(child))),
            "testgroup" => collect_items(child, items),
            _ => {}
        }
    }
}

fn parse_skipped(element: &Element) -> SkippedTest {
    SkippedTest {
        title: element.child_text("title"),
        start_time: element.attr_or_empty("starttime"),
    }
}

fn parse_testcase(element: &Element) -> TestCase {
    let mut case = TestCase {
        title: element.child_text("title"),
        start_time: element.attr_or_empty("starttime"),
        description: element.child_text("description"),
        ..TestCase::default()
    };

    if let Some(verdict) = element.child("verdict") {
        case.verdict = verdict.attr_or_empty("result");
        case.end_time = verdict.attr_or_empty("endtime");
        case.end_timestamp = verdict.attr_or_empty("endtimestamp");
    }

    case.steps = element.children_named("teststep").map(parse_step).collect();
    debug!("Test case '{}': {} steps", case.title, case.steps.len());
    case
}

fn parse_step(element: &Element) -> Step {
    Step {
        timestamp: element.attr_or_empty("timestamp"),
        ident: element.attr_or_empty("ident"),
        result: element.attr_or_empty("result"),
        content: element.text().to_string(),
        tabular_info: element.child("tabularinfo").map(parse_tabular),
    }
}

fn parse_tabular(element: &Element) -> TabularInfo {
    let cells = |row: &Element| -> Vec<String> {
        row.children_named("cell")
            .map(|cell| cell.text().to_string())
            .collect()
    };

    TabularInfo {
        description: element.child_text("description"),
        headings: element.child("heading").map(cells).unwrap_or_default(),
        rows: element.children_named("row").map(cells).collect(),
    }
}

/// Later duplicates of a name overwrite earlier ones.
fn collect_info(section: &Element, into: &mut std::collections::BTreeMap<String, String>) {
    for info in section.descendants_named("xinfo") {
        into.insert(info.child_text("name"), info.child_text("description"));
    }
}

fn parse_hardware(section: &Element) -> (String, HardwareCategory) {
    let name = section.attr("name").unwrap_or(UNKNOWN_HARDWARE).to_string();
    let category = section.attr_or_empty("category");
    let key = if category.is_empty() {
        name.clone()
    } else {
        format!("{name}_{category}")
    };

    let mut devices: Vec<Device> = section
        .descendants_named("xinfoset")
        .into_iter()
        .flat_map(|set| set.children_named("xinfoobject"))
        .map(|object| Device {
            device_type: object
                .attr("type")
                .filter(|value| !value.is_empty())
                .unwrap_or(Device::GENERAL)
                .to_string(),
            properties: collect_properties(object.children_named("xinfo")),
        })
        .collect();

    // Older reports list xinfo entries directly under the hardware section.
    if devices.is_empty() {
        let legacy = section.descendants_named("xinfo");
        if !legacy.is_empty() {
            devices.push(Device {
                properties: collect_properties(legacy.into_iter()),
                ..Device::general()
            });
        }
    }

    (
        key,
        HardwareCategory {
            name,
            category,
            devices,
        },
    )
}

fn collect_properties<'a>(
    entries: impl Iterator<Item = &'a Element>,
) -> std::collections::BTreeMap<String, DeviceProperty> {
    entries
        .map(|info| {
            (
                info.attr_or_empty("key"),
                DeviceProperty {
                    name: info.child_text("name"),
                    description: info.child_text("description"),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<testmodule starttime="2024-05-01 10:00:00" timestamp="0.0" verdicts="fail">
  <title>Body Controller Regression</title>
  <engineer>
    <xinfo><name>Tester</name><description>Alice</description></xinfo>
    <xinfo><name>Tester</name><description>Bob</description></xinfo>
  </engineer>
  <testsetup>
    <xinfo><name>Tool</name><description>Bench 3</description></xinfo>
  </testsetup>
  <hardware name="ECU" category="Power">
    <xinfoset type="devices">
      <xinfoobject type="can">
        <xinfo key="ch"><name>Channel</name><description>CAN1</description></xinfo>
      </xinfoobject>
      <xinfoobject>
        <xinfo key="sn"><name>Serial</name><description>42</description></xinfo>
      </xinfoobject>
    </xinfoset>
  </hardware>
  <hardware name="Legacy">
    <xinfo key="fw"><name>Firmware</name><description>1.2</description></xinfo>
  </hardware>
  <skipped starttime="10:00:01"><title>T1</title></skipped>
  <testgroup>
    <title>Group A</title>
    <testcase starttime="10:00:02">
      <title>T2</title>
      <description>Checks wake-up</description>
      <teststep timestamp="1.0" ident="CAN" result="pass">Frame received<tabularinfo>
          <description>Signals</description>
          <heading><cell>Name</cell><cell>Value</cell></heading>
          <row><cell>rpm</cell><cell>800</cell></row>
          <row><cell>gear</cell></row>
        </tabularinfo></teststep>
      <teststep timestamp="2.0" ident="DIAG" result="pass">Session ok</teststep>
      <verdict result="pass" endtime="10:00:05" endtimestamp="5.0"/>
    </testcase>
    <testgroup>
      <testcase starttime="10:00:06">
        <title>T3</title>
        <verdict result="fail" endtime="10:00:07"/>
      </testcase>
    </testgroup>
  </testgroup>
  <skipped starttime="10:00:08"><title>T4</title></skipped>
</testmodule>"#;

    #[test]
    fn test_root_attributes() {
        let doc = parse_str(SAMPLE).unwrap();
        assert_eq!(doc.title, "Body Controller Regression");
        assert_eq!(doc.start_time, "2024-05-01 10:00:00");
        assert_eq!(doc.timestamp, "0.0");
        assert_eq!(doc.verdict_summary, "fail");
    }

    #[test]
    fn test_items_in_document_order_across_groups() {
        let doc = parse_str(SAMPLE).unwrap();
        let titles: Vec<_> = doc.items.iter().map(|item| item.title()).collect();
        assert_eq!(titles, vec!["T1", "T2", "T3", "T4"]);
        assert_eq!(doc.executed_count(), 2);
        assert_eq!(doc.skipped_count(), 2);
    }

    #[test]
    fn test_executed_item_fields_and_steps() {
        let doc = parse_str(SAMPLE).unwrap();
        let TestItem::Executed(case) = &doc.items[1] else {
            panic!("expected executed item");
        };

        assert_eq!(case.verdict, "pass");
        assert_eq!(case.end_time, "10:00:05");
        assert_eq!(case.end_timestamp, "5.0");
        assert_eq!(case.description, "Checks wake-up");
        assert_eq!(case.steps.len(), 2);

        let first = &case.steps[0];
        assert_eq!(first.ident, "CAN");
        assert_eq!(first.content, "Frame received");
        let table = first.tabular_info.as_ref().unwrap();
        assert_eq!(table.description, "Signals");
        assert_eq!(table.headings, vec!["Name", "Value"]);
        assert_eq!(table.rows, vec![vec!["rpm", "800"], vec!["gear"]]);

        assert!(case.steps[1].tabular_info.is_none());
        assert_eq!(case.steps[1].content, "Session ok");
    }

    #[test]
    fn test_testcase_without_verdict_or_title() {
        let doc = parse_str(r#"<r><testcase starttime="1"/></r>"#).unwrap();
        let TestItem::Executed(case) = &doc.items[0] else {
            panic!("expected executed item");
        };
        assert_eq!(case.title, "");
        assert_eq!(case.verdict, "");
        assert_eq!(case.end_time, "");
        assert!(case.steps.is_empty());
    }

    #[test]
    fn test_info_sections_last_write_wins() {
        let doc = parse_str(SAMPLE).unwrap();
        assert_eq!(doc.engineer_info.len(), 1);
        assert_eq!(doc.engineer_info["Tester"], "Bob");
        assert_eq!(doc.test_setup_info["Tool"], "Bench 3");
    }

    #[test]
    fn test_hardware_devices() {
        let doc = parse_str(SAMPLE).unwrap();

        let ecu = &doc.hardware_info["ECU_Power"];
        assert_eq!(ecu.name, "ECU");
        assert_eq!(ecu.category, "Power");
        assert_eq!(ecu.devices.len(), 2);
        assert_eq!(ecu.devices[0].device_type, "can");
        assert_eq!(ecu.devices[0].properties["ch"].description, "CAN1");
        assert_eq!(ecu.devices[1].device_type, "general");

        let legacy = &doc.hardware_info["Legacy"];
        assert_eq!(legacy.devices.len(), 1);
        assert_eq!(legacy.devices[0].device_type, "general");
        assert_eq!(legacy.devices[0].properties["fw"].name, "Firmware");
    }

    #[test]
    fn test_hardware_same_name_different_category() {
        let doc = parse_str(
            r#"<r><hardware name="PSU" category="A"/><hardware name="PSU" category="B"/><hardware/></r>"#,
        )
        .unwrap();
        assert!(doc.hardware_info.contains_key("PSU_A"));
        assert!(doc.hardware_info.contains_key("PSU_B"));
        assert!(doc.hardware_info.contains_key(UNKNOWN_HARDWARE));
        assert!(doc.hardware_info["PSU_A"].devices.is_empty());
    }

    #[test]
    fn test_end_time_from_root() {
        let doc = parse_str(
            r#"<r endtime="A"><completion><compend endtime="B"/></completion></r>"#,
        )
        .unwrap();
        assert_eq!(doc.end_time, "A");
    }

    #[test]
    fn test_end_time_from_completion() {
        let doc = parse_str(
            r#"<r><completion><compend endtime="B"/></completion><verdict endtime="C"/></r>"#,
        )
        .unwrap();
        assert_eq!(doc.end_time, "B");
    }

    #[test]
    fn test_end_time_from_verdict_time() {
        let doc = parse_str(r#"<r><verdict time="D"/></r>"#).unwrap();
        assert_eq!(doc.end_time, "D");
    }

    #[test]
    fn test_end_time_from_last_executed_item() {
        // No root, completion, or verdict end time: the last executed item wins.
        let doc = parse_str(SAMPLE).unwrap();
        assert_eq!(doc.end_time, "10:00:07");
    }

    #[test]
    fn test_end_time_falls_back_to_item_start() {
        let doc = parse_str(
            r#"<r><testcase starttime="S1"><verdict endtime="E1"/></testcase><testcase starttime="S2"/><skipped starttime="S3"/></r>"#,
        )
        .unwrap();
        assert_eq!(doc.end_time, "S2");
    }

    #[test]
    fn test_trailing_skipped_item_does_not_set_end_time() {
        let doc = parse_str(
            r#"<r><testcase starttime="S1"><verdict endtime="E1"/></testcase><skipped starttime="S9"/></r>"#,
        )
        .unwrap();
        assert_eq!(doc.end_time, "E1");
    }

    #[test]
    fn test_end_time_empty_without_candidates() {
        let doc = parse_str(r#"<r><skipped starttime="S"/></r>"#).unwrap();
        assert_eq!(doc.end_time, "");
    }

    #[test]
    fn test_unknown_elements_are_ignored() {
        let doc = parse_str(
            r#"<r><preparation><testcase/></preparation><misc/><testcase/></r>"#,
        )
        .unwrap();
        assert_eq!(doc.items.len(), 1);
    }

    #[test]
    fn test_malformed_document_is_syntax_error() {
        let err = parse_str("<r><testcase></r>").unwrap_err();
        assert!(matches!(err, ParseError::Syntax { .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = parse(dir.path().join("missing.xml")).unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }

    #[test]
    fn test_parse_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.xml");
        std::fs::write(&path, SAMPLE).unwrap();

        let doc = parse(&path).unwrap();
        assert_eq!(doc.items.len(), 4);
    }
}
