//! Verdict statistics for a report.

use reportgen_proto::{ManifestItem, ReportDocument, ReportSummary, TestItem};

/// Computes verdict statistics from a parsed document.
pub fn summarize(doc: &ReportDocument) -> ReportSummary {
    tally(doc.items.iter().map(|item| match item {
        TestItem::Skipped(_) => None,
        TestItem::Executed(case) => Some(case.verdict.as_str()),
    }))
}

/// Computes verdict statistics from manifest items of an existing export.
pub fn summarize_items(items: &[ManifestItem]) -> ReportSummary {
    tally(items.iter().map(|item| match item {
        ManifestItem::Skipped { .. } => None,
        ManifestItem::Testcase { verdict, .. } => Some(verdict.as_str()),
    }))
}

// `None` marks a skipped item, `Some(verdict)` an executed one.
fn tally<'a>(verdicts: impl Iterator<Item = Option<&'a str>>) -> ReportSummary {
    let mut summary = ReportSummary::default();
    for verdict in verdicts {
        match verdict {
            None => summary.skipped += 1,
            Some(verdict) => {
                summary.total += 1;
                match verdict {
                    "pass" => summary.passed += 1,
                    "fail" => summary.failed += 1,
                    "warn" => summary.warned += 1,
                    _ => {}
                }
            }
        }
    }
    if summary.total > 0 {
        summary.pass_rate = summary.passed as f64 / summary.total as f64 * 100.0;
    }
    summary
}
