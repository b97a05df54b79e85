//! The primary html file of an export.
//!
//! The shell is a static page: header, summary and item list are rendered
//! server-side so the report is readable without scripts, and the embedded
//! viewer script takes over to load step chunks on demand.

use std::fmt::Write as _;

use reportgen_proto::{ExportManifest, ManifestItem};
use serde::Serialize;

use crate::config::ViewerConfig;
use crate::exporter::ExportError;
use crate::layout::ExportLayout;

const VIEWER_JS: &str = include_str!("../assets/viewer.js");
const VIEWER_CSS: &str = include_str!("../assets/viewer.css");

/// Settings injected into the page as `window.viewerConfig`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewerSettings {
    page_size: usize,
    cache_capacity: usize,
    fetch_timeout_ms: u64,
}

impl From<&ViewerConfig> for ViewerSettings {
    fn from(config: &ViewerConfig) -> Self {
        Self {
            page_size: config.page_size,
            cache_capacity: config.cache_capacity,
            fetch_timeout_ms: config.fetch_timeout_secs.saturating_mul(1000),
        }
    }
}

/// Renders the html shell for an export.
pub fn render_shell(
    manifest: &ExportManifest,
    layout: &ExportLayout,
    viewer: &ViewerConfig,
) -> Result<String, ExportError> {
    let report = &manifest.report;
    let summary = &report.summary;
    let title = if report.title.is_empty() {
        "Test Report"
    } else {
        report.title.as_str()
    };
    let settings = serde_json::to_string(&ViewerSettings::from(viewer))?;

    let mut html = String::with_capacity(VIEWER_JS.len() + VIEWER_CSS.len() + 4096);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    let _ = writeln!(html, "<title>{}</title>", escape_html(title));
    let _ = writeln!(html, "<style>\n{VIEWER_CSS}</style>");
    html.push_str("</head>\n<body>\n<header>\n");
    let _ = writeln!(html, "<h1>{}</h1>", escape_html(title));
    let _ = writeln!(
        html,
        "<p class=\"times\">{} &ndash; {}</p>",
        escape_html(&report.start_time),
        escape_html(&report.end_time)
    );
    let _ = writeln!(
        html,
        "<p class=\"summary\">Total {} &middot; Pass {} &middot; Fail {} &middot; Warn {} &middot; Skipped {} &middot; Pass rate {:.1}%</p>",
        summary.total, summary.passed, summary.failed, summary.warned, summary.skipped, summary.pass_rate
    );
    html.push_str("<button id=\"system-info-button\" type=\"button\">System info</button>\n");
    html.push_str("</header>\n<main>\n<nav>\n<div id=\"item-filters\"></div>\n<ul id=\"items\">\n");
    for item in &manifest.items {
        push_item(&mut html, item);
    }
    html.push_str("</ul>\n</nav>\n<section id=\"detail\"></section>\n</main>\n");

    let _ = writeln!(html, "<script>window.viewerConfig = {settings};</script>");
    let _ = writeln!(html, "<script src=\"{}\"></script>", escape_html(&layout.manifest_ref()));
    let _ = writeln!(html, "<script>\n{VIEWER_JS}</script>");
    html.push_str("</body>\n</html>\n");
    Ok(html)
}

fn push_item(html: &mut String, item: &ManifestItem) {
    let (class, badge) = match item {
        ManifestItem::Skipped { .. } => ("skipped".to_string(), "NT".to_string()),
        ManifestItem::Testcase { verdict, .. } => {
            let class = if verdict.is_empty() { "na" } else { verdict.as_str() };
            (escape_html(class), escape_html(&verdict.to_uppercase()))
        }
    };
    let _ = writeln!(
        html,
        "<li class=\"item {class}\" data-index=\"{}\"><span class=\"badge\">{badge}</span> {} <span class=\"count\">{}</span></li>",
        item.index(),
        escape_html(item.title()),
        item.steps_count()
    );
}

/// Escapes text for use in html content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use reportgen_proto::{ReportMeta, SkippedTest, TestCase};

    fn manifest() -> ExportManifest {
        let case = TestCase {
            title: "Bus <load> & \"stress\"".to_string(),
            verdict: "fail".to_string(),
            ..TestCase::default()
        };
        ExportManifest {
            report: ReportMeta {
                title: "Nightly".to_string(),
                ..ReportMeta::default()
            },
            items: vec![
                ManifestItem::skipped(0, &SkippedTest::default()),
                ManifestItem::testcase(1, &case, None),
            ],
            ..ExportManifest::default()
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">&'"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;"
        );
    }

    #[test]
    fn test_shell_escapes_titles() {
        let layout = ExportLayout::for_destination("out/r.html");
        let html = render_shell(&manifest(), &layout, &ViewerConfig::default()).unwrap();

        assert!(html.contains("Bus &lt;load&gt; &amp; &quot;stress&quot;"));
        assert!(!html.contains("Bus <load>"));
        assert!(html.contains("<title>Nightly</title>"));
        assert!(html.contains(r#"<li class="item skipped" data-index="0">"#));
        assert!(html.contains(r#"<li class="item fail" data-index="1">"#));
    }

    #[test]
    fn test_shell_injects_viewer_config() {
        let layout = ExportLayout::for_destination("r.html");
        let viewer = ViewerConfig {
            page_size: 50,
            cache_capacity: 5,
            fetch_timeout_secs: 10,
        };
        let html = render_shell(&manifest(), &layout, &viewer).unwrap();

        assert!(html.contains(
            r#"window.viewerConfig = {"pageSize":50,"cacheCapacity":5,"fetchTimeoutMs":10000};"#
        ));
        assert!(html.contains(r#"<script src="r_js/r_data.js"></script>"#));
        assert!(html.contains("onStepsLoaded_"));
    }

    #[test]
    fn test_shell_wires_system_info_and_step_context() {
        let layout = ExportLayout::for_destination("r.html");
        let html = render_shell(&manifest(), &layout, &ViewerConfig::default()).unwrap();

        assert!(html.contains(r#"<button id="system-info-button" type="button">System info</button>"#));
        assert!(html.contains("window.systemInfo"));
        assert!(html.contains("window.reportMeta"));
        assert!(html.contains("function showSystemInfo()"));
        assert!(html.contains("function stepContext(allSteps, target, radius)"));
    }

    #[test]
    fn test_viewer_api_does_not_expose_cache() {
        let api = &VIEWER_JS[VIEWER_JS.find("window.reportViewer").unwrap()..];
        let api = &api[..api.find("};").unwrap()];
        assert!(api.contains("loadSteps"));
        assert!(api.contains("queryPage"));
        assert!(!api.contains("cache"));
    }
}
