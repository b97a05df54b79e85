//! Chunked report exporter.
//!
//! Splits a parsed document into a lightweight manifest plus one chunk file
//! per test case that has steps. The viewer loads the manifest eagerly and
//! fetches chunks only when an item is opened, so a report with tens of
//! thousands of steps never has to be materialized in the browser at once.
//!
//! Data files are plain scripts so that they can be loaded with `<script src>`
//! from `file://` without a web server:
//!
//! ```text
//! window.testData = [...];          manifest items
//! window.systemInfo = {...};        engineer / test setup / hardware
//! window.reportMeta = {...};        header and summary
//!
//! window.stepsData_7 = [...];       chunk for item 7, compact step records
//! if (window.onStepsLoaded_7) { window.onStepsLoaded_7(window.stepsData_7); }
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};

use reportgen_proto::{
    CompactStep, ExportManifest, ManifestItem, ReportDocument, ReportMeta, Step, SystemInfo,
    TestItem,
};
use serde::Serialize;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ViewerConfig;
use crate::layout::ExportLayout;
use crate::shell;
use crate::summary;

/// Manifest variable holding the item descriptors.
pub const ITEMS_VAR: &str = "testData";
/// Manifest variable holding the system information.
pub const SYSTEM_INFO_VAR: &str = "systemInfo";
/// Manifest variable holding the report header.
pub const REPORT_META_VAR: &str = "reportMeta";

/// Variable a chunk file assigns its step records to.
pub fn chunk_var(index: usize) -> String {
    format!("stepsData_{index}")
}

/// Hook a chunk file calls once its records are defined.
pub fn chunk_hook(index: usize) -> String {
    format!("onStepsLoaded_{index}")
}

/// Errors that can occur while exporting a report.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ExportError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Writes exports using the given viewer settings.
#[derive(Debug, Clone, Default)]
pub struct Exporter {
    viewer: ViewerConfig,
}

impl Exporter {
    pub fn new(viewer: ViewerConfig) -> Self {
        Self { viewer }
    }

    /// Exports `doc` to `destination` (the primary html file).
    ///
    /// Chunks are written first, then the manifest, then the html shell. Each
    /// file is fully rendered in memory and moved into place atomically.
    pub fn export(
        &self,
        doc: &ReportDocument,
        destination: impl AsRef<Path>,
    ) -> Result<ExportManifest, ExportError> {
        let layout = ExportLayout::for_destination(destination);
        let data_dir = layout.data_dir();
        std::fs::create_dir_all(&data_dir).map_err(|e| ExportError::io(&data_dir, e))?;

        let manifest = build_manifest(doc, &layout);

        let mut chunks = 0;
        for (index, item) in doc.items.iter().enumerate() {
            if let TestItem::Executed(case) = item
                && !case.steps.is_empty()
            {
                let path = layout.chunk_path(index);
                write_atomic(&path, &render_chunk(index, &case.steps)?)?;
                debug!("Wrote chunk {} ({} steps)", path.display(), case.steps.len());
                chunks += 1;
            }
        }

        let manifest_path = layout.manifest_path();
        write_atomic(&manifest_path, &render_manifest(&manifest)?)?;

        let html = shell::render_shell(&manifest, &layout, &self.viewer)?;
        write_atomic(layout.html_path(), &html)?;

        info!(
            "Exported {} items ({} chunks) to {}",
            manifest.items.len(),
            chunks,
            layout.html_path().display()
        );
        Ok(manifest)
    }
}

/// Exports `doc` to `destination` with default viewer settings.
pub fn export(
    doc: &ReportDocument,
    destination: impl AsRef<Path>,
) -> Result<ExportManifest, ExportError> {
    Exporter::default().export(doc, destination)
}

/// Builds the manifest for `doc` without touching the filesystem.
pub fn build_manifest(doc: &ReportDocument, layout: &ExportLayout) -> ExportManifest {
    let items = doc
        .items
        .iter()
        .enumerate()
        .map(|(index, item)| match item {
            TestItem::Skipped(skipped) => ManifestItem::skipped(index, skipped),
            TestItem::Executed(case) => {
                ManifestItem::testcase(index, case, Some(layout.chunk_ref(index)))
            }
        })
        .collect();

    ExportManifest {
        report: ReportMeta {
            title: doc.title.clone(),
            start_time: doc.start_time.clone(),
            end_time: doc.end_time.clone(),
            timestamp: doc.timestamp.clone(),
            verdicts: doc.verdict_summary.clone(),
            generated_at: chrono::Utc::now().to_rfc3339(),
            summary: summary::summarize(doc),
        },
        items,
        system_info: SystemInfo::from(doc),
    }
}

/// Renders the manifest file contents.
pub fn render_manifest(manifest: &ExportManifest) -> Result<String, ExportError> {
    let mut out = String::new();
    push_assignment(&mut out, ITEMS_VAR, &manifest.items)?;
    out.push('\n');
    push_assignment(&mut out, SYSTEM_INFO_VAR, &manifest.system_info)?;
    out.push('\n');
    push_assignment(&mut out, REPORT_META_VAR, &manifest.report)?;
    Ok(out)
}

fn push_assignment<T: Serialize>(
    out: &mut String,
    var: &str,
    value: &T,
) -> Result<(), ExportError> {
    out.push_str("window.");
    out.push_str(var);
    out.push_str(" = ");
    out.push_str(&serde_json::to_string_pretty(value)?);
    out.push_str(";\n");
    Ok(())
}

/// Renders one chunk file: compact records, one per line, then the load hook.
pub fn render_chunk(index: usize, steps: &[Step]) -> Result<String, ExportError> {
    let var = chunk_var(index);
    let hook = chunk_hook(index);

    let mut out = format!("window.{var} = [\n");
    for (position, step) in steps.iter().enumerate() {
        if position > 0 {
            out.push_str(",\n");
        }
        out.push_str(&serde_json::to_string(&CompactStep::from(step))?);
    }
    out.push_str("\n];\n");
    out.push_str(&format!(
        "\nif (window.{hook}) {{\n    window.{hook}(window.{var});\n}}\n"
    ));
    Ok(out)
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), ExportError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(|e| ExportError::io(path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| ExportError::io(path, e))?;
    file.flush().map_err(|e| ExportError::io(path, e))?;
    file.persist(path).map_err(|e| ExportError::io(path, e.error))?;
    Ok(())
}
