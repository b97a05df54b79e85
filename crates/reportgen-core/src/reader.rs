//! Reads exported data files back into wire types.
//!
//! Manifest and chunk files are scripts of the form `window.<name> = <json>;`.
//! Only the JSON value following each assignment is parsed; anything after it
//! (the chunk load hook, for instance) is ignored.

use std::path::{Path, PathBuf};

use reportgen_proto::{CompactStep, ExportManifest, ManifestItem, ReportMeta, SystemInfo};
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::exporter::{ITEMS_VAR, REPORT_META_VAR, SYSTEM_INFO_VAR};

const CHUNK_VAR_PREFIX: &str = "window.stepsData_";

/// Errors that can occur while reading an exported file.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no `{0}` assignment found")]
    MissingAssignment(String),

    #[error("malformed JSON in `{var}`: {source}")]
    Json {
        var: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reads a manifest file written by the exporter.
pub fn read_manifest(path: &Path) -> Result<ExportManifest, ReadError> {
    let text = read_text(path)?;
    parse_manifest(&text)
}

/// Parses manifest file contents.
pub fn parse_manifest(text: &str) -> Result<ExportManifest, ReadError> {
    let items: Vec<ManifestItem> = assigned_value(text, ITEMS_VAR)?;
    let system_info: SystemInfo = assigned_value(text, SYSTEM_INFO_VAR)?;
    let report: ReportMeta = assigned_value(text, REPORT_META_VAR)?;
    Ok(ExportManifest {
        report,
        items,
        system_info,
    })
}

/// Reads the compact step records of a chunk file.
pub fn read_chunk(path: &Path) -> Result<Vec<CompactStep>, ReadError> {
    let text = read_text(path)?;
    parse_chunk(&text)
}

/// Parses chunk file contents.
pub fn parse_chunk(text: &str) -> Result<Vec<CompactStep>, ReadError> {
    let start = text
        .find(CHUNK_VAR_PREFIX)
        .ok_or_else(|| ReadError::MissingAssignment(CHUNK_VAR_PREFIX.to_string()))?;
    let rest = &text[start + "window.".len()..];
    let eq = rest
        .find('=')
        .ok_or_else(|| ReadError::MissingAssignment(CHUNK_VAR_PREFIX.to_string()))?;
    let var = rest[..eq].trim().to_string();
    first_json_value(&rest[eq + 1..], &var)
}

fn read_text(path: &Path) -> Result<String, ReadError> {
    std::fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn assigned_value<T: DeserializeOwned>(text: &str, var: &str) -> Result<T, ReadError> {
    let needle = format!("window.{var} =");
    let start = text
        .find(&needle)
        .ok_or_else(|| ReadError::MissingAssignment(var.to_string()))?;
    first_json_value(&text[start + needle.len()..], var)
}

fn first_json_value<T: DeserializeOwned>(rest: &str, var: &str) -> Result<T, ReadError> {
    let json_error = |source| ReadError::Json {
        var: var.to_string(),
        source,
    };
    serde_json::Deserializer::from_str(rest)
        .into_iter::<T>()
        .next()
        .ok_or_else(|| ReadError::MissingAssignment(var.to_string()))?
        .map_err(json_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chunk_ignores_hook() {
        let text = "window.stepsData_3 = [\n{\"t\":\"1\",\"i\":\"A\",\"r\":\"pass\",\"c\":\"x\"}\n];\n\nif (window.onStepsLoaded_3) {\n    window.onStepsLoaded_3(window.stepsData_3);\n}\n";
        let records = parse_chunk(text).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ident, "A");
        assert!(records[0].table.is_none());
    }

    #[test]
    fn test_parse_chunk_without_assignment() {
        let err = parse_chunk("console.log(1);").unwrap_err();
        assert!(matches!(err, ReadError::MissingAssignment(_)));
    }

    #[test]
    fn test_parse_chunk_malformed_json() {
        let err = parse_chunk("window.stepsData_0 = [{\"t\": };").unwrap_err();
        match err {
            ReadError::Json { var, .. } => assert_eq!(var, "stepsData_0"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_manifest_requires_all_assignments() {
        let err = parse_manifest("window.testData = [];\nwindow.systemInfo = {};\n").unwrap_err();
        assert!(matches!(err, ReadError::MissingAssignment(var) if var == "reportMeta"));
    }

    #[test]
    fn test_parse_manifest_minimal() {
        let text = concat!(
            "window.testData = [{\"item_type\":\"skipped\",\"index\":0,\"title\":\"T\",\"start_time\":\"s\"}];\n",
            "window.systemInfo = {};\n",
            "window.reportMeta = {\"title\":\"R\",\"start_time\":\"\",\"end_time\":\"\",\"timestamp\":\"\",",
            "\"verdicts\":\"\",\"generated_at\":\"\",\"summary\":{\"total\":0,\"passed\":0,\"failed\":0,",
            "\"warned\":0,\"skipped\":1,\"pass_rate\":0.0}};\n",
        );
        let manifest = parse_manifest(text).unwrap();
        assert_eq!(manifest.items.len(), 1);
        assert_eq!(manifest.items[0].title(), "T");
        assert_eq!(manifest.report.title, "R");
        assert!(manifest.system_info.engineer.is_empty());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_chunk(Path::new("/nonexistent/steps_1.js")).unwrap_err();
        assert!(matches!(err, ReadError::Io { .. }));
    }
}
