//! File naming for an exported report.
//!
//! For a destination `out/report.html` the export looks like:
//!
//! ```text
//! out/report.html
//! out/report_js/report_data.js   manifest (items, system info, header)
//! out/report_js/steps_1.js       one chunk per item with steps
//! ```

use std::path::{Path, PathBuf};

/// Paths of every file belonging to one exported report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportLayout {
    html_path: PathBuf,
    stem: String,
}

impl ExportLayout {
    /// Derives the layout from the path of the primary html file.
    pub fn for_destination(html_path: impl AsRef<Path>) -> Self {
        let html_path = html_path.as_ref().to_path_buf();
        let stem = html_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| "report".to_string());
        Self { html_path, stem }
    }

    pub fn html_path(&self) -> &Path {
        &self.html_path
    }

    /// Directory containing the html file, which chunk references are relative to.
    pub fn base_dir(&self) -> PathBuf {
        match self.html_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Name of the sibling data directory, as referenced from the html.
    pub fn data_dir_name(&self) -> String {
        format!("{}_js", self.stem)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.base_dir().join(self.data_dir_name())
    }

    fn manifest_file_name(&self) -> String {
        format!("{}_data.js", self.stem)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.data_dir().join(self.manifest_file_name())
    }

    /// Manifest location relative to the html, used in the shell's `<script src>`.
    pub fn manifest_ref(&self) -> String {
        format!("{}/{}", self.data_dir_name(), self.manifest_file_name())
    }

    /// Chunk reference for the item at `index`, relative to the html.
    pub fn chunk_ref(&self, index: usize) -> String {
        format!("{}/steps_{index}.js", self.data_dir_name())
    }

    pub fn chunk_path(&self, index: usize) -> PathBuf {
        self.data_dir().join(format!("steps_{index}.js"))
    }

    /// Resolves a chunk reference read from a manifest to a filesystem path.
    pub fn resolve_ref(&self, chunk_ref: &str) -> PathBuf {
        self.base_dir().join(chunk_ref)
    }
}
