//! Input discovery and output path mirroring

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::core::errors::{Result, TranslationError};

/// Extensions picked up by `translate batch` when none are given
pub const DEFAULT_EXTENSIONS: &str = "html,dita,ditamap,svg,xlf";

/// Allow-list of file extensions, compared case-insensitively
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter {
    extensions: BTreeSet<String>,
}

impl ExtensionFilter {
    /// Parse a comma-separated list such as `html, .dita,XLF`
    pub fn parse(list: &str) -> Self {
        let extensions = list
            .split(',')
            .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();

        Self { extensions }
    }

    /// Check if the file's extension is allowed
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| self.extensions.contains(&ext.to_string_lossy().to_lowercase()))
            .unwrap_or(false)
    }

    /// Allowed extensions, sorted
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

impl Default for ExtensionFilter {
    fn default() -> Self {
        Self::parse(DEFAULT_EXTENSIONS)
    }
}

/// Find files under `root` whose extension passes `filter`, recursively and
/// in a stable order. Symlinks to files are included; symlinked directories
/// are not descended into.
pub fn discover_files(root: &Path, filter: &ExtensionFilter) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(TranslationError::file(root, "Not a directory"));
    }

    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| TranslationError::file(root, e))?;
        let path = entry.path();
        if path.is_file() && filter.matches(path) {
            files.push(path.to_path_buf());
        }
    }

    debug!("Discovered {} files under {}", files.len(), root.display());
    Ok(files)
}

/// Return the path that corresponds to `src` under `dst_root`, keeping its
/// position relative to `src_root`
pub fn map_output_path(src: &Path, src_root: &Path, dst_root: &Path) -> Result<PathBuf> {
    let rel = src
        .strip_prefix(src_root)
        .map_err(|e| TranslationError::file(src, e))?;
    Ok(dst_root.join(rel))
}
