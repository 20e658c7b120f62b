//! Shared test utilities for kompas-unhide integration tests.
//!
//! Builds model folders on disk (via `tempfile`) and registers the same
//! paths on an in-memory CAD session, so the walker, the processor and the
//! summary can be exercised together.

#![allow(dead_code)]

pub mod builders;

use kompas_unhide::host::memory::{MemoryModel, MemorySession};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ===========================================================================
// Model folders
// ===========================================================================

/// A temporary folder tree with some files registered as models.
pub struct ModelTree {
    pub dir: TempDir,
}

impl ModelTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Create an empty file at `relative`, creating parent folders.
    pub fn touch(&self, relative: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create folders");
        }
        fs::write(&path, b"").expect("create file");
        path
    }

    /// Create `relative` on disk and register `model` for it on `session`.
    pub fn add_model(
        &self,
        session: &MemorySession,
        relative: &str,
        model: MemoryModel,
    ) -> PathBuf {
        let path = self.touch(relative);
        session.add_model(path.clone(), model);
        path
    }
}

// ===========================================================================
// Path helpers
// ===========================================================================

/// Paths relative to `root`, sorted, with `/` separators.
pub fn relative_names(root: &Path, paths: impl IntoIterator<Item = PathBuf>) -> Vec<String> {
    let mut names: Vec<String> = paths
        .into_iter()
        .map(|p| {
            p.strip_prefix(root)
                .expect("path below root")
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect();
    names.sort();
    names
}
