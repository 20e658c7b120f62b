//! Model file discovery.

use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, UnhideError};

/// Kind of model file, by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    /// `.m3d`
    Part,
    /// `.a3d`
    Assembly,
}

impl ModelKind {
    /// Every model kind the walker picks up.
    pub const ALL: [ModelKind; 2] = [ModelKind::Part, ModelKind::Assembly];

    /// Lowercase file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ModelKind::Part => "m3d",
            ModelKind::Assembly => "a3d",
        }
    }

    /// Classify a path by its extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension().and_then(OsStr::to_str)?;
        Self::ALL
            .into_iter()
            .find(|kind| ext.eq_ignore_ascii_case(kind.extension()))
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Part => write!(f, "part"),
            ModelKind::Assembly => write!(f, "assembly"),
        }
    }
}

/// A model file found under the root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFile {
    /// Path of the model file.
    pub path: PathBuf,
    /// Part or assembly, from the extension.
    pub kind: ModelKind,
}

impl ModelFile {
    /// Wrap a path if it carries a model extension.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        ModelKind::from_path(&path).map(|kind| Self { path, kind })
    }
}

/// Lazy, depth-first iterator over the model files below a root.
///
/// Directories are read one at a time as the iterator advances. Entries
/// come out in whatever order the filesystem returns them. Directories that
/// cannot be read are logged and skipped. Symlinked directories are not
/// followed.
#[derive(Debug)]
pub struct ModelWalker {
    pending: Vec<fs::ReadDir>,
    recursive: bool,
}

/// Start walking `root`. Fails when `root` is not an existing directory.
pub fn walk(root: impl AsRef<Path>, recursive: bool) -> Result<ModelWalker> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(UnhideError::DirectoryNotFound(root.to_path_buf()));
    }
    let entries = fs::read_dir(root)?;
    Ok(ModelWalker {
        pending: vec![entries],
        recursive,
    })
}

impl Iterator for ModelWalker {
    type Item = ModelFile;

    fn next(&mut self) -> Option<ModelFile> {
        loop {
            let entry = match self.pending.last_mut()?.next() {
                None => {
                    self.pending.pop();
                    continue;
                }
                Some(Err(err)) => {
                    tracing::warn!("skipping unreadable directory entry: {err}");
                    continue;
                }
                Some(Ok(entry)) => entry,
            };

            let path = entry.path();
            let file_type = match entry.file_type() {
                Ok(file_type) => file_type,
                Err(err) => {
                    tracing::warn!("cannot stat {}: {err}", path.display());
                    continue;
                }
            };

            if file_type.is_dir() {
                if self.recursive {
                    match fs::read_dir(&path) {
                        Ok(entries) => self.pending.push(entries),
                        Err(err) => tracing::warn!("skipping {}: {err}", path.display()),
                    }
                }
                continue;
            }

            if !path.is_file() {
                continue;
            }
            if let Some(file) = ModelFile::from_path(path) {
                return Some(file);
            }
        }
    }
}
