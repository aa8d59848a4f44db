//! Session working directory management.
//!
//! Every group of source files lives in its own directory under one root:
//!
//! ```text
//! <workdir>/
//! ├── shared/          # merged into every build
//! │   └── helpers.cu
//! ├── g1/
//! │   ├── main.cu
//! │   ├── kernel.h
//! │   └── cuda_exec.out
//! └── 6f1c...-uuid/    # one-off `%%cuda` cells
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::Result;

/// Root directory that holds all source groups of a session.
#[derive(Debug)]
pub struct WorkDir {
    root: PathBuf,

    /// Keeps a temporary root alive; dropping it removes the directory.
    _temp: Option<TempDir>,
}

impl WorkDir {
    /// Use (and create if needed) a persistent directory.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root, _temp: None })
    }

    /// Create a fresh temporary directory removed when the value drops.
    pub fn temporary() -> Result<Self> {
        let temp = tempfile::Builder::new().prefix("cudacell-").tempdir()?;
        Ok(Self {
            root: temp.path().to_path_buf(),
            _temp: Some(temp),
        })
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether the directory is removed when the session ends.
    pub fn is_temporary(&self) -> bool {
        self._temp.is_some()
    }

    /// Directory of a group. Not created.
    pub fn group_dir(&self, group: &str) -> PathBuf {
        self.root.join(group)
    }
}
