//! Locating CUDA toolchain executables.
//!
//! Looks in `PATH` first, then scans the usual CUDA installation roots.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Installation roots scanned, in priority order, when a tool is not on `PATH`.
pub const CUDA_SEARCH_PATHS: [&str; 4] = ["/opt/nvidia/nsight-compute", "/usr/local/cuda", "/opt", "/usr"];

/// Finds executables by name.
#[derive(Debug, Clone, Default)]
pub struct ExecutableLocator {
    /// Directories scanned recursively after `PATH`.
    search_dirs: Vec<PathBuf>,

    /// Overrides the process `PATH` when set.
    path_var: Option<OsString>,
}

impl ExecutableLocator {
    /// Create a locator with extra recursive search directories.
    pub fn new<I, P>(search_dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_dirs: search_dirs.into_iter().map(Into::into).collect(),
            path_var: None,
        }
    }

    /// Locator over [`CUDA_SEARCH_PATHS`].
    pub fn cuda() -> Self {
        Self::new(CUDA_SEARCH_PATHS)
    }

    /// Search this value instead of the process `PATH`.
    pub fn with_path_var(mut self, path_var: impl Into<OsString>) -> Self {
        self.path_var = Some(path_var.into());
        self
    }

    /// The extra search directories.
    pub fn search_dirs(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Find an executable named `name`.
    ///
    /// Returns the first executable file found in a `PATH` directory, else
    /// the first match of a recursive scan of the search directories.
    pub fn find(&self, name: &str) -> Option<PathBuf> {
        if let Some(path) = self.find_in_path(name) {
            tracing::debug!("Found {} on PATH: {}", name, path.display());
            return Some(path);
        }

        for dir in &self.search_dirs {
            if let Some(path) = find_recursive(dir, name) {
                tracing::debug!("Found {} under {}: {}", name, dir.display(), path.display());
                return Some(path);
            }
        }

        tracing::debug!("{} not found", name);
        None
    }

    fn find_in_path(&self, name: &str) -> Option<PathBuf> {
        let path_var = self
            .path_var
            .clone()
            .or_else(|| std::env::var_os("PATH"))?;
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        which::which_in(name, Some(path_var), cwd).ok()
    }
}

/// Depth-first scan of `root` for an executable file named `name`.
fn find_recursive(root: &Path, name: &str) -> Option<PathBuf> {
    let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
    WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_name() == name && is_executable(entry.path()))
        .map(|entry| entry.into_path())
}

/// Whether `path` is a regular file with an execute bit set.
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = path.metadata() else {
        return false;
    };
    if !metadata.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        metadata.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        true
    }
}
