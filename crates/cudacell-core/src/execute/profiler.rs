//! NVIDIA profilers and their resolved locations.

use std::fmt;
use std::path::PathBuf;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::compile::ExecutableLocator;
use crate::error::{Error, Result};

/// Supported profiling tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profiler {
    /// NVIDIA Nsight Compute.
    #[default]
    Ncu,
    /// NVIDIA Nsight Systems.
    Nsys,
}

impl Profiler {
    /// Executable name of the tool.
    pub fn executable_name(self) -> &'static str {
        match self {
            Self::Ncu => "ncu",
            Self::Nsys => "nsys",
        }
    }
}

impl fmt::Display for Profiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable_name())
    }
}

/// Memoized profiler paths for one session.
///
/// Paths are resolved on first use and never invalidated.
#[derive(Debug, Clone)]
pub struct ProfilerCache {
    locator: ExecutableLocator,
    paths: FxHashMap<Profiler, PathBuf>,
}

impl ProfilerCache {
    /// Create an empty cache that resolves through `locator`.
    pub fn new(locator: ExecutableLocator) -> Self {
        Self {
            locator,
            paths: FxHashMap::default(),
        }
    }

    /// Path of `profiler`, searching on the first call.
    ///
    /// # Errors
    /// Returns [`Error::ToolNotFound`] if the tool cannot be located.
    pub fn resolve(&mut self, profiler: Profiler) -> Result<PathBuf> {
        if let Some(path) = self.paths.get(&profiler) {
            return Ok(path.clone());
        }

        let path = self
            .locator
            .find(profiler.executable_name())
            .ok_or_else(|| Error::ToolNotFound {
                tool: profiler.executable_name().to_string(),
            })?;

        tracing::info!("Using {} at {}", profiler, path.display());
        self.paths.insert(profiler, path.clone());
        Ok(path)
    }

    /// Cached path, without searching.
    pub fn cached(&self, profiler: Profiler) -> Option<&PathBuf> {
        self.paths.get(&profiler)
    }
}

impl Default for ProfilerCache {
    fn default() -> Self {
        Self::new(ExecutableLocator::cuda())
    }
}
