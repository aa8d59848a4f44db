//! Configuration for cudacell sessions.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::compile::CUDA_SEARCH_PATHS;
use crate::error::{Error, Result};
use crate::execute::Profiler;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "CUDACELL_CONFIG";

/// Values used for flags a magic invocation leaves out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// Profiler used by `--profile` without `--profiler`.
    pub profiler: Profiler,

    /// nvcc flags used without `--compiler-args`.
    pub compiler_args: String,

    /// Profiler flags used without `--profiler-args`.
    pub profiler_args: String,
}

impl Defaults {
    /// Overwrite the fields that are given, keep the rest.
    pub fn update(
        &mut self,
        profiler: Option<Profiler>,
        compiler_args: Option<String>,
        profiler_args: Option<String>,
    ) {
        if let Some(profiler) = profiler {
            self.profiler = profiler;
        }
        if let Some(compiler_args) = compiler_args {
            self.compiler_args = compiler_args;
        }
        if let Some(profiler_args) = profiler_args {
            self.profiler_args = profiler_args;
        }
    }
}

/// Session configuration, usually read from a JSON file.
///
/// ```json
/// {
///   "workdir": "/tmp/cuda-groups",
///   "nvcc": "/usr/local/cuda/bin/nvcc",
///   "defaults": { "profiler": "nsys", "compiler_args": "-arch=sm_75" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the source groups. A temporary one when unset.
    pub workdir: Option<PathBuf>,

    /// Compiler program.
    pub nvcc: PathBuf,

    /// Directories scanned recursively for profilers not on `PATH`.
    pub search_paths: Vec<PathBuf>,

    /// Initial session defaults.
    pub defaults: Defaults,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workdir: None,
            nvcc: PathBuf::from("nvcc"),
            search_paths: CUDA_SEARCH_PATHS.iter().map(PathBuf::from).collect(),
            defaults: Defaults::default(),
        }
    }
}

impl Config {
    /// Read a config file.
    ///
    /// # Errors
    /// Returns [`Error::Config`] naming the file if it cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid {}: {}", path.display(), e)))
    }

    /// Load `explicit` if given, else the file named by [`CONFIG_ENV`], else
    /// the user config file if it exists, else the built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }

        match Self::user_config_path() {
            Some(path) if path.is_file() => {
                tracing::debug!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// `<config dir>/cudacell/config.json`.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cudacell").join("config.json"))
    }

    /// `<cache dir>/cudacell`, the persistent work directory of the CLI.
    pub fn default_workdir() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join("cudacell"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.nvcc, PathBuf::from("nvcc"));
        assert!(config.workdir.is_none());
        assert_eq!(config.search_paths.len(), CUDA_SEARCH_PATHS.len());
        assert_eq!(config.defaults.profiler, Profiler::Ncu);
    }

    #[test]
    fn test_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{ "nvcc": "/opt/cuda/bin/nvcc", "defaults": { "profiler": "nsys" } }"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.nvcc, PathBuf::from("/opt/cuda/bin/nvcc"));
        assert_eq!(config.defaults.profiler, Profiler::Nsys);
        assert!(config.defaults.compiler_args.is_empty());
        assert_eq!(config.search_paths, Config::default().search_paths);
    }

    #[test]
    fn test_bad_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        let err = Config::from_file(&path).unwrap_err();
        assert!(matches!(err, Error::Config(ref m) if m.contains("config.json")));

        let missing = Config::from_file(&temp.path().join("missing.json")).unwrap_err();
        assert!(matches!(missing, Error::Config(_)));
    }

    #[test]
    fn test_defaults_update() {
        let mut defaults = Defaults::default();
        defaults.update(Some(Profiler::Nsys), None, Some("--stats=true".to_string()));
        assert_eq!(defaults.profiler, Profiler::Nsys);
        assert_eq!(defaults.compiler_args, "");
        assert_eq!(defaults.profiler_args, "--stats=true");

        defaults.update(None, Some("-O3".to_string()), None);
        assert_eq!(defaults.profiler, Profiler::Nsys);
        assert_eq!(defaults.compiler_args, "-O3");
        assert_eq!(defaults.profiler_args, "--stats=true");
    }
}
