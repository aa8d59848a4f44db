//! `nvcc` invocation for a source group.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::execute::run_captured;
use crate::store::{SourceStore, list_files, validate_group_name};

use super::types::{CompileOptions, NO_DEPRECATED_TARGETS_FLAG};

/// Compiles a group, plus the shared group, into one executable.
#[derive(Debug, Clone)]
pub struct NvccCompiler {
    /// Compiler program, a bare name resolved through `PATH` or a full path.
    program: PathBuf,
}

impl Default for NvccCompiler {
    fn default() -> Self {
        Self::new("nvcc")
    }
}

impl NvccCompiler {
    /// Create a compiler that runs `program`.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The compiler program.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Path of the artifact for `group`.
    pub fn artifact_path(&self, store: &SourceStore, group: &str, options: &CompileOptions) -> PathBuf {
        store.group_dir(group).join(&options.exec_name)
    }

    /// Arguments passed to the compiler (program name excluded).
    ///
    /// # Errors
    /// Returns [`Error::InvalidGroupName`] for names outside the work
    /// directory, [`Error::GroupNotFound`] if the group directory is missing
    /// and [`Error::NoSources`] if the group has no `.cu` file of its own.
    pub fn command_line(
        &self,
        store: &SourceStore,
        group: &str,
        options: &CompileOptions,
    ) -> Result<Vec<OsString>> {
        validate_group_name(group)?;
        let group_dir = store.group_dir(group);
        if !group_dir.is_dir() {
            return Err(Error::GroupNotFound(group.to_string()));
        }

        let mut sources = list_files(&group_dir, Some("cu"))?;
        if sources.is_empty() {
            return Err(Error::NoSources(group.to_string()));
        }

        let shared_dir = store.shared_dir();
        if shared_dir != group_dir {
            sources.extend(list_files(&shared_dir, Some("cu"))?);
        }

        let mut include = OsString::from("-I");
        include.push(shared_dir.as_os_str());
        include.push(",");
        include.push(group_dir.as_os_str());

        let mut args = vec![include];
        args.extend(options.compiler_args.split_whitespace().map(OsString::from));
        args.extend(sources.into_iter().map(PathBuf::into_os_string));
        args.push("-o".into());
        args.push(self.artifact_path(store, group, options).into_os_string());
        args.push(NO_DEPRECATED_TARGETS_FLAG.into());

        Ok(args)
    }

    /// Compile `group` and return the executable path.
    ///
    /// Always invokes the compiler; nothing is cached between builds.
    ///
    /// # Errors
    /// Besides the errors of [`Self::command_line`], a failed build is
    /// [`Error::ProcessFailed`] carrying the compiler's combined output, and
    /// a build that exits cleanly without writing the executable is
    /// [`Error::MissingArtifact`].
    pub fn compile(&self, store: &SourceStore, group: &str, options: &CompileOptions) -> Result<PathBuf> {
        let args = self.command_line(store, group, options)?;
        tracing::debug!(
            "{} {}",
            self.program.display(),
            args.iter()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let start = Instant::now();
        let mut cmd = Command::new(&self.program);
        cmd.args(&args);
        let output = run_captured(cmd)?;

        if !output.is_empty() {
            tracing::debug!("nvcc output:\n{}", output);
        }
        tracing::info!(
            "Compiled group {} in {:.2}s",
            group,
            start.elapsed().as_secs_f64()
        );

        let artifact = self.artifact_path(store, group, options);
        if !artifact.is_file() {
            return Err(Error::MissingArtifact {
                path: artifact,
                output,
            });
        }
        Ok(artifact)
    }
}
