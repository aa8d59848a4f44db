//! Running compiled group executables.

use std::path::Path;
use std::process::Command;

use crate::error::Result;

use super::process::run_captured;
use super::profiler::{Profiler, ProfilerCache};
use super::timeit::{TimeitOptions, timeit};

/// How to run an executable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Report timing statistics instead of program output.
    pub timeit: bool,

    /// Run under a profiler. Ignored when `timeit` is set.
    pub profile: bool,

    /// Profiler used when `profile` is set.
    pub profiler: Profiler,

    /// Extra profiler flags, split on whitespace.
    pub profiler_args: String,
}

/// Runs executables, optionally profiled or timed.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    timeit_options: TimeitOptions,
}

impl Runner {
    /// Create a runner with default timing parameters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom timing parameters.
    pub fn with_timeit_options(mut self, options: TimeitOptions) -> Self {
        self.timeit_options = options;
        self
    }

    /// Run `exec_path` and return what it printed, or the timing summary.
    ///
    /// Output is returned verbatim, profiler banners included.
    ///
    /// # Errors
    /// - [`crate::Error::ToolNotFound`] if the profiler cannot be located
    /// - [`crate::Error::ProcessFailed`] if the program or profiler fails
    pub fn run(
        &self,
        exec_path: &Path,
        options: &RunOptions,
        profilers: &mut ProfilerCache,
    ) -> Result<String> {
        if options.timeit {
            let result = timeit(self.timeit_options, || {
                run_captured(Command::new(exec_path)).map(|_| ())
            })?;
            return Ok(result.to_string());
        }

        let command = if options.profile {
            let profiler_path = profilers.resolve(options.profiler)?;
            let mut cmd = Command::new(profiler_path);
            cmd.args(options.profiler_args.split_whitespace()).arg(exec_path);
            cmd
        } else {
            Command::new(exec_path)
        };

        tracing::debug!("Running {:?}", command);
        run_captured(command)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::compile::ExecutableLocator;
    use crate::error::Error;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, format!("#!/bin/sh\n{}", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn no_profilers(temp: &TempDir) -> ProfilerCache {
        ProfilerCache::new(ExecutableLocator::new([temp.path().join("none")]).with_path_var(""))
    }

    #[test]
    fn test_plain_run() {
        let temp = TempDir::new().unwrap();
        let exe = script(temp.path(), "cuda_exec.out", "echo 'Hello World!'\n");

        let output = Runner::new()
            .run(&exe, &RunOptions::default(), &mut no_profilers(&temp))
            .unwrap();
        assert_eq!(output, "Hello World!\n");
    }

    #[test]
    fn test_profiled_run_passes_args_then_executable() {
        let temp = TempDir::new().unwrap();
        let exe = script(temp.path(), "cuda_exec.out", "echo 'Hello World!'\n");
        let bin = temp.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        script(&bin, "ncu", "echo \"==PROF== args: $*\"\nfor last; do :; done\nexec \"$last\"\n");

        let mut profilers = ProfilerCache::new(ExecutableLocator::default().with_path_var(bin.as_os_str()));
        let options = RunOptions {
            profile: true,
            profiler_args: "--metrics  l1tex__t_sectors_pipe_lsu_mem_global_op_ld.sum".to_string(),
            ..RunOptions::default()
        };
        let output = Runner::new().run(&exe, &options, &mut profilers).unwrap();

        assert_eq!(
            output,
            format!(
                "==PROF== args: --metrics l1tex__t_sectors_pipe_lsu_mem_global_op_ld.sum {}\nHello World!\n",
                exe.display()
            )
        );
    }

    #[test]
    fn test_missing_profiler() {
        let temp = TempDir::new().unwrap();
        let exe = script(temp.path(), "cuda_exec.out", "echo hi\n");
        let options = RunOptions {
            profile: true,
            profiler: Profiler::Nsys,
            ..RunOptions::default()
        };

        let err = Runner::new()
            .run(&exe, &options, &mut no_profilers(&temp))
            .unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { ref tool } if tool == "nsys"));
    }

    #[test]
    fn test_timeit_ignores_profile() {
        let temp = TempDir::new().unwrap();
        let exe = script(temp.path(), "cuda_exec.out", "echo 'Hello World!'\n");
        let options = RunOptions {
            timeit: true,
            profile: true,
            ..RunOptions::default()
        };
        let runner = Runner::new().with_timeit_options(TimeitOptions {
            repeat: 2,
            min_batch: Duration::from_millis(1),
        });

        // No profiler is installed, so reaching the profiler would fail.
        let output = runner.run(&exe, &options, &mut no_profilers(&temp)).unwrap();
        assert!(output.contains(" per loop (mean ± std. dev. of 2 runs, "), "{}", output);
        assert!(!output.contains("Hello World!"));
    }

    #[test]
    fn test_failing_program_keeps_output() {
        let temp = TempDir::new().unwrap();
        let exe = script(temp.path(), "cuda_exec.out", "echo 'CUDA error: no device' >&2\nexit 3\n");

        let err = Runner::new()
            .run(&exe, &RunOptions::default(), &mut no_profilers(&temp))
            .unwrap_err();
        assert_eq!(err.process_output(), Some("CUDA error: no device\n"));
    }
}
