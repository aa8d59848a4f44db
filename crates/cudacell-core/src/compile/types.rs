//! Common types for the compilation pipeline.

/// Executable name used when the caller does not pick one.
pub const DEFAULT_EXEC_NAME: &str = "cuda_exec.out";

/// Always passed last to nvcc to silence warnings about deprecated targets.
pub const NO_DEPRECATED_TARGETS_FLAG: &str = "-Wno-deprecated-gpu-targets";

/// Per-build options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// File name of the artifact inside the group directory.
    pub exec_name: String,

    /// Extra nvcc flags, split on whitespace.
    pub compiler_args: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            exec_name: DEFAULT_EXEC_NAME.to_string(),
            compiler_args: String::new(),
        }
    }
}

impl CompileOptions {
    /// Default options with extra compiler flags.
    pub fn with_compiler_args(compiler_args: impl Into<String>) -> Self {
        Self {
            compiler_args: compiler_args.into(),
            ..Self::default()
        }
    }
}
