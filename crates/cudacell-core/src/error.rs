//! Error types for cudacell-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for cudacell-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cudacell-core.
#[derive(Debug, Error)]
pub enum Error {
    /// Source file name does not end in an allowed extension.
    #[error("source name \"{name}\" has extension \"{extension}\", expected \".cu\" or \".h\"")]
    InvalidExtension { name: String, extension: String },

    /// Group name is not a single plain directory name.
    #[error("invalid group name \"{0}\"")]
    InvalidGroupName(String),

    /// Source file name is not a single plain file name.
    #[error("invalid source name \"{0}\"")]
    InvalidSourceName(String),

    /// Group directory does not exist.
    #[error("group \"{0}\" does not exist")]
    GroupNotFound(String),

    /// Group exists but holds no `.cu` files of its own.
    #[error("group \"{0}\" does not have any source files")]
    NoSources(String),

    /// An external tool could not be located.
    #[error("could not find the \"{tool}\" executable")]
    ToolNotFound { tool: String },

    /// An external process exited unsuccessfully.
    ///
    /// `output` holds the combined stdout and stderr of the process.
    #[error("{program} exited with {}", code.map(|c| format!("status {}", c)).unwrap_or_else(|| "a signal".to_string()))]
    ProcessFailed {
        program: String,
        code: Option<i32>,
        output: String,
    },

    /// The compiler succeeded without writing the executable.
    ///
    /// `output` holds what the compiler printed.
    #[error("nvcc did not produce {}", path.display())]
    MissingArtifact { path: PathBuf, output: String },

    /// No command is registered under this name.
    #[error("unknown magic command: {0}")]
    UnknownCommand(String),

    /// A cell command was invoked without a cell body.
    #[error("magic \"{0}\" needs a cell body")]
    MissingCellBody(String),

    /// Malformed cell script.
    #[error("script error at line {line}: {message}")]
    Script { line: usize, message: String },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Render the error together with a recovery hint, if there is one.
    pub fn with_hint(&self) -> String {
        match self.hint() {
            Some(hint) => format!("{}\n  hint: {}", self, hint),
            None => self.to_string(),
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            Self::InvalidExtension { .. } => {
                Some("rename the cell with -n <file>.cu or -n <file>.h".to_string())
            }
            Self::InvalidGroupName(_) => Some(
                "use a plain directory name such as g1; \".\", \"..\" and names with path separators are not allowed"
                    .to_string(),
            ),
            Self::InvalidSourceName(_) => Some(
                "use a plain file name such as main.cu; names with path separators are not allowed"
                    .to_string(),
            ),
            Self::MissingArtifact { .. } => Some(
                "check the compiler arguments for flags that stop before linking, such as -E, -c or --version"
                    .to_string(),
            ),
            Self::GroupNotFound(group) => Some(format!(
                "save a source file first with %%cuda_group_save -g {} -n <file>.cu",
                group
            )),
            Self::NoSources(_) => Some(
                "header files alone cannot be compiled; add at least one .cu file to the group"
                    .to_string(),
            ),
            Self::ToolNotFound { tool } => Some(format!(
                "search for where \"{}\" is installed and add its directory to the PATH environment variable",
                tool
            )),
            Self::UnknownCommand(_) => Some(
                "available magics: cuda, cuda_group_save, cuda_group_run, cuda_group_delete, cuda_set_defaults"
                    .to_string(),
            ),
            _ => None,
        }
    }

    /// Captured output of a failed process, if this is a process failure.
    pub fn process_output(&self) -> Option<&str> {
        match self {
            Self::ProcessFailed { output, .. } | Self::MissingArtifact { output, .. } => Some(output),
            _ => None,
        }
    }
}
