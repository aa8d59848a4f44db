//! A magic session: one work directory, one toolchain, one set of defaults.

use std::path::{Path, PathBuf};

use crate::compile::{CompileOptions, ExecutableLocator, NvccCompiler};
use crate::config::{Config, Defaults};
use crate::error::{Error, Result};
use crate::execute::{ProfilerCache, RunOptions, Runner};
use crate::paths::WorkDir;
use crate::store::SourceStore;

use super::args::RunRequest;
use super::commands::{CommandKind, CommandTable};

/// State shared by the magics of one session.
///
/// Everything runs synchronously on the caller's thread. Two invocations
/// touching the same group name are not coordinated.
#[derive(Debug)]
pub struct Session {
    store: SourceStore,
    compiler: NvccCompiler,
    runner: Runner,
    profilers: ProfilerCache,
    defaults: Defaults,
    commands: CommandTable,
}

impl Session {
    /// Create a session over `workdir` with the default toolchain.
    pub fn new(workdir: WorkDir) -> Self {
        tracing::info!(
            "Source files will be saved in \"{}\"{}",
            workdir.root().display(),
            if workdir.is_temporary() { " (temporary)" } else { "" }
        );
        Self {
            store: SourceStore::new(workdir),
            compiler: NvccCompiler::default(),
            runner: Runner::default(),
            profilers: ProfilerCache::default(),
            defaults: Defaults::default(),
            commands: CommandTable::builtin(),
        }
    }

    /// Create a session over a fresh temporary directory.
    pub fn temporary() -> Result<Self> {
        Ok(Self::new(WorkDir::temporary()?))
    }

    /// Create a session from a configuration.
    ///
    /// Uses `config.workdir` when set, else a temporary directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        let workdir = match &config.workdir {
            Some(dir) => WorkDir::new(dir)?,
            None => WorkDir::temporary()?,
        };
        let locator = ExecutableLocator::new(config.search_paths.iter().cloned());

        Ok(Self::new(workdir)
            .with_compiler(NvccCompiler::new(&config.nvcc))
            .with_profilers(ProfilerCache::new(locator))
            .with_defaults(config.defaults.clone()))
    }

    /// Use a different compiler.
    pub fn with_compiler(mut self, compiler: NvccCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// Use a different runner.
    pub fn with_runner(mut self, runner: Runner) -> Self {
        self.runner = runner;
        self
    }

    /// Use a different profiler cache.
    pub fn with_profilers(mut self, profilers: ProfilerCache) -> Self {
        self.profilers = profilers;
        self
    }

    /// Start from these defaults.
    pub fn with_defaults(mut self, defaults: Defaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Use a different command table.
    pub fn with_commands(mut self, commands: CommandTable) -> Self {
        self.commands = commands;
        self
    }

    /// The source store.
    pub fn store(&self) -> &SourceStore {
        &self.store
    }

    /// The work directory root.
    pub fn workdir(&self) -> &Path {
        self.store.workdir().root()
    }

    /// Current defaults.
    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Mutable access to the defaults.
    pub fn defaults_mut(&mut self) -> &mut Defaults {
        &mut self.defaults
    }

    /// The command table.
    pub fn commands(&self) -> &CommandTable {
        &self.commands
    }

    /// Run the magic `name` with its argument line and optional cell body.
    ///
    /// The handler receives a snapshot of the defaults taken before it runs.
    /// `Ok(None)` means the magic showed nothing (including when its flags
    /// did not parse and help was printed instead).
    ///
    /// # Errors
    /// - [`Error::UnknownCommand`] if no magic has this name
    /// - [`Error::MissingCellBody`] if a cell magic gets no body
    /// - validation and not-found errors of the magic itself
    pub fn invoke(&mut self, name: &str, line: &str, cell: Option<&str>) -> Result<Option<String>> {
        let command = self
            .commands
            .get(name)
            .ok_or_else(|| Error::UnknownCommand(name.to_string()))?;

        let body = match (command.kind, cell) {
            (CommandKind::Cell, Some(body)) => body,
            (CommandKind::Cell, None) => return Err(Error::MissingCellBody(name.to_string())),
            (CommandKind::Line, Some(body)) => {
                if !body.trim().is_empty() {
                    tracing::warn!("%{} is a line magic, ignoring its cell body", name);
                }
                ""
            }
            (CommandKind::Line, None) => "",
        };

        let defaults = self.defaults.clone();
        (command.handler)(self, line, body, &defaults)
    }

    /// Save a source file into a group.
    pub fn save_source(&self, group: &str, filename: &str, code: &str) -> Result<PathBuf> {
        self.store.save(group, filename, code)
    }

    /// Delete a group.
    pub fn delete_group(&self, group: &str) -> Result<()> {
        self.store.delete(group)
    }

    /// Compile a group with the shared group.
    pub fn compile(&self, group: &str, options: &CompileOptions) -> Result<PathBuf> {
        self.compiler.compile(&self.store, group, options)
    }

    /// Run an executable.
    pub fn run(&mut self, exec_path: &Path, options: &RunOptions) -> Result<String> {
        self.runner.run(exec_path, options, &mut self.profilers)
    }

    /// Compile a group and run the result.
    ///
    /// A failing compiler, profiler or program is not an error here: its
    /// captured output is returned as the result, so compiler diagnostics
    /// read like program output. The same holds for a compiler that exits
    /// cleanly without producing an executable.
    pub fn compile_and_run(&mut self, group: &str, request: &RunRequest) -> Result<String> {
        let result = self
            .compile(group, &request.compile)
            .and_then(|exec_path| self.run(&exec_path, &request.run));

        match result {
            Err(Error::ProcessFailed { program, code, output }) => {
                tracing::debug!("{} failed ({:?}), showing its output", program, code);
                Ok(output)
            }
            Err(Error::MissingArtifact { path, output }) => {
                tracing::warn!("nvcc did not produce {}, showing its output", path.display());
                Ok(output)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_command() {
        let mut session = Session::temporary().unwrap();
        let err = session.invoke("cuda_run", "", None).unwrap_err();
        assert!(matches!(err, Error::UnknownCommand(ref n) if n == "cuda_run"));
    }

    #[test]
    fn test_cell_magic_needs_body() {
        let mut session = Session::temporary().unwrap();
        let err = session.invoke("cuda", "", None).unwrap_err();
        assert!(matches!(err, Error::MissingCellBody(ref n) if n == "cuda"));
    }

    #[test]
    fn test_save_and_delete_magics() {
        let mut session = Session::temporary().unwrap();
        let code = "__global__ void k() {}\n";

        session
            .invoke("cuda_group_save", "-g g1 -n kernel.cu", Some(code))
            .unwrap();
        assert_eq!(session.store().read("g1", "kernel.cu").unwrap(), code);

        session.invoke("cuda_group_delete", "--group g1", None).unwrap();
        assert!(!session.store().exists("g1"));
    }

    #[test]
    fn test_save_magic_rejects_extension() {
        let mut session = Session::temporary().unwrap();
        let err = session
            .invoke("cuda_group_save", "-g g1 -n notes.txt", Some(""))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidExtension { .. }));
    }

    #[test]
    fn test_group_flag_cannot_leave_workdir() {
        let temp = tempfile::TempDir::new().unwrap();
        let precious = temp.path().join("precious");
        std::fs::create_dir_all(&precious).unwrap();
        std::fs::write(precious.join("keep.cu"), "").unwrap();

        let mut session = Session::new(WorkDir::new(temp.path().join("work")).unwrap());

        let err = session
            .invoke("cuda_group_delete", "-g ../precious", None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidGroupName(ref g) if g == "../precious"));
        assert!(precious.join("keep.cu").is_file());

        let err = session
            .invoke("cuda_group_save", "-g ../escaped -n x.cu", Some("int x;\n"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidGroupName(_)));
        assert!(!temp.path().join("escaped").exists());

        let err = session
            .invoke("cuda_group_save", "-g g1 -n ../x.cu", Some("int x;\n"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSourceName(_)));
        assert!(!temp.path().join("work").join("x.cu").exists());

        let err = session.invoke("cuda_group_run", "-g ..", None).unwrap_err();
        assert!(matches!(err, Error::InvalidGroupName(_)));
    }

    #[test]
    fn test_run_missing_group_is_an_error() {
        let mut session = Session::temporary().unwrap();
        let err = session.invoke("cuda_group_run", "-g nope", None).unwrap_err();
        assert!(matches!(err, Error::GroupNotFound(_)));
    }

    #[test]
    fn test_missing_compiler_is_an_error() {
        let mut session = Session::temporary()
            .unwrap()
            .with_compiler(NvccCompiler::new("/nonexistent/bin/nvcc"));
        let err = session
            .invoke("cuda", "", Some("int main() { return 0; }\n"))
            .unwrap_err();
        assert!(matches!(err, Error::ToolNotFound { .. }));
    }

    #[test]
    fn test_from_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = Config {
            workdir: Some(temp.path().join("groups")),
            nvcc: PathBuf::from("/opt/cuda/bin/nvcc"),
            defaults: Defaults {
                compiler_args: "-O3".to_string(),
                ..Defaults::default()
            },
            ..Config::default()
        };

        let session = Session::from_config(&config).unwrap();
        assert_eq!(session.workdir(), temp.path().join("groups"));
        assert_eq!(session.defaults().compiler_args, "-O3");
        assert!(temp.path().join("groups").is_dir());
    }
}
