//! Magic command table.
//!
//! Maps magic names to handlers. Cell magics take a body, line magics do not.

use std::collections::BTreeMap;

use uuid::Uuid;

use crate::config::Defaults;
use crate::error::Result;

use super::args::{CudaArgs, GroupDeleteArgs, GroupRunArgs, GroupSaveArgs, SetDefaultsArgs, read_args};
use super::session::Session;

/// File name given to the body of a `%%cuda` cell.
pub const SINGLE_FILE_NAME: &str = "single_file.cu";

/// Handler of one magic: `(session, line, cell body, defaults snapshot)`.
///
/// Returns the text to show, or `None` when the magic prints nothing.
pub type Handler = fn(&mut Session, &str, &str, &Defaults) -> Result<Option<String>>;

/// Whether a magic takes a cell body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `%%name args` followed by a body.
    Cell,
    /// `%name args` on its own.
    Line,
}

/// A registered magic.
#[derive(Clone, Copy)]
pub struct Command {
    pub kind: CommandKind,
    pub handler: Handler,
}

/// Name → magic dispatch table.
#[derive(Clone, Default)]
pub struct CommandTable {
    commands: BTreeMap<&'static str, Command>,
}

impl CommandTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in CUDA magics.
    pub fn builtin() -> Self {
        let mut table = Self::new();
        table.register("cuda", CommandKind::Cell, cuda);
        table.register("cuda_group_save", CommandKind::Cell, cuda_group_save);
        table.register("cuda_group_run", CommandKind::Line, cuda_group_run);
        table.register("cuda_group_delete", CommandKind::Line, cuda_group_delete);
        table.register("cuda_set_defaults", CommandKind::Line, cuda_set_defaults);
        table
    }

    /// Add or replace a magic.
    pub fn register(&mut self, name: &'static str, kind: CommandKind, handler: Handler) {
        self.commands.insert(name, Command { kind, handler });
    }

    /// Look a magic up.
    pub fn get(&self, name: &str) -> Option<Command> {
        self.commands.get(name).copied()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.commands.keys().copied()
    }
}

impl std::fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.commands.iter().map(|(name, c)| (name, c.kind)))
            .finish()
    }
}

/// `%%cuda`: build and run the cell as a one-off group, removed afterwards.
fn cuda(session: &mut Session, line: &str, cell: &str, defaults: &Defaults) -> Result<Option<String>> {
    let Some(args) = read_args::<CudaArgs>("cuda", line) else {
        return Ok(None);
    };

    let group = Uuid::new_v4().to_string();
    session.save_source(&group, SINGLE_FILE_NAME, cell)?;

    let request = args.flags.resolve(defaults);
    let result = session.compile_and_run(&group, &request);
    if let Err(err) = session.delete_group(&group) {
        tracing::warn!("Could not remove one-off group {}: {}", group, err);
    }
    result.map(Some)
}

/// `%%cuda_group_save -n <file> -g <group>`.
fn cuda_group_save(
    session: &mut Session,
    line: &str,
    cell: &str,
    _defaults: &Defaults,
) -> Result<Option<String>> {
    let Some(args) = read_args::<GroupSaveArgs>("cuda_group_save", line) else {
        return Ok(None);
    };

    session.save_source(&args.group, &args.name, cell)?;
    Ok(None)
}

/// `%cuda_group_run -g <group>`.
fn cuda_group_run(
    session: &mut Session,
    line: &str,
    _cell: &str,
    defaults: &Defaults,
) -> Result<Option<String>> {
    let Some(args) = read_args::<GroupRunArgs>("cuda_group_run", line) else {
        return Ok(None);
    };

    let request = args.flags.resolve(defaults);
    session.compile_and_run(&args.group, &request).map(Some)
}

/// `%cuda_group_delete -g <group>`.
fn cuda_group_delete(
    session: &mut Session,
    line: &str,
    _cell: &str,
    _defaults: &Defaults,
) -> Result<Option<String>> {
    let Some(args) = read_args::<GroupDeleteArgs>("cuda_group_delete", line) else {
        return Ok(None);
    };

    session.delete_group(&args.group)?;
    Ok(None)
}

/// `%cuda_set_defaults [-l <profiler>] [-c <args>] [-a <args>]`.
fn cuda_set_defaults(
    session: &mut Session,
    line: &str,
    _cell: &str,
    _defaults: &Defaults,
) -> Result<Option<String>> {
    let Some(args) = read_args::<SetDefaultsArgs>("cuda_set_defaults", line) else {
        return Ok(None);
    };

    session
        .defaults_mut()
        .update(args.profiler, args.compiler_args, args.profiler_args);
    tracing::debug!("Session defaults now {:?}", session.defaults());
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names() {
        let table = CommandTable::builtin();
        assert_eq!(
            table.names().collect::<Vec<_>>(),
            vec![
                "cuda",
                "cuda_group_delete",
                "cuda_group_run",
                "cuda_group_save",
                "cuda_set_defaults"
            ]
        );
    }

    #[test]
    fn test_kinds() {
        let table = CommandTable::builtin();
        assert_eq!(table.get("cuda").unwrap().kind, CommandKind::Cell);
        assert_eq!(table.get("cuda_group_save").unwrap().kind, CommandKind::Cell);
        assert_eq!(table.get("cuda_group_run").unwrap().kind, CommandKind::Line);
        assert!(table.get("timeit").is_none());
    }

    #[test]
    fn test_register_replaces() {
        fn noop(_: &mut Session, _: &str, _: &str, _: &Defaults) -> Result<Option<String>> {
            Ok(Some("noop".to_string()))
        }

        let mut table = CommandTable::builtin();
        table.register("cuda", CommandKind::Line, noop);
        assert_eq!(table.get("cuda").unwrap().kind, CommandKind::Line);
        assert_eq!(table.names().count(), 5);
    }

    #[test]
    fn test_set_defaults_magic() {
        let mut session = Session::temporary().unwrap();
        let out = session
            .invoke("cuda_set_defaults", r#"-l nsys -a "--stats=true --trace=cuda""#, None)
            .unwrap();
        assert!(out.is_none());
        assert_eq!(session.defaults().profiler, crate::execute::Profiler::Nsys);
        assert_eq!(session.defaults().profiler_args, "--stats=true --trace=cuda");
        assert_eq!(session.defaults().compiler_args, "");
    }

    #[test]
    fn test_bad_flags_have_no_side_effects() {
        let mut session = Session::temporary().unwrap();
        let out = session
            .invoke("cuda_group_save", "-n main.cu", Some("int main() {}\n"))
            .unwrap();
        assert!(out.is_none());
        assert!(session.store().groups().unwrap().is_empty());
    }
}
