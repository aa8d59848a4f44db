//! Magic command implementation for cudacell CLI.
//!
//! Runs one magic against the persistent work directory, so groups saved by
//! one invocation are visible to the next.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::Context;
use cudacell_core::{CommandKind, Error, Session};

/// Execute a single magic.
pub fn execute(
    session: &mut Session,
    name: &str,
    args: &[String],
    cell_path: Option<&Path>,
) -> anyhow::Result<()> {
    let command = session
        .commands()
        .get(name)
        .ok_or_else(|| Error::UnknownCommand(name.to_string()))?;

    let cell = match (cell_path, command.kind) {
        (Some(path), _) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?,
        ),
        (None, CommandKind::Cell) => {
            let mut body = String::new();
            io::stdin()
                .read_to_string(&mut body)
                .context("Failed to read the cell body from stdin")?;
            Some(body)
        }
        (None, CommandKind::Line) => None,
    };

    let line = join_args(args);
    if let Some(output) = session.invoke(name, &line, cell.as_deref())? {
        print_output(&output);
    }

    Ok(())
}

/// Rebuild a magic line from shell words, quoting words with whitespace.
fn join_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| {
            if arg.contains(char::is_whitespace) {
                format!("\"{}\"", arg)
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Print magic output line by line.
pub fn print_output(output: &str) {
    for line in output.lines() {
        println!("{}", line);
    }
}
