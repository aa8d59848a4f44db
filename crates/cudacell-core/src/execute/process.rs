//! Running external programs with captured output.

use std::io::{self, Read};
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Run `command` to completion and return its combined stdout and stderr.
///
/// Both streams share one pipe so their lines keep the order in which the
/// program wrote them. Blocks until the process exits; there is no timeout.
///
/// # Errors
/// - [`Error::ToolNotFound`] if the program does not exist
/// - [`Error::ProcessFailed`] with the captured output on a non-zero exit
pub fn run_captured(mut command: Command) -> Result<String> {
    let program = command.get_program().to_string_lossy().into_owned();

    let (mut reader, writer) = io::pipe()?;
    command
        .stdin(Stdio::null())
        .stdout(writer.try_clone()?)
        .stderr(writer);

    let mut child = command.spawn().map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => Error::ToolNotFound {
            tool: program.clone(),
        },
        _ => Error::Io(e),
    })?;

    // The command still holds the write ends; the read below only sees EOF
    // once every writer is closed.
    drop(command);

    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let status = child.wait()?;

    let output = String::from_utf8_lossy(&bytes).into_owned();
    if status.success() {
        Ok(output)
    } else {
        tracing::debug!("{} failed with {}", program, status);
        Err(Error::ProcessFailed {
            program,
            code: status.code(),
            output,
        })
    }
}
