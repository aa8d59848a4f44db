//! CUDA magics.
//!
//! This module provides:
//! - `args` - magic line tokenizer and flag schemas
//! - `CommandTable` - name → handler dispatch
//! - `Session` - work directory, toolchain and defaults of one session
//! - `parse_script` - reads a file of `%%cell` and `%line` magics

pub mod args;
mod commands;
mod script;
mod session;

pub use args::{RunRequest, read_args, tokenize};
pub use commands::{Command, CommandKind, CommandTable, Handler, SINGLE_FILE_NAME};
pub use script::{ScriptEntry, parse_script};
pub use session::Session;
