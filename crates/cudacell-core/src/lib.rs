//! Core engine for cudacell.
//!
//! This crate provides:
//! - A source store that keeps CUDA C++ files in named groups
//! - An `nvcc` invoker that builds a group together with the shared group
//! - A runner for the resulting binaries (plain, profiled or timed)
//! - A command-line reader and a magic command table that tie it together

pub mod compile;
pub mod config;
pub mod error;
pub mod execute;
pub mod magic;
pub mod paths;
pub mod store;

pub use compile::{CompileOptions, ExecutableLocator, NvccCompiler};
pub use config::{Config, Defaults};
pub use error::{Error, Result};
pub use execute::{Profiler, ProfilerCache, RunOptions, Runner};
pub use magic::{CommandKind, CommandTable, Session};
pub use paths::WorkDir;
pub use store::{SHARED_GROUP, SourceStore};
