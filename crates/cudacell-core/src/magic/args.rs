//! Magic command-line reader and argument schemas.
//!
//! A magic line is tokenized with double quotes grouping words, so flag-like
//! values survive intact:
//!
//! ```text
//! --profile --profiler-args "--metrics l1tex__t_sectors_pipe_lsu_mem_global_op_ld.sum"
//! ```
//!
//! The tokens are then parsed against a clap schema.

use clap::{Args, CommandFactory, Parser};

use crate::compile::CompileOptions;
use crate::config::Defaults;
use crate::execute::{Profiler, RunOptions};

/// Split a magic line into tokens.
///
/// Text between double quotes is one token, verbatim. Text outside quotes is
/// split on whitespace. Empty tokens are dropped.
pub fn tokenize(line: &str) -> Vec<String> {
    line.trim()
        .split('"')
        .enumerate()
        .flat_map(|(index, span)| {
            if index % 2 == 0 {
                span.split_whitespace().map(str::to_string).collect::<Vec<_>>()
            } else {
                vec![span.to_string()]
            }
        })
        .filter(|token| !token.is_empty())
        .collect()
}

/// Parse a magic line against the schema `T`.
///
/// On a parse failure (including `--help`) the error and the schema's help
/// text are printed and `None` is returned; the caller should skip the
/// magic's action.
pub fn read_args<T: Parser>(command_name: &str, line: &str) -> Option<T> {
    let argv = std::iter::once(command_name.to_string()).chain(tokenize(line));
    match T::try_parse_from(argv) {
        Ok(args) => Some(args),
        Err(err) => {
            use clap::error::ErrorKind;

            tracing::debug!("Could not parse {:?} for {}: {}", line, command_name, err.kind());
            let _ = err.print();
            if !matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                println!("{}", help_text::<T>(command_name));
            }
            None
        }
    }
}

/// Rendered help of the schema `T`.
pub fn help_text<T: CommandFactory>(command_name: &str) -> String {
    let mut command = T::command().bin_name(command_name.to_string());
    command.render_help().to_string()
}

/// Flags shared by the magics that compile and run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Args)]
pub struct RunFlags {
    /// Print timing statistics of repeated runs instead of the program output
    #[arg(short, long)]
    pub timeit: bool,

    /// Run the program under a profiler (no effect with --timeit)
    #[arg(short, long)]
    pub profile: bool,

    /// Profiler to use [default: session default]
    #[arg(short = 'l', long, value_enum)]
    pub profiler: Option<Profiler>,

    /// Extra profiler options; quote them to pass several
    #[arg(short = 'a', long, allow_hyphen_values = true)]
    pub profiler_args: Option<String>,

    /// Extra nvcc options; quote them to pass several
    #[arg(short = 'c', long, allow_hyphen_values = true)]
    pub compiler_args: Option<String>,
}

/// Fully resolved build-and-run request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunRequest {
    pub compile: CompileOptions,
    pub run: RunOptions,
}

impl RunFlags {
    /// Fill omitted flags from the defaults snapshot.
    pub fn resolve(&self, defaults: &Defaults) -> RunRequest {
        RunRequest {
            compile: CompileOptions::with_compiler_args(
                self.compiler_args
                    .clone()
                    .unwrap_or_else(|| defaults.compiler_args.clone()),
            ),
            run: RunOptions {
                timeit: self.timeit,
                profile: self.profile,
                profiler: self.profiler.unwrap_or(defaults.profiler),
                profiler_args: self
                    .profiler_args
                    .clone()
                    .unwrap_or_else(|| defaults.profiler_args.clone()),
            },
        }
    }
}

/// Compile and run the CUDA C++ code in this cell.
#[derive(Debug, Clone, Parser)]
#[command(name = "cuda")]
pub struct CudaArgs {
    #[command(flatten)]
    pub flags: RunFlags,
}

/// Compile and run all source files in a group, together with the shared group.
#[derive(Debug, Clone, Parser)]
#[command(name = "cuda_group_run")]
pub struct GroupRunArgs {
    /// Group to compile
    #[arg(short, long)]
    pub group: String,

    #[command(flatten)]
    pub flags: RunFlags,
}

/// Save the CUDA C++ code in this cell to a group for a later cuda_group_run.
#[derive(Debug, Clone, Parser)]
#[command(name = "cuda_group_save")]
pub struct GroupSaveArgs {
    /// File name, ending in .cu or .h
    #[arg(short, long)]
    pub name: String,

    /// Group to save into; "shared" is part of every build
    #[arg(short, long)]
    pub group: String,
}

/// Delete a group and all of its files.
#[derive(Debug, Clone, Parser)]
#[command(name = "cuda_group_delete")]
pub struct GroupDeleteArgs {
    /// Group to delete
    #[arg(short, long)]
    pub group: String,
}

/// Change the defaults used when a magic omits a flag.
#[derive(Debug, Clone, Parser)]
#[command(name = "cuda_set_defaults")]
pub struct SetDefaultsArgs {
    /// Default profiler
    #[arg(short = 'l', long, value_enum)]
    pub profiler: Option<Profiler>,

    /// Default nvcc options
    #[arg(short = 'c', long, allow_hyphen_values = true)]
    pub compiler_args: Option<String>,

    /// Default profiler options
    #[arg(short = 'a', long, allow_hyphen_values = true)]
    pub profiler_args: Option<String>,
}
