//! cudacell CLI - CUDA C++ cells from the shell.

mod colors;
mod groups;
mod locate;
mod magic;
mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cudacell_core::{Config, Session};

#[derive(Parser)]
#[command(name = "cudacell")]
#[command(about = "Compile, run and profile CUDA C++ source groups")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: $CUDACELL_CONFIG, then the user config file)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the source groups
    #[arg(long, global = true, env = "CUDACELL_WORKDIR")]
    workdir: Option<PathBuf>,

    /// nvcc program to compile with
    #[arg(long, global = true)]
    nvcc: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a cell script of %%cell and %line magics
    Run {
        /// Path to the script
        script: PathBuf,
    },

    /// Run a single magic
    Magic {
        /// Magic name, e.g. cuda_group_run
        name: String,

        /// File holding the cell body (default: stdin, for cell magics)
        #[arg(long)]
        cell: Option<PathBuf>,

        /// Magic arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },

    /// List groups, or the files of one group
    Groups {
        /// Group to list
        group: Option<String>,
    },

    /// Locate an executable on PATH or in the CUDA install directories
    Which {
        /// Executable name, e.g. ncu
        tool: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if std::env::var_os("CUDACELL_NO_SETUP").is_some() {
        tracing::debug!("CUDACELL_NO_SETUP is set; no host setup is performed either way");
    }

    // Helper to format cudacell-core errors with recovery hints
    let format_error = |err: anyhow::Error| -> anyhow::Error {
        if let Some(core_err) = err.downcast_ref::<cudacell_core::Error>() {
            anyhow::anyhow!("{}", core_err.with_hint())
        } else {
            err
        }
    };

    let config = load_config(&cli).map_err(format_error)?;
    dispatch(cli.command, config).map_err(format_error)
}

fn dispatch(command: Commands, config: Config) -> anyhow::Result<()> {
    match command {
        Commands::Run { script } => {
            let mut session = Session::from_config(&config)?;
            run::execute(&mut session, &script)
        }

        Commands::Magic { name, cell, line } => {
            let mut session = persistent_session(config)?;
            magic::execute(&mut session, &name, &line, cell.as_deref())
        }

        Commands::Groups { group } => {
            let session = persistent_session(config)?;
            groups::execute(&session, group.as_deref())
        }

        Commands::Which { tool } => locate::execute(&config, &tool),
    }
}

/// Load the config file and apply command-line overrides.
fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(workdir) = &cli.workdir {
        config.workdir = Some(workdir.clone());
    }
    if let Some(nvcc) = &cli.nvcc {
        config.nvcc = nvcc.clone();
    }
    Ok(config)
}

/// A session whose groups outlive the process.
fn persistent_session(mut config: Config) -> anyhow::Result<Session> {
    if config.workdir.is_none() {
        let workdir = Config::default_workdir()
            .ok_or_else(|| anyhow::anyhow!("no cache directory on this system; pass --workdir"))?;
        config.workdir = Some(workdir);
    }
    Ok(Session::from_config(&config)?)
}
