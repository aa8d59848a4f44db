//! Compilation pipeline for cudacell groups.
//!
//! This module provides:
//! - Toolchain lookup (`PATH` plus the usual CUDA install roots)
//! - The `nvcc` invoker that builds one group together with `shared`
//!
//! # Architecture
//!
//! ```text
//! <workdir>/shared/*.cu ──┐
//!                         ├──► NvccCompiler ──► nvcc -I... <flags> <sources> -o <group>/cuda_exec.out
//! <workdir>/<group>/*.cu ─┘
//! ```

mod nvcc;
mod toolchain;
mod types;

pub use nvcc::NvccCompiler;
pub use toolchain::{CUDA_SEARCH_PATHS, ExecutableLocator, is_executable};
pub use types::{CompileOptions, DEFAULT_EXEC_NAME, NO_DEPRECATED_TARGETS_FLAG};
