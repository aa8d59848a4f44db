//! Execution of compiled groups.
//!
//! This module provides:
//! - `run_captured` - blocking subprocess with combined stdout/stderr
//! - `Runner` - plain, profiled (`ncu`/`nsys`) or timed runs
//! - `ProfilerCache` - profiler paths memoized for a session
//! - `timeit` - the repeated-execution timing harness

mod process;
mod profiler;
mod runner;
pub mod timeit;

pub use process::run_captured;
pub use profiler::{Profiler, ProfilerCache};
pub use runner::{RunOptions, Runner};
pub use timeit::{TimeitOptions, TimeitResult};
