//! Which command implementation for cudacell CLI.

use cudacell_core::{Config, Error, ExecutableLocator};

use crate::colors;

/// Print where `tool` would be found.
pub fn execute(config: &Config, tool: &str) -> anyhow::Result<()> {
    let locator = ExecutableLocator::new(config.search_paths.iter().cloned());

    match locator.find(tool) {
        Some(path) => {
            println!("{}", path.display());
            Ok(())
        }
        None => {
            eprintln!(
                "{}Searched PATH and:{} {}",
                colors::BOLD,
                colors::RESET,
                locator
                    .search_dirs()
                    .iter()
                    .map(|d| d.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            Err(Error::ToolNotFound {
                tool: tool.to_string(),
            }
            .into())
        }
    }
}
