//! Run command implementation for cudacell CLI.
//!
//! Executes a cell script top to bottom in one session.

use std::fs;
use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use cudacell_core::Session;
use cudacell_core::magic::parse_script;

use crate::colors;
use crate::magic::print_output;

/// Execute a cell script.
pub fn execute(session: &mut Session, script_path: &Path) -> anyhow::Result<()> {
    let start = Instant::now();

    let text = fs::read_to_string(script_path)
        .with_context(|| format!("Failed to read {}", script_path.display()))?;
    let entries = parse_script(&text)?;

    // Handle empty scripts
    if entries.is_empty() {
        eprintln!(
            "{}No magics found in {}.{}",
            colors::YELLOW,
            script_path.display(),
            colors::RESET
        );
        eprintln!("Cells start with a %%cuda or %%cuda_group_save line");
        return Ok(());
    }

    for entry in &entries {
        tracing::debug!("{}:{}: %{} {}", script_path.display(), entry.line_no, entry.name, entry.line);

        let output = session
            .invoke(&entry.name, &entry.line, entry.cell.as_deref())
            .map_err(|e| {
                anyhow::anyhow!(
                    "{}:{}: %{}: {}",
                    script_path.display(),
                    entry.line_no,
                    entry.name,
                    e.with_hint()
                )
            })?;

        if let Some(output) = output {
            print_output(&output);
        }
    }

    eprintln!(
        "{}Completed{} {} magics in {:.2}s",
        colors::GREEN,
        colors::RESET,
        entries.len(),
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
