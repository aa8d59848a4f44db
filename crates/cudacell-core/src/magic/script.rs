//! Magic scripts: a plain-text stand-in for a sequence of notebook cells.
//!
//! ```text
//! %%cuda_group_save -g shared -n util.h
//! #define N 16
//!
//! %%cuda_group_save -g g1 -n main.cu
//! #include "util.h"
//! int main() { return 0; }
//!
//! %cuda_group_run -g g1 --timeit
//! ```
//!
//! `%%name args` opens a cell whose body runs until the next magic line.
//! `%name args` is a single line magic. Blank lines outside a cell are
//! skipped; any other text there is an error.

use crate::error::{Error, Result};

/// One magic invocation read from a script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    /// 1-based line of the magic.
    pub line_no: usize,
    pub name: String,
    /// Argument line following the name.
    pub line: String,
    /// Cell body for `%%` magics.
    pub cell: Option<String>,
}

/// Split a script into magic invocations.
///
/// # Errors
/// Returns [`Error::Script`] for text outside a cell that is not a magic.
pub fn parse_script(text: &str) -> Result<Vec<ScriptEntry>> {
    let mut entries = Vec::new();
    let mut open: Option<(ScriptEntry, Vec<&str>)> = None;

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;

        if let Some((is_cell, name, args)) = parse_magic_line(raw) {
            if let Some((entry, body)) = open.take() {
                entries.push(close_cell(entry, &body));
            }
            let entry = ScriptEntry {
                line_no,
                name: name.to_string(),
                line: args.to_string(),
                cell: None,
            };
            if is_cell {
                open = Some((entry, Vec::new()));
            } else {
                entries.push(entry);
            }
            continue;
        }

        match open.as_mut() {
            Some((_, body)) => body.push(raw),
            None if raw.trim().is_empty() => {}
            None => {
                return Err(Error::Script {
                    line: line_no,
                    message: format!("expected a %magic or %%magic line, found {:?}", raw.trim()),
                });
            }
        }
    }

    if let Some((entry, body)) = open.take() {
        entries.push(close_cell(entry, &body));
    }
    Ok(entries)
}

/// `Some((is_cell, name, args))` if `raw` is a magic line.
fn parse_magic_line(raw: &str) -> Option<(bool, &str, &str)> {
    let (is_cell, rest) = match raw.strip_prefix("%%") {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('%')?),
    };

    if !rest.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return None;
    }

    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let (name, args) = rest.split_at(end);
    Some((is_cell, name, args.trim()))
}

fn close_cell(mut entry: ScriptEntry, body: &[&str]) -> ScriptEntry {
    let len = body
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(0, |last| last + 1);

    let mut cell = body[..len].join("\n");
    cell.push('\n');
    entry.cell = Some(cell);
    entry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cells_and_lines() {
        let script = "\
%%cuda_group_save -g g1 -n main.cu
#include <cstdio>
int main() { printf(\"hi\\n\"); }


%cuda_group_run -g g1
%cuda_group_delete -g g1
";
        let entries = parse_script(script).unwrap();
        assert_eq!(entries.len(), 3);

        assert_eq!(entries[0].name, "cuda_group_save");
        assert_eq!(entries[0].line, "-g g1 -n main.cu");
        assert_eq!(
            entries[0].cell.as_deref(),
            Some("#include <cstdio>\nint main() { printf(\"hi\\n\"); }\n")
        );

        assert_eq!(entries[1].name, "cuda_group_run");
        assert_eq!(entries[1].line_no, 6);
        assert!(entries[1].cell.is_none());

        assert_eq!(entries[2].line, "-g g1");
    }

    #[test]
    fn test_cell_keeps_inner_blank_lines() {
        let entries = parse_script("%%cuda\nint a;\n\nint b;\n").unwrap();
        assert_eq!(entries[0].cell.as_deref(), Some("int a;\n\nint b;\n"));
        assert_eq!(entries[0].line, "");
    }

    #[test]
    fn test_empty_cell() {
        let entries = parse_script("%%cuda -t\n%cuda_set_defaults -l nsys").unwrap();
        assert_eq!(entries[0].cell.as_deref(), Some("\n"));
        assert_eq!(entries[1].line, "-l nsys");
    }

    #[test]
    fn test_modulo_is_not_a_magic() {
        let entries = parse_script("%%cuda\nint r = a %b;\n% 2\n").unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].cell.as_deref(), Some("int r = a %b;\n% 2\n"));
    }

    #[test]
    fn test_text_outside_cell() {
        let err = parse_script("\n\nint main() {}\n").unwrap_err();
        assert!(matches!(err, Error::Script { line: 3, .. }));
    }

    #[test]
    fn test_empty_script() {
        assert!(parse_script("").unwrap().is_empty());
        assert!(parse_script("\n   \n").unwrap().is_empty());
    }
}
