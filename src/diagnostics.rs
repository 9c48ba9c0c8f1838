use std::path::Path;

use crate::config::CONFIG_FILE;
use crate::error::Error;

const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Render an error as valid markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where there is one,
/// how to fix it.
pub fn render_error(e: &Error) -> String {
    match e {
        Error::AppendicesEmpty { path } => render_appendices_empty(path),
        Error::FileNotFound { path } => render_file_not_found(path),
        Error::Json(err) => render_invalid_ledger(&err.to_string()),
        Error::LedgerEmpty { path } => render_ledger_empty(path),
        Error::NotADirectory { path } => render_not_a_directory(path),
        Error::PersistFailed { path, reason } => render_persist_failed(path, reason),
        Error::SourcesInvalid { reason } => render_sources_invalid(reason),
        Error::TomlDe(err) => render_invalid_toml(&err.to_string()),
        Error::Xlsx(err) => render_workbook_failed(&err.to_string()),
        Error::Io(_) | Error::Walk(_) => render_generic(e),
    }
}

fn render_generic(e: &Error) -> String {
    format!("\
# Error: I/O

{e}
")
}

fn render_appendices_empty(path: &Path) -> String {
    format!("\
# Error: No Appendix Sections

`{}` has no `# N<k> — Title` sections.

## Fix

Separate sections with a `---` rule and start each with its narrative header:

    # N1 — Title

    ## Source Documents & Exhibits
    ...

    ---

    # N2 — Title
", path.display())
}

fn render_file_not_found(path: &Path) -> String {
    format!("\
# Error: File Not Found

`{}` does not exist.
", path.display())
}

fn render_invalid_ledger(detail: &str) -> String {
    format!("\
# Error: Invalid Ledger

{detail}

## Fix

The ledger must be a JSON array of wire objects:

    [{{\"amount\": 10000000, \"entity_from\": \"...\", \"entity_to\": \"...\", \"source\": \"verified_wires\"}}]
")
}

fn render_invalid_toml(detail: &str) -> String {
    format!("\
# Error: Invalid TOML

{detail}

## Fix

Check `{CONFIG_FILE}` and the narrative source table. Run `eftalink info` for the accepted keys.
")
}

fn render_ledger_empty(path: &Path) -> String {
    format!("\
# Error: Empty Ledger

`{}` holds no wires. Nothing to report.
", path.display())
}

fn render_not_a_directory(path: &Path) -> String {
    format!("\
# Error: Not A Directory

`{}` is not a directory.

## Fix

Use `--file` for a single narrative:

    eftalink linkify --file {}
", path.display(), path.display())
}

fn render_persist_failed(path: &Path, reason: &str) -> String {
    format!("\
# Error: Write Failed

Could not replace `{}`: {reason}

The original file was left untouched.
", path.display())
}

fn render_sources_invalid(reason: &str) -> String {
    format!("\
# Error: Source Table Invalid

{reason}

## Fix

Each row's `document` must be one of:

    {{ efta = \"EFTA00027019\" }}
    {{ dataset = 8 }}
    {{ url = \"https://...\", label = \"...\" }}
    {{ text = \"...\" }}
")
}

fn render_workbook_failed(detail: &str) -> String {
    format!("\
# Error: Workbook Write Failed

{detail}
")
}
