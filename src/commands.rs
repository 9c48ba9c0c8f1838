//! Core CLI commands for eftalink: convert, linkify, inject-sources, append-appendices, report.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::appendix::{self, AppendOutcome, AppendSummary};
use crate::config::Config;
use crate::convert::convert_external_links;
use crate::driver::{self, RunSummary};
use crate::error;
use crate::ledger::{self, Ledger};
use crate::linkify::linkify_all;
use crate::ranges::DatasetIndex;
use crate::scanner::{self, Target};
use crate::sources::{self, InjectStatus, SourceTable};
use crate::workbook::{self, WorkbookTables};

/// Append each narrative's section from a combined appendices file.
///
/// # Errors
///
/// Returns `Error::FileNotFound` if the appendices file is missing,
/// `Error::AppendicesEmpty` if it has no sections, or I/O errors from
/// listing or rewriting narratives.
pub fn append_appendices(
    narratives_dir: &Path,
    appendices: &Path,
    force: bool,
    dry_run: bool,
) -> Result<(), error::Error> {
    if !appendices.is_file() {
        return Err(error::Error::FileNotFound { path: appendices.to_path_buf() });
    }
    let content = std::fs::read_to_string(appendices)?;
    let sections = appendix::parse_appendices(&content);
    if sections.is_empty() {
        return Err(error::Error::AppendicesEmpty { path: appendices.to_path_buf() });
    }

    let files = appendix::find_narrative_files(narratives_dir)?;
    println!("Parsed {} appendix sections, found {} narrative files", sections.len(), files.len());

    let keys: BTreeSet<u32> = sections.keys().chain(files.keys()).copied().collect();
    let mut summary = AppendSummary::default();
    for key in keys {
        let outcome = appendix::apply(
            sections.get(&key).map(String::as_str),
            files.get(&key).map(PathBuf::as_path),
            force,
            dry_run,
        )?;
        print_append_line(key, &outcome, dry_run);
        summary.record(key, &outcome);
    }

    println!();
    let verb = tense(dry_run, "Appended", "Would append");
    println!("{verb}: {}", join_keys(&summary.appended));
    println!("Already had appendix: {}", join_keys(&summary.already_present));
    if !summary.no_file.is_empty() {
        println!("No narrative file: {}", join_keys(&summary.no_file));
    }
    if !summary.no_appendix.is_empty() {
        println!("No appendix section: {}", join_keys(&summary.no_appendix));
    }

    return Ok(());
}

/// Rewrite `[text](https://…)` links as new-tab anchors.
///
/// # Errors
///
/// Returns errors from config loading, target collection, or file rewriting.
pub fn convert(target: &Target, dry_run: bool) -> Result<(), error::Error> {
    let config = Config::load(Path::new("."))?;
    let files = scanner::collect(target, &config, scanner::any_name)?;

    let mut summary = RunSummary::default();
    for path in &files {
        let report = driver::process_file(path, dry_run, convert_external_links)?;
        if report.outcome.count > 0 {
            let verb = tense(dry_run, "Converted", "Would convert");
            println!("{verb} {} links in {}", report.outcome.count, report.name());
        }
        summary.record(&report);
    }

    print_totals(&summary, tense(dry_run, "Converted", "Would convert"), "links");
    return Ok(());
}

/// Inject the `📄 EFTA Source Documents` table into each narrative.
///
/// # Errors
///
/// Returns errors from config or source-table loading, target collection,
/// or file rewriting.
pub fn inject_sources(target: &Target, dry_run: bool) -> Result<(), error::Error> {
    let config = Config::load(Path::new("."))?;
    let table = match &config.sources {
        Some(path) => SourceTable::load(path)?,
        None => SourceTable::builtin()?,
    };
    let files = scanner::collect(target, &config, sources::is_narrative_name)?;
    let index = DatasetIndex::doj();

    let mut injected = 0_usize;
    for path in &files {
        let name = driver::display_name(path);
        match sources::inject_file(path, &table, &index, dry_run)? {
            InjectStatus::AlreadyPresent => println!("Already present: {name}"),
            InjectStatus::Injected => {
                injected = injected.saturating_add(1);
                let verb = tense(dry_run, "Injected", "Would inject");
                println!("{verb} source table: {name}");
            },
            InjectStatus::NoTable => println!("No source table: {name}"),
        }
    }

    println!();
    let verb = tense(dry_run, "Injected", "Would inject");
    println!("{verb} {injected} of {} files ({} tables available)", files.len(), table.len());
    return Ok(());
}

/// Join narrative keys as `N1, N2`, or `none`.
fn join_keys(keys: &[u32]) -> String {
    if keys.is_empty() {
        return "none".to_string();
    }
    return keys.iter().map(|k| return format!("N{k}")).collect::<Vec<_>>().join(", ");
}

/// Link bare EFTA document IDs and dataset references.
///
/// # Errors
///
/// Returns errors from config loading, target collection, or file rewriting.
pub fn linkify(target: &Target, dry_run: bool) -> Result<(), error::Error> {
    let config = Config::load(Path::new("."))?;
    let files = scanner::collect(target, &config, scanner::any_name)?;
    let index = DatasetIndex::doj();

    let mut summary = RunSummary::default();
    let mut documents = 0_usize;
    let mut datasets = 0_usize;
    for path in &files {
        let report = driver::process_file(path, dry_run, |text| return linkify_all(text, &index))?;
        let outcome = &report.outcome;
        if outcome.total() > 0 {
            let verb = tense(dry_run, "Linked", "Would link");
            println!(
                "{verb} {} document IDs, {} dataset refs in {}",
                outcome.document_links,
                outcome.dataset_links,
                report.name()
            );
        }
        documents = documents.saturating_add(outcome.document_links);
        datasets = datasets.saturating_add(outcome.dataset_links);
        summary.record(&report);
    }

    print_totals(&summary, tense(dry_run, "Linked", "Would link"), "references");
    if summary.replacements > 0 {
        println!("  document IDs: {documents}, dataset refs: {datasets}");
    }
    return Ok(());
}

/// One report line for a narrative key.
fn print_append_line(key: u32, outcome: &AppendOutcome, dry_run: bool) {
    match outcome {
        AppendOutcome::AlreadyPresent(path) => {
            println!("N{key}: already has appendix ({})", driver::display_name(path));
        },
        AppendOutcome::Appended(path) => {
            let verb = tense(dry_run, "appended to", "would append to");
            println!("N{key}: {verb} {}", driver::display_name(path));
        },
        AppendOutcome::NoAppendix(path) => {
            println!("N{key}: no appendix section for {}", driver::display_name(path));
        },
        AppendOutcome::NoFile => println!("N{key}: no narrative file"),
    }
    return;
}

/// Final summary line for a rewrite run.
fn print_totals(summary: &RunSummary, verb: &str, noun: &str) {
    println!();
    if summary.replacements == 0 {
        println!("Nothing to change in {} files", summary.files_scanned);
        return;
    }
    println!(
        "{verb} {} {noun} across {} of {} files",
        summary.replacements, summary.files_changed, summary.files_scanned
    );
    return;
}

/// Build the forensic workbook from a JSON wire ledger.
///
/// # Errors
///
/// Returns `Error::FileNotFound`, `Error::Json` or `Error::LedgerEmpty` for a
/// bad ledger, and `Error::Xlsx` or I/O errors if the workbook cannot be written.
pub fn report(ledger_path: &Path, output: &Path) -> Result<(), error::Error> {
    let tables = WorkbookTables::builtin()?;
    let ledger = Ledger::load(ledger_path)?;
    println!(
        "Loaded {} wires from {} ({})",
        ledger.wires.len(),
        driver::display_name(ledger_path),
        ledger::format_usd(ledger.total())
    );
    let kinds: Vec<String> = ledger
        .kind_counts(&tables.classification)
        .into_iter()
        .map(|(kind, count)| return format!("{kind} {count}"))
        .collect();
    println!("Entity types: {}", kinds.join(", "));

    workbook::write_workbook(&ledger, &tables, output)?;
    println!("Wrote {} tabs to {}", workbook::TAB_COUNT, output.display());
    return Ok(());
}

/// Pick report wording for live runs vs dry runs.
const fn tense<'a>(dry_run: bool, done: &'a str, would: &'a str) -> &'a str {
    if dry_run {
        return would;
    }
    return done;
}
