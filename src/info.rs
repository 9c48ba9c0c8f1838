use std::path::PathBuf;

use serde::Serialize;

use crate::config::{self, CONFIG_FILE};
use crate::ranges::DatasetIndex;
use crate::urls::{dataset_browse_url, document_url};

/// Output the eftalink reference document.
pub fn run(json: bool) {
    let root = PathBuf::from(".");
    let state = gather_state(&root);

    if json {
        print_json(&state);
    } else {
        print_markdown(&state);
    }
}

// ── State gathering ───────────────────────────────────────────────────

struct CurrentState {
    config_error: Option<String>,
    config_found: bool,
    exclude: Vec<String>,
    include: Vec<String>,
    sources: Option<String>,
}

fn gather_state(root: &std::path::Path) -> CurrentState {
    let config_found = root.join(CONFIG_FILE).exists();

    match config::Config::load(root) {
        Ok(c) => {
            let (include, exclude) = c.filters();
            CurrentState {
                config_error: None,
                config_found,
                exclude: exclude.to_vec(),
                include: include.to_vec(),
                sources: c.sources.map(|p| p.display().to_string()),
            }
        },
        Err(e) => CurrentState {
            config_error: Some(e.to_string()),
            config_found,
            exclude: Vec::new(),
            include: Vec::new(),
            sources: None,
        },
    }
}

// ── Markdown output ───────────────────────────────────────────────────

fn print_markdown(state: &CurrentState) {
    let version = env!("CARGO_PKG_VERSION");
    print_markdown_header(version);
    print_markdown_ranges();
    print_markdown_workflow();
    print_markdown_state(state);
    println!();
    print_markdown_exit_codes();
}

fn print_markdown_header(version: &str) {
    let pdf = document_url(Some(27_019), Some(8)).unwrap_or_default();
    let browse = dataset_browse_url(9);
    print!(
        "\
# eftalink {version}

Hyperlink EFTA document IDs and DOJ dataset references in markdown narratives.
Every link opens in a new tab.

## Link Shapes

    EFTA00027019   -> <a href=\"{pdf}\" target=\"_blank\">EFTA00027019</a>
    Dataset 9      -> <a href=\"{browse}\" target=\"_blank\">Dataset 9</a>
    Datasets 8, 9  -> each number linked, surrounding words kept
    [t](https://…) -> <a href=\"https://…\" target=\"_blank\">t</a>

Already-linked text, inline code, and fenced code blocks are left alone,
so every command can be re-run safely.

"
    );
}

fn print_markdown_ranges() {
    println!("## Dataset Ranges\n");
    println!("| DS | First serial | Last serial |");
    println!("|----|--------------|-------------|");
    for i in DatasetIndex::doj().intervals() {
        println!("| {:<2} | EFTA{:08} | EFTA{:08} |", i.dataset_id, i.start, i.end);
    }
    println!("\nSerials between ranges belong to no dataset and stay unlinked.\n");
}

fn print_markdown_workflow() {
    print!(
        "\
## Workflow

    eftalink convert --dir narratives -r            [text](https://…) -> new-tab anchors
    eftalink linkify --dir narratives -r            EFTA IDs and dataset refs -> links
    eftalink inject-sources --dir narratives        add 📄 EFTA Source Documents tables
    eftalink append-appendices --narratives-dir narratives --appendices appendices.md
    eftalink report --ledger master_wire_ledger.json --output forensic_workbook.xlsx

Every rewriting command accepts --dry-run. `report` reads a JSON array of wires
(amount, entity_from, entity_to, optional date, source, exhibit) and writes an
11-tab workbook.

## Configuration ({CONFIG_FILE})

    include = [\"2024/\"]               # only scan these paths, relative to --dir
    exclude = [\"archive/\"]            # skip these paths
    sources = \"data/sources.toml\"     # replace the built-in source tables

## Current State

"
    );
}

fn print_markdown_state(state: &CurrentState) {
    match (&state.config_error, state.config_found) {
        (Some(e), _) => println!("Config:  {CONFIG_FILE} (invalid: {e})"),
        (None, true) => println!("Config:  {CONFIG_FILE} (found)"),
        (None, false) => println!("Config:  {CONFIG_FILE} (not found)"),
    }

    if state.include.is_empty() {
        println!("Include: (everything)");
    } else {
        println!("Include: {}", state.include.join(", "));
    }

    if state.exclude.is_empty() {
        println!("Exclude: (none)");
    } else {
        println!("Exclude: {}", state.exclude.join(", "));
    }

    match &state.sources {
        Some(path) => println!("Sources: {path}"),
        None => println!("Sources: (built-in)"),
    }
}

fn print_markdown_exit_codes() {
    print!(
        "\
## Exit Codes

| Code | Meaning |
|------|---------|
| 0    | Success |
| 1    | Runtime error (I/O, invalid config or source table) |
| 2    | Usage error |
"
    );
}

// ── JSON output ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct InfoJson {
    version: String,
    datasets: Vec<DatasetJson>,
    exit_codes: Vec<ExitCodeInfo>,
    current_state: StateJson,
}

#[derive(Serialize)]
struct DatasetJson {
    browse_url: String,
    dataset: u8,
    end: u32,
    start: u32,
}

#[derive(Serialize)]
struct ExitCodeInfo {
    code: u8,
    meaning: String,
}

#[derive(Serialize)]
struct StateJson {
    config_error: Option<String>,
    config_found: bool,
    exclude: Vec<String>,
    include: Vec<String>,
    sources: Option<String>,
}

fn print_json(state: &CurrentState) {
    let info = InfoJson {
        version: env!("CARGO_PKG_VERSION").to_string(),
        datasets: DatasetIndex::doj()
            .intervals()
            .iter()
            .map(|i| DatasetJson {
                browse_url: dataset_browse_url(i.dataset_id),
                dataset: i.dataset_id,
                end: i.end,
                start: i.start,
            })
            .collect(),
        exit_codes: vec![
            ExitCodeInfo { code: 0, meaning: "Success".to_string() },
            ExitCodeInfo { code: 1, meaning: "Runtime error".to_string() },
            ExitCodeInfo { code: 2, meaning: "Usage error".to_string() },
        ],
        current_state: StateJson {
            config_error: state.config_error.clone(),
            config_found: state.config_found,
            exclude: state.exclude.clone(),
            include: state.include.clone(),
            sources: state.sources.clone(),
        },
    };

    // serde_json::to_string_pretty won't fail on this structure.
    let json = serde_json::to_string_pretty(&info).unwrap_or_default();
    println!("{json}");
}
