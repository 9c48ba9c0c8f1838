use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const DS8_PDF_LINK: &str = "<a href=\"https://www.justice.gov/epstein/files/DataSet%208/EFTA00027019.pdf\" target=\"_blank\">EFTA00027019</a>";
const DS8_BROWSE_LINK: &str = "<a href=\"https://www.justice.gov/epstein/doj-disclosures/data-set-8-files\" target=\"_blank\">Dataset 8</a>";

/// Copy a fixture tree into a fresh temp directory so runs never touch the originals.
fn copy_fixture(name: &str) -> TempDir {
    let tmp = tempfile::tempdir().unwrap();
    copy_dir(&Path::new("tests/fixtures").join(name), tmp.path());
    return tmp;
}

fn copy_dir(from: &Path, to: &Path) {
    std::fs::create_dir_all(to).unwrap();
    for entry in std::fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            std::fs::copy(entry.path(), &target).unwrap();
        }
    }
}

fn eftalink(dir: &Path, args: &[&str]) -> Output {
    return Command::new(env!("CARGO_BIN_EXE_eftalink"))
        .current_dir(dir)
        .args(args)
        .output()
        .unwrap();
}

fn read(dir: &Path, file: &str) -> String {
    return std::fs::read_to_string(dir.join(file)).unwrap();
}

fn stdout(output: &Output) -> String {
    return String::from_utf8_lossy(&output.stdout).into_owned();
}

#[test]
fn linkify_dry_run_reports_without_writing() {
    let tmp = copy_fixture("narratives");
    let before = read(tmp.path(), "01_pipeline.md");

    let out = eftalink(tmp.path(), &["linkify", "--dir", ".", "--dry-run"]);
    assert!(out.status.success(), "linkify failed: {}", String::from_utf8_lossy(&out.stderr));

    let report = stdout(&out);
    assert!(report.contains("Would link 1 document IDs, 4 dataset refs in 01_pipeline.md"), "{report}");
    assert!(report.contains("Would link 0 document IDs, 1 dataset refs in 02_art_market.md"), "{report}");
    assert!(report.contains("Would link 6 references across 2 of 3 files"), "{report}");
    assert_eq!(read(tmp.path(), "01_pipeline.md"), before);
}

#[test]
fn linkify_writes_links_and_second_run_changes_nothing() {
    let tmp = copy_fixture("narratives");

    let first = eftalink(tmp.path(), &["linkify", "--dir", "."]);
    assert!(first.status.success(), "linkify failed: {}", String::from_utf8_lossy(&first.stderr));

    let linked = read(tmp.path(), "01_pipeline.md");
    assert!(linked.contains(DS8_PDF_LINK));
    assert!(linked.contains(DS8_BROWSE_LINK));
    assert!(linked.contains(
        "Datasets <a href=\"https://www.justice.gov/epstein/doj-disclosures/data-set-9-files\" target=\"_blank\">9</a>, "
    ));
    assert!(linked.contains("EFTA00039025 stays raw inside a fence"));
    assert!(!linked.contains("EFTA00039025.pdf"));

    let second = eftalink(tmp.path(), &["linkify", "--dir", "."]);
    assert!(second.status.success());
    assert!(stdout(&second).contains("Nothing to change in 3 files"));
    assert_eq!(read(tmp.path(), "01_pipeline.md"), linked);
}

#[test]
fn linkify_only_descends_with_recursive_flag() {
    let tmp = copy_fixture("narratives");
    let draft = read(tmp.path(), "archive/03_old.md");

    let flat = eftalink(tmp.path(), &["linkify", "--dir", "."]);
    assert!(flat.status.success());
    assert_eq!(read(tmp.path(), "archive/03_old.md"), draft);

    let deep = eftalink(tmp.path(), &["linkify", "--dir", ".", "-r"]);
    assert!(deep.status.success());
    assert!(read(tmp.path(), "archive/03_old.md").contains("data-set-3-files"));
}

#[test]
fn convert_rewrites_external_links_but_not_images() {
    let tmp = copy_fixture("narratives");

    let out = eftalink(tmp.path(), &["convert", "--file", "01_pipeline.md"]);
    assert!(out.status.success(), "convert failed: {}", String::from_utf8_lossy(&out.stderr));
    assert!(stdout(&out).contains("Converted 1 links in 01_pipeline.md"));

    let converted = read(tmp.path(), "01_pipeline.md");
    assert!(converted.contains(
        "- <a href=\"https://www.justice.gov/usao-sdny\" target=\"_blank\">SDNY filing</a>"
    ));
    assert!(converted.contains("- ![chart](https://example.com/chart.png)"));
}

#[test]
fn inject_sources_places_each_table_once() {
    let tmp = copy_fixture("narratives");

    let out = eftalink(tmp.path(), &["inject-sources", "--dir", "."]);
    assert!(out.status.success(), "inject failed: {}", String::from_utf8_lossy(&out.stderr));
    let report = stdout(&out);
    assert!(report.contains("Injected source table: 01_pipeline.md"), "{report}");
    assert!(!report.contains("README.md"), "{report}");

    let first = read(tmp.path(), "01_pipeline.md");
    let table = first.find("### 📄 EFTA Source Documents").unwrap();
    assert!(table < first.find("### How to Verify").unwrap());
    assert!(first.contains(DS8_PDF_LINK));

    let second = read(tmp.path(), "02_art_market.md");
    let table = second.find("### 📄 EFTA Source Documents").unwrap();
    assert!(table < second.find("### 📊 Verify in Forensic Workbook").unwrap());

    let again = eftalink(tmp.path(), &["inject-sources", "--dir", "."]);
    assert!(again.status.success());
    assert!(stdout(&again).contains("Already present: 01_pipeline.md"));
    assert_eq!(read(tmp.path(), "01_pipeline.md"), first);
}

#[test]
fn append_appendices_reports_every_key() {
    let tmp = copy_fixture("narratives");
    std::fs::copy("tests/fixtures/appendices.md", tmp.path().join("appendices.md")).unwrap();

    let args = ["append-appendices", "--narratives-dir", ".", "--appendices", "appendices.md"];
    let out = eftalink(tmp.path(), &args);
    assert!(out.status.success(), "append failed: {}", String::from_utf8_lossy(&out.stderr));

    let report = stdout(&out);
    assert!(report.contains("Parsed 3 appendix sections"), "{report}");
    assert!(report.contains("N1: appended to 01_pipeline.md"), "{report}");
    assert!(report.contains("N2: already has appendix (02_art_market.md)"), "{report}");
    assert!(report.contains("N5: no narrative file"), "{report}");

    let narrative = read(tmp.path(), "01_pipeline.md");
    assert!(narrative.contains("\n\n---\n\n## Source Documents & Exhibits\n"));
    assert!(narrative.ends_with("| A | EFTA00027019 |\n"));
    assert!(!narrative.contains("Intro paragraph that stays behind"));

    let again = eftalink(tmp.path(), &args);
    assert!(stdout(&again).contains("N1: already has appendix (01_pipeline.md)"));
    assert_eq!(read(tmp.path(), "01_pipeline.md"), narrative);
}

#[test]
fn dir_and_file_together_is_usage_error() {
    let tmp = copy_fixture("narratives");
    let out = eftalink(tmp.path(), &["linkify", "--dir", ".", "--file", "01_pipeline.md"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn missing_file_is_runtime_error() {
    let tmp = copy_fixture("narratives");
    let out = eftalink(tmp.path(), &["linkify", "--file", "nope.md"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("File Not Found"));
}

#[test]
fn malformed_config_is_reported() {
    let tmp = copy_fixture("narratives");
    std::fs::write(tmp.path().join(".eftalink.toml"), "bogus = 1\n").unwrap();

    let out = eftalink(tmp.path(), &["linkify", "--dir", "."]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Invalid TOML"));
}

#[test]
fn config_exclude_skips_matching_paths() {
    let tmp = copy_fixture("narratives");
    std::fs::write(tmp.path().join(".eftalink.toml"), "exclude = [\"02_\"]\n").unwrap();
    let before = read(tmp.path(), "02_art_market.md");

    let out = eftalink(tmp.path(), &["linkify", "--dir", "."]);
    assert!(out.status.success());
    assert_eq!(read(tmp.path(), "02_art_market.md"), before);
    assert!(read(tmp.path(), "01_pipeline.md").contains(DS8_PDF_LINK));
}

#[test]
fn config_include_matches_paths_under_absolute_dir() {
    let tmp = copy_fixture("narratives");
    std::fs::write(tmp.path().join(".eftalink.toml"), "include = [\"archive/\"]\n").unwrap();
    let before = read(tmp.path(), "01_pipeline.md");
    let dir = tmp.path().to_string_lossy().into_owned();

    let out = eftalink(tmp.path(), &["linkify", "--dir", &dir, "-r"]);
    assert!(out.status.success(), "linkify failed: {}", String::from_utf8_lossy(&out.stderr));
    assert!(read(tmp.path(), "archive/03_old.md").contains("data-set-3-files"));
    assert_eq!(read(tmp.path(), "01_pipeline.md"), before);
}

#[test]
fn info_json_lists_all_datasets() {
    let tmp = copy_fixture("narratives");
    let out = eftalink(tmp.path(), &["info", "--json"]);
    assert!(out.status.success());

    let info: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let datasets = info["datasets"].as_array().unwrap();
    assert_eq!(datasets.len(), 12);
    assert_eq!(datasets[8]["start"], 39_025);
    assert_eq!(info["current_state"]["config_found"], false);
}

#[test]
fn report_writes_workbook_from_ledger() {
    let tmp = copy_fixture("ledger");

    let out = eftalink(tmp.path(), &["report", "--output", "out.xlsx"]);
    assert!(out.status.success(), "report failed: {}", String::from_utf8_lossy(&out.stderr));

    let text = stdout(&out);
    assert!(text.contains("Loaded 5 wires from master_wire_ledger.json ($49,250,000)"), "{text}");
    assert!(text.contains("BANK/CUSTODIAN 1"), "{text}");
    assert!(text.contains("Wrote 11 tabs to out.xlsx"), "{text}");
    let bytes = std::fs::read(tmp.path().join("out.xlsx")).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn report_rejects_empty_ledger() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("empty.json"), "[]").unwrap();

    let out = eftalink(tmp.path(), &["report", "--ledger", "empty.json"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Empty Ledger"));
    assert!(!tmp.path().join("forensic_workbook.xlsx").exists());
}

#[test]
fn report_missing_ledger_is_file_not_found() {
    let tmp = tempfile::tempdir().unwrap();

    let out = eftalink(tmp.path(), &["report", "--ledger", "nope.json"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("File Not Found"));
}
