//! Per-narrative "EFTA Source Documents" tables and their idempotent injection.

use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::driver;
use crate::error::Error;
use crate::ranges::DatasetIndex;
use crate::types::{DATASET_MAX, DATASET_MIN, DatasetReference, DocumentId};
use crate::urls::{dataset_browse_url, document_url, render_link};

/// Source table shipped with the binary.
const BUILTIN_SOURCES: &str = include_str!("../data/narrative_sources.toml");

/// Row text that marks a narrative as drawing on the whole corpus.
const FULL_CORPUS: &str = "Full EFTA Corpus";

/// Heading searched for as the injection point when the preferred one is absent.
const FALLBACK_POINT: &str = "### How to Verify";

/// Preferred injection point: the table goes directly above this heading.
const INJECTION_POINT: &str = "### 📊 Verify in Forensic Workbook";

/// Present once a table has been injected.
pub const MARKER: &str = "📄 EFTA Source Documents";

/// Leading narrative number in a file name.
static NARRATIVE_NUM_RE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^(\d{1,2})").expect("valid regex");
});

/// What a table row's first column links to.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(untagged)]
pub enum DocumentCell {
    /// Browse page of a dataset, labelled `Dataset N`.
    Dataset {
        /// Dataset number.
        dataset: u8,
    },
    /// PDF of one EFTA document.
    Efta {
        /// Document ID such as `EFTA00027019`.
        efta: String,
    },
    /// Any other site.
    External {
        /// Visible link text.
        label: String,
        /// Link target.
        url: String,
    },
    /// Unlinked text.
    Text {
        /// Cell contents.
        text: String,
    },
}

/// Outcome of injecting into one narrative file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectStatus {
    /// The marker was already present.
    AlreadyPresent,
    /// The table was (or, in a dry run, would be) injected.
    Injected,
    /// No narrative number in the file name, or no table for that number.
    NoTable,
}

/// Sources for one narrative.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NarrativeSources {
    /// Two-digit narrative number, e.g. `"07"`.
    pub id: String,
    /// Optional note rendered as a blockquote under the table.
    pub note: Option<String>,
    /// Table rows in display order.
    pub rows: Vec<SourceRow>,
}

/// One row of a source table.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceRow {
    /// Free-text description column.
    pub description: String,
    /// First column: what to link to.
    pub document: DocumentCell,
    /// Dataset label column, e.g. `DS8` or `External`.
    pub source: String,
}

/// All narrative tables, as loaded from TOML.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceTable {
    /// Narratives in file order.
    #[serde(default)]
    narrative: Vec<NarrativeSources>,
}

impl SourceTable {
    /// The table compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` or `Error::SourcesInvalid` if the embedded data is broken.
    pub fn builtin() -> Result<Self, Error> {
        return Self::parse(BUILTIN_SOURCES);
    }

    /// Look up a narrative by its two-digit id.
    pub fn get(&self, id: &str) -> Option<&NarrativeSources> {
        return self.narrative.iter().find(|n| return n.id == id);
    }

    /// Number of narratives with a table.
    pub fn len(&self) -> usize {
        return self.narrative.len();
    }

    /// Read a replacement table from disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::FileNotFound` if the file is missing, `Error::Io` for
    /// other read failures, or the errors of [`SourceTable::parse`].
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = match std::fs::read_to_string(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::FileNotFound { path: path.to_path_buf() });
            },
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };
        return Self::parse(&content);
    }

    /// Parse and validate a table.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` for malformed TOML, or `Error::SourcesInvalid`
    /// for duplicate ids, bad document IDs, or dataset numbers outside `1..=12`.
    pub fn parse(content: &str) -> Result<Self, Error> {
        let table: Self = toml::from_str(content)?;
        validate(&table)?;
        return Ok(table);
    }
}

/// Comma-separated browse links for every dataset, labelled by number.
fn all_dataset_links() -> String {
    return (DATASET_MIN..=DATASET_MAX)
        .map(|d| return render_link(&dataset_browse_url(d), &d.to_string()))
        .collect::<Vec<_>>()
        .join(", ");
}

/// Render the markdown section for one narrative.
pub fn build_source_table(sources: &NarrativeSources, index: &DatasetIndex<'_>) -> String {
    let mut lines: Vec<String> = vec![
        format!("### {MARKER}\n"),
        "*Click any document ID to open the DOJ PDF in a new tab. Click a Dataset number to browse neighboring files.*\n".to_string(),
        "| Document | Source | Description |".to_string(),
        "|----------|--------|-------------|".to_string(),
    ];

    for row in &sources.rows {
        let cell = render_cell(&row.document, index);
        lines.push(format!("| {cell} | {} | {} |", row.source, row.description));
    }

    if let Some(note) = &sources.note {
        lines.push(format!("\n> **Note:** {note}"));
    }

    let full_corpus = sources
        .rows
        .iter()
        .any(|r| return matches!(&r.document, DocumentCell::Text { text } if text.contains(FULL_CORPUS)));
    if full_corpus {
        lines.push(format!("\n**All 12 DOJ Datasets:** {}", all_dataset_links()));
    }

    lines.push(String::new());
    return lines.join("\n");
}

/// Insert `table` into `text`. Returns `None` if the marker is already there.
/// Goes above the workbook heading, else above "How to Verify", else at the end.
pub fn inject(text: &str, table: &str) -> Option<String> {
    if text.contains(MARKER) {
        return None;
    }
    for point in [INJECTION_POINT, FALLBACK_POINT] {
        if text.contains(point) {
            return Some(text.replacen(point, &format!("{table}\n{point}"), 1));
        }
    }
    return Some(format!("{}\n\n{table}\n", text.trim_end()));
}

/// Inject the matching table into one narrative file.
///
/// # Errors
///
/// Returns `Error::Io` or `Error::PersistFailed` if the file cannot be read or replaced.
pub fn inject_file(
    path: &Path,
    table: &SourceTable,
    index: &DatasetIndex<'_>,
    dry_run: bool,
) -> Result<InjectStatus, Error> {
    let text = std::fs::read_to_string(path)?;
    if text.contains(MARKER) {
        return Ok(InjectStatus::AlreadyPresent);
    }

    let name = driver::display_name(path);
    let Some(sources) = narrative_id(&name).and_then(|id| return table.get(&id)) else {
        return Ok(InjectStatus::NoTable);
    };

    let section = build_source_table(sources, index);
    let Some(updated) = inject(&text, &section) else {
        return Ok(InjectStatus::AlreadyPresent);
    };

    if !dry_run {
        driver::write_atomic(path, updated.as_bytes())?;
    }
    return Ok(InjectStatus::Injected);
}

/// Directory scans only consider narratives named `0…` or `1…`.
pub fn is_narrative_name(name: &str) -> bool {
    return name.starts_with('0') || name.starts_with('1');
}

/// Two-digit narrative id from a file name: `7_x.md` → `07`, `12_y.md` → `12`.
pub fn narrative_id(file_name: &str) -> Option<String> {
    let digits = NARRATIVE_NUM_RE.captures(file_name)?.get(1)?.as_str();
    return Some(format!("{digits:0>2}"));
}

/// First-column markup for a row.
fn render_cell(cell: &DocumentCell, index: &DatasetIndex<'_>) -> String {
    return match cell {
        DocumentCell::Dataset { dataset } => {
            render_link(&dataset_browse_url(*dataset), &format!("Dataset {dataset}"))
        },
        DocumentCell::Efta { efta } => {
            let serial = DocumentId::parse(efta).map(|id| return id.serial);
            let dataset = serial.and_then(|s| return index.resolve(s));
            match document_url(serial, dataset) {
                Some(url) => render_link(&url, efta),
                None => efta.clone(),
            }
        },
        DocumentCell::External { label, url } => render_link(url, label),
        DocumentCell::Text { text } => text.clone(),
    };
}

/// Reject duplicate ids and cells that could never render as links.
///
/// # Errors
///
/// Returns `Error::SourcesInvalid` describing the first problem found.
fn validate(table: &SourceTable) -> Result<(), Error> {
    let mut seen = HashSet::new();
    for narrative in &table.narrative {
        if !seen.insert(narrative.id.as_str()) {
            return Err(Error::SourcesInvalid {
                reason: format!("duplicate narrative id `{}`", narrative.id),
            });
        }
        for row in &narrative.rows {
            match &row.document {
                DocumentCell::Dataset { dataset } if DatasetReference::new(u32::from(*dataset)).is_none() => {
                    return Err(Error::SourcesInvalid {
                        reason: format!("narrative {}: dataset {dataset} is not in 1..=12", narrative.id),
                    });
                },
                DocumentCell::Efta { efta } if DocumentId::parse(efta).is_none() => {
                    return Err(Error::SourcesInvalid {
                        reason: format!("narrative {}: `{efta}` is not an EFTA document ID", narrative.id),
                    });
                },
                DocumentCell::Dataset { .. }
                | DocumentCell::Efta { .. }
                | DocumentCell::External { .. }
                | DocumentCell::Text { .. } => {},
            }
        }
    }
    return Ok(());
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    /// Builtin table, which every test relies on parsing.
    fn builtin() -> SourceTable {
        return SourceTable::builtin().unwrap();
    }

    #[test]
    fn builtin_table_covers_sixteen_narratives() {
        let table = builtin();
        assert_eq!(table.len(), 16);
        assert!(table.get("01").is_some());
        assert!(table.get("16").is_some());
        assert!(table.get("17").is_none());
    }

    #[test]
    fn table_renders_links_note_and_corpus_line() {
        let table = builtin();
        let section = build_source_table(table.get("16").unwrap(), &DatasetIndex::doj());
        assert!(section.starts_with("### 📄 EFTA Source Documents\n"));
        assert!(section.contains("| Document | Source | Description |"));
        assert!(section.contains("| Full EFTA Corpus | DS1–12 | HBRK Associates"));
        assert!(section.contains("\n> **Note:** Kahn's document footprint"));
        assert!(section.contains("**All 12 DOJ Datasets:** <a href=\"https://www.justice.gov/epstein/doj-disclosures/data-set-1-files\" target=\"_blank\">1</a>, "));
        assert!(section.contains(">12</a>"));
        assert!(section.ends_with('\n'));
    }

    #[test]
    fn efta_cells_link_to_pdf_and_gap_ids_stay_bare() {
        let index = DatasetIndex::doj();
        let linked = render_cell(&DocumentCell::Efta { efta: "EFTA00027019".to_string() }, &index);
        assert_eq!(
            linked,
            "<a href=\"https://www.justice.gov/epstein/files/DataSet%208/EFTA00027019.pdf\" target=\"_blank\">EFTA00027019</a>"
        );
        let gap = render_cell(&DocumentCell::Efta { efta: "EFTA00005587".to_string() }, &index);
        assert_eq!(gap, "EFTA00005587");
    }

    #[test]
    fn narratives_without_corpus_rows_have_no_dataset_directory() {
        let section = build_source_table(builtin().get("01").unwrap(), &DatasetIndex::doj());
        assert!(!section.contains("All 12 DOJ Datasets"));
        assert!(section.contains(">Dataset 8</a> | DS8 | Browse neighboring documents in Dataset 8 |"));
    }

    #[test]
    fn inject_prefers_workbook_heading_then_fallback_then_end() {
        let table = "### 📄 EFTA Source Documents\nT\n";

        let with_point = "# N\n\n### 📊 Verify in Forensic Workbook\nrows\n";
        let out = inject(with_point, table).unwrap();
        assert_eq!(out, format!("# N\n\n{table}\n### 📊 Verify in Forensic Workbook\nrows\n"));

        let with_fallback = "# N\n\n### How to Verify\nsteps\n";
        let out = inject(with_fallback, table).unwrap();
        assert!(out.contains(&format!("{table}\n### How to Verify")));

        let bare = "# N\nbody\n\n\n";
        assert_eq!(inject(bare, table).unwrap(), format!("# N\nbody\n\n{table}\n"));
    }

    #[test]
    fn inject_is_idempotent() {
        let table = "### 📄 EFTA Source Documents\nT\n";
        let once = inject("# N\n", table).unwrap();
        assert!(inject(&once, table).is_none());
    }

    #[test]
    fn narrative_ids_are_zero_padded() {
        assert_eq!(narrative_id("7_flights.md").as_deref(), Some("07"));
        assert_eq!(narrative_id("01_jeepers_pipeline.md").as_deref(), Some("01"));
        assert_eq!(narrative_id("12-bear.md").as_deref(), Some("12"));
        assert_eq!(narrative_id("readme.md"), None);
    }

    #[test]
    fn invalid_tables_are_rejected() {
        let bad_dataset = "[[narrative]]\nid = \"01\"\nrows = [{ document = { dataset = 13 }, source = \"DS13\", description = \"x\" }]\n";
        assert!(matches!(SourceTable::parse(bad_dataset), Err(Error::SourcesInvalid { .. })));

        let bad_id = "[[narrative]]\nid = \"01\"\nrows = [{ document = { efta = \"EFTA12\" }, source = \"DS8\", description = \"x\" }]\n";
        assert!(matches!(SourceTable::parse(bad_id), Err(Error::SourcesInvalid { .. })));

        let dup = "[[narrative]]\nid = \"01\"\nrows = []\n[[narrative]]\nid = \"01\"\nrows = []\n";
        assert!(matches!(SourceTable::parse(dup), Err(Error::SourcesInvalid { .. })));
    }

    #[test]
    fn inject_file_reports_each_status() {
        let dir = tempfile::tempdir().unwrap();
        let table = builtin();
        let index = DatasetIndex::doj();

        let narrative = dir.path().join("01_jeepers.md");
        std::fs::write(&narrative, "# N1\n\n### How to Verify\n").unwrap();
        assert_eq!(inject_file(&narrative, &table, &index, true).unwrap(), InjectStatus::Injected);
        assert!(!std::fs::read_to_string(&narrative).unwrap().contains(MARKER));
        assert_eq!(inject_file(&narrative, &table, &index, false).unwrap(), InjectStatus::Injected);
        assert!(std::fs::read_to_string(&narrative).unwrap().contains(MARKER));
        assert_eq!(inject_file(&narrative, &table, &index, false).unwrap(), InjectStatus::AlreadyPresent);

        let unknown = dir.path().join("19_other.md");
        std::fs::write(&unknown, "# N19\n").unwrap();
        assert_eq!(inject_file(&unknown, &table, &index, false).unwrap(), InjectStatus::NoTable);
    }
}
