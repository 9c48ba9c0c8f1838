//! Split a combined appendices file into per-narrative sections and append
//! each one to its narrative, once.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::driver;
use crate::error::Error;

/// Heading that starts every appendix section.
pub const APPENDIX_HEADING: &str = "## Source Documents & Exhibits";

/// Separator placed between a narrative body and its appendix.
const SEPARATOR: &str = "\n\n---\n\n";

/// Injected by `inject-sources`; its presence also counts as "has an appendix".
const WORKBOOK_MARKER: &str = "📊 Verify in Forensic Workbook";

/// A `---` rule followed by the next `# N<k>` section header.
static SECTION_SPLIT_RE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"\n---\n\n# N\d+").expect("valid regex");
});

/// `# N7 — Title`.
static SECTION_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^# N(\d+)\s*—").expect("valid regex");
});

/// `01_x.md`, `7-y.md`.
static LEADING_NUM_RE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"^0?(\d{1,2})[_\-]").expect("valid regex");
});

/// `n1_x.md`, `narrative_n07.md`, `n-3.md`.
static N_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    return Regex::new(r"n[_-]?0?(\d{1,2})").expect("valid regex");
});

/// What happened to one narrative key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Appended (or would be, in a dry run) to this file.
    Appended(PathBuf),
    /// The file already has an appendix and `--force` was not given.
    AlreadyPresent(PathBuf),
    /// An appendix exists for this key but no narrative file matched.
    NoFile,
    /// A narrative file exists for this key but the appendices file has no section.
    NoAppendix(PathBuf),
}

/// Tally of [`AppendOutcome`]s across a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AppendSummary {
    /// Keys whose narrative was already done.
    pub already_present: Vec<u32>,
    /// Keys appended.
    pub appended: Vec<u32>,
    /// Keys with no section in the appendices file.
    pub no_appendix: Vec<u32>,
    /// Keys with no narrative file.
    pub no_file: Vec<u32>,
}

impl AppendSummary {
    /// Record the outcome for narrative `key`.
    pub fn record(&mut self, key: u32, outcome: &AppendOutcome) {
        let bucket = match outcome {
            AppendOutcome::AlreadyPresent(_) => &mut self.already_present,
            AppendOutcome::Appended(_) => &mut self.appended,
            AppendOutcome::NoAppendix(_) => &mut self.no_appendix,
            AppendOutcome::NoFile => &mut self.no_file,
        };
        bucket.push(key);
    }
}

/// Add `appendix` to the end of `content`, replacing an existing appendix
/// when `replace_existing` is set.
pub fn append_to(content: &str, appendix: &str, replace_existing: bool) -> String {
    let body = if replace_existing { strip_appendix(content) } else { content };
    return format!("{}{SEPARATOR}{appendix}\n", body.trim_end());
}

/// Process one narrative key: append its appendix unless already present.
///
/// # Errors
///
/// Returns `Error::Io` or `Error::PersistFailed` if the narrative cannot be read or replaced.
pub fn apply(
    appendix: Option<&str>,
    file: Option<&Path>,
    force: bool,
    dry_run: bool,
) -> Result<AppendOutcome, Error> {
    let (appendix, file) = match (appendix, file) {
        (None, Some(f)) => return Ok(AppendOutcome::NoAppendix(f.to_path_buf())),
        (_, None) => return Ok(AppendOutcome::NoFile),
        (Some(a), Some(f)) => (a, f),
    };

    let content = std::fs::read_to_string(file)?;
    let present = has_appendix(&content);
    if present && !force {
        return Ok(AppendOutcome::AlreadyPresent(file.to_path_buf()));
    }

    if !dry_run {
        driver::write_atomic(file, append_to(&content, appendix, present).as_bytes())?;
    }
    return Ok(AppendOutcome::Appended(file.to_path_buf()));
}

/// Map narrative number → `.md` file in `dir` (not recursive).
/// Later files in name order win when two map to the same number.
///
/// # Errors
///
/// Returns `Error::NotADirectory` or `Error::Io` if the directory cannot be listed.
pub fn find_narrative_files(dir: &Path) -> Result<BTreeMap<u32, PathBuf>, Error> {
    if !dir.is_dir() {
        return Err(Error::NotADirectory { path: dir.to_path_buf() });
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .map(|entry| return entry.map(|e| return e.path()))
        .collect::<Result<_, _>>()?;
    paths.retain(|p| return p.is_file() && p.extension().is_some_and(|ext| return ext == "md"));
    paths.sort();

    let mut files = BTreeMap::new();
    for path in paths {
        let name = driver::display_name(&path).to_lowercase();
        if let Some(key) = narrative_key(&name) {
            files.insert(key, path);
        }
    }
    return Ok(files);
}

/// Whether a narrative already carries a source appendix.
pub fn has_appendix(content: &str) -> bool {
    return content.contains(APPENDIX_HEADING) || content.contains(WORKBOOK_MARKER);
}

/// Narrative number from a lowercased file name.
fn narrative_key(name: &str) -> Option<u32> {
    let cap = LEADING_NUM_RE.captures(name).or_else(|| return N_PREFIX_RE.captures(name))?;
    return cap.get(1)?.as_str().parse().ok();
}

/// Split the combined appendices document into `{narrative number: appendix}`.
///
/// Sections are separated by a `---` rule directly followed by a `# N<k>`
/// header. Each section keeps everything from its
/// `## Source Documents & Exhibits` line, or everything after the title line
/// when that heading is missing.
pub fn parse_appendices(content: &str) -> BTreeMap<u32, String> {
    let mut appendices = BTreeMap::new();
    for section in split_sections(content) {
        let section = section.trim();
        let Some(key) = SECTION_HEADER_RE
            .captures(section)
            .and_then(|c| return c.get(1)?.as_str().parse::<u32>().ok())
        else {
            continue;
        };

        let lines: Vec<&str> = section.split('\n').collect();
        let start = lines
            .iter()
            .position(|l| return l.trim().starts_with(APPENDIX_HEADING))
            .unwrap_or(1);
        let body = lines.get(start..).unwrap_or_default().join("\n");
        appendices.insert(key, body.trim().to_string());
    }
    return appendices;
}

/// Cut `content` at every separator that precedes a section header.
fn split_sections(content: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut from = 0_usize;
    for m in SECTION_SPLIT_RE.find_iter(content) {
        sections.push(content.get(from..m.start()).unwrap_or(""));
        // Next section begins at its `# N` header, after "\n---\n\n".
        from = m.start().saturating_add("\n---\n\n".len());
    }
    sections.push(content.get(from..).unwrap_or(""));
    return sections;
}

/// Drop a previously appended appendix: everything from the separator in
/// front of the appendix heading (or the heading itself) onward.
fn strip_appendix(content: &str) -> &str {
    let Some(heading) = content.find(APPENDIX_HEADING) else {
        return content;
    };
    let head = content.get(..heading).unwrap_or(content);
    let cut = head.trim_end().strip_suffix("---").map_or(heading, str::len);
    return content.get(..cut).unwrap_or(content);
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    /// A two-section combined appendices document.
    const COMBINED: &str = "# N1 — Jeepers Pipeline\n\nintro text\n\n## Source Documents & Exhibits\n\n| a | b |\n\n---\n\n# N2 — Art Market\n\nno heading here\nsecond line\n";

    #[test]
    fn parses_sections_from_heading_or_after_title() {
        let parsed = parse_appendices(COMBINED);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[&1], "## Source Documents & Exhibits\n\n| a | b |");
        assert_eq!(parsed[&2], "no heading here\nsecond line");
    }

    #[test]
    fn rule_without_following_header_does_not_split() {
        let doc = "# N3 — T\n\n## Source Documents & Exhibits\nA\n\n---\n\nstill N3\n";
        let parsed = parse_appendices(doc);
        assert_eq!(parsed.len(), 1);
        assert!(parsed[&3].ends_with("still N3"));
    }

    #[test]
    fn narrative_keys_from_file_names() {
        assert_eq!(narrative_key("01_jeepers.md"), Some(1));
        assert_eq!(narrative_key("12-bear.md"), Some(12));
        assert_eq!(narrative_key("n7_flights.md"), Some(7));
        assert_eq!(narrative_key("narrative_n-03.md"), Some(3));
        assert_eq!(narrative_key("readme.md"), None);
    }

    #[test]
    fn append_adds_separator_once() {
        let out = append_to("# Body\n\n\n", "## Source Documents & Exhibits\nX", false);
        assert_eq!(out, "# Body\n\n---\n\n## Source Documents & Exhibits\nX\n");
        assert!(has_appendix(&out));
    }

    #[test]
    fn force_replaces_instead_of_duplicating() {
        let once = append_to("# Body\n", "## Source Documents & Exhibits\nOLD", false);
        let twice = append_to(&once, "## Source Documents & Exhibits\nNEW", true);
        assert_eq!(twice, "# Body\n\n---\n\n## Source Documents & Exhibits\nNEW\n");
        assert_eq!(twice.matches(APPENDIX_HEADING).count(), 1);
    }

    #[test]
    fn apply_skips_existing_unless_forced() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("01_a.md");
        std::fs::write(&file, "# Body\n").unwrap();
        let appendix = "## Source Documents & Exhibits\nX";

        let dry = apply(Some(appendix), Some(&file), false, true).unwrap();
        assert_eq!(dry, AppendOutcome::Appended(file.clone()));
        assert_eq!(std::fs::read_to_string(&file).unwrap(), "# Body\n");

        apply(Some(appendix), Some(&file), false, false).unwrap();
        let again = apply(Some(appendix), Some(&file), false, false).unwrap();
        assert_eq!(again, AppendOutcome::AlreadyPresent(file.clone()));

        let forced = apply(Some(appendix), Some(&file), true, false).unwrap();
        assert_eq!(forced, AppendOutcome::Appended(file.clone()));
        assert_eq!(std::fs::read_to_string(&file).unwrap().matches(APPENDIX_HEADING).count(), 1);
    }

    #[test]
    fn apply_reports_missing_sides() {
        let path = PathBuf::from("01_a.md");
        assert_eq!(apply(None, Some(&path), false, false).unwrap(), AppendOutcome::NoAppendix(path));
        assert_eq!(apply(Some("x"), None, false, false).unwrap(), AppendOutcome::NoFile);
    }

    #[test]
    fn finds_narrative_files_in_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("01_jeepers.md"), "").unwrap();
        std::fs::write(dir.path().join("N2_art.md"), "").unwrap();
        std::fs::write(dir.path().join("README.md"), "").unwrap();
        std::fs::write(dir.path().join("03_notes.txt"), "").unwrap();

        let files = find_narrative_files(dir.path()).unwrap();
        assert_eq!(files.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
    }
}
