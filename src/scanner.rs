use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::Config;
use crate::error::Error;

/// What a command should operate on.
#[derive(Debug, Clone)]
pub enum Target {
    /// Every markdown file in a directory, optionally descending into subdirectories.
    Dir {
        /// Directory to scan.
        path: PathBuf,
        /// Whether to descend into subdirectories.
        recursive: bool,
    },
    /// One explicit file. Never filtered by config or name.
    File(PathBuf),
}

/// Collect the markdown files a command should process, sorted by path.
/// Directory scans keep `*.md` files accepted by both the config's
/// include/exclude prefixes (matched against the path relative to the scanned
/// directory) and `name_filter` (applied to the file name).
///
/// # Errors
///
/// Returns `Error::FileNotFound` for a missing `--file`,
/// `Error::NotADirectory` for a bad `--dir`, or `Error::Walk` if traversal fails.
pub fn collect(
    target: &Target,
    config: &Config,
    name_filter: fn(&str) -> bool,
) -> Result<Vec<PathBuf>, Error> {
    return match target {
        Target::Dir { path, recursive } => scan_dir(path, *recursive, config, name_filter),
        Target::File(path) => {
            if !path.is_file() {
                return Err(Error::FileNotFound { path: path.clone() });
            }
            Ok(vec![path.clone()])
        },
    };
}

/// Accept every file name.
pub const fn any_name(_name: &str) -> bool {
    return true;
}

/// Markdown extension check.
fn is_markdown(path: &Path) -> bool {
    return path.extension().is_some_and(|ext| return ext == "md");
}

/// Walk `dir` and keep matching markdown files.
///
/// # Errors
///
/// Returns `Error::NotADirectory` if `dir` is not a directory, or `Error::Walk`.
fn scan_dir(
    dir: &Path,
    recursive: bool,
    config: &Config,
    name_filter: fn(&str) -> bool,
) -> Result<Vec<PathBuf>, Error> {
    if !dir.is_dir() {
        return Err(Error::NotADirectory { path: dir.to_path_buf() });
    }

    let walker = if recursive {
        WalkDir::new(dir).min_depth(1)
    } else {
        WalkDir::new(dir).min_depth(1).max_depth(1)
    };

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_markdown(path) {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if !name_filter(&name) {
            continue;
        }
        let relative = path.strip_prefix(dir).unwrap_or(path).to_string_lossy();
        if !config.should_scan(&relative) {
            continue;
        }
        files.push(path.to_path_buf());
    }

    files.sort();
    return Ok(files);
}
