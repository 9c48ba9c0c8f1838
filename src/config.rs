use std::path::{Path, PathBuf};

use crate::error::Error;

/// Name of the optional project config file, looked up in the working directory.
pub const CONFIG_FILE: &str = ".eftalink.toml";

/// Project configuration loaded from `.eftalink.toml`.
/// Include/exclude patterns are path prefixes, relative to the scanned
/// directory, applied to markdown files found by directory scans; an explicit
/// `--file` is never filtered.
#[derive(Debug, Default)]
pub struct Config {
    /// Path prefixes that must not be scanned.
    exclude: Vec<String>,
    /// Path prefixes to scan. Empty means everything.
    include: Vec<String>,
    /// Replacement narrative source table for `inject-sources`, relative to the config root.
    pub sources: Option<PathBuf>,
}

/// Raw TOML structure for `.eftalink.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct EftalinkTomlConfig {
    /// See [`Config::exclude`].
    #[serde(default)]
    exclude: Vec<String>,
    /// See [`Config::include`].
    #[serde(default)]
    include: Vec<String>,
    /// See [`Config::sources`].
    sources: Option<PathBuf>,
}

impl Config {
    /// Configured include and exclude prefixes, for reporting.
    pub fn filters(&self) -> (&[String], &[String]) {
        return (&self.include, &self.exclude);
    }

    /// Load config from `.eftalink.toml` in the given root directory.
    /// Returns a default that scans everything if the file doesn't exist.
    /// Returns an error if the file exists but is malformed; a config the user
    /// wrote is never silently replaced with defaults.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
            Ok(c) => c,
        };

        return Self::parse(root, &content);
    }

    /// Parse config TOML. A relative `sources` path is resolved against `root`.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlDe` if the TOML is malformed or has unknown keys.
    pub fn parse(root: &Path, content: &str) -> Result<Self, Error> {
        let raw: EftalinkTomlConfig = toml::from_str(content)?;
        return Ok(Self {
            exclude: raw.exclude,
            include: raw.include,
            sources: raw.sources.map(|p| return root.join(p)),
        });
    }

    /// Check whether a markdown file path should be scanned.
    ///
    /// A path is included if no include patterns are set (scan everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_scans_everything() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert!(config.should_scan("narratives/01_intro.md"));
        assert!(config.sources.is_none());
    }

    #[test]
    fn include_then_exclude() {
        let config = Config::parse(
            Path::new("."),
            "include = [\"narratives/\"]\nexclude = [\"narratives/archive/\"]\n",
        )
        .unwrap();
        assert!(config.should_scan("narratives/01_intro.md"));
        assert!(!config.should_scan("narratives/archive/01_old.md"));
        assert!(!config.should_scan("README.md"));
    }

    #[test]
    fn sources_path_is_rooted() {
        let config = Config::parse(Path::new("/proj"), "sources = \"data/sources.toml\"\n").unwrap();
        assert_eq!(config.sources, Some(PathBuf::from("/proj/data/sources.toml")));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "include = 3\n").unwrap();
        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::parse(Path::new("."), "inclde = []\n").is_err());
    }
}
