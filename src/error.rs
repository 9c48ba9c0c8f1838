/// Crate-level error types for eftalink diagnostics.
use std::path::PathBuf;

/// All errors in eftalink carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The combined appendices file contained no `# N<k> —` sections.
    #[error("no appendix sections found in {}", path.display())]
    AppendicesEmpty {
        /// Path to the appendices file that was parsed.
        path: PathBuf,
    },

    /// A referenced input file does not exist on disk.
    #[error("file not found: {}", path.display())]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON deserialization failed.
    #[error("json: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// The wire ledger parsed but holds no wires.
    #[error("ledger has no wires: {}", path.display())]
    LedgerEmpty {
        /// Path to the ledger file.
        path: PathBuf,
    },

    /// The `--dir` target is not a directory.
    #[error("not a directory: {}", path.display())]
    NotADirectory {
        /// Path that was expected to be a directory.
        path: PathBuf,
    },

    /// Replacing a file with its rewritten contents failed.
    #[error("could not replace {}: {reason}", path.display())]
    PersistFailed {
        /// File that was being overwritten.
        path: PathBuf,
        /// Description of the rename failure.
        reason: String,
    },

    /// The narrative source table is structurally valid TOML but unusable.
    #[error("source table invalid: {reason}")]
    SourcesInvalid {
        /// Description of the problem.
        reason: String,
    },

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// Directory traversal failed part-way through a scan.
    #[error("walk: {0}")]
    Walk(
        /// The wrapped walkdir error.
        #[from]
        walkdir::Error,
    ),

    /// Building or saving the workbook failed.
    #[error("xlsx: {0}")]
    Xlsx(
        /// The wrapped spreadsheet writer error.
        #[from]
        rust_xlsxwriter::XlsxError,
    ),
}

