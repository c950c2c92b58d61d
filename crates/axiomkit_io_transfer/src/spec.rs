//! Transfer option models, result items and top-level error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::conf::derive_default_name_heuristic;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// How the filename column of a table was selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumColumnSource {
    /// Explicitly configured column name found among headers.
    Configured,
    /// First header matching a likely filename label.
    LikelyLabel,
    /// First header, used as a last resort.
    FirstColumn,
    /// Table has no header row; the first field of every row is used.
    Headerless,
}

/// Which resolver tier produced the candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumResolveTier {
    /// Direct lookup by the target name.
    Direct,
    /// Single retry with the alternate target extension.
    AlternateExtension,
    /// No candidates on disk.
    Unresolved,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Export-name recovery heuristic.
///
/// All extensions are given without the leading dot and matched
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecNameHeuristic {
    /// Extension appended to every recovered stem.
    pub ext_target: String,
    /// Alternate spelling of `ext_target` tried once when lookup misses.
    pub ext_target_alternate: Option<String>,
    /// Literal token of the export suffix (`_<ext>.<marker>.`).
    pub export_marker: String,
    /// Raster extensions recognized inside the export suffix.
    pub exts_raster: Vec<String>,
    /// Extension whose first occurrence splits the stem.
    pub ext_legacy: Option<String>,
}

impl Default for SpecNameHeuristic {
    fn default() -> Self {
        derive_default_name_heuristic()
    }
}

/// Input options for `find_and_copy_from_csv`.
#[derive(Debug, Clone)]
pub struct SpecTransferOptions {
    /// Table column holding filenames; overrides inference when present.
    pub column: Option<String>,
    /// Fold names to lowercase in extraction, naming, indexing and lookup.
    pub if_case_insensitive: bool,
    /// Replace existing destination files instead of suffixing `_<n>`.
    pub if_overwrite: bool,
    /// Mirror source subdirectories (relative to search root) under destination.
    pub if_keep_tree: bool,
    /// Do not mutate filesystem; record what would happen.
    pub if_dry_run: bool,
    /// Name recovery heuristic.
    pub spec_name_heuristic: SpecNameHeuristic,
}

impl Default for SpecTransferOptions {
    fn default() -> Self {
        Self {
            column: None,
            if_case_insensitive: true,
            if_overwrite: false,
            if_keep_tree: false,
            if_dry_run: false,
            spec_name_heuristic: SpecNameHeuristic::default(),
        }
    }
}

/// Inferred table dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecTableDialect {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Whether the first row is a header.
    pub if_has_header: bool,
}

/// Resolver output for one target name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecResolution {
    /// Target name looked up.
    pub name_target: String,
    /// Index key that produced candidates (alternate spelling included).
    pub name_matched: Option<String>,
    /// Tier that produced the candidates.
    pub tier: EnumResolveTier,
    /// Candidate source files, in index order.
    pub paths_src: Vec<PathBuf>,
}

impl SpecResolution {
    /// Whether no candidates were found.
    pub fn is_unresolved(&self) -> bool {
        self.tier == EnumResolveTier::Unresolved
    }
}

/// One per-entry failure item with path + error text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTransferError {
    /// Failed source or destination path.
    pub path: PathBuf,
    /// User-facing error text.
    pub exception: String,
}

/// Non-fatal traversal failure below the search root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTraversalWarning {
    /// Entry (or directory) that could not be visited.
    pub path: PathBuf,
    /// Underlying error text.
    pub message: String,
}

/// "Top-level call failed" errors (input validation / setup stage).
#[derive(Debug, Error)]
pub enum TransferError {
    /// Table offers no column to read filenames from.
    #[error("Could not determine which column contains filenames: {0}")]
    Configuration(String),
    /// Table could not be opened or parsed.
    #[error("Failed to read table {}: {message}", .path.display())]
    TableRead {
        /// Table path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// Name heuristic is empty or cannot be compiled.
    #[error("Invalid name heuristic: {0}")]
    InvalidHeuristic(String),
    /// Search root is missing, not a directory, or unreadable.
    #[error("Search root is not accessible {}: {message}", .path.display())]
    RootAccess {
        /// Search root path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// Destination directory initialization failed.
    #[error("Failed to initialize destination {}: {message}", .path.display())]
    DestinationInitFailed {
        /// Destination path that failed initialization.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
