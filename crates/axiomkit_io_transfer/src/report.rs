//! Transfer report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::spec::SpecTransferError;

/// Aggregate counters and diagnostics for one transfer run.
#[derive(Debug, Default, Clone)]
pub struct ReportTransfer {
    /// Distinct normalized filenames read from the table.
    pub cnt_names_raw: u64,
    /// Distinct target names after transformation.
    pub cnt_targets: u64,
    /// Files indexed under the search root.
    pub cnt_scanned: u64,
    /// Target names with at least one candidate.
    pub cnt_resolved: u64,
    /// Target names with no candidate.
    pub cnt_unresolved: u64,
    /// Files copied successfully.
    pub cnt_copied: u64,
    /// Candidates not copied because of dry-run.
    pub cnt_skipped: u64,
    /// Target names with no candidate, in processing order.
    pub names_unresolved: Vec<String>,
    /// Non-fatal warnings collected during indexing/copy.
    pub warnings: Vec<String>,
    /// Per-file failures.
    pub errors: Vec<SpecTransferError>,
}

impl ReportTransfer {
    /// Number of collected hard errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Whether at least one file was copied and nothing failed.
    pub fn is_success(&self) -> bool {
        self.cnt_copied > 0 && self.errors.is_empty()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_names_raw".to_string(), self.cnt_names_raw);
        dict_counts.insert("cnt_targets".to_string(), self.cnt_targets);
        dict_counts.insert("cnt_scanned".to_string(), self.cnt_scanned);
        dict_counts.insert("cnt_resolved".to_string(), self.cnt_resolved);
        dict_counts.insert("cnt_unresolved".to_string(), self.cnt_unresolved);
        dict_counts.insert("cnt_copied".to_string(), self.cnt_copied);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        format!(
            "{prefix} targets={} scanned={} resolved={} unresolved={} copied={} skipped={} errors={} warnings={}",
            self.cnt_targets,
            self.cnt_scanned,
            self.cnt_resolved,
            self.cnt_unresolved,
            self.cnt_copied,
            self.cnt_skipped,
            self.error_count(),
            self.warning_count()
        )
    }
}

impl fmt::Display for ReportTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[TRANSFER]"))
    }
}

/// Mutable accumulator for transfer statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportTransferBuilder {
    /// See [`ReportTransfer::cnt_names_raw`].
    pub cnt_names_raw: u64,
    /// See [`ReportTransfer::cnt_targets`].
    pub cnt_targets: u64,
    /// See [`ReportTransfer::cnt_scanned`].
    pub cnt_scanned: u64,
    /// See [`ReportTransfer::cnt_resolved`].
    pub cnt_resolved: u64,
    /// See [`ReportTransfer::cnt_copied`].
    pub cnt_copied: u64,
    /// See [`ReportTransfer::cnt_skipped`].
    pub cnt_skipped: u64,
    /// See [`ReportTransfer::names_unresolved`].
    pub names_unresolved: Vec<String>,
    /// See [`ReportTransfer::warnings`].
    pub warnings: Vec<String>,
    /// See [`ReportTransfer::errors`].
    pub errors: Vec<SpecTransferError>,
}

impl ReportTransferBuilder {
    /// Increment resolved count by one.
    pub fn add_resolved(&mut self) {
        self.cnt_resolved += 1;
    }

    /// Record a target name with no candidate.
    pub fn add_unresolved(&mut self, name_target: String) {
        self.names_unresolved.push(name_target);
    }

    /// Increment copied count by one.
    pub fn add_copied(&mut self) {
        self.cnt_copied += 1;
    }

    /// Increment skipped count by one.
    pub fn add_skipped(&mut self) {
        self.cnt_skipped += 1;
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Add one path-scoped error.
    pub fn add_error(&mut self, path: PathBuf, exception: String) {
        self.errors.push(SpecTransferError { path, exception });
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportTransfer {
        ReportTransfer {
            cnt_names_raw: self.cnt_names_raw,
            cnt_targets: self.cnt_targets,
            cnt_scanned: self.cnt_scanned,
            cnt_resolved: self.cnt_resolved,
            cnt_unresolved: self.names_unresolved.len() as u64,
            cnt_copied: self.cnt_copied,
            cnt_skipped: self.cnt_skipped,
            names_unresolved: self.names_unresolved,
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}
