//! Recovery of original basenames from export-mangled names.
//!
//! The labeling export renames `<stem>.<ext>` to `<stem>_<ext>.<marker>.<hash>.<ext>`.
//! Rules are applied in strict priority order and never combined:
//! 1. export suffix `_<raster-ext>.<marker>.` → text before the suffix;
//! 2. first occurrence of `.<legacy-ext>` → text before it;
//! 3. otherwise the name without its last extension.
//!
//! The recovered stem always gets the target extension. A name that happens to
//! contain an earlier rule's pattern is split there even if that is wrong.

use regex::{Regex, RegexBuilder};

use crate::spec::{SpecNameHeuristic, TransferError};
use crate::util::split_extension;

/// Which recovery rule produced a target name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumNameRule {
    /// Export suffix `_<raster-ext>.<marker>.` found.
    ExportSuffix,
    /// Split at the first legacy extension occurrence.
    LegacyExtension,
    /// Last extension replaced.
    Generic,
}

fn _clean_ext(value: &str) -> String {
    value.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Compiled [`SpecNameHeuristic`].
#[derive(Debug, Clone)]
pub struct NameTransformer {
    re_export_suffix: Regex,
    c_suffix_target: String,
    c_suffix_alternate: Option<String>,
    c_needle_legacy: Option<String>,
}

impl NameTransformer {
    /// Validate and compile a heuristic.
    pub fn new(spec_name_heuristic: SpecNameHeuristic) -> Result<Self, TransferError> {
        let ext_target = _clean_ext(&spec_name_heuristic.ext_target);
        if ext_target.is_empty() {
            return Err(TransferError::InvalidHeuristic(
                "`ext_target` must not be empty.".to_string(),
            ));
        }
        let export_marker = spec_name_heuristic.export_marker.trim();
        if export_marker.is_empty() {
            return Err(TransferError::InvalidHeuristic(
                "`export_marker` must not be empty.".to_string(),
            ));
        }
        let l_exts_raster: Vec<String> = spec_name_heuristic
            .exts_raster
            .iter()
            .map(|v| _clean_ext(v))
            .filter(|v| !v.is_empty())
            .collect();
        if l_exts_raster.is_empty() {
            return Err(TransferError::InvalidHeuristic(
                "`exts_raster` must contain at least one extension.".to_string(),
            ));
        }

        let c_alternation = l_exts_raster
            .iter()
            .map(|v| regex::escape(v))
            .collect::<Vec<_>>()
            .join("|");
        let re_export_suffix = RegexBuilder::new(&format!(
            r"_(?:{c_alternation})\.{}\.",
            regex::escape(export_marker)
        ))
        .case_insensitive(true)
        .build()
        .map_err(|e| TransferError::InvalidHeuristic(format!("Invalid export suffix: {e}")))?;

        let c_suffix_alternate = spec_name_heuristic
            .ext_target_alternate
            .as_deref()
            .map(_clean_ext)
            .filter(|v| !v.is_empty() && *v != ext_target)
            .map(|v| format!(".{v}"));
        let c_needle_legacy = spec_name_heuristic
            .ext_legacy
            .as_deref()
            .map(_clean_ext)
            .filter(|v| !v.is_empty())
            .map(|v| format!(".{v}"));

        Ok(Self {
            re_export_suffix,
            c_suffix_target: format!(".{ext_target}"),
            c_suffix_alternate,
            c_needle_legacy,
        })
    }

    /// Target suffix including the dot (e.g. `.tif`).
    pub fn suffix_target(&self) -> &str {
        &self.c_suffix_target
    }

    /// Recover the original basename and report which rule fired.
    pub fn transform_with_rule(&self, name: &str) -> (String, EnumNameRule) {
        if let Some(m) = self.re_export_suffix.find(name) {
            return (
                format!("{}{}", &name[..m.start()], self.c_suffix_target),
                EnumNameRule::ExportSuffix,
            );
        }

        if let Some(needle) = &self.c_needle_legacy
            && let Some(idx) = name.to_ascii_lowercase().find(needle.as_str())
        {
            return (
                format!("{}{}", &name[..idx], self.c_suffix_target),
                EnumNameRule::LegacyExtension,
            );
        }

        let (stem, _) = split_extension(name);
        (
            format!("{stem}{}", self.c_suffix_target),
            EnumNameRule::Generic,
        )
    }

    /// Recover the original basename with the target extension.
    pub fn transform(&self, name: &str) -> String {
        self.transform_with_rule(name).0
    }

    /// Transform, then fold case per configuration to build a lookup key.
    pub fn derive_target_name(&self, name: &str, if_case_insensitive: bool) -> String {
        let name_target = self.transform(name);
        if if_case_insensitive {
            name_target.to_lowercase()
        } else {
            name_target
        }
    }

    /// Single alternate spelling of `name_target`, when it ends with the
    /// target suffix and an alternate extension is configured.
    pub fn derive_alternate_name(&self, name_target: &str) -> Option<String> {
        let suffix_alternate = self.c_suffix_alternate.as_ref()?;
        let stem = name_target.strip_suffix(self.c_suffix_target.as_str())?;
        Some(format!("{stem}{suffix_alternate}"))
    }
}
