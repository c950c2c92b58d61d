//! End-to-end transfer: table → target names → index → resolve → copy.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::copy::copy_resolved_files;
use crate::index::build_file_index;
use crate::naming::NameTransformer;
use crate::report::{ReportTransfer, ReportTransferBuilder};
use crate::resolve::resolve_targets;
use crate::spec::{SpecTransferOptions, TransferError};
use crate::table::extract_filenames_from_table;

/// Read filenames from `path_table`, recover original names, find them under
/// `dir_search` and copy them into `dir_destination`.
///
/// This function performs, strictly in sequence:
/// 1. Heuristic compilation and table extraction.
/// 2. Transformation into a deduplicated, sorted set of target names.
/// 3. One indexing pass over `dir_search`.
/// 4. Resolution and copy (destination created first unless dry-run).
///
/// Returns [`TransferError`] for setup failures, all of which happen before
/// the destination is touched. Unresolved names and per-file copy failures
/// are recorded in the returned [`ReportTransfer`].
pub fn find_and_copy_from_csv<P, Q, R>(
    path_table: P,
    dir_search: Q,
    dir_destination: R,
    spec_options: SpecTransferOptions,
) -> Result<ReportTransfer, TransferError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    R: AsRef<Path>,
{
    let path_table = path_table.as_ref();
    let path_dir_src = dir_search.as_ref();
    let path_dir_dst = dir_destination.as_ref();
    let if_case_insensitive = spec_options.if_case_insensitive;

    let name_transformer = NameTransformer::new(spec_options.spec_name_heuristic.clone())?;
    let mut builder_report = ReportTransferBuilder::default();

    info!("Reading filenames from table: {}", path_table.display());
    let spec_extract = extract_filenames_from_table(
        path_table,
        spec_options.column.as_deref(),
        if_case_insensitive,
    )?;
    builder_report.cnt_names_raw = spec_extract.names.len() as u64;
    if spec_extract.names.is_empty() {
        let c_msg = "No filenames loaded from table; nothing to do.".to_string();
        warn!("{c_msg}");
        builder_report.add_warning(c_msg);
        return Ok(builder_report.build());
    }

    let names_target: BTreeSet<String> = spec_extract
        .names
        .iter()
        .map(|name| name_transformer.derive_target_name(name, if_case_insensitive))
        .collect();
    builder_report.cnt_targets = names_target.len() as u64;

    info!("Indexing files under: {}", path_dir_src.display());
    let file_index = build_file_index(path_dir_src, if_case_insensitive)?;
    builder_report.cnt_scanned = file_index.cnt_scanned();
    for spec_warning in file_index.warnings() {
        builder_report.add_warning(format!(
            "Failed to scan {} ({})",
            spec_warning.path.display(),
            spec_warning.message
        ));
    }

    let l_resolutions = resolve_targets(&names_target, &file_index, &name_transformer);

    if !spec_options.if_dry_run {
        fs::create_dir_all(path_dir_dst).map_err(|e| TransferError::DestinationInitFailed {
            path: path_dir_dst.to_path_buf(),
            message: e.to_string(),
        })?;
    }
    info!(
        "Will look for {} {} name(s). Copying into: {}",
        names_target.len(),
        name_transformer.suffix_target(),
        path_dir_dst.display()
    );
    copy_resolved_files(
        &l_resolutions,
        file_index.path_dir_root(),
        path_dir_dst,
        &spec_options,
        &mut builder_report,
    );

    let report = builder_report.build();
    if report.cnt_copied > 0 {
        info!(
            "Successfully copied {} file(s) to '{}'.",
            report.cnt_copied,
            path_dir_dst.display()
        );
    } else if report.cnt_skipped > 0 {
        info!("Dry run: {} file(s) would be copied.", report.cnt_skipped);
    } else {
        warn!("No matching files were found to copy.");
    }
    Ok(report)
}
