//! `axiomkit_io_transfer` v1:
//! Rust-side labeled-image transfer kernel.
//!
//! Reads the filenames referenced by a labeling export table, recovers the
//! original image names, finds them under a search root and copies them out.
//!
//! Modules, leaf-first:
//! - `conf`     : constants and default presets
//! - `spec`     : enums/options/errors
//! - `report`   : run-time report model
//! - `util`     : name normalization and copy helpers
//! - `table`    : filename extraction from delimited tables
//! - `naming`   : export-name → original-name heuristic
//! - `index`    : one-pass filesystem index
//! - `resolve`  : target name lookup with alternate-extension retry
//! - `copy`     : collision-safe copy engine
//! - `transfer` : end-to-end orchestration

pub mod conf;
pub mod copy;
pub mod index;
pub mod naming;
pub mod report;
pub mod resolve;
pub mod spec;
pub mod table;
pub mod transfer;
mod util;

pub use conf::{derive_default_name_heuristic, derive_default_transfer_options};
pub use copy::{copy_resolved_files, derive_available_path};
pub use index::{FileIndex, build_file_index};
pub use naming::{EnumNameRule, NameTransformer};
pub use report::{ReportTransfer, ReportTransferBuilder};
pub use resolve::{resolve_target, resolve_targets};
pub use spec::{
    EnumColumnSource, EnumResolveTier, SpecNameHeuristic, SpecResolution, SpecTableDialect,
    SpecTransferError, SpecTransferOptions, SpecTraversalWarning, TransferError,
};
pub use table::{
    SpecTableExtract, extract_filenames_from_table, infer_table_dialect,
    load_filenames_from_table, select_filename_column,
};
pub use transfer::find_and_copy_from_csv;
pub use util::{derive_basename, normalize_name, split_extension};
