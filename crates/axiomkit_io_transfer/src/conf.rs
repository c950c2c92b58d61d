//! Transfer constants and default preset factories.

use crate::spec::{SpecNameHeuristic, SpecTransferOptions};

/// Canonical extension every transformed target name ends with.
pub const C_EXT_TARGET_DEFAULT: &str = "tif";
/// Alternate spelling of the target extension tried once by the resolver.
pub const C_EXT_TARGET_ALTERNATE_DEFAULT: &str = "tiff";
/// Literal token the labeling export inserts between the image extension and hash.
pub const C_EXPORT_MARKER_DEFAULT: &str = "rf";
/// Raster extensions recognized inside the export suffix `_<ext>.<marker>.`.
pub const TUP_EXT_RASTER_DEFAULT: [&str; 5] = ["jpg", "jpeg", "png", "tif", "tiff"];
/// Extension whose first occurrence splits the stem when no export suffix exists.
pub const C_EXT_LEGACY_DEFAULT: &str = "jpg";

/// Header labels (lowercase) treated as "the filename column".
pub const TUP_COLUMN_FILENAME_LIKELY: [&str; 1] = ["filename"];
/// Bytes read from the table head for dialect/header inference.
pub const N_BYTES_TABLE_SAMPLE: usize = 4096;
/// Maximum rows compared against the first row for header inference.
pub const N_ROWS_HEADER_PROBE_MAX: usize = 20;
/// Delimiters considered during dialect inference, in preference order.
pub const TUP_TABLE_DELIMITER_CANDIDATES: [u8; 4] = [b',', b'\t', b';', b'|'];
/// Delimiter used when inference fails.
pub const N_TABLE_DELIMITER_FALLBACK: u8 = b',';

/// Characters stripped from both ends of a raw filename cell.
pub const TUP_NAME_QUOTE_CHARS: [char; 2] = ['"', '\''];

/// Build the default export-name heuristic.
pub fn derive_default_name_heuristic() -> SpecNameHeuristic {
    SpecNameHeuristic {
        ext_target: C_EXT_TARGET_DEFAULT.to_string(),
        ext_target_alternate: Some(C_EXT_TARGET_ALTERNATE_DEFAULT.to_string()),
        export_marker: C_EXPORT_MARKER_DEFAULT.to_string(),
        exts_raster: TUP_EXT_RASTER_DEFAULT
            .iter()
            .map(|v| v.to_string())
            .collect(),
        ext_legacy: Some(C_EXT_LEGACY_DEFAULT.to_string()),
    }
}

/// Build default transfer options.
pub fn derive_default_transfer_options() -> SpecTransferOptions {
    SpecTransferOptions::default()
}
