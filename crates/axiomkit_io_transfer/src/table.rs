//! Filename extraction from delimited export tables.
//!
//! The dialect (delimiter + header presence) is inferred from a bounded head
//! sample. Inference is best-effort: when it cannot decide, the table is read
//! as comma-delimited with a header row.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use tracing::debug;

use crate::conf::{
    N_BYTES_TABLE_SAMPLE, N_ROWS_HEADER_PROBE_MAX, N_TABLE_DELIMITER_FALLBACK,
    TUP_COLUMN_FILENAME_LIKELY, TUP_TABLE_DELIMITER_CANDIDATES,
};
use crate::spec::{EnumColumnSource, SpecTableDialect, TransferError};
use crate::util::normalize_name;

/// Extraction result with the inference decisions that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTableExtract {
    /// Distinct normalized filenames.
    pub names: BTreeSet<String>,
    /// Dialect used to read the table.
    pub dialect: SpecTableDialect,
    /// Header of the selected column (`None` for headerless tables).
    pub column: Option<String>,
    /// How the column was selected.
    pub column_source: EnumColumnSource,
}

////////////////////////////////////////////////////////////////////////////////
// #region DialectInference

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumCellKind {
    Numeric,
    Length(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumColumnProbe {
    Unseen,
    Kind(EnumCellKind),
    Inconsistent,
}

fn _derive_cell_kind(cell: &str) -> EnumCellKind {
    if cell.trim().parse::<f64>().is_ok() {
        EnumCellKind::Numeric
    } else {
        EnumCellKind::Length(cell.chars().count())
    }
}

fn _parse_sample_records(sample: &str, delimiter: u8, n_records_max: usize) -> Vec<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(sample.as_bytes());

    reader
        .records()
        .take(n_records_max)
        .filter_map(|res| res.ok())
        .map(|record| record.iter().map(|v| v.to_string()).collect())
        .collect()
}

/// Pick the candidate that splits every sample row into the same number (> 1)
/// of fields, preferring more fields and then candidate order.
fn _infer_delimiter(sample: &str) -> Option<u8> {
    let mut best: Option<(u8, usize)> = None;
    for &delimiter in TUP_TABLE_DELIMITER_CANDIDATES.iter() {
        if !sample.as_bytes().contains(&delimiter) {
            continue;
        }
        let l_records = _parse_sample_records(sample, delimiter, usize::MAX);
        let Some(n_fields) = l_records.first().map(|r| r.len()) else {
            continue;
        };
        if n_fields < 2 || l_records.iter().any(|r| r.len() != n_fields) {
            continue;
        }
        if best.is_none_or(|(_, n_best)| n_fields > n_best) {
            best = Some((delimiter, n_fields));
        }
    }
    best.map(|(delimiter, _)| delimiter)
}

/// Vote per column: the first row is a header when its cells differ in kind
/// (numeric vs text, or text length) from the consistent kind of the rows below.
fn _infer_has_header(sample: &str, delimiter: u8) -> Option<bool> {
    let l_records = _parse_sample_records(sample, delimiter, N_ROWS_HEADER_PROBE_MAX + 1);
    let (header, l_rows) = l_records.split_first()?;

    let mut l_probes = vec![EnumColumnProbe::Unseen; header.len()];
    for row in l_rows.iter().filter(|r| r.len() == header.len()) {
        for (probe, cell) in l_probes.iter_mut().zip(row.iter()) {
            let kind = _derive_cell_kind(cell);
            *probe = match *probe {
                EnumColumnProbe::Unseen => EnumColumnProbe::Kind(kind),
                EnumColumnProbe::Kind(prev) if prev == kind => EnumColumnProbe::Kind(prev),
                _ => EnumColumnProbe::Inconsistent,
            };
        }
    }

    let mut n_votes: i64 = 0;
    for (probe, cell) in l_probes.iter().zip(header.iter()) {
        match probe {
            EnumColumnProbe::Unseen => n_votes += 1,
            EnumColumnProbe::Inconsistent => {}
            EnumColumnProbe::Kind(kind) => {
                if *kind == _derive_cell_kind(cell) {
                    n_votes -= 1;
                } else {
                    n_votes += 1;
                }
            }
        }
    }
    Some(n_votes > 0)
}

fn _is_likely_filename_label(value: &str) -> bool {
    TUP_COLUMN_FILENAME_LIKELY.contains(&value.to_lowercase().as_str())
}

fn _clean_header_cell(value: &str) -> String {
    value.trim_start_matches('\u{feff}').trim().to_string()
}

/// Infer delimiter and header presence from the head of a table.
///
/// A first row containing the filename label is always a header. Otherwise the
/// row-kind vote decides. Undecidable samples fall back to comma + header.
pub fn infer_table_dialect(sample: &str) -> SpecTableDialect {
    let delimiter = _infer_delimiter(sample).unwrap_or_else(|| {
        debug!("Delimiter inference failed; fallback to `,`");
        N_TABLE_DELIMITER_FALLBACK
    });

    let if_label_row = _parse_sample_records(sample, delimiter, 1)
        .first()
        .is_some_and(|row| {
            row.iter()
                .any(|cell| _is_likely_filename_label(&_clean_header_cell(cell)))
        });
    let if_has_header = if_label_row
        || _infer_has_header(sample, delimiter).unwrap_or_else(|| {
            debug!("Header inference failed; assume header row");
            true
        });

    SpecTableDialect {
        delimiter,
        if_has_header,
    }
}

fn _read_table_sample(path_table: &Path) -> Result<String, TransferError> {
    let file = File::open(path_table).map_err(|e| TransferError::TableRead {
        path: path_table.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut raw_sample = Vec::with_capacity(N_BYTES_TABLE_SAMPLE);
    file.take(N_BYTES_TABLE_SAMPLE as u64)
        .read_to_end(&mut raw_sample)
        .map_err(|e| TransferError::TableRead {
            path: path_table.to_path_buf(),
            message: e.to_string(),
        })?;

    // Drop a row cut off by the sample limit.
    if raw_sample.len() == N_BYTES_TABLE_SAMPLE
        && let Some(idx) = raw_sample.iter().rposition(|&b| b == b'\n')
    {
        raw_sample.truncate(idx + 1);
    }
    Ok(String::from_utf8_lossy(&raw_sample).into_owned())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnSelection

/// Choose the filename column among (already trimmed) headers.
///
/// Order: configured name, first likely filename label, first column.
/// Returns `None` only when there are no headers at all.
pub fn select_filename_column(
    headers: &[String],
    column: Option<&str>,
) -> Option<(usize, EnumColumnSource)> {
    if headers.is_empty() {
        return None;
    }
    if let Some(column) = column
        && let Some(idx) = headers.iter().position(|h| h == column)
    {
        return Some((idx, EnumColumnSource::Configured));
    }
    if let Some(idx) = headers.iter().position(|h| _is_likely_filename_label(h)) {
        return Some((idx, EnumColumnSource::LikelyLabel));
    }
    Some((0, EnumColumnSource::FirstColumn))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Extraction

/// Read the table at `path_table` and collect normalized filenames.
pub fn extract_filenames_from_table(
    path_table: &Path,
    column: Option<&str>,
    if_case_insensitive: bool,
) -> Result<SpecTableExtract, TransferError> {
    let sample = _read_table_sample(path_table)?;
    let dialect = infer_table_dialect(&sample);
    debug!(
        "Table dialect: delimiter={:?} header={}",
        dialect.delimiter as char, dialect.if_has_header
    );

    let map_read_err = |e: csv::Error| TransferError::TableRead {
        path: path_table.to_path_buf(),
        message: e.to_string(),
    };
    let file = File::open(path_table).map_err(|e| TransferError::TableRead {
        path: path_table.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut reader = ReaderBuilder::new()
        .delimiter(dialect.delimiter)
        .has_headers(dialect.if_has_header)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let (idx_column, column_name, column_source) = if dialect.if_has_header {
        let headers: Vec<String> = reader
            .byte_headers()
            .map_err(map_read_err)?
            .iter()
            .map(|v| _clean_header_cell(&String::from_utf8_lossy(v)))
            .collect();
        let (idx, column_source) = select_filename_column(&headers, column).ok_or_else(|| {
            TransferError::Configuration(format!(
                "table has no columns: {}",
                path_table.display()
            ))
        })?;
        (idx, Some(headers[idx].clone()), column_source)
    } else {
        (0, None, EnumColumnSource::Headerless)
    };
    debug!("Filename column: {column_name:?} (index={idx_column}, via {column_source:?})");

    let mut names = BTreeSet::new();
    let mut record = ByteRecord::new();
    while reader.read_byte_record(&mut record).map_err(map_read_err)? {
        let Some(raw) = record.get(idx_column) else {
            continue;
        };
        let raw = String::from_utf8_lossy(raw);
        if raw.trim().is_empty() {
            continue;
        }
        let name = normalize_name(&raw, if_case_insensitive);
        if !name.is_empty() {
            names.insert(name);
        }
    }

    Ok(SpecTableExtract {
        names,
        dialect,
        column: column_name,
        column_source,
    })
}

/// Read the table at `path_table` and return its distinct normalized filenames.
pub fn load_filenames_from_table(
    path_table: &Path,
    column: Option<&str>,
    if_case_insensitive: bool,
) -> Result<BTreeSet<String>, TransferError> {
    extract_filenames_from_table(path_table, column, if_case_insensitive).map(|v| v.names)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
