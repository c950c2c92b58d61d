use std::collections::BTreeMap;

use axiomkit_io_transfer::{
    ReportTransfer, SpecNameHeuristic, SpecTransferError, SpecTransferOptions, TransferError,
    find_and_copy_from_csv, normalize_name,
};
use pyo3::exceptions::{PyNotADirectoryError, PyOSError, PyValueError};
use pyo3::prelude::*;

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "axiomkit.io.transfer.find_and_copy_from_csv.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

#[pyclass(name = "SpecTransferError")]
#[derive(Debug, Clone)]
struct PySpecTransferError {
    #[pyo3(get)]
    path: String,
    #[pyo3(get)]
    exception: String,
}

impl From<SpecTransferError> for PySpecTransferError {
    fn from(spec_error: SpecTransferError) -> Self {
        Self {
            path: spec_error.path.to_string_lossy().to_string(),
            exception: spec_error.exception,
        }
    }
}

#[pyclass(name = "ReportTransfer")]
#[derive(Debug, Clone)]
struct PyReportTransfer {
    inner: ReportTransfer,
    #[pyo3(get)]
    names_unresolved: Vec<String>,
    #[pyo3(get)]
    warnings: Vec<String>,
    #[pyo3(get)]
    errors: Vec<PySpecTransferError>,
}

impl From<ReportTransfer> for PyReportTransfer {
    fn from(report_transfer: ReportTransfer) -> Self {
        Self {
            names_unresolved: report_transfer.names_unresolved.clone(),
            warnings: report_transfer.warnings.clone(),
            errors: report_transfer
                .errors
                .iter()
                .cloned()
                .map(PySpecTransferError::from)
                .collect(),
            inner: report_transfer,
        }
    }
}

#[pymethods]
impl PyReportTransfer {
    #[getter]
    fn cnt_targets(&self) -> u64 {
        self.inner.cnt_targets
    }

    #[getter]
    fn cnt_scanned(&self) -> u64 {
        self.inner.cnt_scanned
    }

    #[getter]
    fn cnt_resolved(&self) -> u64 {
        self.inner.cnt_resolved
    }

    #[getter]
    fn cnt_unresolved(&self) -> u64 {
        self.inner.cnt_unresolved
    }

    #[getter]
    fn cnt_copied(&self) -> u64 {
        self.inner.cnt_copied
    }

    #[getter]
    fn cnt_skipped(&self) -> u64 {
        self.inner.cnt_skipped
    }

    #[getter]
    fn error_count(&self) -> usize {
        self.inner.error_count()
    }

    #[getter]
    fn warning_count(&self) -> usize {
        self.inner.warning_count()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.inner.to_dict()
    }

    #[pyo3(signature = (prefix = "[TRANSFER]"))]
    fn format(&self, prefix: &str) -> String {
        self.inner.format(prefix)
    }

    fn __str__(&self) -> String {
        self.inner.to_string()
    }
}

fn map_transfer_error(exception: TransferError) -> PyErr {
    match exception {
        TransferError::Configuration(_) | TransferError::InvalidHeuristic(_) => {
            PyValueError::new_err(exception.to_string())
        }
        TransferError::RootAccess { .. } => PyNotADirectoryError::new_err(exception.to_string()),
        TransferError::TableRead { .. } | TransferError::DestinationInitFailed { .. } => {
            PyOSError::new_err(exception.to_string())
        }
    }
}

#[pyfunction(name = "find_and_copy_from_csv")]
#[pyo3(signature = (
    csv_path,
    search_path,
    destination_path,
    column = None,
    case_insensitive = true,
    overwrite = false,
    keep_dir_structure = false,
    dry_run = false,
    ext_target = None,
    ext_target_alternate = None,
    export_marker = None,
    exts_raster = None,
    ext_legacy = None
))]
#[allow(clippy::too_many_arguments)]
fn find_and_copy_from_csv_py(
    py: Python<'_>,
    csv_path: String,
    search_path: String,
    destination_path: String,
    column: Option<String>,
    case_insensitive: bool,
    overwrite: bool,
    keep_dir_structure: bool,
    dry_run: bool,
    ext_target: Option<String>,
    ext_target_alternate: Option<String>,
    export_marker: Option<String>,
    exts_raster: Option<Vec<String>>,
    ext_legacy: Option<String>,
) -> PyResult<PyReportTransfer> {
    let spec_default = SpecNameHeuristic::default();
    let spec_name_heuristic = SpecNameHeuristic {
        ext_target: ext_target.unwrap_or(spec_default.ext_target),
        ext_target_alternate: ext_target_alternate.or(spec_default.ext_target_alternate),
        export_marker: export_marker.unwrap_or(spec_default.export_marker),
        exts_raster: exts_raster.unwrap_or(spec_default.exts_raster),
        ext_legacy: ext_legacy.or(spec_default.ext_legacy),
    };
    let spec_options = SpecTransferOptions {
        column,
        if_case_insensitive: case_insensitive,
        if_overwrite: overwrite,
        if_keep_tree: keep_dir_structure,
        if_dry_run: dry_run,
        spec_name_heuristic,
    };

    let report_transfer = py.allow_threads(|| {
        find_and_copy_from_csv(csv_path, search_path, destination_path, spec_options)
    });
    let report_transfer = report_transfer.map_err(map_transfer_error)?;
    Ok(PyReportTransfer::from(report_transfer))
}

#[pyfunction(name = "normalize_name")]
#[pyo3(signature = (name, case_insensitive = true))]
fn normalize_name_py(name: &str, case_insensitive: bool) -> String {
    normalize_name(name, case_insensitive)
}

#[pymodule]
fn _axiomkit_io_transfer_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PySpecTransferError>()?;
    module.add_class::<PyReportTransfer>()?;
    module.add_function(wrap_pyfunction!(find_and_copy_from_csv_py, module)?)?;
    module.add_function(wrap_pyfunction!(normalize_name_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}
