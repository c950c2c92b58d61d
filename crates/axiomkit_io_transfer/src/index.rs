//! One-pass filesystem index keyed by normalized basename.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::spec::{SpecTraversalWarning, TransferError};
use crate::util::normalize_name;

/// Normalized basename → every file under the root carrying that name.
///
/// Built once by [`build_file_index`] and read-only afterwards. Paths under one
/// key keep traversal order (directory entries sorted by name).
#[derive(Debug, Clone)]
pub struct FileIndex {
    path_dir_root: PathBuf,
    dict_paths: HashMap<String, Vec<PathBuf>>,
    cnt_scanned: u64,
    warnings: Vec<SpecTraversalWarning>,
}

impl FileIndex {
    /// Root directory the index was built from.
    pub fn path_dir_root(&self) -> &Path {
        &self.path_dir_root
    }

    /// All paths stored under `key` (empty when absent).
    pub fn get(&self, key: &str) -> &[PathBuf] {
        self.dict_paths.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.dict_paths.len()
    }

    /// Whether no file was indexed.
    pub fn is_empty(&self) -> bool {
        self.dict_paths.is_empty()
    }

    /// Number of files indexed.
    pub fn cnt_scanned(&self) -> u64 {
        self.cnt_scanned
    }

    /// Traversal failures below the root that were skipped.
    pub fn warnings(&self) -> &[SpecTraversalWarning] {
        &self.warnings
    }

    /// Iterate `(key, paths)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PathBuf])> {
        self.dict_paths
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

fn _map_root_err(path_dir_root: &Path, message: String) -> TransferError {
    TransferError::RootAccess {
        path: path_dir_root.to_path_buf(),
        message,
    }
}

fn _is_indexable(entry: &walkdir::DirEntry) -> bool {
    let file_type = entry.file_type();
    file_type.is_file() || (file_type.is_symlink() && entry.path().is_file())
}

/// Walk `path_dir_root` once and index every regular file.
///
/// Symlinks to regular files are indexed; symlinked directories are not
/// descended. An unreadable or non-directory root fails with
/// [`TransferError::RootAccess`]. Failures below the root are recorded as
/// warnings and their subtree is skipped.
pub fn build_file_index<P>(
    path_dir_root: P,
    if_case_insensitive: bool,
) -> Result<FileIndex, TransferError>
where
    P: AsRef<Path>,
{
    let path_dir_root = path_dir_root.as_ref();
    let meta_root =
        fs::metadata(path_dir_root).map_err(|e| _map_root_err(path_dir_root, e.to_string()))?;
    if !meta_root.is_dir() {
        return Err(_map_root_err(
            path_dir_root,
            "not a directory".to_string(),
        ));
    }
    fs::read_dir(path_dir_root).map_err(|e| _map_root_err(path_dir_root, e.to_string()))?;

    let mut dict_paths: HashMap<String, Vec<PathBuf>> = HashMap::new();
    let mut cnt_scanned = 0_u64;
    let mut warnings = Vec::new();

    for entry_res in WalkDir::new(path_dir_root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = match entry_res {
            Ok(v) => v,
            Err(e) if e.depth() == 0 => {
                return Err(_map_root_err(path_dir_root, e.to_string()));
            }
            Err(e) => {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| path_dir_root.to_path_buf());
                warn!("Skipped during scan: {} ({e})", path.display());
                warnings.push(SpecTraversalWarning {
                    path,
                    message: e.to_string(),
                });
                continue;
            }
        };
        if entry.depth() == 0 || !_is_indexable(&entry) {
            continue;
        }

        let key = normalize_name(&entry.file_name().to_string_lossy(), if_case_insensitive);
        if key.is_empty() {
            continue;
        }
        cnt_scanned += 1;
        dict_paths
            .entry(key)
            .or_default()
            .push(entry.into_path());
    }
    debug!(
        "Indexed {cnt_scanned} file(s) under {} ({} distinct names)",
        path_dir_root.display(),
        dict_paths.len()
    );

    Ok(FileIndex {
        path_dir_root: path_dir_root.to_path_buf(),
        dict_paths,
        cnt_scanned,
        warnings,
    })
}
