use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::conf::TUP_NAME_QUOTE_CHARS;

////////////////////////////////////////////////////////////////////////////////
// #region NameUtilities

fn _is_trim_char(c: char) -> bool {
    c.is_whitespace() || TUP_NAME_QUOTE_CHARS.contains(&c)
}

/// Final path segment of `value`, accepting both `/` and `\` separators.
pub fn derive_basename(value: &str) -> &str {
    match value.rfind(['/', '\\']) {
        Some(idx) => &value[idx + 1..],
        None => value,
    }
}

/// Canonicalize one raw filename.
///
/// Surrounding whitespace and quotes are stripped, any directory prefix is
/// dropped, and the result is lowercased when `if_case_insensitive` is set.
/// The result may be empty; callers must not use an empty name as a key.
///
/// # Examples
/// ```
/// use axiomkit_io_transfer::normalize_name;
///
/// assert_eq!(normalize_name("  \"C:\\exports\\IMG_01.jpg\" ", true), "img_01.jpg");
/// assert_eq!(normalize_name("train/IMG_01.jpg", false), "IMG_01.jpg");
/// ```
pub fn normalize_name(raw: &str, if_case_insensitive: bool) -> String {
    let c_name = derive_basename(raw.trim_matches(_is_trim_char)).trim_matches(_is_trim_char);
    if if_case_insensitive {
        c_name.to_lowercase()
    } else {
        c_name.to_string()
    }
}

/// Split `name` into `(stem, extension)` where extension keeps its dot.
///
/// Leading dots never start an extension (`.hidden` has none).
pub fn split_extension(name: &str) -> (&str, &str) {
    let Some(idx) = name.rfind('.') else {
        return (name, "");
    };
    if name[..idx].chars().all(|c| c == '.') {
        return (name, "");
    }
    name.split_at(idx)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PathUtilities

fn _absolutize_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

/// Whether both paths name the same existing file (after resolving symlinks,
/// or sharing an inode on Unix). Missing paths are never the same file.
pub(crate) fn is_same_file(path_a: &Path, path_b: &Path) -> bool {
    let (Ok(path_a_resolved), Ok(path_b_resolved)) =
        (fs::canonicalize(path_a), fs::canonicalize(path_b))
    else {
        return false;
    };
    if path_a_resolved == path_b_resolved {
        return true;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;

        if let (Ok(meta_a), Ok(meta_b)) = (fs::metadata(path_a), fs::metadata(path_b)) {
            return meta_a.dev() == meta_b.dev() && meta_a.ino() == meta_b.ino();
        }
    }
    false
}

/// Derive the directory a source file lands in.
///
/// # Arguments
/// - `path_file_src`: Indexed source file.
/// - `path_dir_src`: Search root the index was built from.
/// - `path_dir_dst`: Destination root.
/// - `if_keep_tree`:
///   - `true`: Mirror the source parent relative to `path_dir_src`.
///   - `false`: Use `path_dir_dst` itself.
pub(crate) fn derive_destination_dir(
    path_file_src: &Path,
    path_dir_src: &Path,
    path_dir_dst: &Path,
    if_keep_tree: bool,
) -> PathBuf {
    if !if_keep_tree {
        return path_dir_dst.to_path_buf();
    }
    match path_file_src
        .parent()
        .and_then(|p| p.strip_prefix(path_dir_src).ok())
    {
        Some(path_rel) => path_dir_dst.join(path_rel),
        None => path_dir_dst.to_path_buf(),
    }
}

pub(crate) fn validate_destination_path_safety(
    path_dst_item: &Path,
    path_dir_dst_root: &Path,
) -> Result<(), String> {
    let path_dir_dst_root_abs = _absolutize_path(path_dir_dst_root);
    let path_dst_item_abs = _absolutize_path(path_dst_item);

    let path_parent_rel = path_dst_item_abs
        .parent()
        .and_then(|p| p.strip_prefix(&path_dir_dst_root_abs).ok())
        .ok_or_else(|| {
            format!(
                "Unsafe destination path escapes destination root: {} (root={})",
                path_dst_item.display(),
                path_dir_dst_root.display()
            )
        })?;

    let mut path_cursor = path_dir_dst_root_abs.clone();
    for part_rel in path_parent_rel.components() {
        path_cursor.push(part_rel.as_os_str());
        match fs::symlink_metadata(&path_cursor) {
            Ok(meta_cursor) if meta_cursor.file_type().is_symlink() => {
                return Err(format!(
                    "Unsafe destination path traverses symlink component: {}",
                    path_cursor.display()
                ));
            }
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(format!(
                    "Failed to inspect destination path component {} ({e})",
                    path_cursor.display()
                ));
            }
        }
    }

    match fs::symlink_metadata(&path_dst_item_abs) {
        Ok(meta_dst_item) if meta_dst_item.file_type().is_symlink() => Err(format!(
            "Unsafe destination path is an existing symlink: {}",
            path_dst_item.display()
        )),
        Ok(meta_dst_item) if meta_dst_item.is_dir() => Err(format!(
            "Destination is a directory: {}",
            path_dst_item.display()
        )),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(format!(
            "Failed to inspect destination path {} ({e})",
            path_dst_item.display()
        )),
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FileCopy

/// Copy bytes, permissions and timestamps (plus xattrs on Linux).
pub(crate) fn copy_file_with_metadata(
    path_file_src: &Path,
    path_file_dst: &Path,
) -> Result<(), io::Error> {
    use filetime::{FileTime, set_file_times};

    fs::copy(path_file_src, path_file_dst)?;

    let stat_src = fs::metadata(path_file_src)?;
    fs::set_permissions(path_file_dst, stat_src.permissions())?;
    let file_time_access = FileTime::from_last_access_time(&stat_src);
    let file_time_modify = FileTime::from_last_modification_time(&stat_src);
    set_file_times(path_file_dst, file_time_access, file_time_modify)?;

    #[cfg(target_os = "linux")]
    {
        copy_xattrs_linux(path_file_src, path_file_dst);
    }
    Ok(())
}

#[cfg(target_os = "linux")]
fn copy_xattrs_linux(path_file_src: &Path, path_file_dst: &Path) {
    let iter_xattr_names = match xattr::list(path_file_src) {
        Ok(v) => v,
        Err(_) => return,
    };

    for name in iter_xattr_names {
        let Some(raw_value) = xattr::get(path_file_src, &name).ok().flatten() else {
            continue;
        };
        let _ = xattr::set(path_file_dst, &name, &raw_value);
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
pub(crate) mod testing {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static N_TEST_DIR_SEQ: AtomicU64 = AtomicU64::new(0);

    pub(crate) struct TestDir {
        path: PathBuf,
    }

    impl TestDir {
        pub(crate) fn new() -> Self {
            let n = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos();
            let n_seq = N_TEST_DIR_SEQ.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "axiomkit_transfer_test_{}_{n}_{n_seq}",
                std::process::id()
            ));
            std::fs::create_dir_all(&path).expect("create test dir");
            Self { path }
        }

        pub(crate) fn path(&self) -> &Path {
            &self.path
        }
    }

    impl Drop for TestDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    pub(crate) fn write_text(path: &Path, txt: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, txt).expect("write text");
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::testing::{TestDir, write_text};
    use super::{
        copy_file_with_metadata, derive_destination_dir, is_same_file, normalize_name,
        split_extension, validate_destination_path_safety,
    };

    #[test]
    fn normalize_name_strips_quotes_dirs_and_case() {
        assert_eq!(normalize_name("  'photo.JPG'  ", true), "photo.jpg");
        assert_eq!(normalize_name("\"train/sub/Photo.jpg\"", false), "Photo.jpg");
        assert_eq!(normalize_name(r"C:\Users\x\IMG.jpg", true), "img.jpg");
        assert_eq!(normalize_name("   ", true), "");
        assert_eq!(normalize_name("dir/", true), "");
    }

    #[test]
    fn normalize_name_is_idempotent() {
        let l_raw = [
            "  \"a/b/C.jpg\"  ",
            "'\"x.png\"'",
            "dir/ \"q.tif\" ",
            r"\\share\Img_01.JPG",
            "plain",
            "",
            "\"\"",
        ];
        for raw in l_raw {
            for if_case_insensitive in [true, false] {
                let once = normalize_name(raw, if_case_insensitive);
                let twice = normalize_name(&once, if_case_insensitive);
                assert_eq!(once, twice, "raw={raw:?}");
            }
        }
    }

    #[test]
    fn split_extension_handles_leading_dots() {
        assert_eq!(split_extension("a.b.tif"), ("a.b", ".tif"));
        assert_eq!(split_extension("noext"), ("noext", ""));
        assert_eq!(split_extension(".hidden"), (".hidden", ""));
        assert_eq!(split_extension("..x.png"), ("..x", ".png"));
    }

    #[test]
    fn derive_destination_dir_keep_tree_and_flat() {
        let src = Path::new("/search/a/b/img.tif");
        let root = Path::new("/search");
        let dst = Path::new("/out");
        assert_eq!(
            derive_destination_dir(src, root, dst, true),
            Path::new("/out/a/b")
        );
        assert_eq!(derive_destination_dir(src, root, dst, false), Path::new("/out"));
        assert_eq!(
            derive_destination_dir(Path::new("/search/img.tif"), root, dst, true),
            Path::new("/out")
        );
    }

    #[test]
    fn is_same_file_detects_identical_paths() {
        let tmp = TestDir::new();
        let path_file = tmp.path().join("a/img.tif");
        write_text(&path_file, "x");
        write_text(&tmp.path().join("b/img.tif"), "x");

        assert!(is_same_file(&path_file, &tmp.path().join("a/../a/img.tif")));
        assert!(!is_same_file(&path_file, &tmp.path().join("b/img.tif")));
        assert!(!is_same_file(&path_file, &tmp.path().join("missing.tif")));
    }

    #[cfg(unix)]
    #[test]
    fn is_same_file_sees_through_links() {
        use std::os::unix::fs::symlink;

        let tmp = TestDir::new();
        let path_file = tmp.path().join("img.tif");
        write_text(&path_file, "x");
        symlink(&path_file, tmp.path().join("soft.tif")).expect("create symlink");
        std::fs::hard_link(&path_file, tmp.path().join("hard.tif")).expect("create hard link");

        assert!(is_same_file(&path_file, &tmp.path().join("soft.tif")));
        assert!(is_same_file(&path_file, &tmp.path().join("hard.tif")));
    }

    #[cfg(unix)]
    #[test]
    fn validate_destination_path_safety_rejects_symlink_component() {
        use std::os::unix::fs::symlink;

        let tmp = TestDir::new();
        let dst = tmp.path().join("dst");
        let outside = tmp.path().join("outside");
        std::fs::create_dir_all(&dst).expect("create dst");
        std::fs::create_dir_all(&outside).expect("create outside");
        symlink(&outside, dst.join("escape")).expect("create escape symlink");

        assert!(validate_destination_path_safety(&dst.join("escape/a.tif"), &dst).is_err());
        assert!(validate_destination_path_safety(&dst.join("ok/a.tif"), &dst).is_ok());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn copy_file_with_metadata_preserves_mode_and_mtime() {
        use filetime::{FileTime, set_file_times};
        use std::os::unix::fs::PermissionsExt;

        let tmp = TestDir::new();
        let path_file_src = tmp.path().join("src/meta.tif");
        let path_file_dst = tmp.path().join("meta.tif");
        write_text(&path_file_src, "meta");

        std::fs::set_permissions(&path_file_src, std::fs::Permissions::from_mode(0o640))
            .expect("set permissions");
        set_file_times(
            &path_file_src,
            FileTime::from_unix_time(1_700_000_010, 0),
            FileTime::from_unix_time(1_700_000_020, 0),
        )
        .expect("set times");

        let c_xattr_name = "user.axiomkit_transfer_test";
        let b_if_has_xattr = xattr::set(&path_file_src, c_xattr_name, b"meta_value").is_ok();

        copy_file_with_metadata(&path_file_src, &path_file_dst).expect("copy");

        let stat_src = std::fs::metadata(&path_file_src).expect("src metadata");
        let stat_dst = std::fs::metadata(&path_file_dst).expect("dst metadata");
        assert_eq!(
            stat_src.permissions().mode() & 0o777,
            stat_dst.permissions().mode() & 0o777
        );
        assert_eq!(
            FileTime::from_last_modification_time(&stat_src),
            FileTime::from_last_modification_time(&stat_dst)
        );
        if b_if_has_xattr {
            let raw_value_dst = xattr::get(&path_file_dst, c_xattr_name)
                .expect("get dst xattr")
                .expect("xattr exists");
            assert_eq!(raw_value_dst, b"meta_value");
        }
    }
}
