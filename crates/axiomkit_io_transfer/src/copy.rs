//! Copy of resolved candidates into the destination tree.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::report::ReportTransferBuilder;
use crate::spec::{SpecResolution, SpecTransferOptions};
use crate::util::{
    copy_file_with_metadata, derive_destination_dir, is_same_file, split_extension,
    validate_destination_path_safety,
};

#[derive(Debug)]
struct SpecCopyContext<'a> {
    path_dir_src: &'a Path,
    path_dir_dst: &'a Path,
    spec_options: &'a SpecTransferOptions,
    builder_report: &'a mut ReportTransferBuilder,
    set_claimed_dst: HashSet<PathBuf>,
}

impl SpecCopyContext<'_> {
    fn is_taken(&self, path: &Path) -> bool {
        self.set_claimed_dst.contains(path) || fs::symlink_metadata(path).is_ok()
    }
}

fn _derive_available_path_with<F>(path_file_dst: &Path, is_taken: F) -> PathBuf
where
    F: Fn(&Path) -> bool,
{
    if !is_taken(path_file_dst) {
        return path_file_dst.to_path_buf();
    }
    let c_name = path_file_dst
        .file_name()
        .map(|v| v.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (stem, ext) = split_extension(&c_name);
    let path_dir = path_file_dst.parent().unwrap_or(Path::new(""));

    let mut n = 1_u64;
    loop {
        let path_candidate = path_dir.join(format!("{stem}_{n}{ext}"));
        if !is_taken(&path_candidate) {
            return path_candidate;
        }
        n += 1;
    }
}

/// First free variant of `path_file_dst`: itself, else `<stem>_<n><ext>` for
/// n = 1, 2, ….
pub fn derive_available_path(path_file_dst: &Path) -> PathBuf {
    _derive_available_path_with(path_file_dst, |p| fs::symlink_metadata(p).is_ok())
}

/// Copy every candidate of every resolution into `path_dir_dst`.
///
/// Unresolved targets are reported and skipped. A failing candidate is
/// recorded in the report and does not stop the batch. The destination root
/// must already exist unless `if_dry_run` is set.
///
/// Collision suffixes are assigned in candidate order, so candidates are
/// processed strictly one after another.
pub fn copy_resolved_files(
    l_resolutions: &[SpecResolution],
    path_dir_src: &Path,
    path_dir_dst: &Path,
    spec_options: &SpecTransferOptions,
    builder_report: &mut ReportTransferBuilder,
) {
    let mut spec_cp_ctx = SpecCopyContext {
        path_dir_src,
        path_dir_dst,
        spec_options,
        builder_report,
        set_claimed_dst: HashSet::new(),
    };

    for spec_resolution in l_resolutions {
        if spec_resolution.is_unresolved() {
            warn!("Not found: {}", spec_resolution.name_target);
            spec_cp_ctx
                .builder_report
                .add_unresolved(spec_resolution.name_target.clone());
            continue;
        }
        spec_cp_ctx.builder_report.add_resolved();
        for path_file_src in &spec_resolution.paths_src {
            handle_candidate(path_file_src, &mut spec_cp_ctx);
        }
    }
}

fn handle_candidate(path_file_src: &Path, spec_cp_ctx: &mut SpecCopyContext<'_>) {
    let Some(name_file) = path_file_src.file_name() else {
        spec_cp_ctx.builder_report.add_error(
            path_file_src.to_path_buf(),
            format!("Source has no file name: {}", path_file_src.display()),
        );
        return;
    };

    let path_dir_dst_sub = derive_destination_dir(
        path_file_src,
        spec_cp_ctx.path_dir_src,
        spec_cp_ctx.path_dir_dst,
        spec_cp_ctx.spec_options.if_keep_tree,
    );
    let path_file_proposed = path_dir_dst_sub.join(name_file);
    let path_file_dst = if spec_cp_ctx.spec_options.if_overwrite {
        path_file_proposed
    } else {
        _derive_available_path_with(&path_file_proposed, |p| spec_cp_ctx.is_taken(p))
    };

    if let Err(message) = validate_destination_path_safety(&path_file_dst, spec_cp_ctx.path_dir_dst)
    {
        error!("Error copying '{}': {message}", path_file_src.display());
        spec_cp_ctx.builder_report.add_error(path_file_dst, message);
        return;
    }

    // Only reachable with overwrite, when an earlier copy was indexed.
    if is_same_file(path_file_src, &path_file_dst) {
        let message = format!(
            "Source and destination are the same file: {}",
            path_file_dst.display()
        );
        error!("Error copying '{}': {message}", path_file_src.display());
        spec_cp_ctx
            .builder_report
            .add_error(path_file_src.to_path_buf(), message);
        return;
    }

    if spec_cp_ctx.spec_options.if_dry_run {
        info!(
            "Would copy '{}' -> '{}'",
            path_file_src.display(),
            path_file_dst.display()
        );
        spec_cp_ctx.builder_report.add_skipped();
        spec_cp_ctx.set_claimed_dst.insert(path_file_dst);
        return;
    }

    if let Err(e) = fs::create_dir_all(&path_dir_dst_sub) {
        error!(
            "Error creating '{}': {e}",
            path_dir_dst_sub.display()
        );
        spec_cp_ctx
            .builder_report
            .add_error(path_dir_dst_sub, e.to_string());
        return;
    }

    match copy_file_with_metadata(path_file_src, &path_file_dst) {
        Ok(_) => {
            info!(
                "Copied '{}' -> '{}'",
                path_file_src.display(),
                path_file_dst.display()
            );
            spec_cp_ctx.builder_report.add_copied();
        }
        Err(e) => {
            error!("Error copying '{}': {e}", path_file_src.display());
            spec_cp_ctx
                .builder_report
                .add_error(path_file_src.to_path_buf(), e.to_string());
        }
    }
    spec_cp_ctx.set_claimed_dst.insert(path_file_dst);
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use super::{copy_resolved_files, derive_available_path};
    use crate::report::{ReportTransfer, ReportTransferBuilder};
    use crate::spec::{EnumResolveTier, SpecResolution, SpecTransferOptions};
    use crate::util::testing::{TestDir, write_text};

    fn resolution(name_target: &str, paths_src: Vec<PathBuf>) -> SpecResolution {
        let tier = if paths_src.is_empty() {
            EnumResolveTier::Unresolved
        } else {
            EnumResolveTier::Direct
        };
        SpecResolution {
            name_target: name_target.to_string(),
            name_matched: (!paths_src.is_empty()).then(|| name_target.to_string()),
            tier,
            paths_src,
        }
    }

    fn run(
        l_resolutions: &[SpecResolution],
        src: &Path,
        dst: &Path,
        spec_options: &SpecTransferOptions,
    ) -> ReportTransfer {
        std::fs::create_dir_all(dst).expect("create dst");
        let mut builder_report = ReportTransferBuilder::default();
        copy_resolved_files(l_resolutions, src, dst, spec_options, &mut builder_report);
        builder_report.build()
    }

    #[test]
    fn derive_available_path_picks_first_free_suffix() {
        let tmp = TestDir::new();
        let path_file = tmp.path().join("img.tif");
        assert_eq!(derive_available_path(&path_file), path_file);

        write_text(&path_file, "0");
        write_text(&tmp.path().join("img_1.tif"), "1");
        write_text(&tmp.path().join("img_3.tif"), "3");
        assert_eq!(derive_available_path(&path_file), tmp.path().join("img_2.tif"));

        write_text(&tmp.path().join("noext"), "n");
        assert_eq!(
            derive_available_path(&tmp.path().join("noext")),
            tmp.path().join("noext_1")
        );
    }

    #[test]
    fn collision_suffixes_without_touching_existing_file() {
        let tmp = TestDir::new();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("img.tif"), "new");
        write_text(&dst.join("img.tif"), "original");

        let report = run(
            &[resolution("img.tif", vec![src.join("img.tif")])],
            &src,
            &dst,
            &SpecTransferOptions::default(),
        );
        assert_eq!(report.cnt_copied, 1);
        assert_eq!(
            std::fs::read_to_string(dst.join("img.tif")).expect("read"),
            "original"
        );
        assert_eq!(
            std::fs::read_to_string(dst.join("img_1.tif")).expect("read"),
            "new"
        );
    }

    #[test]
    fn overwrite_replaces_existing_file() {
        let tmp = TestDir::new();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("img.tif"), "new");
        write_text(&dst.join("img.tif"), "original");

        let spec_options = SpecTransferOptions {
            if_overwrite: true,
            ..SpecTransferOptions::default()
        };
        let report = run(
            &[resolution("img.tif", vec![src.join("img.tif")])],
            &src,
            &dst,
            &spec_options,
        );
        assert_eq!(report.cnt_copied, 1);
        assert_eq!(std::fs::read_to_string(dst.join("img.tif")).expect("read"), "new");
        assert!(!dst.join("img_1.tif").exists());
    }

    #[test]
    fn overwrite_onto_itself_is_an_error_and_keeps_data() {
        let tmp = TestDir::new();
        let dst = tmp.path().join("dst");
        write_text(&dst.join("img.tif"), "PIXELS");

        for if_dry_run in [true, false] {
            let spec_options = SpecTransferOptions {
                if_overwrite: true,
                if_dry_run,
                ..SpecTransferOptions::default()
            };
            let report = run(
                &[resolution("img.tif", vec![dst.join("img.tif")])],
                &dst,
                &dst,
                &spec_options,
            );
            assert_eq!(report.cnt_copied, 0);
            assert_eq!(report.cnt_skipped, 0);
            assert_eq!(report.error_count(), 1);
            assert_eq!(report.errors[0].path, dst.join("img.tif"));
            assert_eq!(
                std::fs::read_to_string(dst.join("img.tif")).expect("read"),
                "PIXELS"
            );
        }
    }

    #[test]
    fn keep_tree_mirrors_relative_parent() {
        let tmp = TestDir::new();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a/b/img.tif"), "x");

        let spec_options = SpecTransferOptions {
            if_keep_tree: true,
            ..SpecTransferOptions::default()
        };
        let report = run(
            &[resolution("img.tif", vec![src.join("a/b/img.tif")])],
            &src,
            &dst,
            &spec_options,
        );
        assert_eq!(report.error_count(), 0);
        assert!(dst.join("a/b/img.tif").exists());
        assert!(!dst.join("img.tif").exists());
    }

    #[test]
    fn failed_copy_does_not_abort_batch() {
        let tmp = TestDir::new();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("ok.tif"), "ok");

        let report = run(
            &[
                resolution("gone.tif", vec![src.join("gone.tif")]),
                resolution("missing.tif", vec![]),
                resolution("ok.tif", vec![src.join("ok.tif")]),
            ],
            &src,
            &dst,
            &SpecTransferOptions::default(),
        );
        assert_eq!(report.cnt_copied, 1);
        assert_eq!(report.cnt_resolved, 2);
        assert_eq!(report.names_unresolved, vec!["missing.tif"]);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.errors[0].path, src.join("gone.tif"));
        assert!(dst.join("ok.tif").exists());
    }

    #[test]
    fn dry_run_plans_suffixes_without_writing() {
        let tmp = TestDir::new();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        write_text(&src.join("a/dup.tif"), "a");
        write_text(&src.join("b/dup.tif"), "b");

        let spec_options = SpecTransferOptions {
            if_dry_run: true,
            ..SpecTransferOptions::default()
        };
        let report = run(
            &[resolution(
                "dup.tif",
                vec![src.join("a/dup.tif"), src.join("b/dup.tif")],
            )],
            &src,
            &dst,
            &spec_options,
        );
        assert_eq!(report.cnt_copied, 0);
        assert_eq!(report.cnt_skipped, 2);
        assert_eq!(std::fs::read_dir(&dst).expect("read dst").count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn existing_symlink_destination_is_refused() {
        use std::os::unix::fs::symlink;

        let tmp = TestDir::new();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        let outside = tmp.path().join("outside");
        write_text(&src.join("a.tif"), "safe");
        std::fs::create_dir_all(&dst).expect("create dst");
        std::fs::create_dir_all(&outside).expect("create outside");
        symlink(outside.join("out.tif"), dst.join("a.tif")).expect("create dst symlink");

        let spec_options = SpecTransferOptions {
            if_overwrite: true,
            ..SpecTransferOptions::default()
        };
        let report = run(
            &[resolution("a.tif", vec![src.join("a.tif")])],
            &src,
            &dst,
            &spec_options,
        );
        assert_eq!(report.error_count(), 1);
        assert!(!outside.join("out.tif").exists());
    }
}
