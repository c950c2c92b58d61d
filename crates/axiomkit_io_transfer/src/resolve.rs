//! Target name → candidate source files.

use crate::index::FileIndex;
use crate::naming::NameTransformer;
use crate::spec::{EnumResolveTier, SpecResolution};

/// Look up one target name.
///
/// Tiers: direct key, then (only when the direct key is absent and the name
/// ends with the target extension) one retry with the alternate extension.
/// Every path stored under the matching key is returned.
pub fn resolve_target(
    name_target: &str,
    file_index: &FileIndex,
    name_transformer: &NameTransformer,
) -> SpecResolution {
    let l_paths_direct = file_index.get(name_target);
    if !l_paths_direct.is_empty() {
        return SpecResolution {
            name_target: name_target.to_string(),
            name_matched: Some(name_target.to_string()),
            tier: EnumResolveTier::Direct,
            paths_src: l_paths_direct.to_vec(),
        };
    }

    if let Some(name_alternate) = name_transformer.derive_alternate_name(name_target) {
        let l_paths_alternate = file_index.get(&name_alternate);
        if !l_paths_alternate.is_empty() {
            return SpecResolution {
                name_target: name_target.to_string(),
                name_matched: Some(name_alternate),
                tier: EnumResolveTier::AlternateExtension,
                paths_src: l_paths_alternate.to_vec(),
            };
        }
    }

    SpecResolution {
        name_target: name_target.to_string(),
        name_matched: None,
        tier: EnumResolveTier::Unresolved,
        paths_src: Vec::new(),
    }
}

/// Resolve every target, keeping the iteration order of `names_target`.
pub fn resolve_targets<'a, I>(
    names_target: I,
    file_index: &FileIndex,
    name_transformer: &NameTransformer,
) -> Vec<SpecResolution>
where
    I: IntoIterator<Item = &'a String>,
{
    names_target
        .into_iter()
        .map(|name| resolve_target(name, file_index, name_transformer))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::resolve_target;
    use crate::index::build_file_index;
    use crate::naming::NameTransformer;
    use crate::spec::{EnumResolveTier, SpecNameHeuristic};
    use crate::util::testing::{TestDir, write_text};

    fn transformer() -> NameTransformer {
        NameTransformer::new(SpecNameHeuristic::default()).expect("default heuristic")
    }

    #[test]
    fn resolve_direct_returns_all_paths() {
        let tmp = TestDir::new();
        let root = tmp.path().join("search");
        write_text(&root.join("a/dup.tif"), "a");
        write_text(&root.join("b/dup.tif"), "b");
        write_text(&root.join("dup.tiff"), "c");
        let file_index = build_file_index(&root, true).expect("index");

        let res = resolve_target("dup.tif", &file_index, &transformer());
        assert_eq!(res.tier, EnumResolveTier::Direct);
        assert_eq!(res.paths_src.len(), 2);
    }

    #[test]
    fn resolve_falls_back_to_alternate_extension() {
        let tmp = TestDir::new();
        let root = tmp.path().join("search");
        write_text(&root.join("x/scan.TIFF"), "s");
        let file_index = build_file_index(&root, true).expect("index");

        let res = resolve_target("scan.tif", &file_index, &transformer());
        assert_eq!(res.tier, EnumResolveTier::AlternateExtension);
        assert_eq!(res.name_matched.as_deref(), Some("scan.tiff"));
        assert_eq!(res.paths_src, vec![root.join("x/scan.TIFF")]);
    }

    #[test]
    fn resolve_swaps_extension_at_most_once() {
        let tmp = TestDir::new();
        let root = tmp.path().join("search");
        // Only a doubly-swapped spelling exists; it must not be reached.
        write_text(&root.join("scan.tiffff"), "s");
        write_text(&root.join("other.png"), "o");
        let file_index = build_file_index(&root, true).expect("index");

        let res = resolve_target("scan.tif", &file_index, &transformer());
        assert!(res.is_unresolved());
        assert!(res.paths_src.is_empty());

        // Names not ending with the target extension get no retry.
        let res = resolve_target("other.tif.png", &file_index, &transformer());
        assert!(res.is_unresolved());
    }
}
