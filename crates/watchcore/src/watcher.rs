//! Filtering of change notifications reported by an external watcher.
//!
//! Subscribing to OS events is left to the embedder. Whatever it receives is
//! fed through [`filter_changed_paths`], which turns a raw batch into the
//! root-relative paths that actually need rescanning.

use std::path::{Path, PathBuf};

use fnv::FnvHashSet;

use crate::ignore::IgnoreSet;

/// Returns the part of `candidate` below `root`, or `None` when the
/// candidate lies outside it. The root itself maps to the empty path.
pub fn relative_to_root<'a>(root: &Path, candidate: &'a Path) -> Option<&'a Path> {
    candidate.strip_prefix(root).ok()
}

/// Turns a batch of changed paths into the minimal set of root-relative
/// paths to rescan.
///
/// Paths outside `root` and paths the ignore set hides are dropped. What is
/// left is coalesced: a path is omitted when it or one of its ancestors is
/// already in the result. The output is ordered shallowest first.
pub fn filter_changed_paths<I, P>(root: &Path, ignore: &IgnoreSet, paths: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let mut outside = 0usize;
    let mut ignored = 0usize;
    let relevant: Vec<PathBuf> = paths
        .into_iter()
        .filter_map(|path| {
            let Some(relative) = relative_to_root(root, path.as_ref()) else {
                outside += 1;
                return None;
            };
            if ignore.is_ignored_path(relative) {
                ignored += 1;
                return None;
            }
            Some(relative.to_path_buf())
        })
        .collect();

    let cover = minimal_cover(relevant);
    log::debug!(
        "change batch for {}: {} to rescan, {} ignored, {} outside root",
        root.display(),
        cover.len(),
        ignored,
        outside
    );
    cover
}

/// Smallest subset of `paths` whose subtrees contain every input path.
///
/// Shallow paths are visited first so each deeper path only has to probe its
/// own ancestors against what was already kept.
pub fn minimal_cover(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
    if paths.len() < 2 {
        return paths;
    }
    paths.sort_by_cached_key(|path| (path.components().count(), path.clone()));
    paths.dedup();

    let mut kept: FnvHashSet<PathBuf> = FnvHashSet::default();
    let mut cover = Vec::new();
    for path in paths {
        if path.ancestors().any(|ancestor| kept.contains(ancestor)) {
            continue;
        }
        kept.insert(path.clone());
        cover.push(path);
    }
    cover
}
