//! Ignore-root registry and path classification.

use std::path::Path;

use fnv::FnvHashMap;

use super::trie::{find_separator, is_separator, trim_trailing_separators, PathTrie};
use crate::config::WatchConfig;

/// VCS metadata names that get VCS (weak) ignore semantics by default.
pub const DEFAULT_VCS_DIRS: &[&str] = &[".git", ".hg", ".svn"];

/// Interior names of a VCS directory that stay observable even though the
/// directory's contents are otherwise ignored.
///
/// Keyed by the VCS directory name (the last component of the ignore root),
/// so `.hg` and `sub/.hg` share the same allow-list. Only names directly
/// below the root are considered.
#[derive(Debug, Clone)]
pub struct VcsExceptions {
    by_kind: FnvHashMap<Box<[u8]>, Vec<Box<[u8]>>>,
}

impl Default for VcsExceptions {
    /// Mercurial's working-copy lock is the only default exception.
    fn default() -> Self {
        Self::empty().allow(".hg", "wlock")
    }
}

impl VcsExceptions {
    /// An allow-list with no entries: every interior path is ignored.
    pub fn empty() -> Self {
        Self {
            by_kind: FnvHashMap::default(),
        }
    }

    /// Adds `name` to the allow-list of the `kind` VCS directory.
    pub fn allow(mut self, kind: &str, name: &str) -> Self {
        let names = self.by_kind.entry(Box::from(kind.as_bytes())).or_default();
        let name: Box<[u8]> = Box::from(name.as_bytes());
        if !names.contains(&name) {
            names.push(name);
        }
        self
    }

    /// Returns true if `remainder` is exempt inside a `kind` directory.
    pub fn allows(&self, kind: &[u8], remainder: &[u8]) -> bool {
        self.by_kind
            .get(kind)
            .is_some_and(|names| names.iter().any(|name| name.as_ref() == remainder))
    }
}

/// The set of registered ignore roots.
///
/// Ordinary roots suppress themselves and everything beneath them. VCS roots
/// stay visible themselves, hide their interior, and let the names in
/// [`VcsExceptions`] through. When several roots are ancestors of a
/// candidate, the deepest one decides.
///
/// The set only grows. Build it up front, then share it read-only (see
/// [`SharedIgnoreSet`](super::SharedIgnoreSet)).
#[derive(Debug, Default)]
pub struct IgnoreSet {
    trie: PathTrie<bool>,
    roots: Vec<Box<[u8]>>,
    vcs_exceptions: VcsExceptions,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vcs_exceptions(vcs_exceptions: VcsExceptions) -> Self {
        Self {
            vcs_exceptions,
            ..Self::default()
        }
    }

    /// Builds the set described by a root's configuration.
    ///
    /// VCS roots go in first so that a directory listed in both
    /// `ignore_vcs` and `ignore_dirs` ends up fully ignored.
    pub fn from_config(config: &WatchConfig) -> Self {
        let mut set = Self::with_vcs_exceptions(config.vcs_exceptions());
        for dir in &config.ignore_vcs {
            set.add(dir, true);
        }
        for dir in &config.ignore_dirs {
            set.add(dir, false);
        }
        log::debug!(
            "built ignore set with {} roots ({} vcs)",
            set.len(),
            set.roots().filter(|(_, is_vcs)| *is_vcs).count()
        );
        set
    }

    /// Registers an ignore root.
    ///
    /// Trailing separators are dropped. Re-adding a root replaces its VCS
    /// flag. Returns false, without touching the set, for a root that is
    /// empty once normalized.
    pub fn add(&mut self, path: impl AsRef<[u8]>, is_vcs: bool) -> bool {
        let path = trim_trailing_separators(path.as_ref());
        if path.is_empty() {
            log::debug!("ignoring empty ignore root");
            return false;
        }
        if self.trie.insert(path, is_vcs).is_none() {
            self.roots.push(Box::from(path));
        }
        true
    }

    /// Number of distinct roots registered.
    pub fn len(&self) -> usize {
        self.trie.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trie.is_empty()
    }

    /// Registered roots in first-registration order, with their current VCS
    /// flag.
    pub fn roots(&self) -> impl Iterator<Item = (&[u8], bool)> + '_ {
        self.roots.iter().map(|root| {
            let is_vcs = self.trie.get(root).copied().unwrap_or(false);
            (root.as_ref(), is_vcs)
        })
    }

    /// Classifies `path`, relative to the watched root.
    ///
    /// Runs in time proportional to the length of `path`.
    pub fn is_ignored(&self, path: impl AsRef<[u8]>) -> bool {
        let path = path.as_ref();
        let Some(found) = self.trie.longest_match(path) else {
            return false;
        };
        if !*found.value {
            return true;
        }

        let root = &path[..found.matched_len];
        let remainder = match path.get(found.matched_len + 1..) {
            Some(rest) => trim_trailing_separators(rest),
            None => &[],
        };
        if remainder.is_empty() {
            return false;
        }
        !self.vcs_exceptions.allows(last_component(root), remainder)
    }

    /// [`is_ignored`](Self::is_ignored) for a `Path`.
    pub fn is_ignored_path(&self, path: &Path) -> bool {
        self.is_ignored(path.to_string_lossy().as_bytes())
    }
}

fn last_component(path: &[u8]) -> &[u8] {
    let mut start = 0;
    while let Some(offset) = find_separator(&path[start..]) {
        start += offset + 1;
    }
    debug_assert!(path[start..].iter().all(|byte| !is_separator(*byte)));
    &path[start..]
}
