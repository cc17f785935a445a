//! Component-keyed prefix trie over byte-string paths.
//!
//! Every edge is one whole path component, so a terminal can only ever be
//! reached on a component boundary: `build` is reachable from `build/lower`
//! but not from `builda`. Lookups cost one hash probe per component of the
//! candidate, regardless of how many paths were inserted.

use fnv::FnvHashMap;

/// Returns the offset of the next path separator in `bytes`.
#[inline]
pub(crate) fn find_separator(bytes: &[u8]) -> Option<usize> {
    #[cfg(windows)]
    {
        memchr::memchr2(b'/', b'\\', bytes)
    }
    #[cfg(not(windows))]
    {
        memchr::memchr(b'/', bytes)
    }
}

/// Returns true if `byte` separates path components.
#[inline]
pub(crate) fn is_separator(byte: u8) -> bool {
    byte == b'/' || (cfg!(windows) && byte == b'\\')
}

/// Strips trailing separators from `path`.
pub(crate) fn trim_trailing_separators(path: &[u8]) -> &[u8] {
    let mut end = path.len();
    while end > 0 && is_separator(path[end - 1]) {
        end -= 1;
    }
    &path[..end]
}

/// Iterates over the components of `path`, yielding each with its end offset.
///
/// An empty input yields a single empty component, as does the position
/// after a trailing separator.
struct Components<'a> {
    path: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Components<'a> {
    fn new(path: &'a [u8]) -> Self {
        Self {
            path,
            pos: 0,
            done: false,
        }
    }
}

impl<'a> Iterator for Components<'a> {
    type Item = (&'a [u8], usize);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let rest = &self.path[self.pos..];
        match find_separator(rest) {
            Some(offset) => {
                let end = self.pos + offset;
                let component = &self.path[self.pos..end];
                self.pos = end + 1;
                Some((component, end))
            }
            None => {
                self.done = true;
                Some((rest, self.path.len()))
            }
        }
    }
}

struct TrieNode<V> {
    value: Option<V>,
    children: FnvHashMap<Box<[u8]>, TrieNode<V>>,
}

impl<V> Default for TrieNode<V> {
    fn default() -> Self {
        Self {
            value: None,
            children: FnvHashMap::default(),
        }
    }
}

/// The deepest terminal found while walking a candidate path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrieMatch<'a, V> {
    /// Payload stored on the matched terminal.
    pub value: &'a V,
    /// Length of the candidate prefix that matched. The byte at this offset,
    /// if any, is a separator.
    pub matched_len: usize,
}

/// A prefix trie keyed by path components.
pub struct PathTrie<V> {
    root: TrieNode<V>,
    len: usize,
}

impl<V> Default for PathTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for PathTrie<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathTrie").field("len", &self.len).finish()
    }
}

impl<V> PathTrie<V> {
    pub fn new() -> Self {
        Self {
            root: TrieNode::default(),
            len: 0,
        }
    }

    /// Number of terminals stored in the trie.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stores `value` at `path`, returning the payload it replaced.
    ///
    /// The path is taken verbatim; callers normalize trailing separators.
    pub fn insert(&mut self, path: &[u8], value: V) -> Option<V> {
        let mut node = &mut self.root;
        for (component, _) in Components::new(path) {
            node = node.children.entry(Box::from(component)).or_default();
        }
        let previous = node.value.replace(value);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    /// Returns the payload stored at exactly `path`.
    pub fn get(&self, path: &[u8]) -> Option<&V> {
        let mut node = &self.root;
        for (component, _) in Components::new(path) {
            node = node.children.get(component)?;
        }
        node.value.as_ref()
    }

    /// Walks `path` and returns the deepest terminal on the way.
    pub fn longest_match(&self, path: &[u8]) -> Option<TrieMatch<'_, V>> {
        let mut node = &self.root;
        let mut best = None;
        for (component, end) in Components::new(path) {
            match node.children.get(component) {
                Some(child) => node = child,
                None => break,
            }
            if let Some(value) = node.value.as_ref() {
                best = Some(TrieMatch {
                    value,
                    matched_len: end,
                });
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_split_on_separator() {
        let parts: Vec<_> = Components::new(b"a/bc/d").collect();
        assert_eq!(
            parts,
            vec![(&b"a"[..], 1), (&b"bc"[..], 4), (&b"d"[..], 6)]
        );
    }

    #[test]
    fn components_of_edge_inputs() {
        assert_eq!(Components::new(b"").collect::<Vec<_>>(), vec![(&b""[..], 0)]);
        assert_eq!(
            Components::new(b"a/").collect::<Vec<_>>(),
            vec![(&b"a"[..], 1), (&b""[..], 2)]
        );
        assert_eq!(
            Components::new(b"/a").collect::<Vec<_>>(),
            vec![(&b""[..], 0), (&b"a"[..], 2)]
        );
    }

    #[test]
    fn insert_replaces_and_counts_once() {
        let mut trie = PathTrie::new();
        assert_eq!(trie.insert(b"foo/bar", 1), None);
        assert_eq!(trie.insert(b"foo/bar", 2), Some(1));
        assert_eq!(trie.len(), 1);
        assert_eq!(trie.get(b"foo/bar"), Some(&2));
        assert_eq!(trie.get(b"foo"), None);
    }

    #[test]
    fn longest_match_respects_component_boundaries() {
        let mut trie = PathTrie::new();
        trie.insert(b"build", ());

        assert_eq!(trie.longest_match(b"build").map(|m| m.matched_len), Some(5));
        assert_eq!(
            trie.longest_match(b"build/lower").map(|m| m.matched_len),
            Some(5)
        );
        assert!(trie.longest_match(b"builda").is_none());
        assert!(trie.longest_match(b"buildfile").is_none());
        assert!(trie.longest_match(b"buil").is_none());
    }

    #[test]
    fn longest_match_prefers_deepest_terminal() {
        let mut trie = PathTrie::new();
        trie.insert(b"baz", "outer");
        trie.insert(b"baz/qux", "inner");

        let found = trie.longest_match(b"baz/qux/x").expect("match");
        assert_eq!(*found.value, "inner");
        assert_eq!(found.matched_len, 7);

        let found = trie.longest_match(b"baz/quux").expect("match");
        assert_eq!(*found.value, "outer");
        assert_eq!(found.matched_len, 3);
    }

    #[test]
    fn shared_prefixes_do_not_create_terminals() {
        let mut trie = PathTrie::new();
        trie.insert(b"a/b/c", 1);
        assert!(trie.longest_match(b"a/b").is_none());
        assert!(trie.longest_match(b"a").is_none());
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn empty_candidate_never_matches_real_paths() {
        let mut trie = PathTrie::new();
        trie.insert(b"/abs/path", 1);
        assert!(trie.longest_match(b"").is_none());
        assert!(trie.longest_match(b"/").is_none());
        assert!(trie.longest_match(b"/abs/path/x").is_some());
    }

    #[test]
    fn trims_trailing_separators() {
        assert_eq!(trim_trailing_separators(b"foo//"), b"foo");
        assert_eq!(trim_trailing_separators(b"///"), b"");
        assert_eq!(trim_trailing_separators(b"a/b"), b"a/b");
    }
}
