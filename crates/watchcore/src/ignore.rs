//! Path-ignore classification.
//!
//! This module decides, for every path the daemon sees, whether it should be
//! dropped before any further work:
//! - `trie` - component-keyed prefix trie (no policy)
//! - `set` - ordinary vs VCS roots, longest match, VCS exceptions
//! - `shared` - build-then-publish handle for concurrent readers

mod set;
mod shared;
mod trie;

pub use set::{IgnoreSet, VcsExceptions, DEFAULT_VCS_DIRS};
pub use shared::SharedIgnoreSet;
pub use trie::{PathTrie, TrieMatch};
