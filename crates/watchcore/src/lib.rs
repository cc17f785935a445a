//! Path classification and file queries for a watched tree.
//!
//! This crate provides:
//! - The ignore set: ordinary and VCS ignore roots in a component trie
//! - Query expressions with three-valued evaluation over file metadata
//! - Query scans that never descend into ignored directories
//! - Filtering of change batches from an external watcher
//! - Command and capability tables built at startup

pub mod cancel;
pub mod command;
pub mod config;
pub mod error;
pub mod ignore;
pub mod query;
pub mod search;
pub mod watcher;

// Re-export main types
pub use cancel::{CancellationToken, SearchVersionTracker};
pub use command::{CapabilityTable, CommandFlags, CommandRegistry, CommandTables};
pub use config::WatchConfig;
pub use error::{QueryParseError, Result, WatchError};
pub use ignore::{IgnoreSet, SharedIgnoreSet, VcsExceptions};
pub use query::{FileResult, QueryExpr, TermRegistry, Tristate};
pub use search::{run_query, Query, QueryResult};
pub use watcher::filter_changed_paths;
