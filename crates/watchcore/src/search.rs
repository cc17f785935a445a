//! Query scans over a watched root.
//!
//! The scan walks the tree below the root and classifies every entry's
//! root-relative path with the [`IgnoreSet`] before anything else. Ignored
//! entries are counted and dropped, and ignored directories are never
//! opened. Surviving entries are evaluated against the query expression
//! with the cheap directory-entry type in hand; stat only happens if a
//! predicate asks for it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde_json::Value;

use crate::cancel::CancellationToken;
use crate::error::{QueryParseError, Result, WatchError};
use crate::ignore::IgnoreSet;
use crate::query::{Const, DType, DirEntryFile, QueryContext, QueryExpr, TermRegistry};

/// A parsed query: the expression plus evaluation options.
#[derive(Debug)]
pub struct Query {
    expression: Box<dyn QueryExpr>,
    context: QueryContext,
}

impl Query {
    pub fn new(expression: Box<dyn QueryExpr>) -> Self {
        Self {
            expression,
            context: QueryContext::default(),
        }
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.context.case_sensitive = case_sensitive;
        self
    }

    /// Parses a query object:
    /// `{"expression": <term>, "case_sensitive": <bool>}`.
    ///
    /// A missing expression selects every file.
    pub fn parse(object: &Value, registry: &TermRegistry) -> Result<Self> {
        let Value::Object(fields) = object else {
            return Err(QueryParseError::shape("query", "expected an object", object).into());
        };
        let expression = match fields.get("expression") {
            Some(term) => registry.parse(term)?,
            None => Box::new(Const(true)),
        };
        let mut query = Self::new(expression);
        match fields.get("case_sensitive") {
            None => {}
            Some(Value::Bool(case_sensitive)) => query.context.case_sensitive = *case_sensitive,
            Some(other) => {
                return Err(QueryParseError::shape(
                    "query",
                    "case_sensitive must be a boolean",
                    other,
                )
                .into())
            }
        }
        Ok(query)
    }

    pub fn context(&self) -> &QueryContext {
        &self.context
    }

    pub fn expression(&self) -> &dyn QueryExpr {
        self.expression.as_ref()
    }
}

/// Outcome of a query scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryResult {
    /// Matching paths relative to the root, `/`-separated and sorted.
    pub files: Vec<String>,
    /// Entries that reached the evaluator.
    pub scanned: usize,
    /// Entries dropped by the ignore set.
    pub ignored: usize,
    /// Entries or directories that could not be read.
    pub errors: usize,
}

/// Runs `query` over every non-ignored entry below `root`.
///
/// Symlinks are reported but never followed.
pub fn run_query(
    root: &Path,
    ignore: &IgnoreSet,
    query: &Query,
    token: &CancellationToken,
) -> Result<QueryResult> {
    let started = Instant::now();
    let root_entries = fs::read_dir(root).map_err(|error| match error.kind() {
        std::io::ErrorKind::NotFound => WatchError::PathNotFound(root.to_path_buf()),
        _ => WatchError::Io(error),
    })?;

    let mut result = QueryResult::default();
    let mut pending: Vec<(PathBuf, String)> = Vec::new();
    let mut visited = 0usize;

    let mut listing = Some((root_entries, String::new()));
    while let Some((entries, rel_dir)) = listing.take() {
        token.is_cancelled().ok_or(WatchError::Cancelled)?;
        for entry in entries {
            visited += 1;
            token.is_cancelled_sparse(visited).ok_or(WatchError::Cancelled)?;

            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    log::warn!("failed to read entry under {}: {}", root.join(&rel_dir).display(), error);
                    result.errors += 1;
                    continue;
                }
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            let rel_path = if rel_dir.is_empty() {
                name.clone()
            } else {
                format!("{rel_dir}/{name}")
            };
            if ignore.is_ignored(&rel_path) {
                result.ignored += 1;
                continue;
            }

            let dtype = entry.file_type().ok().map(DType::from_file_type);
            let file = DirEntryFile::new(entry.path(), name, rel_dir.clone(), dtype);
            result.scanned += 1;
            if query.expression.evaluate(&query.context, &file).is_true() {
                result.files.push(rel_path.clone());
            }
            if dtype == Some(DType::Dir) {
                pending.push((file.path().to_path_buf(), rel_path));
            }
        }

        while let Some((dir, rel)) = pending.pop() {
            match fs::read_dir(&dir) {
                Ok(entries) => {
                    listing = Some((entries, rel));
                    break;
                }
                Err(error) => {
                    log::warn!("failed to read directory {}: {}", dir.display(), error);
                    result.errors += 1;
                }
            }
        }
    }

    result.files.sort_unstable();
    log::info!(
        "query over {} matched {} of {} entries ({} ignored) in {}ms",
        root.display(),
        result.files.len(),
        result.scanned,
        result.ignored,
        started.elapsed().as_millis()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::SearchVersionTracker;
    use crate::config::WatchConfig;
    use serde_json::json;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, b"").expect("write");
    }

    fn fixture() -> TempDir {
        let temp = TempDir::new().expect("tempdir");
        let root = temp.path();
        touch(root, "foo.c");
        touch(root, "subdir/bar.txt");
        touch(root, "build/out.o");
        touch(root, "builda/keep.c");
        touch(root, ".hg/wlock");
        touch(root, ".hg/store/data");
        temp
    }

    fn monorepo_ignores() -> IgnoreSet {
        let config = WatchConfig {
            ignore_dirs: vec!["build".into()],
            ..WatchConfig::default()
        };
        IgnoreSet::from_config(&config)
    }

    fn query(object: Value) -> Query {
        Query::parse(&object, &TermRegistry::builtin()).expect("parse query")
    }

    #[test]
    fn ignored_paths_never_reach_the_evaluator() {
        let temp = fixture();
        let result = run_query(
            temp.path(),
            &monorepo_ignores(),
            &query(json!({})),
            &CancellationToken::noop(),
        )
        .expect("run");

        assert_eq!(
            result.files,
            vec![".hg", ".hg/wlock", "builda", "builda/keep.c", "foo.c", "subdir", "subdir/bar.txt"]
        );
        // `build` and `.hg/store` are dropped; their contents are never listed.
        assert_eq!(result.ignored, 2);
        assert_eq!(result.errors, 0);
    }

    #[test]
    fn type_and_name_queries() {
        let temp = fixture();
        let ignore = monorepo_ignores();
        let token = CancellationToken::noop();

        let files = run_query(temp.path(), &ignore, &query(json!({"expression": ["type", "f"]})), &token)
            .expect("run")
            .files;
        assert_eq!(files, vec![".hg/wlock", "builda/keep.c", "foo.c", "subdir/bar.txt"]);

        let dirs = run_query(temp.path(), &ignore, &query(json!({"expression": ["type", "d"]})), &token)
            .expect("run")
            .files;
        assert_eq!(dirs, vec![".hg", "builda", "subdir"]);

        let named = run_query(
            temp.path(),
            &ignore,
            &query(json!({"expression": ["allof", ["type", "f"], ["iname", "FOO.C"]]})),
            &token,
        )
        .expect("run")
        .files;
        assert_eq!(named, vec!["foo.c"]);
    }

    #[test]
    fn missing_root_is_reported() {
        let temp = TempDir::new().expect("tempdir");
        let missing = temp.path().join("nope");
        let error = run_query(
            &missing,
            &IgnoreSet::new(),
            &query(json!({})),
            &CancellationToken::noop(),
        )
        .expect_err("missing root");
        assert!(matches!(error, WatchError::PathNotFound(path) if path == missing));
    }

    #[test]
    fn cancelled_scan_stops() {
        let temp = fixture();
        let tracker = SearchVersionTracker::new();
        let token = tracker.start();
        tracker.next_version();
        let error = run_query(temp.path(), &IgnoreSet::new(), &query(json!({})), &token)
            .expect_err("cancelled");
        assert!(matches!(error, WatchError::Cancelled));
    }

    #[test]
    fn query_object_validation() {
        let registry = TermRegistry::builtin();
        assert!(Query::parse(&json!([]), &registry).is_err());
        assert!(Query::parse(&json!({"case_sensitive": "yes"}), &registry).is_err());
        let error = Query::parse(&json!({"expression": ["type", "q"]}), &registry)
            .expect_err("bad type");
        assert!(matches!(error, WatchError::QueryParse(QueryParseError::InvalidValue { .. })));

        let parsed = Query::parse(&json!({"case_sensitive": false}), &registry).expect("parse");
        assert!(!parsed.context().case_sensitive);
    }
}
