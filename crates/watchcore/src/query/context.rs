//! Per-query evaluation context.

/// State shared by every predicate evaluated within one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryContext {
    /// Whether the watched filesystem compares names case-sensitively.
    /// `name` and `dirname` follow this; `iname` and `idirname` never do.
    pub case_sensitive: bool,
}

impl QueryContext {
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }
}

impl Default for QueryContext {
    /// macOS and Windows volumes are case-insensitive by default.
    fn default() -> Self {
        Self::new(!cfg!(any(target_os = "macos", windows)))
    }
}
