//! Term registry and JSON term parsing.
//!
//! A term is either a bare string naming a zero-argument term (`"true"`) or
//! an array whose first element names the term (`["type", "f"]`). Parsers
//! are registered by name when the process starts; parsing fails fast on the
//! first bad term, before any evaluation happens.

use fnv::FnvHashMap;
use serde_json::Value;

use super::dirname::{parse_dirname, parse_idirname};
use super::expression::{parse_allof, parse_anyof, parse_false, parse_not, parse_true, QueryExpr};
use super::name::{parse_iname, parse_name};
use super::type_filter::parse_type;
use crate::error::QueryParseError;

/// Builds an expression from a JSON term. Nested terms are parsed through
/// the registry that is passed in.
pub type TermParser =
    fn(&TermRegistry, &Value) -> Result<Box<dyn QueryExpr>, QueryParseError>;

/// Name → parser table.
#[derive(Default, Clone)]
pub struct TermRegistry {
    parsers: FnvHashMap<&'static str, TermParser>,
}

impl std::fmt::Debug for TermRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.names()).finish()
    }
}

impl TermRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with every built-in term.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("allof", parse_allof);
        registry.register("anyof", parse_anyof);
        registry.register("not", parse_not);
        registry.register("true", parse_true);
        registry.register("false", parse_false);
        registry.register("type", parse_type);
        registry.register("name", parse_name);
        registry.register("iname", parse_iname);
        registry.register("dirname", parse_dirname);
        registry.register("idirname", parse_idirname);
        registry
    }

    /// Registers `parser` under `name`, returning false if the name was taken.
    /// The first registration of a name is kept.
    pub fn register(&mut self, name: &'static str, parser: TermParser) -> bool {
        if self.parsers.contains_key(name) {
            log::warn!("term '{}' registered twice; keeping the first", name);
            return false;
        }
        self.parsers.insert(name, parser);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.parsers.contains_key(name)
    }

    /// Registered term names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.parsers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Parses one term.
    pub fn parse(&self, term: &Value) -> Result<Box<dyn QueryExpr>, QueryParseError> {
        let name = term_name(term)?;
        let parser = self
            .parsers
            .get(name)
            .ok_or_else(|| QueryParseError::UnknownTerm(name.to_string()))?;
        parser(self, term)
    }
}

/// Returns the name of a term.
fn term_name(term: &Value) -> Result<&str, QueryParseError> {
    match term {
        Value::String(name) => Ok(name),
        Value::Array(items) => match items.first() {
            Some(Value::String(name)) => Ok(name),
            _ => Err(QueryParseError::shape(
                "<expression>",
                "first element of a term must be the term name",
                term,
            )),
        },
        _ => Err(QueryParseError::shape(
            "<expression>",
            "expected a term name or an array",
            term,
        )),
    }
}

/// Returns the arguments following the term name. A bare string term has
/// none.
pub(crate) fn term_arguments<'a>(
    name: &str,
    term: &'a Value,
) -> Result<&'a [Value], QueryParseError> {
    match term {
        Value::Array(items) => Ok(items.get(1..).unwrap_or_default()),
        Value::String(_) => Ok(&[]),
        _ => Err(QueryParseError::shape(name, "expected an array", term)),
    }
}
