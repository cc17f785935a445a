//! The `name` and `iname` predicates.
//!
//! `["name", "foo.c"]`, `["name", ["foo.c", "bar.c"]]` and
//! `["name", "src/foo.c", "wholename"]`. The optional scope is `basename`
//! (default) or `wholename`, the path relative to the watched root.

use fnv::FnvHashSet;
use serde_json::Value;

use super::context::QueryContext;
use super::expression::QueryExpr;
use super::file_result::FileResult;
use super::parser::TermRegistry;
use super::tristate::Tristate;
use crate::error::QueryParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameScope {
    Basename,
    Wholename,
}

#[derive(Debug)]
pub struct NameExpr {
    exact: FnvHashSet<String>,
    folded: FnvHashSet<String>,
    scope: NameScope,
    case_insensitive: bool,
}

impl NameExpr {
    pub fn new<I, S>(names: I, scope: NameScope, case_insensitive: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let exact: FnvHashSet<String> = names.into_iter().map(Into::into).collect();
        let folded = exact.iter().map(|name| name.to_lowercase()).collect();
        Self {
            exact,
            folded,
            scope,
            case_insensitive,
        }
    }

    fn matches(&self, candidate: &str, case_sensitive: bool) -> bool {
        if case_sensitive && !self.case_insensitive {
            self.exact.contains(candidate)
        } else {
            self.folded.contains(&candidate.to_lowercase())
        }
    }
}

impl QueryExpr for NameExpr {
    fn evaluate(&self, context: &QueryContext, file: &dyn FileResult) -> Tristate {
        let matched = match self.scope {
            NameScope::Basename => self.matches(file.name(), context.case_sensitive),
            NameScope::Wholename => self.matches(&file.whole_name(), context.case_sensitive),
        };
        Tristate::from(matched)
    }
}

fn parse_name_term(term: &Value, case_insensitive: bool) -> Result<NameExpr, QueryParseError> {
    let which = if case_insensitive { "iname" } else { "name" };
    let Value::Array(items) = term else {
        return Err(QueryParseError::shape(which, "expected an array", term));
    };
    if !(2..=3).contains(&items.len()) {
        return Err(QueryParseError::shape(which, "invalid number of arguments", term));
    }

    let names = match &items[1] {
        Value::String(name) => vec![name.clone()],
        Value::Array(values) => values
            .iter()
            .map(|value| match value {
                Value::String(name) => Ok(name.clone()),
                other => Err(QueryParseError::shape(
                    which,
                    "argument 2 must be either a string or an array of string",
                    other,
                )),
            })
            .collect::<Result<Vec<_>, _>>()?,
        other => {
            return Err(QueryParseError::shape(
                which,
                "argument 2 must be either a string or an array of string",
                other,
            ))
        }
    };

    let scope = match items.get(2) {
        None => NameScope::Basename,
        Some(Value::String(scope)) => match scope.as_str() {
            "basename" => NameScope::Basename,
            "wholename" => NameScope::Wholename,
            _ => return Err(QueryParseError::value(which, "invalid scope", &items[2])),
        },
        Some(other) => {
            return Err(QueryParseError::shape(which, "argument 3 must be a string", other))
        }
    };

    Ok(NameExpr::new(names, scope, case_insensitive))
}

pub(crate) fn parse_name(
    _registry: &TermRegistry,
    term: &Value,
) -> Result<Box<dyn QueryExpr>, QueryParseError> {
    Ok(Box::new(parse_name_term(term, false)?))
}

pub(crate) fn parse_iname(
    _registry: &TermRegistry,
    term: &Value,
) -> Result<Box<dyn QueryExpr>, QueryParseError> {
    Ok(Box::new(parse_name_term(term, true)?))
}
