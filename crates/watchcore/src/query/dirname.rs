//! The `dirname` and `idirname` predicates.
//!
//! `["dirname", "a/b"]` matches files whose parent directory is `a/b` or
//! lies anywhere below it. An optional `["depth", op, n]` constrains how far
//! below: files directly inside `a/b` are at depth 0. The empty dirname
//! names the watched root itself.

use serde_json::Value;

use super::context::QueryContext;
use super::expression::QueryExpr;
use super::file_result::FileResult;
use super::parser::TermRegistry;
use super::tristate::Tristate;
use crate::error::QueryParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl DepthOp {
    fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "eq" => Self::Eq,
            "ne" => Self::Ne,
            "gt" => Self::Gt,
            "ge" => Self::Ge,
            "lt" => Self::Lt,
            "le" => Self::Le,
            _ => return None,
        })
    }

    fn compare(self, left: u64, right: u64) -> bool {
        match self {
            Self::Eq => left == right,
            Self::Ne => left != right,
            Self::Gt => left > right,
            Self::Ge => left >= right,
            Self::Lt => left < right,
            Self::Le => left <= right,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirNameExpr {
    dir: String,
    depth: (DepthOp, u64),
    case_insensitive: bool,
}

impl DirNameExpr {
    pub fn new(dir: impl Into<String>, case_insensitive: bool) -> Self {
        let dir: String = dir.into();
        Self {
            dir: dir.trim_end_matches('/').to_string(),
            depth: (DepthOp::Ge, 0),
            case_insensitive,
        }
    }

    pub fn with_depth(mut self, op: DepthOp, value: u64) -> Self {
        self.depth = (op, value);
        self
    }

    /// Depth of `dir_name` below this expression's directory, if it is
    /// below it at all.
    fn depth_below(&self, dir_name: &str, case_sensitive: bool) -> Option<u64> {
        if self.dir.is_empty() {
            return Some(component_count(dir_name));
        }
        let fold = self.case_insensitive || !case_sensitive;
        let (dir_name, dir) = if fold {
            (dir_name.to_lowercase(), self.dir.to_lowercase())
        } else {
            (dir_name.to_string(), self.dir.clone())
        };
        let rest = dir_name.strip_prefix(dir.as_str())?;
        if rest.is_empty() {
            return Some(0);
        }
        let rest = rest.strip_prefix('/')?;
        Some(component_count(rest))
    }
}

fn component_count(path: &str) -> u64 {
    if path.is_empty() {
        0
    } else {
        path.split('/').count() as u64
    }
}

impl QueryExpr for DirNameExpr {
    fn evaluate(&self, context: &QueryContext, file: &dyn FileResult) -> Tristate {
        let (op, value) = self.depth;
        let matched = self
            .depth_below(file.dir_name(), context.case_sensitive)
            .is_some_and(|depth| op.compare(depth, value));
        Tristate::from(matched)
    }
}

fn parse_depth(which: &str, term: &Value) -> Result<(DepthOp, u64), QueryParseError> {
    let Value::Array(items) = term else {
        return Err(QueryParseError::shape(
            which,
            "depth must be an array [\"depth\", op, value]",
            term,
        ));
    };
    match items.as_slice() {
        [Value::String(keyword), Value::String(op), value] if keyword == "depth" => {
            let op = DepthOp::parse(op).ok_or_else(|| {
                QueryParseError::value(which, "invalid depth operator", &items[1])
            })?;
            let value = value.as_u64().ok_or_else(|| {
                QueryParseError::value(which, "depth must be a non-negative integer", value)
            })?;
            Ok((op, value))
        }
        _ => Err(QueryParseError::shape(
            which,
            "depth must be an array [\"depth\", op, value]",
            term,
        )),
    }
}

fn parse_dirname_term(term: &Value, case_insensitive: bool) -> Result<DirNameExpr, QueryParseError> {
    let which = if case_insensitive { "idirname" } else { "dirname" };
    let Value::Array(items) = term else {
        return Err(QueryParseError::shape(which, "expected an array", term));
    };
    let dir = match items.get(1) {
        Some(Value::String(dir)) => dir,
        Some(other) => {
            return Err(QueryParseError::shape(which, "argument 2 must be a string", other))
        }
        None => return Err(QueryParseError::shape(which, "invalid number of arguments", term)),
    };
    let expr = DirNameExpr::new(dir.as_str(), case_insensitive);
    match items.len() {
        2 => Ok(expr),
        3 => {
            let (op, value) = parse_depth(which, &items[2])?;
            Ok(expr.with_depth(op, value))
        }
        _ => Err(QueryParseError::shape(which, "invalid number of arguments", term)),
    }
}

pub(crate) fn parse_dirname(
    _registry: &TermRegistry,
    term: &Value,
) -> Result<Box<dyn QueryExpr>, QueryParseError> {
    Ok(Box::new(parse_dirname_term(term, false)?))
}

pub(crate) fn parse_idirname(
    _registry: &TermRegistry,
    term: &Value,
) -> Result<Box<dyn QueryExpr>, QueryParseError> {
    Ok(Box::new(parse_dirname_term(term, true)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::file_result::FileSnapshot;
    use serde_json::json;

    /// Five nested trees `0/..` to `4/..`, each with an `a` at every level,
    /// plus `a` at the top.
    fn tree() -> Vec<String> {
        let mut paths = vec!["a".to_string()];
        for i in 0..5 {
            let mut dir = String::new();
            for _ in 0..5 {
                if !dir.is_empty() {
                    dir.push('/');
                }
                dir.push_str(&i.to_string());
                paths.push(format!("{dir}/a"));
            }
        }
        paths.sort();
        paths
    }

    fn select(term: Value) -> Vec<String> {
        let expr = TermRegistry::builtin().parse(&term).expect("parse");
        tree()
            .into_iter()
            .filter(|path| {
                expr.evaluate(&QueryContext::new(true), &FileSnapshot::at(path))
                    .is_true()
            })
            .collect()
    }

    #[test]
    fn empty_dirname_matches_everything() {
        assert_eq!(select(json!(["dirname", ""])), tree());
    }

    #[test]
    fn depth_below_root() {
        let deep = select(json!(["dirname", "", ["depth", "gt", 4]]));
        assert_eq!(
            deep,
            vec!["0/0/0/0/0/a", "1/1/1/1/1/a", "2/2/2/2/2/a", "3/3/3/3/3/a", "4/4/4/4/4/a"]
        );
        assert_eq!(select(json!(["dirname", "", ["depth", "gt", 3]])).len(), 10);
    }

    #[test]
    fn depth_below_subdirectory() {
        assert_eq!(
            select(json!(["dirname", "1"])),
            vec!["1/1/1/1/1/a", "1/1/1/1/a", "1/1/1/a", "1/1/a", "1/a"]
        );
        assert_eq!(
            select(json!(["dirname", "1", ["depth", "gt", 0]])),
            vec!["1/1/1/1/1/a", "1/1/1/1/a", "1/1/1/a", "1/1/a"]
        );
        assert_eq!(
            select(json!(["dirname", "1", ["depth", "gt", 3]])),
            vec!["1/1/1/1/1/a"]
        );
        assert!(select(json!(["dirname", "1", ["depth", "gt", 4]])).is_empty());
        assert_eq!(select(json!(["dirname", "1", ["depth", "eq", 0]])), vec!["1/a"]);
    }

    #[test]
    fn component_exact_prefix() {
        let expr = DirNameExpr::new("ab", false);
        let ctx = QueryContext::new(true);
        assert!(!expr.evaluate(&ctx, &FileSnapshot::at("abc/x")).is_true());
        assert!(expr.evaluate(&ctx, &FileSnapshot::at("ab/x")).is_true());
        // A directory is not inside itself.
        assert!(!expr.evaluate(&ctx, &FileSnapshot::at("ab")).is_true());
    }

    #[test]
    fn idirname_folds_case() {
        let ctx = QueryContext::new(true);
        let expr = DirNameExpr::new("Src", true);
        assert!(expr.evaluate(&ctx, &FileSnapshot::at("src/main.rs")).is_true());
        let expr = DirNameExpr::new("Src", false);
        assert!(!expr.evaluate(&ctx, &FileSnapshot::at("src/main.rs")).is_true());
    }

    #[test]
    fn parse_errors() {
        let registry = TermRegistry::builtin();
        for term in [
            json!("dirname"),
            json!(["dirname"]),
            json!(["dirname", 1]),
            json!(["dirname", "a", "depth"]),
            json!(["dirname", "a", ["depth", "gt"]]),
            json!(["dirname", "a", ["depth", "gt", 1], "x"]),
        ] {
            let err = registry.parse(&term).expect_err("bad shape");
            assert!(matches!(err, QueryParseError::InvalidShape { .. }), "{term}");
        }
        for term in [
            json!(["dirname", "a", ["depth", "around", 1]]),
            json!(["dirname", "a", ["depth", "gt", -1]]),
        ] {
            let err = registry.parse(&term).expect_err("bad value");
            assert!(matches!(err, QueryParseError::InvalidValue { .. }), "{term}");
        }
    }
}
