//! The query expression contract and its boolean combinators.

use std::fmt::Debug;

use serde_json::Value;

use super::context::QueryContext;
use super::file_result::FileResult;
use super::parser::{term_arguments, TermRegistry};
use super::tristate::Tristate;
use crate::error::QueryParseError;

/// A predicate over one file's metadata.
///
/// Evaluation never fails: metadata that cannot be obtained is reported as
/// [`Tristate::Unknown`].
pub trait QueryExpr: Debug + Send + Sync {
    fn evaluate(&self, context: &QueryContext, file: &dyn FileResult) -> Tristate;
}

/// `["allof", expr...]` - true when every child is true.
#[derive(Debug)]
pub struct AllOf(pub Vec<Box<dyn QueryExpr>>);

impl QueryExpr for AllOf {
    fn evaluate(&self, context: &QueryContext, file: &dyn FileResult) -> Tristate {
        let mut result = Tristate::True;
        for child in &self.0 {
            result = result.and(child.evaluate(context, file));
            if result == Tristate::False {
                break;
            }
        }
        result
    }
}

/// `["anyof", expr...]` - true when some child is true.
#[derive(Debug)]
pub struct AnyOf(pub Vec<Box<dyn QueryExpr>>);

impl QueryExpr for AnyOf {
    fn evaluate(&self, context: &QueryContext, file: &dyn FileResult) -> Tristate {
        let mut result = Tristate::False;
        for child in &self.0 {
            result = result.or(child.evaluate(context, file));
            if result == Tristate::True {
                break;
            }
        }
        result
    }
}

/// `["not", expr]`
#[derive(Debug)]
pub struct NotExpr(pub Box<dyn QueryExpr>);

impl QueryExpr for NotExpr {
    fn evaluate(&self, context: &QueryContext, file: &dyn FileResult) -> Tristate {
        self.0.evaluate(context, file).negate()
    }
}

/// `"true"` / `"false"`
#[derive(Debug, Clone, Copy)]
pub struct Const(pub bool);

impl QueryExpr for Const {
    fn evaluate(&self, _context: &QueryContext, _file: &dyn FileResult) -> Tristate {
        Tristate::from(self.0)
    }
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

fn parse_children(
    name: &str,
    registry: &TermRegistry,
    term: &Value,
) -> Result<Vec<Box<dyn QueryExpr>>, QueryParseError> {
    term_arguments(name, term)?
        .iter()
        .map(|child| registry.parse(child))
        .collect()
}

pub(crate) fn parse_allof(
    registry: &TermRegistry,
    term: &Value,
) -> Result<Box<dyn QueryExpr>, QueryParseError> {
    Ok(Box::new(AllOf(parse_children("allof", registry, term)?)))
}

pub(crate) fn parse_anyof(
    registry: &TermRegistry,
    term: &Value,
) -> Result<Box<dyn QueryExpr>, QueryParseError> {
    Ok(Box::new(AnyOf(parse_children("anyof", registry, term)?)))
}

pub(crate) fn parse_not(
    registry: &TermRegistry,
    term: &Value,
) -> Result<Box<dyn QueryExpr>, QueryParseError> {
    match term_arguments("not", term)? {
        [inner] => Ok(Box::new(NotExpr(registry.parse(inner)?))),
        _ => Err(QueryParseError::shape(
            "not",
            "expected exactly one expression",
            term,
        )),
    }
}

pub(crate) fn parse_true(
    _registry: &TermRegistry,
    _term: &Value,
) -> Result<Box<dyn QueryExpr>, QueryParseError> {
    Ok(Box::new(Const(true)))
}

pub(crate) fn parse_false(
    _registry: &TermRegistry,
    _term: &Value,
) -> Result<Box<dyn QueryExpr>, QueryParseError> {
    Ok(Box::new(Const(false)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::file_result::FileSnapshot;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Fixed(Tristate);

    impl QueryExpr for Fixed {
        fn evaluate(&self, _context: &QueryContext, _file: &dyn FileResult) -> Tristate {
            self.0
        }
    }

    #[derive(Debug, Default)]
    struct Counting(AtomicUsize);

    impl QueryExpr for Counting {
        fn evaluate(&self, _context: &QueryContext, _file: &dyn FileResult) -> Tristate {
            self.0.fetch_add(1, Ordering::Relaxed);
            Tristate::True
        }
    }

    fn fixed(values: &[Tristate]) -> Vec<Box<dyn QueryExpr>> {
        values
            .iter()
            .map(|value| Box::new(Fixed(*value)) as Box<dyn QueryExpr>)
            .collect()
    }

    fn eval(expr: &dyn QueryExpr) -> Tristate {
        expr.evaluate(&QueryContext::default(), &FileSnapshot::at("x"))
    }

    #[test]
    fn empty_combinators() {
        assert_eq!(eval(&AllOf(Vec::new())), Tristate::True);
        assert_eq!(eval(&AnyOf(Vec::new())), Tristate::False);
    }

    #[test]
    fn unknown_propagates_through_allof() {
        use Tristate::*;
        assert_eq!(eval(&AllOf(fixed(&[Unknown, True]))), Unknown);
        assert_eq!(eval(&AllOf(fixed(&[Unknown, False]))), False);
        assert_eq!(eval(&AllOf(fixed(&[True, True]))), True);
    }

    #[test]
    fn unknown_propagates_through_anyof() {
        use Tristate::*;
        assert_eq!(eval(&AnyOf(fixed(&[Unknown, False]))), Unknown);
        assert_eq!(eval(&AnyOf(fixed(&[Unknown, True]))), True);
        assert_eq!(eval(&AnyOf(fixed(&[False, False]))), False);
    }

    #[test]
    fn not_keeps_unknown() {
        assert_eq!(eval(&NotExpr(Box::new(Fixed(Tristate::Unknown)))), Tristate::Unknown);
        assert_eq!(eval(&NotExpr(Box::new(Const(true)))), Tristate::False);
    }

    #[test]
    fn allof_stops_at_false() {
        let counter = std::sync::Arc::new(Counting::default());

        #[derive(Debug)]
        struct Shared(std::sync::Arc<Counting>);
        impl QueryExpr for Shared {
            fn evaluate(&self, context: &QueryContext, file: &dyn FileResult) -> Tristate {
                self.0.evaluate(context, file)
            }
        }

        let expr = AllOf(vec![
            Box::new(Const(false)),
            Box::new(Shared(counter.clone())),
        ]);
        assert_eq!(eval(&expr), Tristate::False);
        assert_eq!(counter.0.load(Ordering::Relaxed), 0);
    }
}
