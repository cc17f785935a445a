//! Query expressions over file metadata.
//!
//! This module provides:
//! - The `QueryExpr` contract and three-valued results
//! - Boolean combinators (`allof`, `anyof`, `not`, `true`, `false`)
//! - Predicates (`type`, `name`/`iname`, `dirname`/`idirname`)
//! - The term registry that parses JSON terms into expressions

mod context;
mod dirname;
mod expression;
mod file_result;
mod name;
mod parser;
mod tristate;
mod type_filter;

pub use context::QueryContext;
pub use dirname::{DepthOp, DirNameExpr};
pub use expression::{AllOf, AnyOf, Const, NotExpr, QueryExpr};
pub use file_result::{DType, DirEntryFile, FileInformation, FileKind, FileResult, FileSnapshot};
pub use name::{NameExpr, NameScope};
pub use parser::{TermParser, TermRegistry};
pub use tristate::Tristate;
pub use type_filter::{TypeCode, TypeExpr};
