//! The `type` predicate: `["type", "<code>"]`.

use serde_json::Value;

use super::context::QueryContext;
use super::expression::QueryExpr;
use super::file_result::{DType, FileKind, FileResult};
use super::parser::{term_arguments, TermRegistry};
use super::tristate::Tristate;
use crate::error::QueryParseError;

/// File type selected by a one-letter code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCode {
    /// `b`
    Block,
    /// `c`
    Char,
    /// `p`
    Fifo,
    /// `s`
    Socket,
    /// `d`
    Dir,
    /// `f`
    Regular,
    /// `l`
    Symlink,
    /// `D` (Solaris/illumos doors; never matches elsewhere)
    Door,
}

impl TypeCode {
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'b' => Self::Block,
            'c' => Self::Char,
            'p' => Self::Fifo,
            's' => Self::Socket,
            'd' => Self::Dir,
            'f' => Self::Regular,
            'l' => Self::Symlink,
            'D' => Self::Door,
            _ => return None,
        })
    }

    pub fn code(self) -> char {
        match self {
            Self::Block => 'b',
            Self::Char => 'c',
            Self::Fifo => 'p',
            Self::Socket => 's',
            Self::Dir => 'd',
            Self::Regular => 'f',
            Self::Symlink => 'l',
            Self::Door => 'D',
        }
    }

    /// Answers from a directory entry type. `None` when the entry type
    /// cannot decide and stat must be consulted.
    fn matches_dtype(self, dtype: DType) -> Option<bool> {
        let wanted = match self {
            Self::Block => DType::Block,
            Self::Char => DType::Char,
            Self::Fifo => DType::Fifo,
            Self::Socket => DType::Socket,
            Self::Dir => DType::Dir,
            Self::Regular => DType::Regular,
            Self::Symlink => DType::Symlink,
            Self::Door => return None,
        };
        if dtype == DType::Unknown {
            return None;
        }
        Some(dtype == wanted)
    }

    fn matches_kind(self, kind: FileKind) -> bool {
        let wanted = match self {
            Self::Block => FileKind::Block,
            Self::Char => FileKind::Char,
            Self::Fifo => FileKind::Fifo,
            Self::Socket => FileKind::Socket,
            Self::Dir => FileKind::Dir,
            Self::Regular => FileKind::Regular,
            Self::Symlink => FileKind::Symlink,
            Self::Door => FileKind::Door,
        };
        kind == wanted
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TypeExpr {
    code: TypeCode,
}

impl TypeExpr {
    pub fn new(code: TypeCode) -> Self {
        Self { code }
    }

    pub fn code(&self) -> TypeCode {
        self.code
    }
}

impl QueryExpr for TypeExpr {
    fn evaluate(&self, _context: &QueryContext, file: &dyn FileResult) -> Tristate {
        if let Some(answer) = file.dtype().and_then(|dtype| self.code.matches_dtype(dtype)) {
            return Tristate::from(answer);
        }
        match file.stat() {
            Some(stat) => Tristate::from(self.code.matches_kind(stat.kind)),
            None => Tristate::Unknown,
        }
    }
}

pub(crate) fn parse_type(
    _registry: &TermRegistry,
    term: &Value,
) -> Result<Box<dyn QueryExpr>, QueryParseError> {
    if !term.is_array() {
        return Err(QueryParseError::shape(
            "type",
            "term requires a type string parameter",
            term,
        ));
    }
    let argument = match term_arguments("type", term)?.first() {
        Some(Value::String(value)) => value,
        Some(other) => {
            return Err(QueryParseError::shape(
                "type",
                "first parameter must be a type string",
                other,
            ))
        }
        None => {
            return Err(QueryParseError::shape(
                "type",
                "first parameter must be a type string",
                term,
            ))
        }
    };

    let mut chars = argument.chars();
    let code = match (chars.next(), chars.next()) {
        (Some(code), None) => TypeCode::from_code(code),
        _ => None,
    };
    match code {
        Some(code) => Ok(Box::new(TypeExpr::new(code))),
        None => Err(QueryParseError::value(
            "type",
            "invalid type string",
            &Value::String(argument.clone()),
        )),
    }
}
