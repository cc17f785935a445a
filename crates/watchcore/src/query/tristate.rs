//! Three-valued predicate results.

use std::ops::{BitAnd, BitOr, Not};

/// Outcome of evaluating a predicate against one file.
///
/// `Unknown` means the metadata the predicate needs could not be obtained,
/// which is not the same as the predicate being false. Combination follows
/// Kleene logic: `False` dominates AND, `True` dominates OR, and `Unknown`
/// survives everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tristate {
    True,
    False,
    Unknown,
}

impl Tristate {
    pub fn and(self, other: Self) -> Self {
        match (self, other) {
            (Self::False, _) | (_, Self::False) => Self::False,
            (Self::True, Self::True) => Self::True,
            _ => Self::Unknown,
        }
    }

    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::True, _) | (_, Self::True) => Self::True,
            (Self::False, Self::False) => Self::False,
            _ => Self::Unknown,
        }
    }

    pub fn negate(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Unknown => Self::Unknown,
        }
    }

    /// Only a definite `True` selects a file.
    pub fn is_true(self) -> bool {
        self == Self::True
    }

    pub fn is_unknown(self) -> bool {
        self == Self::Unknown
    }
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        if value {
            Self::True
        } else {
            Self::False
        }
    }
}

impl From<Option<bool>> for Tristate {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Unknown, Self::from)
    }
}

impl BitAnd for Tristate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        self.and(rhs)
    }
}

impl BitOr for Tristate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.or(rhs)
    }
}

impl Not for Tristate {
    type Output = Self;

    fn not(self) -> Self {
        self.negate()
    }
}
