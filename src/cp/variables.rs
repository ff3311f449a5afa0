//! CP variable types.

use std::ops::Not;

/// Handle to a boolean variable inside a [`CpModel`](super::CpModel).
///
/// Only meaningful for the model that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(pub(crate) usize);

impl VarId {
    /// Position of the variable in the model (and in solution vectors).
    pub fn index(self) -> usize {
        self.0
    }
}

/// A boolean variable (true/false decision).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoolVar {
    /// Variable name, for diagnostics.
    pub name: String,
    /// Fixed value, if any.
    pub fixed: Option<bool>,
}

impl BoolVar {
    /// Creates a new boolean variable.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fixed: None,
        }
    }

    /// Creates a fixed boolean variable.
    pub fn fixed(name: impl Into<String>, value: bool) -> Self {
        Self {
            name: name.into(),
            fixed: Some(value),
        }
    }
}

/// A variable or its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal {
    pub var: VarId,
    pub negated: bool,
}

impl Literal {
    /// Truth value of this literal given the variable's value.
    pub fn eval(self, value: bool) -> bool {
        value != self.negated
    }
}

impl From<VarId> for Literal {
    fn from(var: VarId) -> Self {
        Literal {
            var,
            negated: false,
        }
    }
}

impl Not for VarId {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal {
            var: self,
            negated: true,
        }
    }
}

impl Not for Literal {
    type Output = Literal;

    fn not(self) -> Literal {
        Literal {
            var: self.var,
            negated: !self.negated,
        }
    }
}
