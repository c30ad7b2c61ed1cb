//! Types of the Mini-Pascal language
//!
//! Primitive types are singletons identified by kind. Interval and array
//! types are structural and built per occurrence; the verifier never
//! compares them for identity, only through the rules in [`rules`].

pub mod rules;

use serde::{Deserialize, Serialize};

/// Bounds of an interval type, both inclusive.
///
/// Bounds come from constant folding of the interval's bound expressions;
/// no ordering is enforced (`5..1` is a legal, empty interval).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalType {
    pub low: i64,
    pub high: i64,
}

impl IntervalType {
    pub fn new(low: i64, high: i64) -> Self {
        Self { low, high }
    }
}

impl std::fmt::Display for IntervalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.low, self.high)
    }
}

/// A Mini-Pascal type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Type {
    Integer,
    Real,
    Boolean,
    /// String literals and the predefined `string` type name
    Str,
    /// Bounded integer range. An interval value is usable wherever an
    /// integer is required (integer subtype); the reverse needs no
    /// conversion either, since bounds never participate in
    /// compatibility.
    Interval(IntervalType),
    /// Array indexed by an interval
    Array {
        index: IntervalType,
        elem: Box<Type>,
    },
}

impl Type {
    /// Fresh interval type. No interning: two identical declarations
    /// yield two distinct (but interchangeable) instances.
    pub fn interval(low: i64, high: i64) -> Type {
        Type::Interval(IntervalType::new(low, high))
    }

    /// Fresh array type over `index` with `elem` elements.
    pub fn array(index: IntervalType, elem: Type) -> Type {
        Type::Array {
            index,
            elem: Box::new(elem),
        }
    }

    /// Integer kind family: `integer` itself or any interval.
    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Integer | Type::Interval(_))
    }

    pub fn is_real(&self) -> bool {
        matches!(self, Type::Real)
    }

    /// Operand acceptable to the arithmetic and relational rules.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_real()
    }

    pub fn is_interval(&self) -> bool {
        matches!(self, Type::Interval(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Type::Array { .. })
    }

    pub fn index_type(&self) -> Option<&IntervalType> {
        match self {
            Type::Array { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Type::Array { elem, .. } => Some(elem),
            _ => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Integer => write!(f, "integer"),
            Type::Real => write!(f, "real"),
            Type::Boolean => write!(f, "boolean"),
            Type::Str => write!(f, "string"),
            Type::Interval(iv) => write!(f, "{iv}"),
            Type::Array { index, elem } => write!(f, "array[{index}] of {elem}"),
        }
    }
}
