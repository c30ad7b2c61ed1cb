//! Type compatibility rules
//!
//! Pure decision functions: given operand types they answer whether the
//! operation is legal, which result type it yields, and which operand
//! needs an implicit integer-to-real widening. The verifier owns the
//! diagnostics and the actual conversion splicing; nothing here touches
//! the tree.
//!
//! Widening only ever goes integer -> real. Intervals sit in the integer
//! kind family, so they follow every integer rule; their bounds are
//! irrelevant to compatibility.

use super::Type;
use crate::ast::NodeKind;

/// Outcome of a legal assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct AssignRule {
    /// Type the assignment node decorates with (the target's type).
    pub result: Type,
    /// Source operand must be wrapped in a real conversion.
    pub convert_source: bool,
}

/// Outcome of a legal binary operation.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryRule {
    pub result: Type,
    pub convert_left: bool,
    pub convert_right: bool,
}

/// Outcome of a legal unary operation.
#[derive(Debug, Clone, PartialEq)]
pub struct UnaryRule {
    pub result: Type,
}

/// Same-kind check used by assignment: primitive kinds match exactly,
/// the integer family matches itself, arrays match when their element
/// kinds match recursively. Interval bounds and array index bounds are
/// never compared.
fn same_kind(a: &Type, b: &Type) -> bool {
    match (a, b) {
        _ if a.is_integer() && b.is_integer() => true,
        (Type::Real, Type::Real) => true,
        (Type::Boolean, Type::Boolean) => true,
        (Type::Str, Type::Str) => true,
        (Type::Array { elem: ea, .. }, Type::Array { elem: eb, .. }) => same_kind(ea, eb),
        _ => false,
    }
}

/// Assignment compatibility: `target := source`.
///
/// Legal when the kinds match, or when a real target receives an integer
/// source (the source gets widened). Everything else is rejected;
/// real -> integer in particular never narrows.
pub fn assign_compatible(target: &Type, source: &Type) -> Option<AssignRule> {
    if same_kind(target, source) {
        return Some(AssignRule {
            result: target.clone(),
            convert_source: false,
        });
    }
    if target.is_real() && source.is_integer() {
        return Some(AssignRule {
            result: target.clone(),
            convert_source: true,
        });
    }
    None
}

/// Binary operator compatibility.
///
/// `op` must be one of the binary operator node kinds; anything else is
/// rejected (the verifier treats that as a parser-contract violation).
pub fn binary_compatible(op: NodeKind, left: &Type, right: &Type) -> Option<BinaryRule> {
    match op {
        // Arithmetic, including real division: result is real as soon as
        // one side is, and the integer side (if any) gets widened.
        NodeKind::Add | NodeKind::Sub | NodeKind::Mul | NodeKind::Div => {
            if !left.is_numeric() || !right.is_numeric() {
                return None;
            }
            Some(BinaryRule {
                result: if left.is_real() || right.is_real() {
                    Type::Real
                } else {
                    Type::Integer
                },
                convert_left: left.is_integer() && right.is_real(),
                convert_right: right.is_integer() && left.is_real(),
            })
        }

        // Integer-only operators: no widening at all.
        NodeKind::Rem | NodeKind::Quo => {
            if left.is_integer() && right.is_integer() {
                Some(BinaryRule {
                    result: Type::Integer,
                    convert_left: false,
                    convert_right: false,
                })
            } else {
                None
            }
        }

        // Relational: numeric operands widen like arithmetic but the
        // result is boolean; non-numeric operands must match kinds.
        NodeKind::Eq
        | NodeKind::Ne
        | NodeKind::Lt
        | NodeKind::Le
        | NodeKind::Gt
        | NodeKind::Ge => {
            if left.is_numeric() && right.is_numeric() {
                Some(BinaryRule {
                    result: Type::Boolean,
                    convert_left: left.is_integer() && right.is_real(),
                    convert_right: right.is_integer() && left.is_real(),
                })
            } else if matches!(
                (left, right),
                (Type::Boolean, Type::Boolean) | (Type::Str, Type::Str)
            ) {
                Some(BinaryRule {
                    result: Type::Boolean,
                    convert_left: false,
                    convert_right: false,
                })
            } else {
                None
            }
        }

        NodeKind::And | NodeKind::Or => {
            if matches!((left, right), (Type::Boolean, Type::Boolean)) {
                Some(BinaryRule {
                    result: Type::Boolean,
                    convert_left: false,
                    convert_right: false,
                })
            } else {
                None
            }
        }

        _ => None,
    }
}

/// Unary operator compatibility.
pub fn unary_compatible(op: NodeKind, operand: &Type) -> Option<UnaryRule> {
    match op {
        NodeKind::UnaryPlus | NodeKind::UnaryMinus => {
            if operand.is_real() {
                Some(UnaryRule { result: Type::Real })
            } else if operand.is_integer() {
                // Negating an interval value escapes its declared bounds,
                // so the result falls back to plain integer.
                Some(UnaryRule {
                    result: Type::Integer,
                })
            } else {
                None
            }
        }
        NodeKind::Not => {
            if matches!(operand, Type::Boolean) {
                Some(UnaryRule {
                    result: Type::Boolean,
                })
            } else {
                None
            }
        }
        _ => None,
    }
}
