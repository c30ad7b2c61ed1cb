//! Contextual verification and tree decoration
//!
//! One check function per grammar production, descending from the
//! program root. Children are resolved before their parent is decorated,
//! declarations strictly before statements. The first error aborts the
//! whole run; nothing in the tree is meaningful after an abort.
//!
//! The defensive `_ =>` arms double-check shapes the parser already
//! guarantees; they cost nothing inside a match that is happening
//! anyway.

use std::rc::Rc;

use crate::ast::{Node, NodeKind};
use crate::env::{Defn, Environ};
use crate::error::{Result, SemanticError};
use crate::types::Type;
use crate::types::rules::{assign_compatible, binary_compatible, unary_compatible};
use crate::util::{find_similar_name, format_suggestion_hint};

/// Remaining stack (bytes) below which the expression walk grows the stack
const STACK_RED_ZONE: usize = 128 * 1024;
/// Stack growth increment (bytes)
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Verify and decorate a program tree with a fresh environment.
pub fn verify(root: &mut Node) -> Result<()> {
    Verifier::new().check_program(root)
}

/// The traversal driver. Owns the environment of one verification run.
pub struct Verifier {
    env: Environ,
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Verifier {
    /// Fresh verifier with the predefined environment.
    pub fn new() -> Self {
        Self {
            env: Environ::predefined(),
        }
    }

    /// Environment of this run (predefined names plus declarations seen
    /// so far).
    pub fn env(&self) -> &Environ {
        &self.env
    }

    /// Program root: declarations first, then statements. Statements may
    /// only reference names the declaration list already bound.
    pub fn check_program(&mut self, a: &mut Node) -> Result<()> {
        if a.kind() != NodeKind::Program {
            return Err(SemanticError::internal(
                format!("expected Program root, found {:?}", a.kind()),
                a.line(),
            ));
        }
        self.check_decl_list(a.require_child_mut(0)?)?;
        self.check_stmt_list(a.require_child_mut(1)?)
    }

    fn check_decl_list(&mut self, a: &mut Node) -> Result<()> {
        match a.kind() {
            NodeKind::Empty => Ok(()),
            NodeKind::DeclList => {
                self.check_decl_list(a.require_child_mut(0)?)?;
                self.check_decl(a.require_child_mut(1)?)
            }
            other => Err(SemanticError::internal(
                format!("expected declaration list, found {other:?}"),
                a.line(),
            )),
        }
    }

    /// One declaration: resolve the type expression once, then apply it
    /// to every identifier in the list.
    fn check_decl(&mut self, a: &mut Node) -> Result<()> {
        let ty = self.check_type(a.require_child_mut(1)?)?;
        self.check_ident_list(a.require_child_mut(0)?, &ty)
    }

    fn check_ident_list(&mut self, a: &mut Node, ty: &Type) -> Result<()> {
        match a.kind() {
            NodeKind::Empty => Ok(()),
            NodeKind::IdentList => {
                self.check_ident_list(a.require_child_mut(0)?, ty)?;
                self.declare_ident(a.require_child_mut(1)?, ty)
            }
            other => Err(SemanticError::internal(
                format!("expected identifier list, found {other:?}"),
                a.line(),
            )),
        }
    }

    /// Bind one declared identifier and decorate it with its fresh
    /// variable binding.
    fn declare_ident(&mut self, a: &mut Node, ty: &Type) -> Result<()> {
        let line = a.line();
        let name = a
            .text()
            .ok_or_else(|| SemanticError::internal("identifier node without a name", line))?
            .to_string();
        let defn = Rc::new(Defn::variable(ty.clone()));
        if self.env.enrich(&name, Rc::clone(&defn)) {
            return Err(SemanticError::redeclared(name, line));
        }
        a.decorate_binding(ty.clone(), defn)
    }

    /// Identifier reference: resolve against the environment and record
    /// both the type and the binding on the node.
    fn check_ident(&mut self, a: &mut Node) -> Result<Type> {
        let line = a.line();
        let name = a
            .text()
            .ok_or_else(|| SemanticError::internal("identifier node without a name", line))?
            .to_string();
        match self.env.lookup(&name) {
            Some(defn) => {
                let defn = Rc::clone(defn);
                let ty = defn.ty.clone();
                a.decorate_binding(ty.clone(), defn)?;
                Ok(ty)
            }
            None => {
                let candidates = self.env.names();
                let hint = format_suggestion_hint(find_similar_name(&name, &candidates, 2));
                Err(SemanticError::undeclared(name, hint, line))
            }
        }
    }

    /// Type expression: a named type, an interval, or an array.
    fn check_type(&mut self, a: &mut Node) -> Result<Type> {
        match a.kind() {
            NodeKind::Ident => self.check_type_name(a),
            NodeKind::Interval => self.check_interval(a),
            NodeKind::ArrayType => self.check_array(a),
            other => Err(SemanticError::internal(
                format!("expected type expression, found {other:?}"),
                a.line(),
            )),
        }
    }

    fn check_type_name(&mut self, a: &mut Node) -> Result<Type> {
        let line = a.line();
        let name = a
            .text()
            .ok_or_else(|| SemanticError::internal("type name node without a name", line))?
            .to_string();
        let defn = match self.env.lookup(&name) {
            Some(defn) if defn.is_type_name() => Rc::clone(defn),
            // Absent, or bound to something that is not a type.
            _ => return Err(SemanticError::unknown_type_name(name, line)),
        };
        let ty = defn.ty.clone();
        a.decorate_binding(ty.clone(), defn)?;
        Ok(ty)
    }

    fn check_interval(&mut self, a: &mut Node) -> Result<Type> {
        if a.kind() != NodeKind::Interval {
            return Err(SemanticError::internal(
                format!("expected interval, found {:?}", a.kind()),
                a.line(),
            ));
        }
        let low = self.check_bound(a.require_child_mut(0)?)?;
        let high = self.check_bound(a.require_child_mut(1)?)?;
        let ty = Type::interval(low, high);
        a.decorate(ty.clone())?;
        Ok(ty)
    }

    /// Fold a constant interval bound to its integer value: integer
    /// literals, unary plus/minus over a bound, and identifiers bound to
    /// integer constants (`max_int`). Each bound reports at its own line.
    fn check_bound(&mut self, a: &mut Node) -> Result<i64> {
        let line = a.line();
        let value = match a.kind() {
            NodeKind::IntLit => a
                .int_value()
                .ok_or_else(|| SemanticError::internal("integer literal without a value", line))?,
            NodeKind::UnaryPlus => self.check_bound(a.require_child_mut(0)?)?,
            NodeKind::UnaryMinus => self.check_bound(a.require_child_mut(0)?)?.wrapping_neg(),
            NodeKind::Ident => {
                self.check_ident(a)?;
                let folded = a
                    .decor()
                    .and_then(|d| d.defn())
                    .and_then(|d| d.const_int_value());
                match folded {
                    Some(v) => v,
                    None => {
                        return Err(SemanticError::bound_not_integer(
                            format!("`{}` is not an integer constant", a.text().unwrap_or("?")),
                            line,
                        ));
                    }
                }
            }
            NodeKind::RealLit | NodeKind::StrLit => {
                return Err(SemanticError::bound_not_integer(
                    format!("found a {} literal", if a.kind() == NodeKind::RealLit { "real" } else { "string" }),
                    line,
                ));
            }
            other => {
                return Err(SemanticError::internal(
                    format!("expected constant bound, found {other:?}"),
                    line,
                ));
            }
        };
        // Identifier bounds were decorated during resolution.
        if a.decor().is_none() {
            a.decorate(Type::Integer)?;
        }
        Ok(value)
    }

    fn check_array(&mut self, a: &mut Node) -> Result<Type> {
        let index_ty = self.check_interval(a.require_child_mut(0)?)?;
        let Type::Interval(index) = index_ty else {
            return Err(SemanticError::internal("interval check yielded a non-interval", a.line()));
        };
        let elem = self.check_type(a.require_child_mut(1)?)?;
        let ty = Type::array(index, elem);
        a.decorate(ty.clone())?;
        Ok(ty)
    }

    fn check_stmt_list(&mut self, a: &mut Node) -> Result<()> {
        match a.kind() {
            NodeKind::Empty => Ok(()),
            NodeKind::StmtList => {
                self.check_stmt_list(a.require_child_mut(0)?)?;
                self.check_stmt(a.require_child_mut(1)?)
            }
            other => Err(SemanticError::internal(
                format!("expected statement list, found {other:?}"),
                a.line(),
            )),
        }
    }

    fn check_stmt(&mut self, a: &mut Node) -> Result<()> {
        match a.kind() {
            NodeKind::Skip | NodeKind::NewLine => Ok(()),
            NodeKind::Assign => self.check_assign(a),
            NodeKind::For => {
                self.check_loop_control(a.require_child_mut(0)?)?;
                self.check_stmt_list(a.require_child_mut(1)?)
            }
            NodeKind::While => {
                self.check_condition(a, "loop condition")?;
                self.check_stmt_list(a.require_child_mut(1)?)
            }
            NodeKind::If => {
                self.check_condition(a, "condition")?;
                self.check_stmt_list(a.require_child_mut(1)?)?;
                if a.child_count() > 2 {
                    self.check_stmt_list(a.require_child_mut(2)?)?;
                }
                Ok(())
            }
            NodeKind::Write => self.check_expr_list(a.require_child_mut(0)?),
            NodeKind::Read => {
                self.check_place(a.require_child_mut(0)?)?;
                Ok(())
            }
            other => Err(SemanticError::internal(
                format!("expected statement, found {other:?}"),
                a.line(),
            )),
        }
    }

    /// First child of `a` must be a boolean expression.
    fn check_condition(&mut self, a: &mut Node, what: &str) -> Result<()> {
        let ty = self.check_expr(a.require_child_mut(0)?)?;
        if ty != Type::Boolean {
            let line = a.child(0).map_or(a.line(), Node::line);
            return Err(SemanticError::type_mismatch(
                format!("{what} has type `{ty}`, expected `boolean`"),
                line,
            ));
        }
        Ok(())
    }

    fn check_assign(&mut self, a: &mut Node) -> Result<()> {
        let target = self.check_place(a.require_child_mut(0)?)?;
        let source = self.check_expr(a.require_child_mut(1)?)?;
        let Some(rule) = assign_compatible(&target, &source) else {
            return Err(SemanticError::type_mismatch(
                format!("cannot assign `{source}` to `{target}`"),
                a.line(),
            ));
        };
        if rule.convert_source {
            a.convert_child(1)?;
        }
        a.decorate(rule.result)
    }

    /// Loop-control triple of a bounded loop: variable, start bound, end
    /// bound, each required to be in the integer kind family (intervals
    /// included) and each diagnosed independently.
    fn check_loop_control(&mut self, a: &mut Node) -> Result<()> {
        match a.kind() {
            NodeKind::Increment | NodeKind::Decrement => {
                let var_ty = self.check_ident(a.require_child_mut(0)?)?;
                if !var_ty.is_integer() {
                    let line = a.child(0).map_or(a.line(), Node::line);
                    return Err(SemanticError::type_mismatch(
                        format!("loop variable has type `{var_ty}`, expected an integer"),
                        line,
                    ));
                }
                let start_ty = self.check_expr(a.require_child_mut(1)?)?;
                if !start_ty.is_integer() {
                    let line = a.child(1).map_or(a.line(), Node::line);
                    return Err(SemanticError::type_mismatch(
                        format!("loop start bound has type `{start_ty}`, expected an integer"),
                        line,
                    ));
                }
                let end_ty = self.check_expr(a.require_child_mut(2)?)?;
                if !end_ty.is_integer() {
                    let line = a.child(2).map_or(a.line(), Node::line);
                    return Err(SemanticError::type_mismatch(
                        format!("loop end bound has type `{end_ty}`, expected an integer"),
                        line,
                    ));
                }
                Ok(())
            }
            other => Err(SemanticError::internal(
                format!("expected loop control, found {other:?}"),
                a.line(),
            )),
        }
    }

    /// Assignable/readable location: an identifier or an array access.
    fn check_place(&mut self, a: &mut Node) -> Result<Type> {
        match a.kind() {
            NodeKind::Ident => self.check_ident(a),
            NodeKind::Index => {
                let base_ty = self.check_place(a.require_child_mut(0)?)?;
                let Type::Array { elem, .. } = base_ty else {
                    let line = a.child(0).map_or(a.line(), Node::line);
                    return Err(SemanticError::indexing_non_array(line));
                };
                let index_ty = self.check_expr(a.require_child_mut(1)?)?;
                if !index_ty.is_integer() {
                    let line = a.child(1).map_or(a.line(), Node::line);
                    return Err(SemanticError::index_type_mismatch(index_ty.to_string(), line));
                }
                let elem_ty = *elem;
                a.decorate(elem_ty.clone())?;
                Ok(elem_ty)
            }
            other => Err(SemanticError::internal(
                format!("expected place, found {other:?}"),
                a.line(),
            )),
        }
    }

    fn check_expr_list(&mut self, a: &mut Node) -> Result<()> {
        match a.kind() {
            NodeKind::Empty => Ok(()),
            NodeKind::ExprList => {
                self.check_expr_list(a.require_child_mut(0)?)?;
                self.check_expr(a.require_child_mut(1)?)?;
                Ok(())
            }
            other => Err(SemanticError::internal(
                format!("expected expression list, found {other:?}"),
                a.line(),
            )),
        }
    }

    /// Expression entry point, with automatic stack growth so tree depth
    /// is bounded by memory rather than the call stack.
    fn check_expr(&mut self, a: &mut Node) -> Result<Type> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.check_expr_inner(a))
    }

    fn check_expr_inner(&mut self, a: &mut Node) -> Result<Type> {
        match a.kind() {
            NodeKind::And
            | NodeKind::Or
            | NodeKind::Eq
            | NodeKind::Ne
            | NodeKind::Lt
            | NodeKind::Le
            | NodeKind::Gt
            | NodeKind::Ge
            | NodeKind::Add
            | NodeKind::Sub
            | NodeKind::Mul
            | NodeKind::Div
            | NodeKind::Rem
            | NodeKind::Quo => self.check_binary(a),
            NodeKind::UnaryPlus | NodeKind::UnaryMinus | NodeKind::Not => self.check_unary(a),
            NodeKind::IntLit
            | NodeKind::RealLit
            | NodeKind::StrLit
            | NodeKind::Ident
            | NodeKind::Index => self.check_factor(a),
            other => Err(SemanticError::internal(
                format!("expected expression, found {other:?}"),
                a.line(),
            )),
        }
    }

    fn check_binary(&mut self, a: &mut Node) -> Result<Type> {
        let op = a.kind();
        let left = self.check_expr(a.require_child_mut(0)?)?;
        let right = self.check_expr(a.require_child_mut(1)?)?;
        let Some(rule) = binary_compatible(op, &left, &right) else {
            return Err(SemanticError::type_mismatch(
                format!("operator `{op}` cannot combine `{left}` and `{right}`"),
                a.line(),
            ));
        };
        if rule.convert_left {
            a.convert_child(0)?;
        }
        if rule.convert_right {
            a.convert_child(1)?;
        }
        a.decorate(rule.result.clone())?;
        Ok(rule.result)
    }

    fn check_unary(&mut self, a: &mut Node) -> Result<Type> {
        let op = a.kind();
        let operand = self.check_expr(a.require_child_mut(0)?)?;
        let Some(rule) = unary_compatible(op, &operand) else {
            return Err(SemanticError::type_mismatch(
                format!("operator `{op}` cannot apply to `{operand}`"),
                a.line(),
            ));
        };
        a.decorate(rule.result.clone())?;
        Ok(rule.result)
    }

    /// Expression leaf.
    fn check_factor(&mut self, a: &mut Node) -> Result<Type> {
        match a.kind() {
            NodeKind::IntLit => {
                a.decorate(Type::Integer)?;
                Ok(Type::Integer)
            }
            NodeKind::RealLit => {
                a.decorate(Type::Real)?;
                Ok(Type::Real)
            }
            NodeKind::StrLit => {
                a.decorate(Type::Str)?;
                Ok(Type::Str)
            }
            NodeKind::Ident => self.check_ident(a),
            NodeKind::Index => self.check_place(a),
            other => Err(SemanticError::internal(
                format!("expected factor, found {other:?}"),
                a.line(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Node, NodeKind};

    // --- tree builders, mirroring the parser's output shape ---

    fn program(decls: Vec<Node>, stmts: Vec<Node>) -> Node {
        Node::with_children(
            NodeKind::Program,
            1,
            vec![
                Node::list(NodeKind::DeclList, 1, decls),
                Node::list(NodeKind::StmtList, 1, stmts),
            ],
        )
    }

    fn decl(names: &[&str], ty: Node, line: u32) -> Node {
        let idents = names.iter().map(|n| Node::ident(*n, line)).collect();
        Node::with_children(
            NodeKind::Decl,
            line,
            vec![Node::list(NodeKind::IdentList, line, idents), ty],
        )
    }

    fn interval(low: i64, high: i64, line: u32) -> Node {
        Node::with_children(
            NodeKind::Interval,
            line,
            vec![Node::int(low, line), Node::int(high, line)],
        )
    }

    fn array_of(index: Node, elem: Node, line: u32) -> Node {
        Node::with_children(NodeKind::ArrayType, line, vec![index, elem])
    }

    fn assign(place: Node, expr: Node, line: u32) -> Node {
        Node::with_children(NodeKind::Assign, line, vec![place, expr])
    }

    fn binary(op: NodeKind, left: Node, right: Node, line: u32) -> Node {
        Node::with_children(op, line, vec![left, right])
    }

    fn verified(mut root: Node) -> Node {
        verify(&mut root).expect("program should verify");
        root
    }

    fn rejected(mut root: Node) -> SemanticError {
        verify(&mut root).expect_err("program should be rejected")
    }

    /// Statement at `idx` of the program's statement list (left-recursive
    /// lists put the last item at the top).
    fn stmt<'a>(root: &'a Node, idx: usize, total: usize) -> &'a Node {
        let mut list = root.child(1).unwrap();
        for _ in 0..(total - 1 - idx) {
            list = list.child(0).unwrap();
        }
        list.child(1).unwrap()
    }

    // --- declarations and type expressions ---

    #[test]
    fn test_declared_variable_enters_environment() {
        let mut root = program(vec![decl(&["x"], Node::ident("integer", 1), 1)], vec![]);
        let mut v = Verifier::new();
        v.check_program(&mut root).unwrap();
        assert_eq!(v.env().len(), 8);
        assert_eq!(v.env().lookup("x").unwrap().ty, Type::Integer);
    }

    #[test]
    fn test_declaration_decorates_each_identifier() {
        let root = verified(program(
            vec![decl(&["a", "b"], Node::ident("real", 2), 2)],
            vec![],
        ));
        let decl_node = root.child(0).unwrap().child(1).unwrap();
        let ident_list = decl_node.child(0).unwrap();
        let b = ident_list.child(1).unwrap();
        let a = ident_list.child(0).unwrap().child(1).unwrap();
        for node in [a, b] {
            assert_eq!(node.decor_type(), Some(&Type::Real));
            assert!(node.decor().unwrap().defn().is_some());
        }
    }

    #[test]
    fn test_redeclaration_rejected_with_second_line() {
        let err = rejected(program(
            vec![
                decl(&["x"], Node::ident("integer", 1), 1),
                decl(&["x"], Node::ident("integer", 2), 2),
            ],
            vec![],
        ));
        assert_eq!(err, SemanticError::redeclared("x", 2));
    }

    #[test]
    fn test_redeclaration_within_one_identifier_list() {
        let err = rejected(program(vec![decl(&["x", "x"], Node::ident("integer", 3), 3)], vec![]));
        assert!(matches!(err, SemanticError::Redeclared { .. }));
    }

    #[test]
    fn test_predefined_name_cannot_be_redeclared() {
        let err = rejected(program(vec![decl(&["true"], Node::ident("boolean", 1), 1)], vec![]));
        assert_eq!(err, SemanticError::redeclared("true", 1));
    }

    #[test]
    fn test_unknown_type_name() {
        let err = rejected(program(vec![decl(&["x"], Node::ident("quux", 4), 4)], vec![]));
        assert_eq!(err, SemanticError::unknown_type_name("quux", 4));
    }

    #[test]
    fn test_non_type_binding_used_as_type() {
        // max_int is a constant, not a type name.
        let err = rejected(program(vec![decl(&["x"], Node::ident("max_int", 1), 1)], vec![]));
        assert!(matches!(err, SemanticError::UnknownTypeName { .. }));
    }

    #[test]
    fn test_interval_declaration() {
        let mut root = program(vec![decl(&["i"], interval(1, 10, 1), 1)], vec![]);
        let mut v = Verifier::new();
        v.check_program(&mut root).unwrap();
        assert_eq!(v.env().lookup("i").unwrap().ty, Type::interval(1, 10));
        // The interval node itself is decorated.
        let ty_node = root.child(0).unwrap().child(1).unwrap().child(1).unwrap();
        assert_eq!(ty_node.decor_type(), Some(&Type::interval(1, 10)));
        assert_eq!(ty_node.child(0).unwrap().decor_type(), Some(&Type::Integer));
    }

    #[test]
    fn test_interval_bounds_fold_constants() {
        let neg = Node::with_children(NodeKind::UnaryMinus, 1, vec![Node::int(5, 1)]);
        let hi = Node::with_children(NodeKind::UnaryPlus, 1, vec![Node::ident("max_int", 1)]);
        let ty = Node::with_children(NodeKind::Interval, 1, vec![neg, hi]);
        let mut root = program(vec![decl(&["i"], ty, 1)], vec![]);
        let mut v = Verifier::new();
        v.check_program(&mut root).unwrap();
        assert_eq!(v.env().lookup("i").unwrap().ty, Type::interval(-5, i64::MAX));
    }

    #[test]
    fn test_interval_bound_boolean_constant_rejected() {
        let ty = Node::with_children(
            NodeKind::Interval,
            2,
            vec![Node::ident("true", 2), Node::int(10, 2)],
        );
        let err = rejected(program(vec![decl(&["i"], ty, 2)], vec![]));
        assert!(matches!(err, SemanticError::BoundNotInteger { .. }));
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_interval_bound_variable_rejected() {
        // Declared variables are not constants, even integer ones.
        let ty = Node::with_children(
            NodeKind::Interval,
            3,
            vec![Node::ident("n", 3), Node::int(10, 3)],
        );
        let err = rejected(program(
            vec![decl(&["n"], Node::ident("integer", 1), 1), decl(&["i"], ty, 3)],
            vec![],
        ));
        assert!(matches!(err, SemanticError::BoundNotInteger { .. }));
    }

    #[test]
    fn test_interval_bound_real_literal_rejected() {
        let ty = Node::with_children(
            NodeKind::Interval,
            1,
            vec![Node::real(1.5, 1), Node::int(10, 1)],
        );
        let err = rejected(program(vec![decl(&["i"], ty, 1)], vec![]));
        assert!(matches!(err, SemanticError::BoundNotInteger { .. }));
    }

    #[test]
    fn test_array_declaration() {
        let ty = array_of(interval(1, 10, 1), Node::ident("integer", 1), 1);
        let mut root = program(vec![decl(&["a"], ty, 1)], vec![]);
        let mut v = Verifier::new();
        v.check_program(&mut root).unwrap();
        let ty = &v.env().lookup("a").unwrap().ty;
        assert!(ty.is_array());
        assert_eq!(ty.element_type(), Some(&Type::Integer));
    }

    #[test]
    fn test_nested_array_declaration() {
        let inner = array_of(interval(0, 4, 1), Node::ident("real", 1), 1);
        let ty = array_of(interval(1, 2, 1), inner, 1);
        let mut root = program(vec![decl(&["m"], ty, 1)], vec![]);
        let mut v = Verifier::new();
        v.check_program(&mut root).unwrap();
        let elem = v.env().lookup("m").unwrap().ty.element_type().unwrap().clone();
        assert_eq!(elem.element_type(), Some(&Type::Real));
    }

    // --- statements ---

    #[test]
    fn test_assignment_decorates_with_target_type() {
        let root = verified(program(
            vec![decl(&["x"], Node::ident("integer", 1), 1)],
            vec![assign(Node::ident("x", 2), Node::int(5, 2), 2)],
        ));
        let st = stmt(&root, 0, 1);
        assert_eq!(st.decor_type(), Some(&Type::Integer));
        // No conversion inserted between same-kind operands.
        assert_eq!(st.child(1).unwrap().kind(), NodeKind::IntLit);
    }

    #[test]
    fn test_assignment_widens_integer_source() {
        let root = verified(program(
            vec![decl(&["y"], Node::ident("real", 1), 1)],
            vec![assign(Node::ident("y", 2), Node::int(5, 2), 2)],
        ));
        let st = stmt(&root, 0, 1);
        assert_eq!(st.decor_type(), Some(&Type::Real));
        let wrapper = st.child(1).unwrap();
        assert_eq!(wrapper.kind(), NodeKind::Convert);
        assert_eq!(wrapper.decor_type(), Some(&Type::Real));
        assert_eq!(wrapper.child(0).unwrap().decor_type(), Some(&Type::Integer));
    }

    #[test]
    fn test_assignment_kind_mismatch() {
        let err = rejected(program(
            vec![
                decl(&["x"], Node::ident("integer", 1), 1),
                decl(&["y"], Node::ident("boolean", 2), 2),
            ],
            vec![assign(Node::ident("x", 3), Node::ident("y", 3), 3)],
        ));
        match err {
            SemanticError::TypeMismatch { context, line } => {
                assert!(context.contains("integer") && context.contains("boolean"));
                assert_eq!(line, 3);
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_assignment_never_narrows() {
        let err = rejected(program(
            vec![decl(&["x"], Node::ident("integer", 1), 1)],
            vec![assign(Node::ident("x", 2), Node::real(1.5, 2), 2)],
        ));
        assert!(matches!(err, SemanticError::TypeMismatch { .. }));
    }

    #[test]
    fn test_undeclared_identifier() {
        let err = rejected(program(vec![], vec![assign(Node::ident("x", 5), Node::int(1, 5), 5)]));
        match err {
            SemanticError::Undeclared { name, line, .. } => {
                assert_eq!(name, "x");
                assert_eq!(line, 5);
            }
            other => panic!("expected Undeclared, got {other:?}"),
        }
    }

    #[test]
    fn test_undeclared_identifier_suggestion() {
        let err = rejected(program(
            vec![decl(&["count"], Node::ident("integer", 1), 1)],
            vec![assign(Node::ident("cuont", 2), Node::int(1, 2), 2)],
        ));
        match err {
            SemanticError::Undeclared { hint, .. } => assert!(hint.contains("`count`")),
            other => panic!("expected Undeclared, got {other:?}"),
        }
    }

    #[test]
    fn test_while_requires_boolean_condition() {
        let cond = binary(NodeKind::Lt, Node::ident("x", 2), Node::int(10, 2), 2);
        let body = Node::list(NodeKind::StmtList, 2, vec![Node::new(NodeKind::Skip, 2)]);
        let ok = program(
            vec![decl(&["x"], Node::ident("integer", 1), 1)],
            vec![Node::with_children(NodeKind::While, 2, vec![cond, body])],
        );
        verified(ok);

        let bad = program(
            vec![decl(&["x"], Node::ident("integer", 1), 1)],
            vec![Node::with_children(
                NodeKind::While,
                2,
                vec![Node::ident("x", 2), Node::list(NodeKind::StmtList, 2, vec![])],
            )],
        );
        let err = rejected(bad);
        assert!(matches!(err, SemanticError::TypeMismatch { .. }));
        assert_eq!(err.line(), 2);
    }

    #[test]
    fn test_if_with_else_branch() {
        let cond = Node::ident("b", 2);
        let then_list = Node::list(
            NodeKind::StmtList,
            3,
            vec![assign(Node::ident("x", 3), Node::int(1, 3), 3)],
        );
        let else_list = Node::list(
            NodeKind::StmtList,
            4,
            vec![assign(Node::ident("x", 4), Node::int(2, 4), 4)],
        );
        verified(program(
            vec![
                decl(&["b"], Node::ident("boolean", 1), 1),
                decl(&["x"], Node::ident("integer", 1), 1),
            ],
            vec![Node::with_children(NodeKind::If, 2, vec![cond, then_list, else_list])],
        ));
    }

    #[test]
    fn test_if_condition_must_be_boolean() {
        let err = rejected(program(
            vec![],
            vec![Node::with_children(
                NodeKind::If,
                2,
                vec![Node::int(1, 2), Node::list(NodeKind::StmtList, 2, vec![])],
            )],
        ));
        assert!(matches!(err, SemanticError::TypeMismatch { .. }));
    }

    #[test]
    fn test_for_loop_over_intervals() {
        let decls = vec![
            decl(&["i"], interval(1, 10, 1), 1),
            decl(&["lo", "hi"], interval(1, 10, 2), 2),
        ];
        let control = Node::with_children(
            NodeKind::Increment,
            3,
            vec![Node::ident("i", 3), Node::ident("lo", 3), Node::ident("hi", 3)],
        );
        let body = Node::list(NodeKind::StmtList, 3, vec![Node::new(NodeKind::Skip, 3)]);
        verified(program(
            decls,
            vec![Node::with_children(NodeKind::For, 3, vec![control, body])],
        ));
    }

    #[test]
    fn test_for_loop_over_literal_bounds() {
        // The canonical shape: plain integer variable, literal bounds.
        let control = Node::with_children(
            NodeKind::Increment,
            2,
            vec![Node::ident("i", 2), Node::int(1, 2), Node::int(10, 2)],
        );
        let body = Node::list(NodeKind::StmtList, 2, vec![Node::new(NodeKind::Skip, 2)]);
        verified(program(
            vec![decl(&["i"], Node::ident("integer", 1), 1)],
            vec![Node::with_children(NodeKind::For, 2, vec![control, body])],
        ));

        // Interval variable over literal bounds is equally fine.
        let control = Node::with_children(
            NodeKind::Decrement,
            2,
            vec![Node::ident("i", 2), Node::int(10, 2), Node::int(1, 2)],
        );
        let body = Node::list(NodeKind::StmtList, 2, vec![Node::new(NodeKind::Skip, 2)]);
        verified(program(
            vec![decl(&["i"], interval(1, 10, 1), 1)],
            vec![Node::with_children(NodeKind::For, 2, vec![control, body])],
        ));
    }

    #[test]
    fn test_for_loop_diagnoses_each_position() {
        // Variable outside the integer family: first diagnostic.
        let control = Node::with_children(
            NodeKind::Decrement,
            3,
            vec![Node::ident("b", 3), Node::int(1, 3), Node::int(10, 3)],
        );
        let err = rejected(program(
            vec![decl(&["b"], Node::ident("boolean", 1), 1)],
            vec![Node::with_children(
                NodeKind::For,
                3,
                vec![control, Node::list(NodeKind::StmtList, 3, vec![])],
            )],
        ));
        match err {
            SemanticError::TypeMismatch { context, .. } => {
                assert!(context.contains("loop variable"), "got: {context}");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }

        // Variable fine, start bound a real literal: second diagnostic.
        let control = Node::with_children(
            NodeKind::Increment,
            3,
            vec![Node::ident("i", 3), Node::real(1.5, 3), Node::ident("i", 3)],
        );
        let err = rejected(program(
            vec![decl(&["i"], interval(1, 10, 1), 1)],
            vec![Node::with_children(
                NodeKind::For,
                3,
                vec![control, Node::list(NodeKind::StmtList, 3, vec![])],
            )],
        ));
        match err {
            SemanticError::TypeMismatch { context, .. } => {
                assert!(context.contains("start bound"), "got: {context}");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }

        // Variable and start fine, end bound boolean: third diagnostic.
        let control = Node::with_children(
            NodeKind::Increment,
            3,
            vec![Node::ident("i", 3), Node::int(1, 3), Node::ident("true", 3)],
        );
        let err = rejected(program(
            vec![decl(&["i"], Node::ident("integer", 1), 1)],
            vec![Node::with_children(
                NodeKind::For,
                3,
                vec![control, Node::list(NodeKind::StmtList, 3, vec![])],
            )],
        ));
        match err {
            SemanticError::TypeMismatch { context, .. } => {
                assert!(context.contains("end bound"), "got: {context}");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_write_checks_every_expression() {
        let exprs = Node::list(
            NodeKind::ExprList,
            2,
            vec![
                Node::string("x = ", 2),
                Node::ident("x", 2),
                Node::new(NodeKind::NewLine, 2),
            ],
        );
        // NewLine inside an output list is not an expression; the parser
        // emits it as a statement, so here it must be rejected.
        let err = rejected(program(
            vec![decl(&["x"], Node::ident("integer", 1), 1)],
            vec![Node::with_children(NodeKind::Write, 2, vec![exprs])],
        ));
        assert!(matches!(err, SemanticError::Internal { .. }));

        let exprs = Node::list(
            NodeKind::ExprList,
            2,
            vec![Node::string("x = ", 2), Node::ident("x", 2)],
        );
        verified(program(
            vec![decl(&["x"], Node::ident("integer", 1), 1)],
            vec![Node::with_children(NodeKind::Write, 2, vec![exprs])],
        ));
    }

    #[test]
    fn test_read_target_must_be_a_place() {
        verified(program(
            vec![decl(&["x"], Node::ident("integer", 1), 1)],
            vec![Node::with_children(NodeKind::Read, 2, vec![Node::ident("x", 2)])],
        ));
        let err = rejected(program(
            vec![],
            vec![Node::with_children(NodeKind::Read, 2, vec![Node::int(1, 2)])],
        ));
        assert!(matches!(err, SemanticError::Internal { .. }));
    }

    // --- places and indexing ---

    #[test]
    fn test_index_decorates_with_element_type() {
        let ty = array_of(interval(1, 10, 1), Node::ident("real", 1), 1);
        let place = Node::with_children(
            NodeKind::Index,
            2,
            vec![Node::ident("a", 2), Node::int(3, 2)],
        );
        let root = verified(program(
            vec![decl(&["a"], ty, 1)],
            vec![assign(place, Node::real(0.5, 2), 2)],
        ));
        let st = stmt(&root, 0, 1);
        assert_eq!(st.child(0).unwrap().decor_type(), Some(&Type::Real));
    }

    #[test]
    fn test_index_accepts_interval_typed_index() {
        let ty = array_of(interval(1, 10, 1), Node::ident("integer", 1), 1);
        let place = Node::with_children(
            NodeKind::Index,
            3,
            vec![Node::ident("a", 3), Node::ident("i", 3)],
        );
        verified(program(
            vec![decl(&["a"], ty, 1), decl(&["i"], interval(1, 10, 2), 2)],
            vec![assign(place, Node::int(0, 3), 3)],
        ));
    }

    #[test]
    fn test_indexing_non_array() {
        let place = Node::with_children(
            NodeKind::Index,
            2,
            vec![Node::ident("x", 2), Node::int(1, 2)],
        );
        let err = rejected(program(
            vec![decl(&["x"], Node::ident("integer", 1), 1)],
            vec![assign(place, Node::int(0, 2), 2)],
        ));
        assert_eq!(err, SemanticError::indexing_non_array(2));
    }

    #[test]
    fn test_index_type_mismatch() {
        let ty = array_of(interval(1, 10, 1), Node::ident("integer", 1), 1);
        let place = Node::with_children(
            NodeKind::Index,
            2,
            vec![Node::ident("a", 2), Node::ident("true", 2)],
        );
        let err = rejected(program(
            vec![decl(&["a"], ty, 1)],
            vec![assign(place, Node::int(1, 2), 2)],
        ));
        assert_eq!(err, SemanticError::index_type_mismatch("boolean", 2));
    }

    // --- expressions ---

    #[test]
    fn test_mixed_arithmetic_wraps_integer_side() {
        let sum = binary(NodeKind::Add, Node::int(1, 2), Node::real(2.5, 2), 2);
        let root = verified(program(
            vec![decl(&["y"], Node::ident("real", 1), 1)],
            vec![assign(Node::ident("y", 2), sum, 2)],
        ));
        let st = stmt(&root, 0, 1);
        let sum = st.child(1).unwrap();
        assert_eq!(sum.kind(), NodeKind::Add);
        assert_eq!(sum.decor_type(), Some(&Type::Real));
        assert_eq!(sum.child(0).unwrap().kind(), NodeKind::Convert);
        assert_eq!(sum.child(1).unwrap().kind(), NodeKind::RealLit);
    }

    #[test]
    fn test_integer_arithmetic_inserts_nothing() {
        let sum = binary(NodeKind::Add, Node::int(1, 2), Node::int(2, 2), 2);
        let root = verified(program(
            vec![decl(&["x"], Node::ident("integer", 1), 1)],
            vec![assign(Node::ident("x", 2), sum, 2)],
        ));
        let sum = stmt(&root, 0, 1).child(1).unwrap();
        assert_eq!(sum.decor_type(), Some(&Type::Integer));
        assert_eq!(sum.child(0).unwrap().kind(), NodeKind::IntLit);
        assert_eq!(sum.child(1).unwrap().kind(), NodeKind::IntLit);
    }

    #[test]
    fn test_rem_rejects_real_operand() {
        let expr = binary(NodeKind::Rem, Node::int(5, 2), Node::real(2.0, 2), 2);
        let err = rejected(program(
            vec![decl(&["x"], Node::ident("integer", 1), 1)],
            vec![assign(Node::ident("x", 2), expr, 2)],
        ));
        match err {
            SemanticError::TypeMismatch { context, .. } => {
                assert!(context.contains("mod"), "got: {context}");
            }
            other => panic!("expected TypeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_relational_on_strings() {
        let cmp = binary(NodeKind::Eq, Node::string("a", 2), Node::string("b", 2), 2);
        verified(program(
            vec![decl(&["b"], Node::ident("boolean", 1), 1)],
            vec![assign(Node::ident("b", 2), cmp, 2)],
        ));
    }

    #[test]
    fn test_logical_and_unary_not() {
        let not = Node::with_children(NodeKind::Not, 2, vec![Node::ident("p", 2)]);
        let and = binary(NodeKind::And, not, Node::ident("q", 2), 2);
        verified(program(
            vec![decl(&["p", "q", "r"], Node::ident("boolean", 1), 1)],
            vec![assign(Node::ident("r", 2), and, 2)],
        ));
    }

    #[test]
    fn test_unary_minus_on_boolean_rejected() {
        let neg = Node::with_children(NodeKind::UnaryMinus, 2, vec![Node::ident("true", 2)]);
        let err = rejected(program(
            vec![decl(&["x"], Node::ident("integer", 1), 1)],
            vec![assign(Node::ident("x", 2), neg, 2)],
        ));
        assert!(matches!(err, SemanticError::TypeMismatch { .. }));
    }

    #[test]
    fn test_statements_see_all_prior_declarations() {
        // max_int usable as an expression; true/false as boolean constants.
        let root = verified(program(
            vec![
                decl(&["x"], Node::ident("integer", 1), 1),
                decl(&["b"], Node::ident("boolean", 2), 2),
            ],
            vec![
                assign(Node::ident("x", 3), Node::ident("max_int", 3), 3),
                assign(Node::ident("b", 4), Node::ident("false", 4), 4),
            ],
        ));
        assert_eq!(stmt(&root, 0, 2).decor_type(), Some(&Type::Integer));
        assert_eq!(stmt(&root, 1, 2).decor_type(), Some(&Type::Boolean));
    }

    // --- parser-contract violations ---

    #[test]
    fn test_non_program_root() {
        let mut root = Node::new(NodeKind::Skip, 1);
        let err = Verifier::new().check_program(&mut root).unwrap_err();
        assert!(matches!(err, SemanticError::Internal { .. }));
    }

    #[test]
    fn test_malformed_list_kind() {
        let mut root = Node::with_children(
            NodeKind::Program,
            1,
            vec![Node::new(NodeKind::Skip, 1), Node::list(NodeKind::StmtList, 1, vec![])],
        );
        let err = verify(&mut root).unwrap_err();
        assert!(matches!(err, SemanticError::Internal { .. }));
    }

    #[test]
    fn test_missing_children() {
        let mut root = Node::new(NodeKind::Program, 1);
        let err = verify(&mut root).unwrap_err();
        assert!(matches!(err, SemanticError::Internal { .. }));
    }
}
