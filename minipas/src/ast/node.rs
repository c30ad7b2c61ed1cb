//! The homogeneous syntax tree node
//!
//! One node type for every grammar production: a kind tag, up to three
//! exclusively owned children, a source line, and an optional literal
//! payload. The verifier walks the tags exhaustively, so adding a kind
//! without handling it fails to compile in `verify`.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::Decor;
use crate::env::Defn;
use crate::error::{Result, SemanticError};
use crate::types::Type;

/// Node kind tag, the closed set produced by the parser plus `Convert`,
/// which only the verifier creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Empty list / absent branch
    Empty,
    /// Root: declarations then statements
    Program,
    DeclList,
    /// One declaration: identifier list, type expression
    Decl,
    IdentList,
    StmtList,
    ExprList,

    /// Identifier occurrence (payload: name)
    Ident,
    /// Integer literal (payload: value)
    IntLit,
    /// Real literal (payload: value)
    RealLit,
    /// String literal (payload: text)
    StrLit,

    /// Interval type expression: low bound, high bound
    Interval,
    /// Array type expression: interval, element type
    ArrayType,

    /// No-op statement
    Skip,
    /// End-of-line output statement
    NewLine,
    /// Assignment: place, expression
    Assign,
    /// Bounded loop: loop control, body
    For,
    /// Conditional loop: condition, body
    While,
    /// Conditional branch: condition, then-list, else-list
    If,
    /// Output: expression list
    Write,
    /// Input: place
    Read,
    /// Ascending loop control: variable, start, end
    Increment,
    /// Descending loop control: variable, start, end
    Decrement,

    /// Array access: place, index expression
    Index,

    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Quo,
    UnaryPlus,
    UnaryMinus,
    Not,

    /// Integer-to-real conversion wrapper, inserted by the verifier
    Convert,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::And => write!(f, "and"),
            NodeKind::Or => write!(f, "or"),
            NodeKind::Not => write!(f, "not"),
            NodeKind::Eq => write!(f, "="),
            NodeKind::Ne => write!(f, "/="),
            NodeKind::Lt => write!(f, "<"),
            NodeKind::Le => write!(f, "<="),
            NodeKind::Gt => write!(f, ">"),
            NodeKind::Ge => write!(f, ">="),
            NodeKind::Add | NodeKind::UnaryPlus => write!(f, "+"),
            NodeKind::Sub | NodeKind::UnaryMinus => write!(f, "-"),
            NodeKind::Mul => write!(f, "*"),
            NodeKind::Div => write!(f, "/"),
            NodeKind::Rem => write!(f, "mod"),
            NodeKind::Quo => write!(f, "div"),
            other => write!(f, "{other:?}"),
        }
    }
}

/// Literal payload of a leaf node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Int(i64),
    Real(f64),
    Str(String),
}

/// A syntax tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    kind: NodeKind,
    line: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<Payload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    decor: Option<Decor>,
}

impl Node {
    /// Leaf node without payload.
    pub fn new(kind: NodeKind, line: u32) -> Self {
        Self {
            kind,
            line,
            children: Vec::new(),
            payload: None,
            decor: None,
        }
    }

    /// Interior node. The grammar never needs more than three children.
    pub fn with_children(kind: NodeKind, line: u32, children: Vec<Node>) -> Self {
        debug_assert!(children.len() <= 3, "nodes carry at most 3 children");
        Self {
            kind,
            line,
            children,
            payload: None,
            decor: None,
        }
    }

    pub fn ident(name: impl Into<String>, line: u32) -> Self {
        let mut node = Self::new(NodeKind::Ident, line);
        node.payload = Some(Payload::Str(name.into()));
        node
    }

    pub fn int(value: i64, line: u32) -> Self {
        let mut node = Self::new(NodeKind::IntLit, line);
        node.payload = Some(Payload::Int(value));
        node
    }

    pub fn real(value: f64, line: u32) -> Self {
        let mut node = Self::new(NodeKind::RealLit, line);
        node.payload = Some(Payload::Real(value));
        node
    }

    pub fn string(text: impl Into<String>, line: u32) -> Self {
        let mut node = Self::new(NodeKind::StrLit, line);
        node.payload = Some(Payload::Str(text.into()));
        node
    }

    /// Folds `items` into the grammar's left-recursive list shape:
    /// `Empty`, or `kind(rest, item)`.
    pub fn list(kind: NodeKind, line: u32, items: Vec<Node>) -> Self {
        items.into_iter().fold(Self::new(NodeKind::Empty, line), |rest, item| {
            let line = item.line;
            Self::with_children(kind, line, vec![rest, item])
        })
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn child(&self, slot: usize) -> Option<&Node> {
        self.children.get(slot)
    }

    /// Child access where absence is a parser-contract violation.
    pub fn require_child_mut(&mut self, slot: usize) -> Result<&mut Node> {
        let (kind, line) = (self.kind, self.line);
        self.children
            .get_mut(slot)
            .ok_or_else(|| SemanticError::internal(format!("{kind:?} node is missing child {slot}"), line))
    }

    /// Identifier name or string literal text.
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Some(Payload::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn int_value(&self) -> Option<i64> {
        match self.payload {
            Some(Payload::Int(v)) => Some(v),
            _ => None,
        }
    }

    pub fn real_value(&self) -> Option<f64> {
        match self.payload {
            Some(Payload::Real(v)) => Some(v),
            _ => None,
        }
    }

    pub fn decor(&self) -> Option<&Decor> {
        self.decor.as_ref()
    }

    /// Resolved type, if this node has been decorated.
    pub fn decor_type(&self) -> Option<&Type> {
        self.decor.as_ref().map(Decor::ty)
    }

    /// Attach the resolved type. Each node is decorated exactly once;
    /// a second attempt is an internal error.
    pub fn decorate(&mut self, ty: Type) -> Result<()> {
        self.set_decor(Decor::new(ty))
    }

    /// Attach the resolved type together with the binding an identifier
    /// reference resolved to.
    pub fn decorate_binding(&mut self, ty: Type, defn: Rc<Defn>) -> Result<()> {
        self.set_decor(Decor::with_binding(ty, defn))
    }

    fn set_decor(&mut self, decor: Decor) -> Result<()> {
        if self.decor.is_some() {
            return Err(SemanticError::internal(
                format!("{:?} node decorated twice", self.kind),
                self.line,
            ));
        }
        self.decor = Some(decor);
        Ok(())
    }

    /// Splice an integer-to-real conversion around the child at `slot`:
    /// the child moves under a fresh `Convert` wrapper which takes the
    /// child's line, is decorated `real`, and takes the child's place.
    /// The inner node keeps its own line and decoration.
    pub fn convert_child(&mut self, slot: usize) -> Result<()> {
        if slot >= self.children.len() {
            return Err(SemanticError::internal(
                format!("{:?} node has no child {slot} to convert", self.kind),
                self.line,
            ));
        }
        let inner = self.children.remove(slot);
        let mut wrapper = Node::new(NodeKind::Convert, inner.line);
        wrapper.decor = Some(Decor::new(Type::Real));
        wrapper.children.push(inner);
        self.children.insert(slot, wrapper);
        Ok(())
    }

    /// Serialize the (decorated) tree for the downstream consumer.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
