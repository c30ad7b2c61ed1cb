//! Identifier environment (symbol table)
//!
//! One flat scope per verification run: the grammar has no nested blocks,
//! so shadowing never arises and a second binding for a name is always a
//! redeclaration. The environment owns its bindings; decorations share
//! them through `Rc`.

use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::types::Type;

/// Value of a predefined constant binding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    Int(i64),
    Bool(bool),
}

/// What a name is bound to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DefnKind {
    /// Names usable in a type expression (`integer`, `real`, ...)
    TypeName,
    /// Declared program variable
    Variable,
    /// Constant with a fixed value (`true`, `false`, `max_int`)
    Constant(ConstValue),
}

/// A symbol table entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defn {
    pub kind: DefnKind,
    pub ty: Type,
}

impl Defn {
    pub fn type_name(ty: Type) -> Self {
        Self {
            kind: DefnKind::TypeName,
            ty,
        }
    }

    pub fn variable(ty: Type) -> Self {
        Self {
            kind: DefnKind::Variable,
            ty,
        }
    }

    pub fn const_int(value: i64) -> Self {
        Self {
            kind: DefnKind::Constant(ConstValue::Int(value)),
            ty: Type::Integer,
        }
    }

    pub fn const_bool(value: bool) -> Self {
        Self {
            kind: DefnKind::Constant(ConstValue::Bool(value)),
            ty: Type::Boolean,
        }
    }

    pub fn is_type_name(&self) -> bool {
        matches!(self.kind, DefnKind::TypeName)
    }

    /// Integer value if this binding is an integer constant.
    pub fn const_int_value(&self) -> Option<i64> {
        match self.kind {
            DefnKind::Constant(ConstValue::Int(v)) => Some(v),
            _ => None,
        }
    }
}

/// The identifier environment.
#[derive(Debug, Clone, Default)]
pub struct Environ {
    table: HashMap<String, Rc<Defn>>,
}

impl Environ {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Environment holding the seven predefined names, the state every
    /// verification run starts from.
    pub fn predefined() -> Self {
        let mut env = Self::empty();
        env.enrich("integer", Rc::new(Defn::type_name(Type::Integer)));
        env.enrich("real", Rc::new(Defn::type_name(Type::Real)));
        env.enrich("boolean", Rc::new(Defn::type_name(Type::Boolean)));
        env.enrich("string", Rc::new(Defn::type_name(Type::Str)));
        env.enrich("true", Rc::new(Defn::const_bool(true)));
        env.enrich("false", Rc::new(Defn::const_bool(false)));
        env.enrich("max_int", Rc::new(Defn::const_int(i64::MAX)));
        env
    }

    /// Insert a binding. Returns `true` when `name` was already bound,
    /// in which case the existing binding stays in place and the caller
    /// must report a redeclaration.
    pub fn enrich(&mut self, name: &str, defn: Rc<Defn>) -> bool {
        if self.table.contains_key(name) {
            return true;
        }
        self.table.insert(name.to_string(), defn);
        false
    }

    pub fn lookup(&self, name: &str) -> Option<&Rc<Defn>> {
        self.table.get(name)
    }

    /// All bound names, for "did you mean" suggestions.
    pub fn names(&self) -> Vec<&str> {
        self.table.keys().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
