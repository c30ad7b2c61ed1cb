//! Node decoration: resolved type and binding

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::env::Defn;
use crate::types::Type;

/// Decoration attached to a node after successful verification.
///
/// Every value-denoting node gets a type; identifier references
/// additionally record the binding they resolved to. A decoration is
/// never replaced once set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decor {
    ty: Type,
    defn: Option<Rc<Defn>>,
}

impl Decor {
    pub fn new(ty: Type) -> Self {
        Self { ty, defn: None }
    }

    pub fn with_binding(ty: Type, defn: Rc<Defn>) -> Self {
        Self {
            ty,
            defn: Some(defn),
        }
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn defn(&self) -> Option<&Rc<Defn>> {
        self.defn.as_ref()
    }
}
