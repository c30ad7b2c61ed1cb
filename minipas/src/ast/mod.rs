//! Abstract syntax tree definitions
//!
//! The tree arrives fully shaped from the parser; this crate only reads
//! it, decorates it, and splices conversion wrappers into it.

mod decor;
mod node;

pub use decor::*;
pub use node::*;
