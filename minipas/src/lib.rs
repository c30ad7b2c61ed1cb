//! Mini-Pascal contextual verifier
//!
//! Second pass of the compiler: takes the syntax tree built by the
//! parser, resolves identifiers against the environment, types every
//! expression and declaration, inserts implicit integer-to-real
//! conversions, and rejects programs that break the typing or scoping
//! rules. On success the tree comes back decorated in place, ready for
//! code generation; on failure the run aborts with the first error.

pub mod ast;
pub mod env;
pub mod error;
pub mod types;
pub mod util;
pub mod verify;

pub use error::{Result, SemanticError};
pub use verify::{Verifier, verify};
