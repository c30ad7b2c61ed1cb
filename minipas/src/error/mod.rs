//! Semantic error types and reporting
//!
//! Verification is fail-fast: the first contextual error aborts the run,
//! so every failing verification surfaces exactly one `SemanticError`.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, SemanticError>;

/// A contextual (semantic) error, with the 1-based source line it was
/// detected on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SemanticError {
    #[error("line {line}: unknown type name `{name}`")]
    UnknownTypeName { name: String, line: u32 },

    #[error("line {line}: identifier `{name}` is already declared")]
    Redeclared { name: String, line: u32 },

    #[error("line {line}: undeclared identifier `{name}`{hint}")]
    Undeclared { name: String, hint: String, line: u32 },

    #[error("line {line}: interval bound is not an integer constant: {detail}")]
    BoundNotInteger { detail: String, line: u32 },

    /// Covers assignment, binary/unary operator, condition, and
    /// loop-control failures; `context` names the construct and the
    /// offending type(s).
    #[error("line {line}: incompatible types: {context}")]
    TypeMismatch { context: String, line: u32 },

    #[error("line {line}: cannot index a value that is not an array")]
    IndexingNonArray { line: u32 },

    #[error("line {line}: array index has type `{found}`, expected an integer or interval")]
    IndexTypeMismatch { found: String, line: u32 },

    /// Tree shape violating the parser's contract. Should never surface
    /// for trees built by the parser.
    #[error("line {line}: internal compiler error: {context}")]
    Internal { context: String, line: u32 },
}

impl SemanticError {
    pub fn unknown_type_name(name: impl Into<String>, line: u32) -> Self {
        Self::UnknownTypeName {
            name: name.into(),
            line,
        }
    }

    pub fn redeclared(name: impl Into<String>, line: u32) -> Self {
        Self::Redeclared {
            name: name.into(),
            line,
        }
    }

    pub fn undeclared(name: impl Into<String>, hint: impl Into<String>, line: u32) -> Self {
        Self::Undeclared {
            name: name.into(),
            hint: hint.into(),
            line,
        }
    }

    pub fn bound_not_integer(detail: impl Into<String>, line: u32) -> Self {
        Self::BoundNotInteger {
            detail: detail.into(),
            line,
        }
    }

    pub fn type_mismatch(context: impl Into<String>, line: u32) -> Self {
        Self::TypeMismatch {
            context: context.into(),
            line,
        }
    }

    pub fn indexing_non_array(line: u32) -> Self {
        Self::IndexingNonArray { line }
    }

    pub fn index_type_mismatch(found: impl Into<String>, line: u32) -> Self {
        Self::IndexTypeMismatch {
            found: found.into(),
            line,
        }
    }

    pub fn internal(context: impl Into<String>, line: u32) -> Self {
        Self::Internal {
            context: context.into(),
            line,
        }
    }

    /// Stable name of the error kind, for programmatic matching.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTypeName { .. } => "UnknownTypeName",
            Self::Redeclared { .. } => "Redeclared",
            Self::Undeclared { .. } => "Undeclared",
            Self::BoundNotInteger { .. } => "BoundNotInteger",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::IndexingNonArray { .. } => "IndexingNonArray",
            Self::IndexTypeMismatch { .. } => "IndexTypeMismatch",
            Self::Internal { .. } => "Internal",
        }
    }

    /// Source line the error was detected on (1-based).
    pub fn line(&self) -> u32 {
        match self {
            Self::UnknownTypeName { line, .. }
            | Self::Redeclared { line, .. }
            | Self::Undeclared { line, .. }
            | Self::BoundNotInteger { line, .. }
            | Self::TypeMismatch { line, .. }
            | Self::IndexingNonArray { line }
            | Self::IndexTypeMismatch { line, .. }
            | Self::Internal { line, .. } => *line,
        }
    }
}

/// Report error with ariadne
///
/// The tree only records line numbers, so the label covers the whole
/// offending line of `source`.
pub fn report_error(filename: &str, source: &str, error: &SemanticError) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let src = Source::from(source);
    let line_idx = error.line().saturating_sub(1) as usize;
    let span = src.line(line_idx).map(|l| l.span()).unwrap_or(0..0);

    Report::build(ReportKind::Error, (filename, span.clone()))
        .with_message(format!("{} error", error.kind()))
        .with_label(
            Label::new((filename, span))
                .with_message(error.to_string())
                .with_color(Color::Red),
        )
        .finish()
        .print((filename, src))
        .unwrap();
}
