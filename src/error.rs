//! Error types for compiling and matching grape patterns.

use thiserror::Error;

/// Lexical errors raised while scanning pattern source.
///
/// Doubles as the `logos` error type, hence the `Default` variant: input no
/// token rule accepts surfaces as [`ScanErrorKind::Unexpected`] and the
/// scanner narrows it down from the offending slice.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanErrorKind {
    /// A `=/` literal reached the end of input before its closing `/`.
    #[error("unterminated regular expression literal")]
    UnterminatedRegex,

    /// A `=` inside a capture that does not open a `=/` literal.
    #[error("expected `/` after `=`")]
    ExpectedSlash,

    /// A line ended while a `(` capture was still open.
    #[error("capture is missing its closing `)`")]
    UnclosedCapture,

    #[default]
    #[error("unexpected character")]
    Unexpected,
}

/// What went wrong while compiling a pattern.
#[derive(Error, Debug)]
pub enum CompileErrorKind {
    #[error(transparent)]
    Scan(#[from] ScanErrorKind),

    /// The selector compiler rejected a selector.
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    #[error("invalid regular expression: {0}")]
    Regex(#[from] regex::Error),

    /// A line is indented deeper than its block but nothing precedes it.
    #[error("indented line has no parent pattern")]
    UnexpectedIndent,

    #[error("a line holds a single selector, found extra `{0}`")]
    ExtraSelector(String),

    #[error("capture has no attribute")]
    EmptyCapture,

    #[error("capture on `{0}` has no targets")]
    NoTargets(String),

    #[error("regular expression has {groups} capture groups for {targets} targets")]
    MissingGroups { groups: usize, targets: usize },

    #[error("capture already has a regular expression")]
    DuplicateRegex,

    #[error("`(` inside an open capture")]
    NestedCapture,

    #[error("`)` without a matching `(`")]
    UnmatchedBracket,

    #[error("empty segment in target `{0}`")]
    EmptySegment(String),

    #[error("unexpected {0}")]
    UnexpectedToken(String),
}

/// A compile failure together with the 1-based source line it occurred on.
#[derive(Error, Debug)]
#[error("line {line}: {kind}")]
pub struct CompileError {
    pub line: usize,
    pub kind: CompileErrorKind,
}

impl CompileError {
    pub fn new(line: usize, kind: impl Into<CompileErrorKind>) -> Self {
        Self {
            line,
            kind: kind.into(),
        }
    }
}

/// Errors raised while registering filters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("filter name {0:?} is not a valid identifier")]
    InvalidName(String),
}

/// Errors raised while storing a captured value into a record field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("no field named `{0}`")]
    UnknownField(String),

    #[error("{value:?} is not a valid {kind}")]
    Parse { value: String, kind: &'static str },

    #[error("{value:?} overflows {kind}")]
    Overflow { value: String, kind: &'static str },
}

/// Errors that abort a whole find call.
#[derive(Error, Debug)]
pub enum FindError {
    #[error("{0:?} is not a defined filter")]
    UnknownFilter(String),

    #[error("cannot assign to {field}: {source}")]
    Assign { field: String, source: FieldError },

    /// A required top-level pattern matched nothing in the document.
    #[error("no match for required pattern `{selector}`")]
    NoMatch { selector: String },
}
