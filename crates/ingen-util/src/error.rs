//! Error types for the generator pipeline.
//!
//! Every error carries the file name and 1-based line/column where it was
//! detected and renders as `file:line:column: message`. Stages return the
//! first error they hit; nothing is printed until the driver reports it.

use thiserror::Error;

use crate::Span;

/// What went wrong, without the location.
///
/// The variants cover the full taxonomy: lexical errors, inspect parse
/// errors, template parse errors and evaluation errors. Usage (command
/// line) errors live in the driver, which has no source location to
/// attach.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ErrorKind {
    // Lexical errors
    #[error("Incomplete string. (Are you missing a closing quote?)")]
    IncompleteString,

    // Inspect parse errors
    #[error("Expected: \"{expected}\", Found: \"{found}\"")]
    Expected { expected: String, found: String },

    #[error("Unexpected token \"{0}\"")]
    UnexpectedToken(String),

    #[error("Unexpected Identifier")]
    UnexpectedIdentifier,

    #[error("Expected identifier after \"{0}\"")]
    ExpectedIdentifierAfter(&'static str),

    #[error("Found EOF while parsing field")]
    EofInField,

    #[error("Unexpected EOF while parsing {0}")]
    EofWhileParsing(&'static str),

    #[error("Unexpected \"{found}\" while parsing argument list")]
    UnexpectedInArgumentList { found: String },

    #[error("Unable to open file \"{0}\"")]
    UnableToOpenImport(String),

    #[error("Too many nested imports (limit is {limit})")]
    ImportDepthExceeded { limit: usize },

    #[error("Unable to parse type")]
    MalformedType,

    #[error("Attribute list cannot be defined here. First attribute \"{0}\"")]
    MisplacedAttributeList(String),

    #[error("Failed to parse attribute list starting at \"{0}\"")]
    AttributeListFailed(String),

    #[error("Expected attribute")]
    ExpectedAttribute,

    #[error("Unrecognized Attribute \"{0}\"")]
    UnrecognizedAttribute(String),

    #[error("Could not resolve attribute alias \"{0}\"")]
    UnresolvedAlias(String),

    #[error("Unrecognized type \"{0}\"")]
    UnrecognizedType(String),

    #[error("Expected {expected} arguments, found {found}")]
    AttributeArity { expected: usize, found: usize },

    #[error(
        "Explicit argument name doesn't match signature, found \"{found}\" expected \"{expected}\""
    )]
    ArgumentNameMismatch { found: String, expected: String },

    // Template parse errors
    #[error("Unexpected end of file")]
    UnexpectedEnd,

    #[error("EOF reached before scope closed. Are you missing an end?")]
    UnclosedScope,

    #[error("Expected \"{0}\"")]
    ExpectedPunct(&'static str),

    #[error("Expected \"{expected}\", got \"{found}\"")]
    ExpectedGot {
        expected: &'static str,
        found: String,
    },

    #[error("Expected \"{0}\", found EOF")]
    ExpectedFoundEof(&'static str),

    #[error("Expected identifier")]
    ExpectedIdentifier,

    #[error("Invalid identifier \"{0}\"")]
    InvalidIdentifier(String),

    #[error("Expected identifier, got \"{0}\"")]
    ExpectedIdentifierGot(String),

    #[error("Expected string literal, found \"{0}\"")]
    ExpectedStringLiteral(String),

    #[error("Unmatched parenthesis")]
    UnmatchedParenthesis,

    #[error("Could not find body of for loop")]
    ForBodyNotFound,

    // Evaluation errors
    #[error("Illegal expression")]
    IllegalExpression,

    #[error("Expected expression")]
    ExpectedExpression,

    #[error("Unknown identifier \"{0}\"")]
    UnknownIdentifier(String),

    #[error("Operator \"{op}\" not valid on type \"{ty}\"")]
    InvalidOperator { op: &'static str, ty: &'static str },

    #[error("Invalid cast from type \"{wanted}\" to \"{found}\"")]
    InvalidCast {
        wanted: &'static str,
        found: &'static str,
    },

    #[error("Invalid index. Expression must evaluate to an integer or a string.")]
    InvalidIndex,

    #[error("Division by zero")]
    DivisionByZero,

    #[error("List index {index} out of range (size {size})")]
    IndexOutOfRange { index: i64, size: usize },

    #[error("Unable to find attribute \"{0}\"")]
    UnknownAttribute(String),

    #[error("Cannot access member of type \"{0}\"")]
    InvalidMemberAccess(&'static str),

    #[error("Expression does not evaluate to a bool")]
    ConditionNotBool,

    #[error("Expression must evaluate to a boolean value")]
    LoopConditionNotBool,

    #[error("Expression did not evaluate to a list")]
    NotAList,

    #[error("{0} must be followed by an L-Value")]
    PrefixStepNeedsLValue(&'static str),

    #[error("{0} must be preceded by an L-Value")]
    PostfixStepNeedsLValue(&'static str),

    #[error("Invalid Operator \"=\". Assignment only valid on L-Values")]
    AssignmentNeedsLValue,

    #[error("Could not find procedure \"{0}\"")]
    UnknownProcedure(String),

    #[error("\"{0}\" is not a procedure")]
    NotAProcedure(String),

    #[error("Call to {name} requires {expected} arguments, but was given {found}")]
    TooFewArguments {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Too many args for call to {name}, expected {expected}")]
    TooManyArguments { name: String, expected: usize },

    #[error("Reference cannot be converted to a string.")]
    NotWritable,

    #[error("Scope levels nested too deep (limit is {limit})")]
    ScopeDepthExceeded { limit: usize },

    #[error("{0}")]
    Io(String),
}

/// An error with its source location attached.
///
/// # Examples
///
/// ```
/// use ingen_util::{Error, ErrorKind, Span};
///
/// let err = Error::new("data.ins", Span::new(0, 1, 3, 7), ErrorKind::ExpectedIdentifier);
/// assert_eq!(err.to_string(), "data.ins:3:7: Expected identifier");
/// ```
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{file}:{line}:{column}: {kind}")]
pub struct Error {
    /// File the error was detected in.
    pub file: String,
    /// Line number (1-based).
    pub line: u32,
    /// Column number (1-based).
    pub column: u32,
    /// The error itself.
    pub kind: ErrorKind,
}

impl Error {
    /// Create an error located at `span` within `file`.
    pub fn new(file: impl Into<String>, span: Span, kind: ErrorKind) -> Self {
        Self {
            file: file.into(),
            line: span.line,
            column: span.column,
            kind,
        }
    }
}

/// Result alias used throughout the pipeline.
pub type Result<T> = std::result::Result<T, Error>;
