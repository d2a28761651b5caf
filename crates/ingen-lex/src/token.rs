//! Token definitions for both source languages.

use ingen_util::Span;

/// Token kinds of the inspect language.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InspectKind {
    /// End of the current file.
    Eof,

    Dot,
    Comma,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LAngle,
    RAngle,
    SingleQuote,
    Plus,
    Minus,
    Star,
    Slash,
    Pound,
    Bang,
    Question,
    Tilde,
    Percent,
    Ampersand,
    Pipe,
    Colon,
    Semicolon,
    Equals,

    Identifier,
    /// Identifier consisting only of ASCII digits.
    Number,
    /// String literal; `text` holds the contents without the quotes.
    Str,

    // Keywords
    Struct,
    /// Reserved, currently unused.
    Enum,
    DeclareType,
    Import,
    DeclareAttribute,
    AliasAttribute,

    /// Unterminated string literal.
    IncompleteString,
}

/// A token of the inspect language.
///
/// `file` is a caller-assigned tag identifying which source file the token
/// came from (the inspect parser indexes its lexer storage with it when it
/// renders error locations).
#[derive(Clone, Debug)]
pub struct InspectToken {
    pub kind: InspectKind,
    pub text: String,
    pub span: Span,
    pub file: u32,
}

impl InspectToken {
    /// True for the kinds that terminate a file.
    #[inline]
    pub fn is_eof(&self) -> bool {
        self.kind == InspectKind::Eof
    }
}

/// Token kinds of the template language.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TemplateKind {
    Eof,
    /// A run of literal text (no newline, no `$`).
    Text,
    /// A literal newline in text mode.
    TextNewLine,

    Comma,
    Dot,
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    LParen,
    RParen,
    LBracket,
    RBracket,
    EqEq,
    NotEq,
    Gt,
    Lt,
    GtEq,
    LtEq,
    OrOr,
    AndAnd,
    PlusPlus,
    MinusMinus,
    Assign,
    Semicolon,

    Identifier,
    Number,
    /// String literal; `text` holds the contents without the quotes.
    Str,

    // Keywords
    If,
    End,
    ForEach,
    For,
    In,
    IgnoreNewLine,
    Define,
    Definitions,
    BeginTab,
    HasAttribute,
    Breakpoint,

    /// A character no expression-mode rule accepts (e.g. a lone `&`).
    Unknown,
    /// Unterminated string literal.
    IncompleteString,
}

/// A token of the template language.
#[derive(Clone, Debug)]
pub struct TemplateToken {
    pub kind: TemplateKind,
    pub text: String,
    pub span: Span,
    /// True when this token is the first one produced after the lexer
    /// crossed a `$` boundary (in either direction). The evaluator relies
    /// on this to find the body of a `for` loop, whose header it skips
    /// without evaluating.
    pub first_after_switch: bool,
}

impl TemplateToken {
    /// True when this token opens a block that is closed by `end`.
    #[inline]
    pub fn starts_scope(&self) -> bool {
        matches!(
            self.kind,
            TemplateKind::ForEach
                | TemplateKind::For
                | TemplateKind::If
                | TemplateKind::Define
                | TemplateKind::Definitions
                | TemplateKind::BeginTab
        )
    }
}
