//! Lexer for the inspect language.
//!
//! Tokenizes one `.ins` file. Whitespace and `//`/`/* */` comments are
//! skipped; every punctuator is a single-character token; identifiers are
//! maximal runs of non-punctuator characters, and an identifier made of
//! ASCII digits only is a number. A small keyword set is recognized after
//! identifier scanning.
//!
//! The lexer owns its source text because the inspect parser stacks
//! lexers while processing `import` directives and keeps finished ones
//! alive for error reporting and raw-text slicing.

use std::path::{Path, PathBuf};

use ingen_util::Span;

use crate::token::{InspectKind, InspectToken};

/// Lexer for one inspect source file.
pub struct InspectLexer {
    source: String,
    filename: String,
    directory: PathBuf,
    file: u32,
    pos: usize,
    line: u32,
    column: u32,
}

impl InspectLexer {
    /// Creates a lexer by reading `path` from disk.
    ///
    /// `file` is the tag stamped on every produced token; the parser uses
    /// it to find this lexer again when rendering errors.
    pub fn from_file(path: &Path, file: u32) -> std::io::Result<Self> {
        let source = std::fs::read_to_string(path)?;
        let directory = path.parent().map(PathBuf::from).unwrap_or_default();
        Ok(Self {
            source,
            filename: path.display().to_string(),
            directory,
            file,
            pos: 0,
            line: 1,
            column: 1,
        })
    }

    /// Creates a lexer over an in-memory source.
    pub fn from_source(filename: impl Into<String>, source: impl Into<String>, file: u32) -> Self {
        Self {
            source: source.into(),
            filename: filename.into(),
            directory: PathBuf::new(),
            file,
            pos: 0,
            line: 1,
            column: 1,
        }
    }

    /// Name of the file this lexer reads.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Directory of the file, used to resolve relative imports.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// The raw source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    fn at(&self, offset: usize) -> u8 {
        *self.source.as_bytes().get(self.pos + offset).unwrap_or(&0)
    }

    #[inline]
    fn bump(&mut self) {
        if self.pos >= self.source.len() {
            return;
        }
        let b = self.source.as_bytes()[self.pos];
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    fn skip_ignored(&mut self) {
        loop {
            match self.at(0) {
                b' ' | b'\t' | b'\r' | b'\n' => self.bump(),
                b'/' if self.at(1) == b'/' => {
                    while self.at(0) != b'\n' && self.at(0) != 0 {
                        self.bump();
                    }
                }
                b'/' if self.at(1) == b'*' => {
                    self.bump();
                    self.bump();
                    loop {
                        if self.at(0) == 0 {
                            return;
                        }
                        if self.at(0) == b'*' && self.at(1) == b'/' {
                            self.bump();
                            self.bump();
                            break;
                        }
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    fn token(&self, kind: InspectKind, lo: usize, line: u32, column: u32) -> InspectToken {
        InspectToken {
            kind,
            text: self.source[lo..self.pos].to_string(),
            span: Span::new(lo, self.pos, line, column),
            file: self.file,
        }
    }

    /// Produces the next token. Returns an `Eof` token at end of file and
    /// keeps returning it afterwards.
    pub fn next_token(&mut self) -> InspectToken {
        self.skip_ignored();

        let lo = self.pos;
        let line = self.line;
        let column = self.column;

        let single = match self.at(0) {
            0 => {
                return InspectToken {
                    kind: InspectKind::Eof,
                    text: String::new(),
                    span: Span::point(lo, line, column),
                    file: self.file,
                }
            }
            b'.' => Some(InspectKind::Dot),
            b',' => Some(InspectKind::Comma),
            b'(' => Some(InspectKind::LParen),
            b')' => Some(InspectKind::RParen),
            b'{' => Some(InspectKind::LBrace),
            b'}' => Some(InspectKind::RBrace),
            b'[' => Some(InspectKind::LBracket),
            b']' => Some(InspectKind::RBracket),
            b'<' => Some(InspectKind::LAngle),
            b'>' => Some(InspectKind::RAngle),
            b'\'' => Some(InspectKind::SingleQuote),
            b'+' => Some(InspectKind::Plus),
            b'-' => Some(InspectKind::Minus),
            b'*' => Some(InspectKind::Star),
            b'/' => Some(InspectKind::Slash),
            b'#' => Some(InspectKind::Pound),
            b'!' => Some(InspectKind::Bang),
            b'?' => Some(InspectKind::Question),
            b'~' => Some(InspectKind::Tilde),
            b'%' => Some(InspectKind::Percent),
            b'&' => Some(InspectKind::Ampersand),
            b'|' => Some(InspectKind::Pipe),
            b':' => Some(InspectKind::Colon),
            b';' => Some(InspectKind::Semicolon),
            b'=' => Some(InspectKind::Equals),
            _ => None,
        };

        if let Some(kind) = single {
            self.bump();
            return self.token(kind, lo, line, column);
        }

        if self.at(0) == b'"' {
            return self.lex_string(lo, line, column);
        }

        self.lex_identifier_or_number(lo, line, column)
    }

    fn lex_string(&mut self, lo: usize, line: u32, column: u32) -> InspectToken {
        self.bump(); // opening quote
        let content_lo = self.pos;
        loop {
            match self.at(0) {
                0 => {
                    return self.token(InspectKind::IncompleteString, lo, line, column);
                }
                b'"' => {
                    let text = self.source[content_lo..self.pos].to_string();
                    self.bump(); // closing quote
                    return InspectToken {
                        kind: InspectKind::Str,
                        text,
                        span: Span::new(lo, self.pos, line, column),
                        file: self.file,
                    };
                }
                _ => self.bump(),
            }
        }
    }

    fn lex_identifier_or_number(&mut self, lo: usize, line: u32, column: u32) -> InspectToken {
        let mut is_number = true;
        loop {
            let b = self.at(0);
            if is_identifier_terminator(b) {
                break;
            }
            if is_number && !b.is_ascii_digit() {
                is_number = false;
            }
            self.bump();
        }

        let text = &self.source[lo..self.pos];
        let kind = if is_number {
            InspectKind::Number
        } else {
            keyword(text).unwrap_or(InspectKind::Identifier)
        };
        self.token(kind, lo, line, column)
    }
}

/// Characters that end an identifier run (the punctuators plus
/// whitespace and NUL).
fn is_identifier_terminator(b: u8) -> bool {
    matches!(
        b,
        b'.' | b','
            | b'('
            | b')'
            | b'{'
            | b'}'
            | b'['
            | b']'
            | b'<'
            | b'>'
            | b'\''
            | b'"'
            | b'+'
            | b'-'
            | b'*'
            | b'/'
            | b'#'
            | b'!'
            | b'?'
            | b'~'
            | b'%'
            | b'&'
            | b'|'
            | b':'
            | b';'
            | b'='
            | 0
            | b'\r'
            | b'\n'
            | b'\t'
            | b' '
    )
}

fn keyword(text: &str) -> Option<InspectKind> {
    match text {
        "struct" => Some(InspectKind::Struct),
        "enum" => Some(InspectKind::Enum),
        "declare_type" => Some(InspectKind::DeclareType),
        "import" => Some(InspectKind::Import),
        "declare_attribute" => Some(InspectKind::DeclareAttribute),
        "alias_attribute" => Some(InspectKind::AliasAttribute),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<InspectToken> {
        let mut lexer = InspectLexer::from_source("test.ins", source, 0);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token.is_eof();
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn kinds(source: &str) -> Vec<InspectKind> {
        lex_all(source).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_punctuators() {
        assert_eq!(
            kinds("{};<>*&"),
            vec![
                InspectKind::LBrace,
                InspectKind::RBrace,
                InspectKind::Semicolon,
                InspectKind::LAngle,
                InspectKind::RAngle,
                InspectKind::Star,
                InspectKind::Ampersand,
                InspectKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("struct Foo declare_type import my_name"),
            vec![
                InspectKind::Struct,
                InspectKind::Identifier,
                InspectKind::DeclareType,
                InspectKind::Import,
                InspectKind::Identifier,
                InspectKind::Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens = lex_all("123 4 12a");
        assert_eq!(tokens[0].kind, InspectKind::Number);
        assert_eq!(tokens[0].text, "123");
        assert_eq!(tokens[1].kind, InspectKind::Number);
        // Mixed digits and letters are a plain identifier.
        assert_eq!(tokens[2].kind, InspectKind::Identifier);
        assert_eq!(tokens[2].text, "12a");
    }

    #[test]
    fn test_string_literal() {
        let tokens = lex_all("import \"types.ins\";");
        assert_eq!(tokens[1].kind, InspectKind::Str);
        assert_eq!(tokens[1].text, "types.ins");
        // The span covers the quotes so raw slicing keeps them.
        assert_eq!(tokens[1].span.lo, 7);
        assert_eq!(tokens[1].span.hi, 18);
    }

    #[test]
    fn test_incomplete_string() {
        let tokens = lex_all("\"oops");
        assert_eq!(tokens[0].kind, InspectKind::IncompleteString);
    }

    #[test]
    fn test_line_comments() {
        assert_eq!(
            kinds("// one\n// two\nstruct"),
            vec![InspectKind::Struct, InspectKind::Eof]
        );
    }

    #[test]
    fn test_block_comments() {
        assert_eq!(
            kinds("/* a\n b */ struct /* tail"),
            vec![InspectKind::Struct, InspectKind::Eof]
        );
    }

    #[test]
    fn test_line_tracking() {
        let tokens = lex_all("struct\n  Foo");
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.column, 3);
    }

    #[test]
    fn test_struct_declaration() {
        assert_eq!(
            kinds("struct A { Int x; };"),
            vec![
                InspectKind::Struct,
                InspectKind::Identifier,
                InspectKind::LBrace,
                InspectKind::Identifier,
                InspectKind::Identifier,
                InspectKind::Semicolon,
                InspectKind::RBrace,
                InspectKind::Semicolon,
                InspectKind::Eof,
            ]
        );
    }
}
