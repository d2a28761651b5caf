//! Dual-mode lexer for the template language.
//!
//! The lexer alternates between two modes, switching every time it meets
//! a `$`:
//!
//! - **Text mode** produces maximal literal runs ([`TemplateKind::Text`]),
//!   newline tokens ([`TemplateKind::TextNewLine`]) and `Eof`. Text runs
//!   never contain `$`, `\n` or NUL.
//! - **Expression mode** skips whitespace and produces identifiers,
//!   numbers, strings, keywords and punctuators, including the
//!   two-character operators `==  !=  <=  >=  &&  ||  ++  --`.
//!
//! The `$` characters themselves never become tokens, so the parser
//! cannot see region boundaries directly. Instead each produced token
//! carries a `first_after_switch` flag: it is set on the first token after
//! any boundary crossing, whether a text token preceded the `$` ("will
//! cross") or the crossing produced no token at all, as in an empty `$$`
//! region ("silently crossed").

use ingen_util::Span;

use crate::cursor::Cursor;
use crate::token::{TemplateKind, TemplateToken};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Text,
    Expression,
}

/// Lexer over one template file.
pub struct TemplateLexer<'a> {
    cursor: Cursor<'a>,
    mode: Mode,
    /// A text token just ended at a `$`; flag the next token.
    will_cross: bool,
    /// The current fetch crossed a boundary without emitting a token.
    silently_crossed: bool,
}

impl<'a> TemplateLexer<'a> {
    /// Creates a lexer over `source`, starting in text mode.
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
            mode: Mode::Text,
            will_cross: false,
            silently_crossed: false,
        }
    }

    /// The full template source.
    pub fn source(&self) -> &'a str {
        self.cursor.source()
    }

    /// Produces the next token, with its boundary flag filled in.
    pub fn next_token(&mut self) -> TemplateToken {
        let pending_cross = self.will_cross;
        self.will_cross = false;
        self.silently_crossed = false;

        let mut token = match self.mode {
            Mode::Text => self.text_next(),
            Mode::Expression => self.expression_next(),
        };
        token.first_after_switch = pending_cross || self.silently_crossed;
        token
    }

    fn make(&self, kind: TemplateKind, lo: usize, hi: usize, line: u32, column: u32) -> TemplateToken {
        TemplateToken {
            kind,
            text: self.cursor.source()[lo..hi].to_string(),
            span: Span::new(lo, hi, line, column),
            first_after_switch: false,
        }
    }

    fn text_next(&mut self) -> TemplateToken {
        let lo = self.cursor.position();
        let line = self.cursor.line();
        let column = self.cursor.column();

        if self.cursor.is_at_end() {
            return self.make(TemplateKind::Eof, lo, lo, line, column);
        }

        if self.cursor.current() == '\n' {
            self.cursor.advance();
            return self.make(TemplateKind::TextNewLine, lo, lo + 1, line, column);
        }

        loop {
            match self.cursor.current() {
                '$' => {
                    let hi = self.cursor.position();
                    self.cursor.advance();
                    self.mode = Mode::Expression;

                    if hi == lo {
                        // The file starts with '$', or two '$' touch.
                        self.silently_crossed = true;
                        return self.expression_next();
                    }

                    self.will_cross = true;
                    return self.make(TemplateKind::Text, lo, hi, line, column);
                }
                '\n' | '\0' => {
                    let hi = self.cursor.position();
                    return self.make(TemplateKind::Text, lo, hi, line, column);
                }
                _ => self.cursor.advance(),
            }
        }
    }

    fn expression_next(&mut self) -> TemplateToken {
        while matches!(self.cursor.current(), ' ' | '\t' | '\r' | '\n') {
            self.cursor.advance();
        }

        let lo = self.cursor.position();
        let line = self.cursor.line();
        let column = self.cursor.column();

        match self.cursor.current() {
            '$' => {
                self.cursor.advance();
                self.mode = Mode::Text;
                self.silently_crossed = true;
                return self.text_next();
            }
            '\0' => return self.make(TemplateKind::Eof, lo, lo, line, column),
            '"' => return self.lex_string(lo, line, column),
            _ => {}
        }

        let single = |kind| (kind, 1usize);
        let double = |kind| (kind, 2usize);
        let pair = match self.cursor.current() {
            ',' => Some(single(TemplateKind::Comma)),
            '.' => Some(single(TemplateKind::Dot)),
            '*' => Some(single(TemplateKind::Star)),
            '/' => Some(single(TemplateKind::Slash)),
            '(' => Some(single(TemplateKind::LParen)),
            ')' => Some(single(TemplateKind::RParen)),
            '[' => Some(single(TemplateKind::LBracket)),
            ']' => Some(single(TemplateKind::RBracket)),
            ';' => Some(single(TemplateKind::Semicolon)),
            '+' => Some(if self.cursor.peek(1) == '+' {
                double(TemplateKind::PlusPlus)
            } else {
                single(TemplateKind::Plus)
            }),
            '-' => Some(if self.cursor.peek(1) == '-' {
                double(TemplateKind::MinusMinus)
            } else {
                single(TemplateKind::Minus)
            }),
            '<' => Some(if self.cursor.peek(1) == '=' {
                double(TemplateKind::LtEq)
            } else {
                single(TemplateKind::Lt)
            }),
            '>' => Some(if self.cursor.peek(1) == '=' {
                double(TemplateKind::GtEq)
            } else {
                single(TemplateKind::Gt)
            }),
            '=' => Some(if self.cursor.peek(1) == '=' {
                double(TemplateKind::EqEq)
            } else {
                single(TemplateKind::Assign)
            }),
            '!' => Some(if self.cursor.peek(1) == '=' {
                double(TemplateKind::NotEq)
            } else {
                single(TemplateKind::Bang)
            }),
            '&' => Some(if self.cursor.peek(1) == '&' {
                double(TemplateKind::AndAnd)
            } else {
                single(TemplateKind::Unknown)
            }),
            '|' => Some(if self.cursor.peek(1) == '|' {
                double(TemplateKind::OrOr)
            } else {
                single(TemplateKind::Unknown)
            }),
            _ => None,
        };

        if let Some((kind, width)) = pair {
            for _ in 0..width {
                self.cursor.advance();
            }
            return self.make(kind, lo, lo + width, line, column);
        }

        self.lex_identifier_or_number(lo, line, column)
    }

    fn lex_string(&mut self, lo: usize, line: u32, column: u32) -> TemplateToken {
        self.cursor.advance(); // opening quote
        let content_lo = self.cursor.position();
        loop {
            match self.cursor.current() {
                '\0' => {
                    let mut token =
                        self.make(TemplateKind::IncompleteString, lo, self.cursor.position(), line, column);
                    token.text = self.cursor.source()[content_lo..].to_string();
                    return token;
                }
                '"' => {
                    let text = self.cursor.source()[content_lo..self.cursor.position()].to_string();
                    self.cursor.advance(); // closing quote
                    let mut token =
                        self.make(TemplateKind::Str, lo, self.cursor.position(), line, column);
                    token.text = text;
                    return token;
                }
                _ => self.cursor.advance(),
            }
        }
    }

    fn lex_identifier_or_number(&mut self, lo: usize, line: u32, column: u32) -> TemplateToken {
        let mut is_number = true;
        loop {
            let c = self.cursor.current();
            if is_expression_terminator(c) {
                break;
            }
            if is_number && !c.is_ascii_digit() {
                is_number = false;
            }
            self.cursor.advance();
        }

        let hi = self.cursor.position();
        let text = &self.cursor.source()[lo..hi];
        let kind = if is_number {
            TemplateKind::Number
        } else {
            keyword(text).unwrap_or(TemplateKind::Identifier)
        };
        self.make(kind, lo, hi, line, column)
    }
}

/// Characters that end an identifier run in expression mode.
fn is_expression_terminator(c: char) -> bool {
    matches!(
        c,
        '\n' | ','
            | '.'
            | '+'
            | '-'
            | '*'
            | '/'
            | '('
            | ')'
            | '['
            | ']'
            | ';'
            | '\0'
            | '\r'
            | '\t'
            | '!'
            | '='
            | '<'
            | '>'
            | ' '
            | '$'
            | '&'
            | '|'
            | '"'
    )
}

fn keyword(text: &str) -> Option<TemplateKind> {
    match text {
        "if" => Some(TemplateKind::If),
        "end" => Some(TemplateKind::End),
        "for" => Some(TemplateKind::For),
        "foreach" => Some(TemplateKind::ForEach),
        "in" => Some(TemplateKind::In),
        "ignore_new_line" => Some(TemplateKind::IgnoreNewLine),
        "define" => Some(TemplateKind::Define),
        "definitions" => Some(TemplateKind::Definitions),
        "begin_tab" => Some(TemplateKind::BeginTab),
        "breakpoint" => Some(TemplateKind::Breakpoint),
        "has_attribute" => Some(TemplateKind::HasAttribute),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex_all(source: &str) -> Vec<TemplateToken> {
        let mut lexer = TemplateLexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token.kind == TemplateKind::Eof;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    fn kinds(source: &str) -> Vec<TemplateKind> {
        lex_all(source).iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_plain_text() {
        let tokens = lex_all("hello world");
        assert_eq!(tokens[0].kind, TemplateKind::Text);
        assert_eq!(tokens[0].text, "hello world");
        assert_eq!(tokens[1].kind, TemplateKind::Eof);
    }

    #[test]
    fn test_text_newlines() {
        assert_eq!(
            kinds("a\nb\n"),
            vec![
                TemplateKind::Text,
                TemplateKind::TextNewLine,
                TemplateKind::Text,
                TemplateKind::TextNewLine,
                TemplateKind::Eof,
            ]
        );
    }

    #[test]
    fn test_expression_region() {
        let tokens = lex_all("a$x + 1$b");
        let expected = [
            (TemplateKind::Text, "a"),
            (TemplateKind::Identifier, "x"),
            (TemplateKind::Plus, "+"),
            (TemplateKind::Number, "1"),
            (TemplateKind::Text, "b"),
            (TemplateKind::Eof, ""),
        ];
        for (token, (kind, text)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(token.kind, *kind);
            assert_eq!(token.text, *text);
        }
    }

    #[test]
    fn test_boundary_flags() {
        let tokens = lex_all("a$x$b");
        // "a" precedes the region, so "x" is flagged.
        assert!(!tokens[0].first_after_switch);
        assert!(tokens[1].first_after_switch);
        // "b" follows the closing '$' (a silent crossing).
        assert!(tokens[2].first_after_switch);
    }

    #[test]
    fn test_empty_region_is_silent() {
        // "$$" produces no expression token at all.
        let tokens = lex_all("a$$b");
        assert_eq!(tokens[0].text, "a");
        assert_eq!(tokens[1].kind, TemplateKind::Text);
        assert_eq!(tokens[1].text, "b");
        assert!(tokens[1].first_after_switch);
    }

    #[test]
    fn test_leading_dollar() {
        let tokens = lex_all("$x$");
        assert_eq!(tokens[0].kind, TemplateKind::Identifier);
        assert!(tokens[0].first_after_switch);
    }

    #[test]
    fn test_two_char_operators() {
        assert_eq!(
            kinds("$== != <= >= && || ++ -- =$"),
            vec![
                TemplateKind::EqEq,
                TemplateKind::NotEq,
                TemplateKind::LtEq,
                TemplateKind::GtEq,
                TemplateKind::AndAnd,
                TemplateKind::OrOr,
                TemplateKind::PlusPlus,
                TemplateKind::MinusMinus,
                TemplateKind::Assign,
                TemplateKind::Eof,
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("$if end for foreach in define definitions begin_tab breakpoint has_attribute ignore_new_line$"),
            vec![
                TemplateKind::If,
                TemplateKind::End,
                TemplateKind::For,
                TemplateKind::ForEach,
                TemplateKind::In,
                TemplateKind::Define,
                TemplateKind::Definitions,
                TemplateKind::BeginTab,
                TemplateKind::Breakpoint,
                TemplateKind::HasAttribute,
                TemplateKind::IgnoreNewLine,
                TemplateKind::Eof,
            ]
        );
    }

    #[test]
    fn test_string_literal() {
        let tokens = lex_all("$\"hi there\"$");
        assert_eq!(tokens[0].kind, TemplateKind::Str);
        assert_eq!(tokens[0].text, "hi there");
    }

    #[test]
    fn test_empty_string_literal() {
        let tokens = lex_all("$\"\"$");
        assert_eq!(tokens[0].kind, TemplateKind::Str);
        assert_eq!(tokens[0].text, "");
    }

    #[test]
    fn test_incomplete_string() {
        let tokens = lex_all("$\"oops");
        assert_eq!(tokens[0].kind, TemplateKind::IncompleteString);
    }

    #[test]
    fn test_dotted_reference() {
        assert_eq!(
            kinds("$S.Fields[0]$"),
            vec![
                TemplateKind::Identifier,
                TemplateKind::Dot,
                TemplateKind::Identifier,
                TemplateKind::LBracket,
                TemplateKind::Number,
                TemplateKind::RBracket,
                TemplateKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lone_ampersand_is_unknown() {
        assert_eq!(
            kinds("$a & b$"),
            vec![
                TemplateKind::Identifier,
                TemplateKind::Unknown,
                TemplateKind::Identifier,
                TemplateKind::Eof,
            ]
        );
    }

    #[test]
    fn test_newline_in_expression_advances_lines() {
        let tokens = lex_all("$x\ny$");
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[1].span.line, 2);
    }

    #[test]
    fn test_text_concat_round_trip() {
        let source = "line one\nline two $x$ tail\n";
        let tokens = lex_all(source);
        let text_only: String = tokens
            .iter()
            .filter(|t| {
                matches!(t.kind, TemplateKind::Text | TemplateKind::TextNewLine)
            })
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(text_only, "line one\nline two  tail\n");
    }
}
