//! ingen-eval - The template evaluator.
//!
//! Evaluates one template against a data dictionary, writing the result
//! through the indentation machine. Template text outside `$...$` regions
//! is emitted literally (subject to indentation rewriting); expression
//! regions are evaluated over [`ingen_data`] items.
//!
//! The evaluator works directly on the token stream: there is no AST.
//! Tokens are recorded as the lexer produces them, and control flow is
//! cursor movement over the record. A `for` loop re-jumps to its
//! recorded condition and increment positions every iteration; calling
//! a procedure jumps to the recorded body position and jumps back when
//! the body's `end` is reached; a false `if` skips forward to its
//! matching `end` without evaluating anything.
//!
//! Evaluation is strictly left-to-right between jumps. Side effects on
//! dictionaries (assignment, `++`/`--`, `define`) happen at the moment
//! the operator is evaluated. The first error aborts the run.

pub mod indent;
pub mod scope;

mod expr;
mod stmt;

use std::io::Write;

use ingen_data::{DataStore, DictId, Value};
use ingen_lex::{TemplateKind, TemplateLexer, TemplateToken, TokenStream};
use ingen_util::{Error, ErrorKind, Result};

pub use indent::IndentWriter;
pub use scope::{ScopeLevels, MAX_SCOPE_DEPTH};

/// Evaluates `source` as a template against `scope`, writing output to
/// `out`. `filename` is used in error locations only.
pub fn evaluate_template<W: Write>(
    source: &str,
    filename: &str,
    store: &mut DataStore,
    scope: DictId,
    out: W,
) -> Result<()> {
    Evaluator::new(source, filename, store, out).run(scope)
}

/// Template evaluator over one template source.
pub struct Evaluator<'a, W: Write> {
    pub(crate) stream: TokenStream<TemplateToken>,
    pub(crate) lexer: TemplateLexer<'a>,
    pub(crate) filename: String,
    pub(crate) store: &'a mut DataStore,
    pub(crate) out: IndentWriter<W>,
    pub(crate) levels: ScopeLevels,
}

impl<'a, W: Write> Evaluator<'a, W> {
    pub fn new(
        source: &'a str,
        filename: impl Into<String>,
        store: &'a mut DataStore,
        out: W,
    ) -> Self {
        Self {
            stream: TokenStream::new(),
            lexer: TemplateLexer::new(source),
            filename: filename.into(),
            store,
            out: IndentWriter::new(out),
            levels: ScopeLevels::new(),
        }
    }

    /// Runs the template to completion against `scope`.
    pub fn run(&mut self, scope: DictId) -> Result<()> {
        self.advance()?;
        self.evaluate(scope, TemplateKind::Eof)?;
        let token = self.cur_clone();
        self.out.flush().map_err(|e| self.io_error(&token, e))?;
        Ok(())
    }

    // Token stream plumbing

    /// Moves to the next token, pulling from the lexer when the cursor
    /// is at the end of the record.
    pub(crate) fn advance(&mut self) -> Result<()> {
        if self.stream.has_recorded_next() {
            self.stream.advance_recorded();
            return Ok(());
        }
        let token = self.lexer.next_token();
        if token.kind == TemplateKind::IncompleteString {
            return Err(Error::new(
                self.filename.as_str(),
                token.span,
                ErrorKind::IncompleteString,
            ));
        }
        self.stream.push_and_advance(token);
        Ok(())
    }

    #[inline]
    pub(crate) fn cur(&self) -> &TemplateToken {
        self.stream.current()
    }

    #[inline]
    pub(crate) fn cur_clone(&self) -> TemplateToken {
        self.stream.current().clone()
    }

    pub(crate) fn err(&self, token: &TemplateToken, kind: ErrorKind) -> Error {
        Error::new(self.filename.as_str(), token.span, kind)
    }

    pub(crate) fn io_error(&self, token: &TemplateToken, error: std::io::Error) -> Error {
        self.err(token, ErrorKind::Io(error.to_string()))
    }

    // Scope levels

    pub(crate) fn push_level(&mut self, suppress_newlines: bool, bump_tabs: bool) -> Result<()> {
        if !self.levels.push(suppress_newlines) {
            let token = self.cur_clone();
            return Err(self.err(
                &token,
                ErrorKind::ScopeDepthExceeded {
                    limit: MAX_SCOPE_DEPTH,
                },
            ));
        }
        if bump_tabs {
            self.out.tabs_to_remove += 1;
        }
        Ok(())
    }

    pub(crate) fn pop_level(&mut self, bump_tabs: bool) {
        self.levels.pop();
        if bump_tabs {
            self.out.tabs_to_remove -= 1;
        }
    }

    // Main loop

    /// Evaluates tokens until `until` is the current token. Text and
    /// newlines are emitted; anything else must be a statement form or
    /// a writable expression.
    pub(crate) fn evaluate(&mut self, scope: DictId, until: TemplateKind) -> Result<()> {
        loop {
            let token = self.cur_clone();
            if token.kind == until {
                return Ok(());
            }

            match token.kind {
                TemplateKind::Text => {
                    let levels = self.out.tab_equivalents(&token.text);
                    if levels == 0 {
                        self.commit(&token, &token.text)?;
                    } else {
                        // Whole-whitespace run: held back until the line
                        // turns out to have content.
                        self.out.queue_tabs(levels);
                    }
                    self.advance()?;
                }
                TemplateKind::TextNewLine => {
                    let suppress = self.levels.suppress_newlines();
                    self.out
                        .newline(suppress)
                        .map_err(|e| self.io_error(&token, e))?;
                    self.advance()?;
                }
                _ => {
                    if !self.evaluate_expression(scope)? {
                        return Err(self.err(&token, ErrorKind::IllegalExpression));
                    }
                }
            }
        }
    }

    /// Dispatches one expression-region construct. Returns `Ok(false)`
    /// when nothing matched (the caller reports an illegal expression);
    /// specific failures surface as errors.
    fn evaluate_expression(&mut self, scope: DictId) -> Result<bool> {
        if self.try_define(scope)? {
            return Ok(true);
        }
        if self.try_foreach(scope)? {
            return Ok(true);
        }
        if self.try_for(scope)? {
            return Ok(true);
        }
        if self.try_if(scope)? {
            return Ok(true);
        }
        if self.try_ignore_new_line()? {
            return Ok(true);
        }
        if self.try_definitions(scope)? {
            return Ok(true);
        }
        if self.try_begin_tab(scope)? {
            return Ok(true);
        }
        if self.try_breakpoint()? {
            return Ok(true);
        }
        // Plain value writeout has to come last.
        self.try_writeout(scope)
    }

    /// Evaluates a free-standing expression and writes its value.
    fn try_writeout(&mut self, scope: DictId) -> Result<bool> {
        let token = self.cur_clone();
        let Some(item) = self.eval_subexpression(scope)? else {
            return Ok(false);
        };
        match &item.value {
            Value::Str(text) => {
                let text = text.clone();
                self.commit(&token, &text)?;
            }
            Value::Int(value) => {
                let text = value.to_string();
                self.commit(&token, &text)?;
            }
            Value::Bool(value) => {
                let text = if *value { "True" } else { "False" };
                self.commit(&token, text)?;
            }
            Value::Void => {}
            _ => return Err(self.err(&token, ErrorKind::NotWritable)),
        }
        Ok(true)
    }

    pub(crate) fn commit(&mut self, token: &TemplateToken, text: &str) -> Result<()> {
        let result = self.out.commit(text);
        result.map_err(|e| self.io_error(token, e))
    }

    /// Skips forward to the `end` matching the current block, counting
    /// nested block starters on the way. Leaves the cursor one past the
    /// `end`.
    pub(crate) fn skip_past_matching_end(&mut self) -> Result<()> {
        let begin = self.cur_clone();
        let mut depth = 0usize;
        loop {
            let token = self.cur();
            if token.kind == TemplateKind::Eof {
                return Err(self.err(&begin, ErrorKind::UnclosedScope));
            }
            if token.starts_scope() {
                depth += 1;
            }
            if token.kind == TemplateKind::End {
                if depth == 0 {
                    return self.advance();
                }
                depth -= 1;
            }
            self.advance()?;
        }
    }
}
