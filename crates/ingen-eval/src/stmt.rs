//! Statement-like template forms.
//!
//! Every block form pushes one scope level on entry and pops it on every
//! exit path; the forms that indent their body also bump the writer's
//! removal delta for the duration. `define` is the odd one out: it
//! evaluates nothing, it records where its body starts and skips past
//! the matching `end`.

use std::io::Write;

use ingen_data::{DictId, Item, Procedure, Value};
use ingen_lex::{TemplateKind, TemplateToken};
use ingen_util::{ErrorKind, Result};

use crate::Evaluator;

impl<'a, W: Write> Evaluator<'a, W> {
    /// `$define Name(p1, ...)$ body $end$`: records a procedure in the
    /// current scope. The body is not evaluated now.
    pub(crate) fn try_define(&mut self, scope: DictId) -> Result<bool> {
        if self.cur().kind != TemplateKind::Define {
            return Ok(false);
        }
        self.advance()?;

        let name = self.cur_clone();
        if name.kind != TemplateKind::Identifier {
            return Err(self.err(&name, ErrorKind::InvalidIdentifier(name.text.clone())));
        }
        self.advance()?;

        let token = self.cur_clone();
        if token.kind != TemplateKind::LParen {
            return Err(self.err(&token, ErrorKind::ExpectedPunct("(")));
        }
        self.advance()?;

        let mut params = Vec::new();
        if self.cur().kind == TemplateKind::RParen {
            self.advance()?;
        } else {
            loop {
                let param = self.cur_clone();
                if param.kind != TemplateKind::Identifier {
                    return Err(
                        self.err(&param, ErrorKind::ExpectedIdentifierGot(param.text.clone()))
                    );
                }
                params.push(param.text);
                self.advance()?;

                let token = self.cur_clone();
                if token.kind == TemplateKind::RParen {
                    self.advance()?;
                    break;
                }
                if token.kind != TemplateKind::Comma {
                    return Err(self.err(
                        &token,
                        ErrorKind::ExpectedGot {
                            expected: ",",
                            found: token.text.clone(),
                        },
                    ));
                }
                self.advance()?;
            }
        }

        let body = self.stream.pos();
        let tabs = self.out.capture_for_define();
        self.skip_past_matching_end()?;

        let procedure = Procedure {
            params,
            parent: scope,
            body,
            tabs,
        };
        self.store
            .insert(scope, name.text, Item::new(Value::Procedure(procedure)));
        Ok(true)
    }

    /// `$if expr$ body $end$`. The condition must be Bool; a false
    /// condition skips to the matching `end`.
    pub(crate) fn try_if(&mut self, scope: DictId) -> Result<bool> {
        if self.cur().kind != TemplateKind::If {
            return Ok(false);
        }
        self.advance()?;

        let condition_token = self.cur_clone();
        let condition = self
            .eval_subexpression(scope)?
            .ok_or_else(|| self.err(&condition_token, ErrorKind::ExpectedExpression))?;
        let Value::Bool(condition) = condition.value else {
            return Err(self.err(&condition_token, ErrorKind::ConditionNotBool));
        };

        if !condition {
            self.skip_past_matching_end()?;
            return Ok(true);
        }

        self.push_level(false, true)?;
        let result = self.evaluate(scope, TemplateKind::End);
        self.pop_level(true);
        result?;
        self.advance()?; // past 'end'
        Ok(true)
    }

    /// `$for init; cond; step$ body $end$`. The three header parts and
    /// the body are located once, then re-entered by cursor jumps every
    /// iteration.
    pub(crate) fn try_for(&mut self, scope: DictId) -> Result<bool> {
        if self.cur().kind != TemplateKind::For {
            return Ok(false);
        }
        self.advance()?;

        let local = self.store.new_dict(Some(scope));

        let init_token = self.cur_clone();
        self.eval_subexpression(local)?
            .ok_or_else(|| self.err(&init_token, ErrorKind::ExpectedExpression))?;

        let token = self.cur_clone();
        if token.kind != TemplateKind::Semicolon {
            return Err(self.err(&token, ErrorKind::ExpectedPunct(";")));
        }
        self.advance()?;

        let condition_pos = self.stream.pos();
        self.continue_past(TemplateKind::Semicolon, ";")?;
        let step_pos = self.stream.pos();
        self.continue_to_mode_switch(&token)?;
        let body_pos = self.stream.pos();

        loop {
            self.stream.jump(condition_pos);
            let condition_token = self.cur_clone();
            let condition = self
                .eval_subexpression(local)?
                .ok_or_else(|| self.err(&condition_token, ErrorKind::ExpectedExpression))?;
            let Value::Bool(condition) = condition.value else {
                return Err(self.err(&condition_token, ErrorKind::LoopConditionNotBool));
            };
            if !condition {
                break;
            }

            self.stream.jump(body_pos);
            self.push_level(false, true)?;
            let result = self.evaluate(local, TemplateKind::End);
            self.pop_level(true);
            result?;

            self.stream.jump(step_pos);
            let step_token = self.cur_clone();
            self.eval_subexpression(local)?
                .ok_or_else(|| self.err(&step_token, ErrorKind::ExpectedExpression))?;
        }

        self.stream.jump(body_pos);
        self.skip_past_matching_end()?;
        Ok(true)
    }

    /// `$foreach X in expr$ body $end$`. The expression must evaluate
    /// to a list; an empty list skips the body without binding `X`.
    pub(crate) fn try_foreach(&mut self, scope: DictId) -> Result<bool> {
        if self.cur().kind != TemplateKind::ForEach {
            return Ok(false);
        }
        self.advance()?;

        let variable = self.cur_clone();
        if variable.kind == TemplateKind::Eof {
            return Err(self.err(&variable, ErrorKind::UnexpectedEnd));
        }
        if variable.kind != TemplateKind::Identifier {
            return Err(self.err(&variable, ErrorKind::ExpectedIdentifier));
        }
        self.advance()?;

        let token = self.cur_clone();
        if token.kind != TemplateKind::In {
            return Err(self.err(&token, ErrorKind::ExpectedPunct("in")));
        }
        self.advance()?;

        let list_token = self.cur_clone();
        let list_item = self
            .eval_subexpression(scope)?
            .ok_or_else(|| self.err(&list_token, ErrorKind::ExpectedExpression))?;
        let Value::List(list) = list_item.value else {
            return Err(self.err(&list_token, ErrorKind::NotAList));
        };

        if self.store.list(list).is_empty() {
            self.skip_past_matching_end()?;
            return Ok(true);
        }

        let local = self.store.new_dict(Some(scope));
        let body_pos = self.stream.pos();
        let count = self.store.list(list).len();

        for i in 0..count {
            let element = self.store.list(list)[i].clone();
            self.store.insert(local, variable.text.clone(), element);

            self.push_level(false, true)?;
            let result = self.evaluate(local, TemplateKind::End);
            self.pop_level(true);
            result?;

            if i + 1 != count {
                self.stream.jump(body_pos);
            }
        }

        self.advance()?; // past 'end'
        Ok(true)
    }

    /// `$ignore_new_line$`: suppresses an immediately following newline
    /// while keeping the next line's indentation adjustment active.
    pub(crate) fn try_ignore_new_line(&mut self) -> Result<bool> {
        if self.cur().kind != TemplateKind::IgnoreNewLine {
            return Ok(false);
        }
        self.advance()?;
        if self.cur().kind == TemplateKind::TextNewLine {
            self.out.begin_line_joined();
            self.advance()?;
        }
        Ok(true)
    }

    /// `$definitions$ body $end$`: evaluates the body with newline
    /// suppression so blocks of procedure definitions emit nothing.
    pub(crate) fn try_definitions(&mut self, scope: DictId) -> Result<bool> {
        if self.cur().kind != TemplateKind::Definitions {
            return Ok(false);
        }
        self.advance()?;

        self.push_level(true, true)?;
        let result = self.evaluate(scope, TemplateKind::End);
        self.pop_level(true);
        result?;
        self.advance()?; // past 'end'
        Ok(true)
    }

    /// `$begin_tab$ body $end$`: indents every line of the body by one
    /// level.
    pub(crate) fn try_begin_tab(&mut self, scope: DictId) -> Result<bool> {
        if self.cur().kind != TemplateKind::BeginTab {
            return Ok(false);
        }
        self.advance()?;

        self.push_level(false, true)?;
        self.out.tabs_to_add += 1;
        let result = self.evaluate(scope, TemplateKind::End);
        self.out.tabs_to_add -= 1;
        self.pop_level(true);
        result?;
        self.advance()?; // past 'end'
        Ok(true)
    }

    /// `$breakpoint$`: a no-op marker for attaching a debugger.
    pub(crate) fn try_breakpoint(&mut self) -> Result<bool> {
        if self.cur().kind != TemplateKind::Breakpoint {
            return Ok(false);
        }
        self.advance()?;
        Ok(true)
    }

    fn continue_past(&mut self, kind: TemplateKind, what: &'static str) -> Result<()> {
        loop {
            let token = self.cur_clone();
            if token.kind == kind {
                return self.advance();
            }
            if token.kind == TemplateKind::Eof {
                return Err(self.err(&token, ErrorKind::ExpectedFoundEof(what)));
            }
            self.advance()?;
        }
    }

    /// Skips forward until the first token flagged as following a `$`
    /// mode switch; that token is where a `for` loop's body starts.
    fn continue_to_mode_switch(&mut self, start: &TemplateToken) -> Result<()> {
        loop {
            let token = self.cur();
            if token.first_after_switch {
                return Ok(());
            }
            if token.kind == TemplateKind::Eof {
                return Err(self.err(start, ErrorKind::ForBodyNotFound));
            }
            self.advance()?;
        }
    }
}
