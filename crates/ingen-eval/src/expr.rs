//! The expression evaluator.
//!
//! One recursive-descent routine per precedence level, lowest binding
//! first:
//!
//! ```text
//! assignment  &&  ||  !=  ==  <  >  <=  >=  -  +  /  *
//! !  unary-  postfix --/++  prefix --/++  primary
//! ```
//!
//! Every binary level evaluates its left operand one level up, and on
//! seeing its operator evaluates the right operand by recursing into
//! itself (all binary operators are right-associative), trying a
//! parenthesized expression first. Operands dispatch through the
//! per-type operator interface table; when the two sides disagree on
//! type, the right side is cast to the left's type through its own cast
//! entry, which currently always fails.
//!
//! Each routine returns `Ok(None)` when the construct is simply not
//! present at the cursor (nothing consumed), and `Err` for a real
//! failure. This keeps the "declare a new variable" form of assignment
//! working: when the left side is an unknown identifier followed by
//! `=`, the chain reports no match and assignment claims the tokens.

use std::io::Write;

use ingen_data::{interface, BinaryFn, DictId, Item, Op, OpInterface, Origin, Tag, UnaryFn, Value};
use ingen_lex::TemplateKind;
use ingen_util::{ErrorKind, Result};

use crate::Evaluator;

impl<'a, W: Write> Evaluator<'a, W> {
    /// Entry point: evaluates one full sub-expression.
    pub(crate) fn eval_subexpression(&mut self, scope: DictId) -> Result<Option<Item>> {
        self.eval_assignment(scope)
    }

    fn eval_assignment(&mut self, scope: DictId) -> Result<Option<Item>> {
        let start = self.cur_clone();

        let target = match self.eval_boolean_and(scope)? {
            Some(item) => {
                let token = self.cur_clone();
                if token.kind != TemplateKind::Assign {
                    return Ok(Some(item));
                }
                match item.origin {
                    Some(origin) => origin,
                    None => return Err(self.err(&token, ErrorKind::AssignmentNeedsLValue)),
                }
            }
            None => {
                // An unknown identifier followed by `=` declares a new
                // entry in the current scope.
                if start.kind != TemplateKind::Identifier {
                    return Ok(None);
                }
                self.advance()?;
                if self.cur().kind != TemplateKind::Assign {
                    return Err(self.err(&start, ErrorKind::UnknownIdentifier(start.text.clone())));
                }
                Origin {
                    dict: scope,
                    key: start.text.clone(),
                }
            }
        };

        self.advance()?; // past '='

        let value_token = self.cur_clone();
        let value = self
            .eval_subexpression(scope)?
            .ok_or_else(|| self.err(&value_token, ErrorKind::ExpectedExpression))?;

        let mut stored = value.clone();
        stored.origin = None;
        self.store.insert(target.dict, target.key.clone(), stored);

        let mut result = value;
        result.origin = Some(target);
        Ok(Some(result))
    }

    // Binary levels

    fn eval_boolean_and(&mut self, scope: DictId) -> Result<Option<Item>> {
        self.eval_binary_level(
            scope,
            TemplateKind::AndAnd,
            Op::BooleanAnd,
            "&&",
            false,
            |t| t.boolean_and,
            Self::eval_boolean_or,
        )
    }

    fn eval_boolean_or(&mut self, scope: DictId) -> Result<Option<Item>> {
        self.eval_binary_level(
            scope,
            TemplateKind::OrOr,
            Op::BooleanOr,
            "||",
            false,
            |t| t.boolean_or,
            Self::eval_inequality,
        )
    }

    fn eval_inequality(&mut self, scope: DictId) -> Result<Option<Item>> {
        self.eval_binary_level(
            scope,
            TemplateKind::NotEq,
            Op::Equals,
            "!=",
            false,
            |t| t.not_equals,
            Self::eval_equality,
        )
    }

    fn eval_equality(&mut self, scope: DictId) -> Result<Option<Item>> {
        self.eval_binary_level(
            scope,
            TemplateKind::EqEq,
            Op::Equals,
            "==",
            false,
            |t| t.equals,
            Self::eval_less_than,
        )
    }

    fn eval_less_than(&mut self, scope: DictId) -> Result<Option<Item>> {
        self.eval_binary_level(
            scope,
            TemplateKind::Lt,
            Op::LessThan,
            "<",
            false,
            |t| t.less_than,
            Self::eval_greater_than,
        )
    }

    fn eval_greater_than(&mut self, scope: DictId) -> Result<Option<Item>> {
        self.eval_binary_level(
            scope,
            TemplateKind::Gt,
            Op::GreaterThan,
            ">",
            false,
            |t| t.greater_than,
            Self::eval_less_equals,
        )
    }

    fn eval_less_equals(&mut self, scope: DictId) -> Result<Option<Item>> {
        self.eval_binary_level(
            scope,
            TemplateKind::LtEq,
            Op::LessThan,
            "<=",
            true,
            |t| t.less_than,
            Self::eval_greater_equals,
        )
    }

    fn eval_greater_equals(&mut self, scope: DictId) -> Result<Option<Item>> {
        self.eval_binary_level(
            scope,
            TemplateKind::GtEq,
            Op::GreaterThan,
            ">=",
            true,
            |t| t.greater_than,
            Self::eval_subtraction,
        )
    }

    fn eval_subtraction(&mut self, scope: DictId) -> Result<Option<Item>> {
        self.eval_binary_level(
            scope,
            TemplateKind::Minus,
            Op::Subtract,
            "-",
            false,
            |t| t.subtract,
            Self::eval_addition,
        )
    }

    fn eval_addition(&mut self, scope: DictId) -> Result<Option<Item>> {
        self.eval_binary_level(
            scope,
            TemplateKind::Plus,
            Op::Add,
            "+",
            false,
            |t| t.add,
            Self::eval_division,
        )
    }

    fn eval_division(&mut self, scope: DictId) -> Result<Option<Item>> {
        self.eval_binary_level(
            scope,
            TemplateKind::Slash,
            Op::Divide,
            "/",
            false,
            |t| t.divide,
            Self::eval_multiplication,
        )
    }

    fn eval_multiplication(&mut self, scope: DictId) -> Result<Option<Item>> {
        self.eval_binary_level(
            scope,
            TemplateKind::Star,
            Op::Multiply,
            "*",
            false,
            |t| t.multiply,
            Self::eval_not,
        )
    }

    /// Shared body of all binary levels: parse left at the next level,
    /// and on seeing the operator evaluate the right side (parenthesis
    /// first, then same-level recursion) and dispatch. `or_equals`
    /// implements `<=`/`>=` as `cmp || equals`.
    #[allow(clippy::too_many_arguments)]
    fn eval_binary_level(
        &mut self,
        scope: DictId,
        token_kind: TemplateKind,
        op: Op,
        op_str: &'static str,
        or_equals: bool,
        select: fn(&'static OpInterface) -> BinaryFn,
        next_level: fn(&mut Self, DictId) -> Result<Option<Item>>,
    ) -> Result<Option<Item>> {
        let left_token = self.cur_clone();
        let Some(left) = next_level(self, scope)? else {
            return Ok(None);
        };

        if self.cur().kind != token_kind {
            return Ok(Some(left));
        }
        self.advance()?;

        let right_token = self.cur_clone();
        let right = match self.eval_parenthesis(scope)? {
            Some(item) => item,
            None => self
                .eval_binary_level(scope, token_kind, op, op_str, or_equals, select, next_level)?
                .ok_or_else(|| self.err(&right_token, ErrorKind::ExpectedExpression))?,
        };

        let table = interface(left.tag());
        if !(table.can_execute)(op) {
            return Err(self.err(
                &left_token,
                ErrorKind::InvalidOperator {
                    op: op_str,
                    ty: left.tag().name(),
                },
            ));
        }

        let right = if right.tag() == left.tag() {
            right
        } else {
            match (interface(right.tag()).cast)(left.tag(), &right) {
                Some(cast) => cast,
                None => {
                    return Err(self.err(
                        &right_token,
                        ErrorKind::InvalidCast {
                            wanted: left.tag().name(),
                            found: right.tag().name(),
                        },
                    ))
                }
            }
        };

        if op == Op::Divide && right.tag() == Tag::Int && right.as_int() == 0 {
            return Err(self.err(&right_token, ErrorKind::DivisionByZero));
        }

        let result = if or_equals {
            let compared = (select(table))(&left, &right);
            let equal = (table.equals)(&left, &right);
            Item::bool(compared.as_bool() || equal.as_bool())
        } else {
            (select(table))(&left, &right)
        };
        Ok(Some(result))
    }

    // Unary levels

    fn eval_not(&mut self, scope: DictId) -> Result<Option<Item>> {
        let token = self.cur_clone();
        if token.kind != TemplateKind::Bang {
            return self.eval_negative(scope);
        }
        self.advance()?;
        if self.cur().kind == TemplateKind::Eof {
            let eof = self.cur_clone();
            return Err(self.err(&eof, ErrorKind::UnexpectedEnd));
        }
        let operand_token = self.cur_clone();
        let operand = self
            .eval_not(scope)?
            .ok_or_else(|| self.err(&operand_token, ErrorKind::ExpectedExpression))?;
        let table = interface(operand.tag());
        if !(table.can_execute)(Op::Not) {
            return Err(self.err(
                &token,
                ErrorKind::InvalidOperator {
                    op: "!",
                    ty: operand.tag().name(),
                },
            ));
        }
        Ok(Some((table.not)(&operand)))
    }

    fn eval_negative(&mut self, scope: DictId) -> Result<Option<Item>> {
        let token = self.cur_clone();
        if token.kind != TemplateKind::Minus {
            return self.eval_post_decrement(scope);
        }
        self.advance()?;
        if self.cur().kind == TemplateKind::Eof {
            let eof = self.cur_clone();
            return Err(self.err(&eof, ErrorKind::UnexpectedEnd));
        }
        let operand_token = self.cur_clone();
        let operand = self
            .eval_negative(scope)?
            .ok_or_else(|| self.err(&operand_token, ErrorKind::ExpectedExpression))?;
        let table = interface(operand.tag());
        if !(table.can_execute)(Op::Negate) {
            return Err(self.err(
                &token,
                ErrorKind::InvalidOperator {
                    op: "-",
                    ty: operand.tag().name(),
                },
            ));
        }
        Ok(Some((table.negate)(&operand)))
    }

    // Postfix step operators. The expression value is the value before
    // the step; the stepped value is written back through the origin.

    fn eval_post_decrement(&mut self, scope: DictId) -> Result<Option<Item>> {
        let Some(item) = self.eval_post_increment(scope)? else {
            return Ok(None);
        };
        if self.cur().kind != TemplateKind::MinusMinus {
            return Ok(Some(item));
        }
        self.apply_postfix(item, Op::Decrement, "--", "Post-decrement", |t| t.decrement)
    }

    fn eval_post_increment(&mut self, scope: DictId) -> Result<Option<Item>> {
        let Some(item) = self.eval_pre_decrement(scope)? else {
            return Ok(None);
        };
        if self.cur().kind != TemplateKind::PlusPlus {
            return Ok(Some(item));
        }
        self.apply_postfix(item, Op::Increment, "++", "Post-increment", |t| t.increment)
    }

    fn apply_postfix(
        &mut self,
        item: Item,
        op: Op,
        op_str: &'static str,
        what: &'static str,
        select: fn(&'static OpInterface) -> UnaryFn,
    ) -> Result<Option<Item>> {
        let op_token = self.cur_clone();
        let origin = match &item.origin {
            Some(origin) => origin.clone(),
            None => return Err(self.err(&op_token, ErrorKind::PostfixStepNeedsLValue(what))),
        };
        let table = interface(item.tag());
        if !(table.can_execute)(op) {
            return Err(self.err(
                &op_token,
                ErrorKind::InvalidOperator {
                    op: op_str,
                    ty: item.tag().name(),
                },
            ));
        }
        let mut stepped = (select(table))(&item);
        stepped.origin = None;
        self.store.insert(origin.dict, origin.key, stepped);
        self.advance()?;
        Ok(Some(item))
    }

    // Prefix step operators. The expression value is the stepped value.

    fn eval_pre_decrement(&mut self, scope: DictId) -> Result<Option<Item>> {
        if self.cur().kind != TemplateKind::MinusMinus {
            return self.eval_pre_increment(scope);
        }
        self.apply_prefix(scope, Op::Decrement, "--", "Pre-decrement", |t| t.decrement)
    }

    fn eval_pre_increment(&mut self, scope: DictId) -> Result<Option<Item>> {
        if self.cur().kind != TemplateKind::PlusPlus {
            return self.eval_simple(scope);
        }
        self.apply_prefix(scope, Op::Increment, "++", "Pre-increment", |t| t.increment)
    }

    fn apply_prefix(
        &mut self,
        scope: DictId,
        op: Op,
        op_str: &'static str,
        what: &'static str,
        select: fn(&'static OpInterface) -> UnaryFn,
    ) -> Result<Option<Item>> {
        let op_token = self.cur_clone();
        self.advance()?;
        let operand_token = self.cur_clone();
        let operand = self
            .eval_subexpression(scope)?
            .ok_or_else(|| self.err(&operand_token, ErrorKind::ExpectedExpression))?;
        let origin = operand
            .origin
            .clone()
            .ok_or_else(|| self.err(&op_token, ErrorKind::PrefixStepNeedsLValue(what)))?;
        let table = interface(operand.tag());
        if !(table.can_execute)(op) {
            return Err(self.err(
                &op_token,
                ErrorKind::InvalidOperator {
                    op: op_str,
                    ty: operand.tag().name(),
                },
            ));
        }
        let mut result = (select(table))(&operand);
        let mut stored = result.clone();
        stored.origin = None;
        self.store
            .insert(origin.dict, origin.key.clone(), stored);
        result.origin = Some(origin);
        Ok(Some(result))
    }

    // Primary expressions

    fn eval_simple(&mut self, scope: DictId) -> Result<Option<Item>> {
        if let Some(item) = self.eval_procedure_call(scope)? {
            return Ok(Some(item));
        }
        if let Some(item) = self.eval_parenthesis(scope)? {
            return Ok(Some(item));
        }
        if let Some(item) = self.eval_reference_root(scope)? {
            return Ok(Some(item));
        }

        let token = self.cur_clone();
        match token.kind {
            TemplateKind::Number => {
                self.advance()?;
                Ok(Some(Item::int(parse_number(&token.text))))
            }
            TemplateKind::Str => {
                self.advance()?;
                Ok(Some(Item::str(token.text)))
            }
            TemplateKind::HasAttribute => self.eval_has_attribute(scope).map(Some),
            _ => Ok(None),
        }
    }

    fn eval_parenthesis(&mut self, scope: DictId) -> Result<Option<Item>> {
        let open = self.cur_clone();
        if open.kind != TemplateKind::LParen {
            return Ok(None);
        }
        self.advance()?;
        let inner_token = self.cur_clone();
        let item = self
            .eval_subexpression(scope)?
            .ok_or_else(|| self.err(&inner_token, ErrorKind::ExpectedExpression))?;
        if self.cur().kind != TemplateKind::RParen {
            return Err(self.err(&open, ErrorKind::UnmatchedParenthesis));
        }
        self.advance()?;
        Ok(Some(item))
    }

    /// Start of a reference chain: an identifier looked up in the
    /// current scope chain. An unknown name is not an error here;
    /// assignment may still claim it as a declaration.
    fn eval_reference_root(&mut self, scope: DictId) -> Result<Option<Item>> {
        let ident = self.cur_clone();
        if ident.kind != TemplateKind::Identifier {
            return Ok(None);
        }
        let Some(item) = self.store.lookup(scope, &ident.text) else {
            return Ok(None);
        };
        self.advance()?;
        self.eval_reference_tail(item, scope).map(Some)
    }

    /// Continues a reference chain after an item: `[expr]` indexing and
    /// `.identifier` member access, in any combination.
    fn eval_reference_tail(&mut self, item: Item, scope: DictId) -> Result<Item> {
        if let Some(indexed) = self.eval_indexer(&item, scope)? {
            return Ok(indexed);
        }
        if self.cur().kind == TemplateKind::Dot {
            self.advance()?;
            return self.eval_member(item, scope);
        }
        Ok(item)
    }

    /// One `.identifier` step on `container`.
    fn eval_member(&mut self, container: Item, scope: DictId) -> Result<Item> {
        let token = self.cur_clone();
        if token.kind != TemplateKind::Identifier {
            return Err(self.err(&token, ErrorKind::ExpectedIdentifier));
        }
        match container.value {
            Value::Dict(dict) => match self.store.lookup(dict, &token.text) {
                Some(found) => {
                    self.advance()?;
                    self.eval_reference_tail(found, scope)
                }
                None => Err(self.err(&token, ErrorKind::InvalidIdentifier(token.text.clone()))),
            },
            Value::List(list) => {
                // Lists expose a single synthetic member.
                if token.text == "Size" {
                    let size = self.store.list(list).len() as i64;
                    self.advance()?;
                    self.eval_reference_tail(Item::int(size), scope)
                } else {
                    Err(self.err(&token, ErrorKind::InvalidIdentifier(token.text.clone())))
                }
            }
            _ => Err(self.err(
                &token,
                ErrorKind::InvalidMemberAccess(container.tag().name()),
            )),
        }
    }

    /// One `[expr]` step on `target`. An `Int` index selects a list
    /// element; a `String` index looks up the attribute data of the
    /// item being indexed.
    fn eval_indexer(
        &mut self,
        target: &Item,
        scope: DictId,
    ) -> Result<Option<Item>> {
        let bracket = self.cur_clone();
        if bracket.kind != TemplateKind::LBracket {
            return Ok(None);
        }
        self.advance()?;

        let index_token = self.cur_clone();
        let index = self
            .eval_subexpression(scope)?
            .ok_or_else(|| self.err(&index_token, ErrorKind::ExpectedExpression))?;

        let indexed = match &index.value {
            Value::Int(i) => {
                let Value::List(list) = target.value else {
                    return Err(self.err(&bracket, ErrorKind::NotAList));
                };
                let items = self.store.list(list);
                if *i < 0 || *i as usize >= items.len() {
                    return Err(self.err(
                        &bracket,
                        ErrorKind::IndexOutOfRange {
                            index: *i,
                            size: items.len(),
                        },
                    ));
                }
                items[*i as usize].clone()
            }
            Value::Str(name) => {
                let data = target
                    .attrs
                    .and_then(|id| self.store.attr_list(id).data)
                    .ok_or_else(|| self.err(&bracket, ErrorKind::UnknownAttribute(name.clone())))?;
                self.store
                    .lookup(data, name)
                    .ok_or_else(|| self.err(&bracket, ErrorKind::UnknownAttribute(name.clone())))?
            }
            _ => return Err(self.err(&bracket, ErrorKind::InvalidIndex)),
        };

        if self.cur().kind != TemplateKind::RBracket {
            let token = self.cur_clone();
            return Err(self.err(&token, ErrorKind::ExpectedPunct("]")));
        }
        self.advance()?;

        if self.cur().kind == TemplateKind::Dot {
            self.advance()?;
            return self.eval_member(indexed, scope).map(Some);
        }
        if let Some(chained) = self.eval_indexer(&indexed, scope)? {
            return Ok(Some(chained));
        }
        Ok(Some(indexed))
    }

    /// `identifier(args...)`: a procedure call. The cursor jumps to the
    /// recorded body, evaluates it in a fresh scope chained to the
    /// procedure's defining scope, and jumps back. Calls evaluate to
    /// Void.
    fn eval_procedure_call(&mut self, scope: DictId) -> Result<Option<Item>> {
        let ident = self.cur_clone();
        if ident.kind != TemplateKind::Identifier {
            return Ok(None);
        }

        let save = self.stream.pos();
        self.advance()?;
        if self.cur().kind != TemplateKind::LParen {
            self.stream.jump(save);
            return Ok(None);
        }
        self.advance()?;

        let item = self
            .store
            .lookup(scope, &ident.text)
            .ok_or_else(|| self.err(&ident, ErrorKind::UnknownProcedure(ident.text.clone())))?;
        let Value::Procedure(procedure) = item.value else {
            return Err(self.err(&ident, ErrorKind::NotAProcedure(ident.text.clone())));
        };

        let call_scope = self.store.new_dict(Some(procedure.parent));
        let expected = procedure.params.len();
        if expected > 0 {
            for i in 0..expected {
                if self.cur().kind == TemplateKind::RParen {
                    let token = self.cur_clone();
                    return Err(self.err(
                        &token,
                        ErrorKind::TooFewArguments {
                            name: ident.text.clone(),
                            expected,
                            found: i,
                        },
                    ));
                }

                let argument_token = self.cur_clone();
                let mut argument = self
                    .eval_subexpression(scope)?
                    .ok_or_else(|| self.err(&argument_token, ErrorKind::ExpectedExpression))?;
                argument.origin = None;
                self.store
                    .insert(call_scope, procedure.params[i].clone(), argument);

                let token = self.cur_clone();
                if i + 1 != expected {
                    if token.kind != TemplateKind::Comma {
                        return Err(self.err(&token, ErrorKind::ExpectedPunct(",")));
                    }
                    self.advance()?;
                } else if token.kind != TemplateKind::RParen {
                    return Err(self.err(
                        &token,
                        ErrorKind::TooManyArguments {
                            name: ident.text.clone(),
                            expected,
                        },
                    ));
                }
            }
        } else if self.cur().kind != TemplateKind::RParen {
            let token = self.cur_clone();
            return Err(self.err(
                &token,
                ErrorKind::TooManyArguments {
                    name: ident.text.clone(),
                    expected: 0,
                },
            ));
        }

        let return_pos = self.stream.pos();
        self.stream.jump(procedure.body);

        // The callee starts from a clean newline-suppression stack and
        // with the captured tab deltas applied.
        let saved_levels = self.levels.take();
        self.push_level(false, false)?;
        self.out.add_deltas(procedure.tabs);
        let result = self.evaluate(call_scope, TemplateKind::End);
        self.out.remove_deltas(procedure.tabs);
        self.pop_level(false);
        self.levels.restore(saved_levels);
        result?;

        self.stream.jump(return_pos);
        self.advance()?;
        Ok(Some(Item::void()))
    }

    /// `has_attribute(expr, "Name")`.
    fn eval_has_attribute(&mut self, scope: DictId) -> Result<Item> {
        self.advance()?; // past the keyword

        let token = self.cur_clone();
        if token.kind != TemplateKind::LParen {
            return Err(self.err(&token, ErrorKind::ExpectedPunct("(")));
        }
        self.advance()?;

        let expr_token = self.cur_clone();
        let item = self
            .eval_subexpression(scope)?
            .ok_or_else(|| self.err(&expr_token, ErrorKind::ExpectedExpression))?;

        let token = self.cur_clone();
        if token.kind != TemplateKind::Comma {
            return Err(self.err(&token, ErrorKind::ExpectedPunct(",")));
        }
        self.advance()?;

        let name = self.cur_clone();
        if name.kind != TemplateKind::Str {
            return Err(self.err(&name, ErrorKind::ExpectedStringLiteral(name.text.clone())));
        }
        self.advance()?;

        let token = self.cur_clone();
        if token.kind != TemplateKind::RParen {
            return Err(self.err(&token, ErrorKind::ExpectedPunct(")")));
        }
        self.advance()?;

        let has = item
            .attrs
            .map(|id| self.store.attr_list(id).has(&name.text))
            .unwrap_or(false);
        Ok(Item::bool(has))
    }
}

/// Digits-only token to integer, wrapping on overflow.
fn parse_number(text: &str) -> i64 {
    text.bytes()
        .fold(0i64, |acc, b| {
            acc.wrapping_mul(10).wrapping_add((b - b'0') as i64)
        })
}

#[cfg(test)]
mod tests {
    use super::parse_number;

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0"), 0);
        assert_eq!(parse_number("42"), 42);
        assert_eq!(parse_number("007"), 7);
    }
}
