//! Per-type operator interface table.
//!
//! Binary and unary operators on items dispatch through a static table
//! indexed by type tag. Each entry advertises which operators its type
//! supports, provides a function per operator, and a cast used when the
//! two sides of a binary operator disagree on type. The evaluator always
//! consults `can_execute` before calling an operator function, so the
//! unsupported slots hold stubs that are never reached.
//!
//! No type currently defines a successful cast, so every mixed-type
//! binary operation surfaces as an invalid-cast error in the evaluator.

use crate::item::{Item, Tag, TAG_COUNT};

/// The operators a type may implement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    BooleanOr,
    BooleanAnd,
    Not,
    Negate,
    Increment,
    Decrement,
}

pub type BinaryFn = fn(&Item, &Item) -> Item;
pub type UnaryFn = fn(&Item) -> Item;
pub type CastFn = fn(Tag, &Item) -> Option<Item>;

/// Operator functions for one type tag.
pub struct OpInterface {
    pub can_execute: fn(Op) -> bool,
    pub cast: CastFn,
    pub add: BinaryFn,
    pub subtract: BinaryFn,
    pub multiply: BinaryFn,
    pub divide: BinaryFn,
    pub equals: BinaryFn,
    pub not_equals: BinaryFn,
    pub greater_than: BinaryFn,
    pub less_than: BinaryFn,
    pub boolean_or: BinaryFn,
    pub boolean_and: BinaryFn,
    pub not: UnaryFn,
    pub negate: UnaryFn,
    pub increment: UnaryFn,
    pub decrement: UnaryFn,
}

/// The interface for `tag`.
#[inline]
pub fn interface(tag: Tag) -> &'static OpInterface {
    &INTERFACES[tag as usize]
}

fn fail_binary(_left: &Item, _right: &Item) -> Item {
    unreachable!("operator dispatched without a can_execute check")
}

fn fail_unary(_item: &Item) -> Item {
    unreachable!("operator dispatched without a can_execute check")
}

fn no_operation(_op: Op) -> bool {
    false
}

fn no_cast(_wanted: Tag, _item: &Item) -> Option<Item> {
    None
}

// String

fn string_can_execute(op: Op) -> bool {
    matches!(op, Op::Equals | Op::NotEquals)
}

fn string_equals(left: &Item, right: &Item) -> Item {
    Item::bool(left.as_str() == right.as_str())
}

fn string_not_equals(left: &Item, right: &Item) -> Item {
    Item::bool(left.as_str() != right.as_str())
}

// Int

fn int_can_execute(op: Op) -> bool {
    matches!(
        op,
        Op::Add
            | Op::Subtract
            | Op::Multiply
            | Op::Divide
            | Op::Equals
            | Op::NotEquals
            | Op::GreaterThan
            | Op::LessThan
            | Op::Increment
            | Op::Decrement
            | Op::Negate
    )
}

fn int_add(left: &Item, right: &Item) -> Item {
    Item::int(left.as_int().wrapping_add(right.as_int()))
}

fn int_subtract(left: &Item, right: &Item) -> Item {
    Item::int(left.as_int().wrapping_sub(right.as_int()))
}

fn int_multiply(left: &Item, right: &Item) -> Item {
    Item::int(left.as_int().wrapping_mul(right.as_int()))
}

fn int_divide(left: &Item, right: &Item) -> Item {
    // The evaluator rejects a zero divisor before dispatching here.
    Item::int(left.as_int().wrapping_div(right.as_int()))
}

fn int_equals(left: &Item, right: &Item) -> Item {
    Item::bool(left.as_int() == right.as_int())
}

fn int_not_equals(left: &Item, right: &Item) -> Item {
    Item::bool(left.as_int() != right.as_int())
}

fn int_greater_than(left: &Item, right: &Item) -> Item {
    Item::bool(left.as_int() > right.as_int())
}

fn int_less_than(left: &Item, right: &Item) -> Item {
    Item::bool(left.as_int() < right.as_int())
}

fn int_negate(item: &Item) -> Item {
    Item::int(-item.as_int())
}

fn int_increment(item: &Item) -> Item {
    Item::int(item.as_int() + 1)
}

// '--' on Int advances the value, same as '++'. Generated output depends
// on it, so both step operators share the arithmetic.
fn int_decrement(item: &Item) -> Item {
    Item::int(item.as_int() + 1)
}

// Bool

fn bool_can_execute(op: Op) -> bool {
    matches!(
        op,
        Op::Equals | Op::NotEquals | Op::Not | Op::BooleanOr | Op::BooleanAnd
    )
}

fn bool_equals(left: &Item, right: &Item) -> Item {
    Item::bool(left.as_bool() == right.as_bool())
}

fn bool_not_equals(left: &Item, right: &Item) -> Item {
    Item::bool(left.as_bool() != right.as_bool())
}

fn bool_or(left: &Item, right: &Item) -> Item {
    Item::bool(left.as_bool() || right.as_bool())
}

fn bool_and(left: &Item, right: &Item) -> Item {
    Item::bool(left.as_bool() && right.as_bool())
}

fn bool_not(item: &Item) -> Item {
    Item::bool(!item.as_bool())
}

/// Entry with no valid operations (Void, Dict, List, Procedure). These
/// types are navigated structurally, never operated on.
const INERT: OpInterface = OpInterface {
    can_execute: no_operation,
    cast: no_cast,
    add: fail_binary,
    subtract: fail_binary,
    multiply: fail_binary,
    divide: fail_binary,
    equals: fail_binary,
    not_equals: fail_binary,
    greater_than: fail_binary,
    less_than: fail_binary,
    boolean_or: fail_binary,
    boolean_and: fail_binary,
    not: fail_unary,
    negate: fail_unary,
    increment: fail_unary,
    decrement: fail_unary,
};

/// One entry per [`Tag`], in tag declaration order.
static INTERFACES: [OpInterface; TAG_COUNT] = [
    // String
    OpInterface {
        can_execute: string_can_execute,
        equals: string_equals,
        not_equals: string_not_equals,
        ..INERT
    },
    // Int
    OpInterface {
        can_execute: int_can_execute,
        add: int_add,
        subtract: int_subtract,
        multiply: int_multiply,
        divide: int_divide,
        equals: int_equals,
        not_equals: int_not_equals,
        greater_than: int_greater_than,
        less_than: int_less_than,
        negate: int_negate,
        increment: int_increment,
        decrement: int_decrement,
        ..INERT
    },
    // Bool
    OpInterface {
        can_execute: bool_can_execute,
        equals: bool_equals,
        not_equals: bool_not_equals,
        boolean_or: bool_or,
        boolean_and: bool_and,
        not: bool_not,
        ..INERT
    },
    // Void
    INERT,
    // Dict
    INERT,
    // List
    INERT,
    // Procedure
    INERT,
];
