//! The tagged value every template expression produces and consumes.

use ingen_util::Span;

use crate::store::{AttrListId, DictId, ListId};

/// Type tag of an [`Item`], used for operator dispatch and error text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tag {
    Str,
    Int,
    Bool,
    Void,
    Dict,
    List,
    Procedure,
}

/// Number of tags; the operator interface table has one entry per tag.
pub const TAG_COUNT: usize = 7;

impl Tag {
    /// The name templates see in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Tag::Str => "String",
            Tag::Int => "Int",
            Tag::Bool => "Bool",
            Tag::Void => "Void",
            Tag::Dict => "Dict",
            Tag::List => "List",
            Tag::Procedure => "Procedure",
        }
    }
}

/// The payload of an item. Containers are handles into the
/// [`DataStore`](crate::DataStore) that owns them.
#[derive(Clone, Debug)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    Void,
    Dict(DictId),
    List(ListId),
    Procedure(Procedure),
}

impl Value {
    #[inline]
    pub fn tag(&self) -> Tag {
        match self {
            Value::Str(_) => Tag::Str,
            Value::Int(_) => Tag::Int,
            Value::Bool(_) => Tag::Bool,
            Value::Void => Tag::Void,
            Value::Dict(_) => Tag::Dict,
            Value::List(_) => Tag::List,
            Value::Procedure(_) => Tag::Procedure,
        }
    }
}

/// A template procedure created by `$define$`.
///
/// The body is not stored as text: it is the token-stream position of the
/// first body token. Calling the procedure jumps the evaluator's cursor
/// there and evaluates until the matching `end`.
#[derive(Clone, Debug)]
pub struct Procedure {
    /// Parameter names, in declaration order.
    pub params: Vec<String>,
    /// Scope the procedure was defined in; the call scope chains to it.
    pub parent: DictId,
    /// Token-stream position of the first body token.
    pub body: usize,
    /// Indentation deltas captured at definition time and re-applied
    /// around every call.
    pub tabs: TabState,
}

/// Per-line indentation deltas (see the evaluator's indentation machine).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TabState {
    /// Indent levels prepended to every emitted line.
    pub to_add: i32,
    /// Indent levels stripped from the literal leading whitespace of
    /// every emitted line.
    pub to_remove: i32,
}

/// Where a looked-up item came from: the dictionary entry it was read
/// out of. Assignment and `++`/`--` write back through this cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Origin {
    pub dict: DictId,
    pub key: String,
}

/// Source position an item was created from, for diagnostics that fire
/// long after parsing (e.g. type resolution).
#[derive(Clone, Copy, Debug)]
pub struct SourceRef {
    /// Tag of the file the item came from (index into the inspect
    /// parser's lexer storage).
    pub file: u32,
    pub span: Span,
}

/// A tagged value plus the bookkeeping the evaluator needs: an optional
/// attribute list, the dictionary cursor it was looked up through (its
/// L-value identity), and an optional source position.
#[derive(Clone, Debug)]
pub struct Item {
    pub value: Value,
    pub attrs: Option<AttrListId>,
    pub origin: Option<Origin>,
    pub at: Option<SourceRef>,
}

impl Item {
    /// An owned item with no attributes and no origin.
    pub fn new(value: Value) -> Self {
        Self {
            value,
            attrs: None,
            origin: None,
            at: None,
        }
    }

    pub fn str(value: impl Into<String>) -> Self {
        Self::new(Value::Str(value.into()))
    }

    pub fn int(value: i64) -> Self {
        Self::new(Value::Int(value))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(Value::Bool(value))
    }

    pub fn void() -> Self {
        Self::new(Value::Void)
    }

    pub fn dict(id: DictId) -> Self {
        Self::new(Value::Dict(id))
    }

    pub fn list(id: ListId) -> Self {
        Self::new(Value::List(id))
    }

    #[inline]
    pub fn tag(&self) -> Tag {
        self.value.tag()
    }

    /// True when the item can be written back through its origin.
    #[inline]
    pub fn is_lvalue(&self) -> bool {
        self.origin.is_some()
    }

    /// Integer payload. Callers check the tag first; the operator table
    /// guarantees it for dispatched operations.
    #[inline]
    pub fn as_int(&self) -> i64 {
        match self.value {
            Value::Int(v) => v,
            _ => unreachable!("item is not an Int"),
        }
    }

    /// Boolean payload.
    #[inline]
    pub fn as_bool(&self) -> bool {
        match self.value {
            Value::Bool(v) => v,
            _ => unreachable!("item is not a Bool"),
        }
    }

    /// String payload.
    #[inline]
    pub fn as_str(&self) -> &str {
        match &self.value {
            Value::Str(v) => v,
            _ => unreachable!("item is not a String"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        assert_eq!(Item::str("x").tag(), Tag::Str);
        assert_eq!(Item::int(3).tag(), Tag::Int);
        assert_eq!(Item::bool(true).tag(), Tag::Bool);
        assert_eq!(Item::void().tag(), Tag::Void);
    }

    #[test]
    fn test_tag_names() {
        assert_eq!(Tag::Str.name(), "String");
        assert_eq!(Tag::Procedure.name(), "Procedure");
    }

    #[test]
    fn test_payload_accessors() {
        assert_eq!(Item::int(7).as_int(), 7);
        assert!(Item::bool(true).as_bool());
        assert_eq!(Item::str("hi").as_str(), "hi");
    }

    #[test]
    fn test_fresh_items_are_not_lvalues() {
        assert!(!Item::int(1).is_lvalue());
        assert!(!Item::str("x").is_lvalue());
    }
}
