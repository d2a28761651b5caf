//! Raw parse products of the inspect language.
//!
//! These hold tokens and raw text slices straight out of the parser;
//! the data-dictionary items templates consume are built from them in
//! [`items`](crate::items), and names are resolved against the declared
//! type and attribute tables afterwards.

use ingen_data::AttrListId;
use ingen_lex::InspectToken;

/// A parsed type: `Name<Arg1, Arg2, ...>` with `*`/`&` suffixes composed
/// right-to-left. Pointer/reference levels wrap an inner type and have
/// no name of their own.
#[derive(Clone, Debug)]
pub struct ParsedType {
    /// The type name; `None` on pointer/reference wrapper levels.
    pub name: Option<InspectToken>,
    /// Type arguments of this level.
    pub args: Vec<ParsedType>,
    pub is_pointer: bool,
    pub is_reference: bool,
    /// The wrapped type for pointer/reference levels.
    pub inner: Option<Box<ParsedType>>,
}

impl ParsedType {
    /// The token naming the innermost non-pointer type.
    pub fn innermost_name(&self) -> &InspectToken {
        let mut current = self;
        loop {
            if let Some(name) = &current.name {
                return name;
            }
            match &current.inner {
                Some(inner) => current = inner,
                None => unreachable!("wrapper type without inner type"),
            }
        }
    }
}

/// A typed method argument: `<type> <name>`.
#[derive(Clone, Debug)]
pub struct TypedArg {
    pub name: InspectToken,
    pub ty: ParsedType,
}

/// One struct field, either a data member or a method.
#[derive(Debug)]
pub struct FieldDecl {
    pub ty: ParsedType,
    pub name: InspectToken,
    pub attrs: Option<AttrListId>,
    /// Raw source text of the initializer, quotes included.
    pub initializer: Option<String>,
    pub is_method: bool,
    pub arguments: Vec<TypedArg>,
}

/// `struct <Name> { <field>* };`
#[derive(Debug)]
pub struct StructDecl {
    pub identifier: InspectToken,
    pub fields: Vec<FieldDecl>,
}

/// `declare_type <Name> <Descriptor>;`
#[derive(Debug)]
pub struct DeclaredType {
    pub type_name: InspectToken,
    pub descriptor: InspectToken,
}

/// `declare_attribute <Name>(<param>, ...)`
#[derive(Debug)]
pub struct AttrDecl {
    pub name: InspectToken,
    pub params: Vec<InspectToken>,
}

/// One supplied attribute argument; raw source text, quotes included.
#[derive(Clone, Debug)]
pub struct RawArgument {
    /// Explicit `name:` binding, if the argument used one.
    pub name: Option<InspectToken>,
    pub value: String,
}

/// A supplied attribute argument list.
#[derive(Clone, Debug, Default)]
pub struct RawArgList {
    /// The opening parenthesis, for arity error locations.
    pub begin: Option<InspectToken>,
    pub args: Vec<RawArgument>,
}

/// An attribute instance as written: either `[Name(args)]` or a bare
/// identifier referring to an `alias_attribute`.
#[derive(Clone, Debug)]
pub struct RawInstance {
    pub name: InspectToken,
    pub args: RawArgList,
    pub aliased: bool,
}

/// `alias_attribute <Alias> <instance>`
#[derive(Debug)]
pub struct AttrAlias {
    pub alias: InspectToken,
    pub target: RawInstance,
    /// Index into the declaration table, filled by resolution.
    pub decl: Option<usize>,
}
