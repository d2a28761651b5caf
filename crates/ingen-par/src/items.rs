//! Construction of the data-dictionary items templates consume.
//!
//! Shapes:
//!
//! - struct item: `{Name, Fields, FieldCount, TypeInfo}` (+ attributes)
//! - field item: `{Type, Name, HasInitializer, Initializer, IsMethod,
//!   MethodArguments?}` (+ attributes)
//! - type item: `{Name, IsPointer, IsReference, HasInnerType,
//!   InnerType?, Args}`; resolution adds `Info`
//! - type info item: `{Name, Descriptor, CamelCase}` (+ attributes)

use ingen_data::{AttrListId, DataStore, DictId, Item, SourceRef};

use crate::ast::{DeclaredType, FieldDecl, ParsedType, StructDecl};

/// Converts a `snake_case` name to `CamelCase`: the first character is
/// uppercased, and every underscore uppercases the character after it.
pub fn to_camel_case(text: &str) -> String {
    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    if bytes.is_empty() {
        return out;
    }

    let mut i = 0;
    if bytes[0] != b'_' {
        out.push(bytes[0].to_ascii_uppercase() as char);
        i = 1;
    }
    while i < bytes.len() {
        if bytes[i] == b'_' && i + 1 < bytes.len() {
            i += 1;
            out.push(bytes[i].to_ascii_uppercase() as char);
        } else {
            out.push(bytes[i] as char);
        }
        i += 1;
    }
    out
}

/// Display name of a pointer/reference type: the innermost name, a
/// space, then one suffix character per wrapper level with the
/// innermost level's suffix leftmost (`Int *`, `Int **`, `Int *&`).
fn pointer_display_name(ty: &ParsedType) -> String {
    let mut suffixes = String::new();
    let mut current = ty;
    let name = loop {
        if current.is_pointer {
            suffixes.insert(0, '*');
        } else if current.is_reference {
            suffixes.insert(0, '&');
        } else {
            break current.name.as_ref().map(|t| t.text.as_str()).unwrap_or("");
        }
        match &current.inner {
            Some(inner) => current = inner,
            None => unreachable!("wrapper type without inner type"),
        }
    };
    format!("{name} {suffixes}")
}

/// Builds a type item (recursively for inner types and arguments).
pub(crate) fn new_type_item(store: &mut DataStore, ty: &ParsedType) -> Item {
    let dict = store.new_dict(None);

    let name = if ty.is_pointer || ty.is_reference {
        pointer_display_name(ty)
    } else {
        ty.name.as_ref().map(|t| t.text.clone()).unwrap_or_default()
    };
    store.insert(dict, "Name", Item::str(name));
    store.insert(dict, "IsPointer", Item::bool(ty.is_pointer));
    store.insert(dict, "IsReference", Item::bool(ty.is_reference));

    match &ty.inner {
        Some(inner) => {
            store.insert(dict, "HasInnerType", Item::bool(true));
            let inner_item = new_type_item(store, inner);
            store.insert(dict, "InnerType", inner_item);
        }
        None => store.insert(dict, "HasInnerType", Item::bool(false)),
    }

    let args = store.new_list();
    for arg in &ty.args {
        let arg_item = new_type_item(store, arg);
        store.list_mut(args).push(arg_item);
    }
    store.insert(dict, "Args", Item::list(args));

    let name_token = ty.innermost_name();
    let mut item = Item::dict(dict);
    item.at = Some(SourceRef {
        file: name_token.file,
        span: name_token.span,
    });
    item
}

/// Builds a field item. Every created root type item is also pushed to
/// `pending_types` for the resolution pass.
pub(crate) fn new_field_item(
    store: &mut DataStore,
    field: &FieldDecl,
    pending_types: &mut Vec<Item>,
) -> Item {
    let dict = store.new_dict(None);

    let type_item = new_type_item(store, &field.ty);
    pending_types.push(type_item.clone());
    store.insert(dict, "Type", type_item);
    store.insert(dict, "Name", Item::str(field.name.text.clone()));
    store.insert(dict, "HasInitializer", Item::bool(field.initializer.is_some()));
    store.insert(
        dict,
        "Initializer",
        Item::str(field.initializer.clone().unwrap_or_default()),
    );
    store.insert(dict, "IsMethod", Item::bool(field.is_method));

    if field.is_method {
        let arguments = store.new_list();
        for argument in &field.arguments {
            let argument_dict = store.new_dict(None);
            store.insert(argument_dict, "Name", Item::str(argument.name.text.clone()));
            let argument_type = new_type_item(store, &argument.ty);
            pending_types.push(argument_type.clone());
            store.insert(argument_dict, "Type", argument_type);
            store.list_mut(arguments).push(Item::dict(argument_dict));
        }
        store.insert(dict, "MethodArguments", Item::list(arguments));
    }

    let mut item = Item::dict(dict);
    item.attrs = field.attrs;
    item
}

/// Builds a struct item, sharing the attribute list and the type-info
/// dictionary with the struct's entry in the `Types` list.
pub(crate) fn new_struct_item(
    store: &mut DataStore,
    decl: &StructDecl,
    type_info: DictId,
    attrs: Option<AttrListId>,
    pending_types: &mut Vec<Item>,
) -> Item {
    let dict = store.new_dict(None);
    store.insert(dict, "Name", Item::str(decl.identifier.text.clone()));

    let fields = store.new_list();
    for field in &decl.fields {
        let field_item = new_field_item(store, field, pending_types);
        store.list_mut(fields).push(field_item);
    }
    store.insert(dict, "Fields", Item::list(fields));
    store.insert(dict, "FieldCount", Item::int(decl.fields.len() as i64));
    store.insert(dict, "TypeInfo", Item::dict(type_info));

    let mut item = Item::dict(dict);
    item.attrs = attrs;
    item
}

/// Builds a `{Name, Descriptor, CamelCase}` type-info item.
pub(crate) fn new_type_info_item(
    store: &mut DataStore,
    name: &str,
    descriptor: &str,
    attrs: Option<AttrListId>,
) -> Item {
    let dict = store.new_dict(None);
    store.insert(dict, "Name", Item::str(name));
    store.insert(dict, "Descriptor", Item::str(descriptor));
    store.insert(dict, "CamelCase", Item::str(to_camel_case(name)));

    let mut item = Item::dict(dict);
    item.attrs = attrs;
    item
}

/// Type info for a struct declaration: descriptor `<CamelCase>TD`.
pub(crate) fn struct_type_info(
    store: &mut DataStore,
    decl: &StructDecl,
    attrs: Option<AttrListId>,
) -> Item {
    let descriptor = format!("{}TD", to_camel_case(&decl.identifier.text));
    new_type_info_item(store, &decl.identifier.text, &descriptor, attrs)
}

/// Type info for a `declare_type`, with its explicit descriptor.
pub(crate) fn declared_type_info(
    store: &mut DataStore,
    decl: &DeclaredType,
    attrs: Option<AttrListId>,
) -> Item {
    new_type_info_item(store, &decl.type_name.text, &decl.descriptor.text, attrs)
}
