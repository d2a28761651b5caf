//! Resolution passes over the parsed data dictionary.
//!
//! **Type resolution** runs over every root type item created for a
//! field or method argument. Pointer/reference levels each get an
//! `Info` reference to the `Pointer` sentinel (the first entry of the
//! `Types` list); the innermost name is looked up in the `Types` list,
//! and the innermost level's type arguments are resolved recursively.
//!
//! **Attribute resolution** first binds every alias target to its
//! declaration, then walks each collected attribute list: aliases are
//! linked, direct instances bound, and the list's `AttributeData`
//! dictionary is built by checking each argument list against the
//! declaration's parameters. Argument values are stored as raw source
//! text under the parameter names.

use ingen_data::{DictId, Item, Value};
use ingen_lex::InspectToken;
use ingen_util::{Error, ErrorKind, Result, Span};

use crate::ast::RawArgList;
use crate::InspectParser;

impl InspectParser<'_> {
    pub(crate) fn resolve_types(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending_types);
        for item in &pending {
            self.resolve_type(item)?;
        }
        Ok(())
    }

    fn resolve_type(&mut self, item: &Item) -> Result<()> {
        let Value::Dict(mut dict) = item.value else {
            unreachable!("type items are dicts");
        };

        // Pointer and reference levels all resolve to the sentinel;
        // only the innermost name needs a lookup.
        loop {
            let is_pointer = self.dict_flag(dict, "IsPointer");
            let is_reference = self.dict_flag(dict, "IsReference");
            if !is_pointer && !is_reference {
                break;
            }
            let pointer_info = self.type_info_dict_at(0);
            self.store.insert(dict, "Info", Item::dict(pointer_info));
            dict = match self.store.dict(dict).get("InnerType").map(|i| &i.value) {
                Some(Value::Dict(inner)) => *inner,
                _ => unreachable!("wrapper type item without InnerType"),
            };
        }

        let name = match self.store.dict(dict).get("Name").map(|i| &i.value) {
            Some(Value::Str(name)) => name.clone(),
            _ => unreachable!("type item without Name"),
        };

        match self.find_type_info(&name) {
            Some(info) => self.store.insert(dict, "Info", Item::dict(info)),
            None => {
                let kind = ErrorKind::UnrecognizedType(name);
                return Err(match item.at {
                    Some(at) => self.located_at(at, kind),
                    None => Error::new(self.lexers[0].filename(), Span::DUMMY, kind),
                });
            }
        }

        let args = match self.store.dict(dict).get("Args").map(|i| &i.value) {
            Some(Value::List(args)) => *args,
            _ => unreachable!("type item without Args"),
        };
        let arg_items: Vec<Item> = self.store.list(args).clone();
        for arg in &arg_items {
            self.resolve_type(arg)?;
        }
        Ok(())
    }

    fn dict_flag(&self, dict: DictId, key: &str) -> bool {
        matches!(
            self.store.dict(dict).get(key).map(|i| &i.value),
            Some(Value::Bool(true))
        )
    }

    fn type_info_dict_at(&self, index: usize) -> DictId {
        match self.store.list(self.type_list)[index].value {
            Value::Dict(dict) => dict,
            _ => unreachable!("type info items are dicts"),
        }
    }

    fn find_type_info(&self, name: &str) -> Option<DictId> {
        for info in self.store.list(self.type_list) {
            let Value::Dict(dict) = info.value else {
                continue;
            };
            if let Some(Value::Str(info_name)) =
                self.store.dict(dict).get("Name").map(|i| &i.value)
            {
                if info_name == name {
                    return Some(dict);
                }
            }
        }
        None
    }

    pub(crate) fn resolve_attributes(&mut self) -> Result<()> {
        // Aliases first: each target must name a declared attribute.
        for i in 0..self.attribute_aliases.len() {
            let target_name = self.attribute_aliases[i].target.name.clone();
            match self.find_attribute_decl(&target_name.text) {
                Some(decl) => self.attribute_aliases[i].decl = Some(decl),
                None => {
                    return Err(self.located(
                        &target_name,
                        ErrorKind::UnrecognizedAttribute(target_name.text.clone()),
                    ))
                }
            }
        }

        let pending = std::mem::take(&mut self.unresolved_attrs);
        for entry in &pending {
            let mut names = Vec::new();
            let data = self.store.new_dict(None);

            for instance in &entry.instances {
                let (decl, name, args) = if instance.aliased {
                    let alias = self
                        .attribute_aliases
                        .iter()
                        .find(|a| a.alias.text == instance.name.text)
                        .ok_or_else(|| {
                            self.located(
                                &instance.name,
                                ErrorKind::UnresolvedAlias(instance.name.text.clone()),
                            )
                        })?;
                    let Some(decl) = alias.decl else {
                        unreachable!("alias targets are resolved before instances");
                    };
                    (decl, alias.target.name.clone(), alias.target.args.clone())
                } else {
                    let decl =
                        self.find_attribute_decl(&instance.name.text).ok_or_else(|| {
                            self.located(
                                &instance.name,
                                ErrorKind::UnrecognizedAttribute(instance.name.text.clone()),
                            )
                        })?;
                    (decl, instance.name.clone(), instance.args.clone())
                };

                let arguments = self.store.new_dict(None);
                self.resolve_arguments(decl, &name, &args, arguments)?;
                self.store
                    .insert(data, name.text.clone(), Item::dict(arguments));
                names.push(name.text.clone());
            }

            let list = self.store.attr_list_mut(entry.id);
            list.names = names;
            list.data = Some(data);
        }
        Ok(())
    }

    fn find_attribute_decl(&self, name: &str) -> Option<usize> {
        self.attribute_decls
            .iter()
            .position(|decl| decl.name.text == name)
    }

    /// Checks `args` against the declaration's parameter list and
    /// inserts each argument's raw text under its parameter name.
    fn resolve_arguments(
        &mut self,
        decl: usize,
        instance_name: &InspectToken,
        args: &RawArgList,
        into: DictId,
    ) -> Result<()> {
        let expected = self.attribute_decls[decl].params.len();
        if expected != args.args.len() {
            let at = args.begin.clone().unwrap_or_else(|| instance_name.clone());
            return Err(self.located(
                &at,
                ErrorKind::AttributeArity {
                    expected,
                    found: args.args.len(),
                },
            ));
        }

        for i in 0..expected {
            let param = self.attribute_decls[decl].params[i].text.clone();
            let argument = &args.args[i];
            if let Some(name) = &argument.name {
                if name.text != param {
                    return Err(self.located(
                        name,
                        ErrorKind::ArgumentNameMismatch {
                            found: name.text.clone(),
                            expected: param,
                        },
                    ));
                }
            }
            let value = args.args[i].value.clone();
            self.store.insert(into, param, Item::str(value));
        }
        Ok(())
    }
}
