//! ingen-par - Parser for the inspect language.
//!
//! Consumes inspect tokens and builds the global data dictionary the
//! template evaluator runs against: a `Structs` list of struct items and
//! a `Types` list of type-info items, all living in the shared
//! [`DataStore`].
//!
//! Two pieces are worth calling out:
//!
//! - **Imports** push a fresh lexer on a bounded stack (at most
//!   [`MAX_IMPORT_DEPTH`] deep) and resolve paths relative to the
//!   importing file. All files share one token record. Structs from
//!   imported files register their type info but do not appear in
//!   `Structs`.
//! - **Fields are parsed in reverse.** An attribute name and a type
//!   name are both bare identifiers, so the front of a field is
//!   ambiguous. The parser scans forward to the terminating `;` or `=`,
//!   then walks the recorded tokens backwards: method argument list,
//!   field name, type; whatever is left in front is re-parsed forwards
//!   as the attribute list. A barrier position guards every backward
//!   step so a malformed field fails instead of walking out of the
//!   field.
//!
//! After the top-level parse, two resolution passes run: type
//! resolution (every field/argument type gets an `Info` reference into
//! the `Types` list) and attribute resolution (aliases are linked,
//! arities checked, and each attribute list's `AttributeData` built).

pub mod ast;
pub mod items;

mod resolve;

use std::path::Path;

use ingen_data::{AttrListId, DataStore, DictId, Item, ListId, SourceRef};
use ingen_lex::{InspectKind, InspectLexer, InspectToken, TokenStream};
use ingen_util::{Error, ErrorKind, Result, Span};

use ast::{
    AttrAlias, AttrDecl, DeclaredType, FieldDecl, ParsedType, RawArgList, RawArgument,
    RawInstance, StructDecl, TypedArg,
};

/// Maximum depth of nested `import` directives.
pub const MAX_IMPORT_DEPTH: usize = 10;

/// Parses the inspect file at `path` (and everything it imports) into
/// `global`: `Structs` and `Types` are inserted on success.
pub fn parse_file(store: &mut DataStore, global: DictId, path: &Path) -> Result<()> {
    let lexer = InspectLexer::from_file(path, 0).map_err(|e| {
        Error::new(
            path.display().to_string(),
            Span::DUMMY,
            ErrorKind::Io(format!("Unable to open file \"{}\": {}", path.display(), e)),
        )
    })?;
    InspectParser::new(store, lexer).parse(global)
}

/// Parses in-memory inspect source. Imports resolve relative to the
/// working directory.
pub fn parse_source(
    store: &mut DataStore,
    global: DictId,
    filename: &str,
    source: &str,
) -> Result<()> {
    let lexer = InspectLexer::from_source(filename, source, 0);
    InspectParser::new(store, lexer).parse(global)
}

struct PendingAttrList {
    id: AttrListId,
    instances: Vec<RawInstance>,
}

/// The inspect parser. One instance handles the root file plus its
/// whole import tree.
pub struct InspectParser<'a> {
    store: &'a mut DataStore,
    stream: TokenStream<InspectToken>,

    /// Every lexer ever opened; token `file` tags index this.
    lexers: Vec<InspectLexer>,
    /// Index of the lexer currently producing tokens.
    current: usize,
    /// Lexers suspended by `import`, innermost last.
    import_stack: Vec<usize>,

    struct_list: ListId,
    type_list: ListId,
    /// Root type items of root-file fields, resolved after parsing.
    pending_types: Vec<Item>,

    attribute_decls: Vec<AttrDecl>,
    attribute_aliases: Vec<AttrAlias>,
    unresolved_attrs: Vec<PendingAttrList>,
}

impl<'a> InspectParser<'a> {
    fn new(store: &'a mut DataStore, lexer: InspectLexer) -> Self {
        let struct_list = store.new_list();
        let type_list = store.new_list();
        let mut parser = Self {
            store,
            stream: TokenStream::new(),
            lexers: vec![lexer],
            current: 0,
            import_stack: Vec::new(),
            struct_list,
            type_list,
            pending_types: Vec::new(),
            attribute_decls: Vec::new(),
            attribute_aliases: Vec::new(),
            unresolved_attrs: Vec::new(),
        };
        parser.register_builtin_types();
        parser
    }

    /// Seeds the `Types` list. The `Pointer` sentinel must be the first
    /// entry: pointer and reference levels resolve their `Info` to
    /// element 0. The primitive infos let fields use `Int`, `Bool` and
    /// `String` without a `declare_type`.
    fn register_builtin_types(&mut self) {
        let pointer = items::new_type_info_item(self.store, "Pointer", "TD_PTR", None);
        self.store.list_mut(self.type_list).push(pointer);

        for name in ["Int", "Bool", "String"] {
            let descriptor = format!("{}TD", items::to_camel_case(name));
            let info = items::new_type_info_item(self.store, name, &descriptor, None);
            self.store.list_mut(self.type_list).push(info);
        }
    }

    // Token plumbing

    fn advance(&mut self) -> Result<()> {
        if self.stream.has_recorded_next() {
            self.stream.advance_recorded();
            return Ok(());
        }
        let token = self.lexers[self.current].next_token();
        if token.kind == InspectKind::IncompleteString {
            return Err(self.located(&token, ErrorKind::IncompleteString));
        }
        self.stream.push_and_advance(token);
        Ok(())
    }

    #[inline]
    fn cur(&self) -> &InspectToken {
        self.stream.current()
    }

    #[inline]
    fn cur_clone(&self) -> InspectToken {
        self.stream.current().clone()
    }

    fn located(&self, token: &InspectToken, kind: ErrorKind) -> Error {
        Error::new(
            self.lexers[token.file as usize].filename(),
            token.span,
            kind,
        )
    }

    fn located_at(&self, at: SourceRef, kind: ErrorKind) -> Error {
        Error::new(self.lexers[at.file as usize].filename(), at.span, kind)
    }

    fn check_next(&mut self, kind: InspectKind) -> Result<bool> {
        self.advance()?;
        Ok(self.cur().kind == kind)
    }

    fn expect_at(&self, kind: InspectKind, what: &str) -> Result<()> {
        let token = self.cur();
        if token.kind != kind {
            return Err(self.located(
                token,
                ErrorKind::Expected {
                    expected: what.to_string(),
                    found: token.text.clone(),
                },
            ));
        }
        Ok(())
    }

    fn expect_next(&mut self, kind: InspectKind, what: &str) -> Result<()> {
        self.advance()?;
        self.expect_at(kind, what)
    }

    /// Errors if a backward walk has reached the barrier position (the
    /// token just before the construct being reverse-parsed).
    fn fail_at_barrier(&self, barrier: usize) -> Result<()> {
        if self.stream.pos() == barrier {
            let token = self.cur();
            return Err(self.located(token, ErrorKind::UnexpectedToken(token.text.clone())));
        }
        Ok(())
    }

    /// Raw source text between the start of `begin` and the start of
    /// `end`. Both tokens come from the same file by construction.
    fn raw_slice(&self, begin: &InspectToken, end: &InspectToken) -> String {
        let source = self.lexers[begin.file as usize].source();
        source[begin.span.lo..end.span.lo].to_string()
    }

    // Imports

    fn start_import(&mut self, filename: &InspectToken) -> Result<()> {
        if self.import_stack.len() >= MAX_IMPORT_DEPTH {
            return Err(self.located(
                filename,
                ErrorKind::ImportDepthExceeded {
                    limit: MAX_IMPORT_DEPTH,
                },
            ));
        }
        let path = self.lexers[self.current].directory().join(&filename.text);
        let file = self.lexers.len() as u32;
        let lexer = InspectLexer::from_file(&path, file).map_err(|_| {
            self.located(filename, ErrorKind::UnableToOpenImport(filename.text.clone()))
        })?;
        self.lexers.push(lexer);
        self.import_stack.push(self.current);
        self.current = file as usize;
        Ok(())
    }

    fn pop_import(&mut self) -> bool {
        match self.import_stack.pop() {
            Some(previous) => {
                self.current = previous;
                true
            }
            None => false,
        }
    }

    // Top level

    fn parse(mut self, global: DictId) -> Result<()> {
        loop {
            self.advance()?;
            if self.cur().kind == InspectKind::Eof {
                if !self.pop_import() {
                    break;
                }
                continue;
            }

            let mut pending = self.parse_attribute_list(usize::MAX)?;
            if self.cur().kind == InspectKind::Eof {
                if let Some((_, first)) = pending {
                    return Err(self.located(
                        &first,
                        ErrorKind::MisplacedAttributeList(first.text.clone()),
                    ));
                }
                break;
            }

            if let Some(decl) = self.parse_struct()? {
                let attrs = pending.take().map(|(id, _)| id);
                let info_item = items::struct_type_info(self.store, &decl, attrs);
                let info_dict = match &info_item.value {
                    ingen_data::Value::Dict(dict) => *dict,
                    _ => unreachable!("type info items are dicts"),
                };

                // Structs from imported files contribute type info only.
                if self.import_stack.is_empty() {
                    let struct_item = items::new_struct_item(
                        self.store,
                        &decl,
                        info_dict,
                        attrs,
                        &mut self.pending_types,
                    );
                    self.store.list_mut(self.struct_list).push(struct_item);
                }
                self.store.list_mut(self.type_list).push(info_item);
                continue;
            }

            let mut matched = false;

            if let Some(declared) = self.parse_declare_type()? {
                let attrs = pending.take().map(|(id, _)| id);
                let info = items::declared_type_info(self.store, &declared, attrs);
                self.store.list_mut(self.type_list).push(info);
                matched = true;
            }

            if let Some(alias) = self.parse_alias_attribute()? {
                self.attribute_aliases.push(alias);
                matched = true;
            }

            if let Some(decl) = self.parse_declare_attribute()? {
                self.attribute_decls.push(decl);
                matched = true;
            }

            if let Some(filename) = self.parse_import()? {
                self.start_import(&filename)?;
                matched = true;
            }

            if let Some((_, first)) = pending {
                return Err(self.located(
                    &first,
                    ErrorKind::MisplacedAttributeList(first.text.clone()),
                ));
            }

            if !matched {
                let token = self.cur_clone();
                return Err(self.located(&token, ErrorKind::UnexpectedToken(token.text.clone())));
            }
        }

        self.resolve_types()?;
        self.resolve_attributes()?;

        self.store
            .insert(global, "Structs", Item::list(self.struct_list));
        self.store.insert(global, "Types", Item::list(self.type_list));
        Ok(())
    }

    // Declarations

    fn parse_struct(&mut self) -> Result<Option<StructDecl>> {
        if self.cur().kind != InspectKind::Struct {
            return Ok(None);
        }
        if !self.check_next(InspectKind::Identifier)? {
            let token = self.cur_clone();
            return Err(self.located(&token, ErrorKind::ExpectedIdentifierAfter("struct")));
        }
        let identifier = self.cur_clone();
        self.expect_next(InspectKind::LBrace, "{")?;

        let mut fields = Vec::new();
        loop {
            self.advance()?;
            if self.cur().kind == InspectKind::RBrace {
                break;
            }
            fields.push(self.parse_field()?);
        }
        self.expect_next(InspectKind::Semicolon, ";")?;

        Ok(Some(StructDecl { identifier, fields }))
    }

    /// Parses one field, mostly backwards; see the module docs.
    fn parse_field(&mut self) -> Result<FieldDecl> {
        let begin = self.stream.pos();
        let barrier = begin - 1;
        let first = self.cur_clone();

        // Forward scan to the terminator.
        loop {
            match self.cur().kind {
                InspectKind::Semicolon | InspectKind::Equals => break,
                InspectKind::Eof => return Err(self.located(&first, ErrorKind::EofInField)),
                _ => self.advance()?,
            }
        }
        let end = self.stream.pos();

        // Walk backwards: method arguments, name, type.
        self.stream.back();

        let mut is_method = false;
        let mut arguments = Vec::new();
        if self.cur().kind == InspectKind::RParen {
            arguments = self.parse_typed_argument_list_reverse(barrier)?;
            is_method = true;
        }
        self.fail_at_barrier(barrier)?;

        self.expect_at(InspectKind::Identifier, "Identifier")?;
        let name = self.cur_clone();
        self.stream.back();
        if self.stream.pos() == barrier {
            let token = self.cur_clone();
            return Err(self.located(&token, ErrorKind::UnexpectedIdentifier));
        }

        let ty = self.parse_type_reverse(barrier)?;

        // Whatever precedes the type is the attribute list.
        let mut attrs = None;
        if self.stream.pos() != barrier {
            let attrs_end = self.stream.pos() + 1;
            self.stream.jump(begin);
            attrs = self.parse_attribute_list(attrs_end)?.map(|(id, _)| id);
        }
        self.stream.jump(end);

        let mut initializer = None;
        if self.cur().kind == InspectKind::Equals {
            self.advance()?;
            let init_begin = self.cur_clone();
            while self.cur().kind != InspectKind::Semicolon {
                if self.cur().kind == InspectKind::Eof {
                    let token = self.cur_clone();
                    return Err(
                        self.located(&token, ErrorKind::EofWhileParsing("field initializer"))
                    );
                }
                self.advance()?;
            }
            let terminator = self.cur_clone();
            initializer = Some(self.raw_slice(&init_begin, &terminator));
        }

        // The cursor is left on the field's terminating ';'.
        Ok(FieldDecl {
            ty,
            name,
            attrs,
            initializer,
            is_method,
            arguments,
        })
    }

    fn parse_type_reverse(&mut self, barrier: usize) -> Result<ParsedType> {
        let kind = self.cur().kind;
        if kind == InspectKind::Star || kind == InspectKind::Ampersand {
            self.stream.back();
            self.fail_at_barrier(barrier)?;
            let inner = self.parse_type_reverse(barrier)?;
            return Ok(ParsedType {
                name: None,
                args: Vec::new(),
                is_pointer: kind == InspectKind::Star,
                is_reference: kind == InspectKind::Ampersand,
                inner: Some(Box::new(inner)),
            });
        }

        let mut args = Vec::new();
        if self.cur().kind == InspectKind::RAngle {
            args = self.parse_type_args_reverse(barrier)?;
            self.fail_at_barrier(barrier)?;
        }

        self.expect_at(InspectKind::Identifier, "Identifier")?;
        let name = self.cur_clone();
        self.stream.back();

        Ok(ParsedType {
            name: Some(name),
            args,
            is_pointer: false,
            is_reference: false,
            inner: None,
        })
    }

    /// Reverse-parses `<Arg1, ..., ArgN>` starting at the `>`. Arguments
    /// come out back-to-front and are reversed before returning.
    fn parse_type_args_reverse(&mut self, barrier: usize) -> Result<Vec<ParsedType>> {
        let mut args = Vec::new();
        loop {
            self.stream.back();
            self.fail_at_barrier(barrier)?;

            args.push(self.parse_type_reverse(barrier)?);

            let kind = self.cur().kind;
            if kind != InspectKind::Comma && kind != InspectKind::LAngle {
                let token = self.cur_clone();
                return Err(self.located(&token, ErrorKind::UnexpectedToken(token.text.clone())));
            }
            if kind == InspectKind::LAngle {
                break;
            }
        }
        args.reverse();
        self.stream.back();
        Ok(args)
    }

    /// Reverse-parses a method's `(T1 a1, ...)` starting at the `)`. The
    /// arguments are returned in the backward order they were walked.
    fn parse_typed_argument_list_reverse(&mut self, barrier: usize) -> Result<Vec<TypedArg>> {
        self.stream.back();
        self.fail_at_barrier(barrier)?;

        if self.cur().kind == InspectKind::LParen {
            self.stream.back();
            return Ok(Vec::new());
        }

        let mut args = Vec::new();
        loop {
            args.push(self.parse_typed_argument_reverse(barrier)?);

            match self.cur().kind {
                InspectKind::Comma => {
                    self.stream.back();
                    self.fail_at_barrier(barrier)?;
                }
                InspectKind::LParen => break,
                _ => {
                    // Attributes in front of the argument: parse them
                    // forwards (they are checked but not kept), then
                    // resume before them.
                    let attrs_end = self.stream.pos() + 1;
                    loop {
                        self.stream.back();
                        self.fail_at_barrier(barrier)?;
                        let kind = self.cur().kind;
                        if kind == InspectKind::Comma || kind == InspectKind::LParen {
                            break;
                        }
                    }
                    let before = self.stream.pos();
                    self.advance()?;
                    let _ = self.parse_attribute_list(attrs_end)?;
                    self.stream.jump(before);
                    if self.cur().kind == InspectKind::LParen {
                        break;
                    }
                }
            }
        }
        self.stream.back();
        Ok(args)
    }

    fn parse_typed_argument_reverse(&mut self, barrier: usize) -> Result<TypedArg> {
        self.expect_at(InspectKind::Identifier, "Identifier")?;
        let name = self.cur_clone();
        self.stream.back();
        self.fail_at_barrier(barrier)?;
        let ty = self.parse_type_reverse(barrier)?;
        Ok(TypedArg { name, ty })
    }

    // Attributes

    /// Parses attribute instances until a non-attribute token or the
    /// `until` position. Unlike the other parse functions this ends on
    /// the token after the last instance. The raw instances are kept
    /// for the resolution pass; the caller gets the allocated list
    /// handle plus the first instance's name token for error reporting.
    fn parse_attribute_list(
        &mut self,
        until: usize,
    ) -> Result<Option<(AttrListId, InspectToken)>> {
        let mut instances = Vec::new();
        while self.stream.pos() < until {
            match self.parse_attribute_instance()? {
                None => break,
                Some(instance) => {
                    instances.push(instance);
                    self.advance()?;
                }
            }
        }

        if instances.is_empty() {
            return Ok(None);
        }
        let first = instances[0].name.clone();
        let id = self.store.new_attr_list();
        self.unresolved_attrs.push(PendingAttrList { id, instances });
        Ok(Some((id, first)))
    }

    /// `[Name(args)]` or a bare alias identifier. `Ok(None)` when the
    /// current token cannot start an attribute.
    fn parse_attribute_instance(&mut self) -> Result<Option<RawInstance>> {
        if self.cur().kind != InspectKind::LBracket {
            if self.cur().kind != InspectKind::Identifier {
                return Ok(None);
            }
            let name = self.cur_clone();
            return Ok(Some(RawInstance {
                name,
                args: RawArgList::default(),
                aliased: true,
            }));
        }

        self.expect_next(InspectKind::Identifier, "Identifier")?;
        let name = self.cur_clone();
        self.advance()?;
        let args = self.parse_argument_list()?;
        self.expect_at(InspectKind::RBracket, "]")?;

        Ok(Some(RawInstance {
            name,
            args,
            aliased: false,
        }))
    }

    /// Supplied argument list `(value, name: value, ...)`. Values are raw
    /// text slices. Ends one past the closing `)`.
    fn parse_argument_list(&mut self) -> Result<RawArgList> {
        if self.cur().kind != InspectKind::LParen {
            let token = self.cur_clone();
            return Err(self.located(&token, ErrorKind::ExpectedPunct("(")));
        }
        let begin = self.cur_clone();
        self.advance()?;

        let mut args = Vec::new();
        if self.cur().kind == InspectKind::RParen {
            self.advance()?;
            return Ok(RawArgList {
                begin: Some(begin),
                args,
            });
        }

        while self.cur().kind != InspectKind::RParen {
            let mut name = None;
            let mut value_begin = self.cur_clone();
            self.advance()?;

            if value_begin.kind == InspectKind::Identifier && self.cur().kind == InspectKind::Colon
            {
                name = Some(value_begin.clone());
                self.advance()?;
                value_begin = self.cur_clone();
            }

            while self.cur().kind != InspectKind::Comma && self.cur().kind != InspectKind::RParen {
                if self.cur().kind == InspectKind::Eof {
                    let token = self.cur_clone();
                    return Err(self.located(&token, ErrorKind::EofWhileParsing("argument list")));
                }
                self.advance()?;
            }

            let terminator = self.cur_clone();
            let value = self.raw_slice(&value_begin, &terminator);
            args.push(RawArgument { name, value });

            let last = self.cur().kind;
            self.advance()?;
            if last == InspectKind::RParen {
                break;
            }
        }

        Ok(RawArgList {
            begin: Some(begin),
            args,
        })
    }

    fn parse_declare_attribute(&mut self) -> Result<Option<AttrDecl>> {
        if self.cur().kind != InspectKind::DeclareAttribute {
            return Ok(None);
        }
        self.expect_next(InspectKind::Identifier, "Identifier")?;
        let name = self.cur_clone();
        self.advance()?;
        let params = self.parse_argument_list_declaration()?;
        Ok(Some(AttrDecl { name, params }))
    }

    /// Declared parameter list `(p1, p2, ...)`: identifiers only.
    fn parse_argument_list_declaration(&mut self) -> Result<Vec<InspectToken>> {
        if self.cur().kind != InspectKind::LParen {
            let token = self.cur_clone();
            return Err(self.located(&token, ErrorKind::ExpectedPunct("(")));
        }
        self.advance()?;

        let mut names = Vec::new();
        if self.cur().kind == InspectKind::RParen {
            return Ok(names);
        }

        loop {
            self.expect_at(InspectKind::Identifier, "Identifier")?;
            names.push(self.cur_clone());
            self.advance()?;
            match self.cur().kind {
                InspectKind::RParen => break,
                InspectKind::Comma => self.advance()?,
                InspectKind::Eof => {
                    let token = self.cur_clone();
                    return Err(self.located(&token, ErrorKind::EofWhileParsing("argument list")));
                }
                _ => {
                    let token = self.cur_clone();
                    return Err(self.located(
                        &token,
                        ErrorKind::UnexpectedInArgumentList {
                            found: token.text.clone(),
                        },
                    ));
                }
            }
        }
        Ok(names)
    }

    fn parse_alias_attribute(&mut self) -> Result<Option<AttrAlias>> {
        if self.cur().kind != InspectKind::AliasAttribute {
            return Ok(None);
        }
        let start = self.cur_clone();

        self.expect_next(InspectKind::Identifier, "Identifier")?;
        let alias = self.cur_clone();
        self.advance()?;

        match self.parse_attribute_instance()? {
            Some(target) => Ok(Some(AttrAlias {
                alias,
                target,
                decl: None,
            })),
            None => Err(self.located(&start, ErrorKind::ExpectedAttribute)),
        }
    }

    fn parse_declare_type(&mut self) -> Result<Option<DeclaredType>> {
        if self.cur().kind != InspectKind::DeclareType {
            return Ok(None);
        }
        if !self.check_next(InspectKind::Identifier)? {
            let token = self.cur_clone();
            return Err(self.located(&token, ErrorKind::ExpectedIdentifierAfter("declare_type")));
        }
        let type_name = self.cur_clone();
        if !self.check_next(InspectKind::Identifier)? {
            let token = self.cur_clone();
            return Err(self.located(&token, ErrorKind::ExpectedIdentifierAfter("type name")));
        }
        let descriptor = self.cur_clone();
        self.expect_next(InspectKind::Semicolon, ";")?;

        Ok(Some(DeclaredType {
            type_name,
            descriptor,
        }))
    }

    fn parse_import(&mut self) -> Result<Option<InspectToken>> {
        if self.cur().kind != InspectKind::Import {
            return Ok(None);
        }
        self.expect_next(InspectKind::Str, "string")?;
        let filename = self.cur_clone();
        self.expect_next(InspectKind::Semicolon, ";")?;
        Ok(Some(filename))
    }
}
