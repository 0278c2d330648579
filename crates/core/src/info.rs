//! Extracts a [`ClassInfo`] while building the source tree.
//!
//! The primary type is the first top-level type, unless a later one is public
//! and the current pick is not. Method signatures are staged during the
//! forward pass and resolved once every type of the unit has been declared.

use crate::class_info::{ClassInfo, MethodInfo, PackageInfo, javadoc_text};
use crate::editor::{EditorParser, ParseOptions};
use crate::entity::{EntityResolver, ResolveContext};
use crate::error::{JscopeError, Result, StructureError};
use crate::event::{Construct, EventSink, Grammar, ParseEvent, TypeDefKind};
use crate::resolve::{class_name, referenced_type_names, resolve_type};
use crate::selection::Selection;
use crate::token::{LocatableToken, TokenKind};
use crate::tree::{NodeKind, SourceTree};
use crate::types::{JavaType, TypeResolution};
use tracing::debug;

/// A type reference captured with the scope it appeared in. It is resolved
/// only after the pass, since a type declared further down the unit may
/// shadow an imported or `java.lang` name.
#[derive(Debug, Clone)]
struct StagedType {
    tokens: Vec<LocatableToken>,
    context: ResolveContext,
}

impl StagedType {
    fn resolve(&self, resolver: &dyn EntityResolver) -> TypeResolution {
        resolve_type(resolver, &self.context, &self.tokens)
    }
}

#[derive(Debug, Clone)]
struct MethodDesc {
    name: String,
    /// `None` for constructors.
    return_type: Option<StagedType>,
    params: Vec<StagedType>,
    param_names: Vec<String>,
    javadoc: Option<String>,
}

#[derive(Debug, Default)]
struct PackageTokens {
    keyword: Option<LocatableToken>,
    name: Vec<LocatableToken>,
    semi: Option<LocatableToken>,
}

impl PackageTokens {
    fn info(&self) -> Option<PackageInfo> {
        let keyword = self.keyword.as_ref()?;
        let semi = self.semi.as_ref()?;
        Some(PackageInfo {
            name: class_name(&self.name),
            keyword_selection: Selection::of_token(keyword),
            name_selection: Selection::of_tokens(&self.name)?,
            semi_selection: Selection::of_token(semi),
        })
    }
}

pub struct InfoParser<'a> {
    editor: EditorParser<'a>,
    info: Option<ClassInfo>,
    /// Number of type bodies enclosing the current position.
    class_level: usize,
    mod_public: bool,
    is_public: bool,
    last_type_def: Option<TypeDefKind>,
    store_current: bool,
    got_extends: bool,
    got_implements: bool,
    interface_selections: Vec<Selection>,
    /// The last interface span is extended to the next interface.
    comma_pending: bool,
    last_type_spec: Vec<LocatableToken>,
    current_method: Option<MethodDesc>,
    methods: Vec<MethodDesc>,
    package: PackageTokens,
    first_error: Option<String>,
}

impl<'a> InfoParser<'a> {
    pub fn new(text: &'a str, resolver: &'a dyn EntityResolver) -> Self {
        let options = ParseOptions {
            attach_comments: true,
            expressions: false,
        };
        Self {
            editor: EditorParser::new(text, resolver, options),
            info: None,
            class_level: 0,
            mod_public: false,
            is_public: false,
            last_type_def: None,
            store_current: false,
            got_extends: false,
            got_implements: false,
            interface_selections: Vec::new(),
            comma_pending: false,
            last_type_spec: Vec::new(),
            current_method: None,
            methods: Vec::new(),
            package: PackageTokens::default(),
            first_error: None,
        }
    }

    /// Parses `text` and returns the summary of its primary type.
    pub fn parse(
        grammar: &dyn Grammar,
        text: &str,
        resolver: &dyn EntityResolver,
    ) -> Result<ClassInfo> {
        let mut parser = InfoParser::new(text, resolver);
        grammar.parse(text, &mut parser)?;
        parser.finish()
    }

    pub fn finish(self) -> Result<ClassInfo> {
        Ok(self.finish_with_tree()?.1)
    }

    /// Completes both the source tree and the class summary. Any syntax
    /// error discards the summary.
    pub fn finish_with_tree(self) -> Result<(SourceTree, ClassInfo)> {
        let InfoParser {
            editor,
            info,
            methods,
            first_error,
            ..
        } = self;
        let (tree, scope) = editor.into_parts()?;
        if let Some(message) = first_error {
            return Err(JscopeError::ClassInfo(format!("syntax error: {message}")));
        }
        let Some(mut info) = info else {
            return Err(JscopeError::ClassInfo("no type declaration found".to_string()));
        };
        resolve_methods(&mut info, methods, &scope);
        debug!(class = %info.name, methods = info.methods.len(), "class info complete");
        Ok((tree, info))
    }

    fn stage(&self, tokens: &[LocatableToken]) -> StagedType {
        StagedType {
            tokens: tokens.to_vec(),
            context: self.editor.resolve_context(),
        }
    }

    fn recording(&self) -> bool {
        self.class_level == 0 && self.store_current
    }

    fn got_type_def_name(&mut self, name: &LocatableToken) {
        self.got_extends = false;
        self.got_implements = false;
        if self.class_level != 0 {
            return;
        }
        let replace = match &self.info {
            None => true,
            Some(current) => self.is_public && !current.found_public_class(),
        };
        self.store_current = replace;
        if !replace {
            return;
        }
        if self.info.is_some() {
            debug!(name = %name.text, "public type replaces the primary type");
            // Methods staged for the replaced type do not belong to the new one.
            self.methods.clear();
        }
        let insert = Selection::point(name.end_line, name.end_column);
        self.info = Some(ClassInfo {
            name: name.text.clone(),
            public: self.is_public,
            is_enum: self.last_type_def == Some(TypeDefKind::Enum),
            is_interface: self.last_type_def == Some(TypeDefKind::Interface),
            package: self.package.info(),
            extends_insert_selection: Some(insert),
            implements_insert_selection: Some(insert),
            ..ClassInfo::default()
        });
    }

    fn got_type_parameters(&mut self, close: &LocatableToken) {
        // Only the primary type's own header moves the insertion points.
        if !self.recording() || self.editor.top_kind() != Some(NodeKind::Type) {
            return;
        }
        if let Some(info) = self.info.as_mut() {
            let insert = Selection::point(close.end_line, close.end_column);
            info.extends_insert_selection = Some(insert);
            info.implements_insert_selection = Some(insert);
        }
    }

    fn got_type_def_extends(
        &mut self,
        keyword: &LocatableToken,
        lookahead: Option<&LocatableToken>,
    ) {
        if !self.recording() {
            return;
        }
        if self.last_type_def == Some(TypeDefKind::Interface) {
            // Superinterfaces of an interface are recorded as implemented types.
            self.begin_interface_list(keyword);
            return;
        }
        let Some(info) = self.info.as_mut() else {
            return;
        };
        self.got_extends = true;
        if let Some(insert) = info.extends_insert_selection.take() {
            let (end_line, end_column) = lookahead.map_or(keyword.end(), LocatableToken::start);
            info.extends_replace_selection =
                Some(Selection::new(insert.line, insert.column, end_line, end_column));
        }
    }

    fn begin_interface_list(&mut self, keyword: &LocatableToken) {
        self.got_implements = true;
        self.comma_pending = false;
        self.interface_selections = vec![Selection::of_token(keyword)];
    }

    fn got_type_spec(&mut self, tokens: &[LocatableToken], lookahead: Option<&LocatableToken>) {
        self.last_type_spec = tokens.to_vec();
        let Some(first) = tokens.first() else {
            return;
        };
        if !self.store_current {
            return;
        }
        let Some(info) = self.info.as_mut() else {
            return;
        };
        if !matches!(first.kind, TokenKind::Primitive(_))
            && !self.got_extends
            && !self.got_implements
        {
            info.used.extend(referenced_type_names(tokens));
        }
        let Some(selection) = Selection::of_tokens(tokens) else {
            return;
        };

        if self.got_extends {
            self.got_extends = false;
            info.superclass = Some(class_name(tokens));
            info.super_replace_selection = Some(selection);
            info.implements_insert_selection = Some(selection.end_point());
        } else if self.got_implements {
            if self.comma_pending {
                if let Some(previous) = self.interface_selections.last_mut() {
                    previous.extend_end(selection.line, selection.column);
                }
            }
            self.interface_selections.push(selection);
            info.implements.push(class_name(tokens));
            self.comma_pending = lookahead.is_some_and(|token| token.is(TokenKind::Comma));
            if !self.comma_pending {
                self.got_implements = false;
                info.interface_selections = std::mem::take(&mut self.interface_selections);
                info.implements_insert_selection = Some(selection.end_point());
            }
        }
    }

    fn got_method(
        &mut self,
        name: &LocatableToken,
        hidden: Option<&LocatableToken>,
        constructor: bool,
    ) {
        let return_type = (!constructor).then(|| self.stage(&self.last_type_spec));
        self.current_method = Some(MethodDesc {
            name: name.text.clone(),
            return_type,
            params: Vec::new(),
            param_names: Vec::new(),
            javadoc: hidden.and_then(|comment| javadoc_text(&comment.text)),
        });
    }

    fn got_method_parameter(&mut self, name: &LocatableToken) {
        if self.current_method.is_none() {
            return;
        }
        let staged = self.stage(&self.last_type_spec);
        if let Some(method) = self.current_method.as_mut() {
            method.params.push(staged);
            method.param_names.push(name.text.clone());
        }
    }

    fn got_all_method_parameters(&mut self) {
        let Some(method) = self.current_method.take() else {
            return;
        };
        if self.store_current && self.class_level == 1 {
            self.methods.push(method);
        }
    }

    fn observe(&mut self, event: &ParseEvent) {
        match event {
            ParseEvent::Begin {
                construct: Construct::TypeBody,
                ..
            }
            | ParseEvent::BeginAnonClassBody { .. } => self.class_level += 1,
            ParseEvent::End {
                construct: Construct::TypeBody | Construct::AnonClassBody,
                ..
            } => self.class_level = self.class_level.saturating_sub(1),
            ParseEvent::BeginPackage { keyword } => self.package.keyword = Some(keyword.clone()),
            ParseEvent::Package { name } => self.package.name = name.clone(),
            ParseEvent::PackageSemi { semi } => self.package.semi = Some(semi.clone()),
            ParseEvent::Modifier { token } => {
                if token.text == "public" {
                    self.mod_public = true;
                }
            }
            ParseEvent::ModifiersConsumed => self.mod_public = false,
            ParseEvent::TypeDef { kind } => {
                self.is_public = self.mod_public;
                self.last_type_def = Some(*kind);
            }
            ParseEvent::TypeDefName { name, .. } => self.got_type_def_name(name),
            ParseEvent::TypeParameters { close, .. } => self.got_type_parameters(close),
            ParseEvent::TypeDefExtends { keyword, lookahead } => {
                self.got_type_def_extends(keyword, lookahead.as_ref())
            }
            ParseEvent::TypeDefImplements { keyword } => {
                if self.recording() {
                    self.begin_interface_list(keyword);
                }
            }
            ParseEvent::TypeSpec { tokens, lookahead } => {
                self.got_type_spec(tokens, lookahead.as_ref())
            }
            ParseEvent::MethodDeclaration { name, hidden } => {
                self.got_method(name, hidden.as_ref(), false)
            }
            ParseEvent::ConstructorDeclaration { name, hidden } => {
                self.got_method(name, hidden.as_ref(), true)
            }
            ParseEvent::MethodParameter { name } => self.got_method_parameter(name),
            ParseEvent::AllMethodParameters => self.got_all_method_parameters(),
            ParseEvent::Error { message } => {
                self.first_error.get_or_insert_with(|| message.clone());
            }
            _ => {}
        }
    }
}

impl EventSink for InfoParser<'_> {
    fn accept(&mut self, event: &ParseEvent) -> std::result::Result<(), StructureError> {
        // The tree is updated first so that declarations are on the scope
        // stack when their types are staged.
        self.editor.accept(event)?;
        self.observe(event);
        Ok(())
    }
}

/// Erased signature of a method: `ret name(p1, p2)`, or `name(p1, p2)` for
/// constructors.
pub fn erased_signature(name: &str, return_type: Option<&JavaType>, params: &[JavaType]) -> String {
    let params = params
        .iter()
        .map(|param| param.erased().to_string())
        .collect::<Vec<_>>()
        .join(", ");
    match return_type {
        Some(ret) => format!("{} {name}({params})", ret.erased()),
        None => format!("{name}({params})"),
    }
}

/// Resolves staged methods against the finished scope. Methods with any
/// unresolvable type are left out.
fn resolve_methods(info: &mut ClassInfo, staged: Vec<MethodDesc>, resolver: &dyn EntityResolver) {
    'methods: for method in staged {
        let return_type = match method.return_type {
            Some(staged) => match staged.resolve(resolver) {
                TypeResolution::Resolved(ty) => Some(ty),
                TypeResolution::Unresolved(reason) => {
                    debug!(method = %method.name, %reason, "skipping method");
                    continue;
                }
            },
            None => None,
        };
        let mut param_types = Vec::with_capacity(method.params.len());
        for staged in method.params {
            match staged.resolve(resolver) {
                TypeResolution::Resolved(ty) => param_types.push(ty),
                TypeResolution::Unresolved(reason) => {
                    debug!(method = %method.name, %reason, "skipping method");
                    continue 'methods;
                }
            }
        }
        let signature = erased_signature(&method.name, return_type.as_ref(), &param_types);
        info.methods.insert(
            signature.clone(),
            MethodInfo {
                name: method.name,
                signature,
                return_type,
                param_types,
                param_names: method.param_names.join(" "),
                javadoc: method.javadoc,
            },
        );
    }
}
