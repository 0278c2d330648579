//! Builds a [`SourceTree`] from a grammar's event stream.
//!
//! Open nodes live on a scope stack whose bottom is the compilation unit.
//! A node is inserted into its parent when it begins, with size zero, and is
//! sized when it ends. Comments are queued as they arrive and attached either
//! to the node on top of the stack when the next node begins after them, or
//! to the innermost node that completes around them.

use crate::entity::{EntityResolver, ResolveContext};
use crate::error::{Result, StructureError};
use crate::event::{Construct, EventSink, Grammar, ParseEvent, TypeParam};
use crate::position::LineMap;
use crate::resolve::{class_name, resolve_type};
use crate::scope::CompilationUnitScope;
use crate::token::{LocatableToken, TokenKind, join_tokens};
use crate::tree::{NodeData, NodeId, NodeKind, ScopeClass, SourceTree};
use crate::types::TypeResolution;
use tracing::{debug, trace, warn};

type StructureResult<T> = std::result::Result<T, StructureError>;

#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Attach comment nodes to the tree.
    pub attach_comments: bool,
    /// Create nodes for expressions.
    pub expressions: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            attach_comments: true,
            expressions: true,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct QueuedComment {
    start: usize,
    end: usize,
}

/// Pending comments, sorted by start offset.
/// A method return type, resolved once the whole unit has been declared.
#[derive(Debug)]
struct StagedReturn {
    method: NodeId,
    tokens: Vec<LocatableToken>,
    context: ResolveContext,
}

#[derive(Debug, Default)]
struct CommentQueue {
    pending: Vec<QueuedComment>,
}

impl CommentQueue {
    fn push(&mut self, comment: QueuedComment) {
        let index = self
            .pending
            .partition_point(|queued| queued.start <= comment.start);
        self.pending.insert(index, comment);
    }

    fn take_before(&mut self, position: usize) -> Vec<QueuedComment> {
        let end = self.pending.partition_point(|c| c.start < position);
        self.pending.drain(..end).collect()
    }

    fn take_within(&mut self, start: usize, end: usize) -> Vec<QueuedComment> {
        let lo = self.pending.partition_point(|c| c.start < start);
        let hi = self.pending.partition_point(|c| c.start < end);
        self.pending.drain(lo..hi).collect()
    }
}

pub struct EditorParser<'a> {
    text: &'a str,
    tree: SourceTree,
    stack: Vec<NodeId>,
    comments: CommentQueue,
    lines: LineMap,
    scope: CompilationUnitScope<'a>,
    options: ParseOptions,
    /// First token of the element being declared.
    stmt_begin: Option<LocatableToken>,
    last_type_spec: Vec<LocatableToken>,
    /// Type parameters of a method whose declaration has not arrived yet.
    pending_type_params: Vec<TypeParam>,
    return_types: Vec<StagedReturn>,
    syntax_errors: Vec<String>,
}

impl<'a> EditorParser<'a> {
    pub fn new(text: &'a str, resolver: &'a dyn EntityResolver, options: ParseOptions) -> Self {
        let tree = SourceTree::new();
        let root = tree.root();
        Self {
            text,
            tree,
            stack: vec![root],
            comments: CommentQueue::default(),
            lines: LineMap::new(text),
            scope: CompilationUnitScope::new(resolver),
            options,
            stmt_begin: None,
            last_type_spec: Vec::new(),
            pending_type_params: Vec::new(),
            return_types: Vec::new(),
            syntax_errors: Vec::new(),
        }
    }

    pub fn parse_compilation_unit(mut self, grammar: &dyn Grammar) -> Result<SourceTree> {
        let text = self.text;
        grammar.parse(text, &mut self)?;
        self.finish()
    }

    /// Closes the compilation unit. Fails if any other scope is still open.
    pub fn finish(self) -> Result<SourceTree> {
        let (tree, _) = self.into_parts()?;
        Ok(tree)
    }

    pub(crate) fn into_parts(mut self) -> StructureResult<(SourceTree, CompilationUnitScope<'a>)> {
        if self.stack.len() != 1 {
            return Err(StructureError::UnbalancedScopes {
                open: self.stack.len().saturating_sub(1),
            });
        }
        let root = self.tree.root();
        let size = self.lines.len();
        self.tree.set_size(root, size);
        self.completed_node(root, 0, size);
        self.resolve_return_types();
        debug!(
            nodes = self.tree.len(),
            syntax_errors = self.syntax_errors.len(),
            "source tree complete"
        );
        self.tree.set_syntax_errors(self.syntax_errors);
        Ok((self.tree, self.scope))
    }

    /// Types declared later in the unit may shadow imported or `java.lang`
    /// names, so return types are only resolved against the finished scope.
    fn resolve_return_types(&mut self) {
        for staged in std::mem::take(&mut self.return_types) {
            let resolution = resolve_type(&self.scope, &staged.context, &staged.tokens);
            if let NodeData::Method {
                name, return_type, ..
            } = &mut self.tree.node_mut(staged.method).data
            {
                if let TypeResolution::Unresolved(reason) = &resolution {
                    debug!(method = %name, %reason, "return type unresolved");
                }
                *return_type = Some(resolution);
            }
        }
    }

    pub fn top_kind(&self) -> Option<NodeKind> {
        self.stack.last().map(|&id| self.tree.node(id).kind)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn scope(&self) -> &CompilationUnitScope<'a> {
        &self.scope
    }

    pub fn line_map(&self) -> &LineMap {
        &self.lines
    }

    /// Enclosing named types and type parameters of the open scopes.
    pub fn resolve_context(&self) -> ResolveContext {
        let mut context = ResolveContext::default();
        for &id in &self.stack {
            match &self.tree.node(id).data {
                NodeData::Type {
                    qualified_name,
                    type_params,
                    ..
                } => {
                    if let Some(name) = qualified_name {
                        context.enclosing_types.push(name.clone());
                    }
                    context.type_parameters.extend(type_params.iter().cloned());
                }
                NodeData::Method { type_params, .. } => {
                    context.type_parameters.extend(type_params.iter().cloned());
                }
                _ => {}
            }
        }
        context
    }

    /// Resolves a type reference as seen from the innermost open scope.
    pub fn resolve(&self, tokens: &[LocatableToken]) -> TypeResolution {
        resolve_type(&self.scope, &self.resolve_context(), tokens)
    }

    fn start_of(&self, token: &LocatableToken) -> usize {
        self.lines.position(token.line, token.column)
    }

    fn end_of(&self, token: &LocatableToken) -> usize {
        self.lines.position(token.end_line, token.end_column)
    }

    fn top(&self, event: &'static str) -> StructureResult<NodeId> {
        self.stack
            .last()
            .copied()
            .ok_or(StructureError::ScopeUnderflow { event })
    }

    /// Absolute position of the node on top of the stack.
    fn top_offset(&self) -> usize {
        self.stack.iter().map(|&id| self.tree.node(id).offset).sum()
    }

    fn attach_comments_before(&mut self, position: usize) -> StructureResult<()> {
        let comments = self.comments.take_before(position);
        if comments.is_empty() {
            return Ok(());
        }
        let top = self.top("comment")?;
        let base = self.top_offset();
        for comment in comments {
            let offset = comment
                .start
                .checked_sub(base)
                .ok_or_else(|| StructureError::Containment {
                    kind: NodeKind::Comment.as_str(),
                    offset: comment.start,
                    detail: format!("starts before the enclosing node at {base}"),
                })?;
            self.tree.insert(
                top,
                NodeKind::Comment,
                NodeData::None,
                offset,
                comment.end - comment.start,
            );
        }
        Ok(())
    }

    fn completed_node(&mut self, id: NodeId, position: usize, size: usize) {
        for comment in self.comments.take_within(position, position + size) {
            self.tree.insert(
                id,
                NodeKind::Comment,
                NodeData::None,
                comment.start - position,
                comment.end - comment.start,
            );
        }
    }

    fn open_node(
        &mut self,
        kind: NodeKind,
        data: NodeData,
        position: usize,
        event: &'static str,
    ) -> StructureResult<NodeId> {
        self.attach_comments_before(position)?;
        let parent = self.top(event)?;
        let base = self.top_offset();
        let offset = position
            .checked_sub(base)
            .ok_or_else(|| StructureError::Containment {
                kind: kind.as_str(),
                offset: position,
                detail: format!("starts before its parent at {base}"),
            })?;
        let id = self.tree.insert(parent, kind, data, offset, 0);
        self.stack.push(id);
        trace!(%kind, position, depth = self.stack.len(), "open");
        Ok(id)
    }

    /// A node that begins and ends at once, such as an import.
    fn leaf_node(
        &mut self,
        kind: NodeKind,
        start: usize,
        end: usize,
        event: &'static str,
    ) -> StructureResult<NodeId> {
        self.attach_comments_before(start)?;
        let parent = self.top(event)?;
        let base = self.top_offset();
        let (Some(offset), Some(size)) = (start.checked_sub(base), end.checked_sub(start)) else {
            return Err(StructureError::NegativeSpan {
                kind: kind.as_str(),
                start,
                end,
            });
        };
        let id = self.tree.insert(parent, kind, NodeData::None, offset, size);
        self.completed_node(id, start, size);
        Ok(id)
    }

    /// Pops the top node, which must be of `expected` kind, ending it at the
    /// end of `token` when `included` and at its start otherwise.
    fn end_top_node(
        &mut self,
        expected: NodeKind,
        token: &LocatableToken,
        included: bool,
        event: &'static str,
    ) -> StructureResult<NodeId> {
        // The compilation unit is closed by `finish`, never by an event.
        if self.stack.len() <= 1 {
            return Err(StructureError::ScopeUnderflow { event });
        }
        let start = self.top_offset();
        let id = self.top(event)?;
        let kind = self.tree.node(id).kind;
        if kind != expected {
            return Err(StructureError::UnexpectedEvent {
                event,
                reason: format!("expected an open {expected} node, found {kind}"),
            });
        }
        self.stack.pop();
        let end = if included {
            self.end_of(token)
        } else {
            self.start_of(token)
        };
        let size = end.checked_sub(start).ok_or(StructureError::NegativeSpan {
            kind: kind.as_str(),
            start,
            end,
        })?;
        self.tree.set_size(id, size);
        self.completed_node(id, start, size);
        trace!(%kind, start, end, "close");
        Ok(id)
    }

    fn register_member(&mut self, parent: NodeId, member: NodeId, is_method: bool) {
        if let NodeData::TypeBody { methods, fields } = &mut self.tree.node_mut(parent).data {
            if is_method {
                methods.push(member);
            } else {
                fields.push(member);
            }
        }
    }

    fn require_top(&self, kind: NodeKind, event: &'static str) -> StructureResult<()> {
        match self.top_kind() {
            Some(top) if top == kind => Ok(()),
            top => Err(StructureError::UnexpectedEvent {
                event,
                reason: format!(
                    "expected an open {kind} node, found {}",
                    top.map_or("nothing", NodeKind::as_str)
                ),
            }),
        }
    }

    fn begin(&mut self, construct: Construct, token: &LocatableToken) -> StructureResult<()> {
        let event = construct.name();
        match construct {
            Construct::TypeBody => {
                self.require_top(NodeKind::Type, event)?;
                let data = NodeData::TypeBody {
                    methods: Vec::new(),
                    fields: Vec::new(),
                };
                self.open_node(NodeKind::TypeBody, data, self.end_of(token), event)?;
            }
            Construct::MethodBody => {
                self.require_top(NodeKind::Method, event)?;
                self.open_node(NodeKind::MethodBody, NodeData::None, self.end_of(token), event)?;
            }
            Construct::Loop(_) => {
                self.open_node(NodeKind::Loop, NodeData::None, self.start_of(token), event)?;
            }
            Construct::LoopBody(_) => {
                if !token.is(TokenKind::LBrace) {
                    let position = self.start_of(token);
                    self.open_node(NodeKind::LoopBody, NodeData::None, position, event)?;
                }
            }
            Construct::If => {
                self.open_node(NodeKind::Conditional, NodeData::None, self.start_of(token), event)?;
            }
            Construct::IfBranch => {
                if !token.is(TokenKind::LBrace) {
                    let position = self.start_of(token);
                    self.open_node(NodeKind::ConditionalBranch, NodeData::None, position, event)?;
                }
            }
            Construct::Try => {
                let position = self.start_of(token);
                self.open_node(NodeKind::TryStatement, NodeData::None, position, event)?;
            }
            Construct::TryBlock => {
                self.require_top(NodeKind::TryStatement, event)?;
                self.open_node(NodeKind::TryBlock, NodeData::None, self.end_of(token), event)?;
            }
            Construct::Block => {
                let plain = self
                    .top_kind()
                    .is_some_and(|kind| kind.scope_class() == ScopeClass::Plain);
                if plain {
                    self.open_node(NodeKind::Block, NodeData::None, self.start_of(token), event)?;
                }
                self.open_node(NodeKind::BlockBody, NodeData::None, self.end_of(token), event)?;
            }
            Construct::Expression => {
                if self.options.expressions {
                    let position = self.start_of(token);
                    self.open_node(NodeKind::Expression, NodeData::None, position, event)?;
                }
            }
            Construct::TypeDef
            | Construct::Field
            | Construct::Method
            | Construct::InitBlock
            | Construct::AnonClassBody => {
                return Err(StructureError::UnexpectedEvent {
                    event: "begin",
                    reason: format!("a {event} is opened by its own declaration event"),
                });
            }
        }
        Ok(())
    }

    fn end(
        &mut self,
        construct: Construct,
        token: &LocatableToken,
        included: bool,
    ) -> StructureResult<()> {
        let event = construct.name();
        match construct {
            Construct::TypeDef => {
                self.end_top_node(NodeKind::Type, token, included, event)?;
            }
            Construct::TypeBody => {
                self.end_top_node(NodeKind::TypeBody, token, false, event)?;
            }
            Construct::Field => {
                self.end_top_node(NodeKind::Field, token, included, event)?;
            }
            Construct::Method => {
                self.end_top_node(NodeKind::Method, token, included, event)?;
            }
            Construct::MethodBody => {
                self.end_top_node(NodeKind::MethodBody, token, false, event)?;
            }
            Construct::Loop(_) => {
                self.end_top_node(NodeKind::Loop, token, included, event)?;
            }
            Construct::LoopBody(_) => {
                if self.top_kind() != Some(NodeKind::Loop) {
                    self.end_top_node(NodeKind::LoopBody, token, included, event)?;
                }
            }
            Construct::If => {
                self.end_top_node(NodeKind::Conditional, token, included, event)?;
            }
            Construct::IfBranch => {
                if self.top_kind() != Some(NodeKind::Conditional) {
                    self.end_top_node(NodeKind::ConditionalBranch, token, included, event)?;
                }
            }
            Construct::Try => {
                self.end_top_node(NodeKind::TryStatement, token, included, event)?;
            }
            Construct::TryBlock => {
                self.end_top_node(NodeKind::TryBlock, token, false, event)?;
            }
            Construct::Block | Construct::InitBlock => {
                self.end_top_node(NodeKind::BlockBody, token, false, event)?;
                if self.top_kind() == Some(NodeKind::Block) {
                    self.end_top_node(NodeKind::Block, token, included, event)?;
                }
            }
            Construct::AnonClassBody => {
                self.end_top_node(NodeKind::TypeBody, token, false, event)?;
                self.end_top_node(NodeKind::Type, token, included, event)?;
            }
            Construct::Expression => {
                if self.options.expressions {
                    self.end_top_node(NodeKind::Expression, token, included, event)?;
                }
            }
        }
        Ok(())
    }

    /// Qualified name for a type declared in the current scope.
    fn qualified_type_name(&self, simple: &str) -> String {
        let outer = self.stack.iter().rev().find_map(|&id| match &self.tree.node(id).data {
            NodeData::Type {
                qualified_name: Some(name),
                ..
            } => Some(name.as_str()),
            _ => None,
        });
        match outer {
            Some(outer) => format!("{outer}.{simple}"),
            None => self.scope.qualify(simple),
        }
    }

    fn got_type_def_name(
        &mut self,
        name: &LocatableToken,
        hidden: Option<&LocatableToken>,
    ) -> StructureResult<()> {
        let stmt_begin = self.stmt_begin.take();
        let start = hidden.or(stmt_begin.as_ref()).unwrap_or(name);
        let position = self.start_of(start);
        let qualified = self.qualified_type_name(&name.text);
        self.scope.declare(qualified.clone());
        debug!(name = %qualified, "type declared");
        let data = NodeData::Type {
            name: Some(name.text.clone()),
            qualified_name: Some(qualified),
            type_params: Vec::new(),
        };
        self.open_node(NodeKind::Type, data, position, "type name")?;
        Ok(())
    }

    fn got_type_parameters(&mut self, params: &[TypeParam]) -> StructureResult<()> {
        if self.top_kind() == Some(NodeKind::Type) {
            let top = self.top("type parameters")?;
            if let NodeData::Type { type_params, .. } = &mut self.tree.node_mut(top).data {
                *type_params = params.to_vec();
            }
        } else {
            self.pending_type_params = params.to_vec();
        }
        Ok(())
    }

    fn got_field(&mut self, names: &[LocatableToken]) -> StructureResult<()> {
        let stmt_begin = self.stmt_begin.take();
        let Some(start) = stmt_begin.as_ref().or(names.first()) else {
            return Err(StructureError::UnexpectedEvent {
                event: "field",
                reason: "a field declaration without names".to_string(),
            });
        };
        let position = self.start_of(start);
        let parent = self.top("field")?;
        let data = NodeData::Field {
            names: names.iter().map(|name| name.text.clone()).collect(),
            type_spec: join_tokens(&self.last_type_spec),
        };
        let id = self.open_node(NodeKind::Field, data, position, "field")?;
        self.register_member(parent, id, false);
        Ok(())
    }

    fn got_method(
        &mut self,
        name: &LocatableToken,
        hidden: Option<&LocatableToken>,
        constructor: bool,
    ) -> StructureResult<()> {
        let stmt_begin = self.stmt_begin.take();
        let start = hidden.or(stmt_begin.as_ref()).unwrap_or(name);
        let position = self.start_of(start);
        let parent = self.top("method declaration")?;
        let data = NodeData::Method {
            name: name.text.clone(),
            return_type: None,
            type_params: std::mem::take(&mut self.pending_type_params),
        };
        let id = self.open_node(NodeKind::Method, data, position, "method declaration")?;
        self.register_member(parent, id, true);

        if !constructor {
            // Captured with the method on the stack so its type parameters are visible.
            self.return_types.push(StagedReturn {
                method: id,
                tokens: self.last_type_spec.clone(),
                context: self.resolve_context(),
            });
        }
        Ok(())
    }

    fn begin_init_block(
        &mut self,
        first: &LocatableToken,
        lbrace: &LocatableToken,
    ) -> StructureResult<()> {
        self.stmt_begin = None;
        let event = "initializer block";
        self.open_node(NodeKind::Block, NodeData::None, self.start_of(first), event)?;
        self.open_node(NodeKind::BlockBody, NodeData::None, self.end_of(lbrace), event)?;
        Ok(())
    }

    /// Anonymous classes get an unnamed type node around their body.
    fn begin_anon_class(
        &mut self,
        first: &LocatableToken,
        lbrace: &LocatableToken,
    ) -> StructureResult<()> {
        let event = "anonymous class body";
        let data = NodeData::Type {
            name: None,
            qualified_name: None,
            type_params: Vec::new(),
        };
        self.open_node(NodeKind::Type, data, self.start_of(first), event)?;
        let body = NodeData::TypeBody {
            methods: Vec::new(),
            fields: Vec::new(),
        };
        self.open_node(NodeKind::TypeBody, body, self.end_of(lbrace), event)?;
        Ok(())
    }

    fn got_package_semi(&mut self, semi: &LocatableToken) -> StructureResult<()> {
        let Some(keyword) = self.stmt_begin.take() else {
            return Err(StructureError::UnexpectedEvent {
                event: "package semicolon",
                reason: "no package keyword seen".to_string(),
            });
        };
        let (start, end) = (self.start_of(&keyword), self.end_of(semi));
        self.leaf_node(NodeKind::Package, start, end, "package semicolon")?;
        Ok(())
    }

    fn got_import_semi(&mut self, semi: &LocatableToken) -> StructureResult<()> {
        let stmt_begin = self.stmt_begin.take();
        let start = self.start_of(stmt_begin.as_ref().unwrap_or(semi));
        let end = self.end_of(semi);
        self.leaf_node(NodeKind::Import, start, end, "import semicolon")?;
        Ok(())
    }
}

impl EventSink for EditorParser<'_> {
    fn accept(&mut self, event: &ParseEvent) -> StructureResult<()> {
        match event {
            ParseEvent::Begin { construct, token } => self.begin(*construct, token),
            ParseEvent::End {
                construct,
                token,
                included,
            } => self.end(*construct, token, *included),
            ParseEvent::BeginPackage { keyword } => {
                self.stmt_begin = Some(keyword.clone());
                Ok(())
            }
            ParseEvent::Package { name } => {
                self.scope.set_package(class_name(name));
                Ok(())
            }
            ParseEvent::PackageSemi { semi } => self.got_package_semi(semi),
            ParseEvent::BeginElement { first } => {
                self.stmt_begin = Some(first.clone());
                Ok(())
            }
            ParseEvent::Import {
                name, on_demand, ..
            } => {
                self.scope.add_import(class_name(name), *on_demand);
                Ok(())
            }
            ParseEvent::ImportSemi { semi } => self.got_import_semi(semi),
            ParseEvent::TypeDefName { name, hidden } => {
                self.got_type_def_name(name, hidden.as_ref())
            }
            ParseEvent::TypeParameters { params, .. } => self.got_type_parameters(params),
            ParseEvent::TypeSpec { tokens, .. } => {
                self.last_type_spec = tokens.clone();
                Ok(())
            }
            ParseEvent::Field { names } => self.got_field(names),
            ParseEvent::MethodDeclaration { name, hidden } => {
                self.got_method(name, hidden.as_ref(), false)
            }
            ParseEvent::ConstructorDeclaration { name, hidden } => {
                self.got_method(name, hidden.as_ref(), true)
            }
            ParseEvent::BeginInitBlock { first, lbrace } => self.begin_init_block(first, lbrace),
            ParseEvent::BeginAnonClassBody { first, lbrace } => {
                self.begin_anon_class(first, lbrace)
            }
            ParseEvent::Comment { token } => {
                if self.options.attach_comments {
                    let comment = QueuedComment {
                        start: self.start_of(token),
                        end: self.end_of(token),
                    };
                    self.comments.push(comment);
                }
                Ok(())
            }
            ParseEvent::Error { message } => {
                warn!(%message, "syntax error");
                self.syntax_errors.push(message.clone());
                Ok(())
            }
            ParseEvent::Modifier { .. }
            | ParseEvent::ModifiersConsumed
            | ParseEvent::TypeDef { .. }
            | ParseEvent::TypeDefExtends { .. }
            | ParseEvent::TypeDefImplements { .. }
            | ParseEvent::MethodParameter { .. }
            | ParseEvent::AllMethodParameters => Ok(()),
        }
    }
}
