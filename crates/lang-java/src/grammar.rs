//! Java grammar driven by tree-sitter-java.
//!
//! The concrete syntax tree is walked in document order and translated into
//! [`ParseEvent`]s. Comments and syntax errors are collected up front and
//! released just before the first event anchored after them.

use jscope_core::error::{JscopeError, Result};
use jscope_core::event::{
    Construct, EventSink, Grammar, LoopKind, ParseEvent, TypeDefKind, TypeParam,
};
use jscope_core::token::{LocatableToken, TokenKind};
use std::collections::VecDeque;
use tracing::debug;
use tree_sitter::{Language, Node, Parser};

#[derive(Clone)]
pub struct JavaGrammar {
    language: Language,
}

impl JavaGrammar {
    pub fn new() -> Self {
        Self {
            language: tree_sitter_java::LANGUAGE.into(),
        }
    }
}

impl Default for JavaGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl Grammar for JavaGrammar {
    fn parse(&self, text: &str, sink: &mut dyn EventSink) -> Result<()> {
        let mut parser = Parser::new();
        parser
            .set_language(&self.language)
            .map_err(|e| JscopeError::Parsing(e.to_string()))?;
        let tree = parser
            .parse(text, None)
            .ok_or_else(|| JscopeError::Parsing("tree-sitter produced no tree".to_string()))?;
        let root = tree.root_node();

        let mut walker = Walker::new(text, sink, root);
        debug!(
            comments = walker.comments.len(),
            syntax_errors = walker.pending.len() - walker.comments.len(),
            "java source parsed"
        );
        walker.program(root)?;
        walker.finish()
    }
}

struct CommentSpan {
    start: usize,
    end: usize,
    token: LocatableToken,
}

struct Walker<'t, 's> {
    text: &'t str,
    sink: &'s mut dyn EventSink,
    /// Sorted by start offset.
    comments: Vec<CommentSpan>,
    /// Comments and errors not yet released, in source order.
    pending: VecDeque<((u32, u32), ParseEvent)>,
}

impl<'t, 's> Walker<'t, 's> {
    fn new(text: &'t str, sink: &'s mut dyn EventSink, root: Node<'_>) -> Self {
        let mut walker = Self {
            text,
            sink,
            comments: Vec::new(),
            pending: VecDeque::new(),
        };
        walker.collect_out_of_band(root);
        walker
    }

    fn collect_out_of_band(&mut self, root: Node<'_>) {
        let mut pending = Vec::new();
        let mut stack = vec![(root, false)];
        while let Some((node, in_error)) = stack.pop() {
            if is_comment(node) {
                let token = self.token(node);
                pending.push((token.start(), ParseEvent::Comment { token: token.clone() }));
                self.comments.push(CommentSpan {
                    start: node.start_byte(),
                    end: node.end_byte(),
                    token,
                });
                continue;
            }
            // Only the outermost error of a region is reported.
            if !in_error && (node.is_error() || node.is_missing()) {
                let position = self.token(node).start();
                let message = self.error_message(node);
                pending.push((position, ParseEvent::Error { message }));
            }
            let in_error = in_error || node.is_error();
            stack.extend(children(node).into_iter().rev().map(|child| (child, in_error)));
        }
        pending.sort_by_key(|(position, _)| *position);
        self.pending = pending.into();
        self.comments.sort_by_key(|comment| comment.start);
    }

    fn error_message(&self, node: Node<'_>) -> String {
        let start = node.start_position();
        let (line, column) = (start.row + 1, start.column + 1);
        if node.is_missing() {
            return format!("syntax error at {line}:{column}: missing `{}`", node.kind());
        }
        let snippet: String = self
            .node_text(node)
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .chars()
            .take(24)
            .collect();
        if snippet.is_empty() {
            format!("syntax error at {line}:{column}")
        } else {
            format!("syntax error at {line}:{column}: unexpected `{snippet}`")
        }
    }

    fn node_text(&self, node: Node<'_>) -> &'t str {
        self.text.get(node.byte_range()).unwrap_or("")
    }

    fn token(&self, node: Node<'_>) -> LocatableToken {
        let start = node.start_position();
        LocatableToken::new(
            self.node_text(node),
            start.row as u32 + 1,
            start.column as u32 + 1,
        )
    }

    /// The leaf tokens of a type, annotations and comments left out.
    fn type_tokens(&self, node: Node<'_>) -> Vec<LocatableToken> {
        let mut tokens = Vec::new();
        self.collect_leaves(node, &mut tokens);
        tokens
    }

    fn collect_leaves(&self, node: Node<'_>, out: &mut Vec<LocatableToken>) {
        if is_comment(node) || is_annotation(node) {
            return;
        }
        if node.child_count() == 0 {
            out.push(self.token(node));
            return;
        }
        for child in children(node) {
            self.collect_leaves(child, out);
        }
    }

    fn first_token(&self, node: Node<'_>) -> LocatableToken {
        self.token(first_leaf(node).unwrap_or(node))
    }

    fn last_token(&self, node: Node<'_>) -> LocatableToken {
        self.token(last_leaf(node).unwrap_or(node))
    }

    fn braces(&self, block: Node<'_>) -> (LocatableToken, LocatableToken) {
        let kids = children(block);
        let open = kids.iter().find(|n| n.kind() == "{").copied();
        let close = kids.iter().rev().find(|n| n.kind() == "}").copied();
        (
            open.map_or_else(|| self.first_token(block), |n| self.token(n)),
            close.map_or_else(|| self.last_token(block), |n| self.token(n)),
        )
    }

    /// A block comment separated from `node` by nothing but whitespace.
    fn hidden_comment(&self, node: Node<'_>) -> Option<LocatableToken> {
        let start = node.start_byte();
        let index = self.comments.partition_point(|comment| comment.start < start);
        let comment = self.comments[..index].last()?;
        let gap = self.text.get(comment.end..start)?;
        (comment.token.is(TokenKind::BlockComment) && gap.trim().is_empty())
            .then(|| comment.token.clone())
    }

    fn emit(&mut self, event: ParseEvent) -> Result<()> {
        // Block openers are anchored at their brace: anything before it
        // belongs to the enclosing node.
        let anchor = match &event {
            ParseEvent::BeginInitBlock { lbrace, .. }
            | ParseEvent::BeginAnonClassBody { lbrace, .. } => Some(lbrace.start()),
            other => other.position(),
        };
        if let Some(anchor) = anchor {
            while self.pending.front().is_some_and(|(at, _)| *at < anchor) {
                if let Some((_, released)) = self.pending.pop_front() {
                    self.sink.accept(&released)?;
                }
            }
        }
        self.sink.accept(&event)?;
        Ok(())
    }

    fn begin(&mut self, construct: Construct, token: LocatableToken) -> Result<()> {
        self.emit(ParseEvent::Begin { construct, token })
    }

    fn end(&mut self, construct: Construct, token: LocatableToken, included: bool) -> Result<()> {
        self.emit(ParseEvent::End {
            construct,
            token,
            included,
        })
    }

    fn finish(mut self) -> Result<()> {
        while let Some((_, event)) = self.pending.pop_front() {
            self.sink.accept(&event)?;
        }
        Ok(())
    }

    fn program(&mut self, root: Node<'_>) -> Result<()> {
        for child in children(root) {
            match child.kind() {
                "package_declaration" => self.package(child)?,
                "import_declaration" => self.import(child)?,
                kind if type_def_kind(kind).is_some() => self.type_declaration(child)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn package(&mut self, node: Node<'_>) -> Result<()> {
        let kids = children(node);
        let Some(keyword) = kids.iter().find(|n| n.kind() == "package") else {
            return Ok(());
        };
        self.emit(ParseEvent::BeginPackage {
            keyword: self.token(*keyword),
        })?;
        if let Some(name) = kids.iter().find(|n| is_name(**n)) {
            self.emit(ParseEvent::Package {
                name: self.type_tokens(*name),
            })?;
        }
        if let Some(semi) = kids.iter().find(|n| n.kind() == ";") {
            self.emit(ParseEvent::PackageSemi {
                semi: self.token(*semi),
            })?;
        }
        Ok(())
    }

    fn import(&mut self, node: Node<'_>) -> Result<()> {
        let kids = children(node);
        let Some(keyword) = kids.iter().find(|n| n.kind() == "import") else {
            return Ok(());
        };
        self.emit(ParseEvent::BeginElement {
            first: self.token(*keyword),
        })?;
        if let Some(name) = kids.iter().find(|n| is_name(**n)) {
            self.emit(ParseEvent::Import {
                name: self.type_tokens(*name),
                is_static: kids.iter().any(|n| n.kind() == "static"),
                on_demand: kids.iter().any(|n| n.kind() == "asterisk"),
            })?;
        }
        if let Some(semi) = kids.iter().find(|n| n.kind() == ";") {
            self.emit(ParseEvent::ImportSemi {
                semi: self.token(*semi),
            })?;
        }
        Ok(())
    }

    fn modifiers(&mut self, node: Node<'_>) -> Result<()> {
        let Some(modifiers) = child_of_kind(node, "modifiers") else {
            return Ok(());
        };
        for child in children(modifiers) {
            if !is_comment(child) && !is_annotation(child) {
                self.emit(ParseEvent::Modifier {
                    token: self.token(child),
                })?;
            }
        }
        Ok(())
    }

    fn type_declaration(&mut self, node: Node<'_>) -> Result<()> {
        let Some(kind) = type_def_kind(node.kind()) else {
            return Ok(());
        };
        let Some(name) = node.child_by_field_name("name") else {
            return Ok(());
        };
        let hidden = self.hidden_comment(node);
        self.emit(ParseEvent::BeginElement {
            first: self.first_token(node),
        })?;
        self.modifiers(node)?;
        self.emit(ParseEvent::TypeDef { kind })?;
        self.emit(ParseEvent::ModifiersConsumed)?;
        self.emit(ParseEvent::TypeDefName {
            name: self.token(name),
            hidden,
        })?;
        if let Some(params) = child_of_kind(node, "type_parameters") {
            self.type_parameters(params)?;
        }
        for child in children(node) {
            match child.kind() {
                "superclass" => self.superclass(child)?,
                "super_interfaces" => self.interface_list(child, false)?,
                "extends_interfaces" => self.interface_list(child, true)?,
                _ => {}
            }
        }

        let Some(body) = node.child_by_field_name("body") else {
            return self.end(Construct::TypeDef, self.last_token(node), true);
        };
        let (lbrace, rbrace) = self.braces(body);
        self.begin(Construct::TypeBody, lbrace)?;
        // record components
        let header = node.child_by_field_name("parameters");
        self.type_body(body, header)?;
        self.end(Construct::TypeBody, rbrace.clone(), false)?;
        self.end(Construct::TypeDef, rbrace, true)
    }

    fn type_parameters(&mut self, node: Node<'_>) -> Result<()> {
        let mut params = Vec::new();
        for param in children(node).into_iter().filter(|n| n.kind() == "type_parameter") {
            let Some(name) = children(param)
                .into_iter()
                .find(|n| matches!(n.kind(), "type_identifier" | "identifier"))
            else {
                continue;
            };
            let mut type_param = TypeParam::new(self.token(name));
            // Only the first bound determines the erasure.
            if let Some(first) = child_of_kind(param, "type_bound")
                .and_then(|bound| named_children(bound).into_iter().next())
            {
                type_param.bound = self.type_tokens(first);
            }
            params.push(type_param);
        }
        let close = children(node)
            .into_iter()
            .rev()
            .find(|n| n.kind() == ">")
            .map_or_else(|| self.last_token(node), |n| self.token(n));
        self.emit(ParseEvent::TypeParameters { params, close })
    }

    fn superclass(&mut self, node: Node<'_>) -> Result<()> {
        let Some(keyword) = child_of_kind(node, "extends") else {
            return Ok(());
        };
        let tokens = named_children(node)
            .into_iter()
            .next()
            .map(|ty| self.type_tokens(ty))
            .unwrap_or_default();
        self.emit(ParseEvent::TypeDefExtends {
            keyword: self.token(keyword),
            lookahead: tokens.first().cloned(),
        })?;
        if !tokens.is_empty() {
            self.emit(ParseEvent::TypeSpec {
                tokens,
                lookahead: None,
            })?;
        }
        Ok(())
    }

    /// `implements` of a class, or `extends` of an interface.
    fn interface_list(&mut self, node: Node<'_>, extends: bool) -> Result<()> {
        let Some(keyword) = children(node).into_iter().find(|n| !is_comment(*n)) else {
            return Ok(());
        };
        let types = child_of_kind(node, "type_list")
            .map(named_children)
            .unwrap_or_default();
        let keyword = self.token(keyword);
        if extends {
            let lookahead = types.first().map(|ty| self.first_token(*ty));
            self.emit(ParseEvent::TypeDefExtends { keyword, lookahead })?;
        } else {
            self.emit(ParseEvent::TypeDefImplements { keyword })?;
        }
        for ty in types {
            let lookahead = next_sibling(ty).map(|next| self.token(next));
            self.emit(ParseEvent::TypeSpec {
                tokens: self.type_tokens(ty),
                lookahead,
            })?;
        }
        Ok(())
    }

    /// Members of a class body. A compact constructor takes its parameters
    /// from the record `header`.
    fn type_body(&mut self, body: Node<'_>, header: Option<Node<'_>>) -> Result<()> {
        for member in children(body) {
            match member.kind() {
                "field_declaration" | "constant_declaration" => self.field(member)?,
                "method_declaration" | "annotation_type_element_declaration" => {
                    self.method(member, false, None)?
                }
                "constructor_declaration" => self.method(member, true, None)?,
                "compact_constructor_declaration" => self.method(member, true, header)?,
                "block" => self.initializer(member, member)?,
                "static_initializer" => {
                    if let Some(block) = child_of_kind(member, "block") {
                        self.initializer(member, block)?;
                    }
                }
                "enum_constant" => self.enum_constant(member)?,
                "enum_body_declarations" => self.type_body(member, None)?,
                kind if type_def_kind(kind).is_some() => self.type_declaration(member)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn field(&mut self, node: Node<'_>) -> Result<()> {
        let declarators = field_children(node, "declarator");
        let names: Vec<_> = declarators
            .iter()
            .filter_map(|d| d.child_by_field_name("name"))
            .map(|name| self.token(name))
            .collect();
        if names.is_empty() {
            return Ok(());
        }
        self.emit(ParseEvent::BeginElement {
            first: self.first_token(node),
        })?;
        self.modifiers(node)?;
        self.emit(ParseEvent::ModifiersConsumed)?;
        if let Some(ty) = node.child_by_field_name("type") {
            self.type_spec(ty)?;
        }
        self.emit(ParseEvent::Field { names })?;
        for declarator in declarators {
            if let Some(value) = declarator.child_by_field_name("value") {
                self.expression(value)?;
            }
        }
        self.end(Construct::Field, self.last_token(node), true)
    }

    fn method(
        &mut self,
        node: Node<'_>,
        constructor: bool,
        header: Option<Node<'_>>,
    ) -> Result<()> {
        let Some(name) = node.child_by_field_name("name") else {
            return Ok(());
        };
        let hidden = self.hidden_comment(node);
        self.emit(ParseEvent::BeginElement {
            first: self.first_token(node),
        })?;
        self.modifiers(node)?;
        self.emit(ParseEvent::ModifiersConsumed)?;
        if let Some(params) = child_of_kind(node, "type_parameters") {
            self.type_parameters(params)?;
        }

        let name = self.token(name);
        if constructor {
            self.emit(ParseEvent::ConstructorDeclaration { name, hidden })?;
        } else {
            let mut tokens = node
                .child_by_field_name("type")
                .map(|ty| self.type_tokens(ty))
                .unwrap_or_default();
            // `int f()[]` returns an array
            if let Some(dims) = node.child_by_field_name("dimensions") {
                tokens.extend(self.type_tokens(dims));
            }
            self.emit(ParseEvent::TypeSpec {
                tokens,
                lookahead: None,
            })?;
            self.emit(ParseEvent::MethodDeclaration { name, hidden })?;
        }
        if let Some(params) = node.child_by_field_name("parameters").or(header) {
            self.parameters(params)?;
        }
        self.emit(ParseEvent::AllMethodParameters)?;
        if let Some(throws) = child_of_kind(node, "throws") {
            for ty in named_children(throws) {
                self.type_spec(ty)?;
            }
        }

        match node.child_by_field_name("body") {
            Some(body) => {
                let (lbrace, rbrace) = self.braces(body);
                self.begin(Construct::MethodBody, lbrace)?;
                self.statements(body)?;
                self.end(Construct::MethodBody, rbrace.clone(), false)?;
                self.end(Construct::Method, rbrace, true)
            }
            None => self.end(Construct::Method, self.last_token(node), true),
        }
    }

    fn parameters(&mut self, node: Node<'_>) -> Result<()> {
        for param in children(node) {
            match param.kind() {
                "formal_parameter" => {
                    let Some(name) = param.child_by_field_name("name") else {
                        continue;
                    };
                    let mut tokens = param
                        .child_by_field_name("type")
                        .map(|ty| self.type_tokens(ty))
                        .unwrap_or_default();
                    if let Some(dims) = param.child_by_field_name("dimensions") {
                        tokens.extend(self.type_tokens(dims));
                    }
                    self.emit(ParseEvent::TypeSpec {
                        tokens,
                        lookahead: None,
                    })?;
                    self.emit(ParseEvent::MethodParameter {
                        name: self.token(name),
                    })?;
                }
                "spread_parameter" => self.spread_parameter(param)?,
                _ => {}
            }
        }
        Ok(())
    }

    /// `T... name` is declared as `T[] name`.
    fn spread_parameter(&mut self, param: Node<'_>) -> Result<()> {
        let kids = children(param);
        let Some(ellipsis) = kids.iter().find(|n| n.kind() == "...") else {
            return Ok(());
        };
        let Some(name) = child_of_kind(param, "variable_declarator")
            .and_then(|declarator| declarator.child_by_field_name("name"))
        else {
            return Ok(());
        };
        let mut tokens = kids
            .iter()
            .find(|n| n.is_named() && !is_comment(**n) && n.kind() != "modifiers")
            .map(|ty| self.type_tokens(*ty))
            .unwrap_or_default();
        let ellipsis = self.token(*ellipsis);
        tokens.push(LocatableToken::new("[", ellipsis.line, ellipsis.column));
        tokens.push(LocatableToken::new("]", ellipsis.line, ellipsis.column + 1));
        self.emit(ParseEvent::TypeSpec {
            tokens,
            lookahead: None,
        })?;
        self.emit(ParseEvent::MethodParameter {
            name: self.token(name),
        })
    }

    fn initializer(&mut self, first: Node<'_>, block: Node<'_>) -> Result<()> {
        let (lbrace, rbrace) = self.braces(block);
        self.emit(ParseEvent::BeginInitBlock {
            first: self.first_token(first),
            lbrace,
        })?;
        self.statements(block)?;
        self.end(Construct::InitBlock, rbrace, true)
    }

    fn enum_constant(&mut self, node: Node<'_>) -> Result<()> {
        match node.child_by_field_name("body") {
            // The arguments of a constant with a body fall inside its
            // anonymous type, so they get no node of their own.
            Some(body) => {
                let first = node
                    .child_by_field_name("name")
                    .map_or_else(|| self.first_token(node), |name| self.token(name));
                self.anonymous_body(first, body)
            }
            None => match node.child_by_field_name("arguments") {
                Some(arguments) => self.expression(arguments),
                None => Ok(()),
            },
        }
    }

    fn anonymous_body(&mut self, first: LocatableToken, body: Node<'_>) -> Result<()> {
        let (lbrace, rbrace) = self.braces(body);
        self.emit(ParseEvent::BeginAnonClassBody { first, lbrace })?;
        self.type_body(body, None)?;
        self.end(Construct::AnonClassBody, rbrace, true)
    }

    fn type_spec(&mut self, ty: Node<'_>) -> Result<()> {
        let tokens = self.type_tokens(ty);
        if tokens.is_empty() {
            return Ok(());
        }
        self.emit(ParseEvent::TypeSpec {
            tokens,
            lookahead: None,
        })
    }

    fn statements(&mut self, block: Node<'_>) -> Result<()> {
        for child in children(block) {
            self.statement(child)?;
        }
        Ok(())
    }

    fn statement(&mut self, node: Node<'_>) -> Result<()> {
        match node.kind() {
            "block" => self.block(node),
            "expression_statement" => match named_children(node).into_iter().next() {
                Some(expression) => self.expression(expression),
                None => Ok(()),
            },
            "explicit_constructor_invocation" => self.expression(node),
            "local_variable_declaration" => self.local_variable(node),
            "if_statement" => self.if_statement(node),
            "while_statement" => {
                self.begin(Construct::Loop(LoopKind::While), self.first_token(node))?;
                if let Some(condition) = node.child_by_field_name("condition") {
                    self.expression(unparenthesized(condition))?;
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.loop_body(LoopKind::While, body)?;
                }
                self.end(Construct::Loop(LoopKind::While), self.last_token(node), true)
            }
            "do_statement" => {
                self.begin(Construct::Loop(LoopKind::DoWhile), self.first_token(node))?;
                if let Some(body) = node.child_by_field_name("body") {
                    self.loop_body(LoopKind::DoWhile, body)?;
                }
                if let Some(condition) = node.child_by_field_name("condition") {
                    self.expression(unparenthesized(condition))?;
                }
                self.end(Construct::Loop(LoopKind::DoWhile), self.last_token(node), true)
            }
            "for_statement" => self.for_statement(node),
            "enhanced_for_statement" => {
                self.begin(Construct::Loop(LoopKind::For), self.first_token(node))?;
                if let Some(ty) = node.child_by_field_name("type") {
                    self.local_type_spec(ty)?;
                }
                if let Some(value) = node.child_by_field_name("value") {
                    self.expression(value)?;
                }
                if let Some(body) = node.child_by_field_name("body") {
                    self.loop_body(LoopKind::For, body)?;
                }
                self.end(Construct::Loop(LoopKind::For), self.last_token(node), true)
            }
            "try_statement" | "try_with_resources_statement" => self.try_statement(node),
            "switch_expression" | "switch_statement" => {
                if let Some(condition) = node.child_by_field_name("condition") {
                    self.expression(unparenthesized(condition))?;
                }
                match node.child_by_field_name("body") {
                    Some(body) => self.switch_block(body),
                    None => Ok(()),
                }
            }
            "synchronized_statement" => {
                for child in named_children(node) {
                    match child.kind() {
                        "block" => self.block(child)?,
                        _ => self.expression(unparenthesized(child))?,
                    }
                }
                Ok(())
            }
            "labeled_statement" => match named_children(node).into_iter().last() {
                Some(statement) if statement.kind() != "identifier" => self.statement(statement),
                _ => Ok(()),
            },
            "return_statement" | "throw_statement" | "yield_statement" | "assert_statement" => {
                for value in named_children(node) {
                    self.expression(value)?;
                }
                Ok(())
            }
            kind if type_def_kind(kind).is_some() => self.type_declaration(node),
            _ => Ok(()),
        }
    }

    fn block(&mut self, node: Node<'_>) -> Result<()> {
        let (lbrace, rbrace) = self.braces(node);
        self.begin(Construct::Block, lbrace)?;
        self.statements(node)?;
        self.end(Construct::Block, rbrace, true)
    }

    fn local_variable(&mut self, node: Node<'_>) -> Result<()> {
        if let Some(ty) = node.child_by_field_name("type") {
            self.local_type_spec(ty)?;
        }
        for declarator in field_children(node, "declarator") {
            if let Some(value) = declarator.child_by_field_name("value") {
                self.expression(value)?;
            }
        }
        Ok(())
    }

    /// Local variable types, skipping inferred `var`.
    fn local_type_spec(&mut self, ty: Node<'_>) -> Result<()> {
        if self.node_text(ty) == "var" {
            return Ok(());
        }
        self.type_spec(ty)
    }

    fn if_statement(&mut self, node: Node<'_>) -> Result<()> {
        self.begin(Construct::If, self.first_token(node))?;
        if let Some(condition) = node.child_by_field_name("condition") {
            self.expression(unparenthesized(condition))?;
        }
        for field in ["consequence", "alternative"] {
            if let Some(branch) = node.child_by_field_name(field) {
                self.begin(Construct::IfBranch, self.first_token(branch))?;
                self.statement(branch)?;
                self.end(Construct::IfBranch, self.last_token(branch), true)?;
            }
        }
        self.end(Construct::If, self.last_token(node), true)
    }

    fn loop_body(&mut self, kind: LoopKind, body: Node<'_>) -> Result<()> {
        self.begin(Construct::LoopBody(kind), self.first_token(body))?;
        self.statement(body)?;
        self.end(Construct::LoopBody(kind), self.last_token(body), true)
    }

    fn for_statement(&mut self, node: Node<'_>) -> Result<()> {
        self.begin(Construct::Loop(LoopKind::For), self.first_token(node))?;
        for init in field_children(node, "init") {
            if init.kind() == "local_variable_declaration" {
                self.local_variable(init)?;
            } else {
                self.expression(init)?;
            }
        }
        if let Some(condition) = node.child_by_field_name("condition") {
            self.expression(condition)?;
        }
        for update in field_children(node, "update") {
            self.expression(update)?;
        }
        if let Some(body) = node.child_by_field_name("body") {
            self.loop_body(LoopKind::For, body)?;
        }
        self.end(Construct::Loop(LoopKind::For), self.last_token(node), true)
    }

    fn try_statement(&mut self, node: Node<'_>) -> Result<()> {
        self.begin(Construct::Try, self.first_token(node))?;
        if let Some(resources) = node.child_by_field_name("resources") {
            for resource in children(resources).into_iter().filter(|n| n.kind() == "resource") {
                match resource.child_by_field_name("value") {
                    Some(value) => {
                        if let Some(ty) = resource.child_by_field_name("type") {
                            self.local_type_spec(ty)?;
                        }
                        self.expression(value)?;
                    }
                    None => self.expression(resource)?,
                }
            }
        }
        if let Some(body) = node.child_by_field_name("body") {
            let (lbrace, rbrace) = self.braces(body);
            self.begin(Construct::TryBlock, lbrace)?;
            self.statements(body)?;
            self.end(Construct::TryBlock, rbrace, false)?;
        }
        for clause in children(node) {
            match clause.kind() {
                "catch_clause" => {
                    let catch_types = child_of_kind(clause, "catch_formal_parameter")
                        .and_then(|param| child_of_kind(param, "catch_type"));
                    if let Some(catch_types) = catch_types {
                        for ty in named_children(catch_types) {
                            self.type_spec(ty)?;
                        }
                    }
                    if let Some(body) = clause.child_by_field_name("body") {
                        self.block(body)?;
                    }
                }
                "finally_clause" => {
                    if let Some(body) = child_of_kind(clause, "block") {
                        self.block(body)?;
                    }
                }
                _ => {}
            }
        }
        self.end(Construct::Try, self.last_token(node), true)
    }

    /// Switch blocks are structured as statement blocks.
    fn switch_block(&mut self, body: Node<'_>) -> Result<()> {
        let (lbrace, rbrace) = self.braces(body);
        self.begin(Construct::Block, lbrace)?;
        for entry in children(body) {
            match entry.kind() {
                "switch_block_statement_group" | "switch_rule" => {
                    for statement in named_children(entry) {
                        if statement.kind() != "switch_label" {
                            self.statement(statement)?;
                        }
                    }
                }
                _ => {}
            }
        }
        self.end(Construct::Block, rbrace, true)
    }

    fn expression(&mut self, node: Node<'_>) -> Result<()> {
        let (Some(first), Some(last)) = (first_leaf(node), last_leaf(node)) else {
            return Ok(());
        };
        self.begin(Construct::Expression, self.token(first))?;
        self.nested_node(node)?;
        self.end(Construct::Expression, self.token(last), true)
    }

    /// Walks an expression for constructs that get nodes of their own.
    fn nested(&mut self, node: Node<'_>) -> Result<()> {
        for child in children(node) {
            self.nested_node(child)?;
        }
        Ok(())
    }

    fn nested_node(&mut self, node: Node<'_>) -> Result<()> {
        match node.kind() {
            "object_creation_expression" => self.object_creation(node),
            "lambda_expression" => match node.child_by_field_name("body") {
                Some(body) if body.kind() == "block" => self.block(body),
                Some(body) => self.nested_node(body),
                None => Ok(()),
            },
            "switch_expression" => {
                if let Some(condition) = node.child_by_field_name("condition") {
                    self.nested_node(condition)?;
                }
                match node.child_by_field_name("body") {
                    Some(body) => self.switch_block(body),
                    None => Ok(()),
                }
            }
            "cast_expression" | "instanceof_expression" | "array_creation_expression" => {
                for child in children(node) {
                    if is_type(child) {
                        self.type_spec(child)?;
                    } else {
                        self.nested_node(child)?;
                    }
                }
                Ok(())
            }
            "class_body" => Ok(()),
            _ => self.nested(node),
        }
    }

    fn object_creation(&mut self, node: Node<'_>) -> Result<()> {
        let ty = node.child_by_field_name("type");
        if let Some(ty) = ty {
            self.type_spec(ty)?;
        }
        match child_of_kind(node, "class_body") {
            // The anonymous type starts at the instantiated type, before the
            // arguments, so nothing inside them can get a node.
            Some(body) => {
                let first = ty.map_or_else(|| self.first_token(node), |ty| self.first_token(ty));
                self.anonymous_body(first, body)
            }
            None => match node.child_by_field_name("arguments") {
                Some(arguments) => self.nested(arguments),
                None => Ok(()),
            },
        }
    }
}

fn children(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    node.children(&mut cursor).collect()
}

fn named_children(node: Node<'_>) -> Vec<Node<'_>> {
    children(node)
        .into_iter()
        .filter(|child| child.is_named() && !is_comment(*child))
        .collect()
}

fn field_children<'t>(node: Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.children_by_field_name(field, &mut cursor).collect()
}

fn child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    children(node).into_iter().find(|child| child.kind() == kind)
}

fn next_sibling(node: Node<'_>) -> Option<Node<'_>> {
    let mut next = node.next_sibling();
    while let Some(sibling) = next {
        if !is_comment(sibling) {
            return Some(sibling);
        }
        next = sibling.next_sibling();
    }
    None
}

fn first_leaf(node: Node<'_>) -> Option<Node<'_>> {
    if is_comment(node) {
        return None;
    }
    if node.child_count() == 0 {
        return Some(node);
    }
    children(node).into_iter().find_map(first_leaf)
}

fn last_leaf(node: Node<'_>) -> Option<Node<'_>> {
    if is_comment(node) {
        return None;
    }
    if node.child_count() == 0 {
        return Some(node);
    }
    children(node).into_iter().rev().find_map(last_leaf)
}

fn unparenthesized(node: Node<'_>) -> Node<'_> {
    if node.kind() == "parenthesized_expression" {
        if let Some(inner) = named_children(node).into_iter().next() {
            return inner;
        }
    }
    node
}

fn is_comment(node: Node<'_>) -> bool {
    matches!(node.kind(), "line_comment" | "block_comment" | "comment")
}

fn is_annotation(node: Node<'_>) -> bool {
    matches!(node.kind(), "annotation" | "marker_annotation")
}

fn is_name(node: Node<'_>) -> bool {
    matches!(node.kind(), "identifier" | "scoped_identifier")
}

fn is_type(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "type_identifier"
            | "scoped_type_identifier"
            | "generic_type"
            | "array_type"
            | "integral_type"
            | "floating_point_type"
            | "boolean_type"
    )
}

fn type_def_kind(kind: &str) -> Option<TypeDefKind> {
    match kind {
        "class_declaration" => Some(TypeDefKind::Class),
        "interface_declaration" => Some(TypeDefKind::Interface),
        "enum_declaration" => Some(TypeDefKind::Enum),
        "record_declaration" => Some(TypeDefKind::Record),
        "annotation_type_declaration" => Some(TypeDefKind::Annotation),
        _ => None,
    }
}
