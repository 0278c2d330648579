#![allow(dead_code)]

use jscope_core::entity::{Entity, EntityResolver, ResolveContext};
use jscope_core::event::{Construct, EventSink, Grammar, ParseEvent};
use jscope_core::token::LocatableToken;
use jscope_core::tree::{NodeId, NodeKind, SourceTree};
use std::collections::BTreeSet;

/// Knows a fixed set of classes; packages are the prefixes of their names.
pub struct MockResolver {
    classes: BTreeSet<String>,
}

impl MockResolver {
    pub fn new(classes: &[&str]) -> Self {
        Self {
            classes: classes.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn jdk() -> Self {
        Self::new(&[
            "java.lang.Object",
            "java.lang.String",
            "java.lang.Integer",
            "java.lang.Number",
            "java.lang.Comparable",
            "java.lang.Runnable",
            "java.lang.Exception",
            "java.util.List",
            "java.util.Map",
            "java.util.Map.Entry",
            "java.util.Set",
            "java.util.Comparator",
            "java.io.Serializable",
        ])
    }

    fn is_package(&self, name: &str) -> bool {
        let prefix = format!("{name}.");
        self.classes.iter().any(|class| class.starts_with(&prefix)) && !self.classes.contains(name)
    }
}

impl EntityResolver for MockResolver {
    fn resolve_package_or_class(&self, name: &str, _context: &ResolveContext) -> Option<Entity> {
        if self.classes.contains(name) {
            Some(Entity::Class(name.to_string()))
        } else if self.is_package(name) {
            Some(Entity::Package(name.to_string()))
        } else {
            None
        }
    }

    fn sub_entity(&self, parent: &Entity, name: &str) -> Option<Entity> {
        let member = parent.member(name);
        if self.classes.contains(&member) {
            Some(Entity::Class(member))
        } else if matches!(parent, Entity::Package(_)) && self.is_package(&member) {
            Some(Entity::Package(member))
        } else {
            None
        }
    }
}

/// Hands out tokens by searching the source text from left to right.
pub struct Source<'a> {
    text: &'a str,
    cursor: usize,
}

impl<'a> Source<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, cursor: 0 }
    }

    /// The next occurrence of `needle` at or after the cursor.
    pub fn tok(&mut self, needle: &str) -> LocatableToken {
        let found = self.text[self.cursor..]
            .find(needle)
            .unwrap_or_else(|| panic!("`{needle}` not found after offset {}", self.cursor));
        let offset = self.cursor + found;
        self.cursor = offset + needle.len();
        token_at(self.text, offset, needle)
    }

    pub fn toks(&mut self, needles: &[&str]) -> Vec<LocatableToken> {
        needles.iter().map(|needle| self.tok(needle)).collect()
    }
}

pub fn token_at(text: &str, offset: usize, needle: &str) -> LocatableToken {
    let before = &text[..offset];
    let line = before.matches('\n').count() as u32 + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    LocatableToken::new(needle, line, (offset - line_start) as u32 + 1)
}

/// Tokens for a type written with whitespace between tokens.
pub fn type_tokens(source: &str) -> Vec<LocatableToken> {
    let mut column = 1;
    source
        .split_whitespace()
        .map(|text| {
            let token = LocatableToken::new(text, 1, column);
            column += text.len() as u32 + 1;
            token
        })
        .collect()
}

/// Replays a scripted event stream.
pub struct Replay(pub Vec<ParseEvent>);

impl Grammar for Replay {
    fn parse(&self, _text: &str, sink: &mut dyn EventSink) -> jscope_core::Result<()> {
        for event in &self.0 {
            sink.accept(event)?;
        }
        Ok(())
    }
}

pub fn begin(construct: Construct, token: &LocatableToken) -> ParseEvent {
    ParseEvent::Begin {
        construct,
        token: token.clone(),
    }
}

pub fn end(construct: Construct, token: &LocatableToken, included: bool) -> ParseEvent {
    ParseEvent::End {
        construct,
        token: token.clone(),
        included,
    }
}

pub fn element(first: &LocatableToken) -> ParseEvent {
    ParseEvent::BeginElement {
        first: first.clone(),
    }
}

pub fn type_spec(tokens: &[LocatableToken]) -> ParseEvent {
    ParseEvent::TypeSpec {
        tokens: tokens.to_vec(),
        lookahead: None,
    }
}

pub fn comment(token: &LocatableToken) -> ParseEvent {
    ParseEvent::Comment {
        token: token.clone(),
    }
}

pub fn child_kinds(tree: &SourceTree, id: NodeId) -> Vec<NodeKind> {
    tree.node(id)
        .children
        .iter()
        .map(|&child| tree.node(child).kind)
        .collect()
}

/// The only child of `id` with the given kind.
pub fn child(tree: &SourceTree, id: NodeId, kind: NodeKind) -> NodeId {
    let matches: Vec<_> = tree
        .node(id)
        .children
        .iter()
        .copied()
        .filter(|&child| tree.node(child).kind == kind)
        .collect();
    assert_eq!(matches.len(), 1, "expected one {kind} child, got {matches:?}");
    matches[0]
}

pub fn text_of<'a>(text: &'a str, tree: &SourceTree, id: NodeId) -> &'a str {
    &text[tree.span(id)]
}
