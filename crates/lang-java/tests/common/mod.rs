#![allow(dead_code)]

use jscope_core::editor::ParseOptions;
use jscope_core::tree::{NodeId, NodeKind, SourceTree};
use jscope_java::{ClassPath, parse_structure};
use std::fs;
use std::path::Path;

/// Parses with the builtin class path and checks the tree invariants.
pub fn structure(text: &str) -> SourceTree {
    structure_with(text, ParseOptions::default())
}

pub fn structure_with(text: &str, options: ParseOptions) -> SourceTree {
    let tree = parse_structure(text, &ClassPath::with_builtins(), options).unwrap();
    if let Err(e) = tree.validate() {
        panic!("invalid tree: {e}\n{tree}");
    }
    assert_eq!(tree.span(tree.root()), 0..text.len());
    tree
}

pub fn nodes_of(tree: &SourceTree, kind: NodeKind) -> Vec<NodeId> {
    tree.find_kind(kind).collect()
}

pub fn labels(tree: &SourceTree, kind: NodeKind) -> Vec<String> {
    tree.find_kind(kind)
        .filter_map(|id| tree.node(id).label())
        .collect()
}

/// The first node of `kind` labelled `label`.
pub fn labelled(tree: &SourceTree, kind: NodeKind, label: &str) -> NodeId {
    tree.find_kind(kind)
        .find(|&id| tree.node(id).label().as_deref() == Some(label))
        .unwrap_or_else(|| panic!("no {kind} labelled {label}\n{tree}"))
}

pub fn child_kinds(tree: &SourceTree, id: NodeId) -> Vec<NodeKind> {
    tree.node(id)
        .children
        .iter()
        .map(|&child| tree.node(child).kind)
        .collect()
}

pub fn parent_kind(tree: &SourceTree, id: NodeId) -> Option<NodeKind> {
    tree.node(id).parent.map(|parent| tree.node(parent).kind)
}

pub fn text_of<'a>(text: &'a str, tree: &SourceTree, id: NodeId) -> &'a str {
    &text[tree.span(id)]
}

pub fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}
