//! The arena-backed source structure tree.
//!
//! Node offsets are relative to the parent node; absolute positions are the
//! sum of offsets along the path from the root. Children are kept sorted by
//! offset.

use crate::error::StructureError;
use crate::event::TypeParam;
use crate::types::TypeResolution;
use la_arena::{Arena, Idx};
use serde::Serialize;
use std::fmt;
use std::ops::Range;

pub type NodeId = Idx<Node>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    CompilationUnit,
    Package,
    Import,
    Type,
    TypeBody,
    Field,
    Method,
    MethodBody,
    Loop,
    LoopBody,
    Conditional,
    ConditionalBranch,
    TryStatement,
    TryBlock,
    Block,
    BlockBody,
    Expression,
    Comment,
}

/// How a node treats statement blocks opened directly inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeClass {
    Plain,
    /// Loops: a block body attaches directly, without an outer block node.
    Iteration,
    /// Conditionals and try statements, likewise.
    Selection,
}

impl NodeKind {
    /// Inner nodes hold the contents between a pair of delimiters.
    pub fn is_inner(self) -> bool {
        matches!(
            self,
            NodeKind::TypeBody
                | NodeKind::MethodBody
                | NodeKind::LoopBody
                | NodeKind::ConditionalBranch
                | NodeKind::TryBlock
                | NodeKind::BlockBody
        )
    }

    pub fn scope_class(self) -> ScopeClass {
        match self {
            NodeKind::Loop => ScopeClass::Iteration,
            NodeKind::Conditional | NodeKind::TryStatement => ScopeClass::Selection,
            _ => ScopeClass::Plain,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::CompilationUnit => "compilation-unit",
            NodeKind::Package => "package",
            NodeKind::Import => "import",
            NodeKind::Type => "type",
            NodeKind::TypeBody => "type-body",
            NodeKind::Field => "field",
            NodeKind::Method => "method",
            NodeKind::MethodBody => "method-body",
            NodeKind::Loop => "loop",
            NodeKind::LoopBody => "loop-body",
            NodeKind::Conditional => "conditional",
            NodeKind::ConditionalBranch => "conditional-branch",
            NodeKind::TryStatement => "try",
            NodeKind::TryBlock => "try-block",
            NodeKind::Block => "block",
            NodeKind::BlockBody => "block-body",
            NodeKind::Expression => "expression",
            NodeKind::Comment => "comment",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub enum NodeData {
    #[default]
    None,
    Type {
        /// `None` for anonymous classes.
        name: Option<String>,
        qualified_name: Option<String>,
        type_params: Vec<TypeParam>,
    },
    TypeBody {
        methods: Vec<NodeId>,
        fields: Vec<NodeId>,
    },
    Field {
        names: Vec<String>,
        type_spec: String,
    },
    Method {
        name: String,
        /// `None` for constructors.
        return_type: Option<TypeResolution>,
        type_params: Vec<TypeParam>,
    },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub data: NodeData,
    pub parent: Option<NodeId>,
    pub offset: usize,
    pub size: usize,
    pub children: Vec<NodeId>,
}

impl Node {
    /// Short human label: the declared name for types, methods and fields.
    pub fn label(&self) -> Option<String> {
        match &self.data {
            NodeData::Type { name, .. } => {
                Some(name.clone().unwrap_or_else(|| "<anonymous>".to_string()))
            }
            NodeData::Method { name, .. } => Some(name.clone()),
            NodeData::Field { names, .. } => Some(names.join(", ")),
            NodeData::None | NodeData::TypeBody { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceTree {
    nodes: Arena<Node>,
    root: NodeId,
    syntax_errors: Vec<String>,
}

impl SourceTree {
    pub(crate) fn new() -> Self {
        let mut nodes = Arena::new();
        let root = nodes.alloc(Node {
            kind: NodeKind::CompilationUnit,
            data: NodeData::None,
            parent: None,
            offset: 0,
            size: 0,
            children: Vec::new(),
        });
        Self {
            nodes,
            root,
            syntax_errors: Vec::new(),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Number of nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node(self.root).children.is_empty()
    }

    /// Syntax errors reported while the tree was built.
    pub fn syntax_errors(&self) -> &[String] {
        &self.syntax_errors
    }

    pub(crate) fn set_syntax_errors(&mut self, errors: Vec<String>) {
        self.syntax_errors = errors;
    }

    /// Allocates a node under `parent`, keeping the children sorted. Nodes
    /// sharing an offset stay in insertion order.
    pub(crate) fn insert(
        &mut self,
        parent: NodeId,
        kind: NodeKind,
        data: NodeData,
        offset: usize,
        size: usize,
    ) -> NodeId {
        let id = self.nodes.alloc(Node {
            kind,
            data,
            parent: Some(parent),
            offset,
            size,
            children: Vec::new(),
        });
        let nodes = &self.nodes;
        let index = nodes[parent]
            .children
            .partition_point(|&child| nodes[child].offset <= offset);
        self.nodes[parent].children.insert(index, id);
        id
    }

    pub(crate) fn set_size(&mut self, id: NodeId, size: usize) {
        self.nodes[id].size = size;
    }

    pub fn absolute_offset(&self, id: NodeId) -> usize {
        let mut offset = 0;
        let mut current = Some(id);
        while let Some(node) = current {
            offset += self.nodes[node].offset;
            current = self.nodes[node].parent;
        }
        offset
    }

    /// Absolute byte range of a node.
    pub fn span(&self, id: NodeId) -> Range<usize> {
        let start = self.absolute_offset(id);
        start..start + self.nodes[id].size
    }

    /// The innermost node containing `offset`.
    pub fn node_at(&self, offset: usize) -> Option<NodeId> {
        let root = self.node(self.root);
        if offset >= root.size {
            return None;
        }
        let mut current = self.root;
        let mut relative = offset;
        'descend: loop {
            let node = self.node(current);
            let index = node
                .children
                .partition_point(|&child| self.nodes[child].offset <= relative);
            // Zero-sized children may share an offset with the one we want.
            for &child in node.children[..index].iter().rev() {
                let child_node = self.node(child);
                if relative < child_node.offset + child_node.size {
                    relative -= child_node.offset;
                    current = child;
                    continue 'descend;
                }
                if child_node.size > 0 {
                    break;
                }
            }
            return Some(current);
        }
    }

    /// Nodes whose spans intersect `range`, in preorder.
    pub fn nodes_in_range(&self, range: Range<usize>) -> Vec<NodeId> {
        self.walk()
            .filter(|&(id, _)| {
                let span = self.span(id);
                span.start < range.end && range.start < span.end
            })
            .map(|(id, _)| id)
            .collect()
    }

    /// Preorder traversal yielding each node with its depth.
    pub fn walk(&self) -> impl Iterator<Item = (NodeId, usize)> + '_ {
        let mut stack = vec![(self.root, 0)];
        std::iter::from_fn(move || {
            let (id, depth) = stack.pop()?;
            let children = &self.nodes[id].children;
            stack.extend(children.iter().rev().map(|&child| (child, depth + 1)));
            Some((id, depth))
        })
    }

    pub fn find_kind(&self, kind: NodeKind) -> impl Iterator<Item = NodeId> + '_ {
        self.walk()
            .map(|(id, _)| id)
            .filter(move |&id| self.nodes[id].kind == kind)
    }

    /// Checks that every child lies inside its parent and that siblings are
    /// ordered and disjoint.
    pub fn validate(&self) -> Result<(), StructureError> {
        for (id, _) in self.walk() {
            let node = self.node(id);
            let mut previous_end = 0;
            for &child in &node.children {
                let child_node = self.node(child);
                let end = child_node.offset + child_node.size;
                if end > node.size {
                    return Err(StructureError::Containment {
                        kind: child_node.kind.as_str(),
                        offset: self.absolute_offset(child),
                        detail: format!(
                            "ends at {end}, past the end of its {} parent ({})",
                            node.kind, node.size
                        ),
                    });
                }
                if child_node.offset < previous_end {
                    return Err(StructureError::Containment {
                        kind: child_node.kind.as_str(),
                        offset: self.absolute_offset(child),
                        detail: "overlaps its previous sibling".to_string(),
                    });
                }
                previous_end = end;
            }
        }
        Ok(())
    }

    pub fn summary(&self, id: NodeId) -> NodeSummary {
        let node = self.node(id);
        let span = self.span(id);
        NodeSummary {
            kind: node.kind,
            start: span.start,
            end: span.end,
            label: node.label(),
            children: node.children.iter().map(|&child| self.summary(child)).collect(),
        }
    }
}

/// Owned, serializable view of a subtree.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub kind: NodeKind,
    pub start: usize,
    pub end: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSummary>,
}

/// Indented outline, one node per line: `kind [start, end) label`.
impl fmt::Display for SourceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, depth) in self.walk() {
            let node = self.node(id);
            let span = self.span(id);
            write!(
                f,
                "{:indent$}{} [{}, {})",
                "",
                node.kind,
                span.start,
                span.end,
                indent = depth * 2
            )?;
            if let Some(label) = node.label() {
                write!(f, " {label}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (SourceTree, NodeId, NodeId, NodeId) {
        let mut tree = SourceTree::new();
        let root = tree.root();
        tree.set_size(root, 100);
        let ty = tree.insert(root, NodeKind::Type, NodeData::None, 10, 80);
        let body = tree.insert(ty, NodeKind::TypeBody, NodeData::None, 20, 50);
        let comment = tree.insert(root, NodeKind::Comment, NodeData::None, 0, 8);
        (tree, ty, body, comment)
    }

    #[test]
    fn test_children_sorted_on_insert() {
        let (tree, ty, _, comment) = sample();
        assert_eq!(tree.node(tree.root()).children, vec![comment, ty]);
    }

    #[test]
    fn test_absolute_positions() {
        let (tree, _, body, _) = sample();
        assert_eq!(tree.span(body), 30..80);
    }

    #[test]
    fn test_node_at() {
        let (tree, ty, body, comment) = sample();
        assert_eq!(tree.node_at(3), Some(comment));
        assert_eq!(tree.node_at(9), Some(tree.root()));
        assert_eq!(tree.node_at(12), Some(ty));
        assert_eq!(tree.node_at(30), Some(body));
        assert_eq!(tree.node_at(80), Some(ty));
        assert_eq!(tree.node_at(100), None);
    }

    #[test]
    fn test_walk_is_preorder() {
        let (tree, ty, body, comment) = sample();
        let order: Vec<_> = tree.walk().collect();
        assert_eq!(order, vec![(tree.root(), 0), (comment, 1), (ty, 1), (body, 2)]);
        assert_eq!(tree.nodes_in_range(25..35), vec![tree.root(), ty, body]);
    }

    #[test]
    fn test_validate_reports_escaping_child() {
        let (mut tree, ty, _, _) = sample();
        assert!(tree.validate().is_ok());
        tree.insert(ty, NodeKind::Comment, NodeData::None, 75, 10);
        let err = tree.validate().unwrap_err();
        assert!(matches!(err, StructureError::Containment { kind: "comment", .. }));
    }
}
