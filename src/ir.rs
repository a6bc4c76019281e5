// SPDX-License-Identifier: Apache-2.0
// Copyright (C) 2025 Michael Dippery <michael@monkey-robot.com>

//! Intermediate representation of a document.
//!
//! HTML input is transformed into a tree of [`NodeKind`]s roughly
//! representing the important Markdown elements, rewritten in place by the
//! [transform passes](crate::transform), and finally rendered to text by a
//! [`BlockRendering`](crate::render::BlockRendering).
//!
//! Nodes live in an arena owned by a [`Tree`] and are addressed by
//! [`NodeId`]. Each node owns its children through its child list; the
//! parent link is only a back-reference used to answer questions such as
//! "am I inside a preformatted block?". All mutation goes through the
//! child-list methods on [`Tree`] so the two never disagree.

mod render;

use std::fmt;
use thiserror::Error;

/// Errors raised when the tree is used in a way that violates its invariants.
///
/// These all indicate a bug in the caller rather than bad input.
#[derive(Debug, Error, PartialEq)]
pub enum Error {
    /// Tried to splice the root node into its (non-existent) parent.
    #[error("can't replace root node")]
    CannotReplaceRoot,

    /// Tried to give a separator node a child.
    #[error("separator nodes can't have children")]
    ChildOfSeparator,

    /// A transient node kind survived until rendering.
    #[error("{0} node should have been transformed away")]
    Unrenderable(NodeName),

    /// Tried to extract a heading level from something that is not a
    /// heading tag.
    #[error("not a heading: {0}")]
    NotAHeading(String),
}

/// Handle to a node stored in a [`Tree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// A heading level, from 1 to 6 inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeadingLevel(u8);

impl HeadingLevel {
    /// The numeric heading level.
    pub fn get(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for HeadingLevel {
    type Error = Error;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        if (1..=6).contains(&level) {
            Ok(Self(level))
        } else {
            Err(Error::NotAHeading(format!("level {level}")))
        }
    }
}

/// The closed set of node kinds, without any per-kind data.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeName {
    Document,
    Heading,
    A,
    Bold,
    Italic,
    ListItem,
    OrderedList,
    NumberedListItem,
    Code,
    Preformatted,
    Paragraph,
    Blockquote,
    Br,
    Separator,
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A node kind together with the data specific to that kind.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Document,
    Heading(HeadingLevel),
    A { href: String },
    Bold,
    Italic,
    ListItem,
    /// Transient: replaced by numbered list items before rendering.
    OrderedList,
    NumberedListItem(u32),
    Code,
    Preformatted,
    Paragraph,
    Blockquote { accepts_trailers: bool },
    /// Transient: merged into separators or dropped before rendering.
    Br,
    Separator,
}

impl NodeKind {
    /// The kind's tag, stripped of its data.
    pub fn name(&self) -> NodeName {
        match self {
            NodeKind::Document => NodeName::Document,
            NodeKind::Heading(_) => NodeName::Heading,
            NodeKind::A { .. } => NodeName::A,
            NodeKind::Bold => NodeName::Bold,
            NodeKind::Italic => NodeName::Italic,
            NodeKind::ListItem => NodeName::ListItem,
            NodeKind::OrderedList => NodeName::OrderedList,
            NodeKind::NumberedListItem(_) => NodeName::NumberedListItem,
            NodeKind::Code => NodeName::Code,
            NodeKind::Preformatted => NodeName::Preformatted,
            NodeKind::Paragraph => NodeName::Paragraph,
            NodeKind::Blockquote { .. } => NodeName::Blockquote,
            NodeKind::Br => NodeName::Br,
            NodeKind::Separator => NodeName::Separator,
        }
    }
}

/// An entry in a node's child list: either another node or a run of text.
#[derive(Clone, Debug, PartialEq)]
pub enum Child {
    Node(NodeId),
    Text(String),
}

impl Child {
    /// The node this child refers to, if it is not text.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Child::Node(id) => Some(*id),
            Child::Text(_) => None,
        }
    }

    /// The child's text, if it is a text leaf.
    pub fn text(&self) -> Option<&str> {
        match self {
            Child::Node(_) => None,
            Child::Text(text) => Some(text),
        }
    }
}

impl From<NodeId> for Child {
    fn from(id: NodeId) -> Self {
        Child::Node(id)
    }
}

impl From<&str> for Child {
    fn from(text: &str) -> Self {
        Child::Text(String::from(text))
    }
}

impl From<String> for Child {
    fn from(text: String) -> Self {
        Child::Text(text)
    }
}

#[derive(Debug)]
struct Node {
    kind: NodeKind,
    children: Vec<Child>,
    parent: Option<NodeId>,
}

/// An arena of IR nodes rooted at a [`NodeKind::Document`].
///
/// Nodes removed from the tree stay in the arena, detached, until the tree
/// is dropped.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Creates a tree holding only an empty document node.
    pub fn new() -> Self {
        let root = Node {
            kind: NodeKind::Document,
            children: vec![],
            parent: None,
        };
        Self { nodes: vec![root] }
    }

    /// The document node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Creates a new, detached node of the given kind.
    pub fn add(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node {
            kind,
            children: vec![],
            parent: None,
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Swaps a node's kind in place, keeping its children and parent.
    pub fn set_kind(&mut self, id: NodeId, kind: NodeKind) {
        self.nodes[id.0].kind = kind;
    }

    pub fn name(&self, id: NodeId) -> NodeName {
        self.kind(id).name()
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[Child] {
        &self.nodes[id.0].children
    }

    pub fn copy_of_children(&self, id: NodeId) -> Vec<Child> {
        self.children(id).to_vec()
    }

    pub fn child(&self, id: NodeId, i: usize) -> &Child {
        &self.nodes[id.0].children[i]
    }

    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    pub fn has_children(&self, id: NodeId) -> bool {
        !self.children(id).is_empty()
    }

    /// True if `child` is a node with the given name.
    pub fn is_named(&self, child: &Child, name: NodeName) -> bool {
        child.node().is_some_and(|id| self.name(id) == name)
    }

    /// Appends `child` to the end of `id`'s children.
    pub fn push(&mut self, id: NodeId, child: impl Into<Child>) -> Result<(), Error> {
        let child = child.into();
        self.adopt(id, &child)?;
        self.nodes[id.0].children.push(child);
        Ok(())
    }

    /// Overwrites the `i`th child of `id`.
    pub fn set_child(
        &mut self,
        id: NodeId,
        i: usize,
        child: impl Into<Child>,
    ) -> Result<(), Error> {
        self.replace_child(id, i, child).map(|_| ())
    }

    /// Overwrites the `i`th child of `id`, returning the detached child
    /// that used to be there.
    pub fn replace_child(
        &mut self,
        id: NodeId,
        i: usize,
        child: impl Into<Child>,
    ) -> Result<Child, Error> {
        let child = child.into();
        self.adopt(id, &child)?;
        let removed = std::mem::replace(&mut self.nodes[id.0].children[i], child);
        self.orphan(&removed);
        Ok(removed)
    }

    /// Inserts `child` at position `i` of `id`'s children.
    pub fn insert_child(
        &mut self,
        id: NodeId,
        i: usize,
        child: impl Into<Child>,
    ) -> Result<(), Error> {
        let child = child.into();
        self.adopt(id, &child)?;
        self.nodes[id.0].children.insert(i, child);
        Ok(())
    }

    /// Removes and returns the `i`th child of `id`, detaching it.
    pub fn remove_child(&mut self, id: NodeId, i: usize) -> Child {
        let removed = self.nodes[id.0].children.remove(i);
        self.orphan(&removed);
        removed
    }

    /// Detaches all of `id`'s children, returning them in order.
    pub fn clear_children(&mut self, id: NodeId) -> Vec<Child> {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in &children {
            self.orphan(child);
        }
        children
    }

    /// Splices `id`'s children into its own position in its parent's child
    /// list, leaving `id` detached and empty.
    pub fn replace_with_children(&mut self, id: NodeId) -> Result<(), Error> {
        let parent = self.parent(id).ok_or(Error::CannotReplaceRoot)?;
        let index = self
            .children(parent)
            .iter()
            .position(|c| c.node() == Some(id))
            .ok_or(Error::CannotReplaceRoot)?;

        let children = self.clear_children(id);
        self.remove_child(parent, index);
        for (offset, child) in children.into_iter().enumerate() {
            self.insert_child(parent, index + offset, child)?;
        }
        Ok(())
    }

    /// True if `id` or any of its ancestors is named `name`.
    pub fn is_or_has_parent_named(&self, id: NodeId, name: NodeName) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.name(node) == name {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Returns a [`fmt::Display`] view of the subtree rooted at `id`.
    ///
    /// The plain format is compact, e.g. `Document[Paragraph["foo"]]`; the
    /// alternate format (`{:#}`) puts every child on its own indented line.
    pub fn display(&self, id: NodeId) -> NodeDisplay<'_> {
        NodeDisplay { tree: self, id }
    }

    fn adopt(&mut self, id: NodeId, child: &Child) -> Result<(), Error> {
        if self.name(id) == NodeName::Separator {
            return Err(Error::ChildOfSeparator);
        }
        if let Child::Node(child) = child {
            self.nodes[child.0].parent = Some(id);
        }
        Ok(())
    }

    fn orphan(&mut self, child: &Child) {
        if let Child::Node(child) = child {
            self.nodes[child.0].parent = None;
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.display(self.root()), f)
    }
}

/// Formats a subtree; see [`Tree::display()`].
pub struct NodeDisplay<'a> {
    tree: &'a Tree,
    id: NodeId,
}

impl NodeDisplay<'_> {
    fn write(&self, f: &mut fmt::Formatter<'_>, id: NodeId, depth: usize) -> fmt::Result {
        match self.tree.kind(id) {
            NodeKind::Heading(level) => write!(f, "Heading({})", level.get())?,
            NodeKind::A { href } => write!(f, "A({href:?})")?,
            NodeKind::NumberedListItem(n) => write!(f, "NumberedListItem({n})")?,
            NodeKind::Blockquote {
                accepts_trailers: true,
            } => write!(f, "Blockquote(trailers)")?,
            kind => write!(f, "{}", kind.name())?,
        }

        let children = self.tree.children(id);
        if children.is_empty() {
            return Ok(());
        }

        let pretty = f.alternate();
        f.write_str("[")?;
        for (i, child) in children.iter().enumerate() {
            if pretty {
                write!(f, "\n{}", "  ".repeat(depth + 1))?;
            } else if i > 0 {
                f.write_str(", ")?;
            }
            match child {
                Child::Text(text) => write!(f, "{text:?}")?,
                Child::Node(child) => self.write(f, *child, depth + 1)?,
            }
        }
        if pretty {
            write!(f, "\n{}", "  ".repeat(depth))?;
        }
        f.write_str("]")
    }
}

impl fmt::Display for NodeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, self.id, 0)
    }
}
