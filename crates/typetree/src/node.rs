//! The tagged tree that sits between in-memory values and tree text.
//!
//! A [`Node`] is either a leaf carrying literal text or an internal node
//! carrying an ordered list of children. The two are distinct: an internal
//! node with zero children is not a leaf with empty text.

use std::fmt;

use thiserror::Error;

/// Structural shape of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeShape {
    /// Literal text content.
    Leaf,
    /// Ordered child nodes.
    Internal,
}

impl fmt::Display for NodeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeShape::Leaf => f.write_str("a leaf"),
            NodeShape::Internal => f.write_str("an internal node"),
        }
    }
}

/// Raised when a node is accessed as the wrong shape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("node '{name}' (type '{type_tag}') is {found}, expected {expected}")]
pub struct ShapeError {
    pub name: String,
    pub type_tag: String,
    pub expected: NodeShape,
    pub found: NodeShape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content {
    Text(String),
    Children(Vec<Node>),
}

/// A named, type-tagged tree node.
///
/// Equality is structural: name, tag, and content, with child order significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    name: String,
    type_tag: String,
    content: Content,
}

impl Node {
    /// Creates a leaf node with literal text.
    pub fn leaf(
        name: impl Into<String>,
        type_tag: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            content: Content::Text(text.into()),
        }
    }

    /// Creates an internal node with ordered children.
    pub fn internal(
        name: impl Into<String>,
        type_tag: impl Into<String>,
        children: Vec<Node>,
    ) -> Self {
        Self {
            name: name.into(),
            type_tag: type_tag.into(),
            content: Content::Children(children),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn shape(&self) -> NodeShape {
        match self.content {
            Content::Text(_) => NodeShape::Leaf,
            Content::Children(_) => NodeShape::Internal,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.shape() == NodeShape::Leaf
    }

    /// Returns the literal text of a leaf.
    pub fn text(&self) -> Result<&str, ShapeError> {
        match &self.content {
            Content::Text(text) => Ok(text),
            Content::Children(_) => Err(self.shape_error(NodeShape::Leaf)),
        }
    }

    /// Returns the children of an internal node.
    pub fn children(&self) -> Result<&[Node], ShapeError> {
        match &self.content {
            Content::Children(children) => Ok(children),
            Content::Text(_) => Err(self.shape_error(NodeShape::Internal)),
        }
    }

    /// Finds the first direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        match &self.content {
            Content::Children(children) => children.iter().find(|c| c.name == name),
            Content::Text(_) => None,
        }
    }

    /// Finds the `index`-th direct child with the given name.
    pub fn nth_child(&self, name: &str, index: usize) -> Option<&Node> {
        match &self.content {
            Content::Children(children) => {
                children.iter().filter(|c| c.name == name).nth(index)
            }
            Content::Text(_) => None,
        }
    }

    /// Renames the node, keeping tag and content.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Counts this node and all of its descendants.
    pub fn node_count(&self) -> usize {
        match &self.content {
            Content::Text(_) => 1,
            Content::Children(children) => 1 + children.iter().map(Node::node_count).sum::<usize>(),
        }
    }

    fn shape_error(&self, expected: NodeShape) -> ShapeError {
        ShapeError {
            name: self.name.clone(),
            type_tag: self.type_tag.clone(),
            expected,
            found: self.shape(),
        }
    }
}
