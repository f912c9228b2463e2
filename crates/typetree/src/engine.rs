//! The top-level encode/decode entry points.
//!
//! An [`Engine`] pairs a shared [`Registry`] with a [`TreeConfig`]. Encoding
//! wraps a root [`Map`] in the document element and renders it; decoding
//! parses the text and rebuilds the root mapping through the registry.
//!
//! ```rust
//! use helios_typetree::{Engine, Map, Value};
//!
//! let engine = Engine::default();
//!
//! let mut options = Map::new();
//! options.insert("a".to_string(), Value::from(42));
//! options.insert("b".to_string(), Value::from(vec![Value::from("x"), Value::from(true)]));
//! options.insert("c".to_string(), Value::Null);
//!
//! let text = engine.encode(&options)?;
//! assert_eq!(engine.decode(&text)?, options);
//! # Ok::<(), helios_typetree::Error>(())
//! ```
//!
//! Encoding follows references only; a value that contains itself (through
//! a custom hook) recurses without bound. Callers must not pass cyclic data.
//!
//! Decoding text rejects documents nested deeper than [`xml::MAX_DEPTH`]
//! elements with [`Error::MalformedTree`], so values nested deeper than that
//! encode but cannot be read back. [`Engine::decode_tree`] and
//! [`Engine::decode_node_at`] take an already built tree and apply no limit;
//! its depth is the caller's responsibility.

use std::io::{BufRead, Write};
use std::sync::Arc;

use tracing::debug;

use crate::config::TreeConfig;
use crate::converter::{MappingConverter, tags};
use crate::error::{Error, Result};
use crate::node::Node;
use crate::registry::Registry;
use crate::value::{Map, TypeHint, Value};
use crate::xml;

/// Encodes root mappings to tree text and back.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    config: TreeConfig,
}

impl Engine {
    pub fn new(registry: Arc<Registry>, config: TreeConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Returns an engine sharing this registry with a different configuration.
    pub fn with_config(&self, config: TreeConfig) -> Self {
        Self::new(Arc::clone(&self.registry), config)
    }

    /// Builds the tree for a root mapping, without rendering it.
    pub fn encode_tree(&self, root: &Map) -> Result<Node> {
        MappingConverter
            .encode_map(root, &self.config.root_tag, &self.registry)
            .map_err(|e| e.within(self.config.root_tag.as_str()))
    }

    /// Encodes a root mapping to an XML writer.
    pub fn encode_to_writer<W: Write>(&self, root: &Map, writer: W) -> Result<()> {
        let tree = self.encode_tree(root)?;
        debug!(
            entries = root.len(),
            nodes = tree.node_count(),
            "encoding configuration tree"
        );
        xml::write_tree(&tree, writer, &self.config)
    }

    /// Encodes a root mapping to XML bytes.
    pub fn encode_to_vec(&self, root: &Map) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.encode_to_writer(root, &mut buffer)?;
        Ok(buffer)
    }

    /// Encodes a root mapping to an XML string.
    pub fn encode(&self, root: &Map) -> Result<String> {
        let tree = self.encode_tree(root)?;
        debug!(
            entries = root.len(),
            nodes = tree.node_count(),
            "encoding configuration tree"
        );
        xml::write_tree_string(&tree, &self.config)
    }

    /// Parses tree text without decoding any value.
    pub fn parse(&self, text: &str) -> Result<Node> {
        xml::parse_tree_str(text, self.registry.as_ref())
    }

    /// Rebuilds a root mapping from a parsed tree.
    ///
    /// The document element's name is not checked against the configured
    /// root tag; its type must be the mapping tag.
    pub fn decode_tree(&self, tree: &Node) -> Result<Map> {
        if tree.name() != self.config.root_tag {
            debug!(
                found = tree.name(),
                expected = %self.config.root_tag,
                "document element name differs from the configured root tag"
            );
        }
        if tree.type_tag() != tags::MAP {
            return Err(Error::conversion(
                tree.type_tag(),
                "root mapping",
                "the document element must be a mapping",
            )
            .within(tree.name()));
        }
        let root = MappingConverter
            .decode_map(tree, &self.registry)
            .map_err(|e| e.within(tree.name()))?;
        debug!(
            entries = root.len(),
            nodes = tree.node_count(),
            "decoded configuration tree"
        );
        Ok(root)
    }

    /// Decodes a root mapping from an XML string.
    pub fn decode(&self, text: &str) -> Result<Map> {
        self.decode_tree(&self.parse(text)?)
    }

    /// Decodes a root mapping from XML bytes.
    pub fn decode_slice(&self, bytes: &[u8]) -> Result<Map> {
        self.decode_tree(&xml::parse_tree_slice(bytes, self.registry.as_ref())?)
    }

    /// Decodes a root mapping from an XML reader.
    pub fn decode_reader<R: BufRead>(&self, reader: R) -> Result<Map> {
        self.decode_tree(&xml::parse_tree(reader, self.registry.as_ref())?)
    }

    /// Decodes the single value at `path` below the document element.
    ///
    /// Each path segment names a child element; `name[i]` picks the `i`-th
    /// child of that name, so sequence items are addressed as `item[0]`,
    /// `item[1]`, the same notation error paths use. Nothing outside the
    /// addressed node is decoded, so the rest of the document may hold
    /// unknown tags. A missing node fails with [`Error::MissingOption`].
    pub fn decode_at(&self, text: &str, path: &[&str], hint: Option<TypeHint>) -> Result<Value> {
        let tree = self.parse(text)?;
        self.decode_node_at(&tree, path, hint)
    }

    /// Like [`Engine::decode_at`], over an already parsed tree.
    pub fn decode_node_at(&self, tree: &Node, path: &[&str], hint: Option<TypeHint>) -> Result<Value> {
        let mut node = tree;
        for (depth, segment) in path.iter().enumerate() {
            let found = match split_index(segment) {
                Some((name, index)) => node.nth_child(name, index),
                None => node.child(segment),
            };
            node = found.ok_or_else(|| Error::MissingOption {
                name: path[..=depth].join("/"),
            })?;
        }

        let mut located = self.registry.decode_node(node, hint);
        for segment in path.iter().rev() {
            located = located.map_err(|e| e.within(*segment));
        }
        located.map_err(|e| e.within(tree.name()))
    }
}

/// Splits `name[i]` into its name and index.
fn split_index(segment: &str) -> Option<(&str, usize)> {
    let (name, rest) = segment.split_once('[')?;
    let index = rest.strip_suffix(']')?.parse().ok()?;
    Some((name, index))
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Arc::new(Registry::new()), TreeConfig::default())
    }
}
