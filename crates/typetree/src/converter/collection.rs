//! Container converters: sequences (lists, tuples) and mappings.
//!
//! Both delegate every element to the registry, so element types follow the
//! same resolution rules as top-level values. Errors raised by an element
//! are prefixed with the element's position in the container.

use tracing::trace;

use super::{Converter, ITEM_NAME, tags};
use crate::error::{Error, Result};
use crate::node::{Node, NodeShape};
use crate::registry::Registry;
use crate::value::{Map, TypeHint, TypeKey, Value, ValueKind};
use crate::xml::utils::is_valid_element_name;

/// Which sequence category a [`SequenceConverter`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    List,
    Tuple,
}

/// Ordered sequences. Children are named `item`; their names are ignored
/// when decoding.
#[derive(Debug, Clone, Copy)]
pub struct SequenceConverter {
    kind: SequenceKind,
}

impl SequenceConverter {
    pub fn list() -> Self {
        Self {
            kind: SequenceKind::List,
        }
    }

    pub fn tuple() -> Self {
        Self {
            kind: SequenceKind::Tuple,
        }
    }

    pub fn kind(&self) -> SequenceKind {
        self.kind
    }
}

impl Converter for SequenceConverter {
    fn type_tag(&self) -> &str {
        match self.kind {
            SequenceKind::List => tags::LIST,
            SequenceKind::Tuple => tags::TUPLE,
        }
    }

    fn aliases(&self) -> &[&str] {
        match self.kind {
            SequenceKind::List => &["set", "frozenset"],
            SequenceKind::Tuple => &[],
        }
    }

    fn applies_to(&self) -> Vec<TypeKey> {
        match self.kind {
            SequenceKind::List => vec![ValueKind::List.into()],
            SequenceKind::Tuple => vec![ValueKind::Tuple.into()],
        }
    }

    fn shape(&self) -> NodeShape {
        NodeShape::Internal
    }

    fn encode(&self, value: &Value, name: &str, registry: &Registry) -> Result<Node> {
        let items = value
            .as_seq()
            .ok_or_else(|| Error::unsupported(value.type_name()))?;
        let children = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                registry
                    .encode_value(item, ITEM_NAME)
                    .map_err(|e| e.within(format!("{ITEM_NAME}[{i}]")))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Node::internal(name, self.type_tag(), children))
    }

    fn decode(&self, node: &Node, hint: Option<TypeHint>, registry: &Registry) -> Result<Value> {
        let items = node
            .children()?
            .iter()
            .enumerate()
            .map(|(i, child)| {
                registry
                    .decode_node(child, None)
                    .map_err(|e| e.within(format!("{ITEM_NAME}[{i}]")))
            })
            .collect::<Result<Vec<_>>>()?;

        let kind = match hint {
            Some(TypeHint::List) => SequenceKind::List,
            Some(TypeHint::Tuple) => SequenceKind::Tuple,
            _ => self.kind,
        };
        Ok(match kind {
            SequenceKind::List => Value::List(items),
            SequenceKind::Tuple => Value::Tuple(items),
        })
    }
}

/// Text-keyed mappings. Each entry becomes a child named by its key, in
/// insertion order.
#[derive(Debug, Clone, Copy, Default)]
pub struct MappingConverter;

impl MappingConverter {
    /// Encodes the entries of `map` as the children of an element `name`.
    pub fn encode_map(&self, map: &Map, name: &str, registry: &Registry) -> Result<Node> {
        let mut children = Vec::with_capacity(map.len());
        for (key, value) in map {
            if !is_valid_element_name(key) {
                return Err(Error::unrepresentable(format!(
                    "mapping key '{key}' as an element name"
                )));
            }
            children.push(registry.encode_value(value, key).map_err(|e| e.within(key))?);
        }
        trace!(element = name, entries = children.len(), "encoded mapping");
        Ok(Node::internal(name, tags::MAP, children))
    }

    /// Rebuilds a mapping from the children of `node`.
    pub fn decode_map(&self, node: &Node, registry: &Registry) -> Result<Map> {
        let children = node.children()?;
        let mut map = Map::with_capacity(children.len());
        for child in children {
            let key = child.name();
            if map.contains_key(key) {
                return Err(Error::malformed_structure(format!(
                    "duplicate key '{key}' in '{}'",
                    node.name()
                )));
            }
            let value = registry
                .decode_node(child, None)
                .map_err(|e| e.within(key))?;
            map.insert(key.to_string(), value);
        }
        Ok(map)
    }
}

impl Converter for MappingConverter {
    fn type_tag(&self) -> &str {
        tags::MAP
    }

    fn applies_to(&self) -> Vec<TypeKey> {
        vec![ValueKind::Map.into()]
    }

    fn shape(&self) -> NodeShape {
        NodeShape::Internal
    }

    fn encode(&self, value: &Value, name: &str, registry: &Registry) -> Result<Node> {
        let map = value
            .as_map()
            .ok_or_else(|| Error::unsupported(value.type_name()))?;
        self.encode_map(map, name, registry)
    }

    fn decode(&self, node: &Node, _hint: Option<TypeHint>, registry: &Registry) -> Result<Value> {
        self.decode_map(node, registry).map(Value::Map)
    }
}
