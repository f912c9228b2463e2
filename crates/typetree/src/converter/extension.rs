//! The lazy converter for values that reduce themselves through a hook.

use super::{Converter, tags};
use crate::error::{Error, Result, TreePath};
use crate::node::{Node, NodeShape};
use crate::registry::Registry;
use crate::value::{TypeHint, TypeKey, Value, ValueKind};

/// Claims the root of every ancestry. A value with an extension hook is
/// replaced by the hook's substitute, which is then encoded through the
/// registry under the same element name, so the tree records the
/// substitute's tag.
///
/// The `object` tag never appears in a tree and cannot be decoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionConverter;

impl Converter for ExtensionConverter {
    fn type_tag(&self) -> &str {
        tags::OBJECT
    }

    fn applies_to(&self) -> Vec<TypeKey> {
        vec![ValueKind::Object.into()]
    }

    fn promote_lazy(&self) -> bool {
        true
    }

    fn decodable(&self) -> bool {
        false
    }

    // Reported for completeness; the substitute decides the actual shape.
    fn shape(&self) -> NodeShape {
        NodeShape::Leaf
    }

    fn encode(&self, value: &Value, name: &str, registry: &Registry) -> Result<Node> {
        let hook = value
            .as_custom()
            .and_then(|custom| custom.as_reducible())
            .ok_or_else(|| Error::unsupported(value.type_name()))?;

        let substitute = hook.reduce().map_err(|source| Error::Hook {
            type_name: value.type_name().to_string(),
            path: TreePath::new(),
            source,
        })?;
        registry.encode_value(&substitute, name)
    }

    fn decode(&self, node: &Node, _hint: Option<TypeHint>, _registry: &Registry) -> Result<Value> {
        Err(Error::unknown_tag(node.type_tag()))
    }
}
