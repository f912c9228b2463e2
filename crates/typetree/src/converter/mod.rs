//! Converters: one per persisted type tag.
//!
//! A converter turns values of the runtime types it claims into a [`Node`]
//! and turns nodes carrying its type tag back into values. Converters never
//! look at each other directly; containers reach their elements through the
//! [`Registry`] they are handed, so any converter registered for an element
//! type participates in nested encoding and decoding.
//!
//! The built-in set:
//!
//! | Tag | Claims | Shape |
//! |-----|--------|-------|
//! | `NoneType` | null | leaf, empty text |
//! | `bool` | bool | leaf |
//! | `int` | fixed-width integers | leaf |
//! | `long` | arbitrary-precision integers | leaf |
//! | `float` | floats | leaf |
//! | `unicode` | text | leaf |
//! | `list` | lists | internal, children named `item` |
//! | `tuple` | tuples | internal, children named `item` |
//! | `dict` | mappings | internal, children named by key |
//! | `object` | values with an extension hook (lazy, encode only) | substitute's shape |

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::node::{Node, NodeShape};
use crate::registry::Registry;
use crate::value::{TypeHint, TypeKey, Value};

pub mod collection;
pub mod extension;
pub mod scalar;

pub use collection::{MappingConverter, SequenceConverter};
pub use extension::ExtensionConverter;
pub use scalar::{
    BigIntConverter, BoolConverter, FloatConverter, IntConverter, NullConverter, TextConverter,
};

/// Persisted type tags of the built-in converters.
pub mod tags {
    pub const NULL: &str = "NoneType";
    pub const BOOL: &str = "bool";
    pub const INT: &str = "int";
    pub const BIGINT: &str = "long";
    pub const FLOAT: &str = "float";
    pub const TEXT: &str = "unicode";
    pub const LIST: &str = "list";
    pub const TUPLE: &str = "tuple";
    pub const MAP: &str = "dict";
    pub const OBJECT: &str = "object";
}

/// Element name of sequence children.
pub const ITEM_NAME: &str = "item";

/// Maps one persisted type tag to the runtime types it claims.
pub trait Converter: Send + Sync + fmt::Debug {
    /// The tag written into the tree for values this converter encodes.
    fn type_tag(&self) -> &str;

    /// Additional tags this converter accepts when decoding.
    fn aliases(&self) -> &[&str] {
        &[]
    }

    /// Runtime types this converter claims exactly.
    fn applies_to(&self) -> Vec<TypeKey>;

    /// A lazy converter is chosen through an ancestor match only when no
    /// non-lazy converter matches any ancestor.
    fn promote_lazy(&self) -> bool {
        false
    }

    /// Whether nodes carrying this converter's tag can be decoded.
    fn decodable(&self) -> bool {
        true
    }

    /// Shape of the nodes this converter produces.
    fn shape(&self) -> NodeShape;

    /// Builds the node for `value` under element `name`.
    fn encode(&self, value: &Value, name: &str, registry: &Registry) -> Result<Node>;

    /// Rebuilds a value from a node carrying this converter's tag.
    fn decode(&self, node: &Node, hint: Option<TypeHint>, registry: &Registry) -> Result<Value>;
}

/// Returns the built-in converters in registration order.
pub fn builtin_converters() -> Vec<Arc<dyn Converter>> {
    vec![
        Arc::new(NullConverter),
        Arc::new(BoolConverter),
        Arc::new(IntConverter),
        Arc::new(BigIntConverter),
        Arc::new(FloatConverter),
        Arc::new(TextConverter),
        Arc::new(SequenceConverter::list()),
        Arc::new(SequenceConverter::tuple()),
        Arc::new(MappingConverter),
        Arc::new(ExtensionConverter),
    ]
}
