//! # Helios Type-Tree Serializer
//!
//! This crate converts dynamic configuration values into a self-describing,
//! type-tagged tree and back, with XML as the text form. It does not need to
//! know a value's shape in advance: every node records which converter
//! produced it, and decoding looks that converter up again.
//!
//! ## Features
//!
//! - **Closed value model**: [`Value`] covers null, booleans, fixed-width and
//!   arbitrary-precision integers, floats, text, lists, tuples, and ordered
//!   mappings, plus [`Value::Custom`] for application types.
//! - **Open dispatch**: a [`Registry`] resolves values to [`Converter`]s by
//!   exact type, then by declared ancestry, with memoized lookups. New
//!   converters can be registered before the first lookup.
//! - **Extension hook**: a custom type implementing
//!   [`ReducesToSerializable`] is encoded as the value its hook returns.
//! - **Exact round trips**: floats use shortest round-trip text, big
//!   integers keep every digit, empty collections stay distinct from null.
//! - **Stable format**: files written by older releases (legacy tags,
//!   capitalized booleans, untyped root) still decode.
//!
//! ## Architecture
//!
//! - **Value layer** ([`value`]): dynamic values and their runtime type keys.
//! - **Node layer** ([`node`]): the intermediate tree.
//! - **Converter layer** ([`converter`], [`registry`]): per-category encode
//!   and decode, and resolution between them.
//! - **Text layer** ([`xml`]): quick-xml rendering and parsing of node trees.
//! - **Entry points** ([`Engine`], [`OptionStore`]).
//!
//! ## Tree text format
//!
//! | Value | XML |
//! |-------|-----|
//! | `42` | `<a type="int">42</a>` |
//! | `2^70` | `<a type="long">1180591620717411303424</a>` |
//! | `0.1` | `<a type="float">0.1</a>` |
//! | `"x"` | `<a type="unicode">x</a>` |
//! | `true` | `<a type="bool">true</a>` |
//! | `null` | `<a type="NoneType"/>` |
//! | `[]` | `<a type="list"/>` |
//! | `["x"]` | `<a type="list"><item type="unicode">x</item></a>` |
//!
//! ## Examples
//!
//! ### Registering a converter
//!
//! ```rust
//! use std::sync::Arc;
//! use helios_typetree::{
//!     Converter, Engine, Node, NodeShape, Registry, Result, TreeConfig, TypeHint, TypeKey,
//!     Value,
//! };
//!
//! /// Stores text upper-cased.
//! #[derive(Debug)]
//! struct Shout;
//!
//! impl Converter for Shout {
//!     fn type_tag(&self) -> &str {
//!         "shout"
//!     }
//!
//!     fn applies_to(&self) -> Vec<TypeKey> {
//!         Vec::new()
//!     }
//!
//!     fn shape(&self) -> NodeShape {
//!         NodeShape::Leaf
//!     }
//!
//!     fn encode(&self, value: &Value, name: &str, _: &Registry) -> Result<Node> {
//!         Ok(Node::leaf(name, "shout", value.as_str().unwrap_or_default().to_uppercase()))
//!     }
//!
//!     fn decode(&self, node: &Node, _: Option<TypeHint>, _: &Registry) -> Result<Value> {
//!         Ok(Value::from(node.text()?.to_lowercase()))
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.register(Shout)?;
//! let engine = Engine::new(Arc::new(registry), TreeConfig::default());
//!
//! let root = engine.decode(r#"<configuration><greeting type="shout">HI</greeting></configuration>"#)?;
//! assert_eq!(root["greeting"], Value::from("hi"));
//! # Ok::<(), helios_typetree::Error>(())
//! ```

pub mod config;
pub mod converter;
pub mod engine;
pub mod error;
#[cfg(feature = "logging")]
pub mod logging;
pub mod node;
pub mod registry;
pub mod store;
pub mod value;
pub mod xml;

// Re-export common types
pub use config::TreeConfig;
pub use converter::Converter;
pub use engine::Engine;
pub use error::{Error, ErrorKind, HookError, RegistryError, Result, TreePath};
pub use node::{Node, NodeShape, ShapeError};
pub use registry::Registry;
pub use store::OptionStore;
pub use value::{
    CustomKey, CustomValue, IntWidth, Map, ReducesToSerializable, TypeHint, TypeKey, Value,
    ValueKind,
};

#[cfg(feature = "logging")]
pub use logging::init_logging;
