//! Tree text form: a self-describing XML document.
//!
//! Every element carries a `type` attribute naming the converter that
//! produced it, and holds either literal text (a leaf) or child elements
//! (an internal node):
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <configuration type="dict">
//!   <a type="int">42</a>
//!   <b type="list">
//!     <item type="unicode">x</item>
//!     <item type="bool">true</item>
//!   </b>
//!   <c type="NoneType"/>
//! </configuration>
//! ```
//!
//! - **Rendering** ([`ser`]) writes quick-xml events straight from a
//!   [`Node`](crate::node::Node). Empty leaves and childless internal nodes
//!   are written as self-closing elements; leaf text is never reindented.
//!
//! - **Parsing** ([`de`]) is registry-agnostic except for one question it
//!   cannot answer from the text alone: whether an element with no content
//!   is an empty leaf or an internal node with zero children. A
//!   [`ShapeHint`] answers it from the element's type tag.

use crate::node::NodeShape;

pub mod de;
pub mod ser;
pub mod utils;

pub use de::{MAX_DEPTH, parse_tree, parse_tree_slice, parse_tree_str};
pub use ser::{write_tree, write_tree_string, write_tree_vec};

/// Tells the parser which shape a type tag produces.
pub trait ShapeHint {
    /// Returns the shape nodes with `type_tag` take, if known.
    fn shape_of(&self, type_tag: &str) -> Option<NodeShape>;
}

impl<F> ShapeHint for F
where
    F: Fn(&str) -> Option<NodeShape>,
{
    fn shape_of(&self, type_tag: &str) -> Option<NodeShape> {
        self(type_tag)
    }
}
