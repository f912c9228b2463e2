//! Rendering configuration for the tree text form.
//!
//! | Field | Default | Description |
//! |-------|---------|-------------|
//! | `root_tag` | `configuration` | Name of the document element |
//! | `indent` | `2` | Spaces per nesting level, `None` for a single line |
//! | `xml_declaration` | `true` | Write `<?xml version="1.0" encoding="UTF-8"?>` first |
//!
//! Decoding accepts any of these layouts regardless of the configuration.
//!
//! # Example
//!
//! ```rust
//! use helios_typetree::TreeConfig;
//!
//! let config = TreeConfig::default().with_root_tag("settings").with_indent(Some(4));
//! assert!(config.validate().is_ok());
//!
//! // Or load it from an application's own settings file
//! let config: TreeConfig = serde_json::from_str(r#"{ "indent": null }"#).unwrap();
//! assert_eq!(config.root_tag, "configuration");
//! ```

use serde::{Deserialize, Serialize};

use crate::xml::utils::is_valid_element_name;

/// Default document element name.
pub const DEFAULT_ROOT_TAG: &str = "configuration";

/// Largest accepted indentation width.
pub const MAX_INDENT: usize = 16;

/// How trees are rendered to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Name of the document element.
    pub root_tag: String,

    /// Spaces per nesting level; `None` or `Some(0)` writes one line.
    pub indent: Option<usize>,

    /// Whether to write an XML declaration.
    pub xml_declaration: bool,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            root_tag: DEFAULT_ROOT_TAG.to_string(),
            indent: Some(2),
            xml_declaration: true,
        }
    }
}

impl TreeConfig {
    /// Single-line output without a declaration.
    pub fn compact() -> Self {
        Self {
            indent: None,
            xml_declaration: false,
            ..Default::default()
        }
    }

    /// Sets the document element name.
    pub fn with_root_tag(mut self, root_tag: impl Into<String>) -> Self {
        self.root_tag = root_tag.into();
        self
    }

    /// Sets the indentation width.
    pub fn with_indent(mut self, indent: Option<usize>) -> Self {
        self.indent = indent;
        self
    }

    /// Sets whether the declaration is written.
    pub fn with_xml_declaration(mut self, xml_declaration: bool) -> Self {
        self.xml_declaration = xml_declaration;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns a list of validation errors, or Ok if valid.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !is_valid_element_name(&self.root_tag) {
            errors.push(format!(
                "Root tag '{}' is not a valid element name",
                self.root_tag
            ));
        }

        if self.indent.is_some_and(|indent| indent > MAX_INDENT) {
            errors.push(format!("Indent cannot exceed {MAX_INDENT} spaces"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
