//! Rendering a [`Node`] tree as XML text.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::config::TreeConfig;
use crate::error::{Error, Result};
use crate::node::{Node, NodeShape};
use crate::xml::utils;

/// Render a tree to an XML string.
pub fn write_tree_string(node: &Node, config: &TreeConfig) -> Result<String> {
    let buffer = write_tree_vec(node, config)?;
    String::from_utf8(buffer).map_err(|e| Error::unrepresentable(e.to_string()))
}

/// Render a tree to an XML byte vector.
pub fn write_tree_vec(node: &Node, config: &TreeConfig) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_tree(node, &mut buffer, config)?;
    Ok(buffer)
}

/// Render a tree to an XML writer.
pub fn write_tree<W: Write>(node: &Node, writer: W, config: &TreeConfig) -> Result<()> {
    let mut writer = match config.indent {
        Some(width) if width > 0 => Writer::new_with_indent(writer, b' ', width),
        _ => Writer::new(writer),
    };

    if config.xml_declaration {
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    }
    write_node(&mut writer, node)
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node) -> Result<()> {
    write_element(writer, node).map_err(|e| e.within(node.name()))
}

fn write_element<W: Write>(writer: &mut Writer<W>, node: &Node) -> Result<()> {
    if !utils::is_valid_element_name(node.name()) {
        return Err(Error::unrepresentable(format!(
            "'{}' as an element name",
            node.name()
        )));
    }

    let mut element = BytesStart::new(node.name());
    element.push_attribute((utils::TYPE_ATTRIBUTE, node.type_tag()));

    match node.shape() {
        NodeShape::Leaf => {
            let text = node.text()?;
            if text.is_empty() {
                writer.write_event(Event::Empty(element))?;
                return Ok(());
            }
            if text.contains('\0') {
                return Err(Error::unrepresentable("text containing U+0000"));
            }
            writer.write_event(Event::Start(element))?;
            writer.write_event(Event::Text(BytesText::from_escaped(utils::escape_text(
                text,
            ))))?;
            writer.write_event(Event::End(BytesEnd::new(node.name())))?;
        }
        NodeShape::Internal => {
            let children = node.children()?;
            if children.is_empty() {
                writer.write_event(Event::Empty(element))?;
                return Ok(());
            }
            writer.write_event(Event::Start(element))?;
            for child in children {
                write_node(writer, child)?;
            }
            writer.write_event(Event::End(BytesEnd::new(node.name())))?;
        }
    }
    Ok(())
}
