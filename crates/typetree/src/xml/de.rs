//! Parsing XML text into a [`Node`] tree.
//!
//! The parser keeps a stack of open elements. Text, CDATA, and entity
//! references are accumulated on the innermost open element; when it closes
//! it becomes an internal node if it gathered children and a leaf otherwise.
//! Whitespace between children is dropped, any other text next to children
//! is rejected as mixed content. Documents nested deeper than
//! [`MAX_DEPTH`] elements are rejected before any node is built.

use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::converter::tags;
use crate::error::{Error, Result};
use crate::node::{Node, NodeShape};
use crate::xml::ShapeHint;
use crate::xml::utils::{TYPE_ATTRIBUTE, is_xml_whitespace};

/// Deepest element nesting a document may have, counting the document
/// element as depth one.
pub const MAX_DEPTH: usize = 128;

/// Parse a tree from an XML string.
pub fn parse_tree_str<H: ShapeHint + ?Sized>(xml: &str, hint: &H) -> Result<Node> {
    parse_tree(xml.as_bytes(), hint)
}

/// Parse a tree from XML bytes.
pub fn parse_tree_slice<H: ShapeHint + ?Sized>(xml: &[u8], hint: &H) -> Result<Node> {
    parse_tree(xml, hint)
}

/// Parse a tree from an XML reader.
pub fn parse_tree<R: BufRead, H: ShapeHint + ?Sized>(reader: R, hint: &H) -> Result<Node> {
    TreeParser::new(Reader::from_reader(reader), hint).parse()
}

/// An element whose end tag has not been seen yet.
struct OpenElement {
    name: String,
    type_tag: String,
    text: String,
    children: Vec<Node>,
    position: u64,
}

struct TreeParser<'h, R: BufRead, H: ?Sized> {
    reader: Reader<R>,
    hint: &'h H,
    /// Buffer for reading events
    buf: Vec<u8>,
    stack: Vec<OpenElement>,
    root: Option<Node>,
}

impl<'h, R: BufRead, H: ShapeHint + ?Sized> TreeParser<'h, R, H> {
    fn new(reader: Reader<R>, hint: &'h H) -> Self {
        Self {
            reader,
            hint,
            buf: Vec::new(),
            stack: Vec::new(),
            root: None,
        }
    }

    fn position(&self) -> u64 {
        self.reader.buffer_position() as u64
    }

    fn parse(mut self) -> Result<Node> {
        loop {
            self.buf.clear();
            let result = self
                .reader
                .read_event_into(&mut self.buf)
                .map(Event::into_owned);
            let event = result.map_err(|e| Error::malformed(e.to_string(), self.position()))?;

            match event {
                Event::Start(e) => {
                    let open = self.open_element(&e)?;
                    self.stack.push(open);
                }
                Event::Empty(e) => {
                    let open = self.open_element(&e)?;
                    let node = self.close_element(open)?;
                    self.attach(node)?;
                }
                Event::End(_) => {
                    let open = self.stack.pop().ok_or_else(|| {
                        Error::malformed("end tag without a start tag", self.position())
                    })?;
                    let node = self.close_element(open)?;
                    self.attach(node)?;
                }
                Event::Text(t) => {
                    let raw = self.utf8(&t)?;
                    let text = unescape(&raw)
                        .map_err(|e| Error::malformed(e.to_string(), self.position()))?
                        .into_owned();
                    self.push_text(&text)?;
                }
                Event::CData(c) => {
                    let text = self.utf8(&c)?;
                    self.push_text(&text)?;
                }
                Event::GeneralRef(r) => {
                    let name = self.utf8(&r)?;
                    let reference = format!("&{name};");
                    let text = unescape(&reference)
                        .map_err(|e| Error::malformed(e.to_string(), self.position()))?
                        .into_owned();
                    self.push_text(&text)?;
                }
                Event::Eof => break,
                // Declarations, comments, processing instructions, doctype
                _ => {}
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(Error::malformed(
                format!("unexpected end of input inside '{}'", open.name),
                self.position(),
            ));
        }
        self.root
            .ok_or_else(|| Error::malformed("document has no root element", 0))
    }

    fn utf8(&self, bytes: &[u8]) -> Result<String> {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|e| Error::malformed(format!("invalid UTF-8: {e}"), self.position()))
    }

    fn open_element(&self, e: &BytesStart<'_>) -> Result<OpenElement> {
        if self.stack.len() >= MAX_DEPTH {
            return Err(Error::malformed(
                format!("elements nested deeper than {MAX_DEPTH} levels"),
                self.position(),
            ));
        }
        let name = self.utf8(e.name().as_ref())?;
        let mut type_tag = None;
        for attr in e.attributes() {
            let attr = attr.map_err(|err| Error::malformed(err.to_string(), self.position()))?;
            if attr.key.as_ref() == TYPE_ATTRIBUTE.as_bytes() {
                let raw = self.utf8(&attr.value)?;
                let value = unescape(&raw)
                    .map_err(|err| Error::malformed(err.to_string(), self.position()))?;
                type_tag = Some(value.into_owned());
            }
        }

        let type_tag = match type_tag {
            Some(tag) => tag,
            // The document element of older files has no type; it is always a mapping
            None if self.stack.is_empty() && self.root.is_none() => tags::MAP.to_string(),
            None => {
                return Err(Error::malformed(
                    format!("element '{name}' has no '{TYPE_ATTRIBUTE}' attribute"),
                    self.position(),
                ));
            }
        };

        Ok(OpenElement {
            name,
            type_tag,
            text: String::new(),
            children: Vec::new(),
            position: self.position(),
        })
    }

    fn close_element(&self, open: OpenElement) -> Result<Node> {
        let OpenElement {
            name,
            type_tag,
            text,
            children,
            position,
        } = open;

        if !children.is_empty() {
            if !is_xml_whitespace(&text) {
                return Err(Error::malformed(
                    format!("element '{name}' mixes text and child elements"),
                    position,
                ));
            }
            return Ok(Node::internal(name, type_tag, children));
        }

        let internal = self.hint.shape_of(&type_tag) == Some(NodeShape::Internal);
        if internal && is_xml_whitespace(&text) {
            Ok(Node::internal(name, type_tag, Vec::new()))
        } else {
            Ok(Node::leaf(name, type_tag, text))
        }
    }

    fn attach(&mut self, node: Node) -> Result<()> {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
            return Ok(());
        }
        if self.root.is_some() {
            return Err(Error::malformed(
                format!("second document element '{}'", node.name()),
                self.position(),
            ));
        }
        self.root = Some(node);
        Ok(())
    }

    fn push_text(&mut self, text: &str) -> Result<()> {
        match self.stack.last_mut() {
            Some(open) => {
                open.text.push_str(text);
                Ok(())
            }
            None if is_xml_whitespace(text) => Ok(()),
            None => Err(Error::malformed(
                "text outside the document element",
                self.position(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn shapes(tag: &str) -> Option<NodeShape> {
        match tag {
            "dict" | "list" | "tuple" => Some(NodeShape::Internal),
            "unicode" | "int" | "NoneType" => Some(NodeShape::Leaf),
            _ => None,
        }
    }

    #[test]
    fn test_parse_nested() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<configuration type="dict">
  <a type="int">42</a>
  <b type="list">
    <item type="unicode">x</item>
  </b>
  <c type="NoneType"/>
</configuration>"#;
        let tree = parse_tree_str(xml, &shapes).unwrap();

        let expected = Node::internal(
            "configuration",
            "dict",
            vec![
                Node::leaf("a", "int", "42"),
                Node::internal("b", "list", vec![Node::leaf("item", "unicode", "x")]),
                Node::leaf("c", "NoneType", ""),
            ],
        );
        assert_eq!(tree, expected);
    }

    #[test]
    fn test_empty_element_shape_follows_hint() {
        let xml = r#"<configuration type="dict"><l type="list"/><s type="unicode"/><e type="list">
  </e><w type="unicode">  </w></configuration>"#;
        let tree = parse_tree_str(xml, &shapes).unwrap();

        assert_eq!(tree.child("l"), Some(&Node::internal("l", "list", vec![])));
        assert_eq!(tree.child("s"), Some(&Node::leaf("s", "unicode", "")));
        assert_eq!(tree.child("e"), Some(&Node::internal("e", "list", vec![])));
        assert_eq!(tree.child("w"), Some(&Node::leaf("w", "unicode", "  ")));
    }

    #[test]
    fn test_references_and_cdata_resolved() {
        let xml = r#"<configuration type="dict"><t type="unicode">a &lt;b&gt; &amp; &#xD;&#65;<![CDATA[<raw>]]></t></configuration>"#;
        let tree = parse_tree_str(xml, &shapes).unwrap();
        assert_eq!(
            tree.child("t").map(|n| n.text()),
            Some(Ok("a <b> & \rA<raw>"))
        );
    }

    #[test]
    fn test_root_without_type_is_mapping() {
        let tree = parse_tree_str(
            "<configuration><a type=\"int\">1</a></configuration>",
            &shapes,
        )
        .unwrap();
        assert_eq!(tree.type_tag(), "dict");

        let err = parse_tree_str("<configuration><a>1</a></configuration>", &shapes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedTree);
    }

    #[test]
    fn test_malformed_inputs() {
        for xml in [
            "",
            "   ",
            "<configuration type=\"dict\">",
            "<configuration type=\"dict\"><a type=\"int\">1</b></configuration>",
            "<configuration type=\"dict\"/><other type=\"dict\"/>",
            "<configuration type=\"dict\">text<a type=\"int\">1</a></configuration>",
            "stray<configuration type=\"dict\"/>",
            "<configuration type=\"dict\"><t type=\"unicode\">&bogus;</t></configuration>",
        ] {
            let err = parse_tree_str(xml, &shapes).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedTree, "{xml:?}: {err}");
        }
    }

    fn nested_lists(depth: usize, innermost: &str) -> String {
        let mut xml = "<configuration type=\"dict\">".to_string();
        xml.push_str(&"<l type=\"list\">".repeat(depth - 1));
        xml.push_str(innermost);
        xml.push_str(&"</l>".repeat(depth - 1));
        xml.push_str("</configuration>");
        xml
    }

    #[test]
    fn test_depth_limit() {
        let tree = parse_tree_str(&nested_lists(MAX_DEPTH, ""), &shapes).unwrap();
        assert_eq!(tree.node_count(), MAX_DEPTH);

        for innermost in ["<l type=\"list\"/>", "<l type=\"list\"></l>"] {
            let err = parse_tree_str(&nested_lists(MAX_DEPTH, innermost), &shapes).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedTree);
            assert!(err.to_string().contains("nested deeper"), "{err}");
        }
    }

    #[test]
    fn test_deeply_nested_input_fails_cleanly() {
        let err = parse_tree_str(&nested_lists(200_000, ""), &shapes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedTree);
    }

    #[test]
    fn test_invalid_utf8() {
        let bytes = b"<configuration type=\"dict\"><t type=\"unicode\">\xff</t></configuration>";
        let err = parse_tree_slice(bytes, &shapes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedTree);
    }
}
