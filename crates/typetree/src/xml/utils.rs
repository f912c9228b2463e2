//! Element names, attribute names, and text escaping.

use std::borrow::Cow;
use std::fmt::Write as _;

/// Attribute carrying a node's type tag.
pub const TYPE_ATTRIBUTE: &str = "type";

/// Checks whether `name` can be used as an element name.
///
/// Accepts a letter or `_` followed by letters, digits, `-`, `_`, or `.`.
/// Namespace prefixes (`:`) are not allowed.
pub fn is_valid_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Characters written as numeric references so a parser returns them intact.
fn needs_char_ref(c: char) -> bool {
    c == '\r' || (c.is_control() && c != '\n' && c != '\t')
}

/// Escapes leaf text for element content.
///
/// Markup characters are escaped as entities; carriage returns and other
/// control characters become `&#xN;` references, which parsers do not
/// normalize away.
pub fn escape_text(text: &str) -> Cow<'_, str> {
    let escaped = quick_xml::escape::escape(text);
    if !escaped.chars().any(needs_char_ref) {
        return escaped;
    }

    let mut out = String::with_capacity(escaped.len() + 8);
    for c in escaped.chars() {
        if needs_char_ref(c) {
            let _ = write!(out, "&#x{:X};", u32::from(c));
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Returns true for text made only of XML whitespace.
pub fn is_xml_whitespace(text: &str) -> bool {
    text.chars().all(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
}
