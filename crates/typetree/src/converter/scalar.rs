//! Leaf converters for null, booleans, integers, floats, and text.

use std::str::FromStr;

use num_bigint::BigInt;
use tracing::debug;

use super::{Converter, tags};
use crate::error::{Error, Result};
use crate::node::{Node, NodeShape};
use crate::registry::Registry;
use crate::value::{IntWidth, TypeHint, TypeKey, Value, ValueKind};

fn leaf_text(node: &Node) -> Result<&str> {
    Ok(node.text()?)
}

fn mismatch(converter: &dyn Converter, value: &Value) -> Error {
    Error::unsupported(format!(
        "{} (given to converter '{}')",
        value.type_name(),
        converter.type_tag()
    ))
}

/// Null. Encodes to an empty leaf; decodes to null whatever the content.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullConverter;

impl Converter for NullConverter {
    fn type_tag(&self) -> &str {
        tags::NULL
    }

    fn applies_to(&self) -> Vec<TypeKey> {
        vec![ValueKind::Null.into()]
    }

    fn shape(&self) -> NodeShape {
        NodeShape::Leaf
    }

    fn encode(&self, _value: &Value, name: &str, _registry: &Registry) -> Result<Node> {
        Ok(Node::leaf(name, tags::NULL, ""))
    }

    fn decode(&self, _node: &Node, _hint: Option<TypeHint>, _registry: &Registry) -> Result<Value> {
        Ok(Value::Null)
    }
}

/// Booleans, written as `true` / `false`.
///
/// Decoding also accepts the capitalized spellings older files carry, plus
/// `1`/`0`, `yes`/`no`, and `on`/`off`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoolConverter;

fn parse_bool(text: &str) -> Option<(bool, bool)> {
    match text {
        "true" => Some((true, false)),
        "false" => Some((false, false)),
        "True" | "TRUE" | "1" | "yes" | "on" => Some((true, true)),
        "False" | "FALSE" | "0" | "no" | "off" => Some((false, true)),
        _ => None,
    }
}

impl Converter for BoolConverter {
    fn type_tag(&self) -> &str {
        tags::BOOL
    }

    fn applies_to(&self) -> Vec<TypeKey> {
        vec![ValueKind::Bool.into()]
    }

    fn shape(&self) -> NodeShape {
        NodeShape::Leaf
    }

    fn encode(&self, value: &Value, name: &str, _registry: &Registry) -> Result<Node> {
        let b = value.as_bool().ok_or_else(|| mismatch(self, value))?;
        Ok(Node::leaf(name, tags::BOOL, if b { "true" } else { "false" }))
    }

    fn decode(&self, node: &Node, _hint: Option<TypeHint>, _registry: &Registry) -> Result<Value> {
        let text = leaf_text(node)?;
        let (b, legacy) = parse_bool(text.trim())
            .ok_or_else(|| Error::conversion(text, "bool", "expected 'true' or 'false'"))?;
        if legacy {
            debug!(element = node.name(), text, "accepted legacy boolean spelling");
        }
        Ok(Value::Bool(b))
    }
}

/// Checks the integer lexical form (optional sign, ASCII digits) and parses it.
fn parse_integer(text: &str, target: &'static str) -> Result<BigInt> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::conversion(text, target, "not an integer"));
    }
    BigInt::from_str(trimmed).map_err(|e| Error::conversion(text, target, e))
}

/// Narrows a parsed integer into `width`.
///
/// Values inside the width but above `i64::MAX` (only possible for `u64`)
/// stay arbitrary-precision, since `Value::Int` is signed.
fn narrow(big: BigInt, width: IntWidth, text: &str) -> Result<Value> {
    let wide = i128::try_from(&big)
        .ok()
        .filter(|v| width.contains(*v))
        .ok_or_else(|| {
            Error::conversion(text, "int", format!("out of range for {}", width.name()))
        })?;
    Ok(match i64::try_from(wide) {
        Ok(small) => Value::Int(small),
        Err(_) => Value::BigInt(big),
    })
}

/// Fixed-width integers. Also reached by booleans when no bool converter
/// is registered, which then encode as 0/1.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntConverter;

impl Converter for IntConverter {
    fn type_tag(&self) -> &str {
        tags::INT
    }

    fn aliases(&self) -> &[&str] {
        &["integer"]
    }

    fn applies_to(&self) -> Vec<TypeKey> {
        vec![ValueKind::Int.into()]
    }

    fn shape(&self) -> NodeShape {
        NodeShape::Leaf
    }

    fn encode(&self, value: &Value, name: &str, _registry: &Registry) -> Result<Node> {
        let i = match value {
            Value::Int(i) => *i,
            Value::Bool(b) => i64::from(*b),
            other => return Err(mismatch(self, other)),
        };
        Ok(Node::leaf(name, tags::INT, i.to_string()))
    }

    fn decode(&self, node: &Node, hint: Option<TypeHint>, _registry: &Registry) -> Result<Value> {
        let text = leaf_text(node)?;
        let big = parse_integer(text, "int")?;
        match hint {
            Some(TypeHint::BigInt) => Ok(Value::BigInt(big)),
            Some(TypeHint::Int(width)) => narrow(big, width, text),
            _ => narrow(big, IntWidth::I64, text),
        }
    }
}

/// Arbitrary-precision integers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BigIntConverter;

impl Converter for BigIntConverter {
    fn type_tag(&self) -> &str {
        tags::BIGINT
    }

    fn applies_to(&self) -> Vec<TypeKey> {
        vec![ValueKind::BigInt.into()]
    }

    fn shape(&self) -> NodeShape {
        NodeShape::Leaf
    }

    fn encode(&self, value: &Value, name: &str, _registry: &Registry) -> Result<Node> {
        let big = value.as_bigint().ok_or_else(|| mismatch(self, value))?;
        Ok(Node::leaf(name, tags::BIGINT, big.to_string()))
    }

    fn decode(&self, node: &Node, hint: Option<TypeHint>, _registry: &Registry) -> Result<Value> {
        let text = leaf_text(node)?;
        let big = parse_integer(text, "bigint")?;
        match hint {
            Some(TypeHint::Int(width)) => narrow(big, width, text),
            _ => Ok(Value::BigInt(big)),
        }
    }
}

/// Formats a float so that parsing the text yields the identical value.
pub(crate) fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        let token = if f > 0.0 { "inf" } else { "-inf" };
        token.to_string()
    } else {
        // Debug is the shortest text that round-trips, and always carries a '.' or exponent
        format!("{f:?}")
    }
}

pub(crate) fn parse_float(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "nan" | "+nan" | "-nan" => Some(f64::NAN),
        "inf" | "+inf" | "infinity" | "+infinity" => Some(f64::INFINITY),
        "-inf" | "-infinity" => Some(f64::NEG_INFINITY),
        _ => trimmed.parse::<f64>().ok(),
    }
}

/// Floats, written in shortest round-trip form; `nan`, `inf`, `-inf` for
/// the non-finite values.
#[derive(Debug, Clone, Copy, Default)]
pub struct FloatConverter;

impl Converter for FloatConverter {
    fn type_tag(&self) -> &str {
        tags::FLOAT
    }

    fn applies_to(&self) -> Vec<TypeKey> {
        vec![ValueKind::Float.into()]
    }

    fn shape(&self) -> NodeShape {
        NodeShape::Leaf
    }

    fn encode(&self, value: &Value, name: &str, _registry: &Registry) -> Result<Node> {
        let f = value.as_f64().ok_or_else(|| mismatch(self, value))?;
        Ok(Node::leaf(name, tags::FLOAT, format_float(f)))
    }

    fn decode(&self, node: &Node, _hint: Option<TypeHint>, _registry: &Registry) -> Result<Value> {
        let text = leaf_text(node)?;
        parse_float(text)
            .map(Value::Float)
            .ok_or_else(|| Error::conversion(text, "float", "not a floating-point number"))
    }
}

/// Text, written verbatim. Leading and trailing whitespace is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextConverter;

impl Converter for TextConverter {
    fn type_tag(&self) -> &str {
        tags::TEXT
    }

    fn aliases(&self) -> &[&str] {
        &["str", "string"]
    }

    fn applies_to(&self) -> Vec<TypeKey> {
        vec![ValueKind::Text.into()]
    }

    fn shape(&self) -> NodeShape {
        NodeShape::Leaf
    }

    fn encode(&self, value: &Value, name: &str, _registry: &Registry) -> Result<Node> {
        let text = value.as_str().ok_or_else(|| mismatch(self, value))?;
        Ok(Node::leaf(name, tags::TEXT, text))
    }

    fn decode(&self, node: &Node, _hint: Option<TypeHint>, _registry: &Registry) -> Result<Value> {
        Ok(Value::Text(leaf_text(node)?.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn registry() -> Registry {
        Registry::with_builtins()
    }

    fn decode_leaf(converter: &dyn Converter, text: &str, hint: Option<TypeHint>) -> Result<Value> {
        let node = Node::leaf("v", converter.type_tag(), text);
        converter.decode(&node, hint, &registry())
    }

    #[test]
    fn test_bool_canonical_and_legacy() {
        let registry = registry();
        let node = BoolConverter
            .encode(&Value::Bool(true), "flag", &registry)
            .unwrap();
        assert_eq!(node.text(), Ok("true"));

        for text in ["true", "True", "TRUE", "1", "yes", "on", " true\n"] {
            assert_eq!(
                decode_leaf(&BoolConverter, text, None).unwrap(),
                Value::Bool(true),
                "{text:?}"
            );
        }
        for text in ["false", "False", "0", "no", "off"] {
            assert_eq!(decode_leaf(&BoolConverter, text, None).unwrap(), Value::Bool(false));
        }

        let err = decode_leaf(&BoolConverter, "maybe", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueConversion);
    }

    #[test]
    fn test_int_decode_and_widths() {
        assert_eq!(decode_leaf(&IntConverter, "42", None).unwrap(), Value::Int(42));
        assert_eq!(decode_leaf(&IntConverter, " -7 ", None).unwrap(), Value::Int(-7));
        assert_eq!(decode_leaf(&IntConverter, "+3", None).unwrap(), Value::Int(3));

        let err = decode_leaf(&IntConverter, "300", Some(TypeHint::Int(IntWidth::U8))).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueConversion);
        assert!(err.to_string().contains("out of range for u8"));

        assert_eq!(
            decode_leaf(&IntConverter, "255", Some(TypeHint::Int(IntWidth::U8))).unwrap(),
            Value::Int(255)
        );
        assert_eq!(
            decode_leaf(&IntConverter, "5", Some(TypeHint::BigInt)).unwrap(),
            Value::BigInt(BigInt::from(5))
        );

        let u64_max = u64::MAX.to_string();
        assert_eq!(
            decode_leaf(&IntConverter, &u64_max, Some(TypeHint::Int(IntWidth::U64))).unwrap(),
            Value::BigInt(BigInt::from(u64::MAX))
        );
    }

    #[test]
    fn test_int_rejects_non_integers_and_overflow() {
        for text in ["", "  ", "4.2", "1_000", "0x10", "abc", "-"] {
            let err = decode_leaf(&IntConverter, text, None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ValueConversion, "{text:?}");
        }

        let err = decode_leaf(&IntConverter, "9223372036854775808", None).unwrap_err();
        assert!(err.to_string().contains("out of range for i64"));
    }

    #[test]
    fn test_int_encodes_widened_bool() {
        let node = IntConverter
            .encode(&Value::Bool(true), "flag", &registry())
            .unwrap();
        assert_eq!(node.type_tag(), tags::INT);
        assert_eq!(node.text(), Ok("1"));
    }

    #[test]
    fn test_bigint_preserves_digits() {
        let text = "123456789012345678901234567890";
        let value = decode_leaf(&BigIntConverter, text, None).unwrap();
        assert_eq!(value.as_bigint().map(|b| b.to_string()).as_deref(), Some(text));

        let node = BigIntConverter.encode(&value, "n", &registry()).unwrap();
        assert_eq!(node.text(), Ok(text));

        assert_eq!(
            decode_leaf(&BigIntConverter, "12", Some(TypeHint::Int(IntWidth::I32))).unwrap(),
            Value::Int(12)
        );
        assert!(decode_leaf(&BigIntConverter, text, Some(TypeHint::Int(IntWidth::I64))).is_err());
    }

    #[test]
    fn test_float_text_forms() {
        assert_eq!(format_float(0.1), "0.1");
        assert_eq!(format_float(1.0), "1.0");
        assert_eq!(format_float(-0.0), "-0.0");
        assert_eq!(format_float(f64::NAN), "nan");
        assert_eq!(format_float(f64::INFINITY), "inf");
        assert_eq!(format_float(f64::NEG_INFINITY), "-inf");

        for f in [0.1, 1e300, 5e-324, -2.5, 1.0 / 3.0] {
            assert_eq!(parse_float(&format_float(f)), Some(f));
        }
        assert_eq!(parse_float("NaN").map(f64::is_nan), Some(true));
        assert_eq!(parse_float(" Infinity "), Some(f64::INFINITY));
        assert_eq!(parse_float(""), None);
        assert_eq!(parse_float("1,5"), None);
    }

    #[test]
    fn test_text_keeps_whitespace() {
        assert_eq!(
            decode_leaf(&TextConverter, "  padded \n", None).unwrap(),
            Value::Text("  padded \n".to_string())
        );
        assert_eq!(decode_leaf(&TextConverter, "", None).unwrap(), Value::Text(String::new()));
    }

    #[test]
    fn test_null_ignores_content() {
        assert_eq!(decode_leaf(&NullConverter, "junk", None).unwrap(), Value::Null);
        let node = NullConverter.encode(&Value::Null, "c", &registry()).unwrap();
        assert_eq!(node, Node::leaf("c", "NoneType", ""));
    }

    #[test]
    fn test_scalar_rejects_internal_node() {
        let node = Node::internal("v", tags::INT, Vec::new());
        let err = IntConverter.decode(&node, None, &registry()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueConversion);
    }
}
