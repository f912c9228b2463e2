use std::any::Any;
use std::sync::Arc;
use std::thread;

use helios_typetree::converter::{
    ExtensionConverter, IntConverter, MappingConverter, SequenceConverter, TextConverter, tags,
};
use helios_typetree::{
    Converter, CustomKey, CustomValue, Engine, Error, ErrorKind, HookError, Map, Node, NodeShape,
    ReducesToSerializable, Registry, RegistryError, Result, TreeConfig, TreePath, TypeHint,
    TypeKey, Value,
};

#[derive(Debug, Clone, PartialEq)]
struct Color {
    r: u8,
    g: u8,
    b: u8,
}

impl CustomValue for Color {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn CustomValue) -> bool {
        other.as_any().downcast_ref::<Self>() == Some(self)
    }
}

/// Stores colors as `#rrggbb`.
#[derive(Debug)]
struct ColorConverter;

impl Converter for ColorConverter {
    fn type_tag(&self) -> &str {
        "color"
    }

    fn applies_to(&self) -> Vec<TypeKey> {
        vec![TypeKey::of::<Color>()]
    }

    fn shape(&self) -> NodeShape {
        NodeShape::Leaf
    }

    fn encode(&self, value: &Value, name: &str, _registry: &Registry) -> Result<Node> {
        let color = value
            .downcast_custom::<Color>()
            .ok_or_else(|| Error::UnsupportedType {
                type_name: value.type_name().to_string(),
                path: TreePath::new(),
            })?;
        let text = format!("#{:02x}{:02x}{:02x}", color.r, color.g, color.b);
        Ok(Node::leaf(name, "color", text))
    }

    fn decode(&self, node: &Node, _hint: Option<TypeHint>, _registry: &Registry) -> Result<Value> {
        let text = node.text()?;
        let invalid = |reason: &str| Error::ValueConversion {
            text: text.to_string(),
            target: "color",
            reason: reason.to_string(),
            path: TreePath::new(),
        };
        let hex = text.strip_prefix('#').ok_or_else(|| invalid("missing '#'"))?;
        if hex.len() != 6 {
            return Err(invalid("expected six hex digits"));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid("not a hex digit"))
        };
        Ok(Value::custom(Color {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
        }))
    }
}

/// Reduces itself to an `(r, g, b)` tuple.
#[derive(Debug, Clone, PartialEq)]
struct RgbTuple(u8, u8, u8);

impl CustomValue for RgbTuple {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn CustomValue) -> bool {
        other.as_any().downcast_ref::<Self>() == Some(self)
    }

    fn as_reducible(&self) -> Option<&dyn ReducesToSerializable> {
        Some(self)
    }
}

impl ReducesToSerializable for RgbTuple {
    fn reduce(&self) -> std::result::Result<Value, HookError> {
        Ok(Value::Tuple(vec![
            Value::from(self.0),
            Value::from(self.1),
            Value::from(self.2),
        ]))
    }
}

/// A hook that always fails.
#[derive(Debug, PartialEq)]
struct Broken;

impl CustomValue for Broken {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn CustomValue) -> bool {
        other.as_any().is::<Self>()
    }

    fn as_reducible(&self) -> Option<&dyn ReducesToSerializable> {
        Some(self)
    }
}

impl ReducesToSerializable for Broken {
    fn reduce(&self) -> std::result::Result<Value, HookError> {
        Err("sensor offline".into())
    }
}

/// No converter and no hook.
#[derive(Debug, PartialEq)]
struct Opaque;

impl CustomValue for Opaque {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn CustomValue) -> bool {
        other.as_any().is::<Self>()
    }
}

// Marker types standing in for declared ancestors
struct Measurement;
struct Temperature;

#[derive(Debug, PartialEq)]
struct Celsius(i64);

impl CustomValue for Celsius {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn CustomValue) -> bool {
        other.as_any().downcast_ref::<Self>() == Some(self)
    }

    fn ancestors(&self) -> Vec<CustomKey> {
        vec![CustomKey::of::<Temperature>(), CustomKey::of::<Measurement>()]
    }
}

/// Claims one ancestor type; encodes anything as a text leaf tagged with its own tag.
#[derive(Debug)]
struct AncestorConverter {
    tag: &'static str,
    claims: TypeKey,
    lazy: bool,
}

impl Converter for AncestorConverter {
    fn type_tag(&self) -> &str {
        self.tag
    }

    fn applies_to(&self) -> Vec<TypeKey> {
        vec![self.claims]
    }

    fn promote_lazy(&self) -> bool {
        self.lazy
    }

    fn shape(&self) -> NodeShape {
        NodeShape::Leaf
    }

    fn encode(&self, value: &Value, name: &str, _registry: &Registry) -> Result<Node> {
        Ok(Node::leaf(name, self.tag, format!("{value:?}")))
    }

    fn decode(&self, node: &Node, _hint: Option<TypeHint>, _registry: &Registry) -> Result<Value> {
        Ok(Value::from(node.text()?))
    }
}

struct Parent;

/// Declares a `Parent` ancestor and also reduces itself to text.
#[derive(Debug, PartialEq)]
struct Child;

impl CustomValue for Child {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn CustomValue) -> bool {
        other.as_any().is::<Self>()
    }

    fn ancestors(&self) -> Vec<CustomKey> {
        vec![CustomKey::of::<Parent>()]
    }

    fn as_reducible(&self) -> Option<&dyn ReducesToSerializable> {
        Some(self)
    }
}

impl ReducesToSerializable for Child {
    fn reduce(&self) -> std::result::Result<Value, HookError> {
        Ok(Value::from("reduced"))
    }
}

fn parent_converter() -> AncestorConverter {
    AncestorConverter {
        tag: "parent",
        claims: TypeKey::of::<Parent>(),
        lazy: false,
    }
}

fn single(name: &str, value: Value) -> Map {
    let mut map = Map::new();
    map.insert(name.to_string(), value);
    map
}

#[test]
fn test_custom_converter_registered_before_first_encode() -> Result<()> {
    let mut registry = Registry::new();
    registry.register(ColorConverter)?;
    let engine = Engine::new(Arc::new(registry), TreeConfig::default());

    let teal = Color { r: 0, g: 128, b: 128 };
    let root = single("background", Value::custom(teal.clone()));

    let xml = engine.encode(&root)?;
    assert!(xml.contains("<background type=\"color\">#008080</background>"));

    let decoded = engine.decode(&xml)?;
    assert_eq!(decoded["background"].downcast_custom::<Color>(), Some(&teal));
    assert_eq!(decoded, root);
    Ok(())
}

#[test]
fn test_custom_decode_failure_carries_path() -> Result<()> {
    let mut registry = Registry::new();
    registry.register(ColorConverter)?;
    let engine = Engine::new(Arc::new(registry), TreeConfig::default());

    let err = engine
        .decode(r#"<configuration><theme type="dict"><fg type="color">teal</fg></theme></configuration>"#)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValueConversion);
    assert_eq!(
        err.path().map(ToString::to_string).as_deref(),
        Some("configuration/theme/fg")
    );
    Ok(())
}

#[test]
fn test_hook_reduces_to_tuple() -> Result<()> {
    let engine = Engine::default();
    let root = single("accent", Value::custom(RgbTuple(255, 128, 0)));

    let xml = engine.encode(&root)?;
    assert!(xml.contains("<accent type=\"tuple\">"));

    let decoded = engine.decode(&xml)?;
    assert_eq!(
        decoded["accent"],
        Value::Tuple(vec![Value::Int(255), Value::Int(128), Value::Int(0)])
    );
    assert!(decoded["accent"].downcast_custom::<RgbTuple>().is_none());
    Ok(())
}

#[test]
fn test_hook_failure_is_distinct() {
    let engine = Engine::default();
    let err = engine
        .encode(&single("sensor", Value::custom(Broken)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Hook);
    assert_eq!(
        err.path().map(ToString::to_string).as_deref(),
        Some("configuration/sensor")
    );
    let source = std::error::Error::source(&err).map(ToString::to_string);
    assert_eq!(source.as_deref(), Some("sensor offline"));
}

#[test]
fn test_no_converter_is_unsupported() {
    let engine = Engine::default();
    let err = engine
        .encode(&single("x", Value::from(vec![Value::custom(Opaque)])))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    assert!(err.to_string().contains("Opaque"), "{err}");
    assert_eq!(
        err.path().map(ToString::to_string).as_deref(),
        Some("configuration/x/item[0]")
    );
}

#[test]
fn test_nearest_ancestor_wins_regardless_of_registration_order() -> Result<()> {
    let near = || AncestorConverter {
        tag: "temperature",
        claims: TypeKey::of::<Temperature>(),
        lazy: false,
    };
    let far = || AncestorConverter {
        tag: "measurement",
        claims: TypeKey::of::<Measurement>(),
        lazy: false,
    };

    let mut forward = Registry::new();
    forward.register(near())?;
    forward.register(far())?;

    let mut reversed = Registry::new();
    reversed.register(far())?;
    reversed.register(near())?;

    let value = Value::custom(Celsius(21));
    for registry in [&forward, &reversed] {
        for _ in 0..3 {
            let node = registry.encode_value(&value, "t")?;
            assert_eq!(node.type_tag(), "temperature");
        }
    }
    Ok(())
}

#[test]
fn test_lazy_ancestor_only_when_nothing_else_matches() -> Result<()> {
    let mut registry = Registry::empty();
    registry.register(AncestorConverter {
        tag: "lazy-temperature",
        claims: TypeKey::of::<Temperature>(),
        lazy: true,
    })?;
    registry.register(AncestorConverter {
        tag: "measurement",
        claims: TypeKey::of::<Measurement>(),
        lazy: false,
    })?;
    let node = registry.encode_value(&Value::custom(Celsius(0)), "t")?;
    assert_eq!(node.type_tag(), "measurement");

    let mut registry = Registry::empty();
    registry.register(AncestorConverter {
        tag: "lazy-temperature",
        claims: TypeKey::of::<Temperature>(),
        lazy: true,
    })?;
    registry.register(ExtensionConverter)?;
    let node = registry.encode_value(&Value::custom(Celsius(0)), "t")?;
    assert_eq!(node.type_tag(), "lazy-temperature");
    Ok(())
}

#[test]
fn test_hook_beats_ancestor_converter() -> Result<()> {
    let mut registry = Registry::new();
    registry.register(parent_converter())?;

    let node = registry.encode_value(&Value::custom(Child), "c")?;
    assert_eq!(node.type_tag(), tags::TEXT);
    assert_eq!(node.text(), Ok("reduced"));
    Ok(())
}

#[test]
fn test_hook_runs_without_object_converter() -> Result<()> {
    let mut registry = Registry::empty();
    registry.register(TextConverter)?;
    registry.register(parent_converter())?;

    let node = registry.encode_value(&Value::custom(Child), "c")?;
    assert_eq!(node.type_tag(), tags::TEXT);
    assert_eq!(node.text(), Ok("reduced"));

    // Without a converter for the substitute the hook result is unsupported
    let mut registry = Registry::empty();
    registry.register(parent_converter())?;
    let err = registry.encode_value(&Value::custom(Child), "c").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    Ok(())
}

#[test]
fn test_exact_converter_beats_hook() -> Result<()> {
    let mut registry = Registry::new();
    registry.register(parent_converter())?;
    registry.register(AncestorConverter {
        tag: "child",
        claims: TypeKey::of::<Child>(),
        lazy: false,
    })?;

    let node = registry.encode_value(&Value::custom(Child), "c")?;
    assert_eq!(node.type_tag(), "child");
    Ok(())
}

#[test]
fn test_widening_without_specific_converters() -> Result<()> {
    let mut registry = Registry::empty();
    registry.register(IntConverter)?;
    registry.register(TextConverter)?;
    registry.register(SequenceConverter::list())?;
    registry.register(MappingConverter)?;
    let engine = Engine::new(Arc::new(registry), TreeConfig::default());

    let mut root = Map::new();
    root.insert("flag".to_string(), Value::Bool(true));
    root.insert("pair".to_string(), Value::Tuple(vec![Value::from("a"), Value::from(2)]));

    let xml = engine.encode(&root)?;
    assert!(xml.contains("<flag type=\"int\">1</flag>"));
    assert!(xml.contains("<pair type=\"list\">"));

    let decoded = engine.decode(&xml)?;
    assert_eq!(decoded["flag"], Value::Int(1));
    assert_eq!(decoded["pair"], Value::List(vec![Value::from("a"), Value::from(2)]));
    Ok(())
}

#[test]
fn test_registration_after_first_lookup_is_rejected() -> Result<()> {
    let mut registry = Registry::new();
    registry.encode_value(&Value::from(1), "n")?;

    let err = registry.register(ColorConverter).unwrap_err();
    assert_eq!(
        err,
        RegistryError::Sealed {
            tag: "color".to_string()
        }
    );
    Ok(())
}

#[test]
fn test_duplicate_claims_are_rejected() {
    let mut registry = Registry::new();
    let err = registry.register(IntConverter).unwrap_err();
    assert_eq!(
        err,
        RegistryError::DuplicateTag {
            tag: tags::INT.to_string()
        }
    );

    let err = registry
        .register(AncestorConverter {
            tag: "integer-v2",
            claims: TypeKey::Builtin(helios_typetree::ValueKind::Int),
            lazy: false,
        })
        .unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateType { ref existing, .. } if existing == "int"));

    let err = registry
        .register(AncestorConverter {
            tag: "string",
            claims: TypeKey::of::<Measurement>(),
            lazy: false,
        })
        .unwrap_err();
    assert_eq!(
        err,
        RegistryError::DuplicateTag {
            tag: "string".to_string()
        }
    );
}

#[test]
fn test_shared_registry_across_threads() -> Result<()> {
    let mut registry = Registry::new();
    registry.register(ColorConverter)?;
    let engine = Engine::new(Arc::new(registry), TreeConfig::compact());

    let workers: Vec<_> = (0u8..8)
        .map(|i| {
            let engine = engine.clone();
            thread::spawn(move || -> Result<()> {
                for round in 0..50u8 {
                    let mut root = Map::new();
                    root.insert(
                        "color".to_string(),
                        Value::custom(Color { r: i, g: round, b: 7 }),
                    );
                    root.insert("n".to_string(), Value::from(i64::from(i) * 1000 + i64::from(round)));
                    root.insert("tags".to_string(), Value::from(vec!["a", "b"]));
                    let xml = engine.encode(&root)?;
                    assert_eq!(engine.decode(&xml)?, root);
                }
                Ok(())
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker panicked")?;
    }
    Ok(())
}
