//! Dynamic in-memory values exchanged with the configuration layer.
//!
//! [`Value`] is a closed set of built-in categories plus one extension
//! variant, [`Value::Custom`], for application types. Every value has a
//! runtime type identity ([`TypeKey`]) and an ancestry the registry walks
//! when no converter claims the exact type:
//!
//! | Kind | Declared parent |
//! |------|-----------------|
//! | `Bool` | `Int` |
//! | `Int` | `BigInt` |
//! | `Tuple` | `List` |
//! | custom types | their declared ancestors, in order |
//! | everything else | `Object` |
//!
//! `Object` is the root of every ancestry and is claimed only by the lazy
//! extension converter.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use indexmap::IndexMap;
use num_bigint::BigInt;

use crate::error::{Error, HookError, Result};

/// Ordered mapping of text keys to values; the unit exchanged at the root.
pub type Map = IndexMap<String, Value>;

/// Built-in runtime type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    /// Fixed-width signed integer (`i64`).
    Int,
    /// Arbitrary-precision integer.
    BigInt,
    Float,
    Text,
    List,
    Tuple,
    Map,
    /// Root of every ancestry. No value has this kind directly.
    Object,
}

impl ValueKind {
    /// Returns the diagnostic name of this kind.
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::BigInt => "bigint",
            ValueKind::Float => "float",
            ValueKind::Text => "text",
            ValueKind::List => "list",
            ValueKind::Tuple => "tuple",
            ValueKind::Map => "map",
            ValueKind::Object => "object",
        }
    }

    /// Returns the declared parent kind, or `None` for `Object`.
    pub fn parent(self) -> Option<ValueKind> {
        match self {
            ValueKind::Object => None,
            ValueKind::Bool => Some(ValueKind::Int),
            ValueKind::Int => Some(ValueKind::BigInt),
            ValueKind::Tuple => Some(ValueKind::List),
            _ => Some(ValueKind::Object),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity of an application-defined value type.
///
/// Compares and hashes by [`TypeId`]; the name is kept for diagnostics.
#[derive(Clone, Copy)]
pub struct CustomKey {
    id: TypeId,
    name: &'static str,
}

impl CustomKey {
    /// Returns the key of `T`.
    pub fn of<T: ?Sized + Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for CustomKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CustomKey {}

impl Hash for CustomKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for CustomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CustomKey").field(&self.name).finish()
    }
}

/// Runtime type identity used for converter lookup and memoization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Builtin(ValueKind),
    Custom(CustomKey),
}

impl TypeKey {
    /// Returns the key of the application type `T`.
    pub fn of<T: ?Sized + Any>() -> Self {
        TypeKey::Custom(CustomKey::of::<T>())
    }

    pub fn name(&self) -> &'static str {
        match self {
            TypeKey::Builtin(kind) => kind.name(),
            TypeKey::Custom(key) => key.name(),
        }
    }
}

impl From<ValueKind> for TypeKey {
    fn from(kind: ValueKind) -> Self {
        TypeKey::Builtin(kind)
    }
}

impl From<CustomKey> for TypeKey {
    fn from(key: CustomKey) -> Self {
        TypeKey::Custom(key)
    }
}

/// Capability of a value to substitute itself with a serializable value.
///
/// The substitute is encoded in the original's place. Decoding yields the
/// substitute's category; the original type only comes back if a dedicated
/// converter is registered for it.
pub trait ReducesToSerializable {
    fn reduce(&self) -> std::result::Result<Value, HookError>;
}

/// An application-defined value carried by [`Value::Custom`].
///
/// Implementors supply `as_any` and `dyn_eq`; identity, name, and ancestry
/// have defaults.
///
/// ```
/// use std::any::Any;
/// use helios_typetree::{CustomValue, Value};
///
/// #[derive(Debug, PartialEq)]
/// struct Port(u16);
///
/// impl CustomValue for Port {
///     fn as_any(&self) -> &dyn Any {
///         self
///     }
///
///     fn dyn_eq(&self, other: &dyn CustomValue) -> bool {
///         other.as_any().downcast_ref::<Self>() == Some(self)
///     }
/// }
///
/// let value = Value::custom(Port(8080));
/// assert_eq!(value.downcast_custom::<Port>(), Some(&Port(8080)));
/// ```
pub trait CustomValue: Any + fmt::Debug + Send + Sync {
    fn as_any(&self) -> &dyn Any;

    /// Equality against another custom value of any type.
    fn dyn_eq(&self, other: &dyn CustomValue) -> bool;

    fn custom_key(&self) -> CustomKey {
        CustomKey::of::<Self>()
    }

    /// Declared ancestor types, nearest first.
    ///
    /// Must be the same for every value of the implementing type, since
    /// resolution results are memoized per type.
    fn ancestors(&self) -> Vec<CustomKey> {
        Vec::new()
    }

    /// Returns the extension hook if this type has one.
    ///
    /// Must be consistently `Some` or `None` for every value of the type.
    fn as_reducible(&self) -> Option<&dyn ReducesToSerializable> {
        None
    }
}

/// Width a decoded fixed-width integer must fit into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl IntWidth {
    /// Inclusive bounds of this width.
    pub fn bounds(self) -> (i128, i128) {
        match self {
            IntWidth::I8 => (i8::MIN.into(), i8::MAX.into()),
            IntWidth::I16 => (i16::MIN.into(), i16::MAX.into()),
            IntWidth::I32 => (i32::MIN.into(), i32::MAX.into()),
            IntWidth::I64 => (i64::MIN.into(), i64::MAX.into()),
            IntWidth::U8 => (0, u8::MAX.into()),
            IntWidth::U16 => (0, u16::MAX.into()),
            IntWidth::U32 => (0, u32::MAX.into()),
            IntWidth::U64 => (0, u64::MAX.into()),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            IntWidth::I8 => "i8",
            IntWidth::I16 => "i16",
            IntWidth::I32 => "i32",
            IntWidth::I64 => "i64",
            IntWidth::U8 => "u8",
            IntWidth::U16 => "u16",
            IntWidth::U32 => "u32",
            IntWidth::U64 => "u64",
        }
    }

    pub fn contains(self, value: i128) -> bool {
        let (min, max) = self.bounds();
        (min..=max).contains(&value)
    }
}

/// Target-type hint passed to a converter's decode step.
///
/// Hints narrow a decode within the node's own category; a hint that does
/// not apply to the node's category is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeHint {
    /// Decode an integer as fixed-width, failing on overflow.
    Int(IntWidth),
    /// Decode an integer as arbitrary-precision.
    BigInt,
    /// Rebuild a sequence as a list.
    List,
    /// Rebuild a sequence as a tuple.
    Tuple,
}

/// A dynamic value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    BigInt(BigInt),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Map(Map),
    Custom(Arc<dyn CustomValue>),
}

impl Value {
    /// Builds an integer, choosing `Int` inside the `i64` range and `BigInt`
    /// outside it.
    pub fn integer(value: impl Into<BigInt>) -> Self {
        let value = value.into();
        match i64::try_from(&value) {
            Ok(small) => Value::Int(small),
            Err(_) => Value::BigInt(value),
        }
    }

    /// Wraps an application value.
    pub fn custom<T: CustomValue>(value: T) -> Self {
        Value::Custom(Arc::new(value))
    }

    /// Returns the built-in kind, or `None` for custom values.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => Some(ValueKind::Null),
            Value::Bool(_) => Some(ValueKind::Bool),
            Value::Int(_) => Some(ValueKind::Int),
            Value::BigInt(_) => Some(ValueKind::BigInt),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Text(_) => Some(ValueKind::Text),
            Value::List(_) => Some(ValueKind::List),
            Value::Tuple(_) => Some(ValueKind::Tuple),
            Value::Map(_) => Some(ValueKind::Map),
            Value::Custom(_) => None,
        }
    }

    /// Returns the runtime type identity.
    pub fn type_key(&self) -> TypeKey {
        match self {
            Value::Custom(custom) => TypeKey::Custom(custom.custom_key()),
            other => match other.kind() {
                Some(kind) => TypeKey::Builtin(kind),
                None => TypeKey::Builtin(ValueKind::Object),
            },
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_key().name()
    }

    /// Returns the ancestors of this value's type in resolution order,
    /// nearest first, always ending with `Object`.
    pub fn ancestry(&self) -> Vec<TypeKey> {
        let mut chain = Vec::new();
        match self {
            Value::Custom(custom) => {
                for key in custom.ancestors() {
                    let key = TypeKey::Custom(key);
                    if !chain.contains(&key) {
                        chain.push(key);
                    }
                }
                chain.push(TypeKey::Builtin(ValueKind::Object));
            }
            other => {
                let mut kind = other.kind().and_then(ValueKind::parent);
                while let Some(current) = kind {
                    chain.push(TypeKey::Builtin(current));
                    kind = current.parent();
                }
            }
        }
        chain
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as `i64`, widening booleans to 0/1.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(i64::from(*b)),
            Value::BigInt(big) => i64::try_from(big).ok(),
            _ => None,
        }
    }

    /// Returns the value as an arbitrary-precision integer, widening
    /// fixed-width integers and booleans.
    pub fn as_bigint(&self) -> Option<BigInt> {
        match self {
            Value::BigInt(big) => Some(big.clone()),
            Value::Int(i) => Some(BigInt::from(*i)),
            Value::Bool(b) => Some(BigInt::from(u8::from(*b))),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements of a list or tuple.
    pub fn as_seq(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_custom(&self) -> Option<&dyn CustomValue> {
        match self {
            Value::Custom(custom) => Some(custom.as_ref()),
            _ => None,
        }
    }

    /// Downcasts a custom value to its concrete type.
    pub fn downcast_custom<T: CustomValue>(&self) -> Option<&T> {
        self.as_custom()
            .and_then(|custom| custom.as_any().downcast_ref::<T>())
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::BigInt(a), Value::BigInt(b)) => a == b,
            // Bitwise, so the sign of zero counts; every NaN is written as one token
            (Value::Float(a), Value::Float(b)) => {
                a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
            }
            (Value::Text(a), Value::Text(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Custom(a), Value::Custom(b)) => a.dyn_eq(b.as_ref()),
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! impl_from_small_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Int(i64::from(value))
                }
            }
        )*
    };
}

impl_from_small_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_from_wide_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::integer(value)
                }
            }
        )*
    };
}

impl_from_wide_int!(u64, i128, u128, usize);

impl From<BigInt> for Value {
    fn from(value: BigInt) -> Self {
        Value::BigInt(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::List(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Map(value)
    }
}

fn type_mismatch(value: &Value, target: &'static str) -> Error {
    Error::conversion(
        format!("{value:?}"),
        target,
        format!("value is of type '{}'", value.type_name()),
    )
}

impl TryFrom<&Value> for bool {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        value.as_bool().ok_or_else(|| type_mismatch(value, "bool"))
    }
}

impl TryFrom<&Value> for f64 {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        value.as_f64().ok_or_else(|| type_mismatch(value, "f64"))
    }
}

impl TryFrom<&Value> for String {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| type_mismatch(value, "String"))
    }
}

impl TryFrom<&Value> for BigInt {
    type Error = Error;

    fn try_from(value: &Value) -> Result<Self> {
        match value {
            Value::Int(_) | Value::BigInt(_) => value
                .as_bigint()
                .ok_or_else(|| type_mismatch(value, "BigInt")),
            _ => Err(type_mismatch(value, "BigInt")),
        }
    }
}

macro_rules! impl_try_into_int {
    ($($ty:ty),*) => {
        $(
            impl TryFrom<&Value> for $ty {
                type Error = Error;

                fn try_from(value: &Value) -> Result<Self> {
                    let target = stringify!($ty);
                    match value {
                        Value::Int(i) => <$ty>::try_from(*i)
                            .map_err(|e| Error::conversion(i.to_string(), target, e)),
                        Value::BigInt(big) => <$ty>::try_from(big)
                            .map_err(|e| Error::conversion(big.to_string(), target, e)),
                        _ => Err(type_mismatch(value, target)),
                    }
                }
            }
        )*
    };
}

impl_try_into_int!(i8, i16, i32, i64, u8, u16, u32, u64);
