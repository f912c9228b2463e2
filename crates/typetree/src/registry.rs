//! Type Registry.
//!
//! The registry owns the converter set and answers two questions: which
//! converter encodes a given runtime value, and which converter decodes a
//! given persisted type tag. Encode-side resolution walks the value's
//! declared ancestry and is memoized per runtime type.
//!
//! A registry is filled during a registration phase and then shared,
//! usually behind an `Arc`. The first lookup seals it: later registration
//! attempts fail with [`RegistryError::Sealed`], so a memoized resolution
//! can never be invalidated by a converter added afterwards.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::converter::{Converter, ExtensionConverter, NullConverter, builtin_converters};
use crate::error::{Error, RegistryError, Result};
use crate::node::{Node, NodeShape};
use crate::value::{TypeHint, TypeKey, Value, ValueKind};
use crate::xml::ShapeHint;

/// Registry of converters, indexed by claimed runtime type and by tag.
pub struct Registry {
    /// Converters in registration order.
    converters: Vec<Arc<dyn Converter>>,

    /// Exact runtime type claims, as indexes into `converters`.
    by_type: HashMap<TypeKey, usize>,

    /// Decodable tags and aliases, as indexes into `converters`.
    by_tag: HashMap<String, usize>,

    /// Memoized encode-side resolutions; `None` records an unsupported type.
    resolved: RwLock<HashMap<TypeKey, Option<Arc<dyn Converter>>>>,

    /// Set by the first lookup.
    sealed: AtomicBool,

    /// Unconditional fallback for null values.
    null: Arc<dyn Converter>,

    /// Hook runner used when no converter claims `Object`.
    extension: Arc<dyn Converter>,
}

impl Registry {
    /// Creates a registry holding the built-in converters.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for converter in builtin_converters() {
            registry.insert(converter);
        }
        registry
    }

    /// Alias of [`Registry::new`], reads better next to [`Registry::empty`].
    pub fn with_builtins() -> Self {
        Self::new()
    }

    /// Creates a registry with no converters at all.
    ///
    /// Null values still encode through the built-in null converter, and
    /// custom values with an extension hook still reach their hook.
    pub fn empty() -> Self {
        Self {
            converters: Vec::new(),
            by_type: HashMap::new(),
            by_tag: HashMap::new(),
            resolved: RwLock::new(HashMap::new()),
            sealed: AtomicBool::new(false),
            null: Arc::new(NullConverter),
            extension: Arc::new(ExtensionConverter),
        }
    }

    /// Returns the number of registered converters.
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Returns true if no converter is registered.
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Returns true once a lookup has happened.
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// Returns all decodable tags and aliases.
    pub fn tags(&self) -> Vec<&str> {
        self.by_tag.keys().map(String::as_str).collect()
    }

    /// Registers a converter.
    pub fn register(
        &mut self,
        converter: impl Converter + 'static,
    ) -> std::result::Result<(), RegistryError> {
        self.register_arc(Arc::new(converter))
    }

    /// Registers a shared converter.
    pub fn register_arc(
        &mut self,
        converter: Arc<dyn Converter>,
    ) -> std::result::Result<(), RegistryError> {
        let tag = converter.type_tag().to_string();
        if *self.sealed.get_mut() {
            return Err(RegistryError::Sealed { tag });
        }

        if converter.decodable() {
            for claimed in std::iter::once(tag.as_str()).chain(converter.aliases().iter().copied())
            {
                if self.by_tag.contains_key(claimed) {
                    return Err(RegistryError::DuplicateTag {
                        tag: claimed.to_string(),
                    });
                }
            }
        }

        for key in converter.applies_to() {
            if let Some(&existing) = self.by_type.get(&key) {
                return Err(RegistryError::DuplicateType {
                    type_name: key.name().to_string(),
                    existing: self.converters[existing].type_tag().to_string(),
                });
            }
        }

        self.insert(converter);
        trace!(tag = %tag, "registered converter");
        Ok(())
    }

    /// Internal registration without duplicate checking.
    fn insert(&mut self, converter: Arc<dyn Converter>) {
        let index = self.converters.len();
        if converter.decodable() {
            self.by_tag.insert(converter.type_tag().to_string(), index);
            for alias in converter.aliases() {
                self.by_tag.insert((*alias).to_string(), index);
            }
        }
        for key in converter.applies_to() {
            self.by_type.insert(key, index);
        }
        self.converters.push(converter);
    }

    fn seal(&self) {
        if !self.sealed.load(Ordering::Relaxed) {
            self.sealed.store(true, Ordering::Release);
        }
    }

    /// Finds the converter that encodes `value`.
    ///
    /// An exact claim on the value's type wins. A custom value with an
    /// extension hook goes to the converter claiming `Object`, or to the
    /// built-in hook runner if nothing claims it. Otherwise the
    /// value's ancestry is walked nearest first; the first non-lazy claim
    /// wins, and a lazy claim is taken only if the walk found nothing else.
    /// Null always falls back to the built-in null converter.
    pub fn resolve_for_encode(&self, value: &Value) -> Result<Arc<dyn Converter>> {
        self.seal();
        let key = value.type_key();

        if let Some(cached) = self.resolved.read().get(&key) {
            return cached
                .clone()
                .ok_or_else(|| Error::unsupported(value.type_name()));
        }

        let resolved = self.resolve_uncached(value);
        trace!(
            type_name = key.name(),
            converter = resolved.as_ref().map(|c| c.type_tag()).unwrap_or("<none>"),
            "resolved converter"
        );
        // Racing threads compute the same answer; the first insert is kept
        let resolved = self
            .resolved
            .write()
            .entry(key)
            .or_insert(resolved)
            .clone();
        resolved.ok_or_else(|| Error::unsupported(value.type_name()))
    }

    fn resolve_uncached(&self, value: &Value) -> Option<Arc<dyn Converter>> {
        if let Some(&index) = self.by_type.get(&value.type_key()) {
            return Some(Arc::clone(&self.converters[index]));
        }

        let has_hook = value
            .as_custom()
            .is_some_and(|custom| custom.as_reducible().is_some());
        if has_hook {
            let converter = match self.by_type.get(&TypeKey::Builtin(ValueKind::Object)) {
                Some(&index) => &self.converters[index],
                None => &self.extension,
            };
            return Some(Arc::clone(converter));
        }

        let mut lazy = None;
        for ancestor in value.ancestry() {
            if let Some(&index) = self.by_type.get(&ancestor) {
                let converter = &self.converters[index];
                if !converter.promote_lazy() {
                    return Some(Arc::clone(converter));
                }
                lazy.get_or_insert_with(|| Arc::clone(converter));
            }
        }

        if value.is_null() {
            return Some(Arc::clone(&self.null));
        }
        lazy
    }

    /// Finds the converter that decodes nodes carrying `type_tag`.
    pub fn resolve_for_decode(&self, type_tag: &str) -> Result<Arc<dyn Converter>> {
        self.seal();
        let index = *self
            .by_tag
            .get(type_tag)
            .ok_or_else(|| Error::unknown_tag(type_tag))?;
        let converter = &self.converters[index];
        if converter.type_tag() != type_tag {
            debug!(
                alias = type_tag,
                tag = converter.type_tag(),
                "decoding legacy type tag alias"
            );
        }
        Ok(Arc::clone(converter))
    }

    /// Encodes `value` as an element named `name`.
    pub fn encode_value(&self, value: &Value, name: &str) -> Result<Node> {
        self.resolve_for_encode(value)?.encode(value, name, self)
    }

    /// Decodes `node` through the converter registered for its tag.
    pub fn decode_node(&self, node: &Node, hint: Option<TypeHint>) -> Result<Value> {
        self.resolve_for_decode(node.type_tag())?
            .decode(node, hint, self)
    }
}

impl ShapeHint for Registry {
    fn shape_of(&self, type_tag: &str) -> Option<NodeShape> {
        self.by_tag
            .get(type_tag)
            .map(|&index| self.converters[index].shape())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field(
                "converters",
                &self
                    .converters
                    .iter()
                    .map(|c| c.type_tag())
                    .collect::<Vec<_>>(),
            )
            .field("resolved_count", &self.resolved.read().len())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}
