//! Named option storage backed by a tree document.
//!
//! An [`OptionStore`] keeps the options of one document in insertion order
//! and reads or writes the whole document through its [`Engine`]. Where the
//! document lives is up to the caller, who supplies readers and writers.
//!
//! ```rust
//! use helios_typetree::{OptionStore, Value};
//!
//! let mut store = OptionStore::default();
//! store.set_option("window_width", 1024);
//! store.set_option("theme", "dark");
//!
//! let mut saved = Vec::new();
//! store.save(&mut saved)?;
//!
//! let mut reloaded = OptionStore::default();
//! reloaded.load(saved.as_slice())?;
//! assert_eq!(reloaded.get_option("window_width")?, &Value::Int(1024));
//! # Ok::<(), helios_typetree::Error>(())
//! ```

use std::io::{BufRead, Write};

use tracing::debug;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::value::{Map, Value};

/// Ordered name → value options, persisted as one tree document.
#[derive(Debug, Clone, Default)]
pub struct OptionStore {
    engine: Engine,
    options: Map,
}

impl OptionStore {
    /// Creates an empty store that reads and writes through `engine`.
    pub fn new(engine: Engine) -> Self {
        Self {
            engine,
            options: Map::new(),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Returns the text of a document holding no options.
    pub fn initial_document(&self) -> Result<String> {
        self.engine.encode(&Map::new())
    }

    /// Reads a document and merges its options into the store.
    ///
    /// Options present in the document replace stored options of the same
    /// name; other stored options are kept. Returns the number of options
    /// read. On error the store is left unchanged.
    pub fn load<R: BufRead>(&mut self, reader: R) -> Result<usize> {
        let loaded = self.engine.decode_reader(reader)?;
        Ok(self.merge(loaded))
    }

    /// Like [`OptionStore::load`], from a string.
    pub fn load_str(&mut self, text: &str) -> Result<usize> {
        let loaded = self.engine.decode(text)?;
        Ok(self.merge(loaded))
    }

    fn merge(&mut self, loaded: Map) -> usize {
        let count = loaded.len();
        self.options.extend(loaded);
        debug!(loaded = count, total = self.options.len(), "loaded options");
        count
    }

    /// Writes every option as one document.
    pub fn save<W: Write>(&self, writer: W) -> Result<()> {
        self.engine.encode_to_writer(&self.options, writer)
    }

    /// Renders every option as one document.
    pub fn save_to_string(&self) -> Result<String> {
        self.engine.encode(&self.options)
    }

    /// Returns the value stored under `name`.
    pub fn get_option(&self, name: &str) -> Result<&Value> {
        self.options.get(name).ok_or_else(|| Error::MissingOption {
            name: name.to_string(),
        })
    }

    /// Returns the value stored under `name`, or `default` if there is none.
    pub fn get_option_or<'a>(&'a self, name: &str, default: &'a Value) -> &'a Value {
        self.options.get(name).unwrap_or(default)
    }

    /// Stores `value` under `name`, returning the value it replaced.
    ///
    /// A new name is appended; an existing name keeps its position.
    pub fn set_option(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.options.insert(name.into(), value.into())
    }

    /// Removes the option stored under `name`, keeping the order of the rest.
    pub fn remove_option(&mut self, name: &str) -> Option<Value> {
        self.options.shift_remove(name)
    }

    /// Returns the option names in insertion order.
    pub fn options(&self) -> impl Iterator<Item = &str> {
        self.options.keys().map(String::as_str)
    }

    /// Removes every option.
    pub fn reset_all(&mut self) {
        self.options.clear();
    }

    /// Returns all options as a mapping.
    pub fn as_map(&self) -> &Map {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
