//! Error types for tree serialization and deserialization.
//!
//! Failures fall into a small number of categories that callers are expected
//! to branch on (see [`ErrorKind`]): a value with no converter, a persisted
//! type tag with no converter, unparsable tree text, and text that does not
//! convert into its tagged type. Extension hook failures and registration
//! misuse are reported separately so they are never confused with those four.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::fmt;

use thiserror::Error;

use crate::node::ShapeError;

/// Boxed error returned by an extension hook.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// Location of a node inside a tree, as element names from the root.
///
/// Sequence items are recorded as `item[i]` so repeated positional markers
/// stay distinguishable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreePath(Vec<String>);

impl TreePath {
    /// Creates an empty path (the location is the root itself or unknown).
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Returns the path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns true if no segment has been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn prepend(&mut self, segment: impl Into<String>) {
        self.0.insert(0, segment.into());
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.0.join("/"))
    }
}

impl<S: Into<String>> FromIterator<S> for TreePath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Errors raised while registering converters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two converters claim the same persisted type tag (or alias).
    #[error("type tag '{tag}' is already registered")]
    DuplicateTag { tag: String },

    /// Two converters claim the same runtime type exactly.
    #[error("type '{type_name}' is already claimed by converter '{existing}'")]
    DuplicateType {
        type_name: String,
        existing: String,
    },

    /// A converter was added after the registry resolved its first value.
    #[error("registry is sealed: converter '{tag}' was registered after the first lookup")]
    Sealed { tag: String },
}

/// The error type for all tree operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No converter applies to a runtime value.
    #[error("unsupported type '{type_name}' at {path}")]
    UnsupportedType { type_name: String, path: TreePath },

    /// A persisted type tag has no registered converter.
    #[error("unknown type tag '{tag}' at {path}")]
    UnknownTypeTag { tag: String, path: TreePath },

    /// The tree text could not be parsed.
    #[error("malformed tree{}: {message}", position.map(|p| format!(" at byte {p}")).unwrap_or_default())]
    MalformedTree {
        message: String,
        position: Option<u64>,
    },

    /// A leaf's text does not convert into the converter's target type.
    #[error("cannot convert '{text}' to {target} at {path}: {reason}")]
    ValueConversion {
        text: String,
        target: &'static str,
        reason: String,
        path: TreePath,
    },

    /// A node has the wrong shape for its converter (leaf vs. internal).
    #[error("{source} at {path}")]
    Shape {
        #[source]
        source: ShapeError,
        path: TreePath,
    },

    /// An extension hook failed while producing its substitute value.
    #[error("extension hook of '{type_name}' failed at {path}")]
    Hook {
        type_name: String,
        path: TreePath,
        #[source]
        source: HookError,
    },

    /// A value cannot be carried by the tree text form.
    #[error("cannot represent {what} at {path}")]
    Unrepresentable { what: String, path: TreePath },

    /// An option store has no value under the requested name.
    #[error("missing option '{name}'")]
    MissingOption { name: String },

    /// Converter registration misuse.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// I/O failure on a caller-supplied reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse error category, for callers deciding on a recovery policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UnsupportedType,
    UnknownTypeTag,
    MalformedTree,
    ValueConversion,
    Hook,
    Unrepresentable,
    MissingOption,
    Registry,
    Io,
}

impl Error {
    /// Returns the category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Error::UnknownTypeTag { .. } => ErrorKind::UnknownTypeTag,
            Error::MalformedTree { .. } => ErrorKind::MalformedTree,
            Error::ValueConversion { .. } | Error::Shape { .. } => ErrorKind::ValueConversion,
            Error::Hook { .. } => ErrorKind::Hook,
            Error::Unrepresentable { .. } => ErrorKind::Unrepresentable,
            Error::MissingOption { .. } => ErrorKind::MissingOption,
            Error::Registry(_) => ErrorKind::Registry,
            Error::Io(_) => ErrorKind::Io,
        }
    }

    /// Returns the tree location recorded on this error, if any.
    pub fn path(&self) -> Option<&TreePath> {
        match self {
            Error::UnsupportedType { path, .. }
            | Error::UnknownTypeTag { path, .. }
            | Error::ValueConversion { path, .. }
            | Error::Shape { path, .. }
            | Error::Hook { path, .. }
            | Error::Unrepresentable { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Prefixes the recorded tree location with an enclosing element name.
    ///
    /// Containers call this as an error bubbles out of one of their children.
    pub fn within(mut self, segment: impl Into<String>) -> Self {
        match &mut self {
            Error::UnsupportedType { path, .. }
            | Error::UnknownTypeTag { path, .. }
            | Error::ValueConversion { path, .. }
            | Error::Shape { path, .. }
            | Error::Hook { path, .. }
            | Error::Unrepresentable { path, .. } => path.prepend(segment),
            _ => {}
        }
        self
    }

    pub(crate) fn unsupported(type_name: impl Into<String>) -> Self {
        Error::UnsupportedType {
            type_name: type_name.into(),
            path: TreePath::new(),
        }
    }

    pub(crate) fn unknown_tag(tag: impl Into<String>) -> Self {
        Error::UnknownTypeTag {
            tag: tag.into(),
            path: TreePath::new(),
        }
    }

    pub(crate) fn malformed(message: impl Into<String>, position: u64) -> Self {
        Error::MalformedTree {
            message: message.into(),
            position: Some(position),
        }
    }

    /// A structural problem found after parsing, with no byte position.
    pub(crate) fn malformed_structure(message: impl Into<String>) -> Self {
        Error::MalformedTree {
            message: message.into(),
            position: None,
        }
    }

    pub(crate) fn conversion(
        text: impl Into<String>,
        target: &'static str,
        reason: impl fmt::Display,
    ) -> Self {
        Error::ValueConversion {
            text: text.into(),
            target,
            reason: reason.to_string(),
            path: TreePath::new(),
        }
    }

    pub(crate) fn unrepresentable(what: impl Into<String>) -> Self {
        Error::Unrepresentable {
            what: what.into(),
            path: TreePath::new(),
        }
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(io) => Error::Io(std::io::Error::new(io.kind(), io.to_string())),
            other => Error::malformed_structure(other.to_string()),
        }
    }
}

impl From<ShapeError> for Error {
    fn from(source: ShapeError) -> Self {
        Error::Shape {
            source,
            path: TreePath::new(),
        }
    }
}

/// Result type alias for tree operations.
pub type Result<T> = std::result::Result<T, Error>;
