//! Error types for sitemap generation and serving.

use std::error::Error as StdError;
use std::io;
use std::path::PathBuf;

/// Error reported by a [`BindingEnumerator`](crate::BindingEnumerator).
///
/// Carries a human-readable message and, optionally, the underlying cause.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct EnumerationError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl EnumerationError {
    /// Create an error with a message only.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Create an error wrapping an underlying cause.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Error message without the source chain.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A route pattern that cannot be registered.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum PatternError {
    /// Pattern does not start with `/`.
    #[error("route pattern {0:?} must start with '/'")]
    NotAbsolute(String),
    /// Braces do not pair up.
    #[error("route pattern {0:?} has unbalanced braces")]
    UnbalancedBraces(String),
    /// A placeholder has no variable name.
    #[error("route pattern {0:?} has a placeholder without a name")]
    EmptyName(String),
    /// The same variable name appears twice.
    #[error("route pattern {pattern:?} declares variable {name:?} more than once")]
    DuplicateName {
        /// Offending pattern.
        pattern: String,
        /// Repeated variable name.
        name: String,
    },
    /// The regex of a placeholder does not compile.
    #[error("route pattern {pattern:?} has an invalid regex for {name:?}: {source}")]
    InvalidRegex {
        /// Offending pattern.
        pattern: String,
        /// Variable whose regex failed.
        name: String,
        /// Regex compilation error.
        #[source]
        source: regex::Error,
    },
    /// A static route was registered with placeholders.
    #[error("static route {0:?} must not contain variables")]
    StaticWithVariables(String),
}

/// Variable bindings that do not fit a route pattern.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubstitutionError {
    /// No value supplied for a variable of the pattern.
    #[error("missing value for variable {name:?} in route {pattern:?}")]
    MissingVariable {
        /// Route pattern.
        pattern: String,
        /// Variable without a value.
        name: String,
    },
    /// A value was supplied for a variable the pattern does not declare.
    #[error("route {pattern:?} has no variable {name:?}")]
    UnknownVariable {
        /// Route pattern.
        pattern: String,
        /// Undeclared variable name.
        name: String,
    },
    /// The same variable was bound twice.
    #[error("variable {name:?} bound more than once for route {pattern:?}")]
    DuplicateVariable {
        /// Route pattern.
        pattern: String,
        /// Variable bound twice.
        name: String,
    },
    /// A value does not match the variable's regex.
    #[error("value {value:?} does not match variable {name:?} in route {pattern:?}")]
    InvalidValue {
        /// Route pattern.
        pattern: String,
        /// Variable name.
        name: String,
        /// Rejected value.
        value: String,
    },
    /// The handle was not issued by this router.
    #[error("unknown route handle {0}")]
    UnknownRoute(usize),
}

/// Sitemap document encoding or decoding failure.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DocumentError {
    /// XML serialization failed.
    #[error("XML encode error: {0}")]
    Encode(#[from] quick_xml::SeError),
    /// XML deserialization failed.
    #[error("XML decode error: {0}")]
    Decode(#[from] quick_xml::DeError),
    /// An element holds a value that cannot be interpreted.
    #[error("invalid <{element}> value {value:?}")]
    InvalidValue {
        /// Element name (e.g. `priority`).
        element: &'static str,
        /// Raw text content.
        value: String,
    },
}

/// Failure of a whole generation run.
///
/// Any of these aborts the run immediately; nothing is retried.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GenerationError {
    /// Directory or file creation/write failed.
    #[error("storage error at {}: {source}", path.display())]
    Storage {
        /// Path being created or written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Moving a staged file into the cache directory failed after earlier
    /// files had already replaced those of the previous generation.
    #[error("commit interrupted at {}: {source}", path.display())]
    Commit {
        /// Destination of the failed rename.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A binding enumerator reported a failure.
    #[error("binding enumerator for route {pattern:?} failed: {source}")]
    Enumeration {
        /// Pattern of the parameterized source.
        pattern: String,
        /// Error reported by the enumerator.
        #[source]
        source: EnumerationError,
    },
    /// Bindings could not be substituted into the route pattern.
    #[error(transparent)]
    Substitution(#[from] SubstitutionError),
    /// A page or the index could not be encoded.
    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl GenerationError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Whether the cache directory now holds files of two generations.
    #[must_use]
    pub fn is_partial_commit(&self) -> bool {
        matches!(self, Self::Commit { .. })
    }
}

/// Error returned by [`SitemapCache`](crate::SitemapCache).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CacheError {
    /// Generation triggered by this call failed.
    #[error("sitemap generation failed: {0}")]
    Generation(#[from] GenerationError),
    /// The requested file is not part of the current sitemap set.
    #[error("sitemap file not found: {0}")]
    NotFound(String),
    /// A materialized file could not be read back.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}
