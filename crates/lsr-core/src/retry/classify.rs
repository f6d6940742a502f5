//! Error kinds and fail-fast classification.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

/// Stable discriminator for an error's classification.
///
/// Kinds are compared by value, never by type identity, so callers can name
/// them from config or the command line (e.g. `"not-found"`, `"exit:3"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorKind(Cow<'static, str>);

impl ErrorKind {
    pub const fn from_static(kind: &'static str) -> Self {
        ErrorKind(Cow::Borrowed(kind))
    }

    pub fn new(kind: impl Into<String>) -> Self {
        ErrorKind(Cow::Owned(kind.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for ErrorKind {
    fn from(kind: &'static str) -> Self {
        ErrorKind::from_static(kind)
    }
}

impl From<String> for ErrorKind {
    fn from(kind: String) -> Self {
        ErrorKind::new(kind)
    }
}

/// An error that can report its own kind and, optionally, the kind of the
/// error it wraps.
pub trait Classify {
    fn kind(&self) -> ErrorKind;

    /// The directly wrapped cause, if it is classifiable. Only one level is
    /// consulted by [`FailFastSet::matches`].
    fn cause(&self) -> Option<&dyn Classify> {
        None
    }
}

impl Classify for std::io::Error {
    fn kind(&self) -> ErrorKind {
        io_error_kind(std::io::Error::kind(self))
    }
}

/// Map an `io::ErrorKind` to a kebab-case discriminator (`NotFound` -> `not-found`).
pub fn io_error_kind(kind: std::io::ErrorKind) -> ErrorKind {
    let name = format!("{:?}", kind);
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    ErrorKind::new(out)
}

/// Set of error kinds that must not be retried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailFastSet {
    kinds: HashSet<ErrorKind>,
}

impl FailFastSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: impl Into<ErrorKind>) -> bool {
        self.kinds.insert(kind.into())
    }

    pub fn contains(&self, kind: &ErrorKind) -> bool {
        self.kinds.contains(kind)
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// True when the error's own kind, or its direct cause's kind, is in the set.
    pub fn matches(&self, err: &dyn Classify) -> bool {
        if self.kinds.is_empty() {
            return false;
        }
        if self.contains(&err.kind()) {
            return true;
        }
        err.cause().is_some_and(|cause| self.contains(&cause.kind()))
    }
}

impl<K: Into<ErrorKind>> FromIterator<K> for FailFastSet {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self {
            kinds: iter.into_iter().map(Into::into).collect(),
        }
    }
}
