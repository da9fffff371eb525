mod builder;
mod loader;

pub use builder::{BuildError, ImageBuilder};
pub use loader::{LoadError, Loader, FORMAT_VERSION, HEADER_LEN, MAGIC, MAX_TABLE_LEN};

use std::ffi::{CStr, CString};
use std::fmt;
use thiserror::Error;

/// Which constant-pool table an id was resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    String,
    Number,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableKind::String => write!(f, "string"),
            TableKind::Number => write!(f, "number"),
        }
    }
}

/// Error type for constant-pool lookups
///
/// An out-of-range id after a successful load means the instruction stream
/// references a constant the image does not contain. The executor must treat
/// this as fatal to the session; it is never mapped to a default value.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupError {
    #[error("{table} id {id} out of range: table has {len} entries")]
    IdOutOfRange { table: TableKind, id: u8, len: usize },
}

/// Represents a numeric literal in the constant pool
///
/// The kind (integer vs float) is fixed when the image is serialized and is
/// returned verbatim; lookups never widen or narrow.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(_) => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Number::Float(f) => Some(*f),
            Number::Integer(_) => None,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(x) => write!(f, "{}", x),
        }
    }
}

/// A string constant, stored NUL-terminated alongside its UTF-8 text so both
/// views are zero-copy at lookup time
#[derive(Debug, Clone)]
pub struct PoolString {
    text: String,
    c_text: CString,
}

impl PoolString {
    /// Build an entry from validated text. Returns `None` if the text contains
    /// an interior NUL byte, which the storage format cannot represent.
    pub(crate) fn new(text: String) -> Option<Self> {
        let c_text = CString::new(text.as_bytes()).ok()?;
        Some(Self { text, c_text })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_c_str(&self) -> &CStr {
        self.c_text.as_c_str()
    }
}

/// An immutable bytecode image: a string table, a number table and the raw
/// instruction bytes
///
/// An image is constructed exactly once by [`Loader::load`]; there is no
/// mutating API, so re-loading means building a fresh instance. After
/// construction it may be read from any number of threads without
/// synchronization.
#[derive(Debug, Clone)]
pub struct BytecodeImage {
    version: u8,
    strings: Vec<PoolString>,
    numbers: Vec<Number>,
    code: Box<[u8]>,
}

impl BytecodeImage {
    pub(crate) fn new(
        version: u8,
        strings: Vec<PoolString>,
        numbers: Vec<Number>,
        code: Box<[u8]>,
    ) -> Self {
        Self {
            version,
            strings,
            numbers,
            code,
        }
    }

    /// Resolve a string id to a borrowed view of the literal's text
    pub fn string_by_id(&self, id: u8) -> Result<&str, LookupError> {
        self.strings
            .get(id as usize)
            .map(PoolString::as_str)
            .ok_or(LookupError::IdOutOfRange {
                table: TableKind::String,
                id,
                len: self.strings.len(),
            })
    }

    /// Resolve a string id to a zero-copy NUL-terminated view of the same entry
    pub fn c_string_by_id(&self, id: u8) -> Result<&CStr, LookupError> {
        self.strings
            .get(id as usize)
            .map(PoolString::as_c_str)
            .ok_or(LookupError::IdOutOfRange {
                table: TableKind::String,
                id,
                len: self.strings.len(),
            })
    }

    /// Resolve a number id to the literal it was serialized as
    pub fn number_by_id(&self, id: u8) -> Result<Number, LookupError> {
        self.numbers
            .get(id as usize)
            .copied()
            .ok_or(LookupError::IdOutOfRange {
                table: TableKind::Number,
                id,
                len: self.numbers.len(),
            })
    }

    /// The executable payload. Always valid after a successful load; may be empty.
    pub fn instructions(&self) -> &[u8] {
        &self.code
    }

    pub fn string_count(&self) -> usize {
        self.strings.len()
    }

    pub fn number_count(&self) -> usize {
        self.numbers.len()
    }

    /// Format version the image was serialized with
    pub fn version(&self) -> u8 {
        self.version
    }
}
