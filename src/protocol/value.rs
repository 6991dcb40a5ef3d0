//! Value definitions
//!
//! A single RESP scalar, either borrowed from the caller (commands being
//! sent) or owned (replies being decoded).

use std::borrow::Cow;
use std::fmt;

/// One scalar argument or reply element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value<'a> {
    /// Text without CR/LF: a command word, or a `+` status reply
    Text(Cow<'a, [u8]>),

    /// A `-` error reply
    Error(Cow<'a, [u8]>),

    /// Arbitrary bytes: a binary argument, or a `$` bulk reply
    Binary(Cow<'a, [u8]>),

    /// A `:` integer reply, or an integer argument sent as decimal text
    Integer(i64),

    /// A null bulk (`$-1`) or null multi-bulk (`*-1`) reply
    Nil,
}

impl<'a> Value<'a> {
    // -------------------------------------------------------------------------
    // Borrowed views
    // -------------------------------------------------------------------------

    /// Wrap a text argument without copying it
    pub fn text(s: &'a str) -> Self {
        Value::Text(Cow::Borrowed(s.as_bytes()))
    }

    /// Wrap text bytes without copying them. Text holding CR, LF or a space
    /// is only accepted in length-prefixed positions.
    pub fn text_bytes(bytes: &'a [u8]) -> Self {
        Value::Text(Cow::Borrowed(bytes))
    }

    /// Wrap binary bytes without copying them
    pub fn binary(bytes: &'a [u8]) -> Self {
        Value::Binary(Cow::Borrowed(bytes))
    }

    // -------------------------------------------------------------------------
    // Scalars
    // -------------------------------------------------------------------------

    pub fn integer(n: i64) -> Self {
        Value::Integer(n)
    }

    /// As an argument, nil travels as an empty payload and is
    /// indistinguishable from `""` on the wire
    pub fn nil() -> Self {
        Value::Nil
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// The payload bytes, if this value carries any
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Text(b) | Value::Error(b) | Value::Binary(b) => Some(&b[..]),
            Value::Integer(_) | Value::Nil => None,
        }
    }

    /// The payload as UTF-8, if it carries valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        self.as_bytes().and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Mutable access to an owned payload, for filling it in place
    pub fn payload_mut(&mut self) -> Option<&mut [u8]> {
        match self {
            Value::Text(b) | Value::Error(b) | Value::Binary(b) => {
                Some(b.to_mut().as_mut_slice())
            }
            Value::Integer(_) | Value::Nil => None,
        }
    }

    /// Whether this value owns its payload storage
    pub fn is_owned(&self) -> bool {
        match self {
            Value::Text(b) | Value::Error(b) | Value::Binary(b) => matches!(b, Cow::Owned(_)),
            Value::Integer(_) | Value::Nil => true,
        }
    }

    /// Whether this value is binary or nil, so it always needs a length-prefixed position
    pub fn is_binary(&self) -> bool {
        matches!(self, Value::Binary(_) | Value::Nil)
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Detach from any borrowed storage
    pub fn into_owned(self) -> Value<'static> {
        match self {
            Value::Text(b) => Value::Text(Cow::Owned(b.into_owned())),
            Value::Error(b) => Value::Error(Cow::Owned(b.into_owned())),
            Value::Binary(b) => Value::Binary(Cow::Owned(b.into_owned())),
            Value::Integer(n) => Value::Integer(n),
            Value::Nil => Value::Nil,
        }
    }
}

impl Value<'static> {
    // -------------------------------------------------------------------------
    // Owned copies
    // -------------------------------------------------------------------------

    pub fn text_copy(bytes: &[u8]) -> Self {
        Value::Text(Cow::Owned(bytes.to_vec()))
    }

    pub fn error_copy(bytes: &[u8]) -> Self {
        Value::Error(Cow::Owned(bytes.to_vec()))
    }

    pub fn binary_copy(bytes: &[u8]) -> Self {
        Value::Binary(Cow::Owned(bytes.to_vec()))
    }

    /// An owned zero-filled binary payload of `len` bytes, to be filled in place
    pub fn binary_with_len(len: usize) -> Self {
        Value::Binary(Cow::Owned(vec![0; len]))
    }
}

impl<'a> From<&'a str> for Value<'a> {
    fn from(s: &'a str) -> Self {
        Value::text(s)
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(b: &'a [u8]) -> Self {
        Value::binary(b)
    }
}

impl From<i64> for Value<'_> {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(b) => write!(f, "STR \"{}\"", b.escape_ascii()),
            Value::Error(b) => write!(f, "ERR \"{}\"", b.escape_ascii()),
            Value::Binary(b) => write!(f, "RAW({}) \"{}\"", b.len(), b.escape_ascii()),
            Value::Integer(n) => write!(f, "INT {}", n),
            Value::Nil => f.write_str("NIL"),
        }
    }
}
