//! Reply definitions
//!
//! A complete server reply and the FIFO holding replies the caller has not
//! collected yet.

use std::collections::VecDeque;
use std::fmt;

use super::Value;

/// One complete server reply: a single scalar, or the elements of an array reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    values: Vec<Value<'static>>,
}

impl Reply {
    /// Create a reply from its elements
    pub fn new(values: Vec<Value<'static>>) -> Self {
        Self { values }
    }

    /// Create a one-element reply
    pub fn single(value: Value<'static>) -> Self {
        Self {
            values: vec![value],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value<'static>] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value<'static>> {
        self.values.get(index)
    }

    /// The only element of a scalar reply
    pub fn as_single(&self) -> Option<&Value<'static>> {
        match self.values.as_slice() {
            [value] => Some(value),
            _ => None,
        }
    }

    /// Whether the server answered with an error line
    pub fn is_error(&self) -> bool {
        matches!(self.as_single(), Some(Value::Error(_)))
    }

    pub fn into_values(self) -> Vec<Value<'static>> {
        self.values
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reply {")?;
        for value in &self.values {
            write!(f, "\n   {}", value)?;
        }
        f.write_str("\n}")
    }
}

/// FIFO of completed replies plus the one reply under construction
#[derive(Debug, Default)]
pub struct ReplyQueue {
    /// Completed replies, oldest first
    ready: VecDeque<Reply>,

    /// Array reply still being decoded, invisible to `pop`
    in_progress: Option<Vec<Value<'static>>>,
}

impl ReplyQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed replies waiting
    pub fn len(&self) -> usize {
        self.ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ready.is_empty()
    }

    /// Append a completed reply to the tail
    pub fn push(&mut self, reply: Reply) {
        self.ready.push_back(reply);
    }

    /// Remove the oldest completed reply
    pub fn pop(&mut self) -> Option<Reply> {
        self.ready.pop_front()
    }

    /// Peek at the oldest completed reply
    pub fn front(&self) -> Option<&Reply> {
        self.ready.front()
    }

    // -------------------------------------------------------------------------
    // In-progress slot
    // -------------------------------------------------------------------------

    /// Start assembling an array reply of `len` elements, discarding any previous one
    pub fn begin(&mut self, len: usize) {
        self.in_progress = Some(Vec::with_capacity(len));
    }

    /// Append an element to the reply under construction
    ///
    /// Returns false when nothing is under construction.
    pub fn append(&mut self, value: Value<'static>) -> bool {
        match self.in_progress.as_mut() {
            Some(values) => {
                values.push(value);
                true
            }
            None => false,
        }
    }

    /// Number of elements appended to the reply under construction
    pub fn in_progress_len(&self) -> Option<usize> {
        self.in_progress.as_ref().map(Vec::len)
    }

    /// Move the reply under construction to the tail of the FIFO
    pub fn finish(&mut self) -> bool {
        match self.in_progress.take() {
            Some(values) => {
                self.ready.push_back(Reply::new(values));
                true
            }
            None => false,
        }
    }

    /// Drop every reply, completed or not
    pub fn clear(&mut self) {
        self.ready.clear();
        self.in_progress = None;
    }
}
