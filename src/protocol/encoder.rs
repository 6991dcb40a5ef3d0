//! Command encoder
//!
//! Turns an ordered list of [`Value`]s into request bytes.
//!
//! ## Encodings
//! ```text
//! Inline     SET key value\r\n
//! Bulk       SET key 5\r\nvalue\r\n
//! MultiBulk  *3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n
//! ```
//!
//! Arguments in a whitespace-delimited position cannot carry binary data, so
//! every argument is validated against the chosen encoding before the first
//! byte is written.

use std::borrow::Cow;
use std::io::Write;

use bytes::{BufMut, Bytes, BytesMut};

use super::Value;
use crate::error::{BinaryArgumentReason, Result, WireError};

/// CRLF line ending
pub const CRLF: &[u8] = b"\r\n";

/// Arguments up to this size are coalesced with their framing into one write
pub const COALESCE_LIMIT: usize = 1024;

const ARRAY: u8 = b'*';
const BULK_STRING: u8 = b'$';
const SEPARATOR: &[u8] = b" ";

/// How a command is laid out on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Space-joined arguments on one line; no argument may be binary
    Inline,

    /// Leading arguments space-joined, last argument length-prefixed; only
    /// the last may be binary
    Bulk,

    /// Every argument length-prefixed; any argument may be binary
    MultiBulk,
}

impl Encoding {
    /// How many leading arguments must be text, and the reason reported otherwise
    fn text_prefix(self, argc: usize) -> (usize, BinaryArgumentReason) {
        match self {
            Encoding::Inline => (argc, BinaryArgumentReason::NoneMayBeBinary),
            Encoding::Bulk => (argc - 1, BinaryArgumentReason::OnlyLastMayBeBinary),
            Encoding::MultiBulk => (0, BinaryArgumentReason::ArgumentMayNotBeBinary),
        }
    }
}

/// Check every argument against `encoding` without writing anything
///
/// An argument in a whitespace-delimited position is refused when it is
/// binary, or when it is text holding CR, LF or a space.
pub fn validate(encoding: Encoding, args: &[Value<'_>]) -> Result<()> {
    if args.is_empty() {
        return Err(WireError::Parameter("argument list is empty".to_string()));
    }

    let (text_only, reason) = encoding.text_prefix(args.len());
    let positions: Vec<usize> = args[..text_only]
        .iter()
        .enumerate()
        .filter(|(_, arg)| !fits_text_slot(arg))
        .map(|(i, _)| i)
        .collect();

    if positions.is_empty() {
        Ok(())
    } else {
        Err(WireError::ArgumentType { reason, positions })
    }
}

/// Validate, then write one command to `writer`
///
/// Returns the number of bytes written. A validation failure writes nothing;
/// an I/O failure may leave earlier arguments already written.
pub fn write_command<W: Write>(
    writer: &mut W,
    encoding: Encoding,
    args: &[Value<'_>],
) -> Result<usize> {
    validate(encoding, args)?;

    let mut frame = Framer {
        writer,
        scratch: BytesMut::with_capacity(COALESCE_LIMIT + 32),
        written: 0,
    };

    match encoding {
        Encoding::Inline | Encoding::Bulk => {
            if let Some((last, leading)) = args.split_last() {
                for arg in leading {
                    frame.argument(Prefix::None, &arg_bytes(arg), SEPARATOR)?;
                }
                let prefix = if encoding == Encoding::Bulk {
                    Prefix::Length
                } else {
                    Prefix::None
                };
                frame.argument(prefix, &arg_bytes(last), CRLF)?;
            }
        }
        Encoding::MultiBulk => {
            frame.header(ARRAY, args.len())?;
            for arg in args {
                frame.argument(Prefix::BulkLength, &arg_bytes(arg), CRLF)?;
            }
        }
    }

    frame.writer.flush()?;
    Ok(frame.written)
}

/// Encode one command into a contiguous buffer
pub fn encode_command(encoding: Encoding, args: &[Value<'_>]) -> Result<Bytes> {
    let mut out = BytesMut::new().writer();
    write_command(&mut out, encoding, args)?;
    Ok(out.into_inner().freeze())
}

/// Whether `arg` survives being space-joined onto a CRLF-terminated line
fn fits_text_slot(arg: &Value<'_>) -> bool {
    match arg {
        Value::Text(b) | Value::Error(b) => !b.iter().any(|c| matches!(c, b'\r' | b'\n' | b' ')),
        Value::Integer(_) => true,
        Value::Binary(_) | Value::Nil => false,
    }
}

/// The bytes an argument contributes to the wire
fn arg_bytes<'v>(arg: &'v Value<'_>) -> Cow<'v, [u8]> {
    match arg {
        Value::Text(b) | Value::Error(b) | Value::Binary(b) => Cow::Borrowed(&b[..]),
        Value::Integer(n) => Cow::Owned(n.to_string().into_bytes()),
        Value::Nil => Cow::Borrowed(&[]),
    }
}

/// Length framing in front of an argument
#[derive(Clone, Copy)]
enum Prefix {
    /// Whitespace-delimited argument
    None,

    /// `<len>\r\n`, the legacy bulk form
    Length,

    /// `$<len>\r\n`
    BulkLength,
}

/// Writes framed chunks, retrying short writes via `write_all`
struct Framer<'w, W: Write> {
    writer: &'w mut W,
    scratch: BytesMut,
    written: usize,
}

impl<W: Write> Framer<'_, W> {
    /// `*<count>\r\n`
    fn header(&mut self, marker: u8, count: usize) -> Result<()> {
        self.scratch.clear();
        put_length(&mut self.scratch, Some(marker), count);
        self.flush_scratch()
    }

    /// One argument with its length prefix, followed by `suffix`
    fn argument(&mut self, prefix: Prefix, payload: &[u8], suffix: &[u8]) -> Result<()> {
        self.scratch.clear();
        match prefix {
            Prefix::None => {}
            Prefix::Length => put_length(&mut self.scratch, None, payload.len()),
            Prefix::BulkLength => put_length(&mut self.scratch, Some(BULK_STRING), payload.len()),
        }

        if payload.len() + suffix.len() <= COALESCE_LIMIT {
            self.scratch.put_slice(payload);
            self.scratch.put_slice(suffix);
            return self.flush_scratch();
        }

        self.flush_scratch()?;
        self.writer.write_all(payload)?;
        self.writer.write_all(suffix)?;
        self.written += payload.len() + suffix.len();
        Ok(())
    }

    fn flush_scratch(&mut self) -> Result<()> {
        if !self.scratch.is_empty() {
            self.writer.write_all(&self.scratch)?;
            self.written += self.scratch.len();
        }
        Ok(())
    }
}

fn put_length(buf: &mut BytesMut, marker: Option<u8>, len: usize) {
    if let Some(marker) = marker {
        buf.put_u8(marker);
    }
    buf.put_slice(len.to_string().as_bytes());
    buf.put_slice(CRLF);
}
