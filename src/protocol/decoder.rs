//! Reply decoder
//!
//! A resumable state machine that turns buffered reply bytes into
//! [`Reply`]s, one partial read at a time.
//!
//! ## States
//! ```text
//!              +OK / -ERR / :1 / $-1 / *0 / *-1
//!            ┌──────────────────────────────────┐
//!            │                                  ▼
//!       ┌─────────┐   $N    ┌──────────────┐  ┌───────┐
//!  ────►│ Waiting │────────►│ ReadingBulk  │─►│ queue │
//!       └─────────┘         └──────────────┘  └───────┘
//!            │ *M                ▲    │           ▲
//!            ▼                   │$N  │ M-1 left  │ last element
//!       ┌──────────────────┐─────┘    │           │
//!       │ ReadingMultiBulk │◄─────────┘───────────┘
//!       └──────────────────┘
//! ```
//!
//! Bytes are consumed from the buffer as soon as a line or payload is
//! identified, so nothing is parsed twice. When the buffer runs dry the
//! decoder reports how many more bytes it needs before it can progress.

use memchr::memmem;

use super::encoder::CRLF;
use super::{Reply, ReplyQueue, Value};
use crate::buffer::ByteBuffer;
use crate::config::{ClientConfig, MAX_BULK_LEN_CEILING};
use crate::error::{Result, WireError};

/// Type markers
const STATUS: u8 = b'+';
const ERROR: u8 = b'-';
const INTEGER: u8 = b':';
const BULK: u8 = b'$';
const MULTI_BULK: u8 = b'*';

/// Where the decoder is, with everything it needs to resume
#[derive(Debug)]
enum State {
    /// No reply in progress
    Waiting,

    /// A bulk header was decoded; `value` is allocated to its final size and
    /// waits for the payload plus CRLF
    ReadingBulk {
        value: Value<'static>,
        len: usize,
        /// Elements still owed to the enclosing multi-bulk, this one included
        in_multi: Option<usize>,
    },

    /// A multi-bulk header was decoded; its elements accumulate in the
    /// queue's in-progress slot
    ReadingMultiBulk { remaining: usize },
}

/// Externally visible view of the decoder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderPhase {
    Waiting,
    ReadingBulk { len: usize },
    ReadingMultiBulk { remaining: usize },
}

/// Incremental RESP reply decoder
#[derive(Debug)]
pub struct ReplyDecoder {
    state: State,

    /// Offset up to which the current line was already searched for CRLF
    scan_pos: usize,

    /// Additional bytes requested by the last `decode`
    needed: usize,

    max_bulk_len: usize,
    max_multi_bulk_len: usize,
}

impl Default for ReplyDecoder {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

impl ReplyDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a decoder enforcing the size limits in `config`
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            state: State::Waiting,
            scan_pos: 0,
            needed: 1,
            max_bulk_len: config.max_bulk_len.min(MAX_BULK_LEN_CEILING),
            max_multi_bulk_len: config.max_multi_bulk_len,
        }
    }

    pub fn phase(&self) -> DecoderPhase {
        match &self.state {
            State::Waiting => DecoderPhase::Waiting,
            State::ReadingBulk { len, .. } => DecoderPhase::ReadingBulk { len: *len },
            State::ReadingMultiBulk { remaining } => DecoderPhase::ReadingMultiBulk {
                remaining: *remaining,
            },
        }
    }

    /// Offset the line scanner will resume from
    pub fn scan_position(&self) -> usize {
        self.scan_pos
    }

    /// Additional bytes the decoder needs before it can make progress
    pub fn needed(&self) -> usize {
        self.needed
    }

    /// Forget any partially decoded reply
    pub fn reset(&mut self) {
        self.state = State::Waiting;
        self.scan_pos = 0;
        self.needed = 1;
    }

    /// Decode as many replies as `buf` holds, pushing them onto `queue`.
    ///
    /// Returns the number of additional bytes needed next. That count is a
    /// hint for sizing the next receive, not a promise about reply size.
    pub fn decode(&mut self, buf: &mut ByteBuffer, queue: &mut ReplyQueue) -> Result<usize> {
        loop {
            let step = match std::mem::replace(&mut self.state, State::Waiting) {
                State::Waiting => self.read_line(buf, queue, None),
                State::ReadingMultiBulk { remaining } => {
                    self.read_line(buf, queue, Some(remaining))
                }
                State::ReadingBulk {
                    value,
                    len,
                    in_multi,
                } => self.read_bulk(buf, queue, value, len, in_multi),
            };

            match step {
                Ok(Some(needed)) => {
                    self.needed = needed;
                    return Ok(needed);
                }
                Ok(None) => continue,
                Err(e) => {
                    self.reset();
                    return Err(e);
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Line-framed input: inline replies and headers
    // -------------------------------------------------------------------------

    fn read_line(
        &mut self,
        buf: &mut ByteBuffer,
        queue: &mut ReplyQueue,
        in_multi: Option<usize>,
    ) -> Result<Option<usize>> {
        let data = buf.data();

        let Some(&marker) = data.first() else {
            self.restore_line_state(in_multi);
            return Ok(Some(1));
        };

        if !matches!(marker, STATUS | ERROR | INTEGER | BULK | MULTI_BULK) {
            return Err(WireError::Protocol(format!(
                "unexpected reply type byte 0x{:02x}, expected one of '+', '-', ':', '$', '*'",
                marker
            )));
        }

        let Some(end) = self.find_line_end(data) else {
            self.restore_line_state(in_multi);
            let needed = if data.last() == Some(&b'\r') { 1 } else { 2 };
            return Ok(Some(needed));
        };

        let line = &data[1..end];
        match marker {
            STATUS => {
                let value = Value::text_copy(line);
                buf.consume(end + CRLF.len());
                self.emit(value, queue, in_multi)?;
            }
            ERROR => {
                let value = Value::error_copy(line);
                buf.consume(end + CRLF.len());
                self.emit(value, queue, in_multi)?;
            }
            INTEGER => {
                let n = parse_integer(line, "integer reply")?;
                buf.consume(end + CRLF.len());
                self.emit(Value::Integer(n), queue, in_multi)?;
            }
            BULK => {
                let len = parse_integer(line, "bulk length")?;
                buf.consume(end + CRLF.len());
                match len {
                    -1 => self.emit(Value::Nil, queue, in_multi)?,
                    len if len < -1 => {
                        return Err(WireError::Protocol(format!("invalid bulk length: {}", len)));
                    }
                    len => {
                        let len = self.check_len(len, self.max_bulk_len, "bulk length")?;
                        self.state = State::ReadingBulk {
                            value: Value::binary_with_len(len),
                            len,
                            in_multi,
                        };
                    }
                }
            }
            _ => {
                if in_multi.is_some() {
                    return Err(WireError::Protocol(
                        "nested multi-bulk replies are not supported".to_string(),
                    ));
                }
                let count = parse_integer(line, "multi-bulk length")?;
                buf.consume(end + CRLF.len());
                match count {
                    -1 => queue.push(Reply::single(Value::Nil)),
                    0 => queue.push(Reply::new(Vec::new())),
                    count if count < -1 => {
                        return Err(WireError::Protocol(format!(
                            "invalid multi-bulk length: {}",
                            count
                        )));
                    }
                    count => {
                        let count =
                            self.check_len(count, self.max_multi_bulk_len, "multi-bulk length")?;
                        queue.begin(count);
                        self.state = State::ReadingMultiBulk { remaining: count };
                    }
                }
            }
        }

        Ok(None)
    }

    /// Search for CRLF, resuming where the previous search stopped
    fn find_line_end(&mut self, data: &[u8]) -> Option<usize> {
        let from = self.scan_pos.min(data.len());
        match memmem::find(&data[from..], CRLF) {
            Some(pos) => {
                self.scan_pos = 0;
                Some(from + pos)
            }
            None => {
                // A trailing '\r' may still be the first half of a terminator
                self.scan_pos = data.len().saturating_sub(1);
                None
            }
        }
    }

    fn restore_line_state(&mut self, in_multi: Option<usize>) {
        if let Some(remaining) = in_multi {
            self.state = State::ReadingMultiBulk { remaining };
        }
    }

    // -------------------------------------------------------------------------
    // Length-framed input: bulk payloads
    // -------------------------------------------------------------------------

    fn read_bulk(
        &mut self,
        buf: &mut ByteBuffer,
        queue: &mut ReplyQueue,
        mut value: Value<'static>,
        len: usize,
        in_multi: Option<usize>,
    ) -> Result<Option<usize>> {
        let Some(total) = len.checked_add(CRLF.len()) else {
            return Err(WireError::Protocol(format!("invalid bulk length: {}", len)));
        };
        if buf.len() < total {
            let needed = total - buf.len();
            self.state = State::ReadingBulk {
                value,
                len,
                in_multi,
            };
            return Ok(Some(needed));
        }

        let data = buf.data();
        if &data[len..total] != CRLF {
            return Err(WireError::Protocol(
                "bulk payload is not followed by CRLF".to_string(),
            ));
        }

        if let Some(payload) = value.payload_mut() {
            payload.copy_from_slice(&data[..len]);
        }
        buf.consume(total);
        self.emit(value, queue, in_multi)?;
        Ok(None)
    }

    // -------------------------------------------------------------------------
    // Completion
    // -------------------------------------------------------------------------

    /// Hand a finished scalar to the queue, completing its reply if it was the last one owed
    fn emit(
        &mut self,
        value: Value<'static>,
        queue: &mut ReplyQueue,
        in_multi: Option<usize>,
    ) -> Result<()> {
        match in_multi {
            None => {
                tracing::trace!("decoded scalar reply");
                queue.push(Reply::single(value));
                self.state = State::Waiting;
            }
            Some(remaining) => {
                if !queue.append(value) {
                    return Err(WireError::Protocol(
                        "multi-bulk element arrived with no reply under construction".to_string(),
                    ));
                }
                let remaining = remaining - 1;
                if remaining == 0 {
                    tracing::trace!("decoded multi-bulk reply");
                    queue.finish();
                    self.state = State::Waiting;
                } else {
                    self.state = State::ReadingMultiBulk { remaining };
                }
            }
        }
        Ok(())
    }

    fn check_len(&self, len: i64, max: usize, what: &str) -> Result<usize> {
        match usize::try_from(len) {
            Ok(len) if len <= max => Ok(len),
            _ => Err(WireError::Protocol(format!(
                "{} {} exceeds the limit of {}",
                what, len, max
            ))),
        }
    }
}

/// Parse a decimal integer field of a reply line
fn parse_integer(line: &[u8], what: &str) -> Result<i64> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            WireError::Protocol(format!("malformed {}: \"{}\"", what, line.escape_ascii()))
        })
}
