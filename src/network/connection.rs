//! Connection Handle
//!
//! Owns one stream to the server together with the receive buffer, the reply
//! queue and the decoder state.
//!
//! A connection is driven by a single caller: every operation takes
//! `&mut self`, each `read` performs at most one receive, and the caller
//! loops (or reacts to readiness from an event loop) until enough replies
//! are queued.

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use crate::buffer::ByteBuffer;
use crate::config::{ClientConfig, DEFAULT_HOST, DEFAULT_PORT};
use crate::error::{Result, WireError};
use crate::protocol::{
    write_command, DecoderPhase, Encoding, Reply, ReplyDecoder, ReplyQueue, Value,
};

/// A client connection to a RESP server
///
/// `S` is any blocking byte stream. Attach a `&TcpStream` instead of a
/// `TcpStream` to keep ownership of the socket outside the connection.
pub struct Connection<S = TcpStream> {
    /// Stream to the server, if one is attached
    stream: Option<S>,

    /// Bytes received but not yet decoded
    buffer: ByteBuffer,

    /// Completed replies plus the one under construction
    replies: ReplyQueue,

    /// Resumable reply decoder
    decoder: ReplyDecoder,

    /// Message of the most recent failure
    last_error: Option<String>,

    /// Set once framing or the stream can no longer be trusted
    broken: bool,

    /// Peer address for logging
    peer_addr: String,

    config: ClientConfig,
}

impl<S: Read + Write> Connection<S> {
    /// Create a connection with no stream attached
    pub fn new(config: ClientConfig) -> Self {
        Self {
            stream: None,
            buffer: ByteBuffer::with_capacity(config.initial_buffer_capacity),
            replies: ReplyQueue::new(),
            decoder: ReplyDecoder::from_config(&config),
            last_error: None,
            broken: false,
            peer_addr: "unattached".to_string(),
            config,
        }
    }

    /// Create a connection over an already connected stream
    pub fn with_stream(stream: S, config: ClientConfig) -> Self {
        let mut conn = Self::new(config);
        conn.attach(stream);
        conn
    }

    /// Use `stream` from now on, dropping any previous stream and every
    /// buffered byte, queued reply and partial decode
    pub fn attach(&mut self, stream: S) {
        self.stream = Some(stream);
        self.buffer.clear();
        self.replies.clear();
        self.decoder.reset();
        self.last_error = None;
        self.broken = false;
        self.peer_addr = "attached stream".to_string();
        tracing::debug!("Stream attached");
    }

    /// Give up the stream, leaving the connection unattached
    pub fn detach(&mut self) -> Option<S> {
        self.stream.take()
    }

    pub fn stream(&self) -> Option<&S> {
        self.stream.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.stream.is_some()
    }

    /// Whether a previous protocol or connection failure made this connection unusable
    pub fn is_broken(&self) -> bool {
        self.broken
    }

    /// Message describing the most recent failure, if any
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    // -------------------------------------------------------------------------
    // Send
    // -------------------------------------------------------------------------

    /// Send a command as one space-joined line. No argument may be binary.
    pub fn send(&mut self, args: &[Value<'_>]) -> Result<usize> {
        self.send_encoded(Encoding::Inline, args)
    }

    /// Send a command whose last argument is length-prefixed. Only the last
    /// argument may be binary.
    pub fn send_bulk(&mut self, args: &[Value<'_>]) -> Result<usize> {
        self.send_encoded(Encoding::Bulk, args)
    }

    /// Send a command with every argument length-prefixed. Any argument may be binary.
    pub fn send_multi_bulk(&mut self, args: &[Value<'_>]) -> Result<usize> {
        self.send_encoded(Encoding::MultiBulk, args)
    }

    /// Validate and send one command; returns the number of bytes written
    pub fn send_encoded(&mut self, encoding: Encoding, args: &[Value<'_>]) -> Result<usize> {
        let result = self.write_encoded(encoding, args);
        self.track(result)
    }

    fn write_encoded(&mut self, encoding: Encoding, args: &[Value<'_>]) -> Result<usize> {
        let stream = Self::usable(&mut self.stream, self.broken)?;
        let written = write_command(stream, encoding, args)?;
        tracing::trace!(?encoding, argc = args.len(), written, "Sent command");
        Ok(written)
    }

    // -------------------------------------------------------------------------
    // Receive
    // -------------------------------------------------------------------------

    /// Receive once and decode everything buffered.
    ///
    /// Returns the number of replies that became available during this call.
    /// A receive that times out or would block returns 0 and leaves the
    /// decoder untouched. An interrupted receive is retried.
    pub fn read(&mut self) -> Result<usize> {
        let result = self.receive().map(|completed| completed.unwrap_or(0));
        self.track(result)
    }

    /// `None` when nothing arrived from the stream
    fn receive(&mut self) -> Result<Option<usize>> {
        let hint = self.decoder.needed().max(self.config.read_chunk_size);
        self.buffer.reserve_extra(hint);

        let stream = Self::usable(&mut self.stream, self.broken)?;
        let received = loop {
            match stream.read(self.buffer.spare_mut()) {
                Ok(0) => {
                    return Err(WireError::Connection(
                        "Error reading from server: connection closed by peer".to_string(),
                    ))
                }
                Ok(n) => break n,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    tracing::trace!("Nothing received from {}", self.peer_addr);
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }
        };

        self.buffer.commit(received);
        tracing::trace!(received, buffered = self.buffer.len(), "Received bytes");

        let before = self.replies.len();
        self.decoder.decode(&mut self.buffer, &mut self.replies)?;
        Ok(Some(self.replies.len() - before))
    }

    /// Number of completed replies waiting to be popped
    pub fn pending_replies(&self) -> usize {
        self.replies.len()
    }

    /// Take the oldest completed reply
    pub fn pop_reply(&mut self) -> Option<Reply> {
        self.replies.pop()
    }

    /// Bytes received but not yet decoded
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn decoder_phase(&self) -> DecoderPhase {
        self.decoder.phase()
    }

    // -------------------------------------------------------------------------
    // Request / reply helpers
    // -------------------------------------------------------------------------

    /// Send a multi-bulk command and block until its reply arrives
    pub fn request(&mut self, args: &[Value<'_>]) -> Result<Reply> {
        self.request_encoded(Encoding::MultiBulk, args)
    }

    /// Send a command and block until its reply arrives.
    ///
    /// Replies of earlier pipelined commands must be popped first, otherwise
    /// the reply returned here could not be matched to this request. A
    /// receive that times out fails the request.
    pub fn request_encoded(&mut self, encoding: Encoding, args: &[Value<'_>]) -> Result<Reply> {
        if !self.replies.is_empty() {
            let err = WireError::Parameter(format!(
                "{} earlier replies must be popped before a request",
                self.replies.len()
            ));
            return self.track(Err(err));
        }

        self.send_encoded(encoding, args)?;
        loop {
            if let Some(reply) = self.replies.pop() {
                return Ok(reply);
            }
            let received = self.receive();
            if let Ok(None) = received {
                let err = WireError::Connection("timed out waiting for a reply".to_string());
                return self.track(Err(err));
            }
            self.track(received)?;
        }
    }

    /// Send a command whose reply must be a single integer
    pub fn request_integer(&mut self, args: &[Value<'_>]) -> Result<i64> {
        let reply = self.request(args)?;
        let result = match reply.as_single() {
            Some(Value::Integer(n)) => Ok(*n),
            Some(Value::Error(msg)) => Err(WireError::Server(
                String::from_utf8_lossy(msg).into_owned(),
            )),
            _ => Err(WireError::UnexpectedReply(
                "the reply does not have exactly one integer response".to_string(),
            )),
        };
        self.track(result)
    }

    /// `EXISTS key`: whether the server holds `key`
    pub fn exists(&mut self, key: &[u8]) -> Result<bool> {
        let count = self.request_integer(&[Value::text("EXISTS"), Value::binary(key)])?;
        Ok(count > 0)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn usable(stream: &mut Option<S>, broken: bool) -> Result<&mut S> {
        if broken {
            return Err(WireError::Connection(
                "connection is unusable after a previous failure".to_string(),
            ));
        }
        stream
            .as_mut()
            .ok_or_else(|| WireError::Parameter("Invalid socket: no stream attached".to_string()))
    }

    /// Record a failure in the last-error slot, breaking the connection if it is fatal
    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_fatal() && !self.broken {
                self.broken = true;
                tracing::warn!("Connection to {} is no longer usable: {}", self.peer_addr, e);
            }
            self.last_error = Some(e.to_string());
        }
        result
    }
}

impl Connection<TcpStream> {
    /// Create a connection and connect it to the configured host and port
    pub fn open(config: ClientConfig) -> Result<Self> {
        let mut conn = Self::new(config);
        conn.connect_default()?;
        Ok(conn)
    }

    /// Connect to the host and port from the config
    pub fn connect_default(&mut self) -> Result<()> {
        let host = self.config.host.clone();
        let port = self.config.port;
        self.connect(&host, port)
    }

    /// Resolve `host` and connect to the first address that accepts.
    ///
    /// An empty host means `localhost`; port 0 means 6379.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        let result = self.try_connect(host, port);
        self.track(result)
    }

    fn try_connect(&mut self, host: &str, port: u16) -> Result<()> {
        let host = if host.is_empty() { DEFAULT_HOST } else { host };
        let port = if port == 0 { DEFAULT_PORT } else { port };

        let addrs = (host, port).to_socket_addrs().map_err(|e| {
            WireError::Connection(format!("Error resolving hostname {}: {}", host, e))
        })?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect(addr) {
                Ok(stream) => {
                    self.configure(&stream)?;
                    self.attach(stream);
                    self.peer_addr = addr.to_string();
                    tracing::debug!("Connected to {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::debug!("Connect attempt to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        Err(WireError::Connection(match last_err {
            Some(e) => format!("Error connecting to server {}:{}: {}", host, port, e),
            None => format!("Error resolving hostname {}: no addresses found", host),
        }))
    }

    /// Apply socket options from the config
    fn configure(&self, stream: &TcpStream) -> Result<()> {
        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(self.config.nodelay)?;
        stream.set_read_timeout(self.config.read_timeout())?;
        stream.set_write_timeout(self.config.write_timeout())?;
        Ok(())
    }
}

impl<S: Read + Write> std::fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("peer_addr", &self.peer_addr)
            .field("attached", &self.stream.is_some())
            .field("broken", &self.broken)
            .field("buffered", &self.buffer.len())
            .field("pending_replies", &self.replies.len())
            .field("phase", &self.decoder.phase())
            .finish()
    }
}
