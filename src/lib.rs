//! # redwire
//!
//! A blocking client for the RESP wire protocol with:
//! - Byte-exact command encoding (inline, bulk and multi-bulk)
//! - A resumable reply decoder that makes progress on partial reads
//! - A FIFO of completed replies for pipelined commands
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Connection                             │
//! │          (stream, last error, single caller)                 │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │ send                             │ read
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │ CommandEncoder  │                │   ByteBuffer    │
//!   │ (Value → bytes) │                │ (partial reads) │
//!   └─────────────────┘                └────────┬────────┘
//!                                               ▼
//!                                      ┌─────────────────┐
//!                                      │  ReplyDecoder   │
//!                                      │ (state machine) │
//!                                      └────────┬────────┘
//!                                               ▼
//!                                      ┌─────────────────┐
//!                                      │   ReplyQueue    │
//!                                      │     (FIFO)      │
//!                                      └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use redwire::{ClientConfig, Connection, Value};
//!
//! let mut conn = Connection::open(ClientConfig::default())?;
//! conn.send_multi_bulk(&[Value::text("SET"), Value::text("key"), Value::binary(b"\x00\x01")])?;
//! while conn.pending_replies() == 0 {
//!     conn.read()?;
//! }
//! if let Some(reply) = conn.pop_reply() {
//!     println!("{}", reply);
//! }
//! # Ok::<(), redwire::WireError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod buffer;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{BinaryArgumentReason, Result, WireError};
pub use config::ClientConfig;
pub use network::Connection;
pub use protocol::{Encoding, Reply, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of redwire
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
