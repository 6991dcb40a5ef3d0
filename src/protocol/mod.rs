//! Protocol Module
//!
//! Client side of the RESP wire protocol.
//!
//! ## Request Encodings
//! ```text
//! Inline     SET key value\r\n
//! Bulk       SET key 5\r\nvalue\r\n
//! MultiBulk  *3\r\n$3\r\nSET\r\n$3\r\nkey\r\n$5\r\nvalue\r\n
//! ```
//!
//! ## Reply Types
//! - `+` status line    → [`Value::Text`]
//! - `-` error line     → [`Value::Error`]
//! - `:` integer line   → [`Value::Integer`]
//! - `$N` bulk payload  → [`Value::Binary`] (`$-1` → [`Value::Nil`])
//! - `*N` multi-bulk    → a [`Reply`] of N elements

mod decoder;
pub mod encoder;
mod reply;
mod value;

pub use decoder::{DecoderPhase, ReplyDecoder};
pub use encoder::{encode_command, validate, write_command, Encoding};
pub use reply::{Reply, ReplyQueue};
pub use value::Value;
