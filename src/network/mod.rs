//! Network Module
//!
//! Blocking client connections.
//!
//! ## Architecture
//! - One stream per connection, driven by one caller
//! - Commands encoded straight onto the stream
//! - Replies decoded incrementally from a receive buffer

mod connection;

pub use connection::Connection;
