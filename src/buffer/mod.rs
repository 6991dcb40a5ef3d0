//! Buffer Module
//!
//! Receive-side byte storage shared by the connection and the reply decoder.
//!
//! ## Layout
//! ```text
//! ┌──────────────┬──────────────────────┬───────────────────┐
//! │  consumed    │      live data       │   available       │
//! └──────────────┴──────────────────────┴───────────────────┘
//! 0            start             start + len          capacity
//! ```

mod byte_buffer;

pub use byte_buffer::ByteBuffer;
