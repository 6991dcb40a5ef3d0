//! Configuration for redwire
//!
//! Centralized client configuration with sensible defaults.

use std::time::Duration;

/// Default server port
pub const DEFAULT_PORT: u16 = 6379;

/// Default server host
pub const DEFAULT_HOST: &str = "localhost";

/// Upper bound applied to `max_bulk_len`
pub const MAX_BULK_LEN_CEILING: usize = i32::MAX as usize;

/// Client-side configuration for a [`Connection`](crate::network::Connection)
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// Server host used by `connect_default`
    pub host: String,

    /// Server port used by `connect_default`
    pub port: u16,

    /// Socket read timeout (milliseconds, 0 = block indefinitely)
    pub read_timeout_ms: u64,

    /// Socket write timeout (milliseconds, 0 = block indefinitely)
    pub write_timeout_ms: u64,

    /// Disable Nagle's algorithm on connected sockets
    pub nodelay: bool,

    // -------------------------------------------------------------------------
    // Buffer Configuration
    // -------------------------------------------------------------------------
    /// Receive buffer capacity allocated up front (in bytes)
    pub initial_buffer_capacity: usize,

    /// Minimum free space reserved before each receive (in bytes)
    pub read_chunk_size: usize,

    // -------------------------------------------------------------------------
    // Decoder Limits
    // -------------------------------------------------------------------------
    /// Largest bulk payload accepted from the server (in bytes)
    pub max_bulk_len: usize,

    /// Largest multi-bulk element count accepted from the server
    pub max_multi_bulk_len: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            nodelay: true,
            initial_buffer_capacity: 128,
            read_chunk_size: 4096,
            max_bulk_len: 512 * 1024 * 1024, // 512 MB
            max_multi_bulk_len: 1024 * 1024,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    pub(crate) fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    pub(crate) fn write_timeout(&self) -> Option<Duration> {
        (self.write_timeout_ms > 0).then(|| Duration::from_millis(self.write_timeout_ms))
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the server host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Enable or disable TCP_NODELAY
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.config.nodelay = nodelay;
        self
    }

    /// Set the initial receive buffer capacity (in bytes)
    pub fn initial_buffer_capacity(mut self, size: usize) -> Self {
        self.config.initial_buffer_capacity = size;
        self
    }

    /// Set the minimum receive size (in bytes)
    pub fn read_chunk_size(mut self, size: usize) -> Self {
        self.config.read_chunk_size = size;
        self
    }

    /// Set the largest accepted bulk payload (in bytes), capped at `MAX_BULK_LEN_CEILING`
    pub fn max_bulk_len(mut self, len: usize) -> Self {
        self.config.max_bulk_len = len.min(MAX_BULK_LEN_CEILING);
        self
    }

    /// Set the largest accepted multi-bulk element count
    pub fn max_multi_bulk_len(mut self, len: usize) -> Self {
        self.config.max_multi_bulk_len = len;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
