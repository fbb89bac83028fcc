use std::{net::SocketAddr, time::Duration};

pub const DEFAULT_PORT: u16 = 6379;

/**
 * Server settings, compiled in
 */
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    /// Listens on all interfaces
    pub bind_addr: SocketAddr,
    /// Initial capacity of each connection's read buffer
    pub read_buffer_capacity: usize,
    /// Largest incomplete frame a connection may buffer before it is dropped
    pub max_frame_bytes: usize,
    /// Period of the background purge of expired keys
    pub sweep_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            read_buffer_capacity: 4 * 1024,
            max_frame_bytes: 512 * 1024,
            sweep_interval: Duration::from_millis(100),
        }
    }
}
