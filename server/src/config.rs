//! Server configuration.

use shared::{DEFAULT_PORT, MAX_LINE_LEN, MAX_NAME_LEN};

/// Wrong guesses allowed per round.
pub const MAX_GUESSES: u8 = 4;

/// Pending connections the listening socket queues before refusing.
pub const MAX_QUEUE: u32 = 5;

/// Messages queued for one client before it counts as disconnected.
pub const OUTBOX_CAPACITY: usize = 64;

/// Tunables for a server instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// TCP port to listen on (0 picks an ephemeral port)
    pub port: u16,
    /// Listen backlog
    pub backlog: u32,
    /// Wrong guesses allowed before a round is lost
    pub max_guesses: u8,
    /// Longest inbound line, terminator included
    pub max_line_len: usize,
    /// Longest accepted player name, in characters
    pub max_name_len: usize,
    /// Outbound messages buffered per client while its socket is busy
    pub outbox_capacity: usize,
}

impl ServerConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_max_guesses(mut self, max_guesses: u8) -> Self {
        self.max_guesses = max_guesses;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            backlog: MAX_QUEUE,
            max_guesses: MAX_GUESSES,
            max_line_len: MAX_LINE_LEN,
            max_name_len: MAX_NAME_LEN,
            outbox_capacity: OUTBOX_CAPACITY,
        }
    }
}
