use crate::client_manager::ClientId;
use std::io;
use std::path::PathBuf;

/// Errors that stop the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to read dictionary {path}")]
    Dictionary {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("dictionary {path} contains no usable words")]
    EmptyDictionary { path: PathBuf },

    #[error("failed to listen on port {port}")]
    Listen {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("failed to accept connection")]
    Accept(#[source] io::Error),
}

/// A recipient went away in the middle of a fan-out.
///
/// Callers remove `client` and re-issue the operation against the remaining
/// players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("client {client} disconnected during send")]
pub struct SendError {
    pub client: ClientId,
}
