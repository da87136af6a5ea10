//! Client registry for the word game server
//!
//! Every live connection is owned by exactly one of two lists:
//! - Pending: connected, still choosing a name
//! - Active: named players who take turns and receive broadcasts
//!
//! Promotion moves a client from Pending to Active. Removal searches both
//! lists, so a connection can be dropped from any state. The multiplexer's
//! watch set is kept in step by the caller, which unwatches every id this
//! registry removes.

use crate::error::SendError;
use log::{info, warn};
use std::fmt;
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Server-assigned connection identity, never reused within a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u32);

impl ClientId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One connected client
///
/// Outbound text goes through `outbox` to the connection's writer task. A send
/// reports a `SendError` once that task has stopped (the socket failed or the
/// peer left) or when the outbox is full because the peer stopped reading.
#[derive(Debug)]
pub struct Client {
    pub id: ClientId,
    pub addr: SocketAddr,
    /// Empty until the naming handshake completes
    pub name: String,
    outbox: mpsc::Sender<String>,
}

impl Client {
    pub fn new(id: ClientId, addr: SocketAddr, outbox: mpsc::Sender<String>) -> Self {
        Self {
            id,
            addr,
            name: String::new(),
            outbox,
        }
    }

    pub fn send(&self, message: &str) -> Result<(), SendError> {
        self.outbox.try_send(message.to_string()).map_err(|e| {
            if let TrySendError::Full(_) = e {
                warn!("Client {} is not reading, outbox full", self.id);
            }
            SendError { client: self.id }
        })
    }
}

/// Owns the Pending and Active client lists
#[derive(Debug)]
pub struct ClientManager {
    pending: Vec<Client>,
    /// Join order; turn order and broadcast order follow it
    active: Vec<Client>,
    next_client_id: u32,
}

impl ClientManager {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            active: Vec::new(),
            next_client_id: 1,
        }
    }

    /// Reserves the id for a connection about to be added
    pub fn allocate_id(&mut self) -> ClientId {
        let id = ClientId(self.next_client_id);
        self.next_client_id += 1;
        id
    }

    /// Registers a freshly accepted connection as Pending
    pub fn add_pending(&mut self, client: Client) {
        info!("Adding client {} {}", client.id, client.addr);
        self.pending.insert(0, client);
    }

    /// Moves a client from Pending to the end of Active.
    ///
    /// Returns false when `id` is not pending.
    pub fn promote(&mut self, id: ClientId) -> bool {
        match self.pending.iter().position(|c| c.id == id) {
            Some(index) => {
                let client = self.pending.remove(index);
                self.active.push(client);
                true
            }
            None => {
                warn!("Cannot promote client {}: not pending", id);
                false
            }
        }
    }

    /// Unlinks a client from whichever list holds it.
    ///
    /// Dropping the returned client closes its outbound channel. Callers that
    /// track the turn must repair it before calling this.
    pub fn remove(&mut self, id: ClientId) -> Option<Client> {
        let removed = if let Some(index) = self.pending.iter().position(|c| c.id == id) {
            Some(self.pending.remove(index))
        } else if let Some(index) = self.active.iter().position(|c| c.id == id) {
            Some(self.active.remove(index))
        } else {
            None
        };

        match &removed {
            Some(client) => info!("Removing client {} {}", client.id, client.addr),
            None => warn!("Trying to remove client {}, but I don't know about it", id),
        }
        removed
    }

    pub fn pending_mut(&mut self, id: ClientId) -> Option<&mut Client> {
        self.pending.iter_mut().find(|c| c.id == id)
    }

    /// Looks up an Active client
    pub fn get(&self, id: ClientId) -> Option<&Client> {
        self.active.iter().find(|c| c.id == id)
    }

    pub fn is_pending(&self, id: ClientId) -> bool {
        self.pending.iter().any(|c| c.id == id)
    }

    pub fn is_active(&self, id: ClientId) -> bool {
        self.active.iter().any(|c| c.id == id)
    }

    pub fn name_taken(&self, name: &str) -> bool {
        self.active.iter().any(|c| c.name == name)
    }

    pub fn active(&self) -> &[Client] {
        &self.active
    }

    /// Active ids in turn order
    pub fn active_ids(&self) -> Vec<ClientId> {
        self.active.iter().map(|c| c.id).collect()
    }

    #[cfg(test)]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[cfg(test)]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Total live connections across both lists
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.pending.len() + self.active.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.active.is_empty()
    }
}
