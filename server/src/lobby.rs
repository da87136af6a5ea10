//! Event handling for the word game server
//!
//! The lobby ties the client registry to the game engine. It runs every event
//! to completion: a line read from a client is routed, evaluated and fanned
//! out before the next event is looked at. When a send fails, the recipient is
//! removed (turn pointer first) and the fan-out that failed is re-issued
//! against the smaller player list, until a pass goes through cleanly or no
//! players are left.

use crate::broadcast::{announce_turn, announce_winner, broadcast, send_to};
use crate::client_manager::{Client, ClientId, ClientManager};
use crate::config::ServerConfig;
use crate::dictionary::Dictionary;
use crate::error::SendError;
use crate::game::{Effect, GameState};
use log::{info, warn};
use shared::{DUPLICATE_NAME_MSG, EMPTY_NAME_MSG, LONG_NAME_MSG, NEW_GAME_MSG, WELCOME_MSG};
use std::collections::VecDeque;
use std::net::SocketAddr;
use tokio::sync::mpsc;

pub struct Lobby {
    clients: ClientManager,
    game: GameState,
    dictionary: Dictionary,
    max_name_len: usize,
    /// Clients removed since the last `take_closed`
    closed: Vec<ClientId>,
}

impl Lobby {
    pub fn new(mut dictionary: Dictionary, config: &ServerConfig) -> Self {
        let game = GameState::new(dictionary.random_word(), config.max_guesses);
        Self {
            clients: ClientManager::new(),
            game,
            dictionary,
            max_name_len: config.max_name_len,
            closed: Vec::new(),
        }
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn allocate_id(&mut self) -> ClientId {
        self.clients.allocate_id()
    }

    /// Ids removed from the registry since the last call.
    ///
    /// The multiplexer unwatches these so its watch set matches the registry.
    pub fn take_closed(&mut self) -> Vec<ClientId> {
        std::mem::take(&mut self.closed)
    }

    /// Adds a new connection to Pending and greets it.
    pub fn admit(&mut self, id: ClientId, addr: SocketAddr, outbox: mpsc::Sender<String>) {
        let client = Client::new(id, addr, outbox);
        let greeting = client.send(WELCOME_MSG);
        self.clients.add_pending(client);

        if greeting.is_err() {
            warn!("Write to client {} {} failed", id, addr);
            self.discard(id);
        }
    }

    /// Routes a line from a Pending or Active client.
    pub fn handle_line(&mut self, id: ClientId, line: &str) {
        if self.clients.is_pending(id) {
            self.handle_name(id, line);
        } else if let Some(client) = self.clients.get(id) {
            let name = client.name.clone();
            let order = self.clients.active_ids();
            let effects = self.game.handle_line(id, &name, line, &order);
            self.run_effects(effects);
        } else {
            warn!("Line from client {}, but I don't know about it", id);
        }
    }

    /// The connection closed on the client's side.
    pub fn handle_disconnect(&mut self, id: ClientId) {
        if !self.clients.is_pending(id) && !self.clients.is_active(id) {
            warn!("Disconnect from client {}, but I don't know about it", id);
            return;
        }
        let farewell = self.detach(id);
        self.run_effects(farewell);
    }

    fn handle_name(&mut self, id: ClientId, name: &str) {
        let feedback = if name.is_empty() {
            Some(EMPTY_NAME_MSG)
        } else if name.chars().count() > self.max_name_len {
            Some(LONG_NAME_MSG)
        } else if self.clients.name_taken(name) {
            Some(DUPLICATE_NAME_MSG)
        } else {
            None
        };

        if let Some(message) = feedback {
            info!("Client {} offered unusable name {:?}", id, name);
            let sent = self
                .clients
                .pending_mut(id)
                .map_or(Ok(()), |client| client.send(message));
            if sent.is_err() {
                self.discard(id);
            }
            return;
        }

        if let Some(client) = self.clients.pending_mut(id) {
            client.name = name.to_string();
        }
        if !self.clients.promote(id) {
            return;
        }

        let order = self.clients.active_ids();
        let effects = self.game.player_joined(id, name, &order);
        self.run_effects(effects);
    }

    /// Delivers effects in order, recovering from failed recipients.
    ///
    /// A failed recipient is detached and its farewell runs first; then the
    /// effect that failed is tried again from the start.
    fn run_effects(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            if let Err(SendError { client }) = self.deliver(&effect) {
                warn!("Client {} disconnected during send", client);
                let farewell = self.detach(client);
                queue.push_front(effect);
                for follow_up in farewell.into_iter().rev() {
                    queue.push_front(follow_up);
                }
            }
        }
    }

    fn deliver(&mut self, effect: &Effect) -> Result<(), SendError> {
        match effect {
            Effect::Send { to, message } => send_to(&self.clients, *to, message),
            Effect::Broadcast(message) => broadcast(&self.clients, message),
            Effect::Status => broadcast(&self.clients, &self.game.round().status()),
            Effect::AnnounceTurn => announce_turn(&self.clients, self.game.turn()),
            Effect::AnnounceWinner { winner, name, word } => {
                announce_winner(&self.clients, *winner, name, word)
            }
            Effect::Restart => {
                broadcast(&self.clients, NEW_GAME_MSG)?;
                let word = self.dictionary.random_word();
                self.game.restart(word);
                Ok(())
            }
        }
    }

    /// Removes a client from whichever list holds it.
    ///
    /// For an active player the turn pointer is repaired before removal and
    /// the returned effects tell the rest of the table.
    fn detach(&mut self, id: ClientId) -> Vec<Effect> {
        let farewell = match self.clients.get(id) {
            Some(client) => {
                let name = client.name.clone();
                let order = self.clients.active_ids();
                self.game.player_leaving(id, &name, &order)
            }
            None => Vec::new(),
        };
        self.discard(id);
        farewell
    }

    fn discard(&mut self, id: ClientId) {
        if self.clients.remove(id).is_some() {
            self.closed.push(id);
        }
    }
}
