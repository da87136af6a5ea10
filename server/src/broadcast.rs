//! Fan-out of game messages to the active players.
//!
//! Every function stops at the first recipient that cannot be reached and
//! reports it as a `SendError`. None of them remove anybody; recovery belongs
//! to the caller, which drops the failed client and re-issues the whole call.

use crate::client_manager::{ClientId, ClientManager};
use crate::error::SendError;
use log::{info, warn};
use shared::{turn_msg, winner_msg, word_msg, GUESS_PROMPT_MSG, WIN_MSG};

/// Sends `message` to every active client in turn order.
///
/// An empty list is trivially a success.
pub fn broadcast(clients: &ClientManager, message: &str) -> Result<(), SendError> {
    for client in clients.active() {
        client.send(message)?;
    }
    Ok(())
}

/// Prompts the turn holder and tells everyone else whose turn it is.
pub fn announce_turn(clients: &ClientManager, turn: Option<ClientId>) -> Result<(), SendError> {
    let Some(holder) = turn else {
        return Ok(());
    };
    let Some(player) = clients.get(holder) else {
        warn!("Turn holder {} is not an active client", holder);
        return Ok(());
    };

    let notice = turn_msg(&player.name);
    info!("It's {}'s turn", player.name);

    for client in clients.active() {
        if client.id == holder {
            client.send(GUESS_PROMPT_MSG)?;
        } else {
            client.send(&notice)?;
        }
    }
    Ok(())
}

/// Reveals the word, then congratulates `winner` and tells the rest who won.
pub fn announce_winner(
    clients: &ClientManager,
    winner: ClientId,
    name: &str,
    word: &str,
) -> Result<(), SendError> {
    broadcast(clients, &word_msg(word))?;

    let notice = winner_msg(name);
    for client in clients.active() {
        if client.id == winner {
            client.send(WIN_MSG)?;
        } else {
            client.send(&notice)?;
        }
    }
    Ok(())
}

/// Sends `message` to one active client; an unknown id is skipped.
pub fn send_to(clients: &ClientManager, to: ClientId, message: &str) -> Result<(), SendError> {
    match clients.get(to) {
        Some(client) => client.send(message),
        None => Ok(()),
    }
}
