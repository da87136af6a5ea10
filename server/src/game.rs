//! Turn-based word guessing state machine.
//!
//! `GameState` owns the current `Round` and the turn pointer. Its transition
//! methods never touch sockets: they update state and return the `Effect`s the
//! server must deliver, in order.

use crate::client_manager::ClientId;
use log::{debug, info};
use shared::{
    goodbye_msg, guess_msg, joined_msg, lost_msg, miss_msg, repeat_msg, status_msg,
    INVALID_GUESS_MSG, NOT_TURN_MSG,
};

const ALPHABET: usize = 26;

/// Where the engine sits between events.
///
/// A finished round stays `RoundWon` or `RoundLost` until `restart` swaps in
/// the next word; guesses are refused until then.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NoPlayers,
    WaitingForTurn,
    RoundWon,
    RoundLost,
}

/// Result of scoring one letter against the secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Letter was tried earlier this round; nothing changed
    Repeated,
    Hit { solved: bool },
    Miss { exhausted: bool },
}

/// Work the server performs after a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Send { to: ClientId, message: String },
    Broadcast(String),
    /// Broadcast the status block of whatever round is current on delivery
    Status,
    /// Prompt the turn holder, tell everyone else whose turn it is
    AnnounceTurn,
    AnnounceWinner { winner: ClientId, name: String, word: String },
    /// Announce and start a fresh round
    Restart,
}

/// One round: a secret word and the progress made on it.
#[derive(Debug, Clone)]
pub struct Round {
    word: String,
    revealed: Vec<u8>,
    guessed: [bool; ALPHABET],
    guesses_left: u8,
}

impl Round {
    /// `word` must be lowercase ASCII letters.
    pub fn new(word: String, max_guesses: u8) -> Self {
        let revealed = vec![b'-'; word.len()];
        Self {
            word,
            revealed,
            guessed: [false; ALPHABET],
            guesses_left: max_guesses,
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn revealed(&self) -> String {
        String::from_utf8_lossy(&self.revealed).into_owned()
    }

    pub fn guesses_left(&self) -> u8 {
        self.guesses_left
    }

    pub fn is_guessed(&self, letter: char) -> bool {
        letter_index(letter).is_some_and(|i| self.guessed[i])
    }

    /// Letters tried so far, alphabetically
    pub fn guessed_letters(&self) -> impl Iterator<Item = char> + '_ {
        self.guessed
            .iter()
            .enumerate()
            .filter(|(_, tried)| **tried)
            .map(|(i, _)| (b'a' + i as u8) as char)
    }

    pub fn is_solved(&self) -> bool {
        self.revealed == self.word.as_bytes()
    }

    pub fn status(&self) -> String {
        status_msg(&self.revealed(), self.guesses_left, self.guessed_letters())
    }

    /// Scores `letter`, which must be in `a..=z`.
    ///
    /// Only a first-time miss costs a guess; a repeat changes nothing.
    pub fn evaluate(&mut self, letter: char) -> GuessOutcome {
        let Some(index) = letter_index(letter) else {
            return GuessOutcome::Repeated;
        };
        if self.guessed[index] {
            return GuessOutcome::Repeated;
        }
        self.guessed[index] = true;

        let byte = letter as u8;
        let mut found = false;
        for (slot, &b) in self.revealed.iter_mut().zip(self.word.as_bytes()) {
            if b == byte {
                *slot = byte;
                found = true;
            }
        }

        if found {
            GuessOutcome::Hit {
                solved: self.is_solved(),
            }
        } else {
            self.guesses_left = self.guesses_left.saturating_sub(1);
            GuessOutcome::Miss {
                exhausted: self.guesses_left == 0,
            }
        }
    }
}

fn letter_index(letter: char) -> Option<usize> {
    letter
        .is_ascii_lowercase()
        .then(|| (letter as u8 - b'a') as usize)
}

/// A guess is exactly one lowercase letter.
pub fn parse_guess(line: &str) -> Option<char> {
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Some(c),
        _ => None,
    }
}

/// The entry after `current` in `order`, wrapping to the front.
///
/// A missing or unknown `current` also starts from the front.
pub fn next_in_order(current: Option<ClientId>, order: &[ClientId]) -> Option<ClientId> {
    let position = current.and_then(|c| order.iter().position(|&id| id == c));
    match position {
        Some(i) if i + 1 < order.len() => Some(order[i + 1]),
        _ => order.first().copied(),
    }
}

/// Authoritative game state for the whole server
#[derive(Debug, Clone)]
pub struct GameState {
    round: Round,
    turn: Option<ClientId>,
    phase: Phase,
    max_guesses: u8,
}

impl GameState {
    pub fn new(word: String, max_guesses: u8) -> Self {
        info!("New game");
        debug!("Secret word is {}", word);
        Self {
            round: Round::new(word, max_guesses),
            turn: None,
            phase: Phase::NoPlayers,
            max_guesses,
        }
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    pub fn turn(&self) -> Option<ClientId> {
        self.turn
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Replaces the round; players and the turn pointer carry over.
    pub fn restart(&mut self, word: String) {
        info!("New game");
        debug!("Secret word is {}", word);
        self.round = Round::new(word, self.max_guesses);
        self.phase = match self.turn {
            Some(_) => Phase::WaitingForTurn,
            None => Phase::NoPlayers,
        };
    }

    /// A named client was just appended to `order`.
    pub fn player_joined(&mut self, id: ClientId, name: &str, order: &[ClientId]) -> Vec<Effect> {
        info!("{} has just joined", name);
        if self.turn.is_none() {
            self.turn = next_in_order(None, order);
            self.phase = Phase::WaitingForTurn;
        }

        vec![
            Effect::Broadcast(joined_msg(name)),
            Effect::Send {
                to: id,
                message: self.round.status(),
            },
            Effect::AnnounceTurn,
        ]
    }

    /// An active client is about to be removed from `order`.
    ///
    /// Must run before the removal: if `id` holds the turn it passes to the
    /// next player, or to nobody when `id` was the last one.
    pub fn player_leaving(&mut self, id: ClientId, name: &str, order: &[ClientId]) -> Vec<Effect> {
        info!("Disconnect from {}", name);
        if self.turn == Some(id) {
            self.turn = next_in_order(Some(id), order).filter(|&next| next != id);
        }

        if order.iter().all(|&other| other == id) {
            self.turn = None;
            self.phase = Phase::NoPlayers;
            return Vec::new();
        }

        vec![Effect::Broadcast(goodbye_msg(name)), Effect::AnnounceTurn]
    }

    /// Routes one line from an active client.
    pub fn handle_line(
        &mut self,
        from: ClientId,
        name: &str,
        line: &str,
        order: &[ClientId],
    ) -> Vec<Effect> {
        if matches!(self.phase, Phase::RoundWon | Phase::RoundLost) {
            debug!("Round is over, ignoring {:?} from {}", line, from);
            return Vec::new();
        }

        if self.turn != Some(from) {
            if line.is_empty() {
                return Vec::new();
            }
            return vec![Effect::Send {
                to: from,
                message: NOT_TURN_MSG.to_string(),
            }];
        }

        match parse_guess(line) {
            Some(letter) => self.evaluate_guess(from, name, letter, order),
            None => vec![Effect::Send {
                to: from,
                message: INVALID_GUESS_MSG.to_string(),
            }],
        }
    }

    fn evaluate_guess(
        &mut self,
        from: ClientId,
        name: &str,
        letter: char,
        order: &[ClientId],
    ) -> Vec<Effect> {
        let mut effects = vec![Effect::Broadcast(guess_msg(name, letter))];

        match self.round.evaluate(letter) {
            GuessOutcome::Repeated => {
                info!("Letter {} was already guessed", letter);
                effects.push(Effect::Send {
                    to: from,
                    message: repeat_msg(letter),
                });
                self.advance_turn(order);
            }
            GuessOutcome::Hit { solved: false } => {
                info!("Letter {} is in the word", letter);
            }
            GuessOutcome::Hit { solved: true } => {
                info!("Game over! {} won!", name);
                self.phase = Phase::RoundWon;
                effects.push(Effect::AnnounceWinner {
                    winner: from,
                    name: name.to_string(),
                    word: self.round.word().to_string(),
                });
                effects.push(Effect::Restart);
            }
            GuessOutcome::Miss { exhausted } => {
                info!("Letter {} is not in the word", letter);
                effects.push(Effect::Send {
                    to: from,
                    message: miss_msg(letter),
                });
                self.advance_turn(order);
                if exhausted {
                    info!("No guesses left, the word was {}", self.round.word());
                    self.phase = Phase::RoundLost;
                    effects.push(Effect::Broadcast(lost_msg(self.round.word())));
                    effects.push(Effect::Restart);
                }
            }
        }

        effects.push(Effect::Status);
        effects.push(Effect::AnnounceTurn);
        effects
    }

    fn advance_turn(&mut self, order: &[ClientId]) {
        self.turn = next_in_order(self.turn, order);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: u32) -> Vec<ClientId> {
        (1..=n).map(ClientId::new).collect()
    }

    fn game_with(word: &str, max_guesses: u8, order: &[ClientId]) -> GameState {
        let mut game = GameState::new(word.to_string(), max_guesses);
        for (i, &id) in order.iter().enumerate() {
            game.player_joined(id, &format!("p{}", i), &order[..=i]);
        }
        game
    }

    #[test]
    fn test_round_starts_hidden() {
        let round = Round::new("cat".to_string(), 4);
        assert_eq!(round.revealed(), "---");
        assert_eq!(round.guesses_left(), 4);
        assert_eq!(round.guessed_letters().count(), 0);
        assert!(!round.is_solved());
    }

    #[test]
    fn test_hit_reveals_every_position() {
        let mut round = Round::new("banana".to_string(), 4);
        assert_eq!(round.evaluate('a'), GuessOutcome::Hit { solved: false });
        assert_eq!(round.revealed(), "-a-a-a");
        assert_eq!(round.guesses_left(), 4);
    }

    #[test]
    fn test_miss_costs_one_guess() {
        let mut round = Round::new("cat".to_string(), 2);
        assert_eq!(round.evaluate('z'), GuessOutcome::Miss { exhausted: false });
        assert_eq!(round.guesses_left(), 1);
        assert_eq!(round.evaluate('y'), GuessOutcome::Miss { exhausted: true });
        assert_eq!(round.guesses_left(), 0);
    }

    #[test]
    fn test_repeat_changes_nothing() {
        let mut round = Round::new("cat".to_string(), 4);
        round.evaluate('z');
        round.evaluate('c');

        assert_eq!(round.evaluate('z'), GuessOutcome::Repeated);
        assert_eq!(round.evaluate('c'), GuessOutcome::Repeated);
        assert_eq!(round.guesses_left(), 3);
        assert_eq!(round.revealed(), "c--");
        assert_eq!(round.guessed_letters().collect::<String>(), "cz");
    }

    #[test]
    fn test_guesses_never_negative_and_reveals_only_guessed() {
        let mut round = Round::new("abc".to_string(), 3);
        for letter in "zyxwvutabc".chars() {
            let before = round.revealed();
            round.evaluate(letter);
            let after = round.revealed();
            for (b, a) in before.bytes().zip(after.bytes()) {
                if b != b'-' {
                    assert_eq!(a, b);
                }
            }
            for c in after.chars().filter(|&c| c != '-') {
                assert!(round.is_guessed(c));
            }
        }
        assert_eq!(round.guesses_left(), 0);
    }

    #[test]
    fn test_parse_guess() {
        assert_eq!(parse_guess("e"), Some('e'));
        assert_eq!(parse_guess(""), None);
        assert_eq!(parse_guess("E"), None);
        assert_eq!(parse_guess("ab"), None);
        assert_eq!(parse_guess("1"), None);
        assert_eq!(parse_guess("é"), None);
    }

    #[test]
    fn test_next_in_order_wraps() {
        let order = ids(3);
        assert_eq!(next_in_order(None, &order), Some(order[0]));
        assert_eq!(next_in_order(Some(order[0]), &order), Some(order[1]));
        assert_eq!(next_in_order(Some(order[2]), &order), Some(order[0]));
        assert_eq!(next_in_order(Some(ClientId::new(42)), &order), Some(order[0]));
        assert_eq!(next_in_order(None, &[]), None);
    }

    #[test]
    fn test_first_player_gets_turn() {
        let order = ids(1);
        let mut game = GameState::new("cat".to_string(), 4);
        assert_eq!(game.phase(), Phase::NoPlayers);

        let effects = game.player_joined(order[0], "ann", &order);

        assert_eq!(game.turn(), Some(order[0]));
        assert_eq!(game.phase(), Phase::WaitingForTurn);
        assert_eq!(effects.len(), 3);
        assert_eq!(effects[2], Effect::AnnounceTurn);
    }

    #[test]
    fn test_later_joins_keep_turn() {
        let order = ids(3);
        let game = game_with("cat", 4, &order);
        assert_eq!(game.turn(), Some(order[0]));
    }

    #[test]
    fn test_not_your_turn() {
        let order = ids(2);
        let mut game = game_with("cat", 4, &order);

        let effects = game.handle_line(order[1], "p1", "c", &order);
        assert_eq!(
            effects,
            vec![Effect::Send {
                to: order[1],
                message: NOT_TURN_MSG.to_string()
            }]
        );
        assert!(game.handle_line(order[1], "p1", "", &order).is_empty());
        assert!(!game.round().is_guessed('c'));
    }

    #[test]
    fn test_invalid_guess_keeps_turn() {
        let order = ids(2);
        let mut game = game_with("cat", 4, &order);

        let effects = game.handle_line(order[0], "p0", "cc", &order);
        assert_eq!(
            effects,
            vec![Effect::Send {
                to: order[0],
                message: INVALID_GUESS_MSG.to_string()
            }]
        );
        assert_eq!(game.turn(), Some(order[0]));
        assert_eq!(game.round().guesses_left(), 4);
    }

    #[test]
    fn test_hit_keeps_turn() {
        let order = ids(2);
        let mut game = game_with("cat", 4, &order);

        let effects = game.handle_line(order[0], "p0", "a", &order);
        assert_eq!(effects[0], Effect::Broadcast(guess_msg("p0", 'a')));
        assert_eq!(game.turn(), Some(order[0]));
        assert_eq!(game.phase(), Phase::WaitingForTurn);
        assert_eq!(effects.last(), Some(&Effect::AnnounceTurn));
    }

    #[test]
    fn test_miss_advances_turn() {
        let order = ids(3);
        let mut game = game_with("cat", 4, &order);

        game.handle_line(order[0], "p0", "z", &order);
        assert_eq!(game.turn(), Some(order[1]));
        game.handle_line(order[1], "p1", "y", &order);
        assert_eq!(game.turn(), Some(order[2]));
        game.handle_line(order[2], "p2", "x", &order);
        assert_eq!(game.turn(), Some(order[0]));
        assert_eq!(game.round().guesses_left(), 1);
    }

    #[test]
    fn test_repeat_consumes_turn_only() {
        let order = ids(2);
        let mut game = game_with("cat", 4, &order);
        game.handle_line(order[0], "p0", "c", &order);
        game.handle_line(order[0], "p0", "z", &order);

        let effects = game.handle_line(order[1], "p1", "c", &order);

        assert!(effects.contains(&Effect::Send {
            to: order[1],
            message: repeat_msg('c')
        }));
        assert_eq!(game.turn(), Some(order[0]));
        assert_eq!(game.round().guesses_left(), 3);
        assert_eq!(game.round().revealed(), "c--");
    }

    #[test]
    fn test_win_announces_then_restarts() {
        let order = ids(1);
        let mut game = game_with("cat", 4, &order);
        game.handle_line(order[0], "p0", "c", &order);
        game.handle_line(order[0], "p0", "a", &order);

        let effects = game.handle_line(order[0], "p0", "t", &order);

        let winner = effects
            .iter()
            .position(|e| matches!(e, Effect::AnnounceWinner { .. }))
            .unwrap();
        let restart = effects.iter().position(|e| *e == Effect::Restart).unwrap();
        assert!(winner < restart);
        assert_eq!(game.phase(), Phase::RoundWon);
        assert_eq!(
            effects[winner],
            Effect::AnnounceWinner {
                winner: order[0],
                name: "p0".to_string(),
                word: "cat".to_string()
            }
        );
        assert_eq!(game.turn(), Some(order[0]));
    }

    #[test]
    fn test_loss_reveals_word_then_restarts() {
        let order = ids(2);
        let mut game = game_with("cat", 2, &order);
        game.handle_line(order[0], "p0", "z", &order);

        let effects = game.handle_line(order[1], "p1", "y", &order);

        let lost = effects
            .iter()
            .position(|e| *e == Effect::Broadcast(lost_msg("cat")))
            .unwrap();
        let restart = effects.iter().position(|e| *e == Effect::Restart).unwrap();
        assert!(lost < restart);
        assert_eq!(game.phase(), Phase::RoundLost);
        // turn keeps moving from wherever the pointer sits
        assert_eq!(game.turn(), Some(order[0]));
    }

    #[test]
    fn test_restart_keeps_players_and_turn() {
        let order = ids(3);
        let mut game = game_with("cat", 4, &order);
        game.handle_line(order[0], "p0", "z", &order);
        game.handle_line(order[1], "p1", "c", &order);

        game.restart("dog".to_string());

        assert_eq!(game.turn(), Some(order[1]));
        assert_eq!(game.round().word(), "dog");
        assert_eq!(game.round().revealed(), "---");
        assert_eq!(game.round().guesses_left(), 4);
        assert_eq!(game.round().guessed_letters().count(), 0);
    }

    #[test]
    fn test_finished_round_refuses_guesses_until_restart() {
        let order = ids(2);
        let mut game = game_with("ab", 4, &order);
        game.handle_line(order[0], "p0", "a", &order);
        game.handle_line(order[0], "p0", "b", &order);
        assert_eq!(game.phase(), Phase::RoundWon);

        assert!(game.handle_line(order[0], "p0", "c", &order).is_empty());
        assert!(game.handle_line(order[1], "p1", "c", &order).is_empty());
        assert!(!game.round().is_guessed('c'));

        game.restart("dog".to_string());
        assert_eq!(game.phase(), Phase::WaitingForTurn);
        assert!(!game.handle_line(order[0], "p0", "d", &order).is_empty());
        assert!(game.round().is_guessed('d'));
    }

    #[test]
    fn test_restart_after_everyone_left_idles() {
        let order = ids(1);
        let mut game = game_with("a", 4, &order);
        game.handle_line(order[0], "p0", "a", &order);
        game.player_leaving(order[0], "p0", &order);

        game.restart("dog".to_string());

        assert_eq!(game.phase(), Phase::NoPlayers);
        assert_eq!(game.turn(), None);
    }

    #[test]
    fn test_turn_holder_leaving_passes_turn() {
        let order = ids(3);
        let mut game = game_with("cat", 4, &order);
        game.handle_line(order[0], "p0", "z", &order);
        assert_eq!(game.turn(), Some(order[1]));

        let effects = game.player_leaving(order[1], "p1", &order);

        assert_eq!(game.turn(), Some(order[2]));
        assert_eq!(effects[0], Effect::Broadcast(goodbye_msg("p1")));
        assert_eq!(effects[1], Effect::AnnounceTurn);
    }

    #[test]
    fn test_last_in_order_leaving_wraps() {
        let order = ids(3);
        let mut game = game_with("cat", 4, &order);
        game.handle_line(order[0], "p0", "z", &order);
        game.handle_line(order[1], "p1", "y", &order);
        assert_eq!(game.turn(), Some(order[2]));

        game.player_leaving(order[2], "p2", &order);
        assert_eq!(game.turn(), Some(order[0]));
    }

    #[test]
    fn test_other_player_leaving_keeps_turn() {
        let order = ids(3);
        let mut game = game_with("cat", 4, &order);

        game.player_leaving(order[2], "p2", &order);
        assert_eq!(game.turn(), Some(order[0]));
    }

    #[test]
    fn test_last_player_leaving_idles() {
        let order = ids(1);
        let mut game = game_with("cat", 4, &order);

        let effects = game.player_leaving(order[0], "p0", &order);

        assert!(effects.is_empty());
        assert_eq!(game.turn(), None);
        assert_eq!(game.phase(), Phase::NoPlayers);
    }
}
