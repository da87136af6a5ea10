//! Wire protocol shared by the word game server and its clients.
//!
//! The protocol is line-oriented text. Every line a client sends is terminated
//! by a network newline; the server's prompts deliberately omit the trailing
//! newline so the player types on the same line.

pub mod codec;

pub use codec::LineReader;

/// Network newline used to terminate every protocol line.
pub const NEWLINE: &str = "\r\n";

/// Port the server listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 4242;

/// Upper bound on a single inbound line, terminator included.
pub const MAX_LINE_LEN: usize = 256;

/// Longest player name the server accepts.
pub const MAX_NAME_LEN: usize = 30;

pub const WELCOME_MSG: &str = "Welcome to our word game. What is your name? ";
pub const EMPTY_NAME_MSG: &str = "Your name cannot be empty. What is your name? ";
pub const DUPLICATE_NAME_MSG: &str = "Someone is already using that name. What is your name? ";
pub const LONG_NAME_MSG: &str = "That name is too long. What is your name? ";
pub const GUESS_PROMPT_MSG: &str = "Your guess? ";
pub const NOT_TURN_MSG: &str = "It is not your turn to guess.\r\n";
pub const INVALID_GUESS_MSG: &str = "Invalid guess, enter a single lowercase letter. Your guess? ";
pub const WIN_MSG: &str = "Game over! You win!\r\n\r\n";
pub const NO_GUESSES_MSG: &str = "No guesses left. Game over.\r\n";
pub const NEW_GAME_MSG: &str = "Let's start a new game\r\n";

pub fn joined_msg(name: &str) -> String {
    format!("{} has just joined.{}", name, NEWLINE)
}

pub fn turn_msg(name: &str) -> String {
    format!("It's {}'s turn.{}", name, NEWLINE)
}

pub fn guess_msg(name: &str, letter: char) -> String {
    format!("{} guesses: {}{}", name, letter, NEWLINE)
}

pub fn miss_msg(letter: char) -> String {
    format!("{} is not in the word{}", letter, NEWLINE)
}

pub fn repeat_msg(letter: char) -> String {
    format!("{} has already been guessed{}", letter, NEWLINE)
}

pub fn word_msg(word: &str) -> String {
    format!("The word was {}.{}", word, NEWLINE)
}

/// Loss announcement: the round is over and the secret is revealed.
pub fn lost_msg(word: &str) -> String {
    format!("{}{}{}", NO_GUESSES_MSG, word_msg(word), NEWLINE)
}

pub fn winner_msg(name: &str) -> String {
    format!("Game over! {} won!{}{}", name, NEWLINE, NEWLINE)
}

pub fn goodbye_msg(name: &str) -> String {
    format!("Goodbye {}{}", name, NEWLINE)
}

/// Builds the status block shown after joins and guesses.
///
/// `guessed` is expected in alphabetical order.
pub fn status_msg(revealed: &str, guesses_left: u8, guessed: impl IntoIterator<Item = char>) -> String {
    let letters: Vec<String> = guessed.into_iter().map(|c| c.to_string()).collect();
    format!(
        "***************{nl}Word to guess: {}{nl}Guesses remaining: {}{nl}Letters guessed: {}{nl}***************{nl}",
        revealed,
        guesses_left,
        letters.join(" "),
        nl = NEWLINE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts_have_no_trailing_newline() {
        for prompt in [
            WELCOME_MSG,
            EMPTY_NAME_MSG,
            DUPLICATE_NAME_MSG,
            GUESS_PROMPT_MSG,
            INVALID_GUESS_MSG,
        ] {
            assert!(!prompt.ends_with(NEWLINE), "{:?}", prompt);
        }
    }

    #[test]
    fn test_announcements() {
        assert_eq!(guess_msg("ann", 'e'), "ann guesses: e\r\n");
        assert_eq!(miss_msg('q'), "q is not in the word\r\n");
        assert_eq!(turn_msg("bob"), "It's bob's turn.\r\n");
        assert_eq!(goodbye_msg("bob"), "Goodbye bob\r\n");
        assert!(lost_msg("cat").starts_with(NO_GUESSES_MSG));
        assert!(lost_msg("cat").contains("The word was cat."));
    }

    #[test]
    fn test_status_message() {
        let status = status_msg("c-t", 3, ['a', 'c', 't']);

        assert!(status.contains("Word to guess: c-t\r\n"));
        assert!(status.contains("Guesses remaining: 3\r\n"));
        assert!(status.contains("Letters guessed: a c t\r\n"));
    }

    #[test]
    fn test_status_message_without_guesses() {
        let status = status_msg("---", 4, []);
        assert!(status.contains("Letters guessed: \r\n"));
    }
}
