//! # Word Game Server Library
//!
//! Authoritative server for a multiplayer, turn-based word guessing game.
//! Players connect over TCP, pick a name, and take turns guessing letters of a
//! hidden word. Every named player sees every guess; rounds restart on their
//! own when the word is found or the guesses run out.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! The server runs on one thread. Connection reader tasks only turn bytes into
//! lines; all game and client state is owned by the event loop, which handles
//! one event to completion before waiting again. No locks are involved.
//!
//! ### Two-Phase Clients
//! A fresh connection is Pending until it supplies a valid name, then it is
//! promoted to Active. Only Active clients take turns or receive broadcasts.
//!
//! ### Failure Recovery
//! A recipient that cannot be written to is removed on the spot. If it held
//! the turn, the turn moves on first. The fan-out that hit the failure is then
//! repeated for the players that are left.
//!
//! ## Module Organization
//!
//! - `client_manager`: Pending and Active client lists
//! - `game`: rounds, guesses and the turn pointer
//! - `broadcast`: fan-out of game messages
//! - `lobby`: routes events and applies the recovery policy
//! - `network`: listening socket, connection I/O tasks and the server loop
//! - `dictionary`, `config`, `error`: supporting pieces
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::dictionary::Dictionary;
//! use server::network::Server;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dictionary = Dictionary::load("words.txt")?;
//!     let server = Server::bind(ServerConfig::default(), dictionary).await?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod broadcast;
pub mod client_manager;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod game;
pub mod lobby;
pub mod network;
