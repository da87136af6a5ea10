//! # Word Game Client Library
//!
//! A terminal client for the word game server. It relays what the player
//! types to the server, one framed line at a time, and prints whatever the
//! server sends exactly as received. Server prompts carry no trailing newline,
//! so output is flushed chunk by chunk instead of line by line.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::network::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::connect("127.0.0.1:4242").await?;
//!     client.run().await?;
//!     Ok(())
//! }
//! ```

pub mod network;
