//! Protocol Module
//!
//! Defines the line-oriented wire protocol for client-server and inter-node
//! communication.
//!
//! ## Request Format
//! ```text
//! PUT  <key> <value> [<ttl>]\n
//! GET  <key>\n
//! DELETE <key>\n
//! EXISTS <key>\n
//! REPL_PUT    <key> <value> [<ttl>]\n
//! REPL_DELETE <key>\n
//! QUIT\n
//! ```
//!
//! ## Response Format
//! ```text
//! OK [<payload>]\n
//! ERROR <message>\n
//! ```
//!
//! Keys and values are whitespace-free tokens of 1..=256 bytes. TTL is a
//! decimal number of seconds, 0 meaning no expiration. `REPL_*` verbs carry
//! the same payload as their client counterparts and are distinguished only
//! by tag; they are produced exclusively by the cluster router.

mod command;
mod response;
mod codec;

pub use command::{Command, CommandKind};
pub use response::Response;
pub use codec::{
    encode_command, encode_response, parse_command, parse_response,
    MAX_KEY_LEN, MAX_LINE_LEN, MAX_TTL, MAX_VALUE_LEN,
};
