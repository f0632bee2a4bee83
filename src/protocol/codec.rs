//! Protocol codec
//!
//! Parsing and rendering functions for the line protocol. Parsing is pure:
//! a syntactically invalid request yields a ready-to-send `ERROR` response
//! rather than an `Err`; the server writes it and keeps the connection open.

use crate::error::{CacheError, Result};
use super::{Command, Response};

/// Maximum key length in bytes
pub const MAX_KEY_LEN: usize = 256;

/// Maximum value length in bytes
pub const MAX_VALUE_LEN: usize = 256;

/// Maximum TTL in seconds
pub const MAX_TTL: u32 = i32::MAX as u32;

/// Maximum accepted request line length in bytes (1 KiB)
pub const MAX_LINE_LEN: usize = 1024;

// =============================================================================
// Command Parsing/Rendering
// =============================================================================

/// Parse one request line into a command.
///
/// Verbs are matched case-insensitively. Leading and trailing whitespace is
/// trimmed. The `Err` arm carries the exact `ERROR` response to send back.
pub fn parse_command(line: &str) -> std::result::Result<Command, Response> {
    let line = line.trim();
    if line.is_empty() {
        return Err(Response::error("empty command"));
    }

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (verb, args) = (tokens[0], &tokens[1..]);

    match verb.to_ascii_uppercase().as_str() {
        "PUT" => parse_put(args, false),
        "REPL_PUT" => parse_put(args, true),
        "GET" => Ok(Command::Get { key: single_key(args)? }),
        "DELETE" => Ok(Command::Delete { key: single_key(args)? }),
        "EXISTS" => Ok(Command::Exists { key: single_key(args)? }),
        "REPL_DELETE" => Ok(Command::ReplDelete { key: single_key(args)? }),
        "QUIT" => {
            if args.is_empty() {
                Ok(Command::Quit)
            } else {
                Err(Response::error("invalid command"))
            }
        }
        _ => Err(Response::error("invalid command")),
    }
}

/// Render a command as its canonical request line.
///
/// A zero TTL is omitted, so rendering normalizes `PUT k v 0` to `PUT k v`.
pub fn encode_command(command: &Command) -> String {
    match command {
        Command::Put { key, value, ttl } if *ttl > 0 => format!("PUT {key} {value} {ttl}\n"),
        Command::Put { key, value, .. } => format!("PUT {key} {value}\n"),
        Command::Get { key } => format!("GET {key}\n"),
        Command::Delete { key } => format!("DELETE {key}\n"),
        Command::Exists { key } => format!("EXISTS {key}\n"),
        Command::ReplPut { key, value, ttl } if *ttl > 0 => {
            format!("REPL_PUT {key} {value} {ttl}\n")
        }
        Command::ReplPut { key, value, .. } => format!("REPL_PUT {key} {value}\n"),
        Command::ReplDelete { key } => format!("REPL_DELETE {key}\n"),
        Command::Quit => "QUIT\n".to_string(),
    }
}

/// Parse `PUT <key> <value> [<ttl>]` (or its REPL_ form)
fn parse_put(args: &[&str], replication: bool) -> std::result::Result<Command, Response> {
    let (key, value, ttl) = match args {
        [key, value] => (key, value, 0),
        [key, value, ttl] => (key, value, parse_ttl(ttl)?),
        _ => return Err(Response::error("invalid command")),
    };

    check_key(key)?;
    check_value(value)?;

    let (key, value) = (key.to_string(), value.to_string());
    Ok(if replication {
        Command::ReplPut { key, value, ttl }
    } else {
        Command::Put { key, value, ttl }
    })
}

/// Parse the single-key argument form shared by GET/DELETE/EXISTS/REPL_DELETE
fn single_key(args: &[&str]) -> std::result::Result<String, Response> {
    match args {
        [key] => {
            check_key(key)?;
            Ok(key.to_string())
        }
        _ => Err(Response::error("invalid command")),
    }
}

fn check_key(key: &str) -> std::result::Result<(), Response> {
    if key.len() > MAX_KEY_LEN {
        return Err(Response::error("key too long"));
    }
    Ok(())
}

fn check_value(value: &str) -> std::result::Result<(), Response> {
    if value.len() > MAX_VALUE_LEN {
        return Err(Response::error("value too long"));
    }
    Ok(())
}

fn parse_ttl(token: &str) -> std::result::Result<u32, Response> {
    token
        .parse::<u32>()
        .ok()
        .filter(|ttl| *ttl <= MAX_TTL)
        .ok_or_else(|| Response::error("invalid ttl"))
}

// =============================================================================
// Response Parsing/Rendering
// =============================================================================

/// Render a response as one protocol line
pub fn encode_response(response: &Response) -> String {
    match response {
        Response::Ok(None) => "OK\n".to_string(),
        Response::Ok(Some(payload)) => format!("OK {payload}\n"),
        Response::Error(message) => format!("ERROR {message}\n"),
    }
}

/// Parse a response line received from a peer node
pub fn parse_response(line: &str) -> Result<Response> {
    let line = line.trim();
    if line == "OK" {
        return Ok(Response::Ok(None));
    }
    if let Some(payload) = line.strip_prefix("OK ") {
        return Ok(Response::Ok(Some(payload.to_string())));
    }
    if let Some(message) = line.strip_prefix("ERROR ") {
        return Ok(Response::Error(message.to_string()));
    }
    Err(CacheError::Protocol(format!(
        "malformed response line: {line:?}"
    )))
}
