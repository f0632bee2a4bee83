//! Response definitions
//!
//! Represents responses sent to clients and peers.

/// A protocol response: `OK` with an optional payload token, or `ERROR`
/// with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Ok(Option<String>),
    Error(String),
}

impl Response {
    /// Create an OK response with an optional payload
    pub fn ok(payload: Option<String>) -> Self {
        Response::Ok(payload)
    }

    /// `OK stored` for a successful PUT
    pub fn stored() -> Self {
        Response::Ok(Some("stored".to_string()))
    }

    /// `OK deleted` for a successful DELETE
    pub fn deleted() -> Self {
        Response::Ok(Some("deleted".to_string()))
    }

    /// `OK <value>` answering a GET
    pub fn value(value: impl Into<String>) -> Self {
        Response::Ok(Some(value.into()))
    }

    /// `OK 1` / `OK 0` answering an EXISTS
    pub fn exists(present: bool) -> Self {
        Response::Ok(Some(if present { "1" } else { "0" }.to_string()))
    }

    /// `OK bye`, sent for a QUIT before the connection closes
    pub fn bye() -> Self {
        Response::Ok(Some("bye".to_string()))
    }

    /// `ERROR key not found`
    pub fn key_not_found() -> Self {
        Response::Error("key not found".to_string())
    }

    /// Create an ERROR response
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error(message.into())
    }

    /// True for the OK arm
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok(_))
    }
}
