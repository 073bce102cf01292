//! The error taxonomy of §7, collapsed into one type the HTTP layer maps to
//! status codes (grounded in `FedericoCeratto-chord-dht/src/core/error.rs`).
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChordError {
    /// RPC to a peer failed: unreachable, timed out, or the body didn't decode.
    #[error("transport error contacting {peer}: {message}")]
    Transport { peer: String, message: String },

    /// A received id cannot fit the arc being checked against it.
    #[error("protocol invariant violated: {0}")]
    ProtocolViolation(String),

    /// The local record store failed; its own transaction has rolled back.
    #[error("local store error: {0}")]
    LocalStore(String),

    /// Malformed request: out-of-range key, bad index, missing field, etc.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Ring operation attempted before the node has joined (or after `leave`).
    #[error("node is not part of a ring")]
    NotJoined,
}

pub type ChordResult<T> = Result<T, ChordError>;

impl ResponseError for ChordError {
    fn error_response(&self) -> HttpResponse {
        match self {
            ChordError::Transport { .. } => HttpResponse::BadGateway().body(self.to_string()),
            ChordError::ProtocolViolation(_) => HttpResponse::Ok().finish(),
            ChordError::LocalStore(_) => HttpResponse::InternalServerError().body(self.to_string()),
            ChordError::BadRequest(_) => HttpResponse::BadRequest().body(self.to_string()),
            ChordError::NotJoined => HttpResponse::ServiceUnavailable().body(self.to_string()),
        }
    }
}
