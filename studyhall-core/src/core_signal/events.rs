//! Signaling events and request payloads
//!
//! Events carry room-routing facts and the joining peer's signaling id,
//! never media. Requests validate themselves before the coordinator mutates
//! anything, so a malformed payload leaves no trace.

use serde::{Deserialize, Serialize};

use super::error::SignalError;

/// Opaque id for one connected signaling client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub u64);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

/// Event delivered to a connected client's receiver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalEvent {
    /// A new live session opened in a classroom the client subscribed to
    SessionCreated {
        classroom_code: String,
        session_code: String,
    },

    /// Someone joined a session room the client is in
    ParticipantJoined {
        session_code: String,
        peer_id: String,
    },

    /// Someone left a session room the client is in
    ParticipantLeft {
        session_code: String,
        peer_id: String,
    },
}

/// Payload for opening a live session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub classroom_code: String,
    /// The creator's signaling identifier for the peer connection layer
    pub peer_id: String,
}

impl CreateSessionRequest {
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.classroom_code.trim().is_empty() {
            return Err(SignalError::BadRequest(
                "classroom code is required".to_string(),
            ));
        }
        if self.peer_id.trim().is_empty() {
            return Err(SignalError::BadRequest("peer id is required".to_string()));
        }
        Ok(())
    }
}

/// Payload for joining a live session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinSessionRequest {
    pub session_code: String,
    pub peer_id: String,
}

impl JoinSessionRequest {
    pub fn validate(&self) -> Result<(), SignalError> {
        if self.session_code.trim().is_empty() {
            return Err(SignalError::BadRequest(
                "session code is required".to_string(),
            ));
        }
        if self.peer_id.trim().is_empty() {
            return Err(SignalError::BadRequest("peer id is required".to_string()));
        }
        Ok(())
    }
}
