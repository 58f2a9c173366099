use super::ClientId;
use serde::{Deserialize, Serialize};

/// Outbound WebSocket events from server to client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WsOutboundEvent {
    /// A payload relayed from the broadcast channel
    #[serde(rename = "message")]
    Message { content: String },

    /// Identity assignment, sent once to a connection when it opens
    #[serde(rename = "client_id")]
    Identity { client_id: String },

    /// Full roster snapshot, sent to everyone on any membership change
    #[serde(rename = "clients")]
    Clients { clients: Vec<String> },
}

impl WsOutboundEvent {
    pub fn message(content: impl Into<String>) -> Self {
        Self::Message {
            content: content.into(),
        }
    }

    pub fn identity(id: ClientId) -> Self {
        Self::Identity {
            client_id: id.to_string(),
        }
    }

    pub fn roster(clients: Vec<String>) -> Self {
        Self::Clients { clients }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
