use crate::error::AppError;
use actix::prelude::*;
use std::fmt;

pub mod bridge;
pub mod dispatcher;
pub mod message_types;
pub mod registry;
pub mod session;


pub use dispatcher::Dispatcher;
pub use registry::ClientRegistry;

/// Identifier assigned by the dispatcher when a connection opens.
///
/// Identifiers are handed out monotonically and never reused within a process,
/// so a stale roster snapshot can never name a different live client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(u64);

impl ClientId {
    pub fn new(seq: u64) -> Self {
        Self(seq)
    }

    /// Name shown to other clients in roster snapshots.
    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

/// A serialized frame queued for delivery to one connection
#[derive(Debug, Clone, Message)]
#[rtype(result = "()")]
pub struct Outbound(pub String);

/// Write half of a client connection, as seen by the dispatcher.
pub trait ClientSink: Send {
    /// Queue `frame` for the client. An error means the connection rejected it;
    /// the caller decides whether that matters, the sink never closes itself.
    fn write(&self, frame: &str) -> Result<(), AppError>;
}

impl ClientSink for Recipient<Outbound> {
    fn write(&self, frame: &str) -> Result<(), AppError> {
        match self.try_send(Outbound(frame.to_owned())) {
            Ok(()) => Ok(()),
            Err(SendError::Full(_)) => Err(AppError::Write("connection mailbox full".into())),
            Err(SendError::Closed(_)) => Err(AppError::Write("connection closed".into())),
        }
    }
}
