use super::{ClientId, ClientSink};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Outcome of one fan-out across the registry
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// The set of open client connections.
///
/// Owned by the dispatcher and never shared: it is neither `Clone` nor behind a
/// lock, so every read and write happens on the dispatcher's own context.
#[derive(Default)]
pub struct ClientRegistry {
    clients: BTreeMap<ClientId, Box<dyn ClientSink>>,
    last_id: u64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection under a fresh identifier.
    pub fn insert(&mut self, sink: Box<dyn ClientSink>) -> ClientId {
        self.last_id += 1;
        let id = ClientId::new(self.last_id);
        self.clients.insert(id, sink);

        debug!(client_id = %id, clients = self.clients.len(), "Registered client");
        id
    }

    /// Remove a connection. Returns false if it was already gone.
    pub fn remove(&mut self, id: ClientId) -> bool {
        let removed = self.clients.remove(&id).is_some();
        if removed {
            debug!(client_id = %id, clients = self.clients.len(), "Removed client");
        }
        removed
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Display names of every registered client, in registry order.
    pub fn roster(&self) -> Vec<String> {
        self.clients.keys().map(ClientId::display_name).collect()
    }

    /// Write `frame` to a single client.
    pub fn send_to(&self, id: ClientId, frame: &str) -> bool {
        match self.clients.get(&id) {
            Some(sink) => match sink.write(frame) {
                Ok(()) => true,
                Err(e) => {
                    warn!(client_id = %id, error = %e, "Failed to write to client");
                    false
                }
            },
            None => false,
        }
    }

    /// Write `frame` to every client independently.
    ///
    /// A failed write is counted and logged but never stops delivery to the
    /// rest, and never removes the client: removal only follows the
    /// connection's own close notification.
    pub fn broadcast(&self, frame: &str) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        for (id, sink) in &self.clients {
            match sink.write(frame) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    warn!(client_id = %id, error = %e, "Failed to write to client");
                }
            }
        }
        report
    }
}
