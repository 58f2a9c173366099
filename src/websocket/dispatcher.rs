//! The broadcast loop.
//!
//! A single actor owns the [`ClientRegistry`]. Connection sessions and the
//! channel bridge only ever talk to it through its mailbox, which processes one
//! message at a time, so registry access needs no locking and every broadcast
//! observes a consistent membership.

use super::message_types::WsOutboundEvent;
use super::registry::{ClientRegistry, DeliveryReport};
use super::{ClientId, ClientSink};
use crate::redis_client::Publisher;
use actix::prelude::*;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// A connection has opened. Answers with the identifier assigned to it.
#[derive(Message)]
#[rtype(result = "ClientId")]
pub struct Connect {
    pub sink: Box<dyn ClientSink>,
}

/// A connection has closed.
#[derive(Message, Debug)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub id: ClientId,
}

/// Raw payload sent by a client, to be published on the channel.
#[derive(Message, Debug)]
#[rtype(result = "()")]
pub struct ClientMessage {
    pub id: ClientId,
    pub content: String,
}

/// Payload received from the channel, to be delivered to every client.
#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct RelayMessage {
    pub content: String,
}

/// Number of registered clients
#[derive(Message, Debug)]
#[rtype(result = "usize")]
pub struct ClientCount;

pub struct Dispatcher {
    registry: ClientRegistry,
    publisher: Arc<dyn Publisher>,
    channel: String,
}

impl Dispatcher {
    pub fn new(publisher: Arc<dyn Publisher>, channel: impl Into<String>) -> Self {
        Self {
            registry: ClientRegistry::new(),
            publisher,
            channel: channel.into(),
        }
    }

    fn on_client_connected(&mut self, sink: Box<dyn ClientSink>) -> ClientId {
        let id = self.registry.insert(sink);
        info!(client_id = %id, clients = self.registry.len(), "Client connected");

        match WsOutboundEvent::identity(id).to_json() {
            Ok(frame) => {
                self.registry.send_to(id, &frame);
            }
            Err(e) => error!(client_id = %id, error = %e, "Failed to serialize identity"),
        }

        self.broadcast_roster();
        id
    }

    fn on_client_disconnected(&mut self, id: ClientId) {
        if !self.registry.remove(id) {
            debug!(client_id = %id, "Disconnect for unknown client ignored");
            return;
        }
        info!(client_id = %id, clients = self.registry.len(), "Client disconnected");

        if self.registry.is_empty() {
            return;
        }
        self.broadcast_roster();
    }

    fn on_relay_message(&mut self, content: String) -> DeliveryReport {
        if self.registry.is_empty() {
            warn!("No connected clients to deliver message to");
            return DeliveryReport::default();
        }

        let frame = match WsOutboundEvent::message(content).to_json() {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "Failed to serialize relay message");
                return DeliveryReport::default();
            }
        };

        let report = self.registry.broadcast(&frame);
        info!(
            delivered = report.delivered,
            failed = report.failed,
            "Delivered relay message"
        );
        report
    }

    fn broadcast_roster(&self) {
        let frame = match WsOutboundEvent::roster(self.registry.roster()).to_json() {
            Ok(frame) => frame,
            Err(e) => {
                error!(error = %e, "Failed to serialize roster");
                return;
            }
        };

        let report = self.registry.broadcast(&frame);
        debug!(
            delivered = report.delivered,
            failed = report.failed,
            "Broadcast roster update"
        );
    }
}

impl Actor for Dispatcher {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!(channel = %self.channel, "Dispatcher started");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!(clients = self.registry.len(), "Dispatcher stopped");
    }
}

impl Handler<Connect> for Dispatcher {
    type Result = MessageResult<Connect>;

    fn handle(&mut self, msg: Connect, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.on_client_connected(msg.sink))
    }
}

impl Handler<Disconnect> for Dispatcher {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _ctx: &mut Self::Context) {
        self.on_client_disconnected(msg.id);
    }
}

impl Handler<ClientMessage> for Dispatcher {
    type Result = ();

    fn handle(&mut self, msg: ClientMessage, ctx: &mut Self::Context) {
        let ClientMessage { id, content } = msg;
        info!(client_id = %id, bytes = content.len(), "Received message from client");

        // Delivery back to clients, the sender included, only happens via the
        // channel round trip.
        let publisher = Arc::clone(&self.publisher);
        let channel = self.channel.clone();
        async move { publisher.publish(&channel, content).await }
            .into_actor(self)
            .map(move |res, act, _ctx| match res {
                Ok(receivers) => {
                    debug!(client_id = %id, channel = %act.channel, receivers, "Published client message")
                }
                Err(e) => {
                    error!(client_id = %id, channel = %act.channel, error = %e, "Failed to publish client message")
                }
            })
            .spawn(ctx);
    }
}

impl Handler<RelayMessage> for Dispatcher {
    type Result = ();

    fn handle(&mut self, msg: RelayMessage, _ctx: &mut Self::Context) {
        self.on_relay_message(msg.content);
    }
}

impl Handler<ClientCount> for Dispatcher {
    type Result = usize;

    fn handle(&mut self, _msg: ClientCount, _ctx: &mut Self::Context) -> usize {
        self.registry.len()
    }
}
