//! Channel bridge: the only component that blocks.
//!
//! A dedicated OS thread holds the redis subscription and sits in the blocking
//! receive call for the life of the process. Each payload is handed to the
//! dispatcher's mailbox in receive order; the bridge never sees the client
//! registry. Losing the subscription ends the bridge and is reported to the
//! process, there is no resubscription.

use super::dispatcher::RelayMessage;
use crate::error::AppError;
use actix::prelude::*;
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

const BRIDGE_THREAD_NAME: &str = "relay-bridge";

pub struct ChannelBridge {
    client: redis::Client,
    channel: String,
    dispatcher: Recipient<RelayMessage>,
}

impl ChannelBridge {
    pub fn new(
        client: redis::Client,
        channel: impl Into<String>,
        dispatcher: Recipient<RelayMessage>,
    ) -> Self {
        Self {
            client,
            channel: channel.into(),
            dispatcher,
        }
    }

    /// Start the bridge thread. The returned receiver resolves with the error
    /// that ended the subscription.
    pub fn spawn(self) -> std::io::Result<oneshot::Receiver<AppError>> {
        let (tx, rx) = oneshot::channel();
        thread::Builder::new()
            .name(BRIDGE_THREAD_NAME.into())
            .spawn(move || {
                let err = self.run();
                error!(error = %err, "Channel bridge stopped");
                let _ = tx.send(err);
            })?;
        Ok(rx)
    }

    /// Subscribe and pump messages until the subscription fails.
    pub fn run(self) -> AppError {
        let mut conn = match self.client.get_connection() {
            Ok(conn) => conn,
            Err(e) => return AppError::from(e),
        };
        let mut pubsub = conn.as_pubsub();
        if let Err(e) = pubsub.subscribe(&self.channel) {
            return AppError::from(e);
        }
        info!(channel = %self.channel, "Subscribed to relay channel");

        let payloads = std::iter::from_fn(|| {
            Some(
                pubsub
                    .get_message()
                    .map(|msg| msg.get_payload_bytes().to_vec())
                    .map_err(AppError::from),
            )
        });
        forward_payloads(payloads, &self.dispatcher)
    }
}

/// Hand every payload to the dispatcher as a [`RelayMessage`], in order.
///
/// Payloads are raw bytes; invalid UTF-8 is replaced rather than rejected, so
/// only a receive error ends the stream. Returns that error; a stream that
/// simply runs out is reported as a lost subscription.
pub fn forward_payloads<I>(payloads: I, dispatcher: &Recipient<RelayMessage>) -> AppError
where
    I: IntoIterator<Item = Result<Vec<u8>, AppError>>,
{
    let mut forwarded: u64 = 0;
    for payload in payloads {
        match payload {
            Ok(bytes) => {
                debug!(bytes = bytes.len(), "Received message from channel");
                let content = match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Relaying non UTF-8 payload with replacement characters");
                        String::from_utf8_lossy(e.as_bytes()).into_owned()
                    }
                };
                dispatcher.do_send(RelayMessage { content });
                forwarded += 1;
            }
            Err(e) => {
                info!(forwarded, "Channel stream failed");
                return e;
            }
        }
    }
    AppError::SubscriptionLost(format!("stream ended after {forwarded} messages"))
}
