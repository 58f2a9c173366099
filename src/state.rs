use crate::{config::Config, redis_client::Publisher, websocket::Dispatcher};
use actix::prelude::*;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::oneshot;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Addr<Dispatcher>,
    pub config: Arc<Config>,
}

/// Starts the dispatcher on the event loop of the HTTP worker that first
/// builds an app, so the registry lives on the same loop as every connection
/// actor. Later calls hand out the same address.
#[derive(Clone)]
pub struct DispatcherSlot {
    publisher: Arc<dyn Publisher>,
    channel: String,
    inner: Arc<Mutex<SlotInner>>,
}

struct SlotInner {
    addr: Option<Addr<Dispatcher>>,
    started: Option<oneshot::Sender<Addr<Dispatcher>>>,
}

impl DispatcherSlot {
    /// The receiver resolves once, with the address of the started dispatcher.
    pub fn new(
        publisher: Arc<dyn Publisher>,
        channel: impl Into<String>,
    ) -> (Self, oneshot::Receiver<Addr<Dispatcher>>) {
        let (tx, rx) = oneshot::channel();
        let slot = Self {
            publisher,
            channel: channel.into(),
            inner: Arc::new(Mutex::new(SlotInner {
                addr: None,
                started: Some(tx),
            })),
        };
        (slot, rx)
    }

    /// Must be called from inside an actix arbiter.
    pub fn get_or_start(&self) -> Addr<Dispatcher> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(addr) = &inner.addr {
            return addr.clone();
        }

        let addr = Dispatcher::new(self.publisher.clone(), self.channel.clone()).start();
        info!(channel = %self.channel, "Dispatcher started");
        if let Some(tx) = inner.started.take() {
            let _ = tx.send(addr.clone());
        }
        inner.addr = Some(addr.clone());
        addr
    }
}
