use super::dispatcher::{ClientMessage, Connect, Disconnect, Dispatcher};
use super::{ClientId, ClientSink, Outbound};
use actix::prelude::*;
use actix_web_actors::ws;
use tracing::{debug, error, info, warn};

/// Lifecycle of one client connection: `Connecting -> Open -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Upgraded, waiting for the dispatcher to assign an identifier
    Connecting,
    Open(ClientId),
    Closed,
}

impl SessionState {
    /// Enter `Open`. Only valid from `Connecting`.
    pub fn open(&mut self, id: ClientId) -> bool {
        match self {
            SessionState::Connecting => {
                *self = SessionState::Open(id);
                true
            }
            _ => false,
        }
    }

    /// Enter `Closed`, returning the identifier to report if the session was
    /// open. Any later call returns `None`, so a close is reported once.
    pub fn close(&mut self) -> Option<ClientId> {
        match std::mem::replace(self, SessionState::Closed) {
            SessionState::Open(id) => Some(id),
            _ => None,
        }
    }

    pub fn client_id(&self) -> Option<ClientId> {
        match self {
            SessionState::Open(id) => Some(*id),
            _ => None,
        }
    }
}

// WebSocket Actor
pub struct WsSession {
    state: SessionState,
    dispatcher: Addr<Dispatcher>,
    mailbox_capacity: usize,
}

impl WsSession {
    pub fn new(dispatcher: Addr<Dispatcher>, mailbox_capacity: usize) -> Self {
        Self {
            state: SessionState::Connecting,
            dispatcher,
            mailbox_capacity,
        }
    }

    fn forward(&self, content: String) {
        match self.state.client_id() {
            Some(id) => self.dispatcher.do_send(ClientMessage { id, content }),
            None => debug!("Dropping message received outside the open state"),
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        // Outbound frames queue here; once full, dispatcher writes fail fast.
        ctx.set_mailbox_capacity(self.mailbox_capacity);

        let sink: Box<dyn ClientSink> = Box::new(ctx.address().recipient::<Outbound>());

        // Nothing else is processed until the dispatcher answers, so the
        // session cannot close while still unregistered.
        self.dispatcher
            .send(Connect { sink })
            .into_actor(self)
            .then(|res, act, ctx| {
                match res {
                    Ok(id) => {
                        if act.state.open(id) {
                            info!(client_id = %id, "WebSocket session opened");
                        } else {
                            act.dispatcher.do_send(Disconnect { id });
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Dispatcher unavailable, closing session");
                        ctx.stop();
                    }
                }
                fut::ready(())
            })
            .wait(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(id) = self.state.close() {
            info!(client_id = %id, "WebSocket session closed");
            self.dispatcher.do_send(Disconnect { id });
        }
    }
}

impl Handler<Outbound> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

// Handle WebSocket protocol messages
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => self.forward(text.to_string()),
            Ok(ws::Message::Binary(bin)) => match String::from_utf8(bin.to_vec()) {
                Ok(text) => self.forward(text),
                Err(_) => warn!("Dropping non UTF-8 binary message"),
            },
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Close(reason)) => {
                debug!("WebSocket close message received: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) => {
                warn!("Fragmented WebSocket messages not supported");
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "WebSocket protocol error");
                ctx.stop();
            }
        }
    }
}
