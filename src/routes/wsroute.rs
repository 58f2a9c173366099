use crate::state::AppState;
use crate::websocket::session::WsSession;
use actix_web::{get, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;

// HTTP handler
#[get("/ws")]
pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    tracing::debug!(peer = ?req.peer_addr(), "WebSocket upgrade requested");

    let session = WsSession::new(
        state.dispatcher.clone(),
        state.config.session_mailbox_capacity,
    );
    ws::start(session, &req, stream)
}
