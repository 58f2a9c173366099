use crate::state::AppState;
use crate::websocket::dispatcher::ClientCount;
use actix_web::{get, web, HttpResponse};
use serde_json::json;

#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.dispatcher.send(ClientCount).await {
        Ok(clients) => HttpResponse::Ok().json(json!({ "status": "ok", "clients": clients })),
        Err(e) => {
            tracing::error!(error = %e, "Dispatcher did not answer health probe");
            HttpResponse::ServiceUnavailable().json(json!({ "status": "unavailable" }))
        }
    }
}
