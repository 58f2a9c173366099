pub mod health;
pub mod index;
pub mod wsroute;

use actix_web::web;

/// Register every route of the relay on an actix `App`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index::index)
        .service(index::script)
        .service(wsroute::ws_handler)
        .service(health::health);
}
