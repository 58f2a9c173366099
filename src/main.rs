use actix_web::{middleware, web, App, HttpServer};
use chat_relay_service::{
    config, error, logging,
    redis_client::RedisClient,
    routes,
    state::{AppState, DispatcherSlot},
    websocket::bridge::ChannelBridge,
};
use std::sync::Arc;

// The registry and every connection share this one event loop
const HTTP_WORKERS: usize = 1;

#[actix_web::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let cfg = Arc::new(config::Config::from_env()?);

    // The backend must be reachable before any client is accepted
    let redis = RedisClient::connect(&cfg.redis_url)
        .await
        .map_err(|e| error::AppError::StartServer(format!("redis: {e}")))?;
    if let Err(e) = redis.ping().await {
        tracing::error!(error = %e, "Redis connectivity check failed");
        return Err(error::AppError::StartServer(format!("redis ping: {e}")));
    }
    tracing::info!("Connected to redis");

    let (slot, dispatcher_started) =
        DispatcherSlot::new(Arc::new(redis.clone()), cfg.channel.clone());

    let bind_addr = cfg.bind_addr();
    tracing::info!(%bind_addr, channel = %cfg.channel, "starting chat-relay-service");

    let app_config = cfg.clone();
    let server = HttpServer::new(move || {
        let state = AppState {
            dispatcher: slot.get_or_start(),
            config: app_config.clone(),
        };
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(state))
            .configure(routes::configure)
    })
    .workers(HTTP_WORKERS)
    .bind(&bind_addr)
    .map_err(|e| error::AppError::StartServer(format!("bind HTTP: {e}")))?
    .run();

    // The bridge starts once the worker has started the dispatcher, then
    // blocks on its own thread until the subscription is lost
    let client = redis.client();
    let channel = cfg.channel.clone();
    let relay = async move {
        let dispatcher = dispatcher_started.await.map_err(|_| {
            error::AppError::StartServer("HTTP worker never started the dispatcher".into())
        })?;
        let bridge_failed = ChannelBridge::new(client, channel, dispatcher.recipient())
            .spawn()
            .map_err(|e| error::AppError::StartServer(format!("spawn channel bridge: {e}")))?;
        Err::<(), _>(bridge_failed.await.unwrap_or_else(|_| {
            error::AppError::SubscriptionLost("channel bridge exited without reporting".into())
        }))
    };

    // Losing the subscription takes the whole process down
    tokio::select! {
        res = server => {
            res.map_err(|e| error::AppError::StartServer(format!("HTTP server: {e}")))?;
            Ok(())
        }
        res = relay => res,
    }
}
