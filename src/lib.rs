pub mod config;
pub mod error;
pub mod logging;
pub mod redis_client;
pub mod routes;
pub mod state;
pub mod websocket;
