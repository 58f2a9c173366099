use crate::error::AppError;
use dotenvy::dotenv;
use std::env;

pub const DEFAULT_CHANNEL: &str = "chat_channel";

#[derive(Debug, Clone)]
pub struct Config {
    pub redis_url: String,
    /// The single pub/sub channel every instance subscribes and publishes on.
    pub channel: String,
    pub host: String,
    pub port: u16,
    /// Outbound frames a connection may have queued before writes to it fail.
    pub session_mailbox_capacity: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let redis_url = lookup("REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379/0".into());
        let channel = lookup("RELAY_CHANNEL").unwrap_or_else(|| DEFAULT_CHANNEL.into());
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = lookup("PORT")
            .and_then(|s| s.parse().ok())
            .unwrap_or(8888);
        let session_mailbox_capacity = lookup("SESSION_MAILBOX_CAPACITY")
            .and_then(|s| s.parse().ok())
            .unwrap_or(256);

        if channel.trim().is_empty() {
            return Err(AppError::Config("RELAY_CHANNEL must not be empty".into()));
        }
        if session_mailbox_capacity == 0 {
            return Err(AppError::Config(
                "SESSION_MAILBOX_CAPACITY must be at least 1".into(),
            ));
        }

        Ok(Self {
            redis_url,
            channel,
            host,
            port,
            session_mailbox_capacity,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
