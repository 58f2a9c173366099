use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server start failure: {0}")]
    StartServer(String),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An outbound frame was rejected by a client connection.
    #[error("write rejected: {0}")]
    Write(String),

    /// The channel subscription stopped delivering messages. Not recoverable.
    #[error("subscription lost: {0}")]
    SubscriptionLost(String),
}
