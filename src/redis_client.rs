use crate::error::AppResult;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisResult};

/// Publish side of the broadcast backend.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Returns the number of subscribers that received the payload.
    async fn publish(&self, channel: &str, payload: String) -> AppResult<usize>;
}

#[derive(Clone)]
pub struct RedisClient {
    client: Client,
    manager: ConnectionManager,
}

impl RedisClient {
    pub async fn connect(url: &str) -> RedisResult<Self> {
        let client = Client::open(url)?;
        let manager = ConnectionManager::new(client.clone()).await?;
        Ok(Self { client, manager })
    }

    /// Plain client for callers that need a dedicated connection, such as SUBSCRIBE.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    pub async fn ping(&self) -> RedisResult<()> {
        let mut conn = self.manager.clone();
        redis::cmd("PING").query_async::<_, ()>(&mut conn).await
    }
}

#[async_trait]
impl Publisher for RedisClient {
    async fn publish(&self, channel: &str, payload: String) -> AppResult<usize> {
        let mut conn = self.manager.clone();
        let receivers: usize = conn.publish(channel, payload).await?;
        Ok(receivers)
    }
}
