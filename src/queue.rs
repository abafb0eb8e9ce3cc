use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::{Arc, Mutex};

/// Queue that playlist export requests are handed to. A separate consumer
/// builds the export and mails it; this service only produces.
pub const EXPORT_PLAYLISTS_QUEUE: &str = "export:playlists";

/// Producer side of the export queue.
#[async_trait]
pub trait PlaylistExportProducer: Send + Sync {
    /// Append one serialized message to `queue`.
    async fn send_message(&self, queue: &str, message: &str) -> anyhow::Result<()>;
}

/// Redis list used as a work queue: producers `RPUSH`, the consumer `BLPOP`s.
#[derive(Clone)]
pub struct RedisExportQueue {
    redis: ConnectionManager,
}

impl RedisExportQueue {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl PlaylistExportProducer for RedisExportQueue {
    async fn send_message(&self, queue: &str, message: &str) -> anyhow::Result<()> {
        let mut conn = self.redis.clone();
        let depth: i64 = conn.rpush(queue, message).await?;
        tracing::debug!(queue = queue, depth = depth, "export message queued");
        Ok(())
    }
}

/// In-process queue used when no Redis URL is configured. Nothing drains it
/// outside of tests.
#[derive(Clone, Default)]
pub struct MemoryExportQueue {
    messages: Arc<Mutex<Vec<(String, String)>>>,
}

impl MemoryExportQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages sent to `queue`, oldest first.
    pub fn messages(&self, queue: &str) -> Vec<String> {
        match self.messages.lock() {
            Ok(messages) => messages
                .iter()
                .filter(|(q, _)| q == queue)
                .map(|(_, m)| m.clone())
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}

#[async_trait]
impl PlaylistExportProducer for MemoryExportQueue {
    async fn send_message(&self, queue: &str, message: &str) -> anyhow::Result<()> {
        self.messages
            .lock()
            .map_err(|_| anyhow::anyhow!("export queue lock poisoned"))?
            .push((queue.to_string(), message.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_queue_keeps_order_per_queue() {
        let queue = MemoryExportQueue::new();
        queue.send_message(EXPORT_PLAYLISTS_QUEUE, "a").await.unwrap();
        queue.send_message("other", "x").await.unwrap();
        queue.send_message(EXPORT_PLAYLISTS_QUEUE, "b").await.unwrap();

        assert_eq!(queue.messages(EXPORT_PLAYLISTS_QUEUE), vec!["a", "b"]);
        assert_eq!(queue.messages("other"), vec!["x"]);
        assert!(queue.messages("empty").is_empty());
    }

    #[tokio::test]
    async fn test_memory_queue_clones_share_messages() {
        let a = MemoryExportQueue::new();
        let b = a.clone();
        a.send_message(EXPORT_PLAYLISTS_QUEUE, "m").await.unwrap();
        assert_eq!(b.messages(EXPORT_PLAYLISTS_QUEUE).len(), 1);
    }
}
