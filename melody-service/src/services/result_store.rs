//! Task result storage.
//!
//! Bounded and time-evicted: entries expire `ttl` after their last write and
//! the least-recently-used ones are dropped once `max_entries` is reached.

use crate::config::StoreConfig;
use async_trait::async_trait;
use moka::future::Cache;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    /// Submitted, no audio yet.
    Pending,
    Ready(String),
}

#[async_trait]
pub trait ResultStore: Send + Sync {
    /// Record a freshly submitted task. Never downgrades a ready task.
    async fn mark_pending(&self, task_id: &str);

    /// Store the audio URL for a task. Last write wins.
    async fn store_result(&self, task_id: &str, audio_url: &str);

    async fn get(&self, task_id: &str) -> Option<TaskState>;
}

#[derive(Clone)]
pub struct MokaResultStore {
    cache: Cache<String, TaskState>,
}

impl MokaResultStore {
    pub fn new(config: &StoreConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_entries)
            .time_to_live(config.ttl)
            .build();
        Self { cache }
    }
}

#[async_trait]
impl ResultStore for MokaResultStore {
    async fn mark_pending(&self, task_id: &str) {
        self.cache
            .entry_by_ref(task_id)
            .or_insert(TaskState::Pending)
            .await;
    }

    async fn store_result(&self, task_id: &str, audio_url: &str) {
        self.cache
            .insert(task_id.to_string(), TaskState::Ready(audio_url.to_string()))
            .await;
    }

    async fn get(&self, task_id: &str) -> Option<TaskState> {
        self.cache.get(task_id).await
    }
}
