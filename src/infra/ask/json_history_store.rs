// JSON implementation of the AskHistoryStore trait (`ask_history.json`).
//
// The file is a flat array of events, appended to and rewritten whole.

use crate::core::ask::{AskError, AskEvent, AskHistoryStore};
use crate::infra::json_file;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub struct JsonAskHistoryStore {
    path: PathBuf,
    cache: RwLock<Vec<AskEvent>>,
}

impl JsonAskHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let events = json_file::load(&path, "Ask history")?
            .map(parse_history)
            .unwrap_or_default();

        tracing::info!(events = events.len(), path = %path.display(), "Loaded ask history");

        Ok(Self {
            path,
            cache: RwLock::new(events),
        })
    }

    async fn persist(&self) -> Result<(), AskError> {
        let cache = self.cache.read().await;
        json_file::save(&self.path, &*cache).map_err(storage)
    }
}

#[async_trait]
impl AskHistoryStore for JsonAskHistoryStore {
    async fn append(&self, event: AskEvent) -> Result<(), AskError> {
        let mut cache = self.cache.write().await;
        cache.push(event);
        drop(cache); // Release lock before persisting
        self.persist().await
    }

    async fn all(&self) -> Result<Vec<AskEvent>, AskError> {
        Ok(self.cache.read().await.clone())
    }
}

fn storage(e: impl std::fmt::Display) -> AskError {
    AskError::StorageError(e.to_string())
}

/// A corrupt entry costs that entry, never startup.
fn parse_history(values: Vec<serde_json::Value>) -> Vec<AskEvent> {
    values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<AskEvent>(value) {
            Ok(event) => Some(event),
            Err(e) => {
                tracing::warn!("Skipping unreadable ask history entry: {e}");
                None
            }
        })
        .collect()
}
