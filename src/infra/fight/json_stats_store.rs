// JSON implementation of the FightStatsStore trait (`fight_stats.json`).

use crate::core::fight::{FightLedger, FightStatsError, FightStatsStore};
use crate::infra::json_file;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub struct JsonFightStatsStore {
    path: PathBuf,
    cache: RwLock<FightLedger>,
}

impl JsonFightStatsStore {
    pub fn new(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        let ledger: FightLedger = json_file::load(&path, "Fight stats")?.unwrap_or_default();

        tracing::info!(fighters = ledger.global.len(), path = %path.display(), "Loaded fight stats");

        Ok(Self {
            path,
            cache: RwLock::new(ledger),
        })
    }
}

#[async_trait]
impl FightStatsStore for JsonFightStatsStore {
    async fn load(&self) -> Result<FightLedger, FightStatsError> {
        Ok(self.cache.read().await.clone())
    }

    async fn save(&self, ledger: &FightLedger) -> Result<(), FightStatsError> {
        let mut cache = self.cache.write().await;
        *cache = ledger.clone();
        json_file::save(&self.path, &*cache).map_err(storage)
    }
}

fn storage(e: impl std::fmt::Display) -> FightStatsError {
    FightStatsError::StorageError(e.to_string())
}
