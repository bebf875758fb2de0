// Persistent duel statistics: wins, fights, streaks and victims, tracked both
// globally and per guild.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::Mutex;

/// How many victims the rank card lists.
pub const TOP_VICTIMS: usize = 5;

/// Bank payouts for a finished duel.
pub const WINNER_SPARKS: i64 = 25;
pub const WINNER_ECHO_XP: i64 = 50;
pub const LOSER_ECHO_XP: i64 = 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FightRecord {
    pub wins: u32,
    pub fights: u32,
    pub streak: u32,
    /// Victim user id -> times defeated.
    #[serde(default)]
    pub victims: HashMap<u64, u32>,
}

impl FightRecord {
    /// Win rate in percent; zero before the first fight.
    pub fn win_rate(&self) -> f64 {
        if self.fights == 0 {
            0.0
        } else {
            f64::from(self.wins) / f64::from(self.fights) * 100.0
        }
    }

    fn record_win(&mut self, loser_id: u64) {
        self.wins += 1;
        self.fights += 1;
        self.streak += 1;
        *self.victims.entry(loser_id).or_insert(0) += 1;
    }

    fn record_loss(&mut self) {
        self.fights += 1;
        self.streak = 0;
    }
}

/// The whole stats file: `{ global: {uid: rec}, servers: {gid: {uid: rec}} }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FightLedger {
    #[serde(default)]
    pub global: HashMap<u64, FightRecord>,
    #[serde(default)]
    pub servers: HashMap<u64, HashMap<u64, FightRecord>>,
}

impl FightLedger {
    pub fn record_result(&mut self, guild_id: u64, winner_id: u64, loser_id: u64) {
        self.global.entry(winner_id).or_default().record_win(loser_id);
        self.global.entry(loser_id).or_default().record_loss();

        let server = self.servers.entry(guild_id).or_default();
        server.entry(winner_id).or_default().record_win(loser_id);
        server.entry(loser_id).or_default().record_loss();
    }

    pub fn rank_summary(&self, guild_id: u64, user_id: u64) -> RankSummary {
        let empty = HashMap::new();
        let local = self.servers.get(&guild_id).unwrap_or(&empty);

        let global_record = self.global.get(&user_id).cloned().unwrap_or_default();
        let mut top_victims: Vec<(u64, u32)> = global_record
            .victims
            .iter()
            .map(|(id, count)| (*id, *count))
            .collect();
        top_victims.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        top_victims.truncate(TOP_VICTIMS);

        RankSummary {
            global_rank: rank_of(&self.global, user_id),
            local_rank: rank_of(local, user_id),
            local: local.get(&user_id).cloned().unwrap_or_default(),
            global: global_record,
            top_victims,
        }
    }
}

/// 1-based position by wins; ties are broken by user id so ranks are stable.
fn rank_of(records: &HashMap<u64, FightRecord>, user_id: u64) -> Option<usize> {
    let mut ordered: Vec<(&u64, &FightRecord)> = records.iter().collect();
    ordered.sort_by(|a, b| b.1.wins.cmp(&a.1.wins).then(a.0.cmp(b.0)));
    ordered
        .iter()
        .position(|(id, _)| **id == user_id)
        .map(|i| i + 1)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankSummary {
    pub global_rank: Option<usize>,
    pub global: FightRecord,
    pub local_rank: Option<usize>,
    pub local: FightRecord,
    /// Most-defeated opponents, worst-treated first.
    pub top_victims: Vec<(u64, u32)>,
}

#[derive(Debug, Error)]
pub enum FightStatsError {
    #[error("Storage error: {0}")]
    StorageError(String),
}

#[async_trait]
pub trait FightStatsStore: Send + Sync {
    async fn load(&self) -> Result<FightLedger, FightStatsError>;
    async fn save(&self, ledger: &FightLedger) -> Result<(), FightStatsError>;
}

pub struct FightStatsService<S: FightStatsStore> {
    store: S,
    /// Serializes read-modify-write cycles on the ledger.
    write_lock: Mutex<()>,
}

impl<S: FightStatsStore> FightStatsService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// Record a finished duel and return the winner's updated global record.
    pub async fn record_result(
        &self,
        guild_id: u64,
        winner_id: u64,
        loser_id: u64,
    ) -> Result<FightRecord, FightStatsError> {
        let _guard = self.write_lock.lock().await;

        let mut ledger = self.store.load().await?;
        ledger.record_result(guild_id, winner_id, loser_id);
        self.store.save(&ledger).await?;

        tracing::info!(guild_id, winner_id, loser_id, "Duel result recorded");

        Ok(ledger.global.get(&winner_id).cloned().unwrap_or_default())
    }

    pub async fn rank_summary(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<RankSummary, FightStatsError> {
        Ok(self.store.load().await?.rank_summary(guild_id, user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct InMemoryLedger {
        ledger: std::sync::Mutex<FightLedger>,
    }

    #[async_trait]
    impl FightStatsStore for InMemoryLedger {
        async fn load(&self) -> Result<FightLedger, FightStatsError> {
            Ok(self.ledger.lock().unwrap().clone())
        }

        async fn save(&self, ledger: &FightLedger) -> Result<(), FightStatsError> {
            *self.ledger.lock().unwrap() = ledger.clone();
            Ok(())
        }
    }

    #[test]
    fn result_updates_global_and_local_records() {
        let mut ledger = FightLedger::default();
        ledger.record_result(10, 1, 2);
        ledger.record_result(10, 1, 2);
        ledger.record_result(20, 2, 1);

        let winner = &ledger.global[&1];
        assert_eq!(winner.wins, 2);
        assert_eq!(winner.fights, 3);
        assert_eq!(winner.streak, 0, "loss resets the streak");
        assert_eq!(winner.victims[&2], 2);

        let loser = &ledger.global[&2];
        assert_eq!(loser.wins, 1);
        assert_eq!(loser.streak, 1);

        let local = &ledger.servers[&10];
        assert_eq!(local[&1].wins, 2);
        assert_eq!(local[&2].fights, 2);
        assert_eq!(ledger.servers[&20][&2].wins, 1);
    }

    #[test]
    fn ranks_order_by_wins_then_id() {
        let mut ledger = FightLedger::default();
        ledger.record_result(1, 5, 9);
        ledger.record_result(1, 5, 9);
        ledger.record_result(1, 3, 9);
        ledger.record_result(2, 4, 9);

        assert_eq!(ledger.rank_summary(1, 5).global_rank, Some(1));
        // 3 and 4 both have one win; lower id ranks first
        assert_eq!(ledger.rank_summary(1, 3).global_rank, Some(2));
        assert_eq!(ledger.rank_summary(1, 4).global_rank, Some(3));
        assert_eq!(ledger.rank_summary(1, 4).local_rank, None);
        assert_eq!(ledger.rank_summary(1, 77).global_rank, None);
    }

    #[test]
    fn top_victims_are_capped_and_sorted() {
        let mut ledger = FightLedger::default();
        for victim in 100..108u64 {
            for _ in 0..(victim - 99) {
                ledger.record_result(1, 1, victim);
            }
        }

        let summary = ledger.rank_summary(1, 1);
        assert_eq!(summary.top_victims.len(), TOP_VICTIMS);
        assert_eq!(summary.top_victims[0], (107, 8));
        assert_eq!(summary.top_victims[4], (103, 4));
    }

    #[test]
    fn win_rate_handles_no_fights() {
        assert_eq!(FightRecord::default().win_rate(), 0.0);
        let record = FightRecord {
            wins: 1,
            fights: 4,
            ..Default::default()
        };
        assert_eq!(record.win_rate(), 25.0);
    }

    #[test]
    fn ledger_reads_legacy_string_keys() {
        let raw = r#"{
            "global": {"42": {"wins": 3, "fights": 4, "streak": 2, "victims": {"7": 3}}},
            "servers": {"900": {"42": {"wins": 1, "fights": 1, "streak": 1, "victims": {}}}}
        }"#;
        let ledger: FightLedger = serde_json::from_str(raw).unwrap();
        assert_eq!(ledger.global[&42].victims[&7], 3);
        assert_eq!(ledger.servers[&900][&42].wins, 1);
    }

    #[tokio::test]
    async fn service_returns_updated_winner_record() {
        let service = FightStatsService::new(InMemoryLedger::default());
        service.record_result(1, 8, 9).await.unwrap();
        let record = service.record_result(1, 8, 9).await.unwrap();

        assert_eq!(record.wins, 2);
        assert_eq!(record.streak, 2);

        let summary = service.rank_summary(1, 9).await.unwrap();
        assert_eq!(summary.global.fights, 2);
        assert_eq!(summary.global_rank, Some(2));
    }
}
