// Fight module - the duel engine, the stats ledger and the running-duel registry.

pub mod arena;
pub mod duel;
pub mod fight_stats;

pub use arena::ActiveDuels;
pub use duel::{health_bar, Duel, Fighter, Side};
pub use fight_stats::{FightLedger, FightRecord, FightStatsError, FightStatsService, FightStatsStore, RankSummary};
