// The infra module contains implementations of core traits,
// plus the outbound HTTP and rendering adapters the commands lean on.

mod json_file;

#[path = "premium/json_premium_store.rs"]
pub mod premium;

#[path = "ask/json_history_store.rs"]
pub mod ask;

#[path = "fight/json_stats_store.rs"]
pub mod fight;

#[path = "bank/sqlite_bank_store.rs"]
pub mod bank;

#[path = "avatars/avatar_fetcher.rs"]
pub mod avatars;

#[path = "visuals/mod.rs"]
pub mod visuals;
