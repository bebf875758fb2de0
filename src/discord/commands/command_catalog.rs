// Discord commands module.
// Each game gets its own command file; shared embed and premium helpers live in `fiery`.

use crate::config::BotConfig;
use crate::core::ask::AskService;
use crate::core::bank::BankService;
use crate::core::fight::{ActiveDuels, FightStatsService};
use crate::core::premium::PremiumService;
use crate::infra::ask::JsonAskHistoryStore;
use crate::infra::avatars::AvatarFetcher;
use crate::infra::bank::SqliteBankStore;
use crate::infra::fight::JsonFightStatsStore;
use crate::infra::premium::JsonPremiumStore;
use crate::infra::visuals::CardRenderer;
use std::sync::Arc;

pub mod ask;
pub mod bank;
pub mod fight;
pub mod fiery;
pub mod help;
pub mod info;
pub mod premium;
pub mod presence;
pub mod ship;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state handed to every command.
pub struct Data {
    pub config: Arc<BotConfig>,
    pub premium: Arc<PremiumService<JsonPremiumStore>>,
    pub ask: Arc<AskService<JsonAskHistoryStore>>,
    pub fights: Arc<FightStatsService<JsonFightStatsStore>>,
    pub arena: Arc<ActiveDuels>,
    pub bank: Arc<BankService<SqliteBankStore>>,
    pub cards: Arc<CardRenderer>,
    pub avatars: Arc<AvatarFetcher>,
}
