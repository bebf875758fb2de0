// This is the entry point of the Fiery Dungeon bot.
//
// **Architecture Overview:**
// - `core/` = Game rules and premium gating (platform-agnostic)
// - `infra/` = Implementations of core traits (JSON files, SQLite), avatar
//   downloads and card rendering
// - `discord/` = Discord-specific adapters (commands, embeds, buttons)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::BotConfig;
use crate::core::ask::AskService;
use crate::core::bank::BankService;
use crate::core::fight::{ActiveDuels, FightStatsService};
use crate::core::premium::PremiumService;
use crate::discord::commands::presence;
use crate::discord::{Data, Error};
use crate::infra::ask::JsonAskHistoryStore;
use crate::infra::avatars::AvatarFetcher;
use crate::infra::bank::SqliteBankStore;
use crate::infra::fight::JsonFightStatsStore;
use crate::infra::premium::JsonPremiumStore;
use crate::infra::visuals::CardRenderer;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Log every command failure; tell the user when it was ours.
async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!(
                command = %ctx.command().qualified_name,
                guild_id = ctx.guild_id().map(|g| g.get()),
                "Command failed: {error}"
            );
            if let Err(e) = ctx
                .say("🔥 The dungeon stumbled. Please try again in a moment.")
                .await
            {
                tracing::warn!("Failed to report command error: {e}");
            }
        }
        // Premium checks already answered with the locked embed
        poise::FrameworkError::CommandCheckFailed { error: None, .. } => {}
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling error: {e}");
            }
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = Arc::new(BotConfig::from_env().expect("Invalid bot configuration"));

    std::fs::create_dir_all(&config.data_dir)
        .expect("Failed to create data directory for JSON and SQLite files");
    tracing::info!(data_dir = %config.data_dir.display(), "Using data directory");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let premium_store = JsonPremiumStore::new(config.data_file("premium_guilds.json"))
        .expect("Failed to load premium registry");
    let premium_service = Arc::new(PremiumService::new(premium_store));

    let history_store = JsonAskHistoryStore::new(config.data_file("ask_history.json"))
        .expect("Failed to load ask history");
    let ask_service = Arc::new(AskService::new(history_store));

    let stats_store = JsonFightStatsStore::new(config.data_file("fight_stats.json"))
        .expect("Failed to load fight stats");
    let fight_service = Arc::new(FightStatsService::new(stats_store));

    let bank_db_path = config.data_file("economy.db");
    let bank_store = SqliteBankStore::new(&bank_db_path.to_string_lossy())
        .await
        .expect("Failed to initialize SQLite bank store");
    let bank_service = Arc::new(BankService::new(bank_store));

    let cards = Arc::new(CardRenderer::load(
        &config.logo_path,
        config.font_path.as_deref(),
    ));
    let avatars = Arc::new(AvatarFetcher::new().expect("Failed to create avatar HTTP client"));

    // Create the data structure that will be shared across all commands
    let data = Data {
        config: Arc::clone(&config),
        premium: premium_service,
        ask: ask_service,
        fights: fight_service,
        arena: Arc::new(ActiveDuels::new()),
        bank: bank_service,
        cards,
        avatars,
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required for prefix commands
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::commands::ask::ask(),
                discord::commands::ask::askcommands(),
                discord::commands::ask::adminask(),
                discord::commands::fight::fight(),
                discord::commands::fight::fightrank(),
                discord::commands::ship::ship(),
                discord::commands::bank::profile(),
                discord::commands::premium::premium(),
                discord::commands::premium::askpremium(),
                discord::commands::premium::premiumstatus(),
                discord::commands::premium::activate(),
                discord::commands::premium::deactivate(),
                discord::commands::premium::askactivate(),
                discord::commands::info::invite(),
                discord::commands::help::help(),
            ],
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(config.prefix.clone()),
                case_insensitive_commands: true,
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            pre_command: |ctx| {
                Box::pin(async move {
                    tracing::debug!(
                        command = %ctx.command().qualified_name,
                        user_id = ctx.author().id.get(),
                        "Running command"
                    );
                })
            },
            ..Default::default()
        })
        .setup(|ctx, ready, framework| {
            Box::pin(async move {
                tracing::info!("🤖 Bot is starting up...");

                // Register slash commands globally (can take up to an hour to propagate)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                tracing::info!("✅ Commands registered!");
                presence::on_ready(ctx, ready);

                Ok(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
