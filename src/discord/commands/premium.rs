// Discord commands for premium unlocks: the shop, the status board and the
// owner-only activation tools.

use crate::core::premium::{ModuleState, PremiumError, PremiumModule};
use crate::discord::commands::fiery::{fiery_embed, FIERY_ORANGE};
use crate::discord::{Context, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;
use reqwest::Url;

const PAYPAL_CHECKOUT: &str = "https://www.paypal.com/cgi-bin/webscr";

/// PayPal checkout link for one module of one guild.
///
/// `custom` carries `GUILD_ID|module` so a payment can be matched to the
/// unlock it pays for.
pub fn upgrade_link(guild_id: u64, module: PremiumModule, email: &str, price: &str) -> String {
    let item_name = format!("Premium_{}_{}", capitalized(module.as_str()), guild_id);
    let custom = format!("{}|{}", guild_id, module.as_str());

    match Url::parse_with_params(
        PAYPAL_CHECKOUT,
        &[
            ("cmd", "_xclick"),
            ("business", email),
            ("amount", price),
            ("currency_code", "USD"),
            ("item_name", item_name.as_str()),
            ("custom", custom.as_str()),
        ],
    ) {
        Ok(url) => url.into(),
        Err(e) => {
            tracing::error!(guild_id, "Could not build upgrade link: {e}");
            PAYPAL_CHECKOUT.to_string()
        }
    }
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn state_label(state: ModuleState) -> String {
    match state {
        ModuleState::Permanent => "♾️ Unlocked forever".to_string(),
        ModuleState::ActiveUntil(expiry) => {
            format!("✅ Active until <t:{}:D>", expiry.timestamp())
        }
        ModuleState::Expired(expiry) => format!("⌛ Expired <t:{}:R>", expiry.timestamp()),
        ModuleState::Locked => "🔒 Locked".to_string(),
    }
}

fn parse_guild_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|id| *id != 0)
}

/// Open the Fiery Shop: one upgrade link per module.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn premium(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();
    let config = &ctx.data().config;
    let status = ctx.data().premium.status(guild_id, Utc::now()).await?;

    let mut embed = fiery_embed(
        "🔥 THE FIERY SHOP",
        format!(
            "Each module costs **${}** and unlocks for {} days.",
            config.premium_price, config.premium_days
        ),
    );
    for entry in status {
        let action = if entry.state.is_unlocked() {
            state_label(entry.state)
        } else {
            format!(
                "[**Unlock**]({})",
                upgrade_link(guild_id, entry.module, &config.paypal_email, &config.premium_price)
            )
        };
        embed = embed.field(
            format!("💎 {}", entry.module.title()),
            format!("*{}*\n{}", entry.module.perks(), action),
            false,
        );
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Upgrade link for the ask module.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn askpremium(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();
    let config = &ctx.data().config;
    let link = upgrade_link(
        guild_id,
        PremiumModule::Ask,
        &config.paypal_email,
        &config.premium_price,
    );

    let embed = fiery_embed(
        "💎 UPGRADE TO PREMIUM",
        format!(
            "Click [**HERE**]({link}) to pay ${} via PayPal.\n\n**Benefits:**\n• Glowing Visual VS Lobbies\n• Faster Activation",
            config.premium_price
        ),
    );
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show which modules this server has unlocked.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn premiumstatus(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();
    let status = ctx.data().premium.status(guild_id, Utc::now()).await?;

    let mut embed = serenity::CreateEmbed::new()
        .title("💎 PREMIUM STATUS")
        .color(FIERY_ORANGE)
        .footer(serenity::CreateEmbedFooter::new(format!("Server ID: {guild_id}")));
    for entry in status {
        embed = embed.field(entry.module.title(), state_label(entry.state), true);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Unlock a module for a server. `days` defaults to the configured length; 0 unlocks forever.
#[poise::command(prefix_command, slash_command, owners_only, hide_in_help)]
pub async fn activate(
    ctx: Context<'_>,
    #[description = "Server ID"] guild_id: String,
    #[description = "ask, fight, ship or bank"] module: String,
    #[description = "Days to unlock (0 = forever)"] days: Option<u32>,
) -> Result<(), Error> {
    let Some(guild_id) = parse_guild_id(&guild_id) else {
        ctx.say("❌ That is not a valid server ID.").await?;
        return Ok(());
    };
    let module: PremiumModule = match module.parse() {
        Ok(module) => module,
        Err(e) => {
            ctx.say(format!("❌ {e}")).await?;
            return Ok(());
        }
    };

    let days = days.unwrap_or(ctx.data().config.premium_days);
    let days = (days > 0).then_some(days);
    let granted = ctx
        .data()
        .premium
        .activate(guild_id, module, days, Utc::now())
        .await?;

    let until = match granted.expires_at {
        Some(expiry) => format!("until <t:{}:F>", expiry.timestamp()),
        None => "permanently".to_string(),
    };
    ctx.say(format!(
        "✅ Module **{}** activated for Guild {} {}!",
        module.as_str(),
        guild_id,
        until
    ))
    .await?;
    Ok(())
}

/// Revoke a module from a server.
#[poise::command(prefix_command, slash_command, owners_only, hide_in_help)]
pub async fn deactivate(
    ctx: Context<'_>,
    #[description = "Server ID"] guild_id: String,
    #[description = "ask, fight, ship or bank"] module: String,
) -> Result<(), Error> {
    let Some(guild_id) = parse_guild_id(&guild_id) else {
        ctx.say("❌ That is not a valid server ID.").await?;
        return Ok(());
    };
    let module: PremiumModule = match module.parse() {
        Ok(module) => module,
        Err(e) => {
            ctx.say(format!("❌ {e}")).await?;
            return Ok(());
        }
    };

    match ctx.data().premium.deactivate(guild_id, module).await {
        Ok(()) => {
            ctx.say(format!(
                "🔒 Module **{}** revoked for Guild {}.",
                module.as_str(),
                guild_id
            ))
            .await?;
        }
        Err(PremiumError::NotActive(_)) => {
            ctx.say(format!(
                "ℹ️ Module **{}** was not active for Guild {}.",
                module.as_str(),
                guild_id
            ))
            .await?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Permanently unlock the ask module for a server.
#[poise::command(prefix_command, slash_command, owners_only, hide_in_help)]
pub async fn askactivate(
    ctx: Context<'_>,
    #[description = "Server ID"] guild_id: String,
) -> Result<(), Error> {
    let Some(guild_id) = parse_guild_id(&guild_id) else {
        ctx.say("❌ That is not a valid server ID.").await?;
        return Ok(());
    };

    ctx.data()
        .premium
        .activate(guild_id, PremiumModule::Ask, None, Utc::now())
        .await?;
    ctx.say(format!(
        "✅ Module **{}** activated for Guild {}!",
        PremiumModule::Ask.as_str(),
        guild_id
    ))
    .await?;
    Ok(())
}
