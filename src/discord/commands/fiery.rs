// Shared pieces for every game: the house embed style, premium gates, names,
// avatars and card rendering.

use crate::core::premium::PremiumModule;
use crate::discord::{Context, Data, Error};
use crate::infra::visuals::{CardRenderer, VisualError};
use chrono::Utc;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

pub const FIERY_ORANGE: u32 = 0xff4500;
pub const LOCKED_RED: u32 = 0xff0000;

pub fn fiery_embed(title: impl Into<String>, description: impl Into<String>) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(FIERY_ORANGE)
}

/// The logo as an attachment under `filename`, if one is configured.
pub fn logo_attachment(data: &Data, filename: &str) -> Option<serenity::CreateAttachment> {
    data.cards
        .logo_bytes()
        .map(|bytes| serenity::CreateAttachment::bytes(bytes.to_vec(), filename.to_string()))
}

/// Attach the logo and point the embed thumbnail at it.
pub fn with_logo_thumbnail(
    data: &Data,
    reply: poise::CreateReply,
    embed: serenity::CreateEmbed,
    filename: &str,
) -> poise::CreateReply {
    match logo_attachment(data, filename) {
        Some(logo) => reply
            .attachment(logo)
            .embed(embed.thumbnail(format!("attachment://{filename}"))),
        None => reply.embed(embed),
    }
}

/// Is `module` unlocked for the guild this command runs in?
pub async fn module_unlocked(ctx: Context<'_>, module: PremiumModule) -> Result<bool, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        return Ok(false);
    };
    Ok(ctx
        .data()
        .premium
        .is_active(guild_id.get(), module, Utc::now())
        .await?)
}

pub fn locked_embed(module: PremiumModule) -> serenity::CreateEmbed {
    let (title, description) = match module {
        PremiumModule::Bank => (
            "🔒 ENGINE LOCKED",
            format!(
                "The **{}** is not active. An administrator must use `!premium` to unlock.",
                module.title()
            ),
        ),
        _ => (
            "🚫 MODULE LOCKED",
            format!(
                "This server does not have an active **Premium Subscription** for the **{}** module.\n\nType `!premium` to unlock it!\n*{}*",
                module.title(),
                module.perks()
            ),
        ),
    };

    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(LOCKED_RED)
}

/// Send the locked notice when `module` is not unlocked; returns whether it is.
pub async fn require_module(ctx: Context<'_>, module: PremiumModule) -> Result<bool, Error> {
    if module_unlocked(ctx, module).await? {
        return Ok(true);
    }

    tracing::debug!(
        guild_id = ctx.guild_id().map(|g| g.get()),
        module = module.as_str(),
        "Blocked locked module"
    );
    let reply = with_logo_thumbnail(
        ctx.data(),
        poise::CreateReply::default(),
        locked_embed(module),
        "lock.png",
    );
    ctx.send(reply).await?;
    Ok(false)
}

// poise checks take a plain function, one per gated module

pub async fn ask_unlocked(ctx: Context<'_>) -> Result<bool, Error> {
    require_module(ctx, PremiumModule::Ask).await
}

pub async fn ship_unlocked(ctx: Context<'_>) -> Result<bool, Error> {
    require_module(ctx, PremiumModule::Ship).await
}

pub async fn bank_unlocked(ctx: Context<'_>) -> Result<bool, Error> {
    require_module(ctx, PremiumModule::Bank).await
}

/// Server nickname, then global display name, then username.
pub async fn display_name(ctx: Context<'_>, user: &serenity::User) -> String {
    if let Some(guild_id) = ctx.guild_id() {
        if let Some(nick) = user.nick_in(ctx.serenity_context(), guild_id).await {
            return nick;
        }
    }
    user.global_name.clone().unwrap_or_else(|| user.name.clone())
}

fn avatar_hash(user: &serenity::User) -> Option<String> {
    user.avatar.as_ref().map(|hash| hash.to_string())
}

/// Run a card render on the blocking pool. Failures are logged and turn into
/// `None` so the command can fall back to a plain embed.
pub async fn render<F>(data: &Data, card: &'static str, draw: F) -> Option<Vec<u8>>
where
    F: FnOnce(&CardRenderer) -> Result<Vec<u8>, VisualError> + Send + 'static,
{
    let cards = Arc::clone(&data.cards);
    let result = tokio::task::spawn_blocking(move || draw(&cards))
        .await
        .map_err(VisualError::from)
        .and_then(|r| r);

    match result {
        Ok(png) => Some(png),
        Err(e) => {
            tracing::warn!(card, "Card render failed: {e}");
            None
        }
    }
}

/// Fetch both avatars, then render a two-player card.
pub async fn render_pair<F>(
    data: &Data,
    card: &'static str,
    first: &serenity::User,
    second: &serenity::User,
    draw: F,
) -> Option<Vec<u8>>
where
    F: FnOnce(&CardRenderer, &[u8], &[u8]) -> Result<Vec<u8>, VisualError> + Send + 'static,
{
    let (hash_a, hash_b) = (avatar_hash(first), avatar_hash(second));
    let avatars = data
        .avatars
        .fetch_pair(
            (first.id.get(), hash_a.as_deref()),
            (second.id.get(), hash_b.as_deref()),
        )
        .await;

    match avatars {
        Ok((a, b)) => render(data, card, move |cards| draw(cards, &a, &b)).await,
        Err(e) => {
            tracing::warn!(card, "Avatar fetch failed: {e}");
            None
        }
    }
}

/// Fetch one avatar, then render a single-player card.
pub async fn render_single<F>(
    data: &Data,
    card: &'static str,
    user: &serenity::User,
    draw: F,
) -> Option<Vec<u8>>
where
    F: FnOnce(&CardRenderer, &[u8]) -> Result<Vec<u8>, VisualError> + Send + 'static,
{
    let hash = avatar_hash(user);
    match data.avatars.fetch(user.id.get(), hash.as_deref()).await {
        Ok(avatar) => render(data, card, move |cards| draw(cards, &avatar)).await,
        Err(e) => {
            tracing::warn!(card, user_id = user.id.get(), "Avatar fetch failed: {e}");
            None
        }
    }
}

/// Plain ephemeral answer to a component press.
pub async fn ephemeral(
    ctx: Context<'_>,
    press: &serenity::ComponentInteraction,
    content: impl Into<String>,
) -> Result<(), Error> {
    press
        .create_response(
            ctx.serenity_context(),
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

/// Strip buttons and menus from a message whose interaction window closed.
pub async fn clear_components(ctx: Context<'_>, message: &mut serenity::Message) {
    if let Err(e) = message
        .edit(
            ctx.serenity_context(),
            serenity::EditMessage::new().components(vec![]),
        )
        .await
    {
        tracing::warn!(message_id = message.id.get(), "Failed to clear components: {e}");
    }
}
