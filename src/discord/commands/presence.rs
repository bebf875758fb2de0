// Bot presence and lifecycle events.
//
// Discord-layer glue only: works with serenity types (Context, ActivityData,
// OnlineStatus) and nothing from core.

use poise::serenity_prelude as serenity;

pub const DEFAULT_ACTIVITY: &str = "!ask | !fight | !ship";

/// Reset the bot's status to the default game list.
pub fn reset_status(ctx: &serenity::Context) {
    let activity = serenity::ActivityData::playing(DEFAULT_ACTIVITY);
    ctx.set_presence(Some(activity), serenity::OnlineStatus::Online);
}

/// Called once the bot is ready to announce the default presence.
pub fn on_ready(ctx: &serenity::Context, ready: &serenity::Ready) {
    tracing::info!(
        user = %ready.user.name,
        guilds = ready.guilds.len(),
        "🔥 Fiery Dungeon is online"
    );
    reset_status(ctx);
}
