use crate::discord::commands::fiery::fiery_embed;
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

/// What the games need in a channel: post embeds with rendered cards and
/// read the replies they collect.
fn invite_permissions() -> serenity::Permissions {
    serenity::Permissions::VIEW_CHANNEL
        | serenity::Permissions::SEND_MESSAGES
        | serenity::Permissions::EMBED_LINKS
        | serenity::Permissions::ATTACH_FILES
        | serenity::Permissions::READ_MESSAGE_HISTORY
        | serenity::Permissions::USE_EXTERNAL_EMOJIS
}

pub fn invite_url(bot_id: u64) -> String {
    format!(
        "https://discord.com/api/oauth2/authorize?client_id={bot_id}&permissions={}&scope=bot%20applications.commands",
        invite_permissions().bits()
    )
}

/// Get a link to add the bot to your server.
#[poise::command(slash_command, prefix_command)]
pub async fn invite(ctx: Context<'_>) -> Result<(), Error> {
    let link = invite_url(ctx.framework().bot_id.get());

    let mut embed = fiery_embed(
        "🔗 INVITE THE DUNGEON",
        format!("Bring the Echo to your server: [**Click here**]({link})"),
    );
    if let Ok(bot_user) = ctx.framework().bot_id.to_user(&ctx).await {
        embed = embed.thumbnail(bot_user.face());
    }
    embed = embed.footer(serenity::CreateEmbedFooter::new("Glory to the Echo!"));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_url_names_the_bot_and_scopes() {
        let url = invite_url(4242);
        assert!(url.contains("client_id=4242"));
        assert!(url.contains(&format!("permissions={}", invite_permissions().bits())));
        assert!(invite_permissions().contains(serenity::Permissions::ATTACH_FILES));
        assert!(url.ends_with("scope=bot%20applications.commands"));
    }
}
