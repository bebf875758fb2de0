use crate::core::ship::ShipReading;
use crate::discord::commands::fiery::{render_pair, ship_unlocked, FIERY_ORANGE};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use poise::serenity_prelude::Mentionable;

/// Ask the oracle how compatible two souls are.
#[poise::command(prefix_command, slash_command, guild_only, check = "ship_unlocked")]
pub async fn ship(
    ctx: Context<'_>,
    #[description = "Who to ship with"] member: Option<serenity::User>,
) -> Result<(), Error> {
    let Some(partner) = member else {
        ctx.say("💘 **THE ORACLE NEEDS A PARTNER!** Mention someone to challenge the fates!")
            .await?;
        return Ok(());
    };
    let author = ctx.author().clone();

    if partner.id == author.id {
        ctx.say("🎭 Narcissus? Try shipping with someone else!")
            .await?;
        return Ok(());
    }

    let reading = ShipReading::roll(&mut rand::thread_rng());
    tracing::debug!(
        guild_id = ctx.guild_id().map(|g| g.get()),
        percent = reading.percent,
        "Ship reading"
    );

    ctx.defer_or_broadcast().await?;

    let card = render_pair(ctx.data(), "ship", &author, &partner, move |cards, a, b| {
        cards.ship_card(a, b, &reading)
    })
    .await;

    let guild_icon = ctx.guild().and_then(|guild| guild.icon_url());
    let mut footer = serenity::CreateEmbedFooter::new("Glory to the Echo! | Master Matchmaker");
    if let Some(icon) = guild_icon {
        footer = footer.icon_url(icon);
    }

    let mut embed = serenity::CreateEmbed::new()
        .title(format!("🏹 {}", reading.tier.title()))
        .description(format!(
            "### {} 💓 {}\n**{}%** compatible",
            author.mention(),
            partner.mention(),
            reading.percent
        ))
        .color(FIERY_ORANGE)
        .footer(footer);

    let mut reply = poise::CreateReply::default();
    if let Some(png) = card {
        reply = reply.attachment(serenity::CreateAttachment::bytes(png, "ship.png"));
        embed = embed.image("attachment://ship.png");
    }
    ctx.send(reply.embed(embed)).await?;

    Ok(())
}
