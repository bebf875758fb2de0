// Discord commands for the bank engine.

use crate::discord::commands::fiery::{self, bank_unlocked};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;

const PROFILE_CYAN: u32 = 0x00fbff;
const BAR_CELLS: usize = 10;

/// View your Sparks and Echo level.
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    aliases("stats", "sparks"),
    check = "bank_unlocked"
)]
pub async fn profile(
    ctx: Context<'_>,
    #[description = "User to inspect (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target = user.as_ref().unwrap_or_else(|| ctx.author());

    if target.bot {
        ctx.say("🤖 Bots don't carry Sparks.").await?;
        return Ok(());
    }

    let account = ctx.data().bank.get_user_data(target.id.get()).await?;
    let needed = account.xp_needed();
    let name = fiery::display_name(ctx, target).await;

    let embed = serenity::CreateEmbed::new()
        .title(format!("✨ {name}'s Profile"))
        .color(PROFILE_CYAN)
        .field(
            "⚡ Sparks",
            format!("**{}**", with_separators(account.sparks)),
            true,
        )
        .field(
            "💠 Echo Level",
            format!("Level **{}**", account.echo_level),
            true,
        )
        .field(
            "📊 Echo Experience",
            format!(
                "{} ({}/{} XP)",
                progress_bar(account.echo_xp, needed),
                account.echo_xp,
                needed
            ),
            false,
        );

    let reply = if ctx.data().cards.logo_bytes().is_some() {
        fiery::with_logo_thumbnail(ctx.data(), poise::CreateReply::default(), embed, "logo.png")
    } else {
        poise::CreateReply::default().embed(embed.thumbnail(target.face()))
    };
    ctx.send(reply).await?;

    Ok(())
}

/// `1234567` -> `1,234,567`.
fn with_separators(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(digit);
    }
    out
}

fn progress_bar(xp: i64, needed: i64) -> String {
    let filled = if needed <= 0 {
        BAR_CELLS
    } else {
        ((xp.max(0) * BAR_CELLS as i64) / needed).min(BAR_CELLS as i64) as usize
    };
    format!("{}{}", "▰".repeat(filled), "▱".repeat(BAR_CELLS - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparks_are_grouped_in_thousands() {
        assert_eq!(with_separators(7), "7");
        assert_eq!(with_separators(-999), "-999");
        assert_eq!(with_separators(12_500), "12,500");
        assert_eq!(with_separators(100_000), "100,000");
        assert_eq!(with_separators(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn progress_bar_floors_to_cells() {
        assert_eq!(progress_bar(0, 500), "▱▱▱▱▱▱▱▱▱▱");
        assert_eq!(progress_bar(149, 500), "▰▰▱▱▱▱▱▱▱▱");
        assert_eq!(progress_bar(250, 500), "▰▰▰▰▰▱▱▱▱▱");
        assert_eq!(progress_bar(900, 500), "▰▰▰▰▰▰▰▰▰▰");
    }
}
