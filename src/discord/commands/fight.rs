// Discord commands for the Echo Arena.
//
// The duel itself is pure core logic; this file runs the round clock, the
// CHEER! window between rounds, and pays out through the bank afterwards.

use crate::core::fight::fight_stats::{LOSER_ECHO_XP, WINNER_ECHO_XP, WINNER_SPARKS};
use crate::core::fight::{health_bar, Duel, FightRecord, Fighter, RankSummary, Side};
use crate::core::premium::PremiumModule;
use crate::discord::commands::fiery::{
    self, clear_components, ephemeral, module_unlocked, render_pair, render_single,
    with_logo_thumbnail, FIERY_ORANGE,
};
use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use poise::serenity_prelude::Mentionable;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::num::NonZeroU64;
use std::time::Duration;
use tokio::time::Instant;

const ROUND_DELAY: Duration = Duration::from_millis(2500);
const CHAMPION_GREEN: u32 = 0x00ff00;

/// Challenge another member to a duel in the Echo Arena.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn fight(
    ctx: Context<'_>,
    #[description = "Who you want to fight"] member: Option<serenity::User>,
) -> Result<(), Error> {
    let Some(defender) = member else {
        ctx.say("❌ **THE ARENA DEMANDS A TRIBUTE!** Mention someone to challenge them!")
            .await?;
        return Ok(());
    };
    let challenger = ctx.author().clone();

    if defender.id == challenger.id {
        ctx.say("💢 You can't fight yourself. Stop punching the air.")
            .await?;
        return Ok(());
    }
    if defender.bot {
        ctx.say("🤖 Bots don't feel pain. You'd lose instantly to the machine.")
            .await?;
        return Ok(());
    }

    let data = ctx.data();
    let Some(_slot) = data
        .arena
        .try_begin(challenger.id.get(), defender.id.get())
    else {
        let busy = if data.arena.is_fighting(challenger.id.get()) {
            "You are".to_string()
        } else {
            format!("**{}** is", defender.name)
        };
        ctx.say(format!(
            "⏳ {busy} already locked in a duel. Let the dust settle first!"
        ))
        .await?;
        return Ok(());
    };

    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();
    let premium = module_unlocked(ctx, PremiumModule::Fight).await?;
    let challenger_name = fiery::display_name(ctx, &challenger).await;
    let defender_name = fiery::display_name(ctx, &defender).await;

    tracing::info!(
        guild_id,
        challenger = challenger.id.get(),
        defender = defender.id.get(),
        "Duel started"
    );

    // Opening card
    let arena_png = render_pair(data, "arena", &challenger, &defender, |cards, a, b| {
        cards.arena(a, b)
    })
    .await;
    let has_arena = arena_png.is_some();

    let mut opening = serenity::CreateEmbed::new()
        .title("⚔️ ECHO ARENA: THE DUEL BEGINS")
        .description(format!(
            "🔥 **{}** HAS CHALLENGED **{}**\n\n*\"In the echo of battle, only one will stand!\"*",
            challenger.mention(),
            defender.mention()
        ))
        .color(FIERY_ORANGE);
    let mut reply = poise::CreateReply::default();
    if let Some(png) = arena_png {
        reply = reply.attachment(serenity::CreateAttachment::bytes(png, "arena.png"));
        opening = opening.image("attachment://arena.png");
    }
    let reply = with_logo_thumbnail(data, reply, opening, "logo.png");
    let has_logo = data.cards.logo_bytes().is_some();

    let mut board = ctx.send(reply).await?.into_message().await?;
    let board_id = board.id;

    // Rounds
    let cheer_id = format!("{}fight-cheer", ctx.id());
    let mut rng = StdRng::from_entropy();
    let mut duel = Duel::new(
        Fighter::new(challenger.id.get(), challenger_name),
        Fighter::new(defender.id.get(), defender_name),
    );

    while !duel.is_over() {
        cheer_window(ctx, &mut duel, board_id, &cheer_id).await;

        let striker = duel.attacker();
        let outcome = duel.play_round(&mut rng);
        let log = duel.describe(&outcome);

        let mut embed = serenity::CreateEmbed::new()
            .title("🌋 ECHO ARENA: BATTLE RAGING")
            .color(FIERY_ORANGE)
            .field(
                format!("🛡️ {}", duel.fighter(Side::Challenger).name),
                fighter_status(duel.fighter(Side::Challenger), premium),
                true,
            )
            .field(
                format!("🛡️ {}", duel.fighter(Side::Defender).name),
                fighter_status(duel.fighter(Side::Defender), premium),
                true,
            )
            .field("📜 COMBAT LOG", format!("> *{log}*"), false)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "🔥 Turn: {} | CRUSH THEM!",
                duel.fighter(striker).name.to_uppercase()
            )));
        if has_arena {
            embed = embed.image("attachment://arena.png");
        }
        if has_logo {
            embed = embed.thumbnail("attachment://logo.png");
        }

        let mut edit = serenity::EditMessage::new().embed(embed);
        if !duel.is_over() {
            edit = edit.components(vec![cheer_row(&cheer_id)]);
        }
        if let Err(e) = board.edit(ctx.serenity_context(), edit).await {
            tracing::warn!(guild_id, "Failed to update duel board: {e}");
        }
    }
    clear_components(ctx, &mut board).await;

    // Result
    let winner_side = duel.winner().unwrap_or(Side::Challenger);
    let winner = duel.fighter(winner_side).clone();
    let loser = duel.fighter(winner_side.other()).clone();
    let winner_user = if winner_side == Side::Challenger {
        &challenger
    } else {
        &defender
    };

    tracing::info!(
        guild_id,
        winner = winner.user_id,
        loser = loser.user_id,
        rounds = duel.rounds(),
        "Duel finished"
    );

    let record = match data
        .fights
        .record_result(guild_id, winner.user_id, loser.user_id)
        .await
    {
        Ok(record) => record,
        Err(e) => {
            tracing::error!(guild_id, "Failed to save fight stats: {e}");
            FightRecord::default()
        }
    };

    let rewards = pay_out(ctx, &winner, &loser).await;

    let champion_name = winner.name.clone();
    let card_record = record.clone();
    let card = render_single(data, "winner_card", winner_user, move |cards, avatar| {
        cards.winner_card(avatar, &champion_name, &card_record)
    })
    .await;

    let mut embed = serenity::CreateEmbed::new()
        .title("🏆 THE ECHO CHAMPION EMERGES")
        .description(format!(
            "🎊 **{}** HAS CLAIMED THE THRONE!\n\n{}",
            winner.name.to_uppercase(),
            rewards
        ))
        .color(CHAMPION_GREEN);
    let mut reply = poise::CreateReply::default();
    if let Some(png) = card {
        reply = reply.attachment(serenity::CreateAttachment::bytes(png, "winner_card.png"));
        embed = embed.image("attachment://winner_card.png");
    }
    ctx.send(reply.embed(embed)).await?;

    Ok(())
}

/// Collect CHEER! presses until the next round is due.
/// Runs until the round clock is due. Replies that fail to send are only
/// logged; the window keeps collecting.
async fn cheer_window(
    ctx: Context<'_>,
    duel: &mut Duel,
    board_id: serenity::MessageId,
    cheer_id: &str,
) {
    let deadline = Instant::now() + ROUND_DELAY;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return;
        }

        let id = cheer_id.to_string();
        let Some(press) = serenity::ComponentInteractionCollector::new(ctx)
            .channel_id(ctx.channel_id())
            .timeout(remaining)
            .filter(move |press| press.message.id == board_id && press.data.custom_id == id)
            .await
        else {
            return;
        };

        if duel.side_of(press.user.id.get()).is_some() {
            if let Err(e) = ephemeral(ctx, &press, "💢 You're too busy fighting! Focus!").await {
                tracing::warn!(
                    user_id = press.user.id.get(),
                    "Could not turn a fighter's cheer away: {e}"
                );
            }
            continue;
        }

        let fan = press
            .member
            .as_ref()
            .and_then(|m| m.nick.clone())
            .or_else(|| press.user.global_name.clone())
            .unwrap_or_else(|| press.user.name.clone());
        let fueled = duel.cheer().name.clone();

        if let Err(e) = press
            .create_response(
                ctx.serenity_context(),
                serenity::CreateInteractionResponse::Message(
                    serenity::CreateInteractionResponseMessage::new()
                        .content(cheer_shout(&fan, &fueled)),
                ),
            )
            .await
        {
            // The cheer already counted; only the shout is lost
            tracing::warn!(user_id = press.user.id.get(), "Could not announce cheer: {e}");
        }
    }
}

fn cheer_shout(fan: &str, fueled: &str) -> String {
    format!("📣 **{fan}** roars! **{fueled}** is fueled!")
}

fn cheer_row(cheer_id: &str) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![serenity::CreateButton::new(cheer_id)
        .label("CHEER!")
        .style(serenity::ButtonStyle::Danger)
        .emoji(serenity::ReactionType::Unicode("🙌".to_string()))])
}

fn fighter_status(fighter: &Fighter, premium: bool) -> String {
    let mut status = health_bar(fighter.hp, fighter.max_hp, premium);
    if fighter.is_blessed() {
        status.push_str(" ✨ **BLESSED**");
    }
    status
}

/// Bank rewards for both fighters. Returns the lines for the result embed;
/// bank failures are logged and simply left out.
async fn pay_out(ctx: Context<'_>, winner: &Fighter, loser: &Fighter) -> String {
    let bank = &ctx.data().bank;
    let mut lines = Vec::new();

    match bank.update_sparks(winner.user_id, WINNER_SPARKS).await {
        Ok(_) => lines.push(format!(
            "⚡ **{}** earns **{WINNER_SPARKS} Sparks** and **{WINNER_ECHO_XP} Echo XP**.",
            winner.name
        )),
        Err(e) => tracing::error!(user_id = winner.user_id, "Failed to pay duel Sparks: {e}"),
    }

    for (fighter, xp) in [(winner, WINNER_ECHO_XP), (loser, LOSER_ECHO_XP)] {
        match bank.update_echo_xp(fighter.user_id, xp).await {
            Ok(grant) if grant.leveled_up => lines.push(format!(
                "💠 **{}** reached **Echo Level {}**!",
                fighter.name, grant.level
            )),
            Ok(_) => {}
            Err(e) => tracing::error!(user_id = fighter.user_id, "Failed to grant duel XP: {e}"),
        }
    }

    lines.join("\n")
}

/// Show combat ranking and victim stats.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn fightrank(
    ctx: Context<'_>,
    #[description = "Fighter to inspect (defaults to you)"] user: Option<serenity::User>,
) -> Result<(), Error> {
    let target = user.as_ref().unwrap_or_else(|| ctx.author());
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let summary = ctx
        .data()
        .fights
        .rank_summary(guild_id, target.id.get())
        .await?;
    let name = fiery::display_name(ctx, target).await;

    let mut victims = Vec::with_capacity(summary.top_victims.len());
    for (victim_id, count) in &summary.top_victims {
        let victim_name = match victim_user_id(*victim_id) {
            Some(user_id) => match user_id.to_user(ctx).await {
                Ok(user) => user.global_name.unwrap_or(user.name),
                Err(_) => fallen_name(*victim_id),
            },
            None => fallen_name(*victim_id),
        };
        victims.push((victim_name, *count));
    }

    let embed = rank_embed(&name, guild_id, &summary, &victims);
    let reply = with_logo_thumbnail(ctx.data(), poise::CreateReply::default(), embed, "rank_logo.png");
    ctx.send(reply).await?;
    Ok(())
}

fn rank_label(rank: Option<usize>) -> String {
    rank.map(|r| format!("#{r}"))
        .unwrap_or_else(|| "N/A".to_string())
}

fn rank_embed(
    name: &str,
    guild_id: u64,
    summary: &RankSummary,
    victims: &[(String, u32)],
) -> serenity::CreateEmbed {
    let victim_text = if victims.is_empty() {
        "No victims recorded yet.".to_string()
    } else {
        victims
            .iter()
            .map(|(name, count)| format!("• **{name}**: {count} kills"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    serenity::CreateEmbed::new()
        .title(format!("🛡️ COMBATANT RANK: {}", name.to_uppercase()))
        .color(FIERY_ORANGE)
        .field(
            "🌍 GLOBAL STANDING",
            format!(
                "**Rank:** {}\n**Total Wins:** {}\n**Streak:** {} 🔥",
                rank_label(summary.global_rank),
                summary.global.wins,
                summary.global.streak
            ),
            true,
        )
        .field(
            "🏰 LOCAL STANDING",
            format!(
                "**Rank:** {}\n**Server Wins:** {}",
                rank_label(summary.local_rank),
                summary.local.wins
            ),
            true,
        )
        .field("💀 TOP GLOBAL VICTIMS", victim_text, false)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Server ID: {guild_id} | Keep fighting to climb the ranks!"
        )))
}

/// Ledger keys come from a file, so zero is possible and must not reach
/// `UserId::new`.
fn victim_user_id(raw: u64) -> Option<serenity::UserId> {
    NonZeroU64::new(raw).map(serenity::UserId::from)
}

fn fallen_name(raw: u64) -> String {
    format!("Fallen_{raw}")
}
