// Discord commands for the ask system.
//
// The flow is three steps, each on its own component window:
// 1. the lobby with an "Open Connection" button (requester only)
// 2. an ephemeral intent picker
// 3. the persona request with accept / decline (target only)

use crate::core::ask::{
    decision_message, validate_pair, AskError, AskStatus, HistoryReport, Intent, Persona,
    Timeframe,
};
use crate::core::premium::PremiumModule;
use crate::discord::commands::fiery::{
    self, ask_unlocked, clear_components, ephemeral, fiery_embed, module_unlocked, render_pair,
};
use crate::discord::{Context, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;
use poise::serenity_prelude::Mentionable;
use std::time::Duration;

const LOBBY_TIMEOUT: Duration = Duration::from_secs(120);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Send a connection request to another member.
#[poise::command(prefix_command, slash_command, guild_only)]
pub async fn ask(
    ctx: Context<'_>,
    #[description = "Who you want to connect with"] member: Option<serenity::User>,
) -> Result<(), Error> {
    let Some(target) = member else {
        ctx.send(poise::CreateReply::default().embed(fiery_embed(
            "⚠️ ERROR",
            "You must mention a user!\nExample: `!ask @user`",
        )))
        .await?;
        return Ok(());
    };
    let requester = ctx.author().clone();

    match validate_pair(requester.id.get(), target.id.get(), target.bot) {
        Ok(()) => {}
        Err(AskError::SelfRequest) => {
            ctx.say("❌ You cannot ask yourself.").await?;
            return Ok(());
        }
        Err(e) => {
            ctx.say(format!("🤖 {e}")).await?;
            return Ok(());
        }
    }

    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();
    let requester_name = fiery::display_name(ctx, &requester).await;
    let target_name = fiery::display_name(ctx, &target).await;

    // Step 1: the lobby
    let open_id = format!("{}ask-open", ctx.id());
    let open_row = serenity::CreateActionRow::Buttons(vec![serenity::CreateButton::new(&open_id)
        .label("Open Connection")
        .style(serenity::ButtonStyle::Primary)
        .emoji(serenity::ReactionType::Unicode("📩".to_string()))]);

    let mut reply = poise::CreateReply::default().components(vec![open_row]);
    if module_unlocked(ctx, PremiumModule::Ask).await? {
        let lobby = render_pair(ctx.data(), "ask_lobby", &requester, &target, |cards, a, b| {
            cards.ask_lobby(a, b)
        })
        .await;
        let mut embed = fiery_embed(
            "💎 PREMIUM SIGNAL SENT",
            format!("**{requester_name}** ⚔️ **{target_name}**"),
        );
        if let Some(png) = lobby {
            reply = reply.attachment(serenity::CreateAttachment::bytes(png, "ask.png"));
            embed = embed.image("attachment://ask.png");
        }
        reply = reply.embed(embed);
    } else {
        reply = reply.embed(fiery_embed(
            "🔥 CONNECTION REQUEST",
            format!(
                "{} is requesting a moment with {}.\n\n*Unlock the visual VS engine with !premium*",
                requester.mention(),
                target.mention()
            ),
        ));
    }

    let mut lobby = ctx.send(reply).await?.into_message().await?;
    let lobby_id = lobby.id;

    let mut opened = None;
    while let Some(press) = serenity::ComponentInteractionCollector::new(ctx)
        .channel_id(ctx.channel_id())
        .timeout(LOBBY_TIMEOUT)
        .filter(move |press| press.message.id == lobby_id)
        .await
    {
        if press.data.custom_id != open_id {
            continue;
        }
        if press.user.id != requester.id {
            ephemeral(ctx, &press, "🚫 Only the one who sent this signal can open it.").await?;
            continue;
        }
        opened = Some(press);
        break;
    }
    clear_components(ctx, &mut lobby).await;

    let Some(open_press) = opened else {
        return Ok(());
    };

    // Step 2: the intent picker
    let Some((intent_press, intent)) = pick_intent(ctx, &open_press).await? else {
        return Ok(());
    };

    // Step 3: the request itself
    let persona = Persona::for_intent(
        intent,
        &requester.mention().to_string(),
        &target.mention().to_string(),
    );
    let accept_id = format!("{}ask-accept", ctx.id());
    let decline_id = format!("{}ask-decline", ctx.id());
    let decision_row = serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(&accept_id)
            .label(persona.accept_label)
            .style(serenity::ButtonStyle::Success)
            .emoji(serenity::ReactionType::Unicode("🔥".to_string())),
        serenity::CreateButton::new(&decline_id)
            .label(persona.decline_label)
            .style(serenity::ButtonStyle::Danger)
            .emoji(serenity::ReactionType::Unicode(persona.decline_emoji.to_string())),
    ]);

    intent_press
        .create_response(
            ctx.serenity_context(),
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(target.mention().to_string())
                    .embed(
                        serenity::CreateEmbed::new()
                            .title(persona.title)
                            .description(&persona.description)
                            .color(persona.color),
                    )
                    .components(vec![decision_row]),
            ),
        )
        .await?;
    let mut request = intent_press.get_response(ctx.http()).await?;
    let request_id = request.id;

    let mut decision = None;
    while let Some(press) = serenity::ComponentInteractionCollector::new(ctx)
        .channel_id(ctx.channel_id())
        .timeout(REQUEST_TIMEOUT)
        .filter(move |press| press.message.id == request_id)
        .await
    {
        let status = if press.data.custom_id == accept_id {
            AskStatus::Accepted
        } else if press.data.custom_id == decline_id {
            AskStatus::Denied
        } else {
            continue;
        };
        if press.user.id != target.id {
            ephemeral(ctx, &press, "🚫 This request is not addressed to you.").await?;
            continue;
        }
        decision = Some((press, status));
        break;
    }
    clear_components(ctx, &mut request).await;

    let Some((press, status)) = decision else {
        return Ok(());
    };

    if let Err(e) = ctx
        .data()
        .ask
        .record_decision(guild_id, &requester.tag(), &target.tag(), intent, status)
        .await
    {
        tracing::error!(guild_id, "Failed to record ask decision: {e}");
    }

    let icon = match status {
        AskStatus::Accepted => "✅",
        AskStatus::Denied => "🥀",
    };
    press
        .create_response(
            ctx.serenity_context(),
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new().content(format!(
                    "{icon} **{}** {}",
                    decision_message(intent, status),
                    requester.mention()
                )),
            ),
        )
        .await?;

    Ok(())
}

/// Answer the open press with an ephemeral select menu and wait for a choice.
async fn pick_intent(
    ctx: Context<'_>,
    open_press: &serenity::ComponentInteraction,
) -> Result<Option<(serenity::ComponentInteraction, Intent)>, Error> {
    let intent_id = format!("{}ask-intent", ctx.id());
    let options = Intent::ALL
        .iter()
        .map(|intent| {
            serenity::CreateSelectMenuOption::new(intent.label(), intent.value())
                .description(intent.description())
                .emoji(serenity::ReactionType::Unicode(intent.emoji().to_string()))
        })
        .collect();
    let menu = serenity::CreateSelectMenu::new(
        &intent_id,
        serenity::CreateSelectMenuKind::String { options },
    )
    .placeholder("Select the nature of your visit...");

    open_press
        .create_response(
            ctx.serenity_context(),
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content("The dungeon doors are open. Choose your path:")
                    .components(vec![serenity::CreateActionRow::SelectMenu(menu)])
                    .ephemeral(true),
            ),
        )
        .await?;

    let author_id = open_press.user.id;
    let press = serenity::ComponentInteractionCollector::new(ctx)
        .author_id(author_id)
        .channel_id(ctx.channel_id())
        .timeout(LOBBY_TIMEOUT)
        .filter(move |press| press.data.custom_id == intent_id)
        .await;

    let intent = press.as_ref().and_then(|press| match &press.data.kind {
        serenity::ComponentInteractionDataKind::StringSelect { values } => {
            values.first().and_then(|v| Intent::from_value(v))
        }
        _ => None,
    });

    // The menu stays usable until it is edited away
    if let Err(e) = open_press
        .edit_response(ctx.http(), closed_picker(intent))
        .await
    {
        tracing::warn!(user_id = author_id.get(), "Could not close the intent picker: {e}");
    }

    Ok(press.zip(intent))
}

fn closed_picker(intent: Option<Intent>) -> serenity::EditInteractionResponse {
    let content = match intent {
        Some(intent) => format!("{} Path chosen: **{}**", intent.emoji(), intent.label()),
        None => "🚪 The dungeon doors have closed.".to_string(),
    };
    serenity::EditInteractionResponse::new()
        .content(content)
        .components(Vec::new())
}

/// List the ask system commands.
#[poise::command(prefix_command, slash_command)]
pub async fn askcommands(ctx: Context<'_>) -> Result<(), Error> {
    let embed = fiery_embed("🔥 ASK SYSTEM COMMANDS 🔥", "Available tools:")
        .field(
            "📩 User",
            "`!ask @user` - Create a professional/flirty lobby.\n`!invite` - Get bot link.",
            false,
        )
        .field(
            "🛡️ Admin",
            "`!premium` - Open the Fiery Shop.\n`!premiumstatus` - View server unlocks.\n`!adminask` - Review past requests.",
            false,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Review answered requests in this server (Admin, premium).
#[poise::command(
    prefix_command,
    slash_command,
    guild_only,
    required_permissions = "ADMINISTRATOR",
    check = "ask_unlocked"
)]
pub async fn adminask(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx
        .guild_id()
        .ok_or("This command only works in servers")?
        .get();

    let timeframe_id = format!("{}adminask-window", ctx.id());
    let options = Timeframe::ALL
        .iter()
        .map(|t| serenity::CreateSelectMenuOption::new(t.label(), t.days().to_string()))
        .collect();
    let menu = serenity::CreateSelectMenu::new(
        &timeframe_id,
        serenity::CreateSelectMenuKind::String { options },
    )
    .placeholder("Choose a timeframe...");

    let handle = ctx
        .send(
            poise::CreateReply::default()
                .embed(fiery_embed(
                    "📊 REQUEST HISTORY",
                    "Pick the window you want to review.",
                ))
                .components(vec![serenity::CreateActionRow::SelectMenu(menu)]),
        )
        .await?;
    let mut panel = handle.into_message().await?;
    let panel_id = panel.id;

    while let Some(press) = serenity::ComponentInteractionCollector::new(ctx)
        .author_id(ctx.author().id)
        .channel_id(ctx.channel_id())
        .timeout(LOBBY_TIMEOUT)
        .filter(move |press| press.message.id == panel_id)
        .await
    {
        let timeframe = match &press.data.kind {
            serenity::ComponentInteractionDataKind::StringSelect { values } => values
                .first()
                .and_then(|v| v.parse::<i64>().ok())
                .and_then(Timeframe::from_days),
            _ => None,
        };
        let Some(timeframe) = timeframe else {
            continue;
        };

        let report = ctx
            .data()
            .ask
            .history(guild_id, timeframe, Utc::now())
            .await?;

        press
            .create_response(
                ctx.serenity_context(),
                serenity::CreateInteractionResponse::UpdateMessage(
                    serenity::CreateInteractionResponseMessage::new()
                        .embed(fiery_embed("📊 RECENT ACTIVITY", history_text(timeframe, &report))),
                ),
            )
            .await?;
    }
    clear_components(ctx, &mut panel).await;

    Ok(())
}

fn history_text(timeframe: Timeframe, report: &HistoryReport) -> String {
    let mut text = format!(
        "**Timeframe:** {}\n**Total Requests Found:** {}\n\n",
        timeframe.label(),
        report.total
    );
    if report.recent.is_empty() {
        text.push_str("No recent data.");
    } else {
        let lines: Vec<String> = report
            .recent
            .iter()
            .map(|e| format!("• {} ➡️ {} [{}]", e.requester, e.target, e.status.as_str()))
            .collect();
        text.push_str(&lines.join("\n"));
    }
    text
}
