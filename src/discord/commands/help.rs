use crate::discord::{Context, Error};
use poise::serenity_prelude as serenity;
use std::collections::BTreeMap;

use super::fiery::FIERY_ORANGE;

/// Discord rejects embed field values longer than this.
const FIELD_LIMIT: usize = 1024;

/// Help sections, declared in the order they are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Section {
    Ask,
    Arena,
    Ship,
    Bank,
    Premium,
    Utilities,
}

impl Section {
    fn heading(self) -> &'static str {
        match self {
            Section::Ask => "📩 Ask",
            Section::Arena => "⚔️ Echo Arena",
            Section::Ship => "🏹 Ship",
            Section::Bank => "⚡ Economy Engine",
            Section::Premium => "💎 Premium",
            Section::Utilities => "🧰 Utilities",
        }
    }
}

/// Curated help text for a command. Commands without one fall back to their
/// doc comment under Utilities.
struct Blurb {
    section: Section,
    weight: u8,
    text: &'static str,
    hint: Option<&'static str>,
}

const fn blurb(section: Section, weight: u8, text: &'static str) -> Blurb {
    Blurb {
        section,
        weight,
        text,
        hint: None,
    }
}

fn blurb_for(command: &str) -> Option<Blurb> {
    let found = match command {
        "ask" => Blurb {
            hint: Some("Pick SFW, NSFW or Casual; only they can answer."),
            ..blurb(Section::Ask, 3, "Open a connection lobby with another member.")
        },
        "askcommands" => blurb(Section::Ask, 2, "List the ask tools."),
        "adminask" => blurb(
            Section::Ask,
            1,
            "Browse the request history by timeframe (Admin, premium).",
        ),
        "fight" => Blurb {
            hint: Some("Winners earn Sparks and Echo XP."),
            ..blurb(
                Section::Arena,
                2,
                "Challenge a member to a duel. Spectators can CHEER!",
            )
        },
        "fightrank" => blurb(
            Section::Arena,
            1,
            "Show global and server standing plus top victims.",
        ),
        "ship" => blurb(
            Section::Ship,
            1,
            "Read the compatibility of you and another member.",
        ),
        "profile" => Blurb {
            hint: Some("Aliases: !stats, !sparks"),
            ..blurb(Section::Bank, 1, "View Sparks, Echo level and XP progress.")
        },
        "premium" => blurb(Section::Premium, 3, "Open the Fiery Shop (Admin)."),
        "premiumstatus" => blurb(
            Section::Premium,
            2,
            "See which modules this server has unlocked (Admin).",
        ),
        "askpremium" => blurb(Section::Premium, 1, "Upgrade link for the ask module (Admin)."),
        _ => return None,
    };
    Some(found)
}

fn help_line(prefix: &str, name: &str, text: &str, hint: Option<&str>) -> String {
    match hint {
        Some(hint) => format!("• **{prefix}{name}** · {text}\n  ⤷ {hint}"),
        None => format!("• **{prefix}{name}** · {text}"),
    }
}

/// Show a categorized list of commands.
#[poise::command(slash_command, prefix_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let prefix = &ctx.data().config.prefix;

    let mut sections: BTreeMap<Section, Vec<(u8, String)>> = BTreeMap::new();
    for command in &ctx.framework().options().commands {
        if command.hide_in_help || command.name == "help" {
            continue;
        }

        let (section, weight, line) = match blurb_for(&command.name) {
            Some(b) => (b.section, b.weight, help_line(prefix, &command.name, b.text, b.hint)),
            None => {
                let text = command
                    .description
                    .as_deref()
                    .unwrap_or("No description provided.");
                (Section::Utilities, 0, help_line(prefix, &command.name, text, None))
            }
        };
        sections.entry(section).or_default().push((weight, line));
    }

    let mut embed = serenity::CreateEmbed::new()
        .title("🔥 FIERY DUNGEON COMMANDS")
        .description(format!(
            "Every command works with `{prefix}` or as a slash command. \
            Locked modules can be unlocked by an administrator with `{prefix}premium`."
        ))
        .color(FIERY_ORANGE)
        .timestamp(serenity::Timestamp::now());

    if let Ok(user) = ctx.framework().bot_id.to_user(&ctx).await {
        embed = embed.thumbnail(user.face());
    }

    for (section, mut lines) in sections {
        // Heaviest first; ties keep registration order
        lines.sort_by_key(|(weight, _)| std::cmp::Reverse(*weight));
        let lines: Vec<String> = lines.into_iter().map(|(_, line)| line).collect();

        for (part, value) in pack_lines(&lines, FIELD_LIMIT).into_iter().enumerate() {
            let name = if part == 0 {
                section.heading().to_string()
            } else {
                format!("{} (cont.)", section.heading())
            };
            embed = embed.field(name, value, false);
        }
    }

    embed = embed.footer(serenity::CreateEmbedFooter::new("Glory to the Echo!"));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Join lines with newlines into as few values as fit under `limit` bytes.
/// A single oversized line gets a value of its own.
fn pack_lines(lines: &[String], limit: usize) -> Vec<String> {
    lines.iter().fold(Vec::new(), |mut values: Vec<String>, line| {
        match values.last_mut() {
            Some(value) if value.len() + 1 + line.len() <= limit => {
                value.push('\n');
                value.push_str(line);
            }
            _ => values.push(line.clone()),
        }
        values
    })
}
