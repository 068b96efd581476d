// Administrator commands: initial setup, configuration and ticket panels.

use crate::core::config::{parse_hex_color, GuildConfig};
use crate::discord::commands::tickets::{config_or_reply, reply_error, Context, Error};
use crate::discord::embeds::guild_color;
use crate::discord::tickets::lifecycle::open_button_id;
use poise::serenity_prelude as serenity;
use poise::serenity_prelude::Mentionable;

/// Set up the ticket bot for this server.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn setup(
    ctx: Context<'_>,
    #[description = "Category where ticket channels are created"]
    #[channel_types("Category")]
    category: serenity::GuildChannel,
    #[description = "Channel that receives ticket logs"]
    #[channel_types("Text")]
    log_channel: serenity::GuildChannel,
    #[description = "Staff role that can manage tickets"] staff_role: serenity::Role,
    #[description = "Additional staff role"] staff_role_2: Option<serenity::Role>,
    #[description = "Additional staff role"] staff_role_3: Option<serenity::Role>,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    if category.kind != serenity::ChannelType::Category {
        return reply_error(ctx, "Please provide a category channel for tickets.").await;
    }
    if log_channel.kind != serenity::ChannelType::Text {
        return reply_error(ctx, "Please provide a text channel for logs.").await;
    }

    let staff_role_ids: Vec<u64> = [Some(staff_role), staff_role_2, staff_role_3]
        .into_iter()
        .flatten()
        .map(|r| r.id.get())
        .collect();

    // Lay out the on-disk directories up front so the first ticket does not
    // have to.
    let data_dir = &ctx.data().data_dir;
    for dir in ["configs", "tickets", "blacklists", "warnings", "tags", "panels"] {
        std::fs::create_dir_all(data_dir.join(dir))?;
    }
    for dir in ["logs", "transcripts"] {
        std::fs::create_dir_all(data_dir.join(dir).join(guild_id.get().to_string()))?;
    }

    let config = GuildConfig::new(
        guild_id.get(),
        category.id.get(),
        log_channel.id.get(),
        staff_role_ids.clone(),
        ctx.author().id.get(),
    );
    ctx.data().config.save(config).await?;

    tracing::info!(guild_id = guild_id.get(), "Guild configured");

    let guild_name = guild_id
        .name(&ctx.serenity_context().cache)
        .unwrap_or_else(|| "this server".to_string());
    let embed = serenity::CreateEmbed::new()
        .title("✅ Bot Setup Complete")
        .description(format!("The ticket bot has been configured for **{guild_name}**"))
        .color(0x3BA55D)
        .field("🏷️ Ticket Category", category.mention().to_string(), true)
        .field("📝 Log Channel", log_channel.mention().to_string(), true)
        .field(
            "👮 Staff Roles",
            format!("{} roles configured", staff_role_ids.len()),
            true,
        )
        .field("🎫 Max Tickets/User", "3", true)
        .field("⏰ Auto-Close", "72 hours", true)
        .field("🎨 Theme", "Default Purple", true)
        .field(
            "🚀 Next Steps",
            "• Use `/panel` to create a ticket panel\n\
             • Use `/config` to customize settings\n\
             • Use `/help` to see all commands",
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Setup by {}",
            ctx.author().name
        )));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// View or modify the server configuration.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn config(
    ctx: Context<'_>,
    #[description = "Hours before idle tickets auto-close (0 disables)"] auto_close_hours: Option<
        u64,
    >,
    #[description = "Max open tickets per user (1-10)"] max_tickets_per_user: Option<usize>,
    #[description = "Welcome message for new tickets ({user} mentions the creator)"]
    welcome_message: Option<String>,
    #[description = "Send transcripts to the ticket creator on close"]
    send_transcript_to_user: Option<bool>,
) -> Result<(), Error> {
    let Some(current) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let changing = auto_close_hours.is_some()
        || max_tickets_per_user.is_some()
        || welcome_message.is_some()
        || send_transcript_to_user.is_some();

    if !changing {
        // Display current configuration
        let welcome_preview = if current.welcome_message.chars().count() > 100 {
            format!("{}...", crate::discord::embeds::clamp(&current.welcome_message, 100))
        } else {
            current.welcome_message.clone()
        };
        let embed = serenity::CreateEmbed::new()
            .title("⚙️ Server Configuration")
            .color(guild_color(Some(&current)))
            .field(
                "🏷️ Ticket Category",
                format!("<#{}>", current.ticket_category_id),
                true,
            )
            .field("📝 Log Channel", format!("<#{}>", current.log_channel_id), true)
            .field(
                "👮 Staff Roles",
                format!("{} roles", current.staff_role_ids.len()),
                true,
            )
            .field(
                "⏰ Auto-Close",
                if current.auto_close_hours > 0 {
                    format!("{} hours", current.auto_close_hours)
                } else {
                    "Disabled".to_string()
                },
                true,
            )
            .field(
                "🎫 Max Tickets/User",
                current.max_tickets_per_user.to_string(),
                true,
            )
            .field(
                "🎨 Embed Color",
                format!(
                    "RGB({}, {}, {})",
                    current.embed_color[0], current.embed_color[1], current.embed_color[2]
                ),
                true,
            )
            .field("💬 Welcome Message", format!("```{welcome_preview}```"), false)
            .field(
                "📄 Send Transcript to User",
                if current.send_transcript_to_user {
                    "✅ Enabled"
                } else {
                    "❌ Disabled"
                },
                true,
            );
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        return Ok(());
    }

    let data = ctx.data();
    let mut applied = Vec::new();

    if let Some(hours) = auto_close_hours {
        data.config.set_auto_close_hours(guild_id.get(), hours).await?;
        applied.push(if hours == 0 {
            "• Auto-close disabled".to_string()
        } else {
            format!("• Auto-close set to {hours} hours")
        });
    }
    if let Some(max) = max_tickets_per_user {
        match data.config.set_max_tickets(guild_id.get(), max).await {
            Ok(()) => applied.push(format!("• Maximum tickets per user set to {max}")),
            Err(err) => return reply_error(ctx, err.to_string()).await,
        }
    }
    if let Some(message) = welcome_message {
        data.config
            .set_welcome_message(guild_id.get(), &message)
            .await?;
        applied.push("• Welcome message updated".to_string());
    }
    if let Some(enabled) = send_transcript_to_user {
        data.config
            .set_transcript_delivery(guild_id.get(), enabled)
            .await?;
        applied.push(format!(
            "• Transcript delivery to users {}",
            if enabled { "enabled" } else { "disabled" }
        ));
    }

    ctx.say(format!("✅ Configuration updated!\n{}", applied.join("\n")))
        .await?;
    Ok(())
}

/// Create a ticket panel with up to five category buttons.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn panel(
    ctx: Context<'_>,
    #[description = "Channel to post the panel in"]
    #[channel_types("Text")]
    channel: serenity::GuildChannel,
    #[description = "First button label"] button1: String,
    #[description = "Second button label"] button2: Option<String>,
    #[description = "Third button label"] button3: Option<String>,
    #[description = "Fourth button label"] button4: Option<String>,
    #[description = "Fifth button label"] button5: Option<String>,
) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let labels: Vec<String> = [Some(button1), button2, button3, button4, button5]
        .into_iter()
        .flatten()
        .collect();
    let labels = match crate::core::panels::normalize_labels(&labels) {
        Ok(labels) => labels,
        Err(err) => return reply_error(ctx, err.to_string()).await,
    };

    let color = guild_color(Some(&config));
    let mut category_lines = String::new();
    for label in &labels {
        category_lines.push_str(&format!("{} {label} related issues\n", button_emoji(label)));
    }

    let guild_name = guild_id
        .name(&ctx.serenity_context().cache)
        .unwrap_or_else(|| "Support".to_string());
    let embed = serenity::CreateEmbed::new()
        .title("🎫 Create Support Ticket")
        .description(
            "Need help? Click one of the buttons below to create a support ticket.\n\n\
             **Choose the category that best describes your issue:**",
        )
        .color(color)
        .field("📋 Available Categories", category_lines, false)
        .field(
            "ℹ️ Before Creating a Ticket",
            "• Check if your question is answered in our FAQ\n\
             • Be descriptive about your issue\n\
             • Provide relevant screenshots if needed\n\
             • Be patient while waiting for support",
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Support Team • {guild_name}"
        )));

    let buttons: Vec<serenity::CreateButton> = labels
        .iter()
        .map(|label| {
            serenity::CreateButton::new(open_button_id(guild_id.get(), label))
                .label(label.clone())
                .style(serenity::ButtonStyle::Primary)
        })
        .collect();

    let message = channel
        .id
        .send_message(
            &ctx.serenity_context().http,
            serenity::CreateMessage::new()
                .embed(embed)
                .components(vec![serenity::CreateActionRow::Buttons(buttons)]),
        )
        .await?;

    ctx.data()
        .panels
        .register(
            guild_id.get(),
            message.id.get(),
            channel.id.get(),
            labels.clone(),
            ctx.author().id.get(),
        )
        .await?;

    let success = serenity::CreateEmbed::new()
        .title("✅ Ticket Panel Created")
        .description(format!(
            "Ticket panel successfully created in {}",
            channel.mention()
        ))
        .color(color)
        .field("🎯 Buttons", format!("{} categories configured", labels.len()), true)
        .field("📍 Message ID", format!("`{}`", message.id.get()), true);
    ctx.send(poise::CreateReply::default().embed(success).ephemeral(true))
        .await?;
    Ok(())
}

/// Known category labels get a fitting emoji on the panel.
fn button_emoji(label: &str) -> &'static str {
    match label {
        "Support" => "⚙️",
        "Billing" => "📊",
        "Technical" => "💻",
        "Reports" => "📄",
        "Bug-Report" => "⚡",
        "Appeals" => "🛡️",
        "Partnership" => "✨",
        "Other" => "💡",
        _ => "📝",
    }
}

/// Set the embed color for this server.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn setcolor(
    ctx: Context<'_>,
    #[description = "Hex color, e.g. #FF5733"] hex_color: String,
) -> Result<(), Error> {
    let Some(_config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let rgb = match parse_hex_color(&hex_color) {
        Ok(rgb) => rgb,
        Err(_) => {
            return reply_error(ctx, "Invalid hex color format. Please use format: `#FF5733`")
                .await;
        }
    };
    ctx.data().config.set_embed_color(guild_id.get(), rgb).await?;

    let [r, g, b] = rgb;
    let embed = serenity::CreateEmbed::new()
        .title("🎨 Color Updated")
        .description("Server embed color has been updated!")
        .color(serenity::Colour::from_rgb(r, g, b))
        .field(
            "New Color",
            format!("```#{:02X}{:02X}{:02X}```", r, g, b),
            true,
        )
        .field("RGB Values", format!("```R:{r} G:{g} B:{b}```"), true);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Set the welcome message posted in new tickets.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn welcome(
    ctx: Context<'_>,
    #[description = "Welcome message ({user} mentions the creator)"] message: String,
) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    ctx.data()
        .config
        .set_welcome_message(guild_id.get(), &message)
        .await?;

    let embed = serenity::CreateEmbed::new()
        .title("💬 Welcome Message Updated")
        .description("Custom welcome message has been set for new tickets!")
        .color(guild_color(Some(&config)))
        .field("New Message", format!("```{message}```"), false)
        .field("💡 Tip", "Use `{user}` to mention the ticket creator", false);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Toggle whether ticket creators receive transcripts on close.
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn transcripttoggle(ctx: Context<'_>) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let enabled = ctx
        .data()
        .config
        .toggle_transcript_delivery(guild_id.get())
        .await?;

    let mut embed = serenity::CreateEmbed::new()
        .title("📄 Transcript Setting Updated")
        .description(format!(
            "Transcript sending to users is now {}",
            if enabled { "**enabled**" } else { "**disabled**" }
        ))
        .color(guild_color(Some(&config)))
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Changed by {}",
            ctx.author().name
        )));
    embed = if enabled {
        embed.field(
            "✅ Enabled",
            "Users who open tickets will receive both HTML and TXT transcripts when \
             tickets are closed or when staff generate them",
            false,
        )
    } else {
        embed.field(
            "❌ Disabled",
            "Transcripts will only be sent to the log channel, not to users",
            false,
        )
    };
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
