// Informational commands: ping, bot statistics and help.

use crate::discord::commands::tickets::{Context, Error};
use crate::discord::embeds::guild_color;
use poise::serenity_prelude as serenity;
use sysinfo::System;

/// Check bot latency and status.
#[poise::command(slash_command, guild_only)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let latency = ctx.ping().await;
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    let configured = ctx.data().config.is_configured(guild_id.get()).await?;
    let guild_name = guild_id
        .name(&ctx.serenity_context().cache)
        .unwrap_or_else(|| "this server".to_string());

    let embed = serenity::CreateEmbed::new()
        .title("🏓 Pong!")
        .description(format!(
            "**⏱️ Latency:** {}ms\n\
             **📡 Status:** Online and responsive!\n\
             **🏢 Guild:** {guild_name}\n\
             **⚙️ Configured:** {}",
            latency.as_millis(),
            if configured { "✅ Yes" } else { "❌ No" }
        ))
        .color(0x3BA55D)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Requested by {}",
            ctx.author().name
        )));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Display bot and server statistics.
#[poise::command(slash_command, guild_only)]
pub async fn stats(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    let config = ctx.data().config.get(guild_id.get()).await.ok();

    // System metrics are gathered fresh on each invocation; this command is
    // rare enough that the refresh cost does not matter.
    let mut sys = System::new_all();
    sys.refresh_all();

    let cpu_usage = sys.global_cpu_info().cpu_usage();
    let physical_cores = sys.physical_core_count().unwrap_or(0);
    let total_cores = sys.cpus().len();
    let total_ram_gb = sys.total_memory() as f64 / (1024.0 * 1024.0 * 1024.0);
    let used_ram_gb = sys.used_memory() as f64 / (1024.0 * 1024.0 * 1024.0);
    let ram_percent = if sys.total_memory() > 0 {
        sys.used_memory() as f64 / sys.total_memory() as f64 * 100.0
    } else {
        0.0
    };

    let uptime_secs = ctx.data().started_at.elapsed().as_secs();
    let uptime = format!(
        "{}:{:02}:{:02}",
        uptime_secs / 3600,
        (uptime_secs % 3600) / 60,
        uptime_secs % 60
    );
    let guild_count = ctx.serenity_context().cache.guild_count();
    let latency = ctx.ping().await;

    let ticket_stats = ctx.data().tickets.stats(guild_id.get()).await?;
    let blacklisted = ctx.data().moderation.blacklist_size(guild_id.get()).await?;

    let embed = serenity::CreateEmbed::new()
        .title("🧬 Bot Statistics")
        .color(guild_color(config.as_ref()))
        .field(
            "💻 CPU",
            format!("```Usage: {cpu_usage:.1}%\nCores: {physical_cores} / {total_cores}```"),
            true,
        )
        .field(
            "💾 RAM",
            format!("```{used_ram_gb:.2}GB / {total_ram_gb:.2}GB ({ram_percent:.0}%)```"),
            true,
        )
        .field("🕒 Bot Uptime", format!("```{uptime}```"), true)
        .field("🌍 Servers", format!("```{guild_count}```"), true)
        .field("📡 Ping", format!("```{}ms```", latency.as_millis()), true)
        .field(
            "🎫 Server Tickets",
            format!(
                "```Total: {}\nOpen: {}\nClosed: {}```",
                ticket_stats.total, ticket_stats.open, ticket_stats.closed
            ),
            true,
        )
        .field("🚫 Blacklisted Users", format!("```{blacklisted}```"), true);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show an overview of the bot's commands.
#[poise::command(slash_command)]
pub async fn help(ctx: Context<'_>) -> Result<(), Error> {
    let config = match ctx.guild_id() {
        Some(guild_id) => ctx.data().config.get(guild_id.get()).await.ok(),
        None => None,
    };

    let mut embed = serenity::CreateEmbed::new()
        .title("🎫 Support Ticket Bot - Help")
        .description("A multi-server Discord ticket bot with transcripts and message replay")
        .color(guild_color(config.as_ref()));

    if config.is_none() {
        embed = embed.field(
            "⚠️ Setup Required",
            "This server needs to be configured first!\nAn administrator should run `/setup`.",
            false,
        );
    }

    embed = embed
        .field(
            "⚙️ Setup Commands",
            "• `/setup` - Configure the bot for your server\n\
             • `/config` - View/modify settings\n\
             • `/panel` - Create a ticket creation panel\n\
             • `/setcolor` - Set embed colors\n\
             • `/welcome` - Set the welcome message\n\
             • `/transcripttoggle` - Toggle transcript delivery to users",
            false,
        )
        .field(
            "🎫 Ticket Management",
            "• `/close [reason]` - Close the current ticket\n\
             • `/priority set|show` - Manage priority\n\
             • `/note add|view` - Staff notes\n\
             • `/reopen <id>` - Reopen a closed ticket\n\
             • Claim / Transcript / Rename via the ticket buttons",
            false,
        )
        .field(
            "👥 User Management",
            "• `/add @user` - Add a user to the ticket\n\
             • `/remove @user` - Remove a user\n\
             • `/blacklist` / `/unblacklist` - Manage the ticket blacklist\n\
             • `/warn` / `/warnings` - Staff warnings",
            false,
        )
        .field(
            "📊 Statistics & Tools",
            "• `/ticketstats` - Server ticket statistics\n\
             • `/tag` - Canned responses\n\
             • `/stats` - Bot statistics\n\
             • `/ping` - Check bot status",
            false,
        )
        .field(
            "✨ Features",
            "• Auto-close after inactivity\n\
             • Message history replay on reopen\n\
             • HTML and text transcripts\n\
             • Priority system, staff notes and tags\n\
             • Multi-button panels",
            false,
        );

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
