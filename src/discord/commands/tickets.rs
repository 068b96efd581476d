// Discord commands for the ticket lifecycle.
//
// **Notice the pattern:**
// 1. Extract primitive data from Discord types
// 2. Call core service
// 3. Format the response based on the result
//
// This layer is THIN - no business logic, just translation.

use crate::core::config::{ConfigError, GuildConfig, GuildConfigService};
use crate::core::moderation::ModerationService;
use crate::core::panels::PanelService;
use crate::core::tags::TagService;
use crate::core::tickets::{Priority, Ticket, TicketActor, TicketError, TicketService};
use crate::discord::embeds::{clamp, error_embed, guild_color};
use crate::discord::tickets::lifecycle;
use crate::infra::config::JsonConfigStore;
use crate::infra::moderation::JsonModerationStore;
use crate::infra::panels::JsonPanelStore;
use crate::infra::tags::JsonTagStore;
use crate::infra::tickets::JsonTicketStore;
use poise::serenity_prelude as serenity;
use poise::serenity_prelude::Mentionable;
use std::path::PathBuf;
use std::sync::Arc;

/// Type alias for our bot's context.
/// This is what every command receives as its first parameter.
pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Data that's shared across all commands.
/// This is where we store our services and configuration.
#[derive(Clone)]
pub struct Data {
    pub tickets: Arc<TicketService<JsonTicketStore>>,
    pub config: Arc<GuildConfigService<JsonConfigStore>>,
    pub moderation: Arc<ModerationService<JsonModerationStore>>,
    pub tags: Arc<TagService<JsonTagStore>>,
    pub panels: Arc<PanelService<JsonPanelStore>>,
    /// Root of the on-disk layout (configs/, tickets/, logs/, ...).
    pub data_dir: PathBuf,
    pub started_at: std::time::Instant,
}

// ============================================================================
// SHARED COMMAND HELPERS
// ============================================================================

/// Fetch the guild config, or tell the user the server needs `/setup`.
pub async fn config_or_reply(ctx: Context<'_>) -> Result<Option<GuildConfig>, Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    match ctx.data().config.get(guild_id.get()).await {
        Ok(config) => Ok(Some(config)),
        Err(ConfigError::NotConfigured) => {
            let embed = serenity::CreateEmbed::new()
                .title("❌ Server Not Configured")
                .description(
                    "This server needs to be set up first!\n\n\
                     An administrator must run `/setup` with a ticket category, \
                     a log channel and at least one staff role.",
                )
                .color(0xED4245);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// The invoking member's role ids.
pub async fn author_role_ids(ctx: Context<'_>) -> Vec<u64> {
    match ctx.author_member().await {
        Some(member) => member.roles.iter().map(|r| r.get()).collect(),
        None => Vec::new(),
    }
}

/// The invoker as a ticket actor under the given config.
pub async fn actor(ctx: Context<'_>, config: &GuildConfig) -> TicketActor {
    TicketActor {
        user_id: ctx.author().id.get(),
        is_staff: config.is_staff(&author_role_ids(ctx).await),
    }
}

/// Resolve the ticket living in the current channel, or explain that this
/// is not a ticket channel.
pub async fn ticket_here_or_reply(ctx: Context<'_>) -> Result<Option<Ticket>, Error> {
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;
    let ticket = ctx
        .data()
        .tickets
        .find_by_channel(guild_id.get(), ctx.channel_id().get())
        .await?;
    if ticket.is_none() {
        ctx.send(
            poise::CreateReply::default()
                .embed(error_embed("Could not find ticket information for this channel."))
                .ephemeral(true),
        )
        .await?;
    }
    Ok(ticket)
}

pub async fn reply_error(ctx: Context<'_>, message: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .embed(error_embed(message))
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

async fn require_staff(ctx: Context<'_>, config: &GuildConfig) -> Result<bool, Error> {
    if config.is_staff(&author_role_ids(ctx).await) {
        Ok(true)
    } else {
        reply_error(ctx, "Only staff members can use this command.").await?;
        Ok(false)
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

/// Close the current ticket with an optional reason.
#[poise::command(slash_command, guild_only)]
pub async fn close(
    ctx: Context<'_>,
    #[description = "Reason for closing the ticket"] reason: Option<String>,
) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    let Some(ticket) = ticket_here_or_reply(ctx).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let actor = actor(ctx, &config).await;
    if !(actor.is_staff || actor.is_creator(&ticket)) {
        return reply_error(ctx, "You do not have permission to close this ticket.").await;
    }

    if let Some(reason) = &reason {
        ctx.data()
            .tickets
            .set_close_reason(guild_id.get(), ticket.id, reason)
            .await?;
    }

    let mut embed = serenity::CreateEmbed::new()
        .title("⚠️ Confirm Ticket Closure")
        .description(
            "Are you sure you want to close this ticket?\n\n**This action will:**\n\
             • Archive all messages\n• Send logs to staff\n• Delete the channel after 10 seconds",
        )
        .color(0xE67E22);
    if let Some(reason) = &reason {
        embed = embed.field("📝 Reason", format!("```{}```", clamp(reason, 500)), false);
    }

    ctx.send(
        poise::CreateReply::default()
            .embed(embed)
            .components(lifecycle::close_confirm_buttons(guild_id.get(), ticket.id)),
    )
    .await?;
    Ok(())
}

/// Manage the priority of the current ticket.
#[poise::command(slash_command, guild_only, subcommands("set", "show"))]
pub async fn priority(_ctx: Context<'_>) -> Result<(), Error> {
    // Parent command - subcommands do the work
    Ok(())
}

#[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
pub enum PriorityChoice {
    Low,
    Medium,
    High,
}

impl From<PriorityChoice> for Priority {
    fn from(value: PriorityChoice) -> Self {
        match value {
            PriorityChoice::Low => Priority::Low,
            PriorityChoice::Medium => Priority::Medium,
            PriorityChoice::High => Priority::High,
        }
    }
}

/// Set the priority of the current ticket.
#[poise::command(slash_command, guild_only)]
pub async fn set(
    ctx: Context<'_>,
    #[description = "Priority level"] level: PriorityChoice,
) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    if !require_staff(ctx, &config).await? {
        return Ok(());
    }
    let Some(ticket) = ticket_here_or_reply(ctx).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let priority: Priority = level.into();
    ctx.data()
        .tickets
        .set_priority(guild_id.get(), ticket.id, priority)
        .await?;

    let embed = serenity::CreateEmbed::new()
        .title("✅ Priority Updated")
        .description(format!(
            "Ticket priority set to `{priority}` by {}",
            ctx.author().mention()
        ))
        .color(guild_color(Some(&config)));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Show the current priority of the ticket.
#[poise::command(slash_command, guild_only)]
pub async fn show(ctx: Context<'_>) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    if !require_staff(ctx, &config).await? {
        return Ok(());
    }
    let Some(ticket) = ticket_here_or_reply(ctx).await? else {
        return Ok(());
    };

    let embed = serenity::CreateEmbed::new()
        .title("🎫 Ticket Priority")
        .description(format!(
            "The current priority for this ticket is: `{}`",
            ticket.priority
        ))
        .color(guild_color(Some(&config)));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Manage staff notes on the current ticket.
#[poise::command(slash_command, guild_only, subcommands("add_note", "view_notes"))]
pub async fn note(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Add a note to the current ticket.
#[poise::command(slash_command, guild_only, rename = "add")]
pub async fn add_note(
    ctx: Context<'_>,
    #[description = "Note content"] content: String,
) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    if !require_staff(ctx, &config).await? {
        return Ok(());
    }
    let Some(ticket) = ticket_here_or_reply(ctx).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    ctx.data()
        .tickets
        .add_note(guild_id.get(), ticket.id, ctx.author().id.get(), &content)
        .await?;

    let embed = serenity::CreateEmbed::new()
        .title("📝 Note Added")
        .description(format!(
            "A new note has been added to this ticket by {}",
            ctx.author().mention()
        ))
        .color(guild_color(Some(&config)))
        .field("Note", format!("```{}```", clamp(&content, 200)), false);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// View the last 10 notes on the current ticket.
#[poise::command(slash_command, guild_only, rename = "view")]
pub async fn view_notes(ctx: Context<'_>) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    if !require_staff(ctx, &config).await? {
        return Ok(());
    }
    let Some(ticket) = ticket_here_or_reply(ctx).await? else {
        return Ok(());
    };

    if ticket.notes.is_empty() {
        return reply_error(ctx, "No notes found for this ticket.").await;
    }

    let shown = ticket.notes.len().min(10);
    let mut embed = serenity::CreateEmbed::new()
        .title("📝 Ticket Notes")
        .description(format!("Last {shown} notes for this ticket"))
        .color(guild_color(Some(&config)));

    for note in ticket.notes.iter().rev().take(10).rev() {
        // Mentions do not render in field names, so the author goes in the value.
        embed = embed.field(
            format!("Note • {}", note.timestamp.format("%Y-%m-%d %H:%M:%S")),
            format!("```{}```by <@{}>", clamp(&note.content, 100), note.author_id),
            false,
        );
    }
    embed = embed.footer(serenity::CreateEmbedFooter::new(format!(
        "Showing {shown} of {} notes",
        ticket.notes.len()
    )));

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// Add a user to the current ticket channel.
#[poise::command(slash_command, guild_only)]
pub async fn add(
    ctx: Context<'_>,
    #[description = "User to add to the ticket"] user: serenity::User,
) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    let Some(ticket) = ticket_here_or_reply(ctx).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let actor = actor(ctx, &config).await;
    if !actor.may_manage(&ticket) {
        return reply_error(ctx, "You do not have permission to add users to this ticket.").await;
    }

    match ctx
        .data()
        .tickets
        .add_user(guild_id.get(), ticket.id, user.id.get())
        .await
    {
        Ok(()) => {}
        Err(TicketError::AlreadyAdded) => {
            return reply_error(ctx, format!("{} is already added to this ticket.", user.mention()))
                .await;
        }
        Err(err) => return Err(err.into()),
    }

    ctx.channel_id()
        .create_permission(
            &ctx.serenity_context().http,
            lifecycle::participant_overwrite(user.id.get()),
        )
        .await?;

    let embed = serenity::CreateEmbed::new()
        .title("✅ User Added to Ticket")
        .description(format!(
            "{} has been added to this ticket by {}",
            user.mention(),
            ctx.author().mention()
        ))
        .color(guild_color(Some(&config)));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    // DM the added user, best effort
    let notice = format!(
        "You have been added to ticket #{} in {}. You can access it here: {}",
        ticket.id,
        ctx.guild_id()
            .and_then(|g| g.name(&ctx.serenity_context().cache))
            .unwrap_or_else(|| "the server".to_string()),
        ctx.channel_id().mention()
    );
    let dm = async {
        let channel = user.create_dm_channel(&ctx.serenity_context().http).await?;
        channel.id.say(&ctx.serenity_context().http, notice).await
    };
    if dm.await.is_err() {
        ctx.say(format!(
            "📧 Could not send a DM to {}. They have been added to the ticket anyway.",
            user.mention()
        ))
        .await?;
    }

    Ok(())
}

/// Remove a user from the current ticket channel.
#[poise::command(slash_command, guild_only)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "User to remove from the ticket"] user: serenity::User,
) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    let Some(ticket) = ticket_here_or_reply(ctx).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let actor = actor(ctx, &config).await;
    if !actor.may_remove_users(&ticket) {
        return reply_error(
            ctx,
            "You do not have permission to remove users from this ticket.",
        )
        .await;
    }

    match ctx
        .data()
        .tickets
        .remove_user(guild_id.get(), ticket.id, user.id.get())
        .await
    {
        Ok(()) => {}
        Err(TicketError::CannotRemoveCreator) => {
            return reply_error(ctx, "You cannot remove the ticket creator.").await;
        }
        Err(TicketError::NotAdded) => {
            return reply_error(ctx, format!("{} is not added to this ticket.", user.mention()))
                .await;
        }
        Err(err) => return Err(err.into()),
    }

    ctx.channel_id()
        .delete_permission(
            &ctx.serenity_context().http,
            serenity::PermissionOverwriteType::Member(user.id),
        )
        .await?;

    let embed = serenity::CreateEmbed::new()
        .title("🚫 User Removed from Ticket")
        .description(format!(
            "{} has been removed from this ticket by {}",
            user.mention(),
            ctx.author().mention()
        ))
        .color(guild_color(Some(&config)));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Reopen a closed ticket by id, replaying its archived messages.
#[poise::command(slash_command, guild_only)]
pub async fn reopen(
    ctx: Context<'_>,
    #[description = "Id of the ticket to reopen"] ticket_id: u32,
) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    if !require_staff(ctx, &config).await? {
        return Ok(());
    }
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    match ctx.data().tickets.get(guild_id.get(), ticket_id).await {
        Ok(ticket) if !ticket.closed => {
            return reply_error(ctx, format!("Ticket #{ticket_id} is already open.")).await;
        }
        Ok(_) => {}
        Err(TicketError::NotFound) => {
            return reply_error(ctx, format!("No ticket found with ID {ticket_id}.")).await;
        }
        Err(err) => return Err(err.into()),
    }

    // Replay takes a while; keep the interaction alive.
    ctx.defer().await?;
    ctx.say("🔄 Reopening ticket and recreating messages... This may take a moment.")
        .await?;

    match lifecycle::reopen_ticket(
        ctx.serenity_context(),
        ctx.data(),
        guild_id,
        ticket_id,
        ctx.author(),
    )
    .await
    {
        Ok(channel_id) => {
            ctx.say(format!(
                "✅ Ticket #{ticket_id} has been reopened: {}",
                channel_id.mention()
            ))
            .await?;
        }
        Err(err) => {
            reply_error(ctx, format!("Failed to reopen ticket: {err}")).await?;
        }
    }
    Ok(())
}

/// Display ticket statistics for this server.
#[poise::command(slash_command, guild_only)]
pub async fn ticketstats(ctx: Context<'_>) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    if !require_staff(ctx, &config).await? {
        return Ok(());
    }
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let stats = ctx.data().tickets.stats(guild_id.get()).await?;
    if stats.total == 0 {
        ctx.say("📊 No ticket data found for this server.").await?;
        return Ok(());
    }
    let blacklisted = ctx.data().moderation.blacklist_size(guild_id.get()).await?;

    let guild_name = guild_id
        .name(&ctx.serenity_context().cache)
        .unwrap_or_else(|| "this server".to_string());
    let embed = serenity::CreateEmbed::new()
        .title("📊 Ticket Statistics")
        .description(format!("Statistics for **{guild_name}**"))
        .color(guild_color(Some(&config)))
        .field("📋 Total Tickets", format!("```{}```", stats.total), true)
        .field("🔓 Open Tickets", format!("```{}```", stats.open), true)
        .field("🔒 Closed Tickets", format!("```{}```", stats.closed), true)
        .field("🎯 Claimed Tickets", format!("```{}```", stats.claimed), true)
        .field("🔴 High Priority", format!("```{}```", stats.high_priority), true)
        .field("🟡 Medium Priority", format!("```{}```", stats.medium_priority), true)
        .field("🟢 Low Priority", format!("```{}```", stats.low_priority), true)
        .field("🚫 Blacklisted Users", format!("```{blacklisted}```"), true)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Requested by {}",
            ctx.author().name
        )));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
