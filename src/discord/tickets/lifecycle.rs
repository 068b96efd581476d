// Ticket lifecycle flows shared by slash commands and buttons.
//
// Everything here follows the same shape: extract primitives, call the core
// services, then drive serenity (channels, permission overwrites, embeds,
// files). Responses to the *triggering* interaction stay with the caller;
// these functions only touch the ticket channel, the log channel and DMs.

use crate::core::config::GuildConfig;
use crate::core::replay::parse_replay_log;
use crate::core::tickets::{format_duration, Ticket};
use crate::core::transcript::{
    render_close_summary, render_html_transcript, render_replay_log, render_text_transcript,
    CloseSummary, TranscriptContext,
};
use crate::discord::embeds::{clamp, guild_color};
use crate::discord::tickets::history::capture_channel_history;
use crate::discord::tickets::replay::replay_messages;
use crate::discord::{Data, Error};
use chrono::Utc;
use poise::serenity_prelude as serenity;
use poise::serenity_prelude::Mentionable;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;

// ============================================================================
// CUSTOM IDS
// ============================================================================
// Buttons and modals are dispatched by parsing these ids, so handlers keep
// working across restarts without any in-memory view registry.

pub fn open_button_id(guild_id: u64, label: &str) -> String {
    format!("ticket_open:{guild_id}:{label}")
}

pub fn reason_modal_id(guild_id: u64, label: &str) -> String {
    format!("ticket_reason:{guild_id}:{label}")
}

pub fn close_button_id(guild_id: u64, ticket_id: u32) -> String {
    format!("ticket_close:{guild_id}:{ticket_id}")
}

pub fn close_confirm_id(guild_id: u64, ticket_id: u32) -> String {
    format!("ticket_close_confirm:{guild_id}:{ticket_id}")
}

pub const CLOSE_CANCEL_ID: &str = "ticket_close_cancel";

pub fn claim_button_id(guild_id: u64, ticket_id: u32) -> String {
    format!("ticket_claim:{guild_id}:{ticket_id}")
}

pub fn transcript_button_id(guild_id: u64, ticket_id: u32) -> String {
    format!("ticket_transcript:{guild_id}:{ticket_id}")
}

pub fn rename_button_id(guild_id: u64, ticket_id: u32) -> String {
    format!("ticket_rename:{guild_id}:{ticket_id}")
}

pub fn rename_modal_id(guild_id: u64, ticket_id: u32) -> String {
    format!("ticket_rename_modal:{guild_id}:{ticket_id}")
}

/// The row of control buttons posted with every ticket welcome message.
pub fn control_buttons(guild_id: u64, ticket_id: u32) -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(close_button_id(guild_id, ticket_id))
            .label("Close Ticket")
            .style(serenity::ButtonStyle::Danger)
            .emoji('🔒'),
        serenity::CreateButton::new(claim_button_id(guild_id, ticket_id))
            .label("Claim")
            .style(serenity::ButtonStyle::Success)
            .emoji('🎯'),
        serenity::CreateButton::new(transcript_button_id(guild_id, ticket_id))
            .label("Transcript")
            .style(serenity::ButtonStyle::Secondary)
            .emoji('📄'),
        serenity::CreateButton::new(rename_button_id(guild_id, ticket_id))
            .label("Rename")
            .style(serenity::ButtonStyle::Secondary)
            .emoji(serenity::ReactionType::Unicode("✏️".to_string())),
    ])]
}

pub fn close_confirm_buttons(guild_id: u64, ticket_id: u32) -> Vec<serenity::CreateActionRow> {
    vec![serenity::CreateActionRow::Buttons(vec![
        serenity::CreateButton::new(close_confirm_id(guild_id, ticket_id))
            .label("Yes, Close Ticket")
            .style(serenity::ButtonStyle::Success)
            .emoji('✅'),
        serenity::CreateButton::new(CLOSE_CANCEL_ID)
            .label("Cancel")
            .style(serenity::ButtonStyle::Secondary)
            .emoji('❌'),
    ])]
}

// ============================================================================
// PERMISSION OVERWRITES
// ============================================================================

fn allow_basic() -> serenity::Permissions {
    serenity::Permissions::VIEW_CHANNEL
        | serenity::Permissions::SEND_MESSAGES
        | serenity::Permissions::READ_MESSAGE_HISTORY
        | serenity::Permissions::ATTACH_FILES
}

/// Overwrites for a fresh ticket channel: everyone hidden, creator and
/// staff roles in, the bot able to manage the channel and its webhooks.
pub fn creation_overwrites(
    config: &GuildConfig,
    guild_id: u64,
    creator_id: u64,
    bot_id: u64,
) -> Vec<serenity::PermissionOverwrite> {
    let mut overwrites = vec![
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::empty(),
            deny: serenity::Permissions::VIEW_CHANNEL,
            // The @everyone role id is the guild id.
            kind: serenity::PermissionOverwriteType::Role(serenity::RoleId::new(guild_id)),
        },
        serenity::PermissionOverwrite {
            allow: allow_basic()
                | serenity::Permissions::ADD_REACTIONS
                | serenity::Permissions::EMBED_LINKS,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Member(serenity::UserId::new(creator_id)),
        },
        serenity::PermissionOverwrite {
            allow: allow_basic()
                | serenity::Permissions::MANAGE_CHANNELS
                | serenity::Permissions::MANAGE_WEBHOOKS,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Member(serenity::UserId::new(bot_id)),
        },
    ];

    for role_id in &config.staff_role_ids {
        overwrites.push(serenity::PermissionOverwrite {
            allow: allow_basic() | serenity::Permissions::MANAGE_MESSAGES,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Role(serenity::RoleId::new(*role_id)),
        });
    }

    overwrites
}

/// Overwrite used when adding a participant or restoring access on reopen.
pub fn participant_overwrite(user_id: u64) -> serenity::PermissionOverwrite {
    serenity::PermissionOverwrite {
        allow: allow_basic(),
        deny: serenity::Permissions::empty(),
        kind: serenity::PermissionOverwriteType::Member(serenity::UserId::new(user_id)),
    }
}

// ============================================================================
// OPEN
// ============================================================================

/// Create a ticket from a panel button press. Returns the persisted ticket
/// and its channel. The caller sends the ephemeral confirmation.
pub async fn open_ticket(
    ctx: &serenity::Context,
    data: &Data,
    guild_id: serenity::GuildId,
    user: &serenity::User,
    label: &str,
    reason: &str,
) -> Result<(Ticket, serenity::ChannelId), Error> {
    let config = data.config.get(guild_id.get()).await?;

    data.tickets
        .ensure_under_cap(guild_id.get(), user.id.get(), config.max_tickets_per_user)
        .await?;

    let draft = data
        .tickets
        .allocate(guild_id.get(), user.id.get(), label, reason)
        .await?;

    let bot_id = ctx.cache.current_user().id.get();
    let overwrites = creation_overwrites(&config, guild_id.get(), user.id.get(), bot_id);

    let builder = serenity::CreateChannel::new(draft.channel_name())
        .kind(serenity::ChannelType::Text)
        .category(serenity::ChannelId::new(config.ticket_category_id))
        .topic(format!(
            "Ticket #{} | Created by {} | Type: {}",
            draft.id, user.name, label
        ))
        .permissions(overwrites);

    let channel = guild_id.create_channel(&ctx.http, builder).await?;

    let ticket = data
        .tickets
        .commit_open(guild_id.get(), draft, channel.id.get())
        .await?;

    // Welcome message with the info embed and control buttons
    let embed = serenity::CreateEmbed::new()
        .title("🎫 New Support Ticket")
        .color(guild_color(Some(&config)))
        .author(serenity::CreateEmbedAuthor::new(format!("{} ({})", user.display_name(), user.name)).icon_url(user.face()))
        .thumbnail(user.face())
        .field("👤 Created by", user.mention().to_string(), true)
        .field("🏷️ Type", format!("`{label}`"), true)
        .field("🎫 Ticket ID", format!("`{}`", ticket.id), true)
        .field("📄 Reason", format!("```{}```", clamp(reason, 500)), false)
        .field("⚡ Priority", "`Medium`", true)
        .field("📊 Status", "`Open`", true)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Ticket #{} • Created at {}",
            ticket.ticket_number,
            ticket.created_at.format("%Y-%m-%d %H:%M:%S")
        )));

    let welcome = config.render_welcome(&user.mention().to_string());
    channel
        .id
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new()
                .content(welcome)
                .embed(embed)
                .components(control_buttons(guild_id.get(), ticket.id)),
        )
        .await?;

    // Log channel notice, best effort
    let log_embed = serenity::CreateEmbed::new()
        .title("🎫 New Ticket Created")
        .color(guild_color(Some(&config)))
        .field("User", user.mention().to_string(), true)
        .field("Channel", format!("<#{}>", channel.id.get()), true)
        .field("ID", format!("`{}`", ticket.id), true)
        .field("Type", format!("`{label}`"), true);
    if let Err(err) = serenity::ChannelId::new(config.log_channel_id)
        .send_message(&ctx.http, serenity::CreateMessage::new().embed(log_embed))
        .await
    {
        tracing::warn!(guild_id = guild_id.get(), "Failed to post ticket-open log: {err}");
    }

    tracing::info!(
        guild_id = guild_id.get(),
        ticket_id = ticket.id,
        creator_id = user.id.get(),
        "Ticket opened"
    );

    Ok((ticket, channel.id))
}

// ============================================================================
// ARCHIVE & CLOSE
// ============================================================================

fn logs_dir(data: &Data, guild_id: u64) -> PathBuf {
    data.data_dir.join("logs").join(guild_id.to_string())
}

fn transcripts_dir(data: &Data, guild_id: u64) -> PathBuf {
    data.data_dir.join("transcripts").join(guild_id.to_string())
}

/// The newest replay log for a ticket, if any close ever archived one.
pub fn latest_replay_log(data: &Data, guild_id: u64, ticket_id: u32) -> Option<PathBuf> {
    let prefix = format!("ticket_{ticket_id}_");
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(logs_dir(data, guild_id))
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with(&prefix) && n.ends_with(".txt"))
                .unwrap_or(false)
        })
        .collect();
    candidates.sort();
    candidates.pop()
}

fn transcript_context(
    ticket: &Ticket,
    guild_name: &str,
    channel_name: &str,
    creator_name: &str,
) -> TranscriptContext {
    TranscriptContext {
        ticket_id: ticket.id,
        guild_name: guild_name.to_string(),
        channel_name: channel_name.to_string(),
        creator_name: creator_name.to_string(),
        category_label: ticket.category_label.clone(),
        priority: ticket.priority.to_string(),
        status: ticket.status.to_string(),
        generated_at: Utc::now(),
    }
}

async fn channel_and_guild_names(
    ctx: &serenity::Context,
    guild_id: serenity::GuildId,
    channel_id: serenity::ChannelId,
) -> (String, String) {
    let guild_name = guild_id
        .name(&ctx.cache)
        .unwrap_or_else(|| "Unknown Server".to_string());
    let channel_name = channel_id
        .name(&ctx)
        .await
        .unwrap_or_else(|_| "unknown".to_string());
    (guild_name, channel_name)
}

async fn creator_display_name(ctx: &serenity::Context, creator_id: u64) -> String {
    match ctx.http.get_user(serenity::UserId::new(creator_id)).await {
        Ok(user) => user.display_name().to_string(),
        Err(_) => "Unknown User".to_string(),
    }
}

/// Close a ticket: archive the replay log and both transcripts, notify the
/// log channel and the creator, then delete the channel after a grace delay.
pub async fn archive_and_close(
    ctx: &serenity::Context,
    data: &Data,
    guild_id: serenity::GuildId,
    ticket_id: u32,
    closed_by: serenity::UserId,
) -> Result<(), Error> {
    let config = data.config.get(guild_id.get()).await?;
    let ticket = data.tickets.get(guild_id.get(), ticket_id).await?;
    let channel_id = serenity::ChannelId::new(ticket.channel_id);

    let messages = capture_channel_history(&ctx.http, channel_id).await?;
    let closed = data
        .tickets
        .close(guild_id.get(), ticket_id, closed_by.get(), false)
        .await?;
    let closed_at = closed.closed_at.unwrap_or_else(Utc::now);
    let duration = format_duration(closed.created_at, closed_at);

    // Replay log first: a reopen must always find one even if transcript
    // rendering fails later.
    let summary = CloseSummary {
        ticket_id: closed.id,
        creator_id: closed.creator_id,
        closed_by_id: closed_by.get(),
        claimed_by_id: closed.claimed_by,
        category_label: closed.category_label.clone(),
        priority: closed.priority.to_string(),
        reopened_label: closed.reopened_label().to_string(),
        message_count: messages.len(),
        note_count: closed.notes.len(),
        added_user_count: closed.added_users.len(),
        created_at: closed.created_at,
        closed_at,
        duration: duration.clone(),
    };
    let log_content = format!(
        "{}{}",
        render_replay_log(&messages),
        render_close_summary(&summary)
    );

    let stamp = Utc::now().timestamp();
    let log_dir = logs_dir(data, guild_id.get());
    std::fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join(format!("ticket_{}_{}.txt", closed.id, stamp));
    std::fs::write(&log_path, &log_content)?;

    let (guild_name, channel_name) = channel_and_guild_names(ctx, guild_id, channel_id).await;
    let creator_name = creator_display_name(ctx, closed.creator_id).await;
    let transcript_ctx = transcript_context(&closed, &guild_name, &channel_name, &creator_name);
    let html = render_html_transcript(&transcript_ctx, &messages);
    let text = render_text_transcript(&transcript_ctx, &messages);

    let transcript_dir = transcripts_dir(data, guild_id.get());
    std::fs::create_dir_all(&transcript_dir)?;
    let html_name = format!("transcript_{}_{}_close.html", closed.id, stamp);
    let text_name = format!("transcript_{}_{}_close.txt", closed.id, stamp);
    std::fs::write(transcript_dir.join(&html_name), &html)?;
    std::fs::write(transcript_dir.join(&text_name), &text)?;

    // Log channel summary with all three files
    let color = guild_color(Some(&config));
    let log_embed = serenity::CreateEmbed::new()
        .title(format!("🔒 Ticket Closed - #{}", closed.id))
        .description(format!("Ticket closed by <@{}>", closed_by.get()))
        .color(color)
        .field("👤 Created by", format!("<@{}>", closed.creator_id), true)
        .field("🏷️ Type", closed.category_label.clone(), true)
        .field("⚡ Priority", closed.priority.to_string(), true)
        .field(
            "🎯 Claimed by",
            closed
                .claimed_by
                .map(|id| format!("<@{id}>"))
                .unwrap_or_else(|| "None".to_string()),
            true,
        )
        .field("🔄 Reopened", closed.reopened_label(), true)
        .field("📊 Messages", messages.len().to_string(), true)
        .field("⏱️ Duration", duration.clone(), true)
        .field("📝 Notes", closed.notes.len().to_string(), true)
        .field("👥 Added Users", closed.added_users.len().to_string(), true)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Closed at {}",
            closed_at.format("%Y-%m-%d %H:%M:%S UTC")
        )));

    let files = vec![
        serenity::CreateAttachment::bytes(html.clone().into_bytes(), html_name.clone()),
        serenity::CreateAttachment::bytes(text.clone().into_bytes(), text_name.clone()),
        serenity::CreateAttachment::bytes(
            log_content.into_bytes(),
            format!("ticket_{}_log.txt", closed.id),
        ),
    ];
    if let Err(err) = serenity::ChannelId::new(config.log_channel_id)
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new().embed(log_embed).files(files),
        )
        .await
    {
        tracing::warn!(guild_id = guild_id.get(), "Failed to post close log: {err}");
    }

    // DM the creator with the transcripts if enabled
    if config.send_transcript_to_user {
        let dm_embed = serenity::CreateEmbed::new()
            .title("🔒 Your Ticket Has Been Closed")
            .description(format!(
                "Your ticket #{} in **{}** has been closed.",
                closed.id, guild_name
            ))
            .color(color)
            .field("🏷️ Type", closed.category_label.clone(), true)
            .field("⏱️ Duration", duration.clone(), true)
            .field("📊 Messages", messages.len().to_string(), true)
            .field(
                "📄 Transcript Files",
                "💻 **HTML** - best for desktop viewing\n📱 **TXT** - mobile-friendly format",
                false,
            );
        let dm_files = vec![
            serenity::CreateAttachment::bytes(html.into_bytes(), html_name),
            serenity::CreateAttachment::bytes(text.into_bytes(), text_name),
        ];

        let dm = async {
            let channel = serenity::UserId::new(closed.creator_id)
                .create_dm_channel(&ctx.http)
                .await?;
            channel
                .id
                .send_message(
                    &ctx.http,
                    serenity::CreateMessage::new().embed(dm_embed).files(dm_files),
                )
                .await
        };
        if let Err(err) = dm.await {
            // DMs disabled is the common case; nothing actionable.
            tracing::debug!("Could not DM transcript to creator: {err}");
        }
    }

    // Closure notice in the channel, then delete after the grace delay
    let closure_embed = serenity::CreateEmbed::new()
        .title("🔒 Ticket Closing")
        .description(format!(
            "This ticket has been closed by <@{}>.\n\nThe channel will be deleted in **10 seconds**.",
            closed_by.get()
        ))
        .color(color)
        .field(
            "📊 Summary",
            format!(
                "**Duration:** {}\n**Messages:** {}\n**Notes:** {}",
                duration,
                messages.len(),
                closed.notes.len()
            ),
            false,
        );
    if let Err(err) = channel_id
        .send_message(&ctx.http, serenity::CreateMessage::new().embed(closure_embed))
        .await
    {
        tracing::warn!("Failed to send closure notice: {err}");
    }

    sleep(Duration::from_secs(10)).await;
    if let Err(err) = channel_id.delete(&ctx.http).await {
        tracing::warn!("Failed to delete ticket channel: {err}");
    }

    tracing::info!(
        guild_id = guild_id.get(),
        ticket_id = closed.id,
        closed_by = closed_by.get(),
        "Ticket closed"
    );

    Ok(())
}

// ============================================================================
// TRANSCRIPT ON DEMAND
// ============================================================================

pub struct GeneratedTranscript {
    pub html: String,
    pub text: String,
    pub html_name: String,
    pub text_name: String,
    pub message_count: usize,
}

/// Generate both transcript formats for an open ticket, write them to the
/// transcripts directory and post them to the log channel. The caller
/// decides whether to hand the files to the invoking user.
pub async fn generate_transcript(
    ctx: &serenity::Context,
    data: &Data,
    guild_id: serenity::GuildId,
    ticket: &Ticket,
    generated_by: serenity::UserId,
) -> Result<GeneratedTranscript, Error> {
    let config = data.config.get(guild_id.get()).await?;
    let channel_id = serenity::ChannelId::new(ticket.channel_id);
    let messages = capture_channel_history(&ctx.http, channel_id).await?;

    let (guild_name, channel_name) = channel_and_guild_names(ctx, guild_id, channel_id).await;
    let creator_name = creator_display_name(ctx, ticket.creator_id).await;
    let transcript_ctx = transcript_context(ticket, &guild_name, &channel_name, &creator_name);
    let html = render_html_transcript(&transcript_ctx, &messages);
    let text = render_text_transcript(&transcript_ctx, &messages);

    let stamp = Utc::now().timestamp();
    let dir = transcripts_dir(data, guild_id.get());
    std::fs::create_dir_all(&dir)?;
    let html_name = format!("transcript_{}_{}.html", ticket.id, stamp);
    let text_name = format!("transcript_{}_{}.txt", ticket.id, stamp);
    std::fs::write(dir.join(&html_name), &html)?;
    std::fs::write(dir.join(&text_name), &text)?;

    let log_embed = serenity::CreateEmbed::new()
        .title("📄 Transcript Generated")
        .description(format!("Transcript for Ticket #{}", ticket.id))
        .color(0x00B0F4)
        .field("Generated by", format!("<@{}>", generated_by.get()), true)
        .field("Channel", format!("<#{}>", channel_id.get()), true)
        .field("Messages", messages.len().to_string(), true);
    let files = vec![
        serenity::CreateAttachment::bytes(html.clone().into_bytes(), html_name.clone()),
        serenity::CreateAttachment::bytes(text.clone().into_bytes(), text_name.clone()),
    ];
    if let Err(err) = serenity::ChannelId::new(config.log_channel_id)
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new().embed(log_embed).files(files),
        )
        .await
    {
        tracing::warn!("Failed to post transcript to log channel: {err}");
    }

    Ok(GeneratedTranscript {
        html,
        text,
        html_name,
        text_name,
        message_count: messages.len(),
    })
}

// ============================================================================
// REOPEN
// ============================================================================

/// Reopen a closed ticket: recreate the channel, restore access, replay the
/// archived conversation. Returns the new channel.
pub async fn reopen_ticket(
    ctx: &serenity::Context,
    data: &Data,
    guild_id: serenity::GuildId,
    ticket_id: u32,
    reopened_by: &serenity::User,
) -> Result<serenity::ChannelId, Error> {
    let config = data.config.get(guild_id.get()).await?;
    let ticket = data.tickets.get(guild_id.get(), ticket_id).await?;
    if !ticket.closed {
        return Err(format!("Ticket #{ticket_id} is already open.").into());
    }

    let creator = ctx
        .http
        .get_user(serenity::UserId::new(ticket.creator_id))
        .await
        .map_err(|_| "Could not find the original ticket creator.")?;

    let bot_id = ctx.cache.current_user().id.get();
    let mut overwrites =
        creation_overwrites(&config, guild_id.get(), ticket.creator_id, bot_id);
    for user_id in &ticket.added_users {
        overwrites.push(participant_overwrite(*user_id));
    }

    let builder = serenity::CreateChannel::new(ticket.reopened_channel_name())
        .kind(serenity::ChannelType::Text)
        .category(serenity::ChannelId::new(config.ticket_category_id))
        .permissions(overwrites);
    let channel = guild_id.create_channel(&ctx.http, builder).await?;

    let reopened = data
        .tickets
        .reopen(guild_id.get(), ticket_id, reopened_by.id.get(), channel.id.get())
        .await?;

    let color = guild_color(Some(&config));
    let embed = serenity::CreateEmbed::new()
        .title("🔄 Reopened Support Ticket")
        .color(color)
        .author(serenity::CreateEmbedAuthor::new(creator.display_name().to_string()).icon_url(creator.face()))
        .thumbnail(creator.face())
        .field("👤 Created by", format!("<@{}>", reopened.creator_id), true)
        .field("🔄 Reopened by", reopened_by.mention().to_string(), true)
        .field("🎫 Ticket ID", format!("`{}`", reopened.id), true)
        .field(
            "📄 Original Reason",
            format!("```{}```", clamp(&reopened.reason, 500)),
            false,
        )
        .field("⚡ Priority", reopened.priority.to_string(), true)
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Ticket Number: {}",
            reopened.ticket_number
        )));

    channel
        .id
        .send_message(
            &ctx.http,
            serenity::CreateMessage::new()
                .content(format!(
                    "🔄 This ticket has been reopened by {}.",
                    reopened_by.mention()
                ))
                .embed(embed)
                .components(control_buttons(guild_id.get(), reopened.id)),
        )
        .await?;

    // Replay archived messages through a webhook, if a log exists
    match latest_replay_log(data, guild_id.get(), ticket_id) {
        Some(log_path) => {
            let status = channel
                .id
                .send_message(
                    &ctx.http,
                    serenity::CreateMessage::new().embed(
                        serenity::CreateEmbed::new()
                            .title("📜 Recreating Previous Messages")
                            .description("Please wait while the message history is restored...")
                            .color(color),
                    ),
                )
                .await;

            let log_content = std::fs::read_to_string(&log_path)?;
            let messages = parse_replay_log(&log_content);
            let restored = if messages.is_empty() {
                0
            } else {
                replay_messages(&ctx.http, channel.id, &messages, bot_id).await
            };

            if let Ok(mut status) = status {
                let done = if restored > 0 {
                    serenity::CreateEmbed::new()
                        .title("✅ Message History Restored")
                        .description(format!(
                            "Successfully restored {restored} previous messages."
                        ))
                        .color(color)
                } else {
                    serenity::CreateEmbed::new()
                        .title("📜 No Message History")
                        .description("No previous messages found to restore.")
                        .color(color)
                };
                let _ = status
                    .edit(ctx, serenity::EditMessage::new().embed(done))
                    .await;
            }
        }
        None => {
            let _ = channel
                .id
                .send_message(
                    &ctx.http,
                    serenity::CreateMessage::new().embed(
                        serenity::CreateEmbed::new()
                            .title("📜 No Previous Messages")
                            .description("No message history file found for this ticket.")
                            .color(color),
                    ),
                )
                .await;
        }
    }

    // Tell the creator unless they reopened it themselves
    if creator.id != reopened_by.id {
        let notice = format!(
            "Your ticket #{} has been reopened by {} in {}. You can access it here: <#{}>",
            reopened.id,
            reopened_by.name,
            guild_id
                .name(&ctx.cache)
                .unwrap_or_else(|| "the server".to_string()),
            channel.id.get()
        );
        let dm = async {
            let dm_channel = creator.create_dm_channel(&ctx.http).await?;
            dm_channel.id.say(&ctx.http, notice).await
        };
        if dm.await.is_err() {
            let _ = channel
                .id
                .say(
                    &ctx.http,
                    format!(
                        "📧 Unable to DM <@{}>. Please notify them about this reopened ticket.",
                        reopened.creator_id
                    ),
                )
                .await;
        }
    }

    tracing::info!(
        guild_id = guild_id.get(),
        ticket_id = reopened.id,
        reopened_by = reopened_by.id.get(),
        "Ticket reopened"
    );

    Ok(channel.id)
}

/// Sanitize a requested channel name the way Discord expects: lowercase,
/// spaces to dashes, everything else outside `[a-z0-9-]` dropped.
pub fn sanitize_channel_name(input: &str) -> String {
    input
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_channel_name() {
        assert_eq!(sanitize_channel_name("Support Urgent 123"), "support-urgent-123");
        assert_eq!(sanitize_channel_name("weird!@#name"), "weirdname");
        assert_eq!(sanitize_channel_name("ALREADY-ok"), "already-ok");
        assert_eq!(sanitize_channel_name("émoji café"), "moji-caf");
    }

    #[test]
    fn test_custom_id_shapes() {
        assert_eq!(open_button_id(1, "Support"), "ticket_open:1:Support");
        assert_eq!(close_confirm_id(1, 12345), "ticket_close_confirm:1:12345");
        assert_eq!(rename_modal_id(9, 2), "ticket_rename_modal:9:2");
    }
}
