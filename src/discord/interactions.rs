// Button and modal dispatch.
//
// Every interactive element carries a structured custom id
// (`action:guild_id:argument`), so handlers are stateless and keep working
// for messages posted before the last restart.

use crate::core::tickets::{ClaimOutcome, TicketActor, TicketError};
use crate::discord::embeds::{error_embed, guild_color};
use crate::discord::tickets::lifecycle::{
    self, archive_and_close, generate_transcript, open_ticket, sanitize_channel_name,
};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

pub async fn handle_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::Interaction,
    data: &Data,
) -> Result<(), Error> {
    match interaction {
        serenity::Interaction::Component(component) => {
            handle_component(ctx, component, data).await
        }
        serenity::Interaction::Modal(modal) => handle_modal(ctx, modal, data).await,
        _ => Ok(()),
    }
}

/// Split `action:guild_id:argument`. The argument keeps any further colons
/// because panel labels are user-chosen text.
fn parse_custom_id(id: &str) -> Option<(&str, u64, &str)> {
    let mut parts = id.splitn(3, ':');
    let action = parts.next()?;
    let guild_id: u64 = parts.next()?.parse().ok()?;
    let argument = parts.next().unwrap_or("");
    Some((action, guild_id, argument))
}

fn member_role_ids(member: Option<&serenity::Member>) -> Vec<u64> {
    member
        .map(|m| m.roles.iter().map(|r| r.get()).collect())
        .unwrap_or_default()
}

// ============================================================================
// COMPONENTS (BUTTONS)
// ============================================================================

async fn respond_ephemeral(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    embed: serenity::CreateEmbed,
) -> Result<(), Error> {
    component
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

async fn handle_component(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    if component.data.custom_id == lifecycle::CLOSE_CANCEL_ID {
        return respond_ephemeral(
            ctx,
            component,
            serenity::CreateEmbed::new()
                .description("✅ Ticket close cancelled.")
                .color(0x3BA55D),
        )
        .await;
    }

    let Some((action, guild_id, argument)) = parse_custom_id(&component.data.custom_id) else {
        return Ok(());
    };

    match action {
        "ticket_open" => handle_open_button(ctx, component, data, guild_id, argument).await,
        "ticket_close" => {
            let ticket_id = argument.parse().unwrap_or(0);
            handle_close_button(ctx, component, data, guild_id, ticket_id).await
        }
        "ticket_close_confirm" => {
            let ticket_id = argument.parse().unwrap_or(0);
            handle_close_confirm(ctx, component, data, guild_id, ticket_id).await
        }
        "ticket_claim" => {
            let ticket_id = argument.parse().unwrap_or(0);
            handle_claim_button(ctx, component, data, guild_id, ticket_id).await
        }
        "ticket_transcript" => {
            let ticket_id = argument.parse().unwrap_or(0);
            handle_transcript_button(ctx, component, data, guild_id, ticket_id).await
        }
        "ticket_rename" => handle_rename_button(ctx, component, data, guild_id).await,
        _ => Ok(()),
    }
}

/// Panel button: gate on configuration, blacklist and the open-ticket cap,
/// then collect the reason through a modal.
async fn handle_open_button(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &Data,
    guild_id: u64,
    label: &str,
) -> Result<(), Error> {
    if !data.config.is_configured(guild_id).await? {
        return respond_ephemeral(
            ctx,
            component,
            error_embed(
                "This server is not configured yet! An administrator needs to run `/setup` first.",
            ),
        )
        .await;
    }

    if data
        .moderation
        .is_blacklisted(guild_id, component.user.id.get())
        .await?
    {
        return respond_ephemeral(
            ctx,
            component,
            error_embed("You are blacklisted from creating tickets in this server."),
        )
        .await;
    }

    let config = data.config.get(guild_id).await?;
    if let Err(TicketError::TooManyOpen { open, max }) = data
        .tickets
        .ensure_under_cap(guild_id, component.user.id.get(), config.max_tickets_per_user)
        .await
    {
        return respond_ephemeral(
            ctx,
            component,
            error_embed(format!(
                "You already have {open} open tickets. Maximum allowed: {max}"
            )),
        )
        .await;
    }

    let modal = serenity::CreateModal::new(
        lifecycle::reason_modal_id(guild_id, label),
        "Reason for Ticket",
    )
    .components(vec![serenity::CreateActionRow::InputText(
        serenity::CreateInputText::new(
            serenity::InputTextStyle::Paragraph,
            "Describe your issue (max 500 characters)",
            "ticket_reason_input",
        )
        .placeholder("Describe your issue in detail...")
        .max_length(500)
        .required(true),
    )]);

    component
        .create_response(&ctx.http, serenity::CreateInteractionResponse::Modal(modal))
        .await?;
    Ok(())
}

async fn handle_close_button(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &Data,
    guild_id: u64,
    ticket_id: u32,
) -> Result<(), Error> {
    let config = data.config.get(guild_id).await?;
    let Some(ticket) = data
        .tickets
        .get(guild_id, ticket_id)
        .await
        .ok()
        .filter(|t| !t.closed)
    else {
        return respond_ephemeral(ctx, component, error_embed("Ticket data not found.")).await;
    };

    let actor = TicketActor {
        user_id: component.user.id.get(),
        is_staff: config.is_staff(&member_role_ids(component.member.as_ref())),
    };
    if !actor.may_manage(&ticket) {
        return respond_ephemeral(
            ctx,
            component,
            error_embed("You do not have permission to close this ticket."),
        )
        .await;
    }

    let embed = serenity::CreateEmbed::new()
        .title("⚠️ Confirm Ticket Closure")
        .description(
            "Are you sure you want to close this ticket?\n\n**This action will:**\n\
             • Archive all messages\n• Send logs to staff\n• Delete the channel after 10 seconds",
        )
        .color(0xE67E22);

    component
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .components(lifecycle::close_confirm_buttons(guild_id, ticket_id))
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

async fn handle_close_confirm(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &Data,
    guild_id: u64,
    ticket_id: u32,
) -> Result<(), Error> {
    component
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Defer(
                serenity::CreateInteractionResponseMessage::new().ephemeral(true),
            ),
        )
        .await?;

    let result = archive_and_close(
        ctx,
        data,
        serenity::GuildId::new(guild_id),
        ticket_id,
        component.user.id,
    )
    .await;

    let followup = match result {
        Ok(()) => serenity::CreateInteractionResponseFollowup::new()
            .content("✅ Ticket closed successfully. Channel will be deleted shortly.")
            .ephemeral(true),
        Err(err) => serenity::CreateInteractionResponseFollowup::new()
            .embed(error_embed(format!("Failed to close ticket: {err}")))
            .ephemeral(true),
    };
    // The channel may already be gone when this lands; that is fine.
    let _ = component.create_followup(&ctx.http, followup).await;
    Ok(())
}

async fn handle_claim_button(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &Data,
    guild_id: u64,
    ticket_id: u32,
) -> Result<(), Error> {
    let config = data.config.get(guild_id).await?;
    let actor = TicketActor {
        user_id: component.user.id.get(),
        is_staff: config.is_staff(&member_role_ids(component.member.as_ref())),
    };

    match data.tickets.toggle_claim(guild_id, ticket_id, actor).await {
        Ok(outcome) => {
            let (title, verb) = match outcome {
                ClaimOutcome::Claimed => ("🎯 Ticket Claimed", "claimed"),
                ClaimOutcome::Unclaimed => ("🔓 Ticket Unclaimed", "unclaimed"),
            };
            let embed = serenity::CreateEmbed::new()
                .title(title)
                .description(format!(
                    "This ticket has been {verb} by <@{}>",
                    component.user.id.get()
                ))
                .color(guild_color(Some(&config)));
            component
                .create_response(
                    &ctx.http,
                    serenity::CreateInteractionResponse::Message(
                        serenity::CreateInteractionResponseMessage::new().embed(embed),
                    ),
                )
                .await?;
            Ok(())
        }
        Err(TicketError::NotPermitted) => {
            respond_ephemeral(ctx, component, error_embed("Only staff members can claim tickets."))
                .await
        }
        Err(TicketError::AlreadyClaimed(claimer)) => {
            respond_ephemeral(
                ctx,
                component,
                error_embed(format!("This ticket is already claimed by <@{claimer}>.")),
            )
            .await
        }
        Err(TicketError::NotFound) => {
            respond_ephemeral(ctx, component, error_embed("Ticket data not found.")).await
        }
        Err(err) => Err(err.into()),
    }
}

async fn handle_transcript_button(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &Data,
    guild_id: u64,
    ticket_id: u32,
) -> Result<(), Error> {
    let config = data.config.get(guild_id).await?;
    if !config.is_staff(&member_role_ids(component.member.as_ref())) {
        return respond_ephemeral(
            ctx,
            component,
            error_embed("Only staff members can generate transcripts."),
        )
        .await;
    }

    let Ok(ticket) = data.tickets.get(guild_id, ticket_id).await else {
        return respond_ephemeral(ctx, component, error_embed("Ticket data not found.")).await;
    };

    component
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Defer(
                serenity::CreateInteractionResponseMessage::new().ephemeral(true),
            ),
        )
        .await?;

    let generated = match generate_transcript(
        ctx,
        data,
        serenity::GuildId::new(guild_id),
        &ticket,
        component.user.id,
    )
    .await
    {
        Ok(generated) => generated,
        Err(err) => {
            let _ = component
                .create_followup(
                    &ctx.http,
                    serenity::CreateInteractionResponseFollowup::new()
                        .embed(error_embed(format!("Failed to generate transcript: {err}")))
                        .ephemeral(true),
                )
                .await;
            return Ok(());
        }
    };

    let followup = if config.send_transcript_to_user {
        let embed = serenity::CreateEmbed::new()
            .title("📄 Transcript Generated Successfully")
            .description("Choose your preferred format:")
            .color(0x3BA55D)
            .field(
                "💻 Desktop Users",
                "Download the HTML file for the best viewing experience with Discord styling",
                false,
            )
            .field(
                "📱 Mobile Users",
                "Use the TXT file for easier mobile viewing and copying",
                false,
            )
            .field(
                "📊 Stats",
                format!(
                    "**Messages:** {}\n**File Size:** HTML (~{}KB), TXT (~{}KB)",
                    generated.message_count,
                    generated.html.len() / 1024,
                    generated.text.len() / 1024
                ),
                false,
            );
        serenity::CreateInteractionResponseFollowup::new()
            .embed(embed)
            .add_file(serenity::CreateAttachment::bytes(
                generated.html.into_bytes(),
                generated.html_name,
            ))
            .add_file(serenity::CreateAttachment::bytes(
                generated.text.into_bytes(),
                generated.text_name,
            ))
            .ephemeral(true)
    } else {
        serenity::CreateInteractionResponseFollowup::new()
            .content("📄 Transcript generated successfully and sent to the log channel.")
            .ephemeral(true)
    };

    if component.create_followup(&ctx.http, followup).await.is_err() {
        let _ = component
            .create_followup(
                &ctx.http,
                serenity::CreateInteractionResponseFollowup::new()
                    .content(
                        "📄 Transcript generated but the files are too large to send directly. \
                         Check the transcripts directory.",
                    )
                    .ephemeral(true),
            )
            .await;
    }
    Ok(())
}

async fn handle_rename_button(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &Data,
    guild_id: u64,
) -> Result<(), Error> {
    let config = data.config.get(guild_id).await?;
    if !config.is_staff(&member_role_ids(component.member.as_ref())) {
        return respond_ephemeral(
            ctx,
            component,
            error_embed("Only staff members can rename tickets."),
        )
        .await;
    }

    let ticket_id: u32 = component
        .data
        .custom_id
        .rsplit(':')
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    let modal = serenity::CreateModal::new(
        lifecycle::rename_modal_id(guild_id, ticket_id),
        "Rename Ticket Channel",
    )
    .components(vec![serenity::CreateActionRow::InputText(
        serenity::CreateInputText::new(
            serenity::InputTextStyle::Short,
            "New channel name (no spaces, lowercase)",
            "ticket_rename_input",
        )
        .placeholder("support-urgent-123")
        .max_length(50)
        .required(true),
    )]);

    component
        .create_response(&ctx.http, serenity::CreateInteractionResponse::Modal(modal))
        .await?;
    Ok(())
}

// ============================================================================
// MODALS
// ============================================================================

fn first_input_value(modal: &serenity::ModalInteraction) -> Option<String> {
    for row in &modal.data.components {
        for component in &row.components {
            if let serenity::ActionRowComponent::InputText(input) = component {
                if let Some(value) = &input.value {
                    return Some(value.clone());
                }
            }
        }
    }
    None
}

async fn modal_respond(
    ctx: &serenity::Context,
    modal: &serenity::ModalInteraction,
    message: serenity::CreateInteractionResponseMessage,
) -> Result<(), Error> {
    modal
        .create_response(&ctx.http, serenity::CreateInteractionResponse::Message(message))
        .await?;
    Ok(())
}

async fn handle_modal(
    ctx: &serenity::Context,
    modal: &serenity::ModalInteraction,
    data: &Data,
) -> Result<(), Error> {
    let Some((action, guild_id, argument)) = parse_custom_id(&modal.data.custom_id) else {
        return Ok(());
    };

    match action {
        "ticket_reason" => {
            let reason = first_input_value(modal).unwrap_or_default();
            handle_reason_modal(ctx, modal, data, guild_id, argument, &reason).await
        }
        "ticket_rename_modal" => {
            let requested = first_input_value(modal).unwrap_or_default();
            handle_rename_modal(ctx, modal, &requested).await
        }
        _ => Ok(()),
    }
}

async fn handle_reason_modal(
    ctx: &serenity::Context,
    modal: &serenity::ModalInteraction,
    data: &Data,
    guild_id: u64,
    label: &str,
    reason: &str,
) -> Result<(), Error> {
    if reason.trim().is_empty() {
        return modal_respond(
            ctx,
            modal,
            serenity::CreateInteractionResponseMessage::new()
                .embed(error_embed("Please describe your issue."))
                .ephemeral(true),
        )
        .await;
    }

    // Channel creation can outlast the 3-second interaction window.
    modal
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Defer(
                serenity::CreateInteractionResponseMessage::new().ephemeral(true),
            ),
        )
        .await?;

    let result = open_ticket(
        ctx,
        data,
        serenity::GuildId::new(guild_id),
        &modal.user,
        label,
        reason.trim(),
    )
    .await;

    let followup = match result {
        Ok((_, channel_id)) => serenity::CreateInteractionResponseFollowup::new()
            .content(format!(
                "✅ Ticket created successfully! <#{}>",
                channel_id.get()
            ))
            .ephemeral(true),
        Err(err) => serenity::CreateInteractionResponseFollowup::new()
            .embed(error_embed(err.to_string()))
            .ephemeral(true),
    };
    modal.create_followup(&ctx.http, followup).await?;
    Ok(())
}

async fn handle_rename_modal(
    ctx: &serenity::Context,
    modal: &serenity::ModalInteraction,
    requested: &str,
) -> Result<(), Error> {
    let new_name = sanitize_channel_name(requested);
    if new_name.is_empty() {
        return modal_respond(
            ctx,
            modal,
            serenity::CreateInteractionResponseMessage::new()
                .embed(error_embed("Invalid channel name!"))
                .ephemeral(true),
        )
        .await;
    }

    match modal
        .channel_id
        .edit(&ctx.http, serenity::EditChannel::new().name(&new_name))
        .await
    {
        Ok(_) => {
            let embed = serenity::CreateEmbed::new()
                .title("✅ Channel Renamed")
                .description(format!(
                    "Channel renamed to `{new_name}` by <@{}>",
                    modal.user.id.get()
                ))
                .color(0x3BA55D);
            modal_respond(
                ctx,
                modal,
                serenity::CreateInteractionResponseMessage::new().embed(embed),
            )
            .await
        }
        Err(err) => {
            modal_respond(
                ctx,
                modal,
                serenity::CreateInteractionResponseMessage::new()
                    .embed(error_embed(format!("Failed to rename channel: {err}")))
                    .ephemeral(true),
            )
            .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_custom_id() {
        assert_eq!(
            parse_custom_id("ticket_open:123:Support"),
            Some(("ticket_open", 123, "Support"))
        );
        // Labels keep embedded colons
        assert_eq!(
            parse_custom_id("ticket_reason:123:Bug: weird"),
            Some(("ticket_reason", 123, "Bug: weird"))
        );
        assert_eq!(parse_custom_id("ticket_claim:9:12345"), Some(("ticket_claim", 9, "12345")));
        assert!(parse_custom_id("no_guild_part").is_none());
        assert!(parse_custom_id("action:notanumber:x").is_none());
    }
}
