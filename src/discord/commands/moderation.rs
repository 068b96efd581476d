// Staff moderation commands: ticket blacklist and user warnings.

use crate::core::moderation::ModerationError;
use crate::discord::commands::tickets::{
    author_role_ids, config_or_reply, reply_error, Context, Error,
};
use crate::discord::embeds::{clamp, guild_color};
use poise::serenity_prelude as serenity;
use poise::serenity_prelude::Mentionable;

/// Block a user from creating tickets.
#[poise::command(slash_command, guild_only)]
pub async fn blacklist(
    ctx: Context<'_>,
    #[description = "User to blacklist"] user: serenity::User,
) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    if !config.is_staff(&author_role_ids(ctx).await) {
        return reply_error(ctx, "Only staff members can use this command.").await;
    }
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    match ctx
        .data()
        .moderation
        .blacklist_user(guild_id.get(), user.id.get())
        .await
    {
        Ok(()) => {}
        Err(ModerationError::AlreadyBlacklisted) => {
            return reply_error(ctx, format!("{} is already blacklisted.", user.mention())).await;
        }
        Err(err) => return Err(err.into()),
    }

    let embed = serenity::CreateEmbed::new()
        .title("🚫 User Blacklisted")
        .description(format!(
            "{} has been blacklisted from creating tickets.",
            user.mention()
        ))
        .color(guild_color(Some(&config)))
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Blacklisted by {}",
            ctx.author().name
        )));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Remove a user from the ticket blacklist.
#[poise::command(slash_command, guild_only)]
pub async fn unblacklist(
    ctx: Context<'_>,
    #[description = "User to unblacklist"] user: serenity::User,
) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    if !config.is_staff(&author_role_ids(ctx).await) {
        return reply_error(ctx, "Only staff members can use this command.").await;
    }
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    match ctx
        .data()
        .moderation
        .unblacklist_user(guild_id.get(), user.id.get())
        .await
    {
        Ok(()) => {}
        Err(ModerationError::NotBlacklisted) => {
            return reply_error(ctx, format!("{} is not blacklisted.", user.mention())).await;
        }
        Err(err) => return Err(err.into()),
    }

    let embed = serenity::CreateEmbed::new()
        .title("✅ User Unblacklisted")
        .description(format!(
            "{} has been removed from the blacklist.",
            user.mention()
        ))
        .color(guild_color(Some(&config)))
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Unblacklisted by {}",
            ctx.author().name
        )));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// Issue a warning to a user.
#[poise::command(slash_command, guild_only)]
pub async fn warn(
    ctx: Context<'_>,
    #[description = "User to warn"] user: serenity::User,
    #[description = "Reason for the warning"] reason: String,
) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    if !config.is_staff(&author_role_ids(ctx).await) {
        return reply_error(ctx, "Only staff members can use this command.").await;
    }
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let count = ctx
        .data()
        .moderation
        .warn(guild_id.get(), user.id.get(), ctx.author().id.get(), &reason)
        .await?;

    let embed = serenity::CreateEmbed::new()
        .title("⚠️ User Warned")
        .description(format!(
            "{} has been warned by {}",
            user.mention(),
            ctx.author().mention()
        ))
        .color(0xE67E22)
        .field("Reason", format!("```{}```", clamp(&reason, 500)), false)
        .field("Total Warnings", count.to_string(), true);
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

/// List the warnings issued to a user.
#[poise::command(slash_command, guild_only)]
pub async fn warnings(
    ctx: Context<'_>,
    #[description = "User to look up"] user: serenity::User,
) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    if !config.is_staff(&author_role_ids(ctx).await) {
        return reply_error(ctx, "Only staff members can use this command.").await;
    }
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let warnings = ctx
        .data()
        .moderation
        .warnings_for(guild_id.get(), user.id.get())
        .await?;

    if warnings.is_empty() {
        ctx.say(format!("{} has no warnings.", user.mention())).await?;
        return Ok(());
    }

    let shown = warnings.len().min(10);
    let mut embed = serenity::CreateEmbed::new()
        .title(format!("⚠️ Warnings for {}", user.name))
        .color(guild_color(Some(&config)))
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Showing {shown} of {} warnings",
            warnings.len()
        )));

    for warning in warnings.iter().rev().take(10).rev() {
        embed = embed.field(
            format!("• {}", warning.timestamp.format("%Y-%m-%d %H:%M")),
            format!(
                "```{}```by <@{}>",
                clamp(&warning.reason, 150),
                warning.moderator_id
            ),
            false,
        );
    }

    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}
