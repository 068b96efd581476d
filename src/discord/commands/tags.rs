// Canned-response tag commands.
//
// Staff manage the tags; anyone can post one into a channel with
// `/tag show`, which is what makes them useful inside tickets.

use crate::core::tags::TagError;
use crate::discord::commands::tickets::{
    author_role_ids, config_or_reply, reply_error, Context, Error,
};
use crate::discord::embeds::{clamp, guild_color};
use poise::serenity_prelude as serenity;

/// Canned responses for common support questions.
#[poise::command(
    slash_command,
    guild_only,
    subcommands("set", "show", "delete", "list")
)]
pub async fn tag(_ctx: Context<'_>) -> Result<(), Error> {
    Ok(())
}

/// Create or update a tag.
#[poise::command(slash_command, guild_only)]
pub async fn set(
    ctx: Context<'_>,
    #[description = "Tag name"] name: String,
    #[description = "Response body"] body: String,
) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    if !config.is_staff(&author_role_ids(ctx).await) {
        return reply_error(ctx, "Only staff members can manage tags.").await;
    }
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let tag = match ctx
        .data()
        .tags
        .set(guild_id.get(), &name, &body, ctx.author().id.get())
        .await
    {
        Ok(tag) => tag,
        Err(TagError::InvalidName(reason)) => return reply_error(ctx, reason).await,
        Err(err) => return Err(err.into()),
    };

    let embed = serenity::CreateEmbed::new()
        .title("✅ Tag Saved")
        .description(format!("Tag `{}` is ready to use with `/tag show`.", tag.name))
        .color(guild_color(Some(&config)))
        .field("Body", format!("```{}```", clamp(&tag.body, 500)), false);
    ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true))
        .await?;
    Ok(())
}

/// Post a tag's response in this channel.
#[poise::command(slash_command, guild_only)]
pub async fn show(
    ctx: Context<'_>,
    #[description = "Tag name"] name: String,
) -> Result<(), Error> {
    let Some(_config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    match ctx.data().tags.get(guild_id.get(), &name).await {
        Ok(tag) => {
            ctx.say(tag.body).await?;
            Ok(())
        }
        Err(TagError::NotFound(name)) => {
            reply_error(ctx, format!("No tag named `{name}`. See `/tag list`.")).await
        }
        Err(TagError::InvalidName(reason)) => reply_error(ctx, reason).await,
        Err(err) => Err(err.into()),
    }
}

/// Delete a tag.
#[poise::command(slash_command, guild_only)]
pub async fn delete(
    ctx: Context<'_>,
    #[description = "Tag name"] name: String,
) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    if !config.is_staff(&author_role_ids(ctx).await) {
        return reply_error(ctx, "Only staff members can manage tags.").await;
    }
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    match ctx.data().tags.delete(guild_id.get(), &name).await {
        Ok(()) => {
            ctx.say(format!("✅ Tag `{}` deleted.", name.to_lowercase()))
                .await?;
            Ok(())
        }
        Err(TagError::NotFound(name)) => {
            reply_error(ctx, format!("No tag named `{name}`.")).await
        }
        Err(TagError::InvalidName(reason)) => reply_error(ctx, reason).await,
        Err(err) => Err(err.into()),
    }
}

/// List this server's tags.
#[poise::command(slash_command, guild_only)]
pub async fn list(ctx: Context<'_>) -> Result<(), Error> {
    let Some(config) = config_or_reply(ctx).await? else {
        return Ok(());
    };
    let guild_id = ctx.guild_id().ok_or("This command only works in servers")?;

    let tags = ctx.data().tags.list(guild_id.get()).await?;
    if tags.is_empty() {
        ctx.say("No tags configured yet. Staff can add one with `/tag set`.")
            .await?;
        return Ok(());
    }

    let names: Vec<String> = tags.iter().map(|t| format!("`{}`", t.name)).collect();
    let embed = serenity::CreateEmbed::new()
        .title("🏷️ Server Tags")
        .description(names.join(", "))
        .color(guild_color(Some(&config)))
        .footer(serenity::CreateEmbedFooter::new(format!(
            "{} tags • use /tag show <name>",
            tags.len()
        )));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}
