// This is the entry point of the ticket bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (JSON stores)
// - `discord/` = Discord-specific adapters (commands, buttons, flows)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Spawn the background tasks (auto-close sweep, startup restoration)

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::config::GuildConfigService;
use crate::core::moderation::ModerationService;
use crate::core::panels::PanelService;
use crate::core::tags::TagService;
use crate::core::tickets::TicketService;
use crate::discord::embeds::error_embed;
use crate::discord::interactions;
use crate::discord::{Data, Error};
use crate::infra::config::JsonConfigStore;
use crate::infra::moderation::JsonModerationStore;
use crate::infra::panels::JsonPanelStore;
use crate::infra::tags::JsonTagStore;
use crate::infra::tickets::JsonTicketStore;
use chrono::Utc;
use poise::serenity_prelude as serenity;
use std::path::PathBuf;
use std::sync::Arc;

/// Event handler for non-command Discord events.
/// Buttons and modals arrive here as interactions.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::InteractionCreate { interaction } = event {
        if let Err(err) = interactions::handle_interaction(ctx, interaction, data).await {
            tracing::error!("Error handling interaction: {err}");
        }
    }
    Ok(())
}

/// Walk every configured guild on startup: count open tickets (their
/// buttons keep working through custom-id dispatch) and prune panel
/// records whose message has been deleted.
async fn restore_guild_state(ctx: &serenity::Context, data: &Data) {
    let guild_ids = match data.config.guild_ids().await {
        Ok(ids) => ids,
        Err(err) => {
            tracing::error!("Could not list configured guilds: {err}");
            return;
        }
    };

    let mut open_tickets = 0usize;
    let mut live_panels = 0usize;

    for guild_id in guild_ids {
        match data.tickets.stats(guild_id).await {
            Ok(stats) => open_tickets += stats.open,
            Err(err) => tracing::warn!(guild_id, "Could not read tickets: {err}"),
        }

        let panels = match data.panels.panels(guild_id).await {
            Ok(panels) => panels,
            Err(err) => {
                tracing::warn!(guild_id, "Could not read panels: {err}");
                continue;
            }
        };

        for panel in panels {
            let channel_id = serenity::ChannelId::new(panel.channel_id);
            let message_id = serenity::MessageId::new(panel.message_id);
            match ctx.http.get_message(channel_id, message_id).await {
                Ok(_) => live_panels += 1,
                Err(_) => {
                    // Message is gone; drop the stale record.
                    match data.panels.prune(guild_id, panel.message_id).await {
                        Ok(_) => tracing::info!(
                            guild_id,
                            message_id = panel.message_id,
                            "Pruned deleted panel"
                        ),
                        Err(err) => tracing::warn!(guild_id, "Could not prune panel: {err}"),
                    }
                }
            }
        }
    }

    tracing::info!("Watching {open_tickets} open tickets across configured guilds");
    tracing::info!("Restored {live_panels} ticket panels");
}

/// Hourly sweep that closes tickets older than each guild's configured age.
/// Auto-closed tickets are not archived; the channel is simply removed
/// after a short notice, matching staff expectations for stale tickets.
async fn auto_close_sweep(ctx: serenity::Context, data: Data) {
    use std::time::Duration;
    use tokio::time::sleep;

    let bot_id = ctx.cache.current_user().id.get();

    loop {
        tracing::debug!("Starting auto-close sweep...");

        let guild_ids = data.config.guild_ids().await.unwrap_or_default();
        for guild_id in guild_ids {
            let config = match data.config.get(guild_id).await {
                Ok(config) => config,
                Err(_) => continue,
            };
            if config.auto_close_hours == 0 {
                continue;
            }

            let candidates = match data
                .tickets
                .auto_close_candidates(guild_id, config.auto_close_hours, Utc::now())
                .await
            {
                Ok(candidates) => candidates,
                Err(err) => {
                    tracing::warn!(guild_id, "Auto-close scan failed: {err}");
                    continue;
                }
            };

            for ticket in candidates {
                let channel_id = serenity::ChannelId::new(ticket.channel_id);
                let notice = serenity::CreateEmbed::new()
                    .title("🕐 Auto-Close Notice")
                    .description(format!(
                        "This ticket has been automatically closed due to inactivity ({} hours).",
                        config.auto_close_hours
                    ))
                    .color(0xE67E22);

                // A missing channel means the ticket record is stale; still
                // mark it closed so it stops matching every sweep.
                let channel_ok = channel_id
                    .send_message(&ctx.http, serenity::CreateMessage::new().embed(notice))
                    .await
                    .is_ok();
                if channel_ok {
                    sleep(Duration::from_secs(5)).await;
                }

                match data.tickets.close(guild_id, ticket.id, bot_id, true).await {
                    Ok(_) => {
                        tracing::info!(guild_id, ticket_id = ticket.id, "Ticket auto-closed")
                    }
                    Err(err) => {
                        tracing::warn!(guild_id, ticket_id = ticket.id, "Auto-close failed: {err}");
                        continue;
                    }
                }

                if channel_ok {
                    if let Err(err) = channel_id.delete(&ctx.http).await {
                        tracing::warn!("Could not delete auto-closed channel: {err}");
                    }
                }
            }
        }

        tracing::debug!("Auto-close sweep completed");
        sleep(Duration::from_secs(60 * 60)).await;
    }
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            tracing::error!("Command `{}` failed: {error}", ctx.command().name);
            let _ = ctx
                .send(
                    poise::CreateReply::default()
                        .embed(error_embed(
                            "An unexpected error occurred. Please try again or contact support.",
                        ))
                        .ephemeral(true),
                )
                .await;
        }
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            let _ = ctx
                .send(
                    poise::CreateReply::default()
                        .embed(error_embed(
                            "You don't have the required permissions to use this command.",
                        ))
                        .ephemeral(true),
                )
                .await;
        }
        other => {
            if let Err(err) = poise::builtins::on_error(other).await {
                tracing::error!("Error while handling error: {err}");
            }
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Get Discord bot token from environment
    let token = std::env::var("DISCORD_TOKEN").expect(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    );

    // Keep all per-guild JSON files in one dedicated folder.
    let data_dir =
        PathBuf::from(std::env::var("TICKET_DATA_DIR").unwrap_or_else(|_| "data".to_string()));
    std::fs::create_dir_all(&data_dir).expect("Failed to create data directory");

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their stores injected.
    // This is the "composition root" where we wire everything together.

    let ticket_service = Arc::new(TicketService::new(JsonTicketStore::new(
        data_dir.join("tickets"),
    )));
    let config_service = Arc::new(GuildConfigService::new(JsonConfigStore::new(
        data_dir.join("configs"),
    )));
    let moderation_service = Arc::new(ModerationService::new(JsonModerationStore::new(
        data_dir.join("blacklists"),
        data_dir.join("warnings"),
    )));
    let tag_service = Arc::new(TagService::new(JsonTagStore::new(data_dir.join("tags"))));
    let panel_service = Arc::new(PanelService::new(JsonPanelStore::new(
        data_dir.join("panels"),
    )));

    // Create the data structure that will be shared across all commands
    let data = Data {
        tickets: Arc::clone(&ticket_service),
        config: Arc::clone(&config_service),
        moderation: Arc::clone(&moderation_service),
        tags: Arc::clone(&tag_service),
        panels: Arc::clone(&panel_service),
        data_dir: data_dir.clone(),
        started_at: std::time::Instant::now(),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================
    // Configure the poise framework with our commands and settings.

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            // Register all our commands here
            commands: vec![
                discord::commands::tickets::close(),
                discord::commands::tickets::priority(),
                discord::commands::tickets::note(),
                discord::commands::tickets::add(),
                discord::commands::tickets::remove(),
                discord::commands::tickets::reopen(),
                discord::commands::tickets::ticketstats(),
                discord::commands::admin::setup(),
                discord::commands::admin::config(),
                discord::commands::admin::panel(),
                discord::commands::admin::setcolor(),
                discord::commands::admin::welcome(),
                discord::commands::admin::transcripttoggle(),
                discord::commands::moderation::blacklist(),
                discord::commands::moderation::unblacklist(),
                discord::commands::moderation::warn(),
                discord::commands::moderation::warnings(),
                discord::commands::tags::tag(),
                discord::commands::info::ping(),
                discord::commands::info::stats(),
                discord::commands::info::help(),
            ],
            // Event handler for buttons and modals
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Ticket bot is starting up...");

                // Register slash commands globally (can take up to an hour to propagate)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered");

                // Re-check persisted state now that the gateway is up:
                // open-ticket counts and stale panel records.
                restore_guild_state(ctx, &data).await;

                // Background auto-close sweep. Runs every hour.
                let sweep_ctx = ctx.clone();
                let sweep_data = data.clone();
                tokio::spawn(async move {
                    auto_close_sweep(sweep_ctx, sweep_data).await;
                });

                tracing::info!("Ticket bot is ready");
                Ok(data)
            })
        })
        .build();

    // Create the client and start the bot
    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
