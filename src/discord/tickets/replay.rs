// Webhook message replay for reopened tickets.
//
// A temporary webhook re-sends archived messages with the original authors'
// names and avatars. Sends are paced with a fixed delay plus the sliding
// window limiter; if webhook creation is forbidden the first few messages
// are posted as plain code blocks instead.

use crate::core::replay::{ReplayLimiter, ReplayMessage};
use crate::discord::embeds::clamp;
use poise::serenity_prelude as serenity;
use std::time::Duration;
use tokio::time::sleep;

const SEND_DELAY: Duration = Duration::from_millis(700);
const FALLBACK_DELAY: Duration = Duration::from_secs(1);
const FALLBACK_LIMIT: usize = 10;

/// Replay archived messages into `channel_id`. Returns how many were sent.
pub async fn replay_messages(
    http: &serenity::Http,
    channel_id: serenity::ChannelId,
    messages: &[ReplayMessage],
    bot_user_id: u64,
) -> usize {
    let webhook = match channel_id
        .create_webhook(http, serenity::CreateWebhook::new("Ticket Message Replay"))
        .await
    {
        Ok(webhook) => webhook,
        Err(err) => {
            tracing::warn!("Could not create replay webhook: {err}");
            return fallback_replay(http, channel_id, messages).await;
        }
    };

    let mut limiter = ReplayLimiter::default();
    let mut sent = 0usize;

    for msg in messages {
        // Never replay the bot's own messages; that loops embeds forever.
        if msg.user_id == bot_user_id {
            continue;
        }

        limiter.wait_if_needed().await;

        // Best-effort avatar lookup; a deleted account just gets no avatar.
        let avatar_url = http
            .get_user(serenity::UserId::new(msg.user_id))
            .await
            .ok()
            .map(|user| user.face());

        let mut execute = serenity::ExecuteWebhook::new()
            .content(clamp(&msg.content, 2000))
            .username(clamp(&msg.display_name, 80));
        if let Some(url) = avatar_url {
            execute = execute.avatar_url(url);
        }

        match webhook.execute(http, false, execute).await {
            Ok(_) => {
                sent += 1;
                if sent % 10 == 0 {
                    tracing::debug!("Replayed {sent}/{} messages", messages.len());
                }
            }
            Err(err) => tracing::warn!("Failed to send replay message: {err}"),
        }

        sleep(SEND_DELAY).await;
    }

    if let Err(err) = webhook.delete(http).await {
        tracing::warn!("Failed to delete replay webhook: {err}");
    }

    tracing::info!("Replayed {sent}/{} archived messages", messages.len());
    sent
}

/// Plain-message fallback when webhooks are unavailable.
async fn fallback_replay(
    http: &serenity::Http,
    channel_id: serenity::ChannelId,
    messages: &[ReplayMessage],
) -> usize {
    let mut sent = 0usize;
    for msg in messages.iter().take(FALLBACK_LIMIT) {
        let formatted = format!(
            "```{}: {}```",
            clamp(&msg.display_name, 80),
            clamp(&msg.content, 1850)
        );
        match channel_id.say(http, formatted).await {
            Ok(_) => sent += 1,
            Err(err) => {
                tracing::warn!("Fallback replay failed: {err}");
                break;
            }
        }
        sleep(FALLBACK_DELAY).await;
    }
    sent
}
