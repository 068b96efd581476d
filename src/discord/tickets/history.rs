// Channel history capture - walks a ticket channel's full message history
// and converts it into transcript records for the renderers.

use crate::core::transcript::{
    TranscriptAttachment, TranscriptAuthor, TranscriptEmbed, TranscriptEmbedField,
    TranscriptMessage,
};
use chrono::{DateTime, Utc};
use poise::serenity_prelude as serenity;

/// Fetch the entire history of a channel, oldest first. Serenity pages at
/// 100 messages per request, so walk backwards and reverse at the end.
pub async fn capture_channel_history(
    http: &serenity::Http,
    channel_id: serenity::ChannelId,
) -> Result<Vec<TranscriptMessage>, serenity::Error> {
    let mut messages: Vec<serenity::Message> = Vec::new();
    let mut before: Option<serenity::MessageId> = None;

    loop {
        let mut request = serenity::GetMessages::new().limit(100);
        if let Some(marker) = before {
            request = request.before(marker);
        }

        let batch = channel_id.messages(http, request).await?;
        if batch.is_empty() {
            break;
        }
        before = batch.last().map(|m| m.id);
        messages.extend(batch);
    }

    messages.reverse();
    Ok(messages.iter().map(to_transcript_message).collect())
}

fn to_transcript_message(msg: &serenity::Message) -> TranscriptMessage {
    TranscriptMessage {
        id: msg.id.get(),
        author: TranscriptAuthor {
            id: msg.author.id.get(),
            username: msg.author.name.clone(),
            display_name: msg.author.display_name().to_string(),
            avatar_url: msg.author.face(),
            bot: msg.author.bot,
        },
        content: msg.content.clone(),
        timestamp: to_utc(msg.timestamp),
        embeds: msg.embeds.iter().map(to_transcript_embed).collect(),
        attachments: msg
            .attachments
            .iter()
            .map(|a| TranscriptAttachment {
                filename: a.filename.clone(),
                url: a.url.clone(),
                size_bytes: a.size as u64,
            })
            .collect(),
    }
}

fn to_transcript_embed(embed: &serenity::Embed) -> TranscriptEmbed {
    TranscriptEmbed {
        title: embed.title.clone(),
        description: embed.description.clone(),
        color: embed.colour.map(|c| c.0),
        fields: embed
            .fields
            .iter()
            .map(|f| TranscriptEmbedField {
                name: f.name.clone(),
                value: f.value.clone(),
                inline: f.inline,
            })
            .collect(),
        footer: embed.footer.as_ref().map(|f| f.text.clone()),
        thumbnail: embed.thumbnail.as_ref().map(|t| t.url.clone()),
        image: embed.image.as_ref().map(|i| i.url.clone()),
    }
}

fn to_utc(timestamp: serenity::Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), 0).unwrap_or_else(Utc::now)
}
