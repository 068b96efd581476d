// Small shared embed helpers for the Discord layer.

use crate::core::config::{GuildConfig, DEFAULT_EMBED_COLOR};
use poise::serenity_prelude as serenity;

/// The guild's configured embed color, or the default purple.
pub fn guild_color(config: Option<&GuildConfig>) -> serenity::Colour {
    match config {
        Some(config) => serenity::Colour::new(config.color_value()),
        None => {
            let [r, g, b] = DEFAULT_EMBED_COLOR;
            serenity::Colour::from_rgb(r, g, b)
        }
    }
}

pub fn error_embed(message: impl Into<String>) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .description(format!("❌ {}", message.into()))
        .color(0xED4245)
}

/// Truncate on a char boundary; used for Discord field limits.
pub fn clamp(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}
