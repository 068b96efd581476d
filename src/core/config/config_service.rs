// Guild configuration service - per-server settings for the ticket system.
//
// NO Discord dependencies here; channel/role ids are plain u64s and the
// Discord layer is responsible for validating that they exist.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default purple, as an RGB triple.
pub const DEFAULT_EMBED_COLOR: [u8; 3] = [128, 0, 255];

pub const DEFAULT_WELCOME_MESSAGE: &str = "**Welcome {user}!** 👋\n\n\
    Thank you for creating a ticket. Our support team will be with you shortly.\n\
    Please provide any additional details about your issue while you wait.";

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("This server is not configured yet")]
    NotConfigured,

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

// ============================================================================
// MODEL
// ============================================================================

/// Per-guild configuration, created by `/setup`. One JSON file per guild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildConfig {
    pub guild_id: u64,
    pub ticket_category_id: u64,
    pub log_channel_id: u64,
    pub staff_role_ids: Vec<u64>,
    pub embed_color: [u8; 3],
    pub welcome_message: String,
    /// 0 disables the auto-close sweep for this guild.
    pub auto_close_hours: u64,
    pub max_tickets_per_user: usize,
    pub send_transcript_to_user: bool,
    pub setup_by: u64,
    pub setup_at: DateTime<Utc>,
}

impl GuildConfig {
    pub fn new(
        guild_id: u64,
        ticket_category_id: u64,
        log_channel_id: u64,
        staff_role_ids: Vec<u64>,
        setup_by: u64,
    ) -> Self {
        Self {
            guild_id,
            ticket_category_id,
            log_channel_id,
            staff_role_ids,
            embed_color: DEFAULT_EMBED_COLOR,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            auto_close_hours: 72,
            max_tickets_per_user: 3,
            send_transcript_to_user: true,
            setup_by,
            setup_at: Utc::now(),
        }
    }

    /// Whether any of the member's roles is a configured staff role.
    pub fn is_staff(&self, member_role_ids: &[u64]) -> bool {
        member_role_ids.iter().any(|r| self.staff_role_ids.contains(r))
    }

    /// Render the welcome template, substituting the `{user}` placeholder.
    pub fn render_welcome(&self, user_mention: &str) -> String {
        self.welcome_message.replace("{user}", user_mention)
    }

    /// Embed color packed as 0xRRGGBB for serenity.
    pub fn color_value(&self) -> u32 {
        let [r, g, b] = self.embed_color;
        ((r as u32) << 16) | ((g as u32) << 8) | b as u32
    }
}

/// Parse `#RRGGBB` (leading `#` optional) into an RGB triple.
pub fn parse_hex_color(input: &str) -> Result<[u8; 3], ConfigError> {
    let hex = input.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(ConfigError::InvalidValue(format!(
            "expected a 6-digit hex color, got `{}`",
            input
        )));
    }
    let parse = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&hex[range], 16)
            .map_err(|_| ConfigError::InvalidValue(format!("`{}` is not a hex color", input)))
    };
    Ok([parse(0..2)?, parse(2..4)?, parse(4..6)?])
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get_config(&self, guild_id: u64) -> Result<Option<GuildConfig>, ConfigError>;
    async fn save_config(&self, config: GuildConfig) -> Result<(), ConfigError>;
    /// Every guild with a stored config; drives the auto-close sweep.
    async fn guild_ids(&self) -> Result<Vec<u64>, ConfigError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct GuildConfigService<S: ConfigStore> {
    store: S,
}

impl<S: ConfigStore> GuildConfigService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn get(&self, guild_id: u64) -> Result<GuildConfig, ConfigError> {
        self.store
            .get_config(guild_id)
            .await?
            .ok_or(ConfigError::NotConfigured)
    }

    pub async fn is_configured(&self, guild_id: u64) -> Result<bool, ConfigError> {
        Ok(self.store.get_config(guild_id).await?.is_some())
    }

    pub async fn save(&self, config: GuildConfig) -> Result<(), ConfigError> {
        self.store.save_config(config).await
    }

    pub async fn set_auto_close_hours(
        &self,
        guild_id: u64,
        hours: u64,
    ) -> Result<(), ConfigError> {
        let mut config = self.get(guild_id).await?;
        config.auto_close_hours = hours;
        self.store.save_config(config).await
    }

    pub async fn set_max_tickets(&self, guild_id: u64, max: usize) -> Result<(), ConfigError> {
        if !(1..=10).contains(&max) {
            return Err(ConfigError::InvalidValue(
                "max tickets per user must be between 1 and 10".to_string(),
            ));
        }
        let mut config = self.get(guild_id).await?;
        config.max_tickets_per_user = max;
        self.store.save_config(config).await
    }

    pub async fn set_welcome_message(
        &self,
        guild_id: u64,
        message: &str,
    ) -> Result<(), ConfigError> {
        let mut config = self.get(guild_id).await?;
        config.welcome_message = message.to_string();
        self.store.save_config(config).await
    }

    pub async fn set_embed_color(
        &self,
        guild_id: u64,
        color: [u8; 3],
    ) -> Result<(), ConfigError> {
        let mut config = self.get(guild_id).await?;
        config.embed_color = color;
        self.store.save_config(config).await
    }

    /// Flip transcript-to-user delivery; returns the new setting.
    pub async fn toggle_transcript_delivery(&self, guild_id: u64) -> Result<bool, ConfigError> {
        let mut config = self.get(guild_id).await?;
        config.send_transcript_to_user = !config.send_transcript_to_user;
        let new_setting = config.send_transcript_to_user;
        self.store.save_config(config).await?;
        Ok(new_setting)
    }

    pub async fn set_transcript_delivery(
        &self,
        guild_id: u64,
        enabled: bool,
    ) -> Result<(), ConfigError> {
        let mut config = self.get(guild_id).await?;
        config.send_transcript_to_user = enabled;
        self.store.save_config(config).await
    }

    pub async fn guild_ids(&self) -> Result<Vec<u64>, ConfigError> {
        self.store.guild_ids().await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    struct MockConfigStore {
        configs: DashMap<u64, GuildConfig>,
    }

    impl MockConfigStore {
        fn new() -> Self {
            Self {
                configs: DashMap::new(),
            }
        }
    }

    #[async_trait]
    impl ConfigStore for MockConfigStore {
        async fn get_config(&self, guild_id: u64) -> Result<Option<GuildConfig>, ConfigError> {
            Ok(self.configs.get(&guild_id).map(|c| c.clone()))
        }

        async fn save_config(&self, config: GuildConfig) -> Result<(), ConfigError> {
            self.configs.insert(config.guild_id, config);
            Ok(())
        }

        async fn guild_ids(&self) -> Result<Vec<u64>, ConfigError> {
            Ok(self.configs.iter().map(|e| *e.key()).collect())
        }
    }

    #[tokio::test]
    async fn test_unconfigured_guild_is_rejected() {
        let service = GuildConfigService::new(MockConfigStore::new());
        assert!(matches!(
            service.get(1).await.unwrap_err(),
            ConfigError::NotConfigured
        ));
        assert!(!service.is_configured(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_setup_defaults() {
        let service = GuildConfigService::new(MockConfigStore::new());
        service
            .save(GuildConfig::new(1, 10, 20, vec![30], 99))
            .await
            .unwrap();

        let config = service.get(1).await.unwrap();
        assert_eq!(config.embed_color, DEFAULT_EMBED_COLOR);
        assert_eq!(config.auto_close_hours, 72);
        assert_eq!(config.max_tickets_per_user, 3);
        assert!(config.send_transcript_to_user);
        assert!(config.is_staff(&[30, 31]));
        assert!(!config.is_staff(&[31]));
    }

    #[tokio::test]
    async fn test_max_tickets_bounds() {
        let service = GuildConfigService::new(MockConfigStore::new());
        service
            .save(GuildConfig::new(1, 10, 20, vec![30], 99))
            .await
            .unwrap();

        assert!(service.set_max_tickets(1, 0).await.is_err());
        assert!(service.set_max_tickets(1, 11).await.is_err());
        service.set_max_tickets(1, 5).await.unwrap();
        assert_eq!(service.get(1).await.unwrap().max_tickets_per_user, 5);
    }

    #[tokio::test]
    async fn test_transcript_toggle() {
        let service = GuildConfigService::new(MockConfigStore::new());
        service
            .save(GuildConfig::new(1, 10, 20, vec![30], 99))
            .await
            .unwrap();

        assert!(!service.toggle_transcript_delivery(1).await.unwrap());
        assert!(service.toggle_transcript_delivery(1).await.unwrap());
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FF5733").unwrap(), [0xFF, 0x57, 0x33]);
        assert_eq!(parse_hex_color("ff5733").unwrap(), [0xFF, 0x57, 0x33]);
        assert!(parse_hex_color("#FFF").is_err());
        assert!(parse_hex_color("#GGGGGG").is_err());
        // six bytes but not six ASCII digits
        assert!(parse_hex_color("ééé").is_err());
    }

    #[test]
    fn test_color_value_and_welcome_render() {
        let mut config = GuildConfig::new(1, 10, 20, vec![30], 99);
        config.embed_color = [0x12, 0x34, 0x56];
        assert_eq!(config.color_value(), 0x123456);

        config.welcome_message = "Hello {user}, welcome!".to_string();
        assert_eq!(config.render_welcome("<@7>"), "Hello <@7>, welcome!");
    }
}
