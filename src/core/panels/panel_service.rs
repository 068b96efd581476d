// Panel service - persistent ticket-creation panels.
//
// A panel is a message with up to five buttons; pressing one opens a ticket
// with that button's label as the category. Panels are keyed by message id
// so button handlers can survive restarts, and records whose message has
// been deleted are pruned at startup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discord caps button labels at 80 chars; we trim to 45 so a full row of
/// five stays readable.
pub const MAX_BUTTON_LABEL: usize = 45;
pub const MAX_PANEL_BUTTONS: usize = 5;

#[derive(Debug, Error)]
pub enum PanelError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("A panel needs between 1 and {MAX_PANEL_BUTTONS} button labels")]
    BadButtonCount,
}

/// A persisted ticket panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Panel {
    pub message_id: u64,
    pub channel_id: u64,
    pub button_labels: Vec<String>,
    pub created_by: u64,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait PanelStore: Send + Sync {
    async fn all_panels(&self, guild_id: u64) -> Result<Vec<Panel>, PanelError>;
    async fn save_panel(&self, guild_id: u64, panel: Panel) -> Result<(), PanelError>;
    async fn delete_panel(&self, guild_id: u64, message_id: u64) -> Result<bool, PanelError>;
}

/// Validate and normalize button labels: non-empty, at most five,
/// truncated to the label limit.
pub fn normalize_labels(labels: &[String]) -> Result<Vec<String>, PanelError> {
    let labels: Vec<String> = labels
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(|l| l.chars().take(MAX_BUTTON_LABEL).collect())
        .collect();

    if labels.is_empty() || labels.len() > MAX_PANEL_BUTTONS {
        return Err(PanelError::BadButtonCount);
    }
    Ok(labels)
}

pub struct PanelService<S: PanelStore> {
    store: S,
}

impl<S: PanelStore> PanelService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn register(
        &self,
        guild_id: u64,
        message_id: u64,
        channel_id: u64,
        button_labels: Vec<String>,
        created_by: u64,
    ) -> Result<Panel, PanelError> {
        let panel = Panel {
            message_id,
            channel_id,
            button_labels: normalize_labels(&button_labels)?,
            created_by,
            created_at: Utc::now(),
        };
        self.store.save_panel(guild_id, panel.clone()).await?;
        Ok(panel)
    }

    pub async fn panels(&self, guild_id: u64) -> Result<Vec<Panel>, PanelError> {
        self.store.all_panels(guild_id).await
    }

    /// Drop the record for a panel whose message no longer exists.
    pub async fn prune(&self, guild_id: u64, message_id: u64) -> Result<bool, PanelError> {
        self.store.delete_panel(guild_id, message_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    struct MockPanelStore {
        panels: DashMap<u64, Vec<Panel>>,
    }

    impl MockPanelStore {
        fn new() -> Self {
            Self {
                panels: DashMap::new(),
            }
        }
    }

    #[async_trait]
    impl PanelStore for MockPanelStore {
        async fn all_panels(&self, guild_id: u64) -> Result<Vec<Panel>, PanelError> {
            Ok(self
                .panels
                .get(&guild_id)
                .map(|v| v.clone())
                .unwrap_or_default())
        }

        async fn save_panel(&self, guild_id: u64, panel: Panel) -> Result<(), PanelError> {
            self.panels.entry(guild_id).or_default().push(panel);
            Ok(())
        }

        async fn delete_panel(&self, guild_id: u64, message_id: u64) -> Result<bool, PanelError> {
            let mut guild = self.panels.entry(guild_id).or_default();
            let before = guild.len();
            guild.retain(|p| p.message_id != message_id);
            Ok(guild.len() < before)
        }
    }

    #[tokio::test]
    async fn test_register_and_prune() {
        let service = PanelService::new(MockPanelStore::new());

        let panel = service
            .register(1, 100, 200, vec!["Support".into(), "Billing".into()], 9)
            .await
            .unwrap();
        assert_eq!(panel.button_labels, vec!["Support", "Billing"]);
        assert_eq!(service.panels(1).await.unwrap().len(), 1);

        assert!(service.prune(1, 100).await.unwrap());
        assert!(!service.prune(1, 100).await.unwrap());
        assert!(service.panels(1).await.unwrap().is_empty());
    }

    #[test]
    fn test_label_normalization() {
        let labels = normalize_labels(&[
            "  Support  ".to_string(),
            "".to_string(),
            "x".repeat(60),
        ])
        .unwrap();
        assert_eq!(labels[0], "Support");
        assert_eq!(labels[1].len(), MAX_BUTTON_LABEL);

        assert!(normalize_labels(&[]).is_err());
        let too_many: Vec<String> = (0..6).map(|i| format!("b{i}")).collect();
        assert!(normalize_labels(&too_many).is_err());
    }
}
