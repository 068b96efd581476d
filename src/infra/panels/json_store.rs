// JSON-backed panel store. One file per guild, a map of panel message id
// to panel record.

use crate::core::panels::{Panel, PanelError, PanelStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub struct JsonPanelStore {
    dir: PathBuf,
    cache: RwLock<HashMap<u64, HashMap<u64, Panel>>>,
}

impl JsonPanelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).expect("Failed to create panels directory");
        Self {
            dir,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn guild_path(&self, guild_id: u64) -> PathBuf {
        self.dir.join(format!("{guild_id}.json"))
    }

    async fn ensure_loaded(&self, guild_id: u64) -> Result<(), PanelError> {
        {
            let cache = self.cache.read().await;
            if cache.contains_key(&guild_id) {
                return Ok(());
            }
        }

        let path = self.guild_path(guild_id);
        let panels: HashMap<u64, Panel> = if path.exists() {
            let file = File::open(&path).map_err(|e| PanelError::StorageError(e.to_string()))?;
            serde_json::from_reader(BufReader::new(file)).unwrap_or_default()
        } else {
            HashMap::new()
        };

        self.cache.write().await.insert(guild_id, panels);
        Ok(())
    }

    async fn persist(&self, guild_id: u64) -> Result<(), PanelError> {
        let cache = self.cache.read().await;
        let panels = cache.get(&guild_id).cloned().unwrap_or_default();
        drop(cache);

        let file = File::create(self.guild_path(guild_id))
            .map_err(|e| PanelError::StorageError(e.to_string()))?;
        serde_json::to_writer_pretty(file, &panels)
            .map_err(|e| PanelError::StorageError(e.to_string()))
    }
}

#[async_trait]
impl PanelStore for JsonPanelStore {
    async fn all_panels(&self, guild_id: u64) -> Result<Vec<Panel>, PanelError> {
        self.ensure_loaded(guild_id).await?;
        let cache = self.cache.read().await;
        Ok(cache
            .get(&guild_id)
            .map(|p| p.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn save_panel(&self, guild_id: u64, panel: Panel) -> Result<(), PanelError> {
        self.ensure_loaded(guild_id).await?;
        {
            let mut cache = self.cache.write().await;
            cache
                .entry(guild_id)
                .or_default()
                .insert(panel.message_id, panel);
        }
        self.persist(guild_id).await
    }

    async fn delete_panel(&self, guild_id: u64, message_id: u64) -> Result<bool, PanelError> {
        self.ensure_loaded(guild_id).await?;
        let removed = {
            let mut cache = self.cache.write().await;
            cache
                .entry(guild_id)
                .or_default()
                .remove(&message_id)
                .is_some()
        };
        if removed {
            self.persist(guild_id).await?;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::panels::PanelService;

    #[tokio::test]
    async fn test_panel_roundtrip_and_prune() {
        let dir = tempfile::tempdir().unwrap();

        let service = PanelService::new(JsonPanelStore::new(dir.path()));
        service
            .register(7, 100, 200, vec!["Support".into()], 99)
            .await
            .unwrap();

        let service2 = PanelService::new(JsonPanelStore::new(dir.path()));
        let panels = service2.panels(7).await.unwrap();
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].button_labels, vec!["Support"]);

        assert!(service2.prune(7, 100).await.unwrap());
        let service3 = PanelService::new(JsonPanelStore::new(dir.path()));
        assert!(service3.panels(7).await.unwrap().is_empty());
    }
}
