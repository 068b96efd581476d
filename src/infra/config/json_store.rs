// JSON-backed guild config store. One file per guild under the configs
// directory; the set of files doubles as the "configured guilds" index
// that drives the auto-close sweep and startup restoration.

use crate::core::config::{ConfigError, ConfigStore, GuildConfig};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub struct JsonConfigStore {
    dir: PathBuf,
    cache: RwLock<HashMap<u64, Option<GuildConfig>>>,
}

impl JsonConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).expect("Failed to create configs directory");
        Self {
            dir,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn guild_path(&self, guild_id: u64) -> PathBuf {
        self.dir.join(format!("{guild_id}.json"))
    }

    fn read_from_disk(&self, guild_id: u64) -> Result<Option<GuildConfig>, ConfigError> {
        let path = self.guild_path(guild_id);
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(&path).map_err(|e| ConfigError::StorageError(e.to_string()))?;
        // A corrupt config reads as "not configured", matching a missing file.
        Ok(serde_json::from_reader(BufReader::new(file)).ok())
    }
}

#[async_trait]
impl ConfigStore for JsonConfigStore {
    async fn get_config(&self, guild_id: u64) -> Result<Option<GuildConfig>, ConfigError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = cache.get(&guild_id) {
                return Ok(entry.clone());
            }
        }

        let config = self.read_from_disk(guild_id)?;
        self.cache.write().await.insert(guild_id, config.clone());
        Ok(config)
    }

    async fn save_config(&self, config: GuildConfig) -> Result<(), ConfigError> {
        let guild_id = config.guild_id;
        let file = File::create(self.guild_path(guild_id))
            .map_err(|e| ConfigError::StorageError(e.to_string()))?;
        serde_json::to_writer_pretty(file, &config)
            .map_err(|e| ConfigError::StorageError(e.to_string()))?;

        self.cache.write().await.insert(guild_id, Some(config));
        Ok(())
    }

    async fn guild_ids(&self) -> Result<Vec<u64>, ConfigError> {
        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| ConfigError::StorageError(e.to_string()))?;
        Ok(entries
            .filter_map(|e| e.ok())
            .filter_map(|e| {
                let name = e.file_name();
                let name = name.to_str()?;
                name.strip_suffix(".json")?.parse().ok()
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();

        let store = JsonConfigStore::new(dir.path());
        assert!(store.get_config(7).await.unwrap().is_none());

        store
            .save_config(GuildConfig::new(7, 10, 20, vec![30, 31], 99))
            .await
            .unwrap();

        let store2 = JsonConfigStore::new(dir.path());
        let loaded = store2.get_config(7).await.unwrap().unwrap();
        assert_eq!(loaded.ticket_category_id, 10);
        assert_eq!(loaded.staff_role_ids, vec![30, 31]);
        assert_eq!(store2.guild_ids().await.unwrap(), vec![7]);
    }
}
