// JSON-backed moderation store. Blacklists and warnings each get their own
// directory with one file per guild: blacklists are a plain id array,
// warnings a map of user id to warning list.

use crate::core::moderation::{ModerationError, ModerationStore, Warning};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub struct JsonModerationStore {
    blacklist_dir: PathBuf,
    warnings_dir: PathBuf,
    blacklists: RwLock<HashMap<u64, Vec<u64>>>,
    warnings: RwLock<HashMap<u64, HashMap<u64, Vec<Warning>>>>,
}

impl JsonModerationStore {
    pub fn new(blacklist_dir: impl Into<PathBuf>, warnings_dir: impl Into<PathBuf>) -> Self {
        let blacklist_dir = blacklist_dir.into();
        let warnings_dir = warnings_dir.into();
        std::fs::create_dir_all(&blacklist_dir).expect("Failed to create blacklists directory");
        std::fs::create_dir_all(&warnings_dir).expect("Failed to create warnings directory");
        Self {
            blacklist_dir,
            warnings_dir,
            blacklists: RwLock::new(HashMap::new()),
            warnings: RwLock::new(HashMap::new()),
        }
    }

    fn load_json<T: serde::de::DeserializeOwned + Default>(
        path: &PathBuf,
    ) -> Result<T, ModerationError> {
        if !path.exists() {
            return Ok(T::default());
        }
        let file = File::open(path).map_err(|e| ModerationError::StorageError(e.to_string()))?;
        Ok(serde_json::from_reader(BufReader::new(file)).unwrap_or_default())
    }

    fn write_json<T: serde::Serialize>(path: &PathBuf, value: &T) -> Result<(), ModerationError> {
        let file = File::create(path).map_err(|e| ModerationError::StorageError(e.to_string()))?;
        serde_json::to_writer_pretty(file, value)
            .map_err(|e| ModerationError::StorageError(e.to_string()))
    }

    fn blacklist_path(&self, guild_id: u64) -> PathBuf {
        self.blacklist_dir.join(format!("{guild_id}.json"))
    }

    fn warnings_path(&self, guild_id: u64) -> PathBuf {
        self.warnings_dir.join(format!("{guild_id}.json"))
    }
}

#[async_trait]
impl ModerationStore for JsonModerationStore {
    async fn blacklist(&self, guild_id: u64) -> Result<Vec<u64>, ModerationError> {
        {
            let cache = self.blacklists.read().await;
            if let Some(users) = cache.get(&guild_id) {
                return Ok(users.clone());
            }
        }

        let users: Vec<u64> = Self::load_json(&self.blacklist_path(guild_id))?;
        self.blacklists.write().await.insert(guild_id, users.clone());
        Ok(users)
    }

    async fn save_blacklist(
        &self,
        guild_id: u64,
        users: Vec<u64>,
    ) -> Result<(), ModerationError> {
        Self::write_json(&self.blacklist_path(guild_id), &users)?;
        self.blacklists.write().await.insert(guild_id, users);
        Ok(())
    }

    async fn warnings(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Vec<Warning>, ModerationError> {
        {
            let cache = self.warnings.read().await;
            if let Some(guild) = cache.get(&guild_id) {
                return Ok(guild.get(&user_id).cloned().unwrap_or_default());
            }
        }

        let guild: HashMap<u64, Vec<Warning>> = Self::load_json(&self.warnings_path(guild_id))?;
        let result = guild.get(&user_id).cloned().unwrap_or_default();
        self.warnings.write().await.insert(guild_id, guild);
        Ok(result)
    }

    async fn add_warning(
        &self,
        guild_id: u64,
        user_id: u64,
        warning: Warning,
    ) -> Result<(), ModerationError> {
        // Prime the cache so we do not clobber warnings for other users.
        self.warnings(guild_id, user_id).await?;

        let mut cache = self.warnings.write().await;
        let guild = cache.entry(guild_id).or_default();
        guild.entry(user_id).or_default().push(warning);
        let snapshot = guild.clone();
        drop(cache);

        Self::write_json(&self.warnings_path(guild_id), &snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn store(dir: &tempfile::TempDir) -> JsonModerationStore {
        JsonModerationStore::new(dir.path().join("blacklists"), dir.path().join("warnings"))
    }

    #[tokio::test]
    async fn test_blacklist_roundtrip() {
        let dir = tempfile::tempdir().unwrap();

        let s = store(&dir);
        s.save_blacklist(7, vec![1, 2, 3]).await.unwrap();

        let s2 = store(&dir);
        assert_eq!(s2.blacklist(7).await.unwrap(), vec![1, 2, 3]);
        assert!(s2.blacklist(8).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_warnings_roundtrip_preserves_other_users() {
        let dir = tempfile::tempdir().unwrap();

        let s = store(&dir);
        let warning = |reason: &str| Warning {
            moderator_id: 99,
            reason: reason.to_string(),
            timestamp: Utc::now(),
        };
        s.add_warning(7, 1, warning("first")).await.unwrap();
        s.add_warning(7, 2, warning("other user")).await.unwrap();
        s.add_warning(7, 1, warning("second")).await.unwrap();

        let s2 = store(&dir);
        assert_eq!(s2.warnings(7, 1).await.unwrap().len(), 2);
        assert_eq!(s2.warnings(7, 2).await.unwrap().len(), 1);
        assert_eq!(s2.warnings(7, 1).await.unwrap()[1].reason, "second");
    }
}
