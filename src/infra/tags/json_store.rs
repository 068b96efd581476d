// JSON-backed tag store. One file per guild, a map of tag name to tag.

use crate::core::tags::{Tag, TagError, TagStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub struct JsonTagStore {
    dir: PathBuf,
    cache: RwLock<HashMap<u64, HashMap<String, Tag>>>,
}

impl JsonTagStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).expect("Failed to create tags directory");
        Self {
            dir,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn guild_path(&self, guild_id: u64) -> PathBuf {
        self.dir.join(format!("{guild_id}.json"))
    }

    async fn ensure_loaded(&self, guild_id: u64) -> Result<(), TagError> {
        {
            let cache = self.cache.read().await;
            if cache.contains_key(&guild_id) {
                return Ok(());
            }
        }

        let path = self.guild_path(guild_id);
        let tags: HashMap<String, Tag> = if path.exists() {
            let file = File::open(&path).map_err(|e| TagError::StorageError(e.to_string()))?;
            serde_json::from_reader(BufReader::new(file)).unwrap_or_default()
        } else {
            HashMap::new()
        };

        self.cache.write().await.insert(guild_id, tags);
        Ok(())
    }

    async fn persist(&self, guild_id: u64) -> Result<(), TagError> {
        let cache = self.cache.read().await;
        let tags = cache.get(&guild_id).cloned().unwrap_or_default();
        drop(cache);

        let file = File::create(self.guild_path(guild_id))
            .map_err(|e| TagError::StorageError(e.to_string()))?;
        serde_json::to_writer_pretty(file, &tags)
            .map_err(|e| TagError::StorageError(e.to_string()))
    }
}

#[async_trait]
impl TagStore for JsonTagStore {
    async fn get_tag(&self, guild_id: u64, name: &str) -> Result<Option<Tag>, TagError> {
        self.ensure_loaded(guild_id).await?;
        let cache = self.cache.read().await;
        Ok(cache.get(&guild_id).and_then(|t| t.get(name).cloned()))
    }

    async fn save_tag(&self, guild_id: u64, tag: Tag) -> Result<(), TagError> {
        self.ensure_loaded(guild_id).await?;
        {
            let mut cache = self.cache.write().await;
            cache
                .entry(guild_id)
                .or_default()
                .insert(tag.name.clone(), tag);
        }
        self.persist(guild_id).await
    }

    async fn delete_tag(&self, guild_id: u64, name: &str) -> Result<bool, TagError> {
        self.ensure_loaded(guild_id).await?;
        let removed = {
            let mut cache = self.cache.write().await;
            cache
                .entry(guild_id)
                .or_default()
                .remove(name)
                .is_some()
        };
        if removed {
            self.persist(guild_id).await?;
        }
        Ok(removed)
    }

    async fn all_tags(&self, guild_id: u64) -> Result<Vec<Tag>, TagError> {
        self.ensure_loaded(guild_id).await?;
        let cache = self.cache.read().await;
        Ok(cache
            .get(&guild_id)
            .map(|t| t.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tags::TagService;

    #[tokio::test]
    async fn test_tag_roundtrip() {
        let dir = tempfile::tempdir().unwrap();

        let service = TagService::new(JsonTagStore::new(dir.path()));
        service.set(7, "faq", "Read the pins.", 99).await.unwrap();

        let service2 = TagService::new(JsonTagStore::new(dir.path()));
        assert_eq!(service2.get(7, "faq").await.unwrap().body, "Read the pins.");

        service2.delete(7, "faq").await.unwrap();
        let service3 = TagService::new(JsonTagStore::new(dir.path()));
        assert!(service3.get(7, "faq").await.is_err());
    }
}
