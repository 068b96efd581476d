// Tag service - canned responses staff can post inside tickets.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TagError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("No tag named `{0}`")]
    NotFound(String),

    #[error("Invalid tag name: {0}")]
    InvalidName(String),
}

/// A named canned response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub body: String,
    pub author_id: u64,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait TagStore: Send + Sync {
    async fn get_tag(&self, guild_id: u64, name: &str) -> Result<Option<Tag>, TagError>;
    async fn save_tag(&self, guild_id: u64, tag: Tag) -> Result<(), TagError>;
    async fn delete_tag(&self, guild_id: u64, name: &str) -> Result<bool, TagError>;
    async fn all_tags(&self, guild_id: u64) -> Result<Vec<Tag>, TagError>;
}

pub struct TagService<S: TagStore> {
    store: S,
}

impl<S: TagStore> TagService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Tag names are lowercased and must be short and word-like.
    fn normalize_name(name: &str) -> Result<String, TagError> {
        let normalized = name.trim().to_lowercase();
        if normalized.is_empty() || normalized.len() > 32 {
            return Err(TagError::InvalidName(
                "tag names must be 1-32 characters".to_string(),
            ));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(TagError::InvalidName(
                "tag names may only contain letters, digits, `-` and `_`".to_string(),
            ));
        }
        Ok(normalized)
    }

    /// Create or overwrite a tag.
    pub async fn set(
        &self,
        guild_id: u64,
        name: &str,
        body: &str,
        author_id: u64,
    ) -> Result<Tag, TagError> {
        let tag = Tag {
            name: Self::normalize_name(name)?,
            body: body.to_string(),
            author_id,
            created_at: Utc::now(),
        };
        self.store.save_tag(guild_id, tag.clone()).await?;
        Ok(tag)
    }

    pub async fn get(&self, guild_id: u64, name: &str) -> Result<Tag, TagError> {
        let name = Self::normalize_name(name)?;
        self.store
            .get_tag(guild_id, &name)
            .await?
            .ok_or(TagError::NotFound(name))
    }

    pub async fn delete(&self, guild_id: u64, name: &str) -> Result<(), TagError> {
        let name = Self::normalize_name(name)?;
        if self.store.delete_tag(guild_id, &name).await? {
            Ok(())
        } else {
            Err(TagError::NotFound(name))
        }
    }

    /// All tags, sorted by name.
    pub async fn list(&self, guild_id: u64) -> Result<Vec<Tag>, TagError> {
        let mut tags = self.store.all_tags(guild_id).await?;
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;
    use std::collections::HashMap;

    struct MockTagStore {
        tags: DashMap<u64, HashMap<String, Tag>>,
    }

    impl MockTagStore {
        fn new() -> Self {
            Self {
                tags: DashMap::new(),
            }
        }
    }

    #[async_trait]
    impl TagStore for MockTagStore {
        async fn get_tag(&self, guild_id: u64, name: &str) -> Result<Option<Tag>, TagError> {
            Ok(self
                .tags
                .get(&guild_id)
                .and_then(|m| m.get(name).cloned()))
        }

        async fn save_tag(&self, guild_id: u64, tag: Tag) -> Result<(), TagError> {
            self.tags
                .entry(guild_id)
                .or_default()
                .insert(tag.name.clone(), tag);
            Ok(())
        }

        async fn delete_tag(&self, guild_id: u64, name: &str) -> Result<bool, TagError> {
            Ok(self
                .tags
                .entry(guild_id)
                .or_default()
                .remove(name)
                .is_some())
        }

        async fn all_tags(&self, guild_id: u64) -> Result<Vec<Tag>, TagError> {
            Ok(self
                .tags
                .get(&guild_id)
                .map(|m| m.values().cloned().collect())
                .unwrap_or_default())
        }
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let service = TagService::new(MockTagStore::new());

        service.set(1, "FAQ", "Read the pins first.", 9).await.unwrap();
        let tag = service.get(1, "faq").await.unwrap();
        assert_eq!(tag.name, "faq");
        assert_eq!(tag.body, "Read the pins first.");

        service.delete(1, "faq").await.unwrap();
        assert!(matches!(
            service.get(1, "faq").await.unwrap_err(),
            TagError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_invalid_names_rejected() {
        let service = TagService::new(MockTagStore::new());
        assert!(service.set(1, "", "body", 9).await.is_err());
        assert!(service.set(1, "has spaces", "body", 9).await.is_err());
        assert!(service.set(1, &"x".repeat(33), "body", 9).await.is_err());
        assert!(service.set(1, "ok-name_2", "body", 9).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_is_sorted() {
        let service = TagService::new(MockTagStore::new());
        service.set(1, "zeta", "z", 9).await.unwrap();
        service.set(1, "alpha", "a", 9).await.unwrap();

        let names: Vec<String> = service
            .list(1)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
