// Moderation service - ticket blacklist and staff warnings.
//
// Blacklisted users cannot open tickets. Warnings are an audit trail staff
// leave on a user; they carry no automatic escalation.
//
// NO Discord dependencies here - just pure domain logic.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("That user is already blacklisted")]
    AlreadyBlacklisted,

    #[error("That user is not blacklisted")]
    NotBlacklisted,
}

// ============================================================================
// MODELS
// ============================================================================

/// A warning issued against a user by a staff member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    pub moderator_id: u64,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

#[async_trait]
pub trait ModerationStore: Send + Sync {
    async fn blacklist(&self, guild_id: u64) -> Result<Vec<u64>, ModerationError>;
    async fn save_blacklist(&self, guild_id: u64, users: Vec<u64>)
        -> Result<(), ModerationError>;

    async fn warnings(&self, guild_id: u64, user_id: u64)
        -> Result<Vec<Warning>, ModerationError>;
    async fn add_warning(
        &self,
        guild_id: u64,
        user_id: u64,
        warning: Warning,
    ) -> Result<(), ModerationError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct ModerationService<S: ModerationStore> {
    store: S,
}

impl<S: ModerationStore> ModerationService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn is_blacklisted(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<bool, ModerationError> {
        Ok(self.store.blacklist(guild_id).await?.contains(&user_id))
    }

    pub async fn blacklist_user(&self, guild_id: u64, user_id: u64) -> Result<(), ModerationError> {
        let mut users = self.store.blacklist(guild_id).await?;
        if users.contains(&user_id) {
            return Err(ModerationError::AlreadyBlacklisted);
        }
        users.push(user_id);
        self.store.save_blacklist(guild_id, users).await
    }

    pub async fn unblacklist_user(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<(), ModerationError> {
        let mut users = self.store.blacklist(guild_id).await?;
        let Some(pos) = users.iter().position(|u| *u == user_id) else {
            return Err(ModerationError::NotBlacklisted);
        };
        users.remove(pos);
        self.store.save_blacklist(guild_id, users).await
    }

    pub async fn blacklist_size(&self, guild_id: u64) -> Result<usize, ModerationError> {
        Ok(self.store.blacklist(guild_id).await?.len())
    }

    /// Issue a warning; returns the user's new warning count.
    pub async fn warn(
        &self,
        guild_id: u64,
        user_id: u64,
        moderator_id: u64,
        reason: &str,
    ) -> Result<usize, ModerationError> {
        self.store
            .add_warning(
                guild_id,
                user_id,
                Warning {
                    moderator_id,
                    reason: reason.to_string(),
                    timestamp: Utc::now(),
                },
            )
            .await?;
        Ok(self.store.warnings(guild_id, user_id).await?.len())
    }

    pub async fn warnings_for(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Vec<Warning>, ModerationError> {
        self.store.warnings(guild_id, user_id).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    struct MockModerationStore {
        blacklists: DashMap<u64, Vec<u64>>,
        warnings: DashMap<(u64, u64), Vec<Warning>>,
    }

    impl MockModerationStore {
        fn new() -> Self {
            Self {
                blacklists: DashMap::new(),
                warnings: DashMap::new(),
            }
        }
    }

    #[async_trait]
    impl ModerationStore for MockModerationStore {
        async fn blacklist(&self, guild_id: u64) -> Result<Vec<u64>, ModerationError> {
            Ok(self
                .blacklists
                .get(&guild_id)
                .map(|v| v.clone())
                .unwrap_or_default())
        }

        async fn save_blacklist(
            &self,
            guild_id: u64,
            users: Vec<u64>,
        ) -> Result<(), ModerationError> {
            self.blacklists.insert(guild_id, users);
            Ok(())
        }

        async fn warnings(
            &self,
            guild_id: u64,
            user_id: u64,
        ) -> Result<Vec<Warning>, ModerationError> {
            Ok(self
                .warnings
                .get(&(guild_id, user_id))
                .map(|v| v.clone())
                .unwrap_or_default())
        }

        async fn add_warning(
            &self,
            guild_id: u64,
            user_id: u64,
            warning: Warning,
        ) -> Result<(), ModerationError> {
            self.warnings
                .entry((guild_id, user_id))
                .or_default()
                .push(warning);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_blacklist_roundtrip() {
        let service = ModerationService::new(MockModerationStore::new());

        assert!(!service.is_blacklisted(1, 7).await.unwrap());
        service.blacklist_user(1, 7).await.unwrap();
        assert!(service.is_blacklisted(1, 7).await.unwrap());
        assert_eq!(service.blacklist_size(1).await.unwrap(), 1);

        let err = service.blacklist_user(1, 7).await.unwrap_err();
        assert!(matches!(err, ModerationError::AlreadyBlacklisted));

        service.unblacklist_user(1, 7).await.unwrap();
        assert!(!service.is_blacklisted(1, 7).await.unwrap());

        let err = service.unblacklist_user(1, 7).await.unwrap_err();
        assert!(matches!(err, ModerationError::NotBlacklisted));
    }

    #[tokio::test]
    async fn test_blacklists_are_per_guild() {
        let service = ModerationService::new(MockModerationStore::new());
        service.blacklist_user(1, 7).await.unwrap();
        assert!(!service.is_blacklisted(2, 7).await.unwrap());
    }

    #[tokio::test]
    async fn test_warnings_accumulate() {
        let service = ModerationService::new(MockModerationStore::new());

        assert_eq!(service.warn(1, 7, 99, "spam in ticket").await.unwrap(), 1);
        assert_eq!(service.warn(1, 7, 99, "rude to staff").await.unwrap(), 2);

        let warnings = service.warnings_for(1, 7).await.unwrap();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].reason, "spam in ticket");
        assert_eq!(warnings[1].moderator_id, 99);
    }
}
