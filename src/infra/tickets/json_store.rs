// JSON-backed ticket store. One file per guild under the tickets
// directory, keyed by ticket id: { "12345": { ... }, ... }

use crate::core::tickets::{Ticket, TicketError, TicketStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub struct JsonTicketStore {
    dir: PathBuf,
    cache: RwLock<HashMap<u64, HashMap<u32, Ticket>>>,
}

impl JsonTicketStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).expect("Failed to create tickets directory");
        Self {
            dir,
            cache: RwLock::new(HashMap::new()),
        }
    }

    fn guild_path(&self, guild_id: u64) -> PathBuf {
        self.dir.join(format!("{guild_id}.json"))
    }

    /// Load a guild's tickets into the cache if they are not there yet.
    async fn ensure_loaded(&self, guild_id: u64) -> Result<(), TicketError> {
        {
            let cache = self.cache.read().await;
            if cache.contains_key(&guild_id) {
                return Ok(());
            }
        }

        let path = self.guild_path(guild_id);
        let tickets: HashMap<u32, Ticket> = if path.exists() {
            let file =
                File::open(&path).map_err(|e| TicketError::StorageError(e.to_string()))?;
            // A corrupt file is treated as empty rather than wedging the guild.
            serde_json::from_reader(BufReader::new(file)).unwrap_or_default()
        } else {
            HashMap::new()
        };

        self.cache.write().await.insert(guild_id, tickets);
        Ok(())
    }

    async fn persist(&self, guild_id: u64) -> Result<(), TicketError> {
        let cache = self.cache.read().await;
        let tickets = cache.get(&guild_id).cloned().unwrap_or_default();
        drop(cache);

        let file = File::create(self.guild_path(guild_id))
            .map_err(|e| TicketError::StorageError(e.to_string()))?;
        serde_json::to_writer_pretty(file, &tickets)
            .map_err(|e| TicketError::StorageError(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl TicketStore for JsonTicketStore {
    async fn get_ticket(
        &self,
        guild_id: u64,
        ticket_id: u32,
    ) -> Result<Option<Ticket>, TicketError> {
        self.ensure_loaded(guild_id).await?;
        let cache = self.cache.read().await;
        Ok(cache
            .get(&guild_id)
            .and_then(|g| g.get(&ticket_id).cloned()))
    }

    async fn save_ticket(&self, guild_id: u64, ticket: Ticket) -> Result<(), TicketError> {
        self.ensure_loaded(guild_id).await?;
        {
            let mut cache = self.cache.write().await;
            cache
                .entry(guild_id)
                .or_default()
                .insert(ticket.id, ticket);
        }
        self.persist(guild_id).await
    }

    async fn all_tickets(&self, guild_id: u64) -> Result<Vec<Ticket>, TicketError> {
        self.ensure_loaded(guild_id).await?;
        let cache = self.cache.read().await;
        Ok(cache
            .get(&guild_id)
            .map(|g| g.values().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tickets::TicketService;

    #[tokio::test]
    async fn test_json_persistence_roundtrip() {
        let dir = tempfile::tempdir().unwrap();

        let service = TicketService::new(JsonTicketStore::new(dir.path()));
        let draft = service
            .allocate(7, 1001, "Support", "it broke")
            .await
            .unwrap();
        let ticket = service.commit_open(7, draft, 555).await.unwrap();

        // Reload from disk through a fresh store
        let store2 = JsonTicketStore::new(dir.path());
        let loaded = store2.get_ticket(7, ticket.id).await.unwrap().unwrap();
        assert_eq!(loaded.creator_id, 1001);
        assert_eq!(loaded.channel_id, 555);
        assert_eq!(loaded.reason, "it broke");
    }

    #[tokio::test]
    async fn test_missing_guild_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonTicketStore::new(dir.path());
        assert!(store.all_tickets(99).await.unwrap().is_empty());
        assert!(store.get_ticket(99, 12345).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_treated_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("7.json"), "not json at all").unwrap();

        let store = JsonTicketStore::new(dir.path());
        assert!(store.all_tickets(7).await.unwrap().is_empty());
    }
}
