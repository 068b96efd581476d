// Ticket lifecycle service - core business logic for support tickets.
//
// This service handles:
// - Ticket allocation (random 5-digit ids, sequential numbering)
// - Claim / unclaim toggling
// - Closing, reopening, priority, notes and participant lists
// - The auto-close scan decision
//
// NO Discord dependencies here - just pure domain logic.

use super::ticket_models::{
    Priority, Ticket, TicketActor, TicketNote, TicketStats, TicketStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum TicketError {
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Ticket not found")]
    NotFound,

    #[error("Ticket is already open")]
    AlreadyOpen,

    #[error("Ticket is already closed")]
    AlreadyClosed,

    #[error("Ticket is already claimed by <@{0}>")]
    AlreadyClaimed(u64),

    #[error("You do not have permission to do that")]
    NotPermitted,

    #[error("You already have {open} open tickets (maximum {max})")]
    TooManyOpen { open: usize, max: usize },

    #[error("That user is already added to this ticket")]
    AlreadyAdded,

    #[error("That user is not added to this ticket")]
    NotAdded,

    #[error("The ticket creator cannot be removed")]
    CannotRemoveCreator,
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Trait for persisting ticket records, one document per guild.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn get_ticket(
        &self,
        guild_id: u64,
        ticket_id: u32,
    ) -> Result<Option<Ticket>, TicketError>;

    async fn save_ticket(&self, guild_id: u64, ticket: Ticket) -> Result<(), TicketError>;

    /// All tickets for a guild, open and closed.
    async fn all_tickets(&self, guild_id: u64) -> Result<Vec<Ticket>, TicketError>;
}

/// Result of the claim button, which toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimOutcome {
    Claimed,
    Unclaimed,
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct TicketService<S: TicketStore> {
    store: S,
}

impl<S: TicketStore> TicketService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Refuse to allocate when the user is at the per-guild open-ticket cap.
    pub async fn ensure_under_cap(
        &self,
        guild_id: u64,
        user_id: u64,
        max_tickets: usize,
    ) -> Result<(), TicketError> {
        let open = self
            .store
            .all_tickets(guild_id)
            .await?
            .iter()
            .filter(|t| t.creator_id == user_id && !t.closed)
            .count();

        if open >= max_tickets {
            return Err(TicketError::TooManyOpen {
                open,
                max: max_tickets,
            });
        }
        Ok(())
    }

    /// Allocate a fresh ticket: a random 5-digit id that is not in use and
    /// the next sequential ticket number. The ticket is NOT persisted yet;
    /// the caller creates the channel first and then calls `commit_open`.
    pub async fn allocate(
        &self,
        guild_id: u64,
        creator_id: u64,
        category_label: &str,
        reason: &str,
    ) -> Result<Ticket, TicketError> {
        let existing = self.store.all_tickets(guild_id).await?;

        let ticket_number = existing.iter().map(|t| t.ticket_number).max().unwrap_or(0) + 1;

        let mut rng = rand::thread_rng();
        let mut id: u32 = rng.gen_range(10_000..=99_999);
        while existing.iter().any(|t| t.id == id) {
            id = rng.gen_range(10_000..=99_999);
        }

        Ok(Ticket {
            id,
            channel_id: 0,
            creator_id,
            category_label: category_label.to_string(),
            ticket_number,
            reason: reason.to_string(),
            created_at: Utc::now(),
            closed: false,
            closed_at: None,
            closed_by: None,
            close_reason: None,
            auto_closed: false,
            reopened: false,
            reopened_at: None,
            reopened_by: None,
            claimed_by: None,
            claimed_at: None,
            priority: Priority::Medium,
            notes: Vec::new(),
            added_users: Vec::new(),
            status: TicketStatus::Open,
        })
    }

    /// Persist a freshly allocated ticket once its channel exists.
    pub async fn commit_open(
        &self,
        guild_id: u64,
        mut ticket: Ticket,
        channel_id: u64,
    ) -> Result<Ticket, TicketError> {
        ticket.channel_id = channel_id;
        self.store.save_ticket(guild_id, ticket.clone()).await?;
        Ok(ticket)
    }

    pub async fn get(&self, guild_id: u64, ticket_id: u32) -> Result<Ticket, TicketError> {
        self.store
            .get_ticket(guild_id, ticket_id)
            .await?
            .ok_or(TicketError::NotFound)
    }

    /// Look a ticket up by the channel it lives in.
    pub async fn find_by_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<Option<Ticket>, TicketError> {
        Ok(self
            .store
            .all_tickets(guild_id)
            .await?
            .into_iter()
            .find(|t| t.channel_id == channel_id))
    }

    /// Toggle the claim state. Staff only; claiming someone else's claim is
    /// refused, the current claimer may unclaim.
    pub async fn toggle_claim(
        &self,
        guild_id: u64,
        ticket_id: u32,
        actor: TicketActor,
    ) -> Result<ClaimOutcome, TicketError> {
        if !actor.is_staff {
            return Err(TicketError::NotPermitted);
        }

        let mut ticket = self.get(guild_id, ticket_id).await?;
        match ticket.claimed_by {
            Some(claimer) if claimer == actor.user_id => {
                ticket.claimed_by = None;
                ticket.claimed_at = None;
                self.store.save_ticket(guild_id, ticket).await?;
                Ok(ClaimOutcome::Unclaimed)
            }
            Some(claimer) => Err(TicketError::AlreadyClaimed(claimer)),
            None => {
                ticket.claimed_by = Some(actor.user_id);
                ticket.claimed_at = Some(Utc::now());
                self.store.save_ticket(guild_id, ticket).await?;
                Ok(ClaimOutcome::Claimed)
            }
        }
    }

    /// Record the optional close reason ahead of the confirmation step.
    pub async fn set_close_reason(
        &self,
        guild_id: u64,
        ticket_id: u32,
        reason: &str,
    ) -> Result<(), TicketError> {
        let mut ticket = self.get(guild_id, ticket_id).await?;
        ticket.close_reason = Some(reason.to_string());
        self.store.save_ticket(guild_id, ticket).await
    }

    /// Mark a ticket closed. `auto` flags the hourly sweep as the closer.
    pub async fn close(
        &self,
        guild_id: u64,
        ticket_id: u32,
        closed_by: u64,
        auto: bool,
    ) -> Result<Ticket, TicketError> {
        let mut ticket = self.get(guild_id, ticket_id).await?;
        if ticket.closed {
            return Err(TicketError::AlreadyClosed);
        }

        ticket.closed = true;
        ticket.closed_at = Some(Utc::now());
        ticket.closed_by = Some(closed_by);
        ticket.auto_closed = auto;
        ticket.status = TicketStatus::Closed;
        self.store.save_ticket(guild_id, ticket.clone()).await?;
        Ok(ticket)
    }

    /// Reopen a closed ticket into a new channel.
    pub async fn reopen(
        &self,
        guild_id: u64,
        ticket_id: u32,
        reopened_by: u64,
        new_channel_id: u64,
    ) -> Result<Ticket, TicketError> {
        let mut ticket = self.get(guild_id, ticket_id).await?;
        if !ticket.closed {
            return Err(TicketError::AlreadyOpen);
        }

        ticket.closed = false;
        ticket.reopened = true;
        ticket.channel_id = new_channel_id;
        ticket.reopened_at = Some(Utc::now());
        ticket.reopened_by = Some(reopened_by);
        ticket.status = TicketStatus::Open;
        self.store.save_ticket(guild_id, ticket.clone()).await?;
        Ok(ticket)
    }

    pub async fn set_priority(
        &self,
        guild_id: u64,
        ticket_id: u32,
        priority: Priority,
    ) -> Result<(), TicketError> {
        let mut ticket = self.get(guild_id, ticket_id).await?;
        ticket.priority = priority;
        self.store.save_ticket(guild_id, ticket).await
    }

    pub async fn add_note(
        &self,
        guild_id: u64,
        ticket_id: u32,
        author_id: u64,
        content: &str,
    ) -> Result<(), TicketError> {
        let mut ticket = self.get(guild_id, ticket_id).await?;
        ticket.notes.push(TicketNote {
            author_id,
            content: content.to_string(),
            timestamp: Utc::now(),
        });
        self.store.save_ticket(guild_id, ticket).await
    }

    pub async fn add_user(
        &self,
        guild_id: u64,
        ticket_id: u32,
        user_id: u64,
    ) -> Result<(), TicketError> {
        let mut ticket = self.get(guild_id, ticket_id).await?;
        if ticket.added_users.contains(&user_id) {
            return Err(TicketError::AlreadyAdded);
        }
        ticket.added_users.push(user_id);
        self.store.save_ticket(guild_id, ticket).await
    }

    pub async fn remove_user(
        &self,
        guild_id: u64,
        ticket_id: u32,
        user_id: u64,
    ) -> Result<(), TicketError> {
        let mut ticket = self.get(guild_id, ticket_id).await?;
        if user_id == ticket.creator_id {
            return Err(TicketError::CannotRemoveCreator);
        }
        let Some(pos) = ticket.added_users.iter().position(|u| *u == user_id) else {
            return Err(TicketError::NotAdded);
        };
        ticket.added_users.remove(pos);
        self.store.save_ticket(guild_id, ticket).await
    }

    /// Aggregate counts for `/ticketstats`.
    pub async fn stats(&self, guild_id: u64) -> Result<TicketStats, TicketError> {
        let tickets = self.store.all_tickets(guild_id).await?;

        let mut stats = TicketStats {
            total: tickets.len(),
            ..TicketStats::default()
        };
        for ticket in &tickets {
            if ticket.closed {
                stats.closed += 1;
            } else {
                stats.open += 1;
                match ticket.priority {
                    Priority::High => stats.high_priority += 1,
                    Priority::Medium => stats.medium_priority += 1,
                    Priority::Low => stats.low_priority += 1,
                }
            }
            if ticket.claimed_by.is_some() {
                stats.claimed += 1;
            }
        }
        Ok(stats)
    }

    /// Open tickets older than `max_age_hours`, for the hourly sweep.
    pub async fn auto_close_candidates(
        &self,
        guild_id: u64,
        max_age_hours: u64,
        now: DateTime<Utc>,
    ) -> Result<Vec<Ticket>, TicketError> {
        let cutoff = chrono::Duration::hours(max_age_hours as i64);
        Ok(self
            .store
            .all_tickets(guild_id)
            .await?
            .into_iter()
            .filter(|t| !t.closed && now - t.created_at >= cutoff)
            .collect())
    }
}

/// Human-readable duration between two timestamps: "2d 3h 4m" / "3h 4m" / "4m".
pub fn format_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let duration = end.signed_duration_since(start);
    if duration.num_seconds() < 0 {
        return "Unknown".to_string();
    }

    let days = duration.num_days();
    let hours = duration.num_hours() % 24;
    let minutes = duration.num_minutes() % 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, minutes)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    /// In-memory store for testing
    struct MockTicketStore {
        tickets: DashMap<u64, Vec<Ticket>>,
    }

    impl MockTicketStore {
        fn new() -> Self {
            Self {
                tickets: DashMap::new(),
            }
        }
    }

    #[async_trait]
    impl TicketStore for MockTicketStore {
        async fn get_ticket(
            &self,
            guild_id: u64,
            ticket_id: u32,
        ) -> Result<Option<Ticket>, TicketError> {
            Ok(self
                .tickets
                .get(&guild_id)
                .and_then(|v| v.iter().find(|t| t.id == ticket_id).cloned()))
        }

        async fn save_ticket(&self, guild_id: u64, ticket: Ticket) -> Result<(), TicketError> {
            let mut guild = self.tickets.entry(guild_id).or_default();
            if let Some(existing) = guild.iter_mut().find(|t| t.id == ticket.id) {
                *existing = ticket;
            } else {
                guild.push(ticket);
            }
            Ok(())
        }

        async fn all_tickets(&self, guild_id: u64) -> Result<Vec<Ticket>, TicketError> {
            Ok(self
                .tickets
                .get(&guild_id)
                .map(|v| v.clone())
                .unwrap_or_default())
        }
    }

    const GUILD: u64 = 42;
    const CREATOR: u64 = 1001;
    const STAFFER: u64 = 2002;

    fn staff(user_id: u64) -> TicketActor {
        TicketActor {
            user_id,
            is_staff: true,
        }
    }

    async fn open_ticket(service: &TicketService<MockTicketStore>) -> Ticket {
        let draft = service
            .allocate(GUILD, CREATOR, "Support", "my game crashed")
            .await
            .unwrap();
        service.commit_open(GUILD, draft, 555).await.unwrap()
    }

    #[tokio::test]
    async fn test_allocate_assigns_five_digit_id_and_sequential_number() {
        let service = TicketService::new(MockTicketStore::new());

        let first = open_ticket(&service).await;
        assert!((10_000..=99_999).contains(&first.id));
        assert_eq!(first.ticket_number, 1);
        assert_eq!(first.channel_name(), "support-1");

        let second = open_ticket(&service).await;
        assert_eq!(second.ticket_number, 2);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_ticket_cap_enforced() {
        let service = TicketService::new(MockTicketStore::new());
        open_ticket(&service).await;
        open_ticket(&service).await;

        assert!(service.ensure_under_cap(GUILD, CREATOR, 3).await.is_ok());
        let err = service
            .ensure_under_cap(GUILD, CREATOR, 2)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::TooManyOpen { open: 2, max: 2 }));

        // Closed tickets do not count towards the cap
        let ticket = open_ticket(&service).await;
        service.close(GUILD, ticket.id, STAFFER, false).await.unwrap();
        assert!(service.ensure_under_cap(GUILD, CREATOR, 3).await.is_ok());
    }

    #[tokio::test]
    async fn test_claim_is_a_toggle() {
        let service = TicketService::new(MockTicketStore::new());
        let ticket = open_ticket(&service).await;

        let outcome = service
            .toggle_claim(GUILD, ticket.id, staff(STAFFER))
            .await
            .unwrap();
        assert_eq!(outcome, ClaimOutcome::Claimed);
        assert_eq!(
            service.get(GUILD, ticket.id).await.unwrap().claimed_by,
            Some(STAFFER)
        );

        // Another staff member cannot steal the claim
        let err = service
            .toggle_claim(GUILD, ticket.id, staff(3003))
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::AlreadyClaimed(id) if id == STAFFER));

        // The claimer can unclaim
        let outcome = service
            .toggle_claim(GUILD, ticket.id, staff(STAFFER))
            .await
            .unwrap();
        assert_eq!(outcome, ClaimOutcome::Unclaimed);
        assert_eq!(
            service.get(GUILD, ticket.id).await.unwrap().claimed_by,
            None
        );
    }

    #[tokio::test]
    async fn test_claim_requires_staff() {
        let service = TicketService::new(MockTicketStore::new());
        let ticket = open_ticket(&service).await;

        let actor = TicketActor {
            user_id: CREATOR,
            is_staff: false,
        };
        let err = service
            .toggle_claim(GUILD, ticket.id, actor)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::NotPermitted));
    }

    #[tokio::test]
    async fn test_close_then_reopen() {
        let service = TicketService::new(MockTicketStore::new());
        let ticket = open_ticket(&service).await;

        let closed = service.close(GUILD, ticket.id, STAFFER, false).await.unwrap();
        assert!(closed.closed);
        assert_eq!(closed.closed_by, Some(STAFFER));
        assert_eq!(closed.status, TicketStatus::Closed);

        // Closing twice is refused
        let err = service
            .close(GUILD, ticket.id, STAFFER, false)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::AlreadyClosed));

        let reopened = service.reopen(GUILD, ticket.id, STAFFER, 777).await.unwrap();
        assert!(!reopened.closed);
        assert!(reopened.reopened);
        assert_eq!(reopened.channel_id, 777);
        assert_eq!(reopened.reopened_channel_name(), "support-1-reopened");

        // Reopening an open ticket is refused
        let err = service
            .reopen(GUILD, ticket.id, STAFFER, 778)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::AlreadyOpen));
    }

    #[tokio::test]
    async fn test_participant_management() {
        let service = TicketService::new(MockTicketStore::new());
        let ticket = open_ticket(&service).await;

        service.add_user(GUILD, ticket.id, 9009).await.unwrap();
        let err = service.add_user(GUILD, ticket.id, 9009).await.unwrap_err();
        assert!(matches!(err, TicketError::AlreadyAdded));

        let err = service
            .remove_user(GUILD, ticket.id, CREATOR)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::CannotRemoveCreator));

        service.remove_user(GUILD, ticket.id, 9009).await.unwrap();
        let err = service
            .remove_user(GUILD, ticket.id, 9009)
            .await
            .unwrap_err();
        assert!(matches!(err, TicketError::NotAdded));
    }

    #[tokio::test]
    async fn test_stats_counts_priorities_of_open_tickets_only() {
        let service = TicketService::new(MockTicketStore::new());
        let a = open_ticket(&service).await;
        let b = open_ticket(&service).await;
        let c = open_ticket(&service).await;

        service.set_priority(GUILD, a.id, Priority::High).await.unwrap();
        service.set_priority(GUILD, b.id, Priority::High).await.unwrap();
        service.toggle_claim(GUILD, c.id, staff(STAFFER)).await.unwrap();
        service.close(GUILD, b.id, STAFFER, false).await.unwrap();

        let stats = service.stats(GUILD).await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.open, 2);
        assert_eq!(stats.closed, 1);
        assert_eq!(stats.claimed, 1);
        assert_eq!(stats.high_priority, 1);
        assert_eq!(stats.medium_priority, 1);
        assert_eq!(stats.low_priority, 0);
    }

    #[tokio::test]
    async fn test_auto_close_candidates() {
        let service = TicketService::new(MockTicketStore::new());
        let old = open_ticket(&service).await;
        let fresh = open_ticket(&service).await;

        // Age the first ticket by rewriting its creation time
        let mut aged = service.get(GUILD, old.id).await.unwrap();
        aged.created_at = Utc::now() - chrono::Duration::hours(100);
        service.store.save_ticket(GUILD, aged).await.unwrap();

        let candidates = service
            .auto_close_candidates(GUILD, 72, Utc::now())
            .await
            .unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, old.id);
        assert_ne!(candidates[0].id, fresh.id);

        // Closed tickets are never candidates
        service.close(GUILD, old.id, STAFFER, true).await.unwrap();
        let candidates = service
            .auto_close_candidates(GUILD, 72, Utc::now())
            .await
            .unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn test_format_duration() {
        let start = Utc::now();
        assert_eq!(
            format_duration(start, start + chrono::Duration::minutes(5)),
            "5m"
        );
        assert_eq!(
            format_duration(start, start + chrono::Duration::minutes(125)),
            "2h 5m"
        );
        assert_eq!(
            format_duration(start, start + chrono::Duration::minutes(60 * 26 + 3)),
            "1d 2h 3m"
        );
        assert_eq!(
            format_duration(start, start - chrono::Duration::minutes(1)),
            "Unknown"
        );
    }
}
