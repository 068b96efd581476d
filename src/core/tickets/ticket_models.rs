// Ticket domain models - data structures for the support ticket system.
//
// These are pure domain types with no Discord dependencies.
// The Discord layer converts these into channels, embeds and buttons.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ticket priority as set by staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

/// Lifecycle state persisted alongside the boolean flags for quick display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    #[default]
    Open,
    Closed,
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Open => write!(f, "Open"),
            TicketStatus::Closed => write!(f, "Closed"),
        }
    }
}

/// A staff note attached to a ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketNote {
    pub author_id: u64,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A support ticket record. One per conversation, retained after close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Random 5-digit id, unique within the guild.
    pub id: u32,
    pub channel_id: u64,
    pub creator_id: u64,
    /// The panel button label this ticket was opened from.
    pub category_label: String,
    /// Sequential per-guild number, used in the channel name.
    pub ticket_number: u32,
    /// The reason text entered in the open-ticket modal.
    pub reason: String,
    pub created_at: DateTime<Utc>,
    pub closed: bool,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closed_by: Option<u64>,
    #[serde(default)]
    pub close_reason: Option<String>,
    #[serde(default)]
    pub auto_closed: bool,
    #[serde(default)]
    pub reopened: bool,
    #[serde(default)]
    pub reopened_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub reopened_by: Option<u64>,
    #[serde(default)]
    pub claimed_by: Option<u64>,
    #[serde(default)]
    pub claimed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub notes: Vec<TicketNote>,
    #[serde(default)]
    pub added_users: Vec<u64>,
    #[serde(default)]
    pub status: TicketStatus,
}

impl Ticket {
    /// Channel name for a fresh ticket: `<label>-<number>`, lowercased.
    pub fn channel_name(&self) -> String {
        format!("{}-{}", self.category_label.to_lowercase(), self.ticket_number)
    }

    /// Channel name used when the ticket is reopened.
    pub fn reopened_channel_name(&self) -> String {
        format!("{}-reopened", self.channel_name())
    }

    pub fn reopened_label(&self) -> &'static str {
        if self.reopened {
            "Yes"
        } else {
            "No"
        }
    }
}

/// Aggregate counts for `/ticketstats`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketStats {
    pub total: usize,
    pub open: usize,
    pub closed: usize,
    pub claimed: usize,
    /// Open tickets per priority.
    pub high_priority: usize,
    pub medium_priority: usize,
    pub low_priority: usize,
}

/// Who is asking for a ticket operation; computed by the Discord layer from
/// primitive ids and role membership.
#[derive(Debug, Clone, Copy)]
pub struct TicketActor {
    pub user_id: u64,
    pub is_staff: bool,
}

impl TicketActor {
    pub fn is_creator(&self, ticket: &Ticket) -> bool {
        self.user_id == ticket.creator_id
    }

    pub fn is_claimer(&self, ticket: &Ticket) -> bool {
        ticket.claimed_by == Some(self.user_id)
    }

    /// Close/add permissions: staff, the creator, or the current claimer.
    pub fn may_manage(&self, ticket: &Ticket) -> bool {
        self.is_staff || self.is_creator(ticket) || self.is_claimer(ticket)
    }

    /// Remove permissions exclude the claimer unless they are also staff.
    pub fn may_remove_users(&self, ticket: &Ticket) -> bool {
        self.is_staff || self.is_creator(ticket)
    }
}
