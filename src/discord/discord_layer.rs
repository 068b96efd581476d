// Discord layer - commands, buttons/modals and lifecycle flows.

#[path = "commands/command_catalog.rs"]
pub mod commands;

pub mod embeds;
pub mod interactions;

#[path = "tickets/tickets_mod.rs"]
pub mod tickets;

// Re-export command types for convenience
pub use commands::tickets::{Data, Error};
