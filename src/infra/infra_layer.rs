// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "tickets/json_store.rs"]
pub mod tickets;

#[path = "config/json_store.rs"]
pub mod config;

#[path = "moderation/json_store.rs"]
pub mod moderation;

#[path = "tags/json_store.rs"]
pub mod tags;

#[path = "panels/json_store.rs"]
pub mod panels;
