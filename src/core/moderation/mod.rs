// Core moderation module - blacklist and warnings business logic.

pub mod moderation_service;

pub use moderation_service::*;
