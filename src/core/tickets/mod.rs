// Core tickets module - the support ticket lifecycle.
// Following the same pattern as the other core modules.

pub mod ticket_models;
pub mod ticket_service;

pub use ticket_models::*;
pub use ticket_service::*;
