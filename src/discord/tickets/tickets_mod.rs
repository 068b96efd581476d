// Ticket flows for the Discord layer.
// - `lifecycle.rs` opens, closes and reopens tickets.
// - `history.rs` captures channel history for transcripts.
// - `replay.rs` re-sends archived messages through a webhook.

pub mod history;
pub mod lifecycle;
pub mod replay;
