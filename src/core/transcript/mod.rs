// Core transcript module - message capture models and the renderers that
// turn them into HTML, text and replay-log documents.

pub mod markdown;
pub mod renderer;
pub mod transcript_models;

pub use renderer::*;
pub use transcript_models::*;
