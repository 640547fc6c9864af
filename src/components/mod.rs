//! UI components: canvas effects and the chat widget.

pub mod chat;
pub mod effects;
