//! Copilot module - Scripted assistant for protocol authoring
//!
//! Features:
//! - Keyword-matched reply templates over the patient context
//! - Simulated reply latency via a background timer task
//! - Canned suggestion chips for the chat input

pub mod responder;
pub mod session;

pub use responder::{CopilotContext, MessageKind, SUGGESTIONS};
pub use session::CopilotSession;

use chrono::{DateTime, Utc};

/// Who wrote a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
}

/// One entry of the chat transcript
#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: u64,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub kind: Option<MessageKind>,
}
