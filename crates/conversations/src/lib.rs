//! Conversation service abstraction and the OpenAI Assistants implementation.
//!
//! The orchestrator only ever talks to [`ConversationService`]; the service
//! owns threads, runs, and handler registration. [`openai::OpenAiConversations`]
//! is the production implementation; tests provide lightweight mocks.

pub mod error;
pub mod model;
pub mod openai;
pub mod service;

pub use {
    error::{Error, Result},
    model::{MessageOrder, Run, RunStatus, ThreadMessage, ToolCall, ToolOutput, ToolSchema},
    openai::OpenAiConversations,
    service::ConversationService,
};

/// Shared HTTP client for conversation-service requests.
///
/// Reused across all instances to share connection pools, DNS cache, and TLS
/// sessions.
pub fn shared_http_client() -> &'static reqwest::Client {
    static CLIENT: std::sync::LazyLock<reqwest::Client> =
        std::sync::LazyLock::new(reqwest::Client::new);
    &CLIENT
}
