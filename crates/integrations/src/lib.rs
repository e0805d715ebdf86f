//! Per-category integration executors.
//!
//! An executor turns a requested function call into a human-readable string.
//! Failures are typed internally ([`ExecutorError`]) and degrade to
//! descriptive text at the [`IntegrationExecutor`] boundary — the
//! conversation service needs readable output to react to, never an error.
//!
//! The actual external systems (Google Calendar, flight/hotel search, mail)
//! sit behind narrow async collaborator traits defined next to each executor;
//! production implementations live outside this repository.

pub mod calendar;
pub mod email;
pub mod params;
pub mod registry;
pub mod travel;

use {async_trait::async_trait, thiserror::Error};

use donna_conversations::ToolSchema;

/// Typed failure inside an executor. Rendered with `to_string()` before it
/// leaves the executor, so every variant reads well as a tool output.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Missing required parameters for {action}: {}", names.join(", "))]
    MissingParameters { action: String, names: Vec<String> },

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("{message}")]
    Downstream { message: String },
}

impl ExecutorError {
    #[must_use]
    pub fn missing(action: impl Into<String>, names: Vec<String>) -> Self {
        Self::MissingParameters {
            action: action.into(),
            names,
        }
    }

    /// A collaborator failed while performing `action`.
    #[must_use]
    pub fn downstream(action: &str, source: impl std::fmt::Display) -> Self {
        Self::Downstream {
            message: format!("An error occurred while {action}: {source}"),
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Downstream {
            message: message.into(),
        }
    }
}

/// A category-specific executor for handler-requested function calls.
#[async_trait]
pub trait IntegrationExecutor: Send + Sync {
    /// Function declarations, consumed verbatim by handler registration.
    fn tools(&self) -> Vec<ToolSchema>;

    /// Instructions for the handler bound to this executor's category.
    fn instructions(&self) -> String;

    /// Execute a requested function. Always returns readable text; success
    /// and failure are both strings by design of the tool-output contract.
    async fn execute(&self, function_name: &str, args: &serde_json::Value) -> String;
}

pub use {
    calendar::{CalendarExecutor, CalendarService, EventDraft, EventPatch, EventSummary},
    email::{EmailExecutor, MailService},
    registry::IntegrationRegistry,
    travel::{FlightSearchService, HotelSearchService, TravelExecutor},
};
