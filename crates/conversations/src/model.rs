//! Wire-level types observed from the conversation service.

use serde::{Deserialize, Serialize};

/// Lifecycle states of a run, as reported by the conversation service.
///
/// The orchestrator never mutates a run's state directly; it only observes
/// these values while polling and influences them indirectly by submitting
/// tool outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Completed,
    Failed,
    Cancelled,
    Expired,
}

impl RunStatus {
    /// Whether the run can make no further progress.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired
        )
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One processing cycle of a message against a handler.
#[derive(Debug, Clone)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
    /// Pending tool calls; non-empty only while `status` is `RequiresAction`.
    pub tool_calls: Vec<ToolCall>,
}

/// A function invocation requested by the handler mid-run.
///
/// `arguments` is the raw JSON text exactly as the service sent it; parsing
/// (and parse failures) are the router's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

/// The result supplied back for one [`ToolCall`].
///
/// Exactly one output must exist per pending call before a run can leave
/// `requires_action`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolOutput {
    pub tool_call_id: String,
    pub output: String,
}

/// A message on a thread.
#[derive(Debug, Clone)]
pub struct ThreadMessage {
    pub role: String,
    pub text: String,
    /// The run that authored this message, if any.
    pub run_id: Option<String>,
}

/// Listing order for thread messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrder {
    Asc,
    Desc,
}

impl MessageOrder {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageOrder::Asc => "asc",
            MessageOrder::Desc => "desc",
        }
    }
}

/// Declaration of a callable function, passed verbatim to the conversation
/// service when a handler is registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON-shaped parameter schema including the required-fields list.
    pub parameters: serde_json::Value,
}

impl ToolSchema {
    /// The service's function-tool envelope.
    #[must_use]
    pub fn to_wire(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": self.parameters,
            }
        })
    }
}
