use async_trait::async_trait;

use crate::{
    error::Result,
    model::{MessageOrder, Run, ThreadMessage, ToolOutput, ToolSchema},
};

/// Operations the orchestrator needs from the conversation service.
///
/// Threads, runs, and handlers are owned by the service; callers hold only
/// opaque ids. Implementations must be safe to share across concurrent
/// dispatch calls.
#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Create a new, empty message thread.
    async fn create_thread(&self) -> Result<String>;

    /// Delete a thread. Used by the out-of-band session sweep.
    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    /// Append a message to a thread.
    async fn post_message(&self, thread_id: &str, role: &str, text: &str) -> Result<()>;

    /// Resolve a handler id by name, registering the handler with the given
    /// instructions and tool schemas if it doesn't exist yet.
    async fn ensure_handler(
        &self,
        name: &str,
        instructions: &str,
        tools: &[ToolSchema],
    ) -> Result<String>;

    /// Start a run of `handler_id` against the thread. Per-run `instructions`
    /// override the handler's registered ones.
    async fn start_run(
        &self,
        thread_id: &str,
        handler_id: &str,
        instructions: Option<&str>,
    ) -> Result<Run>;

    /// Fetch the current state of a run.
    async fn run_status(&self, thread_id: &str, run_id: &str) -> Result<Run>;

    /// Submit one output per pending tool call, atomically.
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run>;

    /// List messages on a thread.
    async fn list_messages(
        &self,
        thread_id: &str,
        order: MessageOrder,
        limit: Option<u32>,
    ) -> Result<Vec<ThreadMessage>>;
}
