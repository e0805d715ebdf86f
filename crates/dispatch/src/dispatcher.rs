//! The run orchestrator: classify, resolve the session, drive the run state
//! machine to a terminal state, and fold every failure into the outcome.

use std::{sync::Arc, time::Duration};

use {
    serde::Serialize,
    tracing::{debug, info, warn},
};

use {
    donna_config::ConversationConfig,
    donna_conversations::{
        ConversationService, MessageOrder, Run, RunStatus, ToolCall, ToolOutput,
    },
    donna_integrations::IntegrationRegistry,
    donna_routing::{Category, handler_for},
    donna_sessions::{SessionStore, normalize_user_id},
};

use crate::{
    classifier::MessageClassifier,
    error::DispatchError,
    router::ToolRouter,
};

/// What a dispatch call hands back to the front-end: the thread and run it
/// touched (when known) plus exactly one of `response` / `error`.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub thread_id: Option<String>,
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DispatchOutcome {
    fn success(thread_id: Option<String>, run_id: Option<String>, response: String) -> Self {
        Self {
            thread_id,
            run_id,
            response: Some(response),
            error: None,
        }
    }

    fn failure(thread_id: Option<String>, run_id: Option<String>, error: String) -> Self {
        Self {
            thread_id,
            run_id,
            response: None,
            error: Some(error),
        }
    }
}

pub struct Dispatcher {
    service: Arc<dyn ConversationService>,
    sessions: Arc<SessionStore>,
    registry: Arc<IntegrationRegistry>,
    classifier: Arc<dyn MessageClassifier>,
    router: ToolRouter,
    poll_interval: Duration,
    run_deadline: Duration,
}

impl Dispatcher {
    pub fn new(
        service: Arc<dyn ConversationService>,
        sessions: Arc<SessionStore>,
        registry: Arc<IntegrationRegistry>,
        classifier: Arc<dyn MessageClassifier>,
        config: &ConversationConfig,
    ) -> Self {
        let router = ToolRouter::new(registry.clone());
        Self {
            service,
            sessions,
            registry,
            classifier,
            router,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            run_deadline: Duration::from_secs(config.run_deadline_secs),
        }
    }

    /// Dispatch one message for one user.
    ///
    /// Never returns an error: anything that goes wrong in classification,
    /// session resolution, or the run itself is reported through the
    /// outcome's `error` field, with whatever thread/run ids were known at
    /// the point of failure.
    pub async fn dispatch(&self, message: &str, user_id: &str) -> DispatchOutcome {
        let mut thread_id = None;
        let mut run_id = None;

        match self.run_dispatch(message, user_id, &mut thread_id, &mut run_id).await {
            Ok(response) => DispatchOutcome::success(thread_id, run_id, response),
            Err(e) => {
                warn!(user_id, error = %e, "dispatch failed");
                DispatchOutcome::failure(thread_id, run_id, e.to_string())
            },
        }
    }

    async fn run_dispatch(
        &self,
        message: &str,
        user_id: &str,
        thread_id: &mut Option<String>,
        run_id: &mut Option<String>,
    ) -> Result<String, DispatchError> {
        let user_id = normalize_user_id(user_id)?;

        let category = self
            .classifier
            .classify(message)
            .await
            .map_err(DispatchError::Classification)?;
        let handler = handler_for(category);
        info!(%category, handler = handler.handler_name, "dispatching message");

        let service = self.service.clone();
        let thread = self
            .sessions
            .get_or_create_thread(&user_id, || async move {
                service.create_thread().await.map_err(anyhow::Error::from)
            })
            .await?;
        *thread_id = Some(thread.clone());

        // Register (or find) the handler with its executor's schema.
        let (instructions, tools) = match self.registry.executor_for(category, &user_id) {
            Some(executor) => (executor.instructions(), executor.tools()),
            None => (format!("You are a {}.", handler.handler_name), vec![]),
        };
        let handler_id = self
            .service
            .ensure_handler(handler.handler_name, &instructions, &tools)
            .await?;

        self.service.post_message(&thread, "user", message).await?;
        let run = self.service.start_run(&thread, &handler_id, None).await?;
        *run_id = Some(run.id.clone());

        self.drive_run(category, &user_id, &thread, run).await
    }

    /// Poll the run state machine to a terminal state.
    ///
    /// The only suspension point is the fixed-interval sleep between polls;
    /// the deadline is checked before each one so a run stuck in progress
    /// surfaces as a timeout rather than hanging forever.
    async fn drive_run(
        &self,
        category: Category,
        user_id: &str,
        thread_id: &str,
        mut run: Run,
    ) -> Result<String, DispatchError> {
        let deadline = tokio::time::Instant::now() + self.run_deadline;

        loop {
            match run.status {
                RunStatus::Completed => {
                    debug!(run_id = %run.id, "run completed");
                    return self.fetch_response(thread_id, &run.id).await;
                },
                RunStatus::RequiresAction => {
                    let outputs = self
                        .resolve_tool_calls(category, user_id, &run.tool_calls)
                        .await;
                    // One atomic batch; partial submission is not a valid state.
                    run = self
                        .service
                        .submit_tool_outputs(thread_id, &run.id, &outputs)
                        .await?;
                },
                RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired => {
                    return Err(DispatchError::Run { status: run.status });
                },
                RunStatus::Queued | RunStatus::InProgress => {
                    if tokio::time::Instant::now() >= deadline {
                        return Err(DispatchError::Timeout {
                            seconds: self.run_deadline.as_secs(),
                        });
                    }
                    tokio::time::sleep(self.poll_interval).await;
                    run = self.service.run_status(thread_id, &run.id).await?;
                },
            }
        }
    }

    /// Produce exactly one output per pending tool call.
    ///
    /// Calls are executed sequentially; they have no data dependency on each
    /// other, and all outputs are collected before the single submission.
    async fn resolve_tool_calls(
        &self,
        category: Category,
        user_id: &str,
        tool_calls: &[ToolCall],
    ) -> Vec<ToolOutput> {
        let mut outputs = Vec::with_capacity(tool_calls.len());
        for call in tool_calls {
            let output = match serde_json::from_str::<serde_json::Value>(&call.arguments) {
                Ok(args) => self.router.route(category, &call.name, args, user_id).await,
                Err(e) => {
                    warn!(function = %call.name, error = %e, "unparseable tool arguments");
                    format!("Invalid arguments for {}: {e}", call.name)
                },
            };
            outputs.push(ToolOutput {
                tool_call_id: call.id.clone(),
                output,
            });
        }
        outputs
    }

    /// Fetch the handler's reply for this run — all assistant messages
    /// authored under the run id, in thread order.
    async fn fetch_response(&self, thread_id: &str, run_id: &str) -> Result<String, DispatchError> {
        let messages = self
            .service
            .list_messages(thread_id, MessageOrder::Asc, None)
            .await?;
        let parts: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == "assistant" && m.run_id.as_deref() == Some(run_id))
            .map(|m| m.text.as_str())
            .collect();

        if parts.is_empty() {
            return Err(DispatchError::NoResponse {
                run_id: run_id.to_string(),
            });
        }
        Ok(parts.join("\n"))
    }
}
