//! Routing of handler-requested function calls to integration executors.

use std::sync::Arc;

use tracing::{debug, warn};

use {donna_integrations::IntegrationRegistry, donna_routing::Category};

pub struct ToolRouter {
    registry: Arc<IntegrationRegistry>,
}

impl ToolRouter {
    pub fn new(registry: Arc<IntegrationRegistry>) -> Self {
        Self { registry }
    }

    /// Execute one requested function and return its output text.
    ///
    /// The user id is injected into the argument object before delegation so
    /// executors that need per-user credentials receive it uniformly. An
    /// unresolvable category/function yields an "Unknown function" string —
    /// data for the conversation service, never an error.
    pub async fn route(
        &self,
        category: Category,
        function_name: &str,
        mut args: serde_json::Value,
        user_id: &str,
    ) -> String {
        if let Some(map) = args.as_object_mut() {
            map.insert(
                "user_id".to_string(),
                serde_json::Value::String(user_id.to_string()),
            );
        }

        let Some(executor) = self.registry.executor_for(category, user_id) else {
            warn!(%category, function = function_name, "no executor bound to category");
            return format!("Unknown function: {function_name}");
        };

        debug!(%category, function = function_name, "routing tool call");
        executor.execute(function_name, &args).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use {async_trait::async_trait, chrono::DateTime, chrono_tz::Tz};

    use {
        super::*,
        donna_config::SchedulingConfig,
        donna_integrations::{
            CalendarService, EventDraft, EventPatch, EventSummary,
        },
        donna_scheduling::BusyInterval,
    };

    struct NoopCalendar;

    #[async_trait]
    impl CalendarService for NoopCalendar {
        async fn busy_intervals(
            &self,
            _user_id: &str,
            _start: DateTime<Tz>,
            _end: DateTime<Tz>,
        ) -> anyhow::Result<Vec<BusyInterval>> {
            Ok(vec![])
        }

        async fn create_event(&self, user_id: &str, draft: EventDraft) -> anyhow::Result<String> {
            Ok(format!("Event created: {} for {user_id}", draft.summary))
        }

        async fn update_event(
            &self,
            _user_id: &str,
            _event_id: &str,
            _patch: EventPatch,
        ) -> anyhow::Result<String> {
            Ok("ok".into())
        }

        async fn delete_event(&self, _user_id: &str, _event_id: &str) -> anyhow::Result<String> {
            Ok("Event deleted successfully.".into())
        }

        async fn list_events(
            &self,
            _user_id: &str,
            _start: DateTime<Tz>,
            _end: DateTime<Tz>,
        ) -> anyhow::Result<Vec<EventSummary>> {
            Ok(vec![])
        }
    }

    fn router_with_calendar() -> ToolRouter {
        let registry = IntegrationRegistry::new(SchedulingConfig::default())
            .with_calendar(Arc::new(NoopCalendar));
        ToolRouter::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn routes_to_the_bound_executor() {
        let out = router_with_calendar()
            .route(
                Category::Schedule,
                "create_event",
                serde_json::json!({
                    "summary": "Standup",
                    "start_time": "2024-11-01T10:00:00",
                    "end_time": "2024-11-01T10:15:00",
                }),
                "slack_U1",
            )
            .await;
        assert_eq!(out, "Event created: Standup for slack_U1");
    }

    #[tokio::test]
    async fn unbound_category_yields_unknown_function() {
        let router = ToolRouter::new(Arc::new(IntegrationRegistry::new(
            SchedulingConfig::default(),
        )));
        let out = router
            .route(
                Category::Travel,
                "search_flights",
                serde_json::json!({}),
                "slack_U1",
            )
            .await;
        assert_eq!(out, "Unknown function: search_flights");
    }

    #[tokio::test]
    async fn general_category_yields_unknown_function() {
        let out = router_with_calendar()
            .route(Category::General, "anything", serde_json::json!({}), "slack_U1")
            .await;
        assert_eq!(out, "Unknown function: anything");
    }

    #[tokio::test]
    async fn function_unknown_to_the_executor_is_still_a_string() {
        let out = router_with_calendar()
            .route(
                Category::Schedule,
                "frobnicate",
                serde_json::json!({}),
                "slack_U1",
            )
            .await;
        assert_eq!(out, "Unknown function: frobnicate");
    }
}
