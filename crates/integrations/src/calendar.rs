//! Calendar executor: availability checks and event CRUD.

use std::sync::Arc;

use {
    async_trait::async_trait,
    chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone},
    chrono_tz::Tz,
    tracing::{debug, warn},
};

use {
    donna_config::SchedulingConfig,
    donna_conversations::ToolSchema,
    donna_scheduling::{BusyInterval, WorkingHours, find_free_blocks, format_availability},
};

use crate::{ExecutorError, IntegrationExecutor, params};

/// Narrow view of the user's calendar backend (e.g. a Google Calendar
/// wrapper). Implementations own credential lookup per `user_id`.
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Busy intervals between `start` and `end`, already in the requested
    /// timezone.
    async fn busy_intervals(
        &self,
        user_id: &str,
        start: DateTime<Tz>,
        end: DateTime<Tz>,
    ) -> anyhow::Result<Vec<BusyInterval>>;

    /// Create an event; returns a confirmation line (e.g. with a link).
    async fn create_event(&self, user_id: &str, draft: EventDraft) -> anyhow::Result<String>;

    /// Patch an existing event; unset fields stay untouched.
    async fn update_event(
        &self,
        user_id: &str,
        event_id: &str,
        patch: EventPatch,
    ) -> anyhow::Result<String>;

    async fn delete_event(&self, user_id: &str, event_id: &str) -> anyhow::Result<String>;

    async fn list_events(
        &self,
        user_id: &str,
        start: DateTime<Tz>,
        end: DateTime<Tz>,
    ) -> anyhow::Result<Vec<EventSummary>>;
}

/// Fields for a new event.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub summary: String,
    pub start_time: String,
    pub end_time: String,
    pub description: String,
    pub location: String,
    pub timezone: String,
}

/// Partial update for an existing event.
#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub summary: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
}

/// One event row returned by [`CalendarService::list_events`].
#[derive(Debug, Clone)]
pub struct EventSummary {
    pub id: String,
    pub summary: String,
    pub start: String,
    pub end: String,
    pub location: Option<String>,
}

pub struct CalendarExecutor {
    service: Arc<dyn CalendarService>,
    user_id: String,
    defaults: SchedulingConfig,
}

impl CalendarExecutor {
    pub fn new(
        service: Arc<dyn CalendarService>,
        user_id: impl Into<String>,
        defaults: SchedulingConfig,
    ) -> Self {
        Self {
            service,
            user_id: user_id.into(),
            defaults,
        }
    }

    /// Resolve the request timezone. The literal `"NULL"` (the schema's
    /// "not specified" marker), an empty string, and an absent field all fall
    /// back to the configured default.
    fn resolve_timezone(&self, args: &serde_json::Value) -> Result<Tz, ExecutorError> {
        let name = match params::opt_str_field(args, "timezone") {
            Some("NULL") | Some("") | None => self.defaults.default_timezone.as_str(),
            Some(name) => name,
        };
        name.parse()
            .map_err(|_| ExecutorError::invalid(format!("Invalid timezone: {name}")))
    }

    /// Local-midnight range covering `start_date` through the whole of
    /// `end_date`.
    fn day_range(
        tz: Tz,
        start_date: &str,
        end_date: &str,
    ) -> Result<(DateTime<Tz>, DateTime<Tz>), ExecutorError> {
        let start = parse_date(start_date)?;
        let end = parse_date(end_date)?;
        let end = end
            .succ_opt()
            .ok_or_else(|| ExecutorError::invalid(format!("Invalid date: {end_date}")))?;
        Ok((midnight(tz, start)?, midnight(tz, end)?))
    }

    async fn check_available_slots(&self, args: &serde_json::Value) -> Result<String, ExecutorError> {
        const ACTION: &str = "checking available slots";
        params::require(args, ACTION, &["start_date", "end_date", "duration"])?;

        let tz = self.resolve_timezone(args)?;
        let duration = Duration::minutes(params::int_field(args, "duration")?);
        let (start, end) =
            Self::day_range(tz, params::str_field(args, "start_date")?, params::str_field(args, "end_date")?)?;

        debug!(user_id = %self.user_id, %start, %end, "querying busy intervals");
        let busy = self
            .service
            .busy_intervals(&self.user_id, start, end)
            .await
            .map_err(|e| ExecutorError::downstream(ACTION, e))?;

        let working_hours =
            WorkingHours::new(self.defaults.working_hours_start, self.defaults.working_hours_end);
        let days = find_free_blocks(start, end, &busy, working_hours, duration, tz);
        Ok(format_availability(&days, &tz.to_string()))
    }

    async fn create_event(&self, args: &serde_json::Value) -> Result<String, ExecutorError> {
        const ACTION: &str = "creating an event";
        params::require(args, ACTION, &["summary", "start_time", "end_time"])?;

        let tz = self.resolve_timezone(args)?;
        let draft = EventDraft {
            summary: params::str_field(args, "summary")?.to_string(),
            start_time: params::str_field(args, "start_time")?.to_string(),
            end_time: params::str_field(args, "end_time")?.to_string(),
            description: params::opt_str_field(args, "description").unwrap_or_default().to_string(),
            location: params::opt_str_field(args, "location").unwrap_or_default().to_string(),
            timezone: tz.to_string(),
        };
        self.service
            .create_event(&self.user_id, draft)
            .await
            .map_err(|e| ExecutorError::downstream(ACTION, e))
    }

    async fn update_event(&self, args: &serde_json::Value) -> Result<String, ExecutorError> {
        const ACTION: &str = "updating an event";
        params::require(args, ACTION, &["event_id"])?;

        let patch = EventPatch {
            summary: params::opt_str_field(args, "summary").map(str::to_string),
            start_time: params::opt_str_field(args, "start_time").map(str::to_string),
            end_time: params::opt_str_field(args, "end_time").map(str::to_string),
            description: params::opt_str_field(args, "description").map(str::to_string),
            location: params::opt_str_field(args, "location").map(str::to_string),
        };
        self.service
            .update_event(&self.user_id, params::str_field(args, "event_id")?, patch)
            .await
            .map_err(|e| ExecutorError::downstream(ACTION, e))
    }

    async fn delete_event(&self, args: &serde_json::Value) -> Result<String, ExecutorError> {
        const ACTION: &str = "deleting an event";
        params::require(args, ACTION, &["event_id"])?;
        self.service
            .delete_event(&self.user_id, params::str_field(args, "event_id")?)
            .await
            .map_err(|e| ExecutorError::downstream(ACTION, e))
    }

    async fn list_events(&self, args: &serde_json::Value) -> Result<String, ExecutorError> {
        const ACTION: &str = "listing events";
        params::require(args, ACTION, &["start_date", "end_date"])?;

        let tz = self.resolve_timezone(args)?;
        let (start, end) =
            Self::day_range(tz, params::str_field(args, "start_date")?, params::str_field(args, "end_date")?)?;

        let events = self
            .service
            .list_events(&self.user_id, start, end)
            .await
            .map_err(|e| ExecutorError::downstream(ACTION, e))?;

        if events.is_empty() {
            return Ok("No events found in the given date range.".to_string());
        }
        let mut out = String::new();
        for event in events {
            out.push_str(&format!("{} - {}: {}", event.start, event.end, event.summary));
            if let Some(location) = &event.location {
                out.push_str(&format!(" ({location})"));
            }
            out.push_str(&format!(" [{}]\n", event.id));
        }
        Ok(out.trim_end().to_string())
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, ExecutorError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ExecutorError::invalid(format!("Invalid date: {raw} (expected YYYY-MM-DD)")))
}

fn midnight(tz: Tz, date: NaiveDate) -> Result<DateTime<Tz>, ExecutorError> {
    let time = NaiveTime::from_hms_opt(0, 0, 0)
        .ok_or_else(|| ExecutorError::invalid("Invalid time"))?;
    tz.from_local_datetime(&date.and_time(time))
        .earliest()
        .ok_or_else(|| ExecutorError::invalid(format!("Nonexistent local time on {date}")))
}

#[async_trait]
impl IntegrationExecutor for CalendarExecutor {
    fn tools(&self) -> Vec<ToolSchema> {
        vec![
            ToolSchema {
                name: "check_available_slots".into(),
                description: "Check available time slots in the calendar within a given date range."
                    .into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "start_date": {"type": "string", "description": "The start date of the range to check (YYYY-MM-DD)"},
                        "end_date": {"type": "string", "description": "The end date of the range to check (YYYY-MM-DD)"},
                        "duration": {"type": "integer", "description": "The duration of the slot in minutes"},
                        "timezone": {"type": "string", "description": "The timezone for the search (optional, default is NULL)"}
                    },
                    "required": ["start_date", "end_date", "duration", "timezone"],
                    "additionalProperties": false
                }),
            },
            ToolSchema {
                name: "create_event".into(),
                description: "Create a new event in the calendar.".into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "summary": {"type": "string", "description": "The title of the event"},
                        "start_time": {"type": "string", "description": "The start time of the event (YYYY-MM-DDTHH:MM:SS)"},
                        "end_time": {"type": "string", "description": "The end time of the event (YYYY-MM-DDTHH:MM:SS)"},
                        "description": {"type": "string", "description": "The description of the event (optional)"},
                        "location": {"type": "string", "description": "The location of the event (optional)"},
                        "timezone": {"type": "string", "description": "The timezone for the event (optional, default is NULL)"}
                    },
                    "required": ["summary", "start_time", "end_time", "description", "location", "timezone"],
                    "additionalProperties": false
                }),
            },
            ToolSchema {
                name: "update_event".into(),
                description: "Update an existing event in the calendar.".into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "event_id": {"type": "string", "description": "The ID of the event to update"},
                        "summary": {"type": "string", "description": "The updated title of the event (optional)"},
                        "start_time": {"type": "string", "description": "The updated start time of the event (optional)"},
                        "end_time": {"type": "string", "description": "The updated end time of the event (optional)"}
                    },
                    "required": ["event_id"],
                    "additionalProperties": false
                }),
            },
            ToolSchema {
                name: "delete_event".into(),
                description: "Delete an event from the calendar.".into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "event_id": {"type": "string", "description": "The ID of the event to delete"}
                    },
                    "required": ["event_id"],
                    "additionalProperties": false
                }),
            },
            ToolSchema {
                name: "list_events".into(),
                description: "List events in the calendar within a given date range.".into(),
                parameters: serde_json::json!({
                    "type": "object",
                    "properties": {
                        "start_date": {"type": "string", "description": "The start date of the range to check (YYYY-MM-DD)"},
                        "end_date": {"type": "string", "description": "The end date of the range to check (YYYY-MM-DD)"},
                        "timezone": {"type": "string", "description": "The timezone for the search (optional, default is NULL)"}
                    },
                    "required": ["start_date", "end_date"],
                    "additionalProperties": false
                }),
            },
        ]
    }

    fn instructions(&self) -> String {
        "You are a Calendar Assistant. Use the provided functions to complete the user's requests:\n\
         - Checking available time slots in the calendar.\n\
         - Creating new events in the calendar.\n\
         - Updating existing events in the calendar.\n\
         - Deleting events from the calendar.\n\
         - Listing events within a given date range.\n\n\
         Always confirm with the user before making any changes to preexisting events."
            .to_string()
    }

    async fn execute(&self, function_name: &str, args: &serde_json::Value) -> String {
        let result = match function_name {
            "check_available_slots" => self.check_available_slots(args).await,
            "create_event" => self.create_event(args).await,
            "update_event" => self.update_event(args).await,
            "delete_event" => self.delete_event(args).await,
            "list_events" => self.list_events(args).await,
            other => Err(ExecutorError::UnknownFunction(other.to_string())),
        };
        result.unwrap_or_else(|e| {
            warn!(function = function_name, error = %e, "calendar function degraded to error text");
            e.to_string()
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Scripted calendar backend: fixed busy intervals, recorded mutations.
    #[derive(Default)]
    struct FakeCalendar {
        busy: Vec<(String, String)>,
        events: Vec<EventSummary>,
        fail: bool,
        created: Mutex<Vec<EventDraft>>,
    }

    #[async_trait]
    impl CalendarService for FakeCalendar {
        async fn busy_intervals(
            &self,
            _user_id: &str,
            start: DateTime<Tz>,
            _end: DateTime<Tz>,
        ) -> anyhow::Result<Vec<BusyInterval>> {
            if self.fail {
                anyhow::bail!("backend unavailable");
            }
            let tz = start.timezone();
            Ok(self
                .busy
                .iter()
                .map(|(s, e)| BusyInterval {
                    start: parse_local(tz, s),
                    end: parse_local(tz, e),
                })
                .collect())
        }

        async fn create_event(&self, _user_id: &str, draft: EventDraft) -> anyhow::Result<String> {
            if self.fail {
                anyhow::bail!("backend unavailable");
            }
            let summary = draft.summary.clone();
            self.created.lock().unwrap().push(draft);
            Ok(format!("Event created: {summary}"))
        }

        async fn update_event(
            &self,
            _user_id: &str,
            event_id: &str,
            _patch: EventPatch,
        ) -> anyhow::Result<String> {
            Ok(format!("Event updated: {event_id}"))
        }

        async fn delete_event(&self, _user_id: &str, _event_id: &str) -> anyhow::Result<String> {
            Ok("Event deleted successfully.".to_string())
        }

        async fn list_events(
            &self,
            _user_id: &str,
            _start: DateTime<Tz>,
            _end: DateTime<Tz>,
        ) -> anyhow::Result<Vec<EventSummary>> {
            Ok(self.events.clone())
        }
    }

    fn parse_local(tz: Tz, raw: &str) -> DateTime<Tz> {
        let naive = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").unwrap();
        tz.from_local_datetime(&naive).single().unwrap()
    }

    fn executor(service: FakeCalendar) -> CalendarExecutor {
        CalendarExecutor::new(Arc::new(service), "slack_U1", SchedulingConfig::default())
    }

    #[tokio::test]
    async fn finds_slot_after_morning_meeting() {
        let service = FakeCalendar {
            busy: vec![("2024-11-01T09:00:00".into(), "2024-11-01T10:00:00".into())],
            ..FakeCalendar::default()
        };
        let args = serde_json::json!({
            "start_date": "2024-11-01",
            "end_date": "2024-11-01",
            "duration": 30,
            "timezone": "NULL",
        });
        let out = executor(service).execute("check_available_slots", &args).await;
        assert!(out.contains("Friday, November 01, 2024:"), "got: {out}");
        assert!(out.contains("10:00 AM - 05:00 PM"), "got: {out}");
    }

    #[tokio::test]
    async fn finds_only_the_lunch_gap() {
        let service = FakeCalendar {
            busy: vec![
                ("2024-11-01T09:00:00".into(), "2024-11-01T12:00:00".into()),
                ("2024-11-01T12:30:00".into(), "2024-11-01T17:00:00".into()),
            ],
            ..FakeCalendar::default()
        };
        let args = serde_json::json!({
            "start_date": "2024-11-01",
            "end_date": "2024-11-01",
            "duration": 30,
        });
        let out = executor(service).execute("check_available_slots", &args).await;
        assert!(out.contains("12:00 PM - 12:30 PM"), "got: {out}");
        assert!(!out.contains("All day"), "got: {out}");
    }

    #[tokio::test]
    async fn missing_parameters_are_reported_as_text() {
        let out = executor(FakeCalendar::default())
            .execute("check_available_slots", &serde_json::json!({"start_date": "2024-11-01"}))
            .await;
        assert_eq!(
            out,
            "Missing required parameters for checking available slots: end_date, duration"
        );
    }

    #[tokio::test]
    async fn unknown_function_is_reported_as_text() {
        let out = executor(FakeCalendar::default())
            .execute("frobnicate", &serde_json::json!({}))
            .await;
        assert_eq!(out, "Unknown function: frobnicate");
    }

    #[tokio::test]
    async fn downstream_failure_degrades_to_readable_text() {
        let service = FakeCalendar {
            fail: true,
            ..FakeCalendar::default()
        };
        let args = serde_json::json!({
            "start_date": "2024-11-01",
            "end_date": "2024-11-01",
            "duration": 30,
        });
        let out = executor(service).execute("check_available_slots", &args).await;
        assert_eq!(
            out,
            "An error occurred while checking available slots: backend unavailable"
        );
    }

    #[tokio::test]
    async fn create_event_fills_defaults_and_timezone() {
        let service = FakeCalendar::default();
        let created = Arc::new(service);
        let exec =
            CalendarExecutor::new(created.clone(), "slack_U1", SchedulingConfig::default());
        let args = serde_json::json!({
            "summary": "Team sync",
            "start_time": "2024-11-01T10:00:00",
            "end_time": "2024-11-01T10:30:00",
        });
        let out = exec.execute("create_event", &args).await;
        assert_eq!(out, "Event created: Team sync");

        let drafts = created.created.lock().unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].timezone, "UTC");
        assert_eq!(drafts[0].description, "");
    }

    #[tokio::test]
    async fn invalid_timezone_is_reported() {
        let args = serde_json::json!({
            "start_date": "2024-11-01",
            "end_date": "2024-11-01",
            "duration": 30,
            "timezone": "Mars/Olympus",
        });
        let out = executor(FakeCalendar::default())
            .execute("check_available_slots", &args)
            .await;
        assert_eq!(out, "Invalid timezone: Mars/Olympus");
    }

    #[tokio::test]
    async fn list_events_formats_rows() {
        let service = FakeCalendar {
            events: vec![EventSummary {
                id: "ev1".into(),
                summary: "Dentist".into(),
                start: "2024-11-01T10:00:00".into(),
                end: "2024-11-01T11:00:00".into(),
                location: Some("Main St".into()),
            }],
            ..FakeCalendar::default()
        };
        let args = serde_json::json!({ "start_date": "2024-11-01", "end_date": "2024-11-01" });
        let out = executor(service).execute("list_events", &args).await;
        assert_eq!(
            out,
            "2024-11-01T10:00:00 - 2024-11-01T11:00:00: Dentist (Main St) [ev1]"
        );
    }
}
