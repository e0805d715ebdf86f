//! Config schema types (conversation service, scheduling, sessions).

use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DonnaConfig {
    pub conversation: ConversationConfig,
    pub scheduling: SchedulingConfig,
    pub sessions: SessionsConfig,
}

/// Conversation service (OpenAI Assistants API) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// API key. Usually supplied as `api_key = "${OPENAI_API_KEY}"`.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<Secret<String>>,
    /// Base URL of the service.
    pub base_url: String,
    /// Model assigned to newly registered handlers.
    pub model: String,
    /// Fixed interval between run status polls.
    pub poll_interval_ms: u64,
    /// Deadline for a single run; expiry yields a timeout error, not a hang.
    pub run_deadline_secs: u64,
    /// How many recent turns the classifier includes as context.
    pub classifier_context_limit: u32,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".into(),
            model: "gpt-4o-2024-08-06".into(),
            poll_interval_ms: 500,
            run_deadline_secs: 120,
            classifier_context_limit: 5,
        }
    }
}

impl ConversationConfig {
    /// Expose the configured API key, if any.
    #[must_use]
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|k| k.expose_secret().as_str())
    }
}

/// Availability scheduling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// IANA timezone applied when a request doesn't resolve one.
    pub default_timezone: String,
    /// Working-hour window start (hour of day, 0–23).
    pub working_hours_start: u8,
    /// Working-hour window end (hour of day, 0–23, exclusive).
    pub working_hours_end: u8,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            default_timezone: "UTC".into(),
            working_hours_start: 9,
            working_hours_end: 17,
        }
    }
}

/// Conversation session store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Sessions idle longer than this are eligible for the sweep command.
    pub idle_ttl_hours: u64,
    /// Override for the session index path. Defaults to
    /// `<config_dir>/sessions.json`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            idle_ttl_hours: 24,
            store_path: None,
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let cfg = DonnaConfig::default();
        assert_eq!(cfg.conversation.poll_interval_ms, 500);
        assert_eq!(cfg.scheduling.working_hours_start, 9);
        assert_eq!(cfg.scheduling.working_hours_end, 17);
        assert_eq!(cfg.sessions.idle_ttl_hours, 24);
        assert!(cfg.conversation.api_key().is_none());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let cfg: DonnaConfig = toml::from_str(
            r#"
            [conversation]
            api_key = "sk-test"
            run_deadline_secs = 30

            [scheduling]
            default_timezone = "America/New_York"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.conversation.api_key(), Some("sk-test"));
        assert_eq!(cfg.conversation.run_deadline_secs, 30);
        assert_eq!(cfg.conversation.poll_interval_ms, 500);
        assert_eq!(cfg.scheduling.default_timezone, "America/New_York");
        assert_eq!(cfg.scheduling.working_hours_end, 17);
    }
}
