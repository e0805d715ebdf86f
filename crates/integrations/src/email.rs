//! Email executor: send or draft messages through the user's mailbox.

use std::sync::Arc;

use {async_trait::async_trait, tracing::warn};

use donna_conversations::ToolSchema;

use crate::{ExecutorError, IntegrationExecutor, params};

/// Mailbox backend (e.g. a Gmail wrapper). Credential lookup per `user_id`
/// is the implementation's concern.
#[async_trait]
pub trait MailService: Send + Sync {
    async fn send_email(
        &self,
        user_id: &str,
        to: &str,
        subject: &str,
        body: &str,
        attachments: &[String],
    ) -> anyhow::Result<String>;

    async fn create_draft(
        &self,
        user_id: &str,
        to: &str,
        subject: &str,
        body: &str,
        attachments: &[String],
    ) -> anyhow::Result<String>;
}

pub struct EmailExecutor {
    service: Arc<dyn MailService>,
    user_id: String,
}

impl EmailExecutor {
    pub fn new(service: Arc<dyn MailService>, user_id: impl Into<String>) -> Self {
        Self {
            service,
            user_id: user_id.into(),
        }
    }

    fn attachments(args: &serde_json::Value) -> Vec<String> {
        args.get("attachments")
            .and_then(serde_json::Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(serde_json::Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    async fn send_email(&self, args: &serde_json::Value) -> Result<String, ExecutorError> {
        params::require(args, "sending an email", &["to", "subject", "body"])?;
        self.service
            .send_email(
                &self.user_id,
                params::str_field(args, "to")?,
                params::str_field(args, "subject")?,
                params::str_field(args, "body")?,
                &Self::attachments(args),
            )
            .await
            .map_err(|e| ExecutorError::downstream("sending the email", e))
    }

    async fn create_draft(&self, args: &serde_json::Value) -> Result<String, ExecutorError> {
        params::require(args, "creating a draft", &["to", "subject", "body"])?;
        self.service
            .create_draft(
                &self.user_id,
                params::str_field(args, "to")?,
                params::str_field(args, "subject")?,
                params::str_field(args, "body")?,
                &Self::attachments(args),
            )
            .await
            .map_err(|e| ExecutorError::downstream("creating the draft", e))
    }
}

#[async_trait]
impl IntegrationExecutor for EmailExecutor {
    fn tools(&self) -> Vec<ToolSchema> {
        let parameters = serde_json::json!({
            "type": "object",
            "properties": {
                "to": {"type": "string", "description": "Recipient email address"},
                "subject": {"type": "string", "description": "Email subject"},
                "body": {"type": "string", "description": "Email body content"},
                "attachments": {"type": "array", "items": {"type": "string"}, "description": "List of file paths to attach"}
            },
            "required": ["to", "subject", "body"],
            "additionalProperties": false
        });
        vec![
            ToolSchema {
                name: "send_email".into(),
                description: "Send a new email with the provided details.".into(),
                parameters: parameters.clone(),
            },
            ToolSchema {
                name: "create_draft".into(),
                description: "Create a draft email with the provided details.".into(),
                parameters,
            },
        ]
    }

    fn instructions(&self) -> String {
        "You are a Gmail Assistant. Your responsibility is to compose and send emails or create drafts based on user requests.\n\
         When a user asks to send an email, use the 'send_email' function.\n\
         When a user asks to create a draft, use the 'create_draft' function.\n\
         Send the email or create the draft immediately without asking for confirmation unless the user specifically requests to review it first."
            .to_string()
    }

    async fn execute(&self, function_name: &str, args: &serde_json::Value) -> String {
        let result = match function_name {
            "send_email" => self.send_email(args).await,
            "create_draft" => self.create_draft(args).await,
            other => Err(ExecutorError::UnknownFunction(other.to_string())),
        };
        result.unwrap_or_else(|e| {
            warn!(function = function_name, error = %e, "email function degraded to error text");
            e.to_string()
        })
    }
}
