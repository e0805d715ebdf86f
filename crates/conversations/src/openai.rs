//! OpenAI Assistants API implementation of [`ConversationService`].
//!
//! Speaks the v2 REST surface (`OpenAI-Beta: assistants=v2`). Handler ids are
//! cached per name after the first lookup so repeated dispatches don't re-list
//! the handler catalog.

use std::collections::HashMap;

use {
    async_trait::async_trait,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    tokio::sync::Mutex,
    tracing::{debug, warn},
};

use crate::{
    error::{Context, Error, Result},
    model::{MessageOrder, Run, RunStatus, ThreadMessage, ToolCall, ToolOutput, ToolSchema},
    service::ConversationService,
};

pub struct OpenAiConversations {
    api_key: Secret<String>,
    base_url: String,
    model: String,
    client: &'static reqwest::Client,
    /// handler name → handler id, filled on first resolution.
    handler_cache: Mutex<HashMap<String, String>>,
}

impl OpenAiConversations {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into();
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            client: crate::shared_http_client(),
            handler_cache: Mutex::new(HashMap::new()),
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<serde_json::Value> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            warn!(status = status.as_u16(), "conversation service error");
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn get(&self, path: &str) -> Result<serde_json::Value> {
        self.send(self.request(reqwest::Method::GET, path)).await
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<serde_json::Value> {
        self.send(self.request(reqwest::Method::POST, path).json(&body))
            .await
    }
}

// ── Wire shapes ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Deserialize)]
struct RunObject {
    id: String,
    status: RunStatus,
    required_action: Option<RequiredAction>,
}

#[derive(Deserialize)]
struct RequiredAction {
    submit_tool_outputs: Option<SubmitToolOutputs>,
}

#[derive(Deserialize)]
struct SubmitToolOutputs {
    tool_calls: Vec<WireToolCall>,
}

#[derive(Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Deserialize)]
struct WireFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct ListEnvelope<T> {
    data: Vec<T>,
}

#[derive(Deserialize)]
struct HandlerObject {
    id: String,
    name: Option<String>,
}

#[derive(Deserialize)]
struct MessageObject {
    role: String,
    run_id: Option<String>,
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    text: Option<TextValue>,
}

#[derive(Deserialize)]
struct TextValue {
    value: String,
}

impl RunObject {
    fn into_run(self) -> Run {
        let tool_calls = self
            .required_action
            .and_then(|ra| ra.submit_tool_outputs)
            .map(|sto| {
                sto.tool_calls
                    .into_iter()
                    .map(|tc| ToolCall {
                        id: tc.id,
                        name: tc.function.name,
                        arguments: tc.function.arguments,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Run {
            id: self.id,
            status: self.status,
            tool_calls,
        }
    }
}

impl MessageObject {
    fn into_message(self) -> ThreadMessage {
        let text = self
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .map(|t| t.value)
            .collect::<Vec<_>>()
            .join("\n");
        ThreadMessage {
            role: self.role,
            text,
            run_id: self.run_id,
        }
    }
}

fn parse<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).context("unexpected response shape")
}

#[async_trait]
impl ConversationService for OpenAiConversations {
    async fn create_thread(&self) -> Result<String> {
        let value = self.post("/threads", serde_json::json!({})).await?;
        let thread: IdObject = parse(value)?;
        debug!(thread_id = %thread.id, "created thread");
        Ok(thread.id)
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.send(self.request(reqwest::Method::DELETE, &format!("/threads/{thread_id}")))
            .await?;
        Ok(())
    }

    async fn post_message(&self, thread_id: &str, role: &str, text: &str) -> Result<()> {
        self.post(
            &format!("/threads/{thread_id}/messages"),
            serde_json::json!({ "role": role, "content": text }),
        )
        .await?;
        Ok(())
    }

    async fn ensure_handler(
        &self,
        name: &str,
        instructions: &str,
        tools: &[ToolSchema],
    ) -> Result<String> {
        let mut cache = self.handler_cache.lock().await;
        if let Some(id) = cache.get(name) {
            return Ok(id.clone());
        }

        // Existing handler registered by a previous process?
        let value = self.get("/assistants?limit=100").await?;
        let listing: ListEnvelope<HandlerObject> = parse(value)?;
        if let Some(existing) = listing.data.into_iter().find(|h| h.name.as_deref() == Some(name)) {
            cache.insert(name.to_string(), existing.id.clone());
            return Ok(existing.id);
        }

        let wire_tools: Vec<serde_json::Value> = tools.iter().map(ToolSchema::to_wire).collect();
        let value = self
            .post(
                "/assistants",
                serde_json::json!({
                    "name": name,
                    "instructions": instructions,
                    "tools": wire_tools,
                    "model": self.model,
                }),
            )
            .await?;
        let created: IdObject = parse(value)?;
        debug!(handler = name, handler_id = %created.id, "registered handler");
        cache.insert(name.to_string(), created.id.clone());
        Ok(created.id)
    }

    async fn start_run(
        &self,
        thread_id: &str,
        handler_id: &str,
        instructions: Option<&str>,
    ) -> Result<Run> {
        let mut body = serde_json::json!({ "assistant_id": handler_id });
        if let Some(instructions) = instructions {
            body["instructions"] = serde_json::Value::String(instructions.to_string());
        }
        let value = self.post(&format!("/threads/{thread_id}/runs"), body).await?;
        let run: RunObject = parse(value)?;
        Ok(run.into_run())
    }

    async fn run_status(&self, thread_id: &str, run_id: &str) -> Result<Run> {
        let value = self.get(&format!("/threads/{thread_id}/runs/{run_id}")).await?;
        let run: RunObject = parse(value)?;
        Ok(run.into_run())
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: &[ToolOutput],
    ) -> Result<Run> {
        let value = self
            .post(
                &format!("/threads/{thread_id}/runs/{run_id}/submit_tool_outputs"),
                serde_json::json!({ "tool_outputs": outputs }),
            )
            .await?;
        let run: RunObject = parse(value)?;
        Ok(run.into_run())
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        order: MessageOrder,
        limit: Option<u32>,
    ) -> Result<Vec<ThreadMessage>> {
        let mut path = format!("/threads/{thread_id}/messages?order={}", order.as_str());
        if let Some(limit) = limit {
            path.push_str(&format!("&limit={limit}"));
        }
        let value = self.get(&path).await?;
        let listing: ListEnvelope<MessageObject> = parse(value)?;
        Ok(listing
            .data
            .into_iter()
            .map(MessageObject::into_message)
            .collect())
    }
}
