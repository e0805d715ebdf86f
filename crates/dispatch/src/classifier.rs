//! Category classification through the conversation service.
//!
//! The classifier keeps its own thread, separate from any user's task
//! session, and reuses it across calls so earlier turns provide context.

use std::{sync::Arc, time::Duration};

use {
    async_trait::async_trait,
    tokio::sync::Mutex,
    tracing::{debug, warn},
};

use {
    donna_config::ConversationConfig,
    donna_conversations::{ConversationService, MessageOrder, Result, RunStatus},
    donna_routing::{Category, classifier_handler, handlers},
};

/// Classification seam. The dispatcher only needs this one method; tests
/// substitute a fixed implementation.
#[async_trait]
pub trait MessageClassifier: Send + Sync {
    /// Classify a message. Service failures propagate; an out-of-set answer
    /// does not — it coerces to [`Category::General`].
    async fn classify(&self, message: &str) -> Result<Category>;
}

pub struct Classifier {
    service: Arc<dyn ConversationService>,
    context_limit: u32,
    poll_interval: Duration,
    deadline: Duration,
    /// Lazily created, then reused for every classification call.
    thread: Mutex<Option<String>>,
}

impl Classifier {
    pub fn new(service: Arc<dyn ConversationService>, config: &ConversationConfig) -> Self {
        Self {
            service,
            context_limit: config.classifier_context_limit,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            deadline: Duration::from_secs(config.run_deadline_secs),
            thread: Mutex::new(None),
        }
    }

    async fn thread_id(&self) -> Result<String> {
        let mut thread = self.thread.lock().await;
        if let Some(id) = thread.as_ref() {
            return Ok(id.clone());
        }
        let id = self.service.create_thread().await?;
        *thread = Some(id.clone());
        Ok(id)
    }

    fn instructions(context: &str) -> String {
        let labels: Vec<&str> = handlers().iter().map(|h| h.category.as_str()).collect();
        format!(
            "Classify the last user message into one of these categories: {}.\n\
             Consider the context of the conversation:\n\n{context}\n\n\
             Your response should be a single word (the category).",
            labels.join(", ")
        )
    }

    /// Wait for the classification run to finish. The classifier handler has
    /// no tools, so `requires_action` counts as a failure here.
    async fn wait_for_run(&self, thread_id: &str, run_id: &str) -> Result<()> {
        let deadline = tokio::time::Instant::now() + self.deadline;
        loop {
            let run = self.service.run_status(thread_id, run_id).await?;
            match run.status {
                RunStatus::Completed => return Ok(()),
                status if status.is_terminal() || status == RunStatus::RequiresAction => {
                    return Err(donna_conversations::Error::message(format!(
                        "classification run ended with status {status}"
                    )));
                },
                _ => {
                    if tokio::time::Instant::now() >= deadline {
                        return Err(donna_conversations::Error::message(
                            "classification run timed out",
                        ));
                    }
                    tokio::time::sleep(self.poll_interval).await;
                },
            }
        }
    }
}

#[async_trait]
impl MessageClassifier for Classifier {
    async fn classify(&self, message: &str) -> Result<Category> {
        let handler = classifier_handler();
        let handler_id = self
            .service
            .ensure_handler(
                handler.handler_name,
                "You are a classifier assistant that categorizes user inputs.",
                &[],
            )
            .await?;

        let thread_id = self.thread_id().await?;
        self.service.post_message(&thread_id, "user", message).await?;

        // Recent turns, oldest first, as classification context.
        let recent = self
            .service
            .list_messages(&thread_id, MessageOrder::Desc, Some(self.context_limit))
            .await?;
        let context = recent
            .iter()
            .rev()
            .map(|m| format!("{}: {}", m.role, m.text))
            .collect::<Vec<_>>()
            .join("\n");

        let run = self
            .service
            .start_run(&thread_id, &handler_id, Some(&Self::instructions(&context)))
            .await?;
        self.wait_for_run(&thread_id, &run.id).await?;

        let messages = self
            .service
            .list_messages(&thread_id, MessageOrder::Desc, Some(self.context_limit))
            .await?;
        let raw = messages
            .iter()
            .find(|m| m.role == "assistant" && m.run_id.as_deref() == Some(run.id.as_str()))
            .map(|m| m.text.as_str())
            .unwrap_or_default();

        let category = Category::parse(raw);
        if category == Category::General && raw.trim().to_lowercase() != "general" {
            warn!(raw, "unrecognized classifier output, falling back to general");
        }
        debug!(%category, "classified message");
        Ok(category)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use super::*;
    use donna_conversations::{Error, Run, ThreadMessage, ToolOutput, ToolSchema};

    /// Conversation service that answers every classification run with a
    /// fixed reply.
    struct ScriptedService {
        reply: String,
        fail_runs: bool,
        threads_created: StdMutex<usize>,
        last_run: StdMutex<Option<String>>,
    }

    impl ScriptedService {
        fn replying(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                fail_runs: false,
                threads_created: StdMutex::new(0),
                last_run: StdMutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ConversationService for ScriptedService {
        async fn create_thread(&self) -> Result<String> {
            let mut count = self.threads_created.lock().unwrap();
            *count += 1;
            Ok(format!("clf-thread-{count}"))
        }

        async fn delete_thread(&self, _thread_id: &str) -> Result<()> {
            Ok(())
        }

        async fn post_message(&self, _thread_id: &str, _role: &str, _text: &str) -> Result<()> {
            Ok(())
        }

        async fn ensure_handler(
            &self,
            _name: &str,
            _instructions: &str,
            _tools: &[ToolSchema],
        ) -> Result<String> {
            Ok("clf-handler".to_string())
        }

        async fn start_run(
            &self,
            _thread_id: &str,
            _handler_id: &str,
            _instructions: Option<&str>,
        ) -> Result<Run> {
            if self.fail_runs {
                return Err(Error::message("service down"));
            }
            let id = "clf-run".to_string();
            *self.last_run.lock().unwrap() = Some(id.clone());
            Ok(Run {
                id,
                status: RunStatus::Queued,
                tool_calls: vec![],
            })
        }

        async fn run_status(&self, _thread_id: &str, run_id: &str) -> Result<Run> {
            Ok(Run {
                id: run_id.to_string(),
                status: RunStatus::Completed,
                tool_calls: vec![],
            })
        }

        async fn submit_tool_outputs(
            &self,
            _thread_id: &str,
            _run_id: &str,
            _outputs: &[ToolOutput],
        ) -> Result<Run> {
            Err(Error::message("classifier runs have no tools"))
        }

        async fn list_messages(
            &self,
            _thread_id: &str,
            _order: MessageOrder,
            _limit: Option<u32>,
        ) -> Result<Vec<ThreadMessage>> {
            Ok(vec![ThreadMessage {
                role: "assistant".into(),
                text: self.reply.clone(),
                run_id: self.last_run.lock().unwrap().clone(),
            }])
        }
    }

    fn classifier(service: ScriptedService) -> Classifier {
        Classifier::new(Arc::new(service), &ConversationConfig::default())
    }

    #[tokio::test]
    async fn known_label_is_returned() {
        let c = classifier(ScriptedService::replying("schedule"));
        assert_eq!(c.classify("book a meeting").await.unwrap(), Category::Schedule);
    }

    #[tokio::test]
    async fn label_is_trimmed_and_lowercased() {
        let c = classifier(ScriptedService::replying("  Travel \n"));
        assert_eq!(c.classify("fly me to Lisbon").await.unwrap(), Category::Travel);
    }

    #[tokio::test]
    async fn out_of_set_output_coerces_to_general() {
        for reply in ["I think this is about travel plans!", "", "todo list please"] {
            let c = classifier(ScriptedService::replying(reply));
            assert_eq!(
                c.classify("anything").await.unwrap(),
                Category::General,
                "reply: {reply:?}"
            );
        }
    }

    #[tokio::test]
    async fn classifier_thread_is_created_once() {
        let service = Arc::new(ScriptedService::replying("todo"));
        let c = Classifier::new(service.clone(), &ConversationConfig::default());
        c.classify("first").await.unwrap();
        c.classify("second").await.unwrap();
        assert_eq!(*service.threads_created.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn service_failure_propagates() {
        let mut service = ScriptedService::replying("schedule");
        service.fail_runs = true;
        let c = classifier(service);
        assert!(c.classify("anything").await.is_err());
    }
}
