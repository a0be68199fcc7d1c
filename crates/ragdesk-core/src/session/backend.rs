//! Backend contract used by the session controller.
//!
//! The trait lives in the domain layer so the controller can be driven by
//! the HTTP implementation in `ragdesk-interaction` or by a test double.

use super::message::{MessageMetadata, TranscriptEntry};
use super::model::{QueryMode, Settings};
use crate::error::QueryError;
use async_trait::async_trait;
use serde::Serialize;

/// Body of a `POST /query` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryRequest<'a> {
    pub question: &'a str,
    pub chat_history: Vec<TranscriptEntry<'a>>,
    pub mode: QueryMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'a str>,
}

/// A successful answer, already normalised into the message metadata schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub answer: String,
    pub metadata: MessageMetadata,
}

impl Answer {
    pub fn text(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            metadata: MessageMetadata::default(),
        }
    }
}

/// The three calls a question-answering backend exposes.
///
/// Implementations classify every failure into [`QueryError`] and must not
/// touch session state.
#[async_trait]
pub trait QaBackend: Send + Sync {
    /// Asks a question with the given conversational context.
    async fn query(&self, request: &QueryRequest<'_>) -> Result<Answer, QueryError>;

    /// Asks the backend to drop its conversation state.
    async fn reset(&self) -> Result<(), QueryError>;

    /// Pushes new answering settings to the backend.
    async fn apply_config(&self, settings: &Settings) -> Result<(), QueryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::message::MessageRole;
    use serde_json::json;

    #[test]
    fn test_query_request_wire_shape() {
        let request = QueryRequest {
            question: "What were Q1 sales?",
            chat_history: vec![
                TranscriptEntry {
                    role: MessageRole::User,
                    content: "hello",
                },
                TranscriptEntry {
                    role: MessageRole::Assistant,
                    content: "hi",
                },
            ],
            mode: QueryMode::Sql,
            model: Some("mixtral:8x7b"),
        };

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "question": "What were Q1 sales?",
                "chat_history": [
                    {"role": "user", "content": "hello"},
                    {"role": "assistant", "content": "hi"}
                ],
                "mode": "sql",
                "model": "mixtral:8x7b"
            })
        );
    }

    #[test]
    fn test_query_request_without_model() {
        let request = QueryRequest {
            question: "q",
            chat_history: Vec::new(),
            mode: QueryMode::Rag,
            model: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("model").is_none());
    }
}
