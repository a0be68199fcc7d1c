//! Conversation message types.
//!
//! This module contains types for representing messages in a conversation,
//! including roles, the structured metadata an assistant answer may carry,
//! and the transcript shape sent upstream as conversational context.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the answering backend.
    Assistant,
    /// Client-generated notice (failures, degraded mode). Never sent upstream.
    System,
}

impl MessageRole {
    /// Whether messages with this role belong in the upstream transcript.
    pub fn is_conversational(self) -> bool {
        matches!(self, Self::User | Self::Assistant)
    }
}

/// Language of a generated analytical query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum QueryKind {
    Sql,
    Python,
}

impl QueryKind {
    /// Upper-case label used in headings ("SQL", "PYTHON").
    pub fn label(self) -> String {
        self.to_string().to_uppercase()
    }
}

/// An analytical query the backend generated to produce its answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuery {
    pub text: String,
    pub kind: QueryKind,
}

/// Tabular result set with an explicit column order.
///
/// Rows are stored positionally; a missing cell is `Value::Null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabularData {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TabularData {
    /// Builds a table from record-oriented rows (`[{column: value}, ...]`).
    ///
    /// Columns are ordered by first appearance across all rows.
    pub fn from_records(records: Vec<Map<String, Value>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .into_iter()
            .map(|mut record| {
                columns
                    .iter()
                    .map(|column| record.remove(column).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Builds a table from column-oriented data (`{column: [values]}`).
    ///
    /// Shorter columns are padded with `Value::Null`.
    pub fn from_columns(columns: Vec<(String, Vec<Value>)>) -> Self {
        let height = columns.iter().map(|(_, values)| values.len()).max().unwrap_or(0);
        let mut rows = vec![Vec::with_capacity(columns.len()); height];
        let mut names = Vec::with_capacity(columns.len());

        for (name, values) in columns {
            names.push(name);
            let mut values = values.into_iter();
            for row in rows.iter_mut() {
                row.push(values.next().unwrap_or(Value::Null));
            }
        }

        Self {
            columns: names,
            rows,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A retrieval citation backing an answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Structured payload attached to an assistant answer.
///
/// All parts are optional. Only [`Message::assistant`] accepts metadata, so
/// user and system messages always carry the empty value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<GeneratedQuery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<TabularData>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

impl MessageMetadata {
    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.data.is_none() && self.sources.is_empty()
    }
}

/// A single message in a conversation history.
///
/// Messages are immutable once built; the timestamp is fixed at creation
/// (ISO 8601 / RFC 3339, UTC). Messages are only built through the role
/// constructors, so user and system messages never carry metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    role: MessageRole,
    content: String,
    timestamp: String,
    metadata: MessageMetadata,
}

impl Message {
    fn new(role: MessageRole, content: impl Into<String>, metadata: MessageMetadata) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            metadata,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content, MessageMetadata::default())
    }

    pub fn assistant(content: impl Into<String>, metadata: MessageMetadata) -> Self {
        Self::new(MessageRole::Assistant, content, metadata)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content, MessageMetadata::default())
    }

    pub fn role(&self) -> MessageRole {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn metadata(&self) -> &MessageMetadata {
        &self.metadata
    }
}

/// One entry of the conversational context sent to the backend.
///
/// Serializes as `{"role": "...", "content": "..."}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TranscriptEntry<'a> {
    pub role: MessageRole,
    pub content: &'a str,
}
