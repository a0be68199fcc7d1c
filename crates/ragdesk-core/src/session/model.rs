//! Session domain model.
//!
//! This module contains the Session value that the session controller owns
//! for the lifetime of one client, along with the answering-mode settings
//! it carries.

use super::message::Message;
use super::store::MessageStore;
use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Number of consecutive failed queries that triggers the degraded-mode notice.
pub const DEGRADED_MODE_THRESHOLD: u32 = 3;

/// How the backend should answer a question.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum QueryMode {
    /// Backend picks between retrieval and query generation.
    Hybrid,
    /// Generate and run SQL against the analytics store.
    Sql,
    /// Retrieval-augmented text answer with citations.
    Rag,
    /// Generate and run Python (dataframe) analysis.
    Python,
}

/// Answering settings: the `/config` payload and the unit committed into a
/// session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub mode: QueryMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Settings {
    pub fn new(mode: QueryMode, model: Option<String>) -> Self {
        Self { mode, model }
    }
}

/// One client lifetime: conversation log, answering settings and the
/// consecutive-failure counter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    history: MessageStore,
    settings: Settings,
    error_count: u32,
}

impl Session {
    /// Creates an empty session with the given default settings.
    pub fn new(defaults: Settings) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            history: MessageStore::new(),
            settings: defaults,
            error_count: 0,
        }
    }

    pub fn history(&self) -> &MessageStore {
        &self.history
    }

    /// Appends a message to the conversation log.
    pub fn append(&mut self, message: Message) -> Result<(), ValidationError> {
        self.history.append(message)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mode(&self) -> QueryMode {
        self.settings.mode
    }

    pub fn model(&self) -> Option<&str> {
        self.settings.model.as_deref()
    }

    pub fn error_count(&self) -> u32 {
        self.error_count
    }

    /// Records a successful backend call.
    pub fn record_success(&mut self) {
        self.error_count = 0;
    }

    /// Records a failed backend call and returns the new count.
    pub fn record_failure(&mut self) -> u32 {
        self.error_count = self.error_count.saturating_add(1);
        self.error_count
    }

    /// Replaces mode and model together.
    pub fn commit_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    /// Clears the conversation and restores defaults. The session id is kept.
    pub fn reset(&mut self, defaults: Settings) {
        self.history.clear();
        self.settings = defaults;
        self.error_count = 0;
    }
}
