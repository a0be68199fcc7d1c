use ragdesk_core::error::{QueryError, ValidationError};
use ragdesk_core::session::{
    DEGRADED_MODE_THRESHOLD, Message, QaBackend, QueryMode, QueryRequest, Session, Settings,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Notice appended once when consecutive failures reach the threshold.
pub const DEGRADED_MODE_NOTICE: &str = "Multiple consecutive errors detected. Switching to fallback mode: answers may be limited until the backend recovers.";

const EMPTY_ANSWER_PLACEHOLDER: &str = "(The backend returned an empty answer.)";

/// Called with the session when the degraded-mode notice fires.
pub type DegradedModeHook = Box<dyn Fn(&Session) + Send + Sync>;

/// Whether a question is currently awaiting the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Pending,
}

/// Shared view of a controller's phase, readable without locking the
/// controller.
#[derive(Debug, Clone, Default)]
pub struct PhaseIndicator(Arc<AtomicBool>);

impl PhaseIndicator {
    pub fn get(&self) -> SessionPhase {
        if self.0.load(Ordering::Acquire) {
            SessionPhase::Pending
        } else {
            SessionPhase::Idle
        }
    }

    /// Marks the phase Pending until the returned guard is dropped.
    fn enter_pending(&self) -> PendingGuard {
        self.0.store(true, Ordering::Release);
        PendingGuard(self.0.clone())
    }
}

/// Returns the phase to Idle on drop, including when the ask future is
/// dropped mid-call.
struct PendingGuard(Arc<AtomicBool>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Result of submitting a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AskOutcome {
    /// The user message and the assistant answer were appended.
    Answered,
    /// The backend call failed; a system notice was appended.
    Failed {
        error: QueryError,
        /// True when this failure triggered the degraded-mode notice.
        degraded: bool,
    },
    /// Rejected locally; nothing was appended and no call was made.
    Rejected(ValidationError),
    /// Another question is still pending for this session.
    Busy,
}

/// Result of a settings change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsOutcome {
    /// The backend accepted the settings and the session now uses them.
    Applied(Settings),
    /// The backend rejected the change; the session settings are unchanged.
    Rejected(QueryError),
}

/// Result of a conversation reset. Local state is cleared in both cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    Acknowledged,
    /// The backend did not confirm the reset.
    LocalOnly(QueryError),
}

/// Drives one chat session against a question-answering backend.
///
/// `SessionController` is the only component that mutates the [`Session`]:
/// it appends user/assistant/system messages, tracks consecutive failures,
/// commits settings the backend accepted and performs resets. Backend
/// failures never escape as errors; every call returns an outcome and
/// leaves the controller idle.
pub struct SessionController {
    backend: Arc<dyn QaBackend>,
    session: Session,
    defaults: Settings,
    phase: PhaseIndicator,
    degraded_hook: Option<DegradedModeHook>,
}

impl SessionController {
    /// Creates a controller with a fresh session using `defaults`.
    pub fn new(backend: Arc<dyn QaBackend>, defaults: Settings) -> Self {
        let session = Session::new(defaults.clone());
        tracing::info!(session_id = %session.id, mode = %defaults.mode, "Session started");

        Self {
            backend,
            session,
            defaults,
            phase: PhaseIndicator::default(),
            degraded_hook: None,
        }
    }

    /// Registers a callback fired when the degraded-mode notice is emitted.
    pub fn with_degraded_hook(mut self, hook: DegradedModeHook) -> Self {
        self.degraded_hook = Some(hook);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase.get()
    }

    /// A handle that reports the phase while a call holds the controller.
    pub fn phase_indicator(&self) -> PhaseIndicator {
        self.phase.clone()
    }

    /// Submits a question.
    ///
    /// The user message is appended before the call, so the transcript sent
    /// upstream ends with the question itself.
    pub async fn ask(&mut self, question: &str) -> AskOutcome {
        let question = question.trim();
        if question.is_empty() {
            tracing::warn!("Rejected empty question");
            return AskOutcome::Rejected(ValidationError::EmptyQuestion);
        }

        self.append(Message::user(question));

        let result = {
            let _pending = self.phase.enter_pending();
            let request = QueryRequest {
                question,
                chat_history: self.session.history().transcript().collect(),
                mode: self.session.mode(),
                model: self.session.model(),
            };
            tracing::debug!(
                history_len = request.chat_history.len(),
                mode = %request.mode,
                "Sending query"
            );
            self.backend.query(&request).await
        };

        match result {
            Ok(answer) => {
                self.session.record_success();
                let content = if answer.answer.trim().is_empty() {
                    EMPTY_ANSWER_PLACEHOLDER.to_string()
                } else {
                    answer.answer
                };
                self.append(Message::assistant(content, answer.metadata));
                AskOutcome::Answered
            }
            Err(error) => {
                let count = self.session.record_failure();
                tracing::error!(error_count = count, kind = error.kind(), "Query error: {error}");
                self.append(Message::system(format!("Error processing query: {error}")));

                let degraded = count == DEGRADED_MODE_THRESHOLD;
                if degraded {
                    tracing::warn!(error_count = count, "Entering degraded mode");
                    self.append(Message::system(DEGRADED_MODE_NOTICE));
                    if let Some(hook) = &self.degraded_hook {
                        hook(&self.session);
                    }
                }

                AskOutcome::Failed { error, degraded }
            }
        }
    }

    /// Pushes new settings to the backend and commits them on success.
    pub async fn apply_settings(&mut self, settings: Settings) -> SettingsOutcome {
        match self.backend.apply_config(&settings).await {
            Ok(()) => {
                tracing::info!(
                    mode = %settings.mode,
                    model = settings.model.as_deref().unwrap_or("-"),
                    "Settings updated"
                );
                self.session.commit_settings(settings.clone());
                SettingsOutcome::Applied(settings)
            }
            Err(error) => {
                tracing::warn!(kind = error.kind(), "Settings update failed: {error}");
                SettingsOutcome::Rejected(error)
            }
        }
    }

    /// Changes only the mode, keeping the current model.
    pub async fn set_mode(&mut self, mode: QueryMode) -> SettingsOutcome {
        let settings = Settings::new(mode, self.session.settings().model.clone());
        self.apply_settings(settings).await
    }

    /// Changes only the model, keeping the current mode. `None` clears it.
    pub async fn set_model(&mut self, model: Option<String>) -> SettingsOutcome {
        let settings = Settings::new(self.session.mode(), model);
        self.apply_settings(settings).await
    }

    /// Resets the conversation.
    ///
    /// The backend is asked to reset first, but local state is cleared
    /// whatever it answers.
    pub async fn reset(&mut self) -> ResetOutcome {
        let outcome = match self.backend.reset().await {
            Ok(()) => ResetOutcome::Acknowledged,
            Err(error) => {
                tracing::error!(kind = error.kind(), "Reset error: {error}");
                ResetOutcome::LocalOnly(error)
            }
        };

        self.session.reset(self.defaults.clone());
        tracing::info!(session_id = %self.session.id, "Conversation reset");
        outcome
    }

    fn append(&mut self, message: Message) {
        if let Err(err) = self.session.append(message) {
            tracing::error!("Failed to append message: {err}");
        }
    }
}

#[cfg(test)]
#[path = "controller_test.rs"]
mod tests;
