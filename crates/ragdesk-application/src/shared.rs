use crate::controller::{
    AskOutcome, PhaseIndicator, ResetOutcome, SessionController, SessionPhase, SettingsOutcome,
};
use ragdesk_core::session::{QueryMode, Session, Settings};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Cloneable handle to a [`SessionController`] for use from spawned tasks.
///
/// Questions use `try_lock`, so a submission made while another call is in
/// flight is rejected with [`AskOutcome::Busy`] instead of queued.
#[derive(Clone)]
pub struct SharedController {
    inner: Arc<Mutex<SessionController>>,
    phase: PhaseIndicator,
}

impl SharedController {
    pub fn new(controller: SessionController) -> Self {
        let phase = controller.phase_indicator();
        Self {
            inner: Arc::new(Mutex::new(controller)),
            phase,
        }
    }

    /// Current phase. Does not wait for an in-flight question.
    pub fn phase(&self) -> SessionPhase {
        self.phase.get()
    }

    /// Submits a question unless another call is pending.
    pub async fn ask(&self, question: &str) -> AskOutcome {
        match self.inner.try_lock() {
            Ok(mut controller) => controller.ask(question).await,
            Err(_) => {
                tracing::warn!("Rejected question while another request is pending");
                AskOutcome::Busy
            }
        }
    }

    pub async fn apply_settings(&self, settings: Settings) -> SettingsOutcome {
        self.inner.lock().await.apply_settings(settings).await
    }

    pub async fn set_mode(&self, mode: QueryMode) -> SettingsOutcome {
        self.inner.lock().await.set_mode(mode).await
    }

    pub async fn set_model(&self, model: Option<String>) -> SettingsOutcome {
        self.inner.lock().await.set_model(model).await
    }

    pub async fn reset(&self) -> ResetOutcome {
        self.inner.lock().await.reset().await
    }

    /// Copy of the current session, for rendering.
    pub async fn snapshot(&self) -> Session {
        self.inner.lock().await.session().clone()
    }
}
