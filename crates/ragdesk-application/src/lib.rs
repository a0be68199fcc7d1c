//! Session orchestration for the ragdesk chat client.

mod controller;
mod shared;

pub use controller::{
    AskOutcome, DEGRADED_MODE_NOTICE, DegradedModeHook, PhaseIndicator, ResetOutcome,
    SessionController, SessionPhase, SettingsOutcome,
};
pub use shared::SharedController;
