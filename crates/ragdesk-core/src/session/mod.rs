//! Session domain module.
//!
//! # Module Structure
//!
//! - `message`: Conversation message types (`MessageRole`, `Message`, `MessageMetadata`)
//! - `store`: Append-only conversation log (`MessageStore`)
//! - `model`: Session value and answering settings (`Session`, `Settings`, `QueryMode`)
//! - `backend`: Backend contract (`QaBackend`, `QueryRequest`, `Answer`)
//!
//! # Usage
//!
//! ```ignore
//! use ragdesk_core::session::{Session, Settings, QueryMode};
//! use ragdesk_core::session::{Message, MessageRole, MessageStore};
//! use ragdesk_core::session::{QaBackend, QueryRequest, Answer};
//! ```

mod backend;
mod message;
mod model;
mod store;

// Re-export public API
pub use backend::{Answer, QaBackend, QueryRequest};
pub use message::{
    GeneratedQuery, Message, MessageMetadata, MessageRole, QueryKind, Source, TabularData,
    TranscriptEntry,
};
pub use model::{DEGRADED_MODE_THRESHOLD, QueryMode, Session, Settings};
pub use store::MessageStore;
