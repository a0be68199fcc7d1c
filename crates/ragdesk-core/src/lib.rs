pub mod catalog;
pub mod error;
pub mod session;

// Re-export common error types
pub use error::{QueryError, RagdeskError, ValidationError};
