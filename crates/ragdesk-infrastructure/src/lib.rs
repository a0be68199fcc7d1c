//! Configuration, paths and logging for the ragdesk client.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::ClientConfig;
pub use logging::init_logging;
pub use paths::RagdeskPaths;
