use anyhow::Result;
use clap::Parser;
use ragdesk_core::session::QueryMode;
use ragdesk_infrastructure::ClientConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ragdesk")]
#[command(about = "RAGDESK - Chat with a RAG / SQL-analytics question answering backend", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides config file and environment)
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Answering mode for the new session
    #[arg(long)]
    pub mode: Option<QueryMode>,

    /// Backend model for the new session
    #[arg(long)]
    pub model: Option<String>,

    /// Timeout for questions, in seconds
    #[arg(long)]
    pub query_timeout: Option<u64>,

    /// Alternative config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also log to stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Loads configuration and applies command-line overrides.
    pub fn load_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = ClientConfig::load_from(path)?;
                config.apply_env(|key| std::env::var(key).ok())?;
                config
            }
            None => ClientConfig::load()?,
        };

        if let Some(url) = &self.backend_url {
            config.backend_url = url.clone();
        }
        if let Some(mode) = self.mode {
            config.default_mode = mode;
        }
        if let Some(model) = &self.model {
            config.default_model = Some(model.clone());
        }
        if let Some(secs) = self.query_timeout {
            config.query_timeout_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }
}
