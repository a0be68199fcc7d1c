//! REPL input parsing.
//!
//! Plain text is a question; a leading `/` introduces a command.

use ragdesk_core::session::{QueryMode, Settings};
use strum::IntoEnumIterator;
use thiserror::Error;

/// Commands offered for completion and listed by `/help`.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/mode", "<mode>          switch answering mode"),
    ("/model", "<id|none>      switch backend model"),
    ("/settings", "<mode> [model] apply mode and model together"),
    ("/reset", "               clear the conversation"),
    ("/status", "               show current configuration"),
    ("/models", "               list available models"),
    ("/history", "               show the whole conversation"),
    ("/expand", "               toggle query and table details"),
    ("/help", "               show this help"),
    ("/quit", "               exit"),
];

/// A parsed line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Submit a question (may be blank; the controller rejects it).
    Ask(String),
    SetMode(QueryMode),
    /// `None` clears the model selection.
    SetModel(Option<String>),
    ApplySettings(Settings),
    Reset,
    Status,
    Models,
    History,
    Expand,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type /help for the list of commands.")]
    Unknown(String),
    #[error("{0} expects an argument")]
    MissingArgument(&'static str),
    #[error("Unknown mode '{0}'. Available modes: {modes}", modes = mode_names())]
    InvalidMode(String),
}

fn mode_names() -> String {
    QueryMode::iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_mode(raw: &str) -> Result<QueryMode, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::InvalidMode(raw.to_string()))
}

fn parse_model(raw: &str) -> Option<String> {
    match raw {
        "none" | "-" => None,
        other => Some(other.to_string()),
    }
}

/// Parses one input line.
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let trimmed = line.trim();

    if trimmed == "quit" || trimmed == "exit" {
        return Ok(Command::Quit);
    }

    let Some(rest) = trimmed.strip_prefix('/') else {
        return Ok(Command::Ask(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let args: Vec<&str> = parts.collect();

    match name {
        "mode" => {
            let raw = args.first().ok_or(CommandError::MissingArgument("/mode"))?;
            Ok(Command::SetMode(parse_mode(raw)?))
        }
        "model" => {
            let raw = args.first().ok_or(CommandError::MissingArgument("/model"))?;
            Ok(Command::SetModel(parse_model(raw)))
        }
        "settings" => {
            let raw_mode = args
                .first()
                .ok_or(CommandError::MissingArgument("/settings"))?;
            let mode = parse_mode(raw_mode)?;
            let model = args.get(1).and_then(|raw| parse_model(raw));
            Ok(Command::ApplySettings(Settings::new(mode, model)))
        }
        "reset" => Ok(Command::Reset),
        "status" => Ok(Command::Status),
        "models" => Ok(Command::Models),
        "history" => Ok(Command::History),
        "expand" => Ok(Command::Expand),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(CommandError::Unknown(format!("/{}", other))),
    }
}
