use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use strum::IntoEnumIterator;

use ragdesk_core::session::QueryMode;

use crate::commands::COMMANDS;

/// CLI helper for rustyline that provides completion, highlighting, and hints.
///
/// Completes command names, mode names after `/mode` and `/settings`, and
/// model ids after `/model`.
#[derive(Clone)]
pub struct CliHelper {
    commands: Vec<String>,
    modes: Vec<String>,
    models: Vec<String>,
}

impl CliHelper {
    pub fn new(models: Vec<String>) -> Self {
        Self {
            commands: COMMANDS.iter().map(|(name, _)| name.to_string()).collect(),
            modes: QueryMode::iter().map(|m| m.to_string()).collect(),
            models,
        }
    }

    fn candidates(&self, line: &str) -> (usize, Vec<&String>) {
        let (start, pool, word) = match line.split_once(' ') {
            None => (0, &self.commands, line),
            Some(("/mode", arg)) | Some(("/settings", arg)) if !arg.contains(' ') => {
                (line.len() - arg.len(), &self.modes, arg)
            }
            Some(("/model", arg)) if !arg.contains(' ') => {
                (line.len() - arg.len(), &self.models, arg)
            }
            _ => return (0, Vec::new()),
        };

        let matches = pool.iter().filter(|c| c.starts_with(word)).collect();
        (start, matches)
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if !line.starts_with('/') {
            return Ok((0, vec![]));
        }

        let (start, matches) = self.candidates(line);
        let candidates = matches
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate.clone(),
            })
            .collect();
        Ok((start, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];
        if !line.starts_with('/') {
            return None;
        }

        let (start, matches) = self.candidates(line);
        let typed = &line[start..];
        matches
            .into_iter()
            .find(|c| c.len() > typed.len())
            .map(|c| c[typed.len()..].to_string())
    }
}

impl Validator for CliHelper {}
