use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::history::DefaultHistory;
use tokio::time::interval;

use ragdesk_application::{
    AskOutcome, ResetOutcome, SessionController, SessionPhase, SettingsOutcome, SharedController,
};
use ragdesk_core::session::Session;
use ragdesk_infrastructure::{ClientConfig, init_logging};
use ragdesk_interaction::HttpBackend;

mod cli;
mod commands;
mod helper;
mod render;

use cli::Cli;
use commands::{COMMANDS, Command};
use helper::CliHelper;
use render::Renderer;

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Terminal state owned by the REPL loop.
struct Repl {
    controller: SharedController,
    config: ClientConfig,
    renderer: Renderer,
    /// Number of history entries already printed.
    rendered: usize,
}

impl Repl {
    /// Prints history entries added since the last call.
    async fn print_new_messages(&mut self) {
        let session = self.controller.snapshot().await;
        if session.history().len() < self.rendered {
            self.rendered = 0;
        }
        let out = self.renderer.render_history_from(&session, self.rendered);
        if !out.is_empty() {
            println!("{}", out);
        }
        self.rendered = session.history().len();
    }

    async fn print_status(&self) {
        let session = self.controller.snapshot().await;
        println!("{}", self.renderer.render_status(&session, &self.config.models));
    }

    /// Submits a question while showing a spinner.
    async fn ask(&mut self, question: String) {
        let controller = self.controller.clone();
        let mut task = tokio::spawn(async move { controller.ask(&question).await });

        let mut ticker = interval(Duration::from_millis(100));
        let mut frame = 0usize;
        let outcome = loop {
            tokio::select! {
                result = &mut task => break result,
                _ = ticker.tick() => {
                    if self.controller.phase() == SessionPhase::Pending {
                        eprint!("\r{} Processing...", SPINNER_FRAMES[frame % SPINNER_FRAMES.len()]);
                        frame += 1;
                    }
                }
            }
        };
        eprint!("\r{}\r", " ".repeat(20));

        match outcome {
            Ok(AskOutcome::Rejected(reason)) => println!("{}", reason.to_string().yellow()),
            Ok(AskOutcome::Busy) => {
                println!("{}", "A question is already being processed.".yellow())
            }
            Ok(AskOutcome::Answered) | Ok(AskOutcome::Failed { .. }) => {
                self.print_new_messages().await
            }
            Err(err) => eprintln!("{}", format!("Error: {:?}", err).red()),
        }
    }

    async fn report_settings(&self, outcome: SettingsOutcome) {
        match outcome {
            SettingsOutcome::Applied(_) => {
                println!("{}", "Settings updated".bright_green());
                self.print_status().await;
            }
            SettingsOutcome::Rejected(err) => {
                println!("{}", format!("Settings update failed: {}", err).red());
            }
        }
    }

    async fn reset(&mut self) {
        match self.controller.reset().await {
            ResetOutcome::Acknowledged => {
                println!("{}", "Conversation reset complete".bright_green())
            }
            ResetOutcome::LocalOnly(err) => println!(
                "{}",
                format!("Error during reset: {}. Local conversation cleared.", err).yellow()
            ),
        }
        self.rendered = 0;
        self.print_status().await;
    }

    fn print_help(&self) {
        println!("{}", "Type a question and press Enter. Commands:".bright_black());
        for (name, description) in COMMANDS {
            println!("  {}{}", name.bright_cyan(), description);
        }
    }
}

/// The main entry point for the ragdesk REPL.
///
/// Loads configuration, sets up logging and the backend client, then reads
/// questions and commands until `quit`, Ctrl-D or a terminal error.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    // ===== Configuration & Logging =====
    let config = cli.load_config()?;
    let _log_guard = init_logging(&config.resolved_log_dir()?, cli.verbose)?;
    tracing::info!(backend_url = %config.backend_url, "Frontend application started");

    // ===== Backend Initialization =====
    let backend = Arc::new(HttpBackend::from_config(&config)?);
    let controller = SessionController::new(backend, config.default_settings())
        .with_degraded_hook(Box::new(|session: &Session| {
            tracing::warn!(
                session_id = %session.id,
                error_count = session.error_count(),
                "Degraded mode signalled"
            );
        }));

    let mut repl = Repl {
        controller: SharedController::new(controller),
        renderer: Renderer::new(!cli.no_color),
        config,
        rendered: 0,
    };

    // ===== REPL Setup =====
    let helper = CliHelper::new(repl.config.models.iter().map(|m| m.id.clone()).collect());
    let mut rl: Editor<CliHelper, DefaultHistory> = Editor::new()?;
    rl.set_helper(Some(helper));

    println!("{}", "=== RAGDESK ===".bright_magenta().bold());
    println!("{}", format!("Backend: {}", repl.config.backend_url).bright_black());
    println!(
        "{}",
        "Ask a question, type '/help' for commands, or 'quit' to exit.".bright_black()
    );
    repl.print_status().await;

    // ===== Main REPL Loop =====
    loop {
        let readline = rl.readline(">> ");

        match readline {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }

                let command = match commands::parse(&line) {
                    Ok(command) => command,
                    Err(err) => {
                        println!("{}", err.to_string().yellow());
                        continue;
                    }
                };

                match command {
                    Command::Ask(question) => repl.ask(question).await,
                    Command::SetMode(mode) => {
                        let outcome = repl.controller.set_mode(mode).await;
                        repl.report_settings(outcome).await;
                    }
                    Command::SetModel(model) => {
                        let outcome = repl.controller.set_model(model).await;
                        repl.report_settings(outcome).await;
                    }
                    Command::ApplySettings(settings) => {
                        let outcome = repl.controller.apply_settings(settings).await;
                        repl.report_settings(outcome).await;
                    }
                    Command::Reset => repl.reset().await,
                    Command::Status => repl.print_status().await,
                    Command::Models => {
                        let session = repl.controller.snapshot().await;
                        println!(
                            "{}",
                            repl.renderer.render_models(&repl.config.models, session.model())
                        );
                    }
                    Command::History => {
                        let session = repl.controller.snapshot().await;
                        if session.history().is_empty() {
                            println!("{}", "No messages yet.".bright_black());
                        } else {
                            println!("{}", repl.renderer.render_history_from(&session, 0));
                        }
                    }
                    Command::Expand => {
                        repl.renderer.expand_details = !repl.renderer.expand_details;
                        let state = if repl.renderer.expand_details { "expanded" } else { "collapsed" };
                        println!("{}", format!("Details {}", state).bright_black());
                    }
                    Command::Help => repl.print_help(),
                    Command::Quit => {
                        println!("{}", "Goodbye!".bright_green());
                        break;
                    }
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    tracing::info!("Frontend application stopped");
    Ok(())
}
