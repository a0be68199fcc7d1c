//! Text projection of the conversation and session status.
//!
//! Everything here is a pure function of its inputs; printing is left to
//! the REPL loop.

use colored::{ColoredString, Colorize};
use ragdesk_core::catalog::{ModelInfo, find_model};
use ragdesk_core::session::{GeneratedQuery, Message, MessageRole, Session, Source, TabularData};
use serde_json::Value;

const COLLAPSED_TABLE_ROWS: usize = 10;
const MAX_CELL_CHARS: usize = 40;
const INDENT: &str = "    ";

/// Rendering switches.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    /// Emit ANSI colours.
    pub color: bool,
    /// Show generated queries and full tables instead of their summaries.
    pub expand_details: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self {
            color,
            expand_details: false,
        }
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> ColoredString) -> String {
        if self.color {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Renders messages `from..` of the session history.
    pub fn render_history_from(&self, session: &Session, from: usize) -> String {
        session
            .history()
            .iter()
            .enumerate()
            .skip(from)
            .map(|(index, message)| self.render_message(index + 1, message))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Renders one message with its 1-based position in the conversation.
    pub fn render_message(&self, position: usize, message: &Message) -> String {
        let mut out = String::new();

        let marker = match message.role() {
            MessageRole::User => "You",
            MessageRole::Assistant => "Assistant",
            MessageRole::System => "System",
        };
        let header = format!("[{}] {} · {}", position, marker, short_time(message.timestamp()));
        let header = match message.role() {
            MessageRole::User => self.paint(&header, |s| s.green().bold()),
            MessageRole::Assistant => self.paint(&header, |s| s.bright_blue().bold()),
            MessageRole::System => self.paint(&header, |s| s.yellow().bold()),
        };
        out.push_str(&header);
        out.push('\n');

        for line in message.content().lines() {
            let line = match message.role() {
                MessageRole::Assistant => self.paint(line, |s| s.bright_blue()),
                MessageRole::System => self.paint(line, |s| s.yellow()),
                MessageRole::User => line.to_string(),
            };
            out.push_str(INDENT);
            out.push_str(&line);
            out.push('\n');
        }

        if message.role() == MessageRole::Assistant {
            let metadata = message.metadata();
            if let Some(query) = &metadata.query {
                out.push_str(&self.render_query(query));
            }
            if let Some(data) = &metadata.data {
                out.push_str(&self.render_data(data));
            }
            if !metadata.sources.is_empty() {
                out.push_str(&self.render_sources(&metadata.sources));
            }
        }

        out
    }

    fn render_query(&self, query: &GeneratedQuery) -> String {
        let label = query.kind.label();
        if !self.expand_details {
            let summary = format!(
                "{INDENT}▸ {label} query ({} lines, /expand to show)\n",
                query.text.lines().count()
            );
            return self.paint(&summary, |s| s.bright_black());
        }

        let mut out = self.paint(&format!("{INDENT}▾ {label} query\n"), |s| s.magenta());
        out.push_str(&format!("{INDENT}```{}\n", query.kind));
        for line in query.text.lines() {
            out.push_str(INDENT);
            out.push_str(&self.paint(line, |s| s.cyan()));
            out.push('\n');
        }
        out.push_str(&format!("{INDENT}```\n"));
        out
    }

    fn render_data(&self, data: &TabularData) -> String {
        let heading = format!(
            "{INDENT}Data: {} rows × {} columns\n",
            data.rows().len(),
            data.columns().len()
        );
        let mut out = self.paint(&heading, |s| s.magenta());

        let limit = (!self.expand_details).then_some(COLLAPSED_TABLE_ROWS);
        for line in render_table(data, limit).lines() {
            out.push_str(INDENT);
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    fn render_sources(&self, sources: &[Source]) -> String {
        let mut out = self.paint(&format!("{INDENT}Sources:\n"), |s| s.magenta());
        for (i, source) in sources.iter().enumerate() {
            out.push_str(&format!("{INDENT}[{}] {}\n", i + 1, source.content.trim()));
            for (key, value) in &source.metadata {
                let line = format!("{INDENT}    {}: {}", key, cell_text(value));
                out.push_str(&self.paint(&line, |s| s.bright_black()));
                out.push('\n');
            }
        }
        out
    }

    /// Read-only status panel with the current mode and model.
    pub fn render_status(&self, session: &Session, catalog: &[ModelInfo]) -> String {
        let mut out = self.paint("Current Configuration:", |s| s.bold());
        out.push('\n');

        let model = match session.model() {
            Some(id) => match find_model(catalog, id) {
                Some(info) if !info.description.is_empty() => {
                    format!("{} ({})", id, info.description)
                }
                _ => id.to_string(),
            },
            None => "backend default".to_string(),
        };
        out.push_str(&format!("  Model: {}\n", model));
        out.push_str(&format!("  Mode: {}\n", session.mode()));
        out.push_str(&format!("  Messages: {}\n", session.history().len()));
        if session.error_count() > 0 {
            let errors = format!("  Consecutive errors: {}", session.error_count());
            out.push_str(&self.paint(&errors, |s| s.red()));
            out.push('\n');
        }
        out
    }

    /// The model catalogue, marking the active model.
    pub fn render_models(&self, catalog: &[ModelInfo], current: Option<&str>) -> String {
        catalog
            .iter()
            .map(|model| {
                let marker = if Some(model.id.as_str()) == current { "*" } else { " " };
                format!("{} {:<16} {}", marker, model.id, model.description)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Formats a timestamp as local `HH:MM:SS`, falling back to the raw value.
fn short_time(timestamp: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(timestamp)
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}

fn cell_text(value: &Value) -> String {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let text = text.replace('\n', " ");
    if text.chars().count() > MAX_CELL_CHARS {
        let mut cut: String = text.chars().take(MAX_CELL_CHARS - 1).collect();
        cut.push('…');
        cut
    } else {
        text
    }
}

/// Renders an aligned plain-text table. `max_rows` truncates the body.
pub fn render_table(data: &TabularData, max_rows: Option<usize>) -> String {
    let columns = data.columns();
    if columns.is_empty() {
        return "(no columns)".to_string();
    }

    let shown = max_rows.unwrap_or(usize::MAX).min(data.rows().len());
    let cells: Vec<Vec<String>> = data.rows()[..shown]
        .iter()
        .map(|row| row.iter().map(cell_text).collect())
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let format_row = |values: Vec<&str>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(value, width)| {
                let pad = width - value.chars().count();
                format!("{}{}", value, " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_row(columns.iter().map(String::as_str).collect())];
    lines.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("-+-"),
    );
    for row in &cells {
        lines.push(format_row(row.iter().map(String::as_str).collect()));
    }

    let hidden = data.rows().len() - shown;
    if hidden > 0 {
        lines.push(format!("… {} more rows (/expand to show all)", hidden));
    }

    lines.join("\n")
}
