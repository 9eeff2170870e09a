//! Terminal rendering for the salon CLI.
//!
//! Commands build plain values (tabled rows, [`Card`]s, API payloads) and
//! hand them to this module; nothing else writes formatted output.

use anyhow::Result;
use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::Serialize;
use std::fmt;
use tabled::{
    settings::{object::Columns, Alignment, Modify, Style},
    Table, Tabled,
};

/// Output format selection.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Tables and detail cards
    #[default]
    Table,
    /// Raw API payload as JSON
    Json,
    /// Raw API payload as YAML
    Yaml,
}

impl OutputFormat {
    /// JSON and YAML print the payload unchanged.
    pub fn is_structured(self) -> bool {
        self != Self::Table
    }

    /// Payloads have no table form, so `Table` falls back to JSON.
    fn serialize<T: Serialize + ?Sized>(self, value: &T) -> Result<String> {
        match self {
            Self::Yaml => Ok(serde_yaml::to_string(value)?),
            Self::Table | Self::Json => Ok(format!("{}\n", serde_json::to_string_pretty(value)?)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Notices
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Notice {
    Done,
    Failed,
    Note,
}

impl Notice {
    fn line(self, msg: &str) -> String {
        let tag = match self {
            Self::Done => "[OK]".green(),
            Self::Failed => "[ERROR]".red(),
            Self::Note => "[INFO]".blue(),
        };
        format!("{} {}", tag.bold(), msg)
    }
}

pub fn print_success(msg: &str) {
    println!("{}", Notice::Done.line(msg));
}

/// Goes to stderr.
pub fn print_error(msg: &str) {
    eprintln!("{}", Notice::Failed.line(msg));
}

pub fn print_info(msg: &str) {
    println!("{}", Notice::Note.line(msg));
}

// ─────────────────────────────────────────────────────────────────────────────
// Payloads and tables
// ─────────────────────────────────────────────────────────────────────────────

/// Print an API payload in a structured format.
pub fn print_item<T: Serialize + ?Sized>(item: &T, format: OutputFormat) -> Result<()> {
    print!("{}", format.serialize(item)?);
    Ok(())
}

/// Print rows as a table, or the rows themselves when a structured format
/// was requested. `noun` names the rows in the empty-table message.
pub fn print_list<T: Tabled + Serialize>(rows: &[T], noun: &str, format: OutputFormat) -> Result<()> {
    if format.is_structured() {
        return print_item(rows, format);
    }
    println!("{}", render_rows(rows, noun));
    Ok(())
}

fn render_rows<T: Tabled>(rows: &[T], noun: &str) -> String {
    if rows.is_empty() {
        return format!("No {} found.", noun).dimmed().to_string();
    }

    Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::first()).with(Alignment::left()))
        .to_string()
}

// ─────────────────────────────────────────────────────────────────────────────
// Detail cards
// ─────────────────────────────────────────────────────────────────────────────

/// Appointment status coloured by how settled it is.
pub fn status_badge(status: &str) -> ColoredString {
    match status {
        "pending" => status.yellow(),
        "confirmed" => status.green(),
        "cancelled" => status.red(),
        "completed" => status.blue(),
        other => other.normal(),
    }
}

/// A titled block of `label  value` lines with the labels padded to a
/// common width.
#[derive(Debug)]
pub struct Card {
    title: String,
    fields: Vec<(String, String)>,
}

impl Card {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, label: impl Into<String>, value: impl fmt::Display) -> Self {
        self.fields.push((label.into(), value.to_string()));
        self
    }

    /// `-` when absent.
    pub fn optional(self, label: impl Into<String>, value: Option<impl fmt::Display>) -> Self {
        match value {
            Some(value) => self.field(label, value),
            None => self.field(label, "-"),
        }
    }

    fn render(&self) -> String {
        let width = self.fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0);

        let mut out = format!("\n{}\n", self.title.bold().underline());
        for (label, value) in &self.fields {
            let padded = format!("{:<width$}", label, width = width);
            out.push_str(&format!("  {}  {}\n", padded.cyan(), value));
        }
        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
