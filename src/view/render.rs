//! Rendering seam and the terminal renderer.
//!
//! The controller only talks to [`Renderer`]; everything it emits is
//! appended, never replacing earlier output.

use colored::Colorize;
use serde_json::Value;

use crate::dashboard::{ChartInput, Table};
use crate::router::Page;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// An inline, non-blocking message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

pub trait Renderer {
    fn heading(&mut self, page: Page);
    fn chart(&mut self, chart: &ChartInput);
    fn table(&mut self, table: &Table);
    fn lines(&mut self, lines: &[String]);
    /// A JSON object shown as key/value pairs (profile, identifiers).
    fn record(&mut self, value: &Value);
    fn notice(&mut self, notice: &Notice);
    fn redirect(&mut self, page: Page);
}

/// Output format for the terminal renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

/// Width of the longest bar in table mode.
const BAR_WIDTH: usize = 40;

/// Prints to stdout (data) and stderr (notices, redirects).
///
/// JSON mode prints one JSON document per line: chart specs, tables and
/// records, so the output can be piped into a chart renderer.
#[derive(Debug)]
pub struct TerminalRenderer {
    format: OutputFormat,
}

impl TerminalRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn print_json(&self, value: &impl serde::Serialize) {
        match serde_json::to_string(value) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("{}", format!("failed to serialize output: {e}").red()),
        }
    }
}

impl Renderer for TerminalRenderer {
    fn heading(&mut self, page: Page) {
        if self.format == OutputFormat::Table {
            println!("{}", page.title().bold().cyan());
            println!("{}", "=".repeat(60));
        }
    }

    fn chart(&mut self, chart: &ChartInput) {
        match self.format {
            OutputFormat::Json => self.print_json(&chart.to_spec()),
            OutputFormat::Table => print_chart_table(chart),
        }
    }

    fn table(&mut self, table: &Table) {
        match self.format {
            OutputFormat::Json => self.print_json(table),
            OutputFormat::Table => print_table(table),
        }
    }

    fn lines(&mut self, lines: &[String]) {
        match self.format {
            OutputFormat::Json => self.print_json(&lines),
            OutputFormat::Table => {
                if lines.is_empty() {
                    println!("{}", "No results.".yellow());
                }
                for line in lines {
                    println!("  {line}");
                }
            }
        }
    }

    fn record(&mut self, value: &Value) {
        match (self.format, value) {
            (OutputFormat::Table, Value::Object(map)) => {
                let width = map.keys().map(String::len).max().unwrap_or(0);
                for (key, val) in map {
                    println!("  {:<width$}  {}", key.bold(), display_value(val));
                }
            }
            (OutputFormat::Table, other) => println!("  {}", display_value(other)),
            (OutputFormat::Json, _) => self.print_json(value),
        }
    }

    fn notice(&mut self, notice: &Notice) {
        let text = match notice.level {
            NoticeLevel::Info => notice.text.yellow(),
            NoticeLevel::Success => notice.text.green(),
            NoticeLevel::Error => notice.text.red(),
        };
        eprintln!("{text}");
    }

    fn redirect(&mut self, page: Page) {
        eprintln!("{}", format!("→ {}", page.id()).dimmed());
    }
}

fn print_chart_table(chart: &ChartInput) {
    let heading = match &chart.label {
        Some(label) => format!("{} ({})", label, chart.kind),
        None => format!("{} chart", chart.kind),
    };
    println!();
    println!("{}", heading.bold());

    if chart.is_empty() {
        println!("  {}", "(no data)".dimmed());
        return;
    }

    let label_width = chart
        .labels
        .iter()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .min(30);
    let max = chart.series.iter().cloned().fold(0.0_f64, f64::max);

    for (idx, label) in chart.labels.iter().enumerate() {
        let value = chart.series.get(idx).copied().unwrap_or(0.0);
        println!(
            "  {:<label_width$} {:>10} {}",
            truncate(label, 30),
            format_value(value),
            bar(value, max).cyan(),
        );
    }
}

fn print_table(table: &Table) {
    if table.rows.is_empty() {
        println!("{}", "No entries.".yellow());
        return;
    }

    let widths: Vec<usize> = (0..table.headers.len())
        .map(|col| {
            table
                .rows
                .iter()
                .filter_map(|row| row.get(col))
                .chain(std::iter::once(&table.headers[col]))
                .map(|cell| cell.chars().count())
                .max()
                .unwrap_or(0)
        })
        .collect();

    let render_row = |cells: &[String]| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    println!("  {}", render_row(&table.headers[..]).bold());
    println!("  {}", "-".repeat(widths.iter().sum::<usize>() + 2 * widths.len()));
    for (i, row) in table.rows.iter().enumerate() {
        let line = render_row(&row[..]);
        if i % 2 == 0 {
            println!("  {line}");
        } else {
            println!("  {}", line.dimmed());
        }
    }
}

/// Scaled bar for `value` against the chart maximum.
pub fn bar(value: f64, max: f64) -> String {
    if max <= 0.0 || value <= 0.0 {
        return String::new();
    }
    let len = ((value / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(len.clamp(1, BAR_WIDTH))
}

/// Integers without a trailing `.0`.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value:.2}")
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

/// Cut `s` to `max_len` characters, ending in `…` when shortened.
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{head}…")
    }
}
