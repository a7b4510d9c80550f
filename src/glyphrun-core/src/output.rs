//! Console rendering of recognition results

use anyhow::Result;
use glyphrun_engine::{Recognition, TextLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// `NN: text`, one line per recognized line
    Plain,
    Json,
}

pub fn format_line(line: &TextLine) -> String {
    format!("{:02}: {}", line.index, line.text)
}

pub fn render(recognition: &Recognition, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Plain => Ok(recognition
            .lines
            .iter()
            .map(|line| format_line(line) + "\n")
            .collect()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(recognition)? + "\n"),
    }
}
