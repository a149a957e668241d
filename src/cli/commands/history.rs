use anyhow::{anyhow, Context};
use clap::Subcommand;
use serde_json::Value;
use std::path::PathBuf;

use crate::cli::utils::output_lines;
use crate::cli::OutputFormat;
use crate::history::{format_for_display, HistoryEntry};

#[derive(Subcommand)]
pub enum HistoryCommands {
    #[command(about = "Render the history of a submission or payload JSON file")]
    Show {
        #[arg(help = "File holding a submission, its data payload, or a bare history array")]
        file: PathBuf,
        #[arg(long, help = "Hide sensitive values as an unprivileged viewer would")]
        redact: bool,
    },
}

pub async fn handle(cmd: HistoryCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        HistoryCommands::Show { file, redact } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let document: Value = serde_json::from_str(&content)
                .with_context(|| format!("{} is not valid JSON", file.display()))?;

            let history = extract_history(&document)?;
            let lines = format_for_display(&history, redact);
            output_lines(&output_format, &lines, serde_json::to_value(&lines)?)
        }
    }
}

/// Accepts `[...]`, `{"history": [...]}` or `{"data": {"history": [...]}}`.
fn extract_history(document: &Value) -> anyhow::Result<Vec<HistoryEntry>> {
    let history = if document.is_array() {
        document
    } else if let Some(history) = document.get("history").filter(|h| h.is_array()) {
        history
    } else if let Some(history) = document.pointer("/data/history") {
        history
    } else {
        return Err(anyhow!("no history array found"));
    };

    serde_json::from_value(history.clone()).context("history entries are malformed")
}
