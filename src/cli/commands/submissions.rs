use clap::{Args, Subcommand};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_lines, output_success, submission_summary};
use crate::cli::OutputFormat;
use crate::types::RiskLevel;

#[derive(Args)]
pub struct Connection {
    #[arg(long, env = "TRACKER_SERVER", default_value = "http://localhost:3000", help = "Server base URL")]
    pub server: String,
    #[arg(long, env = "TRACKER_TOKEN", hide_env_values = true, help = "Bearer token")]
    pub token: String,
}

#[derive(Subcommand)]
pub enum SubmissionCommands {
    #[command(about = "List submissions")]
    List {
        #[command(flatten)]
        conn: Connection,
        #[arg(long, help = "Only this organization")]
        organization_id: Option<Uuid>,
        #[arg(long, help = "Only this tag")]
        tag: Option<String>,
    },

    #[command(about = "Show one submission with its history")]
    Show {
        #[command(flatten)]
        conn: Connection,
        id: Uuid,
    },

    #[command(about = "Change risk and/or sensitive info")]
    Update {
        #[command(flatten)]
        conn: Connection,
        id: Uuid,
        #[arg(long, help = "NONE, LOW, MEDIUM or HIGH")]
        risk: Option<RiskLevel>,
        #[arg(long, help = "New sensitive note (empty string clears it)")]
        sensitive_info: Option<String>,
    },

    #[command(about = "Delete a submission")]
    Delete {
        #[command(flatten)]
        conn: Connection,
        id: Uuid,
    },
}

pub async fn handle(cmd: SubmissionCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        SubmissionCommands::List { conn, organization_id, tag } => {
            let client = ApiClient::new(&conn.server, &conn.token)?;
            let mut query = Vec::new();
            if let Some(org) = organization_id {
                query.push(("organization_id", org.to_string()));
            }
            if let Some(tag) = tag {
                query.push(("tag", tag));
            }

            let data = client.get("/api/submissions", &query).await?;
            let lines: Vec<String> = data
                .as_array()
                .map(|views| views.iter().map(submission_summary).collect())
                .unwrap_or_default();
            output_lines(&output_format, &lines, data)
        }
        SubmissionCommands::Show { conn, id } => {
            let client = ApiClient::new(&conn.server, &conn.token)?;
            let data = client.get(&format!("/api/submissions/{}", id), &[]).await?;

            let mut lines = vec![submission_summary(&data)];
            if let Some(note) = data.get("sensitive_info").and_then(Value::as_str) {
                lines.push(format!("Sensitive: {}", note));
            }
            if let Some(history) = data.get("history_display").and_then(Value::as_array) {
                lines.extend(history.iter().filter_map(Value::as_str).map(|l| format!("  {}", l)));
            }
            output_lines(&output_format, &lines, data)
        }
        SubmissionCommands::Update { conn, id, risk, sensitive_info } => {
            let body = update_body(risk, sensitive_info);
            if body.as_object().map_or(true, Map::is_empty) {
                anyhow::bail!("nothing to update: pass --risk and/or --sensitive-info");
            }

            let client = ApiClient::new(&conn.server, &conn.token)?;
            let data = client.put(&format!("/api/submissions/{}", id), body).await?;
            output_success(&output_format, &format!("Updated {}", submission_summary(&data)), Some(data))
        }
        SubmissionCommands::Delete { conn, id } => {
            let client = ApiClient::new(&conn.server, &conn.token)?;
            let data = client.delete(&format!("/api/submissions/{}", id)).await?;
            output_success(&output_format, &format!("Deleted submission {}", id), Some(data))
        }
    }
}

fn update_body(risk: Option<RiskLevel>, sensitive_info: Option<String>) -> Value {
    let mut body = Map::new();
    if let Some(risk) = risk {
        body.insert("risk".into(), json!(risk));
    }
    if let Some(note) = sensitive_info {
        body.insert("sensitive_info".into(), json!(note));
    }
    Value::Object(body)
}
