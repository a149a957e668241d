use serde_json::{json, Value};

use crate::cli::OutputFormat;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data_value) = data {
                response["data"] = data_value;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a list of lines, or the raw value as JSON
pub fn output_lines(output_format: &OutputFormat, lines: &[String], raw: Value) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&raw)?),
        OutputFormat::Text if lines.is_empty() => println!("(nothing to show)"),
        OutputFormat::Text => {
            for line in lines {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

/// One-line text summary of a submission view returned by the API
pub fn submission_summary(view: &Value) -> String {
    let field = |name: &str| view.get(name).and_then(Value::as_str).unwrap_or("-").to_string();
    let author = view
        .get("author")
        .and_then(|a| a.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("-");

    format!(
        "{}  {:<12} {:<6}  {} / {}",
        field("id"),
        field("tag_name"),
        field("risk"),
        field("organization_name"),
        author
    )
}
