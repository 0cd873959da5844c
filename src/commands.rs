//! Batch execution and output rendering.

use colored::Colorize;
use rri_client::{BatchError, Client, Direction};
use rri_protocol::{censor, parse_query_document, Query, Response};
use std::path::Path;

/// How responses are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Observer used by `--verbose`: prints censored raw traffic to stderr.
pub fn print_traffic(direction: Direction, raw: &str) {
    let arrow = match direction {
        Direction::Outbound => "-->".cyan(),
        Direction::Inbound => "<--".magenta(),
    };
    eprintln!("{} {}\n{}\n", arrow, direction, censor(raw));
}

/// Reads and parses a query document from disk.
pub fn load_document(path: &Path) -> Result<Vec<Query>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
    Ok(parse_query_document(&content)?)
}

/// Runs every query in the document at `path`, stopping at the first failure.
pub async fn run_file(
    client: &Client,
    path: &Path,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let queries = load_document(path)?;
    tracing::debug!("Loaded {} queries from {}", queries.len(), path.display());

    let result = client
        .run_batch(&queries, |_, query, response| {
            println!("{}\n{}", "Exec query".bold(), censor(&query.to_string()));
            println!("{}\n", format_response(response, format));
        })
        .await;

    match result {
        Ok(executed) => {
            tracing::debug!("Executed {} queries", executed);
            Ok(())
        }
        Err(err) => {
            println!("{}\n{}", "Exec query".bold(), censor(&queries[err.index].to_string()));
            if let Some(message) = err.source.server_message() {
                println!("{}: {}", "Query failed".red(), message);
            }
            Err(err.into())
        }
    }
}

/// Whether `err` is a rejected batch query that [`run_file`] already printed.
pub fn is_reported(err: &(dyn std::error::Error + 'static)) -> bool {
    err.downcast_ref::<BatchError>()
        .map_or(false, |e| e.source.server_message().is_some())
}

/// Parses a one-line query where fields are separated by `;`.
pub fn parse_inline_query(line: &str) -> Result<Query, Box<dyn std::error::Error>> {
    let text = line.split(';').collect::<Vec<_>>().join("\n");
    Ok(Query::parse(&text)?)
}

pub fn format_response(response: &Response, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(response).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
        }
        OutputFormat::Text => format_text(response),
    }
}

fn format_text(response: &Response) -> String {
    let mut lines = Vec::new();

    let result = if response.is_successful() {
        "success".green()
    } else {
        "failed".red()
    };
    lines.push(format!("RESULT: {}", result));

    if let Some(stid) = &response.stid {
        lines.push(format!("STID: {}", stid.as_str().dimmed()));
    }
    for info in &response.infos {
        lines.push(format!("INFO: {}", info));
    }
    for error in &response.errors {
        lines.push(format!("ERROR: {}", error.to_string().as_str().red()));
    }
    for field in &response.fields {
        lines.push(format!("{}: {}", field.key.as_str().cyan(), field.value));
    }

    lines.join("\n")
}
