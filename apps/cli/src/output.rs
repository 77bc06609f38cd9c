//! Output formatting utilities

use crate::OutputFormat;
use serde::Serialize;

/// Print output in the requested format
pub fn print_output<T: Serialize + std::fmt::Display>(
    value: &T,
    format: OutputFormat,
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Human => {
            println!("{}", value);
        }
    }
    Ok(())
}

/// Format bytes as human-readable
pub fn format_bytes(bytes: u64) -> String {
    human_bytes::human_bytes(bytes as f64)
}

/// Format a transfer rate as human-readable
pub fn format_speed(bytes: u64, seconds: f64) -> String {
    if seconds <= 0.0 {
        return "—".to_string();
    }
    format!("{}/s", human_bytes::human_bytes(bytes as f64 / seconds))
}
