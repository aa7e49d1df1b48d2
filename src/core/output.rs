//! Output rendering helpers for CLI surfaces.

use crate::core::error::ShopkeepError;
use crate::core::time;
use serde::Serialize;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Collapse newlines/extra whitespace and bound length for terminal display.
pub fn compact_line(input: &str, max_chars: usize) -> String {
    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let mut chars = collapsed.chars();
    let preview: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{}...", preview)
    } else {
        preview
    }
}

/// Print `payload` under `key` inside the standard command envelope.
pub fn print_envelope<T: Serialize>(
    cmd: &str,
    status: &str,
    key: &str,
    payload: &T,
) -> Result<(), ShopkeepError> {
    let mut extra = serde_json::Map::new();
    extra.insert(key.to_string(), serde_json::to_value(payload)?);
    let envelope = time::command_envelope(cmd, status, serde_json::Value::Object(extra));
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}
