//! JSON output for command results.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

/// Renders `value` as pretty JSON.
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize output as JSON")
}

/// Writes `value` as pretty JSON to `path`, or to stdout when no path is
/// given.
pub async fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<()> {
    let json = to_json(value)?;
    match path {
        Some(path) => {
            tokio::fs::write(path, format!("{json}\n"))
                .await
                .with_context(|| format!("Failed to write output to {}", path.display()))?;
            tracing::info!("Output written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
