//! Subcommand implementations

pub mod grade;
pub mod replay;

use crate::error::{CliError, CliResult};
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read and parse a JSON document
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> CliResult<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::InvalidInput(format!("{}: {e}", path.display())))?;
    Ok(serde_json::from_str(&raw)?)
}
