//! Sync and Clear commands: one-shot runs of the pipeline.

use std::path::Path;

use crate::config::Settings;
use crate::types::TableName;

use super::pipeline_from;

/// Parse `file` and replace the contents of its table.
pub async fn run_sync(
    settings: &Settings,
    file: &Path,
    table: Option<TableName>,
) -> anyhow::Result<()> {
    let pipeline = pipeline_from(settings)?;
    let outcome = match table {
        Some(table) => pipeline.sync_file_as(file, table).await?,
        None => pipeline.sync_file(file).await?,
    };
    println!(
        "Synced {} rows from {} into '{}'",
        outcome.rows,
        file.display(),
        outcome.table
    );
    Ok(())
}

/// Delete every row of `table`.
pub async fn run_clear(settings: &Settings, table: &TableName) -> anyhow::Result<()> {
    let pipeline = pipeline_from(settings)?;
    pipeline.clear_table(table).await?;
    println!("Cleared table '{table}'");
    Ok(())
}
