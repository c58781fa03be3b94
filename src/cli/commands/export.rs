//! Export command.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Context;

use crate::config::Settings;
use crate::export::ExportWriter;
use crate::types::{FileFormat, TableName};

use super::store_from;

/// Arguments for the export command.
pub struct ExportArgs {
    pub table: TableName,
    pub format: FileFormat,
    pub out: Option<PathBuf>,
    pub stdout: bool,
}

/// Export a table to a timestamped file, or to stdout.
pub async fn run(settings: &Settings, args: ExportArgs) -> anyhow::Result<()> {
    let writer = ExportWriter::new(store_from(settings)?);
    let file = writer
        .export_table(&args.table, args.format)
        .await
        .with_context(|| format!("failed to export '{}'", args.table))?;

    if args.stdout {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&file.bytes)?;
        stdout.flush()?;
        return Ok(());
    }

    let dir = args.out.unwrap_or_else(|| settings.exports_dir());
    let path = file.write_to_dir(&dir).await?;
    println!("Exported '{}' to {}", args.table, path.display());
    Ok(())
}
