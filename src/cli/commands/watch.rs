//! Watch command - sync the data directory and keep it in sync.

use std::path::PathBuf;

use anyhow::Context;

use crate::config::Settings;
use crate::notifications::{ChangeEvent, ChangeKind};
use crate::watcher::DataWatcher;

use super::pipeline_from;

/// Run the watcher until Ctrl-C.
pub async fn run(settings: &Settings, data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let dir = match data_dir {
        Some(dir) => dir,
        None => settings.data_dir(),
    };
    tokio::fs::create_dir_all(&dir)
        .await
        .with_context(|| format!("cannot create data directory {}", dir.display()))?;

    let pipeline = pipeline_from(settings)?;
    pipeline.notifier().subscribe(|event| println!("{}", describe(event)));

    let watcher = DataWatcher::builder()
        .root(&dir)
        .pipeline(pipeline)
        .config(&settings.watcher)
        .build()?;

    eprintln!(
        "Watching {} (debounce: {}ms, Ctrl-C to stop)",
        watcher.root().display(),
        settings.watcher.debounce_ms
    );

    watcher
        .watch_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("[watcher] cannot listen for Ctrl-C: {e}");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}

fn describe(event: &ChangeEvent) -> String {
    let rows = event.data.as_ref().map(Vec::len).unwrap_or(0);
    match &event.kind {
        ChangeKind::Added => format!("added    {} ({rows} rows)", event.table),
        ChangeKind::Changed => format!("changed  {} ({rows} rows)", event.table),
        ChangeKind::Deleted => format!("deleted  {}", event.table),
        ChangeKind::Failed { reason } => format!("failed   {}: {reason}", event.table),
    }
}
