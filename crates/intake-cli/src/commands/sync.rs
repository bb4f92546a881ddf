use anyhow::{Context, Result};
use intake_pipeline::{IntakeConfig, StdoutObserver, SyncOrchestrator};
use std::sync::Arc;
use tracing::{info, warn};

/// Watch `folders` until Ctrl-C, printing every notification as a JSON line.
pub async fn execute(config: IntakeConfig, folders: Vec<String>) -> Result<()> {
    let orchestrator = SyncOrchestrator::new(config).context("Failed to start intake")?;
    orchestrator.subscribe(Arc::new(StdoutObserver));

    let mut watching = 0;
    for folder in &folders {
        match orchestrator.sync_folder(folder).await {
            Ok(response) => {
                info!("{}", response.message);
                if orchestrator.is_watching(folder).await {
                    watching += 1;
                }
            }
            Err(e) => warn!("Cannot sync {}: {}", folder, e),
        }
    }

    if watching == 0 {
        orchestrator.shutdown().await;
        anyhow::bail!("No folder is being watched");
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Interrupted, stopping watchers");

    orchestrator.shutdown().await;

    let stats = orchestrator.queue().stats();
    let quarantined = orchestrator.results().len();
    info!(
        queued = stats.len,
        refused = stats.refused,
        quarantined,
        "Session summary"
    );
    Ok(())
}
