//! snapvault daemon entry point.
//!
//! Reads JSON commands from stdin (one per line) and runs backup and
//! retention operations against the configured remote targets. The
//! supervisor add-on framework owns scheduling; this process just reacts.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;
use snapvault_dropbox::DropboxStore;
use snapvault_manager::{BackupManager, Config, DEFAULT_CONFIG_PATH, RemoteTarget, SupervisorClient};
use snapvault_transfer::bytes_to_human;
use snapvault_uploader::UploadEvent;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Command {
    command: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path =
        std::env::var("SNAPVAULT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.into());
    let config = Config::load(Path::new(&config_path))
        .with_context(|| format!("loading configuration from {config_path}"))?;

    // Initialize structured logging; config debug flag sets the default level.
    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "starting snapvault");

    let supervisor_url =
        std::env::var("SUPERVISOR_URL").unwrap_or_else(|_| "http://supervisor".into());
    let supervisor_token = std::env::var("SUPERVISOR_TOKEN").unwrap_or_default();
    let source = Arc::new(
        SupervisorClient::new(&supervisor_url, &supervisor_token)
            .context("building supervisor client")?,
    );

    let mut targets = Vec::new();
    if !config.dropbox_access_token.is_empty() {
        let store = DropboxStore::new(&config.dropbox_access_token)
            .context("building dropbox client")?;
        store.verify_token().await.context("verifying dropbox access token")?;
        info!(dir = %config.dropbox_dir, "dropbox target configured");
        targets.push(RemoteTarget {
            name: "dropbox".into(),
            store: Arc::new(store),
            remote_dir: config.dropbox_dir.clone(),
            use_filename: config.use_filename,
        });
    }
    if targets.is_empty() {
        warn!("no remote targets configured, backup commands will do nothing");
    }

    let manager = BackupManager::new(source, targets, config.backup_dir.clone().into());

    // Drain upload events into the log.
    let (events_tx, mut events_rx) = mpsc::channel::<UploadEvent>(256);
    tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match event {
                UploadEvent::Started { dest, total } => {
                    info!(dest = %dest, size = %bytes_to_human(total), "upload started");
                }
                UploadEvent::Progress { dest, percent, transferred, total } => {
                    info!(
                        dest = %dest,
                        percent,
                        transferred = %bytes_to_human(transferred),
                        total = %bytes_to_human(total),
                        "upload progress"
                    );
                }
                UploadEvent::Retrying { dest, attempt, delay_secs } => {
                    warn!(
                        dest = %dest,
                        attempt,
                        delay_secs = format_args!("{delay_secs:.1}"),
                        "upload attempt failed, retrying"
                    );
                }
                UploadEvent::Skipped { dest } => {
                    info!(dest = %dest, "already present, skipped");
                }
                UploadEvent::Completed { dest } => {
                    info!(dest = %dest, "upload completed");
                }
                UploadEvent::Failed { dest, error } => {
                    warn!(dest = %dest, error = %error, "upload failed");
                }
            }
        }
    });

    // Command loop: one JSON object per stdin line.
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let cmd: Command = match serde_json::from_str(line) {
            Ok(cmd) => cmd,
            Err(e) => {
                error!(error = %e, message = %line, "improperly formatted message");
                continue;
            }
        };

        match cmd.command.as_str() {
            "backup" => {
                match manager.backup_all(&events_tx).await {
                    Ok(reports) => {
                        let failed = reports.iter().filter(|r| !r.outcome.is_success()).count();
                        info!(
                            total = reports.len(),
                            failed,
                            "backup run finished"
                        );
                    }
                    Err(e) => error!(error = %e, "failed to list snapshots"),
                }
                if let Some(keep) = config.keep_last
                    && let Err(e) = manager.clean_local(keep).await
                {
                    error!(error = %e, "local cleanup failed");
                }
            }
            "clean_local" => match config.keep_last {
                Some(keep) => {
                    if let Err(e) = manager.clean_local(keep).await {
                        error!(error = %e, "local cleanup failed");
                    }
                }
                None => warn!("keep_last not configured, nothing to clean"),
            },
            other => error!(command = %other, "unknown command"),
        }
    }

    info!("stdin closed, shutting down");
    Ok(())
}
