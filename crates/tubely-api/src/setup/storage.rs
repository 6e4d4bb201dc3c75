//! Storage setup and initialization

use std::sync::Arc;

use anyhow::{Context, Result};
use tubely_core::Config;
use tubely_storage::{create_storage, Storage};

/// Build the object storage backend selected by `STORAGE_BACKEND`.
pub async fn setup_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    tracing::info!("Initializing storage...");
    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage")?;
    tracing::info!(
        backend = %storage.backend_type(),
        "Storage initialized successfully"
    );
    Ok(storage)
}

/// Create the assets root and scratch directory if they are missing.
pub async fn ensure_directories(config: &Config) -> Result<()> {
    for dir in [config.media.assets_root.clone(), config.scratch_dir()] {
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    Ok(())
}
