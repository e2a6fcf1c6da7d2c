//! Startup wiring shared by the CLI and the server.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::io::config::{PollsConfig, load_config};
use crate::io::seed::load_seed_file;
use crate::io::snapshot::{JsonFileStore, SnapshotStore};
use crate::service::PollService;

/// Load `polls.toml` and resolve its relative paths against its directory.
pub fn load_resolved_config(config_path: &Path) -> Result<PollsConfig> {
    let cfg = load_config(config_path)?;
    let config_dir = config_path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok(cfg.resolve_paths(config_dir))
}

/// Open the service over the configured snapshot file and apply the seed
/// file, if any. Existing polls are never overwritten by the seed.
pub fn open_service(cfg: &PollsConfig) -> Result<PollService> {
    let store = JsonFileStore::new(&cfg.data_path);
    open_service_with(cfg, Box::new(store))
        .with_context(|| format!("open poll data {}", cfg.data_path.display()))
}

/// Same as [`open_service`] over an arbitrary snapshot store.
pub fn open_service_with(cfg: &PollsConfig, store: Box<dyn SnapshotStore>) -> Result<PollService> {
    let service = PollService::open(store, cfg.policy())?;

    if let Some(seed_path) = &cfg.seed_path {
        let definitions = load_seed_file(seed_path)?;
        let report = service
            .seed_from_config(&definitions)
            .with_context(|| format!("apply seed {}", seed_path.display()))?;
        info!(
            seed = %seed_path.display(),
            created = report.created.len(),
            skipped = report.skipped.len(),
            "seed file applied"
        );
    }
    Ok(service)
}
