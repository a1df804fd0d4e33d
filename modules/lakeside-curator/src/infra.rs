// Shared start-up for the curation binaries: logging, configuration and
// locating the record store.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use tracing_subscriber::EnvFilter;

use lakeside_common::{resolve_data_dir, Config, RecordStore};

/// Logs go to stderr so stdout stays machine-readable.
pub fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("lakeside_curator=info".parse()?)
                .add_directive("lakeside_common=info".parse()?)
                .add_directive("page_probe=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

/// Where the record files live.
#[derive(Debug, Clone, Default, Args)]
pub struct DataArgs {
    /// Root data directory (overrides LAKESIDE_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Lake slug; reads <data-dir>/lakes/<slug>/
    #[arg(long, global = true)]
    pub lake: Option<String>,
}

impl DataArgs {
    pub fn resolve(&self, config: &Config) -> PathBuf {
        let root = self.data_dir.as_ref().unwrap_or(&config.data_dir);
        resolve_data_dir(root, self.lake.as_deref())
    }
}

/// Load configuration from the environment and the store it points at.
/// Every record file must exist.
pub fn load_context(data: &DataArgs) -> Result<(Config, RecordStore)> {
    load_context_with(data, RecordStore::load)
}

/// Like [`load_context`], but missing record files count as empty, so the
/// curation tools work on a lake that has only some of its files.
pub fn load_curation_context(data: &DataArgs) -> Result<(Config, RecordStore)> {
    load_context_with(data, RecordStore::load_lenient)
}

fn load_context_with<F>(data: &DataArgs, load: F) -> Result<(Config, RecordStore)>
where
    F: FnOnce(&Path) -> lakeside_common::Result<RecordStore>,
{
    let config = Config::from_env().context("Invalid configuration")?;
    config.log_summary();

    let dir = data.resolve(&config);
    let store = load(&dir).with_context(|| format!("Failed to load records from {}", dir.display()))?;
    Ok((config, store))
}
