//! Pokedex Sync - client-side catalog and favorites synchronization core
//!
//! Fetches a paginated creature catalog from a remote service, keeps a favorites
//! subset in step with a remote store, and exposes both as observable snapshots
//! for a presentation shell. The binary drives the core headlessly from the
//! command line.

// Module declarations
pub mod domain;
pub mod infrastructure;
pub mod sync;
pub mod types;

pub use domain::{DamageRelations, ItemRecord, SyncError, SyncResult};
pub use sync::{CatalogSnapshot, DetailView, FavoritesState, PokedexSync, SyncOptions};
pub use types::{IntentOutcome, ShellIntent};

use anyhow::{Context, Result, anyhow};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::domain::services::{CatalogRemote, FavoritesRemote};
use crate::infrastructure::config::ConfigManager;
use crate::infrastructure::fixture_remote::InMemoryRemote;
use crate::infrastructure::logging::{init_logging_with_config, log_system_info};
use crate::infrastructure::pokemon_remote::PokemonRemote;

/// Catalog size served by `--offline`
const OFFLINE_CATALOG_SIZE: u32 = 151;

const USAGE: &str = "usage: pokedex-sync [--offline] \
    <page N | next | prev | ids | favorites | add ID | remove ID | toggle ID | detail ID>";

pub fn run() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(run_cli(args))
}

async fn run_cli(args: Vec<String>) -> Result<()> {
    let offline = args.iter().any(|arg| arg == "--offline");
    let words: Vec<&str> = args
        .iter()
        .map(String::as_str)
        .filter(|arg| !arg.starts_with("--"))
        .collect();

    let manager = ConfigManager::new()?;
    let mut config = manager.load_config().await?;
    config.apply_env_overrides()?;

    init_logging_with_config(config.user.logging.clone())?;
    log_system_info();

    let resume_page = config.app_managed.last_viewed_page.unwrap_or(1);
    let intent = if words.is_empty() {
        ShellIntent::LoadPage(resume_page)
    } else {
        ShellIntent::parse_args(&words).ok_or_else(|| anyhow!(USAGE))?
    };

    let (catalog_remote, favorites_remote): (Arc<dyn CatalogRemote>, Arc<dyn FavoritesRemote>) = if offline {
        info!("Running offline against an in-memory catalog of {} items", OFFLINE_CATALOG_SIZE);
        let remote = InMemoryRemote::with_generated_catalog(OFFLINE_CATALOG_SIZE);
        (Arc::new(remote.clone()), Arc::new(remote))
    } else {
        let remote = PokemonRemote::from_config(&config.advanced)?;
        info!(
            "Catalog: {} | Favorites: {}",
            remote.catalog_base(),
            remote.favorites_base()
        );
        (Arc::new(remote.clone()), Arc::new(remote))
    };

    let core = PokedexSync::new(catalog_remote, favorites_remote, SyncOptions::from_config(&config));

    if intent.needs_catalog() {
        if let Err(e) = core.favorites().sync().await {
            warn!("Favorites could not be loaded: {}", e);
        }
        if let Err(e) = core.catalog().load_page(resume_page).await {
            warn!("Page {} could not be loaded: {}", resume_page, e);
        }
    }

    let outcome = core.dispatch(intent.clone()).await;

    let snapshot = core.catalog_snapshot();
    if let Some(page) = snapshot.page {
        manager
            .update_app_managed(|managed| {
                managed.last_viewed_page = Some(page);
                managed.last_known_total_count = Some(snapshot.total_count);
                managed.last_successful_sync = Some(chrono::Utc::now().to_rfc3339());
            })
            .await?;
    }

    match outcome {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Err(e) if !e.is_user_visible() => {
            warn!("{:?} was superseded: {}", intent, e);
            Ok(())
        }
        Err(e) => {
            error!("{:?} failed: {}", intent, e);
            Err(anyhow!(e))
        }
    }
}
