//! User data store and token ledger backends for HabitCoach.
//!
//! Both are external collaborators of the coach: the app owns the records
//! and billing owns replenishment. These backends are plain read/debit
//! wrappers so the system is runnable end to end.

pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use in_memory::{InMemoryLedger, InMemoryStore, UserRecords};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

use habitcoach_config::AppConfig;
use habitcoach_core::error::StoreError;
use habitcoach_core::ledger::TokenLedger;
use habitcoach_core::store::UserDataStore;
use std::sync::Arc;

/// The store and ledger selected by configuration.
pub struct Backends {
    pub store: Arc<dyn UserDataStore>,
    pub ledger: Arc<dyn TokenLedger>,
}

/// Open the backends named in `[store]` and `[ledger]`.
///
/// When both use SQLite on the same file, a single pool serves both.
pub async fn build_from_config(config: &AppConfig) -> Result<Backends, StoreError> {
    let store: Arc<dyn UserDataStore>;
    let ledger: Arc<dyn TokenLedger>;

    match (config.store.backend.as_str(), config.ledger.backend.as_str()) {
        #[cfg(feature = "sqlite")]
        ("sqlite", "sqlite") if config.store_path() == config.ledger_path() => {
            let shared = Arc::new(open_sqlite(&config.store_path()).await?);
            store = shared.clone();
            ledger = shared;
        }
        (store_backend, ledger_backend) => {
            store = match store_backend {
                #[cfg(feature = "sqlite")]
                "sqlite" => Arc::new(open_sqlite(&config.store_path()).await?),
                _ => Arc::new(InMemoryStore::new()),
            };
            ledger = match ledger_backend {
                #[cfg(feature = "sqlite")]
                "sqlite" => Arc::new(open_sqlite(&config.ledger_path()).await?),
                _ => Arc::new(InMemoryLedger::new()),
            };
        }
    }

    tracing::info!(store = store.name(), ledger = ledger.name(), "Backends ready");
    Ok(Backends { store, ledger })
}

#[cfg(feature = "sqlite")]
pub async fn open_sqlite(path: &std::path::Path) -> Result<SqliteStore, StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", parent.display())))?;
    }
    SqliteStore::new(&format!("sqlite://{}", path.display())).await
}
