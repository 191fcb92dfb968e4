/// Wiring of the store, the sync server client and the engine
use crate::config::LedgerConfig;
use crate::error::{CliError, Result};
use ledger_core::types::SnapshotFormat;
use ledger_core::{LedgerError, RemoteAuthority};
use ledger_server_client::{LedgerServerClient, ServerConfig};
use ledger_storage::LocalStore;
use ledger_sync::{BackupService, BcryptVerifier, SyncEngine};
use std::path::Path;
use std::sync::Arc;

/// Everything a command needs
pub struct App {
    pub engine: Arc<SyncEngine>,
    pub backup: BackupService,
}

impl App {
    /// Open the local store and start the engine
    ///
    /// Must run inside a tokio runtime (the engine spawns its outbox worker).
    pub async fn open(config: &LedgerConfig) -> Result<Self> {
        ensure_database_dir(&config.storage.database_url).await?;
        let store = LocalStore::open(&config.storage.database_url).await?;
        tracing::info!(database_url = %config.storage.database_url, "Local store opened");

        let remote = match config.remote.url() {
            Some(url) => {
                let client = LedgerServerClient::new(
                    ServerConfig::new(url).with_timeout(config.remote.timeout()),
                )?;
                tracing::info!(url = %client.url(), "Sync server configured");
                Some(Arc::new(client) as Arc<dyn RemoteAuthority>)
            }
            None => {
                tracing::info!("No sync server configured, running local-only");
                None
            }
        };

        let engine = Arc::new(SyncEngine::new(
            Arc::new(store),
            remote,
            Arc::new(BcryptVerifier::default()),
        ));
        let backup = BackupService::new(Arc::clone(&engine));

        Ok(Self { engine, backup })
    }

    /// Check that `username` may restore the backup in `contents`
    ///
    /// The backup must belong to `username`. An account already present
    /// locally must also pass its password check; an unknown one is created
    /// by the restore itself.
    pub async fn authorize_restore(
        &self,
        username: &str,
        password: &str,
        contents: &str,
    ) -> Result<()> {
        let snapshot = SnapshotFormat::parse(contents)?.into_snapshot();
        let owner = snapshot
            .owner()
            .ok_or_else(|| LedgerError::malformed("username is missing"))?;
        if owner != username {
            return Err(CliError::RestoreDenied(format!(
                "backup belongs to {owner}, not {username}"
            )));
        }

        if self.engine.store().find_user(username).await?.is_some() {
            self.engine.login(username, password).await?;
        }
        Ok(())
    }

    /// Drain pending autosaves before the process exits
    pub async fn shutdown(&self) -> Result<()> {
        self.engine.flush().await?;
        self.engine.store().close().await;
        Ok(())
    }
}

/// Create the directory holding a `sqlite://` database file
async fn ensure_database_dir(database_url: &str) -> Result<()> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);

    if path.is_empty() || path == ":memory:" {
        return Ok(());
    }

    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}
