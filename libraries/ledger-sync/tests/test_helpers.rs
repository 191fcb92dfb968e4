//! Test harness for sync engine integration tests
//!
//! Each harness owns a REAL SQLite file in a temp dir and an engine wired to
//! either no server, a wiremock server, or an address nothing listens on.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use ledger_core::types::{Expense, WorkOrder};
use ledger_core::RemoteAuthority;
use ledger_server_client::{LedgerServerClient, ServerConfig};
use ledger_storage::LocalStore;
use ledger_sync::{BackupService, BcryptVerifier, SyncEngine};
use serde_json::Value;
use tempfile::TempDir;
use wiremock::MockServer;

pub const PASSWORD: &str = "secret1";

pub struct Harness {
    pub engine: Arc<SyncEngine>,
    pub backup: BackupService,
    _temp_dir: TempDir,
}

impl Harness {
    /// Engine without a sync server
    pub async fn local() -> Self {
        Self::build(None).await
    }

    /// Engine talking to a mock server
    pub async fn with_server(server: &MockServer) -> Self {
        let client = LedgerServerClient::new(ServerConfig::new(server.uri()))
            .expect("Failed to create client");
        Self::build(Some(Arc::new(client))).await
    }

    /// Engine configured with a server that refuses connections
    pub async fn unreachable() -> Self {
        let config =
            ServerConfig::new("http://127.0.0.1:9").with_timeout(Duration::from_secs(2));
        let client = LedgerServerClient::new(config).expect("Failed to create client");
        Self::build(Some(Arc::new(client))).await
    }

    async fn build(remote: Option<Arc<dyn RemoteAuthority>>) -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let url = format!("sqlite://{}", temp_dir.path().join("ledger.db").display());
        let store = LocalStore::open(&url).await.expect("Failed to open store");

        let engine = Arc::new(SyncEngine::new(
            Arc::new(store),
            remote,
            Arc::new(BcryptVerifier::with_cost(4)),
        ));
        let backup = BackupService::new(engine.clone());

        Self {
            engine,
            backup,
            _temp_dir: temp_dir,
        }
    }

    /// Register `username` and log them in
    pub async fn sign_in(&self, username: &str) {
        self.engine
            .register(username, &format!("{username}@example.com"), PASSWORD)
            .await
            .expect("register");
        self.engine.login(username, PASSWORD).await.expect("login");
    }

    pub async fn orders(&self) -> Vec<WorkOrder> {
        self.engine.list::<WorkOrder>().await.expect("list orders")
    }

    pub async fn expenses(&self) -> Vec<Expense> {
        self.engine.list::<Expense>().await.expect("list expenses")
    }
}

pub fn order(designation: &str, amount: f64, date: &str) -> WorkOrder {
    WorkOrder::new(designation, amount, "Maintenance", date)
}

pub fn expense(description: &str, amount: f64, date: &str) -> Expense {
    Expense::new(description, amount, "Carburant", date)
}

/// Bodies of every `/api/save` request the server received, as (filename, content)
pub async fn saved_documents(server: &MockServer) -> Vec<(String, Value)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() == "/api/save")
        .filter_map(|r| serde_json::from_slice::<Value>(&r.body).ok())
        .map(|body| {
            let filename = body["filename"].as_str().unwrap_or_default().to_string();
            (filename, body["content"].clone())
        })
        .collect()
}

pub fn labels(orders: &[WorkOrder]) -> Vec<String> {
    let mut labels: Vec<String> = orders.iter().map(|o| o.designation.clone()).collect();
    labels.sort();
    labels
}
