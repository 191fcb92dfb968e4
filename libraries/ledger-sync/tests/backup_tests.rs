mod test_helpers;

use ledger_core::types::{Activation, CompanyInfo, OwnedRecord, WorkOrder};
use ledger_core::LedgerError;
use ledger_sync::{ImportMode, ImportOutcome};
use serde_json::json;
use test_helpers::{expense, labels, order, Harness, PASSWORD};

#[tokio::test]
async fn test_export_snapshot_contents() {
    let h = Harness::local().await;
    h.sign_in("alice").await;
    h.engine.add(order("Pump repair", 150.0, "2024-03-01")).await.unwrap();
    h.engine.add(expense("Fuel", 50.0, "2024-03-02")).await.unwrap();

    let snapshot = h.backup.export_snapshot("alice").await.unwrap();

    assert_eq!(snapshot.owner(), Some("alice"));
    assert_eq!(snapshot.data.orders.len(), 1);
    assert_eq!(snapshot.stats.total_expenses, 1);
    assert_eq!(snapshot.stats.balance(), 100.0);

    let user = snapshot.user.as_ref().unwrap();
    assert!(user.unique_device_id.is_some());

    let stored = h.engine.store().stats("alice").await.unwrap().unwrap();
    assert_eq!(stored, snapshot.stats);
}

#[tokio::test]
async fn test_export_json_is_a_current_snapshot() {
    let h = Harness::local().await;
    h.sign_in("alice").await;

    let json = h.backup.export_json("alice").await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["formatVersion"], 2);
    assert_eq!(value["username"], "alice");
    assert!(value["data"]["orders"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_dedup_import_adds_only_new_identifiers() {
    let h = Harness::local().await;
    h.sign_in("alice").await;
    let mut existing = Vec::new();
    for name in ["A", "B", "C"] {
        existing.push(h.engine.add(order(name, 10.0, "2024-01-01")).await.unwrap());
    }

    let mut orders: Vec<serde_json::Value> = existing
        .iter()
        .map(|o| {
            json!({
                "id": o.id,
                "designation": format!("{} changed", o.designation),
                "amount": 1,
                "date": "2024-01-01"
            })
        })
        .collect();
    orders.push(json!({"id": 1000, "designation": "D", "amount": 1, "date": "2024-02-01"}));
    orders.push(json!({"id": 1001, "designation": "E", "amount": 1, "date": "2024-02-02"}));
    let file = json!({"version": "2.0", "data": {"orders": orders, "expenses": []}});

    let report = h.backup.import_data(&file.to_string()).await.unwrap();

    assert_eq!(report.imported_orders, 2);
    assert_eq!(report.skipped, 3);
    let after = h.orders().await;
    assert_eq!(labels(&after), vec!["A", "B", "C", "D", "E"]);
    assert!(after.iter().any(|o| o.id == Some(1000)));
}

#[tokio::test]
async fn test_dedup_import_checks_identifiers_across_owners() {
    let h = Harness::local().await;
    h.sign_in("bob").await;
    let bobs = h.engine.add(order("Bob A", 10.0, "2024-01-01")).await.unwrap();
    h.engine.logout().await.unwrap();

    h.sign_in("alice").await;
    let file = json!({
        "version": "2.0",
        "data": {
            "orders": [{"id": bobs.id, "designation": "Clash", "amount": 1, "date": "2024-01-01"}]
        }
    });
    let report = h.backup.import_data(&file.to_string()).await.unwrap();

    assert_eq!(report.imported_orders, 0);
    assert_eq!(report.skipped, 1);
    assert!(h.orders().await.is_empty());
}

#[tokio::test]
async fn test_dedup_import_requires_version_and_data() {
    let h = Harness::local().await;
    h.sign_in("alice").await;

    for contents in [r#"{"data": {"orders": []}}"#, r#"{"version": "2.0"}"#, "nope"] {
        let err = h.backup.import_data(contents).await.unwrap_err();
        assert!(matches!(err.as_ledger(), Some(LedgerError::SnapshotMalformed(_))));
    }
}

#[tokio::test]
async fn test_merge_mode_requires_username() {
    let h = Harness::local().await;
    h.sign_in("alice").await;
    h.engine.add(order("Kept", 10.0, "2024-01-01")).await.unwrap();

    let file = json!({"version": "2.0", "data": {"orders": [], "expenses": []}});
    let err = h
        .backup
        .import_snapshot(&file.to_string(), ImportMode::Merge)
        .await
        .unwrap_err();

    assert!(matches!(err.as_ledger(), Some(LedgerError::SnapshotMalformed(_))));
    assert_eq!(labels(&h.orders().await), vec!["Kept"]);
}

#[tokio::test]
async fn test_clear_only_touches_one_user() {
    let h = Harness::local().await;
    h.sign_in("bob").await;
    h.engine.add(order("Bob A", 10.0, "2024-01-01")).await.unwrap();
    h.engine.logout().await.unwrap();

    h.sign_in("alice").await;
    h.engine.add(order("Alice A", 10.0, "2024-01-01")).await.unwrap();
    h.engine.add(expense("Fuel", 10.0, "2024-01-01")).await.unwrap();
    h.engine
        .save_company_info(&CompanyInfo {
            name: "Alice SARL".into(),
            ..CompanyInfo::default()
        })
        .await
        .unwrap();
    h.engine.flush().await.unwrap();

    let report = h.backup.clear_all_owned_data("alice").await.unwrap();

    assert_eq!(report.orders, 1);
    assert_eq!(report.expenses, 1);
    assert!(report.settings >= 1);
    assert!(h.orders().await.is_empty());
    assert!(h.engine.company_info().await.unwrap().is_none());

    h.engine.logout().await.unwrap();
    h.engine.login("bob", PASSWORD).await.unwrap();
    assert_eq!(labels(&h.orders().await), vec!["Bob A"]);
}

#[tokio::test]
async fn test_export_clear_restore_round_trip() {
    let h = Harness::local().await;
    h.sign_in("alice").await;
    for (name, amount) in [("A", 10.0), ("B", 20.0)] {
        h.engine.add(order(name, amount, "2024-01-01")).await.unwrap();
    }
    h.engine.add(expense("Fuel", 5.0, "2024-01-02")).await.unwrap();

    let company = CompanyInfo {
        name: "Alice SARL".into(),
        tva: "FR00".into(),
        ..CompanyInfo::default()
    };
    h.engine.save_company_info(&company).await.unwrap();
    let activation = Activation {
        key: Some("KEY-A".into()),
        is_pro: true,
        username: Some("alice".into()),
        ..Activation::default()
    };
    h.engine.store().set_activation("alice", Some(&activation)).await.unwrap();
    h.engine.flush().await.unwrap();

    let before: Vec<WorkOrder> = h.orders().await;
    let exported = h.backup.export_json("alice").await.unwrap();

    h.backup.clear_all_owned_data("alice").await.unwrap();
    assert!(h.orders().await.is_empty());

    let outcome = h
        .backup
        .import_snapshot(&exported, ImportMode::CompleteRestore)
        .await
        .unwrap();
    let ImportOutcome::Restored(report) = outcome else {
        panic!("Expected a complete restore");
    };

    assert_eq!(report.imported_orders, 2);
    assert_eq!(report.imported_expenses, 1);
    assert!(report.restored_settings);

    let after = h.orders().await;
    assert_eq!(after.len(), before.len());
    for original in &before {
        assert!(after.iter().any(|o| o.designation == original.designation
            && o.amount == original.amount
            && o.date == original.date
            && o.category() == original.category()));
    }
    assert_eq!(h.expenses().await.len(), 1);
    assert_eq!(h.engine.company_info().await.unwrap(), Some(company));
    assert_eq!(
        h.engine.store().activation("alice").await.unwrap(),
        Some(activation)
    );
}

#[tokio::test]
async fn test_merge_mode_dispatches_to_merge_import() {
    let h = Harness::local().await;
    h.sign_in("alice").await;
    h.engine.add(order("Old", 10.0, "2024-01-01")).await.unwrap();

    let file = json!({
        "version": "2.0",
        "username": "alice",
        "data": {"orders": [{"designation": "New", "amount": 1, "date": "2024-01-01"}]}
    });
    let outcome = h
        .backup
        .import_snapshot(&file.to_string(), ImportMode::Merge)
        .await
        .unwrap();

    assert!(matches!(outcome, ImportOutcome::Merged(ref r) if r.orders == 1));
    assert_eq!(labels(&h.orders().await), vec!["New"]);
}
