
use ledger_core::types::{Expense, WorkOrder};
use ledger_storage::{LocalStore, UserContext};
use test_helpers::{expense, order, TestDb};

#[tokio::test]
async fn test_insert_assigns_id_and_stamps_owner() {
    let db = TestDb::new().await;
    let ctx = UserContext::for_user("alice");

    let mut input = order("Pump repair", 150.0, "2024-03-01");
    input.owner = Some("mallory".to_string());
    input.id = Some(999);

    let saved = db.store.insert(&ctx, input).await.unwrap();

    assert!(saved.id.is_some());
    assert_ne!(saved.id, Some(999));
    assert_eq!(saved.owner.as_deref(), Some("alice"));
    assert!(saved.created_at.is_some());

    let all: Vec<WorkOrder> = db.store.read_all(&ctx).await.unwrap();
    assert_eq!(all, vec![saved]);
}

#[tokio::test]
async fn test_owner_isolation() {
    let db = TestDb::new().await;
    let mut ctx = UserContext::new();

    ctx.set_current_user(Some("alice"));
    db.store.insert(&ctx, order("A", 10.0, "2024-01-01")).await.unwrap();
    db.store.insert(&ctx, order("B", 20.0, "2024-01-02")).await.unwrap();

    ctx.set_current_user(Some("bob"));
    db.store.insert(&ctx, order("C", 30.0, "2024-01-03")).await.unwrap();

    let bobs: Vec<WorkOrder> = db.store.read_all(&ctx).await.unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].designation, "C");

    ctx.set_current_user(Some("alice"));
    let alices: Vec<WorkOrder> = db.store.read_all(&ctx).await.unwrap();
    let labels: Vec<_> = alices.iter().map(|o| o.designation.as_str()).collect();
    assert_eq!(labels, vec!["A", "B"]);

    let everyone: Vec<WorkOrder> = db.store.read_all_any().await.unwrap();
    assert_eq!(everyone.len(), 3);
}

#[tokio::test]
async fn test_scoped_read_without_user_is_empty() {
    let db = TestDb::new().await;
    db.store
        .insert(&UserContext::for_user("alice"), order("A", 10.0, "2024-01-01"))
        .await
        .unwrap();

    let none: Vec<WorkOrder> = db.store.read_all(&UserContext::new()).await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_update_is_idempotent_and_scoped() {
    let db = TestDb::new().await;
    let alice = UserContext::for_user("alice");
    let bob = UserContext::for_user("bob");

    let mut saved = db.store.insert(&alice, order("A", 10.0, "2024-01-01")).await.unwrap();
    saved.amount = 12.5;

    assert!(db.store.update(&alice, &saved).await.unwrap());
    assert!(db.store.update(&alice, &saved).await.unwrap());

    let reloaded: WorkOrder = db
        .store
        .find_by_id(&alice, saved.id.unwrap())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(reloaded.amount, 12.5);

    // Bob cannot touch Alice's record
    saved.amount = 1.0;
    assert!(!db.store.update(&bob, &saved).await.unwrap());

    // Unknown identifier is a silent no-op
    let mut ghost = saved.clone();
    ghost.id = Some(4242);
    assert!(!db.store.update(&alice, &ghost).await.unwrap());

    let all: Vec<WorkOrder> = db.store.read_all(&alice).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].amount, 12.5);
}

#[tokio::test]
async fn test_upsert_never_overwrites_other_owner() {
    let db = TestDb::new().await;
    let alice = UserContext::for_user("alice");
    let bob = UserContext::for_user("bob");

    let alices = db.store.insert(&alice, expense("Fuel", 60.0, "2024-02-01")).await.unwrap();

    let mut intruder = expense("Tolls", 8.0, "2024-02-02");
    intruder.id = alices.id;
    let bobs = db.store.upsert(&bob, intruder).await.unwrap();

    assert_ne!(bobs.id, alices.id);
    let still: Expense = db.store.find_by_id(&alice, alices.id.unwrap()).await.unwrap().unwrap();
    assert_eq!(still.description, "Fuel");

    // Same owner replaces in place
    let mut changed = still.clone();
    changed.amount = 65.0;
    let replaced = db.store.upsert(&alice, changed).await.unwrap();
    assert_eq!(replaced.id, alices.id);
    assert_eq!(db.store.count_owned_by::<Expense>("alice").await.unwrap(), 1);
}

#[tokio::test]
async fn test_restore_keeps_free_identifier() {
    let db = TestDb::new().await;
    let alice = UserContext::for_user("alice");

    let mut imported = order("Imported", 40.0, "2023-12-01");
    imported.id = Some(77);
    let kept = db.store.restore(&alice, imported.clone()).await.unwrap();
    assert_eq!(kept.id, Some(77));

    let taken = db.store.restore(&alice, imported).await.unwrap();
    assert_ne!(taken.id, Some(77));
}

#[tokio::test]
async fn test_secondary_lookups() {
    let db = TestDb::new().await;
    let alice = UserContext::for_user("alice");

    db.store
        .insert(&alice, WorkOrder::new("A", 10.0, "Plumbing", "2024-01-10T08:00:00.000Z"))
        .await
        .unwrap();
    db.store.insert(&alice, WorkOrder::new("B", 20.0, "Heating", "2024-01-31")).await.unwrap();
    db.store.insert(&alice, WorkOrder::new("C", 30.0, "Plumbing", "2024-02-01")).await.unwrap();

    let plumbing: Vec<WorkOrder> = db.store.find_by_category(&alice, "Plumbing").await.unwrap();
    assert_eq!(plumbing.len(), 2);

    let january: Vec<WorkOrder> = db
        .store
        .find_in_date_range(&alice, "2024-01-01", "2024-01-31")
        .await
        .unwrap();
    let labels: Vec<_> = january.iter().map(|o| o.designation.as_str()).collect();
    assert_eq!(labels, vec!["A", "B"]);
}

#[tokio::test]
async fn test_delete_and_clear_variants() {
    let db = TestDb::new().await;
    let alice = UserContext::for_user("alice");
    let bob = UserContext::for_user("bob");

    let a = db.store.insert(&alice, order("A", 10.0, "2024-01-01")).await.unwrap();
    db.store.insert(&alice, order("B", 10.0, "2024-01-01")).await.unwrap();
    let c = db.store.insert(&bob, order("C", 10.0, "2024-01-01")).await.unwrap();

    // Owned delete cannot reach Bob's record
    assert!(!db.store.delete_owned::<WorkOrder>(&alice, c.id.unwrap()).await.unwrap());
    assert!(db.store.delete_owned::<WorkOrder>(&alice, a.id.unwrap()).await.unwrap());

    assert_eq!(db.store.clear_owned::<WorkOrder>(&alice).await.unwrap(), 1);
    assert_eq!(db.store.read_all::<WorkOrder>(&bob).await.unwrap().len(), 1);

    assert!(db.store.delete_any::<WorkOrder>(c.id.unwrap()).await.unwrap());
    assert!(db.store.read_all_any::<WorkOrder>().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_identifiers_are_never_reused() {
    let db = TestDb::new().await;
    let alice = UserContext::for_user("alice");

    let first = db.store.insert(&alice, order("A", 10.0, "2024-01-01")).await.unwrap();
    db.store.delete_owned::<WorkOrder>(&alice, first.id.unwrap()).await.unwrap();
    let second = db.store.insert(&alice, order("B", 10.0, "2024-01-01")).await.unwrap();

    assert!(second.id.unwrap() > first.id.unwrap());
}

#[tokio::test]
async fn test_reopen_keeps_data_and_reconnects() {
    let db = TestDb::new().await;
    let alice = UserContext::for_user("alice");
    db.store.insert(&alice, order("A", 10.0, "2024-01-01")).await.unwrap();

    // A closed pool is reopened transparently
    db.store.close().await;
    let after_close: Vec<WorkOrder> = db.store.read_all(&alice).await.unwrap();
    assert_eq!(after_close.len(), 1);

    // Opening the same file again is idempotent
    let reopened = LocalStore::open(&db.url).await.unwrap();
    let again: Vec<WorkOrder> = reopened.read_all(&alice).await.unwrap();
    assert_eq!(again.len(), 1);
}

#[tokio::test]
async fn test_unopenable_store_is_unavailable() {
    let err = LocalStore::open("sqlite:///nonexistent-dir/for/sure/ledger.db")
        .await
        .err()
        .unwrap();

    assert!(matches!(err, ledger_core::LedgerError::StoreUnavailable(_)));
}
