
use ledger_core::types::{
    Activation, CompanyInfo, CustomCategories, SettingsBundle, SnapshotStats, Theme,
};
use ledger_storage::settings::{self, SettingsScope};
use test_helpers::TestDb;

#[tokio::test]
async fn test_set_and_get_setting() {
    let db = TestDb::new().await;
    let pool = db.store.pool().await.unwrap();
    let scope = SettingsScope::user("alice");

    let value = serde_json::json!({"name": "Alice SARL"});
    settings::set_setting(&pool, &scope, settings::SETTING_COMPANY_INFO, &value)
        .await
        .unwrap();

    let result = settings::get_setting(&pool, &scope, settings::SETTING_COMPANY_INFO)
        .await
        .unwrap();
    assert_eq!(result, Some(value));

    // Other users do not see it
    let bob = SettingsScope::user("bob");
    let other = settings::get_setting(&pool, &bob, settings::SETTING_COMPANY_INFO)
        .await
        .unwrap();
    assert!(other.is_none());
}

#[tokio::test]
async fn test_theme_is_global_and_defaults_to_light() {
    let db = TestDb::new().await;

    assert_eq!(db.store.theme().await.unwrap().as_str(), "light");
    db.store.set_theme(&Theme::new("dark")).await.unwrap();
    assert_eq!(db.store.theme().await.unwrap().as_str(), "dark");
}

#[tokio::test]
async fn test_bundle_round_trip_removes_absent_keys() {
    let db = TestDb::new().await;

    let bundle = SettingsBundle {
        theme: Theme::new("dark"),
        company_info: Some(CompanyInfo {
            name: "Alice SARL".into(),
            ..CompanyInfo::default()
        }),
        activation: Some(Activation {
            is_pro: true,
            username: Some("alice".into()),
            ..Activation::default()
        }),
        categories: Some(CustomCategories {
            work_orders: vec!["Plumbing".into()],
            expenses: vec![],
        }),
    };

    db.store.save_settings("alice", &bundle).await.unwrap();
    assert_eq!(db.store.load_settings("alice").await.unwrap(), bundle);

    let cleared = SettingsBundle {
        theme: Theme::new("dark"),
        ..SettingsBundle::default()
    };
    db.store.save_settings("alice", &cleared).await.unwrap();
    assert_eq!(db.store.load_settings("alice").await.unwrap(), cleared);
}

#[tokio::test]
async fn test_clear_user_settings_leaves_others() {
    let db = TestDb::new().await;
    let info = CompanyInfo::default();

    db.store.set_company_info("alice", Some(&info)).await.unwrap();
    db.store.set_company_info("bob", Some(&info)).await.unwrap();
    db.store
        .set_backup_mirror("alice", &serde_json::json!({"data": {}}))
        .await
        .unwrap();

    assert_eq!(db.store.clear_user_settings("alice").await.unwrap(), 2);
    assert!(db.store.company_info("alice").await.unwrap().is_none());
    assert!(db.store.company_info("bob").await.unwrap().is_some());
}

#[tokio::test]
async fn test_stats_upsert() {
    let db = TestDb::new().await;
    let mut stats = SnapshotStats {
        total_orders: 2,
        total_expenses: 1,
        total_revenue: 300.0,
        total_expenses_amount: 45.5,
    };

    db.store.set_stats("alice", &stats).await.unwrap();
    stats.total_orders = 3;
    db.store.set_stats("alice", &stats).await.unwrap();

    assert_eq!(db.store.stats("alice").await.unwrap(), Some(stats));
    assert!(db.store.stats("bob").await.unwrap().is_none());
}
