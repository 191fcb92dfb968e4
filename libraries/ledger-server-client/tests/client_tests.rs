//! Tests for the ledger server client.
//!
//! These tests use mock servers to verify client behavior without
//! requiring a real server connection.

use ledger_core::{LedgerError, RemoteAuthority};
use ledger_server_client::{LedgerServerClient, ServerClientError, ServerConfig};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client_for(server: &MockServer) -> LedgerServerClient {
    LedgerServerClient::new(ServerConfig::new(server.uri())).unwrap()
}

// =============================================================================
// Client Creation Tests
// =============================================================================

mod client_creation {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(LedgerServerClient::new(ServerConfig::new("https://example.com")).is_ok());
        assert!(LedgerServerClient::new(ServerConfig::new("http://localhost:5000")).is_ok());
    }

    #[test]
    fn test_empty_url_rejected() {
        match LedgerServerClient::new(ServerConfig::new("")) {
            Err(ServerClientError::InvalidUrl(msg)) => assert!(msg.contains("empty")),
            other => panic!("Expected InvalidUrl error, got: {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_scheme_rejected() {
        let result = LedgerServerClient::new(ServerConfig::new("ledger.example.com"));
        assert!(matches!(result, Err(ServerClientError::InvalidUrl(_))));
    }

    #[test]
    fn test_trailing_slashes_trimmed() {
        let client = LedgerServerClient::new(ServerConfig::new("https://example.com///")).unwrap();
        assert_eq!(client.url(), "https://example.com");
    }
}

// =============================================================================
// Account Tests
// =============================================================================

mod accounts {
    use super::*;

    #[tokio::test]
    async fn test_login_returns_wrapped_user() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/login"))
            .and(body_json(json!({"username": "alice", "password": "secret1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "user": {"username": "alice", "email": "alice@example.com", "userUniqueId": "ABC"}
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let user = RemoteAuthority::login(&client, "alice", "secret1").await.unwrap();

        assert_eq!(user.username, "alice");
        assert_eq!(user.unique_device_id.as_deref(), Some("ABC"));
    }

    #[tokio::test]
    async fn test_login_invalid_credentials() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/login"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "bad password"})),
            )
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let err = RemoteAuthority::login(&client, "alice", "nope").await.unwrap_err();

        assert!(matches!(err, LedgerError::InvalidCredentials(_)));
    }

    #[tokio::test]
    async fn test_register_conflict_is_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/register"))
            .respond_with(ResponseTemplate::new(409).set_body_json(json!({"error": "User exists"})))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let err = client
            .register("alice", "alice@example.com", "secret1")
            .await
            .unwrap_err();

        match err {
            LedgerError::RemoteRejected { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "User exists");
            }
            e => panic!("Expected RemoteRejected, got: {:?}", e),
        }
    }
}

// =============================================================================
// Document Tests
// =============================================================================

mod documents {
    use super::*;

    #[tokio::test]
    async fn test_save_posts_filename_and_content() {
        let mock_server = MockServer::start().await;
        let content = json!({
            "username": "alice",
            "type": "user_data",
            "data": {"orders": [], "expenses": []}
        });

        Mock::given(method("POST"))
            .and(path("/api/save"))
            .and(body_json(json!({"filename": "user_data_alice.json", "content": content})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        client
            .save_document("user_data_alice.json", &content)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_info_falls_back_to_users_route() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/load_info/alice"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/users/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"username": "bob"},
                {"username": "alice", "email": "alice@example.com", "settings": {"theme": "dark"}}
            ])))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let info = client.load_info("alice").await.unwrap().unwrap();

        assert_eq!(info.username, "alice");
        assert_eq!(info.email.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn test_load_data_reads_primary_route() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/load_data/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "username": "alice",
                "type": "user_data",
                "data": {
                    "orders": [
                        {"id": 1, "designation": "Gate", "amount": 120, "date": "2024-01-01"}
                    ],
                    "expenses": []
                }
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let data = client.load_data("alice").await.unwrap().unwrap();

        assert_eq!(data.data.orders.len(), 1);
        assert_eq!(data.data.orders[0].designation, "Gate");
    }

    #[tokio::test]
    async fn test_username_is_one_escaped_path_segment() {
        let mock_server = MockServer::start().await;

        for route in ["/api/load_data/bob", "/api/user_data/bob"] {
            Mock::given(method("GET"))
                .and(path(route))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "username": "bob",
                    "data": {
                        "orders": [
                            {"id": 1, "designation": "Bob only", "amount": 1, "date": "2024-01-01"}
                        ]
                    }
                })))
                .mount(&mock_server)
                .await;
        }

        let client = client_for(&mock_server).await;
        assert!(client.load_data("bob#evil").await.unwrap().is_none());

        let requested: Vec<String> = mock_server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect();
        assert_eq!(
            requested,
            vec!["/api/load_data/bob%23evil", "/api/user_data/bob%23evil"]
        );
    }

    #[tokio::test]
    async fn test_nothing_stored_is_none_not_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;

        assert!(client.load_info("carol").await.unwrap().is_none());
        assert!(client.load_data("carol").await.unwrap().is_none());
        assert!(client.load_categories("carol").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_array_without_user_is_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/load_data/carol"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"username": "bob"}])))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        assert!(client.load_data("carol").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_categories() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/load_categories/alice"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "username": "alice",
                "otCategories": ["Plumbing"],
                "expenseCategories": ["Tolls"]
            })))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let doc = client.load_categories("alice").await.unwrap().unwrap();

        assert_eq!(doc.categories.work_orders, vec!["Plumbing"]);
        assert_eq!(doc.categories.expenses, vec!["Tolls"]);
    }

    #[tokio::test]
    async fn test_update_company_info_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/update_company_info"))
            .and(body_json(json!({
                "username": "alice",
                "companyInfo": {
                    "name": "Alice SARL", "address": "", "phone": "",
                    "email": "", "siret": "", "tva": ""
                }
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let info = ledger_core::CompanyInfo {
            name: "Alice SARL".into(),
            ..Default::default()
        };
        client.update_company_info("alice", &info).await.unwrap();
    }
}

// =============================================================================
// Connectivity Tests
// =============================================================================

mod connectivity {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_server_is_an_error() {
        // Nothing listens on port 1
        let client = LedgerServerClient::new(ServerConfig::new("http://127.0.0.1:1")).unwrap();

        let err = client.load_data("alice").await.unwrap_err();
        assert!(err.is_remote());
        assert!(matches!(err, LedgerError::RemoteUnreachable(_)));
    }

    #[tokio::test]
    async fn test_server_error_on_save_is_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/save"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&mock_server)
            .await;

        let client = client_for(&mock_server).await;
        let err = client.save_document("x.json", &json!({})).await.unwrap_err();

        assert!(matches!(err, LedgerError::RemoteRejected { status: 500, .. }));
    }
}
