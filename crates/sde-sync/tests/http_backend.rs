//! HttpBackend against a mock server

use sde_catalog::{ClientId, EntityDraft, EntityName, IndustryFilter, SelectionRecord, Sensitivity};
use sde_sync::{AffectedSdes, EngineConfig, HttpBackend, SdeBackend, SyncError};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> HttpBackend {
    let config = EngineConfig::new()
        .with_base_url(server.uri())
        .with_client_id("acme");
    HttpBackend::new(&config).unwrap()
}

fn acme() -> ClientId {
    ClientId::new("acme").unwrap()
}

fn ssn() -> EntityName {
    EntityName::new("ssn").unwrap()
}

#[tokio::test]
async fn fetch_catalog_sends_industry_and_accepts_numeric_ids() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sdes"))
        .and(query_param("industry", "healthcare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 17, "name": "mrn", "sensitivity": "High", "classification": "PHI",
             "data_type": "string", "industry": "healthcare", "detection_pattern": "MRN\\d+"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let entries = backend(&server)
        .fetch_catalog(&IndustryFilter::from("healthcare"))
        .await
        .unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id.as_str(), "17");
    assert_eq!(entries[0].industry_tag.as_deref(), Some("healthcare"));
    assert_eq!(entries[0].sensitivity, Sensitivity::High);
}

#[tokio::test]
async fn fetch_catalog_for_all_industries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sdes"))
        .and(query_param("industry", "all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let entries = backend(&server).fetch_catalog(&IndustryFilter::All).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn fetch_persisted_unwraps_selected_sdes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clients/acme/selected-sdes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "selected_sdes": [
                {"name": "email", "sensitivity": "High", "protection_method": null},
                {"name": "ssn", "sensitivity": "High", "protection_method": "mask"}
            ]
        })))
        .mount(&server)
        .await;

    let records = backend(&server).fetch_persisted(&acme()).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].protection_method, None);
    assert_eq!(records[1].protection_method.as_deref(), Some("mask"));
}

#[tokio::test]
async fn commit_delta_posts_body_and_returns_saved_count() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/store-client-sdes"))
        .and(body_json(json!({
            "client_id": "acme",
            "sdes": [{"name": "email", "sensitivity": "High", "protection_method": null}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success", "saved_count": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let delta = vec![SelectionRecord::new(EntityName::new("email").unwrap(), Sensitivity::High)];
    let saved = backend(&server).commit_delta(&acme(), &delta).await.unwrap();
    assert_eq!(saved, 1);
}

#[tokio::test]
async fn commit_with_non_success_status_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/store-client-sdes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "error"})))
        .mount(&server)
        .await;

    let err = backend(&server).commit_delta(&acme(), &[]).await.unwrap_err();
    assert!(matches!(err, SyncError::Server { status: 200, .. }));
}

#[tokio::test]
async fn remove_one_sends_pattern_name() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/sdes/remove"))
        .and(body_json(json!({"client_id": "acme", "pattern_name": "ssn"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    backend(&server).remove_one(&acme(), &ssn()).await.unwrap();
}

#[tokio::test]
async fn remove_conflict_becomes_constraint_violation() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/sdes/remove"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "detail": {
                "error": "constraint_violation",
                "affected_sdes": ["ssn"],
                "finding_count": 3
            }
        })))
        .mount(&server)
        .await;

    let err = backend(&server).remove_one(&acme(), &ssn()).await.unwrap_err();

    let SyncError::ConstraintViolation(conflict) = &err else {
        panic!("expected constraint violation, got {err:?}");
    };
    assert_eq!(conflict.finding_count, 3);
    assert_eq!(conflict.affected_sdes, AffectedSdes::Names(vec!["ssn".to_string()]));
    let message = err.user_message();
    assert!(message.contains('3') && message.contains("findings"));
}

#[tokio::test]
async fn remove_missing_is_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/sdes/remove"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "SDE not found"})))
        .mount(&server)
        .await;

    let err = backend(&server).remove_one(&acme(), &ssn()).await.unwrap_err();
    assert!(err.is_benign());
    assert_eq!(err, SyncError::NotFound("SDE not found".to_string()));
}

#[tokio::test]
async fn clear_all_returns_cleared_count() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/sdes/clear-all"))
        .and(body_json(json!({"client_id": "acme"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success", "cleared_count": 4})))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(backend(&server).clear_all(&acme()).await.unwrap(), 4);
}

#[tokio::test]
async fn clear_all_conflict_with_count_only() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/sdes/clear-all"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "detail": {"error": "constraint_violation", "affected_sdes": 2, "finding_count": 5}
        })))
        .mount(&server)
        .await;

    let err = backend(&server).clear_all(&acme()).await.unwrap_err();
    assert!(matches!(
        err,
        SyncError::ConstraintViolation(ref c) if c.affected_sdes == AffectedSdes::Count(2)
    ));
}

#[tokio::test]
async fn forbidden_is_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clients/acme/selected-sdes"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Not allowed"})))
        .mount(&server)
        .await;

    let err = backend(&server).fetch_persisted(&acme()).await.unwrap_err();
    assert!(err.is_terminal());
}

#[tokio::test]
async fn unknown_error_keeps_raw_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/sdes"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream timed out"))
        .mount(&server)
        .await;

    let err = backend(&server).fetch_catalog(&IndustryFilter::All).await.unwrap_err();
    assert_eq!(
        err,
        SyncError::Server {
            status: 502,
            message: "upstream timed out".to_string()
        }
    );
    assert_eq!(err.user_message(), "upstream timed out");
    assert!(err.is_retryable());
}

#[tokio::test]
async fn garbage_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/clients/acme/selected-sdes"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = backend(&server).fetch_persisted(&acme()).await.unwrap_err();
    assert!(matches!(err, SyncError::MalformedResponse(_)));
}

#[tokio::test]
async fn unreachable_server_is_network_error() {
    let server = MockServer::start().await;
    let http = backend(&server);
    drop(server);

    let err = http.fetch_persisted(&acme()).await.unwrap_err();
    assert!(matches!(err, SyncError::Network(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn create_entity_posts_draft() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/sdes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "sde-9", "name": "passport", "sensitivity": "High",
            "detection_pattern": "[A-Z][0-9]{8}"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let draft = EntityDraft::new("passport", Sensitivity::High, "[A-Z][0-9]{8}");
    let created = backend(&server).create_entity(&draft).await.unwrap();

    assert_eq!(created.id.as_str(), "sde-9");
    assert_eq!(created.name.as_str(), "passport");

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["name"], "passport");
    assert_eq!(body["detection_pattern"], "[A-Z][0-9]{8}");
}
