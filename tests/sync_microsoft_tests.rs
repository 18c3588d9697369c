//! Integration tests for the Microsoft reconciliation path: clientState
//! validation, deletion handling without a Graph round trip, showAs
//! mapping, and per-notification batch isolation.

mod common;

use orbyt_sync::models::{connected_account, external_event};
use orbyt_sync::sync::MicrosoftNotification;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

const TOKEN_PATH: &str = "/common/oauth2/v2.0/token";

fn notification(subscription_id: &str, change_type: &str, event_id: &str) -> MicrosoftNotification {
    MicrosoftNotification {
        subscription_id: subscription_id.to_string(),
        change_type: change_type.to_string(),
        resource: format!("Users/user-1/Events/{}", event_id),
        client_state: Some(subscription_id.to_string()),
    }
}

async fn mount_token_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "ms-access",
            "expires_in": 3600
        })))
        .mount(server)
        .await;
}

fn graph_event(id: &str, subject: &str, show_as: &str) -> serde_json::Value {
    json!({
        "id": id,
        "subject": subject,
        "body": {"content": "details", "contentType": "text"},
        "location": {"displayName": "Kitchen"},
        "start": {"dateTime": "2026-09-05T18:00:00.0000000", "timeZone": "UTC"},
        "end": {"dateTime": "2026-09-05T19:00:00.0000000", "timeZone": "UTC"},
        "isAllDay": false,
        "showAs": show_as,
        "lastModifiedDateTime": "2026-08-28T07:00:00Z",
        "changeKey": "ck-1"
    })
}

#[tokio::test]
async fn updated_notification_fetches_and_upserts() {
    let db = test_db().await;
    let server = MockServer::start().await;
    let engine = test_engine(db.clone(), &server.uri());

    let account = seed_account(&db, Uuid::new_v4(), "microsoft", Some("ms-rt"), None).await;
    seed_subscription(&db, account.id, "sub-1", None, None, true).await;

    mount_token_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/me/events/AAMk-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(graph_event("AAMk-1", "Family dinner", "busy")),
        )
        .mount(&server)
        .await;

    engine
        .handle_microsoft_notification(&notification("sub-1", "updated", "AAMk-1"))
        .await
        .unwrap();

    let row = external_event::Entity::find()
        .filter(external_event::Column::ExternalId.eq("AAMk-1"))
        .one(&*db)
        .await
        .unwrap()
        .expect("graph event persisted");
    assert_eq!(row.title, "Family dinner");
    assert_eq!(row.status, "confirmed");
    assert_eq!(row.description.as_deref(), Some("details"));
    assert_eq!(row.location.as_deref(), Some("Kitchen"));
    assert_eq!(row.etag.as_deref(), Some("ck-1"));

    let account = connected_account::Entity::find_by_id(account.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert!(account.last_sync_at.is_some());
    assert!(account.sync_error.is_none());
}

#[tokio::test]
async fn free_show_as_maps_to_cancelled() {
    let db = test_db().await;
    let server = MockServer::start().await;
    let engine = test_engine(db.clone(), &server.uri());

    let account = seed_account(&db, Uuid::new_v4(), "microsoft", Some("ms-rt"), None).await;
    seed_subscription(&db, account.id, "sub-1", None, None, true).await;

    mount_token_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/me/events/AAMk-2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(graph_event("AAMk-2", "Maybe free", "free")),
        )
        .mount(&server)
        .await;

    engine
        .handle_microsoft_notification(&notification("sub-1", "updated", "AAMk-2"))
        .await
        .unwrap();

    let row = external_event::Entity::find()
        .filter(external_event::Column::ExternalId.eq("AAMk-2"))
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, "cancelled");
}

#[tokio::test]
async fn deleted_notification_marks_cancelled_without_graph_fetch() {
    let db = test_db().await;
    let server = MockServer::start().await;
    let engine = test_engine(db.clone(), &server.uri());

    let user_id = Uuid::new_v4();
    let account = seed_account(&db, user_id, "microsoft", Some("ms-rt"), None).await;
    seed_subscription(&db, account.id, "sub-1", None, None, true).await;
    seed_external_event(&db, account.id, user_id, "AAMk-3", "Book club", None, None).await;

    mount_token_ok(&server).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/me/events/.*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    engine
        .handle_microsoft_notification(&notification("sub-1", "deleted", "AAMk-3"))
        .await
        .unwrap();

    let row = external_event::Entity::find()
        .filter(external_event::Column::ExternalId.eq("AAMk-3"))
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, "cancelled");
}

#[tokio::test]
async fn client_state_mismatch_is_ignored() {
    let db = test_db().await;
    let server = MockServer::start().await;
    let engine = test_engine(db.clone(), &server.uri());

    let account = seed_account(&db, Uuid::new_v4(), "microsoft", Some("ms-rt"), None).await;
    seed_subscription(&db, account.id, "sub-1", None, None, true).await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut spoofed = notification("sub-1", "updated", "AAMk-4");
    spoofed.client_state = Some("wrong-state".to_string());

    engine.handle_microsoft_notification(&spoofed).await.unwrap();
}

#[tokio::test]
async fn absent_client_state_is_still_reconciled() {
    let db = test_db().await;
    let server = MockServer::start().await;
    let engine = test_engine(db.clone(), &server.uri());

    let account = seed_account(&db, Uuid::new_v4(), "microsoft", Some("ms-rt"), None).await;
    seed_subscription(&db, account.id, "sub-1", None, None, true).await;

    mount_token_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/me/events/AAMk-9"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(graph_event("AAMk-9", "No shared secret", "busy")),
        )
        .mount(&server)
        .await;

    // Only a present-but-wrong clientState is a spoof; a missing one is
    // processed normally.
    let mut stateless = notification("sub-1", "updated", "AAMk-9");
    stateless.client_state = None;

    engine.handle_microsoft_notification(&stateless).await.unwrap();

    let row = external_event::Entity::find()
        .filter(external_event::Column::ExternalId.eq("AAMk-9"))
        .one(&*db)
        .await
        .unwrap();
    assert!(row.is_some(), "notification without clientState reconciled");
}

#[tokio::test]
async fn empty_token_response_skips_sync() {
    let db = test_db().await;
    let server = MockServer::start().await;
    let engine = test_engine(db.clone(), &server.uri());

    let account = seed_account(&db, Uuid::new_v4(), "microsoft", Some("ms-rt"), None).await;
    seed_subscription(&db, account.id, "sub-1", None, None, true).await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/me/events/.*"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    engine
        .handle_microsoft_notification(&notification("sub-1", "updated", "AAMk-5"))
        .await
        .unwrap();
}

#[tokio::test]
async fn failed_event_fetch_is_swallowed() {
    let db = test_db().await;
    let server = MockServer::start().await;
    let engine = test_engine(db.clone(), &server.uri());

    let account = seed_account(&db, Uuid::new_v4(), "microsoft", Some("ms-rt"), None).await;
    seed_subscription(&db, account.id, "sub-1", None, None, true).await;

    mount_token_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/me/events/AAMk-6"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;

    engine
        .handle_microsoft_notification(&notification("sub-1", "updated", "AAMk-6"))
        .await
        .unwrap();

    // No upsert happened, so the account keeps its sync bookkeeping as-is.
    let account = connected_account::Entity::find_by_id(account.id)
        .one(&*db)
        .await
        .unwrap()
        .unwrap();
    assert!(account.last_sync_at.is_none());
}

#[tokio::test]
async fn batch_survives_a_failing_graph_fetch_in_the_middle() {
    let db = test_db().await;
    let server = MockServer::start().await;
    let engine = test_engine(db.clone(), &server.uri());

    let account = seed_account(&db, Uuid::new_v4(), "microsoft", Some("ms-rt"), None).await;
    seed_subscription(&db, account.id, "sub-1", None, None, true).await;

    mount_token_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/me/events/AAMk-a"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(graph_event("AAMk-a", "First", "busy")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/events/AAMk-b"))
        .respond_with(ResponseTemplate::new(500).set_body_string("transient"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/events/AAMk-c"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(graph_event("AAMk-c", "Third", "busy")),
        )
        .mount(&server)
        .await;

    engine
        .handle_microsoft_batch(&[
            notification("sub-1", "updated", "AAMk-a"),
            notification("sub-1", "updated", "AAMk-b"),
            notification("sub-1", "updated", "AAMk-c"),
        ])
        .await;

    for (external_id, expected) in [("AAMk-a", true), ("AAMk-b", false), ("AAMk-c", true)] {
        let row = external_event::Entity::find()
            .filter(external_event::Column::ExternalId.eq(external_id))
            .one(&*db)
            .await
            .unwrap();
        assert_eq!(row.is_some(), expected, "row presence for {}", external_id);
    }
}

#[tokio::test]
async fn batch_continues_after_a_failing_notification() {
    let db = test_db().await;
    let server = MockServer::start().await;
    let engine = test_engine(db.clone(), &server.uri());

    let account = seed_account(&db, Uuid::new_v4(), "microsoft", Some("ms-rt"), None).await;
    seed_subscription(&db, account.id, "sub-1", None, None, true).await;

    // First token exchange blows up, the second succeeds.
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("outage"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_token_ok(&server).await;
    Mock::given(method("GET"))
        .and(path("/me/events/AAMk-8"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(graph_event("AAMk-8", "Survivor", "busy")),
        )
        .mount(&server)
        .await;

    engine
        .handle_microsoft_batch(&[
            notification("sub-1", "updated", "AAMk-7"),
            notification("sub-1", "updated", "AAMk-8"),
        ])
        .await;

    let row = external_event::Entity::find()
        .filter(external_event::Column::ExternalId.eq("AAMk-8"))
        .one(&*db)
        .await
        .unwrap();
    assert!(row.is_some(), "second notification still processed");
}
