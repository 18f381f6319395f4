use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::App;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use df_api::configure_routes;
use df_api::identity::IDENTITY_HEADER;
use df_auth_clerk::ClerkWebhookVerifier;
use df_core::error::AppError;
use df_core::traits::IdentityProvider;
use integration_tests::TestForum;
use secrecy::SecretString;
use serde_json::{json, Value};

fn verifier() -> ClerkWebhookVerifier {
    let secret = format!("whsec_{}", STANDARD.encode(b"integration-signing-key"));
    ClerkWebhookVerifier::new(&SecretString::from(secret)).expect("valid secret")
}

fn signed(id: &str, body: &Value) -> TestRequest {
    let payload = serde_json::to_vec(body).unwrap();
    let timestamp = Utc::now().timestamp();
    let signature = verifier().sign(id, timestamp, &payload).unwrap();
    TestRequest::post()
        .uri("/webhooks/clerk")
        .insert_header(("svix-id", id))
        .insert_header(("svix-timestamp", timestamp.to_string()))
        .insert_header(("svix-signature", signature))
        .set_payload(payload)
}

fn created_event() -> Value {
    json!({
        "type": "user.created",
        "data": {
            "id": "user_2ferris",
            "username": "ferris",
            "first_name": "Ferris",
            "last_name": "Crab",
            "image_url": "https://img.example.com/ferris.png",
            "email_addresses": [
                { "id": "idn_other", "email_address": "old@example.com" },
                { "id": "idn_primary", "email_address": "ferris@example.com" }
            ],
            "primary_email_address_id": "idn_primary"
        }
    })
}

#[actix_web::test]
async fn user_lifecycle_follows_signed_events() {
    let t = TestForum::new().await;
    let identity: Arc<dyn IdentityProvider> = Arc::new(verifier());
    let app = test::init_service(App::new().app_data(t.app_state(Some(identity))).configure(configure_routes)).await;

    let resp = test::call_service(&app, signed("msg_1", &created_event()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let user = t.forum.users.get_user_by_clerk_id("user_2ferris").await.unwrap();
    assert_eq!(user.name, "Ferris Crab");
    assert_eq!(user.email, "ferris@example.com");

    // The new member can act straight away.
    let req = TestRequest::post()
        .uri("/questions")
        .insert_header((IDENTITY_HEADER, "user_2ferris"))
        .set_json(json!({ "title": "Hello", "content": "First post", "tags": ["meta"] }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let updated = json!({
        "type": "user.updated",
        "data": { "id": "user_2ferris", "username": "ferris-the-crab" }
    });
    let resp = test::call_service(&app, signed("msg_2", &updated).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let user = t.forum.users.get_user_by_clerk_id("user_2ferris").await.unwrap();
    assert_eq!(user.username, "ferris-the-crab");
    assert_eq!(user.name, "Ferris Crab");

    let deleted = json!({ "type": "user.deleted", "data": { "id": "user_2ferris", "deleted": true } });
    let resp = test::call_service(&app, signed("msg_3", &deleted).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let err = t.forum.users.get_user_by_clerk_id("user_2ferris").await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(..)));

    let resp = test::call_service(&app, test::TestRequest::get().uri("/questions").to_request()).await;
    let page: Value = test::read_body_json(resp).await;
    assert_eq!(page["total"], 0);
}

#[actix_web::test]
async fn tampered_payload_is_rejected() {
    let t = TestForum::new().await;
    let identity: Arc<dyn IdentityProvider> = Arc::new(verifier());
    let app = test::init_service(App::new().app_data(t.app_state(Some(identity))).configure(configure_routes)).await;

    let timestamp = Utc::now().timestamp();
    let signature = verifier()
        .sign("msg_1", timestamp, &serde_json::to_vec(&created_event()).unwrap())
        .unwrap();
    let mut forged = created_event();
    forged["data"]["id"] = json!("user_intruder");

    let req = TestRequest::post()
        .uri("/webhooks/clerk")
        .insert_header(("svix-id", "msg_1"))
        .insert_header(("svix-timestamp", timestamp.to_string()))
        .insert_header(("svix-signature", signature))
        .set_payload(serde_json::to_vec(&forged).unwrap())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    assert!(t.forum.users.get_user_by_clerk_id("user_intruder").await.is_err());
}

#[actix_web::test]
async fn unhandled_event_types_are_acknowledged() {
    let t = TestForum::new().await;
    let identity: Arc<dyn IdentityProvider> = Arc::new(verifier());
    let app = test::init_service(App::new().app_data(t.app_state(Some(identity))).configure(configure_routes)).await;

    let event = json!({ "type": "session.created", "data": { "id": "sess_1" } });
    let resp = test::call_service(&app, signed("msg_9", &event).to_request()).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn duplicate_username_is_a_conflict() {
    let t = TestForum::new().await;
    t.member("ferris").await;
    let identity: Arc<dyn IdentityProvider> = Arc::new(verifier());
    let app = test::init_service(App::new().app_data(t.app_state(Some(identity))).configure(configure_routes)).await;

    let resp = test::call_service(&app, signed("msg_1", &created_event()).to_request()).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
