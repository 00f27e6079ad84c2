//! End-to-end router tests: session flow, guard behavior over HTTP, list
//! filtering, share links, and audit decoupling.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use fieldops_api::app::services::AppServices;
use fieldops_api::app::build_app;
use fieldops_audit::{AuditEntry, AuditSink, InMemoryAuditSink, SinkError};
use fieldops_auth::user::UserStore;
use fieldops_auth::{Role, ShareGrant, UserRecord};
use fieldops_core::UserId;
use fieldops_crm::{Client, Project, ProjectStatus};

const PASSWORD: &str = "correct horse battery";

fn seed_user(services: &AppServices, email: &str, role: Role) -> UserId {
    let hash = services.credentials.hash_password(PASSWORD).unwrap();
    let user = UserRecord::new(email, "Test User", role, hash);
    let id = user.id;
    services.store.insert(user).unwrap();
    id
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn post_json_with_cookie(uri: &str, cookie: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Log in and return the session cookie pair (`fieldops_session=<sid>`).
async fn login(app: &Router, email: &str) -> String {
    let response = app
        .clone()
        .oneshot(post_json(
            "/auth/login",
            json!({ "email": email, "password": PASSWORD }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("login must set a session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn guarded_route_without_session_is_401() {
    let services = Arc::new(AppServices::in_memory());
    let app = build_app(services);

    let response = app
        .oneshot(Request::get("/projects").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_sets_cookie_and_whoami_resolves_it() {
    let services = Arc::new(AppServices::in_memory());
    seed_user(&services, "admin@example.com", Role::Admin);
    let app = build_app(services);

    let cookie = login(&app, "admin@example.com").await;

    let response = app
        .clone()
        .oneshot(get_with_cookie("/whoami", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["email"], "admin@example.com");
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn login_regenerates_a_fixated_session_id() {
    let services = Arc::new(AppServices::in_memory());
    seed_user(&services, "user@example.com", Role::Manager);
    let app = build_app(services.clone());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/login")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, "fieldops_session=attacker-chosen-id")
                .body(Body::from(
                    serde_json::to_vec(
                        &json!({ "email": "user@example.com", "password": PASSWORD }),
                    )
                    .unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(!set_cookie.contains("attacker-chosen-id"));
    assert!(services.sessions.get("attacker-chosen-id").is_none());
}

#[tokio::test]
async fn logout_destroys_the_session() {
    let services = Arc::new(AppServices::in_memory());
    seed_user(&services, "user@example.com", Role::Manager);
    let app = build_app(services);

    let cookie = login(&app, "user@example.com").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get_with_cookie("/whoami", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn client_sees_only_projects_tracing_to_their_records() {
    let services = Arc::new(AppServices::in_memory());
    let client_user = seed_user(&services, "client@example.com", Role::Client);

    let mut mine = Client::new("Mine LLC", Utc::now());
    mine.user_id = Some(client_user);
    let theirs = Client::new("Theirs Inc", Utc::now());

    let visible = Project {
        id: Default::default(),
        number: "P-42".to_string(),
        name: "Visible".to_string(),
        client_id: Some(mine.id),
        lead_id: None,
        assigned_technician_id: None,
        status: ProjectStatus::Active,
        internal_notes: Some("margin is thin".to_string()),
        communications: Vec::new(),
        share: None,
        created_at: Utc::now(),
    };
    let mut hidden = visible.clone();
    hidden.id = Default::default();
    hidden.number = "P-99".to_string();
    hidden.name = "Hidden".to_string();
    hidden.client_id = Some(theirs.id);

    services.store.clients.insert(mine.id, mine).unwrap();
    services.store.clients.insert(theirs.id, theirs).unwrap();
    services
        .store
        .projects
        .insert(visible.id, visible.clone())
        .unwrap();
    services.store.projects.insert(hidden.id, hidden.clone()).unwrap();

    let app = build_app(services);
    let cookie = login(&app, "client@example.com").await;

    let response = app
        .clone()
        .oneshot(get_with_cookie("/projects", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["number"], "P-42");
    // Sanitized for a client principal.
    assert_eq!(items[0]["internal_notes"], Value::Null);

    // Fetching the out-of-scope record directly is forbidden, not missing.
    let response = app
        .clone()
        .oneshot(get_with_cookie(&format!("/projects/{}", hidden.id), &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn role_without_either_capability_gets_an_empty_list_not_an_error() {
    let services = Arc::new(AppServices::in_memory());
    seed_user(&services, "tech@example.com", Role::Employee);

    let invoice = fieldops_crm::Invoice {
        id: Default::default(),
        number: "I-1".to_string(),
        client_id: None,
        lead_id: None,
        total_cents: 5000,
        paid: false,
        internal_notes: None,
        share: None,
        created_at: Utc::now(),
    };
    services.store.invoices.insert(invoice.id, invoice).unwrap();

    let app = build_app(services);
    let cookie = login(&app, "tech@example.com").await;

    let response = app
        .clone()
        .oneshot(get_with_cookie("/invoices", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn admin_cannot_deactivate_their_own_account() {
    let services = Arc::new(AppServices::in_memory());
    let admin = seed_user(&services, "admin@example.com", Role::Admin);
    let app = build_app(services);

    let cookie = login(&app, "admin@example.com").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(format!("/users/{admin}/deactivate"))
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn share_link_reads_check_token_and_record_number() {
    let services = Arc::new(AppServices::in_memory());

    let grant = ShareGrant::issue("Q-1001", Utc::now());
    let quote = fieldops_crm::Quote {
        id: Default::default(),
        number: "Q-1001".to_string(),
        client_id: None,
        lead_id: None,
        total_cents: 120_000,
        status: fieldops_crm::QuoteStatus::Sent,
        internal_notes: Some("cost basis".to_string()),
        share: Some(grant.clone()),
        created_at: Utc::now(),
    };
    services.store.quotes.insert(quote.id, quote).unwrap();

    let app = build_app(services);

    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/public/quotes/Q-1001?token={}", grant.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    // Public output is sanitized: no internal notes, no share grant echo.
    assert_eq!(body["internal_notes"], Value::Null);
    assert_eq!(body["share"], Value::Null);

    // Same token against a different record number is rejected.
    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/public/quotes/Q-9999?token={}", grant.token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Missing token likewise.
    let response = app
        .clone()
        .oneshot(Request::get("/public/quotes/Q-1001").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn duplicate_quote_numbers_are_rejected_so_share_lookups_stay_unique() {
    let services = Arc::new(AppServices::in_memory());
    seed_user(&services, "admin@example.com", Role::Admin);
    let app = build_app(services);

    let cookie = login(&app, "admin@example.com").await;

    let response = app
        .clone()
        .oneshot(post_json_with_cookie(
            "/quotes",
            &cookie,
            json!({ "number": "Q-1001", "total_cents": 50_000 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let quote_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(post_json_with_cookie(
            &format!("/quotes/{quote_id}/share"),
            &cookie,
            json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let token = body_json(response).await["token"].as_str().unwrap().to_string();

    // A second quote under the same number would shadow the record carrying
    // the grant in the public lookup; creation must refuse it.
    let response = app
        .clone()
        .oneshot(post_json_with_cookie(
            "/quotes",
            &cookie,
            json!({ "number": "Q-1001", "total_cents": 1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The issued share link keeps resolving to its quote.
    let response = app
        .clone()
        .oneshot(
            Request::get(format!("/public/quotes/Q-1001?token={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn ticket_numbers_are_server_generated_and_distinct() {
    let services = Arc::new(AppServices::in_memory());
    seed_user(&services, "manager@example.com", Role::Manager);
    let app = build_app(services);

    let cookie = login(&app, "manager@example.com").await;

    let mut numbers = Vec::new();
    for subject in ["no hot water", "flickering lights"] {
        let response = app
            .clone()
            .oneshot(post_json_with_cookie(
                "/tickets",
                &cookie,
                json!({ "subject": subject }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        numbers.push(body_json(response).await["number"].as_str().unwrap().to_string());
    }

    assert_eq!(numbers, vec!["T-1001".to_string(), "T-1002".to_string()]);
}

struct RejectingSink;

impl AuditSink for RejectingSink {
    fn append(&self, _entry: &AuditEntry) -> Result<(), SinkError> {
        Err(SinkError::Unavailable("disk full".to_string()))
    }
}

#[tokio::test]
async fn failing_audit_sink_does_not_fail_the_mutation() {
    let services = Arc::new(AppServices::with_audit_sink(RejectingSink));
    seed_user(&services, "manager@example.com", Role::Manager);
    let app = build_app(services.clone());

    let cookie = login(&app, "manager@example.com").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/clients")
                .header(header::CONTENT_TYPE, "application/json")
                .header(header::COOKIE, &cookie)
                .body(Body::from(
                    serde_json::to_vec(&json!({ "name": "Acme" })).unwrap(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    services.audit.flush();
    assert_eq!(services.store.clients.all().unwrap().len(), 1);
}

#[tokio::test]
async fn public_quote_request_creates_a_lead_and_audits_anonymously() {
    let sink = InMemoryAuditSink::new();
    let services = Arc::new(AppServices::with_audit_sink(sink.clone()));
    let app = build_app(services.clone());

    let response = app
        .clone()
        .oneshot(post_json(
            "/public/quote-requests",
            json!({ "name": "Walk-in", "email": "walkin@example.com" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(services.store.leads.all().unwrap().len(), 1);

    services.audit.flush();
    let entries = sink.entries();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].user_id.is_none());
}
