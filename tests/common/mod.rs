#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderValue, Request, header};
use ed25519_dalek::SigningKey;
use http_body_util::BodyExt;
use sales_api::metrics::Counters;
use sales_api::modules::users::model::{NewUser, User};
use sales_api::modules::users::service::UserCore;
use sales_api::modules::users::store::MemoryUserStore;
use sales_api::router::{ApiMuxConfig, api_mux};
use sales_auth::{Auth, Claims, MemoryKeyStore, ROLE_ADMIN, ROLE_USER};
use sales_web::ShutdownSignal;
use tokio::sync::mpsc;

pub const ISSUER: &str = "sales api";
pub const KID: &str = "54bb2165-71e1-41a6-af3e-7da4a0e1e2c1";
pub const PASSWORD: &str = "gophers123";

/// Cheapest bcrypt cost, to keep hashing out of the test runtime.
pub const TEST_COST: u32 = 4;

pub struct TestApp {
    pub router: axum::Router,
    pub auth: Arc<Auth>,
    pub users: Arc<UserCore>,
    pub counters: Arc<Counters>,
    pub shutdown: mpsc::Receiver<ShutdownSignal>,
    pub admin: User,
    pub user: User,
}

pub fn test_auth(seed: u8) -> Arc<Auth> {
    let key = SigningKey::from_bytes(&[seed; 32]);
    let keystore = MemoryKeyStore::new().with_signing_key(KID, &key).unwrap();
    Arc::new(Auth::new(KID, Arc::new(keystore)).unwrap())
}

pub fn new_user(name: &str, email: &str, role: &str) -> NewUser {
    NewUser {
        name: name.to_string(),
        email: email.to_string(),
        roles: vec![role.to_string()],
        password: PASSWORD.to_string(),
        password_confirm: PASSWORD.to_string(),
    }
}

/// Full API backed by the in-memory store, seeded with one admin and one
/// regular user, both using [`PASSWORD`].
pub async fn setup_test_app() -> TestApp {
    let auth = test_auth(7);
    let users = Arc::new(UserCore::new(Arc::new(MemoryUserStore::new()), TEST_COST));
    let counters = Arc::new(Counters::default());

    let now = chrono::Utc::now();
    let admin = users
        .create(
            new_user("Admin Gopher", "admin@example.com", ROLE_ADMIN),
            now,
            None,
        )
        .await
        .unwrap();
    let user = users
        .create(
            new_user("User Gopher", "user@example.com", ROLE_USER),
            now,
            None,
        )
        .await
        .unwrap();

    let (tx, shutdown) = mpsc::channel(1);
    let router = api_mux(ApiMuxConfig {
        shutdown: tx,
        auth: Arc::clone(&auth),
        users: Arc::clone(&users),
        counters: Arc::clone(&counters),
        issuer: ISSUER.to_string(),
        token_ttl: chrono::Duration::hours(1),
        request_timeout: Duration::from_secs(5),
    });

    TestApp {
        router,
        auth,
        users,
        counters,
        shutdown,
        admin,
        user,
    }
}

/// Mints a token for `subject` directly, bypassing the token endpoint.
pub fn token_for(auth: &Auth, subject: &str, roles: &[&str]) -> String {
    let claims = Claims::issue(
        ISSUER,
        subject,
        chrono::Utc::now(),
        chrono::Duration::hours(1),
        roles.iter().copied(),
    )
    .unwrap();
    auth.generate_token(&claims).unwrap()
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_json(uri: &str, token: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut req = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    if let Some(token) = token {
        req.headers_mut().insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
    }
    req
}

pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
