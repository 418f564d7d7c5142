//! Liveness endpoint

use std::net::TcpListener;
use std::sync::Arc;

use authgate::auth::{AuthService, InMemoryCredentialStore, InMemorySessionStore, TokenCodec};
use authgate::configuration::CookieSettings;
use authgate::session_cookie::RefreshCookie;
use authgate::startup::run;

fn spawn_app() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();

    let auth = AuthService::new(
        TokenCodec::new(
            "health-check-secret-at-least-32-characters",
            "authgate-test",
            chrono::Duration::seconds(60),
            chrono::Duration::seconds(120),
        ),
        Arc::new(InMemoryCredentialStore::new()),
        Arc::new(InMemorySessionStore::new()),
    );
    let server = run(listener, auth, RefreshCookie::new(CookieSettings::default()))
        .expect("Failed to create server");

    let _ = tokio::spawn(async move {
        let _ = server.await;
    });

    format!("http://127.0.0.1:{}", port)
}

#[tokio::test]
async fn health_check_works() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/health_check", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());
    assert_eq!(Some(0), response.content_length());
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let addr = spawn_app();

    let response = reqwest::Client::new()
        .get(&format!("{}/does-not-exist", addr))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(404, response.status().as_u16());
}
