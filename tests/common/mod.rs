#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use tokio::task::JoinHandle;

use taskdesk_gate::config::AppConfig;
use taskdesk_gate::permissions::StaticPermissionStore;
use taskdesk_gate::routes::RouteTable;
use taskdesk_gate::{app, AppState};

pub const ROLES: &str = r#"
roles:
  admin:
    modules:
      - key: dashboard
        permissions: { read: true }
      - key: users
        permissions: { read: true, create: true, update: true }
      - key: project-listing
        permissions: { read: true, create: true, update: true }
      - key: documents
        permissions: { read: true }
      - key: tasks
        permissions: { read: true }
  staff:
    modules:
      - key: dashboard
        permissions: { read: true }
      - key: users
        permissions: { read: true, add: true, edit: false }
      - key: project-listing
        permissions: { read: true, edit: true }
  acme/staff:
    modules:
      - key: dashboard
        permissions: { read: false }
"#;

/// A gate served in-process on an ephemeral port, stopped on drop
pub struct TestServer {
    pub base_url: String,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        let permissions = StaticPermissionStore::from_yaml_str(ROLES, "tests")?;
        let state = AppState::new(
            AppConfig::development(),
            RouteTable::builtin()?,
            Arc::new(permissions),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .context("failed to bind test listener")?;
        let base_url = format!("http://{}", listener.local_addr()?);

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        Ok(Self { base_url, handle })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Redirects are asserted on, never followed
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("failed to build test client")
}

/// Mint a session token expiring `offset` from now; the signature is never checked
pub fn mint_token(role: &str, offset: Duration) -> String {
    let exp = (Utc::now() + offset).timestamp();
    encode(
        &Header::default(),
        &json!({ "sub": format!("{}-user", role), "role": role, "exp": exp }),
        &EncodingKey::from_secret(b"not-the-real-secret"),
    )
    .expect("failed to mint token")
}

pub fn live_token(role: &str) -> String {
    mint_token(role, Duration::hours(1))
}

pub fn expired_token(role: &str) -> String {
    mint_token(role, -Duration::hours(1))
}

pub fn session_cookie(token: &str) -> String {
    format!("accessToken={}", token)
}

pub fn location(response: &reqwest::Response) -> Option<&str> {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

pub fn set_cookies(response: &reqwest::Response) -> Vec<String> {
    response
        .headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok().map(str::to_string))
        .collect()
}
