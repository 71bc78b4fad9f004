//! Shared test harness for H&F site integration tests.
//!
//! Provides [`TestSite`]: a [`Site`] over [`FjallTables`] and a
//! [`FileObjectStore`] rooted in one temporary directory, plus helpers to
//! drive it through the HTTP router the way a browser would.

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use hf_auth::{AdminAccount, LocalAuth, hash_password};
use hf_http::{HttpServer, HttpServerConfig};
use hf_meta::FjallTables;
use hf_site::{DEFAULT_BUCKET, Site};
use hf_store::FileObjectStore;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "owner@hf.example";
pub const ADMIN_PASSWORD: &str = "levelling-2024";

/// Public base URL the object store hands out.
const PUBLIC_URL: &str = "http://hf.test";

/// A site over persistent backends in a temporary directory.
pub struct TestSite {
    dir: TempDir,
    pub site: Site,
}

impl TestSite {
    /// Open a fresh site.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let site = open_site(dir.path());
        Self { dir, site }
    }

    /// Drop every handle and open the same directory again.
    pub fn reopen(self) -> Self {
        let Self { dir, site } = self;
        drop(site);
        let site = open_site(dir.path());
        Self { dir, site }
    }

    /// HTTP router over this site with one admin account.
    pub fn router(&self) -> Router {
        let account = AdminAccount {
            email: ADMIN_EMAIL.to_string(),
            password_hash: hash_password(ADMIN_PASSWORD, 4).unwrap(),
        };
        let auth = Arc::new(LocalAuth::new([account], chrono::Duration::hours(1)));
        HttpServer::new(HttpServerConfig::new(self.site.clone(), auth)).into_router()
    }

    /// Map a public URL handed out by the store to a router path.
    pub fn path_of(url: &str) -> &str {
        url.strip_prefix(PUBLIC_URL).unwrap_or(url)
    }
}

impl Default for TestSite {
    fn default() -> Self {
        Self::new()
    }
}

fn open_site(dir: &Path) -> Site {
    let tables = Arc::new(FjallTables::open(dir.join("tables")).unwrap());
    let store = Arc::new(FileObjectStore::new(dir.join("objects"), PUBLIC_URL).unwrap());
    Site::new(tables, store, DEFAULT_BUCKET)
}

// =========================================================================
// HTTP helpers
// =========================================================================

/// Read a response body as JSON.
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send a request, optionally as the signed-in admin.
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(v) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

/// Send and decode, asserting the status.
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
    expected: StatusCode,
) -> Value {
    let response = send(app, method, uri, token, body).await;
    assert_eq!(response.status(), expected, "{method} {uri}");
    body_json(response).await
}

/// Sign in as the test admin and return the session token.
pub async fn login(app: &Router) -> String {
    let body = send_json(
        app,
        "POST",
        "/admin/login",
        None,
        Some(json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD })),
        StatusCode::OK,
    )
    .await;
    body["token"].as_str().unwrap().to_string()
}

/// Upload raw bytes and return the public URL.
pub async fn upload(
    app: &Router,
    token: &str,
    folder: &str,
    filename: &str,
    data: &[u8],
) -> String {
    let request = Request::builder()
        .method("POST")
        .uri(format!("/admin/api/uploads?folder={folder}&filename={filename}"))
        .header(AUTHORIZATION, format!("Bearer {token}"))
        .header(CONTENT_TYPE, "application/octet-stream")
        .body(Body::from(data.to_vec()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["url"].as_str().unwrap().to_string()
}
