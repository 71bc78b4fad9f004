//! HTTP API for the H&F site.
//!
//! [`HttpServer`] exposes the public site, the login flow and the admin
//! dashboard over axum:
//!
//! - `GET /api/site` — the composed home page
//! - `GET /api/equipment`, `GET /api/materials/{kind}`, `GET /api/promotions`,
//!   `GET /api/gallery`, `GET /api/content/{section}` — single sections
//! - `GET /storage/{bucket}/{*key}` — uploaded images
//! - `GET|POST /admin/login`, `POST /admin/logout` — session handling
//! - `/admin` and `/admin/api/...` — the dashboard, behind the session guard
//!
//! ## Authentication
//!
//! Dashboard routes need a session token, sent either as the `hf_session`
//! cookie set by `POST /admin/login` or as `Authorization: Bearer <token>`.
//! Requests without an active session get `303 See Other` to `/admin/login`
//! before any handler runs.

mod error;
mod handlers;


use std::sync::Arc;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, COOKIE};
use axum::http::{HeaderMap, HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post, put};
use hf_auth::{AuthProvider, GuardOutcome, SessionGuard};
use hf_site::Site;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, warn};

pub use error::HttpError;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "hf_session";

/// Default request body cap for uploads (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state for all handlers.
#[derive(Clone)]
pub(crate) struct AppState {
    pub site: Site,
    pub guard: SessionGuard,
    /// Add `Secure` to the session cookie.
    pub secure_cookies: bool,
}

/// Pull the session token from `Authorization: Bearer` or the session cookie.
pub(crate) fn session_token(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
}

/// Session guard for dashboard routes.
///
/// On success the [`hf_auth::Session`] is stored in the request extensions.
async fn session_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = session_token(request.headers()).map(str::to_owned);

    match state.guard.check(token.as_deref()).await {
        GuardOutcome::Granted(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        GuardOutcome::Redirect(to) => {
            debug!(path = %request.uri().path(), "unauthenticated dashboard request");
            Redirect::to(to).into_response()
        }
    }
}

/// Configuration for creating an [`HttpServer`].
pub struct HttpServerConfig {
    /// Managers and public sections to serve.
    pub site: Site,
    /// Where sessions come from.
    pub auth: Arc<dyn AuthProvider>,
    /// Largest accepted request body, in bytes.
    pub max_upload_bytes: usize,
    /// Origins allowed to call the public API. Empty allows any origin.
    pub cors_origins: Vec<String>,
    /// Mark the session cookie `Secure`.
    pub secure_cookies: bool,
}

impl HttpServerConfig {
    /// Config with default limits and an open public API.
    pub fn new(site: Site, auth: Arc<dyn AuthProvider>) -> Self {
        Self {
            site,
            auth,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cors_origins: Vec::new(),
            secure_cookies: false,
        }
    }
}

/// HTTP server for the public site and admin dashboard.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: HttpServerConfig) -> Self {
        let cors = cors_layer(&config.cors_origins);
        let max_upload_bytes = config.max_upload_bytes;
        let state = AppState {
            site: config.site,
            guard: SessionGuard::new(config.auth),
            secure_cookies: config.secure_cookies,
        };

        let router = Self::build_router(state, cors, max_upload_bytes);
        Self { router }
    }

    fn build_router(state: AppState, cors: CorsLayer, max_upload_bytes: usize) -> Router {
        // Read-only routes the marketing site calls, possibly cross-origin.
        let public_routes = Router::new()
            .route("/health", get(handlers::health))
            .route("/api/site", get(handlers::site_page))
            .route("/api/equipment", get(handlers::public_equipment))
            .route("/api/materials/{kind}", get(handlers::public_materials))
            .route("/api/promotions", get(handlers::public_promotions))
            .route("/api/gallery", get(handlers::public_gallery))
            .route("/api/content/{section}", get(handlers::public_content))
            .route("/storage/{bucket}/{*key}", get(handlers::get_object_handler))
            .layer(cors);

        let login_routes = Router::new()
            .route(
                "/admin/login",
                get(handlers::login_page).post(handlers::login),
            )
            .route("/admin/logout", post(handlers::logout));

        // Dashboard routes, only reachable with an active session.
        let admin_routes = Router::new()
            .route("/admin", get(handlers::dashboard))
            .route("/admin/api/content", get(handlers::list_content))
            .route(
                "/admin/api/content/{section}",
                get(handlers::edit_content).put(handlers::save_content),
            )
            .route(
                "/admin/api/logo",
                get(handlers::get_logo).put(handlers::set_logo),
            )
            .route(
                "/admin/api/contact_requests",
                get(handlers::list_contact_requests),
            )
            .route(
                "/admin/api/contact_requests/{id}/status",
                put(handlers::set_contact_status),
            )
            .route("/admin/api/uploads", post(handlers::upload_image))
            .route(
                "/admin/api/{table}",
                get(handlers::list_rows).post(handlers::create_row),
            )
            .route(
                "/admin/api/{table}/{id}",
                get(handlers::get_row)
                    .put(handlers::update_row)
                    .delete(handlers::delete_row),
            )
            .route_layer(middleware::from_fn_with_state(
                state.clone(),
                session_middleware,
            ));

        Router::new()
            .merge(public_routes)
            .merge(login_routes)
            .merge(admin_routes)
            .layer(DefaultBodyLimit::max(max_upload_bytes))
            .with_state(state)
    }

    /// Return the inner [`Router`] (useful for testing with `tower::ServiceExt`).
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Serve on the given TCP address.
    pub async fn serve(self, addr: &str) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(addr, "http server listening");
        axum::serve(listener, self.router).await
    }

    /// Serve with graceful shutdown triggered by the given future.
    ///
    /// When `shutdown` completes, the server stops accepting new connections
    /// and waits for in-flight requests to finish.
    pub async fn serve_with_shutdown(
        self,
        addr: &str,
        shutdown: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), std::io::Error> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(addr, "http server listening");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(60 * 60));

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}
