//! HTTP handlers for the public site, login flow and dashboard.

use axum::Extension;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_TYPE, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use hf_auth::Session;
use hf_site::{
    DEFAULT_FOLDER, Dashboard, Entity, EntityManager, ImageFile, ImageInput, SiteError,
    ValidationError,
};
use hf_types::{ContactStatus, ContentSection, MaterialKind, RowId, TableName};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{AppState, HttpError, SESSION_COOKIE, session_token};

// ---------------------------------------------------------------------------
// Path parsing
// ---------------------------------------------------------------------------

fn parse_row_id(id: &str) -> Result<RowId, HttpError> {
    id.parse()
        .map_err(|_| HttpError::bad_request(format!("malformed row id: {id}")))
}

fn parse_section(section: &str) -> Result<ContentSection, HttpError> {
    section
        .parse()
        .map_err(|_| HttpError::not_found(format!("no content section named {section}")))
}

fn parse_table(table: &str) -> Result<TableName, HttpError> {
    table
        .parse()
        .map_err(|_| HttpError::not_found(format!("no table named {table}")))
}

/// Run `$body` with `$m` bound to the entity manager for `$table`.
macro_rules! with_manager {
    ($dashboard:expr, $table:expr, $m:ident => $body:expr) => {{
        let dashboard: &Dashboard = $dashboard;
        match $table {
            TableName::Equipment => {
                let $m = &dashboard.equipment;
                $body
            }
            TableName::ConstructionMaterials => {
                let $m = &dashboard.construction_materials;
                $body
            }
            TableName::StructuralMaterials => {
                let $m = &dashboard.structural_materials;
                $body
            }
            TableName::Promotions => {
                let $m = &dashboard.promotions;
                $body
            }
            TableName::Gallery => {
                let $m = &dashboard.gallery;
                $body
            }
            other => Err(HttpError::not_found(format!("{other} has no entity manager"))),
        }
    }};
}

// ---------------------------------------------------------------------------
// Public site
// ---------------------------------------------------------------------------

pub(crate) async fn health() -> &'static str {
    "ok"
}

/// Every section of the home page in one response.
#[tracing::instrument(skip(state))]
pub(crate) async fn site_page(State(state): State<AppState>) -> Result<Response, HttpError> {
    Ok(Json(state.site.public.page().await?).into_response())
}

pub(crate) async fn public_equipment(
    State(state): State<AppState>,
) -> Result<Response, HttpError> {
    Ok(Json(state.site.public.equipment().await?).into_response())
}

pub(crate) async fn public_materials(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Response, HttpError> {
    let kind: MaterialKind = kind
        .parse()
        .map_err(|_| HttpError::not_found(format!("no material kind named {kind}")))?;
    Ok(Json(state.site.public.materials(kind).await?).into_response())
}

/// Active promotions only.
pub(crate) async fn public_promotions(
    State(state): State<AppState>,
) -> Result<Response, HttpError> {
    Ok(Json(state.site.public.promotions().await?).into_response())
}

pub(crate) async fn public_gallery(State(state): State<AppState>) -> Result<Response, HttpError> {
    Ok(Json(state.site.public.gallery().await?).into_response())
}

pub(crate) async fn public_content(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Result<Response, HttpError> {
    let section = parse_section(&section)?;
    match state.site.public.content(section).await? {
        Some(block) => Ok(Json(block).into_response()),
        None => Err(HttpError::not_found(format!("no {section} content yet"))),
    }
}

/// Serve a stored object with its content type.
#[tracing::instrument(skip(state))]
pub(crate) async fn get_object_handler(
    State(state): State<AppState>,
    Path((bucket, key)): Path<(String, String)>,
) -> Result<Response, HttpError> {
    let store = state.site.dashboard.uploader.store();
    let Some(object) = store.get(&bucket, &key).await? else {
        return Err(HttpError::not_found(format!("{bucket}/{key}")));
    };

    Ok(([(CONTENT_TYPE, object.content_type)], object.data).into_response())
}

// ---------------------------------------------------------------------------
// Login / logout
// ---------------------------------------------------------------------------

const LOGIN_PAGE: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>H&amp;F Ltd · Admin Login</title></head>
<body>
<h1>Admin Login</h1>
<form id="login">
  <label>Email <input name="email" type="email" required></label>
  <label>Password <input name="password" type="password" required></label>
  <button type="submit">Sign In</button>
</form>
<p id="error" role="alert"></p>
<script>
document.getElementById("login").addEventListener("submit", async (e) => {
  e.preventDefault();
  const form = new FormData(e.target);
  const res = await fetch("/admin/login", {
    method: "POST",
    headers: { "content-type": "application/json" },
    body: JSON.stringify({ email: form.get("email"), password: form.get("password") }),
  });
  if (res.ok) { window.location = "/admin"; return; }
  const body = await res.json().catch(() => ({}));
  document.getElementById("error").textContent = body.message || "Sign-in failed";
});
</script>
</body>
</html>
"#;

pub(crate) async fn login_page() -> Html<&'static str> {
    Html(LOGIN_PAGE)
}

#[derive(Deserialize)]
pub(crate) struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
    email: String,
    expires_at: DateTime<Utc>,
}

/// Seconds until `session` expires, for the cookie's `Max-Age`.
fn max_age_secs(session: &Session) -> i64 {
    (session.expires_at - Utc::now()).num_seconds().max(0)
}

/// Exchange credentials for a session token, also set as a cookie.
#[tracing::instrument(skip(state, body), fields(email = %body.email))]
pub(crate) async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Response, HttpError> {
    let session = state
        .guard
        .provider()
        .sign_in(&body.email, &body.password)
        .await?;

    let mut cookie = format!(
        "{SESSION_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.token,
        max_age_secs(&session),
    );
    if state.secure_cookies {
        cookie.push_str("; Secure");
    }

    let response = LoginResponse {
        token: session.token.clone(),
        email: session.email,
        expires_at: session.expires_at,
    };
    Ok(([(SET_COOKIE, cookie)], Json(response)).into_response())
}

/// End the session and send the caller back to the login page.
pub(crate) async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let to = state.guard.sign_out(session_token(&headers)).await;
    let cleared = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    ([(SET_COOKIE, cleared)], Redirect::to(to)).into_response()
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Landing page: who is signed in plus per-tab counts.
#[tracing::instrument(skip_all, fields(email = %session.email))]
pub(crate) async fn dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Response, HttpError> {
    let overview = state.site.dashboard.overview().await?;
    Ok(Json(json!({ "session": session, "overview": overview })).into_response())
}

async fn list_with<E: Entity>(manager: &EntityManager<E>) -> Result<Response, HttpError> {
    Ok(Json(manager.list().await?).into_response())
}

async fn get_with<E: Entity>(manager: &EntityManager<E>, id: RowId) -> Result<Response, HttpError> {
    Ok(Json(manager.get(id).await?).into_response())
}

fn draft_from<E: Entity>(body: serde_json::Value) -> Result<E::Draft, HttpError> {
    serde_json::from_value(body).map_err(|e| HttpError::bad_request(e.to_string()))
}

async fn create_with<E: Entity>(
    manager: &EntityManager<E>,
    body: serde_json::Value,
) -> Result<Response, HttpError> {
    let draft = draft_from::<E>(body)?;
    let created = manager.create(&draft).await?;
    Ok((StatusCode::CREATED, Json(created)).into_response())
}

async fn update_with<E: Entity>(
    manager: &EntityManager<E>,
    id: RowId,
    body: serde_json::Value,
) -> Result<Response, HttpError> {
    let draft = draft_from::<E>(body)?;
    Ok(Json(manager.update(id, &draft).await?).into_response())
}

async fn delete_with<E: Entity>(
    manager: &EntityManager<E>,
    id: RowId,
) -> Result<Response, HttpError> {
    manager.delete(id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

#[tracing::instrument(skip(state))]
pub(crate) async fn list_rows(
    State(state): State<AppState>,
    Path(table): Path<String>,
) -> Result<Response, HttpError> {
    let table = parse_table(&table)?;
    with_manager!(&state.site.dashboard, table, m => list_with(m).await)
}

#[tracing::instrument(skip(state))]
pub(crate) async fn get_row(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> Result<Response, HttpError> {
    let table = parse_table(&table)?;
    let id = parse_row_id(&id)?;
    with_manager!(&state.site.dashboard, table, m => get_with(m, id).await)
}

#[tracing::instrument(skip(state, body))]
pub(crate) async fn create_row(
    State(state): State<AppState>,
    Path(table): Path<String>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, HttpError> {
    let table = parse_table(&table)?;
    with_manager!(&state.site.dashboard, table, m => create_with(m, body).await)
}

#[tracing::instrument(skip(state, body))]
pub(crate) async fn update_row(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, HttpError> {
    let table = parse_table(&table)?;
    let id = parse_row_id(&id)?;
    with_manager!(&state.site.dashboard, table, m => update_with(m, id, body).await)
}

#[tracing::instrument(skip(state))]
pub(crate) async fn delete_row(
    State(state): State<AppState>,
    Path((table, id)): Path<(String, String)>,
) -> Result<Response, HttpError> {
    let table = parse_table(&table)?;
    let id = parse_row_id(&id)?;
    with_manager!(&state.site.dashboard, table, m => delete_with(m, id).await)
}

// ---------------------------------------------------------------------------
// Content, logo and contact requests
// ---------------------------------------------------------------------------

pub(crate) async fn list_content(State(state): State<AppState>) -> Result<Response, HttpError> {
    Ok(Json(state.site.dashboard.content.list().await?).into_response())
}

/// The edit buffer for one section, prefilled with its stored text.
pub(crate) async fn edit_content(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> Result<Response, HttpError> {
    let section = parse_section(&section)?;
    Ok(Json(state.site.dashboard.content.edit(section).await?).into_response())
}

#[derive(Deserialize)]
pub(crate) struct SaveContentRequest {
    #[serde(default)]
    content: String,
}

#[tracing::instrument(skip(state, body))]
pub(crate) async fn save_content(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Json(body): Json<SaveContentRequest>,
) -> Result<Response, HttpError> {
    let section = parse_section(&section)?;
    let block = state
        .site
        .dashboard
        .content
        .save(section, &body.content)
        .await?;
    Ok(Json(block).into_response())
}

pub(crate) async fn get_logo(State(state): State<AppState>) -> Result<Response, HttpError> {
    Ok(Json(state.site.dashboard.logo.logo().await?).into_response())
}

#[derive(Deserialize)]
pub(crate) struct SetLogoRequest {
    #[serde(default)]
    url: Option<String>,
}

/// Point the logo at a URL; an empty or missing URL clears it.
#[tracing::instrument(skip(state, body))]
pub(crate) async fn set_logo(
    State(state): State<AppState>,
    Json(body): Json<SetLogoRequest>,
) -> Result<Response, HttpError> {
    let input = match body.url.filter(|u| !u.trim().is_empty()) {
        Some(url) => ImageInput::Url(url),
        None => ImageInput::Clear,
    };
    Ok(Json(state.site.dashboard.logo.apply(input).await?).into_response())
}

pub(crate) async fn list_contact_requests(
    State(state): State<AppState>,
) -> Result<Response, HttpError> {
    Ok(Json(state.site.dashboard.contacts.list().await?).into_response())
}

#[derive(Deserialize)]
pub(crate) struct StatusRequest {
    status: String,
}

#[tracing::instrument(skip(state, body))]
pub(crate) async fn set_contact_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> Result<Response, HttpError> {
    let id = parse_row_id(&id)?;
    let status: ContactStatus = body
        .status
        .parse()
        .map_err(|e| SiteError::Validation(ValidationError::Choice(e)))?;
    let updated = state.site.dashboard.contacts.set_status(id, status).await?;
    Ok(Json(updated).into_response())
}

// ---------------------------------------------------------------------------
// Uploads
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct UploadParams {
    folder: Option<String>,
    filename: Option<String>,
}

/// Store the raw request body as an image and return its public URL.
#[tracing::instrument(skip(state, headers, body), fields(size = body.len()))]
pub(crate) async fn upload_image(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, HttpError> {
    if body.is_empty() {
        return Err(HttpError::bad_request("upload body is empty"));
    }

    let file = ImageFile {
        name: params.filename.unwrap_or_else(|| "upload".to_string()),
        bytes: body,
        content_type: headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned),
    };
    let folder = params.folder.as_deref().unwrap_or(DEFAULT_FOLDER);
    let url = state.site.dashboard.uploader.upload(file, folder).await?;

    Ok((StatusCode::CREATED, Json(json!({ "url": url }))).into_response())
}
