//! Route handlers
//!
//! Handlers resolve the caller once through the session extractors and pass
//! the owner id explicitly into every service call.

use super::responses::JsonError;
use super::session::{clear_session_cookie, session_cookie, session_token, ApiUser, CurrentUser};
use super::views::{self, NoteFilters};
use crate::app::AppState;
use crate::error::{AppError, Result};
use crate::services::{parse_tags, DraftContent, ExportFormat};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use chrono::Utc;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: String,
    /// HTML checkbox: present when ticked
    pub pinned: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NotesQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub tag: String,
}

pub async fn home(headers: HeaderMap, State(state): State<AppState>) -> Result<Redirect> {
    let user = match session_token(&headers) {
        Some(token) => state.auth.resolve_session(&token).await?,
        None => None,
    };

    Ok(match user {
        Some(_) => Redirect::to("/notes"),
        None => Redirect::to("/login"),
    })
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ----- auth -----

pub async fn register_form() -> Html<String> {
    Html(views::register_page())
}

pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Redirect> {
    state.auth.register(&form.username, &form.password).await?;
    Ok(Redirect::to("/login"))
}

pub async fn login_form() -> Html<String> {
    Html(views::login_page())
}

pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<CredentialsForm>,
) -> Result<Response> {
    let session = state.auth.login(&form.username, &form.password).await?;

    Ok((
        [(header::SET_COOKIE, session_cookie(&session.token))],
        Redirect::to("/notes"),
    )
        .into_response())
}

pub async fn logout(headers: HeaderMap, State(state): State<AppState>) -> Result<Response> {
    if let Some(token) = session_token(&headers) {
        state.auth.logout(&token).await?;
    }

    Ok((
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response())
}

// ----- notes -----

pub async fn list_notes(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<NotesQuery>,
) -> Result<Html<String>> {
    let q = query.q.trim();
    let tag = query.tag.trim();

    let notes = state.notes.list_notes(user.id, Some(q), Some(tag)).await?;
    let tags = state.notes.list_tags(user.id).await?;
    let draft = state.drafts.get_draft(user.id).await?;

    Ok(Html(views::notes_page(
        &user.username,
        &notes,
        &tags,
        &draft,
        &NoteFilters { query: q, tag },
        Utc::now(),
    )))
}

pub async fn create_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Form(form): Form<NoteForm>,
) -> Result<Redirect> {
    state
        .notes
        .create_note(
            user.id,
            &form.title,
            &form.content,
            parse_tags(&form.tags),
            form.pinned.is_some(),
        )
        .await?;

    Ok(Redirect::to("/notes"))
}

pub async fn edit_form(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Html<String>> {
    let note = state.notes.get_note(user.id, id).await?;
    Ok(Html(views::edit_page(&user.username, &note, Utc::now())))
}

pub async fn update_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
    Form(form): Form<NoteForm>,
) -> Result<Redirect> {
    // The form always carries the full tag list and checkbox state
    state
        .notes
        .update_note(
            user.id,
            id,
            Some(&form.title),
            Some(&form.content),
            Some(parse_tags(&form.tags)),
            Some(form.pinned.is_some()),
        )
        .await?;

    Ok(Redirect::to("/notes"))
}

pub async fn delete_note(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Redirect> {
    state.notes.delete_note(user.id, id).await?;
    Ok(Redirect::to("/notes"))
}

pub async fn toggle_pin(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Path(id): Path<i64>,
) -> std::result::Result<Json<serde_json::Value>, JsonError> {
    let pinned = state.notes.toggle_pin(user.id, id).await?;
    Ok(Json(serde_json::json!({ "pinned": pinned })))
}

// ----- drafts -----

pub async fn get_draft(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
) -> std::result::Result<Json<DraftContent>, JsonError> {
    Ok(Json(state.drafts.get_draft(user.id).await?))
}

pub async fn save_draft(
    State(state): State<AppState>,
    ApiUser(user): ApiUser,
    Json(draft): Json<DraftContent>,
) -> std::result::Result<Json<serde_json::Value>, JsonError> {
    state.drafts.save_draft(user.id, &draft).await?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

// ----- export -----

/// Keep download names to a conservative header-safe alphabet
fn download_name(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

pub async fn export(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(format): Path<String>,
) -> Result<Response> {
    let format: ExportFormat = format.parse()?;
    let file = state.export.export(user.id, format).await?;

    let disposition = format!("attachment; filename=\"{}\"", download_name(&file.filename));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, file.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        file.bytes,
    )
        .into_response())
}

// ----- summaries -----

pub async fn summarize(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Html<String>> {
    let outcome = state.summaries.summarize(user.id, id).await?;
    Ok(Html(views::summarize_page(&user.username, &outcome)))
}

pub async fn list_summaries(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>> {
    let summaries = state.summaries.list_summaries(user.id).await?;
    Ok(Html(views::summaries_page(&user.username, &summaries)))
}

pub async fn view_summary(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Html<String>> {
    let summary = state.summaries.get_summary(user.id, id).await?;
    Ok(Html(views::summary_page(&user.username, &summary)))
}

pub async fn pomodoro(CurrentUser(user): CurrentUser) -> Html<String> {
    Html(views::pomodoro_page(&user.username))
}

/// Fallback for unknown paths
pub async fn not_found() -> AppError {
    AppError::NotFound("Page".to_string())
}
