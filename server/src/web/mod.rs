//! HTTP layer
//!
//! Routing, session extraction, HTML views and error responses.

pub mod handlers;
pub mod responses;
pub mod session;
pub mod views;

pub use responses::JsonError;
pub use session::{ApiUser, CurrentUser};

use crate::app::AppState;
use axum::routing::{get, post};
use axum::Router;

/// All application routes, without middleware
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health))
        .route(
            "/register",
            get(handlers::register_form).post(handlers::register),
        )
        .route("/login", get(handlers::login_form).post(handlers::login))
        .route("/logout", get(handlers::logout))
        .route(
            "/notes",
            get(handlers::list_notes).post(handlers::create_note),
        )
        .route(
            "/edit/:id",
            get(handlers::edit_form).post(handlers::update_note),
        )
        .route("/delete/:id", get(handlers::delete_note))
        .route("/toggle_pin/:id", post(handlers::toggle_pin))
        .route(
            "/draft",
            get(handlers::get_draft).post(handlers::save_draft),
        )
        .route("/export/:format", get(handlers::export))
        .route("/summarize/:id", get(handlers::summarize))
        .route("/summaries", get(handlers::list_summaries))
        .route("/summary/:id", get(handlers::view_summary))
        .route("/pomodoro", get(handlers::pomodoro))
        .fallback(handlers::not_found)
}
