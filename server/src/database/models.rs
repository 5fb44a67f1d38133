//! Database models
//!
//! Rust structs representing database entities.
//! All models use serde for serialization to JSON responses.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// A registered account
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    /// Argon2id PHC string, never the raw password
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A note owned by a single user
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Note {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    /// HTML-bearing rich text
    pub content: String,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A note together with the names of its tags, in attachment order
#[derive(Debug, Clone, Serialize)]
pub struct NoteWithTags {
    #[serde(flatten)]
    pub note: Note,
    pub tags: Vec<String>,
}

/// A label shared across notes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

/// Autosaved in-progress note text, at most one per user
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Draft {
    pub id: i64,
    pub user_id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Generated summary of a note
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Summary {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub note_id: Option<i64>,
}

/// Login session; only the SHA-256 digest of the token is stored
#[derive(Debug, Clone, FromRow)]
pub struct Session {
    pub token_hash: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Create note request (already normalized by the notes service)
#[derive(Debug, Clone)]
pub struct CreateNoteRequest {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub pinned: bool,
}

/// Update note request; `None` leaves the stored value untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateNoteRequest {
    pub id: i64,
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub pinned: Option<bool>,
}

/// A timestamp strictly later than `previous`, normally `Utc::now()`
///
/// Guards against clock granularity so every mutation observably moves
/// `updated_at` forward.
pub fn timestamp_after(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + chrono::Duration::microseconds(1)
    }
}
