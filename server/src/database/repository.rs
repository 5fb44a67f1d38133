//! Repository layer for database operations
//!
//! This module provides CRUD operations for all entities.
//! Every note, draft and summary query is filtered by the owning user id,
//! and every multi-statement mutation runs inside one transaction.

use super::models::*;
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ===== Users =====

    /// Create a user; a taken username is a validation error
    pub async fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let now = Utc::now();

        let result = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash, created_at)
            VALUES (?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => {
                tracing::debug!("Created user: {}", user.id);
                Ok(user)
            }
            Err(e) => {
                let err = AppError::from(e);
                if err.is_unique_violation() {
                    return Err(AppError::Validation("Username already exists".to_string()));
                }
                Err(err)
            }
        }
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", id)))
    }

    // ===== Sessions =====

    pub async fn create_session(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Session> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(Utc::now())
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created session for user: {}", user_id);
        Ok(session)
    }

    /// Find the user behind a live (unexpired) session
    pub async fn find_session_user(
        &self,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token_hash = ? AND s.expires_at > ?
            "#,
        )
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn extend_session(&self, token_hash: &str, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE sessions SET expires_at = ? WHERE token_hash = ?")
            .bind(expires_at)
            .bind(token_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Delete a session, returns whether one existed
    pub async fn delete_session(&self, token_hash: &str) -> Result<bool> {
        let rows = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }

    pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        let rows = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows > 0 {
            tracing::debug!("Removed {} expired sessions", rows);
        }
        Ok(rows)
    }

    // ===== Notes =====

    /// Insert a note with its tags and consume the owner's draft, atomically
    pub async fn create_note(&self, user_id: i64, req: CreateNoteRequest) -> Result<NoteWithTags> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (user_id, title, content, pinned, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(req.pinned)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        replace_note_tags(&mut tx, note.id, &req.tags).await?;
        let tags = tag_names_for_note(&mut tx, note.id).await?;

        let drafts_removed = sqlx::query("DELETE FROM drafts WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        tracing::debug!(
            "Created note: {} (tags: {}, draft cleared: {})",
            note.id,
            tags.len(),
            drafts_removed > 0
        );
        Ok(NoteWithTags { note, tags })
    }

    /// Get a note owned by `user_id`
    pub async fn get_note(&self, user_id: i64, id: i64) -> Result<NoteWithTags> {
        let mut conn = self.pool.acquire().await?;
        let note = fetch_owned_note(&mut conn, user_id, id).await?;
        let tags = tag_names_for_note(&mut conn, id).await?;

        Ok(NoteWithTags { note, tags })
    }

    /// List a user's notes, pinned first then most recently updated.
    /// `tag` restricts to notes carrying a tag with exactly that name.
    pub async fn list_notes(&self, user_id: i64, tag: Option<&str>) -> Result<Vec<NoteWithTags>> {
        let mut query = "SELECT n.* FROM notes n WHERE n.user_id = ?".to_string();

        if tag.is_some() {
            query.push_str(
                r#"
                AND EXISTS (
                    SELECT 1 FROM note_tags nt
                    JOIN tags t ON t.id = nt.tag_id
                    WHERE nt.note_id = n.id AND t.name = ?
                )"#,
            );
        }

        query.push_str(" ORDER BY n.pinned DESC, n.updated_at DESC, n.id DESC");

        let mut q = sqlx::query_as::<_, Note>(&query).bind(user_id);
        if let Some(tag) = tag {
            q = q.bind(tag);
        }

        let notes = q.fetch_all(&self.pool).await?;

        let rows: Vec<(i64, String)> = sqlx::query_as(
            r#"
            SELECT nt.note_id, t.name FROM note_tags nt
            JOIN tags t ON t.id = nt.tag_id
            JOIN notes n ON n.id = nt.note_id
            WHERE n.user_id = ?
            ORDER BY nt.rowid
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut tags_by_note: HashMap<i64, Vec<String>> = HashMap::new();
        for (note_id, name) in rows {
            tags_by_note.entry(note_id).or_default().push(name);
        }

        Ok(notes
            .into_iter()
            .map(|note| {
                let tags = tags_by_note.remove(&note.id).unwrap_or_default();
                NoteWithTags { note, tags }
            })
            .collect())
    }

    /// Update a note; `None` fields keep their stored values.
    /// A provided tag list replaces every existing association.
    pub async fn update_note(&self, user_id: i64, req: UpdateNoteRequest) -> Result<NoteWithTags> {
        let mut tx = self.pool.begin().await?;

        let existing = fetch_owned_note(&mut tx, user_id, req.id).await?;
        let now = timestamp_after(existing.updated_at);

        let note = sqlx::query_as::<_, Note>(
            r#"
            UPDATE notes SET title = ?, content = ?, pinned = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            RETURNING *
            "#,
        )
        .bind(req.title.unwrap_or(existing.title))
        .bind(req.content.unwrap_or(existing.content))
        .bind(req.pinned.unwrap_or(existing.pinned))
        .bind(now)
        .bind(req.id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(tags) = &req.tags {
            replace_note_tags(&mut tx, note.id, tags).await?;
        }
        let tags = tag_names_for_note(&mut tx, note.id).await?;

        tx.commit().await?;

        tracing::debug!("Updated note: {}", note.id);
        Ok(NoteWithTags { note, tags })
    }

    /// Delete a note together with its tag associations and summary
    pub async fn delete_note(&self, user_id: i64, id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        fetch_owned_note(&mut tx, user_id, id).await?;

        sqlx::query("DELETE FROM summaries WHERE note_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM note_tags WHERE note_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM notes WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!("Deleted note: {}", id);
        Ok(())
    }

    /// Flip the pinned flag, returns the new state
    pub async fn toggle_pin(&self, user_id: i64, id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let existing = fetch_owned_note(&mut tx, user_id, id).await?;
        let pinned = !existing.pinned;

        sqlx::query("UPDATE notes SET pinned = ?, updated_at = ? WHERE id = ? AND user_id = ?")
            .bind(pinned)
            .bind(timestamp_after(existing.updated_at))
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!("Note {} pinned: {}", id, pinned);
        Ok(pinned)
    }

    /// Tags used by a user's notes, with usage counts
    pub async fn list_tags(&self, user_id: i64) -> Result<Vec<(String, i64)>> {
        let tags: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT t.name, COUNT(*) FROM tags t
            JOIN note_tags nt ON nt.tag_id = t.id
            JOIN notes n ON n.id = nt.note_id
            WHERE n.user_id = ?
            GROUP BY t.id, t.name
            ORDER BY t.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    // ===== Drafts =====

    pub async fn get_draft(&self, user_id: i64) -> Result<Option<Draft>> {
        let draft = sqlx::query_as::<_, Draft>("SELECT * FROM drafts WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(draft)
    }

    /// Create or overwrite the user's single draft
    pub async fn save_draft(&self, user_id: i64, title: &str, content: &str) -> Result<Draft> {
        let draft = sqlx::query_as::<_, Draft>(
            r#"
            INSERT INTO drafts (user_id, title, content, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                title = excluded.title,
                content = excluded.content,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(title)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Saved draft for user: {}", user_id);
        Ok(draft)
    }

    // ===== Summaries =====

    /// Create or overwrite the summary of a note owned by `user_id`
    pub async fn upsert_summary(
        &self,
        user_id: i64,
        note_id: i64,
        title: &str,
        summary: &str,
    ) -> Result<Summary> {
        let mut tx = self.pool.begin().await?;

        fetch_owned_note(&mut tx, user_id, note_id).await?;

        let saved = sqlx::query_as::<_, Summary>(
            r#"
            INSERT INTO summaries (title, summary, note_id)
            VALUES (?, ?, ?)
            ON CONFLICT(note_id) DO UPDATE SET
                title = excluded.title,
                summary = excluded.summary
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(summary)
        .bind(note_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::debug!("Saved summary {} for note {}", saved.id, note_id);
        Ok(saved)
    }

    /// Summaries whose parent note belongs to `user_id`
    pub async fn list_summaries(&self, user_id: i64) -> Result<Vec<Summary>> {
        let summaries = sqlx::query_as::<_, Summary>(
            r#"
            SELECT s.* FROM summaries s
            JOIN notes n ON n.id = s.note_id
            WHERE n.user_id = ?
            ORDER BY s.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(summaries)
    }

    /// Get one summary, only if its parent note belongs to `user_id`
    pub async fn get_summary(&self, user_id: i64, id: i64) -> Result<Summary> {
        sqlx::query_as::<_, Summary>(
            r#"
            SELECT s.* FROM summaries s
            JOIN notes n ON n.id = s.note_id
            WHERE s.id = ? AND n.user_id = ?
            "#,
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("summary {}", id)))
    }

    #[cfg(test)]
    pub(crate) async fn count_summaries_for_note(&self, note_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM summaries WHERE note_id = ?")
            .bind(note_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn fetch_owned_note(conn: &mut SqliteConnection, user_id: i64, id: i64) -> Result<Note> {
    sqlx::query_as::<_, Note>("SELECT * FROM notes WHERE id = ? AND user_id = ?")
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("note {}", id)))
}

/// Look up each tag by exact name, creating the ones that do not exist yet
async fn resolve_tags(conn: &mut SqliteConnection, names: &[String]) -> Result<Vec<Tag>> {
    let mut tags = Vec::with_capacity(names.len());

    for name in names {
        let existing = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?;

        let tag = match existing {
            Some(tag) => tag,
            None => {
                let tag = sqlx::query_as::<_, Tag>("INSERT INTO tags (name) VALUES (?) RETURNING *")
                    .bind(name)
                    .fetch_one(&mut *conn)
                    .await?;
                tracing::debug!("Created tag: {}", tag.name);
                tag
            }
        };

        tags.push(tag);
    }

    Ok(tags)
}

/// Replace every tag association of a note.
/// Repeated names collapse onto one association through the (note, tag) key.
async fn replace_note_tags(conn: &mut SqliteConnection, note_id: i64, names: &[String]) -> Result<()> {
    sqlx::query("DELETE FROM note_tags WHERE note_id = ?")
        .bind(note_id)
        .execute(&mut *conn)
        .await?;

    for tag in resolve_tags(&mut *conn, names).await? {
        sqlx::query("INSERT OR IGNORE INTO note_tags (note_id, tag_id) VALUES (?, ?)")
            .bind(note_id)
            .bind(tag.id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

async fn tag_names_for_note(conn: &mut SqliteConnection, note_id: i64) -> Result<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>(
        r#"
        SELECT t.name FROM note_tags nt
        JOIN tags t ON t.id = nt.tag_id
        WHERE nt.note_id = ?
        ORDER BY nt.rowid
        "#,
    )
    .bind(note_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(names)
}
